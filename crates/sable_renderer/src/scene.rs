//! Scene construction.
//!
//! Scenes come from two places: JSON scene files deserialized with serde, and
//! the built-in scenes under [`builtin`]. Both produce a [`Scene`]: the world
//! plus a configured (not yet initialized) camera.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use sable_math::sampling::{gen_f64, gen_range, random_color_range, random_vec3};
use sable_math::{Color, Point3, Vec3, Vec3Ext};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Camera, Dielectric, HittableList, Lambertian, Material, Metal, Sphere};

/// Errors that can occur while building a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown material: {0}")]
    UnknownMaterial(String),

    #[error("Unknown built-in scene: {0} (expected one of: {})", BUILTIN_SCENES.join(", "))]
    UnknownScene(String),

    #[error("Invalid camera settings: {0}")]
    InvalidCamera(String),

    #[error("Invalid radius {radius} for sphere {index} (must be positive and finite)")]
    InvalidRadius { index: usize, radius: f64 },
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Names accepted by [`builtin`].
pub const BUILTIN_SCENES: &[&str] = &["cover", "metals", "glass"];

/// A renderable scene.
#[derive(Debug, Clone)]
pub struct Scene {
    pub world: HittableList,
    pub camera: Camera,
}

/// Camera overrides. Missing fields keep the camera's current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraSettings {
    pub aspect_ratio: Option<f64>,
    pub image_width: Option<u32>,
    pub samples_per_pixel: Option<u32>,
    pub max_depth: Option<u32>,
    pub vfov: Option<f64>,
    pub look_from: Option<Point3>,
    pub look_at: Option<Point3>,
    pub vup: Option<Vec3>,
    pub defocus_angle: Option<f64>,
    pub focus_dist: Option<f64>,
}

impl CameraSettings {
    /// Apply the settings that are present onto `camera`.
    pub fn apply(&self, mut camera: Camera) -> Camera {
        if let Some(v) = self.aspect_ratio {
            camera.aspect_ratio = v;
        }
        if let Some(v) = self.image_width {
            camera.image_width = v;
        }
        if let Some(v) = self.samples_per_pixel {
            camera.samples_per_pixel = v;
        }
        if let Some(v) = self.max_depth {
            camera.max_depth = v;
        }
        if let Some(v) = self.vfov {
            camera.vfov = v;
        }
        if let Some(v) = self.look_from {
            camera.look_from = v;
        }
        if let Some(v) = self.look_at {
            camera.look_at = v;
        }
        if let Some(v) = self.vup {
            camera.vup = v;
        }
        if let Some(v) = self.defocus_angle {
            camera.defocus_angle = v;
        }
        if let Some(v) = self.focus_dist {
            camera.focus_dist = v;
        }
        camera
    }
}

/// Serialized material definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MaterialDesc {
    Lambertian {
        albedo: Color,
    },
    Metal {
        albedo: Color,
        #[serde(default)]
        fuzz: f64,
    },
    Dielectric {
        refraction_index: f64,
    },
}

impl From<&MaterialDesc> for Material {
    fn from(desc: &MaterialDesc) -> Self {
        match *desc {
            MaterialDesc::Lambertian { albedo } => Lambertian::new(albedo).into(),
            MaterialDesc::Metal { albedo, fuzz } => Metal::new(albedo, fuzz).into(),
            MaterialDesc::Dielectric { refraction_index } => Dielectric::new(refraction_index).into(),
        }
    }
}

/// Serialized sphere. `material` names an entry of the scene's material table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SphereDesc {
    pub center: Point3,
    pub radius: f64,
    pub material: String,
}

/// A scene file.
///
/// ```json
/// {
///   "camera": { "image_width": 400, "aspect_ratio": 1.7778 },
///   "materials": { "ground": { "type": "lambertian", "albedo": [0.8, 0.8, 0.0] } },
///   "spheres": [ { "center": [0, -100.5, -1], "radius": 100, "material": "ground" } ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneDescription {
    pub camera: CameraSettings,
    pub materials: BTreeMap<String, MaterialDesc>,
    pub spheres: Vec<SphereDesc>,
}

impl SceneDescription {
    /// Parse a scene description from JSON text.
    pub fn from_json(json: &str) -> SceneResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the world and camera.
    ///
    /// Each named material is constructed once and shared by every sphere
    /// that references it.
    pub fn build(&self) -> SceneResult<Scene> {
        let materials: BTreeMap<&str, Arc<Material>> = self
            .materials
            .iter()
            .map(|(name, desc)| (name.as_str(), Arc::new(Material::from(desc))))
            .collect();

        let mut world = HittableList::new();
        for (index, sphere) in self.spheres.iter().enumerate() {
            if !(sphere.radius.is_finite() && sphere.radius > 0.0) {
                return Err(SceneError::InvalidRadius {
                    index,
                    radius: sphere.radius,
                });
            }
            let material = materials
                .get(sphere.material.as_str())
                .ok_or_else(|| SceneError::UnknownMaterial(sphere.material.clone()))?;
            world.add(Sphere::new(sphere.center, sphere.radius, Arc::clone(material)));
        }

        let camera = self.camera.apply(Camera::new());
        validate_camera(&camera)?;

        log::debug!("Built scene: {} materials, {} spheres", materials.len(), world.len());
        Ok(Scene { world, camera })
    }
}

/// Load and build a JSON scene file.
pub fn load_scene<P: AsRef<Path>>(path: P) -> SceneResult<Scene> {
    let path = path.as_ref();
    log::info!("Loading scene from {}", path.display());
    let json = std::fs::read_to_string(path)?;
    SceneDescription::from_json(&json)?.build()
}

/// Reject camera configurations that cannot produce an image.
pub fn validate_camera(camera: &Camera) -> SceneResult<()> {
    let invalid = |msg: String| Err(SceneError::InvalidCamera(msg));

    if camera.image_width == 0 {
        return invalid("image_width must be at least 1".into());
    }
    if !(camera.aspect_ratio.is_finite() && camera.aspect_ratio > 0.0) {
        return invalid(format!("aspect_ratio must be positive, got {}", camera.aspect_ratio));
    }
    if camera.samples_per_pixel == 0 {
        return invalid("samples_per_pixel must be at least 1".into());
    }
    if !(camera.vfov > 0.0 && camera.vfov < 180.0) {
        return invalid(format!("vfov must be in (0, 180), got {}", camera.vfov));
    }
    if !(camera.focus_dist.is_finite() && camera.focus_dist > 0.0) {
        return invalid(format!("focus_dist must be positive, got {}", camera.focus_dist));
    }
    if !(camera.defocus_angle.is_finite() && camera.defocus_angle >= 0.0) {
        return invalid(format!("defocus_angle must be non-negative, got {}", camera.defocus_angle));
    }
    if !(camera.look_from.is_finite() && camera.look_at.is_finite() && camera.vup.is_finite()) {
        return invalid("camera vectors must be finite".into());
    }

    let view = camera.look_from - camera.look_at;
    if view.near_zero() {
        return invalid("look_from and look_at must differ".into());
    }
    if camera.vup.cross(view).near_zero() {
        return invalid("vup must not be parallel to the view direction".into());
    }

    Ok(())
}

/// Build one of the [`BUILTIN_SCENES`] by name.
///
/// `seed` drives any random placement, so a name and seed always give the
/// same scene.
pub fn builtin(name: &str, seed: u64) -> SceneResult<Scene> {
    let scene = match name {
        "cover" => cover_scene(seed),
        "metals" => metals_scene(),
        "glass" => glass_scene(),
        _ => return Err(SceneError::UnknownScene(name.to_string())),
    };
    log::debug!("Built-in scene '{}': {} spheres", name, scene.world.len());
    Ok(scene)
}

/// Large ground sphere with a grid of small random spheres and three large
/// feature spheres (glass, diffuse, mirror).
fn cover_scene(seed: u64) -> Scene {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut world = HittableList::new();

    let ground = Arc::new(Lambertian::new(Color::new(0.5, 0.5, 0.5)).into());
    world.add(Sphere::new(Point3::new(0.0, -1000.0, 0.0), 1000.0, ground));

    // Every glass marble shares one material
    let glass: Arc<Material> = Arc::new(Dielectric::new(1.5).into());

    for a in -11..11 {
        for b in -11..11 {
            let choose_mat = gen_f64(&mut rng);
            let center = Point3::new(
                a as f64 + 0.9 * gen_f64(&mut rng),
                0.2,
                b as f64 + 0.9 * gen_f64(&mut rng),
            );

            // Keep clear of the large mirror sphere
            if (center - Point3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let material: Arc<Material> = if choose_mat < 0.8 {
                let albedo = random_vec3(&mut rng) * random_vec3(&mut rng);
                Arc::new(Lambertian::new(albedo).into())
            } else if choose_mat < 0.95 {
                let albedo = random_color_range(&mut rng, 0.5, 1.0);
                let fuzz = gen_range(&mut rng, 0.0, 0.5);
                Arc::new(Metal::new(albedo, fuzz).into())
            } else {
                Arc::clone(&glass)
            };
            world.add(Sphere::new(center, 0.2, material));
        }
    }

    world.add(Sphere::new(Point3::new(0.0, 1.0, 0.0), 1.0, glass));
    world.add(Sphere::new(
        Point3::new(-4.0, 1.0, 0.0),
        1.0,
        Arc::new(Lambertian::new(Color::new(0.04, 0.2, 0.1)).into()),
    ));
    world.add(Sphere::new(
        Point3::new(4.0, 1.0, 0.0),
        1.0,
        Arc::new(Metal::new(Color::new(0.7, 0.6, 0.5), 0.0).into()),
    ));

    let camera = Camera::new()
        .with_resolution(1200, 16.0 / 9.0)
        .with_quality(500, 50)
        .with_position(Point3::new(13.0, 2.0, 3.0), Point3::ZERO, Vec3::Y)
        .with_lens(20.0, 0.6, 10.0);

    Scene { world, camera }
}

/// Ground, a diffuse center sphere and two mirror spheres.
fn metals_scene() -> Scene {
    let mut world = HittableList::new();
    world.add(Sphere::new(
        Point3::new(0.0, -100.5, -1.0),
        100.0,
        Arc::new(Lambertian::new(Color::new(0.8, 0.8, 0.0)).into()),
    ));
    world.add(Sphere::new(
        Point3::new(0.0, 0.0, -1.2),
        0.5,
        Arc::new(Lambertian::new(Color::new(0.1, 0.2, 0.5)).into()),
    ));
    world.add(Sphere::new(
        Point3::new(-1.0, 0.0, -1.0),
        0.5,
        Arc::new(Metal::new(Color::new(0.8, 0.8, 0.8), 0.0).into()),
    ));
    world.add(Sphere::new(
        Point3::new(1.0, 0.0, -1.0),
        0.5,
        Arc::new(Metal::new(Color::new(0.8, 0.6, 0.2), 0.0).into()),
    ));

    Scene {
        world,
        camera: small_camera(),
    }
}

/// Ground, a diffuse center sphere, a hollow glass sphere and a rough metal.
fn glass_scene() -> Scene {
    let mut world = HittableList::new();
    world.add(Sphere::new(
        Point3::new(0.0, -100.5, -1.0),
        100.0,
        Arc::new(Lambertian::new(Color::new(0.8, 0.8, 0.0)).into()),
    ));
    world.add(Sphere::new(
        Point3::new(0.0, 0.0, -1.2),
        0.5,
        Arc::new(Lambertian::new(Color::new(0.1, 0.2, 0.5)).into()),
    ));
    world.add(Sphere::new(
        Point3::new(-1.0, 0.0, -1.0),
        0.5,
        Arc::new(Dielectric::new(1.5).into()),
    ));
    // Air bubble inside the glass sphere
    world.add(Sphere::new(
        Point3::new(-1.0, 0.0, -1.0),
        0.4,
        Arc::new(Dielectric::new(1.0 / 1.5).into()),
    ));
    world.add(Sphere::new(
        Point3::new(1.0, 0.0, -1.0),
        0.5,
        Arc::new(Metal::new(Color::new(0.8, 0.6, 0.2), 1.0).into()),
    ));

    Scene {
        world,
        camera: small_camera(),
    }
}

fn small_camera() -> Camera {
    Camera::new()
        .with_resolution(400, 16.0 / 9.0)
        .with_quality(100, 50)
        .with_lens(90.0, 0.0, 1.0)
}
