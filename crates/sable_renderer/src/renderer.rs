//! Core path tracing renderer.
//!
//! Implements Monte Carlo path tracing with:
//! - Depth-bounded light transport, evaluated as an explicit bounce loop
//! - Sky gradient illumination
//! - Anti-aliasing via multi-sampling
//! - Gamma correction and 8-bit quantization
//!
//! Every pixel draws from its own generator seeded by `(seed, x, y)`, so the
//! image depends only on the seed, never on scheduling.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use sable_math::{Color, Interval, Ray};

use crate::material::Scatter;
use crate::{Camera, Hittable};

/// Lower bound of the hit interval for every bounce.
///
/// Scattered rays start on the surface they left; floating point error can
/// put that origin slightly inside, and without this margin the ray would hit
/// its own surface again ("shadow acne"). Empirical, not derived.
pub const SHADOW_ACNE_EPSILON: f64 = 0.001;

/// Output range of gamma-corrected channels before quantization.
const INTENSITY: Interval = Interval::new(0.000, 0.999);

/// Render configuration that is not part of the camera.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Base seed; each pixel derives its own generator from it
    pub seed: u64,
    /// Tile edge length for the parallel renderer
    pub bucket_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            bucket_size: crate::DEFAULT_BUCKET_SIZE,
        }
    }
}

/// Compute the color seen by a ray.
///
/// Equivalent to the recursive estimator
/// `attenuation * ray_color(scattered, depth - 1)`, with black at depth 0
/// or on absorption and the sky gradient when the ray escapes.
pub fn ray_color(
    ray: &Ray,
    world: &dyn Hittable,
    depth: u32,
    rng: &mut dyn rand::RngCore,
) -> Color {
    let mut ray = *ray;
    let mut throughput = Color::ONE;

    for _ in 0..depth {
        let Some(rec) = world.hit(&ray, Interval::new(SHADOW_ACNE_EPSILON, f64::INFINITY)) else {
            return throughput * sky_color(&ray);
        };

        match rec.material.scatter(&ray, &rec, rng) {
            Some(result) => {
                throughput *= result.attenuation;
                ray = result.scattered;
            }
            // Absorbed
            None => return Color::ZERO,
        }
    }

    // Bounce budget exhausted, no more light is gathered
    Color::ZERO
}

/// Vertical white-to-blue gradient seen by rays that leave the scene.
pub fn sky_color(ray: &Ray) -> Color {
    let unit_direction = ray.direction().normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    white * (1.0 - a) + blue * a
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f64) -> f64 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear color to gamma-corrected 8-bit RGB.
pub fn color_to_rgb8(color: Color) -> [u8; 3] {
    let quantize = |c: f64| (256.0 * INTENSITY.clamp(linear_to_gamma(c))) as u8;
    [quantize(color.x), quantize(color.y), quantize(color.z)]
}

/// Seed for the generator owned by pixel (x, y).
///
/// SplitMix64 finalizer over the base seed and packed coordinates, so
/// neighbouring pixels get unrelated streams.
pub fn pixel_seed(seed: u64, x: u32, y: u32) -> u64 {
    let coords = ((y as u64) << 32) | x as u64;
    let mut z = seed
        .wrapping_add(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(coords.wrapping_mul(0xBF58_476D_1CE4_E5B9));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Render a single pixel with multi-sampling.
///
/// The camera must already be initialized.
pub fn render_pixel(camera: &Camera, world: &dyn Hittable, x: u32, y: u32, seed: u64) -> Color {
    let mut rng = StdRng::seed_from_u64(pixel_seed(seed, x, y));
    let mut pixel_color = Color::ZERO;

    for _ in 0..camera.samples_per_pixel {
        let ray = camera.get_ray(x, y, &mut rng);
        pixel_color += ray_color(&ray, world, camera.max_depth, &mut rng);
    }

    camera.samples_scale() * pixel_color
}

/// Linear-radiance image, stored row-major from the top-left pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    /// Gamma-corrected 8-bit RGB bytes in scan order.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgb8(*color));
        }
        bytes
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Render the entire scene on the calling thread, one scanline at a time.
///
/// Re-initializes the camera before rendering.
pub fn render(camera: &mut Camera, world: &dyn Hittable, config: &RenderConfig) -> ImageBuffer {
    camera.initialize();
    let camera = &*camera;
    log_render_start(camera);

    let start = Instant::now();
    let mut image = ImageBuffer::new(camera.image_width, camera.image_height());

    for y in 0..camera.image_height() {
        log::debug!("Scanlines remaining: {}", camera.image_height() - y);
        for x in 0..camera.image_width {
            let color = render_pixel(camera, world, x, y, config.seed);
            image.set(x, y, color);
        }
    }

    log::info!("Rendered in {:?}", start.elapsed());
    image
}

/// Render the entire scene with rayon, one bucket per task.
///
/// Produces exactly the same image as [`render`] for the same seed.
pub fn render_parallel(
    camera: &mut Camera,
    world: &dyn Hittable,
    config: &RenderConfig,
) -> ImageBuffer {
    camera.initialize();
    let camera = &*camera;
    log_render_start(camera);

    let start = Instant::now();
    let buckets = crate::generate_buckets(
        camera.image_width,
        camera.image_height(),
        config.bucket_size.max(1),
    );
    log::debug!("Rendering {} buckets on {} threads", buckets.len(), rayon::current_num_threads());

    let results = crate::bucket::render_buckets(&buckets, camera, world, config.seed);

    let mut image = ImageBuffer::new(camera.image_width, camera.image_height());
    for result in &results {
        result.write_into(&mut image);
    }

    log::info!("Rendered in {:?}", start.elapsed());
    image
}

fn log_render_start(camera: &Camera) {
    log::info!(
        "Rendering {}x{} @ {} spp, max depth {}",
        camera.image_width,
        camera.image_height(),
        camera.samples_per_pixel,
        camera.max_depth
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dielectric, HittableList, Lambertian, Material, Metal, Sphere};
    use sable_math::{Point3, Vec3};
    use std::sync::Arc;

    fn single_sphere_world(material: Material) -> HittableList {
        let mut world = HittableList::new();
        world.add(Sphere::new(Point3::new(0.0, 0.0, -1.0), 0.5, Arc::new(material)));
        world
    }

    #[test]
    fn test_sky_gradient() {
        let up = sky_color(&Ray::new(Point3::ZERO, Vec3::Y));
        let down = sky_color(&Ray::new(Point3::ZERO, -Vec3::Y));
        let level = sky_color(&Ray::new(Point3::ZERO, Vec3::X));

        assert!((up - Color::new(0.5, 0.7, 1.0)).length() < 1e-12);
        assert!((down - Color::ONE).length() < 1e-12);
        assert!((level - Color::new(0.75, 0.85, 1.0)).length() < 1e-12);
    }

    #[test]
    fn test_depth_zero_is_black() {
        let world = single_sphere_world(Lambertian::new(Color::splat(0.5)).into());
        let mut rng = StdRng::seed_from_u64(1);

        for direction in [Vec3::new(0.0, 0.0, -1.0), Vec3::Y, Vec3::new(1.0, -1.0, 0.2)] {
            let ray = Ray::new(Point3::ZERO, direction);
            assert_eq!(ray_color(&ray, &world, 0, &mut rng), Color::ZERO);
        }
        let empty = HittableList::new();
        assert_eq!(ray_color(&Ray::new(Point3::ZERO, Vec3::Y), &empty, 0, &mut rng), Color::ZERO);
    }

    #[test]
    fn test_miss_returns_sky() {
        let world = HittableList::new();
        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new(Point3::ZERO, Vec3::new(0.3, 0.4, -1.0));

        assert_eq!(ray_color(&ray, &world, 5, &mut rng), sky_color(&ray));
    }

    #[test]
    fn test_depth_one_hit_is_black() {
        // One bounce: the hit scatters but there is no budget left to reach the sky
        let world = single_sphere_world(Lambertian::new(Color::splat(0.5)).into());
        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new(Point3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        assert_eq!(ray_color(&ray, &world, 1, &mut rng), Color::ZERO);
    }

    #[test]
    fn test_mirror_attenuates_sky() {
        // Head-on mirror reflects straight back to the horizon-level sky
        let world = single_sphere_world(Metal::new(Color::new(0.8, 0.6, 0.2), 0.0).into());
        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new(Point3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let color = ray_color(&ray, &world, 2, &mut rng);
        let expected = Color::new(0.8, 0.6, 0.2) * Color::new(0.75, 0.85, 1.0);
        assert!((color - expected).length() < 1e-9);
    }

    #[test]
    fn test_transparent_sphere_is_invisible() {
        let world = single_sphere_world(Dielectric::new(1.0).into());
        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new(Point3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let color = ray_color(&ray, &world, 10, &mut rng);
        assert!((color - sky_color(&ray)).length() < 1e-9);
    }

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert_eq!(linear_to_gamma(-1.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 1e-12);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_color_to_rgb8() {
        assert_eq!(color_to_rgb8(Color::ZERO), [0, 0, 0]);
        assert_eq!(color_to_rgb8(Color::ONE), [255, 255, 255]);
        assert_eq!(color_to_rgb8(Color::splat(4.0)), [255, 255, 255]);
        assert_eq!(color_to_rgb8(Color::new(0.25, -0.5, 1.0)), [128, 0, 255]);
    }

    #[test]
    fn test_pixel_seed_distinct() {
        let a = pixel_seed(0, 0, 0);
        assert_ne!(a, pixel_seed(0, 1, 0));
        assert_ne!(a, pixel_seed(0, 0, 1));
        assert_ne!(a, pixel_seed(1, 0, 0));
        assert_ne!(pixel_seed(0, 1, 0), pixel_seed(0, 0, 1));
        assert_eq!(a, pixel_seed(0, 0, 0));
    }

    #[test]
    fn test_render_pixel() {
        let world = single_sphere_world(Lambertian::new(Color::new(0.5, 0.5, 0.5)).into());
        let mut camera = Camera::new().with_resolution(10, 1.0).with_quality(4, 5);
        camera.initialize();

        // Center pixel hits the sphere; a diffuse sphere under a sky is never black
        let color = render_pixel(&camera, &world, 5, 5, 42);
        assert!(color.length() > 0.0);
        assert_eq!(color, render_pixel(&camera, &world, 5, 5, 42));
    }

    #[test]
    fn test_image_buffer() {
        let mut image = ImageBuffer::new(3, 2);
        image.set(2, 1, Color::ONE);

        assert_eq!(image.pixels.len(), 6);
        assert_eq!(image.get(2, 1), Color::ONE);
        assert_eq!(image.pixels[5], Color::ONE);
        assert_eq!(image.to_rgb8().len(), 18);
        assert_eq!(&image.to_rgb8()[15..], &[255, 255, 255]);
    }
}
