//! Surface scattering models.
//!
//! The set of materials is closed: [`Material`] is an enum over the three
//! variants and dispatches with a `match`. Each variant is also usable on its
//! own through the [`Scatter`] trait.

use rand::RngCore;
use sable_math::sampling::{gen_f64, random_unit_vector};
use sable_math::{Color, Ray, Vec3, Vec3Ext};

use crate::hittable::HitRecord;

/// Outcome of a successful scattering event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterResult {
    /// Fraction of light carried along the scattered ray, per channel
    pub attenuation: Color,
    /// The outgoing ray, starting at the hit point
    pub scattered: Ray,
}

/// How light interacts with a surface.
pub trait Scatter {
    /// Scatter an incoming ray.
    ///
    /// Returns `None` if the ray is absorbed.
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore)
        -> Option<ScatterResult>;
}

/// Any material a primitive can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Lambertian(Lambertian),
    Metal(Metal),
    Dielectric(Dielectric),
}

impl Scatter for Material {
    #[inline]
    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        match self {
            Material::Lambertian(m) => m.scatter(ray_in, rec, rng),
            Material::Metal(m) => m.scatter(ray_in, rec, rng),
            Material::Dielectric(m) => m.scatter(ray_in, rec, rng),
        }
    }
}

impl From<Lambertian> for Material {
    fn from(m: Lambertian) -> Self {
        Material::Lambertian(m)
    }
}

impl From<Metal> for Material {
    fn from(m: Metal) -> Self {
        Material::Metal(m)
    }
}

impl From<Dielectric> for Material {
    fn from(m: Dielectric) -> Self {
        Material::Dielectric(m)
    }
}

/// Lambertian (diffuse) material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lambertian {
    albedo: Color,
}

impl Lambertian {
    /// Create a new Lambertian material with the given albedo color.
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }
}

impl Scatter for Lambertian {
    fn scatter(
        &self,
        _ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        let mut scatter_direction = rec.normal + random_unit_vector(rng);

        // Catch degenerate scatter direction
        if scatter_direction.near_zero() {
            scatter_direction = rec.normal;
        }

        Some(ScatterResult {
            attenuation: self.albedo,
            scattered: Ray::new(rec.p, scatter_direction),
        })
    }
}

/// Metal (specular) material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metal {
    albedo: Color,
    fuzz: f64,
}

impl Metal {
    /// Create a new Metal material.
    ///
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, 1.0 = very rough. Clamped to [0, 1].
    pub fn new(albedo: Color, fuzz: f64) -> Self {
        Self {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }

    pub fn fuzz(&self) -> f64 {
        self.fuzz
    }
}

impl Scatter for Metal {
    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        let reflected = reflect(ray_in.direction(), rec.normal).normalize();
        let scattered_dir = reflected + self.fuzz * random_unit_vector(rng);

        // Fuzz can push the ray below the surface; the surface absorbs it
        if scattered_dir.dot(rec.normal) > 0.0 {
            Some(ScatterResult {
                attenuation: self.albedo,
                scattered: Ray::new(rec.p, scattered_dir),
            })
        } else {
            None
        }
    }
}

/// Dielectric (glass) material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dielectric {
    /// Refractive index relative to the surrounding medium
    refraction_index: f64,
}

impl Dielectric {
    /// Create a new Dielectric material.
    ///
    /// - `refraction_index`: 1.0 = air, 1.5 = glass, 2.4 = diamond
    pub fn new(refraction_index: f64) -> Self {
        Self { refraction_index }
    }
}

impl Scatter for Dielectric {
    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        let ri = if rec.front_face {
            1.0 / self.refraction_index
        } else {
            self.refraction_index
        };

        let unit_direction = ray_in.direction().normalize();
        let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

        // Check for total internal reflection
        let cannot_refract = ri * sin_theta > 1.0;

        let direction = if cannot_refract || reflectance(cos_theta, ri) > gen_f64(rng) {
            reflect(unit_direction, rec.normal)
        } else {
            refract(unit_direction, rec.normal, ri)
        };

        Some(ScatterResult {
            attenuation: Color::ONE,
            scattered: Ray::new(rec.p, direction),
        })
    }
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface with relative index `etai_over_etat`.
#[inline]
pub fn refract(uv: Vec3, n: Vec3, etai_over_etat: f64) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

/// Schlick's approximation for reflectance.
#[inline]
pub fn reflectance(cosine: f64, refraction_index: f64) -> f64 {
    let r0 = ((1.0 - refraction_index) / (1.0 + refraction_index)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sable_math::Point3;

    fn record<'a>(ray: &Ray, outward_normal: Vec3, material: &'a Material) -> HitRecord<'a> {
        HitRecord::new(ray, 1.0, outward_normal, material)
    }

    #[test]
    fn test_lambertian_never_degenerate() {
        let material: Material = Lambertian::new(Color::new(0.8, 0.3, 0.3)).into();
        let ray = Ray::new(Point3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let rec = record(&ray, Vec3::Z, &material);
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..2000 {
            let result = material.scatter(&ray, &rec, &mut rng).expect("always scatters");
            assert!(!result.scattered.direction().near_zero());
            assert_eq!(result.scattered.origin(), rec.p);
            assert_eq!(result.attenuation, Color::new(0.8, 0.3, 0.3));
            // normal + unit vector stays in the closed upper hemisphere
            assert!(result.scattered.direction().dot(rec.normal) >= -1e-12);
        }
    }

    /// Replays a fixed list of `u64` words, so `gen::<f64>()` yields
    /// `(word >> 11) * 2^-53`.
    struct ReplayRng {
        words: Vec<u64>,
        next: usize,
    }

    impl RngCore for ReplayRng {
        fn next_u32(&mut self) -> u32 {
            (self.next_u64() >> 32) as u32
        }

        fn next_u64(&mut self) -> u64 {
            let word = self.words[self.next % self.words.len()];
            self.next += 1;
            word
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for chunk in dest.chunks_mut(8) {
                let bytes = self.next_u64().to_le_bytes();
                chunk.copy_from_slice(&bytes[..chunk.len()]);
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    #[test]
    fn test_lambertian_degenerate_direction_falls_back_to_normal() {
        let material: Material = Lambertian::new(Color::splat(0.5)).into();
        let ray = Ray::new(Point3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let rec = record(&ray, Vec3::Z, &material);
        // Draws 0.5, 0.5, 0.0 map to (0, 0, -1), the exact opposite of the normal
        let mut rng = ReplayRng {
            words: vec![1 << 63, 1 << 63, 0],
            next: 0,
        };

        let result = material.scatter(&ray, &rec, &mut rng).expect("always scatters");
        assert_eq!(rng.next, 3);
        assert_eq!(result.scattered.direction(), rec.normal);
        assert_eq!(result.scattered.origin(), rec.p);
    }

    #[test]
    fn test_metal_fuzz_clamped() {
        assert_eq!(Metal::new(Color::ONE, 3.0).fuzz(), 1.0);
        assert_eq!(Metal::new(Color::ONE, -0.5).fuzz(), 0.0);
        assert_eq!(Metal::new(Color::ONE, 0.3).fuzz(), 0.3);
    }

    #[test]
    fn test_metal_perfect_mirror() {
        let material: Material = Metal::new(Color::new(0.8, 0.6, 0.2), 0.0).into();
        let incoming = Vec3::new(1.0, 0.0, -1.0).normalize();
        let ray = Ray::new(Point3::new(-1.0, 0.0, 1.0), incoming);
        let rec = record(&ray, Vec3::Z, &material);
        let mut rng = StdRng::seed_from_u64(2);

        let result = material.scatter(&ray, &rec, &mut rng).expect("mirror reflects");
        let expected = reflect(incoming, rec.normal);

        assert!((result.scattered.direction() - expected).length() < 1e-12);
        assert!((expected - Vec3::new(1.0, 0.0, 1.0).normalize()).length() < 1e-12);
        assert_eq!(result.attenuation, Color::new(0.8, 0.6, 0.2));
    }

    #[test]
    fn test_metal_absorbs_below_surface() {
        // Grazing incidence with maximum fuzz sends many rays into the surface
        let material: Material = Metal::new(Color::ONE, 1.0).into();
        let ray = Ray::new(Point3::new(-1.0, 0.0, 0.01), Vec3::new(1.0, 0.0, -0.01));
        let rec = record(&ray, Vec3::Z, &material);
        let mut rng = StdRng::seed_from_u64(3);

        let mut absorbed = 0;
        for _ in 0..1000 {
            match material.scatter(&ray, &rec, &mut rng) {
                Some(result) => assert!(result.scattered.direction().dot(rec.normal) > 0.0),
                None => absorbed += 1,
            }
        }
        assert!(absorbed > 0);
    }

    #[test]
    fn test_dielectric_index_one_passes_straight_through() {
        let material: Material = Dielectric::new(1.0).into();
        let direction = Vec3::new(0.0, 0.0, -1.0);
        let ray = Ray::new(Point3::new(0.0, 0.0, 1.0), direction);
        let rec = record(&ray, Vec3::Z, &material);
        let mut rng = StdRng::seed_from_u64(4);

        for _ in 0..100 {
            let result = material.scatter(&ray, &rec, &mut rng).expect("glass never absorbs");
            assert!((result.scattered.direction() - direction).length() < 1e-12);
            assert_eq!(result.attenuation, Color::ONE);
        }
    }

    #[test]
    fn test_dielectric_total_internal_reflection() {
        let material: Material = Dielectric::new(1.5).into();
        // Leaving the glass at a grazing angle: sin(theta) * 1.5 > 1
        let direction = Vec3::new(1.0, 0.0, 0.3).normalize();
        let ray = Ray::new(Point3::new(-1.0, 0.0, -0.3), direction);
        let rec = record(&ray, Vec3::Z, &material);
        assert!(!rec.front_face);
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..100 {
            let result = material.scatter(&ray, &rec, &mut rng).expect("glass never absorbs");
            let expected = reflect(direction, rec.normal);
            assert!((result.scattered.direction() - expected).length() < 1e-12);
        }
    }

    #[test]
    fn test_dielectric_fresnel_split() {
        let material: Material = Dielectric::new(1.5).into();
        let direction = Vec3::new(1.0, 0.0, -0.3).normalize();
        let ray = Ray::new(Point3::new(-1.0, 0.0, 0.3), direction);
        let rec = record(&ray, Vec3::Z, &material);
        assert!(rec.front_face);

        let cos_theta = -direction.dot(rec.normal);
        let expected = reflectance(cos_theta, 1.0 / 1.5);
        let mirror = reflect(direction, rec.normal);
        let mut rng = StdRng::seed_from_u64(21);

        let draws = 10_000;
        let mut reflected = 0;
        for _ in 0..draws {
            let result = material.scatter(&ray, &rec, &mut rng).expect("glass never absorbs");
            if (result.scattered.direction() - mirror).length() < 1e-12 {
                reflected += 1;
            } else {
                assert!(result.scattered.direction().z < 0.0);
            }
        }

        assert!(reflected > 0 && reflected < draws);
        let share = reflected as f64 / draws as f64;
        assert!((share - expected).abs() < 0.03, "share {share}, expected {expected}");
    }

    #[test]
    fn test_refract_snell() {
        let n = Vec3::Z;
        let incoming = Vec3::new(1.0, 0.0, -1.0).normalize();
        let out = refract(incoming, n, 1.0 / 1.5);

        let sin_in = incoming.cross(-n).length();
        let sin_out = out.normalize().cross(-n).length();
        assert!((sin_in - 1.5 * sin_out).abs() < 1e-9);
        assert!((out.length() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_reflectance() {
        // Normal incidence gives R0
        assert!((reflectance(1.0, 1.5) - 0.04).abs() < 1e-12);
        // Grazing incidence reflects everything
        assert!((reflectance(0.0, 1.5) - 1.0).abs() < 1e-12);
        assert_eq!(reflectance(1.0, 1.0), 0.0);
    }
}
