//! Sable Renderer - CPU path tracing.
//!
//! A Monte Carlo path tracer for spheres with diffuse, metal and glass
//! materials, lit only by a sky gradient.
//!
//! Rendering is single-threaded ([`render`]) or bucketed across rayon
//! ([`render_parallel`]); both give the same image for the same seed.

mod hittable;
mod material;
mod sphere;
mod camera;
mod renderer;
mod bucket;
pub mod scene;
pub mod output;

pub use hittable::{HitRecord, Hittable, HittableList, Primitive};
pub use material::{
    reflect, reflectance, refract, Dielectric, Lambertian, Material, Metal, Scatter,
    ScatterResult,
};
pub use sphere::Sphere;
pub use camera::Camera;
pub use renderer::{
    color_to_rgb8, linear_to_gamma, pixel_seed, ray_color, render, render_parallel,
    render_pixel, sky_color, ImageBuffer, RenderConfig, SHADOW_ACNE_EPSILON,
};
pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use scene::{Scene, SceneDescription, SceneError};
pub use output::{save_image, write_ppm, OutputError};

/// Re-export math types from sable_math
pub use sable_math::{Color, Interval, Point3, Ray, Vec3};
