//! Bucket-based tile rendering.
//!
//! Divides the image into tiles (buckets) that rayon renders independently.
//! Pixels seed their own generators, so tiles need no shared state.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use sable_math::Color;

use crate::renderer::{render_pixel, ImageBuffer};
use crate::{Camera, Hittable};

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// X coordinate of bucket's top-left corner
    pub x: u32,
    /// Y coordinate of bucket's top-left corner
    pub y: u32,
    /// Width of the bucket in pixels
    pub width: u32,
    /// Height of the bucket in pixels
    pub height: u32,
    /// Index of this bucket in the render order
    pub index: usize,
}

impl Bucket {
    /// Create a new bucket.
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self { x, y, width, height, index }
    }

    /// Get the total number of pixels in this bucket.
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// Default bucket size in pixels.
pub const DEFAULT_BUCKET_SIZE: u32 = 32;

/// Generate buckets covering the image, sorted from the center outwards.
///
/// Render order only affects which tiles finish first, never pixel values.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let mut buckets = Vec::new();
    let mut index = 0;

    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let bw = bucket_size.min(width - x);
            let bh = bucket_size.min(height - y);
            buckets.push(Bucket::new(x, y, bw, bh, index));
            index += 1;
            x += bucket_size;
        }
        y += bucket_size;
    }

    sort_spiral(&mut buckets, width, height);

    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = i;
    }

    buckets
}

/// Sort buckets by distance from image center.
fn sort_spiral(buckets: &mut [Bucket], width: u32, height: u32) {
    let center_x = width as f64 / 2.0;
    let center_y = height as f64 / 2.0;
    let dist = |b: &Bucket| {
        let bx = b.x as f64 + b.width as f64 / 2.0;
        let by = b.y as f64 + b.height as f64 / 2.0;
        (bx - center_x).powi(2) + (by - center_y).powi(2)
    };

    // Stable sort: equal distances keep scan order
    buckets.sort_by(|a, b| dist(a).total_cmp(&dist(b)));
}

/// Render a single bucket to a vector of colors.
///
/// Returns pixels in row-major order within the bucket.
pub fn render_bucket(bucket: &Bucket, camera: &Camera, world: &dyn Hittable, seed: u64) -> Vec<Color> {
    let mut pixels = Vec::with_capacity(bucket.pixel_count() as usize);

    for local_y in 0..bucket.height {
        for local_x in 0..bucket.width {
            let color = render_pixel(camera, world, bucket.x + local_x, bucket.y + local_y, seed);
            pixels.push(color);
        }
    }

    pixels
}

/// Render every bucket in parallel.
///
/// Results come back in the same order as `buckets`.
pub fn render_buckets(
    buckets: &[Bucket],
    camera: &Camera,
    world: &dyn Hittable,
    seed: u64,
) -> Vec<BucketResult> {
    let done = AtomicUsize::new(0);

    buckets
        .par_iter()
        .map(|bucket| {
            let result = BucketResult::new(*bucket, render_bucket(bucket, camera, world, seed));
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            log::trace!("Bucket {} done ({}/{})", bucket.index, finished, buckets.len());
            result
        })
        .collect()
}

/// Result of rendering a bucket.
#[derive(Debug, Clone)]
pub struct BucketResult {
    /// The bucket that was rendered
    pub bucket: Bucket,
    /// Pixel colors in row-major order
    pub pixels: Vec<Color>,
}

impl BucketResult {
    /// Create a new bucket result.
    pub fn new(bucket: Bucket, pixels: Vec<Color>) -> Self {
        Self { bucket, pixels }
    }

    /// Copy this bucket's pixels into their place in the full image.
    pub fn write_into(&self, image: &mut ImageBuffer) {
        let b = &self.bucket;
        for (i, color) in self.pixels.iter().enumerate() {
            let local_x = i as u32 % b.width;
            let local_y = i as u32 / b.width;
            image.set(b.x + local_x, b.y + local_y, *color);
        }
    }
}
