//! Writing rendered images to disk or a stream.
//!
//! Supported formats:
//! - `.ppm` - plain-text `P3` pixmap
//! - `.png` - 8-bit RGB via the `image` crate
//!
//! Both apply the same gamma correction and quantization
//! ([`color_to_rgb8`](crate::color_to_rgb8)).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::{color_to_rgb8, ImageBuffer};

/// Errors that can occur while saving an image.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unsupported output format: {0} (expected .ppm or .png)")]
    UnsupportedFormat(String),
}

/// Write the image as a plain `P3` PPM stream, one `R G B` line per pixel.
pub fn write_ppm<W: Write>(image: &ImageBuffer, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", image.width, image.height)?;
    writeln!(writer, "255")?;

    for color in &image.pixels {
        let [r, g, b] = color_to_rgb8(*color);
        writeln!(writer, "{} {} {}", r, g, b)?;
    }

    writer.flush()
}

/// Save the image, choosing the format from the file extension.
pub fn save_image<P: AsRef<Path>>(image: &ImageBuffer, path: P) -> Result<(), OutputError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "ppm" => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_ppm(image, &mut writer)?;
        }
        "png" => {
            image::save_buffer_with_format(
                path,
                &image.to_rgb8(),
                image.width,
                image.height,
                image::ColorType::Rgb8,
                image::ImageFormat::Png,
            )?;
        }
        _ => return Err(OutputError::UnsupportedFormat(path.display().to_string())),
    }

    log::info!("Saved {}x{} image to {}", image.width, image.height, path.display());
    Ok(())
}
