use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

/// Log levels selectable on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "sable")]
#[command(about = "Render a scene of spheres with a Monte Carlo path tracer")]
pub struct Args {
    /// Built-in scene name (cover, metals, glass) or path to a JSON scene file
    #[arg(long, default_value = "cover")]
    pub scene: String,

    /// Output file (.ppm or .png); "-" writes PPM to stdout
    #[arg(short, long, default_value = "image.ppm")]
    pub output: PathBuf,

    /// Override the image width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Override the number of samples per pixel
    #[arg(short, long)]
    pub samples: Option<u32>,

    /// Override the maximum number of ray bounces
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Seed for scene generation and sampling
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Render on the calling thread only
    #[arg(long)]
    pub single_threaded: bool,

    /// Logging level; RUST_LOG filters still apply on top
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

impl Args {
    /// True if the image should go to stdout.
    pub fn writes_stdout(&self) -> bool {
        self.output.as_os_str() == "-"
    }
}
