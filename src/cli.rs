use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// 한 프레임에 픽셀당 샘플 하나, 프레임끼리 누적
    Progressive,
    /// 픽셀마다 고정 NxN 서브 샘플, 누적 없음
    Ssaa,
}

#[derive(Debug, Parser)]
#[command(name = "glimmer")]
#[command(about = "Progressive CPU ray tracer for sphere scenes")]
pub struct Args {
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    #[arg(long, default_value_t = 450)]
    pub height: u32,

    /// Number of render calls before the image is written
    #[arg(short, long, default_value_t = 32)]
    pub frames: u32,

    #[arg(short, long, value_enum, default_value_t = Mode::Progressive)]
    pub mode: Mode,

    /// Restart accumulation on every frame
    #[arg(long)]
    pub no_accumulate: bool,

    /// Trace rows on the calling thread only
    #[arg(long)]
    pub single_threaded: bool,

    /// Seed for reproducible roughness perturbation (implies --single-threaded)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Vertical field of view in degrees
    #[arg(long, default_value_t = 45.0)]
    pub fov: f32,

    #[arg(short, long, default_value = "glimmer.png")]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}
