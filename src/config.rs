use std::path::PathBuf;
use std::thread;

use clap::{Parser, ValueEnum};

/// Optional region-extraction step run before analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preprocess {
    /// Analyze the image as decoded.
    None,
    /// Isolate the leaf with the color-threshold detector first.
    ColorThreshold,
}

#[derive(Parser, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Directory walked recursively for images to analyze.
    pub input_dir: PathBuf,

    /// Directory the per-image JSON reports are written to, mirroring the
    /// input tree.
    #[arg(default_value = "output")]
    pub output_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = Preprocess::None)]
    pub preprocess: Preprocess,

    /// Skip the co-occurrence texture computation; its five scalars take the
    /// documented neutral fallback value instead.
    #[arg(long)]
    pub no_glcm: bool,

    #[arg(
        short, long, default_value_t = thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    )]
    pub num_threads: usize,
}
