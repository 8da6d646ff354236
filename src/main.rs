use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::{prelude::*, ThreadPoolBuilder};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use cassava_leaf_id::{
    config::{Config, Preprocess},
    extract_leaf_region, AnalyzerOptions, ExtractionMode, LeafAnalyzer,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::parse();

    ensure!(config.input_dir.exists(), "Input directory does not exist");

    ThreadPoolBuilder::new()
        .num_threads(config.num_threads)
        .build_global()?;

    let analyzer = LeafAnalyzer::new(AnalyzerOptions {
        glcm_enabled: !config.no_glcm,
    });

    let image_paths = WalkDir::new(&config.input_dir)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| image::ImageFormat::from_path(e.path()).is_ok())
        .map(|e| e.into_path())
        .collect::<Vec<_>>();

    let progress_bar = ProgressBar::new(image_paths.len() as u64);
    progress_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec} {eta})",
        )?
        .progress_chars("#>-"),
    );

    image_paths
        .par_iter()
        .progress_with(progress_bar.clone())
        .try_for_each(|path| {
            let image = image::open(path)
                .with_context(|| format!("Failed to open image: {}", path.display()))?;

            let image = match config.preprocess {
                Preprocess::None => image,
                Preprocess::ColorThreshold => {
                    extract_leaf_region(&image, ExtractionMode::ColorThreshold)
                }
            };

            let analysis = analyzer
                .analyze(&image)
                .with_context(|| format!("Failed to analyze image: {}", path.display()))?;

            let output_path = construct_output_path(path, &config)?;
            fs::write(&output_path, serde_json::to_string_pretty(&analysis)?)
                .with_context(|| format!("Failed to write report: {}", output_path.display()))
        })?;

    progress_bar.finish();

    Ok(())
}

fn relocate(path: &Path, prefix: &Path, new_prefix: &Path) -> Result<PathBuf> {
    let relative = path
        .strip_prefix(prefix)
        .with_context(|| format!("{} is not inside {}", path.display(), prefix.display()))?;
    Ok(new_prefix.join(relative))
}

fn construct_output_path(path: &Path, config: &Config) -> Result<PathBuf> {
    let output_path = relocate(path, &config.input_dir, &config.output_dir)?;

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    Ok(output_path.with_extension("json"))
}
