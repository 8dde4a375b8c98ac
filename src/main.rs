use anyhow::{Context, Result};
use sinaiticus_glyphs::config::ExtractionConfig;
use sinaiticus_glyphs::errors::error_logging;
use sinaiticus_glyphs::observability;
use sinaiticus_glyphs::pipeline::run_batch;
use std::env;
use std::path::PathBuf;
use tracing::info;

const USAGE: &str = "Usage: sinaiticus-extract <input_dir> [output_dir]";

/// Build the run configuration from the environment and positional arguments
fn load_configuration(output_dir: Option<PathBuf>) -> Result<ExtractionConfig> {
    let mut config = ExtractionConfig::from_env().map_err(|e| {
        error_logging::log_config_error(&e, "environment");
        anyhow::anyhow!("Configuration loading failed: {}", e)
    })?;

    if let Some(dir) = output_dir {
        config.output.output_dir = dir;
    }

    config.validate().map_err(|e| {
        anyhow::anyhow!(
            "Configuration validation failed: {}. Please check your GLYPHS_* environment variables.",
            e
        )
    })?;

    info!("{}", config.summary());
    Ok(config)
}

fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    observability::init_tracing().context("Failed to initialize logging")?;

    let mut args = env::args().skip(1);
    let input_dir = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("{}", USAGE))?;
    let output_dir = args.next().map(PathBuf::from);

    let config = load_configuration(output_dir)?;

    let summary = run_batch(&input_dir, &config)
        .with_context(|| format!("Extraction failed for {}", input_dir.display()))?;

    info!(
        pages_found = summary.pages_found,
        pages_processed = summary.pages_processed,
        pages_skipped = summary.pages_skipped,
        glyphs_saved = summary.glyphs_saved,
        output_dir = %config.output.output_dir.display(),
        "Done"
    );
    Ok(())
}
