use anyhow::{Context, Result};
use sinaiticus_glyphs::observability;
use sinaiticus_glyphs::review::build_review_manifest;
use std::env;
use std::path::PathBuf;
use tracing::info;

const USAGE: &str = "Usage: prepare-review <glyphs_dir> <review_dir>";

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    observability::init_tracing().context("Failed to initialize logging")?;

    let mut args = env::args().skip(1);
    let (glyphs_dir, review_dir) = match (args.next(), args.next()) {
        (Some(glyphs), Some(review)) => (PathBuf::from(glyphs), PathBuf::from(review)),
        _ => return Err(anyhow::anyhow!("{}", USAGE)),
    };

    let manifest = build_review_manifest(&glyphs_dir, &review_dir).with_context(|| {
        format!(
            "Failed to prepare review letters from {}",
            glyphs_dir.display()
        )
    })?;

    info!(
        letters = manifest.letters.len(),
        with_bbox = manifest.with_bbox_count(),
        manifest = %review_dir.join("manifest.json").display(),
        "Letters prepared for review"
    );
    Ok(())
}
