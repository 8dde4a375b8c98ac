//! Tracing and logging setup module.
//!
//! This module provides:
//! - Structured logging configuration
//! - Tracing span creation utilities

use anyhow::Result;
use tracing_subscriber::prelude::*;

/// Initialize structured logging with tracing
///
/// `LOG_FORMAT=json` selects JSON lines, anything else human-readable output.
/// `LOG_LEVEL` sets the crate level (default `info`); `RUST_LOG` directives
/// are honored on top of that.
pub fn init_tracing() -> Result<()> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("sinaiticus_glyphs={}", log_level).parse()?)
        .add_directive(format!("glyph_extraction={}", log_level).parse()?);

    if log_format != "json" {
        // Pretty formatting for interactive runs (default)
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init()?;
    } else {
        // JSON formatting for log collection
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    }

    tracing::info!(
        log_format = %log_format,
        log_level = %log_level,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Create a span covering the processing of one page
pub fn page_span(source_image: &str) -> tracing::Span {
    tracing::info_span!(
        "page_extraction",
        source_image = source_image,
        component = "pipeline"
    )
}

/// Create a span for review manifest generation
pub fn review_span(glyphs_root: &str) -> tracing::Span {
    tracing::info_span!(
        "review_manifest",
        glyphs_root = glyphs_root,
        component = "review"
    )
}
