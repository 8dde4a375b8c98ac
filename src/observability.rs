//! Observability module for metrics, tracing and logging setup.
//!
//! This module provides:
//! - Structured logging with configurable format and level
//! - Page and review tracing spans
//! - Extraction counters and timings through the `metrics` facade

pub mod metrics;
pub mod tracing_mod;

pub use self::metrics::{
    record_error_metrics, record_glyph_metrics, record_line_metrics, record_page_metrics,
    record_review_metrics,
};
pub use self::tracing_mod::{init_tracing, page_span, review_span};
