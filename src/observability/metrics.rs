//! Metrics recording module.
//!
//! Counters and histograms go through the `metrics` facade. No exporter is
//! installed by the binaries, so recording is a no-op unless an embedding
//! application installs a recorder.

/// Record the outcome of one processed page
pub fn record_page_metrics(success: bool, duration: std::time::Duration) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!("pages_processed_total", "result" => result).increment(1);
    if !success {
        metrics::counter!("pages_failed_total").increment(1);
    }
    metrics::histogram!("page_processing_duration_seconds").record(duration.as_secs_f64());
}

/// Record how many glyphs a page produced and how many were written
pub fn record_glyph_metrics(extracted: usize, saved: usize, omega_detected: usize) {
    metrics::counter!("glyphs_extracted_total").increment(extracted as u64);
    metrics::counter!("glyphs_saved_total").increment(saved as u64);
    metrics::counter!("omega_detected_total").increment(omega_detected as u64);
}

/// Record the number of detected text lines on a page
pub fn record_line_metrics(lines: usize) {
    metrics::histogram!("lines_per_page").record(lines as f64);
}

/// Record errors by type and pipeline stage
pub fn record_error_metrics(error_type: &str, stage: &str) {
    let error_type = error_type.to_string();
    let stage = stage.to_string();
    metrics::counter!("extraction_errors_total", "error_type" => error_type, "stage" => stage)
        .increment(1);
}

/// Record the size of a generated review manifest
pub fn record_review_metrics(letters: usize, duration: std::time::Duration) {
    metrics::counter!("review_letters_total").increment(letters as u64);
    metrics::histogram!("review_manifest_duration_seconds").record(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_page_metrics(true, std::time::Duration::from_millis(5));
        record_page_metrics(false, std::time::Duration::from_millis(5));
        record_glyph_metrics(10, 7, 1);
        record_line_metrics(3);
        record_error_metrics("ImageLoad", "load");
        record_review_metrics(4, std::time::Duration::from_millis(1));
    }
}
