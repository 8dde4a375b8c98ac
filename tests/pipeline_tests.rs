//! # Pipeline Integration Tests
//!
//! End-to-end tests of page processing, batch runs and persisted output on
//! synthetic manuscript pages.

mod test_helpers;

#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use sinaiticus_glyphs::config::{ExtractionConfig, LineConfig, NamingScheme};
    use sinaiticus_glyphs::lines::detect_lines;
    use sinaiticus_glyphs::persist::{load_metadata, QUALITY_STATS_FILE};
    use sinaiticus_glyphs::pipeline::{process_page, run_batch};
    use std::fs;
    use tempfile::TempDir;

    fn config_with_output(output: &std::path::Path) -> ExtractionConfig {
        let mut config = ExtractionConfig::default();
        config.output.output_dir = output.to_path_buf();
        config
    }

    /// Three 40px bands on a 2000x3000 page give exactly three lines
    #[test]
    fn test_three_bands_give_three_lines() {
        let mask = banded_mask(2000, 3000, &[(400, 40), (1200, 40), (2200, 40)]);
        let lines = detect_lines(&mask, &LineConfig::default());

        assert_eq!(lines.len(), 3);
        assert!(lines.windows(2).all(|pair| pair[0].start_row <= pair[1].start_row));
        assert!(lines[0].contains_rows(400, 440));
        assert!(lines[1].contains_rows(1200, 1240));
        assert!(lines[2].contains_rows(2200, 2240));
        assert!(lines.iter().all(|line| line.end_row <= 3000));
    }

    #[test]
    fn test_synthetic_page_extraction() {
        let (page, letters) = three_line_page();
        let extraction = process_page(&page, "folio.png", &ExtractionConfig::default())
            .expect("Page processing should succeed");

        assert_eq!(extraction.lines.len(), 3);
        assert_eq!(extraction.glyphs.len(), letters.len());

        for glyph in &extraction.glyphs {
            let center_x = glyph.bbox.x + glyph.bbox.width / 2;
            let center_y = glyph.bbox.y + glyph.bbox.height / 2;
            assert!(
                letters.iter().any(|l| l.contains_point(center_x, center_y)),
                "glyph {:?} does not match any drawn letter",
                glyph.bbox
            );
            assert!(!glyph.is_omega);
            assert!(glyph.quality > 0.3, "ring letters should pass the cutoff");
        }
    }

    #[test]
    fn test_glyph_boxes_lie_within_page_and_line() {
        let (page, _) = three_line_page();
        let extraction = process_page(&page, "folio.png", &ExtractionConfig::default())
            .expect("Page processing should succeed");

        for glyph in &extraction.glyphs {
            assert!(glyph
                .bbox
                .fits_within(extraction.page_width, extraction.page_height));
            let line = extraction.lines[glyph.line];
            assert!(line.contains_rows(glyph.bbox.y, glyph.bbox.bottom()));
        }

        // Extraction order is line by line, left to right
        for pair in extraction.glyphs.windows(2) {
            assert!(
                pair[0].line < pair[1].line
                    || (pair[0].line == pair[1].line && pair[0].bbox.x <= pair[1].bbox.x)
            );
            assert_eq!(pair[0].id + 1, pair[1].id);
        }
    }

    #[test]
    fn test_processing_is_deterministic() {
        let (page, _) = three_line_page();
        let config = ExtractionConfig::default();

        let first = process_page(&page, "folio.png", &config).expect("first run");
        let second = process_page(&page, "folio.png", &config).expect("second run");

        assert_eq!(first.lines, second.lines);
        assert_eq!(first.glyphs.len(), second.glyphs.len());
        for (a, b) in first.glyphs.iter().zip(&second.glyphs) {
            assert_eq!(a.bbox, b.bbox);
            assert_eq!(a.key, b.key);
            assert_eq!(a.quality, b.quality);
            assert_eq!(a.bitmap, b.bitmap);
        }
    }

    #[test]
    fn test_baseline_preset_extracts_same_letters() {
        let (page, letters) = three_line_page();
        let extraction = process_page(&page, "folio.png", &ExtractionConfig::baseline())
            .expect("Page processing should succeed");

        assert_eq!(extraction.lines.len(), 3);
        assert_eq!(extraction.glyphs.len(), letters.len());
    }

    #[test]
    fn test_batch_run_persists_pages_and_skips_broken_ones() {
        let input = TempDir::new().expect("input dir should be created");
        let output = TempDir::new().expect("output dir should be created");

        let (page, letters) = three_line_page();
        write_page(input.path(), "folio_1r.png", &page);
        fs::write(input.path().join("broken.jpg"), b"not an image").expect("write broken page");
        fs::write(input.path().join("notes.txt"), b"ignored").expect("write notes");

        let config = config_with_output(output.path());
        let summary = run_batch(input.path(), &config).expect("Batch run should succeed");

        assert_eq!(summary.pages_found, 2);
        assert_eq!(summary.pages_processed, 1);
        assert_eq!(summary.pages_skipped, 1);
        assert_eq!(summary.glyphs_extracted, letters.len());
        assert_eq!(summary.glyphs_saved, letters.len());

        let page_dir = output.path().join("folio_1r");
        let metadata = load_metadata(&page_dir).expect("metadata should load");
        assert_eq!(metadata.source_image, "folio_1r.png");
        assert_eq!(metadata.characters.len(), letters.len());

        // Best first, and every listed file exists
        for pair in metadata.characters.windows(2) {
            assert!(pair[0].quality >= pair[1].quality);
        }
        for record in &metadata.characters {
            assert!(page_dir.join(&record.file).exists());
            assert!(record.file.starts_with("char_"));
            assert_eq!(record.key.len(), 16);
        }

        let stats: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(page_dir.join(QUALITY_STATS_FILE)).expect("stats should exist"),
        )
        .expect("stats should be valid JSON");
        assert_eq!(stats["total_extracted"], letters.len());
        assert_eq!(stats["saved"], letters.len());
        assert_eq!(stats["omega_detected"], 0);

        assert!(output.path().join("folio_1r_preprocessed.png").exists());
        assert!(!output.path().join("broken").exists());
    }

    #[test]
    fn test_page_with_mismatched_extension_is_decoded() {
        let input = TempDir::new().expect("input dir should be created");
        let output = TempDir::new().expect("output dir should be created");

        // PNG bytes behind a .jpg name
        let (page, letters) = three_line_page();
        let png = write_page(input.path(), "folio_4r.png", &page);
        fs::rename(&png, input.path().join("folio_4r.jpg")).expect("rename page");

        let config = config_with_output(output.path());
        let summary = run_batch(input.path(), &config).expect("Batch run should succeed");

        assert_eq!(summary.pages_found, 1);
        assert_eq!(summary.pages_processed, 1);
        assert_eq!(summary.pages_skipped, 0);
        assert_eq!(summary.glyphs_extracted, letters.len());

        let metadata =
            load_metadata(&output.path().join("folio_4r")).expect("metadata should load");
        assert_eq!(metadata.source_image, "folio_4r.jpg");
    }

    #[test]
    fn test_content_key_naming() {
        let input = TempDir::new().expect("input dir should be created");
        let output = TempDir::new().expect("output dir should be created");

        let (page, _) = three_line_page();
        write_page(input.path(), "folio_2v.png", &page);

        let mut config = config_with_output(output.path());
        config.output.naming = NamingScheme::ContentKey;
        config.output.save_preprocessed = false;
        run_batch(input.path(), &config).expect("Batch run should succeed");

        let metadata =
            load_metadata(&output.path().join("folio_2v")).expect("metadata should load");
        for record in &metadata.characters {
            assert_eq!(record.file, format!("char_{}.png", record.key));
        }
        assert!(!output.path().join("folio_2v_preprocessed.png").exists());
    }

    #[test]
    fn test_cutoff_above_all_scores_saves_nothing() {
        let input = TempDir::new().expect("input dir should be created");
        let output = TempDir::new().expect("output dir should be created");

        let (page, letters) = three_line_page();
        write_page(input.path(), "folio_3r.png", &page);

        let mut config = config_with_output(output.path());
        config.quality.cutoff = 1.0;
        let summary = run_batch(input.path(), &config).expect("Batch run should succeed");

        assert_eq!(summary.pages_processed, 1);
        assert_eq!(summary.glyphs_extracted, letters.len());
        assert_eq!(summary.glyphs_saved, 0);

        let metadata =
            load_metadata(&output.path().join("folio_3r")).expect("metadata should load");
        assert!(metadata.characters.is_empty());
    }
}
