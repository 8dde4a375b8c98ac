//! # Extraction Configuration
//!
//! All heuristic thresholds of the pipeline live here as named fields instead
//! of inline literals. `Default` carries the values of the refined extractor;
//! [`ExtractionConfig::baseline`] carries the older, looser extractor so both
//! can be compared on the same pages. Values can be overridden from the
//! environment with [`ExtractionConfig::from_env`].

use crate::errors::{ExtractionError, ExtractionResult};
use crate::preprocessing::{MorphologicalOperation, MorphologyStep, StructuringElement};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// One adaptive threshold pass: Gaussian neighbourhood size and the constant
/// subtracted from the local mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdScale {
    /// Neighbourhood size in pixels (odd, >= 3)
    pub block_size: u32,
    /// Offset subtracted from the Gaussian-weighted local mean
    pub offset: f32,
}

/// How the per-scale binarizations are merged into one mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleCombine {
    /// Ink only where every scale marks ink
    #[default]
    Unanimous,
    /// Ink where any scale marks ink
    Any,
}

/// Decides whether the merged threshold mask has to be inverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolarityCheck {
    /// Invert when ink pixels outnumber background pixels over the whole page
    #[default]
    InkMajority,
    /// Invert when the central half of the page averages below mid-gray
    CentralMean,
}

/// Preprocessing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Run CLAHE before binarization
    pub clahe_enabled: bool,
    /// CLAHE clip limit, relative to a uniform histogram
    pub clahe_clip_limit: f32,
    /// CLAHE tile grid (columns, rows)
    pub clahe_tile_grid: (u32, u32),
    /// Adaptive threshold passes, smallest neighbourhood first
    pub threshold_scales: Vec<ThresholdScale>,
    /// Merge rule for the passes
    pub combine: ScaleCombine,
    /// Polarity normalization of the merged mask
    pub polarity: PolarityCheck,
    /// Median filter radius (1 = 3x3, 0 = off)
    pub median_radius: u32,
    /// Cleanup passes run in order after the median filter
    pub morphology: Vec<MorphologyStep>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            clahe_enabled: true,
            clahe_clip_limit: 2.0,
            clahe_tile_grid: (8, 8),
            threshold_scales: vec![
                ThresholdScale {
                    block_size: 11,
                    offset: 5.0,
                },
                ThresholdScale {
                    block_size: 21,
                    offset: 8.0,
                },
                ThresholdScale {
                    block_size: 31,
                    offset: 10.0,
                },
            ],
            combine: ScaleCombine::Unanimous,
            polarity: PolarityCheck::InkMajority,
            median_radius: 1,
            morphology: vec![
                MorphologyStep {
                    operation: MorphologicalOperation::Closing,
                    element: StructuringElement::Ellipse3,
                },
                MorphologyStep {
                    operation: MorphologicalOperation::Opening,
                    element: StructuringElement::Ellipse2,
                },
            ],
        }
    }
}

impl PreprocessConfig {
    /// Validate preprocessing configuration
    pub fn validate(&self) -> ExtractionResult<()> {
        if self.clahe_clip_limit <= 0.0 {
            return Err(ExtractionError::Config(format!(
                "CLAHE clip limit must be > 0.0, got {}",
                self.clahe_clip_limit
            )));
        }
        if self.clahe_tile_grid.0 == 0 || self.clahe_tile_grid.1 == 0 {
            return Err(ExtractionError::Config(
                "CLAHE tile grid dimensions must be > 0".to_string(),
            ));
        }
        if self.threshold_scales.is_empty() {
            return Err(ExtractionError::Config(
                "At least one threshold scale is required".to_string(),
            ));
        }
        for scale in &self.threshold_scales {
            if scale.block_size < 3 || scale.block_size % 2 == 0 {
                return Err(ExtractionError::Config(format!(
                    "Threshold block size must be odd and >= 3, got {}",
                    scale.block_size
                )));
            }
        }
        Ok(())
    }
}

/// Line detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineConfig {
    /// Sigma of the Gaussian used to smooth the row projection
    pub smoothing_sigma: f32,
    /// Percentile (0-100) of positive smoothed values used as threshold
    pub threshold_percentile: f32,
    /// Shortest run of rows above threshold that counts as a line
    pub min_line_height: u32,
    /// Rows added above and below every detected line
    pub padding: u32,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            smoothing_sigma: 2.0,
            threshold_percentile: 20.0,
            min_line_height: 20,
            padding: 5,
        }
    }
}

impl LineConfig {
    /// Validate line detection configuration
    pub fn validate(&self) -> ExtractionResult<()> {
        if self.smoothing_sigma <= 0.0 {
            return Err(ExtractionError::Config(
                "Line smoothing sigma must be > 0.0".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.threshold_percentile) {
            return Err(ExtractionError::Config(format!(
                "Line threshold percentile must be within 0-100, got {}",
                self.threshold_percentile
            )));
        }
        if self.min_line_height == 0 {
            return Err(ExtractionError::Config(
                "Minimum line height cannot be 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Character segmentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    /// Minimum ink pixel count of a component
    pub min_area: u32,
    /// Accepted width/height range
    pub min_aspect: f32,
    pub max_aspect: f32,
    /// White border added around every glyph bitmap
    pub padding: u32,
    /// Invert a cropped glyph whose mean intensity is below mid-gray
    pub polarity_fix: bool,
    /// Run the omega detector
    pub omega_detection: bool,
    /// Width/height at which a component may be an omega
    pub omega_min_aspect: f32,
    /// Component count after erosion that identifies an omega
    pub omega_parts: (u32, u32),
    /// Run the touching-character splitter
    pub split_touching: bool,
    /// Width/height above which a component is considered for splitting
    pub split_min_aspect: f32,
    /// A valley qualifies when below this fraction of the middle-third maximum
    pub split_valley_ratio: f32,
    /// Both halves of a split must be wider than this
    pub min_split_width: u32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            min_width: 5,
            min_height: 10,
            max_width: 150,
            max_height: 150,
            min_area: 50,
            min_aspect: 0.2,
            max_aspect: 3.0,
            padding: 8,
            polarity_fix: false,
            omega_detection: true,
            omega_min_aspect: 1.3,
            omega_parts: (2, 3),
            split_touching: true,
            split_min_aspect: 1.8,
            split_valley_ratio: 0.3,
            min_split_width: 5,
        }
    }
}

impl SegmentationConfig {
    /// Validate segmentation configuration
    pub fn validate(&self) -> ExtractionResult<()> {
        if self.min_width > self.max_width || self.min_height > self.max_height {
            return Err(ExtractionError::Config(
                "Minimum glyph dimensions cannot exceed maximum dimensions".to_string(),
            ));
        }
        if self.min_aspect <= 0.0 || self.min_aspect >= self.max_aspect {
            return Err(ExtractionError::Config(format!(
                "Aspect range must satisfy 0 < min < max, got [{}, {}]",
                self.min_aspect, self.max_aspect
            )));
        }
        if self.omega_parts.0 > self.omega_parts.1 {
            return Err(ExtractionError::Config(
                "Omega part range is inverted".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.split_valley_ratio) {
            return Err(ExtractionError::Config(format!(
                "Split valley ratio must be within 0.0-1.0, got {}",
                self.split_valley_ratio
            )));
        }
        Ok(())
    }
}

/// Which of the two scoring formulas to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringProfile {
    /// Ideal ink ratio 15%, weights 0.3/0.3/0.2/0.2 with size plausibility
    #[default]
    Refined,
    /// Ink band 10-40%, weights 0.4/0.3/0.3, no size term
    Baseline,
}

impl FromStr for ScoringProfile {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "refined" => Ok(ScoringProfile::Refined),
            "baseline" => Ok(ScoringProfile::Baseline),
            other => Err(ExtractionError::Config(format!(
                "Unknown scoring profile '{}', expected 'refined' or 'baseline'",
                other
            ))),
        }
    }
}

/// Quality scoring settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    pub profile: ScoringProfile,
    /// Glyphs scoring at or below this are not persisted
    pub cutoff: f32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            profile: ScoringProfile::Refined,
            cutoff: 0.3,
        }
    }
}

impl QualityConfig {
    /// Validate quality configuration
    pub fn validate(&self) -> ExtractionResult<()> {
        if !(0.0..=1.0).contains(&self.cutoff) {
            return Err(ExtractionError::Config(format!(
                "Quality cutoff must be within 0.0-1.0, got {}",
                self.cutoff
            )));
        }
        Ok(())
    }
}

/// How glyph PNG files are named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingScheme {
    /// `char_0042_q67.png`, by extraction order
    #[default]
    Sequential,
    /// `char_<content key>.png`, stable across re-runs
    ContentKey,
}

impl FromStr for NamingScheme {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(NamingScheme::Sequential),
            "content_key" | "content-key" => Ok(NamingScheme::ContentKey),
            other => Err(ExtractionError::Config(format!(
                "Unknown naming scheme '{}', expected 'sequential' or 'content_key'",
                other
            ))),
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory; each page gets `<root>/<page stem>/`
    pub output_dir: PathBuf,
    pub naming: NamingScheme,
    /// Upper bound on glyphs written for one page, best first
    pub max_glyphs_per_page: Option<usize>,
    /// Also write `<root>/<stem>_preprocessed.png`
    pub save_preprocessed: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("glyphs_improved"),
            naming: NamingScheme::Sequential,
            max_glyphs_per_page: Some(2000),
            save_preprocessed: true,
        }
    }
}

impl OutputConfig {
    /// Validate output configuration
    pub fn validate(&self) -> ExtractionResult<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(ExtractionError::Config(
                "Output directory cannot be empty".to_string(),
            ));
        }
        if self.max_glyphs_per_page == Some(0) {
            return Err(ExtractionError::Config(
                "Max glyphs per page cannot be 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub preprocess: PreprocessConfig,
    pub lines: LineConfig,
    pub segmentation: SegmentationConfig,
    pub quality: QualityConfig,
    pub output: OutputConfig,
}

impl ExtractionConfig {
    /// Thresholds of the first extractor.
    ///
    /// A single 21px threshold pass without CLAHE or median filtering, a
    /// central-region polarity check, opening then closing with a 2x2 square,
    /// coarser line smoothing, looser size gates, per-glyph polarity fixing
    /// and the band-based scoring formula.
    pub fn baseline() -> Self {
        Self {
            preprocess: PreprocessConfig {
                clahe_enabled: false,
                threshold_scales: vec![ThresholdScale {
                    block_size: 21,
                    offset: 10.0,
                }],
                polarity: PolarityCheck::CentralMean,
                median_radius: 0,
                morphology: vec![
                    MorphologyStep {
                        operation: MorphologicalOperation::Opening,
                        element: StructuringElement::Square2,
                    },
                    MorphologyStep {
                        operation: MorphologicalOperation::Closing,
                        element: StructuringElement::Square2,
                    },
                ],
                ..PreprocessConfig::default()
            },
            lines: LineConfig {
                smoothing_sigma: 3.0,
                threshold_percentile: 25.0,
                min_line_height: 15,
                padding: 5,
            },
            segmentation: SegmentationConfig {
                min_width: 8,
                min_height: 8,
                max_width: 200,
                max_height: 200,
                min_area: 40,
                min_aspect: 0.15,
                max_aspect: 4.0,
                padding: 5,
                polarity_fix: true,
                omega_detection: false,
                split_touching: false,
                ..SegmentationConfig::default()
            },
            quality: QualityConfig {
                profile: ScoringProfile::Baseline,
                cutoff: 0.3,
            },
            output: OutputConfig::default(),
        }
    }

    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> ExtractionResult<Self> {
        let mut config = match env::var("GLYPHS_PRESET") {
            Ok(preset) if preset.trim().eq_ignore_ascii_case("baseline") => Self::baseline(),
            _ => Self::default(),
        };

        if let Ok(dir) = env::var("GLYPHS_OUTPUT_DIR") {
            config.output.output_dir = PathBuf::from(dir);
        }
        if let Ok(cutoff) = env::var("GLYPHS_QUALITY_CUTOFF") {
            config.quality.cutoff = cutoff.parse().map_err(|_| {
                ExtractionError::Config("GLYPHS_QUALITY_CUTOFF must be a valid number".to_string())
            })?;
        }
        if let Ok(profile) = env::var("GLYPHS_SCORING_PROFILE") {
            config.quality.profile = profile.parse()?;
        }
        if let Ok(max) = env::var("GLYPHS_MAX_PER_PAGE") {
            config.output.max_glyphs_per_page = if max.trim().eq_ignore_ascii_case("none") {
                None
            } else {
                Some(max.parse().map_err(|_| {
                    ExtractionError::Config(
                        "GLYPHS_MAX_PER_PAGE must be a valid number or 'none'".to_string(),
                    )
                })?)
            };
        }
        if let Ok(naming) = env::var("GLYPHS_NAMING") {
            config.output.naming = naming.parse()?;
        }
        if let Ok(save) = env::var("GLYPHS_SAVE_PREPROCESSED") {
            config.output.save_preprocessed = save.to_lowercase() == "true";
        }
        if let Ok(sigma) = env::var("GLYPHS_LINE_SIGMA") {
            config.lines.smoothing_sigma = sigma.parse().map_err(|_| {
                ExtractionError::Config("GLYPHS_LINE_SIGMA must be a valid number".to_string())
            })?;
        }
        if let Ok(percentile) = env::var("GLYPHS_LINE_PERCENTILE") {
            config.lines.threshold_percentile = percentile.parse().map_err(|_| {
                ExtractionError::Config(
                    "GLYPHS_LINE_PERCENTILE must be a valid number".to_string(),
                )
            })?;
        }

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> ExtractionResult<()> {
        self.preprocess.validate()?;
        self.lines.validate()?;
        self.segmentation.validate()?;
        self.quality.validate()?;
        self.output.validate()?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: output_dir={}, scales={}, clahe={}, line_sigma={}, line_percentile={}, profile={:?}, cutoff={}, naming={:?}",
            self.output.output_dir.display(),
            self.preprocess.threshold_scales.len(),
            self.preprocess.clahe_enabled,
            self.lines.smoothing_sigma,
            self.lines.threshold_percentile,
            self.quality.profile,
            self.quality.cutoff,
            self.output.naming
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = ExtractionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.preprocess.threshold_scales.len(), 3);
        assert_eq!(config.quality.cutoff, 0.3);
    }

    #[test]
    fn test_baseline_config_validation() {
        let config = ExtractionConfig::baseline();
        assert!(config.validate().is_ok());
        assert_eq!(config.quality.profile, ScoringProfile::Baseline);
        assert_eq!(config.lines.min_line_height, 15);
        assert_eq!(config.segmentation.max_aspect, 4.0);
        assert!(config.segmentation.polarity_fix);
    }

    #[test]
    fn test_baseline_preprocessing_chain() {
        let config = ExtractionConfig::baseline().preprocess;
        assert!(!config.clahe_enabled);
        assert_eq!(config.median_radius, 0);
        assert_eq!(config.polarity, PolarityCheck::CentralMean);
        assert_eq!(
            config.morphology,
            vec![
                MorphologyStep {
                    operation: MorphologicalOperation::Opening,
                    element: StructuringElement::Square2,
                },
                MorphologyStep {
                    operation: MorphologicalOperation::Closing,
                    element: StructuringElement::Square2,
                },
            ]
        );
    }

    #[test]
    fn test_default_preprocessing_chain() {
        let config = PreprocessConfig::default();
        assert_eq!(config.median_radius, 1);
        assert_eq!(config.polarity, PolarityCheck::InkMajority);
        assert_eq!(config.morphology.len(), 2);
        assert_eq!(config.morphology[0].element, StructuringElement::Ellipse3);
        assert_eq!(
            config.morphology[1],
            MorphologyStep {
                operation: MorphologicalOperation::Opening,
                element: StructuringElement::Ellipse2,
            }
        );
        assert!(!SegmentationConfig::default().polarity_fix);
    }

    #[test]
    fn test_preprocess_config_validation() {
        let mut config = PreprocessConfig::default();
        config.threshold_scales = vec![ThresholdScale {
            block_size: 10,
            offset: 5.0,
        }];
        assert!(config.validate().is_err());

        config.threshold_scales.clear();
        assert!(config.validate().is_err());

        let config = PreprocessConfig {
            clahe_clip_limit: 0.0,
            ..PreprocessConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_line_config_validation() {
        let config = LineConfig {
            threshold_percentile: 120.0,
            ..LineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = LineConfig {
            min_line_height: 0,
            ..LineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_segmentation_config_validation() {
        let config = SegmentationConfig {
            min_aspect: 3.0,
            max_aspect: 2.0,
            ..SegmentationConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SegmentationConfig {
            min_width: 300,
            ..SegmentationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_quality_and_output_validation() {
        let quality = QualityConfig {
            cutoff: 1.5,
            ..QualityConfig::default()
        };
        assert!(quality.validate().is_err());

        let output = OutputConfig {
            max_glyphs_per_page: Some(0),
            ..OutputConfig::default()
        };
        assert!(output.validate().is_err());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("Baseline".parse::<ScoringProfile>().ok(), Some(ScoringProfile::Baseline));
        assert!("fancy".parse::<ScoringProfile>().is_err());
        assert_eq!(
            "content-key".parse::<NamingScheme>().ok(),
            Some(NamingScheme::ContentKey)
        );
    }

    #[test]
    fn test_config_serde_round_trip_shape() {
        let json = serde_json::to_value(ExtractionConfig::default()).unwrap();
        assert_eq!(json["quality"]["profile"], "refined");
        assert_eq!(json["preprocess"]["combine"], "unanimous");
        assert_eq!(json["preprocess"]["polarity"], "ink_majority");
        assert_eq!(json["preprocess"]["morphology"][1]["element"], "ellipse2");
        assert_eq!(json["output"]["naming"], "sequential");
    }
}
