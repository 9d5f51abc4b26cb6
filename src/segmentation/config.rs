use serde::{Deserialize, Serialize};

/// Tunables for segmentation and confidence scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Confidence of a single-reading segment.
    pub baseline_confidence: u8,

    /// Added per reading beyond the first.
    pub confidence_step: u8,

    /// Upper bound on confidence; values above 100 are treated as 100.
    pub max_confidence: u8,

    /// Close a run when consecutive readings are further apart than this.
    /// Off by default: only a region change ends a run.
    pub max_gap_secs: Option<u64>,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            baseline_confidence: 70,
            confidence_step: 5,
            max_confidence: 100,
            max_gap_secs: None,
        }
    }
}
