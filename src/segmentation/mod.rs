pub mod algorithm;
pub mod config;
pub mod scoring;

pub use algorithm::{group_readings, segment_readings, ReadingGroup};
pub use config::SegmentationConfig;
pub use scoring::compute_confidence;
