use crate::db::models::LocationReading;
use crate::segmentation::config::SegmentationConfig;

/// Confidence for a run of `consecutive_readings` readings:
/// `min(cap, baseline + step * (count - 1))`, never above 100.
pub fn compute_confidence(consecutive_readings: usize, config: &SegmentationConfig) -> u8 {
    let cap = u64::from(config.max_confidence.min(100));
    let extra = consecutive_readings.saturating_sub(1) as u64;
    let raw = u64::from(config.baseline_confidence)
        .saturating_add(u64::from(config.confidence_step).saturating_mul(extra));

    // cap <= 100, so the narrowing below cannot truncate
    raw.min(cap) as u8
}

/// Mean of the accuracies that are present; `None` when no reading has one.
pub fn average_accuracy(readings: &[LocationReading]) -> Option<f64> {
    let (sum, count) = readings
        .iter()
        .filter_map(|r| r.accuracy)
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));

    if count > 0 {
        Some(sum / count as f64)
    } else {
        None
    }
}
