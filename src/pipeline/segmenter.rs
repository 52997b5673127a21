// Segmenter
// Turns fused boundaries into non-overlapping regions and classified samples

use std::sync::Arc;

use crate::audio::features::segment_slice;
use crate::audio::PcmBuffer;
use crate::events::HeuristicClassifier;
use crate::state::Sample;

/// Length given to the region after the last boundary
pub const FALLBACK_DURATION_SECS: f64 = 0.5;

/// A candidate sample region in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub start: f64,
    pub duration: f64,
}

/// Cut regions between consecutive boundaries
///
/// Each region runs to the next boundary; the last one gets
/// [`FALLBACK_DURATION_SECS`]. Regions shorter than half of
/// `min_length_ms` are dropped.
pub fn segment_regions(boundaries: &[f64], min_length_ms: f32) -> Vec<Region> {
    let min_duration_ms = min_length_ms as f64 / 2.0;

    boundaries
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let duration = match boundaries.get(i + 1) {
                Some(&next) => next - start,
                None => FALLBACK_DURATION_SECS,
            };
            Region { start, duration }
        })
        .filter(|region| region.duration * 1000.0 >= min_duration_ms)
        .collect()
}

/// Classify each region and build named samples
///
/// Ordinals are dense: numbering counts only the regions that survived
/// filtering, starting at 1.
pub fn build_samples(
    regions: &[Region],
    buffer: &Arc<PcmBuffer>,
    classifier: &HeuristicClassifier,
) -> Vec<Sample> {
    regions
        .iter()
        .enumerate()
        .map(|(i, region)| {
            let segment = segment_slice(buffer, region.start, region.duration);
            let result = classifier.classify_segment(segment, buffer.sample_rate);

            log::debug!(
                "Region {:.3}s+{:.3}s -> {} ({:?})",
                region.start,
                region.duration,
                result.label.as_str(),
                result.features
            );

            Sample::new(
                format!("{} Sample {}", result.label.display_name(), i + 1),
                result.sample_type,
                region.start,
                region.duration,
                Some(Arc::clone(buffer)),
            )
        })
        .collect()
}
