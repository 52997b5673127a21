// Segment feature extraction
// Computes the four measures the instrument classifier decides on

use crate::audio::signal::{attack_time, harmonicity, samples_for, spectral_centroid, spectral_flux};
use crate::audio::spectrum::{classifier_spectrum, SpectrumStrategy};
use crate::audio::PcmBuffer;
use crate::events::types::SegmentFeatures;

/// Extract classifier features from a run of samples
pub fn extract_features(
    samples: &[f32],
    sample_rate: u32,
    strategy: SpectrumStrategy,
) -> SegmentFeatures {
    if samples.is_empty() || sample_rate == 0 {
        return SegmentFeatures::zero();
    }

    let spectrum = classifier_spectrum(samples, strategy);

    SegmentFeatures {
        spectral_centroid: spectral_centroid(&spectrum, sample_rate),
        spectral_flux: spectral_flux(samples, sample_rate),
        attack_time: attack_time(samples, sample_rate),
        harmonicity: harmonicity(&spectrum),
    }
}

/// Slice `[start, start + duration)` out of the primary channel
///
/// Regions running past the end are truncated; regions starting past it
/// are empty.
pub fn segment_slice(buffer: &PcmBuffer, start_secs: f64, duration_secs: f64) -> &[f32] {
    let data = buffer.primary_channel();
    let start = samples_for(start_secs.max(0.0), buffer.sample_rate);
    let length = samples_for(duration_secs.max(0.0), buffer.sample_rate);

    if start >= data.len() {
        return &[];
    }
    let end = start.saturating_add(length).min(data.len());
    &data[start..end]
}
