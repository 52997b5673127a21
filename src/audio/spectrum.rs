// Magnitude spectrum strategies
// The default strategy treats a window's sample magnitudes as its spectrum;
// a Hann-windowed real FFT is available behind the `fft` feature.

use serde::{Deserialize, Serialize};

#[cfg(feature = "fft")]
use realfft::RealFftPlanner;

/// Bins handed to the classifier (bin count of a 4096-point analyser frame)
pub const CLASSIFIER_BINS: usize = 2048;

/// How a window of samples is turned into per-bin magnitudes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrumStrategy {
    /// |x[i]| used as the magnitude of bin i. Classifier thresholds are tuned
    /// against this approximation.
    #[default]
    MagnitudeApprox,

    /// True magnitude spectrum. Classifier thresholds are not retuned for it.
    #[cfg(feature = "fft")]
    Fft,
}

/// Per-sample absolute value of a window
pub fn magnitude_approx(window: &[f32]) -> Vec<f32> {
    window.iter().map(|s| s.abs()).collect()
}

/// Build the fixed-size magnitude array the classifier works on
///
/// Short segments are zero-padded; long segments contribute only their
/// first frame.
pub fn classifier_spectrum(segment: &[f32], strategy: SpectrumStrategy) -> Vec<f32> {
    match strategy {
        SpectrumStrategy::MagnitudeApprox => {
            let mut frame = vec![0.0; CLASSIFIER_BINS];
            let copy_len = segment.len().min(CLASSIFIER_BINS);
            frame[..copy_len].copy_from_slice(&magnitude_approx(&segment[..copy_len]));
            frame
        }
        #[cfg(feature = "fft")]
        SpectrumStrategy::Fft => fft_spectrum(segment),
    }
}

#[cfg(feature = "fft")]
fn fft_spectrum(segment: &[f32]) -> Vec<f32> {
    let frame_size = CLASSIFIER_BINS * 2;
    let mut frame = vec![0.0f32; frame_size];
    let copy_len = segment.len().min(frame_size);
    frame[..copy_len].copy_from_slice(&segment[..copy_len]);

    // Hann window to reduce spectral leakage
    for (i, sample) in frame.iter_mut().enumerate() {
        let w = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / frame_size as f32).cos());
        *sample *= w;
    }

    let mut planner = RealFftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(frame_size);
    let mut spectrum = fft.make_output_vec();

    // Lengths come from the planner, so processing cannot fail on size
    if fft.process(&mut frame, &mut spectrum).is_err() {
        return vec![0.0; CLASSIFIER_BINS];
    }

    spectrum
        .iter()
        .take(CLASSIFIER_BINS)
        .map(|c| c.norm())
        .collect()
}
