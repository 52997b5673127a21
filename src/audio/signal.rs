// Signal primitives
// Windowed energy, envelope following and the spectral/temporal measures
// the classifier is built on. Every division guards its denominator.

use crate::audio::spectrum::magnitude_approx;

/// Number of samples in `seconds` at `sample_rate`, rounded down
pub fn samples_for(seconds: f64, sample_rate: u32) -> usize {
    (seconds * sample_rate as f64).floor() as usize
}

/// 10 ms analysis window
pub fn energy_window_size(sample_rate: u32) -> usize {
    samples_for(0.01, sample_rate)
}

/// Root-mean-square of a window, 0 for an empty window
pub fn rms(window: &[f32]) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = window.iter().map(|s| s * s).sum();
    (sum_squares / window.len() as f32).sqrt()
}

/// Lazy per-window RMS, see [`rms_windows`]
pub type RmsWindows<'a> = std::iter::Map<std::slice::ChunksExact<'a, f32>, fn(&[f32]) -> f32>;

/// RMS of consecutive non-overlapping windows, computed on demand
///
/// Windows start at multiples of `window_size` and only windows that end
/// strictly before the buffer does are measured. A zero window size yields
/// nothing.
pub fn rms_windows(samples: &[f32], window_size: usize) -> RmsWindows<'_> {
    let (measured, size) = if window_size == 0 {
        (&samples[..0], 1)
    } else {
        (&samples[..samples.len().saturating_sub(1)], window_size)
    };
    measured.chunks_exact(size).map(rms as fn(&[f32]) -> f32)
}

/// Per-window RMS energy over non-overlapping windows
pub fn windowed_rms(samples: &[f32], window_size: usize) -> Vec<f32> {
    rms_windows(samples, window_size).collect()
}

/// Asymmetric one-pole envelope follower
///
/// Rises with a time constant of `attack_ms` and falls with `release_ms`.
/// State carries across the whole buffer.
pub fn envelope_follower(
    samples: &[f32],
    sample_rate: u32,
    attack_ms: f32,
    release_ms: f32,
) -> Vec<f32> {
    // A zero-length constant degenerates to an instant follower
    let attack_samples = samples_for(attack_ms as f64 / 1000.0, sample_rate).max(1) as f32;
    let release_samples = samples_for(release_ms as f64 / 1000.0, sample_rate).max(1) as f32;

    let mut envelope = 0.0f32;
    samples
        .iter()
        .map(|&s| {
            let magnitude = s.abs();
            if magnitude > envelope {
                envelope += (magnitude - envelope) / attack_samples;
            } else {
                envelope += (magnitude - envelope) / release_samples;
            }
            envelope
        })
        .collect()
}

/// Spectral centroid in Hz
///
/// Bin `i` sits at `i * sample_rate / (2 * bins)`.
pub fn spectral_centroid(magnitudes: &[f32], sample_rate: u32) -> f32 {
    if magnitudes.is_empty() {
        return 0.0;
    }

    let bin_width = sample_rate as f32 / (2 * magnitudes.len()) as f32;
    let mut weighted_sum = 0.0;
    let mut total_magnitude = 0.0;

    for (i, &magnitude) in magnitudes.iter().enumerate() {
        weighted_sum += i as f32 * bin_width * magnitude;
        total_magnitude += magnitude;
    }

    if total_magnitude > 0.0 {
        weighted_sum / total_magnitude
    } else {
        0.0
    }
}

/// Mean frame-to-frame spectral change of a segment
///
/// 20 ms frames hopped every 10 ms; each frame's summed absolute difference
/// against the previous frame is divided by the frame size, then averaged.
/// The first frame is compared against silence.
pub fn spectral_flux(samples: &[f32], sample_rate: u32) -> f32 {
    let window_size = samples_for(0.02, sample_rate);
    let hop_size = samples_for(0.01, sample_rate);
    if window_size == 0 || hop_size == 0 {
        return 0.0;
    }

    let mut prev_spectrum = vec![0.0f32; window_size];
    let mut total_flux = 0.0f32;
    let mut count = 0usize;

    let mut start = 0;
    while start + window_size < samples.len() {
        let spectrum = magnitude_approx(&samples[start..start + window_size]);
        let flux: f32 = spectrum
            .iter()
            .zip(prev_spectrum.iter())
            .map(|(curr, prev)| (curr - prev).abs())
            .sum();

        total_flux += flux / window_size as f32;
        count += 1;
        prev_spectrum = spectrum;
        start += hop_size;
    }

    if count > 0 {
        total_flux / count as f32
    } else {
        0.0
    }
}

/// Index and absolute value of the loudest sample
pub fn peak(samples: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &s) in samples.iter().enumerate() {
        let magnitude = s.abs();
        match best {
            Some((_, max)) if magnitude <= max => {}
            _ => best = Some((i, magnitude)),
        }
    }
    best
}

/// Time in seconds from the first sample above 10% of the peak to the peak
pub fn attack_time(samples: &[f32], sample_rate: u32) -> f32 {
    if sample_rate == 0 {
        return 0.0;
    }
    let Some((peak_index, peak_amplitude)) = peak(samples) else {
        return 0.0;
    };
    if peak_amplitude <= 0.0 {
        return 0.0;
    }

    let threshold = 0.1 * peak_amplitude;
    let attack_start = samples[..=peak_index]
        .iter()
        .position(|s| s.abs() > threshold)
        .unwrap_or(peak_index);

    (peak_index - attack_start) as f32 / sample_rate as f32
}

/// Fraction of spectral energy sitting on harmonics of the strongest low bin
///
/// The fundamental is the loudest bin in the lowest eighth of the spectrum
/// (bin 0 excluded). Each of the first ten harmonics contributes its peak
/// within +/-3% of the harmonic's bin index.
pub fn harmonicity(magnitudes: &[f32]) -> f32 {
    let len = magnitudes.len();

    let mut fundamental_bin = 0;
    let mut max_energy = 0.0f32;
    for (i, &magnitude) in magnitudes.iter().enumerate().take(len / 8).skip(1) {
        if magnitude > max_energy {
            max_energy = magnitude;
            fundamental_bin = i;
        }
    }

    let total_energy: f32 = magnitudes.iter().sum();
    if fundamental_bin == 0 || total_energy <= 0.0 {
        return 0.0;
    }

    let mut harmonic_energy = 0.0f32;
    for h in 1..=10 {
        let harmonic_bin = h * fundamental_bin;
        if harmonic_bin >= len {
            break;
        }
        let deviation = (0.03 * harmonic_bin as f32).ceil() as usize;
        let lo = harmonic_bin.saturating_sub(deviation);
        let hi = (harmonic_bin + deviation).min(len - 1);

        harmonic_energy += magnitudes[lo..=hi].iter().copied().fold(0.0, f32::max);
    }

    harmonic_energy / total_energy
}
