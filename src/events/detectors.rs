// Event detectors
// Energy-jump transient detection and half-wave rectified flux onset
// detection. Both scan forward once and yield ascending timestamps.

use crate::audio::signal::{energy_window_size, rms_windows, samples_for, RmsWindows};
use crate::audio::spectrum::magnitude_approx;

/// Emits a timestamp wherever a 10 ms window's RMS jumps above the previous
/// window's by more than `threshold` and exceeds twice the threshold
#[derive(Debug, Clone, Copy)]
pub struct TransientDetector<'a> {
    samples: &'a [f32],
    sample_rate: u32,
    threshold: f32,
}

impl<'a> TransientDetector<'a> {
    /// `threshold` is used as-is; sensitivity conversion happens upstream
    pub fn new(samples: &'a [f32], sample_rate: u32, threshold: f32) -> Self {
        TransientDetector {
            samples,
            sample_rate,
            threshold,
        }
    }

    /// Start a fresh scan from the beginning of the buffer
    pub fn events(&self) -> TransientEvents<'a> {
        let window_size = energy_window_size(self.sample_rate);
        TransientEvents {
            energies: rms_windows(self.samples, window_size).enumerate(),
            window_size,
            sample_rate: self.sample_rate,
            threshold: self.threshold,
            prev_energy: 0.0,
        }
    }
}

impl<'a> IntoIterator for TransientDetector<'a> {
    type Item = f64;
    type IntoIter = TransientEvents<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.events()
    }
}

/// Iterator over transient timestamps in seconds
#[derive(Debug, Clone)]
pub struct TransientEvents<'a> {
    energies: std::iter::Enumerate<RmsWindows<'a>>,
    window_size: usize,
    sample_rate: u32,
    threshold: f32,
    prev_energy: f32,
}

impl Iterator for TransientEvents<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        for (index, energy) in self.energies.by_ref() {
            let is_transient =
                energy > self.prev_energy + self.threshold && energy > self.threshold * 2.0;
            self.prev_energy = energy;

            if is_transient {
                return Some((index * self.window_size) as f64 / self.sample_rate as f64);
            }
        }
        None
    }
}

/// Emits a timestamp wherever the rectified magnitude increase between
/// consecutive 20 ms frames (10 ms hop) exceeds `threshold`
#[derive(Debug, Clone, Copy)]
pub struct OnsetDetector<'a> {
    samples: &'a [f32],
    sample_rate: u32,
    threshold: f32,
}

impl<'a> OnsetDetector<'a> {
    /// `threshold` is used as-is; sensitivity conversion happens upstream
    pub fn new(samples: &'a [f32], sample_rate: u32, threshold: f32) -> Self {
        OnsetDetector {
            samples,
            sample_rate,
            threshold,
        }
    }

    /// Start a fresh scan from the beginning of the buffer
    pub fn events(&self) -> OnsetEvents<'a> {
        let window_size = samples_for(0.02, self.sample_rate);
        OnsetEvents {
            samples: self.samples,
            sample_rate: self.sample_rate,
            threshold: self.threshold,
            window_size,
            hop_size: samples_for(0.01, self.sample_rate),
            position: 0,
            prev_spectrum: vec![0.0; window_size],
        }
    }
}

impl<'a> IntoIterator for OnsetDetector<'a> {
    type Item = f64;
    type IntoIter = OnsetEvents<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.events()
    }
}

/// Iterator over onset timestamps in seconds
#[derive(Debug, Clone)]
pub struct OnsetEvents<'a> {
    samples: &'a [f32],
    sample_rate: u32,
    threshold: f32,
    window_size: usize,
    hop_size: usize,
    position: usize,
    prev_spectrum: Vec<f32>,
}

impl Iterator for OnsetEvents<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.window_size == 0 || self.hop_size == 0 {
            return None;
        }

        while self.position + self.window_size < self.samples.len() {
            let start = self.position;
            self.position += self.hop_size;

            let spectrum = magnitude_approx(&self.samples[start..start + self.window_size]);

            // Only count increases in magnitude
            let flux: f32 = spectrum
                .iter()
                .zip(self.prev_spectrum.iter())
                .map(|(curr, prev)| (curr - prev).max(0.0))
                .sum();
            self.prev_spectrum = spectrum;

            if flux > self.threshold {
                return Some(start as f64 / self.sample_rate as f64);
            }
        }
        None
    }
}

/// Collect all transient timestamps
pub fn detect_transients(samples: &[f32], sample_rate: u32, threshold: f32) -> Vec<f64> {
    TransientDetector::new(samples, sample_rate, threshold)
        .events()
        .collect()
}

/// Collect all onset timestamps
pub fn detect_onsets(samples: &[f32], sample_rate: u32, threshold: f32) -> Vec<f64> {
    OnsetDetector::new(samples, sample_rate, threshold)
        .events()
        .collect()
}
