// Sample rendering
// Cuts a region out of a source buffer, normalizes it and encodes it as WAV

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::PcmBuffer;
use crate::export::wav::{encode_wav, WAV_HEADER_LEN};
use crate::state::Sample;

/// Peaks at or above this level are left alone by normalization
pub const NORMALIZE_SKIP_PEAK: f32 = 0.99;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(ExportFormat),

    #[error("Sample {0} has no source audio attached")]
    MissingSource(String),

    #[error("Invalid export sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("Invalid export region: start {start}s, duration {duration}s")]
    InvalidRegion { start: f64, duration: f64 },

    #[error("Nothing selected for export")]
    EmptySelection,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::state::StorageError),
}

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Wav,
    Mp3,
    Ogg,
    Flac,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Wav => "wav",
            ExportFormat::Mp3 => "mp3",
            ExportFormat::Ogg => "ogg",
            ExportFormat::Flac => "flac",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Settings for one export call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub format: ExportFormat,

    /// Rate written to the header. Samples are copied at the source rate.
    pub sample_rate: u32,

    /// Requested depth; output is always 16-bit PCM
    pub bit_depth: u16,

    pub normalize: bool,

    pub naming_pattern: String,

    /// Encode WAV when a compressed format is requested instead of failing
    pub wav_fallback: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        ExportSettings {
            format: ExportFormat::Wav,
            sample_rate: 44100,
            bit_depth: 16,
            normalize: true,
            naming_pattern: "{type}_{index}_{name}".to_string(),
            wav_fallback: false,
        }
    }
}

impl ExportSettings {
    /// Extension of the bytes actually produced
    pub fn output_extension(&self) -> &'static str {
        ExportFormat::Wav.extension()
    }

    fn check(&self) -> ExportResult<()> {
        if self.sample_rate == 0 {
            return Err(ExportError::InvalidSampleRate(self.sample_rate));
        }
        if self.format != ExportFormat::Wav {
            if !self.wav_fallback {
                return Err(ExportError::UnsupportedFormat(self.format));
            }
            log::warn!("{} export not available, writing WAV instead", self.format);
        }
        if self.bit_depth != 16 {
            log::warn!("{}-bit export requested, writing 16-bit PCM", self.bit_depth);
        }
        Ok(())
    }
}

/// Scale every channel so the loudest sample reaches full scale
///
/// Silent audio and audio already peaking at [`NORMALIZE_SKIP_PEAK`] or
/// above are returned untouched.
pub fn normalize(channels: &mut [Vec<f32>]) {
    let peak = channels
        .iter()
        .flat_map(|c| c.iter())
        .fold(0.0f32, |acc, s| acc.max(s.abs()));

    if peak == 0.0 || peak >= NORMALIZE_SKIP_PEAK {
        return;
    }

    let gain = 1.0 / peak;
    for channel in channels.iter_mut() {
        for sample in channel.iter_mut() {
            *sample *= gain;
        }
    }
}

/// Copy `duration_secs` of every channel starting at `start_secs`
///
/// Positions are floored at the source rate; anything past the end of the
/// source stays silent. The region must be finite, start at or after 0, be
/// non-empty and fit in a single WAV data chunk.
pub fn extract_region(
    buffer: &PcmBuffer,
    start_secs: f64,
    duration_secs: f64,
) -> ExportResult<Vec<Vec<f32>>> {
    let invalid = || ExportError::InvalidRegion {
        start: start_secs,
        duration: duration_secs,
    };
    if !(start_secs.is_finite() && start_secs >= 0.0) {
        return Err(invalid());
    }
    if !(duration_secs.is_finite() && duration_secs > 0.0) {
        return Err(invalid());
    }

    let sr = buffer.sample_rate as f64;
    let frames = (duration_secs * sr).floor();
    let bytes_per_frame = (buffer.channel_count().max(1) * 2) as f64;
    let max_frames = (u32::MAX as usize - WAV_HEADER_LEN) as f64 / bytes_per_frame;
    if frames > max_frames || (start_secs * sr).floor() > usize::MAX as f64 {
        return Err(invalid());
    }

    let length = frames as usize;
    let start = (start_secs * sr).floor() as usize;

    Ok(buffer
        .channels
        .iter()
        .map(|channel| {
            let mut out = vec![0.0f32; length];
            if start < channel.len() {
                let available = (channel.len() - start).min(length);
                out[..available].copy_from_slice(&channel[start..start + available]);
            }
            out
        })
        .collect())
}

/// Render a region of `buffer` into WAV bytes
pub fn export_sample(
    buffer: &PcmBuffer,
    start_secs: f64,
    duration_secs: f64,
    settings: &ExportSettings,
) -> ExportResult<Vec<u8>> {
    settings.check()?;

    let mut channels = extract_region(buffer, start_secs, duration_secs)?;
    if settings.normalize {
        normalize(&mut channels);
    }

    if settings.sample_rate != buffer.sample_rate {
        log::debug!(
            "Declaring {} Hz for audio copied at {} Hz",
            settings.sample_rate,
            buffer.sample_rate
        );
    }

    Ok(encode_wav(&channels, settings.sample_rate))
}

/// Render a sample entity from its attached source
pub fn export_sample_entity(sample: &Sample, settings: &ExportSettings) -> ExportResult<Vec<u8>> {
    let source = sample
        .source
        .as_ref()
        .ok_or_else(|| ExportError::MissingSource(sample.name.clone()))?;
    export_sample(source, sample.start, sample.duration, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SampleType;
    use approx::assert_abs_diff_eq;
    use std::io::Cursor;
    use std::sync::Arc;

    fn decode(bytes: Vec<u8>) -> (hound::WavSpec, Vec<i16>) {
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        let samples = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        (spec, samples)
    }

    #[test]
    fn test_normalize_half_peak_to_full() {
        let mut channels = vec![vec![0.1, -0.5, 0.25]];
        normalize(&mut channels);
        let peak = channels[0].iter().fold(0.0f32, |a, s| a.max(s.abs()));
        assert_abs_diff_eq!(peak, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(channels[0][0], 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_normalize_skips_hot_and_silent_audio() {
        let mut hot = vec![vec![0.995, -0.3]];
        normalize(&mut hot);
        assert_eq!(hot, vec![vec![0.995, -0.3]]);

        let mut silent = vec![vec![0.0; 8]];
        normalize(&mut silent);
        assert!(silent[0].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_normalize_uses_peak_across_channels() {
        let mut channels = vec![vec![0.25], vec![-0.5]];
        normalize(&mut channels);
        assert_abs_diff_eq!(channels[0][0], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(channels[1][0], -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_region_zero_padded_past_end() {
        let buffer = PcmBuffer::from_mono(vec![0.5; 10], 10);
        let region = extract_region(&buffer, 0.5, 1.0).unwrap();
        assert_eq!(region[0].len(), 10);
        assert_eq!(&region[0][..5], &[0.5; 5]);
        assert_eq!(&region[0][5..], &[0.0; 5]);

        let beyond = extract_region(&buffer, 3.0, 0.5).unwrap();
        assert_eq!(beyond[0], vec![0.0; 5]);
    }

    #[test]
    fn test_bad_regions_are_errors() {
        let buffer = PcmBuffer::from_mono(vec![0.5; 100], 100);
        let settings = ExportSettings::default();

        for (start, duration) in [
            (0.0, 1e300),
            (0.0, f64::INFINITY),
            (0.0, f64::NAN),
            (f64::NAN, 0.5),
            (-1.0, 0.5),
            (1e300, 0.5),
            (0.0, 0.0),
            (0.0, -0.5),
        ] {
            assert!(
                matches!(
                    export_sample(&buffer, start, duration, &settings),
                    Err(ExportError::InvalidRegion { .. })
                ),
                "start {} duration {} should be rejected",
                start,
                duration
            );
        }
    }

    #[test]
    fn test_export_length_and_header() {
        let buffer = PcmBuffer::new(vec![vec![0.5; 44100], vec![-0.5; 44100]], 44100);
        let bytes = export_sample(&buffer, 0.25, 0.5, &ExportSettings::default()).unwrap();

        assert_eq!(bytes.len(), 44 + 22050 * 2 * 2);
        let (spec, samples) = decode(bytes);
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 44100);
        // Normalized to full scale
        assert_eq!(samples[0], 32767);
        assert_eq!(samples[1], -32768);
    }

    #[test]
    fn test_export_declares_settings_rate_without_resampling() {
        let buffer = PcmBuffer::from_mono(vec![0.2; 44100], 44100);
        let settings = ExportSettings {
            sample_rate: 22050,
            normalize: false,
            ..Default::default()
        };
        let (spec, samples) = decode(export_sample(&buffer, 0.0, 0.1, &settings).unwrap());
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(samples.len(), 4410);
        assert_eq!(samples[0], (0.2f32 * 32767.0) as i16);
    }

    #[test]
    fn test_unsupported_format_without_fallback() {
        let buffer = PcmBuffer::from_mono(vec![0.2; 100], 100);
        let settings = ExportSettings {
            format: ExportFormat::Mp3,
            ..Default::default()
        };
        assert!(matches!(
            export_sample(&buffer, 0.0, 0.5, &settings),
            Err(ExportError::UnsupportedFormat(ExportFormat::Mp3))
        ));

        let fallback = ExportSettings {
            wav_fallback: true,
            ..settings
        };
        let bytes = export_sample(&buffer, 0.0, 0.5, &fallback).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(fallback.output_extension(), "wav");
    }

    #[test]
    fn test_zero_export_rate_rejected() {
        let buffer = PcmBuffer::from_mono(vec![0.2; 100], 100);
        let settings = ExportSettings {
            sample_rate: 0,
            ..Default::default()
        };
        assert!(matches!(
            export_sample(&buffer, 0.0, 0.5, &settings),
            Err(ExportError::InvalidSampleRate(0))
        ));
    }

    #[test]
    fn test_export_entity_requires_source() {
        let detached = Sample::new("Loose", SampleType::Other, 0.0, 0.1, None);
        assert!(matches!(
            export_sample_entity(&detached, &ExportSettings::default()),
            Err(ExportError::MissingSource(_))
        ));

        let buffer = Arc::new(PcmBuffer::from_mono(vec![0.4; 1000], 1000));
        let attached = Sample::new("Hit", SampleType::Kick, 0.1, 0.2, Some(buffer));
        let (_, samples) = decode(export_sample_entity(&attached, &ExportSettings::default()).unwrap());
        assert_eq!(samples.len(), 200);
    }

    #[test]
    fn test_settings_json_defaults() {
        let settings: ExportSettings = serde_json::from_str(r#"{ "format": "flac" }"#).unwrap();
        assert_eq!(settings.format, ExportFormat::Flac);
        assert_eq!(settings.sample_rate, 44100);
        assert!(settings.normalize);
        assert_eq!(settings.naming_pattern, "{type}_{index}_{name}");
    }
}
