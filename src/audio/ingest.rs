// Audio ingestion module
// Reads WAV files into channel-separated float buffers

use hound::{SampleFormat, WavReader};
use std::io::Cursor;
use thiserror::Error;

use crate::state::storage::calculate_sha256;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to read WAV file: {0}")]
    WavReadError(#[from] hound::Error),

    #[error("Failed to open audio file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid audio data: {0}")]
    InvalidData(String),
}

/// Decoded PCM audio, one sample vector per channel
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    /// Per-channel samples normalized to f32 in range [-1.0, 1.0]
    pub channels: Vec<Vec<f32>>,

    /// Sample rate in Hz (e.g., 44100, 48000)
    pub sample_rate: u32,

    /// SHA256 of the file this buffer was decoded from, if any
    pub source_sha256: Option<String>,
}

impl PcmBuffer {
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        PcmBuffer {
            channels,
            sample_rate,
            source_sha256: None,
        }
    }

    /// Wrap a single channel of samples
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(vec![samples], sample_rate)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel)
    pub fn frame_count(&self) -> usize {
        self.channels.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Get duration in seconds as f64
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// The channel analysis runs on (channel 0)
    pub fn primary_channel(&self) -> &[f32] {
        self.channels.first().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Inverse of the export scaling: negative values over 32768, the rest
/// over 32767, so full scale maps back to exactly -1.0 and 1.0
pub fn pcm16_to_f32(sample: i16) -> f32 {
    if sample < 0 {
        sample as f32 / 32768.0
    } else {
        sample as f32 / 32767.0
    }
}

/// Ingest a WAV file from raw bytes
/// Returns a PcmBuffer with normalized, de-interleaved samples
pub fn ingest_wav(data: &[u8]) -> Result<PcmBuffer, DecodeError> {
    let cursor = Cursor::new(data);
    let mut reader = WavReader::new(cursor)?;

    let spec = reader.spec();
    let channel_count = spec.channels as usize;
    let bit_depth = spec.bits_per_sample;

    if channel_count == 0 {
        return Err(DecodeError::InvalidData("zero channels".to_string()));
    }
    if spec.sample_rate == 0 {
        return Err(DecodeError::InvalidData("zero sample rate".to_string()));
    }

    // Read and normalize interleaved samples to f32 [-1.0, 1.0]
    let interleaved: Vec<f32> = match (spec.sample_format, bit_depth) {
        (SampleFormat::Int, 8) => reader
            .samples::<i32>()
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|s| s as f32 / 128.0)
            .collect(),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(pcm16_to_f32)
            .collect(),
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|s| s as f32 / 8388608.0)
            .collect(),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|s| s as f32 / 2147483648.0)
            .collect(),
        (SampleFormat::Float, 32) => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        _ => {
            return Err(DecodeError::UnsupportedFormat(format!(
                "{:?} {}-bit audio",
                spec.sample_format, bit_depth
            )));
        }
    };

    let frame_count = interleaved.len() / channel_count;
    let mut channels = vec![Vec::with_capacity(frame_count); channel_count];
    for frame in interleaved.chunks_exact(channel_count) {
        for (ch, &sample) in frame.iter().enumerate() {
            channels[ch].push(sample);
        }
    }

    log::debug!(
        "Decoded WAV: {} Hz, {} channels, {} bit, {} frames",
        spec.sample_rate,
        channel_count,
        bit_depth,
        frame_count
    );

    Ok(PcmBuffer {
        channels,
        sample_rate: spec.sample_rate,
        source_sha256: Some(calculate_sha256(data)),
    })
}
