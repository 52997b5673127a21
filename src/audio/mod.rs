// Audio processing module
// Handles WAV ingestion, signal measurements and per-segment features

pub mod features;
pub mod ingest;
pub mod signal;
pub mod spectrum;

pub use features::{extract_features, segment_slice};
pub use ingest::{ingest_wav, pcm16_to_f32, DecodeError, PcmBuffer};
pub use spectrum::{classifier_spectrum, SpectrumStrategy, CLASSIFIER_BINS};
