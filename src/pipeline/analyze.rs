// Analysis pass
// Detect, fuse, segment and classify one recording

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::audio::signal::{energy_window_size, envelope_follower};
use crate::audio::PcmBuffer;
use crate::events::{fuse_events, HeuristicClassifier, OnsetDetector, TransientDetector};
use crate::pipeline::params::AnalysisParams;
use crate::pipeline::segmenter::{build_samples, segment_regions};
use crate::pipeline::trace::{Stage, TraceEntry, TraceWriter, Tracer};
use crate::state::Sample;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to read parameters: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse parameters: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Analysis task did not complete: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Everything one pass produces for the caller
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub samples: Vec<Sample>,

    /// Fused boundary times in seconds, for display
    pub markers: Vec<f64>,

    /// Envelope follower output, one peak per 10 ms window
    pub envelope: Vec<f32>,
}

impl AnalysisResult {
    pub fn empty() -> Self {
        AnalysisResult {
            samples: Vec::new(),
            markers: Vec::new(),
            envelope: Vec::new(),
        }
    }
}

/// Run a full analysis pass over the buffer's primary channel
pub fn analyze(
    buffer: &Arc<PcmBuffer>,
    params: &AnalysisParams,
) -> Result<AnalysisResult, AnalysisError> {
    analyze_traced(buffer, params, &params.classifier(), None)
}

/// Analysis pass with an explicit classifier and optional trace file
pub fn analyze_traced(
    buffer: &Arc<PcmBuffer>,
    params: &AnalysisParams,
    classifier: &HeuristicClassifier,
    trace: Option<&TraceWriter>,
) -> Result<AnalysisResult, AnalysisError> {
    params.validate()?;
    if buffer.sample_rate == 0 {
        return Err(AnalysisError::InvalidSampleRate(buffer.sample_rate));
    }

    let tracer = Tracer::new(trace);
    let samples = buffer.primary_channel();
    let sample_rate = buffer.sample_rate;

    if samples.is_empty() {
        log::warn!("Empty buffer, nothing to analyze");
        return Ok(AnalysisResult::empty());
    }

    let threshold = params.detection_threshold();

    let transients: Vec<f64> = TransientDetector::new(samples, sample_rate, threshold)
        .events()
        .collect();
    tracer.record(
        TraceEntry::new(Stage::Transients, 0.25, "Transient detection complete")
            .with_data(serde_json::json!({ "count": transients.len(), "threshold": threshold })),
    );

    let onsets: Vec<f64> = OnsetDetector::new(samples, sample_rate, threshold)
        .events()
        .collect();
    tracer.record(
        TraceEntry::new(Stage::Onsets, 0.5, "Onset detection complete")
            .with_data(serde_json::json!({ "count": onsets.len() })),
    );

    let markers = fuse_events(&transients, &onsets, params.min_gap_secs());
    tracer.record(
        TraceEntry::new(Stage::Fusion, 0.6, "Fused detector events")
            .with_data(serde_json::json!({ "count": markers.len() })),
    );

    let regions = segment_regions(&markers, params.min_length_ms);
    let detected = build_samples(&regions, buffer, classifier);
    tracer.record(
        TraceEntry::new(Stage::Segmentation, 1.0, "Segmentation complete")
            .with_data(serde_json::json!({ "samples": detected.len() })),
    );

    log::info!(
        "Analyzed {:.2}s: {} transients, {} onsets, {} markers, {} samples",
        buffer.duration_secs(),
        transients.len(),
        onsets.len(),
        markers.len(),
        detected.len()
    );

    Ok(AnalysisResult {
        samples: detected,
        markers,
        envelope: display_envelope(samples, sample_rate, params),
    })
}

/// Envelope reduced to its peak in each 10 ms window
fn display_envelope(samples: &[f32], sample_rate: u32, params: &AnalysisParams) -> Vec<f32> {
    let window = energy_window_size(sample_rate).max(1);
    envelope_follower(samples, sample_rate, params.attack_ms, params.release_ms)
        .chunks(window)
        .map(|chunk| chunk.iter().copied().fold(0.0, f32::max))
        .collect()
}

/// Run the analysis on tokio's blocking pool
///
/// Aborting or dropping the returned handle discards the result; nothing is
/// applied until the pass finishes.
pub fn analyze_in_background(
    buffer: Arc<PcmBuffer>,
    params: AnalysisParams,
) -> JoinHandle<Result<AnalysisResult, AnalysisError>> {
    tokio::task::spawn_blocking(move || analyze(&buffer, &params))
}

/// Await a background analysis, folding task failure into AnalysisError
pub async fn await_analysis(
    handle: JoinHandle<Result<AnalysisResult, AnalysisError>>,
) -> Result<AnalysisResult, AnalysisError> {
    handle.await?
}
