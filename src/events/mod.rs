// Event detection module
// Transient and onset detection, event fusion, and instrument classification

pub mod detectors;
pub mod fusion;
pub mod heuristic;
pub mod types;

pub use detectors::{
    detect_onsets, detect_transients, OnsetDetector, OnsetEvents, TransientDetector,
    TransientEvents,
};
pub use fusion::fuse_events;
pub use heuristic::{ClassificationResult, ClassifierConfig, HeuristicClassifier};
pub use types::{InstrumentLabel, SampleType, SegmentFeatures};
