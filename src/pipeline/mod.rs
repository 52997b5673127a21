// Analysis pipeline module
// Parameters, segmentation, the analysis pass and its progress trace

pub mod analyze;
pub mod params;
pub mod segmenter;
pub mod trace;

pub use analyze::{
    analyze, analyze_in_background, analyze_traced, await_analysis, AnalysisError,
    AnalysisResult,
};
pub use params::AnalysisParams;
pub use segmenter::{build_samples, segment_regions, Region, FALLBACK_DURATION_SECS};
pub use trace::{read_trace_file, Stage, TraceEntry, TraceError, TraceWriter, Tracer};
