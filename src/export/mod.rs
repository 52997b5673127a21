// Export module
// WAV encoding, region rendering, filename templating and batch export

pub mod batch;
pub mod naming;
pub mod render;
pub mod wav;

pub use batch::{
    export_batch, export_batch_traced, export_filename, BatchReport, ExportFailure, ExportedFile,
};
pub use naming::{apply_naming_pattern, NamingContext};
pub use render::{
    export_sample, export_sample_entity, normalize, ExportError, ExportFormat, ExportResult,
    ExportSettings,
};
pub use wav::encode_wav;
