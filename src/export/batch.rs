// Batch export
// Writes a selection of samples to a directory, one file per sample

use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::export::naming::{apply_naming_pattern, NamingContext};
use crate::export::render::{export_sample_entity, ExportError, ExportResult, ExportSettings};
use crate::pipeline::trace::{Stage, TraceEntry, TraceWriter, Tracer};
use crate::state::storage::write_file;
use crate::state::Sample;

/// A file written by a batch export
#[derive(Debug, Clone, Serialize)]
pub struct ExportedFile {
    pub sample_id: uuid::Uuid,
    pub path: PathBuf,
    pub sha256: String,
}

/// A sample the batch could not export
#[derive(Debug, Clone, Serialize)]
pub struct ExportFailure {
    pub sample_id: uuid::Uuid,
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub exported: Vec<ExportedFile>,
    pub failed: Vec<ExportFailure>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Filename for the sample at 1-based position `index` in a batch
pub fn export_filename(sample: &Sample, index: usize, settings: &ExportSettings) -> String {
    let stem = apply_naming_pattern(
        &settings.naming_pattern,
        &NamingContext {
            name: &sample.name,
            sample_type: sample.sample_type,
            index,
            duration: sample.duration,
        },
    );
    format!("{}.{}", stem, settings.output_extension())
}

/// Append `_2`, `_3`, ... to the stem until `filename` is not in `taken`
fn unique_filename(filename: String, taken: &HashSet<String>) -> String {
    if !taken.contains(&filename) {
        return filename;
    }
    let (stem, extension) = match filename.rsplit_once('.') {
        Some((stem, extension)) => (stem.to_string(), format!(".{}", extension)),
        None => (filename.clone(), String::new()),
    };
    (2..)
        .map(|n| format!("{}_{}{}", stem, n, extension))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(filename)
}

/// Export each sample in order into `out_dir`
///
/// A failing sample is logged and recorded in the report; the remaining
/// samples are still exported. Names that collide within the batch get a
/// numeric suffix instead of overwriting an earlier file.
pub fn export_batch(
    samples: &[Sample],
    out_dir: &Path,
    settings: &ExportSettings,
) -> ExportResult<BatchReport> {
    export_batch_traced(samples, out_dir, settings, None)
}

/// Batch export that records per-sample progress to an optional trace file
pub fn export_batch_traced(
    samples: &[Sample],
    out_dir: &Path,
    settings: &ExportSettings,
    trace: Option<&TraceWriter>,
) -> ExportResult<BatchReport> {
    if samples.is_empty() {
        return Err(ExportError::EmptySelection);
    }

    let tracer = Tracer::new(trace);
    let mut report = BatchReport::default();
    let mut taken = HashSet::new();

    for (i, sample) in samples.iter().enumerate() {
        let filename = unique_filename(export_filename(sample, i + 1, settings), &taken);
        taken.insert(filename.clone());

        let written = export_sample_entity(sample, settings)
            .and_then(|bytes| write_file(out_dir, &filename, &bytes).map_err(ExportError::from));

        let progress = (i + 1) as f32 / samples.len() as f32;
        match written {
            Ok((path, sha256)) => {
                log::debug!("Exported {} to {}", sample.name, path.display());
                tracer.record(
                    TraceEntry::new(Stage::Export, progress, format!("Exported {}", sample.name))
                        .with_data(serde_json::json!({ "file": filename, "sha256": sha256 })),
                );
                report.exported.push(ExportedFile {
                    sample_id: sample.id,
                    path,
                    sha256,
                });
            }
            Err(e) => {
                log::warn!("Failed to export {}: {}", sample.name, e);
                tracer.record(
                    TraceEntry::new(Stage::Export, progress, format!("Failed {}", sample.name))
                        .with_data(serde_json::json!({ "error": e.to_string() })),
                );
                report.failed.push(ExportFailure {
                    sample_id: sample.id,
                    name: sample.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    log::info!(
        "Exported {} of {} samples to {}",
        report.exported.len(),
        samples.len(),
        out_dir.display()
    );

    Ok(report)
}
