// CLI command handlers
// Each handler takes plain inputs, works against the sample library file and
// returns a serializable result for the shell to print
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::audio::{self, PcmBuffer};
use crate::events::SampleType;
use crate::export::{self, BatchReport, ExportSettings};
use crate::pipeline::{self, AnalysisParams, AnalysisResult, TraceWriter};
use crate::state::{edit, Sample, SampleLibrary, SampleQuery};

#[derive(Debug, Serialize)]
pub struct CommandError {
    message: String,
}

impl<E: std::fmt::Display> From<E> for CommandError {
    fn from(error: E) -> Self {
        CommandError {
            message: error.to_string(),
        }
    }
}

impl CommandError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

fn parse_id(id: &str) -> CommandResult<Uuid> {
    Uuid::parse_str(id.trim()).map_err(|e| CommandError {
        message: format!("Invalid sample id '{}': {}", id, e),
    })
}

async fn load_source(path: &Path) -> CommandResult<Arc<PcmBuffer>> {
    let bytes = tokio::fs::read(path).await.map_err(|e| CommandError {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;
    let buffer = audio::ingest_wav(&bytes).map_err(|e| CommandError {
        message: format!("Failed to process audio file: {}", e),
    })?;
    Ok(Arc::new(buffer))
}

// ==================== ANALYSIS COMMANDS ====================

#[derive(Debug, Deserialize)]
pub struct AnalyzeInput {
    pub audio_path: PathBuf,
    pub params: AnalysisParams,
    pub trace_path: Option<PathBuf>,
    /// Library to add detected samples to; None skips saving
    pub library_path: Option<PathBuf>,
}

/// Split a recording into classified samples
pub async fn analyze_file(input: AnalyzeInput) -> CommandResult<AnalysisResult> {
    let buffer = load_source(&input.audio_path).await?;

    log::info!(
        "Loaded {}: {} Hz, {} channels, {:.2}s",
        input.audio_path.display(),
        buffer.sample_rate,
        buffer.channel_count(),
        buffer.duration_secs()
    );

    let result = match input.trace_path {
        None => {
            pipeline::await_analysis(pipeline::analyze_in_background(buffer, input.params)).await?
        }
        Some(trace_path) => {
            let params = input.params;
            tokio::task::spawn_blocking(move || {
                let writer = TraceWriter::new(trace_path);
                pipeline::analyze_traced(&buffer, &params, &params.classifier(), Some(&writer))
            })
            .await??
        }
    };

    if let Some(library_path) = input.library_path {
        let mut library = SampleLibrary::load(&library_path)?;
        library.extend(result.samples.iter().cloned());
        library.save(&library_path)?;
    }

    Ok(result)
}

// ==================== LIBRARY COMMANDS ====================

#[derive(Debug, Default, Deserialize)]
pub struct ListSamplesInput {
    pub text: Option<String>,
    pub types: Vec<String>,
    pub tags: Vec<String>,
    pub favorites_only: bool,
}

pub fn list_samples(library_path: &Path, input: ListSamplesInput) -> CommandResult<Vec<Sample>> {
    let library = SampleLibrary::load(library_path)?;
    let query = SampleQuery {
        text: input.text,
        types: input.types.iter().map(|t| SampleType::from_string(t)).collect(),
        tags: input.tags,
        favorites_only: input.favorites_only,
    };
    Ok(library.search(&query).into_iter().cloned().collect())
}

/// Apply an edit to one library entry and save
fn edit_sample<F>(library_path: &Path, id: &str, apply: F) -> CommandResult<Sample>
where
    F: FnOnce(&mut Sample) -> CommandResult<()>,
{
    let uuid = parse_id(id)?;
    let mut library = SampleLibrary::load(library_path)?;
    let sample = library.get_mut(&uuid)?;
    apply(sample)?;
    let updated = sample.clone();
    library.save(library_path)?;
    Ok(updated)
}

pub fn rename_sample(library_path: &Path, id: &str, name: &str) -> CommandResult<Sample> {
    edit_sample(library_path, id, |sample| Ok(edit::rename(sample, name)?))
}

pub fn tag_sample(library_path: &Path, id: &str, tag: &str, remove: bool) -> CommandResult<Sample> {
    edit_sample(library_path, id, |sample| {
        let changed = if remove {
            edit::remove_tag(sample, tag)
        } else {
            edit::add_tag(sample, tag)
        };
        if !changed {
            log::info!("Tags of {} unchanged", sample.name);
        }
        Ok(())
    })
}

/// Set the favorite flag, or toggle it when `favorite` is None
pub fn favorite_sample(
    library_path: &Path,
    id: &str,
    favorite: Option<bool>,
) -> CommandResult<Sample> {
    edit_sample(library_path, id, |sample| {
        match favorite {
            Some(value) => edit::set_favorite(sample, value),
            None => {
                edit::toggle_favorite(sample);
            }
        }
        Ok(())
    })
}

pub fn split_sample(library_path: &Path, id: &str, offset: f64) -> CommandResult<Vec<Sample>> {
    let uuid = parse_id(id)?;
    let mut library = SampleLibrary::load(library_path)?;
    let original = library.get(&uuid).ok_or_else(|| CommandError {
        message: format!("Sample not found: {}", uuid),
    })?;

    let (first, second) = edit::split(original, offset)?;
    let parts = vec![first, second];
    library.replace(&[uuid], parts.clone())?;
    library.save(library_path)?;
    Ok(parts)
}

pub fn merge_samples(library_path: &Path, ids: &[String]) -> CommandResult<Sample> {
    let uuids = ids.iter().map(|id| parse_id(id)).collect::<CommandResult<Vec<_>>>()?;
    let mut library = SampleLibrary::load(library_path)?;

    let mut selected = Vec::with_capacity(uuids.len());
    for uuid in &uuids {
        let sample = library.get(uuid).ok_or_else(|| CommandError {
            message: format!("Sample not found: {}", uuid),
        })?;
        selected.push(sample.clone());
    }

    let merged = edit::merge(&selected)?;
    library.replace(&uuids, vec![merged.clone()])?;
    library.save(library_path)?;
    Ok(merged)
}

pub fn remove_sample(library_path: &Path, id: &str) -> CommandResult<Sample> {
    let uuid = parse_id(id)?;
    let mut library = SampleLibrary::load(library_path)?;
    let removed = library.remove(&uuid)?;
    library.save(library_path)?;
    Ok(removed)
}

// ==================== EXPORT COMMANDS ====================

#[derive(Debug, Deserialize)]
pub struct ExportInput {
    pub audio_path: PathBuf,
    pub library_path: PathBuf,
    pub out_dir: PathBuf,
    /// Samples to export; empty exports every sample cut from the recording
    pub ids: Vec<String>,
    pub settings: ExportSettings,
    pub trace_path: Option<PathBuf>,
}

/// Export library samples of one recording as WAV files
pub async fn export_samples(input: ExportInput) -> CommandResult<BatchReport> {
    let buffer = load_source(&input.audio_path).await?;
    let mut library = SampleLibrary::load(&input.library_path)?;

    let selected: Vec<Sample> = if input.ids.is_empty() {
        library.reattach(&buffer);
        library
            .samples()
            .into_iter()
            .filter(|s| s.has_source())
            .cloned()
            .collect()
    } else {
        let mut selected = Vec::with_capacity(input.ids.len());
        for id in &input.ids {
            let uuid = parse_id(id)?;
            library.attach(&uuid, &buffer)?;
            if let Some(sample) = library.get(&uuid) {
                selected.push(sample.clone());
            }
        }
        selected
    };

    let settings = input.settings;
    let out_dir = input.out_dir;
    let trace_path = input.trace_path;
    let report = tokio::task::spawn_blocking(move || {
        let writer = trace_path.map(TraceWriter::new);
        export::export_batch_traced(&selected, &out_dir, &settings, writer.as_ref())
    })
    .await??;

    Ok(report)
}
