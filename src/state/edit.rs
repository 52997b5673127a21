// Sample editing operations
// Rename, tag, favorite, split and merge

use thiserror::Error;

use crate::events::SampleType;
use crate::state::models::Sample;

#[derive(Debug, Error, PartialEq)]
pub enum EditError {
    #[error("Sample name cannot be empty")]
    EmptyName,

    #[error("Select at least {required} samples (got {selected})")]
    InsufficientSelection { required: usize, selected: usize },

    #[error("Selected samples come from different recordings")]
    MixedSources,

    #[error("Split point {offset:.3}s is outside the sample (0..{duration:.3}s)")]
    SplitOutOfRange { offset: f64, duration: f64 },
}

pub type EditResult<T> = Result<T, EditError>;

/// Rename a sample; surrounding whitespace is dropped
pub fn rename(sample: &mut Sample, name: &str) -> EditResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(EditError::EmptyName);
    }
    sample.name = trimmed.to_string();
    Ok(())
}

/// Add a tag (trimmed, lowercased). Returns false when nothing was added.
pub fn add_tag(sample: &mut Sample, tag: &str) -> bool {
    let normalized = tag.trim().to_lowercase();
    if normalized.is_empty() || sample.has_tag(&normalized) {
        return false;
    }
    sample.tags.push(normalized);
    true
}

/// Remove a tag. Returns false when the tag was not present.
pub fn remove_tag(sample: &mut Sample, tag: &str) -> bool {
    let normalized = tag.trim().to_lowercase();
    let before = sample.tags.len();
    sample.tags.retain(|t| *t != normalized);
    sample.tags.len() != before
}

pub fn set_favorite(sample: &mut Sample, favorite: bool) {
    sample.favorite = favorite;
}

/// Flip the favorite flag and return the new value
pub fn toggle_favorite(sample: &mut Sample) -> bool {
    sample.favorite = !sample.favorite;
    sample.favorite
}

/// Split a sample at `offset` seconds from its start
///
/// Both halves keep the type, tags and source; they get fresh ids.
pub fn split(sample: &Sample, offset: f64) -> EditResult<(Sample, Sample)> {
    if !(offset > 0.0 && offset < sample.duration) {
        return Err(EditError::SplitOutOfRange {
            offset,
            duration: sample.duration,
        });
    }

    let child = |suffix: usize, start: f64, duration: f64| {
        let mut part = Sample::new(
            format!("{} ({})", sample.name, suffix),
            sample.sample_type,
            start,
            duration,
            sample.source.clone(),
        );
        part.source_sha256 = sample.source_sha256.clone();
        part.tags = sample.tags.clone();
        part
    };

    Ok((
        child(1, sample.start, offset),
        child(2, sample.start + offset, sample.duration - offset),
    ))
}

/// Merge two or more samples from the same recording into one
///
/// The result spans the earliest start to the latest end. The type is kept
/// when all inputs agree, tags are unioned in order of appearance and the
/// result is a favorite when any input was.
pub fn merge(samples: &[Sample]) -> EditResult<Sample> {
    let [first, rest @ ..] = samples else {
        return Err(EditError::InsufficientSelection {
            required: 2,
            selected: 0,
        });
    };
    if rest.is_empty() {
        return Err(EditError::InsufficientSelection {
            required: 2,
            selected: 1,
        });
    }
    if rest.iter().any(|s| !s.shares_source_with(first)) {
        return Err(EditError::MixedSources);
    }

    let start = samples.iter().map(|s| s.start).fold(f64::INFINITY, f64::min);
    let end = samples.iter().map(Sample::end).fold(f64::NEG_INFINITY, f64::max);
    let sample_type = if rest.iter().all(|s| s.sample_type == first.sample_type) {
        first.sample_type
    } else {
        SampleType::Other
    };

    let mut merged = Sample::new(
        format!("{} (merged)", first.name),
        sample_type,
        start,
        end - start,
        first.source.clone(),
    );
    merged.source_sha256 = first.source_sha256.clone();
    merged.favorite = samples.iter().any(|s| s.favorite);
    for tag in samples.iter().flat_map(|s| s.tags.iter()) {
        if !merged.has_tag(tag) {
            merged.tags.push(tag.clone());
        }
    }

    log::debug!(
        "Merged {} samples into {:.3}s..{:.3}s",
        samples.len(),
        start,
        end
    );

    Ok(merged)
}
