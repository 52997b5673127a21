// Sample library
// JSON document of samples keyed by id. Audio is never stored; entries are
// re-linked to the currently loaded recording by source fingerprint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use chrono::{DateTime, Utc};

use crate::audio::PcmBuffer;
use crate::events::SampleType;
use crate::state::models::Sample;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Sample not found: {0}")]
    NotFound(Uuid),

    #[error("Sample {0} was cut from a different recording")]
    SourceMismatch(Uuid),
}

pub type LibraryResult<T> = Result<T, LibraryError>;

/// Filter for listing library samples
#[derive(Debug, Clone, Default)]
pub struct SampleQuery {
    /// Case-insensitive substring of the name
    pub text: Option<String>,
    /// Allowed types; empty means any
    pub types: Vec<SampleType>,
    /// Tags that must all be present
    pub tags: Vec<String>,
    pub favorites_only: bool,
}

impl SampleQuery {
    pub fn matches(&self, sample: &Sample) -> bool {
        if let Some(ref text) = self.text {
            let needle = text.trim().to_lowercase();
            if !needle.is_empty() && !sample.name.to_lowercase().contains(&needle) {
                return false;
            }
        }
        if !self.types.is_empty() && !self.types.contains(&sample.sample_type) {
            return false;
        }
        if !self
            .tags
            .iter()
            .all(|tag| sample.has_tag(&tag.trim().to_lowercase()))
        {
            return false;
        }
        !self.favorites_only || sample.favorite
    }
}

/// Persistent collection of samples
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleLibrary {
    pub updated_at: DateTime<Utc>,
    samples: BTreeMap<Uuid, Sample>,
}

impl Default for SampleLibrary {
    fn default() -> Self {
        SampleLibrary {
            updated_at: Utc::now(),
            samples: BTreeMap::new(),
        }
    }
}

impl SampleLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; a missing file yields an empty library
    ///
    /// Entries whose region is negative, empty, non-finite or implausibly long
    /// are dropped with a warning.
    pub fn load(path: &Path) -> LibraryResult<Self> {
        if !path.exists() {
            log::debug!("No library at {}, starting empty", path.display());
            return Ok(Self::new());
        }
        let contents = fs::read_to_string(path)?;
        let mut library: SampleLibrary = serde_json::from_str(&contents)?;
        library.samples.retain(|id, sample| {
            let valid = sample.has_valid_region();
            if !valid {
                log::warn!(
                    "Dropping sample {} with invalid region (start {}, duration {})",
                    id,
                    sample.start,
                    sample.duration
                );
            }
            valid
        });
        log::info!("Loaded {} samples from {}", library.len(), path.display());
        Ok(library)
    }

    /// Write the library as pretty JSON, creating parent directories
    pub fn save(&mut self, path: &Path) -> LibraryResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        self.updated_at = Utc::now();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Saved {} samples to {}", self.len(), path.display());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Insert or replace by id
    pub fn upsert(&mut self, sample: Sample) {
        self.samples.insert(sample.id, sample);
    }

    pub fn extend(&mut self, samples: impl IntoIterator<Item = Sample>) {
        for sample in samples {
            self.upsert(sample);
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<&Sample> {
        self.samples.get(id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> LibraryResult<&mut Sample> {
        self.samples.get_mut(id).ok_or(LibraryError::NotFound(*id))
    }

    pub fn remove(&mut self, id: &Uuid) -> LibraryResult<Sample> {
        self.samples.remove(id).ok_or(LibraryError::NotFound(*id))
    }

    /// Replace `removed` ids with `added` samples (split and merge results)
    pub fn replace(&mut self, removed: &[Uuid], added: Vec<Sample>) -> LibraryResult<()> {
        if let Some(missing) = removed.iter().find(|id| !self.samples.contains_key(id)) {
            return Err(LibraryError::NotFound(*missing));
        }
        for id in removed {
            self.samples.remove(id);
        }
        self.extend(added);
        Ok(())
    }

    /// Samples ordered by source position
    pub fn samples(&self) -> Vec<&Sample> {
        let mut samples: Vec<&Sample> = self.samples.values().collect();
        samples.sort_by(|a, b| a.start.total_cmp(&b.start));
        samples
    }

    pub fn search(&self, query: &SampleQuery) -> Vec<&Sample> {
        self.samples()
            .into_iter()
            .filter(|s| query.matches(s))
            .collect()
    }

    /// Link every detached entry whose fingerprint matches `buffer`
    ///
    /// A buffer without a fingerprint matches nothing. Returns the number of
    /// samples re-attached.
    pub fn reattach(&mut self, buffer: &Arc<PcmBuffer>) -> usize {
        let Some(ref fingerprint) = buffer.source_sha256 else {
            log::debug!("Buffer has no fingerprint, nothing to re-attach");
            return 0;
        };
        let mut attached = 0;
        for sample in self.samples.values_mut() {
            if sample.source.is_none() && sample.source_sha256.as_ref() == Some(fingerprint) {
                sample.source = Some(Arc::clone(buffer));
                attached += 1;
            }
        }
        log::debug!("Re-attached {} samples", attached);
        attached
    }

    /// Attach a specific entry to `buffer`, checking the fingerprint
    pub fn attach(&mut self, id: &Uuid, buffer: &Arc<PcmBuffer>) -> LibraryResult<()> {
        let sample = self.get_mut(id)?;
        if sample.source_sha256.is_some() && sample.source_sha256 != buffer.source_sha256 {
            // Also covers a fingerprinted sample against an unfingerprinted buffer
            return Err(LibraryError::SourceMismatch(*id));
        }
        sample.source = Some(Arc::clone(buffer));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::edit;
    use tempfile::TempDir;

    fn buffer_with_hash(hash: &str) -> Arc<PcmBuffer> {
        Arc::new(PcmBuffer {
            channels: vec![vec![0.0; 100]],
            sample_rate: 100,
            source_sha256: Some(hash.to_string()),
        })
    }

    fn library_with_samples(buffer: &Arc<PcmBuffer>) -> (SampleLibrary, Vec<Uuid>) {
        let mut library = SampleLibrary::new();
        let mut kick = Sample::new("Kick Sample 1", SampleType::Kick, 0.0, 0.2, Some(buffer.clone()));
        edit::add_tag(&mut kick, "punchy");
        let mut snare = Sample::new("Snare Sample 2", SampleType::Snare, 0.2, 0.2, Some(buffer.clone()));
        snare.favorite = true;
        let hat = Sample::new("Hihat Sample 3", SampleType::Hihat, 0.4, 0.1, Some(buffer.clone()));
        let ids = vec![kick.id, snare.id, hat.id];
        library.extend([hat, kick, snare]);
        (library, ids)
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lib").join("library.json");
        let buffer = buffer_with_hash("aaaa");
        let (mut library, ids) = library_with_samples(&buffer);

        library.save(&path).unwrap();
        let loaded = SampleLibrary::load(&path).unwrap();

        assert_eq!(loaded.len(), 3);
        let kick = loaded.get(&ids[0]).unwrap();
        assert_eq!(kick.tags, vec!["punchy"]);
        // Audio never survives serialization
        assert!(loaded.samples().iter().all(|s| !s.has_source()));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let library = SampleLibrary::load(&temp_dir.path().join("nope.json")).unwrap();
        assert!(library.is_empty());
    }

    #[test]
    fn test_samples_sorted_by_start() {
        let buffer = buffer_with_hash("aaaa");
        let (library, _) = library_with_samples(&buffer);
        let starts: Vec<f64> = library.samples().iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0.0, 0.2, 0.4]);
    }

    #[test]
    fn test_reattach_matches_fingerprint() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("library.json");
        let buffer = buffer_with_hash("aaaa");
        let (mut library, ids) = library_with_samples(&buffer);
        library.save(&path).unwrap();

        let mut loaded = SampleLibrary::load(&path).unwrap();
        assert_eq!(loaded.reattach(&buffer_with_hash("bbbb")), 0);
        assert_eq!(loaded.reattach(&buffer_with_hash("aaaa")), 3);
        assert!(loaded.get(&ids[1]).unwrap().has_source());

        let mut reloaded = SampleLibrary::load(&path).unwrap();
        assert!(matches!(
            reloaded.attach(&ids[0], &buffer_with_hash("bbbb")),
            Err(LibraryError::SourceMismatch(_))
        ));
    }

    #[test]
    fn test_reattach_ignores_missing_fingerprints() {
        let mut library = SampleLibrary::new();
        library.upsert(Sample::new("Kick Sample 1", SampleType::Kick, 0.0, 0.2, None));
        let unhashed = Arc::new(PcmBuffer::from_mono(vec![0.0; 100], 100));

        assert_eq!(library.reattach(&unhashed), 0);
        assert!(library.samples().iter().all(|s| !s.has_source()));
    }

    #[test]
    fn test_load_drops_invalid_regions() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("library.json");
        let buffer = buffer_with_hash("aaaa");
        let (mut library, ids) = library_with_samples(&buffer);
        library.save(&path).unwrap();

        // Corrupt two entries on disk: an absurd duration and a negative start
        let mut json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        json["samples"][ids[0].to_string()]["duration"] = serde_json::json!(1e300);
        json["samples"][ids[1].to_string()]["start"] = serde_json::json!(-2.0);
        fs::write(&path, json.to_string()).unwrap();

        let loaded = SampleLibrary::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.get(&ids[0]).is_none());
        assert!(loaded.get(&ids[1]).is_none());
        assert!(loaded.get(&ids[2]).is_some());
    }

    #[test]
    fn test_search_filters() {
        let buffer = buffer_with_hash("aaaa");
        let (library, ids) = library_with_samples(&buffer);

        let by_text = SampleQuery {
            text: Some("SAMPLE 2".to_string()),
            ..Default::default()
        };
        assert_eq!(library.search(&by_text).len(), 1);

        let by_type = SampleQuery {
            types: vec![SampleType::Kick, SampleType::Hihat],
            ..Default::default()
        };
        assert_eq!(library.search(&by_type).len(), 2);

        let by_tag = SampleQuery {
            tags: vec!["Punchy".to_string()],
            ..Default::default()
        };
        assert_eq!(library.search(&by_tag)[0].id, ids[0]);

        let favorites = SampleQuery {
            favorites_only: true,
            ..Default::default()
        };
        assert_eq!(library.search(&favorites)[0].id, ids[1]);

        assert_eq!(library.search(&SampleQuery::default()).len(), 3);
    }

    #[test]
    fn test_replace_after_merge() {
        let buffer = buffer_with_hash("aaaa");
        let (mut library, ids) = library_with_samples(&buffer);

        let selection: Vec<Sample> = ids[..2]
            .iter()
            .map(|id| library.get(id).unwrap().clone())
            .collect();
        let merged = edit::merge(&selection).unwrap();
        let merged_id = merged.id;
        library.replace(&ids[..2], vec![merged]).unwrap();

        assert_eq!(library.len(), 2);
        assert!(library.get(&ids[0]).is_none());
        assert!(library.get(&merged_id).is_some());

        let unknown = Uuid::new_v4();
        assert!(matches!(
            library.replace(&[unknown], vec![]),
            Err(LibraryError::NotFound(id)) if id == unknown
        ));
    }
}
