// Data models for sample state
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::audio::PcmBuffer;
use crate::events::SampleType;

/// Longest recording offset a sample may reach, in seconds (one day)
pub const MAX_REGION_SECS: f64 = 86_400.0;

/// A named, typed region of a source recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub sample_type: SampleType,

    /// Offset into the source in seconds
    pub start: f64,

    /// Length in seconds
    pub duration: f64,

    /// Audio this sample was cut from. Never serialized; absent after a
    /// library load until re-attached.
    #[serde(skip)]
    pub source: Option<Arc<PcmBuffer>>,

    /// SHA256 of the source file, used to re-attach after loading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_sha256: Option<String>,

    /// Set semantics, insertion order kept for display
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub favorite: bool,
}

impl Sample {
    /// Create a new sample with generated UUID
    pub fn new(
        name: impl Into<String>,
        sample_type: SampleType,
        start: f64,
        duration: f64,
        source: Option<Arc<PcmBuffer>>,
    ) -> Self {
        let source_sha256 = source.as_ref().and_then(|s| s.source_sha256.clone());
        Sample {
            id: Uuid::new_v4(),
            name: name.into(),
            sample_type,
            start,
            duration,
            source,
            source_sha256,
            tags: Vec::new(),
            favorite: false,
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Non-negative start, positive duration, ending within [`MAX_REGION_SECS`]
    pub fn has_valid_region(&self) -> bool {
        self.start >= 0.0 && self.duration > 0.0 && self.end() <= MAX_REGION_SECS
    }

    /// Whether two samples were cut from the same audio
    ///
    /// Either both hold the same buffer or both carry the same fingerprint.
    /// A missing fingerprint never matches anything.
    pub fn shares_source_with(&self, other: &Sample) -> bool {
        if let (Some(a), Some(b)) = (&self.source, &other.source) {
            if Arc::ptr_eq(a, b) {
                return true;
            }
        }
        matches!(
            (&self.source_sha256, &other.source_sha256),
            (Some(a), Some(b)) if a == b
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_creation() {
        let buffer = Arc::new(PcmBuffer {
            channels: vec![vec![0.0; 100]],
            sample_rate: 100,
            source_sha256: Some("abc".to_string()),
        });
        let sample = Sample::new("Kick Sample 1", SampleType::Kick, 0.25, 0.5, Some(buffer));

        assert_eq!(sample.name, "Kick Sample 1");
        assert_eq!(sample.end(), 0.75);
        assert!(sample.tags.is_empty());
        assert!(!sample.favorite);
        assert_eq!(sample.source_sha256.as_deref(), Some("abc"));
    }

    #[test]
    fn test_sample_json_omits_source() {
        let buffer = Arc::new(PcmBuffer::from_mono(vec![0.5; 10], 10));
        let sample = Sample::new("Bass Sample 2", SampleType::Bass, 0.0, 1.0, Some(buffer));

        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["type"], "bass");
        assert!(json.get("source").is_none());

        let restored: Sample = serde_json::from_value(json).unwrap();
        assert_eq!(restored.id, sample.id);
        assert!(!restored.has_source());
    }

    #[test]
    fn test_shares_source() {
        let buffer = Arc::new(PcmBuffer::from_mono(vec![0.0; 10], 10));
        let a = Sample::new("a", SampleType::Other, 0.0, 0.1, Some(buffer.clone()));
        let b = Sample::new("b", SampleType::Other, 0.1, 0.1, Some(buffer));
        let c = Sample::new(
            "c",
            SampleType::Other,
            0.0,
            0.1,
            Some(Arc::new(PcmBuffer::from_mono(vec![0.0; 10], 10))),
        );

        assert!(a.shares_source_with(&b));
        assert!(!a.shares_source_with(&c));
    }

    #[test]
    fn test_missing_fingerprints_never_match() {
        let a = Sample::new("a", SampleType::Other, 0.0, 0.1, None);
        let b = Sample::new("b", SampleType::Other, 0.1, 0.1, None);
        assert!(!a.shares_source_with(&b));

        let mut c = a.clone();
        c.source_sha256 = Some("abc".to_string());
        let mut d = b.clone();
        d.source_sha256 = Some("abc".to_string());
        assert!(c.shares_source_with(&d));
        assert!(!a.shares_source_with(&d));
    }

    #[test]
    fn test_region_validity() {
        let mut sample = Sample::new("a", SampleType::Other, 0.0, 0.1, None);
        assert!(sample.has_valid_region());

        for (start, duration) in [
            (-0.1, 0.1),
            (f64::NAN, 0.1),
            (0.0, 0.0),
            (0.0, f64::INFINITY),
            (0.0, 1e300),
        ] {
            sample.start = start;
            sample.duration = duration;
            assert!(!sample.has_valid_region());
        }
    }
}
