// Event classification types
// Instrument labels, the sample categories they map to, and the feature
// vector the classifier consumes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw instrument label produced by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentLabel {
    /// Low, fast attack
    Kick,
    /// Mid centroid, fast attack
    Snare,
    /// Bright, very fast attack
    Hihat,
    /// Low, slow attack, strongly harmonic
    Bass,
    /// Bright, harmonic and stable
    Piano,
    /// Moderately harmonic with movement
    Guitar,
    /// High flux or bright and inharmonic
    Synth,
    Other,
}

impl InstrumentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentLabel::Kick => "kick",
            InstrumentLabel::Snare => "snare",
            InstrumentLabel::Hihat => "hihat",
            InstrumentLabel::Bass => "bass",
            InstrumentLabel::Piano => "piano",
            InstrumentLabel::Guitar => "guitar",
            InstrumentLabel::Synth => "synth",
            InstrumentLabel::Other => "other",
        }
    }

    /// Capitalized label used in generated sample names
    pub fn display_name(&self) -> &'static str {
        match self {
            InstrumentLabel::Kick => "Kick",
            InstrumentLabel::Snare => "Snare",
            InstrumentLabel::Hihat => "Hihat",
            InstrumentLabel::Bass => "Bass",
            InstrumentLabel::Piano => "Piano",
            InstrumentLabel::Guitar => "Guitar",
            InstrumentLabel::Synth => "Synth",
            InstrumentLabel::Other => "Other",
        }
    }

    /// Collapse into the closed set of sample categories
    pub fn sample_type(&self) -> SampleType {
        match self {
            InstrumentLabel::Kick => SampleType::Kick,
            InstrumentLabel::Snare => SampleType::Snare,
            InstrumentLabel::Hihat => SampleType::Hihat,
            InstrumentLabel::Bass => SampleType::Bass,
            InstrumentLabel::Piano | InstrumentLabel::Guitar | InstrumentLabel::Synth => {
                SampleType::Melody
            }
            InstrumentLabel::Other => SampleType::Other,
        }
    }
}

/// Category stored on a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleType {
    Kick,
    Snare,
    Hihat,
    Melody,
    Bass,
    Other,
}

impl SampleType {
    pub const ALL: [SampleType; 6] = [
        SampleType::Kick,
        SampleType::Snare,
        SampleType::Hihat,
        SampleType::Melody,
        SampleType::Bass,
        SampleType::Other,
    ];

    /// Lowercase identifier, used in filenames
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleType::Kick => "kick",
            SampleType::Snare => "snare",
            SampleType::Hihat => "hihat",
            SampleType::Melody => "melody",
            SampleType::Bass => "bass",
            SampleType::Other => "other",
        }
    }

    /// Capitalized label used in generated sample names
    pub fn display_name(&self) -> &'static str {
        match self {
            SampleType::Kick => "Kick",
            SampleType::Snare => "Snare",
            SampleType::Hihat => "Hihat",
            SampleType::Melody => "Melody",
            SampleType::Bass => "Bass",
            SampleType::Other => "Other",
        }
    }

    /// Parse a lowercase identifier; unknown strings fall back to Other
    pub fn from_string(s: &str) -> Self {
        SampleType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .unwrap_or(SampleType::Other)
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spectral and temporal features extracted from a segment
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentFeatures {
    /// Spectral centroid (Hz) - "center of mass" of the magnitude array
    pub spectral_centroid: f32,

    /// Mean frame-to-frame magnitude change
    pub spectral_flux: f32,

    /// Seconds from the 10% threshold crossing to the peak
    pub attack_time: f32,

    /// Share of magnitude on harmonics of the detected fundamental [0, 1]
    pub harmonicity: f32,
}

impl SegmentFeatures {
    /// Features of an empty or silent segment
    pub fn zero() -> Self {
        Self::default()
    }
}
