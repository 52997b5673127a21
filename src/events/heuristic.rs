// Heuristic (rule-based) instrument classifier
// Ordered decision tree over centroid, flux, attack time and harmonicity.
// Rules are evaluated top to bottom and the first match wins.

use crate::audio::features::extract_features;
use crate::audio::spectrum::SpectrumStrategy;
use crate::events::types::{InstrumentLabel, SampleType, SegmentFeatures};

/// Classification result for one segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationResult {
    /// Raw instrument label from the decision tree
    pub label: InstrumentLabel,

    /// Category stored on the sample
    pub sample_type: SampleType,

    /// Features the decision was made on (for debugging/visualization)
    pub features: SegmentFeatures,
}

/// Decision thresholds
///
/// Centroids in Hz, attack times in seconds, harmonicity and flux unitless.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Centroid below which a hit is low-pitched (kick, bass)
    pub low_centroid_hz: f32,
    /// Centroid above which a hit is bright (hihat)
    pub bright_centroid_hz: f32,
    /// Upper centroid bound for snares; also the synth brightness bound
    pub snare_centroid_max_hz: f32,
    /// Minimum centroid for piano
    pub piano_centroid_min_hz: f32,

    pub kick_attack_max: f32,
    pub hihat_attack_max: f32,
    pub snare_attack_max: f32,
    pub bass_attack_min: f32,

    pub bass_harmonicity_min: f32,
    /// Piano lower bound; guitar upper bound
    pub piano_harmonicity_min: f32,
    pub guitar_harmonicity_min: f32,
    /// Synth fires below this when the centroid is bright
    pub synth_harmonicity_max: f32,

    /// Piano upper bound; guitar lower bound
    pub steady_flux_max: f32,
    pub synth_flux_min: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            low_centroid_hz: 500.0,
            bright_centroid_hz: 3000.0,
            snare_centroid_max_hz: 2000.0,
            piano_centroid_min_hz: 800.0,
            kick_attack_max: 0.05,
            hihat_attack_max: 0.03,
            snare_attack_max: 0.08,
            bass_attack_min: 0.1,
            bass_harmonicity_min: 0.7,
            piano_harmonicity_min: 0.8,
            guitar_harmonicity_min: 0.6,
            synth_harmonicity_max: 0.6,
            steady_flux_max: 0.3,
            synth_flux_min: 0.5,
        }
    }
}

/// Rule-based classifier using spectral and temporal features
#[derive(Debug, Clone, Default)]
pub struct HeuristicClassifier {
    config: ClassifierConfig,
    strategy: SpectrumStrategy,
}

impl HeuristicClassifier {
    /// Create a new heuristic classifier with default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier with custom thresholds
    pub fn with_config(config: ClassifierConfig) -> Self {
        HeuristicClassifier {
            config,
            strategy: SpectrumStrategy::default(),
        }
    }

    /// Use a different spectrum strategy for segment features
    pub fn with_strategy(mut self, strategy: SpectrumStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn strategy(&self) -> SpectrumStrategy {
        self.strategy
    }

    /// Extract features from a segment and classify them
    pub fn classify_segment(&self, segment: &[f32], sample_rate: u32) -> ClassificationResult {
        let features = extract_features(segment, sample_rate, self.strategy);
        self.classify(&features)
    }

    /// Classify precomputed features
    pub fn classify(&self, features: &SegmentFeatures) -> ClassificationResult {
        let label = self.label_for(features);
        ClassificationResult {
            label,
            sample_type: label.sample_type(),
            features: *features,
        }
    }

    fn label_for(&self, f: &SegmentFeatures) -> InstrumentLabel {
        let c = &self.config;
        let centroid = f.spectral_centroid;
        let attack = f.attack_time;
        let harmonicity = f.harmonicity;
        let flux = f.spectral_flux;

        if centroid < c.low_centroid_hz && attack < c.kick_attack_max {
            InstrumentLabel::Kick
        } else if centroid > c.bright_centroid_hz && attack < c.hihat_attack_max {
            InstrumentLabel::Hihat
        } else if centroid > c.low_centroid_hz
            && centroid < c.snare_centroid_max_hz
            && attack < c.snare_attack_max
        {
            InstrumentLabel::Snare
        } else if centroid < c.low_centroid_hz
            && attack > c.bass_attack_min
            && harmonicity > c.bass_harmonicity_min
        {
            InstrumentLabel::Bass
        } else if harmonicity > c.piano_harmonicity_min
            && flux < c.steady_flux_max
            && centroid > c.piano_centroid_min_hz
        {
            InstrumentLabel::Piano
        } else if harmonicity > c.guitar_harmonicity_min
            && harmonicity < c.piano_harmonicity_min
            && flux > c.steady_flux_max
        {
            InstrumentLabel::Guitar
        } else if flux > c.synth_flux_min
            || (centroid > c.snare_centroid_max_hz && harmonicity < c.synth_harmonicity_max)
        {
            InstrumentLabel::Synth
        } else {
            InstrumentLabel::Other
        }
    }
}
