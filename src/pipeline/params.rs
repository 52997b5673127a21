// Analysis parameters
// The one place sensitivity becomes a detection threshold

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::audio::SpectrumStrategy;
use crate::events::HeuristicClassifier;
use crate::pipeline::AnalysisError;

/// Parameter set for one analysis pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// Detection sensitivity [0, 100]; higher detects more
    pub sensitivity: f32,

    /// Envelope follower attack in milliseconds
    pub attack_ms: f32,

    /// Envelope follower release in milliseconds
    pub release_ms: f32,

    /// Explicit detection threshold; overrides sensitivity when set
    pub threshold: Option<f32>,

    /// Minimum gap between boundaries in milliseconds. Segments shorter
    /// than half of this are discarded.
    pub min_length_ms: f32,

    /// Spectrum the classifier extracts segment features from
    pub spectrum: SpectrumStrategy,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        AnalysisParams {
            sensitivity: 50.0,
            attack_ms: 10.0,
            release_ms: 100.0,
            threshold: None,
            min_length_ms: 100.0,
            spectrum: SpectrumStrategy::default(),
        }
    }
}

impl AnalysisParams {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self, AnalysisError> {
        let contents = std::fs::read_to_string(path)?;
        let params: AnalysisParams = serde_json::from_str(&contents)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(0.0..=100.0).contains(&self.sensitivity) {
            return Err(AnalysisError::InvalidParameter(format!(
                "sensitivity {} outside 0-100",
                self.sensitivity
            )));
        }
        if !(self.min_length_ms.is_finite() && self.min_length_ms > 0.0) {
            return Err(AnalysisError::InvalidParameter(format!(
                "min_length_ms must be positive, got {}",
                self.min_length_ms
            )));
        }
        if !(self.attack_ms >= 0.0 && self.release_ms >= 0.0) {
            return Err(AnalysisError::InvalidParameter(
                "attack_ms and release_ms must be non-negative".to_string(),
            ));
        }
        if let Some(threshold) = self.threshold {
            if !(threshold.is_finite() && threshold >= 0.0) {
                return Err(AnalysisError::InvalidParameter(format!(
                    "threshold must be non-negative, got {}",
                    threshold
                )));
            }
        }
        Ok(())
    }

    /// Threshold handed to both detectors
    pub fn detection_threshold(&self) -> f32 {
        self.threshold
            .unwrap_or((100.0 - self.sensitivity) / 1000.0)
    }

    /// Classifier configured for this pass
    pub fn classifier(&self) -> HeuristicClassifier {
        HeuristicClassifier::new().with_strategy(self.spectrum)
    }

    /// Minimum boundary gap in seconds
    pub fn min_gap_secs(&self) -> f64 {
        self.min_length_ms as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sensitivity_to_threshold() {
        let params = AnalysisParams::default();
        assert!((params.detection_threshold() - 0.05).abs() < 1e-6);

        let sensitive = AnalysisParams {
            sensitivity: 100.0,
            ..Default::default()
        };
        assert_eq!(sensitive.detection_threshold(), 0.0);

        let deaf = AnalysisParams {
            sensitivity: 0.0,
            ..Default::default()
        };
        assert!((deaf.detection_threshold() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_explicit_threshold_wins() {
        let params = AnalysisParams {
            sensitivity: 90.0,
            threshold: Some(0.3),
            ..Default::default()
        };
        assert_eq!(params.detection_threshold(), 0.3);
    }

    #[test]
    fn test_validation() {
        assert!(AnalysisParams::default().validate().is_ok());

        let bad_sensitivity = AnalysisParams {
            sensitivity: 120.0,
            ..Default::default()
        };
        assert!(bad_sensitivity.validate().is_err());

        let bad_length = AnalysisParams {
            min_length_ms: 0.0,
            ..Default::default()
        };
        assert!(bad_length.validate().is_err());

        let bad_threshold = AnalysisParams {
            threshold: Some(f32::NAN),
            ..Default::default()
        };
        assert!(bad_threshold.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("params.json");
        std::fs::write(&path, r#"{ "sensitivity": 70, "min_length_ms": 50 }"#).unwrap();

        let params = AnalysisParams::from_json_file(&path).unwrap();
        assert_eq!(params.sensitivity, 70.0);
        assert_eq!(params.min_length_ms, 50.0);
        assert_eq!(params.release_ms, 100.0);
        assert_eq!(params.threshold, None);
        assert_eq!(params.spectrum, SpectrumStrategy::MagnitudeApprox);
    }

    #[test]
    fn test_spectrum_selects_classifier_strategy() {
        let params: AnalysisParams =
            serde_json::from_str(r#"{ "spectrum": "magnitude_approx" }"#).unwrap();
        assert_eq!(params.classifier().strategy(), SpectrumStrategy::MagnitudeApprox);

        let unknown = serde_json::from_str::<AnalysisParams>(r#"{ "spectrum": "wavelet" }"#);
        assert!(unknown.is_err());
    }

    #[cfg(feature = "fft")]
    #[test]
    fn test_fft_spectrum_from_json() {
        let params: AnalysisParams = serde_json::from_str(r#"{ "spectrum": "fft" }"#).unwrap();
        assert_eq!(params.spectrum, SpectrumStrategy::Fft);
        assert_eq!(params.classifier().strategy(), SpectrumStrategy::Fft);
    }

    #[cfg(not(feature = "fft"))]
    #[test]
    fn test_fft_spectrum_needs_feature() {
        assert!(serde_json::from_str::<AnalysisParams>(r#"{ "spectrum": "fft" }"#).is_err());
    }
}
