// End-to-end: WAV bytes in, classified samples and exported WAV files out

use std::io::Cursor;
use std::sync::Arc;

use alchemist_lib::audio::{ingest_wav, PcmBuffer};
use alchemist_lib::events::SampleType;
use alchemist_lib::export::{
    apply_naming_pattern, encode_wav, export_batch, export_sample, ExportSettings, NamingContext,
};
use alchemist_lib::pipeline::{analyze, AnalysisParams};
use alchemist_lib::state::{edit, SampleLibrary};
use approx::assert_abs_diff_eq;
use tempfile::TempDir;

const SR: u32 = 44100;

/// One second of silence with 50 ms, 100 Hz bursts at 0.0 s and 0.5 s
fn two_burst_recording() -> Vec<f32> {
    let mut samples = vec![0.0f32; SR as usize];
    for start in [0usize, SR as usize / 2] {
        for i in 0..2205 {
            let phase = 2.0 * std::f32::consts::PI * 100.0 * i as f32 / SR as f32;
            samples[start + i] = 0.8 * phase.sin();
        }
    }
    samples
}

#[test]
fn test_two_bursts_become_two_samples() {
    let bytes = encode_wav(&[two_burst_recording()], SR);
    let buffer = Arc::new(ingest_wav(&bytes).unwrap());
    assert!(buffer.source_sha256.is_some());

    let result = analyze(&buffer, &AnalysisParams::default()).unwrap();

    assert_eq!(result.samples.len(), 2);
    let first = &result.samples[0];
    let second = &result.samples[1];
    assert_eq!(first.start, 0.0);
    assert!(second.start - first.start >= 0.1);
    assert!(second.start <= 0.5);
    assert_eq!(second.duration, 0.5);
    assert!(first.name.ends_with("Sample 1"));
    assert!(second.name.ends_with("Sample 2"));
    for sample in &result.samples {
        assert!(sample.tags.is_empty());
        assert!(!sample.favorite);
        assert_eq!(sample.source_sha256, buffer.source_sha256);
    }

    // Markers are strictly increasing and spaced by the minimum length
    for pair in result.markers.windows(2) {
        assert!(pair[1] - pair[0] >= 0.1);
    }
}

#[test]
fn test_silence_produces_no_samples() {
    let buffer = Arc::new(PcmBuffer::from_mono(vec![0.0; SR as usize], SR));
    for sensitivity in [0.0, 50.0, 100.0] {
        let params = AnalysisParams {
            sensitivity,
            ..Default::default()
        };
        let result = analyze(&buffer, &params).unwrap();
        assert!(result.samples.is_empty());
        assert!(result.markers.is_empty());
    }
}

#[test]
fn test_export_round_trip_through_hound() {
    let buffer = PcmBuffer::from_mono(two_burst_recording(), SR);
    let bytes = export_sample(&buffer, 0.0, 0.25, &ExportSettings::default()).unwrap();

    let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 44100);
    assert_eq!(spec.bits_per_sample, 16);

    let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples.len(), 11025);

    // 0.8 peak normalized to full scale
    let peak = samples.iter().map(|s| (*s as i32).abs()).max().unwrap();
    assert!(peak >= 32700);
    assert_abs_diff_eq!(samples[samples.len() - 1] as f32, 0.0);
}

#[test]
fn test_naming_pattern_example() {
    let name = apply_naming_pattern(
        "{type}_{index}_{name}",
        &NamingContext {
            name: "Kick!! Hit",
            sample_type: SampleType::Kick,
            index: 3,
            duration: 0.5,
        },
    );
    assert_eq!(name, "kick_3_Kick_Hit");
}

#[test]
fn test_analyze_save_reload_edit_and_export() {
    let temp_dir = TempDir::new().unwrap();
    let library_path = temp_dir.path().join("library.json");
    let bytes = encode_wav(&[two_burst_recording()], SR);
    let buffer = Arc::new(ingest_wav(&bytes).unwrap());

    let result = analyze(&buffer, &AnalysisParams::default()).unwrap();
    let mut library = SampleLibrary::new();
    library.extend(result.samples);
    library.save(&library_path).unwrap();

    // Audio is not persisted; reloading needs the recording again
    let mut reloaded = SampleLibrary::load(&library_path).unwrap();
    assert!(reloaded.samples().iter().all(|s| !s.has_source()));
    let decoded = Arc::new(ingest_wav(&bytes).unwrap());
    assert_eq!(reloaded.reattach(&decoded), 2);

    let selection: Vec<_> = reloaded.samples().into_iter().cloned().collect();
    let merged = edit::merge(&selection).unwrap();
    assert_eq!(merged.start, 0.0);
    assert_abs_diff_eq!(merged.end(), selection[1].end(), epsilon = 1e-9);

    let report = export_batch(
        std::slice::from_ref(&merged),
        &temp_dir.path().join("out"),
        &ExportSettings::default(),
    )
    .unwrap();
    assert!(report.is_complete());
    let written = std::fs::read(&report.exported[0].path).unwrap();
    let frames = (merged.duration * SR as f64).floor() as usize;
    assert_eq!(written.len(), 44 + frames * 2);
}
