//! Integration tests for the learned-detector pipeline, driven by a mock backend.

mod common;

use image::{DynamicImage, RgbaImage};
use std::sync::Arc;
use subvision::{DetectorConfig, DirectorySink, InferenceBackend, LearnedDetector, Observation, VisionError};

use common::*;

fn wide_frame() -> DynamicImage {
    DynamicImage::ImageRgb8(blank_frame(1000, 500))
}

#[test]
fn test_best_box_is_mapped_back_to_frame() -> anyhow::Result<()> {
    let backend = MockBackend::returning(
        vec![51.2, 25.6, 102.4, 51.2, 0.0, 0.0, 5.0, 5.0],
        vec![0.9, 0.4],
        vec![0, 0],
    );
    let detector = LearnedDetector::new(backend, DetectorConfig::bins())?;

    let observation = detector.detect(&wide_frame())?;
    assert_eq!(observation.score, 0.9);
    assert!((observation.x - 150.0).abs() < 1e-3);
    assert!((observation.y - 75.0).abs() < 1e-3);

    let seen = detector.backend().seen.borrow();
    assert_eq!(seen.len(), 1);
    let (len, scale, shape) = seen[0];
    assert_eq!(len, 512 * 512 * 3);
    assert!((scale - 0.512).abs() < 1e-6);
    assert_eq!(shape, [1, 512, 512, 3]);
    Ok(())
}

#[test]
fn test_thresholds_differ_per_target() -> anyhow::Result<()> {
    let outputs = || MockBackend::returning(vec![10.0, 10.0, 20.0, 20.0], vec![0.45], vec![0]);

    let bins = LearnedDetector::new(outputs(), DetectorConfig::bins())?;
    let gates = LearnedDetector::new(outputs(), DetectorConfig::gates())?;

    assert!(bins.detect(&wide_frame())?.found());
    assert_eq!(gates.detect(&wide_frame())?, Observation::NONE);
    Ok(())
}

#[test]
fn test_nothing_above_threshold_is_empty() -> anyhow::Result<()> {
    let backend = MockBackend::returning(vec![0.0; 8], vec![0.2, 0.1], vec![0, 0]);
    let detector = LearnedDetector::new(backend, DetectorConfig::bins())?;
    assert_eq!(detector.detect(&wide_frame())?, Observation::NONE);

    let empty = LearnedDetector::new(MockBackend::default(), DetectorConfig::bins())?;
    assert_eq!(empty.detect(&wide_frame())?, Observation::NONE);
    Ok(())
}

#[test]
fn test_inconsistent_outputs_propagate() -> anyhow::Result<()> {
    let backend = MockBackend::returning(vec![0.0; 4], vec![0.9, 0.8], vec![0, 0]);
    let detector = LearnedDetector::new(backend, DetectorConfig::bins())?;

    assert!(matches!(
        detector.detect(&wide_frame()),
        Err(VisionError::RuntimeFailure(_))
    ));
    Ok(())
}

#[test]
fn test_backend_failure_propagates() -> anyhow::Result<()> {
    let detector = LearnedDetector::new(MockBackend::failing("device lost"), DetectorConfig::gates())?;

    match detector.detect(&wide_frame()) {
        Err(VisionError::RuntimeFailure(msg)) => assert!(msg.contains("device lost")),
        other => panic!("expected RuntimeFailure, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_malformed_frame_never_reaches_backend() -> anyhow::Result<()> {
    let detector = LearnedDetector::new(MockBackend::default(), DetectorConfig::bins())?;
    let frame = DynamicImage::ImageRgba8(RgbaImage::new(32, 32));

    assert!(matches!(detector.detect(&frame), Err(VisionError::MalformedInput(_))));
    assert!(detector.backend().seen.borrow().is_empty());
    Ok(())
}

#[test]
fn test_efficientdet_variant_sets_input_size() -> anyhow::Result<()> {
    let config = DetectorConfig::bins().with_efficientdet(1)?;
    assert_eq!(config.input_size, 640);

    let detector = LearnedDetector::new(MockBackend::default(), config)?;
    detector.detect(&wide_frame())?;

    let (_, scale, shape) = detector.backend().seen.borrow()[0];
    assert_eq!(shape, [1, 640, 640, 3]);
    assert!((scale - 0.64).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_boxed_backend_can_be_injected() -> anyhow::Result<()> {
    let backend: Box<dyn InferenceBackend> =
        Box::new(MockBackend::returning(vec![0.0, 0.0, 10.24, 10.24], vec![0.6], vec![0]));
    let detector = LearnedDetector::new(backend, DetectorConfig::gates())?;

    let observation = detector.detect(&wide_frame())?;
    assert!((observation.x - 10.0).abs() < 1e-3);
    assert!((observation.y - 10.0).abs() < 1e-3);
    Ok(())
}

#[test]
fn test_detection_is_logged_when_diagnostics_enabled() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let sink = Arc::new(DirectorySink::new(dir.path())?);
    let backend = MockBackend::returning(vec![100.0, 100.0, 200.0, 200.0], vec![0.95], vec![0]);
    let detector = LearnedDetector::new(backend, DetectorConfig::bins())?.with_diagnostics(sink);

    let frame = wide_frame();
    let before = frame.clone();
    assert!(detector.detect(&frame)?.found());

    assert_eq!(frame.as_bytes(), before.as_bytes());
    assert_eq!(std::fs::read_dir(dir.path().join("input"))?.count(), 1);
    assert_eq!(std::fs::read_dir(dir.path().join("detection"))?.count(), 1);
    Ok(())
}

#[test]
fn test_invalid_detector_config_is_rejected() {
    let config = DetectorConfig {
        classes: Vec::new(),
        ..DetectorConfig::bins()
    };
    assert!(matches!(
        LearnedDetector::new(MockBackend::default(), config),
        Err(VisionError::InvalidConfig(_))
    ));
}
