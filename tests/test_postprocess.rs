//! Integration tests for threshold selection and inverse-letterbox rescaling.

use subvision::detection::postprocess::{Postprocessor, check_sorted};
use subvision::{Detection, Observation, RawOutputs, VisionError};

fn det(score: f32, bbox: [f32; 4]) -> Detection {
    Detection { score, label: 0, bbox }
}

#[test]
fn test_picks_best_entry_above_threshold() -> anyhow::Result<()> {
    let detections = vec![
        det(0.9, [51.2, 25.6, 102.4, 51.2]),
        det(0.4, [0.0, 0.0, 10.0, 10.0]),
        // Never inspected: a garbage box must not matter
        det(0.1, [f32::NAN, f32::NAN, f32::INFINITY, -1.0]),
    ];

    let post = Postprocessor::new(0.3);
    let selection = post.select(&detections, 0.512)?.expect("0.9 clears 0.3");
    assert_eq!(selection.detection.score, 0.9);

    let observation = post.observe(&detections, 0.512)?;
    assert_eq!(observation.score, 0.9);
    assert!((observation.x - 150.0).abs() < 1e-3);
    assert!((observation.y - 75.0).abs() < 1e-3);
    assert_eq!(observation.distance, 0.0);
    Ok(())
}

#[test]
fn test_tail_after_cutoff_does_not_change_result() -> anyhow::Result<()> {
    let post = Postprocessor::new(0.5);
    let head = vec![det(0.8, [10.0, 20.0, 30.0, 40.0]), det(0.4, [0.0; 4])];
    let mut full = head.clone();
    full.extend([det(0.2, [1.0; 4]), det(0.05, [2.0; 4]), det(-1.0, [-1.0; 4])]);

    assert_eq!(post.observe(&head, 2.0)?, post.observe(&full, 2.0)?);

    let below = vec![det(0.45, [1.0; 4])];
    let mut below_full = below.clone();
    below_full.push(det(0.1, [5.0; 4]));
    assert_eq!(post.observe(&below, 1.0)?, Observation::NONE);
    assert_eq!(post.observe(&below_full, 1.0)?, Observation::NONE);
    Ok(())
}

#[test]
fn test_score_equal_to_threshold_is_rejected() -> anyhow::Result<()> {
    let post = Postprocessor::new(0.5);
    let detections = vec![det(0.5, [0.0, 0.0, 4.0, 4.0])];
    assert_eq!(post.observe(&detections, 1.0)?, Observation::NONE);
    Ok(())
}

#[test]
fn test_empty_list_is_no_detection() -> anyhow::Result<()> {
    let post = Postprocessor::new(0.3);
    assert_eq!(post.select(&[], 0.5)?, None);
    assert_eq!(post.observe(&[], 0.5)?, Observation::NONE);
    Ok(())
}

#[test]
fn test_unsorted_scores_fail_loudly() {
    let detections = vec![det(0.2, [0.0; 4]), det(0.9, [0.0; 4])];
    let result = Postprocessor::new(0.3).observe(&detections, 1.0);

    match result {
        Err(VisionError::UnsortedScores { index, previous, current }) => {
            assert_eq!(index, 1);
            assert_eq!(previous, 0.2);
            assert_eq!(current, 0.9);
        }
        other => panic!("expected UnsortedScores, got {:?}", other),
    }
}

#[test]
fn test_sorted_check_accepts_ties_and_padding() -> anyhow::Result<()> {
    let detections = vec![det(0.7, [0.0; 4]), det(0.7, [0.0; 4]), det(-1.0, [0.0; 4]), det(-1.0, [0.0; 4])];
    check_sorted(&detections)?;
    check_sorted(&[])?;
    Ok(())
}

#[test]
fn test_invalid_scale_is_malformed() {
    let detections = vec![det(0.9, [0.0; 4])];
    let post = Postprocessor::new(0.3);
    for scale in [0.0, -1.0, f32::NAN, f32::INFINITY] {
        assert!(matches!(
            post.observe(&detections, scale),
            Err(VisionError::MalformedInput(_))
        ));
    }
}

#[test]
fn test_non_finite_winning_box_is_runtime_failure() {
    let detections = vec![det(0.9, [f32::NAN, 0.0, 1.0, 1.0])];
    assert!(matches!(
        Postprocessor::new(0.3).observe(&detections, 1.0),
        Err(VisionError::RuntimeFailure(_))
    ));
}

#[test]
fn test_raw_outputs_zip_into_detections() -> anyhow::Result<()> {
    let raw = RawOutputs {
        boxes: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        scores: vec![0.9, 0.1],
        labels: vec![0, 3],
    };
    let detections = raw.into_detections()?;

    assert_eq!(detections.len(), 2);
    assert_eq!(detections[1].label, 3);
    assert_eq!(detections[1].bbox, [5.0, 6.0, 7.0, 8.0]);
    Ok(())
}

#[test]
fn test_mismatched_raw_outputs_are_runtime_failures() {
    let short_boxes = RawOutputs {
        boxes: vec![1.0, 2.0, 3.0],
        scores: vec![0.9],
        labels: vec![0],
    };
    let short_labels = RawOutputs {
        boxes: vec![1.0, 2.0, 3.0, 4.0],
        scores: vec![0.9],
        labels: vec![],
    };
    assert!(matches!(short_boxes.into_detections(), Err(VisionError::RuntimeFailure(_))));
    assert!(matches!(short_labels.into_detections(), Err(VisionError::RuntimeFailure(_))));
}
