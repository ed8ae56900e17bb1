//! Async session behavior.

use std::time::Duration;

use framecoach_engine::UnifiedEvaluator;
use framecoach_models::keypoint::index;
use framecoach_models::{
    BodyPart, GuideStage, ImageSize, Keypoint, Keypoints, LiveMetrics, PartDifference,
    PoseComparison, ReferenceAnalysis, ReferenceFocalLength,
};
use framecoach_session::{CoachingSession, PublishedResult, SessionConfig, SessionError};
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_test::{assert_err, assert_ok};

const IMAGE: ImageSize = ImageSize::new(1080, 1440);

fn standing() -> Keypoints {
    let (cx, top, h) = (0.5, 0.1, 0.8);
    let mut points = vec![Keypoint::missing(); 17];
    let at = |dx: f64, fy: f64| Keypoint::new(cx + dx, top + h * fy, 0.9);
    points[index::NOSE] = at(0.0, 0.04);
    points[index::LEFT_EYE] = at(-0.01, 0.02);
    points[index::RIGHT_EYE] = at(0.01, 0.02);
    points[index::LEFT_EAR] = at(-0.02, 0.03);
    points[index::RIGHT_EAR] = at(0.02, 0.03);
    points[index::LEFT_SHOULDER] = at(-0.05, 0.18);
    points[index::RIGHT_SHOULDER] = at(0.05, 0.18);
    points[index::LEFT_ELBOW] = at(-0.07, 0.35);
    points[index::RIGHT_ELBOW] = at(0.07, 0.35);
    points[index::LEFT_WRIST] = at(-0.08, 0.5);
    points[index::RIGHT_WRIST] = at(0.08, 0.5);
    points[index::LEFT_HIP] = at(-0.04, 0.52);
    points[index::RIGHT_HIP] = at(0.04, 0.52);
    points[index::LEFT_KNEE] = at(-0.04, 0.75);
    points[index::RIGHT_KNEE] = at(0.04, 0.75);
    points[index::LEFT_ANKLE] = at(-0.04, 1.0);
    points[index::RIGHT_ANKLE] = at(0.04, 1.0);
    Keypoints::new(points)
}

fn reference() -> ReferenceAnalysis {
    ReferenceAnalysis {
        keypoints: standing(),
        bbox: None,
        image_size: IMAGE,
        aspect_ratio: None,
        focal_length: ReferenceFocalLength::Exif { mm: 26.0 },
        zoom_factor: None,
        compression_index: None,
    }
}

fn frame(t: f64) -> LiveMetrics {
    LiveMetrics::new(t, standing(), IMAGE).with_pose_comparison(PoseComparison {
        parts: vec![PartDifference {
            part: BodyPart::ShoulderTilt,
            angle_diff_deg: 1.0,
            hint: None,
        }],
    })
}

async fn wait_for_seq(
    rx: &mut watch::Receiver<Option<PublishedResult>>,
    seq: u64,
) -> PublishedResult {
    let published = timeout(
        Duration::from_secs(5),
        rx.wait_for(|r| r.as_ref().map(|p| p.frame_seq >= seq).unwrap_or(false)),
    )
    .await
    .expect("timed out waiting for result")
    .expect("session closed");
    published.clone().expect("result present")
}

#[tokio::test]
async fn test_session_publishes_idle_without_reference() {
    let mut handle = assert_ok!(CoachingSession::spawn(&SessionConfig::default()));
    let mut rx = handle.subscribe();

    let seq = assert_ok!(handle.submit_frame(frame(0.0)));
    let published = wait_for_seq(&mut rx, seq).await;

    assert_eq!(published.session_id, handle.id());
    assert_eq!(published.result.guide.stage, GuideStage::Idle);
    assert!(!published.result.is_perfect);
    assert_eq!(handle.latest().map(|p| p.frame_seq), Some(seq));

    assert_ok!(handle.shutdown().await);
}

#[tokio::test]
async fn test_session_reaches_perfect_and_resets_after_capture() {
    let mut handle = assert_ok!(CoachingSession::spawn(&SessionConfig::default()));
    let mut rx = handle.subscribe();
    assert_ok!(handle.set_reference(reference()).await);

    let mut last = None;
    for i in 0..12 {
        let seq = handle.submit_frame(frame(i as f64 * 0.1)).unwrap();
        last = Some(wait_for_seq(&mut rx, seq).await);
    }
    let last = last.unwrap();
    assert!(last.result.is_perfect);
    assert_eq!(last.result.stability_progress(), 1.0);

    assert_ok!(handle.reset_lock().await);
    let seq = handle.submit_frame(frame(1.3)).unwrap();
    let published = wait_for_seq(&mut rx, seq).await;
    assert!(!published.result.is_perfect);
    assert_eq!(published.result.stability_progress(), 0.0);

    assert_ok!(handle.shutdown().await);
}

#[tokio::test]
async fn test_session_rejects_bad_commands() {
    let handle = assert_ok!(CoachingSession::spawn(&SessionConfig::default()));

    let err = assert_err!(handle.set_zoom(-2.0).await);
    assert!(matches!(err, SessionError::Engine(_)), "{}", err);

    let mut bad = reference();
    bad.image_size = ImageSize::new(0, 0);
    assert_err!(handle.set_reference(bad).await);

    // Still serving after rejected commands.
    assert_ok!(handle.set_zoom(2.0).await);
    assert_ok!(handle.clear_reference().await);
    assert_ok!(handle.shutdown().await);
}

#[tokio::test]
async fn test_latest_frame_wins() {
    let mut handle = CoachingSession::spawn_with(UnifiedEvaluator::default());
    let mut rx = handle.subscribe();

    let mut seq = 0;
    for i in 0..50 {
        seq = handle.submit_frame(frame(i as f64 * 0.01)).unwrap();
    }
    let published = wait_for_seq(&mut rx, seq).await;
    assert_eq!(published.frame_seq, seq);
    assert!((published.result.timestamp - 0.49).abs() < 1e-9);

    assert_ok!(handle.shutdown().await);
}

#[tokio::test]
async fn test_sessions_have_distinct_ids() {
    let handle = assert_ok!(CoachingSession::spawn(&SessionConfig::default()));
    let id = handle.id();
    assert_ok!(handle.shutdown().await);

    let other = assert_ok!(CoachingSession::spawn(&SessionConfig::default()));
    assert_ne!(other.id(), id);
    assert_ok!(other.shutdown().await);
}
