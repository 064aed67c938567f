//! End-to-end attempts: camera grant through quiz end.

mod common;

use std::time::Duration;

use common::{MockProvider, Step};
use proctor::{
    camera::CameraState,
    models::EndReason,
    session::SessionEvent,
    settings::{ProctorSettings, SettingsStore},
    violations::{Decision, KeyCombo, RawSignal, ViolationKind, ViolationStatus},
    ProctorApp,
};
use tempfile::tempdir;
use tokio::time;

fn app(
    provider: &std::sync::Arc<MockProvider>,
    dir: &tempfile::TempDir,
    settings: ProctorSettings,
) -> ProctorApp<MockProvider> {
    let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
    store.update(settings).unwrap();
    ProctorApp::new(provider.clone(), store).unwrap()
}

fn minutes(time_limit_minutes: u32) -> ProctorSettings {
    ProctorSettings {
        time_limit_minutes,
        ..ProctorSettings::default()
    }
}

#[tokio::test(start_paused = true)]
async fn ten_minute_quiz_runs_to_expiry() {
    let dir = tempdir().unwrap();
    let provider = MockProvider::new(vec![Step::Grant]);
    let app = app(&provider, &dir, minutes(10));

    assert_eq!(app.camera().acquire().await, CameraState::Granted);
    let session = app.begin().await.unwrap();
    assert_eq!(provider.active(), 0);

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.timer.state.remaining_seconds, 600);
    assert!(!snapshot.timer.state.is_expired);

    time::sleep(Duration::from_millis(300_500)).await;
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.timer.state.remaining_seconds, 300);
    assert!(snapshot.timer.is_warning_threshold);
    assert_eq!(snapshot.timer.display, "05:00");

    let reply = session.record(ViolationKind::TabChange).await.unwrap().unwrap();
    assert_eq!(reply.count, 1);
    assert!(matches!(reply.decision, Decision::Warn(_)));
    assert_eq!(session.snapshot().await.violation_status, ViolationStatus::Warned);

    assert!(session.acknowledge().await.unwrap());
    assert_eq!(session.snapshot().await.violation_status, ViolationStatus::Active);

    time::sleep(Duration::from_secs(300)).await;
    let outcome = session.wait_ended().await.unwrap();
    assert_eq!(outcome.reason, EndReason::TimeExpired);
    assert!(outcome.reason.submits_answers());
    assert_eq!(outcome.remaining_seconds, 0);
    assert_eq!(outcome.violation_count, 1);

    let snapshot = session.snapshot().await;
    assert!(snapshot.timer.state.is_expired);
    assert!(snapshot.ended);

    let report = session.report().await;
    assert_eq!(report.count, 1);
    assert_eq!(report.status, ViolationStatus::Terminated);
    assert_eq!(report.end_reason, Some(EndReason::TimeExpired));
}

#[tokio::test(start_paused = true)]
async fn expiry_ends_session_even_with_warning_outstanding() {
    let dir = tempdir().unwrap();
    let provider = MockProvider::new(vec![Step::Grant]);
    let app = app(&provider, &dir, minutes(1));
    app.camera().acquire().await;
    let session = app.begin().await.unwrap();

    session.report_signal(&RawSignal::ContextMenu).await.unwrap();
    assert_eq!(session.snapshot().await.violation_status, ViolationStatus::Warned);

    time::sleep(Duration::from_secs(61)).await;
    let outcome = session.wait_ended().await.unwrap();
    assert_eq!(outcome.reason, EndReason::TimeExpired);
    assert!(session.acknowledge().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn cannot_begin_without_camera() {
    let dir = tempdir().unwrap();
    let provider = MockProvider::new(vec![Step::Fail(proctor::camera::CameraError::PermissionDenied)]);
    let app = app(&provider, &dir, minutes(10));

    assert!(app.begin().await.is_err());
    assert_eq!(app.camera().acquire().await, CameraState::Denied);
    assert!(app.begin().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn time_warning_is_announced_once() {
    let dir = tempdir().unwrap();
    let provider = MockProvider::new(vec![Step::Grant]);
    let app = app(&provider, &dir, minutes(6));
    app.camera().acquire().await;
    let session = app.begin().await.unwrap();
    let mut events = session.subscribe();

    time::sleep(Duration::from_millis(90_500)).await;

    let mut ticks = 0;
    let mut warnings = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::TimerTick { .. } => ticks += 1,
            SessionEvent::TimeWarning { timer } => warnings.push(timer.state.remaining_seconds),
            _ => {}
        }
    }
    assert_eq!(ticks, 90);
    assert_eq!(warnings, vec![300]);
}

#[tokio::test(start_paused = true)]
async fn violation_limit_forces_exit() {
    let dir = tempdir().unwrap();
    let provider = MockProvider::new(vec![Step::Grant]);
    let mut settings = minutes(20);
    settings.policy.max_violations = Some(3);
    let app = app(&provider, &dir, settings);
    app.camera().acquire().await;
    let session = app.begin().await.unwrap();
    let mut events = session.subscribe();

    session.report_signal(&RawSignal::WindowBlur).await.unwrap();
    session
        .report_signal(&RawSignal::KeyDown(KeyCombo::new("c").ctrl()))
        .await
        .unwrap();
    let third = session
        .report_signal(&RawSignal::Copy)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        third.decision,
        Decision::ForceExit {
            kind: ViolationKind::CopyAttempt,
            count: 3
        }
    );

    let outcome = session.wait_ended().await.unwrap();
    assert_eq!(
        outcome.reason,
        EndReason::PolicyTerminated {
            kind: ViolationKind::CopyAttempt,
            count: 3
        }
    );
    assert!(!outcome.reason.submits_answers());

    let mut ended = 0;
    let mut warnings = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::Ended { .. } => ended += 1,
            SessionEvent::ViolationWarning { .. } => warnings += 1,
            _ => {}
        }
    }
    assert_eq!(ended, 1);
    assert_eq!(warnings, 1);

    let report = session.report().await;
    assert_eq!(report.by_kind.get(&ViolationKind::CopyAttempt), Some(&2));
    assert_eq!(report.by_kind.get(&ViolationKind::TabChange), Some(&1));
}

#[tokio::test(start_paused = true)]
async fn student_exit_stops_everything() {
    let dir = tempdir().unwrap();
    let provider = MockProvider::new(vec![Step::Grant]);
    let app = app(&provider, &dir, minutes(10));
    app.camera().acquire().await;
    let session = app.begin().await.unwrap();

    time::sleep(Duration::from_millis(2_500)).await;
    session.record(ViolationKind::TabChange).await.unwrap();
    let outcome = session.exit().await.unwrap();
    assert_eq!(outcome.reason, EndReason::StudentExit);
    assert_eq!(outcome.remaining_seconds, 598);

    time::sleep(Duration::from_secs(30)).await;
    assert_eq!(session.snapshot().await.timer.state.remaining_seconds, 598);
    assert!(session.record(ViolationKind::TabChange).await.is_err());
    assert_eq!(session.report().await.count, 1);
}
