use super::*;

#[test]
fn new_job_starts_queued() {
    let registry = JobRegistry::new();
    let handle = registry.create();
    let status = registry.status(handle.id()).unwrap();
    assert_eq!(status.phase, JobPhase::Init);
    assert_eq!(status.progress, 0);
    assert_eq!(status.success, None);
    assert_eq!(registry.len(), 1);
}

#[test]
fn unknown_job_has_no_status() {
    let registry = JobRegistry::new();
    assert!(registry.status(Uuid::new_v4()).is_none());
    assert!(registry.subscribe(Uuid::new_v4()).is_none());
    assert!(!registry.cancel(Uuid::new_v4()));
}

#[test]
fn success_flag_follows_phase() {
    let registry = JobRegistry::new();
    let ok = registry.create();
    ok.emit(ProgressUpdate::new(JobPhase::Extracting, 30, "page 2"));
    assert_eq!(registry.status(ok.id()).unwrap().success, None);
    ok.emit(ProgressUpdate::new(JobPhase::Completed, 100, "done").with_extra("filename", "a.xlsx"));
    let done = registry.status(ok.id()).unwrap();
    assert_eq!(done.success, Some(true));
    assert_eq!(done.extra["filename"], "a.xlsx");

    let bad = registry.create();
    bad.fail("no products");
    assert_eq!(registry.status(bad.id()).unwrap().success, Some(false));
}

#[test]
fn error_keeps_last_percentage() {
    let registry = JobRegistry::new();
    let handle = registry.create();
    handle.emit(ProgressUpdate::new(JobPhase::Images, 78, "image 4/10"));
    handle.fail("artifact write failed");
    let status = registry.status(handle.id()).unwrap();
    assert_eq!(status.phase, JobPhase::Error);
    assert_eq!(status.progress, 78);
    assert_eq!(status.message, "artifact write failed");
}

#[test]
fn terminal_status_is_frozen() {
    let registry = JobRegistry::new();
    let handle = registry.create();
    handle.emit(ProgressUpdate::new(JobPhase::Completed, 100, "done"));
    handle.fail("late failure");
    handle.emit(ProgressUpdate::new(JobPhase::Images, 80, "late progress"));
    let status = registry.status(handle.id()).unwrap();
    assert_eq!(status.phase, JobPhase::Completed);
    assert_eq!(status.success, Some(true));
}

#[test]
fn cancel_trips_the_token_only_while_running() {
    let registry = JobRegistry::new();
    let handle = registry.create();
    assert!(registry.cancel(handle.id()));
    assert!(handle.cancellation().is_cancelled());

    let finished = registry.create();
    finished.emit(ProgressUpdate::new(JobPhase::Completed, 100, "done"));
    assert!(!registry.cancel(finished.id()));
    assert!(!finished.cancellation().is_cancelled());
}

#[test]
fn prune_drops_only_old_finished_jobs() {
    let registry = JobRegistry::new();
    let running = registry.create();
    let finished = registry.create();
    finished.emit(ProgressUpdate::new(JobPhase::Completed, 100, "done"));

    assert_eq!(registry.prune_finished(Utc::now() - chrono::Duration::hours(1)), 0);
    assert_eq!(registry.prune_finished(Utc::now() + chrono::Duration::seconds(1)), 1);
    assert!(registry.status(running.id()).is_some());
    assert!(registry.status(finished.id()).is_none());
}

#[tokio::test]
async fn subscribers_see_every_update_in_order() {
    let registry = JobRegistry::new();
    let handle = registry.create();
    let (snapshot, mut rx) = registry.subscribe(handle.id()).unwrap();
    assert_eq!(snapshot.phase, JobPhase::Init);

    handle.emit(ProgressUpdate::new(JobPhase::Connect, 5, "connecting"));
    handle.emit(ProgressUpdate::new(JobPhase::Extracting, 35, "page 1"));
    handle.emit(ProgressUpdate::new(JobPhase::Completed, 100, "done"));

    let mut seen = Vec::new();
    for _ in 0..3 {
        let s = rx.recv().await.unwrap();
        seen.push((s.phase, s.progress));
    }
    assert_eq!(
        seen,
        [
            (JobPhase::Connect, 5),
            (JobPhase::Extracting, 35),
            (JobPhase::Completed, 100)
        ]
    );
}
