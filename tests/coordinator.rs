use std::collections::HashMap;
use std::time::{Duration, Instant};

use taskpipe::engine::{SubscriptionState, WatchCoordinator};
use taskpipe::types::{ChangeEvent, ChangeKind};
use taskpipe::watch::WatchSubscription;

const DEBOUNCE: Duration = Duration::from_millis(300);

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn sub(task: &str, watch: &[&str], exclude: &[&str]) -> WatchSubscription {
    let watch: Vec<String> = watch.iter().map(|s| s.to_string()).collect();
    let exclude: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
    WatchSubscription::new(task, &watch, &exclude, DEBOUNCE).unwrap()
}

fn change(path: &str) -> ChangeEvent {
    ChangeEvent::new(path, ChangeKind::Modified)
}

fn coordinator() -> WatchCoordinator {
    WatchCoordinator::new(vec![
        sub("styles", &["assets/scss/**/*.scss"], &[]),
        sub("customJs", &["assets/js/*.js"], &["assets/js/*.min.js"]),
    ])
}

#[test]
fn burst_of_events_triggers_one_run_timed_from_the_last_event() {
    let mut c = coordinator();
    let t0 = Instant::now();

    for i in 0..5 {
        c.on_event(&change("assets/scss/style.scss"), t0 + ms(i * 100));
    }
    let last = t0 + ms(400);

    assert_eq!(c.next_deadline(), Some(last + DEBOUNCE));
    assert!(c.poll_due(last + ms(299)).is_empty());
    assert_eq!(c.poll_due(last + ms(300)), vec!["styles"]);
    assert_eq!(c.state_of("styles"), Some(SubscriptionState::Idle));
    assert!(c.poll_due(last + ms(1000)).is_empty());
}

#[test]
fn events_spaced_beyond_the_window_trigger_separately() {
    let mut c = coordinator();
    let t0 = Instant::now();

    c.on_event(&change("assets/scss/a.scss"), t0);
    assert_eq!(c.poll_due(t0 + ms(300)), vec!["styles"]);
    c.on_run_finished("styles");

    c.on_event(&change("assets/scss/a.scss"), t0 + ms(700));
    assert_eq!(c.poll_due(t0 + ms(1000)), vec!["styles"]);
}

#[test]
fn non_matching_and_excluded_paths_are_ignored() {
    let mut c = coordinator();
    let now = Instant::now();

    assert!(c.on_event(&change("README.md"), now).is_empty());
    assert!(c.on_event(&change("assets/js/app.min.js"), now).is_empty());
    assert!(c.on_event(&change("assets/js/vendors/x.js"), now).is_empty());
    assert_eq!(c.next_deadline(), None);
    assert_eq!(c.state_of("customJs"), Some(SubscriptionState::Idle));

    assert_eq!(c.on_event(&change("assets/js/app.js"), now), vec!["customJs"]);
    assert_eq!(
        c.state_of("customJs"),
        Some(SubscriptionState::PendingDebounce {
            deadline: now + DEBOUNCE
        })
    );
}

#[test]
fn subscriptions_debounce_independently() {
    let mut c = coordinator();
    let t0 = Instant::now();

    c.on_event(&change("assets/scss/a.scss"), t0);
    c.on_event(&change("assets/js/app.js"), t0 + ms(200));

    assert_eq!(c.next_deadline(), Some(t0 + ms(300)));
    assert_eq!(c.poll_due(t0 + ms(300)), vec!["styles"]);
    assert_eq!(c.next_deadline(), Some(t0 + ms(500)));
    assert_eq!(c.poll_due(t0 + ms(500)), vec!["customJs"]);
}

#[test]
fn triggers_during_a_run_coalesce_into_one_follow_up() {
    let mut c = coordinator();
    let t0 = Instant::now();

    c.on_event(&change("assets/scss/a.scss"), t0);
    assert_eq!(c.poll_due(t0 + ms(300)), vec!["styles"]);
    assert!(c.is_running("styles"));

    // Two more debounced triggers while the first run is in flight.
    c.on_event(&change("assets/scss/a.scss"), t0 + ms(400));
    assert!(c.poll_due(t0 + ms(700)).is_empty());
    c.on_event(&change("assets/scss/b.scss"), t0 + ms(800));
    assert!(c.poll_due(t0 + ms(1100)).is_empty());
    assert!(c.has_queued_rerun("styles"));

    assert_eq!(c.on_run_finished("styles"), vec!["styles"]);
    assert!(c.is_running("styles"));
    assert!(!c.has_queued_rerun("styles"));

    assert!(c.on_run_finished("styles").is_empty());
    assert!(!c.is_running("styles"));
}

#[test]
fn request_run_starts_or_queues() {
    let mut c = coordinator();

    assert_eq!(c.request_run("styles"), Some("styles".to_string()));
    assert_eq!(c.request_run("styles"), None);
    assert_eq!(c.request_run("styles"), None);
    assert_eq!(c.in_flight_count(), 1);

    assert_eq!(c.on_run_finished("styles"), vec!["styles"]);
    assert!(c.on_run_finished("styles").is_empty());
}

#[test]
fn stopped_coordinator_ignores_events_and_drops_pending_work() {
    let mut c = coordinator();
    let t0 = Instant::now();

    c.request_run("customJs");
    c.request_run("customJs");
    c.on_event(&change("assets/scss/a.scss"), t0);
    c.stop();

    assert!(c.is_stopped());
    assert_eq!(c.state_of("styles"), Some(SubscriptionState::Stopped));
    assert_eq!(c.next_deadline(), None);
    assert!(c.on_event(&change("assets/scss/a.scss"), t0 + ms(10)).is_empty());
    assert!(c.poll_due(t0 + ms(10_000)).is_empty());
    assert_eq!(c.request_run("styles"), None);

    // The in-flight run still finishes, but its queued rerun is gone.
    assert_eq!(c.in_flight_count(), 1);
    assert!(c.on_run_finished("customJs").is_empty());
    assert_eq!(c.in_flight_count(), 0);
}

fn closures(entries: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(task, closure)| {
            let closure = closure.iter().map(|t| t.to_string()).collect();
            (task.to_string(), closure)
        })
        .collect()
}

#[test]
fn tasks_sharing_a_prerequisite_never_run_together() {
    let mut c = WatchCoordinator::new(vec![
        sub("styles", &["assets/scss/*.scss"], &[]),
        sub("scripts", &["assets/js/*.js"], &[]),
    ])
    .with_closures(closures(&[
        ("styles", &["clean", "styles"]),
        ("scripts", &["clean", "scripts"]),
    ]));
    let t0 = Instant::now();

    c.on_event(&change("assets/scss/a.scss"), t0);
    c.on_event(&change("assets/js/app.js"), t0);
    assert_eq!(c.poll_due(t0 + ms(300)), vec!["styles"]);
    assert!(c.is_running("clean"));
    assert!(c.has_queued_rerun("scripts"));
    assert_eq!(c.in_flight_count(), 1);

    assert_eq!(c.on_run_finished("styles"), vec!["scripts"]);
    assert!(c.is_running("scripts"));
    assert!(!c.has_queued_rerun("scripts"));
}

#[test]
fn watched_prerequisite_waits_for_its_dependent() {
    let mut c = WatchCoordinator::new(vec![
        sub("styles", &["assets/scss/*.scss"], &[]),
        sub("default", &["assets/**/*"], &[]),
    ])
    .with_closures(closures(&[("default", &["styles", "default"])]));

    assert_eq!(c.request_run("default"), Some("default".to_string()));
    assert_eq!(c.request_run("styles"), None);
    assert!(c.has_queued_rerun("styles"));

    assert_eq!(c.on_run_finished("default"), vec!["styles"]);
    assert!(c.on_run_finished("styles").is_empty());
    assert_eq!(c.in_flight_count(), 0);
}

#[test]
fn disjoint_closures_run_concurrently() {
    let mut c = coordinator().with_closures(closures(&[
        ("styles", &["styles"]),
        ("customJs", &["vendorsJs", "customJs"]),
    ]));

    assert_eq!(c.request_run("styles"), Some("styles".to_string()));
    assert_eq!(c.request_run("customJs"), Some("customJs".to_string()));
    assert_eq!(c.in_flight_count(), 2);
}
