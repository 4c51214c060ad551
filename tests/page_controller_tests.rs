//! Integration tests for the page lifecycle
//!
//! These tests verify that:
//! - A page starts loading only once a user is available
//! - A slow earlier load never overwrites a newer one
//! - Hung loads are cut by the configured timeout
//! - Failures surface as a retryable error state
//! - The view is recomputed exactly when its inputs change

use dashview::entities::Employee;
use dashview::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn employee(name: &str, status: &str, role: &str, success_rate: f64) -> Employee {
    Employee::new(
        name.to_string(),
        status.to_string(),
        role.to_string(),
        "Support".to_string(),
        String::new(),
        success_rate,
        0,
        Vec::new(),
    )
}

fn staff() -> Vec<Employee> {
    vec![
        employee("Chat Bot", "available", "support", 90.0),
        employee("Data Agent", "busy", "analyst", 80.0),
        employee("Mail Bot", "busy", "triage", 70.0),
    ]
}

fn spec() -> ViewSpec<Employee> {
    ViewSpec::for_entity().with_stats(
        StatsSpec::new()
            .count_where("busyCount", "status", "busy")
            .average("avgSuccessRate", "success_rate"),
    )
}

fn signed_in() -> Arc<SessionAuthProvider> {
    Arc::new(SessionAuthProvider::signed_in(CurrentUser::new("ops@example.com")))
}

fn page(source: &InMemorySource<Employee>) -> PageController<Employee> {
    PageController::new("ai_employees", Arc::new(source.clone()), signed_in(), spec())
}

// =============================================================================
// Activation
// =============================================================================

mod activation_tests {
    use super::*;

    #[tokio::test]
    async fn test_no_user_stays_idle() {
        let source = InMemorySource::new(staff());
        let page = PageController::new("ai_employees", Arc::new(source.clone()), Arc::new(NoAuthProvider), spec());

        assert_eq!(page.activate().await.unwrap(), PageStatus::Idle);
        assert_eq!(source.call_count(), 0);
        assert!(page.view().is_none());

        let err = page.load().await.unwrap_err();
        assert_eq!(err, ViewError::Unauthenticated);
    }

    #[tokio::test]
    async fn test_activates_after_sign_in() {
        let source = InMemorySource::new(staff());
        let auth = Arc::new(SessionAuthProvider::new());
        let page = PageController::new("ai_employees", Arc::new(source), auth.clone(), spec());

        assert_eq!(page.activate().await.unwrap(), PageStatus::Idle);

        auth.sign_in(CurrentUser::new("ops@example.com"));
        assert_eq!(page.activate().await.unwrap(), PageStatus::Ready);

        let view = page.view().unwrap();
        assert_eq!(view.stats.total(), 3);
        assert_eq!(view.stats.count("busyCount"), 2);
        assert_eq!(view.stats.get("avgSuccessRate"), Some(80.0));
    }

    #[tokio::test]
    async fn test_activate_twice_does_not_reload() {
        let source = InMemorySource::new(staff());
        let page = page(&source);

        page.activate().await.unwrap();
        page.activate().await.unwrap();

        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_role_is_forbidden() {
        let source = InMemorySource::new(staff());
        let page = page(&source).with_policy(AuthPolicy::HasRole(vec!["admin".to_string()]));

        assert_eq!(page.activate().await.unwrap(), PageStatus::Error);
        assert_eq!(source.call_count(), 0);

        let state = page.state();
        let err = state.error().unwrap();
        assert_eq!(err.error_code(), "FORBIDDEN");
        assert!(!err.is_retryable());

        let retry = page.retry().await.unwrap_err();
        assert_eq!(retry.error_code(), "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn test_from_config() {
        let config = DashboardConfig::default_config();
        let source = InMemorySource::new(staff());
        let auth = Arc::new(SessionAuthProvider::signed_in(
            CurrentUser::new("ops@example.com").with_role("admin"),
        ));

        let page = PageController::from_config(config.page("employees").unwrap(), Arc::new(source), auth).unwrap();
        assert_eq!(page.resource(), "ai_employees");

        page.activate().await.unwrap();
        let view = page.view().unwrap();
        assert_eq!(view.stats.count("busyCount"), 2);
        assert_eq!(view.stats.count("activeCount"), 0);
    }
}

// =============================================================================
// Stale responses
// =============================================================================

mod stale_response_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_slow_earlier_load_is_discarded() {
        let source = InMemorySource::new(Vec::new());
        source
            .enqueue(Duration::from_millis(500), Ok(vec![employee("Old Bot", "busy", "legacy", 10.0)]))
            .unwrap();
        source
            .enqueue(Duration::from_millis(20), Ok(staff()))
            .unwrap();

        let events = EventBus::default();
        let mut receiver = events.subscribe();
        let page = Arc::new(page(&source).with_events(events));

        let first = tokio::spawn({
            let page = Arc::clone(&page);
            async move { page.load().await }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;

        let second = tokio::spawn({
            let page = Arc::clone(&page);
            async move { page.load().await }
        });

        assert_eq!(second.await.unwrap().unwrap(), PageStatus::Ready);
        assert_eq!(first.await.unwrap().unwrap(), PageStatus::Ready);

        let view = page.view().unwrap();
        assert_eq!(view.stats.total(), 3);
        assert!(view.filtered.iter().all(|e| e.name != "Old Bot"));
        assert_eq!(page.generation(), 2);
        assert_eq!(page.recompute_count(), 1);

        let mut discarded = Vec::new();
        while let Ok(envelope) = receiver.try_recv() {
            if let PageEvent::StaleResponseDiscarded { generation, current, .. } = envelope.event {
                discarded.push((generation, current));
            }
        }
        assert_eq!(discarded, vec![(1, 2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivate_discards_load_in_flight() {
        let source = InMemorySource::new(staff()).with_latency(Duration::from_millis(100));
        let page = Arc::new(page(&source));

        let load = tokio::spawn({
            let page = Arc::clone(&page);
            async move { page.load().await }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;
        page.deactivate();

        assert_eq!(load.await.unwrap().unwrap(), PageStatus::Idle);
        assert_eq!(page.status(), PageStatus::Idle);
        assert!(page.view().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_criteria_edits_while_loading_apply_once_on_ready() {
        let source = InMemorySource::new(staff()).with_latency(Duration::from_millis(100));
        let page = Arc::new(page(&source));

        let load = tokio::spawn({
            let page = Arc::clone(&page);
            async move { page.load().await }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(page.status(), PageStatus::Loading);

        assert!(page.set_filter("status", "busy"));
        assert!(page.set_search_term("mail"));
        assert!(page.view().is_none());
        assert_eq!(page.recompute_count(), 0);

        assert_eq!(load.await.unwrap().unwrap(), PageStatus::Ready);
        assert_eq!(page.recompute_count(), 1);

        let view = page.view().unwrap();
        assert_eq!(view.len(), 1);
        assert_eq!(view.filtered[0].name, "Mail Bot");
        assert_eq!(page.recompute_count(), 1);
    }
}

// =============================================================================
// Timeouts
// =============================================================================

mod timeout_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timeout_shows_empty_page() {
        let source = InMemorySource::new(staff()).with_latency(Duration::from_secs(60));
        let page = page(&source).with_settings(LoadSettings::with_timeout(
            Duration::from_secs(10),
            TimeoutPolicy::ReadyEmpty,
        ));

        assert_eq!(page.activate().await.unwrap(), PageStatus::Ready);

        let view = page.view().unwrap();
        assert!(view.is_empty());
        assert_eq!(view.stats.total(), 0);
        assert_eq!(view.stats.get("avgSuccessRate"), Some(0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_shows_error() {
        let source = InMemorySource::new(staff()).with_latency(Duration::from_secs(60));
        let page = page(&source).with_settings(LoadSettings::with_timeout(
            Duration::from_secs(10),
            TimeoutPolicy::Error,
        ));

        assert_eq!(page.activate().await.unwrap(), PageStatus::Error);

        let state = page.state();
        let err = state.error().unwrap();
        assert_eq!(err.error_code(), "LOAD_TIMEOUT");
        assert!(err.is_retryable());
        assert!(page.view().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_load_within_timeout() {
        let source = InMemorySource::new(staff()).with_latency(Duration::from_millis(200));
        let page = page(&source).with_settings(LoadSettings::with_timeout(
            Duration::from_secs(10),
            TimeoutPolicy::Error,
        ));

        assert_eq!(page.activate().await.unwrap(), PageStatus::Ready);
        assert_eq!(page.view().unwrap().len(), 3);
    }
}

// =============================================================================
// Failures and retry
// =============================================================================

mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_failure_then_retry() {
        let source = InMemorySource::new(staff());
        source.fail_with("connection refused").unwrap();
        let page = page(&source);

        assert_eq!(page.activate().await.unwrap(), PageStatus::Error);
        let state = page.state();
        let err = state.error().unwrap();
        assert_eq!(err.error_code(), "FETCH_FAILED");
        assert_eq!(err.user_message(), "Could not load ai_employees. Please try again.");
        assert!(page.view().is_none());

        source.recover().unwrap();
        assert_eq!(page.retry().await.unwrap(), PageStatus::Ready);
        assert_eq!(page.view().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_refresh_only_from_ready() {
        let source = InMemorySource::new(staff());
        let page = page(&source);

        assert!(page.refresh().await.is_err());

        page.activate().await.unwrap();
        assert_eq!(page.refresh().await.unwrap(), PageStatus::Ready);
        assert_eq!(source.call_count(), 2);
    }
}

// =============================================================================
// Recompute
// =============================================================================

mod recompute_tests {
    use super::*;

    #[tokio::test]
    async fn test_each_real_change_recomputes_once() {
        let source = InMemorySource::new(staff());
        let page = page(&source);
        page.activate().await.unwrap();
        assert_eq!(page.recompute_count(), 1);

        // reads and no-op edits
        let _ = page.view();
        let _ = page.view();
        assert!(!page.set_search_term(""));
        assert!(!page.clear_filters());
        assert_eq!(page.recompute_count(), 1);

        assert!(page.set_filter("status", "busy"));
        assert_eq!(page.recompute_count(), 2);
        assert_eq!(page.view().unwrap().len(), 2);

        assert!(page.set_search_term("mail"));
        assert_eq!(page.recompute_count(), 3);
        assert_eq!(page.view().unwrap().len(), 1);

        assert!(page.clear_filters());
        assert_eq!(page.recompute_count(), 4);
        assert_eq!(page.view().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_stats_follow_the_source_not_the_filter() {
        let source = InMemorySource::new(staff());
        let page = page(&source);
        page.activate().await.unwrap();

        page.set_filter("status", "available");
        let view = page.view().unwrap();
        assert_eq!(view.len(), 1);
        assert_eq!(view.stats.total(), 3);
        assert!(view.is_narrowed());
    }

    #[tokio::test]
    async fn test_replace_source_recomputes() {
        let source = InMemorySource::new(staff());
        let page = page(&source);
        page.activate().await.unwrap();
        page.set_filter("status", "busy");

        page.replace_source(vec![employee("Night Shift", "busy", "ops", 50.0)]).unwrap();

        let view = page.view().unwrap();
        assert_eq!(view.stats.total(), 1);
        assert_eq!(view.len(), 1);
        assert_eq!(page.source().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remote_stats_are_merged() {
        let remote: DerivedStats = vec![("monthlyCost".to_string(), 42.0), ("total".to_string(), 99.0)]
            .into_iter()
            .collect();
        let source = InMemorySource::new(staff())
            .with_stats(remote)
            .with_categories(vec!["Support".to_string()]);
        let page = page(&source);
        page.activate().await.unwrap();

        let view = page.view().unwrap();
        assert_eq!(view.stats.get("monthlyCost"), Some(42.0));
        assert_eq!(view.stats.total(), 3);
        assert_eq!(page.categories(), vec!["Support"]);
    }

    #[tokio::test]
    async fn test_lifecycle_events() {
        let source = InMemorySource::new(staff());
        let events = EventBus::default();
        let mut receiver = events.subscribe();
        let page = page(&source).with_events(events);

        page.activate().await.unwrap();

        let mut names = Vec::new();
        while let Ok(envelope) = receiver.try_recv() {
            assert_eq!(envelope.event.resource(), "ai_employees");
            names.push(envelope.event.name());
        }
        assert_eq!(names, vec!["state_changed", "recomputed", "state_changed"]);
    }
}
