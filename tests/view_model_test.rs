//! Assignment table behavior against an in-memory registry.
//!
//! These tests require the `testing` feature to be enabled.

#[cfg(feature = "testing")]
mod tests {
    use std::sync::Arc;

    use tallycat::testing::FakeRegistry;
    use tallycat::{
        AssignmentStatus, AssignmentViewModel, FetchOutcome, TransportMethod, ViewStatus,
    };

    const KEY: &str = "http.server.duration";

    fn seeded(count: usize) -> FakeRegistry {
        let registry = FakeRegistry::new();
        for i in 1..=count {
            let version = if i % 2 == 0 { Some("1.0.0") } else { None };
            registry.add_assignment(KEY, &format!("schema-{:02}", i), version, i as u64);
        }
        registry
    }

    // ---------------------------------------------------------------------------
    // Loading and pagination
    // ---------------------------------------------------------------------------

    #[tokio::test]
    async fn test_loading_before_first_response() {
        let registry = seeded(3);
        let vm = AssignmentViewModel::new(registry.client(), KEY);

        assert_eq!(vm.view_status(), ViewStatus::Loading);
        assert!(vm.table_data().is_empty());
        assert_eq!(registry.count(TransportMethod::Get), 0);

        assert_eq!(vm.refresh().await, FetchOutcome::Applied);
        assert_eq!(vm.view_status(), ViewStatus::Ready);
        assert!(!vm.is_loading());
        assert_eq!(vm.table_data().len(), 3);
    }

    #[tokio::test]
    async fn test_second_page() {
        let registry = seeded(25);
        let vm = AssignmentViewModel::new(registry.client(), KEY);

        assert_eq!(vm.set_page(2).await, FetchOutcome::Applied);

        let rows = vm.table_data();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].id, "schema-11");
        assert_eq!(rows[9].id, "schema-20");
        assert_eq!(vm.total_count(), 25);
        assert_eq!(vm.current_page(), 2);

        let request = registry.requests().pop().unwrap();
        assert_eq!(request.param("page"), Some("2"));
        assert_eq!(request.param("pageSize"), Some("10"));
    }

    #[tokio::test]
    async fn test_last_partial_page() {
        let registry = seeded(25);
        let vm = AssignmentViewModel::new(registry.client(), KEY);

        vm.set_page(3).await;
        assert_eq!(vm.table_data().len(), 5);
        assert_eq!(vm.summary_text(), "Showing 5 schemas");
    }

    #[tokio::test]
    async fn test_page_size_change_returns_to_first_page() {
        let registry = seeded(25);
        let vm = AssignmentViewModel::new(registry.client(), KEY);
        vm.set_page(3).await;
        assert_eq!(vm.table_data().len(), 5);

        assert_eq!(vm.set_page_size(50).await, FetchOutcome::Applied);
        assert_eq!(vm.current_page(), 1);
        assert_eq!(vm.table_data().len(), 25);
        assert_eq!(vm.total_count(), 25);
        assert_eq!(vm.view_status(), ViewStatus::Ready);

        let request = registry.requests().pop().unwrap();
        assert_eq!(request.param("page"), Some("1"));
        assert_eq!(request.param("pageSize"), Some("50"));
    }

    #[tokio::test]
    async fn test_rows_follow_version() {
        let registry = seeded(2);
        let vm = AssignmentViewModel::new(registry.client(), KEY);
        vm.refresh().await;

        let unassigned = vm.row("schema-01").unwrap();
        assert_eq!(unassigned.status, AssignmentStatus::Unassigned);
        assert_eq!(unassigned.version, None);
        assert_eq!(unassigned.producer_count(), 1);

        let assigned = vm.row("schema-02").unwrap();
        assert!(assigned.is_assigned());
        assert_eq!(assigned.version.as_deref(), Some("1.0.0"));
        assert_eq!(assigned.producer_count(), 2);
    }

    // ---------------------------------------------------------------------------
    // Filters
    // ---------------------------------------------------------------------------

    #[tokio::test]
    async fn test_search_resets_page() {
        let registry = seeded(25);
        let vm = AssignmentViewModel::new(registry.client(), KEY);
        vm.set_page(3).await;

        assert_eq!(vm.set_search("schema-1").await, FetchOutcome::Applied);
        assert_eq!(vm.current_page(), 1);
        assert_eq!(vm.total_count(), 10);
        assert_eq!(
            vm.summary_text(),
            "Showing 10 schemas (filtered from 10 total)"
        );

        let request = registry.requests().pop().unwrap();
        assert_eq!(request.param("search"), Some("schema-1"));
        assert_eq!(request.param("page"), Some("1"));
    }

    #[tokio::test]
    async fn test_status_filter() {
        let registry = seeded(6);
        let vm = AssignmentViewModel::new(registry.client(), KEY);

        vm.set_status(vec![AssignmentStatus::Unassigned]).await;
        let rows = vm.table_data();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| !r.is_assigned()));
        assert_eq!(vm.summary_text(), "Showing 3 schemas (filtered from 3 total)");
    }

    #[tokio::test]
    async fn test_unchanged_setter_does_not_refetch() {
        let registry = seeded(3);
        let vm = AssignmentViewModel::new(registry.client(), KEY);

        vm.set_search("schema").await;
        assert_eq!(vm.set_search("schema").await, FetchOutcome::Unchanged);
        assert_eq!(vm.set_page(1).await, FetchOutcome::Unchanged);
        assert_eq!(
            vm.set_status(vec![AssignmentStatus::Assigned, AssignmentStatus::Assigned])
                .await,
            FetchOutcome::Applied
        );
        assert_eq!(vm.active_status(), vec![AssignmentStatus::Assigned]);
        assert_eq!(registry.count(TransportMethod::Get), 2);
    }

    // ---------------------------------------------------------------------------
    // Empty and error states
    // ---------------------------------------------------------------------------

    #[tokio::test]
    async fn test_empty_is_not_error() {
        let registry = FakeRegistry::new();
        let vm = AssignmentViewModel::new(registry.client(), KEY);

        vm.refresh().await;
        assert_eq!(vm.view_status(), ViewStatus::Empty);
        assert!(vm.is_empty());
        assert_eq!(vm.error(), None);
        assert_eq!(vm.summary_text(), "Showing 0 schemas");
    }

    #[tokio::test]
    async fn test_error_state_and_retry() {
        let registry = seeded(3);
        let vm = AssignmentViewModel::new(registry.client(), KEY);
        vm.refresh().await;

        registry.fail_next(TransportMethod::Get, 500);
        assert_eq!(vm.refresh().await, FetchOutcome::Failed);

        match vm.view_status() {
            ViewStatus::Error(err) => {
                assert_eq!(err.http_status, Some(500));
                assert!(err.retryable);
            }
            other => panic!("expected error state, got {:?}", other),
        }
        // previous rows stay available underneath the error
        assert_eq!(vm.table_data().len(), 3);

        assert_eq!(vm.refresh().await, FetchOutcome::Applied);
        assert_eq!(vm.view_status(), ViewStatus::Ready);
        assert_eq!(vm.error(), None);
    }

    #[tokio::test]
    async fn test_first_request_fails() {
        let registry = FakeRegistry::new();
        registry.fail_next(TransportMethod::Get, 503);
        let vm = AssignmentViewModel::new(registry.client(), KEY);

        vm.refresh().await;
        assert!(matches!(vm.view_status(), ViewStatus::Error(_)));
        assert!(!vm.is_empty());
        assert!(vm.table_data().is_empty());
    }

    // ---------------------------------------------------------------------------
    // Out-of-order responses
    // ---------------------------------------------------------------------------

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let registry = FakeRegistry::new();
        registry.add_assignment(KEY, "foo-1", None, 1);
        registry.add_assignment(KEY, "bar-1", Some("2.0.0"), 1);
        registry.add_assignment(KEY, "bar-2", None, 1);

        let gate = registry.hold_search("foo");
        let vm = Arc::new(AssignmentViewModel::new(registry.client(), KEY));

        let slow = {
            let vm = vm.clone();
            tokio::spawn(async move { vm.set_search("foo").await })
        };
        while registry.requests().is_empty() {
            tokio::task::yield_now().await;
        }
        assert!(vm.is_loading());

        assert_eq!(vm.set_search("bar").await, FetchOutcome::Applied);
        gate.release();
        assert_eq!(slow.await.unwrap(), FetchOutcome::Superseded);

        let ids: Vec<String> = vm.table_data().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["bar-1", "bar-2"]);
        assert_eq!(vm.search_query(), "bar");
        assert!(!vm.is_loading());
    }

    #[tokio::test]
    async fn test_loading_while_newer_request_pending() {
        let registry = seeded(3);
        let vm = Arc::new(AssignmentViewModel::new(registry.client(), KEY));
        vm.refresh().await;

        let gate = registry.hold_search("schema-02");
        let pending = {
            let vm = vm.clone();
            tokio::spawn(async move { vm.set_search("schema-02").await })
        };
        while registry.requests().len() < 2 {
            tokio::task::yield_now().await;
        }

        assert!(vm.is_loading());
        assert_eq!(vm.view_status(), ViewStatus::Ready);
        assert_eq!(vm.table_data().len(), 3);

        gate.release();
        assert_eq!(pending.await.unwrap(), FetchOutcome::Applied);
        assert_eq!(vm.table_data().len(), 1);
    }
}
