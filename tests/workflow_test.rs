//! Version assignment dialog driven end to end against an in-memory
//! registry.
//!
//! These tests require the `testing` feature to be enabled.

#[cfg(feature = "testing")]
mod tests {
    use std::time::Duration;

    use tallycat::testing::FakeRegistry;
    use tallycat::version::{MSG_INVALID_FORMAT, MSG_REQUIRED};
    use tallycat::workflow::MSG_DESCRIPTION_REQUIRED;
    use tallycat::{
        AssignmentViewModel, FetchOutcome, SubmitOutcome, TransportMethod,
        VersionAssignmentWorkflow, WorkflowState,
    };

    const KEY: &str = "http.server.duration";

    async fn setup() -> (FakeRegistry, AssignmentViewModel) {
        let registry = FakeRegistry::new();
        registry.add_assignment(KEY, "abc", None, 2);
        registry.add_assignment(KEY, "def", Some("1.0.0"), 1);
        let vm = AssignmentViewModel::new(registry.client(), KEY);
        vm.refresh().await;
        (registry, vm)
    }

    // ---------------------------------------------------------------------------
    // Happy paths
    // ---------------------------------------------------------------------------

    #[tokio::test]
    async fn test_assign_first_version() {
        let (registry, vm) = setup().await;
        let mut workflow = VersionAssignmentWorkflow::new();

        workflow.assign_version(&vm.row("abc").unwrap());
        assert!(workflow.is_open());
        assert_eq!(workflow.dialog_title(), Some("Assign Schema Version"));
        assert_eq!(workflow.form().unwrap().version(), "");

        workflow.set_version("1.0.0");
        workflow.set_description("Initial stable release");
        assert!(workflow.can_submit());

        let gets_before = registry.count(TransportMethod::Get);
        match workflow.submit(&vm).await {
            SubmitOutcome::Assigned { response, refetch } => {
                assert_eq!(response.version.as_deref(), Some("1.0.0"));
                assert_eq!(refetch, FetchOutcome::Applied);
            }
            other => panic!("expected Assigned, got {:?}", other),
        }

        assert_eq!(workflow.state(), &WorkflowState::Idle);
        assert!(!workflow.is_open());
        registry.assert_assigned("abc", "1.0.0");
        assert_eq!(registry.count(TransportMethod::Get), gets_before + 1);

        let row = vm.row("abc").unwrap();
        assert!(row.is_assigned());
        assert_eq!(row.version.as_deref(), Some("1.0.0"));
    }

    #[tokio::test]
    async fn test_update_existing_version() {
        let (registry, vm) = setup().await;
        let mut workflow = VersionAssignmentWorkflow::new();

        workflow.assign_version(&vm.row("def").unwrap());
        assert_eq!(workflow.dialog_title(), Some("Update Schema Version"));
        assert_eq!(workflow.form().unwrap().version(), "1.0.0");
        assert_eq!(workflow.form().unwrap().current_version(), Some("1.0.0"));

        workflow.set_version("2.0.0");
        workflow.set_description("Breaking change");
        assert!(matches!(
            workflow.submit(&vm).await,
            SubmitOutcome::Assigned { .. }
        ));

        let writes = registry.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].schema_id, "def");
        assert_eq!(writes[0].version, "2.0.0");
        assert_eq!(writes[0].description, "Breaking change");
        assert_eq!(vm.row("def").unwrap().version.as_deref(), Some("2.0.0"));
        assert_eq!(registry.version_of("def").as_deref(), Some("2.0.0"));
    }

    // ---------------------------------------------------------------------------
    // Rejected input
    // ---------------------------------------------------------------------------

    #[tokio::test]
    async fn test_invalid_version_never_reaches_registry() {
        let (registry, vm) = setup().await;
        let mut workflow = VersionAssignmentWorkflow::new();

        workflow.assign_version(&vm.row("abc").unwrap());
        workflow.set_version("1.0");
        workflow.set_description("Initial");
        assert!(!workflow.can_submit());
        assert_eq!(workflow.inline_message(), Some(MSG_INVALID_FORMAT));

        assert_eq!(
            workflow.submit(&vm).await,
            SubmitOutcome::Rejected(MSG_INVALID_FORMAT.to_string())
        );
        assert!(workflow.is_open());
        assert_eq!(workflow.error(), Some(MSG_INVALID_FORMAT));
        assert_eq!(workflow.form().unwrap().version(), "1.0");
        registry.refute_assigned();
        assert_eq!(registry.count(TransportMethod::Post), 0);
    }

    #[tokio::test]
    async fn test_fresh_dialog_shows_no_message() {
        let (_registry, vm) = setup().await;
        let mut workflow = VersionAssignmentWorkflow::new();

        workflow.assign_version(&vm.row("abc").unwrap());
        assert_eq!(workflow.inline_message(), None);
        assert_eq!(workflow.error(), None);
        assert!(!workflow.can_submit());

        workflow.set_description("Initial");
        assert_eq!(workflow.inline_message(), None);
    }

    #[tokio::test]
    async fn test_empty_version_is_required() {
        let (registry, vm) = setup().await;
        let mut workflow = VersionAssignmentWorkflow::new();

        workflow.assign_version(&vm.row("abc").unwrap());
        workflow.set_description("Initial");
        assert_eq!(
            workflow.submit(&vm).await,
            SubmitOutcome::Rejected(MSG_REQUIRED.to_string())
        );
        assert_eq!(workflow.inline_message(), Some(MSG_REQUIRED));
        registry.refute_assigned();
    }

    #[tokio::test]
    async fn test_blank_description_rejected() {
        let (registry, vm) = setup().await;
        let mut workflow = VersionAssignmentWorkflow::new();

        workflow.assign_version(&vm.row("abc").unwrap());
        workflow.set_version("1.0.0");
        workflow.set_description("   ");
        assert!(!workflow.can_submit());

        assert_eq!(
            workflow.submit(&vm).await,
            SubmitOutcome::Rejected(MSG_DESCRIPTION_REQUIRED.to_string())
        );
        assert_eq!(workflow.error(), Some(MSG_DESCRIPTION_REQUIRED));
        registry.refute_assigned();

        // editing clears the error
        workflow.set_description("Initial");
        assert_eq!(workflow.error(), None);
        assert!(workflow.can_submit());
    }

    // ---------------------------------------------------------------------------
    // Failed writes and cancel
    // ---------------------------------------------------------------------------

    #[tokio::test]
    async fn test_failed_write_keeps_form() {
        let (registry, vm) = setup().await;
        let mut workflow = VersionAssignmentWorkflow::new();
        registry.fail_next(TransportMethod::Post, 500);

        workflow.assign_version(&vm.row("abc").unwrap());
        workflow.set_version("1.0.0");
        workflow.set_description("Initial stable release");

        let gets_before = registry.count(TransportMethod::Get);
        match workflow.submit(&vm).await {
            SubmitOutcome::Failed(message) => assert!(message.contains("injected failure")),
            other => panic!("expected Failed, got {:?}", other),
        }

        assert!(workflow.is_open());
        assert!(matches!(
            workflow.state(),
            WorkflowState::AssigningWithError { .. }
        ));
        let form = workflow.form().unwrap();
        assert_eq!(form.schema_id(), "abc");
        assert_eq!(form.version(), "1.0.0");
        assert_eq!(form.description(), "Initial stable release");
        assert_eq!(registry.count(TransportMethod::Get), gets_before);
        assert!(!vm.row("abc").unwrap().is_assigned());

        // retry succeeds
        assert!(matches!(
            workflow.submit(&vm).await,
            SubmitOutcome::Assigned { .. }
        ));
        assert!(vm.row("abc").unwrap().is_assigned());
    }

    #[tokio::test]
    async fn test_cancel_discards_form() {
        let (registry, vm) = setup().await;
        let mut workflow = VersionAssignmentWorkflow::new();

        workflow.assign_version(&vm.row("abc").unwrap());
        workflow.set_version("1.0.0");
        workflow.cancel();

        assert_eq!(workflow.state(), &WorkflowState::Idle);
        assert_eq!(workflow.form(), None);
        assert_eq!(workflow.submit(&vm).await, SubmitOutcome::NotOpen);
        registry.refute_assigned();
    }

    #[tokio::test]
    async fn test_dropped_submit_leaves_dialog_usable() {
        let (registry, vm) = setup().await;
        let _gate = registry.hold_writes();
        let mut workflow = VersionAssignmentWorkflow::new();

        workflow.assign_version(&vm.row("abc").unwrap());
        workflow.set_version("1.0.0");
        workflow.set_description("Initial stable release");

        let timed_out = tokio::time::timeout(Duration::from_millis(20), workflow.submit(&vm)).await;
        assert!(timed_out.is_err());
        assert_eq!(registry.count(TransportMethod::Post), 1);

        // the form survives and stays editable
        assert!(matches!(workflow.state(), WorkflowState::Assigning(_)));
        assert!(!workflow.is_submitting());
        assert_eq!(workflow.form().unwrap().version(), "1.0.0");
        workflow.set_version("1.0.1");
        assert_eq!(workflow.form().unwrap().version(), "1.0.1");

        workflow.cancel();
        assert_eq!(workflow.state(), &WorkflowState::Idle);
        assert!(!workflow.is_open());
    }

    #[tokio::test]
    async fn test_edits_ignored_while_idle() {
        let mut workflow = VersionAssignmentWorkflow::new();
        workflow.set_version("1.0.0");
        workflow.set_description("x");
        assert_eq!(workflow.state(), &WorkflowState::Idle);
        assert!(!workflow.can_submit());
        assert_eq!(workflow.dialog_title(), None);
    }
}
