use std::sync::Arc;
use std::time::Duration;

use acctest_compare::{Check, Mismatch};
use acctest_config::{builtin_case, ImportVerify, TestCase, BUILTIN_CASES};
use acctest_domain::{ObservedState, ResourceIdentity};
use acctest_fixture::FixtureParams;
use acctest_lifecycle::{
    run_all, LifecycleDriver, LifecycleError, Phase, ReadError, SequenceError, TeardownError,
    TeardownPolicy,
};
use acctest_provider::{Faults, LocalCloud, ProviderClient, ProviderError};
use async_trait::async_trait;

fn driver(cloud: &Arc<LocalCloud>) -> LifecycleDriver {
    LifecycleDriver::new(
        cloud.clone(),
        cloud.clone(),
        TeardownPolicy {
            confirm_attempts: 1,
            poll_interval: Duration::from_millis(1),
        },
    )
}

fn case(name: &str, ri: u32) -> TestCase {
    builtin_case(name, &FixtureParams::new(ri, "westus")).unwrap()
}

#[tokio::test]
async fn credentials_update_replaces_port_and_credentials() {
    let cloud = Arc::new(LocalCloud::new());
    let report = driver(&cloud).run_sequence(&case("image_registry_credentials_update", 1)).await;

    assert!(report.passed(), "{:?}", report.first_error());
    assert_eq!(report.phase, Phase::Destroyed);
    let phases: Vec<Phase> = report.steps.iter().map(|s| s.phase).collect();
    assert_eq!(phases, vec![Phase::Applied, Phase::Updated]);

    assert_eq!(cloud.apply_calls(), 2);
    assert_eq!(cloud.delete_calls(), 1);
    assert_eq!(cloud.destroy_calls(), 1);
    assert_eq!(cloud.group_count().await, 0);
    assert!(cloud.resource_groups().await.is_empty());
}

#[tokio::test]
async fn update_never_unions_with_previous_state() {
    let cloud = Arc::new(LocalCloud::new());
    let mut c = case("image_registry_credentials_update", 2);
    // The second credential from step 0 must be gone after step 1.
    c.steps[1].checks.push(Check::exists("image_registry_credential.1.server"));

    let report = driver(&cloud).run_sequence(&c).await;
    match report.error {
        Some(SequenceError::Assertion { step, mismatches, .. }) => {
            assert_eq!(step, 1);
            assert_eq!(
                mismatches.0,
                vec![Mismatch::Missing { path: "image_registry_credential.1.server".into() }]
            );
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(report.phase, Phase::Failed);
    assert!(report.teardown.is_none());
    assert_eq!(cloud.group_count().await, 0);
}

#[tokio::test]
async fn every_builtin_case_passes_against_local_cloud() {
    let cloud = Arc::new(LocalCloud::new());
    let d = driver(&cloud);
    for (i, name) in BUILTIN_CASES.iter().enumerate() {
        let report = d.run_sequence(&case(name, 100 + i as u32)).await;
        assert!(report.passed(), "{}: {:?}", name, report.first_error());
    }
    assert_eq!(cloud.group_count().await, 0);
}

#[tokio::test]
async fn apply_failure_skips_remaining_steps_and_still_tears_down() {
    let cloud = Arc::new(LocalCloud::with_faults(Faults {
        fail_apply_on_call: Some(2),
        ..Faults::default()
    }));
    let report = driver(&cloud).run_sequence(&case("linux_basic_update", 3)).await;

    assert!(matches!(
        report.error,
        Some(SequenceError::Apply { step: 1, source: ProviderError::ApplyFailed(_), .. })
    ));
    assert_eq!(report.steps.len(), 2);
    assert_eq!(report.steps[0].phase, Phase::Applied);
    assert_eq!(report.steps[1].phase, Phase::Failed);
    assert!(report.teardown.is_none());
    assert_eq!(cloud.delete_calls(), 1);
    assert_eq!(cloud.destroy_calls(), 1);
    assert_eq!(cloud.group_count().await, 0);
}

#[tokio::test]
async fn missing_resource_after_apply_is_not_found() {
    let cloud = Arc::new(LocalCloud::with_faults(Faults {
        drop_on_apply: true,
        ..Faults::default()
    }));
    let report = driver(&cloud).run_sequence(&case("linux_basic", 4)).await;

    assert!(matches!(
        report.error,
        Some(SequenceError::Read { step: 0, source: ReadError::NotFound, .. })
    ));
    assert_eq!(report.phase, Phase::Failed);
    assert!(report.teardown.is_none());
}

#[tokio::test]
async fn import_verify_reports_unrecoverable_secrets_unless_ignored() {
    let cloud = Arc::new(LocalCloud::new());
    let mut c = case("linux_complete", 5);
    c.steps[0].import_verify = Some(ImportVerify::default());

    let report = driver(&cloud).run_sequence(&c).await;
    match &report.error {
        Some(SequenceError::ImportVerify { mismatches, .. }) => {
            let paths: Vec<&str> = mismatches.iter().map(Mismatch::path).collect();
            assert!(paths.contains(&"container.0.secure_environment_variables.secureFoo"));
            assert!(paths.contains(&"container.0.volume.0.storage_account_key"));
        }
        other => panic!("unexpected: {other:?}"),
    }

    let report = driver(&cloud).run_sequence(&case("linux_complete", 6)).await;
    assert!(report.passed(), "{:?}", report.first_error());
    assert!(report.steps[0].import_verified);
}

#[tokio::test]
async fn resource_that_survives_delete_fails_teardown() {
    let cloud = Arc::new(LocalCloud::with_faults(Faults {
        ignore_delete: true,
        ..Faults::default()
    }));
    let report = driver(&cloud).run_sequence(&case("windows_basic", 7)).await;

    assert!(report.error.is_none());
    assert!(matches!(report.teardown, Some(TeardownError::StillPresent { attempts: 1, .. })));
    assert_eq!(report.phase, Phase::Failed);
    assert!(!report.passed());
    // Supporting resources are still cleaned up.
    assert_eq!(cloud.destroy_calls(), 1);
}

#[tokio::test]
async fn teardown_failure_does_not_mask_step_failure() {
    let cloud = Arc::new(LocalCloud::with_faults(Faults {
        fail_delete: Some("throttled".into()),
        fail_destroy: Some("workspace locked".into()),
        ..Faults::default()
    }));
    let mut c = case("linux_basic", 8);
    c.steps[0].checks.push(Check::equals("os_type", "Windows"));

    let report = driver(&cloud).run_sequence(&c).await;
    assert!(matches!(report.error, Some(SequenceError::Assertion { step: 0, .. })));
    assert!(matches!(
        report.teardown,
        Some(TeardownError::Delete { source: ProviderError::Api { status: 500, .. }, .. })
    ));
    assert!(report.first_error().unwrap().contains("os_type"));
}

#[tokio::test]
async fn cleanup_failure_is_reported_when_delete_succeeds() {
    let cloud = Arc::new(LocalCloud::with_faults(Faults {
        fail_destroy: Some("workspace locked".into()),
        ..Faults::default()
    }));
    let report = driver(&cloud).run_sequence(&case("linux_basic", 9)).await;

    assert!(report.error.is_none());
    assert!(matches!(report.teardown, Some(TeardownError::Cleanup { .. })));
}

#[tokio::test]
async fn run_all_rejects_shared_identities() {
    let cloud = Arc::new(LocalCloud::new());
    let a = case("linux_basic", 10);
    let mut b = case("linux_basic_update", 10);
    b.name = "second".into();

    let err = run_all(&driver(&cloud), vec![a, b], 4).await.unwrap_err();
    assert!(matches!(err, LifecycleError::DuplicateIdentity { .. }));
    assert_eq!(cloud.apply_calls(), 0);
}

#[tokio::test]
async fn run_all_keeps_input_order_under_concurrency() {
    let cloud = Arc::new(LocalCloud::new());
    let cases: Vec<TestCase> = BUILTIN_CASES
        .iter()
        .enumerate()
        .map(|(i, name)| case(name, 200 + i as u32))
        .collect();

    let report = run_all(&driver(&cloud), cases, 3).await.unwrap();
    assert!(report.passed());
    let names: Vec<&str> = report.sequences.iter().map(|s| s.case.as_str()).collect();
    assert_eq!(names, BUILTIN_CASES.to_vec());
    assert_eq!(cloud.group_count().await, 0);
}

#[tokio::test]
async fn run_all_reports_failures_without_aborting_others() {
    let cloud = Arc::new(LocalCloud::new());
    let mut bad = case("windows_basic", 300);
    bad.steps[0].checks.push(Check::count("container", 5));
    let good = case("linux_basic", 301);

    let report = run_all(&driver(&cloud), vec![bad, good], 2).await.unwrap();
    assert!(!report.passed());
    let failed: Vec<&str> = report.failed().map(|s| s.case.as_str()).collect();
    assert_eq!(failed, vec!["windows_basic"]);
}

/// Reads through to the local cloud, except that reading `poisoned` panics.
struct PanicOnRead {
    inner: Arc<LocalCloud>,
    poisoned: ResourceIdentity,
}

#[async_trait]
impl ProviderClient for PanicOnRead {
    fn name(&self) -> &'static str {
        "panic-on-read"
    }

    async fn get(&self, identity: &ResourceIdentity) -> Result<Option<ObservedState>, ProviderError> {
        if *identity == self.poisoned {
            panic!("read of {identity} blew up");
        }
        self.inner.get(identity).await
    }

    async fn delete(&self, identity: &ResourceIdentity) -> Result<(), ProviderError> {
        self.inner.delete(identity).await
    }
}

#[tokio::test]
async fn run_all_survives_a_sequence_that_panics() {
    let cloud = Arc::new(LocalCloud::new());
    let doomed = case("windows_basic", 400);
    let cases = vec![case("linux_basic", 401), doomed.clone(), case("linux_complete", 402)];

    let client = Arc::new(PanicOnRead {
        inner: cloud.clone(),
        poisoned: doomed.identity().unwrap(),
    });
    let d = LifecycleDriver::new(client, cloud.clone(), TeardownPolicy::default());

    let report = run_all(&d, cases, 3).await.unwrap();
    let names: Vec<&str> = report.sequences.iter().map(|s| s.case.as_str()).collect();
    assert_eq!(names, vec!["linux_basic", "windows_basic", "linux_complete"]);

    assert!(report.sequences[0].passed(), "{:?}", report.sequences[0].first_error());
    assert!(report.sequences[2].passed(), "{:?}", report.sequences[2].first_error());

    let dead = &report.sequences[1];
    assert_eq!(dead.phase, Phase::Failed);
    assert_eq!(dead.identity, doomed.identity());
    assert!(matches!(dead.error, Some(SequenceError::Interrupted { .. })));
}
