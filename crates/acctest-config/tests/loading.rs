use std::path::{Path, PathBuf};

use acctest_compare::Check;
use acctest_config::{load_case, load_suite, ConfigError};
use acctest_domain::{OsType, PortSpec, RestartPolicy};
use acctest_fixture::FixtureParams;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn params() -> FixtureParams {
    FixtureParams::new(77, "westus")
}

#[test]
fn load_suite_reads_yaml_files_in_name_order() {
    let cases = load_suite(&fixtures().join("suite"), "westus").expect("should load without error");
    let names: Vec<&str> = cases.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["credentials_update", "inline_spec"]);
}

#[test]
fn import_only_step_folds_into_previous_step() {
    let case = load_case(&fixtures().join("suite/credentials_update.yml"), &params()).unwrap();
    assert_eq!(case.steps.len(), 2);
    assert!(case.steps[0].import_verify.is_none());

    let verify = case.steps[1].import_verify.as_ref().expect("second step verifies import");
    assert!(verify.ignore.contains("image_registry_credential.0.password"));
    assert_eq!(case.steps[0].fixture.identity(), case.steps[1].fixture.identity());
    assert_eq!(case.steps[0].checks[2], Check::equals("container.0.ports.0.protocol", "UDP"));
    assert_eq!(case.steps[0].fixture.container_group.name, "acctestcontainergroup-77");
}

#[test]
fn inline_spec_keeps_port_order_and_defaults() {
    let case = load_case(&fixtures().join("suite/inline_spec.yaml"), &params()).unwrap();
    assert_eq!(case.name, "inline_spec");

    let step = &case.steps[0];
    assert!(step.match_declared);
    assert!(step.import_verify.as_ref().unwrap().ignore.is_empty());

    let hw = &step.fixture.container_group.containers[0];
    assert_eq!(hw.ports.len(), 2);
    assert_eq!(hw.ports[0].protocol.to_string(), "TCP");
    assert_eq!(hw.ports[1].protocol.to_string(), "UDP");
    assert_eq!(hw.memory.to_string(), "1.5");
    assert_eq!(step.fixture.resource_group.location, "eastus");
}

#[test]
fn spec_enums_load_in_lowercase() {
    let case = load_case(&fixtures().join("casing/lowercase_enums.yml"), &params()).unwrap();
    let spec = &case.steps[0].fixture.container_group;
    assert_eq!(spec.os_type, OsType::Linux);
    assert_eq!(spec.restart_policy, RestartPolicy::OnFailure);
    assert_eq!(spec.containers[0].ports, vec![PortSpec::udp(5443), PortSpec::tcp(80)]);
    assert_eq!(spec.containers[0].memory.to_string(), "1");
}

#[test]
fn import_verify_without_a_step_is_rejected() {
    let err = load_case(&fixtures().join("invalid/orphan_import.yml"), &params()).unwrap_err();
    assert!(matches!(err, ConfigError::Conversion { .. }), "got: {err}");
}

#[test]
fn fixture_and_spec_are_mutually_exclusive() {
    let err = load_case(&fixtures().join("invalid/both_sources.yml"), &params()).unwrap_err();
    assert!(err.to_string().contains("mutually exclusive"), "got: {err}");
}

#[test]
fn unknown_fixture_is_a_fixture_error() {
    let err = load_case(&fixtures().join("invalid/unknown_fixture.yml"), &params()).unwrap_err();
    assert!(matches!(err, ConfigError::Fixture { .. }), "got: {err}");
}

#[test]
fn unknown_check_kind_is_a_parse_error() {
    let err = load_case(&fixtures().join("invalid/bad_check.yml"), &params()).unwrap_err();
    assert!(matches!(err, ConfigError::YamlParse { .. }), "got: {err}");
}

#[test]
fn missing_dir_returns_error() {
    let dir = Path::new("/nonexistent/path/does/not/exist");
    assert!(load_suite(dir, "westus").is_err());
}

#[test]
fn empty_suite_dir_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_suite(dir.path(), "westus").unwrap().is_empty());
}
