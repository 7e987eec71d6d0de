//! The container-group acceptance suite.
//!
//! Secrets are never returned on read, so where a case asserts a secret it
//! only requires the attribute to exist, and import verification ignores it.

use acctest_compare::Check;
use acctest_fixture::{catalog, Fixture, FixtureError, FixtureParams};

use crate::case::{ImportVerify, TestCase, TestStep};
use crate::error::ConfigError;

pub const BUILTIN_CASES: &[&str] = &[
    "image_registry_credentials",
    "image_registry_credentials_update",
    "linux_basic",
    "linux_basic_update",
    "linux_complete",
    "windows_basic",
    "windows_complete",
];

/// Every built-in case, each with its own random disambiguator.
pub fn builtin_suite(location: &str) -> Result<Vec<TestCase>, ConfigError> {
    BUILTIN_CASES
        .iter()
        .map(|name| builtin_case(name, &FixtureParams::random(location)))
        .collect()
}

pub fn builtin_case(name: &str, p: &FixtureParams) -> Result<TestCase, ConfigError> {
    let wrap = |source: FixtureError| ConfigError::Fixture { path: format!("builtin:{}", name), source };
    let steps = match name {
        "image_registry_credentials" => vec![
            step(catalog::image_registry_credentials(p).map_err(wrap)?, two_credentials())
                .with_import_verify(ImportVerify::ignoring([
                    "image_registry_credential.0.password",
                    "image_registry_credential.1.password",
                ])),
        ],
        "image_registry_credentials_update" => vec![
            step(
                catalog::image_registry_credentials(p).map_err(wrap)?,
                single_port(5443, "UDP").into_iter().chain(two_credentials()),
            ),
            step(
                catalog::image_registry_credentials_updated(p).map_err(wrap)?,
                single_port(80, "TCP").into_iter().chain([
                    Check::count("image_registry_credential", 1),
                    Check::equals("image_registry_credential.0.server", "hub.docker.com"),
                    Check::equals("image_registry_credential.0.username", "updatedusername"),
                    Check::exists("image_registry_credential.0.password"),
                ]),
            ),
        ],
        "linux_basic" => vec![
            step(
                catalog::linux_basic(p).map_err(wrap)?,
                single_port(80, "TCP").into_iter().chain([
                    Check::count("container", 1),
                    Check::equals("os_type", "Linux"),
                ]),
            )
            .with_import_verify(ImportVerify::ignoring([
                "image_registry_credential.0.password",
                "image_registry_credential.1.password",
            ])),
        ],
        "linux_basic_update" => vec![
            step(catalog::linux_basic(p).map_err(wrap)?, [Check::count("container", 1)]),
            step(
                catalog::linux_basic_updated(p).map_err(wrap)?,
                [
                    Check::count("container", 2),
                    Check::count("container.0.ports", 2),
                    Check::equals("container.0.ports.0.port", "80"),
                    Check::equals("container.0.ports.0.protocol", "TCP"),
                    Check::equals("container.0.ports.1.port", "5443"),
                    Check::equals("container.0.ports.1.protocol", "UDP"),
                ],
            ),
        ],
        "linux_complete" => vec![
            step(
                catalog::linux_complete(p).map_err(wrap)?,
                single_port(80, "TCP")
                    .into_iter()
                    .chain(commands("/bin/bash", "-c", "ls"))
                    .chain(environment())
                    .chain([
                        Check::count("container.0.volume", 1),
                        Check::equals("container.0.volume.0.mount_path", "/aci/logs"),
                        Check::equals("container.0.volume.0.name", "logs"),
                        Check::equals("container.0.volume.0.read_only", "false"),
                        Check::equals("os_type", "Linux"),
                        Check::equals("restart_policy", "OnFailure"),
                    ]),
            )
            .with_import_verify(ImportVerify::ignoring([
                "container.0.volume.0.storage_account_key",
                "container.0.secure_environment_variables.%",
                "container.0.secure_environment_variables.secureFoo",
                "container.0.secure_environment_variables.secureFoo1",
            ])),
        ],
        "windows_basic" => vec![
            step(
                catalog::windows_basic(p).map_err(wrap)?,
                [
                    Check::count("container", 1),
                    Check::equals("os_type", "Windows"),
                    Check::count("container.0.ports", 2),
                    Check::equals("container.0.ports.0.port", "80"),
                    Check::equals("container.0.ports.0.protocol", "TCP"),
                    Check::equals("container.0.ports.1.port", "443"),
                    Check::equals("container.0.ports.1.protocol", "TCP"),
                ],
            )
            .with_import_verify(ImportVerify::default()),
        ],
        "windows_complete" => vec![
            step(
                catalog::windows_complete(p).map_err(wrap)?,
                single_port(80, "TCP")
                    .into_iter()
                    .chain(commands("cmd.exe", "echo", "hi"))
                    .chain(environment())
                    .chain([
                        Check::equals("os_type", "Windows"),
                        Check::equals("restart_policy", "Never"),
                    ]),
            )
            .with_import_verify(ImportVerify::ignoring([
                "container.0.secure_environment_variables.%",
                "container.0.secure_environment_variables.secureFoo",
                "container.0.secure_environment_variables.secureFoo1",
            ])),
        ],
        other => return Err(ConfigError::UnknownCase(other.to_string())),
    };
    Ok(TestCase::new(name, steps))
}

fn step(fixture: Fixture, checks: impl IntoIterator<Item = Check>) -> TestStep {
    TestStep::new(fixture).with_checks(checks)
}

fn single_port(port: u16, protocol: &str) -> Vec<Check> {
    vec![
        Check::count("container.0.ports", 1),
        Check::equals("container.0.ports.0.port", port.to_string()),
        Check::equals("container.0.ports.0.protocol", protocol),
    ]
}

fn two_credentials() -> Vec<Check> {
    vec![
        Check::count("image_registry_credential", 2),
        Check::equals("image_registry_credential.0.server", "hub.docker.com"),
        Check::equals("image_registry_credential.0.username", "yourusername"),
        Check::exists("image_registry_credential.0.password"),
        Check::equals("image_registry_credential.1.server", "mine.acr.io"),
        Check::equals("image_registry_credential.1.username", "acrusername"),
        Check::exists("image_registry_credential.1.password"),
    ]
}

fn commands(a: &str, b: &str, c: &str) -> Vec<Check> {
    vec![
        Check::equals("container.0.command", format!("{a} {b} {c}")),
        Check::count("container.0.commands", 3),
        Check::equals("container.0.commands.0", a),
        Check::equals("container.0.commands.1", b),
        Check::equals("container.0.commands.2", c),
    ]
}

fn environment() -> Vec<Check> {
    vec![
        Check::count("container.0.environment_variables", 2),
        Check::equals("container.0.environment_variables.foo", "bar"),
        Check::equals("container.0.environment_variables.foo1", "bar1"),
        Check::count("container.0.secure_environment_variables", 2),
        Check::exists("container.0.secure_environment_variables.secureFoo"),
        Check::exists("container.0.secure_environment_variables.secureFoo1"),
    ]
}
