use std::path::{Path, PathBuf};

use acctest_fixture::{catalog, Fixture, FixtureParams};
use tracing::debug;

use crate::case::{ImportVerify, TestCase, TestStep};
use crate::error::ConfigError;
use crate::raw::{RawCase, RawStep};

/// Load every case file (`*.yml` / `*.yaml`) directly under `dir`, in file
/// name order. Each case draws its own random disambiguator.
///
/// Expected directory layout:
/// ```text
/// <dir>/
///   linux_basic.yml          <- RawCase
///   credentials_update.yml   <- RawCase
/// ```
pub fn load_suite(dir: &Path, location: &str) -> Result<Vec<TestCase>, ConfigError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ConfigError::Io {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::Io {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yml") | Some("yaml")
        );
        if path.is_file() && is_yaml {
            files.push(path);
        }
    }
    files.sort();

    files
        .iter()
        .map(|path| load_case(path, &FixtureParams::random(location)))
        .collect()
}

/// Load a single case file.
pub fn load_case(path: &Path, params: &FixtureParams) -> Result<TestCase, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let raw: RawCase = serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlParse {
        path: path.display().to_string(),
        source: e,
    })?;
    debug!("Loading test case from {}", path.display());
    convert_case(raw, path, params)
}

fn convert_case(raw: RawCase, path: &Path, params: &FixtureParams) -> Result<TestCase, ConfigError> {
    let name = match raw.name {
        Some(n) => n,
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| conversion(path, "cannot derive a case name from the file name"))?,
    };

    let params = match raw.location {
        Some(location) => FixtureParams::new(params.rand_int, location),
        None => params.clone(),
    };

    if raw.steps.is_empty() {
        return Err(conversion(path, format!("case '{}' has no steps", name)));
    }

    let mut steps: Vec<TestStep> = Vec::new();
    for (i, raw_step) in raw.steps.into_iter().enumerate() {
        convert_step(raw_step, i, path, &params, &mut steps)?;
    }

    Ok(TestCase { name, steps })
}

fn convert_step(
    raw: RawStep,
    index: usize,
    path: &Path,
    params: &FixtureParams,
    steps: &mut Vec<TestStep>,
) -> Result<(), ConfigError> {
    let import_verify = raw
        .import_verify
        .map(|v| ImportVerify::ignoring(v.ignore));

    let fixture = match (raw.fixture, raw.spec) {
        (Some(_), Some(_)) => {
            return Err(conversion(path, format!("step {}: 'fixture' and 'spec' are mutually exclusive", index)));
        }
        (Some(name), None) => catalog::by_name(&name, params).map_err(|e| ConfigError::Fixture {
            path: path.display().to_string(),
            source: e,
        })?,
        (None, Some(spec)) => Fixture::for_spec(format!("step-{}", index), spec),
        (None, None) => {
            // An import-only step verifies the step before it.
            let verify = import_verify
                .ok_or_else(|| conversion(path, format!("step {}: declares neither a fixture nor import_verify", index)))?;
            if !raw.checks.is_empty() || raw.match_declared {
                return Err(conversion(path, format!("step {}: checks need a fixture or spec", index)));
            }
            let prev = steps
                .last_mut()
                .ok_or_else(|| conversion(path, format!("step {}: import_verify has no preceding step", index)))?;
            if prev.import_verify.is_some() {
                return Err(conversion(path, format!("step {}: preceding step already verifies import", index)));
            }
            prev.import_verify = Some(verify);
            return Ok(());
        }
    };

    steps.push(TestStep {
        fixture,
        checks: raw.checks,
        match_declared: raw.match_declared,
        import_verify,
    });
    Ok(())
}

fn conversion(path: &Path, message: impl Into<String>) -> ConfigError {
    ConfigError::Conversion {
        path: path.display().to_string(),
        message: message.into(),
    }
}
