use acctest_domain::{ObservedState, ResourceSpec};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attributes::{flatten, flatten_spec, secret_paths, AttrValue, Attributes};
use crate::error::{Mismatch, Mismatches};

/// A single assertion against flattened observed state.
///
/// Checks are plain data so suites can be written in YAML:
///
/// ```yaml
/// - scalar_equals: { path: container.0.ports.0.protocol, expected: UDP }
/// - count_equals: { path: image_registry_credential, count: 2 }
/// - field_exists: { path: image_registry_credential.0.password }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    ScalarEquals { path: String, expected: String },
    /// Reads `<path>.#` for lists or `<path>.%` for maps.
    CountEquals { path: String, count: usize },
    FieldExists { path: String },
    All(Vec<Check>),
}

impl Check {
    pub fn equals(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Check::ScalarEquals { path: path.into(), expected: expected.into() }
    }

    pub fn count(path: impl Into<String>, count: usize) -> Self {
        Check::CountEquals { path: path.into(), count }
    }

    pub fn exists(path: impl Into<String>) -> Self {
        Check::FieldExists { path: path.into() }
    }

    pub fn all(checks: impl IntoIterator<Item = Check>) -> Self {
        Check::All(checks.into_iter().collect())
    }

    fn eval(&self, attrs: &Attributes, out: &mut Vec<Mismatch>) {
        match self {
            Check::ScalarEquals { path, expected } => match attrs.get(path) {
                None => out.push(Mismatch::Missing { path: path.clone() }),
                Some(AttrValue::Redacted) => out.push(Mismatch::Redacted { path: path.clone() }),
                Some(actual) if !actual.matches(expected) => out.push(Mismatch::Value {
                    path: path.clone(),
                    expected: expected.clone(),
                    actual: actual.to_string(),
                }),
                Some(_) => {}
            },
            Check::CountEquals { path, count } => match count_of(attrs, path) {
                None => out.push(Mismatch::Missing { path: path.clone() }),
                Some(AttrValue::Int(n)) if usize::try_from(*n).ok() == Some(*count) => {}
                Some(actual) => out.push(Mismatch::Count {
                    path: path.clone(),
                    expected: *count,
                    actual: actual.to_string(),
                }),
            },
            Check::FieldExists { path } => {
                if !attrs.contains_key(path) {
                    out.push(Mismatch::Missing { path: path.clone() });
                }
            }
            Check::All(checks) => {
                for check in checks {
                    check.eval(attrs, out);
                }
            }
        }
    }
}

fn count_of<'a>(attrs: &'a Attributes, path: &str) -> Option<&'a AttrValue> {
    if path.ends_with(".#") || path.ends_with(".%") {
        return attrs.get(path);
    }
    attrs
        .get(&format!("{path}.#"))
        .or_else(|| attrs.get(&format!("{path}.%")))
}

/// Evaluate every check against `observed`. All checks run; the error holds
/// every mismatch in check order.
pub fn compare(checks: &[Check], observed: &ObservedState) -> Result<(), Mismatches> {
    let attrs = flatten(observed);
    let mut mismatches = Vec::new();
    for check in checks {
        check.eval(&attrs, &mut mismatches);
    }
    debug!(
        identity = %observed.identity,
        checks = checks.len(),
        mismatches = mismatches.len(),
        "compared observed state"
    );
    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(Mismatches(mismatches))
    }
}

/// Derive checks asserting that observed state carries everything `spec`
/// declares. Secret fields only need to exist.
pub fn declared_checks(spec: &ResourceSpec) -> Vec<Check> {
    let secrets = secret_paths(spec);
    flatten_spec(spec)
        .into_iter()
        .map(|(path, value)| {
            if secrets.contains(&path) {
                return Check::FieldExists { path };
            }
            if let Some(base) = path.strip_suffix(".#").or_else(|| path.strip_suffix(".%")) {
                if let AttrValue::Int(n) = value {
                    return Check::count(base, usize::try_from(n).unwrap_or_default());
                }
            }
            Check::ScalarEquals { path, expected: value.to_string() }
        })
        .collect()
}
