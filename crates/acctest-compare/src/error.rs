use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One divergence between expected and actual state, addressed by dotted
/// attribute path.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    #[error("{path}: attribute not found")]
    Missing { path: String },

    #[error("{path}: value is redacted by the provider and cannot be compared")]
    Redacted { path: String },

    #[error("{path}: expected {expected:?}, got {actual:?}")]
    Value {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("{path}: expected {expected} element(s), got {actual}")]
    Count {
        path: String,
        expected: usize,
        actual: String,
    },

    #[error("{path}: applied {applied:?} but re-read {imported:?}")]
    Diverged {
        path: String,
        applied: Option<String>,
        imported: Option<String>,
    },
}

impl Mismatch {
    pub fn path(&self) -> &str {
        match self {
            Mismatch::Missing { path }
            | Mismatch::Redacted { path }
            | Mismatch::Value { path, .. }
            | Mismatch::Count { path, .. }
            | Mismatch::Diverged { path, .. } => path,
        }
    }
}

/// All mismatches found by one evaluation, in check order.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{} mismatch(es): {}", .0.len(), render(.0))]
pub struct Mismatches(pub Vec<Mismatch>);

impl Mismatches {
    pub fn first(&self) -> Option<&Mismatch> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mismatch> {
        self.0.iter()
    }
}

fn render(items: &[Mismatch]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
