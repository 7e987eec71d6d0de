use acctest_compare::Mismatches;
use acctest_domain::ResourceIdentity;
use acctest_provider::ProviderError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a read after apply produced no state to check.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ReadError {
    #[error("resource not found")]
    NotFound,

    #[error(transparent)]
    Provider(ProviderError),
}

/// The first failure of a sequence. Steps are 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SequenceError {
    #[error("step {step}: invalid fixture: {message}")]
    Fixture { step: usize, message: String },

    #[error("step {step} ({identity}): apply failed: {source}")]
    Apply {
        step: usize,
        identity: ResourceIdentity,
        source: ProviderError,
    },

    #[error("step {step} ({identity}): read failed: {source}")]
    Read {
        step: usize,
        identity: ResourceIdentity,
        source: ReadError,
    },

    #[error("step {step} ({identity}): {mismatches}")]
    Assertion {
        step: usize,
        identity: ResourceIdentity,
        mismatches: Mismatches,
    },

    #[error("step {step} ({identity}): import verification: {mismatches}")]
    ImportVerify {
        step: usize,
        identity: ResourceIdentity,
        mismatches: Mismatches,
    },

    /// The sequence's task ended abnormally; its teardown may not have run.
    #[error("sequence interrupted: {message}")]
    Interrupted { message: String },
}

/// Cleanup failures. Reported beside, never instead of, a [`SequenceError`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TeardownError {
    #[error("{identity}: delete failed: {source}")]
    Delete {
        identity: ResourceIdentity,
        source: ProviderError,
    },

    #[error("{identity}: could not confirm deletion: {source}")]
    Read {
        identity: ResourceIdentity,
        source: ProviderError,
    },

    #[error("{identity}: still present after {attempts} check(s)")]
    StillPresent {
        identity: ResourceIdentity,
        attempts: u32,
    },

    #[error("{identity}: supporting resource cleanup failed: {source}")]
    Cleanup {
        identity: ResourceIdentity,
        source: ProviderError,
    },
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("cases '{first}' and '{second}' both target {identity}")]
    DuplicateIdentity {
        identity: ResourceIdentity,
        first: String,
        second: String,
    },

    #[error("internal error: {0}")]
    Internal(String),
}
