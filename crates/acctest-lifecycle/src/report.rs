use acctest_domain::ResourceIdentity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SequenceError, TeardownError};

/// Where a sequence's resource stands.
///
/// `NotCreated -> Applied -> Updated* -> Destroyed`, with `Failed` terminal
/// for any step, assertion or teardown error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotCreated,
    Applied,
    Updated,
    Destroyed,
    Failed,
}

impl Phase {
    /// Phase reached by a successful apply from `self`.
    pub fn after_apply(self) -> Phase {
        match self {
            Phase::NotCreated => Phase::Applied,
            Phase::Applied | Phase::Updated => Phase::Updated,
            other => other,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::NotCreated => "not_created",
            Phase::Applied => "applied",
            Phase::Updated => "updated",
            Phase::Destroyed => "destroyed",
            Phase::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub index: usize,
    pub fixture: String,
    /// Phase after this step; `Failed` if the step did not complete.
    pub phase: Phase,
    pub checks: usize,
    pub import_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceReport {
    pub case: String,
    pub identity: Option<ResourceIdentity>,
    pub phase: Phase,
    pub steps: Vec<StepReport>,
    pub error: Option<SequenceError>,
    pub teardown: Option<TeardownError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SequenceReport {
    pub fn new(case: impl Into<String>, identity: Option<ResourceIdentity>) -> Self {
        Self {
            case: case.into(),
            identity,
            phase: Phase::NotCreated,
            steps: Vec::new(),
            error: None,
            teardown: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.error.is_none() && self.teardown.is_none() && self.phase == Phase::Destroyed
    }

    /// The failure to show first: the sequence error, else the teardown error.
    pub fn first_error(&self) -> Option<String> {
        self.error
            .as_ref()
            .map(ToString::to_string)
            .or_else(|| self.teardown.as_ref().map(ToString::to_string))
    }
}

/// Outcome of [`crate::run_all`], in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub sequences: Vec<SequenceReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.sequences.iter().all(SequenceReport::passed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &SequenceReport> {
        self.sequences.iter().filter(|s| !s.passed())
    }
}
