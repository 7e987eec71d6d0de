use std::sync::Arc;
use std::time::Duration;

use acctest_compare::{applied_attributes, compare, declared_checks, flatten, import_verify};
use acctest_config::{TestCase, TestStep};
use acctest_domain::{ObservedState, ResourceIdentity};
use acctest_fixture::{render, Fixture};
use acctest_provider::{ApplyEngine, ProviderClient};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{ReadError, SequenceError, TeardownError};
use crate::report::{Phase, SequenceReport, StepReport};

/// How hard teardown looks for the deleted resource before giving up.
#[derive(Debug, Clone)]
pub struct TeardownPolicy {
    /// Reads performed by [`LifecycleDriver::confirm_absent`]. Zero is treated as one.
    pub confirm_attempts: u32,
    /// Pause between reads; never slept after the last one.
    pub poll_interval: Duration,
}

impl Default for TeardownPolicy {
    fn default() -> Self {
        Self {
            confirm_attempts: 1,
            poll_interval: Duration::from_secs(10),
        }
    }
}

/// Runs test cases step by step against an injected provider client and
/// apply engine.
#[derive(Clone)]
pub struct LifecycleDriver {
    client: Arc<dyn ProviderClient>,
    engine: Arc<dyn ApplyEngine>,
    policy: TeardownPolicy,
}

impl LifecycleDriver {
    pub fn new(
        client: Arc<dyn ProviderClient>,
        engine: Arc<dyn ApplyEngine>,
        policy: TeardownPolicy,
    ) -> Self {
        Self { client, engine, policy }
    }

    /// Run every step of `case` in order, then tear down.
    ///
    /// The first failure stops the remaining steps. Teardown runs whenever an
    /// apply was attempted, and its failure is reported separately.
    pub async fn run_sequence(&self, case: &TestCase) -> SequenceReport {
        let mut report = SequenceReport::new(&case.name, case.identity());
        info!(case = %case.name, steps = case.steps.len(), client = self.client.name(), engine = self.engine.name(), "Starting sequence");

        let (identity, documents) = match prepare(case) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(case = %case.name, error = %e, "Sequence rejected before apply");
                report.phase = Phase::Failed;
                report.error = Some(e);
                report.finished_at = Some(Utc::now());
                return report;
            }
        };

        let mut last_attempted: Option<usize> = None;
        for (index, (step, document)) in case.steps.iter().zip(&documents).enumerate() {
            last_attempted = Some(index);
            let mut checks = step.checks.len();
            if step.match_declared {
                checks += declared_checks(&step.fixture.container_group).len();
            }

            match self.run_step(index, step, document, &identity).await {
                Ok(()) => {
                    report.phase = report.phase.after_apply();
                    info!(case = %case.name, step = index, phase = %report.phase, "Step passed");
                    report.steps.push(StepReport {
                        index,
                        fixture: step.fixture.name.clone(),
                        phase: report.phase,
                        checks,
                        import_verified: step.import_verify.is_some(),
                    });
                }
                Err(e) => {
                    warn!(case = %case.name, step = index, error = %e, "Step failed");
                    report.steps.push(StepReport {
                        index,
                        fixture: step.fixture.name.clone(),
                        phase: Phase::Failed,
                        checks,
                        import_verified: false,
                    });
                    report.error = Some(e);
                    break;
                }
            }
        }

        if let Some(index) = last_attempted {
            let fixture = &case.steps[index].fixture;
            if let Err(e) = self.teardown(fixture, &documents[index]).await {
                warn!(case = %case.name, error = %e, "Teardown failed");
                report.teardown = Some(e);
            }
        }

        report.phase = if report.error.is_none() && report.teardown.is_none() {
            Phase::Destroyed
        } else {
            Phase::Failed
        };
        report.finished_at = Some(Utc::now());
        info!(case = %case.name, phase = %report.phase, passed = report.passed(), "Sequence finished");
        report
    }

    async fn run_step(
        &self,
        index: usize,
        step: &TestStep,
        document: &str,
        identity: &ResourceIdentity,
    ) -> Result<(), SequenceError> {
        debug!(step = index, fixture = %step.fixture.name, %identity, "Applying");
        self.engine
            .apply(&step.fixture, document)
            .await
            .map_err(|source| SequenceError::Apply {
                step: index,
                identity: identity.clone(),
                source,
            })?;

        let observed = self.read(index, identity).await?;

        let mut checks = step.checks.clone();
        if step.match_declared {
            checks.extend(declared_checks(&step.fixture.container_group));
        }
        compare(&checks, &observed).map_err(|mismatches| SequenceError::Assertion {
            step: index,
            identity: identity.clone(),
            mismatches,
        })?;

        if let Some(verify) = &step.import_verify {
            let applied = applied_attributes(&step.fixture.container_group, &observed);
            let imported = flatten(&self.read(index, identity).await?);
            import_verify(&applied, &imported, &verify.ignore).map_err(|mismatches| {
                SequenceError::ImportVerify {
                    step: index,
                    identity: identity.clone(),
                    mismatches,
                }
            })?;
            debug!(step = index, %identity, ignored = verify.ignore.len(), "Import verified");
        }
        Ok(())
    }

    /// A fresh read by identity. Absence is fatal for the step.
    async fn read(&self, index: usize, identity: &ResourceIdentity) -> Result<ObservedState, SequenceError> {
        let read_err = |source: ReadError| SequenceError::Read {
            step: index,
            identity: identity.clone(),
            source,
        };
        match self.client.get(identity).await {
            Ok(Some(state)) => Ok(state),
            Ok(None) => Err(read_err(ReadError::NotFound)),
            Err(e) => Err(read_err(ReadError::Provider(e))),
        }
    }

    /// Delete the group, confirm it is gone, then let the engine remove the
    /// supporting resources. Every stage runs; the first failure is returned.
    async fn teardown(&self, fixture: &Fixture, document: &str) -> Result<(), TeardownError> {
        let identity = fixture.identity();
        info!(%identity, "Tearing down");

        let mut first: Option<TeardownError> = None;
        match self.client.delete(&identity).await {
            Ok(()) => {
                if let Err(e) = self.confirm_absent(&identity).await {
                    first = Some(e);
                }
            }
            Err(source) => {
                first = Some(TeardownError::Delete {
                    identity: identity.clone(),
                    source,
                });
            }
        }

        if let Err(source) = self.engine.destroy(fixture, document).await {
            first.get_or_insert(TeardownError::Cleanup {
                identity: identity.clone(),
                source,
            });
        }

        match first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Succeeds once a read reports the group absent. Retries only as far as
    /// the teardown policy allows.
    pub async fn confirm_absent(&self, identity: &ResourceIdentity) -> Result<(), TeardownError> {
        let attempts = self.policy.confirm_attempts.max(1);
        for attempt in 1..=attempts {
            match self.client.get(identity).await {
                Ok(None) => {
                    debug!(%identity, attempt, "Confirmed absent");
                    return Ok(());
                }
                Ok(Some(_)) => {
                    debug!(%identity, attempt, attempts, "Still present");
                    if attempt < attempts {
                        tokio::time::sleep(self.policy.poll_interval).await;
                    }
                }
                Err(source) => {
                    return Err(TeardownError::Read {
                        identity: identity.clone(),
                        source,
                    });
                }
            }
        }
        Err(TeardownError::StillPresent {
            identity: identity.clone(),
            attempts,
        })
    }
}

/// Validate the case and render every step before anything is applied.
fn prepare(case: &TestCase) -> Result<(ResourceIdentity, Vec<String>), SequenceError> {
    let first = case.steps.first().ok_or_else(|| SequenceError::Fixture {
        step: 0,
        message: format!("case '{}' has no steps", case.name),
    })?;
    let identity = first.fixture.identity();

    let mut documents = Vec::with_capacity(case.steps.len());
    for (index, step) in case.steps.iter().enumerate() {
        let step_identity = step.fixture.identity();
        if step_identity != identity {
            return Err(SequenceError::Fixture {
                step: index,
                message: format!("targets {} but the case targets {}", step_identity, identity),
            });
        }
        let document = render(&step.fixture).map_err(|e| SequenceError::Fixture {
            step: index,
            message: e.to_string(),
        })?;
        documents.push(document);
    }
    Ok((identity, documents))
}
