use std::collections::HashMap;
use std::sync::Arc;

use acctest_config::TestCase;
use acctest_domain::ResourceIdentity;
use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::driver::LifecycleDriver;
use crate::error::{LifecycleError, SequenceError};
use crate::report::{Phase, RunReport, SequenceReport};

/// Run independent cases with at most `concurrency` sequences in flight.
///
/// Cases must target distinct identities; the whole run is rejected up front
/// otherwise. Reports come back in input order. A sequence whose task dies
/// is reported as interrupted and the others run to completion.
pub async fn run_all(
    driver: &LifecycleDriver,
    cases: Vec<TestCase>,
    concurrency: usize,
) -> Result<RunReport, LifecycleError> {
    check_distinct(&cases)?;

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let total = cases.len();
    info!(%run_id, cases = total, concurrency, "Starting run");

    let mut slots: Vec<Option<SequenceReport>> = vec![None; total];
    let mut placeholders: Vec<SequenceReport> = cases
        .iter()
        .map(|c| SequenceReport::new(&c.name, c.identity()))
        .collect();

    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut task_index: HashMap<tokio::task::Id, usize> = HashMap::new();
    for (index, case) in cases.into_iter().enumerate() {
        let driver = driver.clone();
        let permits = permits.clone();
        let handle = tasks.spawn(async move {
            match permits.acquire_owned().await {
                Ok(_permit) => (index, driver.run_sequence(&case).await),
                Err(e) => (index, interrupted(SequenceReport::new(&case.name, case.identity()), e.to_string())),
            }
        });
        task_index.insert(handle.id(), index);
    }

    while let Some(joined) = tasks.join_next().await {
        let (index, report) = match joined {
            Ok(done) => done,
            Err(e) => {
                let Some(&index) = task_index.get(&e.id()) else {
                    return Err(LifecycleError::Internal(format!("unknown task ended: {}", e)));
                };
                error!(%run_id, case = %placeholders[index].case, error = %e, "Sequence task died");
                let report = std::mem::replace(&mut placeholders[index], SequenceReport::new("", None));
                (index, interrupted(report, e.to_string()))
            }
        };
        if !report.passed() {
            warn!(%run_id, case = %report.case, "Sequence failed");
        }
        slots[index] = Some(report);
    }

    let sequences: Vec<SequenceReport> = slots.into_iter().flatten().collect();
    if sequences.len() != total {
        return Err(LifecycleError::Internal(format!(
            "{} of {} sequences produced no report",
            total - sequences.len(),
            total
        )));
    }

    let report = RunReport {
        run_id,
        sequences,
        started_at,
        finished_at: Utc::now(),
    };
    info!(%run_id, passed = report.passed(), failed = report.failed().count(), "Run finished");
    Ok(report)
}

fn interrupted(mut report: SequenceReport, message: String) -> SequenceReport {
    report.phase = Phase::Failed;
    report.error = Some(SequenceError::Interrupted { message });
    report.finished_at = Some(Utc::now());
    report
}

fn check_distinct(cases: &[TestCase]) -> Result<(), LifecycleError> {
    let mut seen: HashMap<ResourceIdentity, &str> = HashMap::new();
    for case in cases {
        let Some(identity) = case.identity() else { continue };
        if let Some(first) = seen.get(&identity) {
            return Err(LifecycleError::DuplicateIdentity {
                identity,
                first: first.to_string(),
                second: case.name.clone(),
            });
        }
        seen.insert(identity, &case.name);
    }
    Ok(())
}
