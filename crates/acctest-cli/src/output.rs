use acctest_compare::Mismatches;
use acctest_lifecycle::{RunReport, SequenceError, SequenceReport};

/// Render a run as human-readable text: one line per sequence, the first
/// error beneath each failure, then a summary.
pub fn render_run(report: &RunReport) -> String {
    let mut out = String::new();
    for seq in &report.sequences {
        out.push_str(&render_sequence(seq));
    }
    let failed = report.failed().count();
    out.push_str(&format!(
        "\n{} passed, {} failed (run {})\n",
        report.sequences.len() - failed,
        failed,
        report.run_id
    ));
    out
}

fn render_sequence(seq: &SequenceReport) -> String {
    let identity = seq
        .identity
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".into());
    let elapsed = seq
        .finished_at
        .map(|end| format!(" {}ms", (end - seq.started_at).num_milliseconds()))
        .unwrap_or_default();

    if seq.passed() {
        return format!("ok   {} ({}, {} step(s)){}\n", seq.case, identity, seq.steps.len(), elapsed);
    }

    let mut out = format!("FAIL {} ({}) phase={}{}\n", seq.case, identity, seq.phase, elapsed);
    match &seq.error {
        Some(SequenceError::Assertion { step, mismatches, .. }) => {
            out.push_str(&format!("  ! step {}: {} mismatch(es)\n", step, mismatches.len()));
            out.push_str(&render_mismatches(mismatches));
        }
        Some(SequenceError::ImportVerify { step, mismatches, .. }) => {
            out.push_str(&format!("  ! step {}: import verification failed\n", step));
            out.push_str(&render_mismatches(mismatches));
        }
        Some(e) => out.push_str(&format!("  ! {}\n", e)),
        None => {}
    }
    if let Some(t) = &seq.teardown {
        out.push_str(&format!("  ! teardown: {}\n", t));
    }
    out
}

fn render_mismatches(mismatches: &Mismatches) -> String {
    mismatches
        .iter()
        .map(|m| format!("      {}\n", m))
        .collect()
}
