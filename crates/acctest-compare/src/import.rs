use std::collections::BTreeSet;

use tracing::debug;

use crate::attributes::Attributes;
use crate::error::{Mismatch, Mismatches};

/// Diff the attribute set left by an apply against one re-read by identity
/// alone. Every path present on either side is compared unless it is listed
/// in `ignore`.
pub fn import_verify(
    applied: &Attributes,
    imported: &Attributes,
    ignore: &BTreeSet<String>,
) -> Result<(), Mismatches> {
    let paths: BTreeSet<&String> = applied.keys().chain(imported.keys()).collect();

    let mismatches: Vec<Mismatch> = paths
        .into_iter()
        .filter(|path| !ignore.contains(*path))
        .filter_map(|path| {
            let a = applied.get(path);
            let b = imported.get(path);
            (a != b).then(|| Mismatch::Diverged {
                path: path.clone(),
                applied: a.map(ToString::to_string),
                imported: b.map(ToString::to_string),
            })
        })
        .collect();

    debug!(ignored = ignore.len(), diverged = mismatches.len(), "import verify");
    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(Mismatches(mismatches))
    }
}
