//! The batch repair remux workflow.
//!
//! Probes every file of the batch, plans the reconciliation and runs one
//! mkvmerge per flagged file. Consistent batches are left untouched.

use std::path::{Path, PathBuf};

use tracing::info;

use super::{remux_output, run_mkvmerge, WorkflowResult, REMUX_SUFFIX};
use crate::batch::PathEntry;
use crate::command::{build_remux_args, RemuxJob, ToolRunner};
use crate::probe::identify;
use crate::reconcile::{plan, ReconcileOutcome};

/// What a remux run decided and produced.
#[derive(Debug, Default)]
pub struct RemuxReport {
    /// Files that were rewritten, with their outputs.
    pub remuxed: Vec<(PathBuf, PathBuf)>,
    /// True when the batch needed no work at all.
    pub consistent: bool,
}

/// Reconcile and repair a batch of files.
///
/// Inputs are processed in alphabetical order so the reported baseline and
/// the remux sequence are stable regardless of directory traversal order.
pub fn run_remux(
    runner: &dyn ToolRunner,
    inputs: &[PathBuf],
    output: &PathEntry,
    sort_keys: &[String],
) -> WorkflowResult<RemuxReport> {
    let mut files: Vec<&Path> = inputs.iter().map(|p| p.as_path()).collect();
    files.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));

    let mut inventories = Vec::with_capacity(files.len());
    for file in &files {
        inventories.push(identify(runner, file)?);
    }

    let mut report = RemuxReport::default();
    match plan(&inventories, sort_keys)? {
        ReconcileOutcome::Consistent => {
            info!("Batch is consistent, nothing to remux");
            report.consistent = true;
        }
        ReconcileOutcome::Plan(remuxes) => {
            for remux in &remuxes {
                let target = remux_output(&remux.file, output, REMUX_SUFFIX);
                info!(
                    "Remuxing `{}` -> `{}`",
                    remux.file.display(),
                    target.display()
                );
                let job = RemuxJob {
                    input: &remux.file,
                    output: &target,
                    removals: &remux.removals,
                    order: &remux.order,
                };
                run_mkvmerge(runner, &build_remux_args(&job))?;
                report.remuxed.push((remux.file.clone(), target));
            }
        }
    }
    Ok(report)
}
