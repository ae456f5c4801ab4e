//! Batch track reconciliation.
//!
//! Given the inventories of every file in a batch, decide which files need
//! a repair remux and what that remux looks like: surplus tracks to drop
//! and the track order to enforce.
//!
//! The baseline is the file with the smallest per-kind count vector
//! (lexicographic over video, audio, subtitles). A file is flagged when
//! its counts differ from the baseline or its stream order is irregular.
//! Surplus detection is a multiset difference over full stream properties,
//! never over ids, so renumbered-but-equal tracks are not dropped.

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::models::{StreamInventory, StreamProps, StreamRecord, TrackType};
use crate::probe::validate_order;

#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Reconciliation needs at least one inventory.
    #[error("Cannot reconcile an empty batch")]
    EmptyBatch,

    /// Dropping surplus tracks would not land on the baseline counts; the
    /// file and baseline disagree in content, not just in surplus.
    #[error(
        "`{file}` cannot be reconciled: its {kind} streams do not contain \
         the baseline set from `{baseline}`"
    )]
    Irreconcilable {
        file: String,
        baseline: String,
        kind: TrackType,
    },
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// The repair plan for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRemux {
    pub file: PathBuf,
    /// Global ids to drop, per kind. Only kinds with removals appear.
    pub removals: BTreeMap<TrackType, Vec<u32>>,
    /// Kept global ids in target order (kind order, sorted within kind).
    pub order: Vec<u32>,
}

/// Outcome of planning a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Every file already matches the baseline; nothing to do.
    Consistent,
    /// These files need a repair remux.
    Plan(Vec<FileRemux>),
}

/// Plan the batch: pick the baseline, flag deviating files, and compute
/// per-file removals and track orders.
///
/// `sort_keys` are property names ordering the kept streams within each
/// kind ("language", "codec_id", "track_name", "default_track"). A stream
/// missing a key sorts with the empty string, i.e. first.
pub fn plan(
    inventories: &[StreamInventory],
    sort_keys: &[String],
) -> ReconcileResult<ReconcileOutcome> {
    let baseline = inventories
        .iter()
        .min_by_key(|inv| inv.count_vector())
        .ok_or(ReconcileError::EmptyBatch)?;
    let baseline_counts = baseline.count_vector();
    debug!(
        "Baseline `{}` with counts {:?}",
        baseline.file_name(),
        baseline_counts
    );

    let mut remuxes = Vec::new();
    for inventory in inventories {
        let broken_order = validate_order(inventory).is_err();
        let surplus_counts = inventory.count_vector() != baseline_counts;
        if !broken_order && !surplus_counts {
            continue;
        }
        info!(
            "`{}` needs a repair remux ({})",
            inventory.file_name(),
            if surplus_counts {
                "surplus tracks"
            } else {
                "irregular stream order"
            }
        );
        remuxes.push(plan_file(inventory, baseline, sort_keys)?);
    }

    if remuxes.is_empty() {
        Ok(ReconcileOutcome::Consistent)
    } else {
        Ok(ReconcileOutcome::Plan(remuxes))
    }
}

fn plan_file(
    inventory: &StreamInventory,
    baseline: &StreamInventory,
    sort_keys: &[String],
) -> ReconcileResult<FileRemux> {
    let mut removals = BTreeMap::new();
    let mut order = Vec::new();

    for kind in TrackType::ORDERED {
        let records = inventory.records(kind);
        let surplus = surplus_ids(records, baseline.records(kind));

        let mut kept: Vec<StreamRecord> = records
            .iter()
            .filter(|r| !surplus.contains(&r.id))
            .cloned()
            .collect();
        if kept.len() != baseline.count(kind) {
            return Err(ReconcileError::Irreconcilable {
                file: inventory.file_name(),
                baseline: baseline.file_name(),
                kind,
            });
        }

        multisort(&mut kept, sort_keys);
        order.extend(kept.iter().map(|r| r.id));
        if !surplus.is_empty() {
            removals.insert(kind, surplus);
        }
    }

    Ok(FileRemux {
        file: inventory.file.clone(),
        removals,
        order,
    })
}

/// Multiset difference by full property equality: ids of `records` whose
/// properties have no unmatched counterpart in `baseline`.
fn surplus_ids(records: &[StreamRecord], baseline: &[StreamRecord]) -> Vec<u32> {
    let mut unmatched: Vec<&StreamProps> = baseline.iter().map(|r| &r.props).collect();
    let mut surplus = Vec::new();
    for record in records {
        if let Some(pos) = unmatched.iter().position(|p| **p == record.props) {
            unmatched.swap_remove(pos);
        } else {
            surplus.push(record.id);
        }
    }
    surplus
}

/// Stable multi-key sort: applying the keys from last to first with a
/// stable sort yields the first key as primary, the last as tiebreaker.
fn multisort(records: &mut [StreamRecord], sort_keys: &[String]) {
    for key in sort_keys.iter().rev() {
        records.sort_by(|a, b| prop_value(&a.props, key).cmp(&prop_value(&b.props, key)));
    }
}

/// A property as a sortable string; absent values and unknown keys sort
/// as the empty string.
fn prop_value(props: &StreamProps, key: &str) -> String {
    match key {
        "codec_id" => props.codec_id.clone(),
        "language" => props.language.clone().unwrap_or_default(),
        "track_name" => props.track_name.clone().unwrap_or_default(),
        "default_track" => props
            .default_track
            .map(|d| d.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}
