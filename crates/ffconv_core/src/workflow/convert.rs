//! The hardcode conversion workflow.
//!
//! Two phases per batch. Identification first: the opening file is probed
//! and mapped, every later file is probed and validated against the same
//! invariants, so a bad file aborts the batch before any encode time is
//! spent. Conversion second: one ffmpeg run per file with the batch
//! mapping and presets.

use std::path::PathBuf;

use chrono::Local;
use tracing::{info, warn};

use super::{WorkflowResult, FFMPEG};
use crate::batch::BatchItem;
use crate::command::{build_convert_args, ConvertJob, ToolRunner};
use crate::mapping::{map_streams, TrackSelector};
use crate::models::{Mapping, StreamInventory, StreamMapping};
use crate::probe::{identify, validate_order, validate_required_kinds};

/// What a convert run produced.
#[derive(Debug, Default)]
pub struct ConvertReport {
    pub outputs: Vec<PathBuf>,
}

/// Run the conversion for every batch.
pub fn run_convert(
    runner: &dyn ToolRunner,
    selector: &dyn TrackSelector,
    batches: &[BatchItem],
) -> WorkflowResult<ConvertReport> {
    let mut report = ConvertReport::default();

    for batch in batches {
        info!(
            "Batch {} (`{}`): {} file(s)",
            batch.batch_index,
            batch.batch_name,
            batch.input_files.len()
        );

        // Phase 1: identify and validate everything up front.
        let mut mapping: Option<StreamMapping> = None;
        let mut first_counts: Option<[usize; 3]> = None;
        for file in &batch.input_files {
            let inventory = identify(runner, file)?;
            match probe_file(&inventory, first_counts, selector)? {
                Mapping::Fresh(fresh) => {
                    first_counts = Some(inventory.count_vector());
                    mapping = Some(fresh);
                }
                Mapping::Reused => {}
            }
        }
        let Some(mapping) = mapping else {
            // Empty batch: nothing survived directory expansion.
            warn!("Batch {} holds no files, skipping", batch.batch_index);
            continue;
        };

        let audio = batch.audio.resolve(&mapping.audio.props.codec_id);
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        // Phase 2: convert.
        for (file, output) in batch.input_files.iter().zip(&batch.output_files) {
            info!("Converting `{}` -> `{}`", file.display(), output.display());
            let job = ConvertJob {
                input: file,
                output,
                mapping: &mapping,
                video: &batch.video,
                audio: &audio,
                filter: &batch.filter,
                timestamp: &timestamp,
            };
            runner.run(FFMPEG, &build_convert_args(&job))?;
            report.outputs.push(output.clone());
        }
    }

    Ok(report)
}

/// Validate one probed file; map it when it opens the batch.
///
/// Later files only need the invariants to hold for the batch mapping to
/// apply. A per-kind count drift is reported but not fatal: the invariants
/// alone decide convertibility.
fn probe_file(
    inventory: &StreamInventory,
    first_counts: Option<[usize; 3]>,
    selector: &dyn TrackSelector,
) -> WorkflowResult<Mapping> {
    validate_order(inventory)?;
    validate_required_kinds(inventory)?;

    match first_counts {
        None => Ok(Mapping::Fresh(map_streams(inventory, selector)?)),
        Some(counts) => {
            if inventory.count_vector() != counts {
                warn!(
                    "`{}` has stream counts {:?}, first file had {:?}; \
                     reusing the batch mapping anyway",
                    inventory.file_name(),
                    inventory.count_vector(),
                    counts
                );
            }
            Ok(Mapping::Reused)
        }
    }
}
