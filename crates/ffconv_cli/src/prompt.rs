//! Interactive stream selection on stdin.

use std::io::{self, BufRead, Write};

use ffconv_core::mapping::{MappingError, MappingResult, TrackSelector};
use ffconv_core::models::{StreamRecord, TrackType};

/// Selector that prints the candidates and asks for an id on stdin.
///
/// A single candidate is taken without asking; the prompt defaults to the
/// first stream on an empty answer and re-asks on anything that is not a
/// listed id.
#[derive(Debug, Default)]
pub struct PromptSelector;

impl PromptSelector {
    pub fn new() -> Self {
        Self
    }

    fn ask(&self, kind: TrackType, candidates: &[StreamRecord]) -> MappingResult<u32> {
        let default = candidates[0].id;
        print_candidates(kind, candidates);

        let stdin = io::stdin();
        let mut line = String::new();
        loop {
            print!("Select {kind} stream id [{default}]: ");
            let _ = io::stdout().flush();

            line.clear();
            let read = stdin.lock().read_line(&mut line).map_err(|e| {
                MappingError::Aborted {
                    kind,
                    reason: e.to_string(),
                }
            })?;
            if read == 0 {
                return Err(MappingError::Aborted {
                    kind,
                    reason: "end of input".into(),
                });
            }

            let answer = line.trim();
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<u32>() {
                Ok(id) if candidates.iter().any(|r| r.id == id) => return Ok(id),
                _ => println!("`{answer}` is not one of the listed ids"),
            }
        }
    }
}

impl TrackSelector for PromptSelector {
    fn select(&self, kind: TrackType, candidates: &[StreamRecord]) -> MappingResult<u32> {
        match candidates {
            [] => Err(MappingError::InvalidSelection { kind, id: 0 }),
            [only] => Ok(only.id),
            _ => self.ask(kind, candidates),
        }
    }
}

fn print_candidates(kind: TrackType, candidates: &[StreamRecord]) {
    println!("\nMultiple {kind} streams detected:");
    println!(
        "{:>4}  {:<24} {:<8} {:<24} {}",
        "Id", "Codec", "Lang", "Title", "Default"
    );
    for record in candidates {
        println!(
            "{:>4}  {:<24} {:<8} {:<24} {}",
            record.id,
            record.props.codec_id,
            record.props.language.as_deref().unwrap_or("-"),
            record.props.track_name.as_deref().unwrap_or("-"),
            record
                .props
                .default_track
                .map(|d| if d { "yes" } else { "no" })
                .unwrap_or("-"),
        );
    }
}
