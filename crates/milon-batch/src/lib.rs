//! Batch disambiguation: feed (hebrew word, english gloss) pairs through
//! the sense lookup and collect the resolved senses as CSV rows.

use std::io::{Read, Write};

use thiserror::Error;
use tracing::{info, warn};

use milon_core::normalize::strip_nikud;
use milon_lookup::{LookupError, SenseLookup};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Tally of one batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Well-formed input pairs seen.
    pub pairs_read: usize,
    /// Pairs that produced an output row.
    pub pairs_resolved: usize,
    /// Pairs whose word was not a known headword.
    pub unknown_keys: usize,
    /// Pairs where no candidate sense scored.
    pub no_selection: usize,
}

/// Process headerless CSV rows of (hebrew word, english gloss).
///
/// Each resolved pair writes one output row (normalized form, surface
/// form, gloss). Pairs with no selection are skipped and unknown
/// headwords are warned and skipped; neither aborts the batch.
pub fn process_pairs<R: Read, W: Write>(
    input: R,
    output: W,
    lookup: &SenseLookup,
) -> Result<BatchSummary, BatchError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    let mut writer = csv::Writer::from_writer(output);
    let mut summary = BatchSummary::default();

    for record in reader.records() {
        let record = record?;
        let hebrew = record.get(0).map(str::trim).unwrap_or("");
        let english = record.get(1).map(str::trim).unwrap_or("");
        if hebrew.is_empty() || english.is_empty() {
            warn!("skipping malformed input row: {:?}", record);
            continue;
        }
        summary.pairs_read += 1;

        // Input may arrive pointed; stripping is idempotent on forms
        // that are already normal.
        let key = strip_nikud(hebrew);
        match lookup.select_best_sense(&key, english) {
            Ok(Some(entry)) => {
                writer.write_record([
                    entry.normalized.as_deref().unwrap_or(&key),
                    entry.surface.as_deref().unwrap_or(""),
                    entry.gloss.as_deref().unwrap_or(""),
                ])?;
                summary.pairs_resolved += 1;
            }
            Ok(None) => summary.no_selection += 1,
            Err(LookupError::UnknownKey(k)) => {
                warn!("input word '{}' is not a known headword, skipping", k);
                summary.unknown_keys += 1;
            }
        }
    }
    writer.flush()?;

    info!(
        "batch done: {} pairs read, {} resolved, {} unknown, {} without a selection",
        summary.pairs_read, summary.pairs_resolved, summary.unknown_keys, summary.no_selection
    );
    Ok(summary)
}
