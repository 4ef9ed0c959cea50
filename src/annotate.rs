//! Tag FASTA records with the gene they come from
//!
//! Every record's description gets a ` gene:<id>` suffix, where `<id>` is the
//! first token of the header. Records are streamed one at a time from input
//! to output and sequences are copied unchanged.

use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use bio::io::fasta;
use log::{debug, info};

use crate::{read_fasta_records, same_file, Error};

/// What to do with a record whose description already carries its gene tag
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnnotatePolicy {
    /// Leave already tagged records alone, so that re-runs are idempotent
    SkipAnnotated,
    /// Append the tag unconditionally
    AlwaysAppend,
}

impl Default for AnnotatePolicy {
    fn default() -> Self {
        AnnotatePolicy::SkipAnnotated
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct AnnotateSummary {
    pub records: usize,
    pub annotated: usize,
    pub skipped: usize,
}

/// The `gene:<id>` tag for `record`
fn gene_tag(record: &fasta::Record) -> String {
    let gene = record.id().split_whitespace().next().unwrap_or_default();
    format!("gene:{}", gene)
}

fn is_annotated(record: &fasta::Record, tag: &str) -> bool {
    record
        .desc()
        .map(|desc| desc.split_whitespace().any(|token| token == tag))
        .unwrap_or(false)
}

/// Return a copy of `record` with its gene tag appended to the description
///
/// Returns `None` when `policy` says the record should be written as is.
pub fn annotate_record(record: &fasta::Record, policy: AnnotatePolicy) -> Option<fasta::Record> {
    let tag = gene_tag(record);
    if policy == AnnotatePolicy::SkipAnnotated && is_annotated(record, &tag) {
        return None;
    }

    let desc = match record.desc() {
        Some(desc) => format!("{} {}", desc, tag),
        None => tag,
    };
    Some(fasta::Record::with_attrs(
        record.id(),
        Some(&desc),
        record.seq(),
    ))
}

/// Write every record of `input` to `output` with a gene tag in its description
pub fn annotate_fasta(
    input: &Path,
    output: &Path,
    policy: AnnotatePolicy,
) -> Result<AnnotateSummary> {
    // creating the output would truncate the input before it is read
    if same_file(input, output) {
        bail!("Input and output are the same file: {:?}", input);
    }

    let records = read_fasta_records(input)?;
    let file = File::create(output).map_err(|e| Error::io(output, e))?;
    let mut writer = fasta::Writer::new(file);

    let mut summary = AnnotateSummary::default();
    for record in records {
        let record = record?;
        summary.records += 1;

        let written = match annotate_record(&record, policy) {
            Some(annotated) => {
                summary.annotated += 1;
                writer.write_record(&annotated)
            }
            None => {
                debug!("{} is already annotated, copying it unchanged", record.id());
                summary.skipped += 1;
                writer.write_record(&record)
            }
        };
        written.with_context(|| format!("Could not write {} to {:?}", record.id(), output))?;
    }
    writer
        .flush()
        .with_context(|| format!("Could not write to {:?}", output))?;

    info!(
        "Annotated {} of {} records from {:?} into {:?}",
        summary.annotated, summary.records, input, output
    );
    Ok(summary)
}
