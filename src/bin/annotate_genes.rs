//! Append a `gene:<id>` annotation to every record of a FASTA file

use anyhow::Result;

use std::path::PathBuf;

use orthotools::annotate::{self, AnnotatePolicy};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "annotate-genes",
    about = "Append gene:<id> to the description of every record in a fasta file"
)]
struct Opt {
    /// append the tag even to records that already carry it
    #[structopt(long)]
    always_append: bool,

    /// verbosity, repeat for more detail
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,

    /// input fasta file
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// output fasta file, overwritten if present
    #[structopt(parse(from_os_str))]
    output: PathBuf,
}

fn main() -> Result<()> {
    let opt: Opt = Opt::from_args();
    orthotools::init_logging(opt.verbose);

    let policy = if opt.always_append {
        AnnotatePolicy::AlwaysAppend
    } else {
        AnnotatePolicy::SkipAnnotated
    };
    annotate::annotate_fasta(&opt.input, &opt.output, policy)?;

    Ok(())
}
