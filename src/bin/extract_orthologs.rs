//! Tabulate Arabidopsis and Lotus identifiers per single-copy orthogroup

use log::info;

use anyhow::Result;

use std::path::PathBuf;

use orthotools::orthologs::{self, DuplicatePolicy, DEFAULT_TABLE_NAME};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "extract-orthologs",
    about = "Collect one Arabidopsis and one Lotus id from every .fa orthogroup file in a directory"
)]
struct Opt {
    /// what to do when a file holds several records of one species
    #[structopt(
        long,
        default_value = "last",
        possible_values = DuplicatePolicy::VARIANTS
    )]
    on_duplicate: DuplicatePolicy,

    /// name of the csv table inside the output directory
    #[structopt(long, default_value = DEFAULT_TABLE_NAME)]
    file_name: String,

    /// verbosity, repeat for more detail
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,

    /// directory of orthogroup fasta files
    #[structopt(parse(from_os_str))]
    directory: PathBuf,

    /// output directory, created if missing
    #[structopt(parse(from_os_str))]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    let opt: Opt = Opt::from_args();
    orthotools::init_logging(opt.verbose);

    info!(
        "Scanning {:?} with duplicate policy {}",
        opt.directory, opt.on_duplicate
    );
    let output_path =
        orthologs::run_extractor(&opt.directory, &opt.output_dir, &opt.file_name, opt.on_duplicate)?;

    println!("Data organized and saved to: {}", output_path.display());
    Ok(())
}
