//! FASTA utilities for ortholog bookkeeping
//!
//! Two independent batch jobs live here: [`annotate`] tags every record of a
//! proteome with its gene id, and [`orthologs`] collects one identifier per
//! reference species from a directory of single-copy orthogroup files.

pub mod annotate;
pub mod orthologs;

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use bio::io::fasta;
use log::LevelFilter;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not access {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed FASTA in {path:?} at record {record}")]
    Parse {
        path: PathBuf,
        record: usize,
        #[source]
        source: io::Error,
    },

    #[error("Found more than one {species} record in {file:?}: {first:?} and {second:?}")]
    DuplicateMatch {
        file: PathBuf,
        species: &'static str,
        first: String,
        second: String,
    },
}

impl Error {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Set up `env_logger` from the number of `-v` flags given on the command line
///
/// `RUST_LOG` still takes precedence when it is set.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Open the FASTA file at `path` and iterate over its records
///
/// Reader failures are tagged with the file and the 0-based index of the
/// record being read. Content the parser rejects becomes [`Error::Parse`],
/// anything else stays an [`Error::Io`].
pub fn read_fasta_records(
    path: &Path,
) -> Result<impl Iterator<Item = Result<fasta::Record, Error>>, Error> {
    let file = File::open(path).map_err(|source| Error::io(path, source))?;
    let path = path.to_path_buf();

    Ok(fasta::Reader::new(file)
        .records()
        .enumerate()
        .map(move |(index, record)| {
            record.map_err(|source| match source.kind() {
                // bio reports a missing '>' as `Other`, bad UTF-8 as `InvalidData`
                io::ErrorKind::InvalidData | io::ErrorKind::Other => Error::Parse {
                    path: path.clone(),
                    record: index,
                    source,
                },
                _ => Error::io(&path, source),
            })
        }))
}

/// Find all files directly in `dir` with one of the given `extensions`
///
/// Subdirectories are not searched. Entries are matched on their listed
/// name, so a symlink counts when its own name has the extension and it
/// resolves to a regular file; dangling links are skipped. The result is
/// sorted so that callers see the same order on every platform.
pub fn fs_find_files_with_extensions<T>(dir: &Path, extensions: &[T]) -> Result<Vec<PathBuf>>
where
    T: AsRef<str>,
{
    fn is_file_type<T: AsRef<str>>(p: &Path, exts: &[T]) -> bool {
        p.extension()
            .map(|s| exts.iter().any(|e| s == e.as_ref()))
            .unwrap_or(false)
            && p.is_file()
    }

    let mut files = Vec::new();
    for entry in dir.read_dir().map_err(|e| Error::io(dir, e))? {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        if is_file_type(&path, extensions) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Whether `a` and `b` name the same file on disk, hard links included
pub(crate) fn same_file(a: &Path, b: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        match (fs::metadata(a), fs::metadata(b)) {
            (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
            _ => false,
        }
    }
    #[cfg(not(unix))]
    {
        match (fs::canonicalize(a), fs::canonicalize(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}
