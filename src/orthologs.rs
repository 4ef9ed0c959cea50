//! Pair up reference species identifiers across single-copy orthogroups
//!
//! Each `.fa` file in the input directory is one orthogroup. Within a file,
//! a record belongs to a species when its id starts with that species'
//! prefix. The result is a table with one row per orthogroup file and one
//! column per species, `NA` marking a species that was not found.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::{fs_find_files_with_extensions, read_fasta_records, Error};

/// A reference species, recognised by the prefix of its record ids
#[derive(Debug, PartialEq, Eq)]
pub struct Species {
    /// CSV column header
    pub column: &'static str,
    pub prefix: &'static str,
}

pub const ARABIDOPSIS: Species = Species {
    column: "Arabidopsis_thaliana",
    prefix: "AT",
};

pub const LOTUS: Species = Species {
    column: "Lotus_japonicus",
    prefix: "Lot",
};

/// Species in column order. The first matching prefix claims a record.
pub static SPECIES: [Species; 2] = [ARABIDOPSIS, LOTUS];

/// Written in place of an id when a species has no record in an orthogroup
pub const NOT_FOUND: &str = "NA";

pub const DEFAULT_TABLE_NAME: &str = "AT_LJ_Orthogroups.csv";

const ORTHOGROUP_EXTENSIONS: [&str; 1] = ["fa"];

/// What to do when an orthogroup has several records for the same species
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Keep the record seen last, with a warning
    Last,
    /// Keep the record seen first, with a warning
    First,
    /// Abort the run
    Error,
}

impl DuplicatePolicy {
    pub const VARIANTS: &'static [&'static str] = &["last", "first", "error"];
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        DuplicatePolicy::Last
    }
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last" => Ok(DuplicatePolicy::Last),
            "first" => Ok(DuplicatePolicy::First),
            "error" => Ok(DuplicatePolicy::Error),
            _ => Err(format!(
                "Unknown duplicate policy {:?}, expected one of {:?}",
                s,
                DuplicatePolicy::VARIANTS
            )),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DuplicatePolicy::Last => "last",
            DuplicatePolicy::First => "first",
            DuplicatePolicy::Error => "error",
        };
        f.write_str(name)
    }
}

/// Species ids found in one orthogroup file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrthogroupRow {
    /// File stem of the orthogroup, e.g. `OG0000042`
    pub orthogroup: String,
    ids: [Option<String>; 2],
}

impl OrthogroupRow {
    pub fn new(orthogroup: impl Into<String>) -> Self {
        OrthogroupRow {
            orthogroup: orthogroup.into(),
            ids: [None, None],
        }
    }

    pub fn arabidopsis(&self) -> Option<&str> {
        self.ids[0].as_deref()
    }

    pub fn lotus(&self) -> Option<&str> {
        self.ids[1].as_deref()
    }

    /// Values as written to the table, in [`SPECIES`] order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(|id| id.as_deref().unwrap_or(NOT_FOUND))
    }
}

/// Index into [`SPECIES`] of the species `id` belongs to, if any
fn species_of(id: &str) -> Option<usize> {
    SPECIES.iter().position(|species| id.starts_with(species.prefix))
}

/// Collect the reference species ids from the orthogroup FASTA at `path`
pub fn scan_orthogroup(path: &Path, policy: DuplicatePolicy) -> Result<OrthogroupRow> {
    let orthogroup = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut row = OrthogroupRow::new(orthogroup);

    for record in read_fasta_records(path)? {
        let record = record?;
        let index = match species_of(record.id()) {
            Some(index) => index,
            None => continue,
        };
        let species = &SPECIES[index];
        let id = record.id().to_owned();
        let slot = &mut row.ids[index];

        if let Some(previous) = slot.as_deref() {
            match policy {
                DuplicatePolicy::Error => {
                    return Err(Error::DuplicateMatch {
                        file: path.to_path_buf(),
                        species: species.column,
                        first: previous.to_owned(),
                        second: id,
                    }
                    .into())
                }
                DuplicatePolicy::First => {
                    warn!(
                        "{}: ignoring {} record {}, keeping {}",
                        row.orthogroup, species.column, id, previous
                    );
                    continue;
                }
                DuplicatePolicy::Last => warn!(
                    "{}: {} record {} replaces {}",
                    row.orthogroup, species.column, id, previous
                ),
            }
        }
        debug!("{}: {} is {}", row.orthogroup, species.column, id);
        *slot = Some(id);
    }
    Ok(row)
}

/// Scan every `.fa` file directly in `dir`, in sorted path order
pub fn extract_ortholog_pairs(dir: &Path, policy: DuplicatePolicy) -> Result<Vec<OrthogroupRow>> {
    let files = fs_find_files_with_extensions(dir, &ORTHOGROUP_EXTENSIONS)?;
    info!("Found {} orthogroup files in {:?}", files.len(), dir);

    files
        .iter()
        .map(|path| scan_orthogroup(path, policy))
        .collect()
}

/// Save `rows` as CSV at `path`, one line per orthogroup under a species header
pub fn write_ortholog_table(rows: &[OrthogroupRow], path: &Path) -> Result<()> {
    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("Could not create {:?}", path))?;

    wtr.write_record(SPECIES.iter().map(|species| species.column))
        .with_context(|| format!("Could not write to {:?}", path))?;
    for row in rows {
        wtr.write_record(row.fields())
            .with_context(|| format!("Could not write {} to {:?}", row.orthogroup, path))?;
    }
    wtr.flush().map_err(|e| Error::io(path, e))?;
    Ok(())
}

/// Build the ortholog table for `dir` and save it as `output_dir/file_name`
///
/// Returns the path of the written table.
pub fn run_extractor(
    dir: &Path,
    output_dir: &Path,
    file_name: &str,
    policy: DuplicatePolicy,
) -> Result<PathBuf> {
    let rows = extract_ortholog_pairs(dir, policy)?;

    fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;
    let output_path = output_dir.join(file_name);
    write_ortholog_table(&rows, &output_path)?;

    info!("Wrote {} orthogroups to {:?}", rows.len(), output_path);
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn log_init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// test helper to lay out orthogroup files in a fresh directory
    fn orthogroup_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = tempdir().unwrap();
        for (name, contents) in files {
            fs::write(dir.path().join(name), contents).unwrap();
        }
        dir
    }

    fn table_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_species_of() {
        assert_eq!(species_of("AT1G01010"), Some(0));
        assert_eq!(species_of("Lot_jap_v3_0001"), Some(1));
        assert_eq!(species_of("Lj1g0000001"), None);
        assert_eq!(species_of("at1g01010"), None);
    }

    #[test]
    fn test_duplicate_policy_from_str() {
        for name in DuplicatePolicy::VARIANTS {
            let policy: DuplicatePolicy = name.parse().unwrap();
            assert_eq!(policy.to_string(), *name);
        }
        assert!("newest".parse::<DuplicatePolicy>().is_err());
    }

    #[test]
    fn test_scan_orthogroup_pair() -> Result<()> {
        let dir = orthogroup_dir(&[(
            "OG0000001.fa",
            ">AT1G01010\nMEDQ\n>Lot_jap_v3_0001\nMEDK\n>Medtr1g000010\nMEDR\n",
        )]);
        let row = scan_orthogroup(&dir.path().join("OG0000001.fa"), DuplicatePolicy::Last)?;
        assert_eq!(row.orthogroup, "OG0000001");
        assert_eq!(row.arabidopsis(), Some("AT1G01010"));
        assert_eq!(row.lotus(), Some("Lot_jap_v3_0001"));
        assert_eq!(row.fields().collect::<Vec<_>>(), ["AT1G01010", "Lot_jap_v3_0001"]);
        Ok(())
    }

    #[test]
    fn test_scan_orthogroup_missing_species() -> Result<()> {
        let dir = orthogroup_dir(&[("OG1.fa", ">Lot_jap_v3_0002 desc\nMK\n>Os01g0100100\nMK\n")]);
        let row = scan_orthogroup(&dir.path().join("OG1.fa"), DuplicatePolicy::Last)?;
        assert_eq!(row.arabidopsis(), None);
        assert_eq!(row.fields().collect::<Vec<_>>(), [NOT_FOUND, "Lot_jap_v3_0002"]);
        Ok(())
    }

    #[test]
    fn test_scan_orthogroup_duplicates() -> Result<()> {
        log_init();
        let dir = orthogroup_dir(&[(
            "OG2.fa",
            ">AT1G01010\nMK\n>Lot_jap_v3_0001\nMK\n>AT1G01020\nMK\n",
        )]);
        let path = dir.path().join("OG2.fa");

        let last = scan_orthogroup(&path, DuplicatePolicy::Last)?;
        assert_eq!(last.arabidopsis(), Some("AT1G01020"));

        let first = scan_orthogroup(&path, DuplicatePolicy::First)?;
        assert_eq!(first.arabidopsis(), Some("AT1G01010"));
        assert_eq!(first.lotus(), Some("Lot_jap_v3_0001"));

        let err = scan_orthogroup(&path, DuplicatePolicy::Error).unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::DuplicateMatch {
                species,
                first,
                second,
                ..
            }) => {
                assert_eq!(*species, "Arabidopsis_thaliana");
                assert_eq!(first, "AT1G01010");
                assert_eq!(second, "AT1G01020");
            }
            other => panic!("unexpected error {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_extract_one_row_per_fa_file() -> Result<()> {
        let dir = orthogroup_dir(&[
            ("OG3.fa", ">AT3G00001\nM\n"),
            ("OG1.fa", ">AT1G00001\nM\n>Lot_1\nM\n"),
            ("OG2.fa", ">Lot_2\nM\n"),
            ("notes.txt", "not an orthogroup"),
            ("OG4.fasta", ">AT4G00001\nM\n"),
        ]);
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("OG5.fa"), ">AT5G00001\nM\n").unwrap();

        let rows = extract_ortholog_pairs(dir.path(), DuplicatePolicy::default())?;
        let orthogroups: Vec<_> = rows.iter().map(|r| r.orthogroup.as_str()).collect();
        assert_eq!(orthogroups, ["OG1", "OG2", "OG3"]);
        assert_eq!(rows[1].arabidopsis(), None);
        assert_eq!(rows[2].lotus(), None);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_symlinked_orthogroups() -> Result<()> {
        use std::os::unix::fs::symlink;

        let dir = orthogroup_dir(&[("OG1.fasta", ">AT1\nM\n"), ("OG2.fa", ">AT2\nM\n")]);
        symlink(dir.path().join("OG1.fasta"), dir.path().join("OG1.fa"))?;
        symlink(dir.path().join("OG2.fa"), dir.path().join("OG2.txt"))?;
        symlink(dir.path().join("missing.fa"), dir.path().join("notes.txt"))?;

        let rows = extract_ortholog_pairs(dir.path(), DuplicatePolicy::default())?;
        let found: Vec<_> = rows
            .iter()
            .map(|r| (r.orthogroup.as_str(), r.arabidopsis()))
            .collect();
        assert_eq!(found, [("OG1", Some("AT1")), ("OG2", Some("AT2"))]);
        Ok(())
    }

    #[test]
    fn test_extract_malformed_file() {
        let dir = orthogroup_dir(&[("OG1.fa", ">AT1\nM\n"), ("OG2.fa", "AT2\nM\n")]);
        let err = extract_ortholog_pairs(dir.path(), DuplicatePolicy::default()).unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::Parse { path, record, .. }) => {
                assert_eq!(path.file_name().unwrap(), "OG2.fa");
                assert_eq!(*record, 0);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_extract_missing_dir() {
        let dir = tempdir().unwrap();
        let err = extract_ortholog_pairs(&dir.path().join("absent"), DuplicatePolicy::default())
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Io { .. })));
    }

    #[test]
    fn test_write_ortholog_table() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("table.csv");

        let mut with_comma = OrthogroupRow::new("OG2");
        with_comma.ids[0] = Some("AT1G01010,alt".to_owned());
        let rows = vec![OrthogroupRow::new("OG1"), with_comma];
        write_ortholog_table(&rows, &path)?;

        assert_eq!(
            table_lines(&path),
            [
                "Arabidopsis_thaliana,Lotus_japonicus",
                "NA,NA",
                "\"AT1G01010,alt\",NA",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_run_extractor() -> Result<()> {
        log_init();
        let input = orthogroup_dir(&[
            ("OG0000001.fa", ">AT1G01010\nMEDQ\n>Lot_jap_v3_0001\nMEDK\n"),
            ("OG0000002.fa", ">Lot_jap_v3_0002\nMEDK\n"),
        ]);
        let output = tempdir()?;
        let output_dir = output.path().join("results");

        let path = run_extractor(
            input.path(),
            &output_dir,
            DEFAULT_TABLE_NAME,
            DuplicatePolicy::default(),
        )?;
        assert_eq!(path, output_dir.join(DEFAULT_TABLE_NAME));
        assert_eq!(
            table_lines(&path),
            [
                "Arabidopsis_thaliana,Lotus_japonicus",
                "AT1G01010,Lot_jap_v3_0001",
                "NA,Lot_jap_v3_0002",
            ]
        );

        // a second run over the same input gives the same table
        let first = fs::read(&path)?;
        run_extractor(input.path(), &output_dir, DEFAULT_TABLE_NAME, DuplicatePolicy::default())?;
        assert_eq!(first, fs::read(&path)?);
        Ok(())
    }

    #[test]
    fn test_run_extractor_empty_dir() -> Result<()> {
        let input = tempdir()?;
        let output = tempdir()?;
        let path = run_extractor(input.path(), output.path(), "empty.csv", DuplicatePolicy::Error)?;
        assert_eq!(table_lines(&path), ["Arabidopsis_thaliana,Lotus_japonicus"]);
        Ok(())
    }
}
