//! Built-in loaders, one per distribution format.
//!
//! Each loader receives every file of its source directory and picks the
//! ones it understands by name; anything else is ignored with a debug log.

mod icd10;
mod icd9;
mod loinc;
mod phinvads;
mod rxnorm;
mod snomed;
mod vsac;

pub use icd10::Icd10Loader;
pub use icd9::Icd9Loader;
pub use loinc::LoincLoader;
pub use phinvads::PhinVadsLoader;
pub use rxnorm::RxNormLoader;
pub use snomed::SnomedLoader;
pub use vsac::VsacLoader;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::loader::file_name;
use crate::parser::{DelimitedParser, DelimitedRecord, Dialect};
use crate::types::{LoadConfig, LoadResult, LoadStats};

/// Returns true if `name` ends in one of `extensions`, ignoring ASCII case.
fn has_extension(name: &str, extensions: &[&str]) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

fn selected<'a, A>(files: &'a [PathBuf], accept: A) -> impl Iterator<Item = &'a PathBuf> + 'a
where
    A: Fn(&str) -> bool + 'a,
{
    files.iter().filter(move |path| {
        let keep = accept(&file_name(path));
        if !keep {
            tracing::debug!("Ignoring {}", path.display());
        }
        keep
    })
}

/// Parses every accepted file as `T` rows. `emit` stores one row and returns
/// the number of records it produced.
fn load_delimited<T, A, E>(
    files: &[PathBuf],
    accept: A,
    dialect: fn(&Path) -> Dialect,
    config: &LoadConfig,
    mut emit: E,
) -> LoadResult<LoadStats>
where
    T: DelimitedRecord,
    A: Fn(&str) -> bool,
    E: FnMut(T) -> usize,
{
    let mut total = LoadStats::default();
    for path in selected(files, accept) {
        tracing::debug!("Loading {}", path.display());
        let parser = DelimitedParser::<_, T>::from_path(path, dialect(path), config.clone())?;

        let mut produced = 0;
        let mut stats = parser.for_each(|row| produced += emit(row))?;
        stats.records = produced;

        tracing::debug!("{}: {}", file_name(path), stats);
        total.merge(&stats);
    }
    Ok(total)
}

/// Reads every accepted file line by line. `parse` receives the one-based
/// line number and the line without its terminator, and returns the number
/// of records it produced; zero counts the line as filtered.
///
/// Lines are decoded lossily; CMS files are not always UTF-8.
fn load_lines<A, P>(
    files: &[PathBuf],
    accept: A,
    config: &LoadConfig,
    mut parse: P,
) -> LoadResult<LoadStats>
where
    A: Fn(&str) -> bool,
    P: FnMut(usize, &str) -> LoadResult<usize>,
{
    let mut total = LoadStats::default();
    for path in selected(files, accept) {
        tracing::debug!("Loading {}", path.display());
        let file = File::open(path)?;
        let mut stats = LoadStats {
            files: 1,
            bytes: file.metadata()?.len(),
            ..Default::default()
        };

        let mut reader = BufReader::new(file);
        let mut buffer = Vec::new();
        let mut line_number = 0;
        loop {
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }
            line_number += 1;

            let line = String::from_utf8_lossy(&buffer);
            let line = line.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                continue;
            }
            stats.rows += 1;

            match parse(line_number, line) {
                Ok(0) => stats.filtered += 1,
                Ok(records) => stats.records += records,
                Err(e) => {
                    stats.malformed += 1;
                    if stats.malformed <= config.malformed_log_limit {
                        tracing::warn!("{}: skipping line {}: {}", path.display(), line_number, e);
                    }
                }
            }
        }

        if stats.malformed > config.malformed_log_limit {
            tracing::warn!("{}: skipped {} malformed lines in total", path.display(), stats.malformed);
        }
        tracing::debug!("{}: {}", file_name(path), stats);
        total.merge(&stats);
    }
    Ok(total)
}

/// Inserts a `.` after `position` characters when the code is longer.
fn dotted(code: &str, position: usize) -> String {
    if code.len() > position && code.is_char_boundary(position) {
        format!("{}.{}", &code[..position], &code[position..])
    } else {
        code.to_string()
    }
}
