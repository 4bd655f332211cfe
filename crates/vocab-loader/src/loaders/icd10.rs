//! ICD-10-CM and ICD-10-PCS order files.
//!
//! Fixed-width layout, zero-based byte offsets:
//!
//! | Field        | Range    |
//! |--------------|----------|
//! | order number | 0..5     |
//! | code         | 6..13    |
//! | header flag  | 14       |
//! | short name   | 16..76   |
//! | long name    | 77..     |
//!
//! The flag is `1` for codes valid for submission and `0` for headers.

use std::path::PathBuf;

use vocab_types::{CodeRecord, CodeSystemKind, Icd10Code};

use super::{dotted, has_extension, load_lines};
use crate::registry::Loader;
use crate::store::CodePartition;
use crate::types::{LoadConfig, LoadError, LoadResult, LoadStats};

const CODE: std::ops::Range<usize> = 6..13;
const FLAG: usize = 14;
const SHORT: std::ops::Range<usize> = 16..76;
const LONG_START: usize = 77;

#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderLine {
    code: String,
    billable: bool,
    short_name: String,
    long_name: String,
}

fn field(line: &str, range: std::ops::Range<usize>) -> Option<&str> {
    line.get(range).map(str::trim)
}

fn parse_order_line(line_number: usize, line: &str) -> LoadResult<OrderLine> {
    let malformed = |reason: &str| LoadError::MalformedLine {
        line: line_number,
        reason: reason.to_string(),
    };

    if line.len() <= LONG_START {
        return Err(malformed("line too short for the order file layout"));
    }

    let code = field(line, CODE).filter(|c| !c.is_empty()).ok_or_else(|| malformed("missing code"))?;
    let billable = match line.as_bytes()[FLAG] {
        b'1' => true,
        b'0' => false,
        _ => return Err(malformed("header flag must be 0 or 1")),
    };
    let short_name = field(line, SHORT).ok_or_else(|| malformed("unreadable short description"))?;
    let long_name = line
        .get(LONG_START..)
        .map(str::trim)
        .ok_or_else(|| malformed("unreadable long description"))?;

    Ok(OrderLine {
        code: code.to_string(),
        billable,
        short_name: short_name.to_string(),
        long_name: long_name.to_string(),
    })
}

/// Loads ICD-10-CM or ICD-10-PCS codes with both descriptions.
#[derive(Debug, Clone)]
pub struct Icd10Loader {
    kind: CodeSystemKind,
    config: LoadConfig,
}

impl Icd10Loader {
    /// Creates a loader for [`CodeSystemKind::Icd10Cm`] or
    /// [`CodeSystemKind::Icd10Pcs`].
    pub fn new(kind: CodeSystemKind) -> Self {
        debug_assert!(matches!(kind, CodeSystemKind::Icd10Cm | CodeSystemKind::Icd10Pcs));
        Self {
            kind,
            config: LoadConfig::default(),
        }
    }

    fn records(&self, line: OrderLine) -> Vec<CodeRecord> {
        let code = match self.kind {
            CodeSystemKind::Icd10Cm => dotted(&line.code, 3),
            _ => line.code,
        };

        let mut names = vec![line.long_name];
        if !line.short_name.is_empty() && line.short_name != names[0] {
            names.push(line.short_name);
        }

        names
            .into_iter()
            .map(|display_name| {
                let entry = Icd10Code {
                    code: code.clone(),
                    display_name,
                    billable: line.billable,
                };
                match self.kind {
                    CodeSystemKind::Icd10Cm => CodeRecord::Icd10Cm(entry),
                    _ => CodeRecord::Icd10Pcs(entry),
                }
            })
            .collect()
    }
}

fn is_order_file(name: &str) -> bool {
    name.to_ascii_lowercase().contains("order") && has_extension(name, &["txt"])
}

impl Loader for Icd10Loader {
    type Target = CodePartition;

    fn identifier(&self) -> &str {
        self.kind.code_system_id()
    }

    fn load(&self, files: &[PathBuf], target: &mut CodePartition) -> LoadResult<LoadStats> {
        load_lines(files, is_order_file, &self.config, |line_number, line| {
            let records = self.records(parse_order_line(line_number, line)?);
            let produced = records.len();
            target.extend(records);
            Ok(produced)
        })
    }
}
