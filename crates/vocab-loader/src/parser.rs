//! Generic delimited file parser.
//!
//! Provides a streaming parser for the tab-, comma- and pipe-delimited files
//! vocabulary distributions ship in. Columns are resolved by header name when
//! the file has a header row and by position otherwise.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::marker::PhantomData;
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecord};
use vocab_types::SctId;

use crate::types::{LoadConfig, LoadError, LoadResult, LoadStats};

/// Delimiter, header and quoting conventions of one file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    /// Field delimiter.
    pub delimiter: u8,
    /// Whether the first row names the columns.
    pub has_headers: bool,
    /// Whether fields may be wrapped in double quotes.
    pub quoting: bool,
}

impl Dialect {
    /// SNOMED CT RF2: tab-delimited, header row, quotes are literal text.
    pub const RF2: Dialect = Dialect {
        delimiter: b'\t',
        has_headers: true,
        quoting: false,
    };

    /// Quoted comma-separated values with a header row (LOINC, CSV exports).
    pub const CSV: Dialect = Dialect {
        delimiter: b',',
        has_headers: true,
        quoting: true,
    };

    /// Tab-separated exports with a header row.
    pub const TSV: Dialect = Dialect {
        delimiter: b'\t',
        has_headers: true,
        quoting: false,
    };

    /// UMLS Rich Release Format: pipe-delimited, no header.
    pub const RRF: Dialect = Dialect {
        delimiter: b'|',
        has_headers: false,
        quoting: false,
    };

    /// Picks CSV for `.csv` files and TSV for everything else.
    pub fn for_export<P: AsRef<Path>>(path: P) -> Dialect {
        let is_csv = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv {
            Self::CSV
        } else {
            Self::TSV
        }
    }
}

/// Trait for types that can be parsed from delimited rows.
pub trait DelimitedRecord: Sized {
    /// Columns this record type reads. For headerless dialects these are
    /// the names of the leading columns, in order.
    const COLUMNS: &'static [&'static str];

    /// Parse a record from a row.
    fn from_record(record: &StringRecord, columns: &Columns) -> LoadResult<Self>;

    /// Returns true if this record passes the given filter config.
    fn passes_filter(&self, _config: &LoadConfig) -> bool {
        true
    }
}

/// Resolves column names to field positions.
#[derive(Debug, Clone, Default)]
pub struct Columns {
    positions: HashMap<&'static str, usize>,
}

impl Columns {
    /// Maps each name to its position in `names`.
    pub fn positional(names: &'static [&'static str]) -> Self {
        Self {
            positions: names.iter().enumerate().map(|(i, name)| (*name, i)).collect(),
        }
    }

    /// Locates every required name in a header row, ignoring ASCII case,
    /// surrounding whitespace and a leading byte-order mark.
    pub fn from_headers(
        headers: &StringRecord,
        required: &'static [&'static str],
        path: &str,
    ) -> LoadResult<Self> {
        let found: Vec<String> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_ascii_lowercase())
            .collect();

        let mut positions = HashMap::with_capacity(required.len());
        for name in required {
            let wanted = name.to_ascii_lowercase();
            let index = found
                .iter()
                .position(|h| *h == wanted)
                .ok_or_else(|| LoadError::MissingColumn {
                    column: name.to_string(),
                    path: path.to_string(),
                })?;
            positions.insert(*name, index);
        }
        Ok(Self { positions })
    }

    /// Returns the raw field for `column`, or an empty string when the row is
    /// shorter than the header.
    pub fn get<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        self.positions
            .get(column)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
    }

    /// Returns the trimmed field for `column`, failing if it is empty.
    pub fn required<'r>(&self, record: &'r StringRecord, column: &str) -> LoadResult<&'r str> {
        let value = self.get(record, column).trim();
        if value.is_empty() {
            return Err(LoadError::MissingField {
                column: column.to_string(),
            });
        }
        Ok(value)
    }
}

/// A streaming parser for delimited files.
///
/// This parser reads files record-by-record to avoid loading entire files
/// into memory. Rows that fail to parse are counted and logged, not returned.
pub struct DelimitedParser<R: Read, T: DelimitedRecord> {
    reader: Reader<R>,
    columns: Columns,
    config: LoadConfig,
    source: String,
    stats: LoadStats,
    _marker: PhantomData<T>,
}

impl<T: DelimitedRecord> DelimitedParser<BufReader<File>, T> {
    /// Creates a new parser from a file path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or lacks a required column.
    pub fn from_path<P: AsRef<Path>>(path: P, dialect: Dialect, config: LoadConfig) -> LoadResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(LoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let file = File::open(path)?;
        let bytes = file.metadata()?.len();
        let mut parser = Self::from_reader(BufReader::new(file), dialect, config, &path.display().to_string())?;
        parser.stats.bytes = bytes;
        Ok(parser)
    }
}

impl<R: Read, T: DelimitedRecord> DelimitedParser<R, T> {
    /// Creates a new parser from a reader. `source` names the input in errors.
    pub fn from_reader(reader: R, dialect: Dialect, config: LoadConfig, source: &str) -> LoadResult<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(dialect.delimiter)
            .has_headers(dialect.has_headers)
            .quoting(dialect.quoting)
            .flexible(true)
            .trim(csv::Trim::None)
            .from_reader(reader);

        let columns = if dialect.has_headers {
            Columns::from_headers(csv_reader.headers()?, T::COLUMNS, source)?
        } else {
            Columns::positional(T::COLUMNS)
        };

        Ok(Self {
            reader: csv_reader,
            columns,
            config,
            source: source.to_string(),
            stats: LoadStats {
                files: 1,
                ..Default::default()
            },
            _marker: PhantomData,
        })
    }

    /// Feeds every parsed record that passes the filter to `sink`.
    ///
    /// Malformed rows are counted and skipped. I/O failures abort the file.
    pub fn for_each<F>(mut self, mut sink: F) -> LoadResult<LoadStats>
    where
        F: FnMut(T),
    {
        let mut record = StringRecord::new();
        loop {
            match self.reader.read_record(&mut record) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    self.note_malformed(&e.to_string());
                    continue;
                }
            }

            // Skip empty records
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            self.stats.rows += 1;

            match T::from_record(&record, &self.columns) {
                Ok(parsed) if parsed.passes_filter(&self.config) => {
                    self.stats.records += 1;
                    sink(parsed);
                }
                Ok(_) => self.stats.filtered += 1,
                Err(e) => self.note_malformed(&e.to_string()),
            }
        }

        if self.stats.malformed > self.config.malformed_log_limit {
            tracing::warn!(
                "{}: skipped {} malformed rows in total",
                self.source,
                self.stats.malformed
            );
        }
        Ok(self.stats)
    }

    fn note_malformed(&mut self, reason: &str) {
        self.stats.malformed += 1;
        if self.stats.malformed <= self.config.malformed_log_limit {
            tracing::warn!(
                "{}: skipping malformed row {}: {}",
                self.source,
                self.stats.rows + self.stats.malformed,
                reason
            );
        }
    }
}

/// Helper functions for parsing field values.
pub mod parse {
    use super::{LoadError, LoadResult, SctId};

    /// Parses an SCTID from a string.
    pub fn sctid(value: &str) -> LoadResult<SctId> {
        value.parse::<u64>().map_err(|_| LoadError::InvalidSctId {
            value: value.to_string(),
        })
    }

    /// Parses a boolean from "0" or "1".
    pub fn boolean(value: &str) -> LoadResult<bool> {
        match value {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(LoadError::InvalidBoolean {
                value: value.to_string(),
            }),
        }
    }

    /// Parses an effective time (YYYYMMDD) as u32.
    pub fn effective_time(value: &str) -> LoadResult<u32> {
        if value.len() != 8 {
            return Err(LoadError::InvalidDate {
                value: value.to_string(),
            });
        }
        value.parse::<u32>().map_err(|_| LoadError::InvalidDate {
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Row {
        code: String,
        name: String,
    }

    impl DelimitedRecord for Row {
        const COLUMNS: &'static [&'static str] = &["code", "name"];

        fn from_record(record: &StringRecord, columns: &Columns) -> LoadResult<Self> {
            Ok(Row {
                code: columns.required(record, "code")?.to_string(),
                name: columns.get(record, "name").to_string(),
            })
        }

        fn passes_filter(&self, _config: &LoadConfig) -> bool {
            !self.code.starts_with('X')
        }
    }

    fn collect(input: &str, dialect: Dialect) -> LoadResult<(Vec<Row>, LoadStats)> {
        let parser = DelimitedParser::<_, Row>::from_reader(
            input.as_bytes(),
            dialect,
            LoadConfig::default(),
            "test",
        )?;
        let mut rows = Vec::new();
        let stats = parser.for_each(|row| rows.push(row))?;
        Ok((rows, stats))
    }

    #[test]
    fn test_columns_resolved_by_header_name() {
        let (rows, stats) = collect("\u{feff}Name\tCODE\nfirst\t1\nsecond\t2\n", Dialect::TSV).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].code, "1");
        assert_eq!(rows[0].name, "first");
        assert_eq!(stats.records, 2);
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let result = collect("name\nfirst\n", Dialect::TSV);
        assert!(matches!(result, Err(LoadError::MissingColumn { .. })));
    }

    #[test]
    fn test_malformed_and_filtered_rows_are_counted() {
        let (rows, stats) = collect("code,name\n,empty\nX1,filtered\n7,\"quoted, name\"\n", Dialect::CSV).unwrap();
        assert_eq!(rows, vec![Row { code: "7".to_string(), name: "quoted, name".to_string() }]);
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.filtered, 1);
    }

    #[test]
    fn test_headerless_dialect_is_positional() {
        let (rows, _) = collect("5|five|\n6|six|\n", Dialect::RRF).unwrap();
        assert_eq!(rows[1].code, "6");
        assert_eq!(rows[1].name, "six");
    }

    #[test]
    fn test_dialect_for_export() {
        assert_eq!(Dialect::for_export("members.CSV"), Dialect::CSV);
        assert_eq!(Dialect::for_export("members.txt"), Dialect::TSV);
    }

    #[test]
    fn test_parse_sctid() {
        assert_eq!(parse::sctid("404684003").unwrap(), 404684003u64);
        assert!(parse::sctid("not_a_number").is_err());
        assert!(parse::sctid("").is_err());
    }

    #[test]
    fn test_parse_boolean() {
        assert!(!parse::boolean("0").unwrap());
        assert!(parse::boolean("1").unwrap());
        assert!(parse::boolean("true").is_err());
    }

    #[test]
    fn test_parse_effective_time() {
        assert_eq!(parse::effective_time("20250301").unwrap(), 20250301u32);
        assert!(parse::effective_time("2020-01-31").is_err());
    }
}
