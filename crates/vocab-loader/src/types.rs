//! Loader-specific types for vocabulary file processing.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use vocab_types::DescriptionType;

/// Errors that can occur while loading vocabulary distribution files.
#[derive(Error, Debug)]
pub enum LoadError {
    /// I/O error reading a source file or directory.
    #[error("IO error reading vocabulary source: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error.
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid SCTID format.
    #[error("Invalid SCTID format: {value}")]
    InvalidSctId {
        /// The invalid value that was encountered.
        value: String,
    },

    /// Missing required column in a delimited file.
    #[error("Missing required column '{column}' in {path}")]
    MissingColumn {
        /// The name of the missing column.
        column: String,
        /// The file that was being read.
        path: String,
    },

    /// A row is missing a field the record type requires.
    #[error("Missing value for '{column}'")]
    MissingField {
        /// The column whose value was empty or absent.
        column: String,
    },

    /// Invalid date format.
    #[error("Invalid date format: {value}")]
    InvalidDate {
        /// The invalid date value.
        value: String,
    },

    /// Invalid boolean value.
    #[error("Invalid boolean value: {value} (expected 0 or 1)")]
    InvalidBoolean {
        /// The invalid boolean value.
        value: String,
    },

    /// A fixed-width line is too short to hold the expected fields.
    #[error("Malformed line {line}: {reason}")]
    MalformedLine {
        /// One-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Directory not found.
    #[error("Directory not found: {path}")]
    DirectoryNotFound {
        /// The path that was not found.
        path: String,
    },

    /// A configured source root is a file rather than a directory.
    #[error("Directory to load is a file and not a directory: {path}")]
    NotADirectory {
        /// The offending path.
        path: String,
    },

    /// A loader failed while reading one source directory.
    #[error("Loader '{loader}' failed for source directory '{directory}': {source}")]
    Source {
        /// Name of the source subdirectory.
        directory: String,
        /// Identifier of the loader that failed.
        loader: String,
        /// Underlying failure.
        #[source]
        source: Box<LoadError>,
    },
}

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Configuration shared by all loaders.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Whether to keep active records only, for formats that flag activity.
    pub active_only: bool,
    /// Number of malformed rows logged individually per file before the
    /// loader switches to a summary count.
    pub malformed_log_limit: usize,
    /// SNOMED CT description types to keep. `None` keeps every type.
    pub description_types: Option<Vec<DescriptionType>>,
}

impl LoadConfig {
    /// Returns true if descriptions of `description_type` should be loaded.
    /// Unknown types only pass when no type filter is set.
    pub fn keeps_description_type(&self, description_type: Option<DescriptionType>) -> bool {
        match (&self.description_types, description_type) {
            (None, _) => true,
            (Some(kept), Some(found)) => kept.contains(&found),
            (Some(_), None) => false,
        }
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            active_only: true,
            malformed_log_limit: 10,
            description_types: None,
        }
    }
}

/// Statistics from loading one or more files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Files the loader consumed.
    pub files: usize,
    /// Bytes in those files.
    pub bytes: u64,
    /// Data rows read.
    pub rows: usize,
    /// Records written into the target partition.
    pub records: usize,
    /// Rows dropped by filters (inactive, wrong source, etc.).
    pub filtered: usize,
    /// Rows that could not be parsed (non-fatal).
    pub malformed: usize,
}

impl LoadStats {
    /// Adds another set of statistics into this one.
    pub fn merge(&mut self, other: &LoadStats) {
        self.files += other.files;
        self.bytes += other.bytes;
        self.rows += other.rows;
        self.records += other.records;
        self.filtered += other.filtered;
        self.malformed += other.malformed;
    }
}

impl fmt::Display for LoadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records from {} rows in {} files ({}), {} filtered, {} malformed",
            self.records,
            self.rows,
            self.files,
            crate::loader::format_bytes(self.bytes),
            self.filtered,
            self.malformed
        )
    }
}

/// The two independent reload streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Code system vocabularies.
    Code,
    /// Value sets.
    ValueSet,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code => f.write_str("code"),
            Self::ValueSet => f.write_str("value set"),
        }
    }
}

/// One immediate subdirectory of a source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDirectory {
    /// Directory name, used as the loader lookup key.
    pub name: String,
    /// Full path to the directory.
    pub path: PathBuf,
    /// Regular files directly inside the directory, sorted by name.
    pub files: Vec<PathBuf>,
}
