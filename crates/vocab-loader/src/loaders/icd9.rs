//! ICD-9-CM description files as published by CMS.
//!
//! Each line is an undotted code, whitespace, then the description:
//!
//! ```text
//! 4019    Unspecified essential hypertension
//! ```

use std::path::PathBuf;

use vocab_types::{CodeRecord, CodeSystemKind, Icd9Code};

use super::{dotted, has_extension, load_lines};
use crate::registry::Loader;
use crate::store::CodePartition;
use crate::types::{LoadConfig, LoadError, LoadResult, LoadStats};

/// Loads ICD-9-CM diagnosis or procedure descriptions.
#[derive(Debug, Clone)]
pub struct Icd9Loader {
    kind: CodeSystemKind,
    config: LoadConfig,
}

impl Icd9Loader {
    /// Creates a loader for [`CodeSystemKind::Icd9CmDx`] or
    /// [`CodeSystemKind::Icd9CmSg`].
    pub fn new(kind: CodeSystemKind) -> Self {
        debug_assert!(matches!(kind, CodeSystemKind::Icd9CmDx | CodeSystemKind::Icd9CmSg));
        Self {
            kind,
            config: LoadConfig::default(),
        }
    }

    /// Restores the conventional dot. Diagnoses take it after three
    /// characters (four for E codes), procedures after two.
    fn format_code(&self, raw: &str) -> String {
        match self.kind {
            CodeSystemKind::Icd9CmSg => dotted(raw, 2),
            _ if raw.starts_with('E') => dotted(raw, 4),
            _ => dotted(raw, 3),
        }
    }

    fn parse_line(&self, line_number: usize, line: &str) -> LoadResult<Icd9Code> {
        let (code, description) = line
            .trim()
            .split_once(char::is_whitespace)
            .ok_or_else(|| LoadError::MalformedLine {
                line: line_number,
                reason: "expected a code followed by a description".to_string(),
            })?;

        Ok(Icd9Code {
            code: self.format_code(code),
            display_name: description.trim().to_string(),
        })
    }

    fn record(&self, code: Icd9Code) -> CodeRecord {
        match self.kind {
            CodeSystemKind::Icd9CmSg => CodeRecord::Icd9CmSg(code),
            _ => CodeRecord::Icd9CmDx(code),
        }
    }
}

impl Loader for Icd9Loader {
    type Target = CodePartition;

    fn identifier(&self) -> &str {
        self.kind.code_system_id()
    }

    fn load(&self, files: &[PathBuf], target: &mut CodePartition) -> LoadResult<LoadStats> {
        load_lines(
            files,
            |name| has_extension(name, &["txt"]),
            &self.config,
            |line_number, line| {
                let code = self.parse_line(line_number, line)?;
                target.insert(self.record(code));
                Ok(1)
            },
        )
    }
}
