//! SNOMED CT Description file loader.
//!
//! Parses sct2_Description_*.txt RF2 files. Every active description becomes
//! one code record keyed by its concept identifier. [`LoadConfig::description_types`]
//! narrows the load to, say, synonyms only.

use std::path::PathBuf;

use csv::StringRecord;
use vocab_types::{well_known, CodeRecord, Rf2Description, SnomedCode};

use super::{has_extension, load_delimited};
use crate::parser::{parse, Columns, DelimitedRecord, Dialect};
use crate::registry::Loader;
use crate::store::CodePartition;
use crate::types::{LoadConfig, LoadResult, LoadStats};

/// Expected columns in a description file.
const DESCRIPTION_COLUMNS: &[&str] = &[
    "id",
    "effectiveTime",
    "active",
    "moduleId",
    "conceptId",
    "languageCode",
    "typeId",
    "term",
    "caseSignificanceId",
];

impl DelimitedRecord for Rf2Description {
    const COLUMNS: &'static [&'static str] = DESCRIPTION_COLUMNS;

    fn from_record(record: &StringRecord, columns: &Columns) -> LoadResult<Self> {
        Ok(Rf2Description {
            id: parse::sctid(columns.get(record, "id"))?,
            effective_time: parse::effective_time(columns.get(record, "effectiveTime"))?,
            active: parse::boolean(columns.get(record, "active"))?,
            module_id: parse::sctid(columns.get(record, "moduleId"))?,
            concept_id: parse::sctid(columns.get(record, "conceptId"))?,
            language_code: columns.get(record, "languageCode").to_string(),
            type_id: parse::sctid(columns.get(record, "typeId"))?,
            term: columns.required(record, "term")?.to_string(),
            case_significance_id: parse::sctid(columns.get(record, "caseSignificanceId"))?,
        })
    }

    fn passes_filter(&self, config: &LoadConfig) -> bool {
        (!config.active_only || self.active) && config.keeps_description_type(self.description_type())
    }
}

fn is_description_file(name: &str) -> bool {
    name.starts_with("sct2_Description") && has_extension(name, &["txt"])
}

/// Loads RF2 description files.
#[derive(Debug, Clone, Default)]
pub struct SnomedLoader {
    config: LoadConfig,
}

impl SnomedLoader {
    /// Creates a loader with the given configuration.
    pub fn new(config: LoadConfig) -> Self {
        Self { config }
    }
}

impl Loader for SnomedLoader {
    type Target = CodePartition;

    fn identifier(&self) -> &str {
        well_known::SNOMED_CT_OID
    }

    fn load(&self, files: &[PathBuf], target: &mut CodePartition) -> LoadResult<LoadStats> {
        load_delimited(files, is_description_file, |_| Dialect::RF2, &self.config, |row: Rf2Description| {
            target.insert(CodeRecord::Snomed(SnomedCode::from(row)));
            1
        })
    }
}
