//! PHIN VADS value-set export loader.

use std::path::PathBuf;

use csv::StringRecord;
use vocab_types::{PhinVadsValueSet, ValueSetKind, ValueSetRecord};

use super::{has_extension, load_delimited};
use crate::parser::{Columns, DelimitedRecord, Dialect};
use crate::registry::Loader;
use crate::store::ValueSetPartition;
use crate::types::{LoadConfig, LoadResult, LoadStats};

impl DelimitedRecord for PhinVadsValueSet {
    const COLUMNS: &'static [&'static str] = &[
        "Value Set Name",
        "Value Set OID",
        "Value Set Version",
        "Concept Code",
        "Concept Name",
        "Code System Name",
        "Code System OID",
    ];

    fn from_record(record: &StringRecord, columns: &Columns) -> LoadResult<Self> {
        Ok(PhinVadsValueSet {
            value_set_id: columns.required(record, "Value Set OID")?.to_string(),
            value_set_name: columns.get(record, "Value Set Name").trim().to_string(),
            value_set_version: columns.get(record, "Value Set Version").trim().to_string(),
            code: columns.required(record, "Concept Code")?.to_string(),
            description: columns.get(record, "Concept Name").trim().to_string(),
            code_system_id: columns.required(record, "Code System OID")?.to_string(),
            code_system_name: columns.get(record, "Code System Name").trim().to_string(),
        })
    }
}

/// Loads PHIN VADS value-set exports.
#[derive(Debug, Clone, Default)]
pub struct PhinVadsLoader {
    config: LoadConfig,
}

impl Loader for PhinVadsLoader {
    type Target = ValueSetPartition;

    fn identifier(&self) -> &str {
        ValueSetKind::PhinVads.authority_name()
    }

    fn load(&self, files: &[PathBuf], target: &mut ValueSetPartition) -> LoadResult<LoadStats> {
        load_delimited(
            files,
            |name| has_extension(name, &["txt", "tsv", "csv"]),
            |path| Dialect::for_export(path),
            &self.config,
            |row: PhinVadsValueSet| {
                target.insert(ValueSetRecord::PhinVads(row));
                1
            },
        )
    }
}
