//! LOINC table loader (`Loinc.csv`).

use std::path::PathBuf;

use csv::StringRecord;
use vocab_types::{well_known, CodeRecord, LoincCode, LoincNameKind};

use super::load_delimited;
use crate::parser::{Columns, DelimitedRecord, Dialect};
use crate::registry::Loader;
use crate::store::CodePartition;
use crate::types::{LoadConfig, LoadResult, LoadStats};

/// One row of the LOINC table, limited to the columns we keep.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LoincRow {
    loinc_num: String,
    component: String,
    property: String,
    system: String,
    scale_type: String,
    short_name: String,
    long_common_name: String,
    status: String,
}

impl DelimitedRecord for LoincRow {
    const COLUMNS: &'static [&'static str] = &[
        "LOINC_NUM",
        "COMPONENT",
        "PROPERTY",
        "SYSTEM",
        "SCALE_TYP",
        "SHORTNAME",
        "LONG_COMMON_NAME",
        "STATUS",
    ];

    fn from_record(record: &StringRecord, columns: &Columns) -> LoadResult<Self> {
        let text = |column: &str| columns.get(record, column).trim().to_string();
        Ok(LoincRow {
            loinc_num: columns.required(record, "LOINC_NUM")?.to_string(),
            component: text("COMPONENT"),
            property: text("PROPERTY"),
            system: text("SYSTEM"),
            scale_type: text("SCALE_TYP"),
            short_name: text("SHORTNAME"),
            long_common_name: text("LONG_COMMON_NAME"),
            status: text("STATUS"),
        })
    }

    /// Deprecated terms are dropped when loading active content only.
    fn passes_filter(&self, config: &LoadConfig) -> bool {
        !config.active_only || !self.status.eq_ignore_ascii_case("DEPRECATED")
    }
}

impl LoincRow {
    /// One record per distinct non-empty name, long common name first.
    fn into_records(self) -> Vec<CodeRecord> {
        let names = [
            (LoincNameKind::LongCommonName, &self.long_common_name),
            (LoincNameKind::ShortName, &self.short_name),
            (LoincNameKind::Component, &self.component),
        ];

        let mut seen: Vec<&str> = Vec::with_capacity(names.len());
        let mut records = Vec::with_capacity(names.len());
        for (name_kind, name) in names {
            if name.is_empty() || seen.contains(&name.as_str()) {
                continue;
            }
            seen.push(name);
            records.push(CodeRecord::Loinc(LoincCode {
                code: self.loinc_num.clone(),
                display_name: name.clone(),
                name_kind,
                property: self.property.clone(),
                system: self.system.clone(),
                scale_type: self.scale_type.clone(),
            }));
        }
        records
    }
}

fn is_loinc_table(name: &str) -> bool {
    name.eq_ignore_ascii_case("Loinc.csv")
}

/// Loads the LOINC table.
#[derive(Debug, Clone, Default)]
pub struct LoincLoader {
    config: LoadConfig,
}

impl Loader for LoincLoader {
    type Target = CodePartition;

    fn identifier(&self) -> &str {
        well_known::LOINC_OID
    }

    fn load(&self, files: &[PathBuf], target: &mut CodePartition) -> LoadResult<LoadStats> {
        load_delimited(files, is_loinc_table, |_| Dialect::CSV, &self.config, |row: LoincRow| {
            let records = row.into_records();
            let produced = records.len();
            target.extend(records);
            produced
        })
    }
}
