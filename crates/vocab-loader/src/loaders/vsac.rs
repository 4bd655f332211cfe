//! VSAC value-set export loader.
//!
//! Reads the expansion exports as tab-separated (`.txt`, `.tsv`) or
//! comma-separated (`.csv`) files with a header row.

use std::path::PathBuf;

use csv::StringRecord;
use vocab_types::{ValueSetKind, ValueSetRecord, VsacValueSet};

use super::{has_extension, load_delimited};
use crate::parser::{Columns, DelimitedRecord, Dialect};
use crate::registry::Loader;
use crate::store::ValueSetPartition;
use crate::types::{LoadConfig, LoadResult, LoadStats};

impl DelimitedRecord for VsacValueSet {
    const COLUMNS: &'static [&'static str] = &[
        "Value Set Name",
        "Value Set OID",
        "Code",
        "Description",
        "Code System",
        "Code System OID",
        "Code System Version",
    ];

    fn from_record(record: &StringRecord, columns: &Columns) -> LoadResult<Self> {
        Ok(VsacValueSet {
            value_set_id: columns.required(record, "Value Set OID")?.to_string(),
            value_set_name: columns.get(record, "Value Set Name").trim().to_string(),
            code: columns.required(record, "Code")?.to_string(),
            description: columns.get(record, "Description").trim().to_string(),
            code_system_id: columns.required(record, "Code System OID")?.to_string(),
            code_system_name: columns.get(record, "Code System").trim().to_string(),
            code_system_version: columns.get(record, "Code System Version").trim().to_string(),
        })
    }
}

/// Loads VSAC value-set exports.
#[derive(Debug, Clone, Default)]
pub struct VsacLoader {
    config: LoadConfig,
}

impl Loader for VsacLoader {
    type Target = ValueSetPartition;

    fn identifier(&self) -> &str {
        ValueSetKind::Vsac.authority_name()
    }

    fn load(&self, files: &[PathBuf], target: &mut ValueSetPartition) -> LoadResult<LoadStats> {
        load_delimited(
            files,
            |name| has_extension(name, &["txt", "tsv", "csv"]),
            |path| Dialect::for_export(path),
            &self.config,
            |row: VsacValueSet| {
                target.insert(ValueSetRecord::Vsac(row));
                1
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Partition;
    use std::fs;

    #[test]
    fn test_loads_tab_and_comma_exports() {
        let dir = tempfile::tempdir().unwrap();
        let tsv = dir.path().join("hypertension.txt");
        fs::write(
            &tsv,
            "Value Set Name\tValue Set OID\tDefinition Version\tCode\tDescription\tCode System\tCode System OID\tCode System Version\n\
             Essential Hypertension\t2.16.840.1.113883.3.464.1003.104.12.1011\t20170504\tI10\tEssential (primary) hypertension\tICD10CM\t2.16.840.1.113883.6.90\t2024\n\
             Essential Hypertension\t2.16.840.1.113883.3.464.1003.104.12.1011\t20170504\t59621000\tEssential hypertension (disorder)\tSNOMEDCT\t2.16.840.1.113883.6.96\t2024-03\n",
        )
        .unwrap();
        let csv = dir.path().join("diabetes.csv");
        fs::write(
            &csv,
            "Value Set Name,Value Set OID,Code,Description,Code System,Code System OID,Code System Version\n\
             Diabetes,2.16.840.1.113883.3.464.1003.103.12.1001,E11.9,\"Type 2 diabetes mellitus, without complications\",ICD10CM,2.16.840.1.113883.6.90,2024\n",
        )
        .unwrap();
        let ignored = dir.path().join("README.pdf");
        fs::write(&ignored, "").unwrap();

        let mut partition = ValueSetPartition::new();
        let stats = VsacLoader::default()
            .load(&[csv, tsv, ignored], &mut partition)
            .unwrap();

        assert_eq!(stats.files, 2);
        assert_eq!(stats.records, 3);
        assert_eq!(partition.record_count(), 3);
        assert_eq!(partition.table(ValueSetKind::Vsac).unwrap().len(), 3);
    }

    #[test]
    fn test_missing_header_fails_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.txt");
        fs::write(&path, "Value Set Name\tCode\nX\t1\n").unwrap();

        let mut partition = ValueSetPartition::new();
        assert!(matches!(
            VsacLoader::default().load(&[path], &mut partition),
            Err(crate::LoadError::MissingColumn { .. })
        ));
    }
}
