//! RxNorm concept names (`RXNCONSO.RRF`).

use std::path::PathBuf;

use csv::StringRecord;
use vocab_types::{well_known, CodeRecord, RxNormCode};

use super::load_delimited;
use crate::parser::{Columns, DelimitedRecord, Dialect};
use crate::registry::Loader;
use crate::store::CodePartition;
use crate::types::{LoadConfig, LoadResult, LoadStats};

/// Source abbreviation of RxNorm's own atoms.
const RXNORM_SAB: &str = "RXNORM";

/// `SUPPRESS` value of atoms that are not suppressed.
const NOT_SUPPRESSED: &str = "N";

struct ConsoRow {
    rxcui: String,
    rxaui: String,
    sab: String,
    tty: String,
    name: String,
    suppress: String,
}

impl DelimitedRecord for ConsoRow {
    const COLUMNS: &'static [&'static str] = &[
        "RXCUI", "LAT", "TS", "LUI", "STT", "SUI", "ISPREF", "RXAUI", "SAUI", "SCUI", "SDUI",
        "SAB", "TTY", "CODE", "STR", "SRL", "SUPPRESS", "CVF",
    ];

    fn from_record(record: &StringRecord, columns: &Columns) -> LoadResult<Self> {
        Ok(ConsoRow {
            rxcui: columns.required(record, "RXCUI")?.to_string(),
            rxaui: columns.get(record, "RXAUI").to_string(),
            sab: columns.get(record, "SAB").to_string(),
            tty: columns.get(record, "TTY").to_string(),
            name: columns.required(record, "STR")?.to_string(),
            suppress: columns.get(record, "SUPPRESS").to_string(),
        })
    }

    fn passes_filter(&self, _config: &LoadConfig) -> bool {
        self.sab == RXNORM_SAB && self.suppress == NOT_SUPPRESSED
    }
}

impl From<ConsoRow> for RxNormCode {
    fn from(row: ConsoRow) -> Self {
        RxNormCode {
            code: row.rxcui,
            display_name: row.name,
            term_type: row.tty,
            rxaui: row.rxaui,
        }
    }
}

/// Loads RxNorm concept names from `RXNCONSO.RRF`.
#[derive(Debug, Clone, Default)]
pub struct RxNormLoader {
    config: LoadConfig,
}

impl Loader for RxNormLoader {
    type Target = CodePartition;

    fn identifier(&self) -> &str {
        well_known::RXNORM_OID
    }

    fn load(&self, files: &[PathBuf], target: &mut CodePartition) -> LoadResult<LoadStats> {
        load_delimited(
            files,
            |name| name.eq_ignore_ascii_case("RXNCONSO.RRF"),
            |_| Dialect::RRF,
            &self.config,
            |row: ConsoRow| {
                target.insert(CodeRecord::RxNorm(row.into()));
                1
            },
        )
    }
}
