//! # vocab-types
//!
//! Type definitions for clinical code and value-set validation.
//!
//! This crate provides the records the vocabulary store holds (one code
//! record variant per code system, one value-set record variant per value-set
//! source), the definitions binding code system OIDs to record kinds, the
//! static code system name table, and the validation result aggregates.
//!
//! ## Features
//!
//! - `serde` (default): Enables serialization/deserialization support via serde.
//!
//! ## Usage
//!
//! ```rust
//! use vocab_types::{CodeModel, CodeRecord, CodeSystemKind, SnomedCode};
//! use vocab_types::well_known;
//!
//! let record = CodeRecord::Snomed(SnomedCode {
//!     code: "38341003".to_string(),
//!     display_name: "Hypertension".to_string(),
//!     concept_id: 38341003,
//!     description_id: 64176011,
//!     type_id: 900000000000013009,
//! });
//!
//! assert_eq!(record.kind(), CodeSystemKind::Snomed);
//! assert_eq!(record.code_system_id(), well_known::SNOMED_CT_OID);
//! assert_eq!(record.display_name(), "Hypertension");
//! ```

#![warn(missing_docs)]

mod code;
mod definition;
mod description;
mod enums;
mod result;
mod sctid;
mod value_set;
pub mod well_known;

// Re-export all public types at crate root
pub use code::{
    CodeModel, CodeRecord, Icd10Code, Icd9Code, LoincCode, LoincNameKind, RxNormCode, SnomedCode,
};
pub use definition::VocabularyDefinition;
pub use description::Rf2Description;
pub use enums::{CodeSystemKind, DescriptionType, ValueSetKind};
pub use result::{CodeValidationResult, ValueSetValidationResult};
pub use sctid::SctId;
pub use value_set::{
    CodeSystemProjection, PhinVadsValueSet, ValueSetModel, ValueSetRecord, VsacValueSet,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_are_exported() {
        let _id: SctId = 38341003;
        let _kind = CodeSystemKind::Snomed;
        let _variant = ValueSetKind::Vsac;
        let _desc_type = DescriptionType::Fsn;
        let _name_kind = LoincNameKind::LongCommonName;
    }

    #[test]
    fn test_well_known_accessible() {
        assert_eq!(well_known::SNOMED_CT_OID, "2.16.840.1.113883.6.96");
        assert_eq!(well_known::LOINC_OID, "2.16.840.1.113883.6.1");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let record = ValueSetRecord::PhinVads(PhinVadsValueSet {
            value_set_id: "2.16.840.1.114222.4.11.1066".to_string(),
            value_set_name: "Race Category (CDC)".to_string(),
            value_set_version: "1".to_string(),
            code: "2106-3".to_string(),
            description: "White".to_string(),
            code_system_id: "2.16.840.1.113883.6.238".to_string(),
            code_system_name: "Race & Ethnicity - CDC".to_string(),
        });

        let json = serde_json::to_string(&record).unwrap();
        let parsed: ValueSetRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, parsed);
    }
}
