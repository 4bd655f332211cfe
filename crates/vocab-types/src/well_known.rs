//! Well-known code system identifiers.
//!
//! This module provides the canonical OIDs of the supported code systems and
//! the process-wide table mapping recognized code system *names* to those
//! OIDs. A single OID may be reachable from several names.
//!
//! # Examples
//!
//! ```
//! use vocab_types::well_known;
//!
//! assert_eq!(well_known::oid_for_name("SNOMED-CT"), Some(well_known::SNOMED_CT_OID));
//!
//! let names: Vec<&str> = well_known::names_for_oid(well_known::LOINC_OID).collect();
//! assert_eq!(names, vec!["LOINC"]);
//! ```

// =============================================================================
// Code System OIDs
// =============================================================================

/// SNOMED CT - 2.16.840.1.113883.6.96.
pub const SNOMED_CT_OID: &str = "2.16.840.1.113883.6.96";

/// LOINC - 2.16.840.1.113883.6.1.
pub const LOINC_OID: &str = "2.16.840.1.113883.6.1";

/// RxNorm - 2.16.840.1.113883.6.88.
pub const RXNORM_OID: &str = "2.16.840.1.113883.6.88";

/// ICD-9-CM diagnoses - 2.16.840.1.113883.6.103.
pub const ICD9_CM_DX_OID: &str = "2.16.840.1.113883.6.103";

/// ICD-9-CM procedures - 2.16.840.1.113883.6.104.
pub const ICD9_CM_SG_OID: &str = "2.16.840.1.113883.6.104";

/// ICD-10-CM - 2.16.840.1.113883.6.90.
pub const ICD10_CM_OID: &str = "2.16.840.1.113883.6.90";

/// ICD-10-PCS - 2.16.840.1.113883.6.4.
pub const ICD10_PCS_OID: &str = "2.16.840.1.113883.6.4";

// =============================================================================
// Name Table
// =============================================================================

/// Recognized code system names and the OID each one maps to.
///
/// Name lookups are exact; OID comparisons made against this table by the
/// validation engine are case-insensitive.
pub const CODE_SYSTEM_NAMES: &[(&str, &str)] = &[
    ("SNOMED-CT", SNOMED_CT_OID),
    ("SNOMED CT", SNOMED_CT_OID),
    ("SNOMEDCT", SNOMED_CT_OID),
    ("LOINC", LOINC_OID),
    ("RXNORM", RXNORM_OID),
    ("RxNorm", RXNORM_OID),
    ("ICD-9-CM", ICD9_CM_DX_OID),
    ("ICD9CM", ICD9_CM_DX_OID),
    ("ICD-9-CM Procedures", ICD9_CM_SG_OID),
    ("ICD-10-CM", ICD10_CM_OID),
    ("ICD10CM", ICD10_CM_OID),
    ("ICD-10-PCS", ICD10_PCS_OID),
    ("ICD10PCS", ICD10_PCS_OID),
];

/// Returns the OID mapped to `name`, if the name is recognized.
pub fn oid_for_name(name: &str) -> Option<&'static str> {
    CODE_SYSTEM_NAMES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, oid)| *oid)
}

/// Returns every recognized name whose OID equals `oid`, ignoring ASCII case.
pub fn names_for_oid(oid: &str) -> impl Iterator<Item = &'static str> + '_ {
    CODE_SYSTEM_NAMES
        .iter()
        .filter(move |(_, candidate)| candidate.eq_ignore_ascii_case(oid))
        .map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oid_for_name_is_exact() {
        assert_eq!(oid_for_name("LOINC"), Some(LOINC_OID));
        assert_eq!(oid_for_name("loinc"), None);
        assert_eq!(oid_for_name("UNKNOWN"), None);
    }

    #[test]
    fn test_names_for_oid_returns_every_alias() {
        let names: Vec<&str> = names_for_oid(SNOMED_CT_OID).collect();
        assert_eq!(names, vec!["SNOMED-CT", "SNOMED CT", "SNOMEDCT"]);
        assert_eq!(names_for_oid("9.9.9").count(), 0);
    }

    #[test]
    fn test_every_name_maps_to_a_known_kind() {
        for (_, oid) in CODE_SYSTEM_NAMES {
            assert!(crate::CodeSystemKind::from_code_system_id(oid).is_some());
        }
    }
}
