//! Validation result aggregates.
//!
//! Both results start with every flag `false` and every collection empty.
//! The validation engine only ever sets flags and adds to collections, so a
//! "not found" outcome is an all-default result rather than an error.

use std::collections::BTreeSet;

/// Outcome of validating a code against a code system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CodeValidationResult {
    /// Code system OID as requested.
    pub requested_code_system_oid: Option<String>,
    /// Code system name as requested.
    pub requested_code_system_name: Option<String>,
    /// Code as requested.
    pub requested_code: String,
    /// Display name as requested.
    pub requested_display_name: Option<String>,

    /// The requested OID is the one the name table assigns to the requested name.
    pub code_system_and_name_match: bool,
    /// At least one record exists for the code in the code system.
    pub code_exists_in_code_system: bool,
    /// One of the code's records carries exactly the requested display name.
    pub display_name_exists_for_code: bool,
    /// The display-name lookup found at least one record.
    pub display_name_exists_in_code_system: bool,

    /// OIDs recognized for the requested code system name.
    pub expected_oids_for_code_system_name: BTreeSet<String>,
    /// Names recognized for the requested OID.
    pub expected_code_system_names_for_oid: BTreeSet<String>,
    /// Display names stored for the requested code.
    pub expected_display_names_for_code: BTreeSet<String>,
    /// Codes found by the display-name lookup.
    pub expected_codes_for_display_name: BTreeSet<String>,
}

/// Outcome of validating a code's membership in a value set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ValueSetValidationResult {
    /// Value set OID as requested.
    pub requested_value_set_oid: String,
    /// Code system OID as requested.
    pub requested_code_system_oid: Option<String>,
    /// Code system name as requested.
    pub requested_code_system_name: Option<String>,
    /// Code as requested.
    pub requested_code: String,
    /// Description as requested.
    pub requested_description: Option<String>,

    /// Names the value set is published under.
    pub value_set_names: BTreeSet<String>,

    /// The code is a member of the value set.
    pub code_exists_in_value_set: bool,
    /// A member row for the code carries exactly the requested description.
    pub description_matches_code: bool,
    /// A member row for the code is drawn from the requested code system.
    pub code_exists_in_code_system: bool,
    /// The requested description appears in the value set.
    pub description_exists_in_value_set: bool,
    /// A row with the requested description is drawn from the requested code system.
    pub description_exists_in_code_system: bool,
    /// The value set draws from the requested code system.
    pub code_system_exists_in_value_set: bool,
    /// The value set pairs the requested code system name with the requested OID.
    pub code_system_and_name_match: bool,

    /// Descriptions stored for the requested code.
    pub expected_descriptions_for_code: BTreeSet<String>,
    /// Code systems stored for the requested code.
    pub expected_code_systems_for_code: BTreeSet<String>,
    /// Codes stored for the requested description.
    pub expected_codes_for_description: BTreeSet<String>,
    /// Every code system the value set draws from.
    pub expected_code_systems_for_value_set: BTreeSet<String>,
    /// Names the value set gives the requested OID.
    pub expected_code_system_names_for_oid: BTreeSet<String>,
    /// OIDs the value set gives the requested name.
    pub expected_oids_for_code_system_name: BTreeSet<String>,
}
