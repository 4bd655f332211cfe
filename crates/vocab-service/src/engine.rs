//! Code and value-set validation against the active generation.
//!
//! Every operation opens one connection, runs all of its checks against that
//! snapshot and releases it on return. Checks only ever raise flags and add
//! to the expected sets, so a result records every relationship found.

use std::sync::Arc;

use vocab_loader::{Connection, VocabularyStore};
use vocab_types::{well_known, CodeModel, CodeValidationResult, ValueSetModel, ValueSetValidationResult};

use crate::error::EngineError;

/// How `validate_code` fills the codes-for-display-name branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayNameLookup {
    /// Repeat the lookup by code, so the branch mirrors the code lookup.
    /// This is the long-standing observable behaviour.
    #[default]
    ByCode,
    /// Look up records whose display name equals the requested one.
    ByDisplayName,
}

/// Read-only validation facade over a [`VocabularyStore`].
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    store: Arc<VocabularyStore>,
    display_name_lookup: DisplayNameLookup,
}

impl ValidationEngine {
    /// Creates an engine over `store`.
    pub fn new(store: Arc<VocabularyStore>) -> Self {
        Self {
            store,
            display_name_lookup: DisplayNameLookup::default(),
        }
    }

    /// Selects how the codes-for-display-name branch is filled.
    pub fn with_display_name_lookup(mut self, lookup: DisplayNameLookup) -> Self {
        self.display_name_lookup = lookup;
        self
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<VocabularyStore> {
        &self.store
    }

    /// True if a code system with this OID is registered.
    pub fn is_code_system_loaded(&self, code_system_id: &str) -> bool {
        self.store.lookup_code_system(code_system_id).is_some()
    }

    /// True if any registered value-set variant holds a record for this
    /// value set.
    pub fn is_value_set_loaded(&self, value_set_id: &str) -> bool {
        self.store.active_connection().value_set_exists(value_set_id)
    }

    /// Validates a code, optionally with its code system and display name.
    ///
    /// When `code_system_id` is absent it is resolved from
    /// `code_system_name` through the static name table. A code system that
    /// is not registered yields a result with no code matches.
    ///
    /// # Errors
    /// Returns [`EngineError`] if the store cannot execute a lookup.
    pub fn validate_code(
        &self,
        code_system_id: Option<&str>,
        code_system_name: Option<&str>,
        code: &str,
        display_name: Option<&str>,
    ) -> Result<CodeValidationResult, EngineError> {
        let mut result = CodeValidationResult {
            requested_code_system_oid: code_system_id.map(str::to_string),
            requested_code_system_name: code_system_name.map(str::to_string),
            requested_code: code.to_string(),
            requested_display_name: display_name.map(str::to_string),
            ..Default::default()
        };

        let resolved = match (code_system_id, code_system_name) {
            (None, Some(name)) => {
                let oid = well_known::oid_for_name(name);
                if let Some(oid) = oid {
                    result.expected_oids_for_code_system_name.insert(oid.to_string());
                }
                oid
            }
            (Some(oid), Some(name)) => {
                if well_known::oid_for_name(name).is_some_and(|mapped| mapped.eq_ignore_ascii_case(oid)) {
                    result.code_system_and_name_match = true;
                    result.expected_oids_for_code_system_name.insert(oid.to_string());
                }
                result
                    .expected_code_system_names_for_oid
                    .extend(well_known::names_for_oid(oid).map(str::to_string));
                Some(oid)
            }
            (oid, None) => oid,
        };

        let Some(code_system_id) = resolved else {
            return Ok(result);
        };
        if !self.is_code_system_loaded(code_system_id) {
            tracing::debug!("Code system {} is not registered", code_system_id);
            return Ok(result);
        }

        let connection = self.store.active_connection();

        let by_code = connection.fetch_codes(code_system_id, code)?;
        if !by_code.is_empty() {
            result.code_exists_in_code_system = true;
            for record in &by_code {
                result
                    .expected_display_names_for_code
                    .insert(record.display_name().to_string());
                if display_name == Some(record.display_name()) {
                    result.display_name_exists_for_code = true;
                }
            }
        }

        let by_display_name = match (self.display_name_lookup, display_name) {
            (DisplayNameLookup::ByCode, _) => by_code,
            (DisplayNameLookup::ByDisplayName, Some(name)) => {
                connection.fetch_codes_by_display_name(code_system_id, name)?
            }
            (DisplayNameLookup::ByDisplayName, None) => Vec::new(),
        };
        if !by_display_name.is_empty() {
            result.display_name_exists_in_code_system = true;
            result
                .expected_codes_for_display_name
                .extend(by_display_name.iter().map(|record| record.code().to_string()));
        }

        Ok(result)
    }

    /// Validates a value-set membership claim.
    ///
    /// Value-set queries fan out over every registered variant and cannot
    /// fail; an unknown value set yields a result with every flag false.
    pub fn validate_value_set_code(
        &self,
        value_set_id: &str,
        code_system_id: Option<&str>,
        code_system_name: Option<&str>,
        code: &str,
        description: Option<&str>,
    ) -> ValueSetValidationResult {
        let mut result = ValueSetValidationResult {
            requested_value_set_oid: value_set_id.to_string(),
            requested_code_system_oid: code_system_id.map(str::to_string),
            requested_code_system_name: code_system_name.map(str::to_string),
            requested_code: code.to_string(),
            requested_description: description.map(str::to_string),
            ..Default::default()
        };

        let connection = self.store.active_connection();
        check_value_set_names(&connection, value_set_id, &mut result);
        check_code(&connection, value_set_id, code_system_id, code, description, &mut result);
        if let Some(description) = description {
            check_description(&connection, value_set_id, code_system_id, description, &mut result);
        }
        check_code_systems(&connection, value_set_id, code_system_id, code_system_name, &mut result);
        result
    }
}

fn eq_ignore_case(requested: Option<&str>, found: &str) -> bool {
    requested.is_some_and(|requested| requested.eq_ignore_ascii_case(found))
}

fn check_value_set_names(connection: &Connection<'_>, value_set_id: &str, result: &mut ValueSetValidationResult) {
    result.value_set_names.extend(
        connection
            .fetch_value_set_names(value_set_id)
            .into_iter()
            .map(str::to_string),
    );
}

fn check_code(
    connection: &Connection<'_>,
    value_set_id: &str,
    code_system_id: Option<&str>,
    code: &str,
    description: Option<&str>,
    result: &mut ValueSetValidationResult,
) {
    let members = connection.fetch_value_set_codes(value_set_id, code);
    if members.is_empty() {
        return;
    }

    result.code_exists_in_value_set = true;
    for member in members {
        result
            .expected_descriptions_for_code
            .insert(member.description().to_string());
        result
            .expected_code_systems_for_code
            .insert(member.code_system_id().to_string());

        // both comparisons are case-sensitive
        if description == Some(member.description()) {
            result.description_matches_code = true;
        }
        if code_system_id == Some(member.code_system_id()) {
            result.code_exists_in_code_system = true;
        }
    }
}

fn check_description(
    connection: &Connection<'_>,
    value_set_id: &str,
    code_system_id: Option<&str>,
    description: &str,
    result: &mut ValueSetValidationResult,
) {
    let members = connection.fetch_value_set_descriptions(value_set_id, description);
    if members.is_empty() {
        return;
    }

    result.description_exists_in_value_set = true;
    for member in members {
        result.expected_codes_for_description.insert(member.code().to_string());
        if eq_ignore_case(code_system_id, member.code_system_id()) {
            result.description_exists_in_code_system = true;
        }
    }
}

fn check_code_systems(
    connection: &Connection<'_>,
    value_set_id: &str,
    code_system_id: Option<&str>,
    code_system_name: Option<&str>,
    result: &mut ValueSetValidationResult,
) {
    for system in connection.fetch_code_systems(value_set_id) {
        result
            .expected_code_systems_for_value_set
            .insert(system.code_system_id.clone());

        let oid_matches = eq_ignore_case(code_system_id, &system.code_system_id);
        if oid_matches {
            result.code_system_exists_in_value_set = true;
            result
                .expected_code_system_names_for_oid
                .insert(system.code_system_name.clone());
        }

        if eq_ignore_case(code_system_name, &system.code_system_name) {
            result
                .expected_oids_for_code_system_name
                .insert(system.code_system_id.clone());
            if oid_matches {
                result.code_system_and_name_match = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use vocab_loader::{CodePartition, LoaderRegistry, PartitionUpdate, SchemaRegistry, ValueSetPartition};
    use vocab_types::{CodeRecord, PhinVadsValueSet, SnomedCode, ValueSetRecord, VsacValueSet};

    fn snomed(concept_id: u64, term: &str) -> CodeRecord {
        CodeRecord::Snomed(SnomedCode {
            code: concept_id.to_string(),
            display_name: term.to_string(),
            concept_id,
            description_id: concept_id * 10,
            type_id: 900000000000013009,
        })
    }

    fn vsac(value_set: &str, code: &str, description: &str, oid: &str, system: &str) -> ValueSetRecord {
        ValueSetRecord::Vsac(VsacValueSet {
            value_set_id: value_set.to_string(),
            value_set_name: format!("{} name", value_set),
            code: code.to_string(),
            description: description.to_string(),
            code_system_id: oid.to_string(),
            code_system_name: system.to_string(),
            code_system_version: "1".to_string(),
        })
    }

    fn engine(codes: Vec<CodeRecord>, value_sets: Vec<ValueSetRecord>) -> ValidationEngine {
        let mut schema = SchemaRegistry::new();
        LoaderRegistry::with_defaults(&mut schema);
        let store = Arc::new(VocabularyStore::new(schema));

        let mut code_partition = CodePartition::new();
        code_partition.extend(codes);
        let mut value_set_partition = ValueSetPartition::new();
        value_set_partition.extend(value_sets);
        store.refresh(vec![
            PartitionUpdate::Codes(Arc::new(code_partition)),
            PartitionUpdate::ValueSets(Arc::new(value_set_partition)),
        ]);

        ValidationEngine::new(store)
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn hypertension() -> ValidationEngine {
        engine(
            vec![
                snomed(38341003, "Hypertension"),
                snomed(38341003, "Hypertensive disorder, systemic arterial (disorder)"),
                snomed(73211009, "Diabetes mellitus"),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_code_round_trip() {
        let result = hypertension()
            .validate_code(Some(well_known::SNOMED_CT_OID), None, "38341003", Some("Hypertension"))
            .unwrap();

        assert!(result.code_exists_in_code_system);
        assert!(result.display_name_exists_for_code);
        assert_eq!(
            result.expected_display_names_for_code,
            set(&["Hypertension", "Hypertensive disorder, systemic arterial (disorder)"])
        );
        assert_eq!(result.requested_code, "38341003");
        assert_eq!(result.requested_code_system_oid.as_deref(), Some(well_known::SNOMED_CT_OID));
    }

    #[test]
    fn test_display_name_is_case_sensitive() {
        let result = hypertension()
            .validate_code(Some(well_known::SNOMED_CT_OID), None, "38341003", Some("hypertension"))
            .unwrap();

        assert!(result.code_exists_in_code_system);
        assert!(!result.display_name_exists_for_code);
    }

    #[test]
    fn test_code_system_name_consistency() {
        let engine = hypertension();
        let matched = engine
            .validate_code(Some(well_known::SNOMED_CT_OID), Some("SNOMED-CT"), "38341003", Some("Hypertension"))
            .unwrap();
        assert!(matched.code_system_and_name_match);
        assert_eq!(matched.expected_oids_for_code_system_name, set(&[well_known::SNOMED_CT_OID]));
        assert!(matched.expected_code_system_names_for_oid.contains("SNOMED-CT"));

        let mismatched = engine
            .validate_code(Some(well_known::SNOMED_CT_OID), Some("LOINC"), "38341003", Some("Hypertension"))
            .unwrap();
        assert!(!mismatched.code_system_and_name_match);
        assert!(mismatched.expected_oids_for_code_system_name.is_empty());
        assert!(!mismatched.expected_code_system_names_for_oid.contains("LOINC"));
        assert_eq!(
            mismatched.expected_code_system_names_for_oid,
            set(&["SNOMED-CT", "SNOMED CT", "SNOMEDCT"])
        );
    }

    #[test]
    fn test_any_alias_matches_its_oid() {
        let result = hypertension()
            .validate_code(Some(well_known::SNOMED_CT_OID), Some("SNOMED CT"), "73211009", None)
            .unwrap();
        assert!(result.code_system_and_name_match);
        assert!(result.code_exists_in_code_system);
        assert!(!result.display_name_exists_for_code);
    }

    #[test]
    fn test_code_system_resolved_from_name() {
        let result = hypertension()
            .validate_code(None, Some("SNOMED-CT"), "73211009", Some("Diabetes mellitus"))
            .unwrap();

        assert_eq!(result.expected_oids_for_code_system_name, set(&[well_known::SNOMED_CT_OID]));
        assert!(!result.code_system_and_name_match);
        assert!(result.code_exists_in_code_system);
        assert!(result.display_name_exists_for_code);
    }

    #[test]
    fn test_unresolvable_or_unregistered_code_system_is_absence() {
        let engine = hypertension();

        let unnamed = engine.validate_code(None, Some("CPT"), "99213", None).unwrap();
        assert!(!unnamed.code_exists_in_code_system);
        assert!(unnamed.expected_oids_for_code_system_name.is_empty());

        let unregistered = engine.validate_code(Some("1.2.3"), None, "99213", None).unwrap();
        assert_eq!(
            unregistered,
            CodeValidationResult {
                requested_code_system_oid: Some("1.2.3".to_string()),
                requested_code: "99213".to_string(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_display_name_branch_repeats_code_lookup_by_default() {
        let result = hypertension()
            .validate_code(Some(well_known::SNOMED_CT_OID), None, "38341003", Some("Diabetes mellitus"))
            .unwrap();

        assert!(result.display_name_exists_in_code_system);
        assert_eq!(result.expected_codes_for_display_name, set(&["38341003"]));
    }

    #[test]
    fn test_display_name_branch_by_display_name() {
        let engine = hypertension().with_display_name_lookup(DisplayNameLookup::ByDisplayName);
        let result = engine
            .validate_code(Some(well_known::SNOMED_CT_OID), None, "38341003", Some("Diabetes mellitus"))
            .unwrap();

        assert!(result.code_exists_in_code_system);
        assert!(!result.display_name_exists_for_code);
        assert!(result.display_name_exists_in_code_system);
        assert_eq!(result.expected_codes_for_display_name, set(&["73211009"]));

        let without_name = engine
            .validate_code(Some(well_known::SNOMED_CT_OID), None, "38341003", None)
            .unwrap();
        assert!(!without_name.display_name_exists_in_code_system);
    }

    #[test]
    fn test_validate_code_is_idempotent() {
        let engine = hypertension();
        let first = engine
            .validate_code(Some(well_known::SNOMED_CT_OID), Some("SNOMED-CT"), "38341003", Some("Hypertension"))
            .unwrap();
        let second = engine
            .validate_code(Some(well_known::SNOMED_CT_OID), Some("SNOMED-CT"), "38341003", Some("Hypertension"))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.store().open_connections(), 0);
    }

    #[test]
    fn test_is_code_system_loaded() {
        let engine = hypertension();
        assert!(engine.is_code_system_loaded(well_known::SNOMED_CT_OID));
        assert!(engine.is_code_system_loaded(well_known::ICD10_PCS_OID));
        assert!(!engine.is_code_system_loaded("1.2.3"));
    }

    #[test]
    fn test_value_set_code_consistency() {
        let engine = engine(Vec::new(), vec![vsac("V1", "C1", "D1", "OID1", "System One")]);
        let result = engine.validate_value_set_code("V1", Some("OID1"), None, "C1", Some("D1"));

        assert!(result.code_exists_in_value_set);
        assert!(result.description_matches_code);
        assert!(result.code_exists_in_code_system);
        assert!(result.description_exists_in_value_set);
        assert!(result.description_exists_in_code_system);
        assert!(result.code_system_exists_in_value_set);
        assert!(!result.code_system_and_name_match);
        assert_eq!(result.value_set_names, set(&["V1 name"]));
        assert_eq!(result.expected_codes_for_description, set(&["C1"]));
        assert_eq!(result.expected_code_systems_for_value_set, set(&["OID1"]));
        assert_eq!(result.expected_code_system_names_for_oid, set(&["System One"]));
    }

    #[test]
    fn test_value_set_comparisons() {
        let engine = engine(
            Vec::new(),
            vec![
                vsac("V1", "C1", "D1", "oid1", "System One"),
                vsac("V1", "C2", "D2", "OID2", "System Two"),
            ],
        );

        // code system check in the code branch is case-sensitive; the
        // description and projection branches are not
        let result = engine.validate_value_set_code("V1", Some("OID1"), Some("system one"), "C1", Some("d1"));
        assert!(result.code_exists_in_value_set);
        assert!(!result.code_exists_in_code_system);
        assert!(!result.description_matches_code);
        assert!(!result.description_exists_in_value_set);
        assert!(result.code_system_exists_in_value_set);
        assert!(result.code_system_and_name_match);
        assert_eq!(result.expected_oids_for_code_system_name, set(&["oid1"]));
        assert_eq!(result.expected_descriptions_for_code, set(&["D1"]));
        assert_eq!(result.expected_code_systems_for_value_set, set(&["oid1", "OID2"]));
    }

    #[test]
    fn test_value_set_variants_are_merged() {
        let phin = ValueSetRecord::PhinVads(PhinVadsValueSet {
            value_set_id: "V1".to_string(),
            value_set_name: "Phin name".to_string(),
            value_set_version: "2".to_string(),
            code: "C9".to_string(),
            description: "D9".to_string(),
            code_system_id: "OID9".to_string(),
            code_system_name: "System Nine".to_string(),
        });
        let engine = engine(Vec::new(), vec![vsac("V1", "C1", "D1", "OID1", "System One"), phin]);

        assert!(engine.is_value_set_loaded("V1"));
        let result = engine.validate_value_set_code("V1", Some("OID9"), Some("System Nine"), "C9", Some("D9"));
        assert_eq!(result.value_set_names, set(&["Phin name", "V1 name"]));
        assert!(result.code_exists_in_value_set);
        assert!(result.code_system_and_name_match);
        assert_eq!(result.expected_code_systems_for_value_set, set(&["OID1", "OID9"]));
    }

    #[test]
    fn test_unknown_value_set() {
        let engine = engine(Vec::new(), vec![vsac("V1", "C1", "D1", "OID1", "System One")]);

        assert!(!engine.is_value_set_loaded("V404"));
        let result = engine.validate_value_set_code("V404", Some("OID1"), Some("System One"), "C1", Some("D1"));
        assert_eq!(
            result,
            ValueSetValidationResult {
                requested_value_set_oid: "V404".to_string(),
                requested_code_system_oid: Some("OID1".to_string()),
                requested_code_system_name: Some("System One".to_string()),
                requested_code: "C1".to_string(),
                requested_description: Some("D1".to_string()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_validation_reads_one_snapshot() {
        let engine = hypertension();
        let store = Arc::clone(engine.store());
        let connection = store.active_connection();

        store.refresh(vec![PartitionUpdate::Codes(Arc::new(CodePartition::new()))]);

        assert_eq!(connection.fetch_codes(well_known::SNOMED_CT_OID, "38341003").unwrap().len(), 2);
        let after = engine
            .validate_code(Some(well_known::SNOMED_CT_OID), None, "38341003", None)
            .unwrap();
        assert!(!after.code_exists_in_code_system);
    }
}
