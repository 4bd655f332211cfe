//! Dual-generation vocabulary store.
//!
//! The store holds two complete generations of code and value-set data,
//! labelled [`GenerationLabel::A`] and [`GenerationLabel::B`]. Exactly one is
//! active at any instant. Readers open a [`Connection`] to the active
//! generation; rebuilds publish freshly loaded partitions into the inactive
//! generation and then [`swap`](VocabularyStore::swap) the labels.
//!
//! A connection pins the generation it was opened against, so a swap never
//! changes what an in-flight reader sees:
//!
//! ```
//! use std::sync::Arc;
//! use vocab_loader::{CodePartition, PartitionUpdate, SchemaRegistry, VocabularyStore};
//! use vocab_types::{CodeRecord, CodeSystemKind, Icd9Code, well_known};
//!
//! let mut schema = SchemaRegistry::new();
//! schema.register(well_known::ICD9_CM_DX_OID, "ICD-9-CM", CodeSystemKind::Icd9CmDx);
//! let store = VocabularyStore::new(schema);
//!
//! let before = store.active_connection();
//!
//! let mut codes = CodePartition::new();
//! codes.insert(CodeRecord::Icd9CmDx(Icd9Code {
//!     code: "401.9".to_string(),
//!     display_name: "Unspecified essential hypertension".to_string(),
//! }));
//! store.refresh(vec![PartitionUpdate::Codes(Arc::new(codes))]);
//!
//! let after = store.active_connection();
//! assert!(before.fetch_codes(well_known::ICD9_CM_DX_OID, "401.9")?.is_empty());
//! assert_eq!(after.fetch_codes(well_known::ICD9_CM_DX_OID, "401.9")?.len(), 1);
//! # Ok::<(), vocab_loader::StoreError>(())
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use thiserror::Error;
use vocab_types::{
    CodeModel, CodeRecord, CodeSystemKind, CodeSystemProjection, ValueSetKind, ValueSetModel,
    ValueSetRecord, VocabularyDefinition,
};

use crate::schema::SchemaRegistry;

/// Errors raised by queries against a generation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No definition is registered for the code system.
    #[error("Code system {code_system_id} is not registered")]
    UnknownCodeSystem {
        /// The requested OID.
        code_system_id: String,
    },

    /// The generation stores a code system under a different record kind
    /// than its registered definition names.
    #[error("Code system {code_system_id} is registered as {expected:?} but stored as {found:?}")]
    SchemaMismatch {
        /// The requested OID.
        code_system_id: String,
        /// Kind named by the definition.
        expected: CodeSystemKind,
        /// Kind held by the generation's table.
        found: CodeSystemKind,
    },
}

/// Result type for store queries.
pub type StoreResult<T> = Result<T, StoreError>;

// ═══════════════════════════════════════════════════════════════════════════
// PARTITIONS
// ═══════════════════════════════════════════════════════════════════════════

/// A loadable slice of a generation. Code vocabularies and value sets are
/// separate partitions and are rebuilt independently.
pub trait Partition: Default + Send {
    /// Moves every record of `other` into `self`.
    fn merge(&mut self, other: Self);

    /// Number of records held.
    fn record_count(&self) -> usize;
}

/// Code records of one code system, indexed by code and by display name.
#[derive(Debug, Clone)]
pub struct CodeTable {
    kind: CodeSystemKind,
    records: Vec<CodeRecord>,
    by_code: HashMap<String, Vec<usize>>,
    by_display_name: HashMap<String, Vec<usize>>,
}

impl CodeTable {
    fn new(kind: CodeSystemKind) -> Self {
        Self {
            kind,
            records: Vec::new(),
            by_code: HashMap::new(),
            by_display_name: HashMap::new(),
        }
    }

    fn push(&mut self, record: CodeRecord) {
        let index = self.records.len();
        self.by_code
            .entry(record.code().to_string())
            .or_default()
            .push(index);
        self.by_display_name
            .entry(record.display_name().to_string())
            .or_default()
            .push(index);
        self.records.push(record);
    }

    fn select<'a>(&'a self, index: &'a HashMap<String, Vec<usize>>, key: &str) -> Vec<&'a CodeRecord> {
        index
            .get(key)
            .map(|positions| positions.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    /// Returns the record kind this table holds.
    pub fn kind(&self) -> CodeSystemKind {
        self.kind
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// All code records of a generation, one table per code system OID.
#[derive(Debug, Clone, Default)]
pub struct CodePartition {
    tables: HashMap<&'static str, CodeTable>,
}

impl CodePartition {
    /// Creates an empty partition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record to the table of its code system.
    pub fn insert(&mut self, record: CodeRecord) {
        let kind = record.kind();
        self.tables
            .entry(kind.code_system_id())
            .or_insert_with(|| CodeTable::new(kind))
            .push(record);
    }

    /// Returns the table for a code system OID.
    pub fn table(&self, code_system_id: &str) -> Option<&CodeTable> {
        self.tables.get(code_system_id)
    }
}

impl Extend<CodeRecord> for CodePartition {
    fn extend<I: IntoIterator<Item = CodeRecord>>(&mut self, records: I) {
        for record in records {
            self.insert(record);
        }
    }
}

impl Partition for CodePartition {
    fn merge(&mut self, other: Self) {
        for (_, table) in other.tables {
            self.extend(table.records);
        }
    }

    fn record_count(&self) -> usize {
        self.tables.values().map(CodeTable::len).sum()
    }
}

/// Records of one value-set variant, indexed by value set OID.
#[derive(Debug, Clone, Default)]
pub struct ValueSetTable {
    records: Vec<ValueSetRecord>,
    by_value_set: HashMap<String, Vec<usize>>,
}

impl ValueSetTable {
    fn push(&mut self, record: ValueSetRecord) {
        self.by_value_set
            .entry(record.value_set_id().to_string())
            .or_default()
            .push(self.records.len());
        self.records.push(record);
    }

    fn members<'a>(&'a self, value_set_id: &str) -> impl Iterator<Item = &'a ValueSetRecord> + 'a {
        self.by_value_set
            .get(value_set_id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.records[i])
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// All value-set records of a generation, one table per variant.
#[derive(Debug, Clone, Default)]
pub struct ValueSetPartition {
    tables: BTreeMap<ValueSetKind, ValueSetTable>,
}

impl ValueSetPartition {
    /// Creates an empty partition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record to the table of its variant.
    pub fn insert(&mut self, record: ValueSetRecord) {
        self.tables.entry(record.kind()).or_default().push(record);
    }

    /// Returns the table for a variant.
    pub fn table(&self, kind: ValueSetKind) -> Option<&ValueSetTable> {
        self.tables.get(&kind)
    }
}

impl Extend<ValueSetRecord> for ValueSetPartition {
    fn extend<I: IntoIterator<Item = ValueSetRecord>>(&mut self, records: I) {
        for record in records {
            self.insert(record);
        }
    }
}

impl Partition for ValueSetPartition {
    fn merge(&mut self, other: Self) {
        for (_, table) in other.tables {
            self.extend(table.records);
        }
    }

    fn record_count(&self) -> usize {
        self.tables.values().map(ValueSetTable::len).sum()
    }
}

/// Replacement data for one partition of the inactive generation.
#[derive(Debug, Clone)]
pub enum PartitionUpdate {
    /// Replace all code records.
    Codes(Arc<CodePartition>),
    /// Replace all value-set records.
    ValueSets(Arc<ValueSetPartition>),
}

// ═══════════════════════════════════════════════════════════════════════════
// GENERATIONS
// ═══════════════════════════════════════════════════════════════════════════

/// Label of one of the two generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationLabel {
    /// First generation.
    A,
    /// Second generation.
    B,
}

impl GenerationLabel {
    /// Returns the other label.
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

impl fmt::Display for GenerationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}

/// One complete, immutable copy of all vocabulary data.
#[derive(Debug)]
pub struct Generation {
    label: GenerationLabel,
    codes: Arc<CodePartition>,
    value_sets: Arc<ValueSetPartition>,
}

impl Generation {
    fn empty(label: GenerationLabel) -> Self {
        Self {
            label,
            codes: Arc::default(),
            value_sets: Arc::default(),
        }
    }

    fn with_update(&self, update: &PartitionUpdate) -> Self {
        let mut next = Self {
            label: self.label,
            codes: Arc::clone(&self.codes),
            value_sets: Arc::clone(&self.value_sets),
        };
        match update {
            PartitionUpdate::Codes(codes) => next.codes = Arc::clone(codes),
            PartitionUpdate::ValueSets(value_sets) => next.value_sets = Arc::clone(value_sets),
        }
        next
    }
}

/// Both generations plus the active label. Replaced wholesale on every
/// publish or swap so readers observe either the old or the new state.
#[derive(Debug)]
struct Generations {
    slots: [Arc<Generation>; 2],
    active: GenerationLabel,
}

impl Generations {
    fn get(&self, label: GenerationLabel) -> &Arc<Generation> {
        &self.slots[label.index()]
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// STORE
// ═══════════════════════════════════════════════════════════════════════════

/// Two-generation store with atomic swap.
pub struct VocabularyStore {
    schema: SchemaRegistry,
    state: ArcSwap<Generations>,
    /// Serializes publishes and swaps.
    writer: Mutex<()>,
    open_connections: AtomicUsize,
}

impl fmt::Debug for VocabularyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.load();
        f.debug_struct("VocabularyStore")
            .field("active", &state.active)
            .field("code_systems", &self.schema.code_system_count())
            .field("value_set_variants", &self.schema.all_value_set_variants())
            .field("open_connections", &self.open_connections())
            .finish()
    }
}

impl VocabularyStore {
    /// Creates a store with two empty generations; `A` starts active.
    ///
    /// The schema registry is frozen from here on.
    pub fn new(schema: SchemaRegistry) -> Self {
        Self {
            schema,
            state: ArcSwap::from_pointee(Generations {
                slots: [
                    Arc::new(Generation::empty(GenerationLabel::A)),
                    Arc::new(Generation::empty(GenerationLabel::B)),
                ],
                active: GenerationLabel::A,
            }),
            writer: Mutex::new(()),
            open_connections: AtomicUsize::new(0),
        }
    }

    /// Returns the schema registry.
    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// Looks up a registered code system.
    pub fn lookup_code_system(&self, code_system_id: &str) -> Option<&VocabularyDefinition> {
        self.schema.lookup(code_system_id)
    }

    /// Returns the registered value-set variants.
    pub fn value_set_variants(&self) -> &[ValueSetKind] {
        self.schema.all_value_set_variants()
    }

    /// Returns the label of the active generation.
    pub fn active_label(&self) -> GenerationLabel {
        self.state.load().active
    }

    /// Opens a connection to the active generation.
    pub fn active_connection(&self) -> Connection<'_> {
        let state = self.state.load();
        self.connect(Arc::clone(state.get(state.active)))
    }

    /// Opens a connection to the inactive generation.
    pub fn inactive_connection(&self) -> Connection<'_> {
        let state = self.state.load();
        self.connect(Arc::clone(state.get(state.active.other())))
    }

    fn connect(&self, generation: Arc<Generation>) -> Connection<'_> {
        let open = self.open_connections.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!("Opened connection to generation {} ({} open)", generation.label, open);
        Connection {
            store: self,
            generation,
        }
    }

    /// Returns the number of connections not yet released.
    pub fn open_connections(&self) -> usize {
        self.open_connections.load(Ordering::Acquire)
    }

    /// Exchanges the active and inactive labels and returns the new active label.
    ///
    /// Connections opened before the swap keep reading the generation they
    /// were opened against.
    pub fn swap(&self) -> GenerationLabel {
        let _writer = self.writer.lock();
        self.swap_locked()
    }

    /// Replaces one partition of the inactive generation.
    pub fn publish_inactive(&self, update: PartitionUpdate) {
        let _writer = self.writer.lock();
        self.publish_locked(&update);
    }

    /// Publishes `updates` into the inactive generation, swaps it in, then
    /// publishes the same updates into the generation that just went
    /// inactive so both hold current data. Returns the new active label.
    ///
    /// The whole sequence runs under the writer lock, so concurrent
    /// refreshes from independent reload streams never interleave.
    pub fn refresh(&self, updates: Vec<PartitionUpdate>) -> GenerationLabel {
        let _writer = self.writer.lock();
        for update in &updates {
            self.publish_locked(update);
        }
        let active = self.swap_locked();
        for update in &updates {
            self.publish_locked(update);
        }
        active
    }

    fn swap_locked(&self) -> GenerationLabel {
        let current = self.state.load_full();
        let active = current.active.other();
        self.state.store(Arc::new(Generations {
            slots: current.slots.clone(),
            active,
        }));
        tracing::info!("Activated generation {} (was {})", active, current.active);
        active
    }

    fn publish_locked(&self, update: &PartitionUpdate) {
        let current = self.state.load_full();
        let target = current.active.other();
        let mut slots = current.slots.clone();
        slots[target.index()] = Arc::new(current.get(target).with_update(update));
        self.state.store(Arc::new(Generations {
            slots,
            active: current.active,
        }));
        tracing::debug!("Published {} into inactive generation {}", describe(update), target);
    }
}

fn describe(update: &PartitionUpdate) -> String {
    match update {
        PartitionUpdate::Codes(codes) => format!("{} code records", codes.record_count()),
        PartitionUpdate::ValueSets(value_sets) => {
            format!("{} value set records", value_sets.record_count())
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// CONNECTIONS
// ═══════════════════════════════════════════════════════════════════════════

/// A query-scoped handle on one generation. Released when dropped.
pub struct Connection<'a> {
    store: &'a VocabularyStore,
    generation: Arc<Generation>,
}

impl fmt::Debug for Connection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("generation", &self.generation.label)
            .finish()
    }
}

impl Drop for Connection<'_> {
    fn drop(&mut self) {
        let open = self.store.open_connections.fetch_sub(1, Ordering::AcqRel) - 1;
        tracing::trace!(
            "Released connection to generation {} ({} open)",
            self.generation.label,
            open
        );
    }
}

impl<'a> Connection<'a> {
    /// Returns the label of the generation this connection reads.
    pub fn label(&self) -> GenerationLabel {
        self.generation.label
    }

    /// Returns the number of code records in this generation.
    pub fn code_count(&self) -> usize {
        self.generation.codes.record_count()
    }

    /// Returns the number of value-set records in this generation.
    pub fn value_set_record_count(&self) -> usize {
        self.generation.value_sets.record_count()
    }

    fn code_table(&self, code_system_id: &str) -> StoreResult<Option<&CodeTable>> {
        let definition = self.store.lookup_code_system(code_system_id).ok_or_else(|| {
            StoreError::UnknownCodeSystem {
                code_system_id: code_system_id.to_string(),
            }
        })?;

        // Records are filed under their kind's canonical OID, so a code
        // system registered under another OID reads the canonical table.
        let Some(table) = self
            .generation
            .codes
            .table(&definition.code_system_id)
            .or_else(|| self.generation.codes.table(definition.kind.code_system_id()))
        else {
            return Ok(None);
        };
        if table.kind != definition.kind {
            return Err(StoreError::SchemaMismatch {
                code_system_id: code_system_id.to_string(),
                expected: definition.kind,
                found: table.kind,
            });
        }
        Ok(Some(table))
    }

    /// Fetches the records of `code` in a code system.
    pub fn fetch_codes(&self, code_system_id: &str, code: &str) -> StoreResult<Vec<&CodeRecord>> {
        Ok(self
            .code_table(code_system_id)?
            .map(|table| table.select(&table.by_code, code))
            .unwrap_or_default())
    }

    /// Fetches the records carrying `display_name` in a code system.
    pub fn fetch_codes_by_display_name(
        &self,
        code_system_id: &str,
        display_name: &str,
    ) -> StoreResult<Vec<&CodeRecord>> {
        Ok(self
            .code_table(code_system_id)?
            .map(|table| table.select(&table.by_display_name, display_name))
            .unwrap_or_default())
    }

    fn value_set_members(&self, value_set_id: &str) -> Vec<(ValueSetKind, Vec<&ValueSetRecord>)> {
        let value_sets = &self.generation.value_sets;
        self.store
            .value_set_variants()
            .iter()
            .map(|&kind| {
                let members = value_sets
                    .table(kind)
                    .map(|table| table.members(value_set_id).collect())
                    .unwrap_or_default();
                (kind, members)
            })
            .collect()
    }

    /// Fetches the member rows for `code` in a value set, across all variants.
    pub fn fetch_value_set_codes(&self, value_set_id: &str, code: &str) -> Vec<&ValueSetRecord> {
        self.value_set_members(value_set_id)
            .into_iter()
            .flat_map(|(_, members)| members)
            .filter(|record| record.code() == code)
            .collect()
    }

    /// Fetches the member rows carrying `description` in a value set, across
    /// all variants.
    pub fn fetch_value_set_descriptions(
        &self,
        value_set_id: &str,
        description: &str,
    ) -> Vec<&ValueSetRecord> {
        self.value_set_members(value_set_id)
            .into_iter()
            .flat_map(|(_, members)| members)
            .filter(|record| record.description() == description)
            .collect()
    }

    /// Fetches the names a value set is published under. Names are distinct
    /// within a variant; a name found in two variants appears twice.
    pub fn fetch_value_set_names(&self, value_set_id: &str) -> Vec<&str> {
        let mut names = Vec::new();
        for (_, members) in self.value_set_members(value_set_id) {
            let mut seen = HashSet::new();
            for record in members {
                if seen.insert(record.value_set_name()) {
                    names.push(record.value_set_name());
                }
            }
        }
        names
    }

    /// Fetches the code systems a value set draws from. Projections are
    /// distinct within a variant; duplicates across variants are kept.
    pub fn fetch_code_systems(&self, value_set_id: &str) -> Vec<CodeSystemProjection> {
        let mut projections = Vec::new();
        for (_, members) in self.value_set_members(value_set_id) {
            let mut seen = HashSet::new();
            for record in members {
                if seen.insert((record.code_system_id(), record.code_system_name())) {
                    projections.push(record.code_system());
                }
            }
        }
        projections
    }

    /// Returns true if any variant holds a record for the value set.
    pub fn value_set_exists(&self, value_set_id: &str) -> bool {
        self.value_set_members(value_set_id)
            .iter()
            .any(|(_, members)| !members.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocab_types::{well_known, Icd10Code, LoincCode, LoincNameKind, PhinVadsValueSet, VsacValueSet};

    fn schema() -> SchemaRegistry {
        let mut schema = SchemaRegistry::new();
        schema.register(well_known::LOINC_OID, "LOINC", CodeSystemKind::Loinc);
        schema.register(well_known::ICD10_CM_OID, "ICD-10-CM", CodeSystemKind::Icd10Cm);
        schema.register_value_set_variant(ValueSetKind::Vsac);
        schema.register_value_set_variant(ValueSetKind::PhinVads);
        schema
    }

    fn loinc(code: &str, name: &str) -> CodeRecord {
        CodeRecord::Loinc(LoincCode {
            code: code.to_string(),
            display_name: name.to_string(),
            name_kind: LoincNameKind::LongCommonName,
            property: "Pres".to_string(),
            system: "Arterial system".to_string(),
            scale_type: "Qn".to_string(),
        })
    }

    fn vsac(value_set: &str, code: &str, description: &str) -> ValueSetRecord {
        ValueSetRecord::Vsac(VsacValueSet {
            value_set_id: value_set.to_string(),
            value_set_name: "Vital Sign Result Type".to_string(),
            code: code.to_string(),
            description: description.to_string(),
            code_system_id: well_known::LOINC_OID.to_string(),
            code_system_name: "LOINC".to_string(),
            code_system_version: "2.77".to_string(),
        })
    }

    fn phin(value_set: &str, code: &str, description: &str) -> ValueSetRecord {
        ValueSetRecord::PhinVads(PhinVadsValueSet {
            value_set_id: value_set.to_string(),
            value_set_name: "Vital Sign Result Type".to_string(),
            value_set_version: "3".to_string(),
            code: code.to_string(),
            description: description.to_string(),
            code_system_id: well_known::LOINC_OID.to_string(),
            code_system_name: "LOINC".to_string(),
        })
    }

    fn codes(records: Vec<CodeRecord>) -> PartitionUpdate {
        let mut partition = CodePartition::new();
        partition.extend(records);
        PartitionUpdate::Codes(Arc::new(partition))
    }

    fn value_sets(records: Vec<ValueSetRecord>) -> PartitionUpdate {
        let mut partition = ValueSetPartition::new();
        partition.extend(records);
        PartitionUpdate::ValueSets(Arc::new(partition))
    }

    #[test]
    fn test_new_store_starts_empty_with_a_active() {
        let store = VocabularyStore::new(schema());
        assert_eq!(store.active_label(), GenerationLabel::A);

        let connection = store.active_connection();
        assert_eq!(connection.label(), GenerationLabel::A);
        assert_eq!(connection.code_count(), 0);
        assert!(connection.fetch_codes(well_known::LOINC_OID, "8480-6").unwrap().is_empty());
    }

    #[test]
    fn test_publish_inactive_is_invisible_until_swap() {
        let store = VocabularyStore::new(schema());
        store.publish_inactive(codes(vec![loinc("8480-6", "Systolic blood pressure")]));

        assert_eq!(store.active_connection().code_count(), 0);
        assert_eq!(store.inactive_connection().code_count(), 1);

        assert_eq!(store.swap(), GenerationLabel::B);
        let connection = store.active_connection();
        assert_eq!(connection.label(), GenerationLabel::B);
        assert_eq!(connection.fetch_codes(well_known::LOINC_OID, "8480-6").unwrap().len(), 1);
    }

    #[test]
    fn test_connection_keeps_its_generation_across_swap() {
        let store = VocabularyStore::new(schema());
        store.refresh(vec![codes(vec![loinc("8480-6", "Systolic blood pressure")])]);

        let pinned = store.active_connection();
        store.refresh(vec![codes(vec![loinc("8462-4", "Diastolic blood pressure")])]);

        assert_eq!(pinned.fetch_codes(well_known::LOINC_OID, "8480-6").unwrap().len(), 1);
        assert!(pinned.fetch_codes(well_known::LOINC_OID, "8462-4").unwrap().is_empty());

        let fresh = store.active_connection();
        assert!(fresh.fetch_codes(well_known::LOINC_OID, "8480-6").unwrap().is_empty());
        assert_eq!(fresh.fetch_codes(well_known::LOINC_OID, "8462-4").unwrap().len(), 1);
    }

    #[test]
    fn test_refresh_leaves_both_generations_current() {
        let store = VocabularyStore::new(schema());
        let active = store.refresh(vec![
            codes(vec![loinc("8480-6", "Systolic blood pressure")]),
            value_sets(vec![vsac("2.16.840.1.113883.3.88.12.80.62", "8480-6", "Systolic blood pressure")]),
        ]);

        assert_eq!(active, GenerationLabel::B);
        for connection in [store.active_connection(), store.inactive_connection()] {
            assert_eq!(connection.code_count(), 1);
            assert_eq!(connection.value_set_record_count(), 1);
        }
    }

    #[test]
    fn test_refresh_of_one_partition_keeps_the_other() {
        let store = VocabularyStore::new(schema());
        store.refresh(vec![value_sets(vec![vsac("VS1", "C1", "D1")])]);
        store.refresh(vec![codes(vec![loinc("8480-6", "Systolic blood pressure")])]);

        let connection = store.active_connection();
        assert_eq!(connection.code_count(), 1);
        assert!(connection.value_set_exists("VS1"));
    }

    #[test]
    fn test_connections_are_released_on_drop() {
        let store = VocabularyStore::new(schema());
        {
            let _a = store.active_connection();
            let _b = store.inactive_connection();
            assert_eq!(store.open_connections(), 2);
        }
        assert_eq!(store.open_connections(), 0);
    }

    #[test]
    fn test_concurrent_readers_only_see_whole_generations() {
        use std::sync::atomic::AtomicBool;

        let small = codes((0..10).map(|i| loinc(&format!("{}-0", i), "Small")).collect());
        let large = codes((0..20).map(|i| loinc(&format!("{}-1", i), "Large")).collect());
        let store = VocabularyStore::new(schema());
        store.refresh(vec![small.clone()]);

        let done = AtomicBool::new(false);
        std::thread::scope(|scope| {
            let readers: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        let mut observed = 0usize;
                        while !done.load(Ordering::Acquire) {
                            let connection = store.active_connection();
                            let count = connection.code_count();
                            assert!(count == 10 || count == 20, "observed a partial generation of {}", count);
                            assert_eq!(connection.code_count(), count);
                            observed += 1;
                        }
                        observed
                    })
                })
                .collect();

            for round in 0..500 {
                let update = if round % 2 == 0 { large.clone() } else { small.clone() };
                store.refresh(vec![update]);
            }
            done.store(true, Ordering::Release);

            for reader in readers {
                assert!(reader.join().unwrap() > 0);
            }
        });

        assert_eq!(store.open_connections(), 0);
        assert_eq!(store.active_connection().code_count(), 10);
    }

    #[test]
    fn test_fetch_by_display_name_is_exact() {
        let store = VocabularyStore::new(schema());
        store.refresh(vec![codes(vec![
            loinc("8480-6", "Systolic blood pressure"),
            loinc("8459-0", "Systolic blood pressure"),
        ])]);

        let connection = store.active_connection();
        let found = connection
            .fetch_codes_by_display_name(well_known::LOINC_OID, "Systolic blood pressure")
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(connection
            .fetch_codes_by_display_name(well_known::LOINC_OID, "systolic blood pressure")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unregistered_code_system_is_an_error() {
        let store = VocabularyStore::new(schema());
        let connection = store.active_connection();
        assert_eq!(
            connection.fetch_codes(well_known::RXNORM_OID, "197361"),
            Err(StoreError::UnknownCodeSystem {
                code_system_id: well_known::RXNORM_OID.to_string()
            })
        );
    }

    #[test]
    fn test_code_system_registered_under_alias_oid() {
        let mut schema = schema();
        schema.register("1.2.3", "Local LOINC", CodeSystemKind::Loinc);
        let store = VocabularyStore::new(schema);
        store.refresh(vec![codes(vec![loinc("8480-6", "Systolic blood pressure")])]);

        let connection = store.active_connection();
        assert_eq!(connection.fetch_codes("1.2.3", "8480-6").unwrap().len(), 1);
        assert_eq!(connection.fetch_codes(well_known::LOINC_OID, "8480-6").unwrap().len(), 1);
    }

    #[test]
    fn test_schema_mismatch_is_reported() {
        let mut schema = schema();
        schema.register(well_known::ICD10_CM_OID, "ICD-10-CM", CodeSystemKind::Icd10Pcs);
        let store = VocabularyStore::new(schema);
        store.refresh(vec![codes(vec![CodeRecord::Icd10Cm(Icd10Code {
            code: "I10".to_string(),
            display_name: "Essential (primary) hypertension".to_string(),
            billable: true,
        })])]);

        let connection = store.active_connection();
        assert!(matches!(
            connection.fetch_codes(well_known::ICD10_CM_OID, "I10"),
            Err(StoreError::SchemaMismatch { expected: CodeSystemKind::Icd10Pcs, found: CodeSystemKind::Icd10Cm, .. })
        ));
    }

    #[test]
    fn test_value_set_queries_fan_out_and_keep_duplicates() {
        let store = VocabularyStore::new(schema());
        store.refresh(vec![value_sets(vec![
            vsac("VS1", "8480-6", "Systolic blood pressure"),
            vsac("VS1", "8462-4", "Diastolic blood pressure"),
            phin("VS1", "8480-6", "Systolic blood pressure"),
            vsac("VS2", "8480-6", "Systolic blood pressure"),
        ])]);

        let connection = store.active_connection();
        assert_eq!(connection.fetch_value_set_codes("VS1", "8480-6").len(), 2);
        assert_eq!(
            connection
                .fetch_value_set_descriptions("VS1", "Diastolic blood pressure")
                .len(),
            1
        );
        assert_eq!(
            connection.fetch_value_set_names("VS1"),
            vec!["Vital Sign Result Type", "Vital Sign Result Type"]
        );

        let systems = connection.fetch_code_systems("VS1");
        assert_eq!(systems.len(), 2);
        assert!(systems.iter().all(|p| p.code_system_id == well_known::LOINC_OID));

        assert!(connection.value_set_exists("VS2"));
        assert!(!connection.value_set_exists("VS3"));
        assert!(connection.fetch_value_set_codes("VS3", "8480-6").is_empty());
    }

    #[test]
    fn test_unregistered_variant_is_not_queried() {
        let mut schema = SchemaRegistry::new();
        schema.register_value_set_variant(ValueSetKind::Vsac);
        let store = VocabularyStore::new(schema);
        store.refresh(vec![value_sets(vec![phin("VS1", "C1", "D1")])]);

        assert!(!store.active_connection().value_set_exists("VS1"));
    }

    #[test]
    fn test_partition_merge() {
        let mut left = CodePartition::new();
        left.insert(loinc("8480-6", "Systolic blood pressure"));
        let mut right = CodePartition::new();
        right.insert(loinc("8462-4", "Diastolic blood pressure"));
        right.insert(CodeRecord::Icd10Cm(Icd10Code {
            code: "I10".to_string(),
            display_name: "Essential (primary) hypertension".to_string(),
            billable: true,
        }));

        left.merge(right);
        assert_eq!(left.record_count(), 3);
        assert_eq!(left.table(well_known::LOINC_OID).unwrap().len(), 2);
    }
}
