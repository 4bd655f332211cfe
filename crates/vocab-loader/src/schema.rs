//! Record schema registry.
//!
//! Maps code system OIDs to their [`VocabularyDefinition`] and keeps the
//! ordered set of registered value-set variants. Registration happens once,
//! before the registry is handed to a [`VocabularyStore`](crate::VocabularyStore);
//! the store only ever reads it.

use std::collections::HashMap;

use vocab_types::{CodeSystemKind, ValueSetKind, VocabularyDefinition};

/// Registered code systems and value-set variants.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    vocabularies: HashMap<String, VocabularyDefinition>,
    value_set_variants: Vec<ValueSetKind>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the definition for `code_system_id`.
    pub fn register(
        &mut self,
        code_system_id: impl Into<String>,
        code_system_name: impl Into<String>,
        kind: CodeSystemKind,
    ) -> &VocabularyDefinition {
        let definition = VocabularyDefinition::new(code_system_id, code_system_name, kind);
        let key = definition.code_system_id.clone();
        tracing::debug!(
            "Registered code system {} ({}) as {:?}",
            definition.code_system_id,
            definition.code_system_name,
            kind
        );
        self.vocabularies.insert(key.clone(), definition);
        &self.vocabularies[&key]
    }

    /// Looks up the definition for a code system OID. The match is exact.
    pub fn lookup(&self, code_system_id: &str) -> Option<&VocabularyDefinition> {
        self.vocabularies.get(code_system_id)
    }

    /// Adds a value-set variant. Registering a variant twice has no effect.
    pub fn register_value_set_variant(&mut self, kind: ValueSetKind) {
        if !self.value_set_variants.contains(&kind) {
            tracing::debug!("Registered value set variant {}", kind);
            self.value_set_variants.push(kind);
        }
    }

    /// Returns every registered value-set variant, in registration order.
    pub fn all_value_set_variants(&self) -> &[ValueSetKind] {
        &self.value_set_variants
    }

    /// Returns the number of registered code systems.
    pub fn code_system_count(&self) -> usize {
        self.vocabularies.len()
    }
}
