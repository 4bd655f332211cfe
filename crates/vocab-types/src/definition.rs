//! Vocabulary definitions.

use crate::CodeSystemKind;

/// Binds a code system OID to the record kind that holds its codes.
///
/// Created once when a loader is registered and looked up by OID during
/// loading and validation.
///
/// # Examples
///
/// ```
/// use vocab_types::{CodeSystemKind, VocabularyDefinition};
///
/// let definition = VocabularyDefinition::for_kind(CodeSystemKind::RxNorm);
/// assert_eq!(definition.code_system_id, "2.16.840.1.113883.6.88");
/// assert_eq!(definition.code_system_name, "RXNORM");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VocabularyDefinition {
    /// Code system OID.
    pub code_system_id: String,
    /// Human-readable code system name.
    pub code_system_name: String,
    /// Record kind responsible for the code system's codes.
    pub kind: CodeSystemKind,
}

impl VocabularyDefinition {
    /// Creates a definition.
    pub fn new(
        code_system_id: impl Into<String>,
        code_system_name: impl Into<String>,
        kind: CodeSystemKind,
    ) -> Self {
        Self {
            code_system_id: code_system_id.into(),
            code_system_name: code_system_name.into(),
            kind,
        }
    }

    /// Creates the canonical definition of a code system kind.
    pub fn for_kind(kind: CodeSystemKind) -> Self {
        Self::new(kind.code_system_id(), kind.code_system_name(), kind)
    }
}
