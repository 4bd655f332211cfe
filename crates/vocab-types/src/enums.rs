//! Vocabulary enumeration types.
//!
//! This module provides the closed sets of record kinds the store knows about:
//! one [`CodeSystemKind`] per code vocabulary and one [`ValueSetKind`] per
//! value-set source, plus the SNOMED CT description type used by the RF2 loader.

use crate::well_known;
use crate::SctId;

/// The record handler responsible for the codes of one code system.
///
/// Every code table in a generation is tagged with the kind of record it
/// holds, and every registered code system names the kind it expects.
///
/// # Examples
///
/// ```
/// use vocab_types::CodeSystemKind;
///
/// let kind = CodeSystemKind::from_code_system_id("2.16.840.1.113883.6.96");
/// assert_eq!(kind, Some(CodeSystemKind::Snomed));
/// assert_eq!(CodeSystemKind::Loinc.code_system_name(), "LOINC");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CodeSystemKind {
    /// SNOMED CT concepts.
    Snomed,
    /// LOINC observation codes.
    Loinc,
    /// RxNorm normalized drug names.
    RxNorm,
    /// ICD-9-CM diagnosis codes.
    Icd9CmDx,
    /// ICD-9-CM procedure codes.
    Icd9CmSg,
    /// ICD-10-CM diagnosis codes.
    Icd10Cm,
    /// ICD-10-PCS procedure codes.
    Icd10Pcs,
}

impl CodeSystemKind {
    /// Every code system kind, in registration order.
    pub const ALL: [CodeSystemKind; 7] = [
        Self::Snomed,
        Self::Loinc,
        Self::RxNorm,
        Self::Icd9CmDx,
        Self::Icd9CmSg,
        Self::Icd10Cm,
        Self::Icd10Pcs,
    ];

    /// Returns the canonical OID of this code system.
    pub fn code_system_id(self) -> &'static str {
        match self {
            Self::Snomed => well_known::SNOMED_CT_OID,
            Self::Loinc => well_known::LOINC_OID,
            Self::RxNorm => well_known::RXNORM_OID,
            Self::Icd9CmDx => well_known::ICD9_CM_DX_OID,
            Self::Icd9CmSg => well_known::ICD9_CM_SG_OID,
            Self::Icd10Cm => well_known::ICD10_CM_OID,
            Self::Icd10Pcs => well_known::ICD10_PCS_OID,
        }
    }

    /// Returns the human-readable code system name.
    pub fn code_system_name(self) -> &'static str {
        match self {
            Self::Snomed => "SNOMED-CT",
            Self::Loinc => "LOINC",
            Self::RxNorm => "RXNORM",
            Self::Icd9CmDx => "ICD-9-CM",
            Self::Icd9CmSg => "ICD-9-CM Procedures",
            Self::Icd10Cm => "ICD-10-CM",
            Self::Icd10Pcs => "ICD-10-PCS",
        }
    }

    /// Finds the kind whose canonical OID equals `id`.
    pub fn from_code_system_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code_system_id() == id)
    }
}

impl std::fmt::Display for CodeSystemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code_system_name())
    }
}

/// A value-set record variant.
///
/// Each value-set source keeps its own table in a generation. Queries fan out
/// across every registered variant and merge the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueSetKind {
    /// NLM Value Set Authority Center exports.
    Vsac,
    /// CDC PHIN Vocabulary Access and Distribution System exports.
    PhinVads,
}

impl ValueSetKind {
    /// Returns the name of the value-set authority.
    pub fn authority_name(self) -> &'static str {
        match self {
            Self::Vsac => "VSAC",
            Self::PhinVads => "PHINVADS",
        }
    }
}

impl std::fmt::Display for ValueSetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.authority_name())
    }
}

/// Description type for SNOMED CT descriptions.
///
/// # Examples
///
/// ```
/// use vocab_types::DescriptionType;
///
/// let desc_type = DescriptionType::from_id(900000000000003001);
/// assert_eq!(desc_type, Some(DescriptionType::Fsn));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DescriptionType {
    /// Fully Specified Name - unambiguous description with semantic tag.
    Fsn,
    /// Synonym - additional acceptable term for the concept.
    Synonym,
    /// Definition - textual definition (from text definition refset).
    Definition,
}

impl DescriptionType {
    /// SCTID for Fully Specified Name type.
    pub const FSN_ID: SctId = 900000000000003001;
    /// SCTID for Synonym type.
    pub const SYNONYM_ID: SctId = 900000000000013009;
    /// SCTID for Definition type.
    pub const DEFINITION_ID: SctId = 900000000000550004;

    /// Creates a DescriptionType from its SCTID.
    ///
    /// Returns `None` if the ID doesn't match a known description type.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::FSN_ID => Some(Self::Fsn),
            Self::SYNONYM_ID => Some(Self::Synonym),
            Self::DEFINITION_ID => Some(Self::Definition),
            _ => None,
        }
    }
}
