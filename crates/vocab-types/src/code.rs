//! Code system records.
//!
//! One struct per vocabulary, each carrying the attributes its distribution
//! provides, and the closed [`CodeRecord`] enum the store keeps in its code
//! tables. Every variant exposes the [`CodeModel`] capability set.

use crate::{CodeSystemKind, SctId};

/// Capabilities shared by every code record.
pub trait CodeModel {
    /// The code as it appears in clinical documents.
    fn code(&self) -> &str;

    /// One display name for the code. A code with several names is stored
    /// as several records.
    fn display_name(&self) -> &str;
}

/// A SNOMED CT concept paired with one of its description terms.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SnomedCode {
    /// Concept identifier rendered as text.
    pub code: String,
    /// Description term.
    pub display_name: String,
    /// Concept identifier.
    pub concept_id: SctId,
    /// Identifier of the description row the term came from.
    pub description_id: SctId,
    /// Description type (FSN, synonym).
    pub type_id: SctId,
}

/// Which LOINC name column a [`LoincCode`] display name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoincNameKind {
    /// `LONG_COMMON_NAME`.
    LongCommonName,
    /// `SHORTNAME`.
    ShortName,
    /// `COMPONENT`.
    Component,
}

/// A LOINC term with one of its names.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoincCode {
    /// `LOINC_NUM`, e.g. `8480-6`.
    pub code: String,
    /// The name selected by `name_kind`.
    pub display_name: String,
    /// Source column of `display_name`.
    pub name_kind: LoincNameKind,
    /// `PROPERTY` axis.
    pub property: String,
    /// `SYSTEM` axis.
    pub system: String,
    /// `SCALE_TYP` axis.
    pub scale_type: String,
}

/// An RxNorm concept name from `RXNCONSO.RRF`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RxNormCode {
    /// `RXCUI`.
    pub code: String,
    /// `STR`.
    pub display_name: String,
    /// Term type (`TTY`), e.g. `SCD` or `IN`.
    pub term_type: String,
    /// Atom identifier (`RXAUI`).
    pub rxaui: String,
}

/// An ICD-9-CM diagnosis or procedure code.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Icd9Code {
    /// Dotted code, e.g. `250.00`.
    pub code: String,
    /// Long description.
    pub display_name: String,
}

/// An ICD-10-CM or ICD-10-PCS code with one of its descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Icd10Code {
    /// Code, dotted for ICD-10-CM (`E11.9`), undotted for PCS.
    pub code: String,
    /// Short or long description.
    pub display_name: String,
    /// Whether the code is valid for submission (not a header).
    pub billable: bool,
}

/// One entry in a code system.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CodeRecord {
    /// SNOMED CT.
    Snomed(SnomedCode),
    /// LOINC.
    Loinc(LoincCode),
    /// RxNorm.
    RxNorm(RxNormCode),
    /// ICD-9-CM diagnoses.
    Icd9CmDx(Icd9Code),
    /// ICD-9-CM procedures.
    Icd9CmSg(Icd9Code),
    /// ICD-10-CM.
    Icd10Cm(Icd10Code),
    /// ICD-10-PCS.
    Icd10Pcs(Icd10Code),
}

impl CodeRecord {
    /// Returns the kind of record this is.
    pub fn kind(&self) -> CodeSystemKind {
        match self {
            Self::Snomed(_) => CodeSystemKind::Snomed,
            Self::Loinc(_) => CodeSystemKind::Loinc,
            Self::RxNorm(_) => CodeSystemKind::RxNorm,
            Self::Icd9CmDx(_) => CodeSystemKind::Icd9CmDx,
            Self::Icd9CmSg(_) => CodeSystemKind::Icd9CmSg,
            Self::Icd10Cm(_) => CodeSystemKind::Icd10Cm,
            Self::Icd10Pcs(_) => CodeSystemKind::Icd10Pcs,
        }
    }

    /// Returns the OID of the code system this record belongs to.
    pub fn code_system_id(&self) -> &'static str {
        self.kind().code_system_id()
    }
}

impl CodeModel for CodeRecord {
    fn code(&self) -> &str {
        match self {
            Self::Snomed(r) => &r.code,
            Self::Loinc(r) => &r.code,
            Self::RxNorm(r) => &r.code,
            Self::Icd9CmDx(r) | Self::Icd9CmSg(r) => &r.code,
            Self::Icd10Cm(r) | Self::Icd10Pcs(r) => &r.code,
        }
    }

    fn display_name(&self) -> &str {
        match self {
            Self::Snomed(r) => &r.display_name,
            Self::Loinc(r) => &r.display_name,
            Self::RxNorm(r) => &r.display_name,
            Self::Icd9CmDx(r) | Self::Icd9CmSg(r) => &r.display_name,
            Self::Icd10Cm(r) | Self::Icd10Pcs(r) => &r.display_name,
        }
    }
}

macro_rules! impl_code_model {
    ($($ty:ty),*) => {
        $(
            impl CodeModel for $ty {
                fn code(&self) -> &str {
                    &self.code
                }

                fn display_name(&self) -> &str {
                    &self.display_name
                }
            }
        )*
    };
}

impl_code_model!(SnomedCode, LoincCode, RxNormCode, Icd9Code, Icd10Code);
