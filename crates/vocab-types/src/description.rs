//! SNOMED CT RF2 description row.
//!
//! The SNOMED CT loader reads `sct2_Description_*.txt` rows into
//! [`Rf2Description`] and converts each active row into a
//! [`SnomedCode`](crate::SnomedCode).

use crate::{DescriptionType, SctId, SnomedCode};

/// A SNOMED CT description from the RF2 Description file.
///
/// # Examples
///
/// ```
/// use vocab_types::{CodeModel, Rf2Description, SnomedCode};
///
/// let description = Rf2Description {
///     id: 64176011,
///     effective_time: 20020131,
///     active: true,
///     module_id: 900000000000207008,
///     concept_id: 38341003,
///     language_code: "en".to_string(),
///     type_id: 900000000000013009,
///     term: "Hypertension".to_string(),
///     case_significance_id: 900000000000448009,
/// };
///
/// let code = SnomedCode::from(description);
/// assert_eq!(code.code(), "38341003");
/// assert_eq!(code.display_name(), "Hypertension");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rf2Description {
    /// Unique identifier for this description (SCTID).
    pub id: SctId,
    /// Effective date in YYYYMMDD format.
    pub effective_time: u32,
    /// Whether this description is active.
    pub active: bool,
    /// The module containing this description.
    pub module_id: SctId,
    /// The concept this description belongs to.
    pub concept_id: SctId,
    /// ISO language code (e.g., "en").
    pub language_code: String,
    /// Type of description (FSN, Synonym, etc.).
    pub type_id: SctId,
    /// The description text/term.
    pub term: String,
    /// Case significance rules for this term.
    pub case_significance_id: SctId,
}

impl Rf2Description {
    /// Returns the description type enum value.
    pub fn description_type(&self) -> Option<DescriptionType> {
        DescriptionType::from_id(self.type_id)
    }
}

impl From<Rf2Description> for SnomedCode {
    fn from(description: Rf2Description) -> Self {
        SnomedCode {
            code: description.concept_id.to_string(),
            display_name: description.term,
            concept_id: description.concept_id,
            description_id: description.id,
            type_id: description.type_id,
        }
    }
}
