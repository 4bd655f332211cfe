//! SNOMED CT Identifier (SCTID) type.

/// A SNOMED CT identifier (SCTID).
///
/// SCTIDs are 64-bit unsigned integers. The SNOMED CT loader parses them from
/// RF2 rows; the store keys SNOMED codes by their decimal text.
///
/// # Examples
///
/// ```
/// use vocab_types::SctId;
///
/// let concept_id: SctId = 38341003; // Hypertensive disorder
/// assert_eq!(concept_id.to_string(), "38341003");
/// ```
pub type SctId = u64;
