//! Value-set records.
//!
//! Value-set sources each have their own record variant; [`ValueSetRecord`]
//! closes over them and every variant exposes the [`ValueSetModel`]
//! capability set.

use crate::ValueSetKind;

/// Capabilities shared by every value-set record.
pub trait ValueSetModel {
    /// OID of the value set.
    fn value_set_id(&self) -> &str;
    /// Human-readable name of the value set.
    fn value_set_name(&self) -> &str;
    /// Member code.
    fn code(&self) -> &str;
    /// Description the value set gives the code.
    fn description(&self) -> &str;
    /// OID of the code system the code is drawn from.
    fn code_system_id(&self) -> &str;
    /// Name of that code system as the value set spells it.
    fn code_system_name(&self) -> &str;
}

/// A member row from a VSAC value-set export.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VsacValueSet {
    /// Value Set OID.
    pub value_set_id: String,
    /// Value Set Name.
    pub value_set_name: String,
    /// Code.
    pub code: String,
    /// Description.
    pub description: String,
    /// Code System OID.
    pub code_system_id: String,
    /// Code System.
    pub code_system_name: String,
    /// Code System Version.
    pub code_system_version: String,
}

/// A member row from a PHIN VADS value-set export.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhinVadsValueSet {
    /// Value Set OID.
    pub value_set_id: String,
    /// Value Set Name.
    pub value_set_name: String,
    /// Value Set Version, when the export carries one.
    pub value_set_version: String,
    /// Concept Code.
    pub code: String,
    /// Concept Name.
    pub description: String,
    /// Code System OID.
    pub code_system_id: String,
    /// Code System Name.
    pub code_system_name: String,
}

/// One entry in a value set.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueSetRecord {
    /// VSAC export row.
    Vsac(VsacValueSet),
    /// PHIN VADS export row.
    PhinVads(PhinVadsValueSet),
}

impl ValueSetRecord {
    /// Returns the variant this record is stored under.
    pub fn kind(&self) -> ValueSetKind {
        match self {
            Self::Vsac(_) => ValueSetKind::Vsac,
            Self::PhinVads(_) => ValueSetKind::PhinVads,
        }
    }

    fn inner(&self) -> &dyn ValueSetModel {
        match self {
            Self::Vsac(r) => r,
            Self::PhinVads(r) => r,
        }
    }

    /// Returns the code-system projection of this record.
    pub fn code_system(&self) -> CodeSystemProjection {
        CodeSystemProjection {
            code_system_id: self.code_system_id().to_string(),
            code_system_name: self.code_system_name().to_string(),
        }
    }
}

impl ValueSetModel for ValueSetRecord {
    fn value_set_id(&self) -> &str {
        self.inner().value_set_id()
    }

    fn value_set_name(&self) -> &str {
        self.inner().value_set_name()
    }

    fn code(&self) -> &str {
        self.inner().code()
    }

    fn description(&self) -> &str {
        self.inner().description()
    }

    fn code_system_id(&self) -> &str {
        self.inner().code_system_id()
    }

    fn code_system_name(&self) -> &str {
        self.inner().code_system_name()
    }
}

macro_rules! impl_value_set_model {
    ($($ty:ty),*) => {
        $(
            impl ValueSetModel for $ty {
                fn value_set_id(&self) -> &str {
                    &self.value_set_id
                }

                fn value_set_name(&self) -> &str {
                    &self.value_set_name
                }

                fn code(&self) -> &str {
                    &self.code
                }

                fn description(&self) -> &str {
                    &self.description
                }

                fn code_system_id(&self) -> &str {
                    &self.code_system_id
                }

                fn code_system_name(&self) -> &str {
                    &self.code_system_name
                }
            }
        )*
    };
}

impl_value_set_model!(VsacValueSet, PhinVadsValueSet);

/// The code systems a value set draws from, as `(OID, name)` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodeSystemProjection {
    /// Code system OID.
    pub code_system_id: String,
    /// Code system name.
    pub code_system_name: String,
}
