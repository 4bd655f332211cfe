//! Loader contract and the directory-name → loader registry.

use std::fmt;
use std::path::PathBuf;

use vocab_types::{CodeSystemKind, ValueSetKind, VocabularyDefinition};

use crate::loaders::{
    Icd10Loader, Icd9Loader, LoincLoader, PhinVadsLoader, RxNormLoader, SnomedLoader, VsacLoader,
};
use crate::schema::SchemaRegistry;
use crate::store::{CodePartition, ValueSetPartition};
use crate::types::{LoadResult, LoadStats};

/// Parses one vocabulary or value-set distribution into records.
pub trait Loader: Send + Sync {
    /// Partition type the loader writes into.
    type Target;

    /// The code system OID or value-set authority name this loader produces.
    fn identifier(&self) -> &str;

    /// Parses `files` and writes every produced record into `target`.
    ///
    /// Files the loader does not recognise are ignored.
    fn load(&self, files: &[PathBuf], target: &mut Self::Target) -> LoadResult<LoadStats>;
}

/// A loader producing code records.
pub type CodeLoader = dyn Loader<Target = CodePartition>;

/// A loader producing value-set records.
pub type ValueSetLoader = dyn Loader<Target = ValueSetPartition>;

type Factory<L> = Box<dyn Fn() -> Box<L> + Send + Sync>;

struct Entry<L: ?Sized> {
    directory_name: String,
    build: Factory<L>,
}

/// Maps source directory names to loader constructors.
///
/// Directory names match without regard to ASCII case. Registration happens
/// at startup; afterwards the registry is shared read-only.
#[derive(Default)]
pub struct LoaderRegistry {
    code_loaders: Vec<Entry<CodeLoader>>,
    value_set_loaders: Vec<Entry<ValueSetLoader>>,
}

impl fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderRegistry")
            .field("code_loaders", &directory_names(&self.code_loaders))
            .field("value_set_loaders", &directory_names(&self.value_set_loaders))
            .finish()
    }
}

fn directory_names<L: ?Sized>(entries: &[Entry<L>]) -> Vec<&str> {
    entries.iter().map(|e| e.directory_name.as_str()).collect()
}

impl LoaderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in loader, registering their
    /// code systems and value-set variants into `schema`.
    pub fn with_defaults(schema: &mut SchemaRegistry) -> Self {
        let mut registry = Self::new();

        registry.register_code_loader(
            schema,
            "SNOMED-CT",
            VocabularyDefinition::for_kind(CodeSystemKind::Snomed),
            || Box::new(SnomedLoader::default()),
        );
        registry.register_code_loader(
            schema,
            "LOINC",
            VocabularyDefinition::for_kind(CodeSystemKind::Loinc),
            || Box::new(LoincLoader::default()),
        );
        registry.register_code_loader(
            schema,
            "RXNORM",
            VocabularyDefinition::for_kind(CodeSystemKind::RxNorm),
            || Box::new(RxNormLoader::default()),
        );
        for (directory, kind) in [
            ("ICD9CM_DX", CodeSystemKind::Icd9CmDx),
            ("ICD9CM_SG", CodeSystemKind::Icd9CmSg),
        ] {
            registry.register_code_loader(schema, directory, VocabularyDefinition::for_kind(kind), move || {
                Box::new(Icd9Loader::new(kind))
            });
        }
        for (directory, kind) in [
            ("ICD10CM", CodeSystemKind::Icd10Cm),
            ("ICD10PCS", CodeSystemKind::Icd10Pcs),
        ] {
            registry.register_code_loader(schema, directory, VocabularyDefinition::for_kind(kind), move || {
                Box::new(Icd10Loader::new(kind))
            });
        }

        registry.register_value_set_loader(schema, "VSAC", ValueSetKind::Vsac, || Box::new(VsacLoader::default()));
        registry.register_value_set_loader(schema, "PHINVADS", ValueSetKind::PhinVads, || {
            Box::new(PhinVadsLoader::default())
        });

        tracing::info!(
            "Registered {} code loaders and {} value set loaders",
            registry.code_loaders.len(),
            registry.value_set_loaders.len()
        );
        registry
    }

    /// Registers a code loader for `directory_name` and the code system it
    /// produces. A later registration for the same directory name wins.
    pub fn register_code_loader<F>(
        &mut self,
        schema: &mut SchemaRegistry,
        directory_name: impl Into<String>,
        definition: VocabularyDefinition,
        build: F,
    ) where
        F: Fn() -> Box<CodeLoader> + Send + Sync + 'static,
    {
        schema.register(definition.code_system_id, definition.code_system_name, definition.kind);
        insert(&mut self.code_loaders, directory_name.into(), Box::new(build));
    }

    /// Registers a value-set loader for `directory_name` and the variant it
    /// produces.
    pub fn register_value_set_loader<F>(
        &mut self,
        schema: &mut SchemaRegistry,
        directory_name: impl Into<String>,
        kind: ValueSetKind,
        build: F,
    ) where
        F: Fn() -> Box<ValueSetLoader> + Send + Sync + 'static,
    {
        schema.register_value_set_variant(kind);
        insert(&mut self.value_set_loaders, directory_name.into(), Box::new(build));
    }

    /// Builds the code loader for a source directory, if one is registered.
    pub fn build_code_loader(&self, directory_name: &str) -> Option<Box<CodeLoader>> {
        find(&self.code_loaders, directory_name)
    }

    /// Builds the value-set loader for a source directory, if one is registered.
    pub fn build_value_set_loader(&self, directory_name: &str) -> Option<Box<ValueSetLoader>> {
        find(&self.value_set_loaders, directory_name)
    }
}

fn insert<L: ?Sized>(entries: &mut Vec<Entry<L>>, directory_name: String, build: Factory<L>) {
    entries.retain(|e| !e.directory_name.eq_ignore_ascii_case(&directory_name));
    tracing::debug!("Registered loader for directory {}", directory_name);
    entries.push(Entry { directory_name, build });
}

fn find<L: ?Sized>(entries: &[Entry<L>], directory_name: &str) -> Option<Box<L>> {
    entries
        .iter()
        .find(|e| e.directory_name.eq_ignore_ascii_case(directory_name))
        .map(|e| (e.build)())
}
