//! # vocab-loader
//!
//! Loaders for clinical vocabulary distribution files and the dual-generation
//! store they are published into.
//!
//! A source root holds one subdirectory per distribution (`SNOMED-CT`,
//! `LOINC`, `VSAC`, ...). The [`LoaderRegistry`] maps each directory name to
//! a [`Loader`]; a [`Reloader`] runs every loader into a fresh partition and
//! swaps it into the [`VocabularyStore`] only when all of them succeed.
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use vocab_loader::{LoaderRegistry, Reloader, SchemaRegistry, SourceKind, VocabularyStore};
//!
//! let mut schema = SchemaRegistry::new();
//! let loaders = LoaderRegistry::with_defaults(&mut schema);
//! let store = Arc::new(VocabularyStore::new(schema));
//!
//! let reloader = Reloader::new(Arc::clone(&store), Arc::new(loaders));
//! let report = reloader.reload(SourceKind::Code, Path::new("/data/codes"))?;
//! println!("{}", report);
//! # Ok::<(), vocab_loader::LoadError>(())
//! ```

#![warn(missing_docs)]

pub mod loader;
pub mod loaders;
pub mod parser;
pub mod registry;
pub mod reload;
pub mod schema;
pub mod store;
pub mod types;

pub use loader::{check_source_root, discover_sources, format_bytes};
pub use registry::{CodeLoader, Loader, LoaderRegistry, ValueSetLoader};
pub use reload::{
    build_code_partition, build_value_set_partition, PartitionBuild, ReloadReport, Reloader,
    SourceReport,
};
pub use schema::SchemaRegistry;
pub use store::{
    CodePartition, CodeTable, Connection, Generation, GenerationLabel, Partition, PartitionUpdate,
    StoreError, StoreResult, ValueSetPartition, ValueSetTable, VocabularyStore,
};
pub use types::{LoadConfig, LoadError, LoadResult, LoadStats, SourceDirectory, SourceKind};

// Re-export vocab-types for convenience
pub use vocab_types;
