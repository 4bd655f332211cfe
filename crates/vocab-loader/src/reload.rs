//! Rebuild of a generation from source directories.
//!
//! A rebuild discovers the source subdirectories of a root, resolves a loader
//! for each, and loads every source into a fresh partition. Only a rebuild
//! that completes without error is published to the store; a failure leaves
//! both generations exactly as they were.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::loader::discover_sources;
use crate::registry::{Loader, LoaderRegistry};
use crate::store::{
    CodePartition, GenerationLabel, Partition, PartitionUpdate, ValueSetPartition, VocabularyStore,
};
use crate::types::{LoadError, LoadResult, LoadStats, SourceDirectory, SourceKind};

/// Outcome of loading one source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    /// Source subdirectory name.
    pub directory: String,
    /// Identifier of the loader that read it.
    pub loader: String,
    /// What the loader read.
    pub stats: LoadStats,
}

/// Outcome of one rebuild-and-swap cycle.
#[derive(Debug, Clone)]
pub struct ReloadReport {
    /// Stream that was rebuilt.
    pub kind: SourceKind,
    /// Sources that were loaded.
    pub sources: Vec<SourceReport>,
    /// Subdirectories without a matching loader.
    pub skipped: Vec<String>,
    /// Generation active after the swap.
    pub generation: GenerationLabel,
    /// Wall time of the rebuild.
    pub elapsed: Duration,
}

impl ReloadReport {
    /// Sums the statistics of every loaded source.
    pub fn stats(&self) -> LoadStats {
        let mut total = LoadStats::default();
        for source in &self.sources {
            total.merge(&source.stats);
        }
        total
    }
}

impl fmt::Display for ReloadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} reload: {} sources, {} skipped, generation {} active after {:.2?} ({})",
            self.kind,
            self.sources.len(),
            self.skipped.len(),
            self.generation,
            self.elapsed,
            self.stats()
        )
    }
}

/// A partition built from one source root, not yet published.
#[derive(Debug)]
pub struct PartitionBuild<P> {
    /// The loaded records.
    pub partition: P,
    /// Per-source outcomes.
    pub sources: Vec<SourceReport>,
    /// Subdirectories without a matching loader.
    pub skipped: Vec<String>,
}

type Job<P> = (SourceDirectory, Box<dyn Loader<Target = P>>);

fn load_source<P: Partition + 'static>((source, loader): Job<P>) -> LoadResult<(P, SourceReport)> {
    tracing::debug!(
        "Loading {} ({} files) with loader {}",
        source.name,
        source.files.len(),
        loader.identifier()
    );

    let mut partition = P::default();
    let stats = loader
        .load(&source.files, &mut partition)
        .map_err(|e| LoadError::Source {
            directory: source.name.clone(),
            loader: loader.identifier().to_string(),
            source: Box::new(e),
        })?;

    tracing::info!("Loaded {}: {}", source.name, stats);
    Ok((
        partition,
        SourceReport {
            directory: source.name,
            loader: loader.identifier().to_string(),
            stats,
        },
    ))
}

fn build_partition<P, F>(root: &Path, resolve: F) -> LoadResult<PartitionBuild<P>>
where
    P: Partition + 'static,
    F: Fn(&str) -> Option<Box<dyn Loader<Target = P>>>,
{
    let mut jobs: Vec<Job<P>> = Vec::new();
    let mut skipped = Vec::new();
    for source in discover_sources(root)? {
        match resolve(&source.name) {
            Some(loader) => jobs.push((source, loader)),
            None => {
                tracing::warn!("No loader registered for directory {}, skipping", source.path.display());
                skipped.push(source.name);
            }
        }
    }

    #[cfg(feature = "parallel")]
    let loaded = jobs
        .into_par_iter()
        .map(load_source)
        .collect::<LoadResult<Vec<_>>>()?;

    #[cfg(not(feature = "parallel"))]
    let loaded = jobs
        .into_iter()
        .map(load_source)
        .collect::<LoadResult<Vec<_>>>()?;

    let mut partition = P::default();
    let mut sources = Vec::with_capacity(loaded.len());
    for (part, report) in loaded {
        partition.merge(part);
        sources.push(report);
    }

    Ok(PartitionBuild {
        partition,
        sources,
        skipped,
    })
}

/// Loads every code source under `root` into a new partition.
pub fn build_code_partition(root: &Path, loaders: &LoaderRegistry) -> LoadResult<PartitionBuild<CodePartition>> {
    build_partition(root, |name| loaders.build_code_loader(name))
}

/// Loads every value-set source under `root` into a new partition.
pub fn build_value_set_partition(
    root: &Path,
    loaders: &LoaderRegistry,
) -> LoadResult<PartitionBuild<ValueSetPartition>> {
    build_partition(root, |name| loaders.build_value_set_loader(name))
}

/// Runs rebuild-and-swap cycles against a store.
///
/// Each stream has its own lock, so at most one cycle per stream is in
/// flight while code and value-set cycles may overlap.
#[derive(Debug)]
pub struct Reloader {
    store: Arc<VocabularyStore>,
    loaders: Arc<LoaderRegistry>,
    code_cycle: Mutex<()>,
    value_set_cycle: Mutex<()>,
}

impl Reloader {
    /// Creates a reloader.
    pub fn new(store: Arc<VocabularyStore>, loaders: Arc<LoaderRegistry>) -> Self {
        Self {
            store,
            loaders,
            code_cycle: Mutex::new(()),
            value_set_cycle: Mutex::new(()),
        }
    }

    /// Returns the store this reloader publishes into.
    pub fn store(&self) -> &Arc<VocabularyStore> {
        &self.store
    }

    fn build(&self, kind: SourceKind, root: &Path) -> LoadResult<(PartitionUpdate, Vec<SourceReport>, Vec<String>)> {
        tracing::info!("Loading {} sources from {}", kind, root.display());
        match kind {
            SourceKind::Code => {
                let build = build_code_partition(root, &self.loaders)?;
                Ok((PartitionUpdate::Codes(Arc::new(build.partition)), build.sources, build.skipped))
            }
            SourceKind::ValueSet => {
                let build = build_value_set_partition(root, &self.loaders)?;
                Ok((
                    PartitionUpdate::ValueSets(Arc::new(build.partition)),
                    build.sources,
                    build.skipped,
                ))
            }
        }
    }

    /// Rebuilds one stream from `root` and swaps it in.
    ///
    /// # Errors
    /// Returns the first discovery or loader failure. Nothing is published
    /// in that case.
    pub fn reload(&self, kind: SourceKind, root: &Path) -> LoadResult<ReloadReport> {
        let _cycle = match kind {
            SourceKind::Code => self.code_cycle.lock(),
            SourceKind::ValueSet => self.value_set_cycle.lock(),
        };

        let started = Instant::now();
        let (update, sources, skipped) = self.build(kind, root).map_err(|e| {
            tracing::error!("Rebuild of {} sources from {} failed: {}", kind, root.display(), e);
            e
        })?;

        let generation = self.store.refresh(vec![update]);
        let report = ReloadReport {
            kind,
            sources,
            skipped,
            generation,
            elapsed: started.elapsed(),
        };
        self.log_active(&report);
        Ok(report)
    }

    /// Rebuilds both streams and publishes them with a single swap.
    ///
    /// Used for the initial load. A missing root leaves that stream as is.
    pub fn reload_all(&self, code_root: Option<&Path>, value_set_root: Option<&Path>) -> LoadResult<Vec<ReloadReport>> {
        let _code_cycle = self.code_cycle.lock();
        let _value_set_cycle = self.value_set_cycle.lock();

        let started = Instant::now();
        let mut updates = Vec::new();
        let mut pending = Vec::new();
        for (kind, root) in [(SourceKind::Code, code_root), (SourceKind::ValueSet, value_set_root)] {
            let Some(root) = root else { continue };
            let (update, sources, skipped) = self.build(kind, root).map_err(|e| {
                tracing::error!("Initial load of {} sources from {} failed: {}", kind, root.display(), e);
                e
            })?;
            updates.push(update);
            pending.push((kind, sources, skipped));
        }

        if updates.is_empty() {
            return Ok(Vec::new());
        }

        let generation = self.store.refresh(updates);
        let elapsed = started.elapsed();
        let reports: Vec<ReloadReport> = pending
            .into_iter()
            .map(|(kind, sources, skipped)| ReloadReport {
                kind,
                sources,
                skipped,
                generation,
                elapsed,
            })
            .collect();
        for report in &reports {
            self.log_active(report);
        }
        Ok(reports)
    }

    fn log_active(&self, report: &ReloadReport) {
        let connection = self.store.active_connection();
        tracing::info!(
            "{}; generation {} holds {} codes and {} value set records",
            report,
            connection.label(),
            connection.code_count(),
            connection.value_set_record_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaRegistry;
    use std::fs;
    use vocab_types::well_known;

    const LOINC_HEADER: &str = "LOINC_NUM,COMPONENT,PROPERTY,SYSTEM,SCALE_TYP,STATUS,SHORTNAME,LONG_COMMON_NAME";

    fn reloader() -> Reloader {
        let mut schema = SchemaRegistry::new();
        let loaders = LoaderRegistry::with_defaults(&mut schema);
        Reloader::new(Arc::new(VocabularyStore::new(schema)), Arc::new(loaders))
    }

    fn write_loinc(root: &Path, body: &str) {
        let dir = root.join("LOINC");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Loinc.csv"), body).unwrap();
    }

    fn write_vsac(root: &Path) {
        let dir = root.join("VSAC");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("export.txt"),
            "Value Set Name\tValue Set OID\tCode\tDescription\tCode System\tCode System OID\tCode System Version\n\
             Vital Signs\tVS1\t8480-6\tSystolic blood pressure\tLOINC\t2.16.840.1.113883.6.1\t2.77\n",
        )
        .unwrap();
    }

    #[test]
    fn test_reload_loads_and_swaps() {
        let root = tempfile::tempdir().unwrap();
        write_loinc(
            root.path(),
            &format!("{}\n8480-6,Intravascular systolic,Pres,Arterial system,Qn,ACTIVE,BP sys,Systolic blood pressure\n", LOINC_HEADER),
        );
        fs::create_dir(root.path().join("CPT")).unwrap();

        let reloader = reloader();
        let report = reloader.reload(SourceKind::Code, root.path()).unwrap();

        assert_eq!(report.generation, GenerationLabel::B);
        assert_eq!(report.skipped, vec!["CPT".to_string()]);
        assert_eq!(report.sources.len(), 1);
        assert_eq!(report.stats().records, 3);

        let store = reloader.store();
        let connection = store.active_connection();
        assert_eq!(connection.fetch_codes(well_known::LOINC_OID, "8480-6").unwrap().len(), 3);
        assert_eq!(store.inactive_connection().code_count(), 3);
    }

    #[test]
    fn test_failed_rebuild_leaves_active_generation_unchanged() {
        let root = tempfile::tempdir().unwrap();
        write_loinc(
            root.path(),
            &format!("{}\n8480-6,Intravascular systolic,Pres,Arterial system,Qn,ACTIVE,BP sys,Systolic blood pressure\n", LOINC_HEADER),
        );
        let reloader = reloader();
        reloader.reload(SourceKind::Code, root.path()).unwrap();

        let store = reloader.store();
        let label = store.active_label();
        let before: Vec<_> = store
            .active_connection()
            .fetch_codes(well_known::LOINC_OID, "8480-6")
            .unwrap()
            .into_iter()
            .cloned()
            .collect();

        write_loinc(root.path(), "LOINC_NUM,COMPONENT\n2345-7,Glucose\n");
        let error = reloader.reload(SourceKind::Code, root.path()).unwrap_err();
        assert!(matches!(error, LoadError::Source { ref directory, .. } if directory == "LOINC"));

        assert_eq!(store.active_label(), label);
        let after: Vec<_> = store
            .active_connection()
            .fetch_codes(well_known::LOINC_OID, "8480-6")
            .unwrap()
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(before, after);
        assert_eq!(store.inactive_connection().code_count(), 3);
    }

    #[test]
    fn test_reload_of_missing_root_fails() {
        let root = tempfile::tempdir().unwrap();
        let reloader = reloader();
        assert!(matches!(
            reloader.reload(SourceKind::ValueSet, &root.path().join("absent")),
            Err(LoadError::DirectoryNotFound { .. })
        ));
        assert_eq!(reloader.store().active_label(), GenerationLabel::A);
    }

    #[test]
    fn test_reload_all_swaps_once() {
        let codes = tempfile::tempdir().unwrap();
        let value_sets = tempfile::tempdir().unwrap();
        write_loinc(
            codes.path(),
            &format!("{}\n8480-6,Intravascular systolic,Pres,Arterial system,Qn,ACTIVE,,Systolic blood pressure\n", LOINC_HEADER),
        );
        write_vsac(value_sets.path());

        let reloader = reloader();
        let reports = reloader
            .reload_all(Some(codes.path()), Some(value_sets.path()))
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.generation == GenerationLabel::B));

        let store = reloader.store();
        for connection in [store.active_connection(), store.inactive_connection()] {
            assert_eq!(connection.code_count(), 2);
            assert!(connection.value_set_exists("VS1"));
        }
    }

    #[test]
    fn test_reload_all_without_roots_does_nothing() {
        let reloader = reloader();
        assert!(reloader.reload_all(None, None).unwrap().is_empty());
        assert_eq!(reloader.store().active_label(), GenerationLabel::A);
    }
}
