use crate::classify::{AssetCategory, Classification, classify};
use crate::config::FlattenConfig;
use crate::error::{EngineError, EngineErrorExt};
use crate::layout::PluginLayout;
use crate::maintenance::purge_stale_staging;
use crate::manifest::{ManifestSet, MergeReport};
use crate::mapping::RenameMapping;
use crate::mover::{MoveOutcome, move_file};
use crate::namer::NameAllocator;
use crate::namespace::{Candidate, discover_namespaces, enumerate_candidates};
use crate::progress::{Phase, ProgressSink};
use crate::report::FlattenReport;
use crate::rewrite::{ReferenceRewriter, RewriteOutcome, collect_text_files};
use futures::{StreamExt, stream};
use fxhash::FxHashSet;
use private::Sealed;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

/// A move decided during planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub candidate: Candidate,
    pub category: AssetCategory,
    /// Collision-free file name inside the category's destination.
    pub new_name: String,
    pub target: PathBuf,
}

/// Everything decided before the first file is touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Moves in enumeration order.
    pub moves: Vec<PlannedMove>,
    pub manifests: ManifestSet,
    /// Non-manifest candidates, moved or not; the total of the flattening phase.
    pub candidates: usize,
    pub unclassified: usize,
    /// Repeated enumerations of an already planned path, dropped from the plan.
    pub duplicates: usize,
}

#[derive(Debug, Default)]
pub struct NoBase;
#[derive(Debug)]
pub struct WithBase(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoBase {}
impl Sealed for WithBase {}

#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct FlattenerBuilder<S: Sealed = NoBase> {
    state: S,
    config: FlattenConfig,
}

#[allow(private_bounds)]
impl<S: Sealed> FlattenerBuilder<S> {
    #[must_use = "Replaces the default run configuration"]
    pub fn config(mut self, config: FlattenConfig) -> Self {
        self.config = config;
        self
    }
}

impl FlattenerBuilder<NoBase> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory the configured plugin path is resolved against, usually the server root.
    #[must_use = "Sets the base directory of the run"]
    pub fn base_dir(self, path: impl Into<PathBuf>) -> FlattenerBuilder<WithBase> {
        FlattenerBuilder { state: WithBase(path.into()), config: self.config }
    }
}

impl FlattenerBuilder<WithBase> {
    /// Locates the plugin directory. Nothing is created or moved yet.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PluginNotFound`] if the plugin directory is missing.
    pub fn build(self) -> Result<Flattener, EngineError> {
        let layout = PluginLayout::detect(&self.state.0, &self.config)?;
        info!(path = %layout.root().display(), "Plugin directory located");
        Ok(Flattener { layout, config: self.config })
    }
}

/// Flattens one `ItemsAdder` plugin directory in place.
///
/// A run goes through four phases: [`plan`](Self::plan),
/// [`relocate`](Self::relocate), [`merge_manifests`](Self::merge_manifests) and
/// [`update_references`](Self::update_references). [`run`](Self::run) chains them
/// after bootstrapping the destinations.
///
/// Dropping the future of a run between two units leaves every finished move in
/// place and every other file untouched.
#[derive(Debug, Clone)]
pub struct Flattener {
    layout: PluginLayout,
    config: FlattenConfig,
}

impl Flattener {
    #[must_use]
    pub fn builder() -> FlattenerBuilder {
        FlattenerBuilder::new()
    }

    #[must_use]
    pub const fn layout(&self) -> &PluginLayout {
        &self.layout
    }

    #[must_use]
    pub const fn config(&self) -> &FlattenConfig {
        &self.config
    }

    /// Runs every phase.
    ///
    /// # Errors
    ///
    /// Fails only if the destinations cannot be created, the rename pattern cannot be
    /// compiled, a merged manifest cannot be written or a worker task panics. Problems
    /// with individual files are counted in the report instead.
    pub async fn run(&self, progress: &dyn ProgressSink) -> Result<FlattenReport, EngineError> {
        self.layout.prepare().await?;

        let mut report = FlattenReport {
            stale_staging_removed: purge_stale_staging(self.layout.rewrite_roots()).await,
            ..FlattenReport::default()
        };

        let plan = self.plan().await?;
        report.candidates = plan.candidates;
        report.unclassified = plan.unclassified;

        let mapping = self.relocate(&plan, progress, &mut report).await?;

        let merged = self.merge_manifests(&plan.manifests, progress).await?;
        report.sound_registries_merged = merged.sound_registries;
        report.font_lists_merged = merged.font_lists;
        report.manifests_skipped = merged.skipped;

        self.update_references(&mapping, progress, &mut report).await?;

        info!(%report, "Flatten finished");
        Ok(report)
    }

    /// Discovers, classifies and names every candidate on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Task`] if the planning task panics.
    pub async fn plan(&self) -> Result<Plan, EngineError> {
        let layout = self.layout.clone();
        let reserved_prefix = self.config.reserved_prefix.clone();

        let plan = tokio::task::spawn_blocking(move || build_plan(&layout, &reserved_prefix))
            .await
            .context("Planning task panicked")?;

        debug!(
            moves = plan.moves.len(),
            manifests = plan.manifests.len(),
            unclassified = plan.unclassified,
            duplicates = plan.duplicates,
            "Plan ready"
        );
        Ok(plan)
    }

    /// Executes the planned moves and returns the resulting mapping.
    ///
    /// Moves run concurrently up to the configured limit; their results are folded in
    /// enumeration order, so the mapping does not depend on scheduling.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Task`] if a move task panics. Failed moves are counted.
    pub async fn relocate(
        &self,
        plan: &Plan,
        progress: &dyn ProgressSink,
        report: &mut FlattenReport,
    ) -> Result<RenameMapping, EngineError> {
        progress.begin(Phase::Flattening, plan.candidates as u64);
        if plan.unclassified > 0 {
            progress.advance(Phase::Flattening, plan.unclassified as u64);
        }
        report.already_moved += plan.duplicates;

        let mut mapping = RenameMapping::new();
        let mut results = stream::iter(&plan.moves)
            .map(|planned| async move {
                (planned, move_file(planned.candidate.path(), &planned.target).await)
            })
            .buffered(self.config.concurrency());

        while let Some((planned, result)) = results.next().await {
            match result {
                Ok(MoveOutcome::Moved) => {
                    mapping.record(
                        planned.candidate.namespace().as_str(),
                        &planned.candidate.file_name(),
                        &planned.new_name,
                    );
                    report.count_move(planned.category);
                },
                Ok(MoveOutcome::SourceMissing) => report.already_moved += 1,
                Err(err @ EngineError::Task { .. }) => return Err(err),
                Err(err) => {
                    warn!(src = %planned.candidate.path().display(), error = %err, "Move failed");
                    report.move_failures += 1;
                },
            }
            progress.advance(Phase::Flattening, 1);
        }

        progress.finish(Phase::Flattening);
        info!(moved = report.moved(), keys = mapping.len(), "Relocation finished");
        Ok(mapping)
    }

    /// Merges the collected `sounds.json` and `fonts.json` instances.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if a merged output cannot be written.
    pub async fn merge_manifests(
        &self,
        manifests: &ManifestSet,
        progress: &dyn ProgressSink,
    ) -> Result<MergeReport, EngineError> {
        crate::manifest::merge_manifests(&self.layout, manifests, progress).await
    }

    /// Rewrites references in every text file below the destination roots and returns
    /// the number of files changed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Pattern`] if the mapping cannot be compiled and
    /// [`EngineError::Task`] if the file scan panics.
    pub async fn update_references(
        &self,
        mapping: &RenameMapping,
        progress: &dyn ProgressSink,
        report: &mut FlattenReport,
    ) -> Result<usize, EngineError> {
        let rewriter = ReferenceRewriter::new(mapping)?;
        let roots = self.layout.rewrite_roots();
        let files = tokio::task::spawn_blocking(move || collect_text_files(&roots))
            .await
            .context("Text file scan panicked")?;

        progress.begin(Phase::UpdatingConfigs, files.len() as u64);
        report.text_files_scanned = files.len();

        let mut outcomes = stream::iter(&files)
            .map(|path| rewriter.rewrite_file(path))
            .buffer_unordered(self.config.concurrency());

        let mut updated = 0;
        while let Some(outcome) = outcomes.next().await {
            match outcome {
                RewriteOutcome::Updated => updated += 1,
                RewriteOutcome::Unchanged => {},
                RewriteOutcome::Skipped(_) => report.text_files_skipped += 1,
            }
            progress.advance(Phase::UpdatingConfigs, 1);
        }

        progress.finish(Phase::UpdatingConfigs);
        report.config_files_updated = updated;
        Ok(updated)
    }
}

fn build_plan(layout: &PluginLayout, reserved_prefix: &str) -> Plan {
    let namespaces = discover_namespaces(layout, reserved_prefix);
    let mut names = NameAllocator::new();
    let mut seen = FxHashSet::default();
    let mut plan = Plan::default();

    for candidate in enumerate_candidates(layout, &namespaces) {
        if !seen.insert(candidate.path().to_path_buf()) {
            trace!(path = %candidate.path().display(), "Duplicate enumeration");
            plan.duplicates += 1;
            continue;
        }

        let category = match classify(&candidate) {
            Classification::Manifest(kind) => {
                plan.manifests.push(kind, candidate.path().to_path_buf());
                continue;
            },
            Classification::Category(category) => category,
        };

        plan.candidates += 1;
        let Some(dest) = layout.destination(category) else {
            plan.unclassified += 1;
            continue;
        };

        let new_name = names.allocate(candidate.namespace().as_str(), &candidate.file_name(), &dest);
        let target = dest.join(&new_name);
        plan.moves.push(PlannedMove { candidate, category, new_name, target });
    }

    plan
}

/// Convenience wrapper: locate, then run with the given configuration.
///
/// # Errors
///
/// See [`FlattenerBuilder::build`] and [`Flattener::run`].
pub async fn flatten(
    base: &Path,
    config: FlattenConfig,
    progress: &dyn ProgressSink,
) -> Result<FlattenReport, EngineError> {
    Flattener::builder().base_dir(base).config(config).build()?.run(progress).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentProgress;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_builder_requires_plugin_dir() {
        let tmp = tempdir().unwrap();
        let err = Flattener::builder().base_dir(tmp.path()).build().unwrap_err();
        assert!(matches!(err, EngineError::PluginNotFound { .. }));
    }

    #[tokio::test]
    async fn test_plan_routes_and_names_candidates() {
        let tmp = tempdir().unwrap();
        let ia = tmp.path().join("plugins/ItemsAdder");
        touch(&ia.join("contents/ns1/textures/a.png"), "");
        touch(&ia.join("contents/ns1/other/a.png"), "");
        touch(&ia.join("contents/ns1/sounds.json"), "{}");
        touch(&ia.join("contents/ns1/readme.md"), "");

        let flattener = Flattener::builder().base_dir(tmp.path()).build().unwrap();
        let plan = flattener.plan().await.unwrap();

        let names: Vec<&str> = plan.moves.iter().map(|m| m.new_name.as_str()).collect();
        assert_eq!(names, ["ns1_a.png", "ns1_a_1.png"]);
        assert_eq!(plan.candidates, 3);
        assert_eq!(plan.unclassified, 1);
        assert_eq!(plan.manifests.sound_registries.len(), 1);
        assert!(ia.join("contents/ns1/textures/a.png").exists(), "planning must not move files");
    }

    #[tokio::test]
    async fn test_run_with_custom_reserved_prefix() {
        let tmp = tempdir().unwrap();
        let ia = tmp.path().join("plugins/ItemsAdder");
        touch(&ia.join("contents/.hidden/textures/x.png"), "");
        touch(&ia.join("contents/_kept/textures/y.png"), "");

        let config = FlattenConfig { reserved_prefix: ".".to_owned(), ..FlattenConfig::default() };
        let report = flatten(tmp.path(), config, &SilentProgress).await.unwrap();

        let textures = ia.join("contents/resourcepack/assets/textures");
        assert!(textures.join("_kept_y.png").exists());
        assert!(ia.join("contents/.hidden/textures/x.png").exists());
        assert_eq!(report.moved_textures, 1);
    }
}
