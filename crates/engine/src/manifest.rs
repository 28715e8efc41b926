//! Cross-namespace merging of `sounds.json` and `fonts.json`.
//!
//! Instances are absorbed in discovery order into an in-memory accumulator that is
//! flushed once to its single destination. A malformed or unreadable instance
//! contributes nothing and the merge carries on.

use crate::atomic::write_atomic;
use crate::classify::ManifestKind;
use crate::error::{EngineError, EngineErrorExt};
use crate::layout::PluginLayout;
use crate::progress::ProgressSink;
use crate::report::SkipReason;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Result of absorbing one manifest instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Absorbed,
    Skipped(SkipReason),
}

/// Flat key to value sound registry; later keys overwrite earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoundRegistry {
    entries: Map<String, Value>,
}

impl SoundRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one JSON object into the registry.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Decode`] if `text` is not a JSON object; the registry is
    /// left untouched.
    pub fn absorb_str(&mut self, text: &str) -> Result<(), EngineError> {
        let instance: Map<String, Value> =
            serde_json::from_str(text).context("Sound registry is not a JSON object")?;
        self.entries.extend(instance);
        Ok(())
    }

    pub async fn absorb_file(&mut self, path: &Path) -> MergeOutcome {
        absorb_with(path, |text| self.absorb_str(text)).await
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the registry as one pretty-printed object.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if the atomic write fails.
    pub async fn write_to(&self, path: &Path) -> Result<(), EngineError> {
        let json = serde_json::to_vec_pretty(&self.entries).context("Sound registry encoding")?;
        write_atomic(path, &json).await
    }
}

/// Concatenated font providers, in discovery order with duplicates kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontProviders {
    #[serde(default)]
    providers: Vec<Value>,
}

impl FontProviders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the `providers` list of one instance; a missing list counts as empty.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Decode`] if `text` does not decode into an object with an
    /// optional `providers` array.
    pub fn absorb_str(&mut self, text: &str) -> Result<(), EngineError> {
        let instance: Self = serde_json::from_str(text).context("Malformed font provider list")?;
        self.providers.extend(instance.providers);
        Ok(())
    }

    pub async fn absorb_file(&mut self, path: &Path) -> MergeOutcome {
        absorb_with(path, |text| self.absorb_str(text)).await
    }

    #[must_use]
    pub fn providers(&self) -> &[Value] {
        &self.providers
    }

    /// Writes `{"providers": [...]}`, pretty-printed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if the atomic write fails.
    pub async fn write_to(&self, path: &Path) -> Result<(), EngineError> {
        let json = serde_json::to_vec_pretty(self).context("Font provider encoding")?;
        write_atomic(path, &json).await
    }
}

async fn absorb_with(
    path: &Path,
    absorb: impl FnOnce(&str) -> Result<(), EngineError>,
) -> MergeOutcome {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Skipping unreadable manifest");
            return MergeOutcome::Skipped(SkipReason::Unreadable);
        },
    };

    match absorb(&text) {
        Ok(()) => {
            debug!(path = %path.display(), "Manifest absorbed");
            MergeOutcome::Absorbed
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Skipping malformed manifest");
            MergeOutcome::Skipped(SkipReason::Malformed)
        },
    }
}

/// Manifest instances collected during planning, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestSet {
    pub sound_registries: Vec<PathBuf>,
    pub font_providers: Vec<PathBuf>,
}

impl ManifestSet {
    pub fn push(&mut self, kind: ManifestKind, path: PathBuf) {
        match kind {
            ManifestKind::SoundRegistry => self.sound_registries.push(path),
            ManifestKind::FontProviders => self.font_providers.push(path),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sound_registries.len() + self.font_providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Counters of one merge step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub sound_registries: usize,
    pub font_lists: usize,
    pub skipped: usize,
    /// Merged files that were written, in write order.
    pub outputs: Vec<(ManifestKind, PathBuf)>,
}

/// Merges every collected instance and writes one output per kind.
///
/// A kind with no instances writes nothing. Each written output is announced on the
/// sink as `Merged <file> -> <path>`.
///
/// # Errors
///
/// Returns [`EngineError::Io`] if a merged output cannot be written.
pub async fn merge_manifests(
    layout: &PluginLayout,
    manifests: &ManifestSet,
    progress: &dyn ProgressSink,
) -> Result<MergeReport, EngineError> {
    let mut report = MergeReport::default();

    if !manifests.sound_registries.is_empty() {
        let mut registry = SoundRegistry::new();
        for path in &manifests.sound_registries {
            match registry.absorb_file(path).await {
                MergeOutcome::Absorbed => report.sound_registries += 1,
                MergeOutcome::Skipped(_) => report.skipped += 1,
            }
        }
        let out = layout.sound_registry_output();
        registry.write_to(&out).await?;
        announce(ManifestKind::SoundRegistry, out, &mut report, progress);
    }

    if !manifests.font_providers.is_empty() {
        let mut fonts = FontProviders::new();
        for path in &manifests.font_providers {
            match fonts.absorb_file(path).await {
                MergeOutcome::Absorbed => report.font_lists += 1,
                MergeOutcome::Skipped(_) => report.skipped += 1,
            }
        }
        let out = layout.font_providers_output();
        fonts.write_to(&out).await?;
        announce(ManifestKind::FontProviders, out, &mut report, progress);
    }

    Ok(report)
}

fn announce(kind: ManifestKind, out: PathBuf, report: &mut MergeReport, progress: &dyn ProgressSink) {
    progress.notice(&format!("Merged {kind} -> {}", out.display()));
    report.outputs.push((kind, out));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentProgress;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sound_registry_later_keys_win() {
        let mut registry = SoundRegistry::new();
        registry.absorb_str(r#"{"step.wood": {"sounds": ["a"]}, "hit": 1}"#).unwrap();
        registry.absorb_str(r#"{"step.wood": {"sounds": ["b"]}}"#).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("step.wood"), Some(&json!({"sounds": ["b"]})));
    }

    #[test]
    fn test_sound_registry_rejects_non_objects() {
        let mut registry = SoundRegistry::new();
        registry.absorb_str(r#"{"keep": true}"#).unwrap();

        assert!(matches!(registry.absorb_str("[1, 2]"), Err(EngineError::Decode { .. })));
        assert!(registry.absorb_str("{ not json").is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_font_providers_concatenate() {
        let mut fonts = FontProviders::new();
        fonts.absorb_str(r#"{"providers": [{"id": 1}, {"id": 2}]}"#).unwrap();
        fonts.absorb_str(r#"{"other": "ignored"}"#).unwrap();
        fonts.absorb_str(r#"{"providers": [{"id": 3}, {"id": 4}, {"id": 1}]}"#).unwrap();

        let ids: Vec<&Value> = fonts.providers().iter().map(|p| &p["id"]).collect();
        assert_eq!(ids, [&json!(1), &json!(2), &json!(3), &json!(4), &json!(1)]);
        assert!(fonts.absorb_str(r#"{"providers": "nope"}"#).is_err());
    }

    #[tokio::test]
    async fn test_merge_writes_outputs_and_skips_bad_instances() {
        let tmp = tempdir().unwrap();
        let layout = PluginLayout::new(tmp.path());
        let good = tmp.path().join("a/sounds.json");
        let bad = tmp.path().join("b/sounds.json");
        fs::create_dir_all(good.parent().unwrap()).unwrap();
        fs::create_dir_all(bad.parent().unwrap()).unwrap();
        fs::write(&good, r#"{"step.wood": "x"}"#).unwrap();
        fs::write(&bad, "garbage").unwrap();

        let mut set = ManifestSet::default();
        set.push(ManifestKind::SoundRegistry, good);
        set.push(ManifestKind::SoundRegistry, bad);
        set.push(ManifestKind::SoundRegistry, tmp.path().join("missing/sounds.json"));

        let report = merge_manifests(&layout, &set, &SilentProgress).await.unwrap();

        assert_eq!((report.sound_registries, report.skipped), (1, 2));
        assert_eq!(report.outputs, [(ManifestKind::SoundRegistry, layout.sound_registry_output())]);
        let merged: Value =
            serde_json::from_str(&fs::read_to_string(layout.sound_registry_output()).unwrap()).unwrap();
        assert_eq!(merged, json!({"step.wood": "x"}));
        assert!(!layout.font_providers_output().exists());
    }

    #[tokio::test]
    async fn test_merge_of_nothing_writes_nothing() {
        let tmp = tempdir().unwrap();
        let layout = PluginLayout::new(tmp.path());

        let report = merge_manifests(&layout, &ManifestSet::default(), &SilentProgress).await.unwrap();

        assert!(report.outputs.is_empty());
        assert!(!layout.sound_registry_output().exists());
        assert!(!layout.font_providers_output().exists());
    }
}
