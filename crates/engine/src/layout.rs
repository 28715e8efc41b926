use crate::classify::AssetCategory;
use crate::config::FlattenConfig;
use crate::error::{EngineError, EngineErrorExt};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Name of the secondary config root; also the namespace of its files.
pub const ITEMS_PACKS: &str = "items_packs";
/// File name of the merged sound registry.
pub const SOUND_REGISTRY: &str = "sounds.json";
/// File name of the merged font-provider list.
pub const FONT_PROVIDERS: &str = "fonts.json";

/// Physical layout of an `ItemsAdder` plugin directory.
///
/// ```text
/// <plugin>/contents/<namespace>/**                                  (sources)
/// <plugin>/contents/<namespace>/resourcepack/assets/<namespace2>/** (sources)
/// <plugin>/data/resource_pack/assets/<namespace>/**                 (sources)
/// <plugin>/data/items_packs/**                                      (sources)
/// <plugin>/contents/resourcepack/assets/{models,textures,sounds}/   (destinations)
/// <plugin>/contents/resourcepack/fonts.json                         (merged fonts)
/// <plugin>/data/                                                    (flattened configs)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginLayout {
    root: PathBuf,
    contents: PathBuf,
    data: PathBuf,
    assets_out: PathBuf,
}

impl PluginLayout {
    /// Describes the layout below `root` without touching the file system.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let contents = root.join("contents");
        let data = root.join("data");
        let assets_out = contents.join("resourcepack").join("assets");
        Self { root, contents, data, assets_out }
    }

    /// Locates the plugin directory below `base` as configured.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PluginNotFound`] if the directory does not exist. No other
    /// work happens before this check.
    pub fn detect(base: &Path, config: &FlattenConfig) -> Result<Self, EngineError> {
        let root = base.join(&config.plugin_dir);
        if !root.is_dir() {
            return Err(EngineError::PluginNotFound {
                message: root.display().to_string().into(),
                context: Some(format!("Could not find {}", config.plugin_dir.display()).into()),
            });
        }
        Ok(Self::new(root))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<plugin>/contents`, the primary namespace root.
    #[must_use]
    pub fn contents(&self) -> &Path {
        &self.contents
    }

    /// `<plugin>/data/resource_pack/assets`, the secondary namespace root.
    #[must_use]
    pub fn resource_pack_assets(&self) -> PathBuf {
        self.data.join("resource_pack").join("assets")
    }

    /// `<plugin>/data/items_packs`, the secondary config root.
    #[must_use]
    pub fn items_packs(&self) -> PathBuf {
        self.data.join(ITEMS_PACKS)
    }

    /// The single destination directory of a category; `None` for unclassified files.
    #[must_use]
    pub fn destination(&self, category: AssetCategory) -> Option<PathBuf> {
        match category {
            AssetCategory::Models => Some(self.assets_out.join("models")),
            AssetCategory::Textures => Some(self.assets_out.join("textures")),
            AssetCategory::Sounds => Some(self.assets_out.join("sounds")),
            AssetCategory::Configs => Some(self.data.clone()),
            AssetCategory::Unclassified => None,
        }
    }

    #[must_use]
    pub fn sound_registry_output(&self) -> PathBuf {
        self.assets_out.join("sounds").join(SOUND_REGISTRY)
    }

    /// Sibling of `assets/`, one level above the models/textures/sounds directories.
    #[must_use]
    pub fn font_providers_output(&self) -> PathBuf {
        self.contents.join("resourcepack").join(FONT_PROVIDERS)
    }

    /// Destination roots scanned by the reference rewriter, configs first.
    #[must_use]
    pub fn rewrite_roots(&self) -> Vec<PathBuf> {
        [
            AssetCategory::Configs,
            AssetCategory::Models,
            AssetCategory::Textures,
            AssetCategory::Sounds,
        ]
        .into_iter()
        .filter_map(|category| self.destination(category))
        .collect()
    }

    /// Creates every destination directory.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if a directory cannot be created.
    pub async fn prepare(&self) -> Result<(), EngineError> {
        for dir in self.rewrite_roots() {
            fs::create_dir_all(&dir)
                .await
                .context(format!("Failed to create destination: {}", dir.display()))?;
            debug!(path = %dir.display(), "Destination ready");
        }
        Ok(())
    }
}
