//! The decision table that maps a candidate file to its destination.
//!
//! Rules are checked in order and the first match wins:
//!
//! | # | Condition                                                        | Result                 |
//! |---|------------------------------------------------------------------|------------------------|
//! | 1 | file name is `sounds.json` or `fonts.json`                       | manifest merge         |
//! | 2 | extension `.png`                                                 | textures               |
//! | 3 | extension `.mcmeta`                                              | companion sniffing     |
//! | 4 | extension `.yml`/`.yaml`/`.json` and path contains `items_packs` | configs                |
//! | 5 | extension `.json` and path (any case) contains `models`          | models                 |
//! | 6 | extension `.ogg`                                                 | sounds                 |
//! | 7 | anything else                                                    | unclassified, stays    |
//!
//! Paths are matched relative to the plugin directory. Extensions compare
//! case-insensitively; manifest names compare exactly.

use crate::layout::{FONT_PROVIDERS, ITEMS_PACKS, SOUND_REGISTRY};
use crate::namespace::Candidate;
use std::path::Path;
use strum_macros::{AsRefStr, Display, EnumIter};

/// Destination bucket of a relocated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum AssetCategory {
    Models,
    Textures,
    Sounds,
    Configs,
    /// Left in place and never renamed.
    Unclassified,
}

/// One of the well-known files merged across namespaces instead of moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ManifestKind {
    #[strum(to_string = "sounds.json")]
    SoundRegistry,
    #[strum(to_string = "fonts.json")]
    FontProviders,
}

impl ManifestKind {
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::SoundRegistry => SOUND_REGISTRY,
            Self::FontProviders => FONT_PROVIDERS,
        }
    }

    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        match name {
            SOUND_REGISTRY => Some(Self::SoundRegistry),
            FONT_PROVIDERS => Some(Self::FontProviders),
            _ => None,
        }
    }
}

/// The verdict for a single candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Routed to the manifest merger; excluded from moves and from the move count.
    Manifest(ManifestKind),
    Category(AssetCategory),
}

impl Classification {
    /// The asset category, or `None` for manifests.
    #[must_use]
    pub const fn category(self) -> Option<AssetCategory> {
        match self {
            Self::Manifest(_) => None,
            Self::Category(category) => Some(category),
        }
    }
}

/// Classifies a candidate.
///
/// Pure with respect to the candidate and the current existence of its `.png`/`.ogg`
/// siblings; nothing is read or written.
#[must_use]
pub fn classify(candidate: &Candidate) -> Classification {
    if let Some(kind) = ManifestKind::from_file_name(&candidate.file_name()) {
        return Classification::Manifest(kind);
    }

    let relative = candidate.relative().to_string_lossy();
    let category = match extension(candidate.path()).as_deref() {
        Some("png") => AssetCategory::Textures,
        Some("mcmeta") => sniff_metadata(candidate),
        Some("yml" | "yaml" | "json") if relative.contains(ITEMS_PACKS) => AssetCategory::Configs,
        Some("json") if relative.to_lowercase().contains("models") => AssetCategory::Models,
        Some("ogg") => AssetCategory::Sounds,
        _ => AssetCategory::Unclassified,
    };

    Classification::Category(category)
}

/// Places a `.mcmeta` sidecar next to whatever it most likely describes.
fn sniff_metadata(candidate: &Candidate) -> AssetCategory {
    let parent = candidate
        .relative()
        .parent()
        .map(|p| p.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let path = candidate.path();

    if parent.contains("textures") || path.with_extension("png").exists() {
        AssetCategory::Textures
    } else if parent.contains("sounds") || path.with_extension("ogg").exists() {
        AssetCategory::Sounds
    } else if parent.contains("models") {
        AssetCategory::Models
    } else {
        AssetCategory::Textures
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension().map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}
