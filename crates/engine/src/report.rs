use crate::classify::AssetCategory;
use std::fmt;
use strum_macros::{AsRefStr, Display};

/// Why a single item was passed over. Never fatal for the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// Could not be read, or is not valid UTF-8 text.
    Unreadable,
    /// Read fine but did not decode into the expected shape.
    Malformed,
    /// Read and rewritten, but the rewritten content could not be persisted.
    WriteFailed,
}

/// Counters for one complete run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenReport {
    /// Candidates walked in the flattening phase, manifests excluded.
    pub candidates: usize,
    pub moved_models: usize,
    pub moved_textures: usize,
    pub moved_sounds: usize,
    pub moved_configs: usize,
    pub unclassified: usize,
    /// Planned moves whose source had already disappeared.
    pub already_moved: usize,
    pub move_failures: usize,
    pub sound_registries_merged: usize,
    pub font_lists_merged: usize,
    pub manifests_skipped: usize,
    pub text_files_scanned: usize,
    pub config_files_updated: usize,
    pub text_files_skipped: usize,
    pub stale_staging_removed: usize,
}

impl FlattenReport {
    #[must_use]
    pub const fn moved(&self) -> usize {
        self.moved_models + self.moved_textures + self.moved_sounds + self.moved_configs
    }

    pub(crate) fn count_move(&mut self, category: AssetCategory) {
        match category {
            AssetCategory::Models => self.moved_models += 1,
            AssetCategory::Textures => self.moved_textures += 1,
            AssetCategory::Sounds => self.moved_sounds += 1,
            AssetCategory::Configs => self.moved_configs += 1,
            AssetCategory::Unclassified => self.unclassified += 1,
        }
    }
}

impl fmt::Display for FlattenReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "moved {} of {} files (models {}, textures {}, sounds {}, configs {}), {} left in place, \
             {} already moved, {} failed; merged {} sound registries and {} font lists; \
             updated {} of {} text files",
            self.moved(),
            self.candidates,
            self.moved_models,
            self.moved_textures,
            self.moved_sounds,
            self.moved_configs,
            self.unclassified,
            self.already_moved,
            self.move_failures,
            self.sound_registries_merged,
            self.font_lists_merged,
            self.config_files_updated,
            self.text_files_scanned,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moved_sums_categories() {
        let mut report = FlattenReport::default();
        report.count_move(AssetCategory::Textures);
        report.count_move(AssetCategory::Textures);
        report.count_move(AssetCategory::Configs);
        report.count_move(AssetCategory::Unclassified);

        assert_eq!(report.moved(), 3);
        assert_eq!(report.unclassified, 1);
        assert!(report.to_string().starts_with("moved 3 of 0 files"));
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::WriteFailed.to_string(), "write_failed");
        assert_eq!(SkipReason::Unreadable.as_ref(), "unreadable");
    }
}
