//! In-place flattening of an `ItemsAdder` plugin asset tree.
//!
//! Per-namespace assets scattered over `contents/<ns>`, nested resource packs,
//! `data/resource_pack/assets/<ns>` and `data/items_packs` are moved into one flat
//! layout, renamed `<namespace>_<file>` without ever clobbering a file. The
//! `sounds.json` and `fonts.json` manifests are merged across namespaces, and text
//! files in the destination tree are rewritten to use the new names.
//!
//! # Architectural Overview
//!
//! 1.  **Discovery** ([`discover_namespaces`], [`enumerate_candidates`]): namespace
//!     directories and the files below them, in a stable order.
//! 2.  **Classification** ([`classify`]): an ordered rule table picking a category.
//! 3.  **Naming** ([`NameAllocator`]): collision-free destination names.
//! 4.  **Moving** ([`move_file`]): relocation on the blocking pool.
//! 5.  **Merging** ([`SoundRegistry`], [`FontProviders`]): manifest accumulators.
//! 6.  **Rewriting** ([`ReferenceRewriter`]): one-pass literal substitution.
//!
//! [`Flattener`] chains the phases and reports through a [`ProgressSink`].
//!
//! # Examples
//!
//! ```rust
//! use iaflat_engine::{EngineError, Flattener, SilentProgress};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), EngineError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     # let base = tmp.path();
//!     # let ns = base.join("plugins/ItemsAdder/contents/ns1/textures");
//!     # std::fs::create_dir_all(&ns).unwrap();
//!     # std::fs::write(ns.join("a.png"), b"png").unwrap();
//!     let flattener = Flattener::builder().base_dir(base).build()?;
//!     let report = flattener.run(&SilentProgress).await?;
//!
//!     assert_eq!(report.moved_textures, 1);
//!     assert!(flattener.layout().contents().join("resourcepack/assets/textures/ns1_a.png").exists());
//!     Ok(())
//! }
//! ```

mod atomic;
mod classify;
mod config;
mod error;
mod flatten;
mod layout;
mod maintenance;
mod manifest;
mod mapping;
mod mover;
mod namer;
mod namespace;
mod progress;
mod report;
mod rewrite;

pub use atomic::write_atomic;
pub use classify::{AssetCategory, Classification, ManifestKind, classify};
pub use self::config::{DEFAULT_CONFIG_FILE, ENV_PREFIX, FlattenConfig, load_config};
pub use error::{EngineError, EngineErrorExt};
pub use flatten::{Flattener, FlattenerBuilder, Plan, PlannedMove, flatten};
pub use layout::{FONT_PROVIDERS, ITEMS_PACKS, PluginLayout, SOUND_REGISTRY};
pub use maintenance::purge_stale_staging;
pub use manifest::{FontProviders, ManifestSet, MergeOutcome, MergeReport, SoundRegistry, merge_manifests};
pub use mapping::RenameMapping;
pub use mover::{MoveOutcome, move_file};
pub use namer::{NameAllocator, safe_name, split_extension};
pub use namespace::{Candidate, Namespace, NamespaceDir, discover_namespaces, enumerate_candidates};
pub use progress::{Phase, ProgressSink, SilentProgress};
pub use report::{FlattenReport, SkipReason};
pub use rewrite::{ReferenceRewriter, RewriteOutcome, TEXT_EXTENSIONS, collect_text_files};
