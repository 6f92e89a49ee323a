//! Shared types, error model, and configuration for gardenlink.
//!
//! This crate is the foundation depended on by all other gardenlink crates.
//! It provides:
//! - [`GardenError`] — the unified error type
//! - Domain types ([`CrossReference`], [`VisitKey`], [`QueueEntry`], [`KnowledgeBuffer`])
//! - Wikilink extraction ([`extract_wikilinks`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod links;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_PROXY_URL, GardenConfig, OpenRouterConfig, ProxyConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, resolve_api_key,
};
pub use error::{GardenError, Result};
pub use links::extract_wikilinks;
pub use types::{
    BlockSource, CrossReference, KnowledgeBlock, KnowledgeBuffer, LinkContent, QueueEntry,
    VisitKey, is_remote,
};
