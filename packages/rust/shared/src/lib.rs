//! Shared types, error model, and configuration for confdown.
//!
//! This crate is the foundation depended on by all other confdown crates.
//! It provides:
//! - [`ConfdownError`], the unified error type
//! - Domain types ([`Page`], [`Comment`], [`SpaceInfo`], metadata fragments)
//! - Configuration ([`AppConfig`], config loading and validation)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ConnectionConfig, DefaultsConfig, api_token, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_output_dir, validate_connection,
};
pub use error::{ConfdownError, Result};
pub use types::{Comment, CommentLocation, Likes, Page, SpaceInfo, SpaceRef, Version};
