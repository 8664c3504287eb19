//! # Error Module
//!
//! Errors surfaced by the voxel world. Only start-up and registration failures
//! are reported through `VoxelError`; out-of-bounds block access is answered
//! with `false`/`None`, and superseded mesh builds are dropped silently.

use thiserror::Error;

/// Errors produced while configuring or populating the voxel world.
#[derive(Debug, Error)]
pub enum VoxelError {
    /// All 255 non-empty block IDs are taken.
    #[error("block registry is full: cannot register `{0}` (255 non-empty types maximum)")]
    RegistryFull(String),

    /// A chunk was created before the generation palette was registered.
    #[error("block registry has not been initialized with a generation palette")]
    RegistryUninitialized,

    /// A name lookup did not match any registered block type.
    #[error("unknown block type `{0}`")]
    UnknownBlockType(String),

    /// A configuration value is out of its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}
