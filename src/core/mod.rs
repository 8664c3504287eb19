//! # Core Module
//!
//! Shared-state primitives used by the world and its build workers.
//!
//! ## Key Components
//! - `MtResource`: thread-safe, reference-counted resource behind a read-write lock

pub mod mt_resource;

pub use mt_resource::MtResource;
