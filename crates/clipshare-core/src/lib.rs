//! # clipshare-core
//!
//! Core types, traits, and abstractions for the clipshare service.
//!
//! This crate provides the shared-collection data model, the error taxonomy,
//! and the key-value store interface that the repository and HTTP crates
//! depend on.

pub mod defaults;
pub mod error;
pub mod ids;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use ids::{collection_key, is_valid_collection_id, new_collection_id, new_item_id};
pub use models::*;
pub use traits::*;
