//! HTTP handlers for clipshare-api.

pub mod collections;
pub mod health;

pub use collections::{add_item, create_collection, delete_item, get_collection};
pub use health::health_check;
