//! Toomore Photos - a personal photo gallery over the Flickr API
//!
//! Every upstream lookup goes through a cache-aside layer with per-resource
//! TTLs, backed by Redis or an in-process map.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod gallery;
pub mod models;
pub mod storage;
pub mod tasks;
pub mod upstream;

#[cfg(test)]
mod testing;

pub use api::AppState;
pub use config::Config;
pub use error::{GalleryError, Result};
pub use gallery::Gallery;
pub use tasks::{run_sync, spawn_cleanup_task, SyncReport};
