//! Background Tasks Module
//!
//! - Cache sweep: reclaims expired memory-backend entries on an interval
//! - Catalog sync: one-shot, rate-limited walk into the durable store

mod cleanup;
mod sync;

pub use cleanup::spawn_cleanup_task;
pub use sync::{run_sync, SyncReport};
