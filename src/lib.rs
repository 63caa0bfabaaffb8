//! Switchboard: Unified Inventory of Open Items
//!
//! Aggregates open tabs, windows and documents from several sources into one
//! de-duplicated list, served through a stale-while-revalidate cache with
//! per-selection request coalescing, and re-targets items whose positional
//! handles have shifted when activating them.

pub mod activation;
pub mod api;
pub mod cache;
pub mod capability;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod inflight;
pub mod logging;
pub mod orchestrator;
pub mod reconcile;
pub mod selection;
pub mod source;
pub mod types;

pub use api::{InventoryApi, InventoryStats};
pub use selection::Selection;
pub use types::{ItemKind, RawRecord, SourceId, UnifiedRecord};
