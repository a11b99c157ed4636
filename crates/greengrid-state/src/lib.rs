//! greengrid-state — region catalog and workload records for GreenGrid.
//!
//! Backed by [redb](https://docs.rs/redb), provides persistent and in-memory
//! storage for the regions the allocation engine chooses between and the
//! workload records produced by scheduling decisions.
//!
//! # Architecture
//!
//! All domain types are JSON-serialized into redb's `&[u8]` value columns.
//! Regions are keyed by their identifier, which keeps identifiers unique
//! across the catalog. Workloads are keyed by their UUID.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
