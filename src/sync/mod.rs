//! Synchronization engine: exhaustive page walks for bootstrap and
//! incremental reconciliation from the remote events feed.
//!
//! # Flow
//!
//! - Bootstrap: [`SnapshotBuilder`] walks workouts and exercise templates,
//!   then [`populate`] writes them into a [`RelationalMirror`](crate::db::RelationalMirror).
//! - Incremental: [`DeltaSynchronizer`] walks the events feed from a cursor
//!   and applies each add, update or delete.
//!
//! Both talk to the network only through [`PageSource`].

pub mod client;
pub mod delta;
pub mod pagination;
pub mod progress;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ClientError, FetchFailure, HevyClient, PageSource};
pub use delta::{DeltaSynchronizer, SyncError, SyncReport};
pub use pagination::{PageRequest, PageWalker, WalkError};
pub use progress::{NoProgress, ProgressSink, TracingProgress, UnitKind};
pub use snapshot::{bootstrap, populate, BootstrapError, Snapshot, SnapshotBuilder};
