pub mod batch;
pub mod item;
pub mod reconcile;
pub mod stats;

pub use batch::{BatchOptions, GroupKey, Grouping};
pub use item::{Harvester, ItemFailure, ItemOutput, ItemOutputMode, ItemSuccess, RetrievalSettings};
pub use reconcile::{reconcile, Reconciliation};
pub use stats::{GroupResult, RunResult, Tally};
