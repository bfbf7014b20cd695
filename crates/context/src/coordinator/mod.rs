//! Single-flight build coordination.
//!
//! Concurrent callers asking for the same cache key within one time bucket
//! share a single build. The coordinator never fabricates values: a failed
//! build is delivered to every waiter as-is.

mod single_flight;

pub use single_flight::{
    BuildCoordinator, BuildResult, CoordinatorStats, Resolution, ResolutionSource,
};
