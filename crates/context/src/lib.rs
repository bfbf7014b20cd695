//! MarketPulse Context Engine
//!
//! Aggregates market-condition signals from upstream data providers into a
//! hierarchy of reusable, time-bounded context fragments. Callers ask for a
//! composite view and the engine answers from cached building blocks,
//! re-fetching only what has expired.
//!
//! # Overview
//!
//! - Five fragment kinds: primary, detailed, intraday, swing, long-term
//! - Per-field provenance (real, reused, approximated, stale fallback)
//! - Single-flight builds: concurrent callers share one upstream fetch
//! - Field-level degradation instead of whole-response failure
//! - Advisory quality score per response
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |  ContextComposer |  (resolution order, stale fallback, quality)
//! +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! | BuildCoordinator | --> |    CacheStore    |  (fragments and raw datasets)
//! +------------------+     +------------------+
//!          |
//!          v
//! +------------------+     +-------------------+
//! | Fragment builders| --> | DegradationPolicy |  (stale or neutral fallback)
//! +------------------+     +-------------------+
//!          |
//!          v
//! +------------------+
//! |  GuardedGateway  |  (marketpulse-sources)
//! +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`ContextComposer`] - Entry point, see [`ContextComposerTrait::compose`]
//! - [`ComposeRequest`] - Requested fragments and scope
//! - [`CompositeResponse`] - One slot per requested fragment plus a [`QualityReport`]
//! - [`Fragment`] - The five fragment payloads
//! - [`ContextConfig`] - TTLs, bucket widths, and builder settings

pub mod builders;
pub mod cache;
pub mod clock;
pub mod composer;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod degradation;
pub mod errors;
pub mod fragments;
pub mod indicators;
pub mod provenance;
pub mod quality;
pub mod scope;

pub use cache::{CacheEntry, CacheKey, CacheStore, EntryKind, InMemoryCacheStore, SlotKey};
pub use clock::{Clock, ManualClock, SystemClock};
pub use composer::{
    ComposeRequest, CompositeResponse, ContextComposer, ContextComposerTrait, ContextShape,
    FragmentSlot, ServedFrom,
};
pub use config::{ContextConfig, MacroOutlook};
pub use coordinator::{BuildCoordinator, CoordinatorStats, Resolution, ResolutionSource};
pub use degradation::{Degraded, DegradationPolicy};
pub use errors::{ContextError, Result};
pub use fragments::{
    DetailedContext, Fragment, FragmentKind, IntradayContext, LongTermContext, PrimaryContext,
    SwingContext,
};
pub use provenance::{Provenance, Tagged};
pub use quality::{QualityReport, QualityScorer};
pub use scope::ContextScope;
