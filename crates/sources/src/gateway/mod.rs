//! Source gateway abstraction and its resilience decorator.
//!
//! This module contains:
//! - The `SourceGateway` trait every upstream adapter implements
//! - The `Endpoint` enum naming each upstream call
//! - `GuardedGateway`, which adds timeouts, throttling, and circuit breaking
//!   to any gateway

mod endpoint;
mod guarded;
mod traits;

pub use endpoint::Endpoint;
pub use guarded::{GatewayGuardConfig, GuardedGateway};
pub use traits::SourceGateway;
