//! Composition orchestrator.
//!
//! - [`model`] - Requests, shapes, and the composite response
//! - [`service`] - [`ContextComposer`], which resolves fragments in
//!   dependency order and assembles the response

pub mod model;
pub mod service;


pub use model::{ComposeRequest, CompositeResponse, ContextShape, FragmentSlot, ServedFrom};
pub use service::{ContextComposer, ContextComposerTrait};
