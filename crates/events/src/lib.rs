//! Progress events for the provisioning and teardown pipelines.
//!
//! This crate provides the event type streamed to clients and the
//! single-producer writer the pipelines push them through.

mod stream;
mod types;

pub use stream::{EventReceiver, EventStream};
pub use types::*;
