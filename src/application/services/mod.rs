//! Application Services
//!
//! The use cases driving the pipeline: the publisher's retry loop, the
//! record codec, the dual-sink persister, and the batch coordinator.

pub mod codec;
pub mod persister;
pub mod processor;
pub mod publisher;
pub mod retry;
