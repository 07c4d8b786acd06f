//! Infrastructure Layer
//!
//! Adapters implementing the application ports, plus configuration,
//! logging, and metrics wiring.

pub mod config;
pub mod fs;
pub mod memory;
pub mod metrics;
pub mod secrets;
pub mod sim;
pub mod telemetry;
