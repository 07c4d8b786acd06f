//! Application Layer
//!
//! Use cases and port definitions. Services here drive the domain types
//! through the ports; they know nothing about concrete transports or
//! stores.

pub mod ports;
pub mod services;
