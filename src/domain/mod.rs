//! Domain Layer
//!
//! Pure types with no I/O: ticks and enriched records, bounded price
//! windows, and deterministic archive keys.

pub mod archive;
pub mod tick;
pub mod window;
