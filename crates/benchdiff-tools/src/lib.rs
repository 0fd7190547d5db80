//! Development tools for benchdiff.
//!
//! This crate provides logging setup and memory instrumentation for the
//! processes the harness launches.

pub mod logging;
pub mod memory;

pub use logging::{LoggingError, init_logging};
pub use memory::{MemoryError, ProcessMemoryProbe, max_peak};
