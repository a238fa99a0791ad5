//! Capability traits consumed by the pipeline.
//!
//! Applications implement these to plug in sources, stores and sinks.

pub mod sink;
pub mod source;
pub mod store;
