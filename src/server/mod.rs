//! Declarative server assembly
//!
//! The server's capability set is built by folding an ordered list of
//! [`ServerOption`]s over an empty [`ServerCapabilities`]. Options may
//! construct cache and search clients as they are applied.

pub mod builder;
pub mod capabilities;
pub mod options;

pub use builder::{assemble, ServerBuilder};
pub use capabilities::{CapabilitiesSummary, LayerSummary, ServerCapabilities};
pub use options::{ConfigSource, ServerOption};
