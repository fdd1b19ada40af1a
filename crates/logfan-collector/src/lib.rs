//! Log collection for logfan
//!
//! This crate turns a set of registered source descriptors into one merged
//! stream of [`logfan_types::LogEvent`]s. Each source runs as its own
//! scanner task tailing an external subprocess; all scanners push into a
//! single bounded queue, which is the only shared mutable state between
//! them. The [`Collector`] owns the registry and the scanner lifecycle.

mod command;
mod error;
mod parser;
mod registry;
mod scanner;
mod supervisor;

pub use command::fetch_command;
pub use error::CollectorError;
pub use parser::split_source_timestamp;
pub use registry::SourceRegistry;
pub use scanner::{Scanner, ScannerState};
pub use supervisor::{Collector, DEFAULT_QUEUE_CAPACITY};

// Re-export types used in our public API
pub use logfan_types::{LogEvent, SourceColor, SourceDescriptor};
