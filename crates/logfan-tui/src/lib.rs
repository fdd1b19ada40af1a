//! Terminal UI for logfan
//!
//! This crate renders the merged event stream: a raw-mode terminal wrapper,
//! an input event task, a bounded scrollback buffer, and the log viewport.
//! It consumes events and registry lookups from the collector; it never
//! coordinates the collection itself.

mod event;
mod scrollback;
mod terminal;
mod viewer;

pub use event::{Event, EventHandler};
pub use scrollback::Scrollback;
pub use terminal::Tui;
pub use viewer::{LogView, SourceLabel};
