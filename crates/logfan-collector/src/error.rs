use thiserror::Error;

/// Errors raised by registration, scanners, and the collector.
///
/// Scanner-scoped variants (`SourceUnavailable`, `LaunchFailure`,
/// `StreamReadFailure`) terminate one scanner and are recorded once; they
/// never abort the collector or other scanners.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// A descriptor violates its kind-specific invariant. Fatal at
    /// registration time.
    #[error("invalid source descriptor: {0}")]
    InvalidDescriptor(String),

    /// The external log-fetch tool could not be found.
    #[error("log fetch tool unavailable: {0}")]
    SourceUnavailable(String),

    /// The source subprocess could not be spawned.
    #[error("failed to launch source subprocess")]
    LaunchFailure(#[source] std::io::Error),

    /// Reading the source subprocess output failed mid-stream.
    #[error("failed reading source output")]
    StreamReadFailure(#[source] std::io::Error),

    /// A registry lookup used an index that was never registered. This is a
    /// caller contract violation, not a runtime condition.
    #[error("unknown source index {0}")]
    UnknownIndex(usize),

    /// `start()` was called twice, or `register()` after `start()`.
    #[error("collection already started")]
    AlreadyStarted,
}
