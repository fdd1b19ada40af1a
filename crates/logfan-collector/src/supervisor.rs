use std::sync::Arc;

use logfan_types::{LogEvent, SourceColor, SourceDescriptor};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::CollectorError;
use crate::registry::SourceRegistry;
use crate::scanner::{Scanner, ScannerState};

/// Default capacity of the merged queue. Small on purpose: a stalled
/// consumer throttles producers instead of growing memory.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Owns the registry, the scanners, and the merged queue, and coordinates
/// their concurrent start, run, and stop.
///
/// Every scanner task pushes directly into the one bounded queue; the queue
/// itself provides mutual exclusion and arrival ordering among concurrent
/// writers, so no merge loop sits in the middle. The supervisor drops its
/// own sender at `start()`, which makes the queue close exactly when the
/// last scanner task exits.
pub struct Collector {
    registry: SourceRegistry,
    scanners: Vec<Arc<Scanner>>,
    tx: Option<mpsc::Sender<LogEvent>>,
    rx: mpsc::Receiver<LogEvent>,
    tasks: Vec<JoinHandle<()>>,
}

impl Collector {
    /// Create a collector with the given merged-queue capacity.
    pub fn new(queue_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        Self {
            registry: SourceRegistry::new(),
            scanners: Vec::new(),
            tx: Some(tx),
            rx,
            tasks: Vec::new(),
        }
    }

    /// Validate and register a source, returning its stable index.
    ///
    /// Registration must complete before [`Collector::start`]; afterwards
    /// it fails, so scanners never observe a half-built registry.
    pub fn register(&mut self, descriptor: SourceDescriptor) -> Result<usize, CollectorError> {
        if self.tx.is_none() {
            return Err(CollectorError::AlreadyStarted);
        }
        let index = self.registry.register(descriptor)?;
        let descriptor = self
            .registry
            .get(index)
            .ok_or(CollectorError::UnknownIndex(index))?
            .clone();
        self.scanners.push(Arc::new(Scanner::new(index, descriptor)));
        Ok(index)
    }

    /// Launch every registered scanner on its own task and return
    /// immediately.
    ///
    /// Fails with [`CollectorError::AlreadyStarted`] if called again
    /// without an intervening full stop. A scanner's failure terminates
    /// only that scanner: it is logged once and the rest keep producing.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        let tx = self.tx.take().ok_or(CollectorError::AlreadyStarted)?;

        for scanner in &self.scanners {
            let scanner = Arc::clone(scanner);
            let tx = tx.clone();
            self.tasks.push(tokio::spawn(async move {
                if let Err(err) = scanner.run(tx).await {
                    warn!(source = scanner.index(), error = %err, "source scanner failed");
                }
            }));
        }

        info!(sources = self.scanners.len(), "collection started");
        Ok(())
    }

    /// Stop every scanner and wait for all of their tasks to exit.
    ///
    /// On return no scanner task is running and no source subprocess is
    /// alive. The merged queue is closed for writing, so a consumer can
    /// drain whatever is buffered and then sees end-of-stream. Idempotent.
    pub async fn stop(&mut self) {
        // Covers stop-before-start: with the sender gone and no tasks, the
        // queue reads as closed instead of blocking a consumer forever.
        self.tx = None;

        for scanner in &self.scanners {
            scanner.stop();
        }
        for task in self.tasks.drain(..) {
            if let Err(err) = task.await {
                warn!(error = %err, "scanner task did not shut down cleanly");
            }
        }
        info!("collection stopped");
    }

    /// Wait for the next merged event.
    ///
    /// Returns `None` once every producer has exited and the buffered
    /// events are drained; it never blocks past end-of-stream. Safe to call
    /// from a single consuming task while scanner tasks are producing.
    pub async fn next_event(&mut self) -> Option<LogEvent> {
        self.rx.recv().await
    }

    /// Resolve a source index to its display name and color.
    ///
    /// Read-only; always safe concurrently with collection.
    pub fn resolve(&self, index: usize) -> Result<(&str, SourceColor), CollectorError> {
        self.registry.resolve(index)
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Per-scanner state snapshots, in registration order.
    pub fn scanner_states(&self) -> Vec<ScannerState> {
        self.scanners.iter().map(|s| s.state()).collect()
    }
}
