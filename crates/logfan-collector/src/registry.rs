use logfan_types::{SourceColor, SourceDescriptor, SourceKind};

use crate::error::CollectorError;

/// Insertion-ordered table of registered sources.
///
/// Append-only while the collector is being set up, read-only once
/// collection starts. Indices are stable for the process lifetime and are
/// the `source_index` carried by every emitted event.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: Vec<SourceDescriptor>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a descriptor, returning its assigned index.
    ///
    /// Indices are sequential from zero in registration order.
    pub fn register(&mut self, descriptor: SourceDescriptor) -> Result<usize, CollectorError> {
        validate_descriptor(&descriptor)?;
        let index = self.sources.len();
        self.sources.push(descriptor);
        Ok(index)
    }

    /// Resolve an index to the display identity of its source.
    pub fn resolve(&self, index: usize) -> Result<(&str, SourceColor), CollectorError> {
        self.sources
            .get(index)
            .map(|d| (d.name.as_str(), d.color))
            .ok_or(CollectorError::UnknownIndex(index))
    }

    /// Full descriptor for an index, if registered.
    pub fn get(&self, index: usize) -> Option<&SourceDescriptor> {
        self.sources.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Check a descriptor's kind-specific invariant.
///
/// Called at registration, and again defensively by the scanner before it
/// launches anything.
pub(crate) fn validate_descriptor(descriptor: &SourceDescriptor) -> Result<(), CollectorError> {
    match &descriptor.kind {
        SourceKind::Command { command } => {
            if command.trim().is_empty() {
                return Err(CollectorError::InvalidDescriptor(format!(
                    "source '{}' has an empty command line",
                    descriptor.name
                )));
            }
        }
        SourceKind::KubernetesPod(target) => {
            let has_name = target.pod_name.as_deref().is_some_and(|n| !n.is_empty());
            let has_selector = !target.selector.is_empty();
            if has_name == has_selector {
                return Err(CollectorError::InvalidDescriptor(format!(
                    "source '{}' must set exactly one of pod name or pod selector",
                    descriptor.name
                )));
            }
        }
    }
    Ok(())
}
