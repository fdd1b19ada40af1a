use std::collections::VecDeque;

use logfan_types::LogEvent;

/// Bounded display history for the merged stream.
///
/// Owned by the consuming loop alone, so no locking; the oldest entry is
/// evicted once capacity is reached. This is display state only — the
/// collection core never depends on it.
pub struct Scrollback {
    entries: VecDeque<LogEvent>,
    capacity: usize,
    /// Total events ever pushed, including evicted ones.
    total_seen: u64,
}

impl Scrollback {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            total_seen: 0,
        }
    }

    pub fn push(&mut self, event: LogEvent) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(event);
        self.total_seen += 1;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_seen(&self) -> u64 {
        self.total_seen
    }

    /// A window of `count` entries starting at `start` (for the viewport).
    pub fn window(&self, start: usize, count: usize) -> impl Iterator<Item = &LogEvent> {
        self.entries.iter().skip(start).take(count)
    }

    /// The last `n` entries.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &LogEvent> {
        let start = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(text: &str) -> LogEvent {
        LogEvent::new(0, text)
    }

    #[test]
    fn test_eviction_at_capacity() {
        let mut scrollback = Scrollback::new(3);
        for text in ["a", "b", "c", "d"] {
            scrollback.push(event(text));
        }

        assert_eq!(scrollback.len(), 3);
        assert_eq!(scrollback.total_seen(), 4);
        let texts: Vec<_> = scrollback.window(0, 10).map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["b", "c", "d"]);
    }

    #[test]
    fn test_tail_window() {
        let mut scrollback = Scrollback::new(10);
        for text in ["a", "b", "c"] {
            scrollback.push(event(text));
        }

        let texts: Vec<_> = scrollback.tail(2).map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["b", "c"]);

        let all: Vec<_> = scrollback.tail(99).map(|e| e.text.as_str()).collect();
        assert_eq!(all, ["a", "b", "c"]);
    }
}
