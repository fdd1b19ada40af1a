//! Shared types for logfan
//!
//! This crate contains the data structures used across the collector and
//! display crates: source descriptors, the display color palette, and the
//! log event flowing through the merged queue.

use chrono::{DateTime, Utc};
use ratatui::style::Color;
use std::collections::BTreeMap;

// ============================================================================
// Display Palette
// ============================================================================

/// Fixed palette a source's output can be tagged with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SourceColor {
    #[default]
    Black,
    White,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
}

impl SourceColor {
    /// Parse a color name from configuration.
    ///
    /// Total: unrecognised names fall back to [`SourceColor::Black`].
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "white" => Self::White,
            "red" => Self::Red,
            "green" => Self::Green,
            "yellow" => Self::Yellow,
            "blue" => Self::Blue,
            "magenta" => Self::Magenta,
            "cyan" => Self::Cyan,
            _ => Self::Black,
        }
    }

    /// Terminal color used when rendering lines from this source.
    pub fn color(&self) -> Color {
        match self {
            Self::Black => Color::Black,
            Self::White => Color::White,
            Self::Red => Color::Red,
            Self::Green => Color::Green,
            Self::Yellow => Color::Yellow,
            Self::Blue => Color::Blue,
            Self::Magenta => Color::Magenta,
            Self::Cyan => Color::Cyan,
        }
    }

    /// Canonical configuration name for this color.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::White => "white",
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Magenta => "magenta",
            Self::Cyan => "cyan",
        }
    }
}

// ============================================================================
// Source Descriptors
// ============================================================================

/// Pod identification for a Kubernetes log source.
///
/// Exactly one of `pod_name` / non-empty `selector` must be set; the
/// registry rejects descriptors that violate this.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PodTarget {
    /// Tail one pod by name.
    pub pod_name: Option<String>,

    /// Tail every pod matching all of these label pairs.
    pub selector: BTreeMap<String, String>,

    /// Namespace to tail in; `"default"` when unset.
    pub namespace: Option<String>,

    /// Container within the pod(s), for multi-container pods.
    pub container: Option<String>,
}

impl PodTarget {
    /// Target a single pod by name.
    pub fn named(pod_name: impl Into<String>) -> Self {
        Self {
            pod_name: Some(pod_name.into()),
            ..Self::default()
        }
    }

    /// Target all pods matching the given label pairs.
    pub fn selected<K, V>(labels: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            selector: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn in_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }
}

/// What kind of external process a source tails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// A shell-interpreted command line whose stdout is tailed.
    Command { command: String },

    /// A `kubectl logs` tail of one pod or a label selection of pods.
    KubernetesPod(PodTarget),
}

/// Immutable configuration identifying one log source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub kind: SourceKind,

    /// Display name shown next to every line from this source.
    pub name: String,

    /// Display color for this source's lines.
    pub color: SourceColor,
}

impl SourceDescriptor {
    /// Descriptor for a shell command source.
    pub fn command(name: impl Into<String>, color: SourceColor, command: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Command {
                command: command.into(),
            },
            name: name.into(),
            color,
        }
    }

    /// Descriptor for a Kubernetes pod log source.
    pub fn kubernetes(name: impl Into<String>, color: SourceColor, target: PodTarget) -> Self {
        Self {
            kind: SourceKind::KubernetesPod(target),
            name: name.into(),
            color,
        }
    }
}

// ============================================================================
// Log Events
// ============================================================================

/// One line of source output flowing through the merged queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEvent {
    /// When this process read the line. Always set by the scanner, never by
    /// the source.
    pub timestamp: DateTime<Utc>,

    /// Index of the originating source in the registry.
    pub source_index: usize,

    /// The line content, without its trailing newline.
    pub text: String,

    /// Timestamp the external fetch tool prefixed the line with, when one
    /// was requested and present. Supplements `timestamp`, never replaces it.
    pub source_timestamp: Option<DateTime<Utc>>,
}

impl LogEvent {
    /// Event captured now, with no source-provided timestamp.
    pub fn new(source_index: usize, text: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            source_index,
            text: text.into(),
            source_timestamp: None,
        }
    }
}
