//! Source configuration loading.
//!
//! The config file is a JSON document listing source entries:
//!
//! ```json
//! {
//!   "sources": [
//!     { "type": "CMD", "name": "api", "color": "green",
//!       "command": "tail -f /var/log/api.log" },
//!     { "type": "K8S", "name": "web", "color": "cyan",
//!       "pod": { "podSelector": { "app": "web" }, "namespace": "prod" } }
//!   ]
//! }
//! ```
//!
//! A missing or unknown `type`, or a `CMD` entry without a `command`, is a
//! parse error and aborts startup before anything is registered. Unknown
//! color names fall back to black.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use logfan_types::{PodTarget, SourceColor, SourceDescriptor, SourceKind};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ConfigFile {
    sources: Vec<SourceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum SourceEntry {
    #[serde(rename = "CMD")]
    Command {
        #[serde(default = "default_name")]
        name: String,
        #[serde(default)]
        color: String,
        command: String,
    },
    #[serde(rename = "K8S")]
    Kubernetes {
        #[serde(default = "default_name")]
        name: String,
        #[serde(default)]
        color: String,
        pod: PodEntry,
    },
}

#[derive(Debug, Default, Deserialize)]
struct PodEntry {
    name: Option<String>,
    #[serde(default, rename = "podSelector")]
    pod_selector: BTreeMap<String, String>,
    namespace: Option<String>,
    container: Option<String>,
}

fn default_name() -> String {
    "source".to_string()
}

impl From<SourceEntry> for SourceDescriptor {
    fn from(entry: SourceEntry) -> Self {
        match entry {
            SourceEntry::Command {
                name,
                color,
                command,
            } => SourceDescriptor {
                kind: SourceKind::Command { command },
                name,
                color: SourceColor::parse(&color),
            },
            SourceEntry::Kubernetes { name, color, pod } => SourceDescriptor {
                kind: SourceKind::KubernetesPod(PodTarget {
                    pod_name: pod.name,
                    selector: pod.pod_selector,
                    namespace: pod.namespace,
                    container: pod.container,
                }),
                name,
                color: SourceColor::parse(&color),
            },
        }
    }
}

/// Load and parse the source list from a config file.
pub fn load(path: &Path) -> anyhow::Result<Vec<SourceDescriptor>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    parse(&raw).with_context(|| format!("parsing config file {}", path.display()))
}

fn parse(raw: &str) -> anyhow::Result<Vec<SourceDescriptor>> {
    let file: ConfigFile = serde_json::from_str(raw)?;
    Ok(file.sources.into_iter().map(Into::into).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "sources": [
            { "type": "CMD", "name": "api", "color": "green",
              "command": "tail -f /var/log/api.log" },
            { "type": "K8S", "name": "web", "color": "cyan",
              "pod": { "podSelector": { "app": "web" },
                       "namespace": "prod", "container": "nginx" } }
        ]
    }"#;

    #[test]
    fn test_parses_both_source_kinds() {
        let sources = parse(SAMPLE).unwrap();
        assert_eq!(sources.len(), 2);

        assert_eq!(sources[0].name, "api");
        assert_eq!(sources[0].color, SourceColor::Green);
        assert!(matches!(
            &sources[0].kind,
            SourceKind::Command { command } if command == "tail -f /var/log/api.log"
        ));

        assert_eq!(sources[1].name, "web");
        let SourceKind::KubernetesPod(target) = &sources[1].kind else {
            panic!("expected a kubernetes source");
        };
        assert_eq!(target.selector.get("app").map(String::as_str), Some("web"));
        assert_eq!(target.namespace.as_deref(), Some("prod"));
        assert_eq!(target.container.as_deref(), Some("nginx"));
    }

    #[test]
    fn test_missing_type_is_an_error() {
        let raw = r#"{ "sources": [ { "name": "x", "command": "true" } ] }"#;
        assert!(parse(raw).is_err());
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let raw = r#"{ "sources": [ { "type": "FILE", "name": "x" } ] }"#;
        assert!(parse(raw).is_err());
    }

    #[test]
    fn test_cmd_without_command_is_an_error() {
        let raw = r#"{ "sources": [ { "type": "CMD", "name": "x" } ] }"#;
        assert!(parse(raw).is_err());
    }

    #[test]
    fn test_unknown_color_falls_back_to_black() {
        let raw = r#"{ "sources": [ { "type": "CMD", "color": "mauve", "command": "true" } ] }"#;
        let sources = parse(raw).unwrap();
        assert_eq!(sources[0].color, SourceColor::Black);
        assert_eq!(sources[0].name, "source");
    }

    #[test]
    fn test_load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let sources = load(file.path()).unwrap();
        assert_eq!(sources.len(), 2);
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        assert!(load(Path::new("/nonexistent/logfan.json")).is_err());
    }
}
