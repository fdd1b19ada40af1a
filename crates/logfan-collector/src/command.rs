use std::fmt::Write as _;
use std::process::Stdio;

use logfan_types::{SourceDescriptor, SourceKind};
use tracing::warn;

use crate::error::CollectorError;
use crate::registry::validate_descriptor;

/// Namespace used when a pod target does not name one.
const DEFAULT_NAMESPACE: &str = "default";

/// Build the shell command line that tails a source.
///
/// Pure with respect to the environment: no subprocess is spawned and no
/// tool availability is consulted, so command construction is testable on
/// its own. For command sources this is the configured line verbatim; for
/// Kubernetes sources it is a `kubectl logs` invocation that follows new
/// output only and asks for per-line timestamps.
pub fn fetch_command(descriptor: &SourceDescriptor) -> Result<String, CollectorError> {
    validate_descriptor(descriptor)?;

    match &descriptor.kind {
        SourceKind::Command { command } => Ok(command.clone()),
        SourceKind::KubernetesPod(target) => {
            let mut cmd = String::from("kubectl logs");

            if let Some(pod_name) = target.pod_name.as_deref() {
                let _ = write!(cmd, " {pod_name}");
            } else {
                let selector = target
                    .selector
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join(",");
                let _ = write!(cmd, " -l {selector}");
            }

            if let Some(container) = target.container.as_deref() {
                let _ = write!(cmd, " -c {container}");
            }

            let namespace = match target.namespace.as_deref() {
                Some(ns) => ns,
                None => {
                    warn!(
                        source = %descriptor.name,
                        "no namespace configured, tailing the default namespace"
                    );
                    DEFAULT_NAMESPACE
                }
            };
            let _ = write!(cmd, " -n {namespace} --timestamps=true --since=1s -f");

            Ok(cmd)
        }
    }
}

/// Probe for the external log-fetch tool a Kubernetes source needs.
pub(crate) fn kubectl_available() -> bool {
    std::process::Command::new("kubectl")
        .args(["version", "--client"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use logfan_types::{PodTarget, SourceColor};

    fn k8s(target: PodTarget) -> SourceDescriptor {
        SourceDescriptor::kubernetes("pod", SourceColor::Green, target)
    }

    #[test]
    fn test_command_source_is_verbatim() {
        let descriptor =
            SourceDescriptor::command("cmd", SourceColor::Red, "tail -f /var/log/syslog");
        assert_eq!(
            fetch_command(&descriptor).unwrap(),
            "tail -f /var/log/syslog"
        );
    }

    #[test]
    fn test_pod_by_name() {
        let cmd = fetch_command(&k8s(PodTarget::named("web-0").in_namespace("prod"))).unwrap();
        assert_eq!(cmd, "kubectl logs web-0 -n prod --timestamps=true --since=1s -f");
    }

    #[test]
    fn test_pod_by_selector_defaults_namespace() {
        let cmd = fetch_command(&k8s(PodTarget::selected([("app", "x")]))).unwrap();
        assert_eq!(
            cmd,
            "kubectl logs -l app=x -n default --timestamps=true --since=1s -f"
        );
    }

    #[test]
    fn test_multi_key_selector_is_conjunctive_and_ordered() {
        let cmd = fetch_command(&k8s(PodTarget::selected([
            ("tier", "front"),
            ("app", "web"),
        ])))
        .unwrap();
        // BTreeMap ordering keeps the generated command stable across runs.
        assert_eq!(
            cmd,
            "kubectl logs -l app=web,tier=front -n default --timestamps=true --since=1s -f"
        );
    }

    #[test]
    fn test_container_flag() {
        let cmd = fetch_command(&k8s(PodTarget::named("web-0")
            .in_namespace("prod")
            .in_container("nginx")))
        .unwrap();
        assert_eq!(
            cmd,
            "kubectl logs web-0 -c nginx -n prod --timestamps=true --since=1s -f"
        );
    }

    #[test]
    fn test_malformed_target_is_rejected() {
        assert!(matches!(
            fetch_command(&k8s(PodTarget::default())),
            Err(CollectorError::InvalidDescriptor(_))
        ));
    }
}
