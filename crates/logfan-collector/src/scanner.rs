use std::process::Stdio;
use std::sync::Arc;

use chrono::Utc;
use logfan_types::{LogEvent, SourceDescriptor, SourceKind};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::command::{fetch_command, kubectl_available};
use crate::error::CollectorError;
use crate::registry::validate_descriptor;

/// Lifecycle of one scanner.
///
/// `Idle → Running → {Completed | Failed | Stopped}`. Every terminal state
/// has released the subprocess exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScannerState {
    Idle,
    Running,
    Completed,
    Failed,
    Stopped,
}

/// How the read loop ended.
enum ReadOutcome {
    Eof,
    Cancelled,
    ConsumerGone,
    ReadError(std::io::Error),
}

/// One running acquisition unit: tails a single source subprocess and emits
/// a [`LogEvent`] per line of its output.
///
/// The scanner owns its subprocess exclusively while running; the only
/// thing it shares with the rest of the system is the merged queue sender
/// it pushes into.
pub struct Scanner {
    index: usize,
    descriptor: SourceDescriptor,
    state: Arc<Mutex<ScannerState>>,
    cancel: CancellationToken,
}

impl Scanner {
    pub fn new(index: usize, descriptor: SourceDescriptor) -> Self {
        Self {
            index,
            descriptor,
            state: Arc::new(Mutex::new(ScannerState::Idle)),
            cancel: CancellationToken::new(),
        }
    }

    /// Stable registry index of this scanner's source.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> ScannerState {
        *self.state.lock()
    }

    /// Request termination of the subprocess and the read loop.
    ///
    /// Idempotent, and safe to call from any task at any point in the
    /// lifecycle, including concurrently with a running [`Scanner::run`].
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Run the source to completion (or until stopped), pushing one event
    /// per output line into `tx`.
    ///
    /// Intended to run on its own task. A full queue blocks the push, which
    /// throttles only this source's read loop.
    pub async fn run(&self, tx: mpsc::Sender<LogEvent>) -> Result<(), CollectorError> {
        if self.cancel.is_cancelled() {
            self.set_state(ScannerState::Stopped);
            return Ok(());
        }
        self.set_state(ScannerState::Running);

        let command = match self.prepare() {
            Ok(command) => command,
            Err(err) => {
                self.set_state(ScannerState::Failed);
                return Err(err);
            }
        };
        debug!(source = %self.descriptor.name, %command, "launching source");

        let mut child = match Command::new("sh")
            .arg("-c")
            .arg(&command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                self.set_state(ScannerState::Failed);
                return Err(CollectorError::LaunchFailure(err));
            }
        };

        let Some(stdout) = child.stdout.take() else {
            reap(child).await;
            self.set_state(ScannerState::Failed);
            return Err(CollectorError::LaunchFailure(std::io::Error::other(
                "child stdout was not captured",
            )));
        };

        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();

        let outcome = loop {
            buf.clear();
            let read = tokio::select! {
                _ = self.cancel.cancelled() => break ReadOutcome::Cancelled,
                read = reader.read_until(b'\n', &mut buf) => read,
            };

            match read {
                Ok(0) => break ReadOutcome::Eof,
                Ok(_) => {
                    let event = self.event_from_line(&buf);
                    tokio::select! {
                        _ = self.cancel.cancelled() => break ReadOutcome::Cancelled,
                        sent = tx.send(event) => {
                            if sent.is_err() {
                                break ReadOutcome::ConsumerGone;
                            }
                        }
                    }
                }
                Err(err) => break ReadOutcome::ReadError(err),
            }
        };

        // Exactly one release of the subprocess, on every exit path.
        reap(child).await;

        match outcome {
            ReadOutcome::Eof => {
                debug!(source = %self.descriptor.name, "source stream ended");
                self.set_state(ScannerState::Completed);
                Ok(())
            }
            ReadOutcome::Cancelled | ReadOutcome::ConsumerGone => {
                self.set_state(ScannerState::Stopped);
                Ok(())
            }
            ReadOutcome::ReadError(err) => {
                self.set_state(ScannerState::Failed);
                Err(CollectorError::StreamReadFailure(err))
            }
        }
    }

    /// Re-check the descriptor, probe for the fetch tool, and build the
    /// command line to launch.
    fn prepare(&self) -> Result<String, CollectorError> {
        validate_descriptor(&self.descriptor)?;

        if matches!(self.descriptor.kind, SourceKind::KubernetesPod(_)) && !kubectl_available() {
            return Err(CollectorError::SourceUnavailable(
                "kubectl was not found on PATH".to_string(),
            ));
        }

        fetch_command(&self.descriptor)
    }

    /// Build the event for one raw output line.
    ///
    /// The capture timestamp is taken here, at read time. Kubernetes lines
    /// carry a source timestamp prefix (we ask for one); it is split into
    /// the event's optional `source_timestamp` and stripped from the text.
    fn event_from_line(&self, raw: &[u8]) -> LogEvent {
        let mut end = raw.len();
        if end > 0 && raw[end - 1] == b'\n' {
            end -= 1;
        }
        if end > 0 && raw[end - 1] == b'\r' {
            end -= 1;
        }
        let line = String::from_utf8_lossy(&raw[..end]);

        let (source_timestamp, text) = match self.descriptor.kind {
            SourceKind::KubernetesPod(_) => {
                let (ts, rest) = crate::parser::split_source_timestamp(&line);
                (ts, rest.to_string())
            }
            SourceKind::Command { .. } => (None, line.into_owned()),
        };

        LogEvent {
            timestamp: Utc::now(),
            source_index: self.index,
            text,
            source_timestamp,
        }
    }

    fn set_state(&self, state: ScannerState) {
        *self.state.lock() = state;
    }
}

/// Terminate and reap a child. Killing an already-exited child reports an
/// error we can ignore; `wait` is what actually releases the handle.
async fn reap(mut child: Child) {
    if let Err(err) = child.start_kill() {
        debug!(error = %err, "child already exited before kill");
    }
    if let Err(err) = child.wait().await {
        warn!(error = %err, "failed reaping source subprocess");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logfan_types::{PodTarget, SourceColor};
    use std::time::Duration;
    use tokio::time::timeout;

    fn cmd_scanner(index: usize, command: &str) -> Scanner {
        Scanner::new(
            index,
            SourceDescriptor::command("test", SourceColor::Green, command),
        )
    }

    async fn wait_for_state(scanner: &Scanner, state: ScannerState) {
        timeout(Duration::from_secs(5), async {
            while scanner.state() != state {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("scanner never reached expected state");
    }

    #[tokio::test]
    async fn test_lines_arrive_in_emission_order() {
        let scanner = cmd_scanner(3, "printf 'L1\\nL2\\nL3\\n'");
        let (tx, mut rx) = mpsc::channel(16);

        scanner.run(tx).await.unwrap();
        assert_eq!(scanner.state(), ScannerState::Completed);

        let mut texts = Vec::new();
        while let Some(event) = rx.recv().await {
            assert_eq!(event.source_index, 3);
            assert!(event.source_timestamp.is_none());
            texts.push(event.text);
        }
        assert_eq!(texts, ["L1", "L2", "L3"]);
    }

    #[tokio::test]
    async fn test_eof_completes_without_events_for_silent_source() {
        let scanner = cmd_scanner(0, "true");
        let (tx, mut rx) = mpsc::channel(4);

        scanner.run(tx).await.unwrap();
        assert_eq!(scanner.state(), ScannerState::Completed);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_stop_terminates_a_long_running_source() {
        let scanner = Arc::new(cmd_scanner(0, "sleep 30"));
        let (tx, _rx) = mpsc::channel(4);

        let runner = {
            let scanner = Arc::clone(&scanner);
            tokio::spawn(async move { scanner.run(tx).await })
        };
        wait_for_state(&scanner, ScannerState::Running).await;

        scanner.stop();
        let result = timeout(Duration::from_secs(5), runner)
            .await
            .expect("stop did not terminate the scanner")
            .unwrap();
        assert!(result.is_ok());
        assert_eq!(scanner.state(), ScannerState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_safe_before_run() {
        let scanner = cmd_scanner(0, "printf 'x\\n'");
        scanner.stop();
        scanner.stop();

        let (tx, mut rx) = mpsc::channel(4);
        scanner.run(tx).await.unwrap();

        // A scanner stopped before it started emits nothing.
        assert_eq!(scanner.state(), ScannerState::Stopped);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_closed_queue_stops_the_scanner() {
        let scanner = cmd_scanner(0, "printf 'a\\nb\\n'");
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        scanner.run(tx).await.unwrap();
        assert_eq!(scanner.state(), ScannerState::Stopped);
    }

    #[tokio::test]
    async fn test_launch_failure_marks_scanner_failed() {
        // sh itself launches; an empty descriptor fails validation first.
        let scanner = cmd_scanner(0, "");
        let (tx, _rx) = mpsc::channel(4);

        let err = scanner.run(tx).await.unwrap_err();
        assert!(matches!(err, CollectorError::InvalidDescriptor(_)));
        assert_eq!(scanner.state(), ScannerState::Failed);
    }

    #[test]
    fn test_kubernetes_lines_are_split_from_source_timestamp() {
        let scanner = Scanner::new(
            1,
            SourceDescriptor::kubernetes("pod", SourceColor::Cyan, PodTarget::named("web-0")),
        );

        let event = scanner.event_from_line(b"2024-01-15T10:30:00Z ready to serve\n");
        assert_eq!(event.text, "ready to serve");
        assert_eq!(event.source_index, 1);
        assert!(event.source_timestamp.is_some());

        let plain = scanner.event_from_line(b"no prefix here\n");
        assert_eq!(plain.text, "no prefix here");
        assert!(plain.source_timestamp.is_none());
    }

    #[test]
    fn test_trailing_crlf_is_stripped() {
        let scanner = cmd_scanner(0, "true");
        assert_eq!(scanner.event_from_line(b"windows line\r\n").text, "windows line");
        assert_eq!(scanner.event_from_line(b"bare line").text, "bare line");
    }
}
