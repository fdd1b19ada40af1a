use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent};
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Terminal input events
#[derive(Clone, Debug)]
pub enum Event {
    /// Periodic redraw tick
    Tick,
    /// Key press
    Key(KeyEvent),
    /// Mouse input (wheel scrolling)
    Mouse(MouseEvent),
    /// Terminal resize
    Resize(u16, u16),
}

/// Reads terminal input on a background task and hands it to the main loop
/// alongside a redraw tick.
pub struct EventHandler {
    receiver: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut reader = event::EventStream::new();
                let mut ticks = tokio::time::interval(tick_rate);

                loop {
                    let input = reader.next().fuse();

                    tokio::select! {
                        _ = cancel.cancelled() => break,

                        _ = ticks.tick() => {
                            if sender.send(Event::Tick).is_err() {
                                break;
                            }
                        }

                        maybe_event = input => {
                            match maybe_event {
                                Some(Ok(CrosstermEvent::Key(key))) => {
                                    // Filter out release events (important for Windows)
                                    if key.kind == KeyEventKind::Press {
                                        let _ = sender.send(Event::Key(key));
                                    }
                                }
                                Some(Ok(CrosstermEvent::Mouse(mouse))) => {
                                    let _ = sender.send(Event::Mouse(mouse));
                                }
                                Some(Ok(CrosstermEvent::Resize(w, h))) => {
                                    let _ = sender.send(Event::Resize(w, h));
                                }
                                Some(Ok(_)) => {}
                                Some(Err(_)) | None => break,
                            }
                        }
                    }
                }
            });
        }

        Self { receiver, cancel }
    }

    /// Receive the next input event.
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Stop the input task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
