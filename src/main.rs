use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{KeyCode, KeyModifiers, MouseEventKind};

use logfan_collector::{Collector, DEFAULT_QUEUE_CAPACITY};
use logfan_tui::{Event, EventHandler, LogView, Scrollback, SourceLabel, Tui};

mod config;

/// Logfan - fans multiple command and pod log streams into one terminal view
#[derive(Parser, Debug)]
#[command(name = "logfan")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON source configuration
    #[arg(short, long, default_value = "logfan.json")]
    config: PathBuf,

    /// Capacity of the merged event queue
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Log lines kept for display scrollback
    #[arg(long, default_value_t = 10_000)]
    scrollback: usize,

    /// Append process diagnostics to this file (keeps the terminal clean)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let result = run_app(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run_app(args: Args) -> Result<()> {
    let sources = config::load(&args.config)?;
    if sources.is_empty() {
        anyhow::bail!("no sources configured in {}", args.config.display());
    }

    let mut collector = Collector::new(args.queue_capacity);
    for descriptor in sources {
        let name = descriptor.name.clone();
        collector
            .register(descriptor)
            .with_context(|| format!("registering source '{name}'"))?;
    }

    // The registry is immutable from here on; resolve display identities once.
    let labels: Vec<SourceLabel> = collector
        .registry()
        .iter()
        .map(|d| SourceLabel::new(d.name.clone(), d.color))
        .collect();

    collector.start()?;
    tracing::info!(sources = labels.len(), "sources started");

    let mut tui = Tui::new().context("initialising terminal")?;
    let mut events = EventHandler::new(Duration::from_millis(250));
    let mut view = LogView::new();
    let mut scrollback = Scrollback::new(args.scrollback);

    let mut stream_open = true;
    loop {
        tokio::select! {
            maybe_event = collector.next_event(), if stream_open => {
                match maybe_event {
                    Some(event) => scrollback.push(event),
                    // All sources are done; keep displaying what we have.
                    None => stream_open = false,
                }
            }

            maybe_input = events.next() => {
                let Some(input) = maybe_input else { break };
                match input {
                    Event::Tick | Event::Resize(..) => {
                        tui.terminal().draw(|frame| {
                            let area = frame.area();
                            view.render(frame, area, &scrollback, &labels);
                        })?;
                    }
                    Event::Key(key) => match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                        KeyCode::Up | KeyCode::Char('k') => view.scroll_up(1),
                        KeyCode::Down | KeyCode::Char('j') => view.scroll_down(1),
                        KeyCode::PageUp => view.page_up(),
                        KeyCode::PageDown => view.page_down(),
                        KeyCode::Char('G') | KeyCode::End => view.to_tail(),
                        _ => {}
                    },
                    Event::Mouse(mouse) => match mouse.kind {
                        MouseEventKind::ScrollUp => view.scroll_up(3),
                        MouseEventKind::ScrollDown => view.scroll_down(3),
                        _ => {}
                    },
                }
            }
        }
    }

    events.shutdown();
    collector.stop().await;
    tracing::info!("sources stopped");
    tui.restore().context("restoring terminal")?;

    Ok(())
}
