use logfan_types::SourceColor;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::scrollback::Scrollback;

/// Display identity of one source, resolved from the registry once at
/// startup (the registry is immutable during collection).
#[derive(Clone, Debug)]
pub struct SourceLabel {
    pub name: String,
    pub color: SourceColor,
}

impl SourceLabel {
    pub fn new(name: impl Into<String>, color: SourceColor) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

/// Viewport over the scrollback: scroll position, follow mode, rendering.
pub struct LogView {
    /// How many lines above the tail the viewport is anchored. Zero means
    /// following new output.
    scroll_from_tail: usize,
    /// Inner height at the last render, for page-sized scrolling.
    last_height: usize,
}

impl LogView {
    pub fn new() -> Self {
        Self {
            scroll_from_tail: 0,
            last_height: 0,
        }
    }

    pub fn following(&self) -> bool {
        self.scroll_from_tail == 0
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_from_tail = self.scroll_from_tail.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_from_tail = self.scroll_from_tail.saturating_sub(lines);
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.last_height.max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.last_height.max(1));
    }

    /// Jump back to the tail and resume following new output.
    pub fn to_tail(&mut self) {
        self.scroll_from_tail = 0;
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, scrollback: &Scrollback, labels: &[SourceLabel]) {
        let height = area.height.saturating_sub(2) as usize;
        self.last_height = height;

        // Clamp so scrolling up past the oldest entry pins to the top.
        let max_scroll = scrollback.len().saturating_sub(height);
        self.scroll_from_tail = self.scroll_from_tail.min(max_scroll);

        let start = scrollback
            .len()
            .saturating_sub(height + self.scroll_from_tail);
        let lines: Vec<Line> = scrollback
            .window(start, height)
            .map(|event| {
                let (name, color) = labels
                    .get(event.source_index)
                    .map(|l| (l.name.as_str(), l.color.color()))
                    .unwrap_or(("?", SourceColor::Black.color()));

                Line::from(vec![
                    Span::styled(
                        event.timestamp.format("%H:%M:%S%.3f ").to_string(),
                        Style::default().add_modifier(Modifier::DIM),
                    ),
                    Span::styled(
                        format!("{name} "),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(event.text.clone(), Style::default().fg(color)),
                ])
            })
            .collect();

        let title = if self.following() {
            format!(" logfan ─ {} sources ", labels.len())
        } else {
            format!(
                " logfan ─ {} sources ─ scrolled {} (G to follow) ",
                labels.len(),
                self.scroll_from_tail
            )
        };

        let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, area);
    }
}

impl Default for LogView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_tracks_follow_mode() {
        let mut view = LogView::new();
        assert!(view.following());

        view.scroll_up(5);
        assert!(!view.following());

        view.scroll_down(3);
        view.scroll_down(3);
        assert!(view.following());

        view.scroll_up(2);
        view.to_tail();
        assert!(view.following());
    }
}
