//! Busy indicator — a small spinner + label rendered in the top-right
//! corner of a given area while tool jobs are running.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Braille-dot spinner frames.  Cycles through these on each tick.
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Render this on top of the tab bar's border.  It picks its own position
/// (top-right of `area`) and draws nothing when no job is running.
pub struct BusyIndicator {
    /// Number of jobs still running.
    pub running: usize,
    /// Monotonically increasing tick counter (drives the spinner frame).
    pub tick: u64,
}

impl BusyIndicator {
    fn label(&self) -> String {
        let frame = SPINNER_FRAMES[(self.tick as usize) % SPINNER_FRAMES.len()];
        if self.running == 1 {
            format!(" {frame} running ")
        } else {
            format!(" {frame} running {} ", self.running)
        }
    }
}

impl Widget for BusyIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.running == 0 || area.width < 20 || area.height == 0 {
            return;
        }

        let label = self.label();
        let label_width = label.chars().count() as u16;
        // Top-right, inside the border (leave 1 col for the corner char).
        let x = area.x + area.width.saturating_sub(label_width + 2);
        let y = area.y;

        let line = Line::from(Span::styled(
            label,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));

        buf.set_line(x, y, &line, label_width);
    }
}
