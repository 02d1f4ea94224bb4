//! Scrollable log panel (Console and Device Results).

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::app::state::LogPanel;

use super::theme::Theme;

/// Length of the `HH:MM:SS` stamp at the start of a log entry.
const STAMP_LEN: usize = 8;

pub struct LogView<'a> {
    panel: &'a LogPanel,
    block: Option<Block<'a>>,
}

impl<'a> LogView<'a> {
    pub fn new(panel: &'a LogPanel) -> Self {
        Self { panel, block: None }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

/// Index range of the lines visible in a viewport of `height` rows, with the
/// view `scroll` lines up from the tail.
fn visible_range(len: usize, scroll: usize, height: usize) -> std::ops::Range<usize> {
    let end = len.saturating_sub(scroll);
    end.saturating_sub(height)..end
}

fn styled(line: &str) -> Line<'_> {
    let is_stamped = line.len() > STAMP_LEN
        && line.as_bytes()[2] == b':'
        && line.as_bytes()[5] == b':'
        && line.is_char_boundary(STAMP_LEN);
    let body_style = if line.contains("Error") || line.contains("timed out") {
        Theme::error_style()
    } else {
        Theme::log_style()
    };
    if is_stamped {
        let (stamp, rest) = line.split_at(STAMP_LEN);
        Line::from(vec![
            Span::styled(stamp, Theme::timestamp_style()),
            Span::styled(rest, body_style),
        ])
    } else {
        Line::from(Span::styled(line, body_style))
    }
}

impl<'a> Widget for LogView<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(ref block) = self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        if self.panel.is_empty() {
            if inner.height == 0 {
                return;
            }
            let hint = Line::from(Span::styled(" No output yet", Theme::timestamp_style()));
            buf.set_line(inner.x, inner.y, &hint, inner.width);
            return;
        }

        let range = visible_range(self.panel.len(), self.panel.scroll, inner.height as usize);
        let lines = self
            .panel
            .lines()
            .skip(range.start)
            .take(range.end - range.start);

        for (i, line) in lines.enumerate() {
            buf.set_line(inner.x, inner.y + i as u16, &styled(line), inner.width);
        }
    }
}
