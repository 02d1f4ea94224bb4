//! Popup overlay widgets: the message box and the path prompt.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget, Wrap},
};

use super::theme::Theme;

// ───────────────────────────────────────── message popup ─────

/// Modal message with a title, wrapped body and a dismiss hint.
pub struct MessagePopup<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub is_error: bool,
}

impl<'a> Widget for MessagePopup<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width: u16 = 56;
        // Rough wrapped height: body chars over the inner width, plus
        // padding, hint and borders.
        let inner_width = (width - 4) as usize;
        let body_rows = self
            .body
            .lines()
            .map(|l| l.chars().count().max(1).div_ceil(inner_width))
            .sum::<usize>()
            .max(1) as u16;
        let popup = centered_fixed(width, body_rows + 6, area);
        Clear.render(popup, buf);

        let accent = if self.is_error { Color::Red } else { Color::Cyan };
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(Style::default().fg(accent).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(accent));

        let inner = block.inner(popup);
        block.render(popup, buf);

        let body_style = if self.is_error {
            Theme::error_style()
        } else {
            Style::default().fg(Color::White)
        };
        let mut lines = vec![Line::raw("")];
        lines.extend(
            self.body
                .lines()
                .map(|l| Line::from(Span::styled(format!(" {l}"), body_style))),
        );
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            " Enter/Esc: close",
            Style::default().fg(Color::DarkGray),
        )));

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}

// ───────────────────────────────────────── path prompt ───────

/// Single-line text input asking for a file path.
pub struct PromptPopup<'a> {
    pub title: &'a str,
    pub input: &'a str,
}

impl<'a> Widget for PromptPopup<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = centered_fixed(70, 7, area);
        Clear.render(popup, buf);

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::DarkGray));

        let inner = block.inner(popup);
        block.render(popup, buf);

        // Keep the end of long paths (and the cursor) in view.
        let room = (inner.width as usize).saturating_sub(4);
        let count = self.input.chars().count();
        let shown: String = self.input.chars().skip(count.saturating_sub(room)).collect();

        let lines = vec![
            Line::raw(""),
            Line::from(vec![
                Span::styled(" > ", Style::default().fg(Color::DarkGray)),
                Span::styled(shown, Theme::prompt_input_style()),
                Span::styled("█", Theme::prompt_input_style()),
            ]),
            Line::raw(""),
            Line::from(Span::styled(
                " Enter: confirm  Esc: cancel  Ctrl-u: clear",
                Style::default().fg(Color::DarkGray),
            )),
        ];

        Paragraph::new(lines).render(inner, buf);
    }
}

// ───────────────────────────────────────── helpers ───────────

/// Create a centered rectangle with fixed dimensions, clamped to the available area.
fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect::new(x, y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen(buf: &Buffer) -> String {
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn centered_fixed_clamps_to_area() {
        let r = centered_fixed(40, 10, Rect::new(0, 0, 100, 30));
        assert_eq!(r, Rect::new(30, 10, 40, 10));
        let r = centered_fixed(40, 10, Rect::new(0, 0, 20, 5));
        assert_eq!(r, Rect::new(0, 0, 20, 5));
    }

    #[test]
    fn message_shows_title_and_body() {
        let area = Rect::new(0, 0, 80, 20);
        let mut buf = Buffer::empty(area);
        MessagePopup {
            title: "Success",
            body: "Configuration has been saved",
            is_error: false,
        }
        .render(area, &mut buf);
        let text = screen(&buf);
        assert!(text.contains(" Success "));
        assert!(text.contains("Configuration has been saved"));
    }

    #[test]
    fn prompt_keeps_the_tail_of_long_input() {
        let area = Rect::new(0, 0, 80, 20);
        let mut buf = Buffer::empty(area);
        let long = format!("/{}/device.ini", "x".repeat(120));
        PromptPopup {
            title: "Load settings from INI",
            input: &long,
        }
        .render(area, &mut buf);
        let text = screen(&buf);
        assert!(text.contains("device.ini█"));
        assert!(text.contains("Load settings from INI"));
    }
}
