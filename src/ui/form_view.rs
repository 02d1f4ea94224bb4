//! Renders a tab's [`FormItem`] table: headings, checkboxes, radio groups,
//! sliders and buttons, one row each.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::app::form::FormItem;
use crate::app::state::AppState;

use super::theme::Theme;

/// Width of the label column for radio and slider rows.
const LABEL_WIDTH: usize = 22;
/// Cells in the slider bar.
const SLIDER_CELLS: usize = 16;

/// The form widget — created fresh each frame.
pub struct FormWidget<'a> {
    state: &'a AppState,
    items: &'a [FormItem],
    selected: usize,
    block: Option<Block<'a>>,
}

impl<'a> FormWidget<'a> {
    pub fn new(state: &'a AppState, items: &'a [FormItem]) -> Self {
        Self {
            state,
            items,
            selected: 0,
            block: None,
        }
    }

    pub fn selected(mut self, selected: usize) -> Self {
        self.selected = selected;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Build the line for one row.  Radio groups too wide for `width`
    /// collapse to the active option between arrows.
    pub fn row(&self, item: &FormItem, is_selected: bool, width: usize) -> Line<'static> {
        let prefix = if is_selected { " ▸ " } else { "   " };
        let hl = |style: Style| {
            if is_selected {
                style.patch(Theme::selected_style())
            } else {
                style
            }
        };

        match item {
            FormItem::Heading(text) => Line::from(Span::styled(
                format!(" {text}"),
                Theme::heading_style(),
            )),
            FormItem::Toggle { label, get, .. } => {
                let mark = if get(self.state) { "[x]" } else { "[ ]" };
                Line::from(vec![
                    Span::styled(prefix, hl(Theme::label_style())),
                    Span::styled(format!("{mark} {label}"), hl(Theme::label_style())),
                ])
            }
            FormItem::Radio { label, options, .. } => {
                let (labels, active) = options(self.state);
                let head = vec![
                    Span::styled(prefix, hl(Theme::label_style())),
                    Span::styled(
                        format!("{label:<width$}", width = LABEL_WIDTH),
                        hl(Theme::label_style()),
                    ),
                ];
                let mut spans = head.clone();
                for (i, option) in labels.iter().enumerate() {
                    let (dot, style) = if i == active {
                        ("(•)", Theme::active_option_style())
                    } else {
                        ("( )", Theme::option_style())
                    };
                    spans.push(Span::styled(format!(" {dot} {option}"), hl(style)));
                }
                let line = Line::from(spans);
                if line.width() <= width {
                    return line;
                }

                let current = labels.get(active).map(String::as_str).unwrap_or_default();
                let mut spans = head;
                spans.push(Span::styled(
                    format!(" ◀ {current} ▶"),
                    hl(Theme::active_option_style()),
                ));
                Line::from(spans)
            }
            FormItem::Slider { label, get, .. } => {
                let value = get(self.state);
                Line::from(vec![
                    Span::styled(prefix, hl(Theme::label_style())),
                    Span::styled(
                        format!("{label:<width$}", width = LABEL_WIDTH),
                        hl(Theme::label_style()),
                    ),
                    Span::styled(
                        format!(" ◀ {} ▶ {value:>3}", slider_bar(value)),
                        hl(Theme::active_option_style()),
                    ),
                ])
            }
            FormItem::Button { label, .. } => Line::from(vec![
                Span::styled(prefix, hl(Theme::button_style())),
                Span::styled(format!("[ {label} ]"), hl(Theme::button_style())),
            ]),
        }
    }
}

/// Filled/empty bar for a 0–255 value.
fn slider_bar(value: u8) -> String {
    let filled = (value as usize * SLIDER_CELLS + 127) / 255;
    let mut bar = "█".repeat(filled);
    bar.push_str(&"░".repeat(SLIDER_CELLS - filled));
    bar
}

/// First visible row so that `selected` stays on screen.
fn scroll_offset(selected: usize, height: usize) -> usize {
    if height == 0 {
        return 0;
    }
    selected.saturating_sub(height - 1)
}

impl<'a> Widget for FormWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(ref block) = self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let offset = scroll_offset(self.selected, inner.height as usize);
        let visible = self
            .items
            .iter()
            .enumerate()
            .skip(offset)
            .take(inner.height as usize);

        for (i, (idx, item)) in visible.enumerate() {
            let y = inner.y + i as u16;
            let line = self.row(
                item,
                idx == self.selected && item.selectable(),
                inner.width as usize,
            );
            buf.set_line(inner.x, y, &line, inner.width);
        }
    }
}
