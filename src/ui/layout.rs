//! Layout helpers — split the terminal area into regions.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Primary screen layout: tab bar, tab body and a bottom status bar.
pub struct AppLayout {
    pub tabs_area: Rect,
    pub body_area: Rect,
    pub status_area: Rect,
}

impl AppLayout {
    /// Compute the layout from the full terminal area.
    pub fn from_area(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // tab bar with border
                Constraint::Min(3),    // active tab (takes all remaining space)
                Constraint::Length(1), // status bar
            ])
            .split(area);

        Self {
            tabs_area: chunks[0],
            body_area: chunks[1],
            status_area: chunks[2],
        }
    }
}

/// Split the Actions tab body into the button form (left) and the device
/// results panel (right).  Narrow terminals stack them instead.
pub fn split_actions(body: Rect) -> (Rect, Rect) {
    let (direction, constraints) = if body.width >= 80 {
        (
            Direction::Horizontal,
            [Constraint::Length(40), Constraint::Min(20)],
        )
    } else {
        (
            Direction::Vertical,
            [Constraint::Percentage(55), Constraint::Percentage(45)],
        )
    };
    let chunks = Layout::default()
        .direction(direction)
        .constraints(constraints)
        .split(body);
    (chunks[0], chunks[1])
}
