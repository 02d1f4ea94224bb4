//! Colour palette and text styles used across the UI.

use ratatui::style::{Color, Modifier, Style};

/// Central theme — change colours here and they propagate everywhere.
pub struct Theme;

impl Theme {
    // ── forms ──────────────────────────────────────────────────
    pub fn heading_style() -> Style {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    }

    pub fn label_style() -> Style {
        Style::default().fg(Color::White)
    }

    pub fn option_style() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn active_option_style() -> Style {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }

    pub fn button_style() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn selected_style() -> Style {
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    // ── logs ───────────────────────────────────────────────────
    pub fn log_style() -> Style {
        Style::default().fg(Color::White)
    }

    pub fn timestamp_style() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    pub fn error_style() -> Style {
        Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD)
    }

    // ── chrome ─────────────────────────────────────────────────
    pub fn border_style() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn title_style() -> Style {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }

    pub fn tab_highlight_style() -> Style {
        Style::default().fg(Color::Black).bg(Color::LightYellow)
    }

    pub fn status_bar_style() -> Style {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    }

    pub fn dirty_style() -> Style {
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    pub fn prompt_input_style() -> Style {
        Style::default().fg(Color::Yellow)
    }
}
