//! Terminal configuration utility for the USBSID-Pico.
//!
//! Edits the device settings INI file in a tabbed form and drives the
//! `cfg_usbsid` command-line tool for everything that talks to the device.

mod app;
mod config;
mod core;
mod ui;

use std::io::{self, stderr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Tabs},
    Frame, Terminal,
};
use tokio::sync::mpsc;

use crate::app::{
    event::{spawn_event_reader, AppEvent},
    form, handler,
    jobs::{self, JobUpdate},
    state::{AppState, Overlay, Tab},
};
use crate::core::tool::{self, has_ini_extension, ToolRunner};
use crate::ui::{
    form_view::FormWidget,
    layout::{split_actions, AppLayout},
    log_view::LogView,
    popup::{MessagePopup, PromptPopup},
    spinner::BusyIndicator,
    theme::Theme,
};

/// INI file opened when nothing else is given.
const DEFAULT_INI: &str = "default.ini";

const KEY_HINTS: &str =
    "Tab: switch  ↑↓: move  ←→: change  Enter: toggle  s: save  l: load  c: clear log  q: quit";

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), version, about = "USBSID-Pico configuration utility")]
struct Cli {
    /// INI file to edit (defaults to the last one used, then `default.ini`
    /// next to this binary).
    ini: Option<PathBuf>,

    /// Location of the `cfg_usbsid` executable.
    #[arg(long)]
    tool: Option<PathBuf>,

    /// Timeout for device actions, in seconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=120))]
    timeout: Option<u64>,

    /// UI refresh tick in milliseconds.
    #[arg(long = "tick-ms", default_value_t = 100)]
    tick_ms: u64,
}

/// Pick the INI file to open: an explicit `.ini` argument, then the last
/// file used, then `default.ini` in `fallback_dir`.
fn resolve_ini_path(arg: Option<&Path>, last_ini: Option<&Path>, fallback_dir: &Path) -> PathBuf {
    if let Some(path) = arg {
        if has_ini_extension(path) {
            return path.to_path_buf();
        }
        tracing::warn!(
            "{} does not have the .ini extension, using the default file",
            path.display()
        );
        return fallback_dir.join(DEFAULT_INI);
    }
    last_ini
        .map(Path::to_path_buf)
        .unwrap_or_else(|| fallback_dir.join(DEFAULT_INI))
}

// ───────────────────────────────────────── drawing ───────────

fn draw(frame: &mut Frame, state: &AppState) {
    let layout = AppLayout::from_area(frame.area());

    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, t)| Line::from(format!(" {} {} ", i + 1, t.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(state.tab.index())
        .block(
            Block::default()
                .title(" USBSID-Pico ")
                .title_style(Theme::title_style())
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Theme::border_style()),
        )
        .highlight_style(Theme::tab_highlight_style());
    frame.render_widget(tabs, layout.tabs_area);
    frame.render_widget(
        BusyIndicator {
            running: state.running_jobs,
            tick: state.tick,
        },
        layout.tabs_area,
    );

    draw_body(frame, state, layout.body_area);
    draw_status(frame, state, layout.status_area);

    match &state.overlay {
        Overlay::None => {}
        Overlay::Message {
            title,
            body,
            is_error,
        } => frame.render_widget(
            MessagePopup {
                title,
                body,
                is_error: *is_error,
            },
            frame.area(),
        ),
        Overlay::Prompt { purpose, input } => frame.render_widget(
            PromptPopup {
                title: purpose.title(),
                input,
            },
            frame.area(),
        ),
    }
}

fn panel_block(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {title} "))
        .title_style(Theme::title_style())
        .borders(Borders::ALL)
        .border_style(Theme::border_style())
}

fn draw_body(frame: &mut Frame, state: &AppState, area: Rect) {
    let tab = state.tab;
    let form = FormWidget::new(state, form::items(tab))
        .selected(state.selected[tab.index()])
        .block(panel_block(tab.title()));

    match tab {
        Tab::Console => frame.render_widget(
            LogView::new(&state.console).block(panel_block("Console")),
            area,
        ),
        Tab::Actions => {
            let (form_area, results_area) = split_actions(area);
            frame.render_widget(form, form_area);
            frame.render_widget(
                LogView::new(&state.device_results).block(panel_block("Device Results")),
                results_area,
            );
        }
        Tab::General | Tab::Sockets | Tab::Led => frame.render_widget(form, area),
    }
}

fn draw_status(frame: &mut Frame, state: &AppState, area: Rect) {
    let mut spans = vec![Span::styled(
        format!(" {}", state.ini_path.display()),
        Theme::status_bar_style(),
    )];
    if state.is_dirty() {
        spans.push(Span::styled(" [modified]", Theme::dirty_style()));
    }
    let hint = state.status_message.as_deref().unwrap_or(KEY_HINTS);
    spans.push(Span::styled(format!("  │  {hint}"), Theme::status_bar_style()));
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Theme::status_bar_style()),
        area,
    );
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing (silent unless RUST_LOG is set).
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr) // never pollute stdout
        .init();

    let cli = Cli::parse();

    // ── preferences and tool discovery ────────────────────────
    let config_path = config::config_path();
    let prefs = config::AppConfig::load_from(&config_path);

    let exe = tool::locate_tool(cli.tool.as_deref(), prefs.tool_path.as_deref())
        .context("cannot start without the cfg_usbsid command-line tool")?;
    let timeout = Duration::from_secs(cli.timeout.unwrap_or(prefs.timeout_secs));
    let runner = ToolRunner::new(exe, timeout);
    tracing::info!("using {} (timeout {:?})", runner.exe().display(), runner.timeout());

    let fallback_dir = tool::exe_dir().unwrap_or_else(|| PathBuf::from("."));
    let ini_path = resolve_ini_path(cli.ini.as_deref(), prefs.last_ini.as_deref(), &fallback_dir);

    let mut state = AppState::new(ini_path.clone(), prefs, config_path);
    state.load_ini(&ini_path);

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    let mut stderr_handle = stderr();
    execute!(stderr_handle, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stderr());
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut state, &runner, Duration::from_millis(cli.tick_ms)).await;

    // ── teardown (also after an error in the loop) ────────────
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stderr>>,
    state: &mut AppState,
    runner: &ToolRunner,
    tick_rate: Duration,
) -> Result<()> {
    let mut events = spawn_event_reader(tick_rate);
    let (job_tx, mut job_rx) = mpsc::unbounded_channel::<JobUpdate>();

    loop {
        terminal.draw(|frame| draw(frame, state))?;

        // Spawn whatever the last key press queued.
        jobs::drain_queue(state, runner, &job_tx);

        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(AppEvent::Key(k)) => handler::handle_key(state, k),
                    Some(AppEvent::Resize(w, h)) => {
                        tracing::debug!("terminal resized to {w}x{h}");
                    }
                    Some(AppEvent::Tick) => state.tick = state.tick.wrapping_add(1),
                    // Event reader gave up on the terminal.
                    None => break,
                }
            }

            Some(update) = job_rx.recv() => {
                jobs::apply_job_update(state, update);
                while let Ok(update) = job_rx.try_recv() {
                    jobs::apply_job_update(state, update);
                }
            }
        }

        if state.should_quit {
            break;
        }
    }

    Ok(())
}
