//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).
//! Tool invocations are only *queued* here; the main loop drains
//! [`AppState::job_queue`] and spawns them.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::core::{
    ini::IniDocument,
    presets::Preset,
    settings::DeviceSettings,
    tool::{DeviceAction, ToolCommand},
};

use super::jobs::{FollowUp, Job};

/// Lines kept per log panel before the oldest are dropped.
const LOG_CAPACITY: usize = 5000;

// ───────────────────────────────────────── tabs ──────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    General,
    Sockets,
    Led,
    Actions,
    Console,
}

impl Tab {
    pub const ALL: &[Tab] = &[Tab::General, Tab::Sockets, Tab::Led, Tab::Actions, Tab::Console];

    pub fn title(self) -> &'static str {
        match self {
            Tab::General => "General",
            Tab::Sockets => "SID Sockets",
            Tab::Led => "LED",
            Tab::Actions => "Actions",
            Tab::Console => "Console",
        }
    }

    pub fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    pub fn prev(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

// ───────────────────────────────────────── logs ──────────────

/// Which on-screen panel a message goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Console,
    DeviceResults,
}

/// A scrollable, timestamped text panel.
#[derive(Debug, Default)]
pub struct LogPanel {
    lines: VecDeque<String>,
    /// Lines scrolled up from the bottom (0 = follow the tail).
    pub scroll: usize,
}

impl LogPanel {
    /// Append `message`; multi-line messages keep their line breaks, only
    /// the first line gets the timestamp.
    pub fn push(&mut self, message: &str) {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        let mut first = true;
        for line in message.trim_end().lines() {
            if first {
                self.lines.push_back(format!("{stamp}  {line}"));
                first = false;
            } else {
                self.lines.push_back(format!("          {line}"));
            }
        }
        if first {
            self.lines.push_back(stamp.to_string());
        }
        while self.lines.len() > LOG_CAPACITY {
            self.lines.pop_front();
        }
        self.scroll = 0;
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.scroll = 0;
    }

    pub fn lines(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.scroll = (self.scroll + n).min(self.lines.len().saturating_sub(1));
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.scroll = self.scroll.saturating_sub(n);
    }
}

// ───────────────────────────────────────── overlays ──────────

/// What a path prompt is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPurpose {
    LoadIni,
    ExportConfig,
    ImportConfig,
}

impl PromptPurpose {
    pub fn title(self) -> &'static str {
        match self {
            PromptPurpose::LoadIni => "Load settings from INI",
            PromptPurpose::ExportConfig => "Export device configuration to",
            PromptPurpose::ImportConfig => "Import configuration from",
        }
    }
}

/// Modal overlay on top of the tabs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Overlay {
    #[default]
    None,
    Message {
        title: String,
        body: String,
        is_error: bool,
    },
    Prompt {
        purpose: PromptPurpose,
        input: String,
    },
}

// ───────────────────────────────────────── state ─────────────

/// Top-level application state.
pub struct AppState {
    /// Form values.
    pub settings: DeviceSettings,
    /// Form values as of the last load or save, for the dirty marker.
    pub saved_settings: DeviceSettings,
    /// The configuration document backing the current INI file.
    pub doc: IniDocument,
    /// INI file that save/load and device sync operate on.
    pub ini_path: PathBuf,
    /// Preferences and where they are persisted.
    pub config: AppConfig,
    pub config_path: PathBuf,
    pub tab: Tab,
    /// Highlighted form row per tab, indexed by [`Tab::index`].
    pub selected: [usize; 5],
    pub console: LogPanel,
    pub device_results: LogPanel,
    pub overlay: Overlay,
    /// Tool invocations waiting to be spawned by the main loop.
    pub job_queue: Vec<Job>,
    /// Jobs spawned but not finished yet.
    pub running_jobs: usize,
    next_job_id: u64,
    /// Monotonic tick counter (drives the busy spinner).
    pub tick: u64,
    /// Controls the main event loop.
    pub should_quit: bool,
    /// An optional status message shown in the bottom bar.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(ini_path: PathBuf, config: AppConfig, config_path: PathBuf) -> Self {
        Self {
            settings: DeviceSettings::default(),
            saved_settings: DeviceSettings::default(),
            doc: IniDocument::new(),
            ini_path,
            config,
            config_path,
            tab: Tab::default(),
            selected: [0; 5],
            console: LogPanel::default(),
            device_results: LogPanel::default(),
            overlay: Overlay::None,
            job_queue: Vec::new(),
            running_jobs: 0,
            next_job_id: 1,
            tick: 0,
            should_quit: false,
            status_message: None,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.settings != self.saved_settings
    }

    pub fn log(&mut self, target: LogTarget, message: &str) {
        match target {
            LogTarget::Console => self.console.push(message),
            LogTarget::DeviceResults => self.device_results.push(message),
        }
    }

    pub fn show_message(&mut self, title: &str, body: impl Into<String>, is_error: bool) {
        self.overlay = Overlay::Message {
            title: title.to_string(),
            body: body.into(),
            is_error,
        };
    }

    fn persist_config(&self) {
        if let Err(e) = self.config.save_to(&self.config_path) {
            tracing::warn!("could not save preferences: {e:#}");
        }
    }

    pub fn set_preset_writes_device(&mut self, value: bool) {
        self.config.preset_writes_device = value;
        self.persist_config();
        self.status_message = Some(format!(
            "Presets {} the device",
            if value { "are sent to" } else { "only change the form, not" }
        ));
    }

    // ── INI file ────────────────────────────────────────────────

    /// Make `path` the current INI file and pull its values into the form.
    /// A missing file is logged, not an error: the first save creates it.
    pub fn load_ini(&mut self, path: &Path) {
        self.ini_path = path.to_path_buf();

        if !path.exists() {
            self.log(
                LogTarget::Console,
                &format!("Configuration file does not exist: {}", path.display()),
            );
            return;
        }

        match IniDocument::load(path) {
            Ok(doc) => {
                let warnings = self.settings.load_from(&doc);
                for w in &warnings {
                    self.log(LogTarget::Console, &format!("Warning: {w}"));
                }
                self.doc = doc;
                self.saved_settings = self.settings.clone();
                self.log(
                    LogTarget::Console,
                    &format!("Loaded configuration from: {}", path.display()),
                );
                self.status_message = Some(format!("Loaded {}", path.display()));
                self.config.last_ini = Some(path.to_path_buf());
                self.persist_config();
            }
            Err(e) => {
                self.log(LogTarget::Console, &format!("Error loading configuration: {e}"));
                self.show_message("Error", format!("Failed to load configuration: {e}"), true);
            }
        }
    }

    /// Copy the form into the document and write it to the current INI file.
    fn write_ini(&mut self) -> Result<(), crate::core::ini::IniError> {
        self.settings.apply_to(&mut self.doc);
        self.doc.save(&self.ini_path)?;
        self.saved_settings = self.settings.clone();
        self.config.last_ini = Some(self.ini_path.clone());
        self.persist_config();
        Ok(())
    }

    pub fn save_ini(&mut self) {
        match self.write_ini() {
            Ok(()) => {
                let msg = format!("Saved configuration to: {}", self.ini_path.display());
                self.log(LogTarget::Console, &msg);
                self.show_message("Success", "Configuration has been saved", false);
            }
            Err(e) => {
                self.log(LogTarget::Console, &format!("Error saving: {e}"));
                self.show_message("Error", format!("Failed to save configuration: {e}"), true);
            }
        }
    }

    // ── tool jobs ───────────────────────────────────────────────

    /// Queue `command` for the main loop.  Commands the tool would reject
    /// are reported immediately instead.
    pub fn queue_job(&mut self, command: ToolCommand, target: LogTarget, then: FollowUp) {
        if let Err(e) = command.validate() {
            self.log(target, &format!("Error: {e}"));
            return;
        }
        self.log(target, &format!("Executing: {command}"));
        let id = self.next_job_id;
        self.next_job_id += 1;
        self.job_queue.push(Job {
            id,
            command,
            target,
            then,
        });
    }

    pub fn run_device_action(&mut self, action: DeviceAction) {
        self.queue_job(ToolCommand::Device(action), LogTarget::DeviceResults, FollowUp::None);
    }

    /// Set the preset's fields in the form and, if enabled, on the device.
    pub fn apply_preset(&mut self, preset: Preset) {
        preset.apply(&mut self.settings);
        self.log(LogTarget::Console, &format!("Preset applied: {}", preset.label()));
        if self.config.preset_writes_device {
            self.queue_job(ToolCommand::Preset(preset), LogTarget::Console, FollowUp::None);
        }
    }

    pub fn generate_default_ini(&mut self) {
        self.queue_job(ToolCommand::DefaultIni, LogTarget::Console, FollowUp::None);
    }

    /// Save the form to the current INI file, then import that file on the
    /// device.
    pub fn write_to_device(&mut self) {
        if let Err(e) = self.write_ini() {
            self.log(LogTarget::DeviceResults, &format!("Error saving: {e}"));
            self.show_message("Error", format!("Failed to save configuration: {e}"), true);
            return;
        }
        self.log(
            LogTarget::Console,
            &format!("Saved configuration to: {}", self.ini_path.display()),
        );
        let path = self.ini_path.clone();
        self.queue_job(ToolCommand::ImportConfig(path), LogTarget::DeviceResults, FollowUp::None);
    }

    /// Export the device config into the current INI file and reload the
    /// form from it once the tool is done.
    pub fn read_from_device(&mut self) {
        let path = self.ini_path.clone();
        self.queue_job(
            ToolCommand::ExportConfig(path.clone()),
            LogTarget::DeviceResults,
            FollowUp::ReloadIni(path),
        );
    }

    // ── prompts ─────────────────────────────────────────────────

    pub fn open_prompt(&mut self, purpose: PromptPurpose) {
        self.overlay = Overlay::Prompt {
            purpose,
            input: self.ini_path.display().to_string(),
        };
    }

    /// Act on the text typed into the open prompt.
    pub fn confirm_prompt(&mut self) {
        let Overlay::Prompt { purpose, input } = std::mem::take(&mut self.overlay) else {
            return;
        };
        let input = input.trim();
        if input.is_empty() {
            return;
        }
        let path = PathBuf::from(input);
        match purpose {
            PromptPurpose::LoadIni => self.load_ini(&path),
            PromptPurpose::ExportConfig => {
                self.queue_job(ToolCommand::ExportConfig(path), LogTarget::Console, FollowUp::None)
            }
            PromptPurpose::ImportConfig => {
                self.queue_job(ToolCommand::ImportConfig(path), LogTarget::Console, FollowUp::None)
            }
        }
    }

    pub fn focused_log_mut(&mut self) -> Option<&mut LogPanel> {
        match self.tab {
            Tab::Console => Some(&mut self.console),
            Tab::Actions => Some(&mut self.device_results),
            _ => None,
        }
    }
}
