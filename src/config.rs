//! User preferences and their persistence.
//!
//! Stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/usbsid-config/config.toml`
//! (default `~/.config/usbsid-config/config.toml`).

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::core::tool::DEFAULT_TIMEOUT;

/// Application preferences.  These are about this program, not the device;
/// device settings live in the INI file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Explicit location of `cfg_usbsid`.  `None` means search for it.
    pub tool_path: Option<PathBuf>,
    /// Timeout for device actions, in seconds.
    pub timeout_secs: u64,
    /// Run the preset's tool flag right after applying it to the form.
    pub preset_writes_device: bool,
    /// INI file opened most recently, used when no file is given on the
    /// command line.
    pub last_ini: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tool_path: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            preset_writes_device: true,
            last_ini: None,
        }
    }
}

impl AppConfig {
    // ── persistence ─────────────────────────────────────────────

    /// Load preferences from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse_config(&contents),
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(path, self.serialise())
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    fn parse_config(s: &str) -> Self {
        let mut cfg = Self::default();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim().trim_matches('"');

            match key {
                "tool_path" if !value.is_empty() => cfg.tool_path = Some(PathBuf::from(value)),
                "last_ini" if !value.is_empty() => cfg.last_ini = Some(PathBuf::from(value)),
                "timeout_secs" => {
                    if let Ok(v) = value.parse::<u64>() {
                        cfg.timeout_secs = v.clamp(1, 120);
                    }
                }
                "preset_writes_device" => cfg.preset_writes_device = value == "true",
                _ => {}
            }
        }

        cfg
    }

    fn serialise(&self) -> String {
        let path_str = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        };
        let lines = [
            "# usbsid-config preferences".to_string(),
            String::new(),
            "# Location of cfg_usbsid (empty: next to this binary, then PATH)".to_string(),
            format!("tool_path = \"{}\"", path_str(&self.tool_path)),
            format!("timeout_secs = {}", self.timeout_secs),
            String::new(),
            "# Send presets to the device as soon as they are picked".to_string(),
            format!("preset_writes_device = {}", self.preset_writes_device),
            String::new(),
            format!("last_ini = \"{}\"", path_str(&self.last_ini)),
            String::new(),
        ];
        lines.join("\n")
    }
}

/// Return the config file path (`$XDG_CONFIG_HOME/usbsid-config/config.toml`).
pub fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join(env!("CARGO_PKG_NAME")).join("config.toml")
}
