//! Wrapper around the `cfg_usbsid` command-line tool.
//!
//! Every device interaction goes through the tool: we build its flags, run
//! it once with a timeout, and hand back whatever it printed.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;

use super::presets::Preset;

#[cfg(windows)]
pub const TOOL_EXE: &str = "cfg_usbsid.exe";
#[cfg(not(windows))]
pub const TOOL_EXE: &str = "cfg_usbsid";

/// Default timeout for device actions.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Import/export read and write the whole config, which takes longer.
pub const TRANSFER_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{} not found (looked in: {})", TOOL_EXE, display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    #[error("failed to start {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("command timed out after {:?}", .0)]
    Timeout(Duration),

    #[error("config file must have an .ini extension: {}", .0.display())]
    NotIni(PathBuf),

    #[error("{} exited with code {code}", TOOL_EXE)]
    Failed { code: i32, output: ToolOutput },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ───────────────────────────────────────── commands ──────────

/// Device-side actions that take no arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAction {
    ReadConfig,
    ReadVersion,
    ReadClockSpeed,
    ResetSids,
    ResetSidRegisters,
    Reboot,
    Bootloader,
    AutoDetectAll,
    ApplyConfig,
    SaveConfig,
    SaveAndReboot,
}

impl DeviceAction {
    #[cfg(test)]
    pub const ALL: &[DeviceAction] = &[
        DeviceAction::ReadConfig,
        DeviceAction::ReadVersion,
        DeviceAction::ReadClockSpeed,
        DeviceAction::ResetSids,
        DeviceAction::ResetSidRegisters,
        DeviceAction::Reboot,
        DeviceAction::Bootloader,
        DeviceAction::AutoDetectAll,
        DeviceAction::ApplyConfig,
        DeviceAction::SaveConfig,
        DeviceAction::SaveAndReboot,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            DeviceAction::ReadConfig => "Read Configuration",
            DeviceAction::ReadVersion => "Read Version",
            DeviceAction::ReadClockSpeed => "Read Clock Speed",
            DeviceAction::ResetSids => "Reset SID",
            DeviceAction::ResetSidRegisters => "Reset SID Registers",
            DeviceAction::Reboot => "Reboot USBSID-Pico",
            DeviceAction::Bootloader => "Bootloader for FW update",
            DeviceAction::AutoDetectAll => "Auto-detect All",
            DeviceAction::ApplyConfig => "Apply Configuration",
            DeviceAction::SaveConfig => "Save Configuration",
            DeviceAction::SaveAndReboot => "Save and Reboot",
        }
    }

    pub fn flag(self) -> &'static str {
        match self {
            DeviceAction::ReadConfig => "--read-config",
            DeviceAction::ReadVersion => "--version",
            DeviceAction::ReadClockSpeed => "--read-clock-speed",
            DeviceAction::ResetSids => "--reset-sids",
            DeviceAction::ResetSidRegisters => "--reset-sid-registers",
            DeviceAction::Reboot => "--reboot-usp",
            DeviceAction::Bootloader => "--bootloader",
            DeviceAction::AutoDetectAll => "--auto-detect-all",
            DeviceAction::ApplyConfig => "--apply-config",
            DeviceAction::SaveConfig => "--save-config",
            DeviceAction::SaveAndReboot => "--save-reboot",
        }
    }
}

/// One invocation of the tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCommand {
    Device(DeviceAction),
    Preset(Preset),
    /// Tool writes `USBSID-Pico-cfg.ini` with firmware defaults.
    DefaultIni,
    /// Read the device config into an INI file.
    ExportConfig(PathBuf),
    /// Write an INI file to the device and save it there.
    ImportConfig(PathBuf),
}

impl ToolCommand {
    pub fn args(&self) -> Vec<OsString> {
        match self {
            ToolCommand::Device(action) => vec![action.flag().into()],
            ToolCommand::Preset(preset) => vec![preset.flag().into()],
            ToolCommand::DefaultIni => vec!["--default-ini".into()],
            ToolCommand::ExportConfig(path) => {
                vec!["--export-config".into(), path.as_os_str().to_owned()]
            }
            ToolCommand::ImportConfig(path) => {
                vec!["--import-config".into(), path.as_os_str().to_owned()]
            }
        }
    }

    /// Timeout for this command given the configured base timeout.
    pub fn timeout(&self, base: Duration) -> Duration {
        match self {
            ToolCommand::ExportConfig(_) | ToolCommand::ImportConfig(_) => {
                base.max(TRANSFER_TIMEOUT)
            }
            _ => base,
        }
    }

    /// The tool only accepts `.ini` paths for import/export.
    pub fn validate(&self) -> Result<(), ToolError> {
        match self {
            ToolCommand::ExportConfig(path) | ToolCommand::ImportConfig(path)
                if !has_ini_extension(path) =>
            {
                Err(ToolError::NotIni(path.clone()))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self
            .args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        f.write_str(&args.join(" "))
    }
}

pub fn has_ini_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("ini"))
        .unwrap_or(false)
}

// ───────────────────────────────────────── output ────────────

/// What the tool printed, plus its exit code (`None` if killed by a signal).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: Option<i32>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

// ───────────────────────────────────────── runner ────────────

#[derive(Debug, Clone)]
pub struct ToolRunner {
    exe: PathBuf,
    timeout: Duration,
}

impl ToolRunner {
    pub fn new(exe: PathBuf, timeout: Duration) -> Self {
        Self { exe, timeout }
    }

    pub fn exe(&self) -> &Path {
        &self.exe
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `cmd` once.  A non-zero exit becomes [`ToolError::Failed`] with the
    /// captured output attached; the child is killed when the timeout hits.
    pub async fn run(&self, cmd: &ToolCommand) -> Result<ToolOutput, ToolError> {
        cmd.validate()?;
        let timeout = cmd.timeout(self.timeout);
        tracing::debug!("spawn {} {cmd} (timeout {timeout:?})", self.exe.display());

        let child = Command::new(&self.exe)
            .args(cmd.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::Spawn {
                path: self.exe.clone(),
                source,
            })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| ToolError::Spawn {
                path: self.exe.clone(),
                source,
            })?,
            Err(_) => {
                tracing::warn!("{cmd} timed out after {timeout:?}");
                return Err(ToolError::Timeout(timeout));
            }
        };

        let output = ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        };
        tracing::debug!("{cmd} exited with {:?}", output.code);

        if output.success() {
            Ok(output)
        } else {
            Err(ToolError::Failed {
                code: output.code.unwrap_or(-1),
                output,
            })
        }
    }
}

// ───────────────────────────────────────── discovery ─────────

/// Locate the tool.  An `explicit` path (from `--tool`) must exist.
/// Otherwise the saved `preferred` path is tried first, then the directory
/// of our own binary, then every directory on `PATH`.
pub fn locate_tool(
    explicit: Option<&Path>,
    preferred: Option<&Path>,
) -> Result<PathBuf, ToolError> {
    let path_var = std::env::var_os("PATH");
    locate_tool_in(explicit, preferred, exe_dir().as_deref(), path_var.as_deref())
}

fn locate_tool_in(
    explicit: Option<&Path>,
    preferred: Option<&Path>,
    exe_dir: Option<&Path>,
    path_var: Option<&OsStr>,
) -> Result<PathBuf, ToolError> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(ToolError::NotFound {
            searched: vec![path.to_path_buf()],
        });
    }

    let mut candidates: Vec<PathBuf> = preferred.map(Path::to_path_buf).into_iter().collect();
    if let Some(dir) = exe_dir {
        candidates.push(dir.join(TOOL_EXE));
    }
    if let Some(paths) = path_var {
        candidates.extend(std::env::split_paths(paths).map(|dir| dir.join(TOOL_EXE)));
    }

    let mut searched = Vec::new();
    for candidate in candidates {
        if candidate.is_file() {
            tracing::debug!("found tool at {}", candidate.display());
            return Ok(candidate);
        }
        if preferred == Some(candidate.as_path()) {
            tracing::warn!("saved tool path {} no longer exists", candidate.display());
        }
        searched.push(candidate);
    }
    Err(ToolError::NotFound { searched })
}

/// Directory containing the running executable.
pub fn exe_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_pass_paths_as_separate_args() {
        let cmd = ToolCommand::ExportConfig(PathBuf::from("/tmp/my config.ini"));
        assert_eq!(
            cmd.args(),
            vec![OsString::from("--export-config"), OsString::from("/tmp/my config.ini")]
        );
        assert_eq!(cmd.to_string(), "--export-config /tmp/my config.ini");
        assert_eq!(
            ToolCommand::Device(DeviceAction::Reboot).args(),
            vec![OsString::from("--reboot-usp")]
        );
        assert_eq!(
            ToolCommand::Preset(Preset::QuadSid).to_string(),
            "--quad-sid"
        );
    }

    #[test]
    fn transfers_get_the_longer_timeout() {
        let base = DEFAULT_TIMEOUT;
        let export = ToolCommand::ExportConfig("a.ini".into());
        assert_eq!(export.timeout(base), TRANSFER_TIMEOUT);
        assert_eq!(export.timeout(Duration::from_secs(30)), Duration::from_secs(30));
        assert_eq!(ToolCommand::DefaultIni.timeout(base), base);
    }

    #[test]
    fn import_requires_ini_extension() {
        assert!(ToolCommand::ImportConfig("cfg.INI".into()).validate().is_ok());
        let err = ToolCommand::ImportConfig("cfg.txt".into()).validate().unwrap_err();
        assert!(matches!(err, ToolError::NotIni(_)));
        assert!(ToolCommand::Device(DeviceAction::ReadConfig).validate().is_ok());
    }

    #[test]
    fn explicit_missing_tool_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(TOOL_EXE);
        let bin = dir.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        std::fs::write(bin.join(TOOL_EXE), "").unwrap();
        let path_var = std::env::join_paths([&bin]).unwrap();

        // `--tool` is binding even when the tool is on PATH
        let err = locate_tool_in(Some(&missing), None, None, Some(&path_var)).unwrap_err();
        match err {
            ToolError::NotFound { searched } => assert_eq!(searched, vec![missing]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn stale_saved_path_falls_through_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("old").join(TOOL_EXE);
        let empty = dir.path().join("empty");
        let bin = dir.path().join("bin");
        std::fs::create_dir(&empty).unwrap();
        std::fs::create_dir(&bin).unwrap();
        std::fs::write(bin.join(TOOL_EXE), "").unwrap();
        let path_var = std::env::join_paths([&empty, &bin]).unwrap();

        let found = locate_tool_in(None, Some(&stale), Some(&empty), Some(&path_var)).unwrap();
        assert_eq!(found, bin.join(TOOL_EXE));
    }

    #[test]
    fn search_order_is_saved_path_then_exe_dir_then_path() {
        let dir = tempfile::tempdir().unwrap();
        let saved = dir.path().join("saved");
        let beside = dir.path().join("beside");
        let bin = dir.path().join("bin");
        for d in [&saved, &beside, &bin] {
            std::fs::create_dir(d).unwrap();
            std::fs::write(d.join(TOOL_EXE), "").unwrap();
        }
        let path_var = std::env::join_paths([&bin]).unwrap();
        let saved_tool = saved.join(TOOL_EXE);

        let found = locate_tool_in(None, Some(&saved_tool), Some(&beside), Some(&path_var));
        assert_eq!(found.unwrap(), saved_tool);
        let found = locate_tool_in(None, None, Some(&beside), Some(&path_var));
        assert_eq!(found.unwrap(), beside.join(TOOL_EXE));

        std::fs::remove_file(beside.join(TOOL_EXE)).unwrap();
        std::fs::remove_file(bin.join(TOOL_EXE)).unwrap();
        let gone = dir.path().join("gone");
        let err = locate_tool_in(None, Some(&gone), Some(&beside), Some(&path_var));
        match err.unwrap_err() {
            ToolError::NotFound { searched } => assert_eq!(
                searched,
                vec![gone, beside.join(TOOL_EXE), bin.join(TOOL_EXE)]
            ),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_executable_is_reported_not_panicked() {
        let runner = ToolRunner::new(PathBuf::from("/nonexistent/cfg_usbsid"), DEFAULT_TIMEOUT);
        let err = runner
            .run(&ToolCommand::Device(DeviceAction::ReadVersion))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// Write an executable shell script standing in for the real tool.
        fn fake_tool(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join(TOOL_EXE);
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            let mut perms = std::fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms).unwrap();
            path
        }

        #[tokio::test]
        async fn captures_stdout_stderr_and_args() {
            let dir = tempfile::tempdir().unwrap();
            let exe = fake_tool(dir.path(), "echo \"args: $*\"\necho oops >&2\nexit 0");
            assert_eq!(locate_tool(Some(&exe), None).unwrap(), exe);

            let runner = ToolRunner::new(exe, DEFAULT_TIMEOUT);
            let out = runner
                .run(&ToolCommand::ImportConfig("/tmp/x.ini".into()))
                .await
                .unwrap();
            assert_eq!(out.stdout, "args: --import-config /tmp/x.ini\n");
            assert_eq!(out.stderr, "oops\n");
            assert_eq!(out.code, Some(0));
        }

        #[tokio::test]
        async fn non_zero_exit_is_a_failure_with_output() {
            let dir = tempfile::tempdir().unwrap();
            let exe = fake_tool(dir.path(), "echo 'No USBSID-Pico found' >&2\nexit 3");
            let runner = ToolRunner::new(exe, DEFAULT_TIMEOUT);
            let err = runner
                .run(&ToolCommand::Device(DeviceAction::ReadConfig))
                .await
                .unwrap_err();
            match err {
                ToolError::Failed { code, output } => {
                    assert_eq!(code, 3);
                    assert_eq!(output.stderr, "No USBSID-Pico found\n");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[tokio::test]
        async fn slow_tool_times_out() {
            let dir = tempfile::tempdir().unwrap();
            let exe = fake_tool(dir.path(), "exec sleep 5");
            let runner = ToolRunner::new(exe, Duration::from_millis(200));
            let err = runner
                .run(&ToolCommand::Device(DeviceAction::ReadVersion))
                .await
                .unwrap_err();
            assert!(matches!(err, ToolError::Timeout(d) if d == Duration::from_millis(200)));
            assert_eq!(err.to_string(), "command timed out after 200ms");
        }
    }
}
