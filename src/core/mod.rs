//! Core logic – the INI document, the typed settings mirror, presets, and the
//! `cfg_usbsid` subprocess wrapper.
//!
//! Nothing in this module depends on any TUI or rendering crate.
//! Every type is `Send + Sync` so it can be moved into background tasks.

pub mod ini;
pub mod presets;
pub mod settings;
pub mod tool;
