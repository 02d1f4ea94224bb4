//! Form model (data only) — one table of items per tab.
//!
//! The input handler and the form renderer both read these tables.

use super::state::{AppState, PromptPurpose, Tab};
use crate::core::presets::Preset;
use crate::core::settings::{
    Choice, DeviceSettings, AUDIO_SWITCH, GENERAL, RGBLED, SOCKET_ONE, SOCKET_TWO,
};
use crate::core::tool::DeviceAction;

/// Options of a radio group plus the index of the active one.
pub type RadioOptions = (Vec<String>, usize);

/// A single row in a form.
pub enum FormItem {
    /// Group caption; never selected.
    Heading(&'static str),
    /// Boolean checkbox.
    Toggle {
        label: &'static str,
        get: fn(&AppState) -> bool,
        set: fn(&mut AppState, bool),
    },
    /// Radio group, stepped forward/backward.
    Radio {
        label: &'static str,
        options: fn(&AppState) -> RadioOptions,
        step: fn(&mut AppState, bool),
    },
    /// 0–255 slider.
    Slider {
        label: &'static str,
        get: fn(&AppState) -> u8,
        set: fn(&mut AppState, u8),
    },
    /// Runs an action.
    Button {
        label: &'static str,
        run: fn(&mut AppState),
    },
}

impl FormItem {
    #[cfg(test)]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Heading(label)
            | Self::Toggle { label, .. }
            | Self::Radio { label, .. }
            | Self::Slider { label, .. }
            | Self::Button { label, .. } => label,
        }
    }

    pub fn selectable(&self) -> bool {
        !matches!(self, Self::Heading(_))
    }
}

/// Options for `current`.  A value from the file that matches no option is
/// appended as an extra, active entry.
fn radio<C: Choice>(
    settings: &DeviceSettings,
    section: &str,
    key: &str,
    current: C,
) -> RadioOptions {
    let mut labels: Vec<String> = C::ALL.iter().map(|c| c.label().to_string()).collect();
    if let Some(raw) = settings.unknown_value(section, key) {
        labels.push(raw.to_string());
        let idx = labels.len() - 1;
        return (labels, idx);
    }
    let idx = C::ALL.iter().position(|c| *c == current).unwrap_or(0);
    (labels, idx)
}

/// Next option after `current`.  Leaving an unknown value (shown last) wraps
/// to the first option or back to the last known one.
fn step<C: Choice>(current: C, forward: bool, from_unknown: bool) -> C {
    match (from_unknown, forward) {
        (true, true) => C::ALL[0],
        (true, false) => C::ALL[C::ALL.len() - 1],
        (false, true) => current.next(),
        (false, false) => current.prev(),
    }
}

macro_rules! radio_item {
    ($label:literal, $section:expr, $key:literal, $($field:ident).+) => {
        FormItem::Radio {
            label: $label,
            options: |s| radio(&s.settings, $section, $key, s.settings.$($field).+),
            step: |s, fwd| {
                let from_unknown = s.settings.forget_unknown_value($section, $key);
                s.settings.$($field).+ = step(s.settings.$($field).+, fwd, from_unknown);
            },
        }
    };
}

/// Items shown on `tab`, in display order.
pub fn items(tab: Tab) -> &'static [FormItem] {
    match tab {
        Tab::General => GENERAL_ITEMS,
        Tab::Sockets => SOCKET_ITEMS,
        Tab::Led => LED_ITEMS,
        Tab::Actions => ACTION_ITEMS,
        Tab::Console => &[],
    }
}

/// First selectable row at or after `from`, searching in `forward` direction.
pub fn next_selectable(items: &[FormItem], from: usize, forward: bool) -> Option<usize> {
    if forward {
        (from..items.len()).find(|&i| items[i].selectable())
    } else {
        (0..=from.min(items.len().checked_sub(1)?))
            .rev()
            .find(|&i| items[i].selectable())
    }
}

// ───────────────────────────────────────── general ───────────

pub static GENERAL_ITEMS: &[FormItem] = &[
    FormItem::Heading("SID Clock Rate"),
    radio_item!("Clock rate", GENERAL, "clock_rate", clock_rate),
    FormItem::Toggle {
        label: "Lock clock rate",
        get: |s| s.settings.lock_clockrate,
        set: |s, v| s.settings.lock_clockrate = v,
    },
    FormItem::Heading("Audio Switch"),
    radio_item!("Output", AUDIO_SWITCH, "set_to", audio_switch),
    FormItem::Toggle {
        label: "Lock audio switch",
        get: |s| s.settings.lock_audio_switch,
        set: |s, v| s.settings.lock_audio_switch = v,
    },
    FormItem::Heading("FMOPL"),
    FormItem::Toggle {
        label: "Enable FMOPL",
        get: |s| s.settings.fmopl_enabled,
        set: |s, v| s.settings.fmopl_enabled = v,
    },
];

// ───────────────────────────────────────── sockets ───────────

pub static SOCKET_ITEMS: &[FormItem] = &[
    FormItem::Heading("Socket 1"),
    FormItem::Toggle {
        label: "Enabled",
        get: |s| s.settings.socket_one.enabled,
        set: |s, v| s.settings.socket_one.enabled = v,
    },
    radio_item!("Dual SID", SOCKET_ONE, "dualsid", socket_one.dualsid),
    radio_item!("Chip type", SOCKET_ONE, "chiptype", socket_one.chiptype),
    radio_item!("Clone type", SOCKET_ONE, "clonetype", socket_one.clonetype),
    radio_item!("SID 1 type", SOCKET_ONE, "sid1type", socket_one.sid1type),
    radio_item!("SID 2 type", SOCKET_ONE, "sid2type", socket_one.sid2type),
    FormItem::Heading("Socket 2"),
    FormItem::Toggle {
        label: "Enabled",
        get: |s| s.settings.socket_two.enabled,
        set: |s, v| s.settings.socket_two.enabled = v,
    },
    radio_item!("Dual SID", SOCKET_TWO, "dualsid", socket_two.dualsid),
    radio_item!("Chip type", SOCKET_TWO, "chiptype", socket_two.chiptype),
    radio_item!("Clone type", SOCKET_TWO, "clonetype", socket_two.clonetype),
    radio_item!("SID 1 type", SOCKET_TWO, "sid1type", socket_two.sid1type),
    radio_item!("SID 2 type", SOCKET_TWO, "sid2type", socket_two.sid2type),
    FormItem::Toggle {
        label: "Act as one (mirror socket 1)",
        get: |s| s.settings.act_as_one,
        set: |s, v| s.settings.act_as_one = v,
    },
];

// ───────────────────────────────────────── leds ──────────────

pub static LED_ITEMS: &[FormItem] = &[
    FormItem::Heading("LED"),
    FormItem::Toggle {
        label: "Enabled",
        get: |s| s.settings.led.enabled,
        set: |s, v| s.settings.led.enabled = v,
    },
    FormItem::Toggle {
        label: "Idle breathing",
        get: |s| s.settings.led.idle_breathe,
        set: |s, v| s.settings.led.idle_breathe = v,
    },
    FormItem::Heading("RGB LED"),
    FormItem::Toggle {
        label: "Enabled",
        get: |s| s.settings.rgbled.enabled,
        set: |s, v| s.settings.rgbled.enabled = v,
    },
    FormItem::Toggle {
        label: "Idle breathing",
        get: |s| s.settings.rgbled.idle_breathe,
        set: |s, v| s.settings.rgbled.idle_breathe = v,
    },
    FormItem::Slider {
        label: "Brightness",
        get: |s| s.settings.rgbled.brightness,
        set: |s, v| {
            s.settings.forget_unknown_value(RGBLED, "brightness");
            s.settings.rgbled.brightness = v;
        },
    },
    radio_item!("SID to use", RGBLED, "sid_to_use", rgbled.sid_to_use),
];

// ───────────────────────────────────────── actions ───────────

macro_rules! preset_button {
    ($preset:expr) => {
        FormItem::Button {
            label: $preset.label(),
            run: |s| s.apply_preset($preset),
        }
    };
}

macro_rules! device_button {
    ($action:expr) => {
        FormItem::Button {
            label: $action.label(),
            run: |s| s.run_device_action($action),
        }
    };
}

pub static ACTION_ITEMS: &[FormItem] = &[
    FormItem::Heading("Presets"),
    preset_button!(Preset::SingleSid),
    preset_button!(Preset::DualSid),
    preset_button!(Preset::DualSidSocket1),
    preset_button!(Preset::DualSidSocket2),
    preset_button!(Preset::TripleSid1),
    preset_button!(Preset::TripleSid2),
    preset_button!(Preset::QuadSid),
    preset_button!(Preset::MirroredSid),
    FormItem::Toggle {
        label: "Send presets to device",
        get: |s| s.config.preset_writes_device,
        set: |s, v| s.set_preset_writes_device(v),
    },
    FormItem::Heading("Device Sync"),
    FormItem::Button {
        label: "Write settings to device",
        run: |s| s.write_to_device(),
    },
    FormItem::Button {
        label: "Read settings from device",
        run: |s| s.read_from_device(),
    },
    FormItem::Heading("Device Actions"),
    device_button!(DeviceAction::ReadConfig),
    device_button!(DeviceAction::ReadVersion),
    device_button!(DeviceAction::ReadClockSpeed),
    device_button!(DeviceAction::ResetSids),
    device_button!(DeviceAction::ResetSidRegisters),
    device_button!(DeviceAction::Reboot),
    device_button!(DeviceAction::Bootloader),
    device_button!(DeviceAction::AutoDetectAll),
    device_button!(DeviceAction::ApplyConfig),
    device_button!(DeviceAction::SaveConfig),
    device_button!(DeviceAction::SaveAndReboot),
    FormItem::Heading("File Actions"),
    FormItem::Button {
        label: "Generate Default INI",
        run: |s| s.generate_default_ini(),
    },
    FormItem::Button {
        label: "Export Configuration…",
        run: |s| s.open_prompt(PromptPurpose::ExportConfig),
    },
    FormItem::Button {
        label: "Import Configuration…",
        run: |s| s.open_prompt(PromptPurpose::ImportConfig),
    },
    FormItem::Button {
        label: "Save Settings to INI",
        run: |s| s.save_ini(),
    },
    FormItem::Button {
        label: "Load Settings from INI…",
        run: |s| s.open_prompt(PromptPurpose::LoadIni),
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::core::settings::{ClockRate, CloneType, SidType};

    #[test]
    fn every_form_tab_starts_on_a_selectable_row() {
        for &tab in Tab::ALL {
            let list = items(tab);
            if list.is_empty() {
                continue;
            }
            assert!(next_selectable(list, 0, true).is_some(), "{}", tab.title());
        }
    }

    #[test]
    fn navigation_skips_headings() {
        let list = GENERAL_ITEMS;
        assert_eq!(next_selectable(list, 0, true), Some(1));
        assert_eq!(next_selectable(list, 3, true), Some(4));
        assert_eq!(next_selectable(list, 3, false), Some(2));
        assert_eq!(next_selectable(list, 0, false), None);
        assert_eq!(next_selectable(&[], 0, false), None);
    }

    #[test]
    fn action_tab_has_every_preset_and_device_action() {
        let labels: Vec<_> = ACTION_ITEMS.iter().map(FormItem::label).collect();
        for p in Preset::ALL {
            assert!(labels.contains(&p.label()), "{}", p.label());
        }
        for a in DeviceAction::ALL {
            assert!(labels.contains(&a.label()), "{}", a.label());
        }
    }

    #[test]
    fn radio_reports_active_option() {
        let settings = DeviceSettings::default();
        let (labels, idx) = radio(&settings, SOCKET_ONE, "sid1type", SidType::Mos6581);
        assert_eq!(labels, ["Unknown", "N/A", "MOS8580", "MOS6581", "FMopl"]);
        assert_eq!(idx, 3);
    }

    #[test]
    fn unknown_file_value_is_an_extra_active_option() {
        let mut settings = DeviceSettings::default();
        settings
            .unknown_values
            .insert((SOCKET_ONE, "clonetype"), "BackSID".to_string());
        let (labels, idx) = radio(&settings, SOCKET_ONE, "clonetype", CloneType::Disabled);
        assert_eq!(labels.len(), CloneType::ALL.len() + 1);
        assert_eq!(labels[idx], "BackSID");
    }

    #[test]
    fn stepping_off_an_unknown_value_wraps_and_forgets_it() {
        let mut s = AppState::new("x.ini".into(), AppConfig::default(), "cfg.toml".into());
        s.settings
            .unknown_values
            .insert((GENERAL, "clock_rate"), "1015000".to_string());
        let FormItem::Radio { step, options, .. } = &GENERAL_ITEMS[1] else {
            panic!("clock rate row is not a radio");
        };

        step(&mut s, true);
        assert_eq!(s.settings.clock_rate, ClockRate::Default);
        assert_eq!(s.settings.unknown_value(GENERAL, "clock_rate"), None);
        let (labels, idx) = options(&s);
        assert_eq!(labels.len(), ClockRate::ALL.len());
        assert_eq!(idx, 0);

        s.settings
            .unknown_values
            .insert((GENERAL, "clock_rate"), "1015000".to_string());
        step(&mut s, false);
        assert_eq!(s.settings.clock_rate, ClockRate::Drean);
    }
}
