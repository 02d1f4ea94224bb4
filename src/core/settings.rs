//! Typed mirror of the device settings shown in the forms, and the two-way
//! sync between those fields and an [`IniDocument`].

use std::collections::BTreeMap;
use std::fmt;

use super::ini::{IniDocument, Section};

// ───────────────────────────────────────── section / key names ──

pub const GENERAL: &str = "General";
pub const SOCKET_ONE: &str = "socketOne";
pub const SOCKET_TWO: &str = "socketTwo";
pub const LED: &str = "LED";
pub const RGBLED: &str = "RGBLED";
pub const FMOPL: &str = "FMOPL";
pub const AUDIO_SWITCH: &str = "Audioswitch";

// ───────────────────────────────────────── choices ───────────

/// A radio-group style option set with a fixed INI spelling per variant.
pub trait Choice: Copy + PartialEq + Sized + 'static {
    /// All options in display order.
    const ALL: &'static [Self];

    /// Literal written to the INI file.
    fn as_str(self) -> &'static str;

    /// Text shown in the form.  Defaults to the INI spelling.
    fn label(self) -> &'static str {
        self.as_str()
    }

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == s.trim())
    }

    fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        let len = Self::ALL.len();
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + len - 1) % len]
    }
}

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl Choice for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choice_enum! {
    /// Dual-SID mode of a socket (requires a clone chip).
    DualSid { Disabled => "Disabled", Enabled => "Enabled" }
}

choice_enum! {
    ChipType { Real => "Real", Clone => "Clone" }
}

choice_enum! {
    CloneType {
        Disabled => "Disabled",
        Other => "Other",
        SkPico => "SKPico",
        ArmSid => "ARMSID",
        FpgaSid => "FPGASID",
        RedipSid => "RedipSID",
    }
}

choice_enum! {
    SidType {
        Unknown => "Unknown",
        NotApplicable => "N/A",
        Mos8580 => "MOS8580",
        Mos6581 => "MOS6581",
        FmOpl => "FMopl",
    }
}

choice_enum! {
    AudioSwitch { Mono => "Mono", Stereo => "Stereo" }
}

choice_enum! {
    /// Which SID drives the RGB LED.
    SidIndex { One => "1", Two => "2", Three => "3", Four => "4" }
}

/// SID clock rates supported by the firmware, in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockRate {
    Default,
    Pal,
    Ntsc,
    Drean,
}

impl Choice for ClockRate {
    const ALL: &'static [Self] = &[
        ClockRate::Default,
        ClockRate::Pal,
        ClockRate::Ntsc,
        ClockRate::Drean,
    ];

    fn as_str(self) -> &'static str {
        match self {
            ClockRate::Default => "1000000",
            ClockRate::Pal => "985248",
            ClockRate::Ntsc => "1022727",
            ClockRate::Drean => "1023440",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ClockRate::Default => "1.000 MHz",
            ClockRate::Pal => "0.985 MHz (PAL)",
            ClockRate::Ntsc => "1.023 MHz (NTSC)",
            ClockRate::Drean => "1.023 MHz (Drean)",
        }
    }
}

// ───────────────────────────────────────── settings ──────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketSettings {
    pub enabled: bool,
    pub dualsid: DualSid,
    pub chiptype: ChipType,
    pub clonetype: CloneType,
    pub sid1type: SidType,
    pub sid2type: SidType,
}

impl Default for SocketSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dualsid: DualSid::Disabled,
            chiptype: ChipType::Real,
            clonetype: CloneType::Disabled,
            sid1type: SidType::Mos8580,
            sid2type: SidType::NotApplicable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedSettings {
    pub enabled: bool,
    pub idle_breathe: bool,
}

impl Default for LedSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            idle_breathe: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbLedSettings {
    pub enabled: bool,
    pub idle_breathe: bool,
    pub brightness: u8,
    pub sid_to_use: SidIndex,
}

impl Default for RgbLedSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            idle_breathe: true,
            brightness: 1,
            sid_to_use: SidIndex::One,
        }
    }
}

/// Everything the forms can edit.  `Default` holds the values the forms
/// start with before any file is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSettings {
    pub clock_rate: ClockRate,
    pub lock_clockrate: bool,
    pub socket_one: SocketSettings,
    pub socket_two: SocketSettings,
    /// Socket 2 mirrors socket 1.
    pub act_as_one: bool,
    pub led: LedSettings,
    pub rgbled: RgbLedSettings,
    pub fmopl_enabled: bool,
    pub audio_switch: AudioSwitch,
    pub lock_audio_switch: bool,
    /// Values read from the file that no option matches, keyed by
    /// (section, key).  They are written back verbatim until the field is
    /// edited.
    pub unknown_values: BTreeMap<(&'static str, &'static str), String>,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            clock_rate: ClockRate::Default,
            lock_clockrate: false,
            socket_one: SocketSettings::default(),
            socket_two: SocketSettings::default(),
            act_as_one: true,
            led: LedSettings::default(),
            rgbled: RgbLedSettings::default(),
            fmopl_enabled: false,
            audio_switch: AudioSwitch::Stereo,
            lock_audio_switch: false,
            unknown_values: BTreeMap::new(),
        }
    }
}

/// A value in the document that could not be mapped onto its field.  The
/// field shows its default while the raw value is kept for the next save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncWarning {
    pub section: &'static str,
    pub key: &'static str,
    pub value: String,
}

impl fmt::Display for SyncWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} = {:?} is not a known option, keeping it as is",
            self.section, self.key, self.value
        )
    }
}

/// Python-style spelling used by the tool for booleans.
pub fn bool_str(v: bool) -> &'static str {
    if v {
        "True"
    } else {
        "False"
    }
}

impl DeviceSettings {
    /// Copy every field into `doc` under its fixed key.  Keys the forms do
    /// not own are left alone.
    pub fn apply_to(&self, doc: &mut IniDocument) {
        let general = doc.section_mut(GENERAL);
        general.set("clock_rate", self.clock_rate.as_str());
        general.set("lock_clockrate", bool_str(self.lock_clockrate));

        write_socket(doc.section_mut(SOCKET_ONE), &self.socket_one);
        let two = doc.section_mut(SOCKET_TWO);
        write_socket(two, &self.socket_two);
        two.set("act_as_one", bool_str(self.act_as_one));

        let led = doc.section_mut(LED);
        led.set("enabled", bool_str(self.led.enabled));
        led.set("idle_breathe", bool_str(self.led.idle_breathe));

        let rgb = doc.section_mut(RGBLED);
        rgb.set("enabled", bool_str(self.rgbled.enabled));
        rgb.set("idle_breathe", bool_str(self.rgbled.idle_breathe));
        rgb.set("brightness", self.rgbled.brightness.to_string());
        rgb.set("sid_to_use", self.rgbled.sid_to_use.as_str());

        doc.set(FMOPL, "enabled", bool_str(self.fmopl_enabled));

        let audio = doc.section_mut(AUDIO_SWITCH);
        audio.set("set_to", self.audio_switch.as_str());
        audio.set("lock_audio_switch", bool_str(self.lock_audio_switch));

        for (&(section, key), value) in &self.unknown_values {
            doc.set(section, key, value.as_str());
        }
    }

    /// Raw file value kept for `section.key`, if the file held one that no
    /// option matches.
    pub fn unknown_value(&self, section: &str, key: &str) -> Option<&str> {
        self.unknown_values
            .iter()
            .find(|((s, k), _)| *s == section && *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Drop the raw value kept for `section.key`.  Returns whether there was
    /// one.  Called whenever the form edits that field.
    pub fn forget_unknown_value(&mut self, section: &'static str, key: &'static str) -> bool {
        self.unknown_values.remove(&(section, key)).is_some()
    }

    /// Pull values out of `doc`.  Absent sections leave their fields as they
    /// are; absent keys take the default.  Unknown values are kept in
    /// [`Self::unknown_values`] and reported as warnings.
    pub fn load_from(&mut self, doc: &IniDocument) -> Vec<SyncWarning> {
        let mut r = Reader::default();
        self.unknown_values.retain(|&(section, _), _| !doc.has_section(section));

        if let Some(s) = doc.section(GENERAL) {
            self.clock_rate = r.choice(s, GENERAL, "clock_rate", ClockRate::Default);
            self.lock_clockrate = read_bool(s, "lock_clockrate", false);
        }

        if let Some(s) = doc.section(SOCKET_ONE) {
            self.socket_one = r.socket(s, SOCKET_ONE);
        }

        if let Some(s) = doc.section(SOCKET_TWO) {
            self.socket_two = r.socket(s, SOCKET_TWO);
            self.act_as_one = read_bool(s, "act_as_one", true);
        }

        if let Some(s) = doc.section(LED) {
            self.led.enabled = read_bool(s, "enabled", true);
            self.led.idle_breathe = read_bool(s, "idle_breathe", true);
        }

        if let Some(s) = doc.section(RGBLED) {
            self.rgbled.enabled = read_bool(s, "enabled", true);
            self.rgbled.idle_breathe = read_bool(s, "idle_breathe", true);
            self.rgbled.brightness = r.brightness(s);
            self.rgbled.sid_to_use = r.choice(s, RGBLED, "sid_to_use", SidIndex::One);
        }

        if doc.has_section(FMOPL) {
            self.fmopl_enabled = doc
                .get_or(FMOPL, "enabled", "False")
                .eq_ignore_ascii_case("true");
        }

        if let Some(s) = doc.section(AUDIO_SWITCH) {
            self.audio_switch = r.choice(s, AUDIO_SWITCH, "set_to", AudioSwitch::Stereo);
            self.lock_audio_switch = read_bool(s, "lock_audio_switch", false);
        }

        for w in &r.warnings {
            tracing::warn!("{w}");
            self.unknown_values.insert((w.section, w.key), w.value.clone());
        }
        r.warnings
    }
}

fn write_socket(section: &mut Section, socket: &SocketSettings) {
    section.set("enabled", bool_str(socket.enabled));
    section.set("dualsid", socket.dualsid.as_str());
    section.set("chiptype", socket.chiptype.as_str());
    section.set("clonetype", socket.clonetype.as_str());
    section.set("sid1type", socket.sid1type.as_str());
    section.set("sid2type", socket.sid2type.as_str());
}

fn read_bool(section: &Section, key: &str, default: bool) -> bool {
    section
        .get_or(key, bool_str(default))
        .eq_ignore_ascii_case("true")
}

/// Collects warnings while reading typed values.
#[derive(Default)]
struct Reader {
    warnings: Vec<SyncWarning>,
}

impl Reader {
    fn choice<C: Choice>(
        &mut self,
        section: &Section,
        name: &'static str,
        key: &'static str,
        default: C,
    ) -> C {
        let Some(raw) = section.get(key) else {
            return default;
        };
        C::parse(raw).unwrap_or_else(|| {
            self.warn(name, key, raw);
            default
        })
    }

    fn socket(&mut self, s: &Section, name: &'static str) -> SocketSettings {
        let d = SocketSettings::default();
        SocketSettings {
            enabled: read_bool(s, "enabled", d.enabled),
            dualsid: self.choice(s, name, "dualsid", d.dualsid),
            chiptype: self.choice(s, name, "chiptype", d.chiptype),
            clonetype: self.choice(s, name, "clonetype", d.clonetype),
            sid1type: self.choice(s, name, "sid1type", d.sid1type),
            sid2type: self.choice(s, name, "sid2type", d.sid2type),
        }
    }

    fn brightness(&mut self, s: &Section) -> u8 {
        let default = RgbLedSettings::default().brightness;
        let Some(raw) = s.get("brightness") else {
            return default;
        };
        raw.trim().parse::<u8>().unwrap_or_else(|_| {
            self.warn(RGBLED, "brightness", raw);
            default
        })
    }

    fn warn(&mut self, section: &'static str, key: &'static str, value: &str) {
        self.warnings.push(SyncWarning {
            section,
            key,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customised() -> DeviceSettings {
        let mut s = DeviceSettings::default();
        s.clock_rate = ClockRate::Ntsc;
        s.lock_clockrate = true;
        s.socket_one.dualsid = DualSid::Enabled;
        s.socket_one.chiptype = ChipType::Clone;
        s.socket_one.clonetype = CloneType::SkPico;
        s.socket_one.sid2type = SidType::FmOpl;
        s.socket_two.enabled = false;
        s.socket_two.sid1type = SidType::Mos6581;
        s.act_as_one = false;
        s.led.idle_breathe = false;
        s.rgbled.brightness = 200;
        s.rgbled.sid_to_use = SidIndex::Three;
        s.fmopl_enabled = true;
        s.audio_switch = AudioSwitch::Mono;
        s.lock_audio_switch = true;
        s
    }

    #[test]
    fn writes_python_style_strings() {
        let mut doc = IniDocument::new();
        customised().apply_to(&mut doc);

        assert_eq!(doc.get(GENERAL, "clock_rate"), Some("1022727"));
        assert_eq!(doc.get(GENERAL, "lock_clockrate"), Some("True"));
        assert_eq!(doc.get(SOCKET_ONE, "clonetype"), Some("SKPico"));
        assert_eq!(doc.get(SOCKET_ONE, "sid2type"), Some("FMopl"));
        assert_eq!(doc.get(SOCKET_TWO, "enabled"), Some("False"));
        assert_eq!(doc.get(SOCKET_TWO, "sid2type"), Some("N/A"));
        assert_eq!(doc.get(SOCKET_TWO, "act_as_one"), Some("False"));
        assert_eq!(doc.get(RGBLED, "brightness"), Some("200"));
        assert_eq!(doc.get(RGBLED, "sid_to_use"), Some("3"));
        assert_eq!(doc.get(FMOPL, "enabled"), Some("True"));
        assert_eq!(doc.get(AUDIO_SWITCH, "set_to"), Some("Mono"));

        let names: Vec<_> = doc.section_names().collect();
        assert_eq!(
            names,
            [GENERAL, SOCKET_ONE, SOCKET_TWO, LED, RGBLED, FMOPL, AUDIO_SWITCH]
        );
    }

    #[test]
    fn apply_keeps_foreign_keys() {
        let mut doc = IniDocument::parse("[General]\nversion = v0.3.0\nclock_rate = 985248\n").unwrap();
        DeviceSettings::default().apply_to(&mut doc);
        assert_eq!(doc.get(GENERAL, "version"), Some("v0.3.0"));
        assert_eq!(doc.get(GENERAL, "clock_rate"), Some("1000000"));
    }

    #[test]
    fn round_trip_through_document_and_file() {
        let original = customised();
        let mut doc = IniDocument::new();
        original.apply_to(&mut doc);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.ini");
        doc.save(&path).unwrap();

        let reloaded = IniDocument::load(&path).unwrap();
        let mut restored = DeviceSettings::default();
        let warnings = restored.load_from(&reloaded);
        assert!(warnings.is_empty());
        assert_eq!(restored, original);

        let mut again = IniDocument::new();
        restored.apply_to(&mut again);
        assert_eq!(again, doc);
    }

    #[test]
    fn absent_sections_leave_fields_alone_absent_keys_take_defaults() {
        let mut s = customised();
        let doc = IniDocument::parse("[socketTwo]\nchiptype = Clone\n").unwrap();
        let warnings = s.load_from(&doc);
        assert!(warnings.is_empty());

        // untouched sections
        assert_eq!(s.clock_rate, ClockRate::Ntsc);
        assert_eq!(s.socket_one.clonetype, CloneType::SkPico);
        assert_eq!(s.rgbled.brightness, 200);

        // present section, missing keys fall back to defaults
        assert!(s.socket_two.enabled);
        assert_eq!(s.socket_two.chiptype, ChipType::Clone);
        assert_eq!(s.socket_two.sid1type, SidType::Mos8580);
        assert!(s.act_as_one);
    }

    #[test]
    fn booleans_are_case_insensitive() {
        let mut s = DeviceSettings::default();
        let doc = IniDocument::parse(
            "[General]\nlock_clockrate = TRUE\n[LED]\nenabled = false\nidle_breathe = yes\n",
        )
        .unwrap();
        s.load_from(&doc);
        assert!(s.lock_clockrate);
        assert!(!s.led.enabled);
        // anything other than "true" reads as false
        assert!(!s.led.idle_breathe);
    }

    #[test]
    fn unknown_values_warn_and_are_kept_for_saving() {
        let mut s = customised();
        let doc = IniDocument::parse(
            "[General]\nclock_rate = 2000000\n[RGBLED]\nbrightness = 300\nsid_to_use = 2\n",
        )
        .unwrap();
        let warnings = s.load_from(&doc);

        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].key, "clock_rate");
        assert_eq!(warnings[1].section, RGBLED);
        assert_eq!(warnings[1].value, "300");
        assert!(warnings[1].to_string().contains("brightness"));

        assert_eq!(s.clock_rate, ClockRate::Default);
        assert_eq!(s.rgbled.brightness, 1);
        assert_eq!(s.rgbled.sid_to_use, SidIndex::Two);
        assert_eq!(s.unknown_value(GENERAL, "clock_rate"), Some("2000000"));
        assert_eq!(s.unknown_value(RGBLED, "brightness"), Some("300"));
        assert_eq!(s.unknown_value(RGBLED, "sid_to_use"), None);

        let mut out = IniDocument::new();
        s.apply_to(&mut out);
        assert_eq!(out.get(GENERAL, "clock_rate"), Some("2000000"));
        assert_eq!(out.get(RGBLED, "brightness"), Some("300"));
        assert_eq!(out.get(RGBLED, "sid_to_use"), Some("2"));
    }

    #[test]
    fn edited_fields_stop_writing_the_unknown_value() {
        let mut s = DeviceSettings::default();
        let doc = IniDocument::parse("[socketOne]\nclonetype = BackSID\n").unwrap();
        s.load_from(&doc);
        assert!(s.forget_unknown_value(SOCKET_ONE, "clonetype"));
        s.socket_one.clonetype = CloneType::ArmSid;

        let mut out = IniDocument::new();
        s.apply_to(&mut out);
        assert_eq!(out.get(SOCKET_ONE, "clonetype"), Some("ARMSID"));
        assert!(!s.forget_unknown_value(SOCKET_ONE, "clonetype"));
    }

    #[test]
    fn reloading_a_section_replaces_its_unknown_values() {
        let mut s = DeviceSettings::default();
        let doc = IniDocument::parse("[General]\nclock_rate = 1015000\n[LED]\nenabled = True\n");
        s.load_from(&doc.unwrap());
        assert_eq!(s.unknown_value(GENERAL, "clock_rate"), Some("1015000"));

        // a file without [General] keeps it
        s.load_from(&IniDocument::parse("[LED]\nenabled = False\n").unwrap());
        assert_eq!(s.unknown_value(GENERAL, "clock_rate"), Some("1015000"));

        s.load_from(&IniDocument::parse("[General]\nclock_rate = 985248\n").unwrap());
        assert_eq!(s.unknown_value(GENERAL, "clock_rate"), None);
        assert_eq!(s.clock_rate, ClockRate::Pal);
    }

    #[test]
    fn choices_cycle_like_radio_groups() {
        assert_eq!(SidType::FmOpl.next(), SidType::Unknown);
        assert_eq!(SidType::Unknown.prev(), SidType::FmOpl);
        assert_eq!(ClockRate::Pal.next(), ClockRate::Ntsc);
        assert_eq!(ClockRate::parse("1023440"), Some(ClockRate::Drean));
        assert_eq!(CloneType::parse("armsid"), None);
        assert_eq!(SidType::parse("N/A"), Some(SidType::NotApplicable));
    }
}
