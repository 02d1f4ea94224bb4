//! Socket presets — named shortcuts for the common SID layouts.

use super::settings::{DeviceSettings, DualSid, SOCKET_ONE, SOCKET_TWO};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    SingleSid,
    DualSid,
    DualSidSocket1,
    DualSidSocket2,
    TripleSid1,
    TripleSid2,
    QuadSid,
    MirroredSid,
}

/// The five fields a preset controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetLayout {
    pub socket_one_enabled: bool,
    pub socket_one_dualsid: DualSid,
    pub socket_two_enabled: bool,
    pub socket_two_dualsid: DualSid,
    pub act_as_one: bool,
}

const fn layout(s1: bool, d1: bool, s2: bool, d2: bool, mirror: bool) -> PresetLayout {
    PresetLayout {
        socket_one_enabled: s1,
        socket_one_dualsid: if d1 { DualSid::Enabled } else { DualSid::Disabled },
        socket_two_enabled: s2,
        socket_two_dualsid: if d2 { DualSid::Enabled } else { DualSid::Disabled },
        act_as_one: mirror,
    }
}

impl Preset {
    #[cfg(test)]
    pub const ALL: &[Preset] = &[
        Preset::SingleSid,
        Preset::DualSid,
        Preset::DualSidSocket1,
        Preset::DualSidSocket2,
        Preset::TripleSid1,
        Preset::TripleSid2,
        Preset::QuadSid,
        Preset::MirroredSid,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Preset::SingleSid => "Single SID",
            Preset::DualSid => "Dual SID",
            Preset::DualSidSocket1 => "Dual SID Socket 1",
            Preset::DualSidSocket2 => "Dual SID Socket 2",
            Preset::TripleSid1 => "Triple SID 1",
            Preset::TripleSid2 => "Triple SID 2",
            Preset::QuadSid => "Quad SID",
            Preset::MirroredSid => "Mirrored SID",
        }
    }

    /// `cfg_usbsid` flag that applies this preset on the device.
    pub fn flag(self) -> &'static str {
        match self {
            Preset::SingleSid => "--single-sid",
            Preset::DualSid => "--dual-sid",
            Preset::DualSidSocket1 => "--dual-sid-socket1",
            Preset::DualSidSocket2 => "--dual-sid-socket2",
            Preset::TripleSid1 => "--triple-sid1",
            Preset::TripleSid2 => "--triple-sid2",
            Preset::QuadSid => "--quad-sid",
            Preset::MirroredSid => "--mirrored-sid",
        }
    }

    //                                  s1en   s1dual s2en   s2dual mirror
    pub fn layout(self) -> PresetLayout {
        match self {
            Preset::SingleSid => layout(true, false, false, false, false),
            Preset::DualSid => layout(true, false, true, false, false),
            Preset::DualSidSocket1 => layout(true, true, false, false, false),
            Preset::DualSidSocket2 => layout(false, false, true, true, false),
            Preset::TripleSid1 => layout(true, true, true, false, false),
            Preset::TripleSid2 => layout(true, false, true, true, false),
            Preset::QuadSid => layout(true, true, true, true, false),
            Preset::MirroredSid => layout(true, false, true, false, true),
        }
    }

    /// Set the preset's five fields on `settings`; nothing else changes.
    pub fn apply(self, settings: &mut DeviceSettings) {
        let l = self.layout();
        settings.socket_one.enabled = l.socket_one_enabled;
        settings.socket_one.dualsid = l.socket_one_dualsid;
        settings.socket_two.enabled = l.socket_two_enabled;
        settings.socket_two.dualsid = l.socket_two_dualsid;
        settings.act_as_one = l.act_as_one;
        settings.forget_unknown_value(SOCKET_ONE, "dualsid");
        settings.forget_unknown_value(SOCKET_TWO, "dualsid");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::{ChipType, ClockRate};

    #[test]
    fn presets_set_documented_combinations() {
        use DualSid::{Disabled as D, Enabled as E};
        let expected = [
            (Preset::SingleSid, (true, D, false, D, false)),
            (Preset::DualSid, (true, D, true, D, false)),
            (Preset::DualSidSocket1, (true, E, false, D, false)),
            (Preset::DualSidSocket2, (false, D, true, E, false)),
            (Preset::TripleSid1, (true, E, true, D, false)),
            (Preset::TripleSid2, (true, D, true, E, false)),
            (Preset::QuadSid, (true, E, true, E, false)),
            (Preset::MirroredSid, (true, D, true, D, true)),
        ];
        assert_eq!(expected.len(), Preset::ALL.len());

        for (preset, (s1, d1, s2, d2, mirror)) in expected {
            let mut s = DeviceSettings::default();
            s.socket_two.enabled = !s2;
            preset.apply(&mut s);
            assert_eq!(
                (
                    s.socket_one.enabled,
                    s.socket_one.dualsid,
                    s.socket_two.enabled,
                    s.socket_two.dualsid,
                    s.act_as_one
                ),
                (s1, d1, s2, d2, mirror),
                "{}",
                preset.label()
            );
        }
    }

    #[test]
    fn presets_leave_other_fields_alone() {
        let mut s = DeviceSettings::default();
        s.clock_rate = ClockRate::Pal;
        s.socket_one.chiptype = ChipType::Clone;
        s.rgbled.brightness = 42;
        let before = s.clone();

        Preset::QuadSid.apply(&mut s);
        assert_eq!(s.clock_rate, before.clock_rate);
        assert_eq!(s.socket_one.chiptype, ChipType::Clone);
        assert_eq!(s.socket_one.sid1type, before.socket_one.sid1type);
        assert_eq!(s.rgbled, before.rgbled);
        assert_eq!(s.led, before.led);
    }

    #[test]
    fn presets_replace_unknown_dual_sid_values() {
        let mut s = DeviceSettings::default();
        s.unknown_values.insert((SOCKET_TWO, "dualsid"), "Maybe".to_string());
        Preset::DualSidSocket2.apply(&mut s);
        assert_eq!(s.unknown_value(SOCKET_TWO, "dualsid"), None);
        assert_eq!(s.socket_two.dualsid, DualSid::Enabled);
    }

    #[test]
    fn flags_are_unique() {
        let mut flags: Vec<_> = Preset::ALL.iter().map(|p| p.flag()).collect();
        flags.sort_unstable();
        flags.dedup();
        assert_eq!(flags.len(), Preset::ALL.len());
        assert!(flags.iter().all(|f| f.starts_with("--")));
    }
}
