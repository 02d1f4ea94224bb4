//! INI configuration document — the flat `section → key → value` store that
//! the forms mirror and the `cfg_usbsid` tool reads and writes.
//!
//! Sections and keys keep their insertion order so a load/save cycle does not
//! reshuffle the file.  Keys are case-insensitive (stored lower-cased);
//! section names are case-sensitive.  Values are free-form strings.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IniError {
    #[error("line {line}: key/value pair outside of any section")]
    MissingSection { line: usize },

    #[error("line {line}: expected `[section]` or `key = value`, found {text:?}")]
    Malformed { line: usize, text: String },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<IniError>,
    },
}

// ───────────────────────────────────────── section ───────────

/// One `[name]` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value for `key`, or `default` when the key is absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let key = key.to_ascii_lowercase();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// ───────────────────────────────────────── document ──────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: Vec<Section>,
}

impl IniDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse INI text.  `;` and `#` start full-line comments; both `=` and
    /// `:` separate keys from values.  Repeated sections merge and repeated
    /// keys overwrite.
    pub fn parse(text: &str) -> Result<Self, IniError> {
        let mut doc = Self::new();
        let mut current: Option<usize> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                let Some(name) = rest.strip_suffix(']') else {
                    return Err(IniError::Malformed {
                        line: line_no,
                        text: raw.to_string(),
                    });
                };
                current = Some(doc.ensure_section(name.trim()));
                continue;
            }

            let Some(split) = line.find(['=', ':']) else {
                return Err(IniError::Malformed {
                    line: line_no,
                    text: raw.to_string(),
                });
            };
            let key = line[..split].trim();
            let value = line[split + 1..].trim();
            if key.is_empty() {
                return Err(IniError::Malformed {
                    line: line_no,
                    text: raw.to_string(),
                });
            }

            let Some(section) = current else {
                return Err(IniError::MissingSection { line: line_no });
            };
            doc.sections[section].set(key, value);
        }

        Ok(doc)
    }

    pub fn serialise(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push('[');
            out.push_str(&section.name);
            out.push_str("]\n");
            for (key, value) in section.entries() {
                out.push_str(key);
                out.push_str(" = ");
                out.push_str(value);
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    // ── persistence ─────────────────────────────────────────────

    pub fn load(path: &Path) -> Result<Self, IniError> {
        let text = std::fs::read_to_string(path).map_err(|source| IniError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let doc = Self::parse(&text).map_err(|e| IniError::Parse {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        tracing::debug!(
            "loaded {} [{}]",
            path.display(),
            doc.section_names().collect::<Vec<_>>().join(", ")
        );
        Ok(doc)
    }

    pub fn save(&self, path: &Path) -> Result<(), IniError> {
        std::fs::write(path, self.serialise()).map_err(|source| IniError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("saved {}", path.display());
        Ok(())
    }

    // ── access ──────────────────────────────────────────────────

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn section_mut(&mut self, name: &str) -> &mut Section {
        let idx = self.ensure_section(name);
        &mut self.sections[idx]
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?.get(key)
    }

    pub fn get_or<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get(section, key).unwrap_or(default)
    }

    /// Write `value` under `section.key`, creating the section if needed.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.section_mut(section).set(key, value);
    }

    fn ensure_section(&mut self, name: &str) -> usize {
        match self.sections.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
[General]
; Version is for reference only
version = v0.3.0
; Possible clockrates: 1000000, 985248, 1022727, 1023440
clock_rate = 985248

[socketOne]
enabled = True
dualsid = Disabled
sid1type = MOS6581

[RGBLED]
brightness: 127
";

    #[test]
    fn parses_sections_keys_and_comments() {
        let doc = IniDocument::parse(SAMPLE).unwrap();
        let names: Vec<_> = doc.section_names().collect();
        assert_eq!(names, ["General", "socketOne", "RGBLED"]);
        assert_eq!(doc.get("General", "clock_rate"), Some("985248"));
        assert_eq!(doc.get("General", "version"), Some("v0.3.0"));
        assert_eq!(doc.get("socketOne", "sid1type"), Some("MOS6581"));
        assert_eq!(doc.get("RGBLED", "brightness"), Some("127"));
        assert_eq!(doc.section("General").unwrap().entries().count(), 2);
    }

    #[test]
    fn keys_are_case_insensitive_sections_are_not() {
        let doc = IniDocument::parse("[LED]\nIdle_Breathe = False\n").unwrap();
        assert_eq!(doc.get("LED", "idle_breathe"), Some("False"));
        assert_eq!(doc.get("LED", "IDLE_BREATHE"), Some("False"));
        assert!(!doc.has_section("led"));
    }

    #[test]
    fn repeated_sections_merge_and_last_write_wins() {
        let doc = IniDocument::parse("[A]\nx = 1\n[B]\ny = 2\n[A]\nx = 3\nz = 4\n").unwrap();
        assert_eq!(doc.section_names().count(), 2);
        assert_eq!(doc.get("A", "x"), Some("3"));
        assert_eq!(doc.get("A", "z"), Some("4"));
    }

    #[test]
    fn key_before_section_is_rejected() {
        let err = IniDocument::parse("clock_rate = 1\n[General]\n").unwrap_err();
        assert!(matches!(err, IniError::MissingSection { line: 1 }));
    }

    #[test]
    fn garbage_line_reports_its_number() {
        let err = IniDocument::parse("[General]\n\nnot a pair\n").unwrap_err();
        match err {
            IniError::Malformed { line, text } => {
                assert_eq!(line, 3);
                assert_eq!(text, "not a pair");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(IniDocument::parse("[General\n").is_err());
        assert!(IniDocument::parse("[General]\n= 5\n").is_err());
    }

    #[test]
    fn any_string_may_be_written() {
        let mut doc = IniDocument::new();
        doc.set("socketTwo", "chiptype", "definitely not a chip");
        doc.set("socketTwo", "chiptype", "Clone");
        assert_eq!(doc.get("socketTwo", "chiptype"), Some("Clone"));
        assert_eq!(doc.get_or("socketTwo", "missing", "fallback"), "fallback");
        assert_eq!(doc.get_or("nope", "missing", "fallback"), "fallback");
    }

    #[test]
    fn file_round_trip_reproduces_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.ini");

        let original = IniDocument::parse(SAMPLE).unwrap();
        original.save(&path).unwrap();
        let reloaded = IniDocument::load(&path).unwrap();
        assert_eq!(original, reloaded);

        reloaded.save(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, original.serialise());
        assert!(text.starts_with("[General]\nversion = v0.3.0\nclock_rate = 985248\n\n"));
    }

    #[test]
    fn load_errors_carry_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.ini");
        let err = IniDocument::load(&missing).unwrap_err();
        assert!(matches!(err, IniError::Io { .. }));
        assert!(err.to_string().contains("missing.ini"));

        let broken = dir.path().join("broken.ini");
        std::fs::write(&broken, "x = 1\n").unwrap();
        let err = IniDocument::load(&broken).unwrap_err();
        assert!(matches!(err, IniError::Parse { .. }));
        assert!(err.to_string().contains("broken.ini"));
    }
}
