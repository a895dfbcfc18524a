use std::path::Path;
use tracing::debug;

use super::numeric::{format_float, parse_float, parse_int};
use crate::error::{Error, Result};

/// One line inside a group
#[derive(Debug, Clone, PartialEq)]
enum Line {
    Entry { key: String, value: String },
    /// Comments and blank lines, kept verbatim
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Group {
    name: String,
    lines: Vec<Line>,
}

/// An INI-style key file (`[Group]` headers, `key=value` entries).
///
/// Comments, blank lines and entries rasputin does not know about survive a
/// load/modify/save cycle untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyFile {
    /// Lines before the first group header
    preamble: Vec<String>,
    groups: Vec<Group>,
}

impl KeyFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse key file text. Never fails: lines that are neither headers nor
    /// entries are kept as-is.
    pub fn parse(content: &str) -> Self {
        let mut file = Self::new();

        for raw in content.lines() {
            let line = raw.trim();

            if line.starts_with('[') && line.ends_with(']') {
                file.groups.push(Group {
                    name: line[1..line.len() - 1].trim().to_string(),
                    lines: Vec::new(),
                });
                continue;
            }

            let parsed = if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                Line::Other(raw.to_string())
            } else if let Some((key, value)) = line.split_once('=') {
                Line::Entry {
                    key: key.trim().to_string(),
                    value: value.trim().to_string(),
                }
            } else {
                Line::Other(raw.to_string())
            };

            match file.groups.last_mut() {
                Some(group) => group.lines.push(parsed),
                None => file.preamble.push(raw.to_string()),
            }
        }

        file
    }

    /// Load from disk; `None` if the file is missing or unreadable.
    pub fn load(path: &Path) -> Option<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Some(Self::parse(&content)),
            Err(e) => {
                debug!("Could not read {:?}: {}", path, e);
                None
            }
        }
    }

    /// Write to disk, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        std::fs::write(path, self.to_data()).map_err(|e| Error::io(path, e))
    }

    pub fn to_data(&self) -> String {
        let mut out = String::new();

        for line in &self.preamble {
            out.push_str(line);
            out.push('\n');
        }

        for group in &self.groups {
            out.push('[');
            out.push_str(&group.name);
            out.push_str("]\n");
            for line in &group.lines {
                match line {
                    Line::Entry { key, value } => {
                        out.push_str(key);
                        out.push('=');
                        out.push_str(value);
                    }
                    Line::Other(text) => out.push_str(text),
                }
                out.push('\n');
            }
        }

        out
    }

    pub fn get_string(&self, group: &str, key: &str) -> Option<&str> {
        // Later duplicates win, as in GKeyFile
        self.groups
            .iter()
            .filter(|g| g.name == group)
            .flat_map(|g| g.lines.iter())
            .filter_map(|line| match line {
                Line::Entry { key: k, value } if k == key => Some(value.as_str()),
                _ => None,
            })
            .last()
    }

    pub fn get_int(&self, group: &str, key: &str) -> Option<i64> {
        self.get_string(group, key).and_then(parse_int)
    }

    pub fn get_double(&self, group: &str, key: &str) -> Option<f64> {
        self.get_string(group, key).and_then(parse_float)
    }

    /// Booleans accept `true`/`false` and `1`/`0`.
    pub fn get_bool(&self, group: &str, key: &str) -> Option<bool> {
        match self.get_string(group, key)? {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }

    /// Set a value, creating the group and key if needed.
    pub fn set_string(&mut self, group: &str, key: &str, value: &str) {
        let idx = match self.groups.iter().rposition(|g| g.name == group) {
            Some(idx) => idx,
            None => {
                // Separate the new group from what precedes it
                let needs_blank = match self.groups.last() {
                    Some(last) => !matches!(last.lines.last(), Some(Line::Other(t)) if t.trim().is_empty()),
                    None => self.preamble.last().is_some_and(|t| !t.trim().is_empty()),
                };
                if needs_blank {
                    match self.groups.last_mut() {
                        Some(last) => last.lines.push(Line::Other(String::new())),
                        None => self.preamble.push(String::new()),
                    }
                }
                self.groups.push(Group {
                    name: group.to_string(),
                    lines: Vec::new(),
                });
                self.groups.len() - 1
            }
        };

        let lines = &mut self.groups[idx].lines;
        let existing = lines
            .iter()
            .rposition(|line| matches!(line, Line::Entry { key: k, .. } if k == key));

        match existing {
            Some(pos) => {
                if let Line::Entry { value: v, .. } = &mut lines[pos] {
                    *v = value.to_string();
                }
            }
            None => {
                // Insert after the last entry so trailing blank lines stay trailing
                let pos = lines
                    .iter()
                    .rposition(|l| matches!(l, Line::Entry { .. }))
                    .map(|p| p + 1)
                    .unwrap_or(0);
                lines.insert(
                    pos,
                    Line::Entry {
                        key: key.to_string(),
                        value: value.to_string(),
                    },
                );
            }
        }
    }

    pub fn set_int(&mut self, group: &str, key: &str, value: i64) {
        self.set_string(group, key, &value.to_string());
    }

    pub fn set_double(&mut self, group: &str, key: &str, value: f64) {
        self.set_string(group, key, &format_float(value));
    }

    pub fn set_bool(&mut self, group: &str, key: &str, value: bool) {
        self.set_string(group, key, if value { "true" } else { "false" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESKTOP_CONF: &str = "\
# LXSession settings
[GTK]
sNet/ThemeName=PiXflat
iNet/DoubleClickTime=400

[Mouse]
AccFactor=20
LeftHanded=0

[Keyboard]
Delay=500
Interval=30
";

    #[test]
    fn reads_typed_values() {
        let kf = KeyFile::parse(DESKTOP_CONF);
        assert_eq!(kf.get_string("GTK", "sNet/ThemeName"), Some("PiXflat"));
        assert_eq!(kf.get_int("GTK", "iNet/DoubleClickTime"), Some(400));
        assert_eq!(kf.get_bool("Mouse", "LeftHanded"), Some(false));
        assert_eq!(kf.get_int("Keyboard", "Interval"), Some(30));
        assert_eq!(kf.get_int("Keyboard", "Missing"), None);
        assert_eq!(kf.get_int("Missing", "Delay"), None);
    }

    #[test]
    fn unchanged_file_round_trips_verbatim() {
        let kf = KeyFile::parse(DESKTOP_CONF);
        assert_eq!(kf.to_data(), DESKTOP_CONF);
    }

    #[test]
    fn update_keeps_comments_and_other_keys() {
        let mut kf = KeyFile::parse(DESKTOP_CONF);
        kf.set_int("GTK", "iNet/DoubleClickTime", 300);
        kf.set_int("Mouse", "LeftHanded", 1);

        let data = kf.to_data();
        assert!(data.starts_with("# LXSession settings\n"));
        assert!(data.contains("sNet/ThemeName=PiXflat\n"));
        assert!(data.contains("iNet/DoubleClickTime=300\n"));
        assert!(data.contains("AccFactor=20\nLeftHanded=1\n"));
        assert_eq!(kf.get_bool("Mouse", "LeftHanded"), Some(true));
    }

    #[test]
    fn new_keys_go_before_trailing_blank_lines() {
        let mut kf = KeyFile::parse(DESKTOP_CONF);
        kf.set_int("GTK", "iNet/CursorBlinkTime", 1200);

        let data = kf.to_data();
        assert!(data.contains("iNet/DoubleClickTime=400\niNet/CursorBlinkTime=1200\n\n[Mouse]"));
    }

    #[test]
    fn creates_missing_groups() {
        let mut kf = KeyFile::new();
        kf.set_int("input", "kb_repeat_delay", 600);
        kf.set_bool("input", "left_handed_mode", true);
        kf.set_double("other", "speed", 0.5);

        assert_eq!(
            kf.to_data(),
            "[input]\nkb_repeat_delay=600\nleft_handed_mode=true\n\n[other]\nspeed=0.500000\n"
        );
    }

    #[test]
    fn setting_twice_is_idempotent() {
        let mut once = KeyFile::parse(DESKTOP_CONF);
        once.set_bool("Mouse", "LeftHanded", true);

        let mut twice = once.clone();
        twice.set_bool("Mouse", "LeftHanded", true);

        assert_eq!(once.to_data(), twice.to_data());
    }

    #[test]
    fn malformed_lines_are_preserved() {
        let content = "[input]\nthis is not an entry\nkb_repeat_rate=abc\n";
        let kf = KeyFile::parse(content);
        assert_eq!(kf.get_int("input", "kb_repeat_rate"), None);
        assert_eq!(kf.to_data(), content);
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lxsession/LXDE-pi/desktop.conf");

        let mut kf = KeyFile::new();
        kf.set_int("Keyboard", "Delay", 600);
        kf.save(&path).unwrap();

        let loaded = KeyFile::load(&path).unwrap();
        assert_eq!(loaded.get_int("Keyboard", "Delay"), Some(600));
    }
}
