use std::path::Path;

use crate::config::InputSettings;
use crate::error::{Error, Result};
use crate::format::{format_float, KeyFile};

const GROUP: &str = "Desktop Entry";

/// Represents a `[Desktop Entry]` file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesktopEntry {
    pub entry_type: String,
    pub name: String,
    pub comment: Option<String>,
    pub exec: String,
    pub no_display: bool,
    pub not_show_in: Vec<String>,
}

impl DesktopEntry {
    /// The login-time entry that replays the X11 input settings for sessions
    /// that do not read lxsession's desktop.conf.
    pub fn autostart(settings: &InputSettings) -> Self {
        Self {
            entry_type: "Application".to_string(),
            name: "LXInput autostart".to_string(),
            comment: Some("Setup keyboard and mouse using settings done in LXInput".to_string()),
            exec: autostart_exec(settings),
            no_display: true,
            not_show_in: vec!["GNOME".to_string(), "KDE".to_string(), "XFCE".to_string()],
        }
    }

    pub fn to_data(&self) -> String {
        let mut out = format!("[{}]\n", GROUP);
        out.push_str(&format!("Type={}\n", self.entry_type));
        out.push_str(&format!("Name={}\n", self.name));
        if let Some(comment) = &self.comment {
            out.push_str(&format!("Comment={}\n", comment));
        }
        if self.no_display {
            out.push_str("NoDisplay=true\n");
        }
        out.push_str(&format!("Exec={}\n", self.exec));
        if !self.not_show_in.is_empty() {
            out.push_str(&format!("NotShowIn={};\n", self.not_show_in.join(";")));
        }
        out
    }

    /// Write to disk, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        std::fs::write(path, self.to_data()).map_err(|e| Error::io(path, e))
    }
}

/// Shell command for the autostart entry: key repeat, button order, then the
/// libinput acceleration of every slave pointer.
fn autostart_exec(settings: &InputSettings) -> String {
    let speed = format_float(settings.pointer_speed);
    let swap_buttons = if settings.left_handed {
        "; xmodmap -e \"pointer = 3 2 1\""
    } else {
        ""
    };

    format!(
        "sh -c 'xset r rate {} {}{}; for id in $(xinput list | grep pointer | grep slave | cut -f 2 | cut -d = -f 2 ) ; do xinput --set-prop $id \"libinput Accel Speed\" {} 2> /dev/null ; done'",
        settings.repeat_delay_ms,
        settings.repeat_rate_hz(),
        swap_buttons,
        speed,
    )
}

/// Read the `[Desktop Entry]` group back; `None` without `Name` and `Exec`.
pub fn parse_desktop_entry(content: &str) -> Option<DesktopEntry> {
    let keyfile = KeyFile::parse(content);
    let get = |key: &str| keyfile.get_string(GROUP, key).map(str::to_string);

    let name = get("Name").filter(|v| !v.is_empty())?;
    let exec = get("Exec").filter(|v| !v.is_empty())?;

    Some(DesktopEntry {
        entry_type: get("Type").unwrap_or_default(),
        name,
        comment: get("Comment"),
        exec,
        no_display: keyfile.get_bool(GROUP, "NoDisplay").unwrap_or(false),
        not_show_in: keyfile
            .get_string(GROUP, "NotShowIn")
            .map(|list| {
                list.split(';')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    })
}

pub fn parse_desktop_file(path: &Path) -> Option<DesktopEntry> {
    let content = std::fs::read_to_string(path).ok()?;
    parse_desktop_entry(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(left_handed: bool) -> InputSettings {
        InputSettings {
            double_click_ms: 250,
            pointer_speed: 0.5,
            left_handed,
            repeat_delay_ms: 600,
            repeat_interval_ms: 40,
        }
    }

    #[test]
    fn autostart_exec_uses_rate_and_fixed_point_speed() {
        let entry = DesktopEntry::autostart(&settings(false));
        assert!(entry.exec.starts_with("sh -c 'xset r rate 600 25; for id in"));
        assert!(entry.exec.contains("\"libinput Accel Speed\" 0.500000 2> /dev/null"));
        assert!(!entry.exec.contains("xmodmap"));
        assert!(!entry.exec.contains("xset m"));
    }

    #[test]
    fn autostart_swaps_buttons_when_left_handed() {
        let entry = DesktopEntry::autostart(&settings(true));
        assert!(entry
            .exec
            .contains("xset r rate 600 25; xmodmap -e \"pointer = 3 2 1\"; for id in"));
    }

    #[test]
    fn rendered_entry_parses_back() {
        let entry = DesktopEntry::autostart(&settings(true));
        let data = entry.to_data();

        assert!(data.starts_with("[Desktop Entry]\nType=Application\n"));
        assert!(data.ends_with("NotShowIn=GNOME;KDE;XFCE;\n"));
        assert_eq!(parse_desktop_entry(&data), Some(entry));
    }

    #[test]
    fn entry_without_exec_is_rejected() {
        assert_eq!(parse_desktop_entry("[Desktop Entry]\nName=Nothing\n"), None);
        assert_eq!(parse_desktop_entry("[Other]\nName=x\nExec=y\n"), None);
    }
}
