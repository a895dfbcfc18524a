use std::path::{Path, PathBuf};

/// Configuration paths for every backend
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// `$XDG_CONFIG_HOME`, where all writes go
    pub user_config_dir: PathBuf,
    /// `$XDG_CONFIG_DIRS`, searched in order for system defaults
    pub system_config_dirs: Vec<PathBuf>,
    /// Wayfire's packaged defaults
    pub wayfire_defaults: PathBuf,
    /// rasputin's own settings.json
    pub app_settings: PathBuf,
}

impl ConfigPaths {
    pub fn new() -> Self {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));

        let system_config_dirs = std::env::var("XDG_CONFIG_DIRS")
            .ok()
            .map(|dirs| {
                dirs.split(':')
                    .filter(|d| !d.is_empty())
                    .map(PathBuf::from)
                    .collect::<Vec<_>>()
            })
            .filter(|dirs| !dirs.is_empty())
            .unwrap_or_else(|| vec![PathBuf::from("/etc/xdg")]);

        Self::with_roots(config_dir, system_config_dirs, PathBuf::from("/etc/wayfire/defaults.ini"))
    }

    /// Build paths over explicit roots (tests, alternative prefixes)
    pub fn with_roots(
        user_config_dir: PathBuf,
        system_config_dirs: Vec<PathBuf>,
        wayfire_defaults: PathBuf,
    ) -> Self {
        let app_settings = user_config_dir.join("rasputin/settings.json");
        Self {
            user_config_dir,
            system_config_dirs,
            wayfire_defaults,
            app_settings,
        }
    }

    /// First system config file that exists for `rel_path`
    pub fn system_file(&self, rel_path: impl AsRef<Path>) -> Option<PathBuf> {
        self.system_config_dirs
            .iter()
            .map(|dir| dir.join(rel_path.as_ref()))
            .find(|path| path.is_file())
    }

    pub fn labwc_rc(&self) -> PathBuf {
        self.user_config_dir.join(LABWC_RC)
    }

    pub fn labwc_rc_system(&self) -> Option<PathBuf> {
        self.system_file(LABWC_RC)
    }

    pub fn lxsession_conf(&self, session: &str) -> PathBuf {
        self.user_config_dir.join(lxsession_rel_path(session))
    }

    pub fn lxsession_conf_system(&self, session: &str) -> Option<PathBuf> {
        self.system_file(lxsession_rel_path(session))
    }

    pub fn wayfire_ini(&self) -> PathBuf {
        self.user_config_dir.join("wayfire.ini")
    }

    pub fn autostart_dir(&self) -> PathBuf {
        self.user_config_dir.join("autostart")
    }

    /// Autostart entry re-applying X11 input settings at login
    pub fn autostart_entry(&self) -> PathBuf {
        self.autostart_dir().join("LXinput-setup.desktop")
    }
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::new()
    }
}

const LABWC_RC: &str = "labwc/rc.xml";

fn lxsession_rel_path(session: &str) -> PathBuf {
    Path::new("lxsession").join(session).join("desktop.conf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_file_picks_first_existing() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(second.path().join("labwc")).unwrap();
        std::fs::write(second.path().join("labwc/rc.xml"), "<openbox_config/>").unwrap();

        let paths = ConfigPaths::with_roots(
            PathBuf::from("/nonexistent"),
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
            PathBuf::from("/nonexistent/defaults.ini"),
        );

        assert_eq!(paths.labwc_rc_system(), Some(second.path().join("labwc/rc.xml")));
        assert_eq!(paths.lxsession_conf_system("LXDE-pi"), None);
    }

    #[test]
    fn user_paths_are_under_config_dir() {
        let paths = ConfigPaths::with_roots(
            PathBuf::from("/home/pi/.config"),
            Vec::new(),
            PathBuf::from("/etc/wayfire/defaults.ini"),
        );

        assert_eq!(paths.labwc_rc(), PathBuf::from("/home/pi/.config/labwc/rc.xml"));
        assert_eq!(
            paths.lxsession_conf("LXDE-pi"),
            PathBuf::from("/home/pi/.config/lxsession/LXDE-pi/desktop.conf")
        );
        assert_eq!(
            paths.autostart_entry(),
            PathBuf::from("/home/pi/.config/autostart/LXinput-setup.desktop")
        );
        assert_eq!(
            paths.app_settings,
            PathBuf::from("/home/pi/.config/rasputin/settings.json")
        );
    }
}
