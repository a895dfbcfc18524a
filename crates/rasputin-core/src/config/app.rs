use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::backend::WindowManager;

/// rasputin's own settings (settings.json)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Force a backend instead of detecting it from the environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<WindowManager>,

    /// How long a control must stay still before its value is applied
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Command that makes labwc re-read rc.xml
    #[serde(default = "default_reload_command")]
    pub reload_command: String,

    /// LXSession profile used when DESKTOP_SESSION is unset
    #[serde(default = "default_session")]
    pub default_session: String,

    /// Write the X11 autostart entry on save
    #[serde(default = "default_true")]
    pub write_autostart: bool,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_reload_command() -> String {
    "labwc -r".to_string()
}

fn default_session() -> String {
    "LXDE-pi".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: None,
            debounce_ms: default_debounce_ms(),
            reload_command: default_reload_command(),
            default_session: default_session(),
            write_autostart: true,
        }
    }
}

impl AppConfig {
    /// Load from `path`; a missing or malformed file yields the defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read(path) {
            Ok(data) => match serde_json::from_slice(&data) {
                Ok(config) => config,
                Err(e) => {
                    debug!("Ignoring malformed {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// LXSession profile name for this login
    pub fn session_name(&self) -> String {
        std::env::var("DESKTOP_SESSION")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.default_session.clone())
    }
}
