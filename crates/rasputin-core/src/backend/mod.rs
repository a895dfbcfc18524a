mod labwc;
mod openbox;
mod store;
mod wayfire;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{AppConfig, ConfigPaths, InputSettings};
use crate::error::Result;
use crate::services::{
    CommandRunner, DisplayServer, MemorySettings, NullDisplay, RecordingRunner, SettingsService,
    SystemRunner,
};

pub use labwc::LabwcBackend;
pub use openbox::{parse_accel_speed, parse_pointer_ids, OpenboxBackend};
pub use store::SettingsStore;
pub use wayfire::WayfireBackend;

/// One window manager's way of storing and applying input settings.
///
/// Every setter persists (or live-applies) exactly the fields it names.
/// Errors are reported, never fatal: the store logs them and moves on.
pub trait InputBackend: Send {
    fn name(&self) -> &'static str;

    /// Read current values; missing or invalid fields get the backend's defaults
    fn load(&mut self) -> InputSettings;

    fn set_double_click(&mut self, ms: u32) -> Result<()>;

    fn set_speed(&mut self, speed: f64) -> Result<()>;

    fn set_keyboard(&mut self, delay_ms: u32, interval_ms: u32) -> Result<()>;

    fn set_left_handed(&mut self, left_handed: bool) -> Result<()>;

    /// Persist everything at once, for backends whose setters only live-apply
    fn save(&mut self, _settings: &InputSettings) -> Result<()> {
        Ok(())
    }
}

/// Supported window managers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowManager {
    Labwc,
    Openbox,
    Wayfire,
}

impl WindowManager {
    /// Parse from string (CLI and settings.json)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "labwc" => Some(Self::Labwc),
            "openbox" | "lxsession" | "x11" => Some(Self::Openbox),
            "wayfire" => Some(Self::Wayfire),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Labwc => "labwc",
            Self::Openbox => "openbox",
            Self::Wayfire => "wayfire",
        }
    }

    /// Detect from the process environment
    pub fn detect() -> Self {
        Self::detect_with(|var| std::env::var_os(var).is_some_and(|v| !v.is_empty()))
    }

    /// Wayland sessions run Wayfire when it exported its config path and
    /// labwc otherwise; anything else is an X11 Openbox session.
    pub fn detect_with(is_set: impl Fn(&str) -> bool) -> Self {
        if is_set("WAYLAND_DISPLAY") {
            if is_set("WAYFIRE_CONFIG_FILE") {
                Self::Wayfire
            } else {
                Self::Labwc
            }
        } else {
            Self::Openbox
        }
    }
}

/// Everything a backend needs from the outside world
pub struct BackendContext {
    pub paths: ConfigPaths,
    pub config: AppConfig,
    pub runner: Arc<dyn CommandRunner>,
    pub service: Box<dyn SettingsService>,
    pub display: Box<dyn DisplayServer>,
}

impl BackendContext {
    /// Real processes, GSettings and (when built with X11 support) the X server
    pub fn system(paths: ConfigPaths, config: AppConfig) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
        Self {
            service: system_service(runner.clone()),
            display: system_display(),
            runner,
            paths,
            config,
        }
    }

    /// Files are still written, but commands, GSettings and display calls are
    /// only logged
    pub fn dry_run(paths: ConfigPaths, config: AppConfig) -> Self {
        Self {
            runner: Arc::new(RecordingRunner::new()),
            service: Box::new(MemorySettings::new()),
            display: Box::new(NullDisplay::new()),
            paths,
            config,
        }
    }
}

#[cfg(feature = "gio")]
fn system_service(_runner: Arc<dyn CommandRunner>) -> Box<dyn SettingsService> {
    Box::new(crate::services::GioSettings::new())
}

#[cfg(not(feature = "gio"))]
fn system_service(runner: Arc<dyn CommandRunner>) -> Box<dyn SettingsService> {
    Box::new(crate::services::GSettingsCli::new(runner))
}

#[cfg(feature = "x11")]
fn system_display() -> Box<dyn DisplayServer> {
    Box::new(crate::services::X11Display::new())
}

#[cfg(not(feature = "x11"))]
fn system_display() -> Box<dyn DisplayServer> {
    Box::new(NullDisplay::new())
}

/// Build the backend for `wm`
pub fn create_backend(wm: WindowManager, ctx: BackendContext) -> Box<dyn InputBackend> {
    match wm {
        WindowManager::Labwc => Box::new(LabwcBackend::new(ctx)),
        WindowManager::Openbox => Box::new(OpenboxBackend::new(ctx)),
        WindowManager::Wayfire => Box::new(WayfireBackend::new(ctx)),
    }
}
