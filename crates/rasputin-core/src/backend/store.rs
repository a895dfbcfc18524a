use tracing::{debug, info, warn};

use super::InputBackend;
use crate::config::InputSettings;
use crate::error::Result;

/// Owns the active backend and the values last applied through it.
///
/// Setters update the in-memory value first and then hand it to the
/// backend. A backend failure is logged and otherwise ignored, so the
/// in-memory value always reflects what the user asked for.
pub struct SettingsStore {
    backend: Box<dyn InputBackend>,
    settings: InputSettings,
}

impl SettingsStore {
    /// Wrap `backend` and load its current values
    pub fn open(mut backend: Box<dyn InputBackend>) -> Self {
        let settings = backend.load();
        info!("Loaded {} settings: {:?}", backend.name(), settings);
        Self { backend, settings }
    }

    pub fn reload(&mut self) -> InputSettings {
        self.settings = self.backend.load();
        debug!("Reloaded {} settings: {:?}", self.backend.name(), self.settings);
        self.settings
    }

    pub fn settings(&self) -> InputSettings {
        self.settings
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn set_double_click(&mut self, ms: u32) {
        self.settings.set_double_click(ms);
        let value = self.settings.double_click_ms;
        report("double-click", self.backend.set_double_click(value));
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.settings.set_pointer_speed(speed);
        let value = self.settings.pointer_speed;
        report("pointer speed", self.backend.set_speed(value));
    }

    pub fn set_keyboard(&mut self, delay_ms: u32, interval_ms: u32) {
        self.settings.set_keyboard(delay_ms, interval_ms);
        let (delay, interval) = (self.settings.repeat_delay_ms, self.settings.repeat_interval_ms);
        report("key repeat", self.backend.set_keyboard(delay, interval));
    }

    pub fn set_left_handed(&mut self, left_handed: bool) {
        self.settings.set_left_handed(left_handed);
        report("left handed", self.backend.set_left_handed(left_handed));
    }

    /// Persist every field at once
    pub fn save(&mut self) {
        let settings = self.settings;
        report("save", self.backend.save(&settings));
    }

    /// Re-apply a snapshot taken before editing started
    pub fn restore(&mut self, original: &InputSettings) {
        info!("Restoring {:?}", original);
        self.set_double_click(original.double_click_ms);
        self.set_speed(original.pointer_speed);
        self.set_keyboard(original.repeat_delay_ms, original.repeat_interval_ms);
        self.set_left_handed(original.left_handed);
    }
}

fn report(what: &str, result: Result<()>) {
    if let Err(e) = result {
        warn!("Failed to apply {}: {}", what, e);
    }
}
