use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::process::CommandRunner;
use crate::error::{Error, Result};
use crate::format::{format_float, parse_float, parse_int};

const MOUSE_SCHEMA: &str = "org.gnome.desktop.peripherals.mouse";
const KEYBOARD_SCHEMA: &str = "org.gnome.desktop.peripherals.keyboard";

/// Keys rasputin reads from or mirrors into the desktop settings service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// `double-click`, int, milliseconds
    DoubleClick,
    /// `speed`, double, -1..1
    MouseSpeed,
    /// `repeat-interval`, uint, milliseconds
    RepeatInterval,
    /// `delay`, uint, milliseconds
    RepeatDelay,
}

impl SettingKey {
    pub fn schema(&self) -> &'static str {
        match self {
            Self::DoubleClick | Self::MouseSpeed => MOUSE_SCHEMA,
            Self::RepeatInterval | Self::RepeatDelay => KEYBOARD_SCHEMA,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::DoubleClick => "double-click",
            Self::MouseSpeed => "speed",
            Self::RepeatInterval => "repeat-interval",
            Self::RepeatDelay => "delay",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingValue {
    Int(i32),
    Uint(u32),
    Double(f64),
}

impl SettingValue {
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Self::Int(v) => Some(v as i64),
            Self::Uint(v) => Some(v as i64),
            Self::Double(_) => None,
        }
    }

    /// GVariant text form, as `gsettings set` expects it
    fn to_variant_text(self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Uint(v) => v.to_string(),
            Self::Double(v) => format_float(v),
        }
    }
}

/// The desktop-wide key/value settings store (GSettings).
pub trait SettingsService: Send {
    fn get(&self, key: SettingKey) -> Option<SettingValue>;
    fn set(&mut self, key: SettingKey, value: SettingValue) -> Result<()>;
}

/// GSettings through the `gsettings` command line tool
pub struct GSettingsCli {
    runner: Arc<dyn CommandRunner>,
}

impl GSettingsCli {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl SettingsService for GSettingsCli {
    fn get(&self, key: SettingKey) -> Option<SettingValue> {
        let out = self.runner.output("gsettings", &["get", key.schema(), key.key()])?;
        let value = parse_variant_text(key, &out);
        debug!("gsettings {} {} = {:?}", key.schema(), key.key(), value);
        value
    }

    fn set(&mut self, key: SettingKey, value: SettingValue) -> Result<()> {
        let text = value.to_variant_text();
        if self
            .runner
            .run("gsettings", &["set", key.schema(), key.key(), &text])
        {
            Ok(())
        } else {
            Err(Error::Service(format!(
                "gsettings set {} {} {} failed",
                key.schema(),
                key.key(),
                text
            )))
        }
    }
}

/// Parse `gsettings get` output: `400`, `uint32 40`, `0.5`
fn parse_variant_text(key: SettingKey, text: &str) -> Option<SettingValue> {
    let text = text.trim();
    let text = text.strip_prefix("uint32 ").unwrap_or(text);
    let text = text.strip_prefix("int32 ").unwrap_or(text);

    match key {
        SettingKey::DoubleClick => parse_int(text)
            .and_then(|v| i32::try_from(v).ok())
            .map(SettingValue::Int),
        SettingKey::RepeatInterval | SettingKey::RepeatDelay => parse_int(text)
            .and_then(|v| u32::try_from(v).ok())
            .map(SettingValue::Uint),
        SettingKey::MouseSpeed => parse_float(text).map(SettingValue::Double),
    }
}

/// In-memory settings; clones share the same store
#[derive(Debug, Default, Clone)]
pub struct MemorySettings {
    values: Arc<Mutex<HashMap<SettingKey, SettingValue>>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsService for MemorySettings {
    fn get(&self, key: SettingKey) -> Option<SettingValue> {
        self.values.lock().get(&key).copied()
    }

    fn set(&mut self, key: SettingKey, value: SettingValue) -> Result<()> {
        self.values.lock().insert(key, value);
        Ok(())
    }
}

#[cfg(feature = "gio")]
pub use native::GioSettings;

#[cfg(feature = "gio")]
mod native {
    use gio::prelude::*;
    use tracing::warn;

    use super::{SettingKey, SettingValue, SettingsService, KEYBOARD_SCHEMA, MOUSE_SCHEMA};
    use crate::error::{Error, Result};

    /// GSettings through libgio. Schemas that are not installed are skipped
    /// instead of aborting the process.
    /// Holds only which schemas exist; handles are opened per call.
    pub struct GioSettings {
        mouse: bool,
        keyboard: bool,
    }

    impl GioSettings {
        pub fn new() -> Self {
            Self {
                mouse: installed(MOUSE_SCHEMA),
                keyboard: installed(KEYBOARD_SCHEMA),
            }
        }

        fn settings(&self, key: SettingKey) -> Option<gio::Settings> {
            let available = match key.schema() {
                MOUSE_SCHEMA => self.mouse,
                _ => self.keyboard,
            };
            available.then(|| gio::Settings::new(key.schema()))
        }
    }

    impl Default for GioSettings {
        fn default() -> Self {
            Self::new()
        }
    }

    fn installed(schema: &str) -> bool {
        let found = gio::SettingsSchemaSource::default()
            .and_then(|source| source.lookup(schema, true))
            .is_some();
        if !found {
            warn!("GSettings schema {} is not installed", schema);
        }
        found
    }

    impl SettingsService for GioSettings {
        fn get(&self, key: SettingKey) -> Option<SettingValue> {
            let settings = self.settings(key)?;
            Some(match key {
                SettingKey::DoubleClick => SettingValue::Int(settings.int(key.key())),
                SettingKey::MouseSpeed => SettingValue::Double(settings.double(key.key())),
                SettingKey::RepeatInterval | SettingKey::RepeatDelay => {
                    SettingValue::Uint(settings.uint(key.key()))
                }
            })
        }

        fn set(&mut self, key: SettingKey, value: SettingValue) -> Result<()> {
            let settings = self
                .settings(key)
                .ok_or_else(|| Error::Service(format!("schema {} unavailable", key.schema())))?;

            let result = match value {
                SettingValue::Int(v) => settings.set_int(key.key(), v),
                SettingValue::Uint(v) => settings.set_uint(key.key(), v),
                SettingValue::Double(v) => settings.set_double(key.key(), v),
            };
            result.map_err(|e| Error::Service(e.to_string()))?;
            gio::Settings::sync();
            Ok(())
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::RecordingRunner;

    #[test]
    fn parses_gsettings_output() {
        assert_eq!(
            parse_variant_text(SettingKey::DoubleClick, "400\n"),
            Some(SettingValue::Int(400))
        );
        assert_eq!(
            parse_variant_text(SettingKey::RepeatInterval, "uint32 30\n"),
            Some(SettingValue::Uint(30))
        );
        assert_eq!(
            parse_variant_text(SettingKey::MouseSpeed, "-0.25\n"),
            Some(SettingValue::Double(-0.25))
        );
        assert_eq!(parse_variant_text(SettingKey::RepeatDelay, "uint32 -1"), None);
        assert_eq!(parse_variant_text(SettingKey::DoubleClick, "nothing"), None);
    }

    #[test]
    fn cli_reads_and_writes_through_runner() {
        let runner = RecordingRunner::new()
            .with_output("gsettings get org.gnome.desktop.peripherals.mouse double-click", "320\n");
        let mut service = GSettingsCli::new(Arc::new(runner.clone()));

        assert_eq!(service.get(SettingKey::DoubleClick), Some(SettingValue::Int(320)));
        service.set(SettingKey::MouseSpeed, SettingValue::Double(0.5)).unwrap();
        service.set(SettingKey::RepeatDelay, SettingValue::Uint(600)).unwrap();

        assert_eq!(
            runner.calls()[1..],
            [
                "gsettings set org.gnome.desktop.peripherals.mouse speed 0.500000",
                "gsettings set org.gnome.desktop.peripherals.keyboard delay 600",
            ]
        );
    }

    #[test]
    fn memory_clones_share_values() {
        let memory = MemorySettings::new();
        let mut handle = memory.clone();
        handle.set(SettingKey::DoubleClick, SettingValue::Int(300)).unwrap();

        assert_eq!(memory.get(SettingKey::DoubleClick), Some(SettingValue::Int(300)));
        assert_eq!(memory.get(SettingKey::RepeatDelay), None);
    }
}
