use tracing::{debug, info, warn};

use super::{BackendContext, InputBackend};
use crate::config::{clamp_speed, InputSettings};
use crate::desktop::{parse_desktop_file, DesktopEntry};
use crate::error::{Error, Result};
use crate::format::{format_float, parse_float, KeyFile};
use crate::services::{SettingKey, SettingValue};

const ACCEL_SPEED: &str = "Accel Speed";
const ACCEL_SPEED_PROP: &str = "libinput Accel Speed";

/// Openbox under LXSession: values live in the session's `desktop.conf` and
/// are applied live through xinput and the X server.
pub struct OpenboxBackend {
    ctx: BackendContext,
    session: String,
    /// Pointer devices with a libinput acceleration property
    devices: Option<Vec<String>>,
}

impl OpenboxBackend {
    pub fn new(ctx: BackendContext) -> Self {
        let session = ctx.config.session_name();
        debug!("LXSession profile: {}", session);
        Self {
            ctx,
            session,
            devices: None,
        }
    }

    /// The session's key file: the user's copy, else the first system one,
    /// else an empty file.
    fn read_keyfile(&self) -> KeyFile {
        KeyFile::load(&self.ctx.paths.lxsession_conf(&self.session))
            .or_else(|| {
                let system = self.ctx.paths.lxsession_conf_system(&self.session)?;
                debug!("No user desktop.conf, reading {:?}", system);
                KeyFile::load(&system)
            })
            .unwrap_or_default()
    }

    fn write_keyfile(&self, keyfile: &KeyFile) -> Result<()> {
        let path = self.ctx.paths.lxsession_conf(&self.session);
        debug!("Writing {:?}", path);
        keyfile.save(&path)
    }

    fn devices(&mut self) -> &[String] {
        if self.devices.is_none() {
            let devices = self.discover_devices();
            info!("Found {} pointer device(s) with acceleration", devices.len());
            self.devices = Some(devices);
        }
        self.devices.as_deref().unwrap_or_default()
    }

    fn discover_devices(&self) -> Vec<String> {
        let Some(list) = self.ctx.runner.output("xinput", &["list"]) else {
            return Vec::new();
        };

        parse_pointer_ids(&list)
            .into_iter()
            .filter(|id| {
                self.ctx
                    .runner
                    .output("xinput", &["list-props", id])
                    .is_some_and(|props| props.contains(ACCEL_SPEED))
            })
            .collect()
    }

    fn read_speed(&mut self) -> Option<f64> {
        let device = self.devices().first()?.clone();
        let props = self.ctx.runner.output("xinput", &["list-props", &device])?;
        parse_accel_speed(&props)
    }

    fn mirror(&mut self, key: SettingKey, value: SettingValue) {
        if let Err(e) = self.ctx.service.set(key, value) {
            warn!("{}", e);
        }
    }
}

impl InputBackend for OpenboxBackend {
    fn name(&self) -> &'static str {
        "openbox"
    }

    fn load(&mut self) -> InputSettings {
        let mut settings = InputSettings::default();
        let keyfile = self.read_keyfile();

        if let Some(left_handed) = keyfile.get_bool("Mouse", "LeftHanded") {
            settings.left_handed = left_handed;
        }
        if let Some(delay) = positive(keyfile.get_int("Keyboard", "Delay")) {
            settings.repeat_delay_ms = delay;
        }
        if let Some(interval) = positive(keyfile.get_int("Keyboard", "Interval")) {
            settings.repeat_interval_ms = interval;
        }
        if let Some(ms) = positive(keyfile.get_int("GTK", "iNet/DoubleClickTime")) {
            settings.double_click_ms = ms;
        }

        // Rescan: devices may have been plugged in since the last load
        self.devices = None;
        if let Some(speed) = self.read_speed() {
            settings.pointer_speed = clamp_speed(speed);
        }

        settings
    }

    fn set_double_click(&mut self, ms: u32) -> Result<()> {
        let mut keyfile = self.read_keyfile();
        keyfile.set_int("GTK", "iNet/DoubleClickTime", ms as i64);
        self.write_keyfile(&keyfile)?;
        self.ctx.display.broadcast_reload()
    }

    fn set_speed(&mut self, speed: f64) -> Result<()> {
        let value = format_float(speed);
        let devices = self.devices().to_vec();

        let failed: Vec<String> = devices
            .into_iter()
            .filter(|id| {
                !self
                    .ctx
                    .runner
                    .run("xinput", &["--set-prop", id, ACCEL_SPEED_PROP, &value])
            })
            .collect();

        self.mirror(SettingKey::MouseSpeed, SettingValue::Double(speed));

        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::Command(format!(
                "xinput --set-prop on device(s) {}",
                failed.join(", ")
            )))
        }
    }

    fn set_keyboard(&mut self, delay_ms: u32, interval_ms: u32) -> Result<()> {
        let applied = self.ctx.display.set_key_repeat(delay_ms, interval_ms);

        self.mirror(SettingKey::RepeatInterval, SettingValue::Uint(interval_ms));
        self.mirror(SettingKey::RepeatDelay, SettingValue::Uint(delay_ms));
        applied
    }

    fn set_left_handed(&mut self, left_handed: bool) -> Result<()> {
        self.ctx.display.set_left_handed(left_handed)
    }

    fn save(&mut self, settings: &InputSettings) -> Result<()> {
        let mut keyfile = self.read_keyfile();
        keyfile.set_int("Mouse", "LeftHanded", settings.left_handed as i64);
        keyfile.set_int("Keyboard", "Delay", settings.repeat_delay_ms as i64);
        keyfile.set_int("Keyboard", "Interval", settings.repeat_interval_ms as i64);
        self.write_keyfile(&keyfile)?;

        if self.ctx.config.write_autostart {
            let path = self.ctx.paths.autostart_entry();
            let entry = DesktopEntry::autostart(settings);
            if parse_desktop_file(&path).as_ref() == Some(&entry) {
                debug!("Autostart entry {:?} is up to date", path);
            } else {
                info!("Writing autostart entry {:?}", path);
                entry.save(&path)?;
            }
        }
        Ok(())
    }
}

fn positive(value: Option<i64>) -> Option<u32> {
    value
        .filter(|v| *v > 0)
        .and_then(|v| u32::try_from(v).ok())
}

/// Device ids of the slave pointers in `xinput list` output
pub fn parse_pointer_ids(list: &str) -> Vec<String> {
    list.lines()
        .filter(|line| line.contains("pointer") && line.contains("slave"))
        .filter_map(|line| line.split('\t').nth(1))
        .filter_map(|field| field.split('=').nth(1))
        .map(|id| id.trim_end().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}

/// Value of the first `Accel Speed` property in `xinput list-props` output
pub fn parse_accel_speed(props: &str) -> Option<f64> {
    let line = props.lines().find(|line| line.contains(ACCEL_SPEED))?;
    parse_float(line.split('\t').nth(2)?)
}
