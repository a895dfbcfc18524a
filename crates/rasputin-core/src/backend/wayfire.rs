use tracing::debug;

use super::{BackendContext, InputBackend};
use crate::config::{clamp_speed, interval_from_rate, rate_from_interval, InputSettings};
use crate::error::Result;
use crate::format::KeyFile;
use crate::services::{SettingKey, SettingValue};

const GROUP: &str = "input";
const REPEAT_DELAY: &str = "kb_repeat_delay";
const REPEAT_RATE: &str = "kb_repeat_rate";
const CURSOR_SPEED: &str = "mouse_cursor_speed";
const LEFT_HANDED: &str = "left_handed_mode";

const DEFAULT_DELAY_MS: u32 = 400;
const DEFAULT_RATE_HZ: u32 = 40;
const DEFAULT_DOUBLE_CLICK_MS: u32 = 250;

/// Wayfire: settings live in `wayfire.ini`, which Wayfire watches itself.
pub struct WayfireBackend {
    ctx: BackendContext,
}

impl WayfireBackend {
    pub fn new(ctx: BackendContext) -> Self {
        Self { ctx }
    }

    fn user_keyfile(&self) -> KeyFile {
        KeyFile::load(&self.ctx.paths.wayfire_ini()).unwrap_or_default()
    }

    fn update(&self, apply: impl FnOnce(&mut KeyFile)) -> Result<()> {
        let path = self.ctx.paths.wayfire_ini();
        let mut keyfile = self.user_keyfile();
        apply(&mut keyfile);
        debug!("Writing {:?}", path);
        keyfile.save(&path)
    }
}

/// User file, then packaged defaults, per key
struct Tiers {
    user: Option<KeyFile>,
    system: Option<KeyFile>,
}

impl Tiers {
    fn lookup<T>(&self, get: impl Fn(&KeyFile) -> Option<T>) -> Option<T> {
        self.user
            .as_ref()
            .and_then(&get)
            .or_else(|| self.system.as_ref().and_then(&get))
    }

    fn positive(&self, key: &str) -> Option<u32> {
        self.lookup(|kf| {
            kf.get_int(GROUP, key)
                .filter(|v| *v > 0)
                .and_then(|v| u32::try_from(v).ok())
        })
    }
}

impl InputBackend for WayfireBackend {
    fn name(&self) -> &'static str {
        "wayfire"
    }

    fn load(&mut self) -> InputSettings {
        let tiers = Tiers {
            user: KeyFile::load(&self.ctx.paths.wayfire_ini()),
            system: KeyFile::load(&self.ctx.paths.wayfire_defaults),
        };

        let rate = tiers.positive(REPEAT_RATE).unwrap_or(DEFAULT_RATE_HZ);
        let double_click_ms = self
            .ctx
            .service
            .get(SettingKey::DoubleClick)
            .and_then(|v| v.as_int())
            .filter(|ms| *ms > 0)
            .and_then(|ms| u32::try_from(ms).ok())
            .unwrap_or(DEFAULT_DOUBLE_CLICK_MS);

        InputSettings {
            double_click_ms,
            pointer_speed: clamp_speed(
                tiers
                    .lookup(|kf| kf.get_double(GROUP, CURSOR_SPEED))
                    .unwrap_or(0.0),
            ),
            left_handed: tiers
                .lookup(|kf| kf.get_bool(GROUP, LEFT_HANDED))
                .unwrap_or(false),
            repeat_delay_ms: tiers.positive(REPEAT_DELAY).unwrap_or(DEFAULT_DELAY_MS),
            repeat_interval_ms: interval_from_rate(rate).unwrap_or(1000 / DEFAULT_RATE_HZ),
        }
    }

    fn set_double_click(&mut self, ms: u32) -> Result<()> {
        let value = i32::try_from(ms).unwrap_or(i32::MAX);
        self.ctx.service.set(SettingKey::DoubleClick, SettingValue::Int(value))
    }

    fn set_speed(&mut self, speed: f64) -> Result<()> {
        self.update(|kf| kf.set_double(GROUP, CURSOR_SPEED, speed))
    }

    fn set_keyboard(&mut self, delay_ms: u32, interval_ms: u32) -> Result<()> {
        self.update(|kf| {
            kf.set_int(GROUP, REPEAT_DELAY, delay_ms as i64);
            kf.set_int(GROUP, REPEAT_RATE, rate_from_interval(interval_ms) as i64);
        })
    }

    fn set_left_handed(&mut self, left_handed: bool) -> Result<()> {
        self.update(|kf| kf.set_bool(GROUP, LEFT_HANDED, left_handed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, ConfigPaths};
    use crate::services::{MemorySettings, NullDisplay, RecordingRunner, SettingsService};
    use std::sync::Arc;

    struct Fixture {
        _dir: tempfile::TempDir,
        paths: ConfigPaths,
        service: MemorySettings,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let paths = ConfigPaths::with_roots(
                dir.path().join("home"),
                vec![dir.path().join("etc")],
                dir.path().join("defaults.ini"),
            );
            Self {
                _dir: dir,
                paths,
                service: MemorySettings::new(),
            }
        }

        fn backend(&self) -> WayfireBackend {
            WayfireBackend::new(BackendContext {
                paths: self.paths.clone(),
                config: AppConfig::default(),
                runner: Arc::new(RecordingRunner::new()),
                service: Box::new(self.service.clone()),
                display: Box::new(NullDisplay::new()),
            })
        }

        fn write_user(&self, content: &str) {
            let path = self.paths.wayfire_ini();
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }

        fn write_defaults(&self, content: &str) {
            std::fs::write(&self.paths.wayfire_defaults, content).unwrap();
        }
    }

    #[test]
    fn no_config_gives_defaults() {
        let fx = Fixture::new();
        let settings = fx.backend().load();

        assert_eq!(settings.repeat_delay_ms, 400);
        assert_eq!(settings.repeat_interval_ms, 25);
        assert_eq!(settings.pointer_speed, 0.0);
        assert!(!settings.left_handed);
        assert_eq!(settings.double_click_ms, 250);
    }

    #[test]
    fn keys_fall_through_tiers_independently() {
        let fx = Fixture::new();
        fx.write_user("[input]\nkb_repeat_delay=0\nmouse_cursor_speed=0.4\n");
        fx.write_defaults("[input]\nkb_repeat_delay=550\nkb_repeat_rate=50\nmouse_cursor_speed=-0.2\nleft_handed_mode=true\n");

        let settings = fx.backend().load();
        assert_eq!(settings.repeat_delay_ms, 550);
        assert_eq!(settings.repeat_interval_ms, 20);
        assert_eq!(settings.pointer_speed, 0.4);
        assert!(settings.left_handed);
    }

    #[test]
    fn double_click_comes_from_service() {
        let fx = Fixture::new();
        let mut backend = fx.backend();
        backend.set_double_click(300).unwrap();

        assert_eq!(fx.service.get(SettingKey::DoubleClick), Some(SettingValue::Int(300)));
        assert_eq!(backend.load().double_click_ms, 300);
        assert!(!fx.paths.wayfire_ini().exists());
    }

    #[test]
    fn writes_keep_unrelated_content() {
        let fx = Fixture::new();
        fx.write_user("# my wayfire\n[core]\nplugins=alpha\n\n[input]\nxkb_layout=gb\n");

        let mut backend = fx.backend();
        backend.set_keyboard(600, 40).unwrap();
        backend.set_speed(0.753).unwrap();
        backend.set_left_handed(true).unwrap();

        let text = std::fs::read_to_string(fx.paths.wayfire_ini()).unwrap();
        assert!(text.starts_with("# my wayfire\n[core]\nplugins=alpha\n"));
        assert!(text.contains("xkb_layout=gb\n"));
        assert!(text.contains("kb_repeat_rate=25\n"));
        assert!(text.contains("mouse_cursor_speed=0.753000\n"));

        let settings = backend.load();
        assert_eq!(settings.repeat_delay_ms, 600);
        assert_eq!(settings.repeat_interval_ms, 40);
        assert!((settings.pointer_speed - 0.753).abs() < 1e-6);
        assert!(settings.left_handed);
    }

    #[test]
    fn non_positive_double_click_uses_default() {
        let fx = Fixture::new();
        let mut service = fx.service.clone();
        service.set(SettingKey::DoubleClick, SettingValue::Int(-5)).unwrap();

        // A nonsensical stored value falls back to the default
        assert_eq!(fx.backend().load().double_click_ms, 250);
    }
}
