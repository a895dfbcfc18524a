use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::{BackendContext, InputBackend};
use crate::config::{clamp_speed, interval_from_rate, rate_from_interval, InputSettings};
use crate::error::{Error, Result};
use crate::format::{format_float, parse_float, parse_positive, RcDocument, XmlPath};
use crate::services::{SettingKey, SettingValue};

const REPEAT_RATE: &str = "keyboard/repeatRate";
const REPEAT_DELAY: &str = "keyboard/repeatDelay";
const POINTER_SPEED: &str = "libinput/device[category=default]/pointerSpeed";
const LEFT_HANDED: &str = "libinput/device[category=default]/leftHanded";
const DOUBLE_CLICK: &str = "mouse/doubleClickTime";

const DEFAULTS: InputSettings = InputSettings {
    double_click_ms: 250,
    pointer_speed: 0.0,
    left_handed: false,
    repeat_delay_ms: 600,
    repeat_interval_ms: 40,
};

/// labwc: settings live in `rc.xml`, applied by asking labwc to reconfigure.
pub struct LabwcBackend {
    ctx: BackendContext,
}

impl LabwcBackend {
    pub fn new(ctx: BackendContext) -> Self {
        Self { ctx }
    }

    fn user_rc(&self) -> PathBuf {
        self.ctx.paths.labwc_rc()
    }

    /// The document to read from: the user's rc.xml, else the system one
    fn read_document(&self) -> Option<RcDocument> {
        RcDocument::load(&self.user_rc()).or_else(|| {
            let system = self.ctx.paths.labwc_rc_system()?;
            debug!("No user rc.xml, reading {:?}", system);
            RcDocument::load(&system)
        })
    }

    /// Upsert `values` into the user's rc.xml, then reconfigure labwc.
    ///
    /// A user file that does not exist yet starts as a copy of the system one
    /// so the rest of its configuration is kept.
    fn update(&mut self, values: &[(&str, String)]) -> Result<()> {
        let path = self.user_rc();
        let mut doc = match RcDocument::load(&path) {
            Some(doc) => doc,
            None => {
                let seed = self
                    .ctx
                    .paths
                    .labwc_rc_system()
                    .and_then(|system| RcDocument::load(&system));
                if seed.is_some() {
                    info!("Seeding {:?} from the system rc.xml", path);
                }
                seed.unwrap_or_default()
            }
        };

        for (key, value) in values {
            let xml_path: XmlPath = key.parse()?;
            debug!("rc.xml {} = {}", xml_path, value);
            doc.set(&xml_path, value);
        }
        doc.save(&path)?;

        self.reconfigure()
    }

    fn reconfigure(&self) -> Result<()> {
        let command = &self.ctx.config.reload_command;
        if self.ctx.runner.shell(command) {
            Ok(())
        } else {
            Err(Error::Command(command.clone()))
        }
    }
}

fn lookup(doc: &RcDocument, key: &str) -> Option<String> {
    let path: XmlPath = key.parse().ok()?;
    doc.get(&path)
}

impl InputBackend for LabwcBackend {
    fn name(&self) -> &'static str {
        "labwc"
    }

    fn load(&mut self) -> InputSettings {
        let user_rc = self.user_rc();
        if let Some(dir) = user_rc.parent() {
            if let Err(e) = std::fs::create_dir_all(dir) {
                warn!("Could not create {:?}: {}", dir, e);
            }
        }

        let mut settings = DEFAULTS;
        let doc = self.read_document();

        if let Some(doc) = &doc {
            if let Some(interval) = lookup(doc, REPEAT_RATE)
                .and_then(|text| parse_positive(&text))
                .and_then(interval_from_rate)
            {
                settings.repeat_interval_ms = interval;
            }
            if let Some(delay) = lookup(doc, REPEAT_DELAY).and_then(|text| parse_positive(&text)) {
                settings.repeat_delay_ms = delay;
            }
            if let Some(speed) = lookup(doc, POINTER_SPEED).and_then(|text| parse_float(&text)) {
                settings.pointer_speed = clamp_speed(speed);
            }
            match lookup(doc, LEFT_HANDED).as_deref() {
                Some("yes") => settings.left_handed = true,
                Some("no") => settings.left_handed = false,
                _ => {}
            }
        }

        let from_service = self
            .ctx
            .service
            .get(SettingKey::DoubleClick)
            .and_then(|v| v.as_int())
            .filter(|ms| *ms > 0)
            .and_then(|ms| u32::try_from(ms).ok());
        let from_rc = || {
            doc.as_ref()
                .and_then(|doc| lookup(doc, DOUBLE_CLICK))
                .and_then(|text| parse_positive(&text))
        };
        if let Some(ms) = from_service.or_else(from_rc) {
            settings.double_click_ms = ms;
        }

        settings
    }

    fn set_double_click(&mut self, ms: u32) -> Result<()> {
        let value = i32::try_from(ms).unwrap_or(i32::MAX);
        if let Err(e) = self.ctx.service.set(SettingKey::DoubleClick, SettingValue::Int(value)) {
            warn!("{}", e);
        }
        self.update(&[(DOUBLE_CLICK, ms.to_string())])
    }

    fn set_speed(&mut self, speed: f64) -> Result<()> {
        self.update(&[(POINTER_SPEED, format_float(speed))])
    }

    fn set_keyboard(&mut self, delay_ms: u32, interval_ms: u32) -> Result<()> {
        self.update(&[
            (REPEAT_RATE, rate_from_interval(interval_ms).to_string()),
            (REPEAT_DELAY, delay_ms.to_string()),
        ])
    }

    fn set_left_handed(&mut self, left_handed: bool) -> Result<()> {
        let value = if left_handed { "yes" } else { "no" };
        self.update(&[(LEFT_HANDED, value.to_string())])
    }
}
