use serde::{Deserialize, Serialize};

/// Milliseconds per second, the numerator of every rate/interval conversion.
const MS_PER_SECOND: u32 = 1000;

/// The five input settings rasputin manages, in the units the UI works with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputSettings {
    /// Maximum delay between the clicks of a double click
    pub double_click_ms: u32,
    /// Pointer acceleration, -1.0 (slowest) to 1.0 (fastest)
    pub pointer_speed: f64,
    /// Swap the primary and secondary buttons
    pub left_handed: bool,
    /// Delay before a held key starts repeating
    pub repeat_delay_ms: u32,
    /// Time between repeats of a held key; never zero
    pub repeat_interval_ms: u32,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            double_click_ms: 250,
            pointer_speed: 0.0,
            left_handed: false,
            repeat_delay_ms: 500,
            repeat_interval_ms: 30,
        }
    }
}

impl InputSettings {
    /// Repeat rate in Hz, as most window managers store it.
    pub fn repeat_rate_hz(&self) -> u32 {
        rate_from_interval(self.repeat_interval_ms)
    }

    pub fn set_double_click(&mut self, ms: u32) {
        self.double_click_ms = ms.max(1);
    }

    pub fn set_pointer_speed(&mut self, speed: f64) {
        self.pointer_speed = clamp_speed(speed);
    }

    pub fn set_keyboard(&mut self, delay_ms: u32, interval_ms: u32) {
        self.repeat_delay_ms = delay_ms.max(1);
        self.repeat_interval_ms = interval_ms.max(1);
    }

    pub fn set_left_handed(&mut self, left_handed: bool) {
        self.left_handed = left_handed;
    }
}

/// Clamp a pointer speed to the libinput range. NaN becomes 0.
pub fn clamp_speed(speed: f64) -> f64 {
    if speed.is_nan() {
        0.0
    } else {
        speed.clamp(-1.0, 1.0)
    }
}

/// Convert a repeat rate in Hz to an interval in milliseconds.
///
/// Returns `None` for a zero rate, which every caller treats as "invalid, use
/// the default".
pub fn interval_from_rate(rate_hz: u32) -> Option<u32> {
    if rate_hz == 0 {
        return None;
    }
    Some((MS_PER_SECOND / rate_hz).max(1))
}

/// Convert a repeat interval in milliseconds to a rate in Hz, at least 1.
pub fn rate_from_interval(interval_ms: u32) -> u32 {
    (MS_PER_SECOND / interval_ms.max(1)).max(1)
}
