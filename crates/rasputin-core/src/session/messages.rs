use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;
use crate::format::{parse_float, parse_positive};

/// A value change coming from one dialog control
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "control", content = "value", rename_all = "kebab-case")]
pub enum Change {
    DoubleClick(u32),
    Speed(f64),
    RepeatDelay(u32),
    RepeatInterval(u32),
    LeftHanded(bool),
}

/// Controls that own a debounce timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    DoubleClick,
    Speed,
    /// Delay and interval sliders share one timer
    Keyboard,
    LeftHanded,
}

impl Change {
    pub fn control(&self) -> Control {
        match self {
            Self::DoubleClick(_) => Control::DoubleClick,
            Self::Speed(_) => Control::Speed,
            Self::RepeatDelay(_) | Self::RepeatInterval(_) => Control::Keyboard,
            Self::LeftHanded(_) => Control::LeftHanded,
        }
    }
}

/// Text form used by `rasputin session`: `speed 0.5`, `left-handed on`
impl FromStr for Change {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let value = parts.next().unwrap_or_default();
        let invalid = || Error::Command(format!("invalid change: {:?}", s.trim()));

        let change = match name {
            "double-click" => Self::DoubleClick(parse_positive(value).ok_or_else(invalid)?),
            "speed" => Self::Speed(parse_float(value).ok_or_else(invalid)?),
            "delay" => Self::RepeatDelay(parse_positive(value).ok_or_else(invalid)?),
            "interval" => Self::RepeatInterval(parse_positive(value).ok_or_else(invalid)?),
            "left-handed" => Self::LeftHanded(parse_switch(value).ok_or_else(invalid)?),
            _ => return Err(invalid()),
        };
        Ok(change)
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_lines() {
        assert_eq!("double-click 300".parse::<Change>().unwrap(), Change::DoubleClick(300));
        assert_eq!("speed -0.5".parse::<Change>().unwrap(), Change::Speed(-0.5));
        assert_eq!("  delay 600 ".parse::<Change>().unwrap(), Change::RepeatDelay(600));
        assert_eq!("interval 25".parse::<Change>().unwrap(), Change::RepeatInterval(25));
        assert_eq!("left-handed on".parse::<Change>().unwrap(), Change::LeftHanded(true));
        assert_eq!("left-handed OFF".parse::<Change>().unwrap(), Change::LeftHanded(false));
    }

    #[test]
    fn rejects_bad_lines() {
        assert!("speed fast".parse::<Change>().is_err());
        assert!("delay 0".parse::<Change>().is_err());
        assert!("left-handed".parse::<Change>().is_err());
        assert!("volume 3".parse::<Change>().is_err());
        assert!("".parse::<Change>().is_err());
    }

    #[test]
    fn keyboard_changes_share_a_control() {
        assert_eq!(Change::RepeatDelay(1).control(), Control::Keyboard);
        assert_eq!(Change::RepeatInterval(1).control(), Control::Keyboard);
        assert_ne!(Change::Speed(0.0).control(), Change::DoubleClick(1).control());
    }

    #[test]
    fn serializes_tagged() {
        let json = serde_json::to_string(&Change::Speed(0.5)).unwrap();
        assert_eq!(json, r#"{"control":"speed","value":0.5}"#);
    }
}
