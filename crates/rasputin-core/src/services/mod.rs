mod display;
mod gsettings;
mod process;
#[cfg(feature = "x11")]
mod x11;

pub use display::{swap_primary_buttons, DisplayCall, DisplayServer, NullDisplay};
#[cfg(feature = "gio")]
pub use gsettings::GioSettings;
pub use gsettings::{GSettingsCli, MemorySettings, SettingKey, SettingValue, SettingsService};
pub use process::{CommandRunner, RecordingRunner, SystemRunner};
#[cfg(feature = "x11")]
pub use x11::X11Display;
