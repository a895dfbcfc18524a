mod app;
mod paths;
mod settings;

pub use app::AppConfig;
pub use paths::ConfigPaths;
pub use settings::{clamp_speed, interval_from_rate, rate_from_interval, InputSettings};
