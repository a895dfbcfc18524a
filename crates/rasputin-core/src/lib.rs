pub mod backend;
pub mod config;
pub mod desktop;
pub mod error;
pub mod format;
pub mod services;
pub mod session;

pub use backend::{create_backend, BackendContext, InputBackend, SettingsStore, WindowManager};
pub use config::{AppConfig, ConfigPaths, InputSettings};
pub use error::{Error, Result};
pub use session::{Change, Session};
