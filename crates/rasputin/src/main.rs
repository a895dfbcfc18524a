mod session;

use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::{debug, info};

use rasputin_core::{
    create_backend, AppConfig, BackendContext, ConfigPaths, InputSettings, SettingsStore,
    WindowManager,
};

#[derive(Parser)]
#[command(name = "rasputin")]
#[command(about = "Mouse and keyboard settings for labwc, Openbox and Wayfire")]
#[command(version)]
struct Cli {
    /// Window manager backend (labwc, openbox, wayfire); detected when omitted
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Write config files but only log commands and live-apply calls
    #[arg(long, global = true)]
    dry_run: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print current settings (default)
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Print the detected window manager
    Detect,
    /// Persist current settings (Openbox: desktop.conf and autostart entry)
    Save,
    /// Change one setting
    Set {
        #[command(subcommand)]
        setting: Setting,
    },
    /// Edit interactively: reads changes from stdin, `ok` commits, `cancel`
    /// or end of input reverts
    Session,
}

#[derive(Subcommand)]
enum Setting {
    /// Double-click time in milliseconds
    DoubleClick { ms: u32 },
    /// Pointer acceleration from -1.0 to 1.0
    Speed {
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
    /// Key repeat delay and interval in milliseconds
    Keyboard {
        #[arg(long)]
        delay: Option<u32>,
        #[arg(long)]
        interval: Option<u32>,
    },
    /// Swap the primary and secondary buttons
    LeftHanded {
        #[arg(action = clap::ArgAction::Set, value_parser = clap::builder::BoolishValueParser::new())]
        enabled: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("rasputin={}", level).parse()?)
                .add_directive(format!("rasputin_core={}", level).parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let paths = ConfigPaths::new();
    let config = AppConfig::load(&paths.app_settings);
    let wm = resolve_backend(cli.backend.as_deref(), &config)?;
    debug!("Using {} backend", wm.name());

    if let Some(Command::Detect) = cli.command {
        println!("{}", wm.name());
        return Ok(());
    }

    let debounce = Duration::from_millis(config.debounce_ms);
    let ctx = if cli.dry_run {
        info!("Dry run: commands and live-apply calls are only logged");
        BackendContext::dry_run(paths, config)
    } else {
        BackendContext::system(paths, config)
    };
    let mut store = SettingsStore::open(create_backend(wm, ctx));

    match cli.command {
        Some(Command::Show { json }) => show(&store, json)?,
        None => show(&store, false)?,
        Some(Command::Detect) => {}
        Some(Command::Save) => store.save(),
        Some(Command::Set { setting }) => {
            apply(&mut store, setting)?;
            show(&store, false)?;
        }
        Some(Command::Session) => session::run(store, debounce)?,
    }

    Ok(())
}

/// `--backend`, then settings.json, then the environment
fn resolve_backend(flag: Option<&str>, config: &AppConfig) -> anyhow::Result<WindowManager> {
    match flag {
        Some(name) => WindowManager::from_str(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown backend: {}", name)),
        None => Ok(config.backend.unwrap_or_else(WindowManager::detect)),
    }
}

fn apply(store: &mut SettingsStore, setting: Setting) -> anyhow::Result<()> {
    match setting {
        Setting::DoubleClick { ms } => store.set_double_click(ms),
        Setting::Speed { value } => store.set_speed(value),
        Setting::Keyboard { delay, interval } => {
            if delay.is_none() && interval.is_none() {
                anyhow::bail!("Nothing to set: pass --delay and/or --interval");
            }
            let current = store.settings();
            store.set_keyboard(
                delay.unwrap_or(current.repeat_delay_ms),
                interval.unwrap_or(current.repeat_interval_ms),
            );
        }
        Setting::LeftHanded { enabled } => store.set_left_handed(enabled),
    }
    Ok(())
}

fn show(store: &SettingsStore, json: bool) -> anyhow::Result<()> {
    let settings = store.settings();
    if json {
        let value = serde_json::json!({
            "backend": store.backend_name(),
            "settings": settings,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print_settings(store.backend_name(), &settings);
    }
    Ok(())
}

pub(crate) fn print_settings(backend: &str, settings: &InputSettings) {
    println!("Backend:         {}", backend);
    println!("Double-click:    {} ms", settings.double_click_ms);
    println!("Pointer speed:   {:.2}", settings.pointer_speed);
    println!("Left handed:     {}", if settings.left_handed { "yes" } else { "no" });
    println!("Repeat delay:    {} ms", settings.repeat_delay_ms);
    println!(
        "Repeat interval: {} ms ({} Hz)",
        settings.repeat_interval_ms,
        settings.repeat_rate_hz()
    );
}
