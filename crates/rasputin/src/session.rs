use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use rasputin_core::{Change, Session, SettingsStore};

/// Run an editing session fed from stdin, one change per line
pub fn run(store: SettingsStore, debounce: Duration) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    runtime.block_on(drive(store, debounce))
}

async fn drive(store: SettingsStore, debounce: Duration) -> anyhow::Result<()> {
    let backend = store.backend_name();
    let session = Session::start(Arc::new(Mutex::new(store)), debounce);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let settings = loop {
        let Some(line) = lines.next_line().await? else {
            info!("End of input, reverting");
            break session.cancel().await;
        };

        match line.trim() {
            "" => continue,
            "ok" => break session.commit().await,
            "cancel" => break session.cancel().await,
            text => match text.parse::<Change>() {
                Ok(change) => session.submit(change),
                Err(e) => warn!("{}", e),
            },
        }
    };

    crate::print_settings(backend, &settings);
    Ok(())
}
