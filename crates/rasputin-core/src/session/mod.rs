//! An editing session over a [`SettingsStore`].
//!
//! Slider-style controls produce a burst of values while they are dragged.
//! Each change restarts that control's timer and only the last value is
//! applied once the control has been still for the debounce period. Switches
//! apply at once.

mod messages;

pub use messages::{Change, Control};

use async_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::backend::SettingsStore;
use crate::config::InputSettings;

enum Command {
    Change(Change),
    /// Apply everything pending now
    Flush(oneshot::Sender<()>),
    /// Drop everything pending
    Discard(oneshot::Sender<()>),
}

/// Dialog lifetime: snapshot on start, debounced edits, then commit or cancel.
///
/// Must be started from within a tokio runtime.
pub struct Session {
    store: Arc<Mutex<SettingsStore>>,
    original: InputSettings,
    tx: Sender<Command>,
    worker: JoinHandle<()>,
}

impl Session {
    pub fn start(store: Arc<Mutex<SettingsStore>>, debounce: Duration) -> Self {
        let original = store.lock().settings();
        info!("Session started with {:?}", original);

        let (tx, rx) = async_channel::unbounded();
        let worker = Debouncer::new(store.clone(), debounce);
        let worker = tokio::spawn(worker.run(rx));

        Self {
            store,
            original,
            tx,
            worker,
        }
    }

    /// Settings as they were when the session started
    pub fn original(&self) -> InputSettings {
        self.original
    }

    pub fn submit(&self, change: Change) {
        if self.tx.try_send(Command::Change(change)).is_err() {
            warn!("Session worker is gone, dropping {:?}", change);
        }
    }

    /// Apply pending changes, persist, and end the session
    pub async fn commit(self) -> InputSettings {
        self.request(Command::Flush).await;
        let mut store = self.store.lock();
        store.save();
        info!("Session committed");
        store.settings()
    }

    /// Drop pending changes, put the original values back, and end the session
    pub async fn cancel(self) -> InputSettings {
        self.request(Command::Discard).await;
        let mut store = self.store.lock();
        store.restore(&self.original);
        info!("Session cancelled");
        store.settings()
    }

    async fn request(&self, command: fn(oneshot::Sender<()>) -> Command) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(command(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
        self.tx.close();
        self.worker.abort();
    }
}

#[derive(Debug, Clone, Copy)]
struct Pending<T> {
    deadline: Instant,
    value: T,
}

/// Per-control timers; a new value replaces the old one and restarts the timer
struct Debouncer {
    store: Arc<Mutex<SettingsStore>>,
    debounce: Duration,
    double_click: Option<Pending<u32>>,
    speed: Option<Pending<f64>>,
    /// (delay, interval)
    keyboard: Option<Pending<(u32, u32)>>,
}

impl Debouncer {
    fn new(store: Arc<Mutex<SettingsStore>>, debounce: Duration) -> Self {
        Self {
            store,
            debounce,
            double_click: None,
            speed: None,
            keyboard: None,
        }
    }

    async fn run(mut self, rx: Receiver<Command>) {
        loop {
            let deadline = self.next_deadline();

            tokio::select! {
                command = rx.recv() => match command {
                    Ok(Command::Change(change)) => self.push(change),
                    Ok(Command::Flush(ack)) => {
                        self.apply_due(None);
                        let _ = ack.send(());
                    }
                    Ok(Command::Discard(ack)) => {
                        self.clear();
                        let _ = ack.send(());
                    }
                    Err(_) => break,
                },

                _ = async {
                    match deadline {
                        Some(deadline) => sleep_until(deadline).await,
                        None => std::future::pending::<()>().await,
                    }
                } => {
                    self.apply_due(Some(Instant::now()));
                }
            }
        }
        debug!("Session worker stopped");
    }

    fn push(&mut self, change: Change) {
        let deadline = Instant::now() + self.debounce;
        debug!("{:?} on {:?}, applying at {:?}", change, change.control(), deadline);

        match change {
            Change::DoubleClick(ms) => self.double_click = Some(Pending { deadline, value: ms }),
            Change::Speed(speed) => self.speed = Some(Pending { deadline, value: speed }),
            Change::RepeatDelay(delay) => {
                let (_, interval) = self.keyboard_values();
                self.keyboard = Some(Pending { deadline, value: (delay, interval) });
            }
            Change::RepeatInterval(interval) => {
                let (delay, _) = self.keyboard_values();
                self.keyboard = Some(Pending { deadline, value: (delay, interval) });
            }
            Change::LeftHanded(left_handed) => self.store.lock().set_left_handed(left_handed),
        }
    }

    /// Keyboard values to build on: the pending pair, else what the store holds
    fn keyboard_values(&self) -> (u32, u32) {
        match self.keyboard {
            Some(pending) => pending.value,
            None => {
                let settings = self.store.lock().settings();
                (settings.repeat_delay_ms, settings.repeat_interval_ms)
            }
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        [
            self.double_click.map(|p| p.deadline),
            self.speed.map(|p| p.deadline),
            self.keyboard.map(|p| p.deadline),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Apply every pending value whose deadline has passed, or all of them
    /// when `now` is `None`
    fn apply_due(&mut self, now: Option<Instant>) {
        let due = |deadline: Instant| now.map_or(true, |now| deadline <= now);
        let mut store = self.store.lock();

        if let Some(p) = self.double_click.filter(|p| due(p.deadline)) {
            self.double_click = None;
            store.set_double_click(p.value);
        }
        if let Some(p) = self.speed.filter(|p| due(p.deadline)) {
            self.speed = None;
            store.set_speed(p.value);
        }
        if let Some(p) = self.keyboard.filter(|p| due(p.deadline)) {
            self.keyboard = None;
            let (delay, interval) = p.value;
            store.set_keyboard(delay, interval);
        }
    }

    fn clear(&mut self) {
        self.double_click = None;
        self.speed = None;
        self.keyboard = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InputBackend;
    use crate::error::Result;

    /// Backend that records applied values
    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.calls.lock())
        }

        fn push(&self, call: String) -> Result<()> {
            self.calls.lock().push(call);
            Ok(())
        }
    }

    impl InputBackend for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn load(&mut self) -> InputSettings {
            InputSettings::default()
        }

        fn set_double_click(&mut self, ms: u32) -> Result<()> {
            self.push(format!("double-click {ms}"))
        }

        fn set_speed(&mut self, speed: f64) -> Result<()> {
            self.push(format!("speed {speed}"))
        }

        fn set_keyboard(&mut self, delay_ms: u32, interval_ms: u32) -> Result<()> {
            self.push(format!("keyboard {delay_ms} {interval_ms}"))
        }

        fn set_left_handed(&mut self, left_handed: bool) -> Result<()> {
            self.push(format!("left-handed {left_handed}"))
        }

        fn save(&mut self, _settings: &InputSettings) -> Result<()> {
            self.push("save".to_string())
        }
    }

    const DEBOUNCE: Duration = Duration::from_millis(500);

    fn start() -> (Session, Recorder) {
        let recorder = Recorder::default();
        let store = Arc::new(Mutex::new(SettingsStore::open(Box::new(recorder.clone()))));
        (Session::start(store, DEBOUNCE), recorder)
    }

    /// Let the worker drain its queue without moving the clock
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_applies_last_value_once() {
        let (session, recorder) = start();

        session.submit(Change::Speed(0.1));
        session.submit(Change::Speed(0.2));
        session.submit(Change::Speed(0.3));
        settle().await;
        assert!(recorder.take().is_empty());

        tokio::time::sleep(DEBOUNCE + Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(recorder.take(), vec!["speed 0.3"]);

        session.commit().await;
    }

    #[tokio::test(start_paused = true)]
    async fn new_change_restarts_timer() {
        let (session, recorder) = start();

        session.submit(Change::DoubleClick(300));
        tokio::time::sleep(Duration::from_millis(400)).await;
        session.submit(Change::DoubleClick(350));
        tokio::time::sleep(Duration::from_millis(400)).await;
        settle().await;
        assert!(recorder.take().is_empty());

        tokio::time::sleep(Duration::from_millis(101)).await;
        settle().await;
        assert_eq!(recorder.take(), vec!["double-click 350"]);

        session.cancel().await;
    }

    #[tokio::test(start_paused = true)]
    async fn delay_and_interval_share_keyboard_timer() {
        let (session, recorder) = start();

        session.submit(Change::RepeatDelay(600));
        session.submit(Change::RepeatInterval(20));
        tokio::time::sleep(DEBOUNCE * 2).await;
        settle().await;

        assert_eq!(recorder.take(), vec!["keyboard 600 20"]);
        session.commit().await;
    }

    #[tokio::test(start_paused = true)]
    async fn left_handed_applies_immediately() {
        let (session, recorder) = start();

        session.submit(Change::LeftHanded(true));
        settle().await;

        assert_eq!(recorder.take(), vec!["left-handed true"]);
        session.commit().await;
    }

    #[tokio::test(start_paused = true)]
    async fn commit_flushes_then_saves() {
        let (session, recorder) = start();

        session.submit(Change::Speed(-0.5));
        session.submit(Change::DoubleClick(400));
        let settings = session.commit().await;

        assert_eq!(recorder.take(), vec!["double-click 400", "speed -0.5", "save"]);
        assert_eq!(settings.pointer_speed, -0.5);
        assert_eq!(settings.double_click_ms, 400);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_and_restores() {
        let (session, recorder) = start();
        let original = session.original();

        session.submit(Change::LeftHanded(true));
        session.submit(Change::Speed(0.9));
        settle().await;
        let settings = session.cancel().await;

        assert_eq!(settings, original);
        assert_eq!(
            recorder.take(),
            vec![
                "left-handed true",
                "double-click 250",
                "speed 0",
                "keyboard 500 30",
                "left-handed false",
            ]
        );
    }
}
