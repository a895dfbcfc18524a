use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::xkb::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{AtomEnum, ClientMessageEvent, ConnectionExt as _, EventMask, Window};
use x11rb::rust_connection::RustConnection;

use super::display::{swap_primary_buttons, DisplayServer};
use crate::error::{Error, Result};

/// `XkbUseCoreKbd`
const USE_CORE_KBD: xkb::DeviceSpec = 0x0100;
/// `XkbRepeatKeysMask`: the repeat delay and interval fields of SetControls
const REPEAT_KEYS_MASK: u32 = 1;

/// X11 live-apply over a lazily opened connection to `$DISPLAY`.
#[derive(Default)]
pub struct X11Display {
    conn: Option<(RustConnection, usize)>,
    xkb_ready: bool,
}

impl X11Display {
    pub fn new() -> Self {
        Self::default()
    }

    fn connection(&mut self) -> Result<&(RustConnection, usize)> {
        if self.conn.is_none() {
            let (conn, screen) = x11rb::connect(None).map_err(display_err)?;
            debug!("Connected to X display, screen {}", screen);
            self.conn = Some((conn, screen));
        }
        self.conn
            .as_ref()
            .ok_or_else(|| Error::Display("no X connection".to_string()))
    }
}

impl DisplayServer for X11Display {
    fn set_left_handed(&mut self, left_handed: bool) -> Result<()> {
        let (conn, _) = self.connection()?;

        let mut map = conn
            .get_pointer_mapping()
            .map_err(display_err)?
            .reply()
            .map_err(display_err)?
            .map;

        if swap_primary_buttons(&mut map, left_handed) {
            info!("Setting pointer mapping, left handed: {}", left_handed);
            conn.set_pointer_mapping(&map)
                .map_err(display_err)?
                .reply()
                .map_err(display_err)?;
        }
        Ok(())
    }

    fn set_key_repeat(&mut self, delay_ms: u32, interval_ms: u32) -> Result<()> {
        let negotiated = self.xkb_ready;
        let (conn, _) = self.connection()?;

        if !negotiated {
            let version = conn
                .xkb_use_extension(1, 0)
                .map_err(display_err)?
                .reply()
                .map_err(display_err)?;
            if !version.supported {
                return Err(Error::Display("XKB 1.0 is not supported".to_string()));
            }
        }

        let delay = u16::try_from(delay_ms).unwrap_or(u16::MAX);
        let interval = u16::try_from(interval_ms).unwrap_or(u16::MAX);
        info!("Setting key repeat: {} ms delay, {} ms interval", delay, interval);

        // Only the repeat-keys fields are selected; everything else is ignored
        conn.xkb_set_controls(
            USE_CORE_KBD,
            0u8.into(),
            0u8.into(),
            0u8.into(),
            0u8.into(),
            0u8.into(),
            0u8.into(),
            0u8.into(),
            0u8.into(),
            0,
            0,
            0u8.into(),
            0u8.into(),
            0u8.into(),
            xkb::Control::from(REPEAT_KEYS_MASK),
            delay,
            interval,
            0,
            0,
            0,
            0,
            0,
            0,
            0,
            0,
            0u8.into(),
            0u8.into(),
            0u8.into(),
            0u8.into(),
            &[0u8; 32],
        )
        .map_err(display_err)?
        .check()
        .map_err(display_err)?;

        self.xkb_ready = true;
        Ok(())
    }

    fn broadcast_reload(&mut self) -> Result<()> {
        let (conn, screen) = self.connection()?;
        let root = conn.setup().roots[*screen].root;

        let message = intern(conn, b"_GTK_READ_RCFILES")?;
        let wm_state = intern(conn, b"WM_STATE")?;

        let broadcast = Broadcast {
            conn,
            message,
            wm_state,
        };
        broadcast.send_recursive(root, 0);
        conn.flush().map_err(display_err)?;
        Ok(())
    }
}

fn intern(conn: &RustConnection, name: &[u8]) -> Result<u32> {
    Ok(conn
        .intern_atom(false, name)
        .map_err(display_err)?
        .reply()
        .map_err(display_err)?
        .atom)
}

fn display_err(e: impl std::fmt::Display) -> Error {
    Error::Display(e.to_string())
}

/// Sends a client message to every top-level client window
struct Broadcast<'a> {
    conn: &'a RustConnection,
    message: u32,
    wm_state: u32,
}

impl Broadcast<'_> {
    /// Windows carrying WM_STATE are clients and get the message. Frames and
    /// other containers are searched; a direct child of the root with no
    /// client below it gets the message itself.
    fn send_recursive(&self, window: Window, level: u32) -> bool {
        let is_client = match self
            .conn
            .get_property(false, window, self.wm_state, AtomEnum::ANY, 0, 0)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
        {
            Some(reply) => reply.type_ != x11rb::NONE,
            // Window vanished or is inaccessible
            None => return false,
        };

        let mut found = false;
        if !is_client {
            let children = match self.conn.query_tree(window).ok().and_then(|c| c.reply().ok()) {
                Some(tree) => tree.children,
                None => return false,
            };
            for child in children {
                if self.send_recursive(child, level + 1) {
                    found = true;
                }
            }
        }

        if is_client || (!found && level == 1) {
            let event = ClientMessageEvent::new(8, window, self.message, [0u8; 20]);
            if let Err(e) = self.conn.send_event(false, window, EventMask::NO_EVENT, event) {
                debug!("send_event to {:#x} failed: {}", window, e);
            }
        }

        is_client || found
    }
}
