use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;

/// Live-apply calls that go straight to the windowing system.
pub trait DisplayServer: Send {
    /// Swap the primary and secondary buttons in the pointer mapping
    fn set_left_handed(&mut self, left_handed: bool) -> Result<()>;

    /// Keyboard auto-repeat: delay before the first repeat and the interval
    /// between repeats, both in milliseconds
    fn set_key_repeat(&mut self, delay_ms: u32, interval_ms: u32) -> Result<()>;

    /// Ask every running GTK application to re-read its settings
    fn broadcast_reload(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayCall {
    SetLeftHanded(bool),
    SetKeyRepeat { delay_ms: u32, interval_ms: u32 },
    BroadcastReload,
}

/// Display server stand-in for headless and dry runs: logs and records calls
#[derive(Debug, Default, Clone)]
pub struct NullDisplay {
    calls: Arc<Mutex<Vec<DisplayCall>>>,
}

impl NullDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<DisplayCall> {
        self.calls.lock().clone()
    }
}

impl DisplayServer for NullDisplay {
    fn set_left_handed(&mut self, left_handed: bool) -> Result<()> {
        info!("Would set pointer mapping, left handed: {}", left_handed);
        self.calls.lock().push(DisplayCall::SetLeftHanded(left_handed));
        Ok(())
    }

    fn set_key_repeat(&mut self, delay_ms: u32, interval_ms: u32) -> Result<()> {
        info!("Would set key repeat: {} ms delay, {} ms interval", delay_ms, interval_ms);
        self.calls.lock().push(DisplayCall::SetKeyRepeat { delay_ms, interval_ms });
        Ok(())
    }

    fn broadcast_reload(&mut self) -> Result<()> {
        info!("Would broadcast _GTK_READ_RCFILES");
        self.calls.lock().push(DisplayCall::BroadcastReload);
        Ok(())
    }
}

/// Reorder a pointer button map for the requested handedness.
///
/// Button 1 trades places with button 3, or with button 2 on devices that
/// have fewer than three buttons. Returns whether the map changed.
pub fn swap_primary_buttons(map: &mut [u8], left_handed: bool) -> bool {
    let n_buttons = map.len();
    let secondary: u8 = if n_buttons < 3 { 2 } else { 3 };
    let mut idx_1 = 0;
    let mut idx_3 = 1;

    for (i, &button) in map.iter().enumerate() {
        if button == 1 {
            idx_1 = i;
        } else if button == secondary {
            idx_3 = i;
        }
    }

    if idx_3 >= n_buttons {
        return false;
    }

    if (left_handed && idx_1 < idx_3) || (!left_handed && idx_1 > idx_3) {
        map[idx_1] = secondary;
        map[idx_3] = 1;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swaps_to_left_handed() {
        let mut map = [1, 2, 3, 4, 5];
        assert!(swap_primary_buttons(&mut map, true));
        assert_eq!(map, [3, 2, 1, 4, 5]);

        // Already left handed
        assert!(!swap_primary_buttons(&mut map, true));
        assert_eq!(map, [3, 2, 1, 4, 5]);
    }

    #[test]
    fn swaps_back_to_right_handed() {
        let mut map = [3, 2, 1, 4, 5, 6, 7];
        assert!(swap_primary_buttons(&mut map, false));
        assert_eq!(map, [1, 2, 3, 4, 5, 6, 7]);
        assert!(!swap_primary_buttons(&mut map, false));
    }

    #[test]
    fn two_button_devices_use_button_two() {
        let mut map = [1, 2];
        assert!(swap_primary_buttons(&mut map, true));
        assert_eq!(map, [2, 1]);
    }

    #[test]
    fn tiny_maps_are_left_alone() {
        let mut map = [1];
        assert!(!swap_primary_buttons(&mut map, true));
        let mut empty: [u8; 0] = [];
        assert!(!swap_primary_buttons(&mut empty, true));
    }

    #[test]
    fn null_display_records_calls() {
        let display = NullDisplay::new();
        let mut handle = display.clone();
        handle.set_left_handed(true).unwrap();
        handle.set_key_repeat(600, 40).unwrap();
        handle.broadcast_reload().unwrap();

        assert_eq!(
            display.calls(),
            vec![
                DisplayCall::SetLeftHanded(true),
                DisplayCall::SetKeyRepeat {
                    delay_ms: 600,
                    interval_ms: 40
                },
                DisplayCall::BroadcastReload,
            ]
        );
    }
}
