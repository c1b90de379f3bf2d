use std::{
    sync::Mutex,
    time::{Duration, Instant},
};

use chip8_vm::emulator::input::NUM_KEYS;

/// A thread-safe record of when each keypad key was last pressed.
///
/// Terminals report presses but not releases, so a key counts as held
/// for `hold` after its most recent press (auto-repeat keeps it alive).
/// Wrap it in an `std::sync::Arc` to share it with the event thread.
pub struct KeyBuffer {
    hold: Duration,
    pressed_at: Mutex<[Option<Instant>; NUM_KEYS]>,
}

impl KeyBuffer {
    pub fn new(hold: Duration) -> KeyBuffer {
        KeyBuffer {
            hold,
            pressed_at: Mutex::new([None; NUM_KEYS]),
        }
    }

    /// Record a press of `key`. Keys above 0xF are ignored.
    pub fn press(&self, key: u8) {
        let mut guard = self.pressed_at.lock().unwrap();
        if let Some(slot) = guard.get_mut(key as usize) {
            *slot = Some(Instant::now());
        }
    }

    /// Whether `key` was pressed recently enough to count as held.
    pub fn is_held(&self, key: u8) -> bool {
        let guard = self.pressed_at.lock().unwrap();
        guard
            .get(key as usize)
            .copied()
            .flatten()
            .map_or(false, |at| at.elapsed() < self.hold)
    }

    /// Forget every press, e.g. after a reset.
    pub fn release_all(&self) {
        *self.pressed_at.lock().unwrap() = [None; NUM_KEYS];
    }
}
