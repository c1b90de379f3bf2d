pub const NUM_KEYS: usize = 16;

/// Represents an input device holding the state of the 16 hex keys.
///
/// The emulator only ever reads from it, the host updates it.
pub trait EmulatorInput {
    /// Whether `key` (0x0 to 0xF) is currently held down.
    fn is_held(&self, key: u8) -> bool;

    /// The lowest-numbered key that is held down, if any.
    fn any_held(&self) -> Option<u8> {
        (0..NUM_KEYS as u8).find(|&key| self.is_held(key))
    }
}

/// An input device that never provides any input
pub struct DummyInput;

impl EmulatorInput for DummyInput {
    fn is_held(&self, _: u8) -> bool {
        false
    }
}

/// The 16 key states in a plain array, indexed by key code.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; NUM_KEYS],
}

impl Keypad {
    pub fn new() -> Keypad {
        Keypad::default()
    }

    /// Keys above 0xF are ignored.
    pub fn set(&mut self, key: u8, held: bool) {
        if let Some(state) = self.keys.get_mut(key as usize) {
            *state = held;
        }
    }

    pub fn release_all(&mut self) {
        self.keys = [false; NUM_KEYS];
    }
}

impl EmulatorInput for Keypad {
    fn is_held(&self, key: u8) -> bool {
        self.keys.get(key as usize).copied().unwrap_or(false)
    }
}

impl<T: EmulatorInput + ?Sized> EmulatorInput for &T {
    fn is_held(&self, key: u8) -> bool {
        (**self).is_held(key)
    }

    fn any_held(&self) -> Option<u8> {
        (**self).any_held()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_input_holds_nothing() {
        assert!(!DummyInput.is_held(0x5));
        assert_eq!(DummyInput.any_held(), None);
    }

    #[test]
    fn keypad_reports_lowest_held_key() {
        let mut keypad = Keypad::new();
        keypad.set(0xC, true);
        keypad.set(0x7, true);
        assert!(keypad.is_held(0x7));
        assert!(!keypad.is_held(0x8));
        assert_eq!(keypad.any_held(), Some(0x7));

        keypad.set(0x7, false);
        assert_eq!(keypad.any_held(), Some(0xC));

        keypad.release_all();
        assert_eq!(keypad.any_held(), None);
    }

    #[test]
    fn borrowed_keypad_is_an_input() {
        fn lowest<I: EmulatorInput>(input: I) -> Option<u8> {
            input.any_held()
        }

        let mut keypad = Keypad::new();
        keypad.set(0x2, true);
        assert_eq!(lowest(&keypad), Some(0x2));
    }

    #[test]
    fn keys_outside_the_pad_are_never_held() {
        let mut keypad = Keypad::new();
        keypad.set(0x10, true);
        assert!(!keypad.is_held(0x10));
        assert_eq!(keypad.any_held(), None);
    }
}
