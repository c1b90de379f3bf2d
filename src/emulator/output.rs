use crate::emulator::display::Display;

/// Represents a host renderer the framebuffer can be presented to.
pub trait EmulatorOutput {
    /// Show the current framebuffer.
    fn present(&mut self, display: &Display);

    /// Turn the buzzer on or off. Called on transitions only.
    fn buzz(&mut self, _on: bool) {}
}

/// An output device that keeps a copy of the last presented frame.
pub struct DummyOutput {
    frame: Option<String>,
    presents: usize,
    buzzing: bool,
}

impl DummyOutput {
    pub fn new() -> DummyOutput {
        DummyOutput {
            frame: None,
            presents: 0,
            buzzing: false,
        }
    }

    /// The last presented frame, rendered as text.
    pub fn frame(&self) -> Option<&str> {
        self.frame.as_deref()
    }

    pub fn presents(&self) -> usize {
        self.presents
    }

    pub fn is_buzzing(&self) -> bool {
        self.buzzing
    }
}

impl Default for DummyOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulatorOutput for DummyOutput {
    fn present(&mut self, display: &Display) {
        self.frame = Some(display.to_string());
        self.presents += 1;
    }

    fn buzz(&mut self, on: bool) {
        self.buzzing = on;
    }
}
