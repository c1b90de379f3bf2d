use chip8_vm::emulator::display::{Display, SCREEN_HEIGHT, SCREEN_WIDTH};
use chip8_vm::emulator::{input::EmulatorInput, output::EmulatorOutput};

use super::key_manager::KeyManager;

use crossterm::event::KeyCode;
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue};
use std::io::{stdout, Stdout, Write};

pub struct CrosstermInput<'a> {
    key_manager: &'a KeyManager,
}

impl CrosstermInput<'_> {
    pub fn new(key_manager: &KeyManager) -> CrosstermInput {
        CrosstermInput { key_manager }
    }
}

impl EmulatorInput for CrosstermInput<'_> {
    fn is_held(&self, key: u8) -> bool {
        self.key_manager.is_held(key)
    }
}

/// Draws the framebuffer with two terminal columns per pixel, inside a frame.
pub struct CrosstermOutput {
    out: Stdout,
    cells: [[bool; SCREEN_WIDTH]; SCREEN_HEIGHT],
}

impl CrosstermOutput {
    pub fn new() -> crossterm::Result<CrosstermOutput> {
        let mut out = stdout();
        execute!(out, EnterAlternateScreen, cursor::Hide, Clear(ClearType::All))?;
        terminal::enable_raw_mode()?;

        let bottom = SCREEN_HEIGHT as u16 + 2;
        let right = 2 * SCREEN_WIDTH as u16 + 2;
        for y in 1..=bottom {
            for x in 1..=right {
                let c = if y == 1 && x == 1 {
                    '┏'
                } else if y == 1 && x == right {
                    '┓'
                } else if y == bottom && x == 1 {
                    '┗'
                } else if y == bottom && x == right {
                    '┛'
                } else if y == 1 || y == bottom {
                    '━'
                } else if x == 1 || x == right {
                    '┃'
                } else {
                    continue;
                };
                queue!(out, cursor::MoveTo(x, y), Print(c))?;
            }
        }
        out.flush()?;

        Ok(CrosstermOutput {
            out,
            cells: [[false; SCREEN_WIDTH]; SCREEN_HEIGHT],
        })
    }

    /// Redraw only the cells that changed since the last frame.
    fn draw(&mut self, display: &Display) -> crossterm::Result<()> {
        let mut changed = Vec::new();
        display.for_each_pixel(|x, y, set| {
            if self.cells[y][x] != set {
                changed.push((x, y, set));
            }
        });

        for (x, y, set) in changed {
            self.cells[y][x] = set;
            queue!(
                self.out,
                cursor::MoveTo(2 * x as u16 + 2, y as u16 + 2),
                Print(if set { "██" } else { "  " })
            )?;
        }
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for CrosstermOutput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(self.out, LeaveAlternateScreen, cursor::Show);
    }
}

impl EmulatorOutput for CrosstermOutput {
    fn present(&mut self, display: &Display) {
        if let Err(error) = self.draw(display) {
            log::warn!("Could not draw frame: {}", error);
        }
    }

    // The terminal bell is the closest thing to a buzzer
    fn buzz(&mut self, on: bool) {
        if on {
            let _ = execute!(self.out, Print('\u{7}'));
        }
    }
}

/// Map the left hand side of a QWERTY keyboard onto the hex keypad.
///
/// ```text
/// 1 2 3 4      1 2 3 C
/// q w e r  ->  4 5 6 D
/// a s d f      7 8 9 E
/// z x c v      A 0 B F
/// ```
pub fn key_to_u8(key: KeyCode) -> Option<u8> {
    let c = match key {
        KeyCode::Char(c) => c.to_ascii_lowercase(),
        _ => return None,
    };
    let key = match c {
        '1' => 0x1,
        '2' => 0x2,
        '3' => 0x3,
        '4' => 0xC,
        'q' => 0x4,
        'w' => 0x5,
        'e' => 0x6,
        'r' => 0xD,
        'a' => 0x7,
        's' => 0x8,
        'd' => 0x9,
        'f' => 0xE,
        'z' => 0xA,
        'x' => 0x0,
        'c' => 0xB,
        'v' => 0xF,
        _ => return None,
    };
    Some(key)
}
