//! The 64x32 monochrome framebuffer.

use std::fmt;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;
type Screen = [[bool; SCREEN_WIDTH]; SCREEN_HEIGHT];
const EMPTY_SCREEN: Screen = [[false; SCREEN_WIDTH]; SCREEN_HEIGHT];

/// What happens to sprite rows drawn below the bottom edge.
///
/// Columns past the right edge always wrap to the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteOverflow {
    /// Rows continue from the top of the screen.
    Wrap,
    /// Rows past the bottom edge are not drawn.
    Clip,
}

impl Default for SpriteOverflow {
    fn default() -> Self {
        SpriteOverflow::Wrap
    }
}

pub struct Display {
    screen: Screen,
    needs_present: bool,
    overflow: SpriteOverflow,
}

impl Display {
    pub fn new(overflow: SpriteOverflow) -> Display {
        Display {
            screen: EMPTY_SCREEN,
            needs_present: true,
            overflow,
        }
    }

    pub fn clear(&mut self) {
        self.screen = EMPTY_SCREEN;
        self.needs_present = true;
    }

    /// XOR a sprite onto the screen with its top-left corner at `(x, y)`.
    /// Each byte of `rows` is one row, most significant bit leftmost.
    ///
    /// Returns `true` if any pixel went from set to unset.
    pub fn draw_sprite(&mut self, x: u8, y: u8, rows: &[u8]) -> bool {
        let mut collision = false;

        for (row_offset, row) in rows.iter().enumerate() {
            let target_y = y as usize + row_offset;
            if target_y >= SCREEN_HEIGHT && self.overflow == SpriteOverflow::Clip {
                continue;
            }
            let target_y = target_y % SCREEN_HEIGHT;

            for bit in 0..8 {
                if (row >> (7 - bit)) & 1 == 0 {
                    continue;
                }
                let target_x = (x as usize + bit) % SCREEN_WIDTH;
                let pixel = &mut self.screen[target_y][target_x];
                collision |= *pixel;
                *pixel = !*pixel;
            }
        }

        self.needs_present = true;
        collision
    }

    /// Whether the pixel at `(x, y)` is set. Coordinates wrap.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.screen[y % SCREEN_HEIGHT][x % SCREEN_WIDTH]
    }

    /// Visit every pixel, row by row.
    pub fn for_each_pixel<F: FnMut(usize, usize, bool)>(&self, mut f: F) {
        for (y, row) in self.screen.iter().enumerate() {
            for (x, &set) in row.iter().enumerate() {
                f(x, y, set);
            }
        }
    }

    pub fn needs_present(&self) -> bool {
        self.needs_present
    }

    pub fn clear_present_flag(&mut self) {
        self.needs_present = false;
    }
}

impl Default for Display {
    fn default() -> Self {
        Display::new(SpriteOverflow::default())
    }
}

impl fmt::Display for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.screen {
            for &set in row.iter() {
                write!(f, "{}", if set { '#' } else { '.' })?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
