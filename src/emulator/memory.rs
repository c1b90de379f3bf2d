//! The 4 KiB address space.

use super::error::EmulatorError;

pub const MEM_SIZE: usize = 4096;
pub const ADDR_MASK: u16 = 0x0FFF;
pub const PROGRAM_START: u16 = 0x200;
pub const PROGRAM_CAPACITY: usize = MEM_SIZE - PROGRAM_START as usize;
pub const FONT_START: u16 = 0x000;

/// Bytes per font glyph.
pub const GLYPH_HEIGHT: u16 = 5;

const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Main memory. The font atlas lives at the bottom,
/// programs are loaded at 0x200.
///
/// Every access masks the address to 12 bits, so no address
/// can reach outside the array.
pub struct Memory {
    bytes: Box<[u8; MEM_SIZE]>,
}

impl Memory {
    pub fn new() -> Memory {
        let mut memory = Memory {
            bytes: Box::new([0; MEM_SIZE]),
        };
        memory.reset();
        memory
    }

    /// Zero every byte and reload the font.
    pub fn reset(&mut self) {
        self.bytes.fill(0);
        let font_start = FONT_START as usize;
        self.bytes[font_start..font_start + FONT.len()].copy_from_slice(&FONT);
    }

    /// Copy a program image to 0x200.
    ///
    /// An image that would run past 0xFFF is rejected as a whole
    /// and memory is left untouched.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), EmulatorError> {
        Self::check_program_size(program.len())?;

        let start = PROGRAM_START as usize;
        self.bytes[start..start + program.len()].copy_from_slice(program);
        log::debug!("Loaded {} bytes at {:#05X}", program.len(), PROGRAM_START);
        Ok(())
    }

    /// Whether a program image of `size` bytes fits between 0x200 and 0xFFF.
    pub fn check_program_size(size: usize) -> Result<(), EmulatorError> {
        if size > PROGRAM_CAPACITY {
            log::warn!("Rejecting program of {} bytes, only {} bytes fit", size, PROGRAM_CAPACITY);
            return Err(EmulatorError::ProgramTooLarge {
                size,
                capacity: PROGRAM_CAPACITY,
            });
        }
        Ok(())
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        self.bytes[Self::mask(addr)]
    }

    pub fn write_byte(&mut self, addr: u16, value: u8) {
        self.bytes[Self::mask(addr)] = value;
    }

    /// The big-endian word at `pc`. The second byte wraps to 0x000
    /// when `pc` is the last address.
    pub fn fetch_instruction(&self, pc: u16) -> u16 {
        let left = self.read_byte(pc);
        let right = self.read_byte(pc.wrapping_add(1) & ADDR_MASK);
        (left as u16) << 8 | right as u16
    }

    /// Read `len` bytes starting at `addr`, wrapping at the end of memory.
    pub fn read_wrapping(&self, addr: u16, len: usize) -> impl Iterator<Item = u8> + '_ {
        (0..len).map(move |offset| self.read_byte(addr.wrapping_add(offset as u16) & ADDR_MASK))
    }

    /// Address of the glyph for the hex digit `digit` (low nibble only).
    pub fn glyph_address(digit: u8) -> u16 {
        FONT_START + (digit & 0x0F) as u16 * GLYPH_HEIGHT
    }

    fn mask(addr: u16) -> usize {
        if addr > ADDR_MASK {
            log::warn!("Address {:#06X} is outside memory, masking to 12 bits", addr);
        }
        (addr & ADDR_MASK) as usize
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
