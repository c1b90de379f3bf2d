//! Errors raised while loading or running a program.

use std::fmt;
use thiserror::Error;

use super::cpu::{NUM_REGISTERS, STACK_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EmulatorError {
    /// The program image does not fit between 0x200 and the end of memory.
    #[error("program of {size} bytes does not fit in {capacity} bytes of program memory")]
    ProgramTooLarge { size: usize, capacity: usize },

    #[error("unknown opcode {opcode:#06X} at {pc:#05X}")]
    UnknownOpcode { opcode: u16, pc: u16 },

    #[error("call stack overflow at {pc:#05X}")]
    StackOverflow { pc: u16 },

    #[error("return with an empty call stack at {pc:#05X}")]
    StackUnderflow { pc: u16 },
}

impl EmulatorError {
    /// Whether the error ends the current run.
    ///
    /// A rejected program image leaves the machine usable,
    /// everything else means the running program is corrupt.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EmulatorError::ProgramTooLarge { .. })
    }
}

/// A copy of every architectural register, taken for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineState {
    pub pc: u16,
    pub registers: [u8; NUM_REGISTERS],
    pub i: u16,
    pub stack_pointer: u8,
    pub stack: [u16; STACK_SIZE],
    pub delay_timer: u8,
    pub sound_timer: u8,
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "PC={:#05X} I={:#05X} SP={} DT={} ST={}",
            self.pc, self.i, self.stack_pointer, self.delay_timer, self.sound_timer
        )?;
        for (idx, value) in self.registers.iter().enumerate() {
            if idx > 0 {
                write!(f, " ")?;
            }
            write!(f, "V{:X}={:02X}", idx, value)?;
        }
        writeln!(f)?;
        write!(f, "stack:")?;
        for addr in &self.stack[..self.stack_pointer as usize] {
            write!(f, " {:#05X}", addr)?;
        }
        Ok(())
    }
}

/// The scheduler stopped on a fatal error.
///
/// The error is part of the message, so it is not reported as a source as well.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error}\n{state}")]
pub struct Halt {
    pub error: EmulatorError,
    pub state: MachineState,
}
