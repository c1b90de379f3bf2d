//! Register file, call stack and the instruction semantics.

use rand::{Rng, RngCore};

use crate::emulator::display::Display;
use crate::emulator::error::{EmulatorError, MachineState};
use crate::emulator::input::EmulatorInput;
use crate::emulator::instruction::*;
use crate::emulator::memory::{Memory, ADDR_MASK, PROGRAM_START};
use crate::emulator::timer::Timer;

pub const NUM_REGISTERS: usize = 16;
pub const STACK_SIZE: usize = 16;
const INSTRUCTION_SIZE: u16 = 2;
const FLAG: usize = 0xF;
const MAX_SPRITE_HEIGHT: usize = 15;

/// What a cycle did, for the benefit of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The program counter was set by the instruction.
    Jump,
    /// The framebuffer changed.
    Draw,
    /// `Fx0A` is waiting for a key and will run again next cycle.
    KeyWait,
}

/// Everything outside the CPU that an instruction may touch.
pub struct Bus<'a> {
    pub memory: &'a mut Memory,
    pub display: &'a mut Display,
    pub delay_timer: &'a mut Timer,
    pub sound_timer: &'a mut Timer,
    pub input: &'a dyn EmulatorInput,
    pub rng: &'a mut dyn RngCore,
}

pub struct Cpu {
    registers: [u8; NUM_REGISTERS],
    i: u16,
    program_counter: u16,
    stack_pointer: u8,
    stack: [u16; STACK_SIZE],
    /// Cleared by instructions that set the program counter themselves.
    /// Valid for one cycle only.
    advance: bool,
}

impl Cpu {
    pub fn new() -> Cpu {
        Cpu {
            registers: [0; NUM_REGISTERS],
            i: 0,
            program_counter: PROGRAM_START,
            stack_pointer: 0,
            stack: [0; STACK_SIZE],
            advance: true,
        }
    }

    pub fn reset(&mut self) {
        *self = Cpu::new();
    }

    /// Fetch, decode and execute the instruction at the program counter.
    ///
    /// On error the program counter is left pointing at the failing instruction.
    pub fn step(&mut self, bus: &mut Bus<'_>) -> Result<Flow, EmulatorError> {
        let pc = self.program_counter;
        let word = bus.memory.fetch_instruction(pc);
        let instruction = Instruction::decode(word, pc)?;

        log::trace!("{:#05X}: {:04X} {:?}", pc, word, instruction);

        self.execute(instruction, bus)
    }

    /// Execute a single instruction as if it was fetched from the program counter.
    pub fn execute(
        &mut self,
        instruction: Instruction,
        bus: &mut Bus<'_>,
    ) -> Result<Flow, EmulatorError> {
        self.advance = true;
        let flow = self.dispatch(instruction, bus)?;
        if self.advance {
            self.program_counter = self.program_counter.wrapping_add(INSTRUCTION_SIZE) & ADDR_MASK;
        }
        self.advance = true;
        Ok(flow)
    }

    fn dispatch(&mut self, instruction: Instruction, bus: &mut Bus<'_>) -> Result<Flow, EmulatorError> {
        let pc = self.program_counter;

        match instruction {
            Instruction::ClearScreen => {
                bus.display.clear();
                return Ok(Flow::Draw);
            }

            // Pop the return address pushed by Call
            Instruction::Return => {
                if self.stack_pointer == 0 {
                    return Err(EmulatorError::StackUnderflow { pc });
                }
                self.stack_pointer -= 1;
                self.jump(self.stack[self.stack_pointer as usize]);
                return Ok(Flow::Jump);
            }

            Instruction::Goto(Addr(addr)) => {
                self.jump(addr);
                return Ok(Flow::Jump);
            }

            // Push the address of the next instruction, then jump
            Instruction::Call(Addr(addr)) => {
                if self.stack_pointer as usize >= STACK_SIZE {
                    return Err(EmulatorError::StackOverflow { pc });
                }
                self.stack[self.stack_pointer as usize] = pc.wrapping_add(INSTRUCTION_SIZE) & ADDR_MASK;
                self.stack_pointer += 1;
                self.jump(addr);
                return Ok(Flow::Jump);
            }

            Instruction::IfRegEqConst(Reg(x), Const(n)) => {
                self.skip_if(self.v(x) == n);
            }

            Instruction::IfRegNeqConst(Reg(x), Const(n)) => {
                self.skip_if(self.v(x) != n);
            }

            Instruction::IfRegEqReg(Reg(x), Reg(y)) => {
                self.skip_if(self.v(x) == self.v(y));
            }

            Instruction::SetRegToConst(Reg(x), Const(n)) => {
                self.set_v(x, n);
            }

            // No carry flag for the immediate form
            Instruction::IncRegByConst(Reg(x), Const(n)) => {
                self.set_v(x, self.v(x).wrapping_add(n));
            }

            Instruction::SetRegToReg(Reg(x), Reg(y)) => {
                self.set_v(x, self.v(y));
            }

            Instruction::BitwiseOr(Reg(x), Reg(y)) => {
                self.set_v(x, self.v(x) | self.v(y));
            }

            Instruction::BitwiseAnd(Reg(x), Reg(y)) => {
                self.set_v(x, self.v(x) & self.v(y));
            }

            Instruction::BitwiseXor(Reg(x), Reg(y)) => {
                self.set_v(x, self.v(x) ^ self.v(y));
            }

            // The flag is written after the result, so VF holds the flag even when X is F.
            Instruction::IncRegByReg(Reg(x), Reg(y)) => {
                let (sum, carry) = self.v(x).overflowing_add(self.v(y));
                self.set_v(x, sum);
                self.set_flag(carry);
            }

            // VF is 1 when there is no borrow
            Instruction::DecRegByReg(Reg(x), Reg(y)) => {
                let (vx, vy) = (self.v(x), self.v(y));
                self.set_v(x, vx.wrapping_sub(vy));
                self.set_flag(vx >= vy);
            }

            Instruction::BitshiftRight(Reg(x)) => {
                let vx = self.v(x);
                self.set_v(x, vx >> 1);
                self.set_flag(vx & 0x01 != 0);
            }

            Instruction::SetVxVyMinusVx(Reg(x), Reg(y)) => {
                let (vx, vy) = (self.v(x), self.v(y));
                self.set_v(x, vy.wrapping_sub(vx));
                self.set_flag(vy >= vx);
            }

            Instruction::BitshiftLeft(Reg(x)) => {
                let vx = self.v(x);
                self.set_v(x, vx << 1);
                self.set_flag(vx & 0x80 != 0);
            }

            Instruction::IfRegNeqReg(Reg(x), Reg(y)) => {
                self.skip_if(self.v(x) != self.v(y));
            }

            Instruction::SetI(Addr(addr)) => {
                self.i = addr & ADDR_MASK;
            }

            Instruction::GotoV0PlusAddr(Addr(addr)) => {
                self.jump(addr.wrapping_add(self.v(0) as u16));
                return Ok(Flow::Jump);
            }

            Instruction::SetRegToRand(Reg(x), Const(n)) => {
                let random: u8 = bus.rng.gen();
                self.set_v(x, random & n);
            }

            // Sprite rows are read from I onwards, wrapping at the end of memory
            Instruction::Draw(Reg(x), Reg(y), Const(height)) => {
                let height = (height as usize).min(MAX_SPRITE_HEIGHT);
                let mut rows = [0; MAX_SPRITE_HEIGHT];
                for (row, byte) in rows.iter_mut().zip(bus.memory.read_wrapping(self.i, height)) {
                    *row = byte;
                }

                let collision = bus.display.draw_sprite(self.v(x), self.v(y), &rows[..height]);
                self.set_flag(collision);
                return Ok(Flow::Draw);
            }

            Instruction::IfKeyHeld(Reg(x)) => {
                self.skip_if(bus.input.is_held(self.v(x)));
            }

            Instruction::IfKeyNotHeld(Reg(x)) => {
                self.skip_if(!bus.input.is_held(self.v(x)));
            }

            Instruction::SetRegToDelayTimer(Reg(x)) => {
                self.set_v(x, bus.delay_timer.value());
            }

            // Re-run this instruction every cycle until a key is held
            Instruction::WaitForKey(Reg(x)) => match bus.input.any_held() {
                Some(key) => self.set_v(x, key),
                None => {
                    self.advance = false;
                    return Ok(Flow::KeyWait);
                }
            },

            Instruction::SetDelayTimerToReg(Reg(x)) => {
                bus.delay_timer.set(self.v(x));
            }

            Instruction::SetSoundTimerToReg(Reg(x)) => {
                bus.sound_timer.set(self.v(x));
            }

            Instruction::AddRegToI(Reg(x)) => {
                let sum = self.i + self.v(x) as u16;
                self.i = sum & ADDR_MASK;
                self.set_flag(sum > ADDR_MASK);
            }

            Instruction::SetIToGlyph(Reg(x)) => {
                self.i = Memory::glyph_address(self.v(x));
            }

            Instruction::StoreBcd(Reg(x)) => {
                let value = self.v(x);
                let digits = [value / 100, value / 10 % 10, value % 10];
                for (offset, digit) in digits.iter().enumerate() {
                    bus.memory.write_byte(self.i_offset(offset), *digit);
                }
            }

            // Store V0..=VX at I. I itself is not changed.
            Instruction::RegDump(Reg(x)) => {
                for reg_no in 0..=(x & 0x0F) as usize {
                    bus.memory.write_byte(self.i_offset(reg_no), self.registers[reg_no]);
                }
            }

            Instruction::RegLoad(Reg(x)) => {
                for reg_no in 0..=(x & 0x0F) as usize {
                    self.registers[reg_no] = bus.memory.read_byte(self.i_offset(reg_no));
                }
            }
        };

        Ok(Flow::Continue)
    }

    fn jump(&mut self, addr: u16) {
        self.program_counter = addr & ADDR_MASK;
        self.advance = false;
    }

    /// Step over the next instruction. The regular advance still follows.
    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.program_counter = self.program_counter.wrapping_add(INSTRUCTION_SIZE) & ADDR_MASK;
        }
    }

    fn v(&self, reg: u8) -> u8 {
        self.registers[(reg & 0x0F) as usize]
    }

    fn set_v(&mut self, reg: u8, value: u8) {
        self.registers[(reg & 0x0F) as usize] = value;
    }

    fn set_flag(&mut self, flag: bool) {
        self.registers[FLAG] = flag as u8;
    }

    fn i_offset(&self, offset: usize) -> u16 {
        self.i.wrapping_add(offset as u16) & ADDR_MASK
    }

    pub fn pc(&self) -> u16 {
        self.program_counter
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn register(&self, reg: u8) -> u8 {
        self.registers[(reg & 0x0F) as usize]
    }

    pub fn registers(&self) -> &[u8; NUM_REGISTERS] {
        &self.registers
    }

    pub fn stack_pointer(&self) -> u8 {
        self.stack_pointer
    }

    /// Snapshot of the registers, together with the timers the CPU does not own.
    pub fn state(&self, delay_timer: &Timer, sound_timer: &Timer) -> MachineState {
        MachineState {
            pc: self.program_counter,
            registers: self.registers,
            i: self.i,
            stack_pointer: self.stack_pointer,
            stack: self.stack,
            delay_timer: delay_timer.value(),
            sound_timer: sound_timer.value(),
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
