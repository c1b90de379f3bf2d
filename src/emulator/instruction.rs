use crate::emulator::error::EmulatorError;
use crate::util::bit_splitter::BitSplitter;

/// A 12-bit address immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addr(pub u16);

/// A register index, 0x0 to 0xF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reg(pub u8);

/// A byte or nibble immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Const(pub u8);

/// A single instruction from the CHIP-8 instruction set.
///
/// The comment after each variant is its encoding, where
/// - NNN: address
/// - NN: 8-bit constant
/// - N: 4-bit constant
/// - X and Y: 4-bit register identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    ClearScreen,                // 00E0
    Return,                     // 00EE
    Goto(Addr),                 // 1NNN
    Call(Addr),                 // 2NNN
    IfRegEqConst(Reg, Const),   // 3XNN
    IfRegNeqConst(Reg, Const),  // 4XNN
    IfRegEqReg(Reg, Reg),       // 5XY0
    SetRegToConst(Reg, Const),  // 6XNN
    IncRegByConst(Reg, Const),  // 7XNN
    SetRegToReg(Reg, Reg),      // 8XY0
    BitwiseOr(Reg, Reg),        // 8XY1
    BitwiseAnd(Reg, Reg),       // 8XY2
    BitwiseXor(Reg, Reg),       // 8XY3
    IncRegByReg(Reg, Reg),      // 8XY4
    DecRegByReg(Reg, Reg),      // 8XY5
    BitshiftRight(Reg),         // 8XY6
    SetVxVyMinusVx(Reg, Reg),   // 8XY7
    BitshiftLeft(Reg),          // 8XYE
    IfRegNeqReg(Reg, Reg),      // 9XY0
    SetI(Addr),                 // ANNN
    GotoV0PlusAddr(Addr),       // BNNN
    SetRegToRand(Reg, Const),   // CXNN
    Draw(Reg, Reg, Const),      // DXYN
    IfKeyHeld(Reg),             // EX9E
    IfKeyNotHeld(Reg),          // EXA1
    SetRegToDelayTimer(Reg),    // FX07
    WaitForKey(Reg),            // FX0A
    SetDelayTimerToReg(Reg),    // FX15
    SetSoundTimerToReg(Reg),    // FX18
    AddRegToI(Reg),             // FX1E
    SetIToGlyph(Reg),           // FX29
    StoreBcd(Reg),              // FX33
    RegDump(Reg),               // FX55
    RegLoad(Reg),               // FX65
}

impl Instruction {
    /// Decode a word fetched from `pc`.
    ///
    /// `pc` is only used to report where an unknown opcode was found.
    pub fn decode(word: u16, pc: u16) -> Result<Instruction, EmulatorError> {
        let opcode = BitSplitter::from_u16(word);
        let nnn = Addr(opcode.nnn());
        let nn = Const(opcode.nn());

        let instruction = match opcode.as_four_u8() {
            (0x0, _, _, _) => match opcode.nnn() {
                0x0E0 => Instruction::ClearScreen,
                0x0EE => Instruction::Return,
                _ => return Err(EmulatorError::UnknownOpcode { opcode: word, pc }),
            },
            (0x1, _, _, _) => Instruction::Goto(nnn),
            (0x2, _, _, _) => Instruction::Call(nnn),
            (0x3, x, _, _) => Instruction::IfRegEqConst(Reg(x), nn),
            (0x4, x, _, _) => Instruction::IfRegNeqConst(Reg(x), nn),
            (0x5, x, y, 0x0) => Instruction::IfRegEqReg(Reg(x), Reg(y)),
            (0x6, x, _, _) => Instruction::SetRegToConst(Reg(x), nn),
            (0x7, x, _, _) => Instruction::IncRegByConst(Reg(x), nn),
            (0x8, x, y, n) => match n {
                0x0 => Instruction::SetRegToReg(Reg(x), Reg(y)),
                0x1 => Instruction::BitwiseOr(Reg(x), Reg(y)),
                0x2 => Instruction::BitwiseAnd(Reg(x), Reg(y)),
                0x3 => Instruction::BitwiseXor(Reg(x), Reg(y)),
                0x4 => Instruction::IncRegByReg(Reg(x), Reg(y)),
                0x5 => Instruction::DecRegByReg(Reg(x), Reg(y)),
                0x6 => Instruction::BitshiftRight(Reg(x)),
                0x7 => Instruction::SetVxVyMinusVx(Reg(x), Reg(y)),
                0xE => Instruction::BitshiftLeft(Reg(x)),
                _ => return Err(EmulatorError::UnknownOpcode { opcode: word, pc }),
            },
            (0x9, x, y, 0x0) => Instruction::IfRegNeqReg(Reg(x), Reg(y)),
            (0xA, _, _, _) => Instruction::SetI(nnn),
            (0xB, _, _, _) => Instruction::GotoV0PlusAddr(nnn),
            (0xC, x, _, _) => Instruction::SetRegToRand(Reg(x), nn),
            (0xD, x, y, n) => Instruction::Draw(Reg(x), Reg(y), Const(n)),
            (0xE, x, _, _) => match opcode.nn() {
                0x9E => Instruction::IfKeyHeld(Reg(x)),
                0xA1 => Instruction::IfKeyNotHeld(Reg(x)),
                _ => return Err(EmulatorError::UnknownOpcode { opcode: word, pc }),
            },
            (0xF, x, _, _) => match opcode.nn() {
                0x07 => Instruction::SetRegToDelayTimer(Reg(x)),
                0x0A => Instruction::WaitForKey(Reg(x)),
                0x15 => Instruction::SetDelayTimerToReg(Reg(x)),
                0x18 => Instruction::SetSoundTimerToReg(Reg(x)),
                0x1E => Instruction::AddRegToI(Reg(x)),
                0x29 => Instruction::SetIToGlyph(Reg(x)),
                0x33 => Instruction::StoreBcd(Reg(x)),
                0x55 => Instruction::RegDump(Reg(x)),
                0x65 => Instruction::RegLoad(Reg(x)),
                _ => return Err(EmulatorError::UnknownOpcode { opcode: word, pc }),
            },
            _ => return Err(EmulatorError::UnknownOpcode { opcode: word, pc }),
        };

        Ok(instruction)
    }

    /// Decode without a known location. Handy for tests and tooling.
    pub fn from_u16(word: u16) -> Result<Instruction, EmulatorError> {
        Instruction::decode(word, 0)
    }
}
