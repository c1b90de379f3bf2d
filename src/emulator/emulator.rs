//! The CHIP-8 machine as described at https://en.wikipedia.org/wiki/CHIP-8#Virtual_machine_description.

use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::emulator::cpu::{Bus, Cpu, Flow};
use crate::emulator::display::{Display, SpriteOverflow};
use crate::emulator::error::{EmulatorError, MachineState};
use crate::emulator::input::{DummyInput, EmulatorInput};
use crate::emulator::instruction::Instruction;
use crate::emulator::memory::Memory;
use crate::emulator::output::{DummyOutput, EmulatorOutput};
use crate::emulator::timer::{Hz, Timer};

/// Instructions per second when nothing else is asked for.
pub const DEFAULT_CYCLE_RATE: Hz = Hz(540);

/// Knobs a host may turn when creating an emulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmulatorConfig {
    /// Target instruction throughput. Timers always run at 60 Hz.
    pub cycle_rate: Hz,
    pub sprite_overflow: SpriteOverflow,
    /// Seed for `Cxnn`. Without one the generator is seeded from the OS.
    pub seed: Option<u64>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        EmulatorConfig {
            cycle_rate: DEFAULT_CYCLE_RATE,
            sprite_overflow: SpriteOverflow::default(),
            seed: None,
        }
    }
}

/// One interpreter instance. Owns every piece of machine state.
pub struct Emulator<I: EmulatorInput, O: EmulatorOutput> {
    cpu: Cpu,
    memory: Memory,
    display: Display,
    delay_timer: Timer,
    sound_timer: Timer,
    rng: StdRng,

    /// The last program image loaded, kept for `reset`.
    program: Vec<u8>,
    config: EmulatorConfig,
    buzzing: bool,

    input: I,
    output: O,
}

impl Emulator<DummyInput, DummyOutput> {
    /// Create a new emulator with dummy input and output
    pub fn new() -> Emulator<DummyInput, DummyOutput> {
        Emulator::with_io(DummyInput, DummyOutput::new())
    }
}

impl<I: EmulatorInput, O: EmulatorOutput> Emulator<I, O> {
    /// Create a new emulator with input and output
    pub fn with_io(input: I, output: O) -> Emulator<I, O> {
        Emulator::with_config(input, output, EmulatorConfig::default())
    }

    pub fn with_config(input: I, output: O, config: EmulatorConfig) -> Emulator<I, O> {
        Emulator {
            cpu: Cpu::new(),
            memory: Memory::new(),
            display: Display::new(config.sprite_overflow),
            delay_timer: Timer::default(),
            sound_timer: Timer::default(),
            rng: seeded_rng(config.seed),
            program: Vec::new(),
            config,
            buzzing: false,
            input,
            output,
        }
    }

    /// Restore the power-on state and copy a program into memory at 0x200.
    ///
    /// A program that does not fit is rejected and the machine is left as it was.
    pub fn load(&mut self, program: &[u8]) -> Result<(), EmulatorError> {
        Memory::check_program_size(program.len())?;

        self.power_on();
        self.memory.load_program(program)?;
        self.program = program.to_vec();
        Ok(())
    }

    /// Restore the power-on state and load the last program again.
    pub fn reset(&mut self) -> Result<(), EmulatorError> {
        log::debug!("Resetting, reloading {} bytes", self.program.len());

        self.power_on();
        self.memory.load_program(&self.program)
    }

    fn power_on(&mut self) {
        self.cpu.reset();
        self.memory.reset();
        self.display.clear();
        self.delay_timer = Timer::default();
        self.sound_timer = Timer::default();
        self.rng = seeded_rng(self.config.seed);
        self.sync_buzzer();
    }

    /// Fetch, decode and execute the instruction at the program counter.
    /// Timers are not touched, see `tick_timers`.
    pub fn step(&mut self) -> Result<Flow, EmulatorError> {
        let Emulator {
            cpu,
            memory,
            display,
            delay_timer,
            sound_timer,
            rng,
            input,
            ..
        } = self;
        let mut bus = Bus {
            memory,
            display,
            delay_timer,
            sound_timer,
            input: &*input,
            rng,
        };

        let flow = cpu.step(&mut bus)?;
        self.sync_buzzer();
        Ok(flow)
    }

    /// Execute a single instruction
    pub fn execute_single(&mut self, instruction: Instruction) -> Result<Flow, EmulatorError> {
        let Emulator {
            cpu,
            memory,
            display,
            delay_timer,
            sound_timer,
            rng,
            input,
            ..
        } = self;
        let mut bus = Bus {
            memory,
            display,
            delay_timer,
            sound_timer,
            input: &*input,
            rng,
        };

        let flow = cpu.execute(instruction, &mut bus)?;
        self.sync_buzzer();
        Ok(flow)
    }

    /// Execute instructions in order, stopping at the first error.
    pub fn execute_many(&mut self, instructions: &[Instruction]) -> Result<(), EmulatorError> {
        for &instruction in instructions {
            self.execute_single(instruction)?;
        }
        Ok(())
    }

    /// Count both timers down by one. Meant to be called at 60 Hz.
    pub fn tick_timers(&mut self) {
        self.delay_timer.tick();
        self.sound_timer.tick();
        self.sync_buzzer();
    }

    /// Hand the framebuffer to the output if it changed since the last present.
    /// Returns whether a frame was presented.
    pub fn present(&mut self) -> bool {
        if !self.display.needs_present() {
            return false;
        }
        self.output.present(&self.display);
        self.display.clear_present_flag();
        true
    }

    fn sync_buzzer(&mut self) {
        let active = self.sound_timer.is_active();
        if active != self.buzzing {
            self.buzzing = active;
            self.output.buzz(active);
        }
    }

    pub fn state(&self) -> MachineState {
        self.cpu.state(&self.delay_timer, &self.sound_timer)
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer.value()
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer.value()
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn output(&self) -> &O {
        &self.output
    }
}

impl Default for Emulator<DummyInput, DummyOutput> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: EmulatorInput, O: EmulatorOutput> fmt::Display for Emulator<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.display, f)
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::input::Keypad;
    use crate::emulator::instruction::{Addr, Const, Reg};
    use crate::emulator::memory::PROGRAM_START;
    use pretty_assertions::assert_eq;

    fn seeded(seed: u64) -> Emulator<DummyInput, DummyOutput> {
        let config = EmulatorConfig {
            seed: Some(seed),
            ..EmulatorConfig::default()
        };
        Emulator::with_config(DummyInput, DummyOutput::new(), config)
    }

    #[test]
    fn goto_goes_to() {
        let mut emulator = Emulator::new();
        emulator.execute_single(Instruction::Goto(Addr(0x250))).unwrap();
        assert_eq!(emulator.cpu().pc(), 0x250);
    }

    #[test]
    fn return_after_call_is_neutral() {
        let mut emulator = Emulator::new();
        assert_eq!(emulator.cpu().pc(), 0x200);

        let program = [
            0x22, 0x06, // 0x200, call 0x206
            0x00, 0x00, // 0x202
            0x00, 0x00, // 0x204
            0x00, 0xEE, // 0x206, return
        ];
        emulator.load(&program).unwrap();

        emulator.step().unwrap();
        assert_eq!(emulator.cpu().pc(), 0x206);
        emulator.step().unwrap();
        assert_eq!(emulator.cpu().pc(), 0x202);
    }

    #[test]
    fn execute_many_runs_in_order() {
        let mut emulator = Emulator::new();
        emulator
            .execute_many(&[
                Instruction::Goto(Addr(0x250)),
                Instruction::SetRegToConst(Reg(0xA), Const(35)),
                Instruction::SetRegToReg(Reg(0xB), Reg(0xA)),
            ])
            .unwrap();

        assert_eq!(emulator.cpu().pc(), 0x254);
        assert_eq!(emulator.cpu().register(0xB), 35);
    }

    #[test]
    fn oversized_program_is_rejected() {
        let mut emulator = Emulator::new();
        emulator.load(&[0x12, 0x00]).unwrap();

        let too_big = vec![0xAA; 0x1000 - 0x200 + 1];
        assert_eq!(
            emulator.load(&too_big),
            Err(EmulatorError::ProgramTooLarge {
                size: too_big.len(),
                capacity: 0xE00
            })
        );
        assert_eq!(emulator.memory().read_byte(PROGRAM_START), 0x12);
        assert_eq!(emulator.memory().read_byte(0xFFF), 0x00);
    }

    #[test]
    fn rejected_load_keeps_the_running_machine() {
        let mut emulator = Emulator::new();
        emulator.load(&[0x6A, 0x07, 0x13, 0x00]).unwrap();
        emulator.step().unwrap();
        emulator.step().unwrap();

        let too_big = vec![0xAA; 0x1000 - 0x200 + 1];
        assert!(emulator.load(&too_big).is_err());
        assert_eq!(emulator.cpu().pc(), 0x300);
        assert_eq!(emulator.cpu().register(0xA), 7);
    }

    #[test]
    fn second_load_starts_from_power_on() {
        let mut emulator = Emulator::new();
        emulator.load(&[0x60, 0x01, 0x61, 0x02]).unwrap();
        emulator.step().unwrap();
        emulator.step().unwrap();

        emulator.load(&[0x62, 0x03]).unwrap();
        let after_load = emulator.state();
        let memory_after_load: Vec<u8> = emulator.memory().read_wrapping(0, 0x1000).collect();

        assert_eq!(emulator.memory().read_byte(0x202), 0x00);
        assert_eq!(after_load.pc, 0x200);
        assert_eq!(after_load.registers, [0; 16]);

        // A reset of the same program lands in exactly the same place
        emulator.reset().unwrap();
        assert_eq!(emulator.state(), after_load);
        let memory_after_reset: Vec<u8> = emulator.memory().read_wrapping(0, 0x1000).collect();
        assert_eq!(memory_after_reset, memory_after_load);
    }

    #[test]
    fn load_after_a_jump_starts_at_program_start() {
        let mut emulator = Emulator::new();
        emulator.load(&[0x13, 0x00]).unwrap();
        emulator.step().unwrap();
        assert_eq!(emulator.cpu().pc(), 0x300);

        emulator.load(&[0x60, 0x05]).unwrap();
        assert_eq!(emulator.cpu().pc(), 0x200);
        emulator.step().unwrap();
        assert_eq!(emulator.cpu().register(0x0), 5);
    }

    #[test]
    fn clipped_sprites_end_to_end() {
        let config = EmulatorConfig {
            sprite_overflow: SpriteOverflow::Clip,
            ..EmulatorConfig::default()
        };
        let mut emulator = Emulator::with_config(DummyInput, DummyOutput::new(), config);
        emulator
            .load(&[
                0x60, 0x00, // V0 = 0
                0x61, 0x1E, // V1 = 30
                0xA2, 0x0A, // I = 0x20A
                0xD0, 0x14, // draw 4 rows at (0, 30)
                0x12, 0x08, // spin
                0x80, 0x80, 0x80, 0x80, // sprite at 0x20A
            ])
            .unwrap();
        for _ in 0..4 {
            emulator.step().unwrap();
        }

        assert!(emulator.display().pixel(0, 30));
        assert!(emulator.display().pixel(0, 31));
        assert!(!emulator.display().pixel(0, 0));
        assert!(!emulator.display().pixel(0, 1));
        assert_eq!(emulator.cpu().register(0xF), 0);
    }

    #[test]
    fn reset_restores_power_on_state_and_reloads() {
        let mut emulator = Emulator::new();
        emulator
            .load(&[
                0x60, 0x2A, // V0 = 42
                0xF0, 0x15, // DT = V0
                0xA3, 0x00, // I = 0x300
                0xF0, 0x55, // store V0 at I
            ])
            .unwrap();
        for _ in 0..4 {
            emulator.step().unwrap();
        }
        assert_eq!(emulator.memory().read_byte(0x300), 42);
        assert_eq!(emulator.delay_timer(), 42);

        emulator.reset().unwrap();

        let state = emulator.state();
        assert_eq!(state.pc, 0x200);
        assert_eq!(state.registers, [0; 16]);
        assert_eq!(state.i, 0);
        assert_eq!(state.delay_timer, 0);
        assert_eq!(emulator.memory().read_byte(0x300), 0);
        assert_eq!(emulator.memory().read_byte(0x200), 0x60);
        assert!(emulator.display().needs_present());
    }

    #[test]
    fn buzzer_follows_sound_timer() {
        let mut emulator = Emulator::new();
        emulator.execute_single(Instruction::SetRegToConst(Reg(0x1), Const(2))).unwrap();
        emulator.execute_single(Instruction::SetSoundTimerToReg(Reg(0x1))).unwrap();
        assert!(emulator.output().is_buzzing());

        emulator.tick_timers();
        assert!(emulator.output().is_buzzing());
        emulator.tick_timers();
        assert!(!emulator.output().is_buzzing());
        assert_eq!(emulator.sound_timer(), 0);
    }

    #[test]
    fn present_only_when_needed() {
        let mut emulator = Emulator::new();
        assert!(emulator.present());
        assert!(!emulator.present());

        emulator.execute_single(Instruction::ClearScreen).unwrap();
        assert!(emulator.present());
        assert_eq!(emulator.output().presents(), 2);
        assert_eq!(emulator.output().frame(), Some(emulator.to_string().as_str()));
    }

    #[test]
    fn same_seed_same_randomness() {
        let roll = |emulator: &mut Emulator<DummyInput, DummyOutput>| {
            (0..8)
                .map(|_| {
                    emulator
                        .execute_single(Instruction::SetRegToRand(Reg(0), Const(0xFF)))
                        .unwrap();
                    emulator.cpu().register(0)
                })
                .collect::<Vec<u8>>()
        };

        let mut a = seeded(99);
        let mut b = seeded(99);
        let first = roll(&mut a);
        assert_eq!(first, roll(&mut b));

        // Reset reseeds
        a.reset().unwrap();
        assert_eq!(first, roll(&mut a));
    }

    #[test]
    fn host_keypad_is_seen_by_the_program() {
        let mut emulator = Emulator::with_io(Keypad::new(), DummyOutput::new());
        emulator.load(&[0xF5, 0x0A]).unwrap();

        assert_eq!(emulator.step(), Ok(Flow::KeyWait));
        assert_eq!(emulator.cpu().pc(), 0x200);

        emulator.input_mut().set(0x4, true);
        assert_eq!(emulator.step(), Ok(Flow::Continue));
        assert_eq!(emulator.cpu().register(0x5), 0x4);
        assert_eq!(emulator.cpu().pc(), 0x202);
    }

    #[test]
    fn instances_do_not_share_state() {
        let mut a = Emulator::new();
        let b = Emulator::new();
        a.execute_single(Instruction::SetI(Addr(0x123))).unwrap();
        assert_eq!(a.cpu().i(), 0x123);
        assert_eq!(b.cpu().i(), 0);
    }
}
