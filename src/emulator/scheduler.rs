//! Paces instruction cycles and timer ticks against wall-clock time.

use std::thread;
use std::time::{Duration, Instant};

use crate::emulator::emulator::Emulator;
use crate::emulator::error::Halt;
use crate::emulator::input::EmulatorInput;
use crate::emulator::output::EmulatorOutput;
use crate::emulator::timer::{Hz, Pacer, TIMER_RATE};

/// What happened during one call to `Scheduler::run_for`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub cycles: u64,
    pub timer_ticks: u64,
    pub presented: bool,
}

pub struct Scheduler {
    cycles: Pacer,
    timers: Pacer,
}

impl Scheduler {
    pub fn new(cycle_rate: Hz) -> Scheduler {
        Scheduler {
            cycles: Pacer::new(cycle_rate),
            timers: Pacer::new(TIMER_RATE),
        }
    }

    /// A scheduler running at the rate the emulator was configured with.
    pub fn for_emulator<I: EmulatorInput, O: EmulatorOutput>(emulator: &Emulator<I, O>) -> Scheduler {
        Scheduler::new(emulator.config().cycle_rate)
    }

    /// Run every cycle and timer tick that falls due within `elapsed` more time,
    /// in the order they fall due, then present the display if it changed.
    ///
    /// A fatal error stops the run between cycles and is returned together
    /// with the machine state at the failing instruction.
    pub fn run_for<I: EmulatorInput, O: EmulatorOutput>(
        &mut self,
        emulator: &mut Emulator<I, O>,
        elapsed: Duration,
    ) -> Result<RunReport, Halt> {
        self.cycles.advance(elapsed);
        self.timers.advance(elapsed);

        let mut report = RunReport::default();
        loop {
            let cycle_due = self.cycles.pending() > 0;
            let tick_due = self.timers.pending() > 0;

            // Ties go to the instruction
            let run_cycle = match (cycle_due, tick_due) {
                (false, false) => break,
                (true, false) => true,
                (false, true) => false,
                (true, true) => self.cycles.next_deadline() <= self.timers.next_deadline(),
            };

            if run_cycle {
                self.cycles.fire();
                match emulator.step() {
                    Ok(_) => report.cycles += 1,
                    Err(error) if error.is_fatal() => {
                        let halt = Halt {
                            error,
                            state: emulator.state(),
                        };
                        log::error!("Halted: {}", halt);
                        return Err(halt);
                    }
                    Err(error) => log::warn!("{}", error),
                }
            } else {
                self.timers.fire();
                emulator.tick_timers();
                report.timer_ticks += 1;
            }
        }

        report.presented = emulator.present();
        Ok(report)
    }

    /// Run in real time until `keep_running` returns `false` or the program halts.
    ///
    /// `keep_running` is called between slices of cycles, which is where
    /// a host updates the keypad or resets the machine.
    pub fn run<I, O, F>(&mut self, emulator: &mut Emulator<I, O>, mut keep_running: F) -> Result<(), Halt>
    where
        I: EmulatorInput,
        O: EmulatorOutput,
        F: FnMut(&mut Emulator<I, O>) -> bool,
    {
        let mut last = Instant::now();
        while keep_running(emulator) {
            let now = Instant::now();
            self.run_for(emulator, now.duration_since(last))?;
            last = now;
            thread::sleep(self.until_next());
        }
        Ok(())
    }

    /// Time until the next cycle or timer tick falls due.
    pub fn until_next(&self) -> Duration {
        self.cycles.until_next().min(self.timers.until_next())
    }

    /// Forget all elapsed time, for instance after the emulator was reset.
    pub fn reset(&mut self) {
        self.cycles.reset();
        self.timers.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::error::EmulatorError;
    use crate::emulator::input::DummyInput;
    use crate::emulator::output::DummyOutput;
    use pretty_assertions::assert_eq;

    fn emulator_with(program: &[u8]) -> Emulator<DummyInput, DummyOutput> {
        let mut emulator = Emulator::new();
        emulator.load(program).unwrap();
        emulator
    }

    const SET_DT_THEN_SPIN: [u8; 6] = [
        0x60, 0xC8, // V0 = 200
        0xF0, 0x15, // DT = V0
        0x12, 0x04, // spin at 0x204
    ];

    #[test]
    fn one_second_takes_60_off_the_delay_timer() {
        let mut emulator = emulator_with(&SET_DT_THEN_SPIN);
        let mut scheduler = Scheduler::new(Hz(540));

        let report = scheduler.run_for(&mut emulator, Duration::from_secs(1)).unwrap();

        assert_eq!(report.cycles, 540);
        assert_eq!(report.timer_ticks, 60);
        assert_eq!(emulator.delay_timer(), 140);
    }

    #[test]
    fn many_small_slices_match_one_large_one() {
        let mut emulator = emulator_with(&SET_DT_THEN_SPIN);
        let mut scheduler = Scheduler::new(Hz(500));

        let mut cycles = 0;
        let mut ticks = 0;
        for _ in 0..1000 {
            let report = scheduler.run_for(&mut emulator, Duration::from_millis(1)).unwrap();
            cycles += report.cycles;
            ticks += report.timer_ticks;
        }

        assert_eq!(cycles, 500);
        assert_eq!(ticks, 60);
        assert_eq!(emulator.delay_timer(), 140);
    }

    #[test]
    fn timer_rate_does_not_depend_on_cycle_rate() {
        let mut emulator = emulator_with(&SET_DT_THEN_SPIN);
        let mut scheduler = Scheduler::new(Hz(2000));

        scheduler.run_for(&mut emulator, Duration::from_millis(500)).unwrap();
        assert_eq!(emulator.delay_timer(), 170);
    }

    #[test]
    fn jump_lands_exactly_on_target() {
        let mut emulator = emulator_with(&[0x13, 0x00]);
        let mut scheduler = Scheduler::new(Hz(1000));

        let report = scheduler.run_for(&mut emulator, Duration::from_millis(1)).unwrap();
        assert_eq!(report.cycles, 1);
        assert_eq!(emulator.cpu().pc(), 0x300);
    }

    #[test]
    fn presents_only_when_the_display_changed() {
        let mut emulator = emulator_with(&[0x12, 0x00]);
        let mut scheduler = Scheduler::new(Hz(540));

        let first = scheduler.run_for(&mut emulator, Duration::from_millis(20)).unwrap();
        let second = scheduler.run_for(&mut emulator, Duration::from_millis(20)).unwrap();

        assert!(first.presented);
        assert!(!second.presented);
        assert_eq!(emulator.output().presents(), 1);
    }

    #[test]
    fn fatal_error_halts_with_state() {
        let mut emulator = emulator_with(&[
            0x6A, 0x07, // VA = 7
            0x00, 0xEE, // return with nothing on the stack
            0x6A, 0x08, // never reached
        ]);
        let mut scheduler = Scheduler::new(Hz(1000));

        let halt = scheduler
            .run_for(&mut emulator, Duration::from_millis(10))
            .unwrap_err();

        assert_eq!(halt.error, EmulatorError::StackUnderflow { pc: 0x202 });
        assert_eq!(halt.state.pc, 0x202);
        assert_eq!(halt.state.registers[0xA], 7);
        assert_eq!(emulator.cpu().register(0xA), 7);
    }

    #[test]
    fn unknown_opcode_halts() {
        let mut emulator = emulator_with(&[0xFF, 0xFF]);
        let mut scheduler = Scheduler::new(Hz(540));

        let halt = scheduler.run_for(&mut emulator, Duration::from_secs(1)).unwrap_err();
        assert_eq!(
            halt.error,
            EmulatorError::UnknownOpcode {
                opcode: 0xFFFF,
                pc: 0x200
            }
        );
    }

    #[test]
    fn run_stops_when_asked() {
        let mut emulator = emulator_with(&[0x12, 0x00]);
        let mut scheduler = Scheduler::new(Hz(540));

        let mut rounds = 0;
        scheduler
            .run(&mut emulator, |_| {
                rounds += 1;
                rounds <= 3
            })
            .unwrap();
        assert_eq!(rounds, 4);
    }

    #[test]
    fn until_next_is_bounded_by_the_faster_rate() {
        let scheduler = Scheduler::new(Hz(1000));
        assert_eq!(scheduler.until_next(), Duration::from_millis(1));
    }
}
