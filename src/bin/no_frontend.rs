use std::path::PathBuf;
use std::time::Duration;

use anyhow::{ensure, Context};
use structopt::StructOpt;

use chip8_vm::emulator::display::SpriteOverflow;
use chip8_vm::emulator::timer::{Hz, TIMER_RATE};
use chip8_vm::emulator::{input::DummyInput, output::DummyOutput};
use chip8_vm::emulator::{Emulator, EmulatorConfig, Scheduler};

/// Longest simulated run accepted by `--seconds`.
const MAX_SECONDS: f64 = 1.0e9;

/// Run a program without a screen or keyboard, then print the final frame.
#[derive(StructOpt)]
struct Opt {
    /// The program to execute
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// Simulated seconds to run for
    #[structopt(long, default_value = "5")]
    seconds: f64,

    /// Instructions per second
    #[structopt(short, long, default_value = "540")]
    rate: u32,

    /// Drop sprite rows below the bottom edge instead of wrapping them to the top
    #[structopt(long)]
    clip_sprites: bool,

    /// Seed for the random number generator
    #[structopt(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    // Get configuration and read input file
    let opt = Opt::from_args();
    let total = simulated_duration(opt.seconds)?;
    log::info!("Executing {:?} for {}s", &opt.input, opt.seconds);
    let program = std::fs::read(&opt.input).with_context(|| format!("could not read {:?}", opt.input))?;

    let config = EmulatorConfig {
        cycle_rate: Hz(opt.rate),
        sprite_overflow: if opt.clip_sprites {
            SpriteOverflow::Clip
        } else {
            SpriteOverflow::Wrap
        },
        seed: opt.seed,
    };

    // Load instructions into emulator memory
    let mut emulator = Emulator::with_config(DummyInput, DummyOutput::new(), config);
    emulator.load(&program)?;

    // Advance simulated time one timer period at a time, as fast as possible
    let mut scheduler = Scheduler::for_emulator(&emulator);
    let period = Duration::from(TIMER_RATE);
    let mut simulated = Duration::from_secs(0);
    let mut cycles = 0;

    while simulated < total {
        let slice = period.min(total - simulated);
        match scheduler.run_for(&mut emulator, slice) {
            Ok(report) => cycles += report.cycles,
            Err(halt) => {
                print!("{}", emulator);
                return Err(halt.into());
            }
        }
        simulated += slice;
    }

    log::info!("Ran {} instructions, {} frames presented", cycles, emulator.output().presents());
    log::debug!("Final state:\n{}", emulator.state());
    print!("{}", emulator);

    Ok(())
}

fn simulated_duration(seconds: f64) -> anyhow::Result<Duration> {
    ensure!(
        seconds.is_finite() && (0.0..=MAX_SECONDS).contains(&seconds),
        "--seconds must be a number between 0 and {}",
        MAX_SECONDS
    );
    Ok(Duration::from_secs_f64(seconds))
}
