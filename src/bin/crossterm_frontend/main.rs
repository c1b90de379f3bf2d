use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use structopt::StructOpt;

use chip8_vm::emulator::display::SpriteOverflow;
use chip8_vm::emulator::timer::Hz;
use chip8_vm::emulator::{Emulator, EmulatorConfig, Scheduler};

mod crossterm_io;
mod key_buffer;
mod key_manager;
use crossterm_io::{CrosstermInput, CrosstermOutput};
use key_manager::{Command, KeyManager};

/// The program options.
#[derive(StructOpt)]
struct Opt {
    /// The program to execute
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// Instructions per second
    #[structopt(short, long, default_value = "540")]
    rate: u32,

    /// Drop sprite rows below the bottom edge instead of wrapping them to the top
    #[structopt(long)]
    clip_sprites: bool,

    /// Seed for the random number generator
    #[structopt(long)]
    seed: Option<u64>,

    /// How long a key press counts as held, in milliseconds
    #[structopt(long, default_value = "200")]
    hold: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Get configuration and read input file
    let opt = Opt::from_args();
    log::info!("Executing {:?}", &opt.input);
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

    let key_manager = KeyManager::new(Duration::from_millis(opt.hold));

    // Load instructions into emulator memory
    let mut emulator = Emulator::with_config(CrosstermInput::new(&key_manager), CrosstermOutput::new()?, config);
    emulator.load(&program)?;

    // Start execution
    let mut scheduler = Scheduler::for_emulator(&emulator);
    let result = scheduler.run(&mut emulator, |emulator| match key_manager.take_command() {
        Some(Command::Quit) => false,
        Some(Command::Reset) => {
            key_manager.release_all();
            if let Err(error) = emulator.reset() {
                log::warn!("Reset failed: {}", error);
            }
            true
        }
        None => true,
    });

    // Leave the alternate screen before reporting anything
    drop(emulator);
    result?;

    Ok(())
}
