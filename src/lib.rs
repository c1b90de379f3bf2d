/*!

A CHIP-8 interpreter as specified at https://en.wikipedia.org/wiki/CHIP-8.

# Crossterm Frontend

If you want to try the emulator on some programs, there is a ready-to-use implementation
you can run by using `cargo run --release --bin crossterm_frontend -- <program>`.
The keypad is mapped onto `1234`, `qwer`, `asdf` and `zxcv`.
`Esc` quits and `F1` or `Backspace` restarts the program.

# Library

If you are not interested in handling input (key presses and such),
then you can use `Emulator::new()` to get an emulator to work with.

The main way of running a program is to load instructions as bytes.

```rust
use chip8_vm::emulator::Emulator;
use chip8_vm::emulator::cpu::Flow;

let mut emulator = Emulator::new();

// Load a program at address 0x200.
let clear_display = [0x00, 0xE0];
emulator.load(&clear_display).unwrap();
assert_eq!(emulator.step(), Ok(Flow::Draw));
```

Alternatively, you can experiment by executing instructions manually.

```rust
use chip8_vm::emulator::Emulator;
use chip8_vm::emulator::instruction::{Instruction, Reg, Const, Addr};

let mut emulator = Emulator::new();

// Execute instructions manually
emulator.execute_single(Instruction::ClearScreen).unwrap();

// Or many sequentially
emulator.execute_many(&[
    Instruction::Goto(Addr(0x250)),
    Instruction::SetRegToConst(Reg(0xA), Const(35)),
    Instruction::SetRegToReg(Reg(0xB), Reg(0xA))
]).unwrap();

assert_eq!(emulator.cpu().register(0xB), 35);
```

## Running in time

`Emulator::step` runs one instruction and leaves the timers alone.
A `Scheduler` interleaves instructions at the configured rate with
timer ticks at 60 Hz, and presents the display when it changed.

```rust
use std::time::Duration;
use chip8_vm::emulator::{Emulator, Scheduler};

let mut emulator = Emulator::new();
emulator.load(&[0x60, 0xC8, 0xF0, 0x15, 0x12, 0x04]).unwrap();

let mut scheduler = Scheduler::for_emulator(&emulator);
scheduler.run_for(&mut emulator, Duration::from_secs(1)).unwrap();
assert_eq!(emulator.delay_timer(), 140);
```

## Custom input and output

To get keypresses, you must implement `EmulatorInput` and `EmulatorOutput`,
which represent somewhere to get keyboard input from and a screen respectively.
These tell the emulator which keys are held, and how to show the framebuffer.
Take a look at `src/emulator/input.rs` and `src/emulator/output.rs` to see how to implement this, then do the following.

```ignore
use chip8_vm::emulator::Emulator;

let mut emulator = Emulator::with_io(MyInput::new(), MyOutput::new());
```

You can then implement the emulator using your own custom frontend, as done with crossterm in crossterm_frontend.
*/

pub mod emulator;
pub mod util;
