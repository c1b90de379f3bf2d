//! The interpreter engine and the interfaces a host implements to drive it.

pub mod cpu;
pub mod display;
#[allow(clippy::module_inception)]
pub mod emulator;
pub mod error;
pub mod input;
pub mod instruction;
pub mod memory;
pub mod output;
pub mod scheduler;
pub mod timer;

pub use self::emulator::{Emulator, EmulatorConfig};
pub use self::error::{EmulatorError, Halt};
pub use self::scheduler::Scheduler;
