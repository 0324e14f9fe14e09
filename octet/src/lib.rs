#[macro_use]
mod common;
mod constants;

mod cpu;
mod error;
mod mem;
mod output;

#[cfg(feature = "debug")]
pub mod debug;

pub use constants::map;
pub use cpu::{
    CPU,
    Flags,
    Opcode,
    Pair
};
pub use error::{
    Error,
    Result
};
pub use mem::{
    MemDevice,
    RAM
};
pub use output::Console;
