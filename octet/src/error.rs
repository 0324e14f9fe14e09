// Errors raised by the emulator.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Error opening file: {path} ({source})")]
    Open {
        path:   String,
        #[source]
        source: std::io::Error
    },
    #[error("Error reading file: {path} ({source})")]
    Read {
        path:   String,
        #[source]
        source: std::io::Error
    },
    #[error("Unknown opcode 0x{opcode:x} at ${pc:04X}")]
    UnknownOpcode {
        opcode: u8,
        pc:     u16
    }
}
