// Various constants

// Memory map. Nothing in the store enforces these: they are conventions of the instruction set.
pub mod map {
    pub const MEM_SIZE: usize       = 0x10000;

    pub const PROGRAM_START: u16    = 0x0000;   // Load offset of a binary, and the PC after reset.
    pub const DATA_BASE: u16        = 0x8000;   // Added to load/store and indirect addresses.
    pub const STACK_START: u16      = 0xFE00;   // SP after reset. Grows downwards.
}
