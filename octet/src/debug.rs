// For stepping through the CPU.

// Capture of CPU internal state.
pub struct CPUState {
    pub regs:   [u8; 4],    // R0-R3
    pub flags:  u8,         // Flag register
    pub pc:     u16,        // Program Counter
    pub sp:     u16,        // Stack Pointer
    pub halted: bool,
}

impl CPUState {
    pub fn to_string(&self) -> String {
        format!("r0: ${:02X} r1: ${:02X} r2: ${:02X} r3: ${:02X}\n\
                pc: ${:04X} sp: ${:04X}{}\n\
                ---vnizc: {:08b}",
                self.regs[0], self.regs[1], self.regs[2], self.regs[3],
                self.pc, self.sp, if self.halted {" (halted)"} else {""},
                self.flags)
    }
}
