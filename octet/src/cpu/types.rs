// Types used inside the CPU.

use bitflags::bitflags;

bitflags! {
    // Flags for status bits inside the CPU.
    #[derive(Default)]
    pub struct Flags: u8 {
        const V = bit!(4);  // Overflow
        const N = bit!(3);  // Negative
        const I = bit!(2);  // Interrupt disable (never set)
        const Z = bit!(1);  // Zero
        const C = bit!(0);  // Carry
    }
}

// Instructions, by opcode byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Nop,    // 0x00
    Hlt,    // 0x01
    Ldi,    // 0x02 Rd, #imm
    Ld,     // 0x03 Rd, addr14
    St,     // 0x04 Rs, addr14
    Mov,    // 0x05 Rd, Rs
    Add,    // 0x06 Rd, Ra, Rb
    Adc,    // 0x07 Rd, Ra, Rb
    And,    // 0x08 Rd, Ra, Rb
    Jmp,    // 0x09 addr15
    Out,    // 0x0A Rs
    Cpi,    // 0x0B Rs, #imm
    Beq,    // 0x0C addr15
    Bgt,    // 0x0D addr15
    Ldir,   // 0x0E Rd, (Ra)
    Stir,   // 0x0F (Ra), Rs
    Ldirp,  // 0x10 Rd, (Rp)
    Stirp,  // 0x11 (Rp), Rs
    Addiw,  // 0x12 Rp, #imm16
    Addi,   // 0x13 Rd, #imm
    Outp,   // 0x14 Rp
    Outa,   // 0x15 Rs
    Or,     // 0x16 Rd, Ra, Rb
    Not,    // 0x17 Rd, Rs
    Xor,    // 0x18 Rd, Ra, Rb
    Blt,    // 0x19 addr15
    Call,   // 0x20 addr15
    Ret,    // 0x21
}

impl Opcode {
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        use Opcode::*;

        match byte {
            0x00 => Some(Nop),
            0x01 => Some(Hlt),
            0x02 => Some(Ldi),
            0x03 => Some(Ld),
            0x04 => Some(St),
            0x05 => Some(Mov),
            0x06 => Some(Add),
            0x07 => Some(Adc),
            0x08 => Some(And),
            0x09 => Some(Jmp),
            0x0A => Some(Out),
            0x0B => Some(Cpi),
            0x0C => Some(Beq),
            0x0D => Some(Bgt),
            0x0E => Some(Ldir),
            0x0F => Some(Stir),
            0x10 => Some(Ldirp),
            0x11 => Some(Stirp),
            0x12 => Some(Addiw),
            0x13 => Some(Addi),
            0x14 => Some(Outp),
            0x15 => Some(Outa),
            0x16 => Some(Or),
            0x17 => Some(Not),
            0x18 => Some(Xor),
            0x19 => Some(Blt),
            0x20 => Some(Call),
            0x21 => Some(Ret),
            _ => None
        }
    }

    // Number of bytes following the opcode.
    pub fn operand_len(self) -> u16 {
        use Opcode::*;

        match self {
            Nop | Hlt | Ret => 0,
            Mov | Add | Adc | And | Out | Ldir | Stir | Ldirp | Stirp |
            Outp | Outa | Or | Not | Xor => 1,
            Ldi | Ld | St | Jmp | Cpi | Beq | Bgt | Addi | Blt | Call => 2,
            Addiw => 3,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        use Opcode::*;

        match self {
            Nop     => "NOP",
            Hlt     => "HLT",
            Ldi     => "LDI",
            Ld      => "LD",
            St      => "ST",
            Mov     => "MOV",
            Add     => "ADD",
            Adc     => "ADC",
            And     => "AND",
            Jmp     => "JMP",
            Out     => "OUT",
            Cpi     => "CPI",
            Beq     => "BEQ",
            Bgt     => "BGT",
            Ldir    => "LDIR",
            Stir    => "STIR",
            Ldirp   => "LDIRP",
            Stirp   => "STIRP",
            Addiw   => "ADDIW",
            Addi    => "ADDI",
            Outp    => "OUTP",
            Outa    => "OUTA",
            Or      => "OR",
            Not     => "NOT",
            Xor     => "XOR",
            Blt     => "BLT",
            Call    => "CALL",
            Ret     => "RET",
        }
    }
}

// Register pairs, used for 16-bit values and indirect addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pair {
    R01,    // R0 high, R1 low
    R23     // R2 high, R3 low
}

impl Pair {
    // Decode from bit 0 of an operand byte.
    pub fn from_operand(operand: u8) -> Self {
        if test_bit!(operand, 0, u8) {
            Pair::R23
        } else {
            Pair::R01
        }
    }

    // Index of the register holding the high byte.
    pub fn hi_reg(self) -> usize {
        match self {
            Pair::R01 => 0,
            Pair::R23 => 2
        }
    }

    // Index of the register holding the low byte.
    pub fn lo_reg(self) -> usize {
        self.hi_reg() + 1
    }
}

// 2-bit register index found at the given bit position of an operand byte.
pub fn reg_field(operand: u8, shift: u8) -> usize {
    ((operand >> shift) & 0x3) as usize
}
