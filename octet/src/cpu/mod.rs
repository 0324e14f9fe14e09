// 8-bit processor
mod types;


use log::{
    debug,
    trace
};

use crate::{
    constants::map::{
        DATA_BASE,
        PROGRAM_START,
        STACK_START
    },
    error::{
        Error,
        Result
    },
    mem::MemDevice,
    output::Console
};

pub use types::{
    Flags,
    Opcode,
    Pair
};
use types::reg_field;

pub struct CPU<'a, M: MemDevice<u16, u8>, C: Console> {
    regs:   [u8; 4],    // General purpose registers R0-R3
    flags:  Flags,      // Flag register
    pc:     u16,        // Program Counter
    sp:     u16,        // Stack Pointer

    halted: bool,
    count:  u64,        // Instructions executed since reset.

    mem:    &'a mut M,
    out:    C
}

// Public
impl<'a, M: MemDevice<u16, u8>, C: Console> CPU<'a, M, C> {
    // Create and reset a new CPU using the provided memory and console.
    pub fn new(mem: &'a mut M, out: C) -> Self {
        let mut cpu = CPU {
            regs:   [0; 4],
            flags:  Flags::default(),
            pc:     PROGRAM_START,
            sp:     STACK_START,

            halted: false,
            count:  0,

            mem:    mem,
            out:    out
        };
        cpu.reset();
        cpu
    }

    // Clear registers and flags, and point PC and SP at their start locations.
    pub fn reset(&mut self) {
        self.regs = [0; 4];
        self.flags = Flags::default();
        self.pc = PROGRAM_START;
        self.sp = STACK_START;
        self.halted = false;
        self.count = 0;

        debug!("Reset: PC=${:04X} SP=${:04X}", self.pc, self.sp);
    }

    // Execute a single instruction. Does nothing once halted.
    pub fn step(&mut self) -> Result<()> {
        if self.halted {
            return Ok(());
        }

        self.execute_instruction()
    }

    // Keep stepping until the CPU halts.
    pub fn run(&mut self) -> Result<()> {
        while !self.halted {
            self.step()?;
        }
        Ok(())
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn sp(&self) -> u16 {
        self.sp
    }

    // Value of register 0-3.
    pub fn reg(&self, reg: usize) -> u8 {
        self.regs[reg & 0x3]
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    // Number of instructions executed since the last reset.
    pub fn instructions(&self) -> u64 {
        self.count
    }

    pub fn console(&self) -> &C {
        &self.out
    }

    pub fn read_mem(&self, addr: u16) -> u8 {
        self.mem.read(addr)
    }
}

// Internal: High-level
impl<'a, M: MemDevice<u16, u8>, C: Console> CPU<'a, M, C> {
    fn execute_instruction(&mut self) -> Result<()> {
        use Opcode::*;

        let instr_pc = self.pc;
        let instr = self.fetch();

        let op = match Opcode::from_byte(instr) {
            Some(op) => op,
            None => {
                self.halted = true;
                debug!("Halted on unknown opcode ${:02X} at ${:04X}", instr, instr_pc);
                return Err(Error::UnknownOpcode {
                    opcode: instr,
                    pc:     instr_pc
                });
            }
        };

        trace!("${:04X}: {}", instr_pc, op.mnemonic());
        self.count += 1;

        match op {
            Nop     => {},
            Hlt     => self.hlt(),

            Ldi     => self.ldi(),
            Ld      => self.ld(),
            St      => self.st(),
            Mov     => self.mov(),
            Ldir    => self.ldir(),
            Stir    => self.stir(),
            Ldirp   => self.ldirp(),
            Stirp   => self.stirp(),

            Add     => self.add(false),
            Adc     => self.add(true),
            Addi    => self.addi(),
            Addiw   => self.addiw(),
            Cpi     => self.cpi(),

            And     => self.logic(|a, b| a & b),
            Or      => self.logic(|a, b| a | b),
            Xor     => self.logic(|a, b| a ^ b),
            Not     => self.not(),

            Jmp     => self.branch(true),
            Beq     => {
                let cond = self.flags.contains(Flags::Z);
                self.branch(cond)
            },
            Bgt     => {
                let cond = !self.flags.contains(Flags::N);
                self.branch(cond)
            },
            Blt     => {
                let cond = self.flags.contains(Flags::N);
                self.branch(cond)
            },
            Call    => self.call(),
            Ret     => self.ret(),

            Out     => self.out(),
            Outp    => self.outp(),
            Outa    => self.outa(),
        }

        Ok(())
    }

    fn fetch(&mut self) -> u8 {
        let data = self.mem.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        data
    }
}

// Instructions: Arithmetic and logic
impl<'a, M: MemDevice<u16, u8>, C: Console> CPU<'a, M, C> {
    // Rd = Ra + Rb (+ C)
    fn add(&mut self, with_carry: bool) {
        let operand = self.fetch();
        let op1 = self.regs[reg_field(operand, 2)];
        let op2 = self.regs[reg_field(operand, 0)];
        let carry = if with_carry {self.carry()} else {0};

        self.regs[reg_field(operand, 4)] = self.add_8(op1, op2, carry);
    }

    // Rd = Rd + imm
    fn addi(&mut self) {
        let dest = reg_field(self.fetch(), 0);
        let imm = self.fetch();

        self.regs[dest] = self.add_8(self.regs[dest], imm, 0);
    }

    // Rp = Rp + imm16
    fn addiw(&mut self) {
        let pair = Pair::from_operand(self.fetch());
        let imm_hi = self.fetch();
        let imm_lo = self.fetch();

        let result = (self.get_pair(pair) as u32) + (make16!(imm_hi, imm_lo) as u32);
        let result16 = result as u16;

        self.flags.set(Flags::Z, result16 == 0);
        self.flags.set(Flags::N, test_bit!(result16, 15));
        self.flags.set(Flags::C, result > 0xFFFF);

        self.set_pair(pair, result16);
    }

    // Flags for Rs - imm. The result is discarded.
    fn cpi(&mut self) {
        let reg = reg_field(self.fetch(), 0);
        let imm = self.fetch();

        let result = self.regs[reg].wrapping_sub(imm);

        self.set_nz(result);
    }

    // Rd = Ra op Rb
    fn logic<F: Fn(u8, u8) -> u8>(&mut self, f: F) {
        let operand = self.fetch();
        let op1 = self.regs[reg_field(operand, 2)];
        let op2 = self.regs[reg_field(operand, 0)];

        let result = f(op1, op2);

        self.regs[reg_field(operand, 4)] = result;
        self.set_nz(result);
    }

    // Rd = !(Rs >> 2)
    fn not(&mut self) {
        let operand = self.fetch();
        let result = !(self.regs[reg_field(operand, 0)] >> 2);

        self.regs[reg_field(operand, 4)] = result;
        self.set_nz(result);
    }
}

// Instructions: Loads and stores
impl<'a, M: MemDevice<u16, u8>, C: Console> CPU<'a, M, C> {
    // Rd = imm
    fn ldi(&mut self) {
        let dest = reg_field(self.fetch(), 0);
        self.regs[dest] = self.fetch();
    }

    // Rd = [DATA_BASE + addr14]
    fn ld(&mut self) {
        let (dest, addr) = self.direct();
        self.regs[dest] = self.read_data(addr);
    }

    // [DATA_BASE + addr14] = Rs
    fn st(&mut self) {
        let (src, addr) = self.direct();
        self.write_data(addr, self.regs[src]);
    }

    // Rd = Rs
    fn mov(&mut self) {
        let operand = self.fetch();
        self.regs[reg_field(operand, 2)] = self.regs[reg_field(operand, 0)];
    }

    // Rd = [DATA_BASE + Ra]
    fn ldir(&mut self) {
        let operand = self.fetch();
        let addr = self.indirect(self.regs[reg_field(operand, 0)] as u16);

        self.regs[reg_field(operand, 2)] = self.read_data(addr);
    }

    // [DATA_BASE + Ra] = Rs
    fn stir(&mut self) {
        let operand = self.fetch();
        let addr = self.indirect(self.regs[reg_field(operand, 0)] as u16);

        self.write_data(addr, self.regs[reg_field(operand, 2)]);
    }

    // Rd = [DATA_BASE + Rp]
    fn ldirp(&mut self) {
        let operand = self.fetch();
        let dest = nibble_reg(operand);
        let addr = self.indirect(self.get_pair(Pair::from_operand(operand)));

        self.regs[dest] = self.read_data(addr);
    }

    // [DATA_BASE + Rp] = Rs
    fn stirp(&mut self) {
        let operand = self.fetch();
        let src = nibble_reg(operand);
        let addr = self.indirect(self.get_pair(Pair::from_operand(operand)));

        self.write_data(addr, self.regs[src]);
    }
}

// Instructions: Control flow
impl<'a, M: MemDevice<u16, u8>, C: Console> CPU<'a, M, C> {
    fn hlt(&mut self) {
        self.halted = true;
        debug!("Halted at ${:04X}", self.pc.wrapping_sub(1));
    }

    // The target is always fetched, even if the branch isn't taken.
    fn branch(&mut self, cond: bool) {
        let target = self.target();
        if cond {
            self.pc = target;
        }
    }

    fn call(&mut self) {
        let target = self.target();
        let ret_addr = self.pc;

        self.stack_push(lo!(ret_addr));
        self.stack_push(hi!(ret_addr));
        self.pc = target;
    }

    fn ret(&mut self) {
        let pc_hi = self.stack_pop();
        let pc_lo = self.stack_pop();

        self.pc = make16!(pc_hi, pc_lo);
    }
}

// Instructions: Display
impl<'a, M: MemDevice<u16, u8>, C: Console> CPU<'a, M, C> {
    fn out(&mut self) {
        let reg = reg_field(self.fetch(), 0);
        self.out.number(self.regs[reg] as u16);
    }

    fn outp(&mut self) {
        let pair = Pair::from_operand(self.fetch());
        let data = self.get_pair(pair);
        self.out.number(data);
    }

    fn outa(&mut self) {
        let reg = reg_field(self.fetch(), 0);
        self.out.character(self.regs[reg]);
    }
}

// Misc helper functions
impl<'a, M: MemDevice<u16, u8>, C: Console> CPU<'a, M, C> {
    #[inline]
    fn carry(&self) -> u8 {
        (self.flags & Flags::C).bits()
    }

    // 8-bit add which sets all arithmetic flags.
    // V is found using the operands, not including the carry in.
    fn add_8(&mut self, op1: u8, op2: u8, carry: u8) -> u8 {
        let result = (op1 as u16) + (op2 as u16) + (carry as u16);
        let result8 = lo!(result);

        self.flags.set(Flags::V, ((op1 ^ !op2) & (op1 ^ result8) & bit!(7)) != 0);
        self.flags.set(Flags::N, test_bit!(result8, 7, u8));
        self.flags.set(Flags::Z, result8 == 0);
        self.flags.set(Flags::C, result > 0xFF);

        result8
    }

    fn set_nz(&mut self, result: u8) {
        self.flags.set(Flags::N, test_bit!(result, 7, u8));
        self.flags.set(Flags::Z, result == 0);
    }

    fn get_pair(&self, pair: Pair) -> u16 {
        make16!(self.regs[pair.hi_reg()], self.regs[pair.lo_reg()])
    }

    fn set_pair(&mut self, pair: Pair, data: u16) {
        self.regs[pair.hi_reg()] = hi!(data);
        self.regs[pair.lo_reg()] = lo!(data);
    }
}

// Internal data functions
impl<'a, M: MemDevice<u16, u8>, C: Console> CPU<'a, M, C> {
    fn read_data(&self, addr: u16) -> u8 {
        self.mem.read(addr)
    }

    fn write_data(&mut self, addr: u16, data: u8) {
        self.mem.write(addr, data);
    }

    // Write at SP, then move SP down.
    fn stack_push(&mut self, data: u8) {
        self.write_data(self.sp, data);
        self.sp = self.sp.wrapping_sub(1);
    }

    // Move SP up, then read at SP.
    fn stack_pop(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.read_data(self.sp)
    }
}

// Addressing modes
impl<'a, M: MemDevice<u16, u8>, C: Console> CPU<'a, M, C> {
    // Rx, addr14: register in bits 7-6, offset from the data base in the rest.
    fn direct(&mut self) -> (usize, u16) {
        let op_hi = self.fetch();
        let op_lo = self.fetch();

        let offset = make16!(op_hi & 0x3F, op_lo);

        (reg_field(op_hi, 6), self.indirect(offset))
    }

    // (x): offset from the data base. Wraps at the top of memory.
    fn indirect(&self, offset: u16) -> u16 {
        DATA_BASE.wrapping_add(offset)
    }

    // addr15: raw jump target, no base.
    fn target(&mut self) -> u16 {
        let addr_hi = self.fetch() & 0x7F;
        let addr_lo = self.fetch();

        make16!(addr_hi, addr_lo)
    }
}

// Pair instructions carry the register in the top nibble, but only the low 2 bits of it are used.
fn nibble_reg(operand: u8) -> usize {
    let nibble = (operand >> 4) & 0xF;
    (nibble & 0x3) as usize
}

// Debug
#[cfg(feature = "debug")]
impl<'a, M: MemDevice<u16, u8>, C: Console> CPU<'a, M, C> {
    // Capture the state of the internal registers.
    pub fn get_state(&self) -> crate::debug::CPUState {
        crate::debug::CPUState {
            regs:   self.regs,
            flags:  self.flags.bits(),
            pc:     self.pc,
            sp:     self.sp,
            halted: self.halted,
        }
    }

    pub fn get_mem_at(&self, addr: u16) -> u8 {
        self.mem.read(addr)
    }
}
