// Interactive debugger.
use std::{
    collections::BTreeSet,
    io::BufRead
};

use octet::{
    CPU,
    Console,
    MemDevice,
    Opcode
};

// A single line of debugger input.
#[derive(Debug, PartialEq)]
pub enum Command {
    Break(u16),     // b:x
    Breaks,         // b
    Clear(u16),     // c:x
    ClearAll,       // c
    Run,            // r
    Step(usize),    // s, s:n
    State,          // p
    Show(Target),   // p:x
    Trace,          // t
    Help,           // h
    Quit            // q
}

// Something to print with p:x
#[derive(Debug, PartialEq)]
pub enum Target {
    Reg(usize),
    PC,
    SP,
    Flags,
    Mem(u16),
    Range(u16, u16)
}

// Why a run stopped.
#[derive(Debug, PartialEq)]
pub enum Stop {
    Halted,
    Break(u16)
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (cmd, arg) = match line.find(':') {
        Some(i) => (&line[..i], Some(line[(i+1)..].trim())),
        None    => (line, None)
    };

    match (cmd, arg) {
        ("b", Some(a))  => parse_addr(a).map(Command::Break),
        ("b", None)     => Ok(Command::Breaks),
        ("c", Some(a))  => parse_addr(a).map(Command::Clear),
        ("c", None)     => Ok(Command::ClearAll),
        ("r", None)     => Ok(Command::Run),
        ("s", None)     => Ok(Command::Step(1)),
        ("s", Some(n))  => n.parse::<usize>()
            .map(Command::Step)
            .map_err(|e| format!("Invalid number of steps: {}", e)),
        ("p", None)     => Ok(Command::State),
        ("p", Some(t))  => parse_target(t).map(Command::Show),
        ("t", None)     => Ok(Command::Trace),
        ("h", None)     => Ok(Command::Help),
        ("q", None)     => Ok(Command::Quit),
        _ => Err(format!("Unknown command '{}'. Enter 'h' for help.", line))
    }
}

fn parse_addr(s: &str) -> Result<u16, String> {
    let digits = s.trim_start_matches('$');
    u16::from_str_radix(digits, 16).map_err(|e| format!("Invalid address '{}': {}", s, e))
}

fn parse_target(s: &str) -> Result<Target, String> {
    match s {
        "r0" => Ok(Target::Reg(0)),
        "r1" => Ok(Target::Reg(1)),
        "r2" => Ok(Target::Reg(2)),
        "r3" => Ok(Target::Reg(3)),
        "pc" => Ok(Target::PC),
        "sp" => Ok(Target::SP),
        "f"  => Ok(Target::Flags),
        s => match s.find('-') {
            Some(i) => Ok(Target::Range(parse_addr(&s[..i])?, parse_addr(&s[(i+1)..])?)),
            None    => parse_addr(s).map(Target::Mem)
        }
    }
}

// Opcode and operand bytes at an address, e.g. "$0003: CALL 00 10".
pub fn describe_instr<M: MemDevice<u16, u8>, C: Console>(cpu: &CPU<M, C>, addr: u16) -> String {
    let byte = cpu.get_mem_at(addr);
    match Opcode::from_byte(byte) {
        Some(op) => {
            let operands = (1..=op.operand_len())
                .map(|i| format!("{:02X}", cpu.get_mem_at(addr.wrapping_add(i))))
                .collect::<Vec<_>>();
            format!("${:04X}: {} {}", addr, op.mnemonic(), operands.join(" ")).trim_end().to_string()
        },
        None => format!("${:04X}: ?? ({:02X})", addr, byte)
    }
}

pub struct Debugger {
    breaks: BTreeSet<u16>,
    calls:  Vec<u16>,   // Addresses of the CALLs not yet returned from.
}

impl Debugger {
    pub fn new() -> Self {
        Debugger {
            breaks: BTreeSet::new(),
            calls:  Vec::new()
        }
    }

    pub fn breakpoints(&self) -> &BTreeSet<u16> {
        &self.breaks
    }

    pub fn call_trace(&self) -> &[u16] {
        &self.calls
    }

    // Carry out a command. Returns false when the session should end.
    pub fn execute<M: MemDevice<u16, u8>, C: Console>(&mut self, cmd: Command, cpu: &mut CPU<M, C>) -> bool {
        match cmd {
            Command::Break(addr) => {
                println!("Inserted breakpoint at ${:04X}", addr);
                self.breaks.insert(addr);
            },
            Command::Breaks => for addr in self.breakpoints() {
                println!("${:04X}", addr);
            },
            Command::Clear(addr) => {
                if self.breaks.remove(&addr) {
                    println!("Cleared breakpoint at ${:04X}", addr);
                } else {
                    println!("No breakpoint at ${:04X}", addr);
                }
            },
            Command::ClearAll => {
                println!("Cleared all breakpoints");
                self.breaks.clear();
            },
            Command::Run => match self.run(cpu) {
                Stop::Halted => println!("Halted at ${:04X}", cpu.pc()),
                Stop::Break(addr) => println!("Break at ${:04X}", addr),
            },
            Command::Step(n) => for _ in 0..n {
                if cpu.is_halted() {
                    println!("Halted at ${:04X}", cpu.pc());
                    break;
                }
                println!("{}", describe_instr(cpu, cpu.pc()));
                self.step(cpu);
            },
            Command::State => println!("{}", cpu.get_state().to_string()),
            Command::Show(target) => self.show(target, cpu),
            Command::Trace => for addr in self.call_trace() {
                println!("{}", describe_instr(cpu, *addr));
            },
            Command::Help => help(),
            Command::Quit => return false,
        }
        true
    }

    // Step until the CPU halts or reaches a breakpoint.
    // A breakpoint at the starting PC doesn't stop the run.
    pub fn run<M: MemDevice<u16, u8>, C: Console>(&mut self, cpu: &mut CPU<M, C>) -> Stop {
        let mut first = true;
        loop {
            if cpu.is_halted() {
                return Stop::Halted;
            }
            let pc = cpu.pc();
            if !first && self.breaks.contains(&pc) {
                return Stop::Break(pc);
            }
            first = false;
            self.step(cpu);
        }
    }

    // Step once, keeping the call trace up to date.
    pub fn step<M: MemDevice<u16, u8>, C: Console>(&mut self, cpu: &mut CPU<M, C>) {
        let pc = cpu.pc();
        match Opcode::from_byte(cpu.get_mem_at(pc)) {
            Some(Opcode::Call) => self.calls.push(pc),
            Some(Opcode::Ret) => {
                self.calls.pop();
            },
            _ => {}
        }

        if let Err(e) = cpu.step() {
            eprintln!("{}", e);
        }
    }

    fn show<M: MemDevice<u16, u8>, C: Console>(&self, target: Target, cpu: &CPU<M, C>) {
        let state = cpu.get_state();
        match target {
            Target::Reg(r) => println!("r{}: ${:02X}", r, state.regs[r]),
            Target::PC => println!("pc: ${:04X}", state.pc),
            Target::SP => println!("sp: ${:04X}", state.sp),
            Target::Flags => println!("f: b{:08b}", state.flags),
            Target::Mem(addr) => println!("${:04X}: ${:02X}", addr, cpu.get_mem_at(addr)),
            Target::Range(start, end) => {
                println!("${:04X} - ${:04X}:", start, end);
                let mems = (start..end).map(|n| format!("{:02X}", cpu.get_mem_at(n)))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("{}", mems);
            }
        }
    }
}

pub fn debug_mode<M: MemDevice<u16, u8>, C: Console>(cpu: &mut CPU<M, C>) {
    println!("Debug mode. Enter 'h' for help.");
    let mut debugger = Debugger::new();

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Ok(cmd) => if !debugger.execute(cmd, cpu) {
                break;
            },
            Err(e) => println!("{}", e),
        }
    }
}

fn help() {
    println!("b:x    Set a breakpoint at address x (hex).");
    println!("b      List breakpoints.");
    println!("c:x    Clear the breakpoint at x.");
    println!("c      Clear every breakpoint.");
    println!("r      Run until a breakpoint or HLT.");
    println!("s      Step one instruction. s:n steps n (decimal).");
    println!("p      Show registers, flags, PC and SP.");
    println!("p:x    Show r0-r3, pc, sp, f, or the byte at address x. p:x-y shows a range.");
    println!("t      Show the CALLs that haven't returned yet.");
    println!("q      Quit.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use octet::RAM;

    fn load(program: &[u8]) -> RAM {
        let mut mem = RAM::new();
        mem.load_program(program, 0);
        mem
    }

    #[test]
    fn parse() {
        assert_eq!(parse_command("b:1A\n"), Ok(Command::Break(0x1A)));
        assert_eq!(parse_command("b:$0100"), Ok(Command::Break(0x100)));
        assert_eq!(parse_command("b"), Ok(Command::Breaks));
        assert_eq!(parse_command("c:1a"), Ok(Command::Clear(0x1A)));
        assert_eq!(parse_command("c"), Ok(Command::ClearAll));
        assert_eq!(parse_command("s"), Ok(Command::Step(1)));
        assert_eq!(parse_command("s:12"), Ok(Command::Step(12)));
        assert_eq!(parse_command("p:r2"), Ok(Command::Show(Target::Reg(2))));
        assert_eq!(parse_command("p:8000-8010"), Ok(Command::Show(Target::Range(0x8000, 0x8010))));
        assert_eq!(parse_command("p:FE00"), Ok(Command::Show(Target::Mem(0xFE00))));
        assert_eq!(parse_command(" q "), Ok(Command::Quit));

        assert!(parse_command("b:zz").is_err());
        assert!(parse_command("b:10000").is_err());
        assert!(parse_command("s:-1").is_err());
        assert!(parse_command("x").is_err());
    }

    #[test]
    fn breakpoints() {
        let mut mem = load(&[0x00, 0x00, 0x00, 0x01]);
        let mut cpu = CPU::new(&mut mem, Vec::new());
        let mut debugger = Debugger::new();

        assert!(debugger.execute(Command::Break(0x0002), &mut cpu));
        assert!(debugger.execute(Command::Break(0x0003), &mut cpu));
        assert!(debugger.execute(Command::Clear(0x0003), &mut cpu));
        assert_eq!(debugger.breakpoints().iter().cloned().collect::<Vec<_>>(), vec![0x0002]);

        assert_eq!(debugger.run(&mut cpu), Stop::Break(0x0002));
        assert_eq!(cpu.pc(), 0x0002);

        // Running again from the breakpoint moves past it.
        assert_eq!(debugger.run(&mut cpu), Stop::Halted);
        assert_eq!(cpu.pc(), 0x0004);

        debugger.execute(Command::ClearAll, &mut cpu);
        assert!(debugger.breakpoints().is_empty());
        assert!(!debugger.execute(Command::Quit, &mut cpu));
    }

    #[test]
    fn call_trace() {
        let mut mem = load(&[
            0x20, 0x00, 0x05,   // $00: CALL $0005
            0x01,               // $03: HLT
            0x00,
            0x20, 0x00, 0x09,   // $05: CALL $0009
            0x21,               // $08: RET
            0x21                // $09: RET
        ]);
        let mut cpu = CPU::new(&mut mem, Vec::new());
        let mut debugger = Debugger::new();

        debugger.step(&mut cpu);
        debugger.step(&mut cpu);
        assert_eq!(debugger.call_trace(), &[0x0000, 0x0005]);

        debugger.step(&mut cpu);
        assert_eq!(debugger.call_trace(), &[0x0000]);

        debugger.step(&mut cpu);
        assert!(debugger.call_trace().is_empty());
        assert_eq!(cpu.pc(), 0x0003);
    }

    #[test]
    fn unknown_opcode_halts_run() {
        let mut mem = load(&[0x00, 0x1C, 0x00]);
        let mut cpu = CPU::new(&mut mem, Vec::new());
        let mut debugger = Debugger::new();

        assert_eq!(debugger.run(&mut cpu), Stop::Halted);
        assert!(cpu.is_halted());

        // Further steps do nothing.
        assert!(debugger.execute(Command::Step(3), &mut cpu));
        assert_eq!(cpu.instructions(), 1);
    }

    #[test]
    fn instruction_text() {
        let mut mem = load(&[
            0x12, 0x01, 0x12, 0x34,     // ADDIW r23, $1234
            0x21,                       // RET
            0x1C                        // unknown
        ]);
        let cpu = CPU::new(&mut mem, Vec::new());

        assert_eq!(describe_instr(&cpu, 0x0000), "$0000: ADDIW 01 12 34");
        assert_eq!(describe_instr(&cpu, 0x0004), "$0004: RET");
        assert_eq!(describe_instr(&cpu, 0x0005), "$0005: ?? (1C)");
    }
}
