// Memory
use std::{
    io::{
        BufReader,
        Read
    },
    fs::File
};

use log::debug;

use crate::{
    constants::map::MEM_SIZE,
    error::{
        Error,
        Result
    }
};

// Read/Write Memory location
pub trait MemDevice<A, D> {
    fn read(&self, addr: A) -> D;
    fn write(&mut self, addr: A, data: D);
}

// Random access memory covering the full 16-bit address space.
pub struct RAM {
    data: Vec<u8>
}

impl RAM {
    pub fn new() -> Self {
        RAM {
            data: vec![0; MEM_SIZE]
        }
    }

    // Copy a program into memory. Writes past the end of the address space wrap around to 0.
    pub fn load_program(&mut self, program: &[u8], start: u16) {
        let mut addr = start;
        for byte in program.iter() {
            self.data[addr as usize] = *byte;
            addr = addr.wrapping_add(1);
        }
    }

    // Read a whole binary file into memory. Returns the number of bytes read.
    pub fn load_file(&mut self, file_name: &str, start: u16) -> Result<usize> {
        let file = File::open(file_name).map_err(|source| Error::Open {
            path:   file_name.to_string(),
            source: source
        })?;
        let mut reader = BufReader::new(file);

        let mut program = Vec::new();
        reader.read_to_end(&mut program).map_err(|source| Error::Read {
            path:   file_name.to_string(),
            source: source
        })?;

        debug!("Loading {} bytes from {} at ${:04X}", program.len(), file_name, start);
        self.load_program(&program, start);

        Ok(program.len())
    }
}

impl Default for RAM {
    fn default() -> Self {
        Self::new()
    }
}

impl MemDevice<u16, u8> for RAM {
    fn read(&self, addr: u16) -> u8 {
        self.data[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.data[addr as usize] = data;
    }
}
