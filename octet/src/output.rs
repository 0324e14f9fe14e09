// Console output used by the display instructions.
use std::io::Write;

use log::warn;

// Destination for OUT, OUTP and OUTA.
pub trait Console {
    // Print a value in decimal, followed by a line break.
    fn number(&mut self, value: u16);
    // Print a raw byte as a character.
    fn character(&mut self, value: u8);
}

impl<W: Write> Console for W {
    fn number(&mut self, value: u16) {
        if let Err(e) = writeln!(self, "{}", value) {
            warn!("Couldn't write to console: {}", e);
        }
    }

    fn character(&mut self, value: u8) {
        if let Err(e) = self.write_all(&[value]) {
            warn!("Couldn't write to console: {}", e);
        }
    }
}
