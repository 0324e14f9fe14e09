mod debug;

use std::io;

use chrono::Utc;
use clap::{clap_app, crate_version};
use log::info;

use octet::*;

fn main() {
    env_logger::init();

    let app = clap_app!(octet =>
        (version: crate_version!())
        (author: "Simon Cooper")
        (about: "Emulator for a small 8-bit instruction set.")
        (@arg PROGRAM: "The path to the raw program binary.")
        (@arg debug: -d "Enter debug mode.")
    );

    let cmd_args = app.get_matches();

    let program_path = match cmd_args.value_of("PROGRAM") {
        Some(p) => p.to_string(),
        None => {
            eprintln!("Usage: octet [program]. Run with --help for more options.");
            std::process::exit(1);
        }
    };

    let mut mem = RAM::new();
    let size = match mem.load_file(&program_path, map::PROGRAM_START) {
        Ok(size) => size,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    println!("Successfully read {} bytes from {}", size, program_path);

    let mut cpu = CPU::new(&mut mem, io::stdout());

    if cmd_args.is_present("debug") {
        debug::debug_mode(&mut cpu);
    } else {
        let start = Utc::now();
        if let Err(e) = cpu.run() {
            eprintln!("{}", e);
        }
        let run_time = Utc::now().signed_duration_since(start);
        info!("Executed {} instructions in {}ms", cpu.instructions(), run_time.num_milliseconds());
    }

    println!("Execution complete");
}
