use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use byteorder::{LittleEndian, ReadBytesExt};
use clap::Parser;

use lc3::emulator::{Cpu, Memory, OS_SPACE, USER_SPACE};

/// Runs an assembled object file against the emulator.
#[derive(Parser)]
#[command(name = "lc3-emu", version, author)]
struct Args {
    /// Object file providing trap/interrupt handlers; sets the initial PC
    /// to 0x0200. Object files carry their own `.org` addresses, so this
    /// is loaded at file offset 0 like any other object file.
    #[arg(long = "os")]
    os_image: Option<PathBuf>,

    /// Object file holding the user program; sets the initial PC to 0x3000
    /// unless `--os` is also given.
    #[arg(short, long = "bin")]
    user_program: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.os_image.is_none() && args.user_program.is_none() {
        eprintln!("lc3-emu: at least one of --os or --bin must be given");
        return ExitCode::FAILURE;
    }

    let mut memory = Memory::new();
    let mut pc = USER_SPACE;

    if let Some(path) = &args.os_image {
        match read_object_file(path) {
            Ok(words) => memory.load(0, &words),
            Err(err) => {
                eprintln!("failed to read {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        }
        pc = OS_SPACE;
    }

    if let Some(path) = &args.user_program {
        match read_object_file(path) {
            Ok(words) => memory.load(0, &words),
            Err(err) => {
                eprintln!("failed to read {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        }
        if args.os_image.is_none() {
            pc = USER_SPACE;
        }
    }

    let mut cpu = Cpu::with_memory(pc, memory);
    match cpu.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn read_object_file(path: &PathBuf) -> std::io::Result<Vec<u16>> {
    let bytes = fs::read(path)?;
    let mut cursor = std::io::Cursor::new(bytes);
    let mut words = Vec::new();
    while let Ok(word) = cursor.read_u16::<LittleEndian>() {
        words.push(word);
    }
    Ok(words)
}
