use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use byteorder::{LittleEndian, WriteBytesExt};
use clap::Parser;

use lc3::encoder::encode;
use lc3::first_pass::first_pass;
use lc3::lexer::tokenize;
use lc3::parser::parse_lines;

/// Assembles a source file into a little-endian object file.
#[derive(Parser)]
#[command(name = "lc3-asm", version, author)]
struct Args {
    /// Path to the .asm source file.
    input: PathBuf,

    /// Path to write the assembled object file to.
    #[arg(short, long, default_value = "a.obj")]
    output: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let source = match fs::read_to_string(&args.input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("failed to read {}: {err}", args.input.display());
            return ExitCode::FAILURE;
        }
    };

    let lexed = tokenize(&source);
    let parsed = parse_lines(&lexed.tokens);
    let first = first_pass(parsed.lines);
    let encoded = encode(&first);

    let mut had_errors = false;
    for err in lexed.errors.iter().chain(parsed.errors.iter()) {
        eprintln!("{err}");
        had_errors = true;
    }
    for err in first.errors.iter().chain(encoded.errors.iter()) {
        eprintln!("{err}");
        had_errors = true;
    }

    if had_errors {
        return ExitCode::FAILURE;
    }

    if let Err(err) = write_object_file(&args.output, &encoded.machine_code) {
        eprintln!("failed to write {}: {err}", args.output.display());
        return ExitCode::FAILURE;
    }

    first.symbol_table.print_table();
    println!(
        "assembled {} word(s) to {}",
        encoded.machine_code.len(),
        args.output.display()
    );

    ExitCode::SUCCESS
}

fn write_object_file(path: &PathBuf, words: &[u16]) -> std::io::Result<()> {
    let mut buf = Vec::with_capacity(words.len() * 2);
    for word in words {
        buf.write_u16::<LittleEndian>(*word)?;
    }
    fs::write(path, buf)
}
