use std::fs;
use std::process::Command;

use lc3::emulator::Cpu;
use lc3::encoder::{encode, EncodeResult};
use lc3::error::ErrorKind;
use lc3::first_pass::{first_pass, FirstPassResult};
use lc3::lexer::tokenize;
use lc3::parser::parse_lines;

/// Runs lexer -> parser -> first pass, asserting no errors at any stage.
fn run_pipeline(path: &str) -> FirstPassResult {
    let source = fs::read_to_string(path).expect("failed to read test program");
    let lexed = tokenize(&source);
    assert!(lexed.errors.is_empty(), "lexer errors: {:?}", lexed.errors);
    let parsed = parse_lines(&lexed.tokens);
    assert!(parsed.errors.is_empty(), "parser errors: {:?}", parsed.errors);
    let result = first_pass(parsed.lines);
    assert!(result.errors.is_empty(), "first pass errors: {:?}", result.errors);
    result
}

/// Runs the full assembler pipeline, asserting no errors at any stage.
fn run_full_pipeline(path: &str) -> EncodeResult {
    let source = fs::read_to_string(path).expect("failed to read test program");
    let lexed = tokenize(&source);
    assert!(lexed.errors.is_empty(), "lexer errors: {:?}", lexed.errors);
    let parsed = parse_lines(&lexed.tokens);
    assert!(parsed.errors.is_empty(), "parser errors: {:?}", parsed.errors);
    let first = first_pass(parsed.lines);
    assert!(first.errors.is_empty(), "first pass errors: {:?}", first.errors);
    let encoded = encode(&first);
    assert!(encoded.errors.is_empty(), "encoder errors: {:?}", encoded.errors);
    encoded
}

/// Runs the full pipeline on a source string and collects every error kind.
fn collect_all_errors(source: &str) -> Vec<ErrorKind> {
    let mut kinds = Vec::new();
    let lexed = tokenize(source);
    kinds.extend(lexed.errors.iter().map(|e| e.kind.clone()));
    let parsed = parse_lines(&lexed.tokens);
    kinds.extend(parsed.errors.iter().map(|e| e.kind.clone()));
    let first = first_pass(parsed.lines);
    kinds.extend(first.errors.iter().map(|e| e.kind.clone()));
    let encoded = encode(&first);
    kinds.extend(encoded.errors.iter().map(|e| e.kind.clone()));
    kinds
}

/// Assembles a source string and runs it on a fresh CPU, returning the CPU
/// in its halted state for inspection.
fn assemble_and_run(source: &str, origin: u16) -> Cpu {
    let lexed = tokenize(source);
    assert!(lexed.errors.is_empty(), "lexer errors: {:?}", lexed.errors);
    let parsed = parse_lines(&lexed.tokens);
    assert!(parsed.errors.is_empty(), "parser errors: {:?}", parsed.errors);
    let first = first_pass(parsed.lines);
    assert!(first.errors.is_empty(), "first pass errors: {:?}", first.errors);
    let encoded = encode(&first);
    assert!(encoded.errors.is_empty(), "encoder errors: {:?}", encoded.errors);

    let mut cpu = Cpu::new(origin);
    cpu.memory.load(0, &encoded.machine_code);
    cpu.run().expect("emulator should halt cleanly");
    cpu
}

// ========== ASSEMBLER: SYMBOL TABLE INTEGRATION TESTS ==========

#[test]
fn hello_program() {
    let result = run_pipeline("tests/test_programs/hello.asm");
    assert_eq!(result.symbol_table.get("msg"), Some(0x3003));
}

#[test]
fn countdown_program() {
    let result = run_pipeline("tests/test_programs/countdown.asm");
    assert_eq!(result.symbol_table.get("loop"), Some(0x3002));
}

#[test]
fn all_instructions_program() {
    let result = run_pipeline("tests/test_programs/all_instructions.asm");
    assert_eq!(result.symbol_table.get("target"), Some(0x3011));
}

#[test]
fn all_directives_program() {
    let result = run_pipeline("tests/test_programs/all_directives.asm");
    assert_eq!(result.symbol_table.get("data"), Some(0x3000));
    assert_eq!(result.symbol_table.get("buffer"), Some(0x3001));
    assert_eq!(result.symbol_table.get("msg"), Some(0x3002));
    assert_eq!(result.symbol_table.get("after"), Some(0x3005));
}

#[test]
fn edge_cases_program() {
    let result = run_pipeline("tests/test_programs/edge_cases.asm");
    assert_eq!(result.symbol_table.get("start"), Some(0x3000));
}

#[test]
fn subroutine_program() {
    let result = run_pipeline("tests/test_programs/subroutine.asm");
    assert_eq!(result.symbol_table.get("sub"), Some(0x3002));
}

#[test]
fn trap_vectors_program() {
    let result = run_pipeline("tests/test_programs/trap_vectors.asm");
    assert_eq!(result.symbol_table.get("msg"), Some(0x3006));
}

#[test]
fn multiple_labels_program() {
    let result = run_pipeline("tests/test_programs/multiple_labels.asm");
    assert_eq!(result.symbol_table.get("first"), Some(0x3000));
    assert_eq!(result.symbol_table.get("second"), Some(0x3001));
    assert_eq!(result.symbol_table.get("third"), Some(0x3002));
}

#[test]
fn stress_program() {
    let result = run_pipeline("tests/test_programs/stress.asm");
    assert_eq!(result.symbol_table.get("entry"), Some(0x3000));
    assert_eq!(result.symbol_table.get("result"), Some(0x3009));
    assert_eq!(result.symbol_table.get("done"), Some(0x300A));
}

// ========== ENCODER INTEGRATION TESTS ==========

#[test]
fn encode_hello_program() {
    let encoded = run_full_pipeline("tests/test_programs/hello.asm");
    assert_eq!(encoded.machine_code[0x3000] >> 12, 0b1110); // LEA
    assert_eq!(encoded.machine_code[0x3001], 0xF022); // TRAP PUTS
    assert_eq!(encoded.machine_code[0x3002], 0xF025); // TRAP HALT
    assert_eq!(encoded.machine_code[0x3003], 'H' as u16);
    assert_eq!(encoded.machine_code[0x3004], 'i' as u16);
    assert_eq!(encoded.machine_code[0x3005], 0x0000);
}

#[test]
fn encode_all_instructions_opcodes() {
    let encoded = run_full_pipeline("tests/test_programs/all_instructions.asm");
    assert_eq!(encoded.machine_code[0x3000] >> 12, 0b0001, "ADD");
    assert_eq!(encoded.machine_code[0x3001] >> 12, 0b0101, "AND");
    assert_eq!(encoded.machine_code[0x3002] >> 12, 0b1001, "NOT");
    assert_eq!(encoded.machine_code[0x3003] >> 12, 0b0000, "BR");
}

#[test]
fn encode_trap_vectors() {
    let encoded = run_full_pipeline("tests/test_programs/trap_vectors.asm");
    assert_eq!(encoded.machine_code[0x3000], 0xF020);
    assert_eq!(encoded.machine_code[0x3001], 0xF021);
    assert_eq!(encoded.machine_code[0x3005], 0xF025);
}

#[test]
fn encode_fill_directive_resolves_label() {
    let encoded = run_full_pipeline("tests/test_programs/all_directives.asm");
    assert_eq!(encoded.machine_code[0x3000], 42);
    assert_eq!(encoded.machine_code[0x3001], 0x3000);
}

#[test]
fn encode_stringz_directive() {
    let encoded = run_full_pipeline("tests/test_programs/hello.asm");
    assert!(encoded.machine_code[0x3000..=0x3005].contains(&0x0000));
}

#[test]
fn encode_pc_offset_for_br() {
    let encoded = run_full_pipeline("tests/test_programs/countdown.asm");
    let br_word = encoded.machine_code[0x3004];
    assert_eq!(br_word >> 12, 0b0000);
    // loop is at 0x3002, br is at 0x3004: offset = 0x3002 - (0x3004 + 1) = -3
    let offset = lc3::encoder::sign_extend(br_word & 0x1FF, 9);
    assert_eq!(offset, -3);
}

#[test]
fn zero_padding_from_org() {
    let encoded = run_full_pipeline("tests/test_programs/hello.asm");
    assert!(encoded.machine_code[..0x3000].iter().all(|w| *w == 0));
}

// ========== END-TO-END ASSEMBLE + EMULATE SCENARIOS ==========

#[test]
fn add_immediate_scenario() {
    let cpu = assemble_and_run(".org #x3000 add %r0 %r0 #5 trap #x25", 0x3000);
    assert_eq!(cpu.registers.get(0), 5);
    assert!(cpu.psr.p());
}

#[test]
fn and_to_zero_scenario() {
    let cpu = assemble_and_run(
        ".org #x3000 add %r0 %r0 #7 and %r0 %r0 #0 trap #x25",
        0x3000,
    );
    assert_eq!(cpu.registers.get(0), 0);
    assert!(cpu.psr.z());
}

#[test]
fn counted_loop_scenario() {
    let cpu = assemble_and_run(
        ".org #x3000 and %r5 %r5 #0 add %r5 %r5 #5 $loop: add %r0 %r0 #2 add %r5 %r5 #-1 br p $loop trap #x25",
        0x3000,
    );
    assert_eq!(cpu.registers.get(0), 10);
    assert_eq!(cpu.registers.get(5), 0);
    assert!(cpu.psr.z());
}

#[test]
fn lea_and_label_scenario() {
    let cpu = assemble_and_run(
        ".org #x3000 lea %r0 $data trap #x25 $data: .fill #x1234",
        0x3000,
    );
    assert_eq!(cpu.registers.get(0), 0x3002);
}

#[test]
fn trap_halt_scenario() {
    let cpu = assemble_and_run(".org #x3000 trap #x25", 0x3000);
    assert!(!cpu.memory.is_running());
}

#[test]
fn jsr_and_ret_scenario() {
    let cpu = assemble_and_run(
        ".org #x3000 jsr $sub trap #x25 $sub: add %r0 %r0 #1 ret",
        0x3000,
    );
    assert_eq!(cpu.registers.get(0), 1);
    assert_eq!(cpu.registers.get(7), 0x3001);
}

// ========== ERROR REPORTING ACROSS STAGES ==========

#[test]
fn undefined_label_is_reported_by_encoder() {
    let errs = collect_all_errors(".org #x3000 lea %r0 $missing");
    assert_eq!(errs, vec![ErrorKind::UndefinedLabel]);
}

#[test]
fn duplicate_label_is_reported_by_first_pass() {
    let errs = collect_all_errors("$a: add %r0 %r0 #0 $a: add %r0 %r0 #0");
    assert_eq!(errs, vec![ErrorKind::DuplicateLabel]);
}

#[test]
fn offset_out_of_range_is_reported_by_encoder() {
    let mut source = String::from(".org #x3000 $far: add %r0 %r0 #0 ");
    for _ in 0..2000 {
        source.push_str("add %r0 %r0 #0 ");
    }
    source.push_str("br p $far");
    let errs = collect_all_errors(&source);
    assert_eq!(errs, vec![ErrorKind::OffsetOutOfRange]);
}

// ========== CLI: lc3-asm | lc3-emu AS SUBPROCESSES ==========

/// Runs the actual compiled `lc3-asm` and `lc3-emu` binaries against a
/// `.org #x3000`-style fixture, exercising the object-file handoff between
/// them exactly as a user invoking the two CLIs would.
#[test]
fn asm_then_emu_pipeline_prints_hello() {
    let obj_path = std::env::temp_dir().join(format!("lc3_hello_{}.obj", std::process::id()));

    let asm_status = Command::new(env!("CARGO_BIN_EXE_lc3-asm"))
        .arg("tests/test_programs/hello.asm")
        .arg("-o")
        .arg(&obj_path)
        .status()
        .expect("failed to spawn lc3-asm");
    assert!(asm_status.success(), "lc3-asm exited with {asm_status}");

    let emu_output = Command::new(env!("CARGO_BIN_EXE_lc3-emu"))
        .arg("--bin")
        .arg(&obj_path)
        .output()
        .expect("failed to spawn lc3-emu");

    let _ = fs::remove_file(&obj_path);

    assert!(
        emu_output.status.success(),
        "lc3-emu exited with {}, stderr: {}",
        emu_output.status,
        String::from_utf8_lossy(&emu_output.stderr)
    );
    let stdout = String::from_utf8_lossy(&emu_output.stdout);
    assert!(
        stdout.contains("Hi"),
        "expected TRAP PUTS output \"Hi\" on stdout, got {stdout:?}"
    );
}
