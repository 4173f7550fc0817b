//! End-to-end runs of program images through the public API.

use ls8::cpu::{CpuError, Opcode, StackError};
use ls8::{load_image, parse_image, Cpu, ImageError};
use std::io::Write;

fn run_source(source: &str) -> (Cpu, String) {
    let image = parse_image(source).unwrap();
    let mut cpu = Cpu::new();
    cpu.load_program(&image.bytes).unwrap();

    let mut out = Vec::new();
    cpu.run(&mut out).unwrap();
    (cpu, String::from_utf8(out).unwrap())
}

#[test]
fn print8_prints_8() {
    let (cpu, out) = run_source(include_str!("../programs/print8.ls8"));
    assert_eq!(out, "8\n");
    assert!(cpu.is_halted());
    assert_eq!(cpu.cycles, 3);
}

#[test]
fn print8_from_raw_bytes() {
    let source = "10000010\n00000000\n00001000\n01000111\n00000000\n00000001\n";
    let (_, out) = run_source(source);
    assert_eq!(out, "8\n");
}

#[test]
fn mul_scenario_prints_27() {
    let source = "\
10000010 # LDI R0,9
00000000
00001001
10000010 # LDI R1,3
00000001
00000011
10100010 # MUL R0,R1
00000000
00000001
01000111 # PRN R0
00000000
00000001 # HLT
";
    let (_, out) = run_source(source);
    assert_eq!(out, "27\n");
}

#[test]
fn mult_program() {
    let (_, out) = run_source(include_str!("../programs/mult.ls8"));
    assert_eq!(out, "72\n");
}

#[test]
fn stack_program() {
    let (cpu, out) = run_source(include_str!("../programs/stack.ls8"));
    assert_eq!(out, "2\n4\n1\n");
    assert_eq!(cpu.regs.sp(), 0xF4);
}

#[test]
fn call_program_uses_add() {
    let (cpu, out) = run_source(include_str!("../programs/call.ls8"));
    assert_eq!(out, "20\n30\n36\n60\n");
    assert_eq!(cpu.regs.sp(), 0xF4);
}

#[test]
fn compare_and_branch_program() {
    let (cpu, out) = run_source(include_str!("../programs/sctest.ls8"));
    assert_eq!(out, "1\n2\n");
    assert_eq!(cpu.regs.pc, 63);
}

#[test]
fn load_image_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("print8.ls8");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(include_str!("../programs/print8.ls8").as_bytes()).unwrap();
    drop(file);

    let image = load_image(&path).unwrap();
    assert_eq!(image.bytes, vec![0x82, 0x00, 0x08, 0x47, 0x00, 0x01]);
}

#[test]
fn malformed_file_reports_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.ls8");
    std::fs::write(&path, "# header\n10000010\n1000001\n").unwrap();

    match load_image(&path) {
        Err(ImageError::Format { line, content }) => {
            assert_eq!(line, 3);
            assert_eq!(content, "1000001");
        }
        other => panic!("expected format error, got {:?}", other),
    }
}

#[test]
fn unknown_opcode_reports_byte_and_pc() {
    // LDI R0,1 then an undefined byte at address 3
    let source = "10000010\n00000000\n00000001\n11111110\n";
    let image = parse_image(source).unwrap();
    let mut cpu = Cpu::new();
    cpu.load_program(&image.bytes).unwrap();

    let err = cpu.run(&mut std::io::sink()).unwrap_err();
    assert_eq!(err, CpuError::UnknownOpcode { opcode: 0b1111_1110, pc: 3 });
    assert!(err.to_string().contains("0x03"));
    assert_eq!(cpu.regs.get(0).unwrap(), 1);
}

#[test]
fn runaway_recursion_overflows_stack() {
    // 0: LDI R1,0xF8   3: JMP R1   0xF8: CALL R1 (calls itself forever)
    // The routine sits above the stack so pushes never overwrite it.
    let program = [Opcode::Ldi.byte(), 1, 0xF8, Opcode::Jmp.byte(), 1];
    let mut cpu = Cpu::new();
    cpu.load_program(&program).unwrap();
    cpu.mem.write(0xF8, Opcode::Call.byte());
    cpu.mem.write(0xF9, 1);

    let err = cpu.run(&mut std::io::sink()).unwrap_err();
    assert_eq!(err, CpuError::Stack(StackError::Overflow));
    assert_eq!(cpu.regs.sp(), 0);
}

#[test]
fn state_serializes_to_json() {
    let (cpu, _) = run_source(include_str!("../programs/print8.ls8"));

    let json = serde_json::to_value(&cpu).unwrap();
    assert_eq!(json["state"], "Halted");
    assert_eq!(json["cycles"], 3);
    assert_eq!(json["regs"]["gp"][0], 8);
    assert_eq!(json["regs"]["gp"][7], 0xF4);

    let restored: Cpu = serde_json::from_value(json).unwrap();
    assert_eq!(restored.regs, cpu.regs);
    assert_eq!(restored.mem, cpu.mem);
}
