//! # LS-8 Emulator
//!
//! An emulator of the LS-8, a minimal 8-bit stored-program computer with
//! 256 bytes of memory, eight registers (R7 doubling as the stack pointer),
//! a program counter and a flags register.
//!
//! Programs are loaded from a text image (one binary byte per line) and run
//! by a fetch-decode-execute loop until they halt.

pub mod cpu;
pub mod image;

// Re-export commonly used types
pub use cpu::{Cpu, CpuState, CpuError, Memory, Registers, Flags, Instruction, Opcode};
pub use image::{load_image, parse_image, disassemble, ImageError, ProgramImage};
