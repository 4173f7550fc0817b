//! CPU emulation for the LS-8.
//!
//! This module implements the complete LS-8 architecture:
//! - 256 byte memory cells
//! - 8 general purpose registers, R7 doubling as the stack pointer
//! - PC and FL registers
//! - 13-instruction set dispatched through a fixed opcode table

pub mod memory;
pub mod registers;
pub mod decode;
pub mod alu;
pub mod stack;
pub mod execute;

pub use memory::{Memory, MemoryError};
pub use registers::{Flags, Registers, RegisterError};
pub use decode::{Instruction, Opcode, DecodeError};
pub use alu::AluError;
pub use stack::StackError;
pub use execute::{Cpu, CpuError, CpuState, PcUpdate};
