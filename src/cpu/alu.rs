//! Arithmetic/logic unit.
//!
//! Operates on two register operands. Results of ADD and MUL are written
//! back to the first register modulo 256; CMP only writes FL.

use crate::cpu::decode::Opcode;
use crate::cpu::registers::{RegisterError, Registers};
use thiserror::Error;

/// Wrapping 8-bit addition.
#[inline]
pub fn add(a: u8, b: u8) -> u8 {
    a.wrapping_add(b)
}

/// Wrapping 8-bit multiplication.
#[inline]
pub fn mul(a: u8, b: u8) -> u8 {
    a.wrapping_mul(b)
}

/// Run an ALU operation on registers `reg_a` and `reg_b`.
///
/// Both registers are read before anything is written, so a bad register
/// index leaves the register file untouched.
pub fn execute(op: Opcode, regs: &mut Registers, reg_a: u8, reg_b: u8) -> Result<(), AluError> {
    if !op.is_alu() {
        return Err(AluError::UnsupportedOperation(op));
    }

    let a = regs.get(reg_a)?;
    let b = regs.get(reg_b)?;

    match op {
        Opcode::Add => regs.set(reg_a, add(a, b))?,
        Opcode::Mul => regs.set(reg_a, mul(a, b))?,
        Opcode::Cmp => regs.fl.set_comparison(a.cmp(&b)),
        other => return Err(AluError::UnsupportedOperation(other)),
    }

    Ok(())
}

/// Errors raised by the ALU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AluError {
    /// The ALU was handed an opcode it does not implement. This is a
    /// dispatch defect, not a property of the program being run.
    #[error("unsupported ALU operation {0}")]
    UnsupportedOperation(Opcode),

    #[error(transparent)]
    Register(#[from] RegisterError),
}
