//! The LS-8 stack.
//!
//! A LIFO over main memory addressed by SP (R7). The stack grows toward
//! address 0: a push decrements SP and then writes, a pop reads and then
//! increments SP. SP never leaves the 0..=255 range; a push at SP 0 or a
//! pop at SP 0xFF fails instead of wrapping.

use crate::cpu::memory::Memory;
use crate::cpu::registers::{RegisterError, Registers};
use thiserror::Error;

/// Push a byte. Nothing is modified on overflow.
pub fn push(regs: &mut Registers, mem: &mut Memory, value: u8) -> Result<(), StackError> {
    let sp = regs.sp().checked_sub(1).ok_or(StackError::Overflow)?;
    regs.set_sp(sp);
    mem.write(sp, value);
    Ok(())
}

/// Pop a byte. Nothing is modified on underflow.
pub fn pop(regs: &mut Registers, mem: &Memory) -> Result<u8, StackError> {
    let sp = regs.sp();
    let next = sp.checked_add(1).ok_or(StackError::Underflow)?;
    let value = mem.read(sp);
    regs.set_sp(next);
    Ok(value)
}

/// Push the contents of register `index`.
///
/// The register is read after SP has been decremented, so pushing R7
/// stores the new SP. Nothing is modified on error.
pub fn push_register(regs: &mut Registers, mem: &mut Memory, index: u8) -> Result<(), StackError> {
    regs.check(index)?;
    let sp = regs.sp().checked_sub(1).ok_or(StackError::Overflow)?;
    regs.set_sp(sp);
    let value = regs.get(index)?;
    mem.write(sp, value);
    Ok(())
}

/// Stack discipline violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("stack overflow: SP would move below address 0x00")]
    Overflow,

    #[error("stack underflow: SP would move past address 0xFF")]
    Underflow,

    #[error(transparent)]
    Register(#[from] RegisterError),
}
