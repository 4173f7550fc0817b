//! LS-8 CPU registers.
//!
//! The LS-8 has:
//! - R0-R7: eight 8-bit general purpose registers
//! - R7 doubles as the stack pointer (SP), reset to 0xF4
//! - PC: 8-bit program counter
//! - FL: condition flags written by CMP

use serde::{Serialize, Deserialize};
use std::cmp::Ordering;
use thiserror::Error;

/// Number of general purpose registers.
pub const REGISTER_COUNT: usize = 8;

/// Index of the register used as the stack pointer.
pub const SP: u8 = 7;

/// Initial value of the stack pointer.
pub const SP_INIT: u8 = 0xF4;

/// The FL register.
///
/// Holds the outcome of the last comparison as exactly one of the
/// `LESS`, `GREATER` or `EQUAL` bits. All bits are clear until the
/// first CMP executes.
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flags(u8);

impl Flags {
    pub const LESS: u8 = 0b0000_0100;
    pub const GREATER: u8 = 0b0000_0010;
    pub const EQUAL: u8 = 0b0000_0001;

    /// Flags with no comparison recorded.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Replace the flags with the outcome of an unsigned comparison.
    pub fn set_comparison(&mut self, ordering: Ordering) {
        self.0 = match ordering {
            Ordering::Less => Self::LESS,
            Ordering::Greater => Self::GREATER,
            Ordering::Equal => Self::EQUAL,
        };
    }

    pub fn is_less(&self) -> bool {
        self.0 & Self::LESS != 0
    }

    pub fn is_greater(&self) -> bool {
        self.0 & Self::GREATER != 0
    }

    pub fn is_equal(&self) -> bool {
        self.0 & Self::EQUAL != 0
    }

    /// Raw bit pattern.
    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl std::fmt::Debug for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let l = if self.is_less() { 'L' } else { '-' };
        let g = if self.is_greater() { 'G' } else { '-' };
        let e = if self.is_equal() { 'E' } else { '-' };
        write!(f, "FL={}{}{}", l, g, e)
    }
}

/// The LS-8 register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// R0-R7. R7 is the stack pointer.
    gp: [u8; REGISTER_COUNT],

    /// Program counter.
    pub pc: u8,

    /// Condition flags.
    pub fl: Flags,
}

impl Registers {
    /// Create a new register file: everything zeroed except SP.
    pub fn new() -> Self {
        let mut gp = [0; REGISTER_COUNT];
        gp[SP as usize] = SP_INIT;
        Self {
            gp,
            pc: 0,
            fl: Flags::empty(),
        }
    }

    /// Reset all registers to their power-on values.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Fail unless `index` names one of R0-R7.
    pub fn check(&self, index: u8) -> Result<(), RegisterError> {
        if (index as usize) < REGISTER_COUNT {
            Ok(())
        } else {
            Err(RegisterError::InvalidRegister(index))
        }
    }

    /// Read a register by its encoded index.
    pub fn get(&self, index: u8) -> Result<u8, RegisterError> {
        self.gp
            .get(index as usize)
            .copied()
            .ok_or(RegisterError::InvalidRegister(index))
    }

    /// Write a register by its encoded index.
    pub fn set(&mut self, index: u8, value: u8) -> Result<(), RegisterError> {
        let slot = self.gp
            .get_mut(index as usize)
            .ok_or(RegisterError::InvalidRegister(index))?;
        *slot = value;
        Ok(())
    }

    /// Current stack pointer.
    #[inline]
    pub fn sp(&self) -> u8 {
        self.gp[SP as usize]
    }

    #[inline]
    pub fn set_sp(&mut self, value: u8) {
        self.gp[SP as usize] = value;
    }

    /// All general purpose registers, R0 first.
    pub fn all(&self) -> &[u8; REGISTER_COUNT] {
        &self.gp
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors raised when an operand names a register that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("invalid register R{0} (expected R0-R7)")]
    InvalidRegister(u8),
}
