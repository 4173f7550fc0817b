//! LS-8 memory subsystem.
//!
//! 256 byte cells addressed by an 8-bit value. Because addresses are `u8`,
//! every read and write through this API is in range by construction.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of memory cells in the LS-8.
pub const MEMORY_SIZE: usize = 256;

/// LS-8 memory: 256 byte cells.
///
/// Deserializing rejects any cell count other than [`MEMORY_SIZE`], so
/// every `u8` address stays valid for a restored memory.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MemoryRepr")]
pub struct Memory {
    cells: Vec<u8>,
}

#[derive(Deserialize)]
struct MemoryRepr {
    cells: Vec<u8>,
}

impl TryFrom<MemoryRepr> for Memory {
    type Error = MemoryError;

    fn try_from(repr: MemoryRepr) -> Result<Self, Self::Error> {
        if repr.cells.len() != MEMORY_SIZE {
            return Err(MemoryError::WrongSize { len: repr.cells.len() });
        }
        Ok(Self { cells: repr.cells })
    }
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Read a cell by address.
    #[inline]
    pub fn read(&self, addr: u8) -> u8 {
        self.cells[addr as usize]
    }

    /// Write a cell by address.
    #[inline]
    pub fn write(&mut self, addr: u8, value: u8) {
        self.cells[addr as usize] = value;
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = 0);
    }

    /// Load a program into memory starting at the given address.
    pub fn load_program(&mut self, start_addr: u8, program: &[u8]) -> Result<(), MemoryError> {
        let start = start_addr as usize;
        if start + program.len() > MEMORY_SIZE {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available: MEMORY_SIZE - start,
            });
        }

        self.cells[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Dump memory contents (for debugging).
    pub fn dump(&self, start: u8, count: usize) -> Vec<(u8, u8)> {
        let start = start as usize;
        let end = (start + count).min(MEMORY_SIZE);
        (start..end)
            .map(|i| (i as u8, self.cells[i]))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&cell| cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Program is too large to fit in memory.
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },

    /// A restored memory did not have exactly 256 cells.
    #[error("memory has {len} cells, expected 256")]
    WrongSize { len: usize },
}
