//! Program images: loading and disassembly.
//!
//! This module provides:
//! - A loader for the text image format (one binary byte per line)
//! - A disassembler (image bytes → readable text)

pub mod loader;
pub mod disasm;

pub use loader::{load_image, parse_image, ImageError, ProgramImage};
pub use disasm::disassemble;
