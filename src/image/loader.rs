//! LS-8 program image format.
//!
//! A plain text format:
//! - One byte per line, written as exactly eight binary digits
//! - `#` starts a comment that runs to the end of the line
//! - Blank and comment-only lines are ignored
//!
//! ```text
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! ```

use crate::cpu::memory::MEMORY_SIZE;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// A parsed program image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramImage {
    /// Bytes in load order, starting at address 0.
    pub bytes: Vec<u8>,
    /// 1-based source line of each byte.
    pub source_lines: Vec<usize>,
}

impl ProgramImage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, byte: u8, line: usize) {
        self.bytes.push(byte);
        self.source_lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Source line that produced the byte at `addr`, if the image covers it.
    pub fn line_of(&self, addr: u8) -> Option<usize> {
        self.source_lines.get(addr as usize).copied()
    }
}

/// Parse a single image line.
///
/// Returns `Ok(None)` for lines that carry no byte.
pub fn parse_line(line: &str) -> Result<Option<u8>, String> {
    let code = match line.split_once('#') {
        Some((code, _comment)) => code,
        None => line,
    }
    .trim();

    if code.is_empty() {
        return Ok(None);
    }

    if code.len() != 8 || !code.bytes().all(|c| c == b'0' || c == b'1') {
        return Err(code.to_string());
    }

    u8::from_str_radix(code, 2)
        .map(Some)
        .map_err(|_| code.to_string())
}

/// Parse an image from any buffered reader.
pub fn read_image<R: BufRead>(reader: R) -> Result<ProgramImage, ImageError> {
    let mut image = ProgramImage::new();

    for (index, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| ImageError::Io(e.to_string()))?;
        let line_num = index + 1;

        let byte = parse_line(&line)
            .map_err(|content| ImageError::Format { line: line_num, content })?;

        if let Some(byte) = byte {
            image.push(byte, line_num);
        }
    }

    if image.len() > MEMORY_SIZE {
        return Err(ImageError::TooLarge { size: image.len() });
    }

    Ok(image)
}

/// Parse an image held in memory.
pub fn parse_image(text: &str) -> Result<ProgramImage, ImageError> {
    read_image(text.as_bytes())
}

/// Load an image file from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<ProgramImage, ImageError> {
    let file = std::fs::File::open(path.as_ref())
        .map_err(|e| ImageError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
    let image = read_image(BufReader::new(file))?;
    log::debug!("parsed {} bytes from {}", image.len(), path.as_ref().display());
    Ok(image)
}

/// Errors that can occur while loading an image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("format error on line {line}: expected 8 binary digits, found {content:?}")]
    Format { line: usize, content: String },

    #[error("image holds {size} bytes, more than fit in memory")]
    TooLarge { size: usize },
}
