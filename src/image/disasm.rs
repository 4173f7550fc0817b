//! Disassembler for LS-8 images.
//!
//! Converts raw image bytes back to readable assembly.

use crate::cpu::decode::decode;

/// Disassemble the instruction starting at `addr`.
///
/// Returns the text and the number of bytes consumed. Bytes that are not
/// opcodes are rendered as data and consume one byte. Operands missing at
/// the end of the slice read as zero.
pub fn disassemble_instruction(bytes: &[u8], addr: usize) -> (String, usize) {
    let byte_at = |i: usize| bytes.get(i).copied().unwrap_or(0);

    match decode(byte_at(addr), byte_at(addr + 1), byte_at(addr + 2)) {
        Ok(instr) => (instr.to_string(), instr.opcode.width() as usize),
        Err(_) => (format!("DB {:#04x}", byte_at(addr)), 1),
    }
}

/// Disassemble a whole image into a listing.
pub fn disassemble(bytes: &[u8]) -> String {
    let mut output = String::new();
    output.push_str("; LS-8 Disassembly\n");
    output.push_str("; -----------------\n\n");

    let mut addr = 0;
    while addr < bytes.len() {
        let (text, width) = disassemble_instruction(bytes, addr);
        let end = (addr + width).min(bytes.len());
        let raw: Vec<String> = bytes[addr..end].iter().map(|b| format!("{:08b}", b)).collect();
        output.push_str(&format!("{:02X}: {:<12} ; {}\n", addr, text, raw.join(" ")));
        addr += width;
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_hlt() {
        let (text, width) = disassemble_instruction(&[0b0000_0001], 0);
        assert_eq!(text, "HLT");
        assert_eq!(width, 1);
    }

    #[test]
    fn test_disassemble_ldi() {
        let (text, width) = disassemble_instruction(&[0x82, 0x00, 0x08], 0);
        assert_eq!(text, "LDI R0,8");
        assert_eq!(width, 3);
    }

    #[test]
    fn test_data_byte() {
        let (text, width) = disassemble_instruction(&[0x00], 0);
        assert_eq!(text, "DB 0x00");
        assert_eq!(width, 1);
    }

    #[test]
    fn test_listing() {
        let listing = disassemble(&[0x82, 0x00, 0x08, 0x47, 0x00, 0x01]);

        assert!(listing.contains("00: LDI R0,8"));
        assert!(listing.contains("03: PRN R0"));
        assert!(listing.contains("05: HLT"));
        assert!(listing.contains("10000010 00000000 00001000"));
    }

    #[test]
    fn test_truncated_instruction() {
        let listing = disassemble(&[0x82, 0x00]);
        assert!(listing.contains("00: LDI R0,0"));
    }
}
