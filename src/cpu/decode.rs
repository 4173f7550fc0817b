//! Instruction decoder for the LS-8.
//!
//! Every opcode byte has the layout `AABCDDDD`:
//! - `AA`: number of operand bytes that follow (0-2)
//! - `B`: set for operations handled by the ALU
//! - `C`: set for instructions that write the PC themselves
//! - `DDDD`: instruction identifier
//!
//! Only the thirteen opcodes below exist; any other byte is rejected.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The fixed LS-8 opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    Hlt = 0b0000_0001,
    Ldi = 0b1000_0010,
    Prn = 0b0100_0111,
    Add = 0b1010_0000,
    Mul = 0b1010_0010,
    Push = 0b0100_0101,
    Pop = 0b0100_0110,
    Call = 0b0101_0000,
    Ret = 0b0001_0001,
    Cmp = 0b1010_0111,
    Jmp = 0b0101_0100,
    Jeq = 0b0101_0101,
    Jne = 0b0101_0110,
}

impl Opcode {
    /// Every opcode, in table order.
    pub const ALL: [Opcode; 13] = [
        Opcode::Hlt,
        Opcode::Ldi,
        Opcode::Prn,
        Opcode::Add,
        Opcode::Mul,
        Opcode::Push,
        Opcode::Pop,
        Opcode::Call,
        Opcode::Ret,
        Opcode::Cmp,
        Opcode::Jmp,
        Opcode::Jeq,
        Opcode::Jne,
    ];

    /// Look up an opcode byte in the table.
    pub fn from_byte(byte: u8) -> Option<Self> {
        let op = match byte {
            0b0000_0001 => Opcode::Hlt,
            0b1000_0010 => Opcode::Ldi,
            0b0100_0111 => Opcode::Prn,
            0b1010_0000 => Opcode::Add,
            0b1010_0010 => Opcode::Mul,
            0b0100_0101 => Opcode::Push,
            0b0100_0110 => Opcode::Pop,
            0b0101_0000 => Opcode::Call,
            0b0001_0001 => Opcode::Ret,
            0b1010_0111 => Opcode::Cmp,
            0b0101_0100 => Opcode::Jmp,
            0b0101_0101 => Opcode::Jeq,
            0b0101_0110 => Opcode::Jne,
            _ => return None,
        };
        Some(op)
    }

    /// The encoded opcode byte.
    #[inline]
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Number of operand bytes following the opcode.
    #[inline]
    pub fn operand_count(self) -> u8 {
        self.byte() >> 6
    }

    /// Encoded width of the instruction in bytes.
    #[inline]
    pub fn width(self) -> u8 {
        1 + self.operand_count()
    }

    /// Whether the ALU executes this instruction.
    #[inline]
    pub fn is_alu(self) -> bool {
        self.byte() & 0b0010_0000 != 0
    }

    /// Whether the instruction may set the PC itself.
    #[inline]
    pub fn sets_pc(self) -> bool {
        self.byte() & 0b0001_0000 != 0
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Hlt => "HLT",
            Opcode::Ldi => "LDI",
            Opcode::Prn => "PRN",
            Opcode::Add => "ADD",
            Opcode::Mul => "MUL",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::Call => "CALL",
            Opcode::Ret => "RET",
            Opcode::Cmp => "CMP",
            Opcode::Jmp => "JMP",
            Opcode::Jeq => "JEQ",
            Opcode::Jne => "JNE",
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A fetched instruction: the opcode plus both candidate operand bytes.
///
/// The fetch always reads two bytes after the opcode whatever the real
/// operand count is, so `a` and `b` may hold unrelated data for narrower
/// instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub a: u8,
    pub b: u8,
}

impl Instruction {
    pub fn new(opcode: Opcode, a: u8, b: u8) -> Self {
        Self { opcode, a, b }
    }

    /// The operand bytes this opcode actually uses.
    pub fn operands(&self) -> Vec<u8> {
        [self.a, self.b]
            .into_iter()
            .take(self.opcode.operand_count() as usize)
            .collect()
    }
}

impl std::fmt::Display for Instruction {
    /// Assembly-style text, e.g. `LDI R0,8` or `ADD R0,R1`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = self.opcode;
        match (op, op.operand_count()) {
            (Opcode::Ldi, _) => write!(f, "{} R{},{}", op, self.a, self.b),
            (_, 0) => write!(f, "{}", op),
            (_, 1) => write!(f, "{} R{}", op, self.a),
            _ => write!(f, "{} R{},R{}", op, self.a, self.b),
        }
    }
}

/// Decode an opcode byte and its two candidate operand bytes.
pub fn decode(opcode: u8, a: u8, b: u8) -> Result<Instruction, DecodeError> {
    let op = Opcode::from_byte(opcode).ok_or(DecodeError::UnknownOpcode(opcode))?;
    Ok(Instruction::new(op, a, b))
}

/// Encode an instruction to its bytes, keeping only the operands it uses.
pub fn encode(instr: &Instruction) -> Vec<u8> {
    let mut bytes = vec![instr.opcode.byte()];
    bytes.extend(instr.operands());
    bytes
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode {0:#010b}")]
    UnknownOpcode(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lookup_matches_discriminants() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_byte(op.byte()), Some(op));
        }
    }

    #[test]
    fn test_unknown_bytes_rejected() {
        let known: Vec<u8> = Opcode::ALL.iter().map(|op| op.byte()).collect();
        for byte in 0..=255u8 {
            if !known.contains(&byte) {
                assert_eq!(Opcode::from_byte(byte), None, "byte {:#010b}", byte);
            }
        }
        assert_eq!(decode(0, 0, 0), Err(DecodeError::UnknownOpcode(0)));
    }

    #[test]
    fn test_widths() {
        assert_eq!(Opcode::Hlt.width(), 1);
        assert_eq!(Opcode::Ret.width(), 1);
        assert_eq!(Opcode::Prn.width(), 2);
        assert_eq!(Opcode::Push.width(), 2);
        assert_eq!(Opcode::Jne.width(), 2);
        assert_eq!(Opcode::Ldi.width(), 3);
        assert_eq!(Opcode::Add.width(), 3);
        assert_eq!(Opcode::Mul.width(), 3);
        assert_eq!(Opcode::Cmp.width(), 3);
    }

    #[test]
    fn test_flag_bits() {
        let alu: Vec<Opcode> = Opcode::ALL.into_iter().filter(|op| op.is_alu()).collect();
        assert_eq!(alu, vec![Opcode::Add, Opcode::Mul, Opcode::Cmp]);

        let sets_pc: Vec<Opcode> = Opcode::ALL.into_iter().filter(|op| op.sets_pc()).collect();
        assert_eq!(
            sets_pc,
            vec![Opcode::Call, Opcode::Ret, Opcode::Jmp, Opcode::Jeq, Opcode::Jne]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Instruction::new(Opcode::Ldi, 0, 8).to_string(), "LDI R0,8");
        assert_eq!(Instruction::new(Opcode::Prn, 0, 1).to_string(), "PRN R0");
        assert_eq!(Instruction::new(Opcode::Mul, 0, 1).to_string(), "MUL R0,R1");
        assert_eq!(Instruction::new(Opcode::Ret, 3, 4).to_string(), "RET");
    }

    #[test]
    fn test_encode_drops_unused_operands() {
        assert_eq!(encode(&Instruction::new(Opcode::Hlt, 9, 9)), vec![0b0000_0001]);
        assert_eq!(encode(&Instruction::new(Opcode::Prn, 0, 9)), vec![0b0100_0111, 0]);
        assert_eq!(
            encode(&Instruction::new(Opcode::Ldi, 0, 8)),
            vec![0b1000_0010, 0, 8]
        );
    }
}
