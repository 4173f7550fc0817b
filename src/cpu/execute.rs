//! CPU execution engine for the LS-8.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.
//! Handlers never touch the PC: each one returns a [`PcUpdate`] that the
//! loop applies after the handler succeeds.

use crate::cpu::{alu, stack, Memory, Registers};
use crate::cpu::alu::AluError;
use crate::cpu::decode::{self, Instruction, Opcode};
use crate::cpu::memory::MemoryError;
use crate::cpu::registers::RegisterError;
use crate::cpu::stack::StackError;
use log::{debug, info, trace};
use serde::{Serialize, Deserialize};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted (executed HLT instruction).
    Halted,
}

/// What a handler wants done with the PC once it has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcUpdate {
    /// Move past the instruction's own encoding.
    Advance(u8),
    /// Continue at an absolute address.
    Jump(u8),
    /// Stop the machine; the PC stays on the HLT.
    Halt,
}

/// The LS-8 CPU.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Instruction count.
    pub cycles: u64,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a new CPU in its power-on state.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Running,
            cycles: 0,
            last_instr: None,
        }
    }

    /// Reset the CPU to its power-on state.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.last_instr = None;
    }

    /// Load a program image into memory at address 0.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), MemoryError> {
        self.mem.load_program(0, program)?;
        debug!("loaded {} bytes at 0x00", program.len());
        Ok(())
    }

    /// Fetch the instruction at PC without executing it.
    ///
    /// Both operand candidates are always read; their addresses wrap so an
    /// opcode in the last two cells can still be fetched.
    pub fn fetch(&self) -> Result<Instruction, CpuError> {
        let pc = self.regs.pc;
        let opcode = self.mem.read(pc);
        let a = self.mem.read(pc.wrapping_add(1));
        let b = self.mem.read(pc.wrapping_add(2));

        decode::decode(opcode, a, b).map_err(|_| CpuError::UnknownOpcode { opcode, pc })
    }

    /// Execute a single instruction, writing PRN output to `out`.
    ///
    /// Returns the instruction that was executed, or an error.
    pub fn step<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<Instruction, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        let instr = self.fetch()?;
        trace!("{} {}", self.trace_line(), instr);

        let update = self.execute(instr, out)?;
        self.apply(update, instr.opcode)?;

        self.cycles += 1;
        self.last_instr = Some(instr);

        Ok(instr)
    }

    /// Run until halt or error.
    ///
    /// Returns the number of instructions executed.
    pub fn run<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.state == CpuState::Running {
            self.step(out)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited<W: Write + ?Sized>(&mut self, out: &mut W, max_cycles: u64) -> Result<u64, CpuError> {
        self.run_until(out, &AtomicBool::new(false), Some(max_cycles))
    }

    /// Run until halt, error, `stop` being raised, or `max_cycles`
    /// instructions if a limit is given.
    ///
    /// The flag is checked once before every fetch.
    pub fn run_until<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        stop: &AtomicBool,
        max_cycles: Option<u64>,
    ) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = max_cycles.map_or(u64::MAX, |max| self.cycles.saturating_add(max));

        while self.state == CpuState::Running && self.cycles < limit {
            if stop.load(Ordering::Relaxed) {
                info!("stop requested at PC={:#04x}", self.regs.pc);
                break;
            }
            self.step(out)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Execute a decoded instruction and report how the PC should move.
    fn execute<W: Write + ?Sized>(&mut self, instr: Instruction, out: &mut W) -> Result<PcUpdate, CpuError> {
        let Instruction { opcode, a, b } = instr;
        let width = opcode.width();

        let update = match opcode {
            Opcode::Hlt => PcUpdate::Halt,

            Opcode::Ldi => {
                self.regs.set(a, b)?;
                PcUpdate::Advance(width)
            }

            Opcode::Prn => {
                let value = self.regs.get(a)?;
                writeln!(out, "{}", value).map_err(|e| CpuError::Output(e.to_string()))?;
                PcUpdate::Advance(width)
            }

            // ==================== ALU ====================

            Opcode::Add | Opcode::Mul | Opcode::Cmp => {
                alu::execute(opcode, &mut self.regs, a, b)?;
                PcUpdate::Advance(width)
            }

            // ==================== Stack ====================

            Opcode::Push => {
                stack::push_register(&mut self.regs, &mut self.mem, a)?;
                PcUpdate::Advance(width)
            }

            Opcode::Pop => {
                // Reject a bad destination before SP moves.
                self.regs.check(a)?;
                let value = stack::pop(&mut self.regs, &self.mem)?;
                self.regs.set(a, value)?;
                PcUpdate::Advance(width)
            }

            Opcode::Call => {
                let target = self.regs.get(a)?;
                let pc = self.regs.pc;
                let return_addr = pc
                    .checked_add(width)
                    .ok_or(CpuError::PcOutOfRange { pc, width })?;
                stack::push(&mut self.regs, &mut self.mem, return_addr)?;
                PcUpdate::Jump(target)
            }

            Opcode::Ret => {
                let return_addr = stack::pop(&mut self.regs, &self.mem)?;
                PcUpdate::Jump(return_addr)
            }

            // ==================== Branches ====================

            Opcode::Jmp => PcUpdate::Jump(self.regs.get(a)?),

            Opcode::Jeq => {
                let target = self.regs.get(a)?;
                if self.regs.fl.is_equal() {
                    PcUpdate::Jump(target)
                } else {
                    PcUpdate::Advance(width)
                }
            }

            Opcode::Jne => {
                let target = self.regs.get(a)?;
                if !self.regs.fl.is_equal() {
                    PcUpdate::Jump(target)
                } else {
                    PcUpdate::Advance(width)
                }
            }
        };

        Ok(update)
    }

    /// Apply a handler's PC update.
    fn apply(&mut self, update: PcUpdate, opcode: Opcode) -> Result<(), CpuError> {
        match update {
            PcUpdate::Advance(width) => {
                let pc = self.regs.pc;
                self.regs.pc = pc
                    .checked_add(width)
                    .ok_or(CpuError::PcOutOfRange { pc, width })?;
            }
            PcUpdate::Jump(addr) => {
                debug_assert!(opcode.sets_pc(), "{} returned a jump", opcode);
                trace!("{} jumps to {:#04x}", opcode, addr);
                self.regs.pc = addr;
            }
            PcUpdate::Halt => {
                self.state = CpuState::Halted;
                info!("halted at PC={:#04x} after {} cycles", self.regs.pc, self.cycles + 1);
            }
        }
        Ok(())
    }

    /// One-line dump of PC, the three bytes at PC and every register.
    ///
    /// Format: `TRACE: PC | IR A B | R0 R1 R2 R3 R4 R5 R6 R7`, all in hex.
    pub fn trace_line(&self) -> String {
        let pc = self.regs.pc;
        let mut line = format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            pc,
            self.mem.read(pc),
            self.mem.read(pc.wrapping_add(1)),
            self.mem.read(pc.wrapping_add(2)),
        );
        for value in self.regs.all() {
            line.push_str(&format!(" {:02X}", value));
        }
        line
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("unknown opcode {opcode:#010b} at PC={pc:#04x}")]
    UnknownOpcode { opcode: u8, pc: u8 },

    #[error("PC would leave memory advancing {width} from {pc:#04x}")]
    PcOutOfRange { pc: u8, width: u8 },

    #[error("register error: {0}")]
    Register(#[from] RegisterError),

    #[error("stack error: {0}")]
    Stack(StackError),

    #[error("ALU error: {0}")]
    Alu(AluError),

    #[error("output error: {0}")]
    Output(String),
}

impl From<StackError> for CpuError {
    fn from(err: StackError) -> Self {
        match err {
            StackError::Register(e) => CpuError::Register(e),
            other => CpuError::Stack(other),
        }
    }
}

impl From<AluError> for CpuError {
    fn from(err: AluError) -> Self {
        match err {
            AluError::Register(e) => CpuError::Register(e),
            other => CpuError::Alu(other),
        }
    }
}
