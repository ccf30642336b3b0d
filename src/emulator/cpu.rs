//! The fetch-decode-execute loop and every instruction's execution
//! semantics.

use std::io::{self, Read, Write};

use crate::error::{EmuError, EmuErrorKind};

use super::instruction::{sign_extend, Instruction};
use super::memory::{Memory, INTERRUPT_VECTOR_TABLE, TRAP_VECTOR_TABLE};
use super::psr::Psr;
use super::registers::Registers;

const TRAP_GETC: u8 = 0x20;
const TRAP_OUT: u8 = 0x21;
const TRAP_PUTS: u8 = 0x22;
const TRAP_IN: u8 = 0x23;
const TRAP_PUTSP: u8 = 0x24;
const TRAP_HALT: u8 = 0x25;

pub struct Cpu {
    pub memory: Memory,
    pub registers: Registers,
    pub psr: Psr,
    pub pc: u16,
    ssp: u16,
    pending_interrupt: Option<u8>,
}

impl Cpu {
    pub fn new(pc: u16) -> Self {
        Self {
            memory: Memory::new(),
            registers: Registers::new(),
            psr: Psr::new(),
            pc,
            ssp: 0x3000,
            pending_interrupt: None,
        }
    }

    pub fn with_memory(pc: u16, memory: Memory) -> Self {
        Self {
            memory,
            registers: Registers::new(),
            psr: Psr::new(),
            pc,
            ssp: 0x3000,
            pending_interrupt: None,
        }
    }

    /// Signals an asynchronous interrupt to be serviced at the top of the
    /// next fetch cycle, mirroring an external `int_sig` line going high.
    pub fn signal_interrupt(&mut self, intv: u8) {
        self.pending_interrupt = Some(intv);
    }

    /// Runs until the MCR is cleared, the PC runs off the end of memory,
    /// or an illegal opcode is fetched.
    pub fn run(&mut self) -> Result<(), EmuError> {
        while self.memory.is_running() {
            if let Some(intv) = self.pending_interrupt.take() {
                self.enter_supervisor(INTERRUPT_VECTOR_TABLE + intv as u16);
            }

            self.step_device_hook();

            let fetch_pc = self.pc;
            let word = self.memory.read(fetch_pc);
            self.pc = self.pc.wrapping_add(1);
            let instruction = Instruction::decode(word);
            self.execute(instruction)?;

            // The instruction at 0xFFFF still executes; only flag an
            // overflow if it didn't itself redirect control flow away
            // from the wraparound address.
            if fetch_pc == 0xFFFF && self.pc == 0 {
                return Err(EmuError::new(
                    EmuErrorKind::PcOverflow,
                    "program counter overflowed memory past xFFFF".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn execute(&mut self, instruction: Instruction) -> Result<(), EmuError> {
        match instruction {
            Instruction::AddReg { dr, sr1, sr2 } => {
                let result = self
                    .registers
                    .get(sr1)
                    .wrapping_add(self.registers.get(sr2));
                self.registers.set(dr, result);
                self.psr.set_condition(result);
            }
            Instruction::AddImm { dr, sr1, imm5 } => {
                let result = self.registers.get(sr1).wrapping_add(imm5);
                self.registers.set(dr, result);
                self.psr.set_condition(result);
            }
            Instruction::AndReg { dr, sr1, sr2 } => {
                let result = self.registers.get(sr1) & self.registers.get(sr2);
                self.registers.set(dr, result);
                self.psr.set_condition(result);
            }
            Instruction::AndImm { dr, sr1, imm5 } => {
                let result = self.registers.get(sr1) & imm5;
                self.registers.set(dr, result);
                self.psr.set_condition(result);
            }
            Instruction::Not { dr, sr } => {
                let result = !self.registers.get(sr);
                self.registers.set(dr, result);
                self.psr.set_condition(result);
            }
            Instruction::Br { n, z, p, pc_offset9 } => {
                let taken = (n && self.psr.n()) || (z && self.psr.z()) || (p && self.psr.p());
                if taken {
                    self.pc = self.pc.wrapping_add(pc_offset9);
                }
            }
            Instruction::Jmp { base_r } => {
                self.pc = self.registers.get(base_r);
            }
            Instruction::Jsr { pc_offset11 } => {
                self.registers.set(7, self.pc);
                self.pc = self.pc.wrapping_add(pc_offset11);
            }
            Instruction::Jsrr { base_r } => {
                let target = self.registers.get(base_r);
                self.registers.set(7, self.pc);
                self.pc = target;
            }
            Instruction::Ld { dr, pc_offset9 } => {
                let addr = self.pc.wrapping_add(pc_offset9);
                let value = self.memory.read(addr);
                self.registers.set(dr, value);
                self.psr.set_condition(value);
            }
            Instruction::Ldi { dr, pc_offset9 } => {
                let ptr = self.pc.wrapping_add(pc_offset9);
                let addr = self.memory.read(ptr);
                let value = self.memory.read(addr);
                self.registers.set(dr, value);
                self.psr.set_condition(value);
            }
            Instruction::Ldr { dr, base_r, offset6 } => {
                let addr = self.registers.get(base_r).wrapping_add(offset6);
                let value = self.memory.read(addr);
                self.registers.set(dr, value);
                self.psr.set_condition(value);
            }
            Instruction::Lea { dr, pc_offset9 } => {
                let addr = self.pc.wrapping_add(pc_offset9);
                self.registers.set(dr, addr);
                self.psr.set_condition(addr);
            }
            Instruction::St { sr, pc_offset9 } => {
                let addr = self.pc.wrapping_add(pc_offset9);
                self.memory.write(addr, self.registers.get(sr));
            }
            Instruction::Sti { sr, pc_offset9 } => {
                let ptr = self.pc.wrapping_add(pc_offset9);
                let addr = self.memory.read(ptr);
                self.memory.write(addr, self.registers.get(sr));
            }
            Instruction::Str { sr, base_r, offset6 } => {
                let addr = self.registers.get(base_r).wrapping_add(offset6);
                self.memory.write(addr, self.registers.get(sr));
            }
            Instruction::Trap { trapvect8 } => {
                self.registers.set(7, self.pc);
                self.execute_trap(trapvect8)?;
            }
            Instruction::Rti => {
                if !self.psr.is_user() {
                    self.pc = self.pop_supervisor();
                    self.psr = Psr::from_u16(self.pop_supervisor());
                } else {
                    // Privilege-mode violation: RTI from user mode dispatches
                    // through interrupt vector 0x0100 instead of trapping fatally.
                    self.enter_supervisor(INTERRUPT_VECTOR_TABLE);
                }
            }
            Instruction::Reserved => {
                return Err(EmuError::new(
                    EmuErrorKind::IllegalOpcode,
                    format!("illegal opcode fetched at x{:04X}", self.pc.wrapping_sub(1)),
                ));
            }
        }
        Ok(())
    }

    fn execute_trap(&mut self, trapvect8: u8) -> Result<(), EmuError> {
        match trapvect8 {
            TRAP_GETC => {
                let mut byte = [0u8; 1];
                io::stdin()
                    .read_exact(&mut byte)
                    .map_err(|e| EmuError::new(EmuErrorKind::Io, e.to_string()))?;
                self.registers.set(0, byte[0] as u16);
            }
            TRAP_OUT => {
                let ch = (self.registers.get(0) & 0xFF) as u8 as char;
                print!("{ch}");
                io::stdout()
                    .flush()
                    .map_err(|e| EmuError::new(EmuErrorKind::Io, e.to_string()))?;
            }
            TRAP_PUTS => {
                let mut addr = self.registers.get(0);
                loop {
                    let word = self.memory.read(addr);
                    if word == 0 {
                        break;
                    }
                    print!("{}", (word & 0xFF) as u8 as char);
                    addr = addr.wrapping_add(1);
                }
                io::stdout()
                    .flush()
                    .map_err(|e| EmuError::new(EmuErrorKind::Io, e.to_string()))?;
            }
            TRAP_IN => {
                print!("Enter a character: ");
                io::stdout()
                    .flush()
                    .map_err(|e| EmuError::new(EmuErrorKind::Io, e.to_string()))?;
                let mut byte = [0u8; 1];
                io::stdin()
                    .read_exact(&mut byte)
                    .map_err(|e| EmuError::new(EmuErrorKind::Io, e.to_string()))?;
                print!("{}", byte[0] as char);
                self.registers.set(0, byte[0] as u16);
            }
            TRAP_PUTSP => {
                let mut addr = self.registers.get(0);
                loop {
                    let word = self.memory.read(addr);
                    if word == 0 {
                        break;
                    }
                    let lo = (word & 0xFF) as u8 as char;
                    print!("{lo}");
                    let hi = (word >> 8) as u8;
                    if hi != 0 {
                        print!("{}", hi as char);
                    }
                    addr = addr.wrapping_add(1);
                }
                io::stdout()
                    .flush()
                    .map_err(|e| EmuError::new(EmuErrorKind::Io, e.to_string()))?;
            }
            TRAP_HALT => {
                self.memory.halt();
            }
            _ => {
                self.enter_supervisor(TRAP_VECTOR_TABLE + trapvect8 as u16);
            }
        }
        Ok(())
    }

    /// Pushes PSR then PC onto the supervisor stack, clears the user-mode
    /// bit, and jumps through `memory[vector]`. Used for both trap dispatch
    /// through the low table and interrupt servicing, so a single RTI can
    /// unwind either path by popping PC then PSR.
    fn enter_supervisor(&mut self, vector: u16) {
        self.push_supervisor(self.psr.as_u16());
        self.push_supervisor(self.pc);
        self.psr.set_user(false);
        self.pc = self.memory.read(vector);
    }

    fn push_supervisor(&mut self, value: u16) {
        self.ssp = self.ssp.wrapping_sub(1);
        self.memory.write(self.ssp, value);
    }

    fn pop_supervisor(&mut self) -> u16 {
        let value = self.memory.read(self.ssp);
        self.ssp = self.ssp.wrapping_add(1);
        value
    }

    /// A placeholder for device polling (keyboard/display readiness), run
    /// once per fetch cycle as a single cooperative step rather than on a
    /// background thread. A no-op until a device model is wired in.
    fn step_device_hook(&mut self) {}
}
