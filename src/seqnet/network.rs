//! Sequential network: program memory plus program counter.
//!
//! One call to [`SequentialNetwork::step`] fetches the word at PC, decodes it,
//! and moves PC either to the encoded jump address (condition active) or to
//! the next word. PC wraps around at the end of memory.

use super::instruction::Instruction;
use super::program::Program;

/// Number of 16-bit words in program memory. Every `u8` is a valid address.
pub const PROGRAM_MEMORY_SIZE: usize = 256;

/// Microprogrammed sequencer state.
#[derive(Debug, Clone)]
pub struct SequentialNetwork {
    /// Encoded instruction words.
    program: [u16; PROGRAM_MEMORY_SIZE],
    /// Program counter.
    pc: u8,
}

impl SequentialNetwork {
    /// Create a network with cleared memory and PC at 0.
    pub fn new() -> Self {
        Self {
            program: [0; PROGRAM_MEMORY_SIZE],
            pc: 0,
        }
    }

    /// Create a network with `program` loaded at address 0.
    pub fn with_program(program: &Program) -> Self {
        let mut network = Self::new();
        network.load(program);
        network
    }

    /// Reset PC to 0 and clear program memory.
    pub fn init(&mut self) {
        self.pc = 0;
        self.program.fill(0);
    }

    /// Clear memory and write `program` starting at address 0.
    /// PC is left untouched.
    pub fn load(&mut self, program: &Program) {
        self.program.fill(0);
        let words = program.words();
        self.program[..words.len()].copy_from_slice(words);
        log::debug!("Loaded {} instruction words", words.len());
    }

    /// Program memory contents.
    pub fn program_memory(&self) -> &[u16; PROGRAM_MEMORY_SIZE] {
        &self.program
    }

    /// Mutable program memory, for tests and direct patching.
    pub fn program_memory_mut(&mut self) -> &mut [u16; PROGRAM_MEMORY_SIZE] {
        &mut self.program
    }

    /// Current program counter.
    pub fn pc(&self) -> u8 {
        log::trace!("PC get: 0x{:02X}", self.pc);
        self.pc
    }

    /// Force the program counter.
    pub fn set_pc(&mut self, value: u8) {
        self.pc = value;
        log::trace!("PC set: 0x{:02X}", self.pc);
    }

    /// Decode the instruction at PC without stepping.
    pub fn current_instruction(&self) -> Instruction {
        Instruction::decode(self.program[self.pc as usize])
    }

    /// Execute the instruction at PC and advance or jump.
    ///
    /// `condition_active` is the condition selector's result for this
    /// instruction (after inversion). Returns the decoded instruction.
    pub fn step(&mut self, condition_active: bool) -> Instruction {
        let instr = self.current_instruction();

        if condition_active {
            self.pc = instr.jump_addr;
            log::trace!("PC jump: 0x{:02X}", self.pc);
        } else {
            self.pc = self.pc.wrapping_add(1);
            log::trace!("PC increment: 0x{:02X}", self.pc);
        }

        instr
    }
}

impl Default for SequentialNetwork {
    fn default() -> Self {
        Self::new()
    }
}
