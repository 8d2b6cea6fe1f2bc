//! Programs for the sequential network.
//!
//! A [`Program`] is the list of encoded words written to program memory at
//! address 0. Programs can be built from [`Instruction`]s, loaded from a
//! binary image (little-endian 16-bit words), or taken from the built-in
//! default elevator program.

use std::fmt::Write as _;
use std::io::Cursor;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

use super::condsel::ConditionIndex;
use super::instruction::{DoorRequest, Instruction};
use super::network::PROGRAM_MEMORY_SIZE;

/// Program construction and image errors.
#[derive(Debug, Error)]
pub enum ProgramError {
    /// More words than program memory holds.
    #[error("program has {0} words, program memory holds {max}", max = PROGRAM_MEMORY_SIZE)]
    TooLarge(usize),

    /// Image is not a whole number of 16-bit words.
    #[error("program image length {0} is not a multiple of 2")]
    OddLength(usize),

    /// Failed to read or write an image file.
    #[error("program image I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encoded program.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    words: Vec<u16>,
}

impl Program {
    /// Build from raw words.
    pub fn from_words(words: Vec<u16>) -> Result<Self, ProgramError> {
        if words.len() > PROGRAM_MEMORY_SIZE {
            return Err(ProgramError::TooLarge(words.len()));
        }
        Ok(Self { words })
    }

    /// Build from decoded instructions.
    ///
    /// Instructions beyond the size of program memory are dropped.
    pub fn from_instructions(instructions: &[Instruction]) -> Self {
        if instructions.len() > PROGRAM_MEMORY_SIZE {
            log::warn!(
                "Truncating program of {} instructions to {}",
                instructions.len(),
                PROGRAM_MEMORY_SIZE
            );
        }
        let words = instructions
            .iter()
            .take(PROGRAM_MEMORY_SIZE)
            .map(Instruction::encode)
            .collect();
        Self { words }
    }

    /// The built-in elevator control program.
    ///
    /// Idles with the door open until a call arrives, serves calls on the
    /// current floor directly, otherwise closes the door and travels one
    /// floor per step towards the call (below first), opens the door on
    /// arrival and clears the call.
    pub fn default_lift() -> Self {
        use ConditionIndex::*;
        use DoorRequest::{Close, Open};

        Self::from_instructions(&[
            // 0: any call pending -> check floor
            Instruction::new(2, PendingAny).door(Open),
            // 1: idle loop
            Instruction::jump(0).door(Open),
            // 2: call on this floor -> open door
            Instruction::new(13, PendingSame).door(Open),
            // 3: close door
            Instruction::jump(4).door(Close),
            // 4: wait until closed
            Instruction::new(4, DoorClosed).inverted().door(Close),
            // 5: call below -> move down
            Instruction::new(10, PendingBelow).door(Close),
            // 6: no call above -> back to idle
            Instruction::new(0, PendingAbove).inverted().door(Close),
            // 7: move up
            Instruction::jump(8).move_up().door(Close),
            // 8: not there yet -> move up again
            Instruction::new(7, PendingSame).inverted().door(Close),
            // 9: arrived (up)
            Instruction::jump(13).door(Close),
            // 10: move down
            Instruction::jump(11).move_down().door(Close),
            // 11: not there yet -> move down again
            Instruction::new(10, PendingSame).inverted().door(Close),
            // 12: arrived (down)
            Instruction::jump(14).door(Close),
            // 13: open door
            Instruction::jump(14).door(Open),
            // 14: wait until open
            Instruction::new(14, DoorOpen).inverted().door(Open),
            // 15: clear call, back to idle
            Instruction::jump(0).door(Open).reset_call(),
        ])
    }

    pub fn words(&self) -> &[u16] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Decoded instructions in address order.
    pub fn instructions(&self) -> impl Iterator<Item = Instruction> + '_ {
        self.words.iter().map(|&w| Instruction::decode(w))
    }

    /// Parse a binary image of little-endian 16-bit words.
    pub fn from_image(data: &[u8]) -> Result<Self, ProgramError> {
        if data.len() % 2 != 0 {
            return Err(ProgramError::OddLength(data.len()));
        }

        let count = data.len() / 2;
        if count > PROGRAM_MEMORY_SIZE {
            return Err(ProgramError::TooLarge(count));
        }

        let mut cursor = Cursor::new(data);
        let mut words = Vec::with_capacity(count);
        for _ in 0..count {
            words.push(cursor.read_u16::<LittleEndian>()?);
        }

        Ok(Self { words })
    }

    /// Serialize to a binary image of little-endian 16-bit words.
    pub fn to_image(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.words.len() * 2);
        for &word in &self.words {
            // Writes into a Vec cannot fail
            let _ = data.write_u16::<LittleEndian>(word);
        }
        data
    }

    /// Load a binary image from disk.
    pub fn load_file(path: &Path) -> Result<Self, ProgramError> {
        let data = std::fs::read(path)?;
        let program = Self::from_image(&data)?;
        log::info!("Loaded {} words from {}", program.len(), path.display());
        Ok(program)
    }

    /// Write a binary image to disk.
    pub fn save_file(&self, path: &Path) -> Result<(), ProgramError> {
        std::fs::write(path, self.to_image())?;
        log::info!("Wrote {} words to {}", self.len(), path.display());
        Ok(())
    }

    /// Render the program as a table.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Program Memory Dump ===");
        let _ = writeln!(out, " PC | Jmp | MU | MD | DR | R | CSEL | CIN | Hex ");
        let _ = writeln!(out, "----+-----+----+----+----+---+------+-----+------");
        for (pc, (&word, instr)) in self.words.iter().zip(self.instructions()).enumerate() {
            let _ = writeln!(
                out,
                "{:3} | {:3} | {:2} | {:2} | {:2} | {} |  {:2}  |  {}  | 0x{:04X}",
                pc,
                instr.jump_addr,
                instr.move_up as u8,
                instr.move_down as u8,
                instr.door.tag(),
                instr.reset_call as u8,
                instr.cond_sel.bits(),
                instr.cond_inv as u8,
                word
            );
        }
        let _ = writeln!(out, "============================");
        out
    }

    /// One disassembled line per word.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for (pc, instr) in self.instructions().enumerate() {
            let _ = writeln!(out, "{:02X}: {}", pc, instr);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_program_shape() {
        let program = Program::default_lift();
        assert_eq!(program.len(), 16);

        let instrs: Vec<_> = program.instructions().collect();
        assert_eq!(instrs[0].cond_sel, ConditionIndex::PendingAny);
        assert_eq!(instrs[0].jump_addr, 2);
        assert!(instrs[7].move_up);
        assert!(instrs[10].move_down);
        assert!(instrs[15].reset_call);
        assert!(instrs[15].is_unconditional_jump());

        // Never request both directions at once
        assert!(instrs.iter().all(|i| !(i.move_up && i.move_down)));
    }

    #[test]
    fn test_default_program_words() {
        let words = Program::default_lift().words().to_vec();
        assert_eq!(words[0], 0x0402);
        assert_eq!(words[1], 0xF400);
        assert_eq!(words[4], 0xC004);
        assert_eq!(words[7], 0xF108);
        assert_eq!(words[15], 0xFC00);
    }

    #[test]
    fn test_from_words_too_large() {
        let err = Program::from_words(vec![0; PROGRAM_MEMORY_SIZE + 1]).unwrap_err();
        assert!(matches!(err, ProgramError::TooLarge(257)));
        assert!(Program::from_words(vec![0; PROGRAM_MEMORY_SIZE]).is_ok());
    }

    #[test]
    fn test_image_little_endian() {
        let program = Program::from_words(vec![0x1234, 0xF400]).unwrap();
        assert_eq!(program.to_image(), vec![0x34, 0x12, 0x00, 0xF4]);

        let parsed = Program::from_image(&[0x34, 0x12, 0x00, 0xF4]).unwrap();
        assert_eq!(parsed, program);
    }

    #[test]
    fn test_image_errors() {
        assert!(matches!(Program::from_image(&[0x00, 0x01, 0x02]), Err(ProgramError::OddLength(3))));

        let big = vec![0u8; (PROGRAM_MEMORY_SIZE + 1) * 2];
        assert!(matches!(Program::from_image(&big), Err(ProgramError::TooLarge(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lift.bin");

        let program = Program::default_lift();
        program.save_file(&path).unwrap();
        assert_eq!(Program::load_file(&path).unwrap(), program);

        assert!(matches!(
            Program::load_file(&dir.path().join("missing.bin")),
            Err(ProgramError::Io(_))
        ));
    }

    #[test]
    fn test_dump_format() {
        let dump = Program::default_lift().dump();
        let lines: Vec<_> = dump.lines().collect();

        assert_eq!(lines[0], "=== Program Memory Dump ===");
        assert_eq!(lines.len(), 3 + 16 + 1);
        assert_eq!(lines[3], "  0 |   2 |  0 |  0 | OP | 0 |   0  |  0  | 0x0402");
        assert_eq!(lines[18], " 15 |   0 |  0 |  0 | OP | 1 |   7  |  1  | 0xFC00");
    }

    #[test]
    fn test_disassemble_listing() {
        let listing = Program::default_lift().disassemble();
        let first = listing.lines().next().unwrap();
        assert_eq!(first, "00: jmp 0x02 if call.any ; door=open");
    }
}
