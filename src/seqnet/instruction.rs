//! Instruction word codec.
//!
//! Every line of program memory is a 16-bit word with the following fields:
//!
//! | Bits   | Field      | Description                                          |
//! |--------|------------|------------------------------------------------------|
//! |  7..0  | jump_addr  | loaded into PC if the condition is true              |
//! |    8   | move_up    | request to move the car upwards                      |
//! |    9   | move_down  | request to move the car downwards                    |
//! |   10   | door       | target door state (0: closed, 1: open)               |
//! |   11   | reset_call | clear the pending call of the current floor          |
//! | 14..12 | cond_sel   | condition selector index                             |
//! |   15   | cond_inv   | invert the selected condition value                  |
//!
//! Every word decodes, and `encode` is the exact inverse of `decode`.

use super::condsel::ConditionIndex;

/// Jump address (bits 0-7).
pub const BIT_JUMP_ADDR: u32 = 0;
/// Request to move the car upward.
pub const BIT_MOVE_UP: u32 = 8;
/// Request to move the car downward.
pub const BIT_MOVE_DOWN: u32 = 9;
/// Target door state (1 = open, 0 = close).
pub const BIT_DOOR_STATE: u32 = 10;
/// Request to clear the pending call of the current floor.
pub const BIT_REQ_RESET: u32 = 11;
/// Condition selector (3 bits: 12-14).
pub const BIT_COND_SEL: u32 = 12;
/// Invert the selected condition.
pub const BIT_COND_INV: u32 = 15;

/// 3-bit mask for the condition selector.
pub const MASK_COND_SEL: u16 = 0x7;
/// 8-bit mask for the jump address.
pub const MASK_JUMP_ADDR: u16 = 0xFF;

/// Requested door state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum DoorRequest {
    #[default]
    Close = 0,
    Open = 1,
}

impl DoorRequest {
    #[inline]
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            DoorRequest::Open
        } else {
            DoorRequest::Close
        }
    }

    #[inline]
    pub fn is_open(self) -> bool {
        self == DoorRequest::Open
    }

    /// Two-letter tag used in program dumps.
    pub fn tag(self) -> &'static str {
        match self {
            DoorRequest::Open => "OP",
            DoorRequest::Close => "CL",
        }
    }
}

/// A decoded instruction word.
///
/// The same structure is returned by [`SequentialNetwork::step`] as the
/// network's output for the cycle.
///
/// [`SequentialNetwork::step`]: super::SequentialNetwork::step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Instruction {
    /// Address loaded into PC when the condition is active.
    pub jump_addr: u8,
    /// Request to move the car to a higher floor.
    pub move_up: bool,
    /// Request to move the car to a lower floor.
    pub move_down: bool,
    /// Requested door state.
    pub door: DoorRequest,
    /// Clear the call of the current floor.
    pub reset_call: bool,
    /// Condition selector index.
    pub cond_sel: ConditionIndex,
    /// Invert the selected condition value.
    pub cond_inv: bool,
}

impl Instruction {
    /// Create an instruction with the given jump target and condition.
    /// All output requests start inactive and the door request is `Close`.
    pub fn new(jump_addr: u8, cond_sel: ConditionIndex) -> Self {
        Self {
            jump_addr,
            cond_sel,
            ..Self::default()
        }
    }

    /// Unconditional jump (`ConstFalse` inverted).
    pub fn jump(jump_addr: u8) -> Self {
        Self::new(jump_addr, ConditionIndex::ConstFalse).inverted()
    }

    pub fn inverted(mut self) -> Self {
        self.cond_inv = true;
        self
    }

    pub fn door(mut self, door: DoorRequest) -> Self {
        self.door = door;
        self
    }

    pub fn move_up(mut self) -> Self {
        self.move_up = true;
        self
    }

    pub fn move_down(mut self) -> Self {
        self.move_down = true;
        self
    }

    pub fn reset_call(mut self) -> Self {
        self.reset_call = true;
        self
    }

    /// Decode a raw program memory word.
    pub fn decode(word: u16) -> Self {
        let bit = |pos: u32| (word >> pos) & 0x1 != 0;

        Self {
            jump_addr: ((word >> BIT_JUMP_ADDR) & MASK_JUMP_ADDR) as u8,
            move_up: bit(BIT_MOVE_UP),
            move_down: bit(BIT_MOVE_DOWN),
            door: DoorRequest::from_bit(bit(BIT_DOOR_STATE)),
            reset_call: bit(BIT_REQ_RESET),
            cond_sel: ConditionIndex::from_bits(((word >> BIT_COND_SEL) & MASK_COND_SEL) as u8),
            cond_inv: bit(BIT_COND_INV),
        }
    }

    /// Encode back into a program memory word.
    pub fn encode(&self) -> u16 {
        let flag = |set: bool, pos: u32| (set as u16) << pos;

        ((self.jump_addr as u16 & MASK_JUMP_ADDR) << BIT_JUMP_ADDR)
            | flag(self.move_up, BIT_MOVE_UP)
            | flag(self.move_down, BIT_MOVE_DOWN)
            | flag(self.door.is_open(), BIT_DOOR_STATE)
            | flag(self.reset_call, BIT_REQ_RESET)
            | ((self.cond_sel.bits() as u16 & MASK_COND_SEL) << BIT_COND_SEL)
            | flag(self.cond_inv, BIT_COND_INV)
    }

    /// True if the jump is always taken, regardless of inputs.
    pub fn is_unconditional_jump(&self) -> bool {
        self.cond_inv
            && matches!(self.cond_sel, ConditionIndex::ConstFalse | ConditionIndex::Reserved)
    }

    /// True if the jump can never be taken.
    pub fn is_fallthrough(&self) -> bool {
        !self.cond_inv
            && matches!(self.cond_sel, ConditionIndex::ConstFalse | ConditionIndex::Reserved)
    }

    /// True if a move in either direction is requested.
    pub fn is_moving(&self) -> bool {
        self.move_up || self.move_down
    }

    /// Human-readable form, e.g. `jmp 0x0D if call.same ; door=open`.
    pub fn disassemble(&self) -> String {
        let mut text = if self.is_unconditional_jump() {
            format!("jmp 0x{:02X}", self.jump_addr)
        } else if self.is_fallthrough() {
            "next".to_string()
        } else {
            format!(
                "jmp 0x{:02X} if {}{}",
                self.jump_addr,
                if self.cond_inv { "!" } else { "" },
                self.cond_sel
            )
        };

        text.push_str(if self.door.is_open() { " ; door=open" } else { " ; door=close" });
        if self.move_up {
            text.push_str(" up");
        }
        if self.move_down {
            text.push_str(" down");
        }
        if self.reset_call {
            text.push_str(" reset");
        }
        text
    }
}

impl From<u16> for Instruction {
    fn from(word: u16) -> Self {
        Self::decode(word)
    }
}

impl From<Instruction> for u16 {
    fn from(instr: Instruction) -> Self {
        instr.encode()
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.disassemble())
    }
}
