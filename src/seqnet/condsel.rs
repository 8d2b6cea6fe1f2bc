//! Condition selector.
//!
//! Picks one of the lift inputs (or a fixed zero) and optionally inverts it.
//! The result decides whether the sequential network takes the jump encoded
//! in the current instruction.
//!
//! | Index | Selected value                      |
//! |-------|-------------------------------------|
//! |   0   | call below or same or above pending |
//! |   1   | call below pending                  |
//! |   2   | call same pending                   |
//! |   3   | call above pending                  |
//! |   4   | door closed                         |
//! |   5   | door open                           |
//! |   6   | reserved (false)                    |
//! |   7   | fixed 0 (false)                     |

use thiserror::Error;

/// Highest valid selector index.
pub const CONDITION_INDEX_MAX: u8 = 7;

/// Selector index out of range.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("condition index {0} out of range (0..={max})", max = CONDITION_INDEX_MAX)]
pub struct ConditionIndexError(pub u8);

/// Input values of the condition selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConditionInputs {
    /// There is an active call below the current floor.
    pub call_pending_below: bool,
    /// There is an active call on the current floor.
    pub call_pending_same: bool,
    /// There is an active call above the current floor.
    pub call_pending_above: bool,
    /// Door is closed and locked.
    pub door_closed: bool,
    /// Door is fully open.
    pub door_open: bool,
}

/// Index of the value routed through the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ConditionIndex {
    /// Any pending call: below OR same OR above.
    PendingAny = 0,
    PendingBelow = 1,
    PendingSame = 2,
    PendingAbove = 3,
    DoorClosed = 4,
    DoorOpen = 5,
    /// Reserved, always false.
    Reserved = 6,
    /// Constant false. Combined with inversion this is an unconditional jump.
    #[default]
    ConstFalse = 7,
}

impl ConditionIndex {
    /// All indexes in encoding order.
    pub const ALL: [ConditionIndex; 8] = [
        ConditionIndex::PendingAny,
        ConditionIndex::PendingBelow,
        ConditionIndex::PendingSame,
        ConditionIndex::PendingAbove,
        ConditionIndex::DoorClosed,
        ConditionIndex::DoorOpen,
        ConditionIndex::Reserved,
        ConditionIndex::ConstFalse,
    ];

    /// Build from the low three bits of `bits`. Never fails.
    #[inline]
    pub fn from_bits(bits: u8) -> Self {
        Self::ALL[(bits & CONDITION_INDEX_MAX) as usize]
    }

    /// Raw selector value.
    #[inline]
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Short name used by the disassembler.
    pub fn mnemonic(self) -> &'static str {
        match self {
            ConditionIndex::PendingAny => "call.any",
            ConditionIndex::PendingBelow => "call.below",
            ConditionIndex::PendingSame => "call.same",
            ConditionIndex::PendingAbove => "call.above",
            ConditionIndex::DoorClosed => "door.closed",
            ConditionIndex::DoorOpen => "door.open",
            ConditionIndex::Reserved => "reserved",
            ConditionIndex::ConstFalse => "false",
        }
    }
}

impl TryFrom<u8> for ConditionIndex {
    type Error = ConditionIndexError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > CONDITION_INDEX_MAX {
            return Err(ConditionIndexError(value));
        }
        Ok(Self::from_bits(value))
    }
}

impl std::fmt::Display for ConditionIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Evaluate the selector: pick the indexed input, then invert if requested.
pub fn select(invert: bool, index: ConditionIndex, inputs: &ConditionInputs) -> bool {
    let value = match index {
        ConditionIndex::PendingAny => {
            inputs.call_pending_below || inputs.call_pending_same || inputs.call_pending_above
        }
        ConditionIndex::PendingBelow => inputs.call_pending_below,
        ConditionIndex::PendingSame => inputs.call_pending_same,
        ConditionIndex::PendingAbove => inputs.call_pending_above,
        ConditionIndex::DoorClosed => inputs.door_closed,
        ConditionIndex::DoorOpen => inputs.door_open,
        ConditionIndex::Reserved | ConditionIndex::ConstFalse => false,
    };

    value ^ invert
}
