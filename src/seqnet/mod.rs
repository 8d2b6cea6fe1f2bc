//! Microprogrammed elevator sequencer.
//!
//! The controller is a small sequential network that interprets a program
//! memory of 16-bit instruction words. Each cycle:
//!
//! 1. The word at PC is decoded into an [`Instruction`].
//! 2. The [condition selector](condsel) picks one lift input by
//!    `cond_sel` and optionally inverts it (`cond_inv`).
//! 3. If the result is active, PC is loaded with `jump_addr`, otherwise it
//!    advances to the next word.
//! 4. The instruction's output fields (move up/down, door request, reset
//!    call) drive the lift.
//!
//! # Example
//!
//! ```
//! use lift_emu::seqnet::{Program, SequentialNetwork, ConditionInputs, select};
//!
//! let mut network = SequentialNetwork::with_program(&Program::default_lift());
//! let inputs = ConditionInputs { call_pending_same: true, door_open: true, ..Default::default() };
//!
//! let instr = network.current_instruction();
//! let active = select(instr.cond_inv, instr.cond_sel, &inputs);
//! network.step(active);
//! assert_eq!(network.pc(), 2);
//! ```

pub mod condsel;
pub mod instruction;
pub mod network;
pub mod program;

pub use condsel::{select, ConditionIndex, ConditionIndexError, ConditionInputs};
pub use instruction::{DoorRequest, Instruction};
pub use network::{SequentialNetwork, PROGRAM_MEMORY_SIZE};
pub use program::{Program, ProgramError};
