//! Elevator plant emulation.
//!
//! The [`LiftController`] couples a [`SequentialNetwork`] with a [`Plant`]
//! (normally a [`LiftState`]) and runs the closed loop: plant inputs feed
//! the condition selector, the network steps, and the decoded outputs are
//! applied back to the plant.
//!
//! [`SequentialNetwork`]: crate::seqnet::SequentialNetwork

pub mod controller;
pub mod state;

pub use controller::{Breakpoint, ControllerStatus, LiftController, StepRecord};
pub use state::{LiftState, Mismatch, PlantError, DEFAULT_FLOORS, MAX_FLOORS};

use crate::seqnet::{ConditionInputs, Instruction};

/// The mechanism driven by the sequencer.
///
/// Implementations report the condition inputs for the current cycle and
/// react to the instruction outputs at the end of it.
pub trait Plant {
    /// Inputs for the condition selector.
    fn condition_inputs(&self) -> ConditionInputs;

    /// Apply one cycle of controller outputs.
    fn apply(&mut self, instr: &Instruction) -> Result<(), PlantError>;
}
