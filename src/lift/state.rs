//! Emulated elevator state.

use thiserror::Error;

use super::Plant;
use crate::seqnet::{ConditionInputs, DoorRequest, Instruction};

/// Default number of floors.
pub const DEFAULT_FLOORS: usize = 6;

/// Largest shaft a `u8` floor number can address.
pub const MAX_FLOORS: usize = u8::MAX as usize + 1;

/// Errors raised while applying controller outputs to the lift.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlantError {
    /// Up and down requested in the same cycle.
    #[error("conflicting move request (up and down) on floor {floor}")]
    ConflictingMove { floor: u8 },

    /// Move would leave the shaft.
    #[error("cannot move {direction} from floor {floor} ({floors} floors)")]
    FloorOutOfRange {
        floor: u8,
        floors: usize,
        direction: &'static str,
    },
}

/// Snapshot of the emulated lift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiftState {
    /// Current floor (0-based).
    pub floor: u8,
    /// Door is open.
    pub door_open: bool,
    /// Car moved in the last cycle.
    pub moving: bool,
    /// Pending call per floor. The length is the number of floors.
    pub calls: Vec<bool>,
}

/// A single field that differs between two states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub field: String,
    pub expected: String,
    pub actual: String,
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Mismatch: {} (expected: {}, got: {})",
            self.field, self.expected, self.actual
        )
    }
}

impl LiftState {
    /// Idle lift with no calls.
    pub fn new(floors: usize, floor: u8, door_open: bool) -> Self {
        Self {
            floor,
            door_open,
            moving: false,
            calls: vec![false; floors],
        }
    }

    /// Idle lift with calls pending on `call_floors`.
    /// Call floors outside the shaft are ignored.
    pub fn with_calls(floors: usize, floor: u8, door_open: bool, call_floors: &[u8]) -> Self {
        let mut state = Self::new(floors, floor, door_open);
        for &f in call_floors {
            if let Some(call) = state.calls.get_mut(f as usize) {
                *call = true;
            }
        }
        state
    }

    pub fn floors(&self) -> usize {
        self.calls.len()
    }

    /// Register a call on `floor`. Returns false if the floor does not exist.
    pub fn call(&mut self, floor: u8) -> bool {
        match self.calls.get_mut(floor as usize) {
            Some(call) => {
                *call = true;
                true
            }
            None => false,
        }
    }

    /// Floors with a pending call, in ascending order.
    pub fn pending_calls(&self) -> Vec<u8> {
        self.calls
            .iter()
            .enumerate()
            .filter(|(_, &pending)| pending)
            .map(|(floor, _)| floor as u8)
            .collect()
    }

    /// Derive the condition selector inputs from this state.
    pub fn condition_inputs(&self) -> ConditionInputs {
        let current = self.floor as usize;
        let mut inputs = ConditionInputs {
            door_closed: !self.door_open,
            door_open: self.door_open,
            ..ConditionInputs::default()
        };

        for (floor, _) in self.calls.iter().enumerate().filter(|(_, &pending)| pending) {
            if floor < current {
                inputs.call_pending_below = true;
            } else if floor == current {
                inputs.call_pending_same = true;
            } else {
                inputs.call_pending_above = true;
            }
        }

        inputs
    }

    /// Apply one cycle of controller output.
    ///
    /// Door and call reset are applied before the move, so a reset clears
    /// the call of the floor the car is leaving. The move is checked first:
    /// on error the state is left untouched.
    pub fn apply(&mut self, instr: &Instruction) -> Result<(), PlantError> {
        let out_of_range = |direction| PlantError::FloorOutOfRange {
            floor: self.floor,
            floors: self.floors(),
            direction,
        };
        let next_floor = match (instr.move_up, instr.move_down) {
            (true, false) => Some(
                self.floor
                    .checked_add(1)
                    .filter(|&f| (f as usize) < self.floors())
                    .ok_or_else(|| out_of_range("up"))?,
            ),
            (false, true) => Some(
                self.floor
                    .checked_sub(1)
                    .ok_or_else(|| out_of_range("down"))?,
            ),
            (false, false) => None,
            (true, true) => return Err(PlantError::ConflictingMove { floor: self.floor }),
        };

        self.door_open = instr.door == DoorRequest::Open;

        if instr.reset_call {
            if let Some(call) = self.calls.get_mut(self.floor as usize) {
                *call = false;
            }
        }

        self.moving = next_floor.is_some();
        if let Some(floor) = next_floor {
            self.floor = floor;
        }

        Ok(())
    }

    /// Compare against `expected`, listing every differing field.
    pub fn diff(&self, expected: &LiftState) -> Vec<Mismatch> {
        let mut mismatches = Vec::new();
        let mut check = |field: String, want: String, got: String| {
            if want != got {
                mismatches.push(Mismatch {
                    field,
                    expected: want,
                    actual: got,
                });
            }
        };

        check("floor".into(), expected.floor.to_string(), self.floor.to_string());
        check("door_open".into(), expected.door_open.to_string(), self.door_open.to_string());
        check("moving".into(), expected.moving.to_string(), self.moving.to_string());

        if expected.floors() != self.floors() {
            check("floors".into(), expected.floors().to_string(), self.floors().to_string());
        }
        for (i, (e, a)) in expected.calls.iter().zip(&self.calls).enumerate() {
            check(format!("calls[{}]", i), e.to_string(), a.to_string());
        }

        mismatches
    }
}

impl Default for LiftState {
    fn default() -> Self {
        Self::new(DEFAULT_FLOORS, 0, true)
    }
}

impl Plant for LiftState {
    fn condition_inputs(&self) -> ConditionInputs {
        LiftState::condition_inputs(self)
    }

    fn apply(&mut self, instr: &Instruction) -> Result<(), PlantError> {
        LiftState::apply(self, instr)
    }
}

impl std::fmt::Display for LiftState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Floor: {}, Door Open: {}, Moving: {}, Calls: [",
            self.floor,
            if self.door_open { "Y" } else { "N" },
            if self.moving { "Y" } else { "N" }
        )?;
        for (i, &call) in self.calls.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", call as u8)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seqnet::ConditionIndex;

    fn outputs() -> Instruction {
        Instruction::new(0, ConditionIndex::ConstFalse)
    }

    #[test]
    fn test_condition_inputs_split_calls() {
        let state = LiftState::with_calls(6, 2, true, &[0, 2, 5]);
        let inputs = state.condition_inputs();

        assert!(inputs.call_pending_below);
        assert!(inputs.call_pending_same);
        assert!(inputs.call_pending_above);
        assert!(inputs.door_open);
        assert!(!inputs.door_closed);
    }

    #[test]
    fn test_condition_inputs_no_calls() {
        let state = LiftState::new(6, 3, false);
        let inputs = state.condition_inputs();

        assert_eq!(
            inputs,
            ConditionInputs {
                door_closed: true,
                ..ConditionInputs::default()
            }
        );
    }

    #[test]
    fn test_with_calls_ignores_missing_floors() {
        let state = LiftState::with_calls(4, 0, true, &[1, 9]);
        assert_eq!(state.pending_calls(), vec![1]);
    }

    #[test]
    fn test_apply_door_and_reset() {
        let mut state = LiftState::with_calls(6, 1, false, &[1, 3]);
        state
            .apply(&outputs().door(DoorRequest::Open).reset_call())
            .unwrap();

        assert!(state.door_open);
        assert_eq!(state.pending_calls(), vec![3]);
        assert!(!state.moving);
    }

    #[test]
    fn test_apply_moves() {
        let mut state = LiftState::new(6, 2, false);

        state.apply(&outputs().move_up()).unwrap();
        assert_eq!(state.floor, 3);
        assert!(state.moving);

        state.apply(&outputs().move_down()).unwrap();
        assert_eq!(state.floor, 2);
        assert!(state.moving);

        state.apply(&outputs()).unwrap();
        assert_eq!(state.floor, 2);
        assert!(!state.moving);
    }

    #[test]
    fn test_apply_conflicting_move() {
        let mut state = LiftState::new(6, 2, false);
        let err = state.apply(&outputs().move_up().move_down()).unwrap_err();
        assert_eq!(err, PlantError::ConflictingMove { floor: 2 });
    }

    #[test]
    fn test_apply_out_of_shaft() {
        let mut bottom = LiftState::new(6, 0, false);
        assert!(matches!(
            bottom.apply(&outputs().move_down()),
            Err(PlantError::FloorOutOfRange { direction: "down", .. })
        ));

        let mut top = LiftState::new(6, 5, false);
        assert!(matches!(
            top.apply(&outputs().move_up()),
            Err(PlantError::FloorOutOfRange { direction: "up", .. })
        ));
        assert_eq!(top.floor, 5);
    }

    #[test]
    fn test_apply_fault_leaves_state_untouched() {
        let before = LiftState::with_calls(6, 0, false, &[0, 4]);
        let mut state = before.clone();

        let err = state
            .apply(&outputs().door(DoorRequest::Open).reset_call().move_down())
            .unwrap_err();
        assert!(matches!(err, PlantError::FloorOutOfRange { floor: 0, .. }));
        assert_eq!(state, before);

        state
            .apply(&outputs().door(DoorRequest::Open).reset_call().move_up().move_down())
            .unwrap_err();
        assert_eq!(state, before);
    }

    #[test]
    fn test_apply_top_of_largest_shaft() {
        let mut state = LiftState::new(MAX_FLOORS, u8::MAX, false);
        let err = state.apply(&outputs().move_up()).unwrap_err();

        assert_eq!(
            err,
            PlantError::FloorOutOfRange {
                floor: u8::MAX,
                floors: MAX_FLOORS,
                direction: "up",
            }
        );
        assert_eq!(state.floor, u8::MAX);

        // Wider than a floor number can address: still no overflow
        let mut wide = LiftState::new(300, u8::MAX, false);
        assert!(wide.apply(&outputs().move_up()).is_err());
        assert_eq!(wide.floor, u8::MAX);
    }

    #[test]
    fn test_diff() {
        let expected = LiftState::with_calls(6, 3, true, &[]);
        let actual = LiftState::with_calls(6, 2, true, &[4]);

        let mismatches = actual.diff(&expected);
        assert_eq!(mismatches.len(), 2);
        assert_eq!(mismatches[0].field, "floor");
        assert_eq!(mismatches[1].field, "calls[4]");
        assert_eq!(
            mismatches[1].to_string(),
            "Mismatch: calls[4] (expected: false, got: true)"
        );

        assert!(expected.diff(&expected.clone()).is_empty());
    }

    #[test]
    fn test_display() {
        let state = LiftState::with_calls(6, 2, true, &[2]);
        assert_eq!(
            state.to_string(),
            "Floor: 2, Door Open: Y, Moving: N, Calls: [0, 0, 1, 0, 0, 0]"
        );
    }
}
