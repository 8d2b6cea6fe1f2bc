//! Closed-loop controller: sequential network driving a plant.
//!
//! # Usage
//!
//! ```
//! use lift_emu::lift::{LiftController, LiftState};
//! use lift_emu::seqnet::Program;
//!
//! let state = LiftState::with_calls(6, 1, true, &[3]);
//! let mut controller = LiftController::new(&Program::default_lift(), state);
//! controller.run(15).unwrap();
//! assert_eq!(controller.plant().floor, 3);
//! ```

use super::{LiftState, Plant, PlantError};
use crate::seqnet::{select, ConditionInputs, Instruction, Program, SequentialNetwork};

/// Breakpoint on a program address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoint {
    pub pc: u8,
    pub enabled: bool,
}

impl Breakpoint {
    pub fn new(pc: u8) -> Self {
        Self { pc, enabled: true }
    }
}

/// Controller execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerStatus {
    /// Nothing executed yet.
    #[default]
    Idle,
    /// Executing (or ready to continue).
    Running,
    /// Stopped before executing the instruction at `pc`.
    Breakpoint { pc: u8 },
    /// The plant rejected an output; no further steps run.
    Faulted,
}

/// Everything that happened in one cycle.
#[derive(Debug, Clone)]
pub struct StepRecord<P = LiftState> {
    /// Step number, starting at 0.
    pub step: u64,
    /// PC of the executed instruction.
    pub pc_before: u8,
    /// PC after the jump or increment.
    pub pc_after: u8,
    /// Executed instruction.
    pub instruction: Instruction,
    /// Selector inputs seen by the instruction.
    pub inputs: ConditionInputs,
    /// Selector result (after inversion).
    pub condition: bool,
    /// Plant state after the outputs were applied.
    pub state: P,
}

impl<P: std::fmt::Display> std::fmt::Display for StepRecord<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Step {:02}: PC {:02} -> {:02} [{}] cond={} | {}",
            self.step,
            self.pc_before,
            self.pc_after,
            self.instruction,
            self.condition as u8,
            self.state
        )
    }
}

/// Sequencer plus plant.
pub struct LiftController<P = LiftState>
where
    P: Plant + Clone,
{
    network: SequentialNetwork,
    plant: P,
    breakpoints: Vec<Breakpoint>,
    status: ControllerStatus,
    steps: u64,
    fault: Option<PlantError>,
    /// Breakpoint address to step over once after `resume`.
    resume_pc: Option<u8>,
    /// Recorded steps, if tracing is enabled.
    trace: Option<Vec<StepRecord<P>>>,
}

impl<P> LiftController<P>
where
    P: Plant + Clone,
{
    /// Load `program` and start at PC 0 with the given plant.
    pub fn new(program: &Program, plant: P) -> Self {
        Self {
            network: SequentialNetwork::with_program(program),
            plant,
            breakpoints: Vec::new(),
            status: ControllerStatus::Idle,
            steps: 0,
            fault: None,
            resume_pc: None,
            trace: None,
        }
    }

    /// Record every step for later inspection.
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(Vec::new());
        self
    }

    pub fn network(&self) -> &SequentialNetwork {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut SequentialNetwork {
        &mut self.network
    }

    pub fn plant(&self) -> &P {
        &self.plant
    }

    pub fn plant_mut(&mut self) -> &mut P {
        &mut self.plant
    }

    pub fn status(&self) -> ControllerStatus {
        self.status
    }

    /// Number of executed steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Plant error that stopped the controller, if any.
    pub fn fault(&self) -> Option<&PlantError> {
        self.fault.as_ref()
    }

    /// Recorded steps (empty unless tracing is enabled).
    pub fn trace(&self) -> &[StepRecord<P>] {
        self.trace.as_deref().unwrap_or(&[])
    }

    pub fn pc(&self) -> u8 {
        self.network.pc()
    }

    pub fn set_pc(&mut self, pc: u8) {
        self.network.set_pc(pc);
    }

    /// Restart with a new plant. Program memory and breakpoints are kept.
    pub fn reset(&mut self, plant: P) {
        self.network.set_pc(0);
        self.plant = plant;
        self.status = ControllerStatus::Idle;
        self.steps = 0;
        self.fault = None;
        self.resume_pc = None;
        if let Some(trace) = &mut self.trace {
            trace.clear();
        }
    }

    pub fn add_breakpoint(&mut self, pc: u8) {
        self.breakpoints.push(Breakpoint::new(pc));
    }

    /// Remove every breakpoint at `pc`. Returns true if one was removed.
    pub fn remove_breakpoint(&mut self, pc: u8) -> bool {
        let before = self.breakpoints.len();
        self.breakpoints.retain(|bp| bp.pc != pc);
        self.breakpoints.len() != before
    }

    /// Enable or disable the breakpoints at `pc` without removing them.
    pub fn set_breakpoint_enabled(&mut self, pc: u8, enabled: bool) -> bool {
        let mut found = false;
        for bp in self.breakpoints.iter_mut().filter(|bp| bp.pc == pc) {
            bp.enabled = enabled;
            found = true;
        }
        found
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    fn breakpoint_hit(&self) -> Option<u8> {
        let pc = self.network.pc();
        if self.resume_pc == Some(pc) {
            return None;
        }
        self.breakpoints
            .iter()
            .find(|bp| bp.enabled && bp.pc == pc)
            .map(|bp| bp.pc)
    }

    /// Execute one cycle, ignoring breakpoints.
    ///
    /// If the plant rejects the outputs, neither the PC nor the plant
    /// changes and the fault is latched.
    pub fn step(&mut self) -> Result<StepRecord<P>, PlantError> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }

        let pc_before = self.network.pc();
        let inputs = self.plant.condition_inputs();
        let current = self.network.current_instruction();
        let condition = select(current.cond_inv, current.cond_sel, &inputs);
        let instruction = self.network.step(condition);

        if let Err(e) = self.plant.apply(&instruction) {
            // Faulted cycle did not complete: PC stays on the rejected instruction
            self.network.set_pc(pc_before);
            log::warn!("Plant fault at PC 0x{:02X}: {}", pc_before, e);
            self.status = ControllerStatus::Faulted;
            self.fault = Some(e.clone());
            return Err(e);
        }

        let record = StepRecord {
            step: self.steps,
            pc_before,
            pc_after: self.network.pc(),
            instruction,
            inputs,
            condition,
            state: self.plant.clone(),
        };
        log::trace!(
            "step {} pc {:02} -> {:02}: {}",
            record.step,
            record.pc_before,
            record.pc_after,
            record.instruction
        );

        self.steps += 1;
        self.status = ControllerStatus::Running;
        self.resume_pc = None;
        if let Some(trace) = &mut self.trace {
            trace.push(record.clone());
        }

        Ok(record)
    }

    /// Run up to `max_steps` cycles, stopping early at a breakpoint.
    ///
    /// Returns the number of steps executed by this call.
    pub fn run(&mut self, max_steps: u64) -> Result<u64, PlantError> {
        let start = self.steps;

        while self.steps - start < max_steps {
            if let Some(pc) = self.breakpoint_hit() {
                log::debug!("Breakpoint at PC 0x{:02X}", pc);
                self.status = ControllerStatus::Breakpoint { pc };
                break;
            }
            self.step()?;
        }

        Ok(self.steps - start)
    }

    /// Continue after a breakpoint. The next `run` steps over it once.
    pub fn resume(&mut self) {
        if let ControllerStatus::Breakpoint { pc } = self.status {
            self.resume_pc = Some(pc);
            self.status = ControllerStatus::Running;
        }
    }

    /// Print controller status.
    pub fn print_status(&self)
    where
        P: std::fmt::Display,
    {
        println!("Controller Status: {:?}", self.status);
        println!("Steps: {}", self.steps);
        println!("PC: 0x{:02X} [{}]", self.network.pc(), self.network.current_instruction());
        println!("Plant: {}", self.plant);
        if let Some(fault) = &self.fault {
            println!("Fault: {}", fault);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seqnet::{ConditionIndex, DoorRequest};

    fn controller(state: LiftState) -> LiftController {
        LiftController::new(&Program::default_lift(), state)
    }

    #[test]
    fn test_idle_loops_between_first_two_words() {
        let mut ctl = controller(LiftState::new(6, 2, true));

        let first = ctl.step().unwrap();
        assert_eq!((first.pc_before, first.pc_after), (0, 1));
        assert!(!first.condition);

        let second = ctl.step().unwrap();
        assert_eq!((second.pc_before, second.pc_after), (1, 0));
        assert!(second.condition);

        assert_eq!(ctl.steps(), 2);
        assert_eq!(ctl.status(), ControllerStatus::Running);
        assert_eq!(ctl.plant(), &LiftState::new(6, 2, true));
    }

    #[test]
    fn test_same_floor_call_served() {
        let mut ctl = controller(LiftState::with_calls(6, 2, true, &[2]));
        assert_eq!(ctl.run(8).unwrap(), 8);

        assert_eq!(ctl.plant(), &LiftState::new(6, 2, true));
        assert_eq!(ctl.pc(), 1);
    }

    #[test]
    fn test_travel_up() {
        let mut ctl = controller(LiftState::with_calls(6, 1, true, &[3])).with_trace();
        ctl.run(15).unwrap();

        assert_eq!(ctl.plant(), &LiftState::new(6, 3, true));
        let max_floor = ctl.trace().iter().map(|r| r.state.floor).max();
        assert_eq!(max_floor, Some(3));
        assert_eq!(ctl.trace().len(), 15);
        assert!(ctl.trace().iter().any(|r| r.instruction.move_up));
        assert!(!ctl.trace().iter().any(|r| r.instruction.move_down));
    }

    #[test]
    fn test_breakpoint_and_resume() {
        let mut ctl = controller(LiftState::with_calls(6, 0, true, &[2]));
        ctl.add_breakpoint(7);

        let executed = ctl.run(100).unwrap();
        assert_eq!(ctl.status(), ControllerStatus::Breakpoint { pc: 7 });
        assert_eq!(ctl.pc(), 7);
        assert!(executed < 100);

        // Stays put until resumed
        assert_eq!(ctl.run(10).unwrap(), 0);

        ctl.resume();
        assert_eq!(ctl.run(1).unwrap(), 1);
        assert_eq!(ctl.plant().floor, 1);

        ctl.clear_breakpoints();
        ctl.run(50).unwrap();
        assert_eq!(ctl.plant(), &LiftState::new(6, 2, true));
    }

    #[test]
    fn test_fault_stops_controller() {
        // Jump-to-self that moves up forever
        let program = Program::from_instructions(&[Instruction::jump(0).move_up()]);
        let mut ctl = LiftController::new(&program, LiftState::new(3, 0, false));

        let err = ctl.run(10).unwrap_err();
        assert!(matches!(err, PlantError::FloorOutOfRange { floor: 2, .. }));
        assert_eq!(ctl.status(), ControllerStatus::Faulted);
        assert_eq!(ctl.steps(), 2);
        assert_eq!(ctl.fault(), Some(&err));

        // Further steps report the same fault
        assert_eq!(ctl.step().unwrap_err(), err);
    }

    #[test]
    fn test_fault_keeps_pc_and_plant() {
        let program = Program::from_instructions(&[
            Instruction::jump(0),
            Instruction::jump(0).door(DoorRequest::Open).reset_call().move_down(),
        ]);
        let before = LiftState::with_calls(6, 0, false, &[0]);
        let mut ctl = LiftController::new(&program, before.clone());
        ctl.set_pc(1);

        let err = ctl.step().unwrap_err();
        assert!(matches!(err, PlantError::FloorOutOfRange { direction: "down", .. }));
        assert_eq!(ctl.plant(), &before);
        assert_eq!(ctl.pc(), 1);
        assert_eq!(ctl.steps(), 0);
        assert!(ctl.network().current_instruction().move_down);
    }

    #[test]
    fn test_disable_and_remove_breakpoint() {
        let mut ctl = controller(LiftState::with_calls(6, 0, true, &[2]));
        ctl.add_breakpoint(7);

        assert!(ctl.set_breakpoint_enabled(7, false));
        assert!(!ctl.breakpoints()[0].enabled);
        ctl.run(50).unwrap();
        assert_eq!(ctl.status(), ControllerStatus::Running);
        assert_eq!(ctl.plant(), &LiftState::new(6, 2, true));

        ctl.reset(LiftState::with_calls(6, 0, true, &[2]));
        assert!(ctl.set_breakpoint_enabled(7, true));
        ctl.run(50).unwrap();
        assert_eq!(ctl.status(), ControllerStatus::Breakpoint { pc: 7 });

        assert!(ctl.remove_breakpoint(7));
        assert!(!ctl.remove_breakpoint(7));
        assert!(!ctl.set_breakpoint_enabled(7, true));
        assert!(ctl.breakpoints().is_empty());
    }

    #[test]
    fn test_reset() {
        let mut ctl = controller(LiftState::with_calls(6, 1, true, &[3]));
        ctl.run(5).unwrap();

        ctl.reset(LiftState::new(6, 0, true));

        assert_eq!(ctl.pc(), 0);
        assert_eq!(ctl.steps(), 0);
        assert_eq!(ctl.status(), ControllerStatus::Idle);
        assert_eq!(ctl.plant().floor, 0);
    }

    #[derive(Debug, Clone, Default)]
    struct DoorOnly {
        open: bool,
    }

    impl Plant for DoorOnly {
        fn condition_inputs(&self) -> ConditionInputs {
            ConditionInputs {
                door_open: self.open,
                door_closed: !self.open,
                ..ConditionInputs::default()
            }
        }

        fn apply(&mut self, instr: &Instruction) -> Result<(), PlantError> {
            self.open = instr.door == DoorRequest::Open;
            Ok(())
        }
    }

    #[test]
    fn test_custom_plant() {
        // 0: open, 1: wait for open, 2: close and jump back
        let program = Program::from_instructions(&[
            Instruction::jump(1).door(DoorRequest::Open),
            Instruction::new(1, ConditionIndex::DoorOpen).inverted().door(DoorRequest::Open),
            Instruction::jump(0),
        ]);
        let mut ctl = LiftController::new(&program, DoorOnly::default());

        ctl.step().unwrap();
        assert!(ctl.plant().open);
        ctl.step().unwrap();
        assert_eq!(ctl.pc(), 2);
        ctl.step().unwrap();
        assert!(!ctl.plant().open);
        assert_eq!(ctl.pc(), 0);
    }
}
