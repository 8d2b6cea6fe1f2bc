//! Scenario runner and suite reports.

use std::fmt::Write as _;

use super::scenario::{Scenario, ScenarioSuite, DEFAULT_MAX_STEPS};
use crate::lift::{LiftController, LiftState, Mismatch};
use crate::seqnet::Program;

/// Result of running one scenario.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub name: String,
    pub passed: bool,
    /// Steps actually executed (fewer than requested on a fault).
    pub steps: u64,
    pub final_state: LiftState,
    pub expected: LiftState,
    pub mismatches: Vec<Mismatch>,
    /// Plant fault or setup error.
    pub error: Option<String>,
}

impl ScenarioOutcome {
    /// Multi-line report in the style of the controller's console output.
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Test case: {}", self.name);
        let _ = writeln!(out, "END: {}", self.final_state);
        let _ = writeln!(out, "REF: {}", self.expected);
        for mismatch in &self.mismatches {
            let _ = writeln!(out, "{}", mismatch);
        }
        if let Some(error) = &self.error {
            let _ = writeln!(out, "Error: {}", error);
        }
        let _ = writeln!(out, "Test case {}!", if self.passed { "PASSED" } else { "FAILED" });
        out
    }
}

/// Aggregated suite results.
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub outcomes: Vec<ScenarioOutcome>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScenarioOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    /// One line per scenario plus a total.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for outcome in &self.outcomes {
            let _ = writeln!(
                out,
                "  - {:<40} ... {}",
                outcome.name,
                if outcome.passed { "OK" } else { "FAIL" }
            );
        }
        let _ = writeln!(out, "{}/{} scenarios passed.", self.passed(), self.outcomes.len());
        out
    }
}

/// Runs scenarios on a fresh controller each time.
pub struct ScenarioRunner {
    program: Program,
    max_steps: u32,
    trace: bool,
}

impl ScenarioRunner {
    /// Runner using the built-in lift program.
    pub fn new() -> Self {
        Self {
            program: Program::default_lift(),
            max_steps: DEFAULT_MAX_STEPS,
            trace: false,
        }
    }

    pub fn with_program(mut self, program: Program) -> Self {
        self.program = program;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Print every step while running.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Run a single scenario.
    pub fn run(&self, scenario: &Scenario) -> ScenarioOutcome {
        let mut outcome = ScenarioOutcome {
            name: scenario.name.clone(),
            passed: false,
            steps: 0,
            final_state: scenario.initial.clone(),
            expected: scenario.expected.clone(),
            mismatches: Vec::new(),
            error: None,
        };

        if scenario.steps > self.max_steps {
            outcome.error = Some(format!(
                "{} steps exceeds the limit of {}",
                scenario.steps, self.max_steps
            ));
            return outcome;
        }

        let mut controller = LiftController::new(&self.program, scenario.initial.clone());
        controller.set_pc(scenario.pc_preset);

        log::debug!(
            "Running '{}': {} steps from PC {} ({})",
            scenario.name,
            scenario.steps,
            scenario.pc_preset,
            scenario.initial
        );

        let mut fault = None;
        for _ in 0..scenario.steps {
            match controller.step() {
                Ok(record) => {
                    if self.trace {
                        println!("{}", record);
                    }
                }
                Err(e) => {
                    fault = Some(e.to_string());
                    break;
                }
            }
        }

        outcome.steps = controller.steps();
        outcome.final_state = controller.plant().clone();
        outcome.mismatches = outcome.final_state.diff(&scenario.expected);
        outcome.passed = fault.is_none() && outcome.mismatches.is_empty();
        outcome.error = fault;

        if outcome.passed {
            log::info!("Scenario '{}' passed", scenario.name);
        } else {
            log::warn!("Scenario '{}' failed", scenario.name);
        }

        outcome
    }

    /// Run every scenario in the suite.
    pub fn run_suite(&self, suite: &ScenarioSuite) -> SuiteReport {
        SuiteReport {
            outcomes: suite.scenarios.iter().map(|s| self.run(s)).collect(),
        }
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}
