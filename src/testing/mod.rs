//! Scenario harness for the lift controller.
//!
//! This module provides infrastructure for:
//! - Defining lift scenarios (built-in or TOML manifests)
//! - Running them against a program on a fresh controller
//! - Reporting mismatches between final and expected lift state
//!
//! # Usage
//!
//! ```bash
//! cargo run -- suite                 # built-in scenarios
//! cargo run -- suite ./scenarios/    # every *.toml in a directory
//! ```

pub mod runner;
pub mod scenario;

pub use runner::{ScenarioOutcome, ScenarioRunner, SuiteReport};
pub use scenario::{Scenario, ScenarioError, ScenarioManifest, ScenarioSuite, DEFAULT_MAX_STEPS};
