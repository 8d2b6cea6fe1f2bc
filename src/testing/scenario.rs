//! Lift scenarios defined by TOML manifests.
//!
//! A scenario starts the controller from a known lift state (optionally at a
//! preset PC), runs a fixed number of steps, and compares the final lift
//! state with the expected one.
//!
//! # Example Manifest
//!
//! ```toml
//! [scenario]
//! name = "move_down"
//! description = "Call from floor below"
//! steps = 15
//! floors = 6        # optional, default 6
//! pc_preset = 0     # optional
//!
//! [initial]
//! floor = 3
//! door_open = true
//! calls = [1]       # floors with a pending call
//!
//! [expected]
//! floor = 1
//! door_open = true
//! calls = []
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::lift::{LiftState, DEFAULT_FLOORS, MAX_FLOORS};

/// Maximum steps a scenario may request unless configured otherwise.
pub const DEFAULT_MAX_STEPS: u32 = 200;

/// Scenario loading and validation errors.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scenario manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("scenario '{name}': {what} floor {floor} outside 0..{floors}")]
    FloorOutOfRange {
        name: String,
        what: &'static str,
        floor: u8,
        floors: usize,
    },

    #[error("scenario '{name}': {steps} steps exceeds the limit of {max}")]
    TooManySteps { name: String, steps: u32, max: u32 },

    #[error("scenario '{0}': needs at least one floor")]
    NoFloors(String),

    #[error("scenario '{name}': {floors} floors exceeds the limit of {max}")]
    TooManyFloors { name: String, floors: usize, max: usize },
}

/// Manifest layout.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioManifest {
    pub scenario: ScenarioInfo,
    pub initial: StateDef,
    pub expected: StateDef,
}

/// Scenario metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: u32,
    #[serde(default = "default_floors")]
    pub floors: usize,
    #[serde(default)]
    pub pc_preset: u8,
}

fn default_floors() -> usize {
    DEFAULT_FLOORS
}

/// Lift state as written in a manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct StateDef {
    pub floor: u8,
    pub door_open: bool,
    #[serde(default)]
    pub moving: bool,
    /// Floors with a pending call.
    #[serde(default)]
    pub calls: Vec<u8>,
}

/// A validated scenario ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub initial: LiftState,
    pub expected: LiftState,
    pub steps: u32,
    pub pc_preset: u8,
}

impl Scenario {
    /// Scenario starting at PC 0.
    pub fn new(
        name: &str,
        description: &str,
        initial: LiftState,
        expected: LiftState,
        steps: u32,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            initial,
            expected,
            steps,
            pc_preset: 0,
        }
    }

    pub fn with_pc_preset(mut self, pc: u8) -> Self {
        self.pc_preset = pc;
        self
    }

    /// Parse and validate a manifest.
    pub fn from_toml(content: &str, max_steps: u32) -> Result<Self, ScenarioError> {
        let manifest: ScenarioManifest = toml::from_str(content)?;
        Self::from_manifest(manifest, max_steps)
    }

    /// Load and validate a manifest file.
    pub fn from_file(path: &Path, max_steps: u32) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, max_steps)
    }

    /// Validate a parsed manifest.
    pub fn from_manifest(manifest: ScenarioManifest, max_steps: u32) -> Result<Self, ScenarioError> {
        let info = manifest.scenario;

        if info.floors == 0 {
            return Err(ScenarioError::NoFloors(info.name));
        }
        if info.floors > MAX_FLOORS {
            return Err(ScenarioError::TooManyFloors {
                name: info.name,
                floors: info.floors,
                max: MAX_FLOORS,
            });
        }
        if info.steps > max_steps {
            return Err(ScenarioError::TooManySteps {
                name: info.name,
                steps: info.steps,
                max: max_steps,
            });
        }

        let initial = build_state(&info, &manifest.initial)?;
        let expected = build_state(&info, &manifest.expected)?;

        Ok(Self {
            name: info.name,
            description: info.description,
            initial,
            expected,
            steps: info.steps,
            pc_preset: info.pc_preset,
        })
    }
}

fn build_state(info: &ScenarioInfo, def: &StateDef) -> Result<LiftState, ScenarioError> {
    let out_of_range = |what: &'static str, floor: u8| ScenarioError::FloorOutOfRange {
        name: info.name.clone(),
        what,
        floor,
        floors: info.floors,
    };

    if def.floor as usize >= info.floors {
        return Err(out_of_range("car", def.floor));
    }
    if let Some(&bad) = def.calls.iter().find(|&&f| f as usize >= info.floors) {
        return Err(out_of_range("call", bad));
    }

    let mut state = LiftState::with_calls(info.floors, def.floor, def.door_open, &def.calls);
    state.moving = def.moving;
    Ok(state)
}

/// A named collection of scenarios.
#[derive(Debug, Clone, Default)]
pub struct ScenarioSuite {
    pub scenarios: Vec<Scenario>,
}

impl ScenarioSuite {
    /// Scenarios exercising the default lift program on a 6-floor shaft.
    pub fn builtin() -> Self {
        let n = DEFAULT_FLOORS;
        let state = |floor, door_open, calls: &[u8]| LiftState::with_calls(n, floor, door_open, calls);
        let arrived = |floor| LiftState::new(n, floor, true);

        let scenarios = vec![
            Scenario::new(
                "already_open",
                "Call from current floor, door already open",
                state(1, true, &[1]),
                arrived(1),
                10,
            ),
            Scenario::new(
                "open_door_same_floor",
                "Call from current floor",
                state(2, true, &[2]),
                arrived(2),
                8,
            ),
            Scenario::new("move_down", "Call from floor below", state(3, true, &[1]), arrived(1), 15),
            Scenario::new("move_up", "Call from floor above", state(1, true, &[3]), arrived(3), 15),
            Scenario::new(
                "multiple_calls",
                "Calls above and below, below served first",
                state(2, true, &[1, 3]),
                arrived(3),
                25,
            ),
            Scenario::new("idle", "No calls", state(2, true, &[]), arrived(2), 10),
            Scenario::new(
                "reopen_during_close",
                "Call on the current floor while the door is closing",
                state(3, false, &[3]),
                arrived(3),
                15,
            )
            .with_pc_preset(3),
            Scenario::new(
                "bottom_to_top",
                "Long trip from the bottom to the top floor",
                state(0, false, &[5]),
                arrived(5),
                25,
            ),
            Scenario::new(
                "middle_stop",
                "Stop on a middle floor",
                state(0, true, &[2]),
                arrived(2),
                16,
            ),
            Scenario::new("up_two_floors", "Move up 2 floors", state(1, true, &[3]), arrived(3), 16),
            Scenario::new(
                "down_two_floors",
                "Move down 3 floors with the door closed",
                state(4, false, &[1]),
                arrived(1),
                18,
            ),
            Scenario::new(
                "all_calls",
                "Every floor has a call",
                state(0, false, &[0, 1, 2, 3, 4, 5]),
                arrived(5),
                75,
            ),
        ];

        Self { scenarios }
    }

    /// Load every `*.toml` manifest in `dir`, sorted by file name.
    pub fn load_dir(dir: &Path, max_steps: u32) -> Result<Self, ScenarioError> {
        let read_err = |source| ScenarioError::Read {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            if path.extension().is_some_and(|ext| ext == "toml") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut scenarios = Vec::with_capacity(paths.len());
        for path in &paths {
            let scenario = Scenario::from_file(path, max_steps)?;
            log::debug!("Loaded scenario '{}' from {}", scenario.name, path.display());
            scenarios.push(scenario);
        }
        log::info!("Loaded {} scenarios from {}", scenarios.len(), dir.display());

        Ok(Self { scenarios })
    }

    pub fn find(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOVE_DOWN: &str = r#"
[scenario]
name = "move_down"
description = "Call from floor below"
steps = 15

[initial]
floor = 3
door_open = true
calls = [1]

[expected]
floor = 1
door_open = true
calls = []
"#;

    #[test]
    fn test_parse_manifest() {
        let scenario = Scenario::from_toml(MOVE_DOWN, DEFAULT_MAX_STEPS).unwrap();

        assert_eq!(scenario.name, "move_down");
        assert_eq!(scenario.steps, 15);
        assert_eq!(scenario.pc_preset, 0);
        assert_eq!(scenario.initial, LiftState::with_calls(6, 3, true, &[1]));
        assert_eq!(scenario.expected, LiftState::new(6, 1, true));
    }

    #[test]
    fn test_manifest_matches_builtin() {
        let parsed = Scenario::from_toml(MOVE_DOWN, DEFAULT_MAX_STEPS).unwrap();
        let builtin = ScenarioSuite::builtin();
        assert_eq!(builtin.find("move_down"), Some(&parsed));
    }

    #[test]
    fn test_step_limit() {
        let err = Scenario::from_toml(MOVE_DOWN, 10).unwrap_err();
        assert!(matches!(err, ScenarioError::TooManySteps { steps: 15, max: 10, .. }));
    }

    #[test]
    fn test_floor_validation() {
        let manifest = MOVE_DOWN.replace("calls = [1]", "calls = [1, 7]");
        let err = Scenario::from_toml(&manifest, DEFAULT_MAX_STEPS).unwrap_err();
        assert!(matches!(err, ScenarioError::FloorOutOfRange { what: "call", floor: 7, .. }));

        let manifest = MOVE_DOWN.replace("steps = 15", "steps = 15\nfloors = 3");
        let err = Scenario::from_toml(&manifest, DEFAULT_MAX_STEPS).unwrap_err();
        assert!(matches!(err, ScenarioError::FloorOutOfRange { what: "car", floor: 3, .. }));
    }

    #[test]
    fn test_shaft_size_limit() {
        let manifest = MOVE_DOWN
            .replace("steps = 15", "steps = 15\nfloors = 300")
            .replace("floor = 3", "floor = 255");
        let err = Scenario::from_toml(&manifest, DEFAULT_MAX_STEPS).unwrap_err();
        assert!(matches!(err, ScenarioError::TooManyFloors { floors: 300, max: 256, .. }));

        let manifest = MOVE_DOWN.replace("steps = 15", "steps = 15\nfloors = 256");
        let scenario = Scenario::from_toml(&manifest, DEFAULT_MAX_STEPS).unwrap();
        assert_eq!(scenario.initial.floors(), 256);
    }

    #[test]
    fn test_parse_error() {
        let err = Scenario::from_toml("[scenario]\nname = 1", DEFAULT_MAX_STEPS).unwrap_err();
        assert!(matches!(err, ScenarioError::Parse(_)));
    }

    #[test]
    fn test_builtin_suite() {
        let suite = ScenarioSuite::builtin();
        assert_eq!(suite.len(), 12);
        assert_eq!(suite.find("reopen_during_close").map(|s| s.pc_preset), Some(3));
        assert!(suite.scenarios.iter().all(|s| s.steps <= DEFAULT_MAX_STEPS));
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_move_down.toml"), MOVE_DOWN).unwrap();
        std::fs::write(
            dir.path().join("a_idle.toml"),
            MOVE_DOWN
                .replace("move_down", "idle")
                .replace("calls = [1]", "calls = []")
                .replace("floor = 3", "floor = 1"),
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let suite = ScenarioSuite::load_dir(dir.path(), DEFAULT_MAX_STEPS).unwrap();
        let names: Vec<_> = suite.scenarios.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["idle", "move_down"]);
    }

    #[test]
    fn test_load_missing_dir() {
        let err = ScenarioSuite::load_dir(Path::new("/nonexistent/scenarios"), DEFAULT_MAX_STEPS)
            .unwrap_err();
        assert!(matches!(err, ScenarioError::Read { .. }));
    }
}
