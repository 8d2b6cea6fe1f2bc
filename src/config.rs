//! Configuration management for lift-emu.
//!
//! Configuration is loaded from multiple sources in priority order:
//! 1. Environment variables (LIFT_EMU_FLOORS, etc.)
//! 2. Project-local config file (`./lift-emu.toml`)
//! 3. User config file (`~/.config/lift-emu/config.toml`)
//! 4. Built-in defaults
//!
//! # Config File Format
//!
//! ```toml
//! # lift-emu.toml
//!
//! # Number of floors of the emulated shaft
//! floors = 6
//!
//! # Upper bound on the steps a scenario may request
//! max_steps = 200
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::lift::{DEFAULT_FLOORS, MAX_FLOORS};
use crate::testing::DEFAULT_MAX_STEPS;

/// Global cached configuration.
static CONFIG: OnceLock<Config> = OnceLock::new();

/// lift-emu configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Number of floors of the emulated shaft.
    pub floors: Option<usize>,

    /// Maximum number of steps a scenario may request.
    pub max_steps: Option<u32>,

    /// Directory of scenario manifests used by `suite`.
    pub scenario_dir: Option<String>,

    /// Program image to run instead of the built-in program.
    pub program_path: Option<String>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Project-local `lift-emu.toml`
    /// 3. User config `~/.config/lift-emu/config.toml`
    /// 4. Defaults
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(user_config) = Self::load_user_config() {
            config.merge(user_config);
        }

        if let Some(local_config) = Self::load_local_config() {
            config.merge(local_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Get the cached global configuration.
    ///
    /// Loads configuration on first call and caches it.
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(|| {
            let config = Self::load();
            log::debug!("Loaded configuration: {:?}", config);
            config
        })
    }

    /// Number of floors, defaulting to 6.
    pub fn floors(&self) -> usize {
        self.floors.unwrap_or(DEFAULT_FLOORS)
    }

    /// Scenario step limit, defaulting to 200.
    pub fn max_steps(&self) -> u32 {
        self.max_steps.unwrap_or(DEFAULT_MAX_STEPS)
    }

    pub fn scenario_dir(&self) -> Option<PathBuf> {
        self.scenario_dir.as_ref().map(PathBuf::from)
    }

    pub fn program_path(&self) -> Option<PathBuf> {
        self.program_path.as_ref().map(PathBuf::from)
    }

    /// Load user configuration from ~/.config/lift-emu/config.toml
    fn load_user_config() -> Option<Self> {
        let config_path = Self::user_config_path()?;
        Self::load_from_file(&config_path)
    }

    /// Load project-local configuration from ./lift-emu.toml
    fn load_local_config() -> Option<Self> {
        Self::load_from_file(Path::new("lift-emu.toml"))
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Merge another config into this one.
    /// Only overrides fields that are Some in the other config.
    fn merge(&mut self, other: Self) {
        if other.floors.is_some() {
            self.floors = other.floors;
        }
        if other.max_steps.is_some() {
            self.max_steps = other.max_steps;
        }
        if other.scenario_dir.is_some() {
            self.scenario_dir = other.scenario_dir;
        }
        if other.program_path.is_some() {
            self.program_path = other.program_path;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("LIFT_EMU_FLOORS") {
            match value.parse::<usize>() {
                Ok(floors) if floors == 0 || floors > MAX_FLOORS => {
                    log::warn!(
                        "Ignoring LIFT_EMU_FLOORS={}: must be between 1 and {}",
                        floors,
                        MAX_FLOORS
                    );
                }
                Ok(floors) => {
                    log::info!("Using LIFT_EMU_FLOORS from environment: {}", floors);
                    self.floors = Some(floors);
                }
                Err(e) => log::warn!("Ignoring LIFT_EMU_FLOORS={:?}: {}", value, e),
            }
        }
        if let Some(value) = lookup("LIFT_EMU_MAX_STEPS") {
            match value.parse::<u32>() {
                Ok(max_steps) => {
                    log::info!("Using LIFT_EMU_MAX_STEPS from environment: {}", max_steps);
                    self.max_steps = Some(max_steps);
                }
                Err(e) => log::warn!("Ignoring LIFT_EMU_MAX_STEPS={:?}: {}", value, e),
            }
        }
        if let Some(path) = lookup("LIFT_EMU_SCENARIO_DIR") {
            log::info!("Using LIFT_EMU_SCENARIO_DIR from environment: {}", path);
            self.scenario_dir = Some(path);
        }
        if let Some(path) = lookup("LIFT_EMU_PROGRAM") {
            log::info!("Using LIFT_EMU_PROGRAM from environment: {}", path);
            self.program_path = Some(path);
        }
    }

    /// Get the path to the user config file (for display/creation).
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("lift-emu").join("config.toml"))
    }

    /// Generate a sample config file content.
    pub fn sample_config() -> String {
        r#"# lift-emu configuration
# Place this file at ~/.config/lift-emu/config.toml or ./lift-emu.toml

# Number of floors of the emulated shaft (default 6)
floors = 6

# Upper bound on the steps a scenario may request (default 200)
max_steps = 200

# Directory of scenario manifests for `lift-emu suite` (optional)
# scenario_dir = "./scenarios"

# Program image to run instead of the built-in program (optional)
# program_path = "./lift.bin"
"#
        .to_string()
    }
}
