//! TOML-based run configuration and preset definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

/// Foresight modes the dispatch run accepts.
pub const FORESIGHT_MODES: &[&str] = &["overnight", "myopic"];
/// Solvers the dispatch run can drive.
pub const SOLVERS: &[&str] = &["clarabel"];

/// Top-level run configuration parsed from TOML.
///
/// All fields have defaults. Load from TOML with
/// [`RunConfig::from_toml_file`] or use [`RunConfig::from_preset`].
/// The whole structure is embedded in the exported network's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Run identification.
    #[serde(default)]
    pub run: RunSection,
    /// Log verbosity.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Planning horizons, foresight and sequestration potential.
    #[serde(default)]
    pub scenario: ScenarioConfig,
    /// Solver, solve options and memory logging.
    #[serde(default)]
    pub solving: SolvingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    /// Run name, used for result directories in mock mode.
    pub name: String,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            name: "damaged".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset (`error` .. `trace`).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Investment years; the first one selects the sequestration potential.
    pub planning_horizons: Vec<u32>,
    /// `"overnight"` or `"myopic"`.
    pub foresight: String,
    /// Sequestration potential per planning horizon (Mt CO2 per year).
    pub co2_sequestration_potential: BTreeMap<String, f64>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            planning_horizons: vec![2050],
            foresight: "overnight".to_string(),
            co2_sequestration_potential: BTreeMap::new(),
        }
    }
}

impl ScenarioConfig {
    /// Sequestration potential for the first planning horizon, if any.
    pub fn sequestration_potential(&self) -> Option<f64> {
        let horizon = self.planning_horizons.first()?;
        self.co2_sequestration_potential
            .get(&horizon.to_string())
            .copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolvingConfig {
    /// Memory sampling interval in seconds.
    pub mem_logging_frequency: u64,
    pub options: SolveOptions,
    pub solver: SolverConfig,
}

impl Default for SolvingConfig {
    fn default() -> Self {
        Self {
            mem_logging_frequency: 30,
            options: SolveOptions::default(),
            solver: SolverConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolveOptions {
    /// Solve over a sliding window instead of the full horizon at once.
    pub rolling_horizon: bool,
    /// Window length in snapshots for rolling-horizon solves.
    pub horizon: usize,
    /// Snapshots shared by consecutive windows.
    pub overlap: usize,
    /// Availability factors below this value are set to zero.
    pub clip_p_max_pu: f64,
    /// Restrict the solve to the first `nhours` snapshots.
    pub nhours: Option<usize>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            rolling_horizon: false,
            horizon: 100,
            overlap: 0,
            clip_p_max_pu: 1e-2,
            nhours: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub name: String,
    /// Free-form solver options, recorded with the run metadata.
    pub options: toml::Table,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            name: "clarabel".to_string(),
            options: toml::Table::new(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"solving.options.horizon"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl RunConfig {
    /// Default production-style configuration.
    pub fn baseline() -> Self {
        Self {
            run: RunSection::default(),
            logging: LoggingConfig::default(),
            scenario: ScenarioConfig::default(),
            solving: SolvingConfig::default(),
        }
    }

    /// Small test scenario used by mock runs: one planning horizon, no
    /// sequestration limit, fast memory sampling.
    pub fn test() -> Self {
        Self {
            run: RunSection {
                name: "test-elec".to_string(),
            },
            logging: LoggingConfig::default(),
            scenario: ScenarioConfig {
                planning_horizons: vec![2030],
                ..ScenarioConfig::default()
            },
            solving: SolvingConfig {
                mem_logging_frequency: 1,
                ..SolvingConfig::default()
            },
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["default", "test"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "default" => Ok(Self::baseline()),
            "test" => Ok(Self::test()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.logging.level.parse::<LevelFilter>().is_err() {
            errors.push(ConfigError {
                field: "logging.level".into(),
                message: format!("unknown level \"{}\"", self.logging.level),
            });
        }

        let sc = &self.scenario;
        if sc.planning_horizons.is_empty() {
            errors.push(ConfigError {
                field: "scenario.planning_horizons".into(),
                message: "must contain at least one year".into(),
            });
        }
        if !FORESIGHT_MODES.contains(&sc.foresight.as_str()) {
            errors.push(ConfigError {
                field: "scenario.foresight".into(),
                message: format!(
                    "must be one of {}, got \"{}\"",
                    FORESIGHT_MODES.join(", "),
                    sc.foresight
                ),
            });
        }
        for (year, potential) in &sc.co2_sequestration_potential {
            if !potential.is_finite() || *potential < 0.0 {
                errors.push(ConfigError {
                    field: format!("scenario.co2_sequestration_potential.{year}"),
                    message: "must be a finite value >= 0".into(),
                });
            }
        }

        let s = &self.solving;
        if s.mem_logging_frequency == 0 {
            errors.push(ConfigError {
                field: "solving.mem_logging_frequency".into(),
                message: "must be > 0".into(),
            });
        }
        if !SOLVERS.contains(&s.solver.name.as_str()) {
            errors.push(ConfigError {
                field: "solving.solver.name".into(),
                message: format!(
                    "must be one of {}, got \"{}\"",
                    SOLVERS.join(", "),
                    s.solver.name
                ),
            });
        }

        let o = &s.options;
        if o.horizon == 0 {
            errors.push(ConfigError {
                field: "solving.options.horizon".into(),
                message: "must be > 0".into(),
            });
        }
        if o.overlap >= o.horizon {
            errors.push(ConfigError {
                field: "solving.options.overlap".into(),
                message: "must be < solving.options.horizon".into(),
            });
        }
        if !(0.0..1.0).contains(&o.clip_p_max_pu) {
            errors.push(ConfigError {
                field: "solving.options.clip_p_max_pu".into(),
                message: "must be in [0.0, 1.0)".into(),
            });
        }
        if o.nhours == Some(0) {
            errors.push(ConfigError {
                field: "solving.options.nhours".into(),
                message: "must be > 0 when set".into(),
            });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        for name in RunConfig::PRESETS {
            let cfg = RunConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(errors.is_empty(), "preset \"{name}\" should be valid: {errors:?}");
        }
    }

    #[test]
    fn from_preset_unknown() {
        let err = RunConfig::from_preset("nonexistent");
        assert!(err.is_err());
        assert!(err.err().map(|e| e.message).unwrap_or_default().contains("unknown preset"));
    }

    #[test]
    fn full_toml_parses() {
        let toml = r#"
[run]
name = "damaged-2030"

[logging]
level = "debug"

[scenario]
planning_horizons = [2030, 2040]
foresight = "myopic"
co2_sequestration_potential = { 2030 = 25.0, 2040 = 50.0 }

[solving]
mem_logging_frequency = 5

[solving.options]
rolling_horizon = true
horizon = 168
overlap = 24
clip_p_max_pu = 0.005
nhours = 720

[solving.solver]
name = "clarabel"
options = { max_iter = 500 }
"#;
        let cfg = RunConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.solving.options.horizon), Some(168));
        assert_eq!(cfg.as_ref().map(|c| c.solving.options.nhours), Some(Some(720)));
        assert_eq!(
            cfg.as_ref().and_then(|c| c.scenario.sequestration_potential()),
            Some(25.0)
        );
        assert!(cfg.map(|c| c.validate().is_empty()).unwrap_or(false));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[solving.options]
rolling_horizon = true
"#;
        let cfg = RunConfig::from_toml_str(toml).ok();
        assert_eq!(cfg.as_ref().map(|c| c.solving.options.rolling_horizon), Some(true));
        assert_eq!(cfg.as_ref().map(|c| c.solving.options.horizon), Some(100));
        assert_eq!(cfg.as_ref().map(|c| c.solving.mem_logging_frequency), Some(30));
        assert_eq!(cfg.as_ref().map(|c| c.solving.solver.name.as_str()), Some("clarabel"));
    }

    #[test]
    fn unknown_field_rejected() {
        let toml = r#"
[solving.options]
bogus = 1
"#;
        assert!(RunConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_overlap_not_below_horizon() {
        let mut cfg = RunConfig::baseline();
        cfg.solving.options.horizon = 10;
        cfg.solving.options.overlap = 10;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "solving.options.overlap"));
    }

    #[test]
    fn validation_rejects_perfect_foresight() {
        let mut cfg = RunConfig::baseline();
        cfg.scenario.foresight = "perfect".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "scenario.foresight"));
    }

    #[test]
    fn validation_rejects_unsupported_solver() {
        let mut cfg = RunConfig::baseline();
        cfg.solving.solver.name = "gurobi".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "solving.solver.name"));
    }

    #[test]
    fn validation_catches_zero_memory_interval() {
        let mut cfg = RunConfig::baseline();
        cfg.solving.mem_logging_frequency = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "solving.mem_logging_frequency"));
    }

    #[test]
    fn validation_catches_bad_log_level() {
        let mut cfg = RunConfig::baseline();
        cfg.logging.level = "loud".to_string();
        assert!(cfg.validate().iter().any(|e| e.field == "logging.level"));
    }

    #[test]
    fn no_potential_without_matching_horizon() {
        let mut cfg = RunConfig::baseline();
        cfg.scenario
            .co2_sequestration_potential
            .insert("2030".into(), 10.0);
        assert_eq!(cfg.scenario.sequestration_potential(), None);
    }
}
