//! TOML-based plan configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;
use crate::params::{
    BatterySpec, IntensityTable, ObjectiveWeights, OperatingLimits, PlanParameters, Tariff,
    UsageTotals,
};

/// Top-level plan configuration parsed from TOML.
///
/// All fields have defaults matching the reference household. Load from
/// TOML with [`PlanConfig::from_toml_file`] or use [`PlanConfig::default`]
/// for the built-in constants.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanConfig {
    /// Time-of-use rates and period hours.
    #[serde(default)]
    pub tariff: TariffConfig,
    /// Household consumption per tariff period.
    #[serde(default)]
    pub usage: UsageConfig,
    /// Battery physics.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Duty-cycle and grid import limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Cost/GHG weights.
    #[serde(default)]
    pub objective: ObjectiveConfig,
    /// Solver options.
    #[serde(default)]
    pub solver: SolverConfig,
}

/// Time-of-use tariff.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffConfig {
    /// On-peak rate ($/kWh).
    pub on_peak_rate: f64,
    /// Mid-peak rate ($/kWh).
    pub mid_peak_rate: f64,
    /// Off-peak rate ($/kWh).
    pub off_peak_rate: f64,
    /// Clock hours (0..=23) billed on-peak.
    pub on_peak_hours: Vec<u32>,
    /// Clock hours (0..=23) billed mid-peak. All other hours are off-peak.
    pub mid_peak_hours: Vec<u32>,
}

impl Default for TariffConfig {
    fn default() -> Self {
        let t = Tariff::default();
        Self {
            on_peak_rate: t.on_peak_rate,
            mid_peak_rate: t.mid_peak_rate,
            off_peak_rate: t.off_peak_rate,
            on_peak_hours: t.on_peak_hours,
            mid_peak_hours: t.mid_peak_hours,
        }
    }
}

/// Daily usage per tariff period (kWh).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UsageConfig {
    pub on_peak_kwh: f64,
    pub mid_peak_kwh: f64,
    pub off_peak_kwh: f64,
}

impl Default for UsageConfig {
    fn default() -> Self {
        let u = UsageTotals::default();
        Self {
            on_peak_kwh: u.on_peak_kwh,
            mid_peak_kwh: u.mid_peak_kwh,
            off_peak_kwh: u.off_peak_kwh,
        }
    }
}

/// Battery storage parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Usable capacity (kWh, must be > 0).
    pub capacity_kwh: f64,
    /// Reserved fraction of capacity, in `[0, 1)`.
    pub depth_of_discharge: f64,
    /// Maximum charge/discharge per hour (kWh).
    pub rate_kwh: f64,
    /// Discharge efficiency, in `(0, 1]`.
    pub efficiency: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        let b = BatterySpec::default();
        Self {
            capacity_kwh: b.capacity_kwh,
            depth_of_discharge: b.depth_of_discharge,
            rate_kwh: b.rate_kwh,
            efficiency: b.efficiency,
        }
    }
}

/// Operating limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum charging hours per day.
    pub max_charge_hours: u32,
    /// Maximum discharging hours per day.
    pub max_discharge_hours: u32,
    /// Optional cap on grid import per hour (kWh).
    pub max_grid_draw_kwh: Option<f64>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let l = OperatingLimits::default();
        Self {
            max_charge_hours: l.max_charge_hours,
            max_discharge_hours: l.max_discharge_hours,
            max_grid_draw_kwh: l.max_grid_draw_kwh,
        }
    }
}

/// Objective weights; not normalized.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObjectiveConfig {
    pub cost_weight: f64,
    pub ghg_weight: f64,
}

impl Default for ObjectiveConfig {
    fn default() -> Self {
        let w = ObjectiveWeights::default();
        Self {
            cost_weight: w.cost,
            ghg_weight: w.ghg,
        }
    }
}

/// Solver options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Wall-clock limit handed to backends that support one.
    pub time_limit_secs: Option<f64>,
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.capacity_kwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl PlanConfig {
    /// Household with no battery throughput and no grid access: no schedule
    /// can meet usage.
    pub fn islanded() -> Self {
        Self {
            battery: BatteryConfig {
                rate_kwh: 0.0,
                ..BatteryConfig::default()
            },
            limits: LimitsConfig {
                max_grid_draw_kwh: Some(0.0),
                ..LimitsConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["default", "islanded"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "default" => Ok(Self::default()),
            "islanded" => Ok(Self::islanded()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let t = &self.tariff;
        for (field, rate) in [
            ("tariff.on_peak_rate", t.on_peak_rate),
            ("tariff.mid_peak_rate", t.mid_peak_rate),
            ("tariff.off_peak_rate", t.off_peak_rate),
        ] {
            if !(rate.is_finite() && rate >= 0.0) {
                errors.push(ConfigError::new(field, "must be >= 0"));
            }
        }
        if let Some(problem) = self.tariff().hour_set_problem() {
            errors.push(ConfigError::new("tariff", problem));
        }

        let u = &self.usage;
        for (field, kwh) in [
            ("usage.on_peak_kwh", u.on_peak_kwh),
            ("usage.mid_peak_kwh", u.mid_peak_kwh),
            ("usage.off_peak_kwh", u.off_peak_kwh),
        ] {
            if !(kwh.is_finite() && kwh >= 0.0) {
                errors.push(ConfigError::new(field, "must be >= 0"));
            }
        }

        let b = &self.battery;
        if !(b.capacity_kwh.is_finite() && b.capacity_kwh > 0.0) {
            errors.push(ConfigError::new("battery.capacity_kwh", "must be > 0"));
        }
        if !(0.0..1.0).contains(&b.depth_of_discharge) {
            errors.push(ConfigError::new(
                "battery.depth_of_discharge",
                "must be in [0.0, 1.0)",
            ));
        }
        if !(b.rate_kwh.is_finite() && b.rate_kwh >= 0.0) {
            errors.push(ConfigError::new("battery.rate_kwh", "must be >= 0"));
        }
        if !(b.efficiency > 0.0 && b.efficiency <= 1.0) {
            errors.push(ConfigError::new("battery.efficiency", "must be in (0.0, 1.0]"));
        }

        let l = &self.limits;
        if l.max_charge_hours > 24 {
            errors.push(ConfigError::new("limits.max_charge_hours", "must be <= 24"));
        }
        if l.max_discharge_hours > 24 {
            errors.push(ConfigError::new("limits.max_discharge_hours", "must be <= 24"));
        }
        if let Some(cap) = l.max_grid_draw_kwh
            && !(cap.is_finite() && cap >= 0.0)
        {
            errors.push(ConfigError::new("limits.max_grid_draw_kwh", "must be >= 0"));
        }

        let o = &self.objective;
        if !o.cost_weight.is_finite() {
            errors.push(ConfigError::new("objective.cost_weight", "must be finite"));
        }
        if !o.ghg_weight.is_finite() {
            errors.push(ConfigError::new("objective.ghg_weight", "must be finite"));
        }

        if let Some(secs) = self.solver.time_limit_secs {
            if !(secs.is_finite() && secs > 0.0) {
                errors.push(ConfigError::new("solver.time_limit_secs", "must be > 0"));
            } else if Duration::try_from_secs_f64(secs).is_err() {
                errors.push(ConfigError::new(
                    "solver.time_limit_secs",
                    format!("{secs} is too large for a duration"),
                ));
            }
        }

        errors
    }

    pub fn tariff(&self) -> Tariff {
        let t = &self.tariff;
        Tariff {
            on_peak_rate: t.on_peak_rate,
            mid_peak_rate: t.mid_peak_rate,
            off_peak_rate: t.off_peak_rate,
            on_peak_hours: t.on_peak_hours.clone(),
            mid_peak_hours: t.mid_peak_hours.clone(),
        }
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.solver
            .time_limit_secs
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Bundles the configured constants with an intensity table.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PlanError::ModelBuild`] if the usage totals
    /// cannot be spread over the tariff hours.
    pub fn to_parameters(&self, intensity: IntensityTable) -> Result<PlanParameters> {
        let u = &self.usage;
        let b = &self.battery;
        let l = &self.limits;
        PlanParameters::new(
            self.tariff(),
            UsageTotals {
                on_peak_kwh: u.on_peak_kwh,
                mid_peak_kwh: u.mid_peak_kwh,
                off_peak_kwh: u.off_peak_kwh,
            },
            intensity,
            BatterySpec {
                capacity_kwh: b.capacity_kwh,
                depth_of_discharge: b.depth_of_discharge,
                rate_kwh: b.rate_kwh,
                efficiency: b.efficiency,
            },
            OperatingLimits {
                max_charge_hours: l.max_charge_hours,
                max_discharge_hours: l.max_discharge_hours,
                max_grid_draw_kwh: l.max_grid_draw_kwh,
            },
            ObjectiveWeights {
                cost: self.objective.cost_weight,
                ghg: self.objective.ghg_weight,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_valid() {
        let cfg = PlanConfig::default();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "default should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = PlanConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in PlanConfig::PRESETS {
            let cfg = PlanConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn islanded_has_no_throughput_or_grid() {
        let cfg = PlanConfig::islanded();
        assert_eq!(cfg.battery.rate_kwh, 0.0);
        assert_eq!(cfg.limits.max_grid_draw_kwh, Some(0.0));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[tariff]
on_peak_rate = 0.2
mid_peak_rate = 0.1
off_peak_rate = 0.05
on_peak_hours = [16, 17, 18, 19]
mid_peak_hours = [7, 8, 9]

[usage]
on_peak_kwh = 400.0
mid_peak_kwh = 200.0
off_peak_kwh = 300.0

[battery]
capacity_kwh = 10.0
depth_of_discharge = 0.1
rate_kwh = 4.0
efficiency = 0.95

[limits]
max_charge_hours = 4
max_discharge_hours = 2
max_grid_draw_kwh = 120.0

[objective]
cost_weight = 1.0
ghg_weight = 0.0

[solver]
time_limit_secs = 30.0
"#;
        let cfg = PlanConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.tariff.on_peak_hours.len()), Some(4));
        assert_eq!(cfg.as_ref().map(|c| c.limits.max_discharge_hours), Some(2));
        assert_eq!(
            cfg.as_ref().and_then(PlanConfig::time_limit),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[battery]
capacity_kwh = 13.5
bogus_field = true
"#;
        assert!(PlanConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[objective]
ghg_weight = 0.5
"#;
        let cfg = PlanConfig::from_toml_str(toml).ok();
        assert_eq!(cfg.as_ref().map(|c| c.objective.ghg_weight), Some(0.5));
        assert_eq!(cfg.as_ref().map(|c| c.objective.cost_weight), Some(0.9));
        assert_eq!(cfg.as_ref().map(|c| c.battery.capacity_kwh), Some(13.5));
        assert_eq!(cfg.as_ref().and_then(|c| c.limits.max_grid_draw_kwh), None);
    }

    #[test]
    fn validation_catches_bad_battery() {
        let mut cfg = PlanConfig::default();
        cfg.battery.depth_of_discharge = 1.0;
        cfg.battery.efficiency = 1.5;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "battery.depth_of_discharge"));
        assert!(errors.iter().any(|e| e.field == "battery.efficiency"));
    }

    #[test]
    fn validation_catches_overlapping_periods() {
        let mut cfg = PlanConfig::default();
        cfg.tariff.mid_peak_hours.push(7);
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "tariff"));
    }

    #[test]
    fn validation_catches_negative_grid_cap() {
        let mut cfg = PlanConfig::default();
        cfg.limits.max_grid_draw_kwh = Some(-1.0);
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "limits.max_grid_draw_kwh"));
    }

    #[test]
    fn validation_catches_oversized_time_limit() {
        let cfg = PlanConfig::from_toml_str("[solver]\ntime_limit_secs = 1e30\n");
        assert!(cfg.is_ok());
        let cfg = cfg.ok();
        let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
        assert!(errors.iter().any(|e| e.field == "solver.time_limit_secs"));
        assert_eq!(cfg.as_ref().and_then(PlanConfig::time_limit), None);
    }

    #[test]
    fn validation_catches_non_positive_time_limit() {
        let mut cfg = PlanConfig::default();
        cfg.solver.time_limit_secs = Some(0.0);
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "solver.time_limit_secs"));
        assert_eq!(cfg.time_limit(), None);
    }

    #[test]
    fn to_parameters_matches_defaults() {
        let params = PlanConfig::default()
            .to_parameters(IntensityTable::synthetic(1))
            .expect("defaults build");
        assert!((params.baseline_cost() - 150.06).abs() < 1e-9);
        assert_eq!(params.battery, BatterySpec::default());
        assert_eq!(params.limits, OperatingLimits::default());
    }
}
