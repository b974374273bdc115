//! Model inputs: tariff, household usage, GHG intensity, battery physics,
//! operating limits and objective weights.

pub mod intensity;
pub mod tariff;
pub mod usage;

use serde::Serialize;

pub use self::intensity::{IntensityRow, IntensityTable};
pub use self::tariff::{Tariff, TariffPeriod};
pub use self::usage::{UsageProfile, UsageTotals};

use crate::error::{PlanError, Result};

/// Physical battery constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatterySpec {
    /// Usable capacity (kWh).
    pub capacity_kwh: f64,
    /// Fraction of capacity held back as a floor, in `[0, 1)`.
    pub depth_of_discharge: f64,
    /// Maximum energy moved in or out per hour (kWh).
    pub rate_kwh: f64,
    /// Share of discharged energy that reaches the household, in `(0, 1]`.
    pub efficiency: f64,
}

impl Default for BatterySpec {
    fn default() -> Self {
        Self {
            capacity_kwh: 13.5,
            depth_of_discharge: 0.2,
            rate_kwh: 5.0,
            efficiency: 0.9,
        }
    }
}

impl BatterySpec {
    /// Lowest allowed state of charge, also the start-of-day level (kWh).
    pub fn reserve_kwh(&self) -> f64 {
        self.capacity_kwh * self.depth_of_discharge
    }
}

/// Duty-cycle caps and the optional grid import cap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OperatingLimits {
    pub max_charge_hours: u32,
    pub max_discharge_hours: u32,
    /// Upper bound on grid draw per hour (kWh); `None` is uncapped.
    pub max_grid_draw_kwh: Option<f64>,
}

impl Default for OperatingLimits {
    fn default() -> Self {
        Self {
            max_charge_hours: 3,
            max_discharge_hours: 3,
            max_grid_draw_kwh: None,
        }
    }
}

/// Independent scaling factors for cost and GHG; they need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObjectiveWeights {
    pub cost: f64,
    pub ghg: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self { cost: 0.9, ghg: 0.1 }
    }
}

/// Everything the model builder consumes.
#[derive(Debug, Clone)]
pub struct PlanParameters {
    pub tariff: Tariff,
    pub usage_totals: UsageTotals,
    pub usage: UsageProfile,
    pub intensity: IntensityTable,
    pub battery: BatterySpec,
    pub limits: OperatingLimits,
    pub weights: ObjectiveWeights,
}

impl PlanParameters {
    /// Derives the hourly usage profile and bundles the inputs.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::ModelBuild`] if the usage totals cannot be spread
    /// over the tariff hour sets.
    pub fn new(
        tariff: Tariff,
        usage_totals: UsageTotals,
        intensity: IntensityTable,
        battery: BatterySpec,
        limits: OperatingLimits,
        weights: ObjectiveWeights,
    ) -> Result<Self> {
        let usage = UsageProfile::derive(&usage_totals, &tariff)?;
        Ok(Self {
            tariff,
            usage_totals,
            usage,
            intensity,
            battery,
            limits,
            weights,
        })
    }

    /// Default constants with the given intensity table.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in constants; the signature mirrors [`PlanParameters::new`].
    pub fn with_defaults(intensity: IntensityTable) -> Result<Self> {
        Self::new(
            Tariff::default(),
            UsageTotals::default(),
            intensity,
            BatterySpec::default(),
            OperatingLimits::default(),
            ObjectiveWeights::default(),
        )
    }

    /// Non-optimized cost of one representative day.
    pub fn baseline_cost(&self) -> f64 {
        self.usage_totals.baseline_cost(&self.tariff)
    }

    /// Checks every constant against its physical range.
    ///
    /// # Errors
    ///
    /// Returns the first violation as [`PlanError::ModelBuild`].
    pub fn validate(&self) -> Result<()> {
        let b = &self.battery;
        check(b.capacity_kwh.is_finite() && b.capacity_kwh > 0.0, || {
            format!("battery capacity must be > 0, got {}", b.capacity_kwh)
        })?;
        check((0.0..1.0).contains(&b.depth_of_discharge), || {
            format!(
                "depth of discharge must be in [0, 1), got {}",
                b.depth_of_discharge
            )
        })?;
        check(b.rate_kwh.is_finite() && b.rate_kwh >= 0.0, || {
            format!("charge/discharge rate must be >= 0, got {}", b.rate_kwh)
        })?;
        check(b.efficiency > 0.0 && b.efficiency <= 1.0, || {
            format!("efficiency must be in (0, 1], got {}", b.efficiency)
        })?;

        let t = &self.tariff;
        for period in TariffPeriod::ALL {
            let rate = t.rate(period);
            check(rate.is_finite() && rate >= 0.0, || {
                format!("{} rate must be >= 0, got {rate}", period.label())
            })?;
        }
        if let Some(problem) = t.hour_set_problem() {
            return Err(PlanError::ModelBuild(problem));
        }

        if let Some(cap) = self.limits.max_grid_draw_kwh {
            check(cap.is_finite() && cap >= 0.0, || {
                format!("grid draw cap must be >= 0, got {cap}")
            })?;
        }

        let w = &self.weights;
        check(w.cost.is_finite() && w.ghg.is_finite(), || {
            format!("objective weights must be finite, got {} and {}", w.cost, w.ghg)
        })?;
        Ok(())
    }
}

fn check(ok: bool, message: impl FnOnce() -> String) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(PlanError::ModelBuild(message()))
    }
}
