//! Reads solved values back through the variable arena into a typed plan.

use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::error::{PlanError, Result};
use crate::model::{SlotVars, VariableArena};
use crate::params::PlanParameters;
use crate::solver::{SolveStatus, SolverAdapter, VarHandle};
use crate::{HOURS, MONTHS};

/// Distance from 0 or 1 a binary value may drift before it is rejected.
pub const FLAG_TOLERANCE: f64 = 1e-4;

/// Solved decisions for one hour of a month's representative day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyDispatch {
    pub hour: usize,
    pub charge_flag: bool,
    pub discharge_flag: bool,
    pub charge_kwh: f64,
    pub discharge_kwh: f64,
    /// Energy actually moved into the battery, `flag · amount`.
    pub charged_kwh: f64,
    pub discharged_kwh: f64,
    pub grid_kwh: f64,
    pub state_of_charge_kwh: f64,
    pub usage_kwh: f64,
    pub intensity: f64,
}

/// One month: the 24-hour schedule plus its cost and GHG aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySchedule {
    pub month: usize,
    pub hours: Vec<HourlyDispatch>,
    pub cost_on_peak: f64,
    pub cost_mid_peak: f64,
    pub cost_off_peak: f64,
    pub monthly_cost: f64,
    pub monthly_ghg: f64,
    pub baseline_cost: f64,
}

impl MonthlySchedule {
    pub fn savings(&self) -> f64 {
        self.baseline_cost - self.monthly_cost
    }

    pub fn charge_hours(&self) -> usize {
        self.hours.iter().filter(|h| h.charge_flag).count()
    }

    pub fn discharge_hours(&self) -> usize {
        self.hours.iter().filter(|h| h.discharge_flag).count()
    }
}

/// Full extracted result of an optimal solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub months: Vec<MonthlySchedule>,
    pub objective_value: f64,
    /// Cost of one day with no battery, identical for every month.
    pub baseline_cost: f64,
}

impl Plan {
    pub fn month(&self, month: usize) -> Option<&MonthlySchedule> {
        month.checked_sub(1).and_then(|i| self.months.get(i))
    }

    pub fn total_cost(&self) -> f64 {
        self.months.iter().map(|m| m.monthly_cost).sum()
    }

    pub fn total_ghg(&self) -> f64 {
        self.months.iter().map(|m| m.monthly_ghg).sum()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Battery Plan ===")?;
        writeln!(
            f,
            "{:>5}  {:>10}  {:>10}  {:>10}  {:>12}  {:>6}  {:>6}",
            "month", "cost", "baseline", "savings", "ghg", "chg_h", "dis_h"
        )?;
        for m in &self.months {
            writeln!(
                f,
                "{:>5}  {:>10.4}  {:>10.4}  {:>10.4}  {:>12.4}  {:>6}  {:>6}",
                m.month,
                m.monthly_cost,
                m.baseline_cost,
                m.savings(),
                m.monthly_ghg,
                m.charge_hours(),
                m.discharge_hours()
            )?;
        }
        writeln!(f, "Total cost:      {:.4}", self.total_cost())?;
        writeln!(f, "Total GHG:       {:.4}", self.total_ghg())?;
        write!(f, "Objective value: {:.4}", self.objective_value)
    }
}

/// Turns a solve outcome into a [`Plan`].
///
/// Only an optimal status is extracted; anything else is returned as
/// [`PlanError::Solver`] without touching the session.
///
/// # Errors
///
/// Returns [`PlanError::Solver`] for a non-optimal status and
/// [`PlanError::Extraction`] if a value is missing or a flag is not binary.
pub fn extract<S: SolverAdapter>(
    status: SolveStatus,
    solver: &S,
    arena: &VariableArena,
    params: &PlanParameters,
) -> Result<Plan> {
    if !status.is_optimal() {
        return Err(PlanError::Solver(status));
    }

    let baseline_cost = params.baseline_cost();
    let mut months = Vec::with_capacity(MONTHS);
    let mut objective_value = 0.0;
    for month in 1..=MONTHS {
        let schedule = extract_month(solver, arena, params, month, baseline_cost)?;
        objective_value +=
            params.weights.cost * schedule.monthly_cost + params.weights.ghg * schedule.monthly_ghg;
        months.push(schedule);
    }

    info!(objective_value, months = months.len(), "plan extracted");
    Ok(Plan {
        months,
        objective_value,
        baseline_cost,
    })
}

fn extract_month<S: SolverAdapter>(
    solver: &S,
    arena: &VariableArena,
    params: &PlanParameters,
    month: usize,
    baseline_cost: f64,
) -> Result<MonthlySchedule> {
    let slots = arena
        .month_slots(month)
        .ok_or_else(|| PlanError::Extraction(format!("month {month} missing from arena")))?;
    let aggregates = arena
        .month(month)
        .ok_or_else(|| PlanError::Extraction(format!("month {month} has no aggregates")))?;

    let mut hours = Vec::with_capacity(HOURS);
    for (index, slot) in slots.iter().enumerate() {
        let hour = index + 1;
        hours.push(extract_hour(solver, params, slot, month, hour)?);
    }

    let read = |handle, what: &str| value_of(solver, handle, || format!("{what} of month {month}"));
    Ok(MonthlySchedule {
        month,
        hours,
        cost_on_peak: read(aggregates.cost_on_peak, "on-peak cost")?,
        cost_mid_peak: read(aggregates.cost_mid_peak, "mid-peak cost")?,
        cost_off_peak: read(aggregates.cost_off_peak, "off-peak cost")?,
        monthly_cost: read(aggregates.monthly_cost, "monthly cost")?,
        monthly_ghg: read(aggregates.monthly_ghg, "monthly GHG")?,
        baseline_cost,
    })
}

fn extract_hour<S: SolverAdapter>(
    solver: &S,
    params: &PlanParameters,
    slot: &SlotVars,
    month: usize,
    hour: usize,
) -> Result<HourlyDispatch> {
    let read = |handle, what: &str| {
        value_of(solver, handle, || format!("{what} at month {month} hour {hour}"))
    };
    Ok(HourlyDispatch {
        hour,
        charge_flag: flag_of(read(slot.charge_flag, "charge flag")?, month, hour)?,
        discharge_flag: flag_of(read(slot.discharge_flag, "discharge flag")?, month, hour)?,
        charge_kwh: read(slot.charge_amount, "charge amount")?,
        discharge_kwh: read(slot.discharge_amount, "discharge amount")?,
        charged_kwh: read(slot.charged_energy, "charged energy")?,
        discharged_kwh: read(slot.discharged_energy, "discharged energy")?,
        grid_kwh: read(slot.grid_draw, "grid draw")?,
        state_of_charge_kwh: read(slot.state_of_charge, "state of charge")?,
        usage_kwh: params.usage.at(hour),
        intensity: params.intensity.at(month, hour),
    })
}

fn value_of<S: SolverAdapter>(
    solver: &S,
    handle: VarHandle,
    describe: impl FnOnce() -> String,
) -> Result<f64> {
    solver
        .value(handle)
        .ok_or_else(|| PlanError::Extraction(format!("no value for {}", describe())))
}

fn flag_of(value: f64, month: usize, hour: usize) -> Result<bool> {
    if value.abs() <= FLAG_TOLERANCE {
        Ok(false)
    } else if (value - 1.0).abs() <= FLAG_TOLERANCE {
        Ok(true)
    } else {
        Err(PlanError::Extraction(format!(
            "flag at month {month} hour {hour} is {value}, not binary"
        )))
    }
}
