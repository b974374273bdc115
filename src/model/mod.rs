//! Mixed-integer formulation of the monthly battery schedule.
//!
//! Per (month, hour) slot the builder declares charge/discharge flags and
//! amounts, grid draw and state of charge, plus two auxiliary variables that
//! carry the products `flag · amount`. The products are pinned with the exact
//! envelope for a binary times a variable bounded by `[0, rate]`:
//!
//! ```text
//! z <= rate · flag
//! z <= amount
//! z >= amount - rate · (1 - flag)
//! ```
//!
//! so every constraint handed to the solver stays linear.

pub mod arena;
pub mod objective;

use tracing::{debug, info};

pub use self::arena::{MonthVars, SlotVariable, SlotVars, VariableArena};
pub use self::objective::{compose_objective, link_monthly_aggregates};

use crate::error::{PlanError, Result};
use crate::params::PlanParameters;
use crate::solver::{Bounds, LinearExpr, Relation, SolverAdapter, VarDomain, VarHandle};
use crate::{HOURS, MONTHS};

/// Declares all variables and registers every constraint of the model,
/// including the monthly cost and GHG aggregates.
///
/// Constants are validated first; on error nothing has been declared.
///
/// # Errors
///
/// Returns [`PlanError::ModelBuild`] for out-of-range constants and
/// [`PlanError::Extraction`] if the declared handles do not form a full
/// 12×24 arena.
pub fn build_model<S: SolverAdapter>(
    solver: &mut S,
    params: &PlanParameters,
) -> Result<VariableArena> {
    params.validate()?;

    let mut slots = Vec::with_capacity(MONTHS * HOURS);
    let mut months = Vec::with_capacity(MONTHS);
    for month in 1..=MONTHS {
        let mut month_slots = Vec::with_capacity(HOURS);
        for _ in 0..HOURS {
            month_slots.push(declare_slot(solver, params));
        }
        add_slot_constraints(solver, params, &month_slots);
        add_day_constraints(solver, params, &month_slots);
        months.push(link_monthly_aggregates(solver, params, month, &month_slots));
        debug!(month, "month constrained");
        slots.extend(month_slots);
    }

    info!(
        variables = solver.variable_count(),
        constraints = solver.constraint_count(),
        "model built"
    );
    VariableArena::new(slots, months).ok_or_else(|| {
        PlanError::Extraction("declared variables do not form a 12x24 arena".into())
    })
}

fn declare_slot<S: SolverAdapter>(solver: &mut S, params: &PlanParameters) -> SlotVars {
    let battery = &params.battery;
    let amount = Bounds::between(0.0, battery.rate_kwh);
    let grid = match params.limits.max_grid_draw_kwh {
        Some(cap) => Bounds::between(0.0, cap),
        None => Bounds::non_negative(),
    };
    let soc = Bounds::between(battery.reserve_kwh(), battery.capacity_kwh);

    SlotVars {
        charge_flag: solver.declare_variable(VarDomain::Binary, Bounds::free()),
        discharge_flag: solver.declare_variable(VarDomain::Binary, Bounds::free()),
        charge_amount: solver.declare_variable(VarDomain::Continuous, amount),
        discharge_amount: solver.declare_variable(VarDomain::Continuous, amount),
        grid_draw: solver.declare_variable(VarDomain::Continuous, grid),
        state_of_charge: solver.declare_variable(VarDomain::Continuous, soc),
        charged_energy: solver.declare_variable(VarDomain::Continuous, amount),
        discharged_energy: solver.declare_variable(VarDomain::Continuous, amount),
    }
}

/// Exclusivity, product envelopes, supply/demand balance and the state of
/// charge recurrence.
fn add_slot_constraints<S: SolverAdapter>(
    solver: &mut S,
    params: &PlanParameters,
    month_slots: &[SlotVars],
) {
    let rate = params.battery.rate_kwh;
    for (index, slot) in month_slots.iter().enumerate() {
        let hour = index + 1;

        solver.add_constraint(
            LinearExpr::var(slot.charge_flag).plus(1.0, slot.discharge_flag),
            Relation::LessEq,
            1.0,
        );

        add_product_envelope(
            solver,
            rate,
            slot.charged_energy,
            slot.charge_flag,
            slot.charge_amount,
        );
        add_product_envelope(
            solver,
            rate,
            slot.discharged_energy,
            slot.discharge_flag,
            slot.discharge_amount,
        );

        // efficiency * discharged + grid = usage + charged
        solver.add_constraint(
            LinearExpr::new()
                .plus(params.battery.efficiency, slot.discharged_energy)
                .plus(1.0, slot.grid_draw)
                .plus(-1.0, slot.charged_energy),
            Relation::Equal,
            params.usage.at(hour),
        );

        if let Some(previous) = index.checked_sub(1).map(|i| &month_slots[i]) {
            solver.add_constraint(
                LinearExpr::var(slot.state_of_charge)
                    .plus(-1.0, previous.state_of_charge)
                    .plus(-1.0, slot.charged_energy)
                    .plus(1.0, slot.discharged_energy),
                Relation::Equal,
                0.0,
            );
        }
    }
}

fn add_product_envelope<S: SolverAdapter>(
    solver: &mut S,
    rate: f64,
    product: VarHandle,
    flag: VarHandle,
    amount: VarHandle,
) {
    solver.add_constraint(
        LinearExpr::var(product).plus(-rate, flag),
        Relation::LessEq,
        0.0,
    );
    solver.add_constraint(
        LinearExpr::var(product).plus(-1.0, amount),
        Relation::LessEq,
        0.0,
    );
    solver.add_constraint(
        LinearExpr::var(product).plus(-1.0, amount).plus(-rate, flag),
        Relation::GreaterEq,
        -rate,
    );
}

/// Start-of-day reserve and the daily duty-cycle caps.
fn add_day_constraints<S: SolverAdapter>(
    solver: &mut S,
    params: &PlanParameters,
    month_slots: &[SlotVars],
) {
    if let Some(first) = month_slots.first() {
        solver.add_constraint(
            LinearExpr::var(first.state_of_charge),
            Relation::Equal,
            params.battery.reserve_kwh(),
        );
    }

    let mut charge_hours = LinearExpr::new();
    let mut discharge_hours = LinearExpr::new();
    for slot in month_slots {
        charge_hours.add_term(1.0, slot.charge_flag);
        discharge_hours.add_term(1.0, slot.discharge_flag);
    }
    solver.add_constraint(
        charge_hours,
        Relation::LessEq,
        f64::from(params.limits.max_charge_hours),
    );
    solver.add_constraint(
        discharge_hours,
        Relation::LessEq,
        f64::from(params.limits.max_discharge_hours),
    );
}
