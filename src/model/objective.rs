//! Monthly cost/GHG aggregates and the weighted scalar objective.

use tracing::debug;

use super::arena::{MonthVars, SlotVars, VariableArena};
use crate::params::{ObjectiveWeights, PlanParameters, TariffPeriod};
use crate::solver::{Bounds, LinearExpr, Relation, Sense, SolverAdapter, VarDomain, VarHandle};

/// Declares one month's aggregate variables and ties them to its slots.
///
/// Each period cost is the period rate times the sum of grid draw plus charge
/// amount over the period's hours; the monthly cost is the sum of the three.
/// The monthly GHG term is
/// `Σ_hour intensity · (usage − discharge amount + charge amount)`.
pub fn link_monthly_aggregates<S: SolverAdapter>(
    solver: &mut S,
    params: &PlanParameters,
    month: usize,
    month_slots: &[SlotVars],
) -> MonthVars {
    let vars = MonthVars {
        cost_on_peak: solver.declare_variable(VarDomain::Continuous, Bounds::non_negative()),
        cost_mid_peak: solver.declare_variable(VarDomain::Continuous, Bounds::non_negative()),
        cost_off_peak: solver.declare_variable(VarDomain::Continuous, Bounds::non_negative()),
        monthly_cost: solver.declare_variable(VarDomain::Continuous, Bounds::non_negative()),
        monthly_ghg: solver.declare_variable(VarDomain::Continuous, Bounds::free()),
    };

    for (period, cost_var) in [
        (TariffPeriod::OnPeak, vars.cost_on_peak),
        (TariffPeriod::MidPeak, vars.cost_mid_peak),
        (TariffPeriod::OffPeak, vars.cost_off_peak),
    ] {
        link_period_cost(solver, params, period, cost_var, month_slots);
    }

    solver.add_constraint(
        LinearExpr::var(vars.monthly_cost)
            .plus(-1.0, vars.cost_on_peak)
            .plus(-1.0, vars.cost_mid_peak)
            .plus(-1.0, vars.cost_off_peak),
        Relation::Equal,
        0.0,
    );

    // Usage is constant, so its share of the GHG sum moves to the right-hand side.
    let mut ghg = LinearExpr::var(vars.monthly_ghg);
    let mut usage_emissions = 0.0;
    for (index, slot) in month_slots.iter().enumerate() {
        let hour = index + 1;
        let intensity = params.intensity.at(month, hour);
        usage_emissions += intensity * params.usage.at(hour);
        ghg.add_term(intensity, slot.discharge_amount);
        ghg.add_term(-intensity, slot.charge_amount);
    }
    solver.add_constraint(ghg, Relation::Equal, usage_emissions);

    vars
}

fn link_period_cost<S: SolverAdapter>(
    solver: &mut S,
    params: &PlanParameters,
    period: TariffPeriod,
    cost_var: VarHandle,
    month_slots: &[SlotVars],
) {
    let rate = params.tariff.rate(period);
    let mut expr = LinearExpr::var(cost_var);
    for hour in params.tariff.slots(period) {
        if let Some(slot) = month_slots.get(hour - 1) {
            expr.add_term(-rate, slot.grid_draw);
            expr.add_term(-rate, slot.charge_amount);
        }
    }
    solver.add_constraint(expr, Relation::Equal, 0.0);
}

/// Registers `minimize Σ_month (w_c · MonthlyCost + w_g · MonthlyGHG)`.
///
/// Builds the expression and hands it to the solver; does not solve.
pub fn compose_objective<S: SolverAdapter>(
    solver: &mut S,
    arena: &VariableArena,
    weights: &ObjectiveWeights,
) {
    let mut objective = LinearExpr::new();
    for month in 1..=arena.month_count() {
        if let Some(vars) = arena.month(month) {
            objective.add_term(weights.cost, vars.monthly_cost);
            objective.add_term(weights.ghg, vars.monthly_ghg);
        }
    }
    debug!(
        cost_weight = weights.cost,
        ghg_weight = weights.ghg,
        terms = objective.terms().len(),
        "objective composed"
    );
    solver.set_objective(objective, Sense::Minimize);
}
