//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use bess_plan::error::Result;
use bess_plan::model::VariableArena;
use bess_plan::params::{IntensityRow, IntensityTable, PlanParameters, TariffPeriod};
use bess_plan::solver::{
    Bounds, LinearExpr, Relation, Sense, SolveStatus, SolverAdapter, SolverBackend, VarDomain,
    VarHandle,
};

/// Absolute tolerance used when checking assignments.
pub const TOLERANCE: f64 = 1e-6;

/// Solver stand-in that records the model and replays a scripted outcome.
///
/// `solve` returns the scripted status; values come from the assignment set
/// with [`RecordingSolver::assign`] and are only visible after an optimal solve.
pub struct RecordingSolver {
    pub declarations: Vec<(VarDomain, Bounds)>,
    pub constraints: Vec<(LinearExpr, Relation, f64)>,
    pub objective: Option<(LinearExpr, Sense)>,
    pub solve_calls: usize,
    /// Time limits received by `solve`, in call order.
    pub time_limits: Rc<RefCell<Vec<Option<Duration>>>>,
    scripted: SolveStatus,
    status: Option<SolveStatus>,
    assignment: Vec<f64>,
}

impl RecordingSolver {
    pub fn new(scripted: SolveStatus) -> Self {
        Self {
            declarations: Vec::new(),
            constraints: Vec::new(),
            objective: None,
            solve_calls: 0,
            time_limits: Rc::default(),
            scripted,
            status: None,
            assignment: Vec::new(),
        }
    }

    pub fn assign(&mut self, assignment: Vec<f64>) {
        self.assignment = assignment;
    }

    pub fn binary_count(&self) -> usize {
        self.declarations
            .iter()
            .filter(|(domain, _)| *domain == VarDomain::Binary)
            .count()
    }

    /// Describes every bound, integrality or constraint the assignment breaks.
    pub fn violations(&self, assignment: &[f64]) -> Vec<String> {
        let mut out = Vec::new();
        if assignment.len() != self.declarations.len() {
            out.push(format!(
                "assignment has {} values for {} variables",
                assignment.len(),
                self.declarations.len()
            ));
            return out;
        }
        for (index, ((domain, bounds), &value)) in
            self.declarations.iter().zip(assignment).enumerate()
        {
            match domain {
                VarDomain::Binary => {
                    if value.abs() > TOLERANCE && (value - 1.0).abs() > TOLERANCE {
                        out.push(format!("variable {index} = {value} is not binary"));
                    }
                }
                VarDomain::Continuous => {
                    if !bounds.contains(value, TOLERANCE) {
                        out.push(format!("variable {index} = {value} outside {bounds:?}"));
                    }
                }
            }
        }
        for (index, (expr, relation, rhs)) in self.constraints.iter().enumerate() {
            let Some(lhs) = expr.evaluate(|h| assignment.get(h.index()).copied()) else {
                out.push(format!("constraint {index} references an unknown variable"));
                continue;
            };
            let ok = match relation {
                Relation::LessEq => lhs <= rhs + TOLERANCE,
                Relation::Equal => (lhs - rhs).abs() <= TOLERANCE,
                Relation::GreaterEq => lhs >= rhs - TOLERANCE,
            };
            if !ok {
                out.push(format!("constraint {index}: {lhs} {relation:?} {rhs}"));
            }
        }
        out
    }
}

impl SolverAdapter for RecordingSolver {
    fn declare_variable(&mut self, domain: VarDomain, bounds: Bounds) -> VarHandle {
        self.declarations.push((domain, bounds));
        VarHandle::from_index(self.declarations.len() - 1)
    }

    fn add_constraint(&mut self, expr: LinearExpr, relation: Relation, rhs: f64) {
        self.constraints.push((expr, relation, rhs));
    }

    fn set_objective(&mut self, expr: LinearExpr, sense: Sense) {
        self.objective = Some((expr, sense));
    }

    fn solve(&mut self, time_limit: Option<Duration>) -> SolveStatus {
        self.solve_calls += 1;
        self.time_limits.borrow_mut().push(time_limit);
        self.status = Some(self.scripted);
        self.scripted
    }

    fn value(&self, handle: VarHandle) -> Option<f64> {
        if self.status != Some(SolveStatus::Optimal) {
            return None;
        }
        self.assignment.get(handle.index()).copied()
    }

    fn variable_count(&self) -> usize {
        self.declarations.len()
    }

    fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}

/// Opens [`RecordingSolver`] sessions that share one time-limit log.
pub struct RecordingBackend {
    pub scripted: SolveStatus,
    pub time_limits: Rc<RefCell<Vec<Option<Duration>>>>,
}

impl RecordingBackend {
    pub fn new(scripted: SolveStatus) -> Self {
        Self {
            scripted,
            time_limits: Rc::default(),
        }
    }
}

impl SolverBackend for RecordingBackend {
    type Session = RecordingSolver;

    fn open_session(&self) -> Result<RecordingSolver> {
        let mut session = RecordingSolver::new(self.scripted);
        session.time_limits = Rc::clone(&self.time_limits);
        Ok(session)
    }
}

/// Intensity `50 + month` for every hour of that month.
pub fn flat_intensity() -> IntensityTable {
    let rows = (1..=12).map(|month| IntensityRow {
        month,
        avg_ghg_intensity: 50.0 + month as f64,
    });
    IntensityTable::from_rows(rows).expect("flat table is complete")
}

/// Default constants with [`flat_intensity`].
pub fn default_params() -> PlanParameters {
    PlanParameters::with_defaults(flat_intensity()).expect("defaults build")
}

/// Battery idle all year: every hour is served from the grid and the state of
/// charge stays at the reserve. Aggregates are filled in.
pub fn idle_assignment(
    solver: &RecordingSolver,
    arena: &VariableArena,
    params: &PlanParameters,
) -> Vec<f64> {
    let mut values = vec![0.0; solver.variable_count()];
    for month in 1..=12 {
        for hour in 1..=24 {
            let slot = arena.slot(month, hour).expect("slot exists");
            values[slot.grid_draw.index()] = params.usage.at(hour);
            values[slot.state_of_charge.index()] = params.battery.reserve_kwh();
        }
    }
    fill_aggregates(&mut values, arena, params);
    values
}

/// Recomputes the monthly cost and GHG variables from the slot values.
pub fn fill_aggregates(values: &mut [f64], arena: &VariableArena, params: &PlanParameters) {
    for month in 1..=12 {
        let aggregates = *arena.month(month).expect("month exists");
        let mut period_cost = [0.0; 3];
        let mut ghg = 0.0;
        for hour in 1..=24 {
            let slot = arena.slot(month, hour).expect("slot exists");
            let period = params.tariff.period_of_slot(hour);
            let bought = values[slot.grid_draw.index()] + values[slot.charge_amount.index()];
            let index = TariffPeriod::ALL
                .iter()
                .position(|&p| p == period)
                .expect("known period");
            period_cost[index] += params.tariff.rate(period) * bought;

            let intensity = params.intensity.at(month, hour);
            ghg += intensity
                * (params.usage.at(hour) - values[slot.discharge_amount.index()]
                    + values[slot.charge_amount.index()]);
        }
        values[aggregates.cost_on_peak.index()] = period_cost[0];
        values[aggregates.cost_mid_peak.index()] = period_cost[1];
        values[aggregates.cost_off_peak.index()] = period_cost[2];
        values[aggregates.monthly_cost.index()] = period_cost.iter().sum();
        values[aggregates.monthly_ghg.index()] = ghg;
    }
}
