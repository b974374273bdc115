//! Pure-Rust MILP backend built on `good_lp` with the `microlp` engine.

use std::time::{Duration, Instant};

use good_lp::solvers::microlp::microlp;
use good_lp::{
    Constraint, Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable,
    constraint, variable,
};
use tracing::{debug, warn};

use super::{
    Bounds, LinearExpr, Relation, Sense, SolveStatus, SolverAdapter, SolverBackend, VarDomain,
    VarHandle,
};
use crate::error::Result;

/// Opens [`MicrolpSession`]s. Needs no license or environment setup.
#[derive(Debug, Default, Clone, Copy)]
pub struct MicrolpBackend;

impl SolverBackend for MicrolpBackend {
    type Session = MicrolpSession;

    fn open_session(&self) -> Result<MicrolpSession> {
        debug!("opening microlp solver session");
        Ok(MicrolpSession::new())
    }
}

/// One build–solve cycle against `good_lp`.
///
/// Constraints are buffered until [`SolverAdapter::solve`] because `good_lp`
/// only accepts them once the objective is fixed. The session solves at most
/// once; later calls return the first status.
pub struct MicrolpSession {
    problem: Option<ProblemVariables>,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    constraint_count: usize,
    objective: Option<(Expression, Sense)>,
    /// Set when an expression referenced a handle this session never issued.
    foreign_handles: usize,
    /// Declarations made after solving; their handles never resolve.
    late_declarations: usize,
    status: Option<SolveStatus>,
    values: Option<Vec<f64>>,
}

impl MicrolpSession {
    pub fn new() -> Self {
        Self {
            problem: Some(ProblemVariables::new()),
            variables: Vec::new(),
            constraints: Vec::new(),
            constraint_count: 0,
            objective: None,
            foreign_handles: 0,
            late_declarations: 0,
            status: None,
            values: None,
        }
    }

    fn to_expression(&mut self, expr: &LinearExpr) -> Expression {
        let mut out = Expression::from(expr.constant());
        for &(handle, coefficient) in expr.terms() {
            match self.variables.get(handle.index()) {
                Some(&var) => out += coefficient * var,
                None => self.foreign_handles += 1,
            }
        }
        out
    }
}

impl Default for MicrolpSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverAdapter for MicrolpSession {
    fn declare_variable(&mut self, domain: VarDomain, bounds: Bounds) -> VarHandle {
        let definition = match domain {
            VarDomain::Binary => variable().binary(),
            VarDomain::Continuous => {
                let mut definition = variable();
                if let Some(lower) = bounds.lower {
                    definition = definition.min(lower);
                }
                if let Some(upper) = bounds.upper {
                    definition = definition.max(upper);
                }
                definition
            }
        };
        let handle = VarHandle(self.variables.len() + self.late_declarations);
        match self.problem.as_mut() {
            Some(problem) => self.variables.push(problem.add(definition)),
            None => {
                warn!(handle = handle.index(), "variable declared after solve; ignored");
                self.late_declarations += 1;
            }
        }
        handle
    }

    fn add_constraint(&mut self, expr: LinearExpr, relation: Relation, rhs: f64) {
        let lhs = self.to_expression(&expr);
        let rhs = Expression::from(rhs);
        let built = match relation {
            Relation::LessEq => constraint::leq(lhs, rhs),
            Relation::Equal => constraint::eq(lhs, rhs),
            Relation::GreaterEq => constraint::geq(lhs, rhs),
        };
        self.constraints.push(built);
        self.constraint_count += 1;
    }

    fn set_objective(&mut self, expr: LinearExpr, sense: Sense) {
        let objective = self.to_expression(&expr);
        self.objective = Some((objective, sense));
    }

    fn solve(&mut self, time_limit: Option<Duration>) -> SolveStatus {
        if let Some(status) = self.status {
            warn!(%status, "session already solved; returning previous status");
            return status;
        }
        if self.foreign_handles > 0 {
            warn!(
                count = self.foreign_handles,
                "expressions referenced unknown variables"
            );
            self.status = Some(SolveStatus::Unknown);
            return SolveStatus::Unknown;
        }
        let Some(problem) = self.problem.take() else {
            return SolveStatus::Unknown;
        };
        if let Some(limit) = time_limit {
            warn!(
                limit_secs = limit.as_secs_f64(),
                "microlp has no time limit support; solving to completion"
            );
        }

        let (objective, sense) = self
            .objective
            .take()
            .unwrap_or_else(|| (Expression::from(0.0), Sense::Minimize));
        let unsolved = match sense {
            Sense::Minimize => problem.minimise(objective),
            Sense::Maximize => problem.maximise(objective),
        };
        let mut model = unsolved.using(microlp);
        for built in self.constraints.drain(..) {
            model = model.with(built);
        }

        let started = Instant::now();
        let status = match model.solve() {
            Ok(solution) => {
                self.values = Some(
                    self.variables
                        .iter()
                        .map(|&var| solution.value(var))
                        .collect(),
                );
                SolveStatus::Optimal
            }
            Err(ResolutionError::Infeasible) => SolveStatus::Infeasible,
            Err(ResolutionError::Unbounded) => SolveStatus::Unbounded,
            Err(err) => {
                warn!(error = %err, "microlp reported an error");
                SolveStatus::Unknown
            }
        };
        debug!(
            %status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "microlp solve finished"
        );
        self.status = Some(status);
        status
    }

    fn value(&self, handle: VarHandle) -> Option<f64> {
        self.values.as_ref()?.get(handle.index()).copied()
    }

    fn variable_count(&self) -> usize {
        self.variables.len()
    }

    fn constraint_count(&self) -> usize {
        self.constraint_count
    }
}

impl Drop for MicrolpSession {
    fn drop(&mut self) {
        debug!(
            variables = self.variables.len(),
            constraints = self.constraint_count,
            solved = self.status.is_some(),
            "solver session released"
        );
    }
}
