//! Solver-facing contract: variables, linear constraints, objective, status.
//!
//! The model builder only talks to [`SolverAdapter`]; the concrete MILP engine
//! lives behind it (see [`microlp`]).

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::error::Result;

pub mod microlp;

pub use self::microlp::{MicrolpBackend, MicrolpSession};

/// Opaque reference to a declared variable.
///
/// Handles are only meaningful for the session that returned them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarHandle(pub(crate) usize);

impl VarHandle {
    /// Handle for the variable declared at `index`; for adapter implementations.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Position of the variable in declaration order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Integrality of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarDomain {
    Continuous,
    /// Integer in `{0, 1}`; any bounds passed alongside are ignored.
    Binary,
}

/// Closed interval for a continuous variable. `None` means unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl Bounds {
    pub fn free() -> Self {
        Self {
            lower: None,
            upper: None,
        }
    }

    pub fn non_negative() -> Self {
        Self::at_least(0.0)
    }

    pub fn at_least(lower: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
        }
    }

    pub fn between(lower: f64, upper: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Whether `value` lies inside the interval, with an absolute tolerance.
    pub fn contains(&self, value: f64, tolerance: f64) -> bool {
        self.lower.is_none_or(|lo| value >= lo - tolerance)
            && self.upper.is_none_or(|hi| value <= hi + tolerance)
    }
}

/// Comparison between a linear expression and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    LessEq,
    Equal,
    GreaterEq,
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// Outcome of a single `solve()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    TimeLimit,
    Unknown,
}

impl SolveStatus {
    pub fn is_optimal(self) -> bool {
        self == Self::Optimal
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Optimal => "optimal",
            Self::Infeasible => "infeasible",
            Self::Unbounded => "unbounded",
            Self::TimeLimit => "time limit reached",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Affine expression `Σ coefficient·variable + constant`.
///
/// Terms are kept in insertion order; repeated handles are allowed and simply
/// add up when evaluated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarHandle, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expression consisting of a single variable with coefficient 1.
    pub fn var(handle: VarHandle) -> Self {
        Self::new().plus(1.0, handle)
    }

    /// Adds `coefficient · handle`, builder style.
    #[must_use]
    pub fn plus(mut self, coefficient: f64, handle: VarHandle) -> Self {
        self.add_term(coefficient, handle);
        self
    }

    /// Adds a constant offset, builder style.
    #[must_use]
    pub fn plus_constant(mut self, constant: f64) -> Self {
        self.constant += constant;
        self
    }

    pub fn add_term(&mut self, coefficient: f64, handle: VarHandle) {
        self.terms.push((handle, coefficient));
    }

    pub fn terms(&self) -> &[(VarHandle, f64)] {
        &self.terms
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Evaluates the expression for an assignment looked up by handle.
    ///
    /// Returns `None` as soon as a referenced variable has no value.
    pub fn evaluate(&self, value_of: impl Fn(VarHandle) -> Option<f64>) -> Option<f64> {
        self.terms
            .iter()
            .try_fold(self.constant, |acc, &(handle, coefficient)| {
                value_of(handle).map(|v| acc + coefficient * v)
            })
    }
}

/// Generic optimization-solver capability used by the model builder.
///
/// Implementations own every declared variable; callers keep only handles.
pub trait SolverAdapter {
    /// Declares a variable and returns its handle.
    fn declare_variable(&mut self, domain: VarDomain, bounds: Bounds) -> VarHandle;

    /// Registers `expr <relation> rhs`.
    fn add_constraint(&mut self, expr: LinearExpr, relation: Relation, rhs: f64);

    /// Registers the objective, replacing any previous one.
    fn set_objective(&mut self, expr: LinearExpr, sense: Sense);

    /// Runs the solver once. `time_limit` is honored by backends that support it.
    fn solve(&mut self, time_limit: Option<Duration>) -> SolveStatus;

    /// Value of a variable; `None` unless the last solve was optimal.
    fn value(&self, handle: VarHandle) -> Option<f64>;

    /// Number of declared variables.
    fn variable_count(&self) -> usize;

    /// Number of registered constraints.
    fn constraint_count(&self) -> usize;
}

/// Factory for solver sessions.
///
/// A session is scoped to one build–solve–extract cycle and released when it
/// is dropped, whichever way the cycle ends.
pub trait SolverBackend {
    type Session: SolverAdapter;

    fn open_session(&self) -> Result<Self::Session>;
}
