//! Monthly battery charge/discharge planner: a mixed-integer schedule that
//! trades electricity cost against grid GHG emissions.

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod io;
/// Variable arena, constraints and objective.
pub mod model;
pub mod params;
pub mod planner;
pub mod solver;
pub mod telemetry;

/// Months in the planning horizon.
pub const MONTHS: usize = 12;
/// Hourly slots in each month's representative day.
pub const HOURS: usize = 24;
