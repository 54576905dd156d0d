mod engine;
mod error;
mod solver;
mod types;

pub use engine::{deflate, generate_projection, inflation_factor, rate_for_year};
pub use error::SolveError;
pub use solver::{
    SavingsRateSolveConfig, SavingsRateSolveIteration, SavingsRateSolveResult, find_goal_crossing,
    goal_status, solve_savings_rate, summarize,
};
pub use types::{
    Assumptions, GoalCrossing, GoalStatus, GrowthRegime, MAX_YEARS, Projection, ProjectionSummary,
    YearSnapshot,
};
