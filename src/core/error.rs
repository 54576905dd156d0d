use thiserror::Error;

use super::types::MAX_YEARS;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("goal net worth must be > 0 to solve for a savings rate")]
    GoalDisabled,
    #[error("target_year must be <= {MAX_YEARS}, got {0}")]
    TargetYearOutOfRange(u32),
    #[error("search bounds must be finite")]
    NonFiniteBounds,
    #[error("search_max must be greater than search_min")]
    EmptySearchRange,
    #[error("tolerance must be > 0")]
    InvalidTolerance,
    #[error("max_iterations must be > 0")]
    NoIterations,
}
