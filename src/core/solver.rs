use super::engine::generate_projection;
use super::error::SolveError;
use super::types::{
    Assumptions, GoalCrossing, GoalStatus, MAX_YEARS, Projection, ProjectionSummary,
};

/// First year whose nominal ending net worth is at least `goal_net_worth`.
///
/// The scan is linear because the sequence is not monotonic once returns or
/// growth go negative. A non-positive goal is treated as disabled and yields
/// `None`; use [`goal_status`] to tell that apart from "not reached".
pub fn find_goal_crossing(projection: &Projection, goal_net_worth: f64) -> Option<GoalCrossing> {
    if !goal_enabled(goal_net_worth) {
        return None;
    }
    projection
        .iter()
        .find(|snapshot| snapshot.ending_net_worth >= goal_net_worth)
        .map(|snapshot| GoalCrossing {
            year: snapshot.year,
            age: snapshot.age,
        })
}

pub fn goal_status(projection: &Projection, goal_net_worth: f64) -> GoalStatus {
    if !goal_enabled(goal_net_worth) {
        return GoalStatus::Disabled;
    }
    match find_goal_crossing(projection, goal_net_worth) {
        Some(crossing) => GoalStatus::Reached(crossing),
        None => GoalStatus::NotReached,
    }
}

fn goal_enabled(goal_net_worth: f64) -> bool {
    goal_net_worth > 0.0
}

pub fn summarize(projection: &Projection, assumptions: &Assumptions) -> ProjectionSummary {
    let total_savings = projection.iter().map(|s| s.savings).sum::<f64>();
    let (final_age, final_net_worth, final_net_worth_real) = projection
        .last()
        .map(|s| (s.age, s.ending_net_worth, s.ending_net_worth_real))
        .unwrap_or((
            assumptions.current_age,
            assumptions.current_net_worth,
            assumptions.current_net_worth,
        ));
    let (peak_year, peak_net_worth) = projection
        .iter()
        .fold(None, |best: Option<(u32, f64)>, s| match best {
            Some((_, value)) if value >= s.ending_net_worth => best,
            _ => Some((s.year, s.ending_net_worth)),
        })
        .unwrap_or((0, assumptions.current_net_worth));

    ProjectionSummary {
        final_age,
        final_net_worth,
        final_net_worth_real,
        total_savings,
        total_investment_growth: final_net_worth - assumptions.current_net_worth - total_savings,
        peak_net_worth,
        peak_year,
        goal: goal_status(projection, assumptions.goal_net_worth),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SavingsRateSolveConfig {
    /// Latest year offset by which the goal must be crossed.
    pub target_year: u32,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for SavingsRateSolveConfig {
    fn default() -> Self {
        Self {
            target_year: 30,
            search_min: 0.0,
            search_max: 1.0,
            tolerance: 1e-4,
            max_iterations: 40,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavingsRateSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_rate: f64,
    pub crossing_year: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavingsRateSolveResult {
    pub target_year: u32,
    pub goal_net_worth: f64,
    pub solved_rate: Option<f64>,
    pub crossing: Option<GoalCrossing>,
    pub iterations: Vec<SavingsRateSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

/// Lowest savings rate within the search bounds whose projection reaches the
/// goal no later than `config.target_year`.
///
/// Bisection assumes that saving more never delays the crossing, which holds
/// while `1 + annual_return` and salaries stay positive. With a return at or
/// below -100%, or salary growth at or below -100% (the salary changes sign),
/// the crossing is no longer monotonic in the rate and the returned rate is
/// only one rate that satisfies the target, not necessarily the lowest.
pub fn solve_savings_rate(
    assumptions: &Assumptions,
    config: SavingsRateSolveConfig,
) -> Result<SavingsRateSolveResult, SolveError> {
    validate_config(assumptions, config)?;

    let mut iterations = Vec::with_capacity(config.max_iterations as usize);
    let mut solved_rate = None;
    let mut converged = false;
    let feasible;
    let message;

    let low_eval = evaluate_candidate(assumptions, config.search_min);
    let high_eval = evaluate_candidate(assumptions, config.search_max);

    if meets_target(low_eval, config.target_year) {
        solved_rate = Some(config.search_min);
        converged = true;
        feasible = true;
        message = "Already meets goal at lower savings rate bound.".to_string();
    } else if !meets_target(high_eval, config.target_year) {
        feasible = false;
        message = "No feasible savings rate found within the search bounds.".to_string();
    } else {
        let mut lo = config.search_min;
        let mut hi = config.search_max;
        let mut it = 0;
        while it < config.max_iterations {
            it += 1;
            let mid = (lo + hi) * 0.5;
            let eval = evaluate_candidate(assumptions, mid);
            iterations.push(SavingsRateSolveIteration {
                iteration: it,
                lower_bound: lo,
                upper_bound: hi,
                candidate_rate: mid,
                crossing_year: eval.map(|c| c.year),
            });

            if meets_target(eval, config.target_year) {
                hi = mid;
            } else {
                lo = mid;
            }

            if (hi - lo).abs() <= config.tolerance {
                converged = true;
                solved_rate = Some(hi);
                break;
            }
        }
        if solved_rate.is_none() {
            solved_rate = Some(hi);
        }
        feasible = true;
        message = if converged {
            "Solved required savings rate.".to_string()
        } else {
            "Reached max iterations before tolerance was met; returning best estimate.".to_string()
        };
    }

    let crossing = solved_rate.and_then(|rate| evaluate_candidate(assumptions, rate));
    log::debug!(
        "savings rate solve: feasible={feasible} converged={converged} iterations={}",
        iterations.len()
    );

    Ok(SavingsRateSolveResult {
        target_year: config.target_year,
        goal_net_worth: assumptions.goal_net_worth,
        solved_rate,
        crossing,
        iterations,
        converged,
        feasible,
        message,
    })
}

fn evaluate_candidate(base: &Assumptions, savings_rate: f64) -> Option<GoalCrossing> {
    let inputs = Assumptions {
        savings_rate,
        ..*base
    };
    find_goal_crossing(&generate_projection(&inputs), inputs.goal_net_worth)
}

fn meets_target(crossing: Option<GoalCrossing>, target_year: u32) -> bool {
    crossing.is_some_and(|c| c.year <= target_year)
}

fn validate_config(assumptions: &Assumptions, config: SavingsRateSolveConfig) -> Result<(), SolveError> {
    if !goal_enabled(assumptions.goal_net_worth) {
        return Err(SolveError::GoalDisabled);
    }
    if config.target_year > MAX_YEARS {
        return Err(SolveError::TargetYearOutOfRange(config.target_year));
    }
    if !config.search_min.is_finite() || !config.search_max.is_finite() {
        return Err(SolveError::NonFiniteBounds);
    }
    if config.search_max <= config.search_min {
        return Err(SolveError::EmptySearchRange);
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(SolveError::InvalidTolerance);
    }
    if config.max_iterations == 0 {
        return Err(SolveError::NoIterations);
    }
    Ok(())
}
