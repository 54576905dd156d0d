use super::types::{Assumptions, GrowthRegime, MAX_YEARS, Projection, YearSnapshot};

impl GrowthRegime {
    /// Regime in force for growth applied going into `year`. Years up to and
    /// including `transition_years` grow fast; every later year is stable.
    pub fn for_year(year: u32, transition_years: u32) -> Self {
        if year <= transition_years {
            GrowthRegime::Fast
        } else {
            GrowthRegime::Stable
        }
    }

    pub fn rate(self, fast_rate: f64, stable_rate: f64) -> f64 {
        match self {
            GrowthRegime::Fast => fast_rate,
            GrowthRegime::Stable => stable_rate,
        }
    }
}

pub fn rate_for_year(year: u32, transition_years: u32, fast_rate: f64, stable_rate: f64) -> f64 {
    GrowthRegime::for_year(year, transition_years).rate(fast_rate, stable_rate)
}

/// Cumulative price level after `year` years, relative to year 0.
pub fn inflation_factor(inflation_rate: f64, year: u32) -> f64 {
    (1.0 + inflation_rate).powi(year as i32)
}

/// Divides by the price level. A zero factor (inflation of exactly -100%)
/// saturates to a signed infinity instead of producing NaN for a zero
/// numerator.
pub fn deflate(nominal: f64, factor: f64) -> f64 {
    if factor == 0.0 {
        if nominal == 0.0 {
            0.0
        } else {
            f64::INFINITY.copysign(nominal)
        }
    } else {
        nominal / factor
    }
}

pub fn generate_projection(assumptions: &Assumptions) -> Projection {
    let mut snapshots = Vec::with_capacity(MAX_YEARS as usize + 1);
    let mut salary = assumptions.annual_salary;
    let mut starting_net_worth = assumptions.current_net_worth;

    for year in 0..=MAX_YEARS {
        let savings = salary * assumptions.savings_rate;
        let ending_net_worth = (starting_net_worth + savings) * (1.0 + assumptions.annual_return);
        let factor = inflation_factor(assumptions.inflation_rate, year);

        snapshots.push(YearSnapshot {
            year,
            age: assumptions.current_age.saturating_add(year),
            salary,
            savings,
            starting_net_worth,
            ending_net_worth,
            ending_net_worth_real: deflate(ending_net_worth, factor),
        });

        starting_net_worth = ending_net_worth;
        let growth = rate_for_year(
            year + 1,
            assumptions.growth_transition_years,
            assumptions.salary_growth_fast,
            assumptions.salary_growth_stable,
        );
        salary *= 1.0 + growth;
    }

    log::trace!(
        "projected {} years from age {}: final net worth {:.2}",
        MAX_YEARS,
        assumptions.current_age,
        starting_net_worth
    );

    Projection::from_snapshots(snapshots)
}
