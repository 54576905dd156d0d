use serde::Serialize;

/// Last simulated year offset. A projection holds `MAX_YEARS + 1` snapshots.
pub const MAX_YEARS: u32 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assumptions {
    pub current_age: u32,
    pub current_net_worth: f64,
    pub annual_salary: f64,
    pub savings_rate: f64,
    pub annual_return: f64,
    pub salary_growth_fast: f64,
    pub growth_transition_years: u32,
    pub salary_growth_stable: f64,
    pub inflation_rate: f64,
    pub goal_net_worth: f64,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            current_age: 20,
            current_net_worth: 0.0,
            annual_salary: 12_000.0,
            savings_rate: 0.25,
            annual_return: 0.08,
            salary_growth_fast: 0.10,
            growth_transition_years: 10,
            salary_growth_stable: 0.03,
            inflation_rate: 0.035,
            goal_net_worth: 1_000_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSnapshot {
    pub year: u32,
    pub age: u32,
    /// Salary earned during the year, before that year's growth is applied.
    pub salary: f64,
    pub savings: f64,
    pub starting_net_worth: f64,
    pub ending_net_worth: f64,
    /// `ending_net_worth` in year-0 purchasing power.
    pub ending_net_worth_real: f64,
}

/// Chronological year-by-year trajectory. Each row chains from the previous
/// one, so the order is part of the value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Projection {
    snapshots: Vec<YearSnapshot>,
}

impl Projection {
    pub(crate) fn from_snapshots(snapshots: Vec<YearSnapshot>) -> Self {
        Self { snapshots }
    }

    pub fn snapshots(&self) -> &[YearSnapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn get(&self, year: u32) -> Option<&YearSnapshot> {
        self.snapshots.get(year as usize)
    }

    pub fn last(&self) -> Option<&YearSnapshot> {
        self.snapshots.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, YearSnapshot> {
        self.snapshots.iter()
    }
}

impl<'a> IntoIterator for &'a Projection {
    type Item = &'a YearSnapshot;
    type IntoIter = std::slice::Iter<'a, YearSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthRegime {
    Fast,
    Stable,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalCrossing {
    pub year: u32,
    pub age: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum GoalStatus {
    /// Goal is non-positive; there is nothing to search for.
    Disabled,
    Reached(GoalCrossing),
    NotReached,
}

impl GoalStatus {
    pub fn crossing(self) -> Option<GoalCrossing> {
        match self {
            GoalStatus::Reached(crossing) => Some(crossing),
            GoalStatus::Disabled | GoalStatus::NotReached => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub final_age: u32,
    pub final_net_worth: f64,
    pub final_net_worth_real: f64,
    pub total_savings: f64,
    pub total_investment_growth: f64,
    pub peak_net_worth: f64,
    pub peak_year: u32,
    pub goal: GoalStatus,
}
