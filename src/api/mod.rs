use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::core::{
    Assumptions, GoalCrossing, GoalStatus, MAX_YEARS, Projection, ProjectionSummary,
    SavingsRateSolveConfig, SavingsRateSolveIteration, SavingsRateSolveResult, SolveError,
    generate_projection, goal_status, solve_savings_rate, summarize,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{flag} must be {requirement}")]
    Invalid {
        flag: &'static str,
        requirement: &'static str,
    },
    #[error(transparent)]
    Solve(#[from] SolveError),
}

fn invalid(flag: &'static str, requirement: &'static str) -> InputError {
    InputError::Invalid { flag, requirement }
}

#[derive(Parser, Debug)]
#[command(
    name = "networth",
    about = "Deterministic net worth projection with salary growth, inflation and a goal year"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the year-by-year projection table
    Project(ProjectionArgs),
    /// Find the lowest savings rate that reaches the goal by a target year
    Solve {
        #[command(flatten)]
        projection: ProjectionArgs,
        #[command(flatten)]
        solve: SolveArgs,
    },
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

/// Assumptions as entered by a person: rates are percentages.
#[derive(Args, Debug, Clone)]
pub struct ProjectionArgs {
    #[arg(long, default_value_t = 20)]
    pub current_age: u32,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub current_net_worth: f64,
    #[arg(long, default_value_t = 12000.0)]
    pub annual_salary: f64,
    #[arg(
        long,
        default_value_t = 25.0,
        help = "Share of salary saved each year in percent"
    )]
    pub savings_rate: f64,
    #[arg(
        long,
        default_value_t = 8.0,
        allow_negative_numbers = true,
        help = "Expected annual investment return in percent"
    )]
    pub annual_return: f64,
    #[arg(
        long,
        default_value_t = 10.0,
        allow_negative_numbers = true,
        help = "Salary growth in percent during the early career phase"
    )]
    pub salary_growth_fast: f64,
    #[arg(
        long,
        default_value_t = 10,
        help = "Number of years the fast salary growth applies"
    )]
    pub growth_transition_years: u32,
    #[arg(
        long,
        default_value_t = 3.0,
        allow_negative_numbers = true,
        help = "Salary growth in percent after the transition"
    )]
    pub salary_growth_stable: f64,
    #[arg(
        long,
        default_value_t = 3.5,
        allow_negative_numbers = true,
        help = "Expected annual inflation in percent"
    )]
    pub inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 1000000.0,
        allow_negative_numbers = true,
        help = "Target net worth; <= 0 disables the goal"
    )]
    pub goal_net_worth: f64,
}

impl From<&Assumptions> for ProjectionArgs {
    fn from(value: &Assumptions) -> Self {
        Self {
            current_age: value.current_age,
            current_net_worth: value.current_net_worth,
            annual_salary: value.annual_salary,
            savings_rate: value.savings_rate * 100.0,
            annual_return: value.annual_return * 100.0,
            salary_growth_fast: value.salary_growth_fast * 100.0,
            growth_transition_years: value.growth_transition_years,
            salary_growth_stable: value.salary_growth_stable * 100.0,
            inflation_rate: value.inflation_rate * 100.0,
            goal_net_worth: value.goal_net_worth,
        }
    }
}

impl Default for ProjectionArgs {
    fn default() -> Self {
        Self::from(&Assumptions::default())
    }
}

#[derive(Args, Debug, Clone, Copy)]
pub struct SolveArgs {
    #[arg(long, help = "Latest year offset by which the goal must be reached")]
    pub target_year: u32,
    #[arg(long, default_value_t = 0.0, help = "Lowest savings rate to try in percent")]
    pub search_min: f64,
    #[arg(long, default_value_t = 100.0, help = "Highest savings rate to try in percent")]
    pub search_max: f64,
    #[arg(long, default_value_t = 0.01, help = "Solver tolerance in percentage points")]
    pub tolerance: f64,
    #[arg(long, default_value_t = 40)]
    pub max_iterations: u32,
}

impl Default for SolveArgs {
    fn default() -> Self {
        Self {
            target_year: 30,
            search_min: 0.0,
            search_max: 100.0,
            tolerance: 0.01,
            max_iterations: 40,
        }
    }
}

pub fn build_assumptions(args: &ProjectionArgs) -> Result<Assumptions, InputError> {
    for (flag, value) in [
        ("--current-net-worth", args.current_net_worth),
        ("--annual-salary", args.annual_salary),
        ("--savings-rate", args.savings_rate),
        ("--annual-return", args.annual_return),
        ("--salary-growth-fast", args.salary_growth_fast),
        ("--salary-growth-stable", args.salary_growth_stable),
        ("--inflation-rate", args.inflation_rate),
        ("--goal-net-worth", args.goal_net_worth),
    ] {
        if !value.is_finite() {
            return Err(invalid(flag, "a finite number"));
        }
    }

    if args.annual_salary < 0.0 {
        return Err(invalid("--annual-salary", ">= 0"));
    }

    if !(0.0..=100.0).contains(&args.savings_rate) {
        return Err(invalid("--savings-rate", "between 0 and 100"));
    }

    if args.annual_return <= -100.0 {
        return Err(invalid("--annual-return", "> -100"));
    }

    if args.inflation_rate <= -100.0 {
        return Err(invalid("--inflation-rate", "> -100"));
    }

    // Growth at or below -100% flips the salary's sign every year.
    if args.salary_growth_fast <= -100.0 {
        return Err(invalid("--salary-growth-fast", "> -100"));
    }

    if args.salary_growth_stable <= -100.0 {
        return Err(invalid("--salary-growth-stable", "> -100"));
    }

    Ok(Assumptions {
        current_age: args.current_age,
        current_net_worth: args.current_net_worth,
        annual_salary: args.annual_salary,
        savings_rate: args.savings_rate / 100.0,
        annual_return: args.annual_return / 100.0,
        salary_growth_fast: args.salary_growth_fast / 100.0,
        growth_transition_years: args.growth_transition_years,
        salary_growth_stable: args.salary_growth_stable / 100.0,
        inflation_rate: args.inflation_rate / 100.0,
        goal_net_worth: args.goal_net_worth,
    })
}

pub fn build_solve_config(args: SolveArgs) -> Result<SavingsRateSolveConfig, InputError> {
    if args.target_year > MAX_YEARS {
        return Err(invalid("--target-year", "within the projection horizon"));
    }
    if !(0.0..=100.0).contains(&args.search_min) || !(0.0..=100.0).contains(&args.search_max) {
        return Err(invalid("--search-min and --search-max", "between 0 and 100"));
    }
    Ok(SavingsRateSolveConfig {
        target_year: args.target_year,
        search_min: args.search_min / 100.0,
        search_max: args.search_max / 100.0,
        tolerance: args.tolerance / 100.0,
        max_iterations: args.max_iterations,
    })
}

pub fn render_projection_table(projection: &Projection, goal: GoalStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4} {:>4} {:>14} {:>12} {:>16} {:>16} {:>16}",
        "year", "age", "salary", "savings", "start", "end", "end (real)"
    );
    for s in projection {
        let _ = writeln!(
            out,
            "{:>4} {:>4} {:>14.2} {:>12.2} {:>16.2} {:>16.2} {:>16.2}",
            s.year,
            s.age,
            s.salary,
            s.savings,
            s.starting_net_worth,
            s.ending_net_worth,
            s.ending_net_worth_real
        );
    }
    let _ = writeln!(out, "{}", describe_goal(goal));
    out
}

pub fn describe_goal(goal: GoalStatus) -> String {
    match goal {
        GoalStatus::Disabled => "Goal: disabled".to_string(),
        GoalStatus::Reached(GoalCrossing { year, age }) => {
            format!("Goal: reached in year {year} at age {age}")
        }
        GoalStatus::NotReached => format!("Goal: not reached within {MAX_YEARS} years"),
    }
}

pub fn render_solve_result(result: &SavingsRateSolveResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", result.message);
    match result.solved_rate {
        Some(rate) => {
            let _ = write!(out, "Savings rate: {:.2}%", rate * 100.0);
            if let Some(crossing) = result.crossing {
                let _ = write!(out, " (goal in year {} at age {})", crossing.year, crossing.age);
            }
            let _ = writeln!(out);
        }
        None => {
            let _ = writeln!(out, "Savings rate: none within bounds");
        }
    }
    out
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ApiPayload {
    current_age: Option<u32>,
    current_net_worth: Option<f64>,
    annual_salary: Option<f64>,
    savings_rate: Option<f64>,
    annual_return: Option<f64>,
    salary_growth_fast: Option<f64>,
    growth_transition_years: Option<u32>,
    salary_growth_stable: Option<f64>,
    inflation_rate: Option<f64>,
    goal_net_worth: Option<f64>,

    target_year: Option<u32>,
    search_min: Option<f64>,
    search_max: Option<f64>,
    tolerance: Option<f64>,
    max_iterations: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionResponse<'a> {
    assumptions: Assumptions,
    snapshots: &'a Projection,
    goal: GoalStatus,
    summary: ProjectionSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SolveIterationResponse {
    iteration: u32,
    lower_bound: f64,
    upper_bound: f64,
    candidate_rate: f64,
    crossing_year: Option<u32>,
}

impl From<&SavingsRateSolveIteration> for SolveIterationResponse {
    fn from(value: &SavingsRateSolveIteration) -> Self {
        Self {
            iteration: value.iteration,
            lower_bound: value.lower_bound,
            upper_bound: value.upper_bound,
            candidate_rate: value.candidate_rate,
            crossing_year: value.crossing_year,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SolveResponse {
    target_year: u32,
    goal_net_worth: f64,
    solved_rate: Option<f64>,
    crossing: Option<GoalCrossing>,
    converged: bool,
    feasible: bool,
    message: String,
    iterations: Vec<SolveIterationResponse>,
}

impl From<SavingsRateSolveResult> for SolveResponse {
    fn from(value: SavingsRateSolveResult) -> Self {
        Self {
            target_year: value.target_year,
            goal_net_worth: value.goal_net_worth,
            solved_rate: value.solved_rate,
            crossing: value.crossing,
            converged: value.converged,
            feasible: value.feasible,
            message: value.message,
            iterations: value.iterations.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn projection_args_from_payload(payload: &ApiPayload) -> ProjectionArgs {
    let mut args = ProjectionArgs::default();

    if let Some(v) = payload.current_age {
        args.current_age = v;
    }
    if let Some(v) = payload.current_net_worth {
        args.current_net_worth = v;
    }
    if let Some(v) = payload.annual_salary {
        args.annual_salary = v;
    }
    if let Some(v) = payload.savings_rate {
        args.savings_rate = v;
    }
    if let Some(v) = payload.annual_return {
        args.annual_return = v;
    }
    if let Some(v) = payload.salary_growth_fast {
        args.salary_growth_fast = v;
    }
    if let Some(v) = payload.growth_transition_years {
        args.growth_transition_years = v;
    }
    if let Some(v) = payload.salary_growth_stable {
        args.salary_growth_stable = v;
    }
    if let Some(v) = payload.inflation_rate {
        args.inflation_rate = v;
    }
    if let Some(v) = payload.goal_net_worth {
        args.goal_net_worth = v;
    }

    args
}

fn solve_args_from_payload(payload: &ApiPayload) -> SolveArgs {
    let mut args = SolveArgs::default();

    if let Some(v) = payload.target_year {
        args.target_year = v;
    }
    if let Some(v) = payload.search_min {
        args.search_min = v;
    }
    if let Some(v) = payload.search_max {
        args.search_max = v;
    }
    if let Some(v) = payload.tolerance {
        args.tolerance = v;
    }
    if let Some(v) = payload.max_iterations {
        args.max_iterations = v;
    }

    args
}

#[cfg(test)]
fn payload_from_json(json: &str) -> Result<ApiPayload, String> {
    serde_json::from_str::<ApiPayload>(json).map_err(|e| format!("Invalid API JSON payload: {e}"))
}

fn projection_json(assumptions: &Assumptions) -> serde_json::Value {
    let projection = generate_projection(assumptions);
    let response = ProjectionResponse {
        assumptions: *assumptions,
        snapshots: &projection,
        goal: goal_status(&projection, assumptions.goal_net_worth),
        summary: summarize(&projection, assumptions),
    };
    serde_json::to_value(response).unwrap_or_else(|e| {
        log::error!("failed to serialize projection: {e}");
        serde_json::Value::Null
    })
}

fn router() -> Router {
    Router::new()
        .route(
            "/api/projection",
            get(projection_get_handler).post(projection_post_handler),
        )
        .route("/api/solve", get(solve_get_handler).post(solve_post_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router();

    let listener = TcpListener::bind(addr).await?;
    log::info!("net worth projection API listening on http://{addr}");
    log::info!("local access: http://127.0.0.1:{port}/api/projection");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn projection_get_handler(payload: Result<Query<ApiPayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => projection_handler_impl(payload).await,
        Err(rejection) => rejection_response(rejection.body_text()),
    }
}

async fn projection_post_handler(payload: Result<Json<ApiPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => projection_handler_impl(payload).await,
        Err(rejection) => rejection_response(rejection.body_text()),
    }
}

async fn solve_get_handler(payload: Result<Query<ApiPayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => solve_handler_impl(payload).await,
        Err(rejection) => rejection_response(rejection.body_text()),
    }
}

async fn solve_post_handler(payload: Result<Json<ApiPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => solve_handler_impl(payload).await,
        Err(rejection) => rejection_response(rejection.body_text()),
    }
}

fn rejection_response(body_text: String) -> Response {
    log::debug!("rejected request payload: {body_text}");
    error_response(StatusCode::BAD_REQUEST, &body_text)
}

async fn projection_handler_impl(payload: ApiPayload) -> Response {
    log::debug!("projection request: {payload:?}");
    let assumptions = match build_assumptions(&projection_args_from_payload(&payload)) {
        Ok(assumptions) => assumptions,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    json_response(StatusCode::OK, projection_json(&assumptions))
}

async fn solve_handler_impl(payload: ApiPayload) -> Response {
    log::debug!("solve request: {payload:?}");
    match run_solve(&payload) {
        Ok(result) => json_response(StatusCode::OK, SolveResponse::from(result)),
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

fn run_solve(payload: &ApiPayload) -> Result<SavingsRateSolveResult, InputError> {
    let assumptions = build_assumptions(&projection_args_from_payload(payload))?;
    let config = build_solve_config(solve_args_from_payload(payload))?;
    Ok(solve_savings_rate(&assumptions, config)?)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_args() -> ProjectionArgs {
        ProjectionArgs::default()
    }

    #[test]
    fn default_args_build_reference_assumptions() {
        let assumptions = build_assumptions(&sample_args()).expect("valid inputs");
        let reference = Assumptions::default();

        assert_eq!(assumptions.current_age, reference.current_age);
        assert_eq!(
            assumptions.growth_transition_years,
            reference.growth_transition_years
        );
        assert_approx(assumptions.annual_salary, reference.annual_salary);
        assert_approx(assumptions.savings_rate, reference.savings_rate);
        assert_approx(assumptions.annual_return, reference.annual_return);
        assert_approx(assumptions.salary_growth_fast, reference.salary_growth_fast);
        assert_approx(assumptions.salary_growth_stable, reference.salary_growth_stable);
        assert_approx(assumptions.inflation_rate, reference.inflation_rate);
        assert_approx(assumptions.goal_net_worth, reference.goal_net_worth);
    }

    #[test]
    fn build_assumptions_rejects_savings_rate_above_hundred() {
        let mut args = sample_args();
        args.savings_rate = 120.0;

        let err = build_assumptions(&args).expect_err("must reject savings rate");
        assert!(err.to_string().contains("--savings-rate"));
    }

    #[test]
    fn build_assumptions_rejects_total_loss_rates() {
        let mut args = sample_args();
        args.annual_return = -100.0;
        let err = build_assumptions(&args).expect_err("must reject -100% return");
        assert!(err.to_string().contains("--annual-return"));

        let mut args = sample_args();
        args.inflation_rate = -100.0;
        let err = build_assumptions(&args).expect_err("must reject -100% inflation");
        assert!(err.to_string().contains("--inflation-rate"));
    }

    #[test]
    fn build_assumptions_rejects_negative_salary_and_non_finite_values() {
        let mut args = sample_args();
        args.annual_salary = -1.0;
        let err = build_assumptions(&args).expect_err("must reject negative salary");
        assert_eq!(err, invalid("--annual-salary", ">= 0"));

        let mut args = sample_args();
        args.current_net_worth = f64::NAN;
        let err = build_assumptions(&args).expect_err("must reject NaN");
        assert!(err.to_string().contains("--current-net-worth"));
    }

    #[test]
    fn build_assumptions_rejects_salary_growth_that_flips_sign() {
        let mut args = sample_args();
        args.salary_growth_fast = -100.0;
        let err = build_assumptions(&args).expect_err("must reject -100% fast growth");
        assert_eq!(err, invalid("--salary-growth-fast", "> -100"));

        let mut args = sample_args();
        args.salary_growth_stable = -150.0;
        let err = build_assumptions(&args).expect_err("must reject -150% stable growth");
        assert_eq!(err, invalid("--salary-growth-stable", "> -100"));

        let mut args = sample_args();
        args.salary_growth_stable = -99.0;
        assert!(build_assumptions(&args).is_ok());
    }

    #[test]
    fn cli_defaults_match_reference_assumptions() {
        let cli = Cli::try_parse_from(["networth", "project"]).expect("cli should parse");
        let Command::Project(args) = cli.command else {
            panic!("expected project subcommand");
        };
        let from_cli = build_assumptions(&args).expect("valid inputs");
        let from_default = build_assumptions(&ProjectionArgs::default()).expect("valid inputs");
        let reference = Assumptions::default();

        for assumptions in [from_cli, from_default] {
            assert_eq!(assumptions.current_age, reference.current_age);
            assert_eq!(
                assumptions.growth_transition_years,
                reference.growth_transition_years
            );
            assert_approx(assumptions.current_net_worth, reference.current_net_worth);
            assert_approx(assumptions.annual_salary, reference.annual_salary);
            assert_approx(assumptions.savings_rate, reference.savings_rate);
            assert_approx(assumptions.annual_return, reference.annual_return);
            assert_approx(assumptions.salary_growth_fast, reference.salary_growth_fast);
            assert_approx(assumptions.salary_growth_stable, reference.salary_growth_stable);
            assert_approx(assumptions.inflation_rate, reference.inflation_rate);
            assert_approx(assumptions.goal_net_worth, reference.goal_net_worth);
        }
    }

    #[test]
    fn build_assumptions_allows_negative_net_worth_and_goal() {
        let mut args = sample_args();
        args.current_net_worth = -25_000.0;
        args.goal_net_worth = 0.0;

        let assumptions = build_assumptions(&args).expect("valid inputs");
        assert_approx(assumptions.current_net_worth, -25_000.0);
        assert_approx(assumptions.goal_net_worth, 0.0);
    }

    #[test]
    fn payload_parses_camel_case_keys_as_percentages() {
        let json = r#"{
          "currentAge": 35,
          "currentNetWorth": 50000,
          "annualSalary": 60000,
          "savingsRate": 30,
          "annualReturn": 6.5,
          "salaryGrowthFast": 7,
          "growthTransitionYears": 5,
          "salaryGrowthStable": 2,
          "inflationRate": 2.5,
          "goalNetWorth": 2000000,
          "targetYear": 25
        }"#;
        let payload = payload_from_json(json).expect("json should parse");
        let assumptions =
            build_assumptions(&projection_args_from_payload(&payload)).expect("valid inputs");

        assert_eq!(assumptions.current_age, 35);
        assert_eq!(assumptions.growth_transition_years, 5);
        assert_approx(assumptions.current_net_worth, 50_000.0);
        assert_approx(assumptions.annual_salary, 60_000.0);
        assert_approx(assumptions.savings_rate, 0.30);
        assert_approx(assumptions.annual_return, 0.065);
        assert_approx(assumptions.salary_growth_fast, 0.07);
        assert_approx(assumptions.salary_growth_stable, 0.02);
        assert_approx(assumptions.inflation_rate, 0.025);
        assert_approx(assumptions.goal_net_worth, 2_000_000.0);
        assert_eq!(solve_args_from_payload(&payload).target_year, 25);
    }

    #[test]
    fn empty_payload_falls_back_to_defaults() {
        let payload = payload_from_json("{}").expect("json should parse");
        let assumptions =
            build_assumptions(&projection_args_from_payload(&payload)).expect("valid inputs");
        assert_eq!(assumptions, build_assumptions(&sample_args()).expect("valid"));
    }

    #[test]
    fn projection_response_contains_expected_fields() {
        let assumptions = Assumptions::default();
        let json = projection_json(&assumptions);

        let snapshots = json["snapshots"].as_array().expect("snapshots array");
        assert_eq!(snapshots.len(), MAX_YEARS as usize + 1);
        assert_eq!(snapshots[0]["year"], 0);
        assert_approx(
            snapshots[0]["endingNetWorth"].as_f64().expect("number"),
            3_240.0,
        );
        assert!(snapshots[0].get("endingNetWorthReal").is_some());
        assert!(snapshots[0].get("startingNetWorth").is_some());
        assert_eq!(json["goal"]["status"], "reached");
        assert!(json["goal"]["year"].is_u64());
        assert!(json["summary"]["finalNetWorth"].is_f64());
        assert_eq!(json["assumptions"]["currentAge"], 20);
    }

    #[test]
    fn projection_response_marks_disabled_and_unreached_goals() {
        let disabled = Assumptions {
            goal_net_worth: 0.0,
            ..Assumptions::default()
        };
        assert_eq!(projection_json(&disabled)["goal"]["status"], "disabled");

        let unreachable = Assumptions {
            goal_net_worth: 1e30,
            ..Assumptions::default()
        };
        let json = projection_json(&unreachable);
        assert_eq!(json["goal"]["status"], "not-reached");
        assert!(json["goal"].get("year").is_none());
    }

    #[test]
    fn solve_request_converts_percent_bounds() {
        let payload = payload_from_json(r#"{"targetYear": 30, "searchMax": 50}"#)
            .expect("json should parse");
        let config = build_solve_config(solve_args_from_payload(&payload)).expect("valid config");

        assert_eq!(config.target_year, 30);
        assert_approx(config.search_min, 0.0);
        assert_approx(config.search_max, 0.5);
        assert_approx(config.tolerance, 0.0001);
    }

    #[test]
    fn solve_request_rejects_out_of_range_inputs() {
        let payload = payload_from_json(r#"{"targetYear": 500}"#).expect("json should parse");
        let err = run_solve(&payload).expect_err("must reject target year");
        assert!(err.to_string().contains("--target-year"));

        let payload = payload_from_json(r#"{"goalNetWorth": 0}"#).expect("json should parse");
        let err = run_solve(&payload).expect_err("must reject disabled goal");
        assert_eq!(err, InputError::Solve(SolveError::GoalDisabled));
    }

    #[test]
    fn solve_response_serialization_contains_expected_fields() {
        let payload = payload_from_json(r#"{"targetYear": 40}"#).expect("json should parse");
        let result = run_solve(&payload).expect("must solve");
        assert!(result.feasible);

        let json = serde_json::to_string(&SolveResponse::from(result)).expect("serialize");
        assert!(json.contains("\"solvedRate\""));
        assert!(json.contains("\"crossing\""));
        assert!(json.contains("\"iterations\""));
        assert!(json.contains("\"candidateRate\""));
    }

    #[test]
    fn table_lists_every_year_and_goal_line() {
        let assumptions = Assumptions::default();
        let projection = generate_projection(&assumptions);
        let table = render_projection_table(
            &projection,
            goal_status(&projection, assumptions.goal_net_worth),
        );

        assert_eq!(table.lines().count(), MAX_YEARS as usize + 3);
        assert!(table.lines().nth(1).expect("year 0 row").contains("3240.00"));
        assert!(table.trim_end().ends_with(&format!(
            "at age {}",
            20 + goal_status(&projection, assumptions.goal_net_worth)
                .crossing()
                .expect("reached")
                .year
        )));
    }

    #[test]
    fn solve_summary_reports_rate_or_absence() {
        let payload = payload_from_json(r#"{"targetYear": 40}"#).expect("json should parse");
        let result = run_solve(&payload).expect("must solve");
        let text = render_solve_result(&result);
        assert!(text.contains("Savings rate: "));
        assert!(text.contains("% (goal in year "));

        let payload = payload_from_json(r#"{"targetYear": 1, "searchMax": 1}"#)
            .expect("json should parse");
        let result = run_solve(&payload).expect("must return result");
        assert!(!result.feasible);
        assert!(render_solve_result(&result).contains("none within bounds"));
    }

    #[test]
    fn describe_goal_distinguishes_not_reached_from_year_zero() {
        assert_eq!(
            describe_goal(GoalStatus::Reached(GoalCrossing { year: 0, age: 20 })),
            "Goal: reached in year 0 at age 20"
        );
        assert_eq!(
            describe_goal(GoalStatus::NotReached),
            format!("Goal: not reached within {MAX_YEARS} years")
        );
        assert_eq!(describe_goal(GoalStatus::Disabled), "Goal: disabled");
    }

    #[test]
    fn cli_parses_percent_flags_and_subcommands() {
        let cli = Cli::try_parse_from([
            "networth",
            "project",
            "--annual-return",
            "-2.5",
            "--savings-rate",
            "40",
        ])
        .expect("cli should parse");
        let Command::Project(args) = cli.command else {
            panic!("expected project subcommand");
        };
        let assumptions = build_assumptions(&args).expect("valid inputs");
        assert_approx(assumptions.annual_return, -0.025);
        assert_approx(assumptions.savings_rate, 0.40);
        assert_eq!(assumptions.current_age, 20);

        let cli = Cli::try_parse_from(["networth", "solve", "--target-year", "25"])
            .expect("cli should parse");
        let Command::Solve { solve, .. } = cli.command else {
            panic!("expected solve subcommand");
        };
        assert_eq!(solve.target_year, 25);
    }

    async fn send(request: Request<Body>) -> (StatusCode, Option<String>, serde_json::Value) {
        let response = router().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let cache_control = response
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let json = serde_json::from_slice(&bytes).expect("body should be JSON");
        (status, cache_control, json)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request")
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).expect("valid request")
    }

    #[tokio::test]
    async fn router_serves_projection_over_get_and_post() {
        let (status, cache_control, json) =
            send(get_request("/api/projection?savingsRate=30")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache_control.as_deref(), Some("no-store"));
        assert_approx(json["assumptions"]["savingsRate"].as_f64().expect("number"), 0.30);

        let (status, cache_control, json) =
            send(post_json("/api/projection", r#"{"goalNetWorth": 0}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache_control.as_deref(), Some("no-store"));
        assert_eq!(json["goal"]["status"], "disabled");
    }

    #[tokio::test]
    async fn router_answers_unknown_routes_with_json_not_found() {
        let (status, cache_control, json) = send(get_request("/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(cache_control.as_deref(), Some("no-store"));
        assert_eq!(json["error"], "Not found");
    }

    #[tokio::test]
    async fn router_maps_undeserializable_payloads_to_json_bad_request() {
        let requests = [
            post_json("/api/projection", r#"{"currentAge": -1}"#),
            post_json("/api/projection", "{oops"),
            post_json("/api/solve", r#"{"targetYear": "soon"}"#),
            get_request("/api/projection?currentAge=abc"),
            get_request("/api/solve?maxIterations=-3"),
        ];
        for request in requests {
            let (status, cache_control, json) = send(request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(cache_control.as_deref(), Some("no-store"));
            assert!(
                json["error"].as_str().is_some_and(|msg| !msg.is_empty()),
                "expected error message, got {json}"
            );
        }
    }

    #[tokio::test]
    async fn router_reports_validation_errors_as_json_bad_request() {
        let (status, cache_control, json) =
            send(post_json("/api/projection", r#"{"savingsRate": 150}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(cache_control.as_deref(), Some("no-store"));
        assert!(
            json["error"]
                .as_str()
                .is_some_and(|msg| msg.contains("--savings-rate"))
        );

        let (status, _, json) = send(get_request("/api/solve?goalNetWorth=0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], SolveError::GoalDisabled.to_string());
    }
}
