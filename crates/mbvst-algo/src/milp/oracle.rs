//! MILP oracle: the black-box solver boundary.
//!
//! [`MilpOracle`] is the seam every formulation and the repair loop solve
//! through. [`GoodLpOracle`] implements it on top of `good_lp`, with the
//! back-end chosen at run time from [`MilpBackendKind`].

use super::model::{LinearConstraint, LinearExpr, MilpModel, VarId, VarKind};
use anyhow::anyhow;
use good_lp::solvers::microlp::microlp as microlp_solver;
#[cfg(feature = "solver-coin_cbc")]
use good_lp::solvers::coin_cbc::coin_cbc as coin_cbc_solver;
#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as highs_solver;
use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Solution, SolverModel, Variable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::debug;

/// Tolerance within which a binary column is reported as an exact 0 or 1.
pub const INTEGRALITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleStatus {
    /// Proven optimal.
    Optimal,
    /// Integral and feasible, optimality not proven within the budget.
    Feasible,
    /// Infeasible, unbounded, failed or out of time without an incumbent.
    NoSolution,
}

impl OracleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OracleStatus::Optimal => "optimal",
            OracleStatus::Feasible => "feasible",
            OracleStatus::NoSolution => "no_solution",
        }
    }
}

impl fmt::Display for OracleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variable values (indexed by [`VarId::index`]) and the objective they reach.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    values: Vec<f64>,
    objective: f64,
}

impl Assignment {
    pub fn new(values: Vec<f64>, objective: f64) -> Self {
        Assignment { values, objective }
    }

    /// Builds an assignment and evaluates the model objective for it.
    pub fn for_model(model: &MilpModel, values: Vec<f64>) -> Self {
        let objective = model.objective().evaluate(&values);
        Assignment { values, objective }
    }

    pub fn value(&self, var: VarId) -> f64 {
        self.values.get(var.index()).copied().unwrap_or(0.0)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }
}

/// Result of one oracle call. Values are only reachable through
/// [`OracleOutcome::assignment`], which is `None` unless a solution exists.
#[derive(Debug, Clone)]
pub struct OracleOutcome {
    status: OracleStatus,
    assignment: Option<Assignment>,
    message: Option<String>,
    solve_time: Duration,
}

impl OracleOutcome {
    pub fn optimal(assignment: Assignment, solve_time: Duration) -> Self {
        OracleOutcome {
            status: OracleStatus::Optimal,
            assignment: Some(assignment),
            message: None,
            solve_time,
        }
    }

    pub fn feasible(assignment: Assignment, solve_time: Duration) -> Self {
        OracleOutcome {
            status: OracleStatus::Feasible,
            assignment: Some(assignment),
            message: None,
            solve_time,
        }
    }

    pub fn no_solution(message: impl Into<String>, solve_time: Duration) -> Self {
        OracleOutcome {
            status: OracleStatus::NoSolution,
            assignment: None,
            message: Some(message.into()),
            solve_time,
        }
    }

    pub fn status(&self) -> OracleStatus {
        self.status
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        match self.status {
            OracleStatus::NoSolution => None,
            _ => self.assignment.as_ref(),
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn solve_time(&self) -> Duration {
        self.solve_time
    }
}

/// A MILP solver that accepts a model and a time budget.
///
/// Implementations must not panic on infeasible or failing models; those map
/// to [`OracleStatus::NoSolution`].
pub trait MilpOracle: Send + Sync {
    /// Unique identifier (e.g., "microlp", "highs")
    fn id(&self) -> &str;

    fn solve(&self, model: &MilpModel, time_budget: Duration) -> OracleOutcome;
}

/// Available `good_lp` back-ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MilpBackendKind {
    #[default]
    MicroLp,
    #[cfg(feature = "solver-highs")]
    Highs,
    #[cfg(feature = "solver-coin_cbc")]
    CoinCbc,
}

impl MilpBackendKind {
    pub fn available() -> &'static [&'static str] {
        AVAILABLE_BACKENDS
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MilpBackendKind::MicroLp => "microlp",
            #[cfg(feature = "solver-highs")]
            MilpBackendKind::Highs => "highs",
            #[cfg(feature = "solver-coin_cbc")]
            MilpBackendKind::CoinCbc => "coin_cbc",
        }
    }

    /// Whether the back-end receives and honours the time budget.
    pub fn enforces_time_limit(&self) -> bool {
        !matches!(self, MilpBackendKind::MicroLp)
    }
}

impl fmt::Display for MilpBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const AVAILABLE_BACKENDS: &[&str] = &[
    "microlp",
    #[cfg(feature = "solver-highs")]
    "highs",
    #[cfg(feature = "solver-coin_cbc")]
    "coin_cbc",
];

fn unknown_backend_error(label: &str) -> anyhow::Error {
    anyhow!(
        "unknown milp backend '{}'; supported values: {}",
        label,
        MilpBackendKind::available().join(", ")
    )
}

impl FromStr for MilpBackendKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.to_ascii_lowercase();
        match normalized.as_str() {
            "microlp" => Ok(MilpBackendKind::MicroLp),
            "coin_cbc" | "cbc" => {
                #[cfg(feature = "solver-coin_cbc")]
                {
                    Ok(MilpBackendKind::CoinCbc)
                }
                #[cfg(not(feature = "solver-coin_cbc"))]
                {
                    Err(unknown_backend_error(&normalized))
                }
            }
            "highs" => {
                #[cfg(feature = "solver-highs")]
                {
                    Ok(MilpBackendKind::Highs)
                }
                #[cfg(not(feature = "solver-highs"))]
                {
                    Err(unknown_backend_error(&normalized))
                }
            }
            other => Err(unknown_backend_error(other)),
        }
    }
}

/// [`MilpOracle`] backed by `good_lp`.
#[derive(Debug, Clone, Default)]
pub struct GoodLpOracle {
    backend: MilpBackendKind,
}

impl GoodLpOracle {
    pub fn new(backend: MilpBackendKind) -> Self {
        GoodLpOracle { backend }
    }

    pub fn backend(&self) -> MilpBackendKind {
        self.backend
    }
}

impl MilpOracle for GoodLpOracle {
    fn id(&self) -> &str {
        self.backend.as_str()
    }

    fn solve(&self, model: &MilpModel, time_budget: Duration) -> OracleOutcome {
        let start = Instant::now();
        debug!(
            backend = self.backend.as_str(),
            model = model.name(),
            variables = model.variable_count(),
            constraints = model.constraint_count(),
            budget_secs = time_budget.as_secs_f64(),
            "solving MILP"
        );

        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = model
            .variables()
            .iter()
            .map(|def| {
                let definition = variable().name(def.name.clone());
                let definition = match def.kind {
                    VarKind::Binary => definition.binary(),
                    VarKind::Continuous { lower, upper } => match upper {
                        Some(ub) => definition.min(lower).max(ub),
                        None => definition.min(lower),
                    },
                };
                vars.add(definition)
            })
            .collect();
        let objective = to_expression(model.objective(), &handles);
        let constraints: Vec<Constraint> = model
            .constraints()
            .iter()
            .map(|c| to_constraint(c, &handles))
            .collect();
        let unsolved = vars.minimise(objective);

        let result = match self.backend {
            MilpBackendKind::MicroLp => run(unsolved.using(microlp_solver), constraints, &handles),
            #[cfg(feature = "solver-highs")]
            MilpBackendKind::Highs => {
                let problem = unsolved
                    .using(highs_solver)
                    .set_time_limit(time_budget.as_secs_f64().max(1e-3));
                run(problem, constraints, &handles)
            }
            #[cfg(feature = "solver-coin_cbc")]
            MilpBackendKind::CoinCbc => {
                let mut problem = unsolved.using(coin_cbc_solver);
                problem.set_parameter("log", "0");
                problem.set_parameter("seconds", &time_budget.as_secs_f64().max(1e-3).to_string());
                run(problem, constraints, &handles)
            }
        };
        let solve_time = start.elapsed();

        match result {
            Ok(mut values) => {
                for (def, value) in model.variables().iter().zip(values.iter_mut()) {
                    if def.kind == VarKind::Binary
                        && (*value - value.round()).abs() <= INTEGRALITY_TOLERANCE
                    {
                        *value = value.round();
                    }
                }
                let assignment = Assignment::for_model(model, values);
                if self.backend.enforces_time_limit() && solve_time >= time_budget {
                    OracleOutcome::feasible(assignment, solve_time)
                } else {
                    OracleOutcome::optimal(assignment, solve_time)
                }
            }
            Err(message) => {
                debug!(backend = self.backend.as_str(), %message, "no solution");
                OracleOutcome::no_solution(message, solve_time)
            }
        }
    }
}

fn to_expression(expr: &LinearExpr, handles: &[Variable]) -> Expression {
    let mut out = Expression::from(expr.constant_term());
    for (var, coef) in expr.terms() {
        out.add_mul(*coef, handles[var.index()]);
    }
    out
}

fn to_constraint(constraint: &LinearConstraint, handles: &[Variable]) -> Constraint {
    use super::model::ConstraintSense;

    let lhs = to_expression(&constraint.expr, handles);
    let rhs = constraint.rhs;
    match constraint.sense {
        ConstraintSense::LessEq => constraint!(lhs <= rhs),
        ConstraintSense::Eq => constraint!(lhs == rhs),
        ConstraintSense::GreaterEq => constraint!(lhs >= rhs),
    }
}

fn run<M>(mut problem: M, constraints: Vec<Constraint>, handles: &[Variable]) -> Result<Vec<f64>, String>
where
    M: SolverModel,
    M::Error: fmt::Display,
{
    for constraint in constraints {
        problem = problem.with(constraint);
    }
    let solution = problem.solve().map_err(|err| err.to_string())?;
    Ok(handles.iter().map(|var| solution.value(*var)).collect())
}
