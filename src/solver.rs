use std::num::NonZero;

use itertools::Itertools;
use thiserror::Error;
use tracing::debug;
use varisat::{ExtendFormula, Lit, Solver as SatEngine};

use crate::logic::{at_most_weighted, ordered, totalizer};
use crate::model::{Comparison, Constraint, LinExpr, Model, Sense, VarId};

/// Outcome class reported by a [`Solver`].
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Status {
    /// The assignment is proven optimal.
    Optimal,
    /// The assignment satisfies every constraint but was not proven optimal.
    Feasible,
    /// No assignment satisfying every constraint was found.
    NoSolutionFound,
}

/// What a [`Solver`] returns for a [`Model`].
#[derive(Clone, Debug)]
pub struct Solution {
    /// See [`Status`].
    pub status: Status,
    /// Objective value of `values`, present unless the status is [`Status::NoSolutionFound`].
    pub objective_value: Option<i64>,
    /// The best objective value any assignment could reach, as far as the solver knows.
    pub objective_bound: i64,
    /// One value per model variable, indexed by [`VarId::index`]; empty when there is no solution.
    pub values: Vec<i64>,
}

impl Solution {
    /// A [`Status::NoSolutionFound`] solution reporting `objective_bound`.
    pub fn infeasible(objective_bound: i64) -> Self {
        Self {
            status: Status::NoSolutionFound,
            objective_value: None,
            objective_bound,
            values: Vec::new(),
        }
    }

    /// Whether an assignment is available, i.e. the status is optimal or feasible.
    pub fn has_assignment(&self) -> bool {
        matches!(self.status, Status::Optimal | Status::Feasible)
    }

    /// Value of `var` in the assignment, if there is one.
    pub fn value(&self, var: VarId) -> Option<i64> {
        self.values.get(var.index()).copied()
    }
}

/// Reasons a [`Solver`] may fail. Infeasibility is not a failure; it is reported through [`Status::NoSolutionFound`].
#[derive(Debug, Error)]
pub enum SolverFailure {
    /// The underlying engine raised an error of its own.
    #[error("solver backend failed: {0}")]
    Backend(String),
    /// The engine reported a model that does not satisfy the constraints it was given.
    #[error("solver returned an assignment violating the model")]
    InvalidAssignment,
}

/// An integer-program engine: accepts a [`Model`], returns a [`Solution`].
///
/// Implementations may search however they like; callers only branch on [`Solution::status`].
pub trait Solver {
    /// Optimize `model` according to its [`Sense`].
    fn solve(&self, model: &Model) -> Result<Solution, SolverFailure>;
}

/// A [`Solver`] for models whose variables all have small bounded domains, reducing them to Boolean satisfiability.
///
/// # Encoding
/// A variable with domain `lower..=upper` becomes `upper - lower` Boolean "rungs", rung `k` meaning the value exceeds `lower + k`.
/// Rungs are ordered so that each implies the one below, and the value is `lower` plus the number of true rungs; a binary variable is the one-rung case.
///
/// Substituting rungs turns every linear constraint into a pseudo-Boolean one, `Σ weight · literal <= bound` with positive weights after flipping negatively weighted literals.
/// Those are handed to a sequential weight counter (see [`at_most_weighted`]); `>=` is the negation of `<=` and `==` is both.
///
/// # Optimization
/// The objective is turned into a cost to minimize, `Σ weight · literal` over positive weights.
/// After the first satisfying assignment, a [totalizer](crate::logic::totalizer) capped at that cost is added once.
/// Each later step forbids the current cost with a single unit clause on one of its registers and solves again.
/// Once the formula becomes unsatisfiable the last assignment is optimal.
/// With an [`improvement limit`](Self::with_improvement_limit), the search may instead stop early and report [`Status::Feasible`].
#[derive(Clone, Debug, Default)]
pub struct SatSolver {
    improvement_limit: Option<NonZero<usize>>,
}

impl SatSolver {
    /// A solver that searches until optimality is proven.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop after finding `limit` successively improving assignments, reporting the last as [`Status::Feasible`] unless it was already proven optimal.
    pub fn with_improvement_limit(mut self, limit: NonZero<usize>) -> Self {
        self.improvement_limit = Some(limit);
        self
    }
}

impl Solver for SatSolver {
    fn solve(&self, model: &Model) -> Result<Solution, SolverFailure> {
        let bound = model.objective_bound();
        let mut encoding = Encoding::new(model);
        model.constraints().iter().for_each(|constraint| encoding.require(constraint));
        debug!(
            variables = model.variables().len(),
            constraints = model.constraints().len(),
            "encoded model as CNF"
        );

        let (cost_terms, cost_constant) = encoding.pseudo_boolean(&match model.sense() {
            Sense::Minimize => model.objective().clone(),
            Sense::Maximize => -model.objective().clone(),
        });
        let mut counter: Option<Vec<Lit>> = None;

        let mut best: Option<(i64, Vec<i64>)> = None;
        let mut improvements = 0;
        let proven = loop {
            if encoding.contradicted || !encoding.engine.solve().map_err(|err| SolverFailure::Backend(err.to_string()))? {
                break true;
            }

            let values = encoding.values()?;
            if !model.is_feasible(&values) {
                return Err(SolverFailure::InvalidAssignment);
            }
            let value = model.objective().evaluate(&values);
            debug!(objective = value, "found improving assignment");
            best = Some((value, values));
            improvements += 1;

            if self.improvement_limit.is_some_and(|limit| improvements >= limit.get()) {
                break false;
            }

            // cost is what is left of the sense-adjusted objective after its constant
            let cost = match model.sense() {
                Sense::Minimize => value,
                Sense::Maximize => -value,
            } - cost_constant;
            let Some(cost) = usize::try_from(cost).ok().filter(|cost| *cost > 0) else {
                break true;
            };
            let registers = counter.get_or_insert_with(|| totalizer(&mut encoding.engine, &cost_terms, cost));
            let cheaper = *registers.get(cost - 1)
                .ok_or_else(|| SolverFailure::Backend("objective counter shorter than the cost it bounds".to_string()))?;
            encoding.engine.add_clause(&[!cheaper]);
        };

        Ok(match best {
            None => Solution::infeasible(bound),
            Some((value, values)) => Solution {
                status: if proven { Status::Optimal } else { Status::Feasible },
                objective_value: Some(value),
                objective_bound: if proven { value } else { bound },
                values,
            },
        })
    }
}

struct Rungs {
    lower: i64,
    lits: Vec<Lit>,
}

struct Encoding<'a> {
    engine: SatEngine<'a>,
    rungs: Vec<Rungs>,
    // set once a constraint is found unsatisfiable outright
    contradicted: bool,
}

impl Encoding<'_> {
    fn new(model: &Model) -> Self {
        let mut engine = SatEngine::new();
        let mut contradicted = false;

        let rungs = model.variables().iter()
            .map(|kind| {
                let (lower, upper) = kind.bounds();
                if upper < lower {
                    contradicted = true;
                }
                let lits = (lower..upper).map(|_| engine.new_lit()).collect_vec();
                ordered(&lits).iter().for_each(|clause| engine.add_clause(clause));
                Rungs { lower, lits }
            })
            .collect_vec();

        Self { engine, rungs, contradicted }
    }

    /// `expr` as `Σ weight · literal + constant` with every weight positive.
    fn pseudo_boolean(&self, expr: &LinExpr) -> (Vec<(u64, Lit)>, i64) {
        let mut constant = expr.constant_term();
        let mut terms = Vec::new();

        for (var, coefficient) in expr.terms() {
            let Rungs { lower, lits } = &self.rungs[var.index()];
            constant += coefficient * lower;
            for lit in lits {
                if coefficient > 0 {
                    terms.push((coefficient.unsigned_abs(), *lit));
                } else {
                    // c·l = c + (-c)·!l
                    constant += coefficient;
                    terms.push((coefficient.unsigned_abs(), !*lit));
                }
            }
        }

        (terms, constant)
    }

    /// `expr <= rhs`
    fn at_most(&mut self, expr: &LinExpr, rhs: i64) {
        let (terms, constant) = self.pseudo_boolean(expr);
        match u64::try_from(rhs - constant) {
            Ok(bound) => at_most_weighted(&mut self.engine, &terms, bound),
            Err(_) => self.contradicted = true,
        }
    }

    fn require(&mut self, constraint: &Constraint) {
        let negated = || -constraint.expr().clone();
        match constraint.comparison() {
            Comparison::Le => self.at_most(constraint.expr(), constraint.rhs()),
            Comparison::Ge => self.at_most(&negated(), -constraint.rhs()),
            Comparison::Eq => {
                self.at_most(constraint.expr(), constraint.rhs());
                self.at_most(&negated(), -constraint.rhs());
            }
        }
    }

    fn values(&self) -> Result<Vec<i64>, SolverFailure> {
        let assignment = self.engine.model()
            .ok_or_else(|| SolverFailure::Backend("satisfiable formula without a model".to_string()))?;
        let holds = |lit: &Lit| assignment.get(lit.var().index()).is_some_and(|assigned| assigned == lit);

        Ok(self.rungs.iter()
            .map(|Rungs { lower, lits }| lower + lits.iter().filter(|lit| holds(*lit)).count() as i64)
            .collect_vec())
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZero;

    use crate::model::{LinExpr, Model, Sense, VarKind};
    use crate::solver::{SatSolver, Solver, Status};

    fn knapsack(sense: Sense) -> Model {
        // 3a + 2b + 2c <= 4 over binaries, objective a + b + c
        let mut model = Model::new(sense);
        let a = model.add_var(VarKind::Binary);
        let b = model.add_var(VarKind::Binary);
        let c = model.add_var(VarKind::Binary);
        model.add_constraint((3 * a + 2 * b + 2 * c).leq(4i64));
        model.set_objective(a + b + c);
        model
    }

    #[test]
    fn maximizes() {
        let solution = SatSolver::new().solve(&knapsack(Sense::Maximize)).unwrap();
        assert_eq!(solution.status, Status::Optimal);
        assert_eq!(solution.objective_value, Some(2));
        assert_eq!(solution.values[0], 0);
    }

    #[test]
    fn minimizes() {
        let solution = SatSolver::new().solve(&knapsack(Sense::Minimize)).unwrap();
        assert_eq!(solution.status, Status::Optimal);
        assert_eq!(solution.objective_value, Some(0));
        assert_eq!(solution.objective_bound, 0);
    }

    #[test]
    fn integers_with_offsets() {
        // y in -2..=3, x binary; y - 2x >= 1, minimize y
        let mut model = Model::new(Sense::Minimize);
        let x = model.add_var(VarKind::Binary);
        let y = model.add_var(VarKind::Integer { lower: -2, upper: 3 });
        model.add_constraint((LinExpr::from(y) - 2 * x).geq(1i64));
        model.add_constraint(LinExpr::from(x).equals(1i64));
        model.set_objective(y.into());

        let solution = SatSolver::new().solve(&model).unwrap();
        assert_eq!(solution.status, Status::Optimal);
        assert_eq!(solution.values, vec![1, 3]);
        assert_eq!(solution.objective_value, Some(3));
    }

    #[test]
    fn reports_infeasibility() {
        let mut model = Model::new(Sense::Minimize);
        let x = model.add_var(VarKind::Binary);
        let y = model.add_var(VarKind::Binary);
        model.add_constraint((x + y).geq(2i64));
        model.add_constraint((x + y).leq(1i64));
        model.set_objective(x + y);

        let solution = SatSolver::new().solve(&model).unwrap();
        assert_eq!(solution.status, Status::NoSolutionFound);
        assert!(!solution.has_assignment());
        assert_eq!(solution.objective_bound, 0);
    }

    #[test]
    fn negative_rhs_is_contradiction() {
        let mut model = Model::new(Sense::Minimize);
        let x = model.add_var(VarKind::Binary);
        model.add_constraint(LinExpr::from(x).leq(-1i64));

        let solution = SatSolver::new().solve(&model).unwrap();
        assert_eq!(solution.status, Status::NoSolutionFound);
    }

    #[test]
    fn improvement_limit_reports_feasible() {
        let mut model = Model::new(Sense::Maximize);
        let vars = (0..6).map(|_| model.add_var(VarKind::Binary)).collect::<Vec<_>>();
        model.set_objective(vars.iter().copied().sum());

        let solution = SatSolver::new()
            .with_improvement_limit(NonZero::new(1).unwrap())
            .solve(&model)
            .unwrap();
        assert_eq!(solution.status, Status::Feasible);
        assert!(solution.has_assignment());
        assert_eq!(solution.objective_bound, 6);
    }
}
