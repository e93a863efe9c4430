//! A small integer linear program: bounded integer variables, linear constraints with integer coefficients, and one linear objective.
//!
//! This is the currency handed across the [`Solver`](crate::solver::Solver) seam.
//! Variables and constraints are plain indices; anything wanting names keeps its own structured keys alongside.

use std::iter::Sum;
use std::ops::{Add, Mul, Neg, Sub};

use itertools::Itertools;

/// Handle to a variable of a [`Model`].
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Position of this variable in [`Model::variables`] and in solution value vectors.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Handle to a constraint of a [`Model`].
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ConstraintId(pub(crate) usize);

impl ConstraintId {
    /// Position of this constraint in [`Model::constraints`].
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Domain of a variable.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VarKind {
    /// Takes the value 0 or 1.
    Binary,
    /// Takes any integer in `lower..=upper`.
    Integer {
        /// Smallest allowed value.
        lower: i64,
        /// Largest allowed value.
        upper: i64,
    },
}

impl VarKind {
    /// Inclusive `(lower, upper)` bounds of the domain.
    pub fn bounds(&self) -> (i64, i64) {
        match self {
            Self::Binary => (0, 1),
            Self::Integer { lower, upper } => (*lower, *upper),
        }
    }
}

/// Direction of optimization.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum Sense {
    /// Smallest objective value wins.
    #[default]
    Minimize,
    /// Largest objective value wins.
    Maximize,
}

/// `Σ coefficient · variable + constant`, with integer coefficients.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LinExpr {
    pub(crate) terms: Vec<(VarId, i64)>,
    pub(crate) constant: i64,
}

impl LinExpr {
    /// The expression `constant`.
    pub fn constant(constant: i64) -> Self {
        Self { terms: Vec::new(), constant }
    }

    /// Terms with duplicate variables merged and zero coefficients dropped, ordered by variable.
    pub fn terms(&self) -> Vec<(VarId, i64)> {
        self.terms.iter()
            .into_grouping_map_by(|(var, _)| *var)
            .fold(0i64, |acc, _, (_, coefficient)| acc + coefficient)
            .into_iter()
            .filter(|(_, coefficient)| *coefficient != 0)
            .sorted()
            .collect_vec()
    }

    /// The constant part of the expression.
    pub fn constant_term(&self) -> i64 {
        self.constant
    }

    /// Value of the expression given one value per model variable, indexed by [`VarId::index`].
    pub fn evaluate(&self, values: &[i64]) -> i64 {
        self.terms.iter()
            .map(|(var, coefficient)| coefficient * values.get(var.0).copied().unwrap_or_default())
            .sum::<i64>() + self.constant
    }

    /// `self <= rhs`.
    pub fn leq(self, rhs: impl Into<LinExpr>) -> Constraint {
        Constraint::new(self - rhs, Comparison::Le)
    }

    /// `self >= rhs`.
    pub fn geq(self, rhs: impl Into<LinExpr>) -> Constraint {
        Constraint::new(self - rhs, Comparison::Ge)
    }

    /// `self == rhs`.
    pub fn equals(self, rhs: impl Into<LinExpr>) -> Constraint {
        Constraint::new(self - rhs, Comparison::Eq)
    }
}

impl From<VarId> for LinExpr {
    fn from(var: VarId) -> Self {
        Self { terms: vec![(var, 1)], constant: 0 }
    }
}

impl From<i64> for LinExpr {
    fn from(constant: i64) -> Self {
        Self::constant(constant)
    }
}

impl<R: Into<LinExpr>> Add<R> for LinExpr {
    type Output = LinExpr;

    fn add(mut self, rhs: R) -> Self::Output {
        let rhs: LinExpr = rhs.into();
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl<R: Into<LinExpr>> Sub<R> for LinExpr {
    type Output = LinExpr;

    fn sub(self, rhs: R) -> Self::Output {
        let rhs: LinExpr = rhs.into();
        self + -rhs
    }
}

impl Neg for LinExpr {
    type Output = LinExpr;

    fn neg(self) -> Self::Output {
        self * -1
    }
}

impl Mul<i64> for LinExpr {
    type Output = LinExpr;

    fn mul(mut self, rhs: i64) -> Self::Output {
        self.terms.iter_mut().for_each(|(_, coefficient)| *coefficient *= rhs);
        self.constant *= rhs;
        self
    }
}

impl Mul<VarId> for i64 {
    type Output = LinExpr;

    fn mul(self, rhs: VarId) -> Self::Output {
        LinExpr { terms: vec![(rhs, self)], constant: 0 }
    }
}

impl<R: Into<LinExpr>> Add<R> for VarId {
    type Output = LinExpr;

    fn add(self, rhs: R) -> Self::Output {
        LinExpr::from(self) + rhs
    }
}

impl<T: Into<LinExpr>> Sum<T> for LinExpr {
    fn sum<I: Iterator<Item = T>>(iter: I) -> Self {
        iter.fold(LinExpr::default(), |acc, term| acc + term)
    }
}

/// How the expression of a [`Constraint`] compares to its right-hand side.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Comparison {
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `==`
    Eq,
}

/// `expr (<=|>=|==) rhs`, with every variable on the left and a constant on the right.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Constraint {
    pub(crate) expr: LinExpr,
    pub(crate) comparison: Comparison,
    pub(crate) rhs: i64,
}

impl Constraint {
    fn new(mut expr: LinExpr, comparison: Comparison) -> Self {
        let rhs = -expr.constant;
        expr.constant = 0;
        Self { expr, comparison, rhs }
    }

    /// Left-hand side; its constant part is always zero.
    pub fn expr(&self) -> &LinExpr {
        &self.expr
    }

    /// The comparison operator.
    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    /// Right-hand side constant.
    pub fn rhs(&self) -> i64 {
        self.rhs
    }

    /// Whether `values` (one per model variable) satisfy this constraint.
    pub fn is_satisfied_by(&self, values: &[i64]) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.comparison {
            Comparison::Le => lhs <= self.rhs,
            Comparison::Ge => lhs >= self.rhs,
            Comparison::Eq => lhs == self.rhs,
        }
    }
}

/// An integer linear program.
#[derive(Clone, Debug, Default)]
pub struct Model {
    variables: Vec<VarKind>,
    constraints: Vec<Constraint>,
    objective: LinExpr,
    sense: Sense,
}

impl Model {
    /// An empty model optimizing in the given direction.
    pub fn new(sense: Sense) -> Self {
        Self { sense, ..Default::default() }
    }

    /// Add a variable with the given domain.
    pub fn add_var(&mut self, kind: VarKind) -> VarId {
        self.variables.push(kind);
        VarId(self.variables.len() - 1)
    }

    /// Add a constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) -> ConstraintId {
        self.constraints.push(constraint);
        ConstraintId(self.constraints.len() - 1)
    }

    /// Replace the objective.
    pub fn set_objective(&mut self, objective: LinExpr) {
        self.objective = objective;
    }

    /// Domains, indexed by [`VarId::index`].
    pub fn variables(&self) -> &[VarKind] {
        &self.variables
    }

    /// Constraints, indexed by [`ConstraintId::index`].
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The objective expression.
    pub fn objective(&self) -> &LinExpr {
        &self.objective
    }

    /// The direction of optimization.
    pub fn sense(&self) -> Sense {
        self.sense
    }

    /// The best objective value the variable domains alone would allow.
    ///
    /// Every feasible assignment is on the losing side of this bound, so it is a valid (if weak) bound to report when nothing better was proven.
    pub fn objective_bound(&self) -> i64 {
        self.objective.terms.iter()
            .map(|(var, coefficient)| {
                let (lower, upper) = self.variables[var.0].bounds();
                let towards_lower = (*coefficient > 0) == (self.sense == Sense::Minimize);
                coefficient * if towards_lower { lower } else { upper }
            })
            .sum::<i64>() + self.objective.constant
    }

    /// Whether `values` respect every domain and every constraint.
    pub fn is_feasible(&self, values: &[i64]) -> bool {
        values.len() == self.variables.len()
            && self.variables.iter().zip(values).all(|(kind, value)| {
                let (lower, upper) = kind.bounds();
                (lower..=upper).contains(value)
            })
            && self.constraints.iter().all(|constraint| constraint.is_satisfied_by(values))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Comparison, LinExpr, Model, Sense, VarKind};

    #[test]
    fn constraints_move_constants_right() {
        let mut model = Model::new(Sense::Minimize);
        let x = model.add_var(VarKind::Binary);
        let y = model.add_var(VarKind::Integer { lower: 0, upper: 4 });

        // 2x <= y  becomes  2x - y <= 0
        let c = (2 * x).leq(y);
        assert_eq!(c.comparison(), Comparison::Le);
        assert_eq!(c.rhs(), 0);
        assert_eq!(c.expr().terms(), vec![(x, 2), (y, -1)]);

        // y <= 4 - 2x  becomes  y + 2x <= 4
        let c = LinExpr::from(y).leq(LinExpr::constant(4) - 2 * x);
        assert_eq!(c.rhs(), 4);
        assert_eq!(c.expr().terms(), vec![(x, 2), (y, 1)]);
        assert!(c.is_satisfied_by(&[1, 2]));
        assert!(!c.is_satisfied_by(&[1, 3]));
    }

    #[test]
    fn duplicate_terms_merge() {
        let mut model = Model::new(Sense::Minimize);
        let x = model.add_var(VarKind::Binary);
        let expr = x + x + (LinExpr::from(x) * -2);
        assert!(expr.terms().is_empty());
        assert_eq!(expr.evaluate(&[1]), 0);
    }

    #[test]
    fn domain_bound_follows_sense() {
        let mut model = Model::new(Sense::Maximize);
        let x = model.add_var(VarKind::Binary);
        let y = model.add_var(VarKind::Integer { lower: -2, upper: 3 });
        model.set_objective(x + (-1 * y) + 10i64);
        assert_eq!(model.objective_bound(), 1 + 2 + 10);

        let mut model = Model::new(Sense::Minimize);
        let x = model.add_var(VarKind::Binary);
        let y = model.add_var(VarKind::Integer { lower: -2, upper: 3 });
        model.set_objective(x + (-1 * y));
        assert_eq!(model.objective_bound(), -3);
    }

    #[test]
    fn feasibility_checks_domains() {
        let mut model = Model::new(Sense::Minimize);
        let x = model.add_var(VarKind::Binary);
        model.add_constraint(LinExpr::from(x).leq(1i64));
        assert!(model.is_feasible(&[1]));
        assert!(!model.is_feasible(&[2]));
        assert!(!model.is_feasible(&[]));
    }
}
