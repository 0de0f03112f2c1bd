//! Solver-neutral mixed-integer linear model.
//!
//! Formulations describe their variables and rows here; a
//! [`MilpBackend`](crate::backend::MilpBackend) translates the model into a
//! concrete solver call. The objective is always minimized.

use std::fmt;

use crate::error::ModelError;

/// Handle to a declared variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    /// Position in [`MilpModel::variables`].
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Domain of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    Binary,
    Integer,
    Continuous,
}

impl VarKind {
    pub fn is_integral(&self) -> bool {
        !matches!(self, VarKind::Continuous)
    }
}

/// A declared variable with its bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub kind: VarKind,
    pub lower: f64,
    pub upper: f64,
}

/// `Σ coeff·var + constant`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// Sum of the given variables, each with coefficient 1.
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
            constant: 0.0,
        }
    }

    /// Builder form of [`LinearExpr::add_term`].
    pub fn term(mut self, var: VarId, coeff: f64) -> Self {
        self.add_term(var, coeff);
        self
    }

    pub fn add_term(&mut self, var: VarId, coeff: f64) {
        self.terms.push((var, coeff));
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant_value(&self) -> f64 {
        self.constant
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value under an assignment indexed by [`VarId::index`].
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(v, c)| c * values.get(v.index()).copied().unwrap_or(f64::NAN))
            .sum::<f64>()
            + self.constant
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        LinearExpr::new().term(var, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sense {
    Le,
    Eq,
    Ge,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sense::Le => "<=",
            Sense::Eq => "==",
            Sense::Ge => ">=",
        })
    }
}

/// A named linear row `expr (sense) rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    pub fn le(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Self::new(name, expr, Sense::Le, rhs)
    }

    pub fn eq(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Self::new(name, expr, Sense::Eq, rhs)
    }

    pub fn ge(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Self::new(name, expr, Sense::Ge, rhs)
    }

    fn new(name: impl Into<String>, expr: LinearExpr, sense: Sense, rhs: f64) -> Self {
        Self {
            name: name.into(),
            expr,
            sense,
            rhs,
        }
    }

    /// Whether `values` satisfies this row within `tol`.
    pub fn is_satisfied(&self, values: &[f64], tol: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs + tol,
            Sense::Eq => (lhs - self.rhs).abs() <= tol,
            Sense::Ge => lhs >= self.rhs - tol,
        }
    }
}

/// Variables, rows and a minimization objective.
#[derive(Debug, Clone, Default)]
pub struct MilpModel {
    name: String,
    vars: Vec<VarDef>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
}

impl MilpModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a variable; binary variables always get bounds `[0, 1]`.
    pub fn add_var(
        &mut self,
        name: impl Into<String>,
        kind: VarKind,
        lower: f64,
        upper: f64,
    ) -> Result<VarId, ModelError> {
        let name = name.into();
        let (lower, upper) = match kind {
            VarKind::Binary => (0.0, 1.0),
            _ => (lower, upper),
        };
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(ModelError::InvertedBounds { name, lower, upper });
        }
        let id = VarId(self.vars.len());
        self.vars.push(VarDef {
            name,
            kind,
            lower,
            upper,
        });
        Ok(id)
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(VarDef {
            name: name.into(),
            kind: VarKind::Binary,
            lower: 0.0,
            upper: 1.0,
        });
        id
    }

    pub fn add_continuous(
        &mut self,
        name: impl Into<String>,
        lower: f64,
        upper: f64,
    ) -> Result<VarId, ModelError> {
        self.add_var(name, VarKind::Continuous, lower, upper)
    }

    /// Continuous variable in `[0, +inf)`.
    pub fn add_nonnegative(&mut self, name: impl Into<String>) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(VarDef {
            name: name.into(),
            kind: VarKind::Continuous,
            lower: 0.0,
            upper: f64::INFINITY,
        });
        id
    }

    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), ModelError> {
        self.check_expr(&constraint.expr, &constraint.name)?;
        if !constraint.rhs.is_finite() {
            return Err(ModelError::NonFinite {
                constraint: constraint.name,
                what: "right-hand side",
            });
        }
        self.constraints.push(constraint);
        Ok(())
    }

    /// Add a batch of rows; returns how many were added.
    pub fn add_constraints(
        &mut self,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> Result<usize, ModelError> {
        let mut added = 0;
        for constraint in constraints {
            self.add_constraint(constraint)?;
            added += 1;
        }
        Ok(added)
    }

    pub fn set_objective(&mut self, objective: LinearExpr) -> Result<(), ModelError> {
        self.check_expr(&objective, "objective")?;
        self.objective = objective;
        Ok(())
    }

    fn check_expr(&self, expr: &LinearExpr, row: &str) -> Result<(), ModelError> {
        for (var, coeff) in expr.terms() {
            if var.index() >= self.vars.len() {
                return Err(ModelError::UnknownVariable(*var));
            }
            if !coeff.is_finite() {
                return Err(ModelError::NonFinite {
                    constraint: row.to_string(),
                    what: "coefficient",
                });
            }
        }
        if !expr.constant_value().is_finite() {
            return Err(ModelError::NonFinite {
                constraint: row.to_string(),
                what: "constant",
            });
        }
        Ok(())
    }

    /// Copy with every integrality requirement dropped; bounds are kept.
    pub fn relax(&self) -> MilpModel {
        let mut relaxed = self.clone();
        relaxed.name = format!("{}_relaxed", self.name);
        for var in &mut relaxed.vars {
            var.kind = VarKind::Continuous;
        }
        relaxed
    }

    pub fn variables(&self) -> &[VarDef] {
        &self.vars
    }

    pub fn var(&self, id: VarId) -> Option<&VarDef> {
        self.vars.get(id.index())
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn integral_var_count(&self) -> usize {
        self.vars.iter().filter(|v| v.kind.is_integral()).count()
    }

    /// Names of rows violated by `values`, for diagnostics and tests.
    pub fn violated_constraints(&self, values: &[f64], tol: f64) -> Vec<&str> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied(values, tol))
            .map(|c| c.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_bounds_are_forced() {
        let mut model = MilpModel::new("m");
        let x = model.add_var("x", VarKind::Binary, -5.0, 7.0).unwrap();
        let def = model.var(x).unwrap();
        assert_eq!((def.lower, def.upper), (0.0, 1.0));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let mut model = MilpModel::new("m");
        let err = model.add_continuous("u", 3.0, 1.0).unwrap_err();
        assert!(matches!(err, ModelError::InvertedBounds { .. }));
    }

    #[test]
    fn unknown_variable_is_rejected() {
        let mut model = MilpModel::new("m");
        let mut other = MilpModel::new("other");
        other.add_binary("a");
        let foreign = other.add_binary("b");
        let row = Constraint::le("bad", LinearExpr::from(foreign), 1.0);
        assert_eq!(
            model.add_constraint(row),
            Err(ModelError::UnknownVariable(foreign))
        );
    }

    #[test]
    fn non_finite_coefficient_is_rejected() {
        let mut model = MilpModel::new("m");
        let x = model.add_binary("x");
        let row = Constraint::eq("nan", LinearExpr::new().term(x, f64::NAN), 1.0);
        assert!(model.add_constraint(row).is_err());
        assert_eq!(model.constraint_count(), 0);
    }

    #[test]
    fn relax_drops_integrality_only() {
        let mut model = MilpModel::new("m");
        model.add_binary("x");
        model.add_var("k", VarKind::Integer, 0.0, 9.0).unwrap();
        model.add_continuous("u", 1.0, 4.0).unwrap();
        let relaxed = model.relax();
        assert_eq!(model.integral_var_count(), 2);
        assert_eq!(relaxed.integral_var_count(), 0);
        assert_eq!(relaxed.variables()[0].upper, 1.0);
        assert_eq!(relaxed.variables()[1].upper, 9.0);
        assert_eq!(relaxed.name(), "m_relaxed");
    }

    #[test]
    fn evaluate_and_check_rows() {
        let mut model = MilpModel::new("m");
        let a = model.add_binary("a");
        let b = model.add_binary("b");
        let row = Constraint::le("pair", LinearExpr::sum([a, b]), 1.0);
        model.add_constraint(row).unwrap();
        assert!(model.violated_constraints(&[1.0, 0.0], 1e-9).is_empty());
        assert_eq!(model.violated_constraints(&[1.0, 1.0], 1e-9), vec!["pair"]);
        let expr = LinearExpr::constant(2.0).term(a, 3.0).term(b, -1.0);
        assert_eq!(expr.evaluate(&[1.0, 1.0]), 4.0);
    }
}
