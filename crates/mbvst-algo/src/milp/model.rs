//! Solver-independent MILP model.
//!
//! Formulations describe their model here; an [`MilpOracle`](super::MilpOracle)
//! translates it for a concrete back-end. Keeping the model as plain data lets
//! tests inspect constraints, check assignments and render LP files without a
//! solver in the loop.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::ops::Index;

/// Handle to a model variable (its index in [`MilpModel::variables`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(usize);

impl VarId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarKind {
    Binary,
    Continuous { lower: f64, upper: Option<f64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDef {
    pub name: String,
    pub kind: VarKind,
}

/// `Σ coefficient · variable + constant`
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
        LinearExpr {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn add_term(&mut self, coefficient: f64, var: VarId) {
        self.terms.push((var, coefficient));
    }

    pub fn with_term(mut self, coefficient: f64, var: VarId) -> Self {
        self.add_term(coefficient, var);
        self
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value of the expression under `values` (indexed by [`VarId::index`]).
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values.get(var.0).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        LinearExpr::new().with_term(1.0, var)
    }
}

impl FromIterator<VarId> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = VarId>>(iter: I) -> Self {
        let mut expr = LinearExpr::new();
        for var in iter {
            expr.add_term(1.0, var);
        }
        expr
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    LessEq,
    Eq,
    GreaterEq,
}

impl ConstraintSense {
    pub fn symbol(self) -> &'static str {
        match self {
            ConstraintSense::LessEq => "<=",
            ConstraintSense::Eq => "=",
            ConstraintSense::GreaterEq => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub label: String,
    pub expr: LinearExpr,
    pub sense: ConstraintSense,
    pub rhs: f64,
}

impl LinearConstraint {
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            ConstraintSense::LessEq => lhs <= self.rhs + tolerance,
            ConstraintSense::Eq => (lhs - self.rhs).abs() <= tolerance,
            ConstraintSense::GreaterEq => lhs >= self.rhs - tolerance,
        }
    }
}

/// Variables, linear constraints and a linear objective to minimise.
#[derive(Debug, Clone, Default)]
pub struct MilpModel {
    name: String,
    variables: Vec<VariableDef>,
    constraints: Vec<LinearConstraint>,
    objective: LinearExpr,
}

impl MilpModel {
    pub fn new(name: impl Into<String>) -> Self {
        MilpModel {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_variable(name.into(), VarKind::Binary)
    }

    pub fn add_continuous(&mut self, name: impl Into<String>, lower: f64, upper: Option<f64>) -> VarId {
        self.add_variable(name.into(), VarKind::Continuous { lower, upper })
    }

    fn add_variable(&mut self, name: String, kind: VarKind) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(VariableDef { name, kind });
        id
    }

    pub fn add_constraint(
        &mut self,
        label: impl Into<String>,
        expr: LinearExpr,
        sense: ConstraintSense,
        rhs: f64,
    ) {
        self.constraints.push(LinearConstraint {
            label: label.into(),
            expr,
            sense,
            rhs,
        });
    }

    pub fn minimise(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Labels of constraints and bounds violated by `values`.
    pub fn violations(&self, values: &[f64], tolerance: f64) -> Vec<String> {
        let mut out = Vec::new();
        for (def, value) in self.variables.iter().zip(values) {
            let within = match def.kind {
                VarKind::Binary => {
                    value.abs() <= tolerance || (value - 1.0).abs() <= tolerance
                }
                VarKind::Continuous { lower, upper } => {
                    *value >= lower - tolerance && upper.map_or(true, |ub| *value <= ub + tolerance)
                }
            };
            if !within {
                out.push(format!("bound:{}", def.name));
            }
        }
        out.extend(
            self.constraints
                .iter()
                .filter(|c| !c.is_satisfied(values, tolerance))
                .map(|c| c.label.clone()),
        );
        out
    }

    /// CPLEX LP text rendering.
    pub fn to_lp_format(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\\ {}", self.name);
        out.push_str("Minimize\n obj:");
        self.write_terms(&mut out, &self.objective);
        if self.objective.constant_term() != 0.0 {
            let _ = write!(out, " {:+}", self.objective.constant_term());
        }
        out.push_str("\nSubject To\n");
        for (idx, constraint) in self.constraints.iter().enumerate() {
            let _ = write!(out, " c{}_{}:", idx, sanitize(&constraint.label));
            self.write_terms(&mut out, &constraint.expr);
            let rhs = constraint.rhs - constraint.expr.constant_term();
            let _ = writeln!(out, " {} {}", constraint.sense.symbol(), rhs);
        }
        out.push_str("Bounds\n");
        for def in &self.variables {
            if let VarKind::Continuous { lower, upper } = def.kind {
                match upper {
                    Some(ub) => {
                        let _ = writeln!(out, " {} <= {} <= {}", lower, def.name, ub);
                    }
                    None => {
                        let _ = writeln!(out, " {} >= {}", def.name, lower);
                    }
                }
            }
        }
        let binaries: Vec<&str> = self
            .variables
            .iter()
            .filter(|def| def.kind == VarKind::Binary)
            .map(|def| def.name.as_str())
            .collect();
        if !binaries.is_empty() {
            out.push_str("Binaries\n");
            for name in binaries {
                let _ = writeln!(out, " {name}");
            }
        }
        out.push_str("End\n");
        out
    }

    /// An empty expression is written as `0 <first variable>`; LP readers
    /// reject a bare constant on the left-hand side.
    fn write_terms(&self, out: &mut String, expr: &LinearExpr) {
        if expr.is_empty() {
            match self.variables.first() {
                Some(def) => {
                    let _ = write!(out, " 0 {}", def.name);
                }
                None => out.push_str(" 0"),
            }
            return;
        }
        for (var, coef) in expr.terms() {
            let sign = if *coef < 0.0 { '-' } else { '+' };
            let _ = write!(out, " {} {} {}", sign, coef.abs(), self.variables[var.0].name);
        }
    }
}

fn sanitize(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Structured key to variable handle lookup.
#[derive(Debug, Clone)]
pub struct VarMap<K: Ord> {
    inner: BTreeMap<K, VarId>,
}

impl<K: Ord> Default for VarMap<K> {
    fn default() -> Self {
        VarMap {
            inner: BTreeMap::new(),
        }
    }
}

impl<K: Ord> VarMap<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: K, var: VarId) {
        self.inner.insert(key, var);
    }

    pub fn get(&self, key: &K) -> Option<VarId> {
        self.inner.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, K, VarId> {
        self.inner.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = VarId> + '_ {
        self.inner.values().copied()
    }
}

impl<K: Ord> Index<&K> for VarMap<K> {
    type Output = VarId;

    fn index(&self, key: &K) -> &VarId {
        &self.inner[key]
    }
}

impl<'a, K: Ord> IntoIterator for &'a VarMap<K> {
    type Item = (&'a K, &'a VarId);
    type IntoIter = btree_map::Iter<'a, K, VarId>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_var_model() -> (MilpModel, VarId, VarId) {
        let mut model = MilpModel::new("toy");
        let x = model.add_binary("x_1_2");
        let f = model.add_continuous("f_1_2", 0.0, Some(3.0));
        model.add_constraint(
            "link",
            LinearExpr::from(x).with_term(-1.0, f),
            ConstraintSense::LessEq,
            0.0,
        );
        model.add_constraint("count", LinearExpr::from(x), ConstraintSense::Eq, 1.0);
        model.minimise(LinearExpr::from(f));
        (model, x, f)
    }

    #[test]
    fn evaluates_expressions_with_constants() {
        let (_, x, f) = two_var_model();
        let mut expr = LinearExpr::constant(-2.0).with_term(3.0, x);
        expr.add_term(0.5, f);
        assert!((expr.evaluate(&[1.0, 2.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn reports_violated_constraints_and_bounds() {
        let (model, _, _) = two_var_model();
        assert!(model.violations(&[1.0, 1.0], 1e-9).is_empty());
        assert_eq!(model.violations(&[1.0, 0.0], 1e-9), vec!["link".to_string()]);
        assert_eq!(
            model.violations(&[0.5, 4.0], 1e-9),
            vec!["bound:x_1_2".to_string(), "bound:f_1_2".to_string(), "count".to_string()]
        );
    }

    #[test]
    fn lp_format_lists_sections() {
        let (model, _, _) = two_var_model();
        let lp = model.to_lp_format();
        assert!(lp.starts_with("\\ toy\nMinimize\n obj: + 1 f_1_2\n"));
        assert!(lp.contains(" c0_link: + 1 x_1_2 - 1 f_1_2 <= 0\n"));
        assert!(lp.contains(" c1_count: + 1 x_1_2 = 1\n"));
        assert!(lp.contains(" 0 <= f_1_2 <= 3\n"));
        assert!(lp.contains("Binaries\n x_1_2\n"));
        assert!(lp.ends_with("End\n"));
    }

    #[test]
    fn empty_rows_keep_a_variable_on_the_left() {
        // single-vertex graph: nothing to select, count must still be written
        let mut model = MilpModel::new("single");
        let y = model.add_binary("y_1");
        model.add_constraint("edge_count", LinearExpr::new(), ConstraintSense::Eq, 0.0);
        model.minimise(LinearExpr::from(y));
        let lp = model.to_lp_format();
        assert!(lp.contains(" c0_edge_count: 0 y_1 = 0\n"), "{lp}");
        assert!(!lp.contains(": 0 ="));
    }

    #[test]
    fn var_map_lookup() {
        let (_, x, f) = two_var_model();
        let mut map = VarMap::new();
        map.insert((1, 2), x);
        map.insert((2, 1), f);
        assert_eq!(map[&(2, 1)], f);
        assert_eq!(map.get(&(3, 1)), None);
        assert_eq!(map.values().collect::<Vec<_>>(), vec![x, f]);
    }
}
