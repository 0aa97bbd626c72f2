//! MILP model representation and the solver boundary.

pub mod model;
pub mod oracle;

pub use model::{
    ConstraintSense, LinearConstraint, LinearExpr, MilpModel, VarId, VarKind, VarMap, VariableDef,
};
pub use oracle::{
    Assignment, GoodLpOracle, MilpBackendKind, MilpOracle, OracleOutcome, OracleStatus,
    INTEGRALITY_TOLERANCE,
};
