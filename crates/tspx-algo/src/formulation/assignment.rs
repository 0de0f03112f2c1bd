//! Assignment rows shared by every formulation.

use tspx_core::Instance;

use super::EdgeVars;
use crate::error::FormulationResult;
use crate::model::{Constraint, LinearExpr, MilpModel};

/// For every node `i`: `Σ_j x[i,j] = 1` and `Σ_j x[j,i] = 1`.
pub fn install_assignment(
    model: &mut MilpModel,
    instance: &Instance,
    x: &EdgeVars,
) -> FormulationResult<()> {
    for i in instance.nodes() {
        let mut outgoing = LinearExpr::new();
        let mut incoming = LinearExpr::new();
        for j in instance.nodes().filter(|j| *j != i) {
            outgoing.add_term(x.require(i, j, "assignment")?, 1.0);
            incoming.add_term(x.require(j, i, "assignment")?, 1.0);
        }
        model.add_constraint(Constraint::eq(format!("out[{i}]"), outgoing, 1.0))?;
        model.add_constraint(Constraint::eq(format!("in[{i}]"), incoming, 1.0))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sense;
    use crate::test_utils::integer_instance;

    #[test]
    fn two_rows_per_node() {
        let instance = integer_instance(5, 1);
        let mut model = MilpModel::new("a");
        let x = EdgeVars::declare(&mut model, &instance);
        install_assignment(&mut model, &instance, &x).unwrap();

        assert_eq!(x.len(), 20);
        assert_eq!(model.constraint_count(), 10);
        for row in model.constraints() {
            assert_eq!(row.sense, Sense::Eq);
            assert_eq!(row.rhs, 1.0);
            assert_eq!(row.expr.terms().len(), 4);
        }
    }
}
