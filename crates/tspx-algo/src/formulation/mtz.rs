//! Miller-Tucker-Zemlin position variables.

use std::collections::HashMap;

use tspx_core::{Instance, NodeId};

use super::{EdgeVars, SubtourElimination};
use crate::error::FormulationResult;
use crate::model::{Constraint, LinearExpr, MilpModel, VarId};

#[derive(Debug, Clone, Copy, Default)]
pub struct Mtz;

/// Position `u[i]` of every non-depot node.
#[derive(Debug, Clone, Default)]
pub struct MtzVars {
    pub position: HashMap<NodeId, VarId>,
}

impl Mtz {
    const NAME: &'static str = "MTZ";

    /// `u[i] ∈ [1, n-1]` and `u[i] - u[j] + (n-1)·x[i,j] <= n-2` for
    /// non-depot `i ≠ j`.
    pub fn encode(
        &self,
        model: &mut MilpModel,
        instance: &Instance,
        x: &EdgeVars,
    ) -> FormulationResult<MtzVars> {
        let n = instance.node_count() as f64;
        let mut vars = MtzVars::default();
        for i in instance.non_depot_nodes() {
            let u = model.add_continuous(format!("u[{i}]"), 1.0, n - 1.0)?;
            vars.position.insert(i, u);
        }

        for i in instance.non_depot_nodes() {
            for j in instance.non_depot_nodes().filter(|j| *j != i) {
                let expr = LinearExpr::new()
                    .term(vars.position[&i], 1.0)
                    .term(vars.position[&j], -1.0)
                    .term(x.require(i, j, Self::NAME)?, n - 1.0);
                model.add_constraint(Constraint::le(format!("mtz[{i},{j}]"), expr, n - 2.0))?;
            }
        }
        Ok(vars)
    }
}

impl SubtourElimination for Mtz {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn id(&self) -> &'static str {
        "mtz"
    }

    fn add_subtour_elimination(
        &self,
        model: &mut MilpModel,
        instance: &Instance,
        x: &EdgeVars,
    ) -> FormulationResult<()> {
        self.encode(model, instance, x).map(|_| ())
    }
}
