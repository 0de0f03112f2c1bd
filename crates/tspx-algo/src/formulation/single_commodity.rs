//! Single-commodity flow (Gavish-Graves).
//!
//! The depot ships one unit to every other node over selected edges; each edge
//! carries at most `n-1` units.

use std::collections::HashMap;

use tspx_core::{Edge, Instance};

use super::{EdgeVars, SubtourElimination};
use crate::error::FormulationResult;
use crate::model::{Constraint, LinearExpr, MilpModel, VarId};

#[derive(Debug, Clone, Copy, Default)]
pub struct SingleCommodityFlow;

/// Flow `g[i,j]` on every edge.
#[derive(Debug, Clone, Default)]
pub struct FlowVars {
    pub flow: HashMap<Edge, VarId>,
}

impl SingleCommodityFlow {
    const NAME: &'static str = "Single_Commodity";

    pub fn encode(
        &self,
        model: &mut MilpModel,
        instance: &Instance,
        x: &EdgeVars,
    ) -> FormulationResult<FlowVars> {
        let capacity = (instance.node_count() - 1) as f64;
        let mut vars = FlowVars::default();

        for edge in instance.edges() {
            let g = model.add_nonnegative(format!("g[{},{}]", edge.from, edge.to));
            vars.flow.insert(edge, g);
            let link = LinearExpr::new()
                .term(g, 1.0)
                .term(x.require(edge.from, edge.to, Self::NAME)?, -capacity);
            model.add_constraint(Constraint::le(format!("cap{edge}"), link, 0.0))?;
        }

        // Each non-depot node absorbs exactly one unit
        for i in instance.non_depot_nodes() {
            let mut balance = LinearExpr::new();
            for j in instance.nodes().filter(|j| *j != i) {
                balance.add_term(vars.flow[&Edge::new(j, i)], 1.0);
                balance.add_term(vars.flow[&Edge::new(i, j)], -1.0);
            }
            model.add_constraint(Constraint::eq(format!("flow[{i}]"), balance, 1.0))?;
        }
        Ok(vars)
    }
}

impl SubtourElimination for SingleCommodityFlow {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn id(&self) -> &'static str {
        "single-commodity"
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sense;
    use crate::test_utils::integer_instance;

    #[test]
    fn flow_per_edge_and_balance_per_node() {
        let instance = integer_instance(4, 0);
        let mut model = MilpModel::new("scf");
        let x = EdgeVars::declare(&mut model, &instance);
        let vars = SingleCommodityFlow.encode(&mut model, &instance, &x).unwrap();

        assert_eq!(vars.flow.len(), 12);
        let balances: Vec<_> = model
            .constraints()
            .iter()
            .filter(|c| c.sense == Sense::Eq)
            .collect();
        assert_eq!(balances.len(), 3);
        assert_eq!(model.constraint_count(), 12 + 3);
    }
}
