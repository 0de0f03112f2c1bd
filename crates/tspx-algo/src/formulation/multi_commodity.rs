//! Multi-commodity flow.
//!
//! For every non-depot node `l` one unit travels from the depot to `l`
//! ([`Commodity::Outbound`]) and one unit travels from `l` back to the depot
//! ([`Commodity::Inbound`]). Each commodity may only use selected edges, so a
//! selection with a sub-tour cannot route both directions.

use std::collections::HashMap;
use std::fmt;

use tspx_core::{Edge, Instance, NodeId};

use super::{EdgeVars, SubtourElimination};
use crate::error::{FormulationError, FormulationResult};
use crate::model::{Constraint, LinearExpr, MilpModel, VarId};

#[derive(Debug, Clone, Copy, Default)]
pub struct MultiCommodityFlow;

/// One unit of flow between the depot and a non-depot node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Commodity {
    /// Depot to the node
    Outbound(NodeId),
    /// Node to the depot
    Inbound(NodeId),
}

impl Commodity {
    pub fn node(&self) -> NodeId {
        match *self {
            Commodity::Outbound(n) | Commodity::Inbound(n) => n,
        }
    }

    pub fn source(&self) -> NodeId {
        match *self {
            Commodity::Outbound(_) => NodeId::DEPOT,
            Commodity::Inbound(n) => n,
        }
    }

    pub fn sink(&self) -> NodeId {
        match *self {
            Commodity::Outbound(n) => n,
            Commodity::Inbound(_) => NodeId::DEPOT,
        }
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.source(), self.sink())
    }
}

/// Flow `w[(i,j), c]` for every edge and commodity.
#[derive(Debug, Clone, Default)]
pub struct CommodityFlowVars {
    pub flow: HashMap<(Edge, Commodity), VarId>,
}

impl CommodityFlowVars {
    pub fn get(&self, edge: Edge, commodity: Commodity) -> Option<VarId> {
        self.flow.get(&(edge, commodity)).copied()
    }
}

impl MultiCommodityFlow {
    const NAME: &'static str = "Multi_Commodity";

    /// Both commodities of every non-depot node.
    pub fn commodities(instance: &Instance) -> Vec<Commodity> {
        instance
            .non_depot_nodes()
            .flat_map(|l| [Commodity::Outbound(l), Commodity::Inbound(l)])
            .collect()
    }

    pub fn encode(
        &self,
        model: &mut MilpModel,
        instance: &Instance,
        x: &EdgeVars,
    ) -> FormulationResult<CommodityFlowVars> {
        self.encode_commodities(model, instance, x, &Self::commodities(instance))
    }

    /// Encode an explicit commodity list.
    ///
    /// Fails if a commodity names the depot or a node outside the instance.
    pub fn encode_commodities(
        &self,
        model: &mut MilpModel,
        instance: &Instance,
        x: &EdgeVars,
        commodities: &[Commodity],
    ) -> FormulationResult<CommodityFlowVars> {
        for commodity in commodities {
            let node = commodity.node();
            if node.is_depot() || !instance.contains(node) {
                return Err(FormulationError::elimination(
                    Self::NAME,
                    format!(
                        "commodity {commodity} must connect the depot to a node in 2..={}",
                        instance.node_count()
                    ),
                ));
            }
        }

        let mut vars = CommodityFlowVars::default();
        for edge in instance.edges() {
            let x_ij = x.require(edge.from, edge.to, Self::NAME)?;
            for &commodity in commodities {
                let w = model.add_nonnegative(format!("w[{},{},{}]", edge.from, edge.to, commodity));
                vars.flow.insert((edge, commodity), w);
                let link = LinearExpr::new().term(w, 1.0).term(x_ij, -1.0);
                model.add_constraint(Constraint::le(
                    format!("link{edge}{commodity}"),
                    link,
                    0.0,
                ))?;
            }
        }

        for &commodity in commodities {
            for v in instance.nodes() {
                let mut balance = LinearExpr::new();
                for u in instance.nodes().filter(|u| *u != v) {
                    balance.add_term(vars.flow[&(Edge::new(v, u), commodity)], 1.0);
                    balance.add_term(vars.flow[&(Edge::new(u, v), commodity)], -1.0);
                }
                let supply = if v == commodity.source() {
                    1.0
                } else if v == commodity.sink() {
                    -1.0
                } else {
                    0.0
                };
                model.add_constraint(Constraint::eq(
                    format!("conserve{commodity}[{v}]"),
                    balance,
                    supply,
                ))?;
            }
        }
        Ok(vars)
    }
}

impl SubtourElimination for MultiCommodityFlow {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn id(&self) -> &'static str {
        "multi-commodity"
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
    use crate::test_utils::integer_instance;

    fn setup(n: usize) -> (Instance, MilpModel, EdgeVars) {
        let instance = integer_instance(n, 4);
        let mut model = MilpModel::new("mcf");
        let x = EdgeVars::declare(&mut model, &instance);
        (instance, model, x)
    }

    #[test]
    fn two_commodities_per_non_depot_node() {
        let (instance, mut model, x) = setup(4);
        let commodities = MultiCommodityFlow::commodities(&instance);
        assert_eq!(commodities.len(), 6);
        assert!(commodities.contains(&Commodity::Outbound(NodeId(3))));
        assert!(commodities.contains(&Commodity::Inbound(NodeId(3))));

        let vars = MultiCommodityFlow.encode(&mut model, &instance, &x).unwrap();
        // 12 edges x 6 commodities
        assert_eq!(vars.flow.len(), 72);
        // one link per flow variable plus one balance per commodity and node
        assert_eq!(model.constraint_count(), 72 + 6 * 4);
    }

    #[test]
    fn conservation_signs_follow_direction() {
        let (instance, mut model, x) = setup(4);
        MultiCommodityFlow.encode(&mut model, &instance, &x).unwrap();
        let rhs = |name: &str| {
            model
                .constraints()
                .iter()
                .find(|c| c.name == name)
                .map(|c| c.rhs)
                .unwrap()
        };
        assert_eq!(rhs("conserve(1,3)[1]"), 1.0);
        assert_eq!(rhs("conserve(1,3)[3]"), -1.0);
        assert_eq!(rhs("conserve(1,3)[2]"), 0.0);
        assert_eq!(rhs("conserve(3,1)[3]"), 1.0);
        assert_eq!(rhs("conserve(3,1)[1]"), -1.0);
    }

    #[test]
    fn depot_commodity_is_rejected() {
        let (instance, mut model, x) = setup(4);
        let err = MultiCommodityFlow
            .encode_commodities(&mut model, &instance, &x, &[Commodity::Outbound(NodeId::DEPOT)])
            .unwrap_err();
        assert!(matches!(
            err,
            FormulationError::EliminationConstruction {
                formulation: "Multi_Commodity",
                ..
            }
        ));
    }

    #[test]
    fn out_of_range_commodity_is_rejected() {
        let (instance, mut model, x) = setup(4);
        let result = MultiCommodityFlow.encode_commodities(
            &mut model,
            &instance,
            &x,
            &[Commodity::Inbound(NodeId(9))],
        );
        assert!(result.is_err());
        assert_eq!(model.constraint_count(), 0);
    }
}
