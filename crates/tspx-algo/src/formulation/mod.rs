//! TSP formulations.
//!
//! Every formulation shares the assignment core (one outgoing and one incoming
//! selected edge per node) and differs only in how it forbids sub-tours:
//!
//! | strategy                 | log name           | auxiliary state                   |
//! |--------------------------|--------------------|-----------------------------------|
//! | [`Dfj`]                  | `DFJ`              | none, one cut per node subset     |
//! | [`Mtz`]                  | `MTZ`              | position `u[i]`                   |
//! | [`SingleCommodityFlow`]  | `Single_Commodity` | flow `g[i,j]`                     |
//! | [`MultiCommodityFlow`]   | `Multi_Commodity`  | flow `w[(i,j), commodity]`        |
//! | [`LogLex`]               | `Log_Lex`          | bit planes `z[i,t]` and pair mass |
//!
//! A [`Formulation`] owns one model and one solver session. [`Formulation::solve`]
//! consumes it: set objective, add elimination, relax, optimize the integer
//! model then the relaxation under the session's fixed parameters, append
//! both records.

mod assignment;
mod dfj;
mod log_lex;
mod mtz;
mod multi_commodity;
mod single_commodity;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tspx_core::{Edge, Instance, IntegerRecord, NodeId, RelaxedRecord, SolveStatus};

use crate::backend::SolveOutcome;
use crate::error::{FormulationError, FormulationResult};
use crate::model::{LinearExpr, MilpModel, VarId};
use crate::result_log::ResultLog;
use crate::session::SolverSession;

pub use assignment::install_assignment;
pub use dfj::{Dfj, DFJ_WARN_NODES};
pub use log_lex::{LogLex, LogLexVars, PairVars, PlaneVars};
pub use mtz::{Mtz, MtzVars};
pub use multi_commodity::{Commodity, CommodityFlowVars, MultiCommodityFlow};
pub use single_commodity::{FlowVars, SingleCommodityFlow};

/// Value above which a relaxed binary counts as selected.
const SELECTED: f64 = 0.5;

/// Adds one family of sub-tour elimination constraints to a model that
/// already carries `x[i,j]` and the assignment rows.
pub trait SubtourElimination: Send + Sync {
    /// Name written to result logs (e.g., "DFJ", "Log_Lex")
    fn name(&self) -> &'static str;

    /// Identifier used on the command line (e.g., "dfj", "log-lex")
    fn id(&self) -> &'static str;

    /// Add the auxiliary variables and rows of this strategy
    fn add_subtour_elimination(
        &self,
        model: &mut MilpModel,
        instance: &Instance,
        x: &EdgeVars,
    ) -> FormulationResult<()>;
}

/// The binary edge variables `x[i,j]`, one per directed edge.
#[derive(Debug, Clone, Default)]
pub struct EdgeVars {
    vars: HashMap<Edge, VarId>,
}

impl EdgeVars {
    /// Declare `x[i,j]` for every edge of the instance.
    pub fn declare(model: &mut MilpModel, instance: &Instance) -> Self {
        let vars = instance
            .edges()
            .map(|e| (e, model.add_binary(format!("x[{},{}]", e.from, e.to))))
            .collect();
        Self { vars }
    }

    pub fn get(&self, from: NodeId, to: NodeId) -> Option<VarId> {
        self.vars.get(&Edge::new(from, to)).copied()
    }

    /// Like [`EdgeVars::get`], failing with a construction error for `formulation`.
    pub fn require(
        &self,
        from: NodeId,
        to: NodeId,
        formulation: &'static str,
    ) -> FormulationResult<VarId> {
        self.get(from, to).ok_or_else(|| {
            FormulationError::elimination(
                formulation,
                format!("edge ({from},{to}) has no x variable"),
            )
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (Edge, VarId)> + '_ {
        self.vars.iter().map(|(e, v)| (*e, *v))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Edges whose variable is selected in `outcome`, sorted.
    pub fn selected(&self, outcome: &SolveOutcome) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .iter()
            .filter(|(_, v)| outcome.value(*v).is_some_and(|x| x > SELECTED))
            .map(|(e, _)| e)
            .collect();
        edges.sort();
        edges
    }
}

/// The five built-in strategies, selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormulationKind {
    Dfj,
    Mtz,
    SingleCommodity,
    MultiCommodity,
    LogLex,
}

impl FormulationKind {
    pub const ALL: [FormulationKind; 5] = [
        FormulationKind::Dfj,
        FormulationKind::Mtz,
        FormulationKind::SingleCommodity,
        FormulationKind::MultiCommodity,
        FormulationKind::LogLex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormulationKind::Dfj => "dfj",
            FormulationKind::Mtz => "mtz",
            FormulationKind::SingleCommodity => "single-commodity",
            FormulationKind::MultiCommodity => "multi-commodity",
            FormulationKind::LogLex => "log-lex",
        }
    }

    pub fn strategy(&self) -> Box<dyn SubtourElimination> {
        match self {
            FormulationKind::Dfj => Box::new(Dfj),
            FormulationKind::Mtz => Box::new(Mtz),
            FormulationKind::SingleCommodity => Box::new(SingleCommodityFlow),
            FormulationKind::MultiCommodity => Box::new(MultiCommodityFlow),
            FormulationKind::LogLex => Box::new(LogLex::default()),
        }
    }

    /// Log name of the strategy (e.g., "Single_Commodity").
    pub fn log_name(&self) -> &'static str {
        self.strategy().name()
    }
}

impl fmt::Display for FormulationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormulationKind {
    type Err = FormulationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "dfj" => Ok(FormulationKind::Dfj),
            "mtz" => Ok(FormulationKind::Mtz),
            "single-commodity" | "scf" => Ok(FormulationKind::SingleCommodity),
            "multi-commodity" | "mcf" => Ok(FormulationKind::MultiCommodity),
            "log-lex" | "loglex" => Ok(FormulationKind::LogLex),
            other => Err(FormulationError::ModelBuild(format!(
                "unknown formulation '{}'; supported values: {}",
                other,
                FormulationKind::ALL.map(|k| k.as_str()).join(", ")
            ))),
        }
    }
}

/// Everything a finished solve produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub integer: IntegerRecord,
    pub relaxed: RelaxedRecord,
    /// Edges with `x[i,j] = 1` in the integer incumbent
    pub selected_edges: Vec<Edge>,
    /// Visiting order from the depot, when the selection is one cycle
    pub tour: Option<Vec<NodeId>>,
}

/// One TSP model bound to one strategy and one solver session.
pub struct Formulation<'a> {
    instance: &'a Instance,
    strategy: Box<dyn SubtourElimination>,
    session: SolverSession,
    model: MilpModel,
    x: EdgeVars,
}

impl<'a> Formulation<'a> {
    /// Declare `x[i,j]` and install the assignment rows.
    pub fn new(
        instance: &'a Instance,
        strategy: Box<dyn SubtourElimination>,
        session: SolverSession,
    ) -> FormulationResult<Self> {
        instance.validate_for_tour()?;

        let mut model = MilpModel::new(format!("tsp_{}", strategy.name()));
        let x = EdgeVars::declare(&mut model, instance);
        install_assignment(&mut model, instance, &x)?;

        Ok(Self {
            instance,
            strategy,
            session,
            model,
            x,
        })
    }

    pub fn name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn instance(&self) -> &Instance {
        self.instance
    }

    pub fn model(&self) -> &MilpModel {
        &self.model
    }

    pub fn edge_vars(&self) -> &EdgeVars {
        &self.x
    }

    pub fn session(&self) -> &SolverSession {
        &self.session
    }

    /// Build the full model without solving; used for inspection.
    pub fn build(mut self) -> FormulationResult<(MilpModel, EdgeVars)> {
        self.complete_model()?;
        Ok((self.model, self.x))
    }

    fn complete_model(&mut self) -> FormulationResult<()> {
        let mut objective = LinearExpr::new();
        for (edge, var) in self.x.iter() {
            objective.add_term(var, self.instance.weight(edge.from, edge.to));
        }
        self.model.set_objective(objective)?;

        let before = self.model.constraint_count();
        self.strategy
            .add_subtour_elimination(&mut self.model, self.instance, &self.x)?;
        debug!(
            formulation = self.strategy.name(),
            vars = self.model.var_count(),
            rows = self.model.constraint_count(),
            elimination_rows = self.model.constraint_count() - before,
            "model built"
        );
        Ok(())
    }

    /// Solve the integer model and its relaxation, then log both records.
    ///
    /// Non-optimal termination is reported through the record status.
    pub fn solve(mut self, log: &ResultLog) -> FormulationResult<SolveReport> {
        self.complete_model()?;
        let relaxed_model = self.model.relax();

        let formulation = self.strategy.name();
        let instance_name = self.instance.name();
        let node_count = self.instance.node_count();

        let integer = self.session.optimize(&self.model)?;
        if !integer.status.is_optimal() {
            warn!(
                formulation,
                instance = instance_name,
                status = %integer.status,
                "integer solve ended without proven optimum"
            );
        }
        let relaxed = self.session.optimize(&relaxed_model)?;

        let integer_record = IntegerRecord {
            formulation: formulation.to_string(),
            instance: instance_name.to_string(),
            node_count,
            status: integer.status,
            objective: integer.objective,
            bound: integer.bound,
            gap: integer.gap,
            runtime: integer.runtime,
        };
        let relaxed_record = RelaxedRecord {
            formulation: formulation.to_string(),
            instance: instance_name.to_string(),
            node_count,
            objective: relaxed_objective(&relaxed),
            runtime: relaxed.runtime,
        };
        log.append_integer(&integer_record)?;
        log.append_relaxed(&relaxed_record)?;

        info!(
            formulation,
            instance = instance_name,
            nodes = node_count,
            status = %integer_record.status,
            objective = integer_record.objective,
            relaxed = relaxed_record.objective,
            runtime = integer_record.runtime,
            "solved"
        );

        let selected_edges = self.x.selected(&integer);
        let tour = extract_tour(node_count, &selected_edges);
        Ok(SolveReport {
            integer: integer_record,
            relaxed: relaxed_record,
            selected_edges,
            tour,
        })
    }
}

fn relaxed_objective(outcome: &SolveOutcome) -> f64 {
    match outcome.status {
        SolveStatus::Optimal => outcome.objective,
        _ => f64::NAN,
    }
}

/// Follow successors from the depot; `Some` only for one Hamiltonian cycle.
pub fn extract_tour(node_count: usize, selected: &[Edge]) -> Option<Vec<NodeId>> {
    let successor: HashMap<NodeId, NodeId> = selected.iter().map(|e| (e.from, e.to)).collect();
    if successor.len() != node_count || selected.len() != node_count {
        return None;
    }
    let mut order = Vec::with_capacity(node_count);
    let mut current = NodeId::DEPOT;
    loop {
        order.push(current);
        current = *successor.get(&current)?;
        if current == NodeId::DEPOT {
            break;
        }
        if order.len() >= node_count {
            return None;
        }
    }
    (order.len() == node_count).then_some(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(pairs: &[(usize, usize)]) -> Vec<Edge> {
        pairs
            .iter()
            .map(|&(a, b)| Edge::new(NodeId(a), NodeId(b)))
            .collect()
    }

    #[test]
    fn tour_is_read_from_depot() {
        let tour = extract_tour(4, &edges(&[(1, 3), (3, 2), (2, 4), (4, 1)])).unwrap();
        assert_eq!(tour, vec![NodeId(1), NodeId(3), NodeId(2), NodeId(4)]);
    }

    #[test]
    fn subtours_have_no_tour() {
        assert_eq!(extract_tour(4, &edges(&[(1, 2), (2, 1), (3, 4), (4, 3)])), None);
        assert_eq!(extract_tour(4, &edges(&[(1, 2), (2, 1)])), None);
    }

    #[test]
    fn kind_parses_log_names_and_ids() {
        for kind in FormulationKind::ALL {
            assert_eq!(kind.as_str().parse::<FormulationKind>().unwrap(), kind);
            assert_eq!(kind.log_name().parse::<FormulationKind>().unwrap(), kind);
        }
        assert!("held-karp".parse::<FormulationKind>().is_err());
    }

    #[test]
    fn strategy_ids_match_kinds() {
        for kind in FormulationKind::ALL {
            assert_eq!(kind.strategy().id(), kind.as_str());
        }
    }
}
