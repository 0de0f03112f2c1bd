//! Logarithmic lexicographic ordering.
//!
//! Every non-depot node gets `l` fractional bit planes `z[i,t]`, most
//! significant first. For each non-depot pair `i < j` a unit of probability
//! mass walks the planes in one of three states:
//!
//! - *tied*: both bit strings agree so far (`p00`, `p11`),
//! - *diverging*: they differ for the first time at plane `t` (`q01`, `q10`),
//! - *settled*: they already differed earlier (`r00`, `r01`, `r10`, `r11`).
//!
//! The pair starts tied with mass `p0 = x[i,j] + x[j,i]` and settled with the
//! rest (`r0`). Tied mass must diverge by the last plane, and the direction it
//! diverges in is tied to the edge: `x[i,j] = Σ_t q01_t`, `x[j,i] = Σ_t q10_t`.
//! Every selected edge between non-depot nodes therefore raises the expected
//! rank `Σ_t 2^(l-t)·z[·,t]` by at least one, which rules out sub-tours that
//! avoid the depot.

use std::collections::HashMap;

use tspx_core::{Instance, NodeId};

use super::{EdgeVars, SubtourElimination};
use crate::error::{FormulationError, FormulationResult};
use crate::model::{Constraint, LinearExpr, MilpModel, VarId};

/// Strategy with an optional fixed number of bit planes.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLex {
    bits: Option<usize>,
}

/// Variables of one plane for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneVars {
    pub q10: VarId,
    pub q01: VarId,
    pub r00: VarId,
    pub r01: VarId,
    pub r10: VarId,
    pub r11: VarId,
    /// Absent on the last plane
    pub p00: Option<VarId>,
    /// Absent on the last plane
    pub p11: Option<VarId>,
}

impl PlaneVars {
    pub fn tied(&self) -> Vec<VarId> {
        self.p00.into_iter().chain(self.p11).collect()
    }

    pub fn divergence(&self) -> [VarId; 2] {
        [self.q01, self.q10]
    }

    pub fn settled(&self) -> [VarId; 4] {
        [self.r00, self.r01, self.r10, self.r11]
    }
}

/// Mass variables of one non-depot pair `i < j`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairVars {
    pub p0: VarId,
    pub r0: VarId,
    /// `planes[t - 1]` holds plane `t`
    pub planes: Vec<PlaneVars>,
}

#[derive(Debug, Clone, Default)]
pub struct LogLexVars {
    pub bits: usize,
    pub z: HashMap<(NodeId, usize), VarId>,
    pub pairs: HashMap<(NodeId, NodeId), PairVars>,
}

impl LogLexVars {
    /// `z[node, t]` for `t` in `1..=bits`.
    pub fn z(&self, node: NodeId, t: usize) -> Option<VarId> {
        self.z.get(&(node, t)).copied()
    }

    /// Pair variables, in either argument order.
    pub fn pair(&self, a: NodeId, b: NodeId) -> Option<&PairVars> {
        self.pairs.get(&(a.min(b), a.max(b)))
    }
}

impl LogLex {
    const NAME: &'static str = "Log_Lex";

    /// Use exactly `bits` planes instead of the default for the instance size.
    pub fn with_bits(bits: usize) -> Self {
        Self { bits: Some(bits) }
    }

    /// Default plane count: `⌈log2 n⌉ + 1`.
    pub fn bit_planes(node_count: usize) -> usize {
        ceil_log2(node_count) + 1
    }

    pub fn encode(
        &self,
        model: &mut MilpModel,
        instance: &Instance,
        x: &EdgeVars,
    ) -> FormulationResult<LogLexVars> {
        let n = instance.node_count();
        let l = self.bits.unwrap_or_else(|| Self::bit_planes(n));
        if l == 0 {
            return Err(FormulationError::elimination(Self::NAME, "bit range is empty"));
        }
        let ranks = n.saturating_sub(1);
        if (l as u32) < usize::BITS && (1usize << l) < ranks {
            return Err(FormulationError::elimination(
                Self::NAME,
                format!("{l} bit planes cannot rank {ranks} nodes"),
            ));
        }

        let mut vars = LogLexVars {
            bits: l,
            ..LogLexVars::default()
        };
        for i in instance.non_depot_nodes() {
            for t in 1..=l {
                let z = model.add_continuous(format!("z[{i},{t}]"), 0.0, 1.0)?;
                vars.z.insert((i, t), z);
            }
        }

        let nodes: Vec<NodeId> = instance.non_depot_nodes().collect();
        for (a, &i) in nodes.iter().enumerate() {
            for &j in &nodes[a + 1..] {
                let pair = self.encode_pair(model, &vars, x, i, j, l)?;
                vars.pairs.insert((i, j), pair);
            }
        }
        Ok(vars)
    }

    fn encode_pair(
        &self,
        model: &mut MilpModel,
        vars: &LogLexVars,
        x: &EdgeVars,
        i: NodeId,
        j: NodeId,
        l: usize,
    ) -> FormulationResult<PairVars> {
        let tag = format!("{i},{j}");
        let p0 = model.add_continuous(format!("p0[{tag}]"), 0.0, 1.0)?;
        let r0 = model.add_continuous(format!("r0[{tag}]"), 0.0, 1.0)?;
        let mut planes = Vec::with_capacity(l);
        for t in 1..=l {
            let mut var = |name: &str| model.add_nonnegative(format!("{name}[{tag},{t}]"));
            let q10 = var("q10");
            let q01 = var("q01");
            let r00 = var("r00");
            let r01 = var("r01");
            let r10 = var("r10");
            let r11 = var("r11");
            let (p00, p11) = if t < l {
                (Some(var("p00")), Some(var("p11")))
            } else {
                (None, None)
            };
            planes.push(PlaneVars {
                q10,
                q01,
                r00,
                r01,
                r10,
                r11,
                p00,
                p11,
            });
        }

        let mut rows = Vec::new();
        for (idx, plane) in planes.iter().enumerate() {
            let t = idx + 1;
            let z_i = vars.z(i, t).ok_or_else(|| missing_z(i, t))?;
            let z_j = vars.z(j, t).ok_or_else(|| missing_z(j, t))?;

            let mut bit_i = LinearExpr::from(z_i);
            let mut bit_j = LinearExpr::from(z_j);
            for v in [plane.q10, plane.r10, plane.r11].into_iter().chain(plane.p11) {
                bit_i.add_term(v, -1.0);
            }
            for v in [plane.q01, plane.r01, plane.r11].into_iter().chain(plane.p11) {
                bit_j.add_term(v, -1.0);
            }
            rows.push(Constraint::eq(format!("bit_i[{tag},{t}]"), bit_i, 0.0));
            rows.push(Constraint::eq(format!("bit_j[{tag},{t}]"), bit_j, 0.0));
        }

        rows.push(Constraint::eq(
            format!("start[{tag}]"),
            LinearExpr::sum([p0, r0]),
            1.0,
        ));

        // p0 = tied_1 + q_1, then tied_t = tied_{t+1} + q_{t+1}
        let first = &planes[0];
        let mut head = LinearExpr::from(p0);
        subtract(&mut head, first.tied().into_iter().chain(first.divergence()));
        rows.push(Constraint::eq(format!("tied[{tag},0]"), head, 0.0));
        for t in 1..l {
            let (cur, next) = (&planes[t - 1], &planes[t]);
            let mut chain = LinearExpr::sum(cur.tied());
            subtract(&mut chain, next.tied().into_iter().chain(next.divergence()));
            rows.push(Constraint::eq(format!("tied[{tag},{t}]"), chain, 0.0));
        }

        // r0 = settled_1, then settled_t + q_t = settled_{t+1}, ending at 1
        let mut head = LinearExpr::from(r0);
        subtract(&mut head, first.settled());
        rows.push(Constraint::eq(format!("settled[{tag},0]"), head, 0.0));
        for t in 1..l {
            let (cur, next) = (&planes[t - 1], &planes[t]);
            let mut chain = LinearExpr::sum(cur.settled().into_iter().chain(cur.divergence()));
            subtract(&mut chain, next.settled());
            rows.push(Constraint::eq(format!("settled[{tag},{t}]"), chain, 0.0));
        }
        let last = &planes[l - 1];
        rows.push(Constraint::eq(
            format!("settled[{tag},{l}]"),
            LinearExpr::sum(last.settled().into_iter().chain(last.divergence())),
            1.0,
        ));

        let mut forward = LinearExpr::from(x.require(i, j, Self::NAME)?);
        subtract(&mut forward, planes.iter().map(|p| p.q01));
        rows.push(Constraint::eq(format!("order[{i},{j}]"), forward, 0.0));
        let mut backward = LinearExpr::from(x.require(j, i, Self::NAME)?);
        subtract(&mut backward, planes.iter().map(|p| p.q10));
        rows.push(Constraint::eq(format!("order[{j},{i}]"), backward, 0.0));

        model.add_constraints(rows)?;
        Ok(PairVars { p0, r0, planes })
    }
}

impl SubtourElimination for LogLex {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn id(&self) -> &'static str {
        "log-lex"
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

fn subtract(expr: &mut LinearExpr, vars: impl IntoIterator<Item = VarId>) {
    for v in vars {
        expr.add_term(v, -1.0);
    }
}

fn missing_z(node: NodeId, t: usize) -> FormulationError {
    FormulationError::elimination(LogLex::NAME, format!("z[{node},{t}] was not declared"))
}

fn ceil_log2(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MicroLpBackend, MilpBackend, SolverParams};
    use crate::formulation::install_assignment;
    use crate::test_utils::integer_instance;
    use tspx_core::SolveStatus;

    fn build(n: usize, strategy: LogLex) -> (Instance, MilpModel, EdgeVars, LogLexVars) {
        let instance = integer_instance(n, 5);
        let mut model = MilpModel::new("loglex");
        let x = EdgeVars::declare(&mut model, &instance);
        install_assignment(&mut model, &instance, &x).unwrap();
        let mut objective = LinearExpr::new();
        for (e, v) in x.iter() {
            objective.add_term(v, instance.weight(e.from, e.to));
        }
        model.set_objective(objective).unwrap();
        let vars = strategy.encode(&mut model, &instance, &x).unwrap();
        (instance, model, x, vars)
    }

    #[test]
    fn plane_counts() {
        assert_eq!(LogLex::bit_planes(3), 3);
        assert_eq!(LogLex::bit_planes(4), 3);
        assert_eq!(LogLex::bit_planes(5), 4);
        assert_eq!(LogLex::bit_planes(8), 4);
        assert_eq!(LogLex::bit_planes(9), 5);
        assert_eq!(LogLex::bit_planes(15), 5);
    }

    #[test]
    fn last_plane_has_no_tied_state() {
        let (_, _, _, vars) = build(5, LogLex::default());
        assert_eq!(vars.bits, 4);
        // 4 non-depot nodes, 6 pairs
        assert_eq!(vars.z.len(), 16);
        assert_eq!(vars.pairs.len(), 6);
        let pair = vars.pair(NodeId(4), NodeId(2)).unwrap();
        assert_eq!(pair.planes.len(), 4);
        assert!(pair.planes[..3].iter().all(|p| p.p00.is_some() && p.p11.is_some()));
        assert!(pair.planes[3].p00.is_none() && pair.planes[3].p11.is_none());
    }

    #[test]
    fn empty_bit_range_is_rejected() {
        let instance = integer_instance(4, 0);
        let mut model = MilpModel::new("loglex");
        let x = EdgeVars::declare(&mut model, &instance);
        let err = LogLex::with_bits(0)
            .encode(&mut model, &instance, &x)
            .unwrap_err();
        assert!(matches!(err, FormulationError::EliminationConstruction { .. }));
    }

    #[test]
    fn too_few_planes_are_rejected() {
        let instance = integer_instance(6, 0);
        let mut model = MilpModel::new("loglex");
        let x = EdgeVars::declare(&mut model, &instance);
        // 2 planes rank at most 4 nodes, 5 are needed
        let err = LogLex::with_bits(2)
            .encode(&mut model, &instance, &x)
            .unwrap_err();
        assert!(err.to_string().contains("cannot rank 5 nodes"));
    }

    #[test]
    fn mass_partitions_every_plane() {
        let (_, model, _, vars) = build(5, LogLex::default());
        for candidate in [model.clone(), model.relax()] {
            let out = MicroLpBackend
                .optimize(&candidate, &SolverParams::default())
                .unwrap();
            assert_eq!(out.status, SolveStatus::Optimal);
            let value = |v: VarId| out.value(v).unwrap();
            for pair in vars.pairs.values() {
                assert!((value(pair.p0) + value(pair.r0) - 1.0).abs() < 1e-6);
                for plane in &pair.planes {
                    let tied: f64 = plane.tied().into_iter().map(value).sum();
                    let diverging: f64 = plane.divergence().into_iter().map(value).sum();
                    let settled: f64 = plane.settled().into_iter().map(value).sum();
                    assert!(
                        (tied + diverging + settled - 1.0).abs() < 1e-6,
                        "tied {tied} + diverging {diverging} + settled {settled}"
                    );
                }
            }
        }
    }

    #[test]
    fn selected_edges_order_their_ranks() {
        let (_, model, x, vars) = build(5, LogLex::default());
        let out = MicroLpBackend
            .optimize(&model, &SolverParams::default())
            .unwrap();
        let rank = |node: NodeId| -> f64 {
            (1..=vars.bits)
                .map(|t| {
                    let weight = (1u64 << (vars.bits - t)) as f64;
                    weight * out.value(vars.z(node, t).unwrap()).unwrap()
                })
                .sum()
        };
        for e in x.selected(&out) {
            if e.from.is_depot() || e.to.is_depot() {
                continue;
            }
            assert!(rank(e.to) >= rank(e.from) + 1.0 - 1e-6, "edge {e}");
        }
    }
}
