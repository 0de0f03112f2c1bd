//! Dantzig-Fulkerson-Johnson subset elimination.
//!
//! Every node subset `S` with `2 <= |S| <= n-1` gets
//! `Σ_{i,j ∈ S, i≠j} x[i,j] <= |S| - 1`. All `2^n - n - 2` cuts are added up
//! front; there is no separation routine, so this is only practical for
//! small instances.

use itertools::Itertools;
use tracing::warn;
use tspx_core::{Instance, NodeId};

use super::{EdgeVars, SubtourElimination};
use crate::error::FormulationResult;
use crate::model::{Constraint, LinearExpr, MilpModel};

/// Node count above which enumeration is flagged as expensive.
pub const DFJ_WARN_NODES: usize = 15;

#[derive(Debug, Clone, Copy, Default)]
pub struct Dfj;

impl Dfj {
    const NAME: &'static str = "DFJ";

    /// Number of subset rows for `n` nodes: `Σ_{k=2}^{n-1} C(n,k)`.
    pub fn constraint_count(n: usize) -> usize {
        if n < 3 {
            return 0;
        }
        (2..n).map(|k| binomial(n, k)).sum()
    }

    /// Add every subset row; returns how many were added.
    pub fn encode(
        &self,
        model: &mut MilpModel,
        instance: &Instance,
        x: &EdgeVars,
    ) -> FormulationResult<usize> {
        let n = instance.node_count();
        if n > DFJ_WARN_NODES {
            warn!(
                nodes = n,
                rows = Dfj::constraint_count(n),
                "DFJ enumerates every node subset; expect a very large model"
            );
        }

        let mut added = 0;
        for size in 2..n {
            for subset in instance.nodes().combinations(size) {
                let mut expr = LinearExpr::new();
                for (&i, &j) in subset.iter().cartesian_product(subset.iter()) {
                    if i != j {
                        expr.add_term(x.require(i, j, Self::NAME)?, 1.0);
                    }
                }
                model.add_constraint(Constraint::le(
                    subset_name(&subset),
                    expr,
                    (size - 1) as f64,
                ))?;
                added += 1;
            }
        }
        Ok(added)
    }
}

impl SubtourElimination for Dfj {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn id(&self) -> &'static str {
        "dfj"
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

fn subset_name(subset: &[NodeId]) -> String {
    format!("dfj[{}]", subset.iter().join(","))
}

fn binomial(n: usize, k: usize) -> usize {
    let k = k.min(n - k);
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}
