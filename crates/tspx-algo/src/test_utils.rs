//! Fixtures and a scripted backend shared by unit and integration tests.

use std::sync::{Arc, Mutex};

use itertools::Itertools;
use tspx_core::{Instance, NodeId, SolveStatus};

use crate::backend::{MilpBackend, SolveOutcome, SolverParams};
use crate::error::FormulationResult;
use crate::model::MilpModel;

/// Backend that returns a fixed status without solving anything.
///
/// Every call records the parameters it received.
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    status: SolveStatus,
    available: bool,
    calls: Arc<Mutex<Vec<SolverParams>>>,
}

impl ScriptedBackend {
    pub fn new(status: SolveStatus) -> Self {
        Self {
            status,
            available: true,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Shared view of the recorded calls; stays valid after the backend moves.
    pub fn calls(&self) -> Arc<Mutex<Vec<SolverParams>>> {
        Arc::clone(&self.calls)
    }
}

impl MilpBackend for ScriptedBackend {
    fn id(&self) -> &'static str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn optimize(
        &self,
        _model: &MilpModel,
        params: &SolverParams,
    ) -> FormulationResult<SolveOutcome> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(params.clone());
        }
        Ok(SolveOutcome::without_incumbent(self.status, params.time_limit))
    }
}

/// Four corners of the unit square with exact Euclidean weights.
///
/// The optimal tour is the perimeter, length 4.
pub fn unit_square() -> Instance {
    let corners = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
    let matrix = corners
        .iter()
        .map(|&(ax, ay)| {
            corners
                .iter()
                .map(|&(bx, by)| f64::hypot(ax - bx, ay - by))
                .collect()
        })
        .collect();
    Instance::from_matrix("unit_square", matrix).expect("square matrix")
}

/// Deterministic asymmetric instance with integer weights in `1..=23`.
pub fn integer_instance(n: usize, seed: usize) -> Instance {
    let matrix = (1..=n)
        .map(|i| {
            (1..=n)
                .map(|j| {
                    if i == j {
                        0.0
                    } else {
                        ((i * 37 + j * 17 + seed * 13 + i * j * 7) % 23 + 1) as f64
                    }
                })
                .collect()
        })
        .collect();
    Instance::from_matrix(format!("int_{n}_{seed}"), matrix).expect("square matrix")
}

/// Shortest tour by enumerating every order of the non-depot nodes.
pub fn brute_force_optimum(instance: &Instance) -> f64 {
    let rest: Vec<NodeId> = instance.non_depot_nodes().collect();
    let len = rest.len();
    rest.into_iter()
        .permutations(len)
        .map(|perm| {
            let mut order = vec![NodeId::DEPOT];
            order.extend(perm);
            instance.tour_length(&order)
        })
        .fold(f64::INFINITY, f64::min)
}

/// Check out-degree = in-degree = 1 for a 0/1 edge selection.
pub fn satisfies_assignment(instance: &Instance, selected: &[tspx_core::Edge]) -> bool {
    instance.nodes().all(|v| {
        let out = selected.iter().filter(|e| e.from == v).count();
        let inn = selected.iter().filter(|e| e.to == v).count();
        out == 1 && inn == 1
    })
}
