//! Immutable TSP instances.
//!
//! An [`Instance`] owns `n` nodes numbered `1..=n`, every ordered pair of
//! distinct nodes as a directed [`Edge`], and a dense weight matrix. Node `1`
//! is the depot used by the flow- and order-based formulations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::weight::{EdgeWeightType, Point};
use crate::{TspError, TspResult};

/// 1-based node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The distinguished root node.
    pub const DEPOT: NodeId = NodeId(1);

    pub fn new(id: usize) -> Self {
        NodeId(id)
    }

    pub fn value(&self) -> usize {
        self.0
    }

    pub fn is_depot(&self) -> bool {
        *self == Self::DEPOT
    }

    /// Zero-based position, for dense storage.
    pub fn index(&self) -> usize {
        self.0 - 1
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Directed edge `(from, to)` with `from != to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
}

impl Edge {
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.from, self.to)
    }
}

/// Read-only TSP instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    name: String,
    comment: Option<String>,
    weight_type: EdgeWeightType,
    coordinates: Vec<Point>,
    /// Row-major `n x n` matrix; the diagonal is unused.
    weights: Vec<f64>,
    node_count: usize,
}

impl Instance {
    /// Build an instance whose weights are derived from coordinates.
    ///
    /// Node `k` (1-based) takes `coordinates[k - 1]`.
    pub fn from_coordinates(
        name: impl Into<String>,
        weight_type: EdgeWeightType,
        coordinates: Vec<Point>,
    ) -> TspResult<Self> {
        if !weight_type.is_coordinate_based() {
            return Err(TspError::Validation(
                "explicit weight type requires a weight matrix, not coordinates".into(),
            ));
        }
        let n = coordinates.len();
        let mut weights = vec![0.0; n * n];
        for (i, a) in coordinates.iter().enumerate() {
            for (j, b) in coordinates.iter().enumerate() {
                if i != j {
                    // Coordinate-based types always yield a distance
                    weights[i * n + j] = weight_type.distance(*a, *b).unwrap_or(f64::NAN);
                }
            }
        }
        Ok(Self {
            name: name.into(),
            comment: None,
            weight_type,
            coordinates,
            weights,
            node_count: n,
        })
    }

    /// Build an instance from a full square weight matrix.
    ///
    /// `NaN` entries off the diagonal are treated as missing weights and are
    /// reported by [`Instance::validate_for_tour`].
    pub fn from_matrix(name: impl Into<String>, matrix: Vec<Vec<f64>>) -> TspResult<Self> {
        let n = matrix.len();
        if let Some((row, values)) = matrix.iter().enumerate().find(|(_, r)| r.len() != n) {
            return Err(TspError::Validation(format!(
                "weight matrix must be square: row {} has {} entries, expected {}",
                row + 1,
                values.len(),
                n
            )));
        }
        Ok(Self {
            name: name.into(),
            comment: None,
            weight_type: EdgeWeightType::Explicit,
            coordinates: Vec::new(),
            weights: matrix.into_iter().flatten().collect(),
            node_count: n,
        })
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without any leading directory components.
    pub fn short_name(&self) -> &str {
        self.name.rsplit(['/', '\\']).next().unwrap_or(&self.name)
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn weight_type(&self) -> EdgeWeightType {
        self.weight_type
    }

    /// Coordinates by node, empty for explicit instances.
    pub fn coordinates(&self) -> &[Point] {
        &self.coordinates
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn depot(&self) -> NodeId {
        NodeId::DEPOT
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (1..=self.node_count).map(NodeId)
    }

    /// All nodes except the depot, in increasing order.
    pub fn non_depot_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (2..=self.node_count).map(NodeId)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        node.0 >= 1 && node.0 <= self.node_count
    }

    /// Every ordered pair of distinct nodes.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.nodes().flat_map(move |i| {
            self.nodes()
                .filter(move |j| *j != i)
                .map(move |j| Edge::new(i, j))
        })
    }

    pub fn edge_count(&self) -> usize {
        self.node_count * self.node_count.saturating_sub(1)
    }

    /// Weight of the directed edge `(from, to)`.
    ///
    /// Returns `NaN` for self-loops and nodes outside the instance.
    pub fn weight(&self, from: NodeId, to: NodeId) -> f64 {
        if from == to || !self.contains(from) || !self.contains(to) {
            return f64::NAN;
        }
        self.weights[from.index() * self.node_count + to.index()]
    }

    /// Whether `w(i,j) == w(j,i)` for every pair.
    pub fn is_symmetric(&self) -> bool {
        self.edges()
            .all(|e| self.weight(e.from, e.to) == self.weight(e.to, e.from))
    }

    /// Check that the instance admits a Hamiltonian cycle model.
    ///
    /// Requires at least three nodes and a finite, non-negative weight on
    /// every edge.
    pub fn validate_for_tour(&self) -> TspResult<()> {
        if self.node_count < 3 {
            return Err(TspError::Validation(format!(
                "instance '{}' has {} node(s); a tour needs at least 3",
                self.name, self.node_count
            )));
        }
        for edge in self.edges() {
            let w = self.weight(edge.from, edge.to);
            if !w.is_finite() {
                return Err(TspError::Validation(format!(
                    "edge {edge} of instance '{}' has no weight",
                    self.name
                )));
            }
            if w < 0.0 {
                return Err(TspError::Validation(format!(
                    "edge {edge} of instance '{}' has negative weight {w}",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Total weight of a closed tour visiting `order` then returning home.
    pub fn tour_length(&self, order: &[NodeId]) -> f64 {
        if order.len() < 2 {
            return 0.0;
        }
        order
            .iter()
            .zip(order.iter().cycle().skip(1))
            .map(|(a, b)| self.weight(*a, *b))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Instance {
        Instance::from_coordinates(
            "square",
            EdgeWeightType::Euc2d,
            vec![
                Point::new(0.0, 0.0),
                Point::new(0.0, 3.0),
                Point::new(4.0, 3.0),
                Point::new(4.0, 0.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn edges_are_all_ordered_pairs() {
        let inst = square();
        assert_eq!(inst.edges().count(), 12);
        assert_eq!(inst.edge_count(), 12);
        assert!(inst.edges().all(|e| e.from != e.to));
    }

    #[test]
    fn weights_follow_coordinates() {
        let inst = square();
        assert_eq!(inst.weight(NodeId(1), NodeId(2)), 3.0);
        assert_eq!(inst.weight(NodeId(1), NodeId(3)), 5.0);
        assert!(inst.weight(NodeId(1), NodeId(1)).is_nan());
        assert!(inst.weight(NodeId(1), NodeId(9)).is_nan());
        assert!(inst.is_symmetric());
    }

    #[test]
    fn non_depot_nodes_skip_root() {
        let inst = square();
        let rest: Vec<_> = inst.non_depot_nodes().collect();
        assert_eq!(rest, vec![NodeId(2), NodeId(3), NodeId(4)]);
        assert!(inst.depot().is_depot());
    }

    #[test]
    fn tour_length_closes_the_cycle() {
        let inst = square();
        let order = [NodeId(1), NodeId(2), NodeId(3), NodeId(4)];
        assert_eq!(inst.tour_length(&order), 14.0);
    }

    #[test]
    fn two_nodes_cannot_form_a_tour() {
        let inst = Instance::from_matrix("pair", vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        assert!(matches!(
            inst.validate_for_tour(),
            Err(TspError::Validation(_))
        ));
    }

    #[test]
    fn missing_weight_is_rejected() {
        let inst = Instance::from_matrix(
            "gap",
            vec![
                vec![0.0, 1.0, 2.0],
                vec![1.0, 0.0, f64::NAN],
                vec![2.0, 1.0, 0.0],
            ],
        )
        .unwrap();
        let err = inst.validate_for_tour().unwrap_err();
        assert!(err.to_string().contains("(2,3)"));
    }

    #[test]
    fn ragged_matrix_is_rejected() {
        let result = Instance::from_matrix("ragged", vec![vec![0.0, 1.0], vec![1.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn short_name_strips_directories() {
        let inst = square().with_name("instances/5_1.tsp");
        assert_eq!(inst.short_name(), "5_1.tsp");
    }
}
