//! # tspx-core: TSP instance model
//!
//! Shared data structures for the formulation workbench:
//!
//! - [`Instance`] - immutable node set `1..=n`, directed edges, weight matrix
//! - [`NodeId`] / [`Edge`] - typed identifiers; node `1` is the depot
//! - [`EdgeWeightType`] - TSPLIB distance functions (`EUC_2D`, `GEO`, ...)
//! - [`IntegerRecord`] / [`RelaxedRecord`] - one-line result records
//!
//! ## Quick Start
//!
//! ```rust
//! use tspx_core::{EdgeWeightType, Instance, NodeId, Point};
//!
//! let instance = Instance::from_coordinates(
//!     "triangle",
//!     EdgeWeightType::Euc2d,
//!     vec![Point::new(0.0, 0.0), Point::new(3.0, 0.0), Point::new(0.0, 4.0)],
//! )?;
//!
//! assert_eq!(instance.node_count(), 3);
//! assert_eq!(instance.weight(NodeId(2), NodeId(3)), 5.0);
//! # Ok::<(), tspx_core::TspError>(())
//! ```

pub mod error;
pub mod instance;
pub mod record;
pub mod weight;

pub use error::{TspError, TspResult};
pub use instance::{Edge, Instance, NodeId};
pub use record::{IntegerRecord, RelaxedRecord, SolveStatus};
pub use weight::{EdgeWeightType, Point};
