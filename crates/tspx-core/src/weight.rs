//! Edge-weight functions for coordinate instances.
//!
//! Follows the TSPLIB conventions (Reinelt, 1991): distances are rounded with
//! `nint(x) = floor(x + 0.5)` and `GEO` coordinates are `DDD.MM` degrees and
//! minutes on an idealized sphere of radius 6378.388 km.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TspError;

/// Radius used by TSPLIB for `GEO` distances.
const GEO_RADIUS_KM: f64 = 6378.388;
/// TSPLIB truncates pi for `GEO` conversions.
const GEO_PI: f64 = 3.141592;

/// A planar (or geographical) coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// How the weight `w(i,j)` is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeWeightType {
    /// Rounded Euclidean distance
    Euc2d,
    /// Euclidean distance rounded up
    Ceil2d,
    /// Pseudo-Euclidean distance (att48 family)
    Att,
    /// Great-circle distance on `DDD.MM` coordinates
    Geo,
    /// Weights are given as a matrix, not derived from coordinates
    Explicit,
}

impl EdgeWeightType {
    /// TSPLIB keyword for this weight type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeWeightType::Euc2d => "EUC_2D",
            EdgeWeightType::Ceil2d => "CEIL_2D",
            EdgeWeightType::Att => "ATT",
            EdgeWeightType::Geo => "GEO",
            EdgeWeightType::Explicit => "EXPLICIT",
        }
    }

    /// Whether weights are computed from node coordinates.
    pub fn is_coordinate_based(&self) -> bool {
        !matches!(self, EdgeWeightType::Explicit)
    }

    /// Distance between two coordinates, or `None` for explicit weights.
    pub fn distance(&self, a: Point, b: Point) -> Option<f64> {
        match self {
            EdgeWeightType::Euc2d => Some(nint(euclidean(a, b))),
            EdgeWeightType::Ceil2d => Some(euclidean(a, b).ceil()),
            EdgeWeightType::Att => Some(att_distance(a, b)),
            EdgeWeightType::Geo => Some(geo_distance(a, b)),
            EdgeWeightType::Explicit => None,
        }
    }
}

impl fmt::Display for EdgeWeightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeWeightType {
    type Err = TspError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EUC_2D" => Ok(EdgeWeightType::Euc2d),
            "CEIL_2D" => Ok(EdgeWeightType::Ceil2d),
            "ATT" => Ok(EdgeWeightType::Att),
            "GEO" => Ok(EdgeWeightType::Geo),
            "EXPLICIT" => Ok(EdgeWeightType::Explicit),
            other => Err(TspError::Parse(format!(
                "unsupported EDGE_WEIGHT_TYPE '{other}'; supported values: EUC_2D, CEIL_2D, ATT, GEO, EXPLICIT"
            ))),
        }
    }
}

/// Nearest integer, TSPLIB style.
pub fn nint(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Unrounded Euclidean distance.
pub fn euclidean(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

fn att_distance(a: Point, b: Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let r = ((dx * dx + dy * dy) / 10.0).sqrt();
    let t = nint(r);
    if t < r {
        t + 1.0
    } else {
        t
    }
}

/// Convert a `DDD.MM` coordinate to radians.
fn geo_radians(value: f64) -> f64 {
    let degrees = value.trunc();
    let minutes = value - degrees;
    GEO_PI * (degrees + 5.0 * minutes / 3.0) / 180.0
}

fn geo_distance(a: Point, b: Point) -> f64 {
    let (lat_a, lon_a) = (geo_radians(a.x), geo_radians(a.y));
    let (lat_b, lon_b) = (geo_radians(b.x), geo_radians(b.y));
    let q1 = (lon_a - lon_b).cos();
    let q2 = (lat_a - lat_b).cos();
    let q3 = (lat_a + lat_b).cos();
    let arg = (0.5 * ((1.0 + q1) * q2 - (1.0 - q1) * q3)).clamp(-1.0, 1.0);
    (GEO_RADIUS_KM * arg.acos() + 1.0).trunc()
}
