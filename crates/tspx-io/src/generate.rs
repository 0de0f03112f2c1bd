//! Random instance generation
//!
//! Produces `GEO` instances with coordinates drawn uniformly from
//! `[-30, 30]` and rounded to two decimals. A seed makes a batch
//! reproducible.

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

use tspx_core::{EdgeWeightType, Instance, Point};

use crate::tsplib::write_tsplib_file;

/// Settings for random instances.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub min_coord: f64,
    pub max_coord: f64,
    /// Decimal places kept after rounding
    pub decimals: i32,
    /// `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_coord: -30.0,
            max_coord: 30.0,
            decimals: 2,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Draw one instance of `nodes` nodes.
pub fn random_instance<R: Rng>(
    name: &str,
    nodes: usize,
    config: &GeneratorConfig,
    rng: &mut R,
) -> Result<Instance> {
    if !(config.min_coord < config.max_coord) {
        bail!(
            "coordinate range [{}, {}] is empty",
            config.min_coord,
            config.max_coord
        );
    }
    let scale = 10f64.powi(config.decimals);
    let mut draw = || {
        let v: f64 = rng.gen_range(config.min_coord..config.max_coord);
        (v * scale).round() / scale
    };
    let points = (0..nodes)
        .map(|_| {
            let x = draw();
            let y = draw();
            Point::new(x, y)
        })
        .collect();
    let instance = Instance::from_coordinates(name, EdgeWeightType::Geo, points)?
        .with_comment(format!("{nodes}-Staedte in Burma (Zaw Win)"));
    Ok(instance)
}

/// Draw an instance and write it to `path`; `NAME` is the path itself.
pub fn generate_tsp_file<R: Rng>(
    path: &Path,
    nodes: usize,
    config: &GeneratorConfig,
    rng: &mut R,
) -> Result<Instance> {
    let instance = random_instance(&path.display().to_string(), nodes, config, rng)?;
    write_tsplib_file(&instance, path)?;
    Ok(instance)
}
