use anyhow::{bail, Result};
use std::path::Path;
use tracing::info;

use tspx_io::{generate_tsp_file, GeneratorConfig};

/// Write `count` instances per size as `<dir>/<n>_<k>.tsp`.
pub fn handle(sizes: &[usize], count: usize, dir: &Path, seed: Option<u64>) -> Result<()> {
    if let Some(&n) = sizes.iter().find(|&&n| n < 3) {
        bail!("instances need at least 3 nodes, got {n}");
    }
    let mut config = GeneratorConfig::default();
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    let mut rng = config.rng();
    for &n in sizes {
        for k in 1..=count {
            let path = dir.join(format!("{n}_{k}.tsp"));
            generate_tsp_file(&path, n, &config, &mut rng)?;
            println!("{}", path.display());
        }
        info!(nodes = n, count, "generated instances");
    }
    Ok(())
}
