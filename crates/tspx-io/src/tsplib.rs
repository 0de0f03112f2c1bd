//! TSPLIB instance files
//!
//! Reads and writes the subset of TSPLIB 95 used by the workbench:
//!
//! - `NODE_COORD_SECTION` with `EUC_2D`, `CEIL_2D`, `ATT` or `GEO` weights
//! - `EDGE_WEIGHT_SECTION` with `EDGE_WEIGHT_TYPE: EXPLICIT` and
//!   `EDGE_WEIGHT_FORMAT: FULL_MATRIX`
//!
//! `DISPLAY_DATA_SECTION` is skipped and the trailing `EOF` is optional.

use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

use tspx_core::{EdgeWeightType, Instance, Point};

/// Header part of a TSPLIB file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TsplibHeader {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub comment: Option<String>,
    pub dimension: Option<usize>,
    pub weight_type: Option<EdgeWeightType>,
    pub weight_format: Option<String>,
    pub display_data_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    NodeCoords,
    EdgeWeights,
    Skipped,
}

/// Parse a TSPLIB file; the instance is named after `NAME`, or the path.
pub fn parse_tsplib_file(path: &Path) -> Result<Instance> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading TSPLIB file: {}", path.display()))?;
    let instance = parse_tsplib_str(&content)
        .with_context(|| format!("parsing TSPLIB file: {}", path.display()))?;
    if instance.name().is_empty() {
        return Ok(instance.with_name(path.display().to_string()));
    }
    Ok(instance)
}

/// Parse TSPLIB content from a string.
pub fn parse_tsplib_str(content: &str) -> Result<Instance> {
    let mut header = TsplibHeader::default();
    let mut section = Section::Header;
    let mut coords: Vec<Option<Point>> = Vec::new();
    let mut weights: Vec<f64> = Vec::new();

    for (line_no, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line == "EOF" {
            break;
        }

        // Section keywords switch state from anywhere
        match line.split_whitespace().next().unwrap_or_default() {
            "NODE_COORD_SECTION" => {
                let n = header
                    .dimension
                    .ok_or_else(|| anyhow!("NODE_COORD_SECTION before DIMENSION"))?;
                coords = vec![None; n];
                section = Section::NodeCoords;
                continue;
            }
            "EDGE_WEIGHT_SECTION" => {
                section = Section::EdgeWeights;
                continue;
            }
            "DISPLAY_DATA_SECTION" | "TOUR_SECTION" | "FIXED_EDGES_SECTION" => {
                section = Section::Skipped;
                continue;
            }
            _ => {}
        }

        match section {
            Section::Header => parse_header_line(&mut header, line)
                .with_context(|| format!("line {}", line_no + 1))?,
            Section::NodeCoords => parse_coord_line(&mut coords, line)
                .with_context(|| format!("line {}", line_no + 1))?,
            Section::EdgeWeights => {
                for token in line.split_whitespace() {
                    let value: f64 = token.parse().with_context(|| {
                        format!("line {}: invalid edge weight '{token}'", line_no + 1)
                    })?;
                    weights.push(value);
                }
            }
            Section::Skipped => {}
        }
    }

    build_instance(header, coords, weights)
}

fn parse_header_line(header: &mut TsplibHeader, line: &str) -> Result<()> {
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| anyhow!("expected 'KEY: VALUE', found '{line}'"))?;
    let value = value.trim().to_string();
    match key.trim().to_ascii_uppercase().as_str() {
        "NAME" => header.name = Some(value),
        "TYPE" => header.kind = Some(value),
        "COMMENT" => header.comment = Some(value),
        "DIMENSION" => {
            let n = value
                .parse()
                .with_context(|| format!("invalid DIMENSION '{value}'"))?;
            header.dimension = Some(n);
        }
        "EDGE_WEIGHT_TYPE" => header.weight_type = Some(value.parse()?),
        "EDGE_WEIGHT_FORMAT" => header.weight_format = Some(value.to_ascii_uppercase()),
        "DISPLAY_DATA_TYPE" => header.display_data_type = Some(value),
        // CAPACITY, NODE_COORD_TYPE and friends carry nothing we model
        _ => {}
    }
    Ok(())
}

fn parse_coord_line(coords: &mut [Option<Point>], line: &str) -> Result<()> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 3 {
        bail!("expected 'id x y', found '{line}'");
    }
    let id: usize = fields[0]
        .parse()
        .with_context(|| format!("invalid node id '{}'", fields[0]))?;
    let x: f64 = fields[1]
        .parse()
        .with_context(|| format!("invalid x coordinate '{}'", fields[1]))?;
    let y: f64 = fields[2]
        .parse()
        .with_context(|| format!("invalid y coordinate '{}'", fields[2]))?;
    let len = coords.len();
    let slot = id
        .checked_sub(1)
        .and_then(|i| coords.get_mut(i))
        .ok_or_else(|| anyhow!("node id {id} outside 1..={len}"))?;
    if slot.is_some() {
        bail!("node {id} listed twice");
    }
    *slot = Some(Point::new(x, y));
    Ok(())
}

fn build_instance(
    header: TsplibHeader,
    coords: Vec<Option<Point>>,
    weights: Vec<f64>,
) -> Result<Instance> {
    if let Some(kind) = header.kind.as_deref() {
        let kind = kind.to_ascii_uppercase();
        if kind != "TSP" && kind != "ATSP" {
            bail!("unsupported TYPE '{kind}'; only TSP and ATSP are modeled");
        }
    }
    let n = header
        .dimension
        .ok_or_else(|| anyhow!("missing DIMENSION"))?;
    let weight_type = header
        .weight_type
        .ok_or_else(|| anyhow!("missing EDGE_WEIGHT_TYPE"))?;
    let name = header.name.unwrap_or_default();

    let instance = if weight_type.is_coordinate_based() {
        if coords.len() != n {
            bail!("missing NODE_COORD_SECTION");
        }
        let points = coords
            .into_iter()
            .enumerate()
            .map(|(i, p)| p.ok_or_else(|| anyhow!("node {} has no coordinates", i + 1)))
            .collect::<Result<Vec<_>>>()?;
        Instance::from_coordinates(name, weight_type, points)?
    } else {
        match header.weight_format.as_deref() {
            Some("FULL_MATRIX") | None => {}
            Some(other) => bail!("unsupported EDGE_WEIGHT_FORMAT '{other}'; expected FULL_MATRIX"),
        }
        if weights.len() != n * n {
            bail!(
                "EDGE_WEIGHT_SECTION has {} values, FULL_MATRIX of dimension {n} needs {}",
                weights.len(),
                n * n
            );
        }
        let matrix = weights.chunks(n).map(<[f64]>::to_vec).collect();
        Instance::from_matrix(name, matrix)?
    };

    Ok(match header.comment {
        Some(comment) => instance.with_comment(comment),
        None => instance,
    })
}

/// Write an instance in TSPLIB form.
pub fn write_tsplib<W: Write>(instance: &Instance, out: &mut W) -> Result<()> {
    let n = instance.node_count();
    writeln!(out, "NAME: {}", instance.name())?;
    writeln!(out, "TYPE: TSP")?;
    if let Some(comment) = instance.comment() {
        writeln!(out, "COMMENT: {comment}")?;
    }
    writeln!(out, "DIMENSION: {n}")?;
    writeln!(out, "EDGE_WEIGHT_TYPE: {}", instance.weight_type())?;

    if instance.weight_type().is_coordinate_based() {
        writeln!(out, "EDGE_WEIGHT_FORMAT: FUNCTION")?;
        writeln!(out, "DISPLAY_DATA_TYPE: COORD_DISPLAY")?;
        writeln!(out, "NODE_COORD_SECTION")?;
        for (i, p) in instance.coordinates().iter().enumerate() {
            writeln!(out, "{} {} {}", i + 1, p.x, p.y)?;
        }
    } else {
        writeln!(out, "EDGE_WEIGHT_FORMAT: FULL_MATRIX")?;
        writeln!(out, "EDGE_WEIGHT_SECTION")?;
        for from in instance.nodes() {
            let row: Vec<String> = instance
                .nodes()
                .map(|to| {
                    if from == to {
                        "0".to_string()
                    } else {
                        instance.weight(from, to).to_string()
                    }
                })
                .collect();
            writeln!(out, "{}", row.join(" "))?;
        }
    }
    writeln!(out, "EOF")?;
    Ok(())
}

/// Write an instance to `path`, creating parent directories.
pub fn write_tsplib_file(instance: &Instance, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let mut file =
        fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_tsplib(instance, &mut file).with_context(|| format!("writing {}", path.display()))
}
