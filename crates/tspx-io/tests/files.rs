//! Generated instance files and result logs read back from disk.

use std::fs;

use tspx_core::{EdgeWeightType, RelaxedRecord, SolveStatus};
use tspx_io::{
    average_runtime, comparison_points, generate_tsp_file, parse_tsplib_file,
    read_integer_records, read_relaxed_records, summarize, GeneratorConfig, Metric,
};

#[test]
fn generated_file_parses_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("12_3.tsp");
    let config = GeneratorConfig::default().with_seed(3);
    let written = generate_tsp_file(&path, 12, &config, &mut config.rng()).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("COMMENT: 12-Staedte in Burma (Zaw Win)"));
    assert!(text.trim_end().ends_with("EOF"));

    let read = parse_tsplib_file(&path).unwrap();
    assert_eq!(read.node_count(), 12);
    assert_eq!(read.weight_type(), EdgeWeightType::Geo);
    assert_eq!(read.name(), path.display().to_string());
    assert_eq!(read.coordinates(), written.coordinates());
}

#[test]
fn integer_log_with_padding_and_nan() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results_no_relaxed.txt");
    fs::write(
        &path,
        "MTZ, a.tsp, 5, optimal, 10, 10, 0, 0.5\n\
         MTZ,b.tsp,5,time_limit,NaN,NaN,NaN,2\n\
         DFJ,a.tsp,5,optimal,10,10,0,0.25\n",
    )
    .unwrap();

    let rows = read_integer_records(&path).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].instance, "a.tsp");
    assert_eq!(rows[1].status, SolveStatus::TimeLimit);
    assert!(rows[1].objective.is_nan());

    let mtz: Vec<_> = rows.iter().filter(|r| r.formulation == "MTZ").cloned().collect();
    assert_eq!(average_runtime(&mtz, 5), Some(1.25));

    let summary = summarize(&rows);
    let mtz_row = summary.iter().find(|s| s.formulation == "MTZ").unwrap();
    assert_eq!(mtz_row.runs, 2);
    assert_eq!(mtz_row.optimal, Some(1));

    let points = comparison_points(&rows, "DFJ", "MTZ", Metric::Runtime, &[]).unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!((points[0].x, points[0].y), (0.25, 0.5));
}

#[test]
fn malformed_relaxed_log_names_the_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results_relaxed.txt");
    fs::write(&path, "MTZ,a.tsp,5,9.5,0.1\nMTZ,b.tsp,five,9.5,0.1\n").unwrap();

    let err = read_relaxed_records(&path).unwrap_err();
    assert!(format!("{err:#}").contains("row 2"));
}

#[test]
fn missing_log_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_integer_records(&dir.path().join("absent.txt")).is_err());
}

#[test]
fn quoted_instance_names_read_back_from_a_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results_relaxed.txt");
    let record = RelaxedRecord {
        formulation: "Log_Lex".into(),
        instance: "batch 3, retry/5_1.tsp".into(),
        node_count: 5,
        objective: 9.5,
        runtime: 0.1,
    };
    let line = record.to_line().unwrap();
    fs::write(&path, format!("{line}\nMTZ,a.tsp,5,9.0,0.2\n")).unwrap();

    let rows = read_relaxed_records(&path).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], record);
    assert_eq!(rows[1].instance, "a.tsp");
}
