//! End-to-end solves of every formulation with the default backend.

use std::fs;

use tspx_algo::backend::MicroLpBackend;
use tspx_algo::formulation::{Formulation, FormulationKind, SolveReport};
use tspx_algo::test_utils::{
    brute_force_optimum, integer_instance, satisfies_assignment, unit_square, ScriptedBackend,
};
use tspx_algo::{FormulationError, ResultLog, SessionConfig, SolverSession};
use tspx_core::{Instance, IntegerRecord, NodeId, RelaxedRecord, SolveStatus};

const TOL: f64 = 1e-6;

fn solve(instance: &Instance, kind: FormulationKind, log: &ResultLog) -> SolveReport {
    let session =
        SolverSession::open(Box::new(MicroLpBackend), SessionConfig::new("test", 60.0)).unwrap();
    Formulation::new(instance, kind.strategy(), session)
        .unwrap()
        .solve(log)
        .unwrap()
}

#[test]
fn unit_square_is_solved_by_every_formulation() {
    let dir = tempfile::tempdir().unwrap();
    let log = ResultLog::in_dir(dir.path());
    let square = unit_square();

    for kind in FormulationKind::ALL {
        let report = solve(&square, kind, &log);
        assert_eq!(report.integer.status, SolveStatus::Optimal, "{kind}");
        assert!((report.integer.objective - 4.0).abs() < TOL, "{kind}");
        assert!(report.relaxed.objective <= 4.0 + TOL, "{kind}");
        assert!(satisfies_assignment(&square, &report.selected_edges), "{kind}");

        let tour = report.tour.expect("single cycle");
        assert_eq!(tour.len(), 4);
        assert_eq!(tour[0], NodeId::DEPOT);
        assert!((square.tour_length(&tour) - 4.0).abs() < TOL);
    }
}

#[test]
fn two_nodes_are_rejected_before_solving() {
    let pair = Instance::from_matrix("pair", vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
    for kind in FormulationKind::ALL {
        let session =
            SolverSession::open(Box::new(MicroLpBackend), SessionConfig::new("test", 60.0))
                .unwrap();
        let result = Formulation::new(&pair, kind.strategy(), session);
        assert!(
            matches!(result, Err(FormulationError::ModelBuild(_))),
            "{kind} accepted a two-node instance"
        );
    }
}

fn relaxed_of(reports: &[(FormulationKind, SolveReport)], wanted: FormulationKind) -> f64 {
    reports
        .iter()
        .find(|(kind, _)| *kind == wanted)
        .map(|(_, r)| r.relaxed.objective)
        .unwrap()
}

fn solve_all(instance: &Instance, log: &ResultLog) -> Vec<(FormulationKind, SolveReport)> {
    FormulationKind::ALL
        .into_iter()
        .map(|kind| (kind, solve(instance, kind, log)))
        .collect()
}

#[test]
fn formulations_agree_with_enumeration() {
    let dir = tempfile::tempdir().unwrap();
    let log = ResultLog::in_dir(dir.path());

    let instances = (0..3)
        .map(|seed| integer_instance(5, seed))
        .chain([integer_instance(6, 4), integer_instance(7, 2)]);
    for instance in instances {
        let optimum = brute_force_optimum(&instance);
        for (kind, report) in solve_all(&instance, &log) {
            assert_eq!(report.integer.status, SolveStatus::Optimal, "{kind}");
            assert!(
                (report.integer.objective - optimum).abs() < TOL,
                "{kind} on {}: {} vs {optimum}",
                instance.name(),
                report.integer.objective
            );
            assert!(satisfies_assignment(&instance, &report.selected_edges));
            assert!(
                report.tour.is_some(),
                "{kind} on {} left a sub-tour",
                instance.name()
            );
        }
    }
}

#[test]
fn relaxations_bound_the_optimum() {
    let dir = tempfile::tempdir().unwrap();
    let log = ResultLog::in_dir(dir.path());
    let reports = solve_all(&integer_instance(5, 7), &log);

    for (kind, report) in &reports {
        assert!(
            report.relaxed.objective <= report.integer.objective + TOL,
            "{kind}: relaxed {} above integer {}",
            report.relaxed.objective,
            report.integer.objective
        );
    }
    let mtz = relaxed_of(&reports, FormulationKind::Mtz);
    assert!(relaxed_of(&reports, FormulationKind::Dfj) >= mtz - TOL);
    assert!(relaxed_of(&reports, FormulationKind::MultiCommodity) >= mtz - TOL);
}

#[test]
fn relaxation_strength_follows_the_known_order() {
    let dir = tempfile::tempdir().unwrap();
    let log = ResultLog::in_dir(dir.path());

    for instance in [integer_instance(6, 4), integer_instance(7, 2)] {
        let reports = solve_all(&instance, &log);
        let dfj = relaxed_of(&reports, FormulationKind::Dfj);
        let mcf = relaxed_of(&reports, FormulationKind::MultiCommodity);
        let scf = relaxed_of(&reports, FormulationKind::SingleCommodity);
        let mtz = relaxed_of(&reports, FormulationKind::Mtz);
        let name = instance.name();

        assert!(dfj >= mcf - TOL, "{name}: DFJ {dfj} below MCF {mcf}");
        assert!(mcf >= scf - TOL, "{name}: MCF {mcf} below SCF {scf}");
        assert!(scf >= mtz - TOL, "{name}: SCF {scf} below MTZ {mtz}");
        // multi-commodity flow projects onto the subtour polytope
        assert!((mcf - dfj).abs() < TOL, "{name}: MCF {mcf} vs DFJ {dfj}");
    }
}

#[test]
fn repeated_runs_give_the_same_objective() {
    let dir = tempfile::tempdir().unwrap();
    let log = ResultLog::in_dir(dir.path());
    let instance = integer_instance(5, 11);

    for kind in [FormulationKind::Mtz, FormulationKind::LogLex] {
        let first = solve(&instance, kind, &log);
        let second = solve(&instance, kind, &log);
        assert!((first.integer.objective - second.integer.objective).abs() < TOL);
        assert!((first.relaxed.objective - second.relaxed.objective).abs() < TOL);
    }
}

#[test]
fn every_solve_appends_one_line_to_each_log() {
    let dir = tempfile::tempdir().unwrap();
    let log = ResultLog::in_dir(dir.path());
    let instance = integer_instance(4, 2).with_name("instances/4_2.tsp");

    for kind in FormulationKind::ALL {
        solve(&instance, kind, &log);
    }

    let integer = fs::read_to_string(log.integer_path()).unwrap();
    let relaxed = fs::read_to_string(log.relaxed_path()).unwrap();
    let integer: Vec<IntegerRecord> = integer.lines().map(|l| l.parse().unwrap()).collect();
    let relaxed: Vec<RelaxedRecord> = relaxed.lines().map(|l| l.parse().unwrap()).collect();
    assert_eq!(integer.len(), 5);
    assert_eq!(relaxed.len(), 5);

    let names: Vec<&str> = integer.iter().map(|r| r.formulation.as_str()).collect();
    assert_eq!(
        names,
        vec!["DFJ", "MTZ", "Single_Commodity", "Multi_Commodity", "Log_Lex"]
    );
    assert!(integer.iter().all(|r| r.instance == "instances/4_2.tsp"));
    assert!(integer.iter().all(|r| r.node_count == 4));
}

#[test]
fn time_limit_is_reported_not_raised() {
    let dir = tempfile::tempdir().unwrap();
    let log = ResultLog::in_dir(dir.path());
    let instance = integer_instance(5, 0);

    let backend = ScriptedBackend::new(SolveStatus::TimeLimit);
    let calls = backend.calls();
    let session = SolverSession::open(Box::new(backend), SessionConfig::new("test", 2.5)).unwrap();
    let report = Formulation::new(&instance, FormulationKind::Dfj.strategy(), session)
        .unwrap()
        .solve(&log)
        .unwrap();

    assert_eq!(report.integer.status, SolveStatus::TimeLimit);
    assert!(report.integer.objective.is_nan());
    assert!(report.integer.bound.is_nan());
    assert!(report.relaxed.objective.is_nan());
    assert!(report.selected_edges.is_empty());
    assert_eq!(report.tour, None);

    let line = fs::read_to_string(log.integer_path()).unwrap();
    assert!(line.starts_with("DFJ,int_5_0,5,time_limit,NaN,NaN,NaN,"));

    // integer solve, then relaxed solve, both with the session parameters
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|p| p.threads == 1 && p.time_limit == 2.5));
    assert!(calls.iter().all(|p| !p.heuristics && !p.cuts));
}

#[test]
fn microlp_stops_at_the_time_limit() {
    let dir = tempfile::tempdir().unwrap();
    let log = ResultLog::in_dir(dir.path());
    let instance = integer_instance(14, 3);

    let session =
        SolverSession::open(Box::new(MicroLpBackend), SessionConfig::new("test", 0.001)).unwrap();
    let report = Formulation::new(&instance, FormulationKind::MultiCommodity.strategy(), session)
        .unwrap()
        .solve(&log)
        .unwrap();

    assert_eq!(report.integer.status, SolveStatus::TimeLimit);
    assert!(report.integer.runtime < 30.0);
    let line = fs::read_to_string(log.integer_path()).unwrap();
    assert!(line.starts_with("Multi_Commodity,int_14_3,14,time_limit,"));
}

#[test]
fn infeasible_status_flows_into_records() {
    let dir = tempfile::tempdir().unwrap();
    let log = ResultLog::in_dir(dir.path());
    let instance = integer_instance(4, 0);

    let session = SolverSession::open(
        Box::new(ScriptedBackend::new(SolveStatus::Infeasible)),
        SessionConfig::new("test", 10.0),
    )
    .unwrap();
    let report = Formulation::new(&instance, FormulationKind::Mtz.strategy(), session)
        .unwrap()
        .solve(&log)
        .unwrap();
    assert_eq!(report.integer.status, SolveStatus::Infeasible);
}
