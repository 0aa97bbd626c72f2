//! End-to-end solves of every formulation with the default `good_lp` back-end.

use mbvst_algo::milp::{MilpModel, MilpOracle, OracleOutcome};
use mbvst_algo::test_utils::{bowtie, cycle, friendship, star, two_triangles};
use mbvst_algo::{
    check_solution, solve_formulation, FormulationConfig, FormulationError, FormulationKind,
    GoodLpOracle, OracleStatus,
};
use mbvst_core::{Graph, VertexId};
use std::time::Duration;

/// Real back-end whose answers are always downgraded to `Feasible`.
struct FeasibleOracle;

impl MilpOracle for FeasibleOracle {
    fn id(&self) -> &str {
        "feasible"
    }

    fn solve(&self, model: &MilpModel, time_budget: Duration) -> OracleOutcome {
        let outcome = GoodLpOracle::default().solve(model, time_budget);
        match outcome.assignment() {
            Some(assignment) => OracleOutcome::feasible(assignment.clone(), outcome.solve_time()),
            None => outcome,
        }
    }
}

fn solve_all(graph: &Graph, expected_branches: f64) {
    let oracle = GoodLpOracle::default();
    let config = FormulationConfig::default();
    for kind in FormulationKind::ALL {
        let formulation = kind.formulation();
        let solution = solve_formulation(formulation.as_ref(), graph, &oracle, &config)
            .unwrap_or_else(|err| panic!("{kind} failed: {err}"));
        assert_eq!(solution.status, OracleStatus::Optimal, "{kind}");
        assert!(
            (solution.objective - expected_branches).abs() < 1e-6,
            "{kind}: objective {} != {}",
            solution.objective,
            expected_branches
        );
        assert_eq!(solution.selected_edges().len(), graph.vertex_count() - 1, "{kind}");
        let check = check_solution(graph, &solution);
        assert!(check.is_valid(), "{kind}: {check:?}");
        assert_eq!(check.branch_vertices.len() as f64, expected_branches, "{kind}");
    }
}

#[test]
fn four_cycle_becomes_a_path() {
    solve_all(&cycle(4), 0.0);
}

#[test]
fn bowtie_has_a_hamiltonian_path() {
    solve_all(&bowtie(), 0.0);
}

#[test]
fn friendship_graph_needs_its_centre() {
    let graph = friendship(3);
    solve_all(&graph, 1.0);

    let solution = solve_formulation(
        FormulationKind::SingleFlow.formulation().as_ref(),
        &graph,
        &GoodLpOracle::default(),
        &FormulationConfig::default(),
    )
    .unwrap();
    assert_eq!(solution.branch_vertices(), vec![VertexId::new(1)]);
}

#[test]
fn star_keeps_its_centre() {
    solve_all(&star(5), 1.0);
}

#[test]
fn feasible_status_is_passed_through() {
    let graph = cycle(4);
    for kind in FormulationKind::ALL {
        let solution = solve_formulation(
            kind.formulation().as_ref(),
            &graph,
            &FeasibleOracle,
            &FormulationConfig::default(),
        )
        .unwrap_or_else(|err| panic!("{kind} failed: {err}"));
        assert_eq!(solution.status, OracleStatus::Feasible, "{kind}");
        assert_eq!(solution.selected_edges().len(), 3, "{kind}");
        assert!(check_solution(&graph, &solution).is_valid(), "{kind}");
    }
}

#[test]
fn disconnected_input_surfaces_the_oracle_status() {
    let graph = two_triangles();
    for kind in FormulationKind::ALL {
        let err = solve_formulation(
            kind.formulation().as_ref(),
            &graph,
            &GoodLpOracle::default(),
            &FormulationConfig::default(),
        )
        .unwrap_err();
        assert!(
            matches!(
                err,
                FormulationError::NoSolution {
                    status: OracleStatus::NoSolution,
                    ..
                }
            ),
            "{kind}: {err}"
        );
    }
}

#[test]
fn empty_graph_is_rejected() {
    let err = solve_formulation(
        FormulationKind::Martin.formulation().as_ref(),
        &Graph::new(0),
        &GoodLpOracle::default(),
        &FormulationConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err, FormulationError::EmptyGraph);
}
