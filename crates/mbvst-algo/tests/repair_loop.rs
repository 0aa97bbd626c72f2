//! Repair loop behaviour with the real back-end and with scripted oracles.

use mbvst_algo::milp::{Assignment, MilpModel, MilpOracle, OracleOutcome};
use mbvst_algo::test_utils::{bowtie, cycle, friendship, grid, two_triangles};
use mbvst_algo::{
    check_solution, solve_by_cycles, CycleSolveError, CycleSolverConfig, GoodLpOracle, LoopStatus,
};
use mbvst_core::{EdgeKey, Graph, VertexId};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Oracle that never finds a solution.
struct FailingOracle;

impl MilpOracle for FailingOracle {
    fn id(&self) -> &str {
        "failing"
    }

    fn solve(&self, _model: &MilpModel, _time_budget: Duration) -> OracleOutcome {
        OracleOutcome::no_solution("scripted failure", Duration::ZERO)
    }
}

/// Real back-end whose answers are always downgraded to `Feasible`.
struct FeasibleOracle {
    calls: AtomicUsize,
}

impl MilpOracle for FeasibleOracle {
    fn id(&self) -> &str {
        "feasible"
    }

    fn solve(&self, model: &MilpModel, time_budget: Duration) -> OracleOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = GoodLpOracle::default().solve(model, time_budget);
        match outcome.assignment() {
            Some(assignment) => OracleOutcome::feasible(assignment.clone(), outcome.solve_time()),
            None => outcome,
        }
    }
}

/// Oracle that keeps exactly the `keep` edges, whatever the model says, and
/// fails from call `fail_from` onwards. Each call sleeps for `delay`.
struct PinnedOracle {
    keep: BTreeSet<EdgeKey>,
    fail_from: Option<usize>,
    delay: Duration,
    calls: AtomicUsize,
    budgets: Mutex<Vec<Duration>>,
}

impl PinnedOracle {
    fn new(keep: &[(usize, usize)]) -> Self {
        PinnedOracle {
            keep: keep.iter().map(|(a, b)| EdgeKey::from_pair(*a, *b)).collect(),
            fail_from: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            budgets: Mutex::new(Vec::new()),
        }
    }

    fn failing_from(mut self, call: usize) -> Self {
        self.fail_from = Some(call);
        self
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn arc_endpoints(name: &str) -> Option<EdgeKey> {
    let rest = name.strip_prefix("x_")?;
    let (a, b) = rest.split_once('_')?;
    Some(EdgeKey::from_pair(a.parse().ok()?, b.parse().ok()?))
}

impl MilpOracle for PinnedOracle {
    fn id(&self) -> &str {
        "pinned"
    }

    fn solve(&self, model: &MilpModel, time_budget: Duration) -> OracleOutcome {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.budgets.lock().unwrap().push(time_budget);
        std::thread::sleep(self.delay);
        if self.fail_from.is_some_and(|from| call >= from) {
            return OracleOutcome::no_solution("scripted failure", Duration::ZERO);
        }
        let values = model
            .variables()
            .iter()
            .map(|def| match arc_endpoints(&def.name) {
                Some(edge) if self.keep.contains(&edge) => 1.0,
                _ => 0.0,
            })
            .collect();
        OracleOutcome::optimal(Assignment::for_model(model, values), Duration::ZERO)
    }
}

/// 4-cycle 1-2-3-4 plus vertex 5 adjacent to 1 and 3.
fn kite() -> Graph {
    Graph::from_edges(5, [(1, 2), (2, 3), (3, 4), (4, 1), (1, 5), (3, 5)]).unwrap()
}

const KITE_CYCLE: [(usize, usize); 4] = [(1, 2), (2, 3), (3, 4), (1, 4)];

#[test]
fn four_cycle_loses_exactly_one_edge() {
    let graph = cycle(4);
    let report = solve_by_cycles(&graph, &GoodLpOracle::default(), &CycleSolverConfig::default()).unwrap();
    assert_eq!(report.status, LoopStatus::Tree);
    assert_eq!(report.iterations.len(), 1);
    assert_eq!(report.iterations[0].removed_edges.len(), 1);
    assert_eq!(report.graph.edge_count(), 3);
    assert!(report.graph.is_tree());
    assert_eq!(report.objective(), Some(0.0));
}

#[test]
fn bowtie_reaches_a_path() {
    let graph = bowtie();
    let report = solve_by_cycles(&graph, &GoodLpOracle::default(), &CycleSolverConfig::default()).unwrap();
    assert!(report.is_tree());
    assert_eq!(report.objective(), Some(0.0));
    assert!(report.graph.vertices().all(|v| report.graph.degree(v) <= 2));
}

#[test]
fn friendship_graph_reports_one_branch_vertex() {
    let graph = friendship(3);
    let report = solve_by_cycles(&graph, &GoodLpOracle::default(), &CycleSolverConfig::default()).unwrap();
    assert!(report.is_tree());
    assert_eq!(report.objective(), Some(1.0));
    let solution = report.solution.as_ref().unwrap();
    assert_eq!(solution.branch_vertices(), vec![VertexId::new(1)]);
    let check = check_solution(&graph, solution);
    assert!(check.is_valid(), "{check:?}");
}

#[test]
fn grid_iterations_keep_their_invariants() {
    let graph = grid(3, 3);
    let config = CycleSolverConfig {
        time_limit_secs: 60.0,
        iteration_time_limit_secs: 10.0,
        max_iterations: Some(6),
    };
    let report = solve_by_cycles(&graph, &GoodLpOracle::default(), &config).unwrap();
    assert!(matches!(report.status, LoopStatus::Tree | LoopStatus::IterationLimit));
    for record in &report.iterations {
        assert_eq!(record.selected_edges, graph.vertex_count() - 1);
        assert!(record.components_after_repair <= record.components_after_relax);
        assert!(record.added_edges.iter().all(|edge| graph.contains_edge(*edge)));
    }
    if report.is_tree() {
        let check = check_solution(&graph, report.solution.as_ref().unwrap());
        assert!(check.is_valid(), "{check:?}");
    }
}

#[test]
fn iteration_limit_returns_the_last_relaxed_graph() {
    let graph = kite();
    let oracle = PinnedOracle::new(&KITE_CYCLE);
    let config = CycleSolverConfig {
        max_iterations: Some(3),
        ..CycleSolverConfig::default()
    };
    let report = solve_by_cycles(&graph, &oracle, &config).unwrap();

    assert_eq!(report.status, LoopStatus::IterationLimit);
    assert_eq!(oracle.calls(), 3);
    assert_eq!(report.iterations.len(), 3);
    let repaired = [EdgeKey::from_pair(1, 5), EdgeKey::from_pair(3, 5)];
    for record in &report.iterations {
        assert_eq!(record.selected_edges, 4);
        assert_eq!(record.components_after_relax, 2);
        assert!(record.components_after_repair <= record.components_after_relax);
        assert!(record.added_edges.iter().all(|edge| graph.contains_edge(*edge)));
    }
    assert_eq!(report.iterations[0].added_edges, repaired);
    assert_eq!(report.iterations[1].added_edges, repaired);
    assert!(report.iterations[2].added_edges.is_empty());

    assert_eq!(report.graph.edge_count(), 4);
    assert_eq!(report.graph.component_count(), 2);
    assert!(!report.is_tree());

    // input graph untouched
    assert_eq!(graph.edge_count(), 6);
}

#[test]
fn tiny_budget_terminates_in_degraded_state() {
    let graph = kite();
    let oracle = PinnedOracle::new(&KITE_CYCLE);
    let config = CycleSolverConfig {
        time_limit_secs: 1e-9,
        iteration_time_limit_secs: 5.0,
        max_iterations: None,
    };
    let report = solve_by_cycles(&graph, &oracle, &config).unwrap();
    assert_eq!(report.status, LoopStatus::BudgetExhausted);
    assert_eq!(oracle.calls(), 1);
    assert_eq!(report.iterations.len(), 1);
    assert!(report.solution.is_some());
    assert!(!report.graph.is_connected());
}

#[test]
fn slow_oracle_exhausts_the_overall_budget() {
    let graph = kite();
    let oracle = PinnedOracle::new(&KITE_CYCLE).slow(Duration::from_millis(30));
    let config = CycleSolverConfig {
        time_limit_secs: 0.05,
        iteration_time_limit_secs: 1.0,
        max_iterations: None,
    };
    let report = solve_by_cycles(&graph, &oracle, &config).unwrap();
    assert_eq!(report.status, LoopStatus::BudgetExhausted);
    assert!(report.elapsed >= Duration::from_millis(50));
    let budgets = oracle.budgets.lock().unwrap();
    assert!(budgets.iter().all(|b| *b <= Duration::from_millis(50)));
    assert!(budgets.iter().skip(1).all(|b| *b < Duration::from_millis(50)));
}

#[test]
fn per_call_budget_never_exceeds_the_iteration_limit() {
    let graph = kite();
    let oracle = PinnedOracle::new(&KITE_CYCLE);
    let config = CycleSolverConfig {
        time_limit_secs: 60.0,
        iteration_time_limit_secs: 0.5,
        max_iterations: Some(2),
    };
    solve_by_cycles(&graph, &oracle, &config).unwrap();
    let budgets = oracle.budgets.lock().unwrap();
    assert_eq!(budgets.len(), 2);
    assert!(budgets.iter().all(|b| *b <= Duration::from_millis(500)));
}

#[test]
fn oracle_failure_keeps_the_previous_result() {
    let graph = kite();
    let oracle = PinnedOracle::new(&KITE_CYCLE).failing_from(2);
    let report = solve_by_cycles(&graph, &oracle, &CycleSolverConfig::default()).unwrap();
    assert_eq!(report.status, LoopStatus::OracleFailed);
    assert_eq!(report.iterations.len(), 1);
    assert_eq!(report.graph.edge_count(), 4);
    assert_eq!(report.solution.as_ref().unwrap().selected_edges().len(), 4);
}

#[test]
fn oracle_failure_on_first_call_returns_the_input_copy() {
    let graph = kite();
    let report = solve_by_cycles(&graph, &FailingOracle, &CycleSolverConfig::default()).unwrap();
    assert_eq!(report.status, LoopStatus::OracleFailed);
    assert!(report.solution.is_none());
    assert!(report.iterations.is_empty());
    assert_eq!(
        report.graph.edges().into_iter().collect::<Vec<_>>(),
        graph.edges().into_iter().collect::<Vec<_>>()
    );

    let (assignment, objective, graph_out) = report.into_parts();
    assert!(assignment.is_none());
    assert!(objective.is_none());
    assert_eq!(graph_out.edge_count(), 6);
}

#[test]
fn feasible_answers_are_not_used_by_the_loop() {
    let graph = cycle(4);
    let oracle = FeasibleOracle {
        calls: AtomicUsize::new(0),
    };
    let report = solve_by_cycles(&graph, &oracle, &CycleSolverConfig::default()).unwrap();
    assert_eq!(report.status, LoopStatus::OracleFailed);
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
    assert!(report.solution.is_none());
    assert!(report.iterations.is_empty());
    assert_eq!(
        report.graph.edges().into_iter().collect::<Vec<_>>(),
        graph.edges().into_iter().collect::<Vec<_>>()
    );
}

#[test]
fn disconnected_input_fails_fast() {
    let oracle = PinnedOracle::new(&[]);
    let err = solve_by_cycles(&two_triangles(), &oracle, &CycleSolverConfig::default()).unwrap_err();
    assert_eq!(err, CycleSolveError::Unreachable { components: 2 });
    assert_eq!(oracle.calls(), 0);

    // 4-cycle plus an isolated vertex 5
    let isolated = Graph::from_edges(5, [(1, 2), (2, 3), (3, 4), (4, 1)]).unwrap();
    let err = solve_by_cycles(&isolated, &oracle, &CycleSolverConfig::default()).unwrap_err();
    assert_eq!(err, CycleSolveError::Unreachable { components: 2 });
}

#[test]
fn empty_graph_and_bad_config_are_rejected() {
    let err = solve_by_cycles(&Graph::new(0), &FailingOracle, &CycleSolverConfig::default()).unwrap_err();
    assert_eq!(err, CycleSolveError::EmptyGraph);

    let config = CycleSolverConfig {
        time_limit_secs: -5.0,
        ..CycleSolverConfig::default()
    };
    let err = solve_by_cycles(&cycle(3), &FailingOracle, &config).unwrap_err();
    assert!(matches!(err, CycleSolveError::InvalidConfig(_)));
}

#[test]
fn tree_input_is_returned_unchanged() {
    let graph = Graph::from_edges(4, [(1, 2), (2, 3), (2, 4)]).unwrap();
    let report = solve_by_cycles(&graph, &GoodLpOracle::default(), &CycleSolverConfig::default()).unwrap();
    assert!(report.is_tree());
    assert_eq!(
        report.graph.edges().into_iter().collect::<Vec<_>>(),
        graph.edges().into_iter().collect::<Vec<_>>()
    );
    assert_eq!(report.objective(), Some(1.0));
}
