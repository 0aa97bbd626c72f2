//! `mbvst solve`: run one formulation or the cycle-relaxation loop.

use std::collections::BTreeSet;
use std::fs;

use anyhow::{Context, Result};
use mbvst_algo::cycles::Relaxation;
use mbvst_algo::{
    check_solution, solve_by_cycles, solve_formulation, CycleReport, FormulationKind,
    GoodLpOracle, IterationRecord, MbvstSolution, MilpOracle, TreeCheck,
};
use mbvst_cli::cli::{SolveArgs, SolveMethod};
use mbvst_cli::config::RunConfig;
use mbvst_core::{graph_utils, io::read_instance, EdgeKey, Graph, VertexId};
use serde::Serialize;
use tracing::{info, warn};

/// Result file format
#[derive(Debug, Serialize)]
struct SolveOutput {
    instance: String,
    method: String,
    backend: String,
    status: String,
    spanning_tree: bool,
    objective: Option<f64>,
    branch_vertices: Vec<VertexId>,
    tree_edges: Vec<EdgeKey>,
    solve_time_ms: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    iterations: Vec<IterationOutput>,
}

#[derive(Debug, Serialize)]
struct IterationOutput {
    index: usize,
    basis_cycles: usize,
    removed_edges: usize,
    components_after_relax: usize,
    added_edges: usize,
    components_after_repair: usize,
    objective: f64,
    elapsed_ms: u64,
}

impl From<&IterationRecord> for IterationOutput {
    fn from(record: &IterationRecord) -> Self {
        IterationOutput {
            index: record.index,
            basis_cycles: record.basis_cycles,
            removed_edges: record.removed_edges.len(),
            components_after_relax: record.components_after_relax,
            added_edges: record.added_edges.len(),
            components_after_repair: record.components_after_repair,
            objective: record.objective,
            elapsed_ms: record.elapsed.as_millis() as u64,
        }
    }
}

pub fn handle(args: &SolveArgs) -> Result<()> {
    let method = args.method.parse::<SolveMethod>()?;
    let config = RunConfig::resolve(args)?;
    let backend = config.backend_kind()?;
    let oracle = GoodLpOracle::new(backend);

    let graph = read_instance(&args.instance)
        .with_context(|| format!("loading instance {}", args.instance))?;
    info!(
        instance = %args.instance,
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        %method,
        backend = %backend,
        "solving"
    );

    if let Some(path) = &args.write_lp {
        write_lp(&graph, method, &config, path)?;
    }

    let output = match method {
        SolveMethod::Formulation(kind) => run_formulation(args, kind, &graph, &oracle, &config)?,
        SolveMethod::Cycles => run_cycles(args, &graph, &oracle, &config)?,
    };

    if let Some(path) = &args.dot {
        let selected: BTreeSet<EdgeKey> = output.tree_edges.iter().copied().collect();
        let dot = graph_utils::export_graph(&graph, "dot", Some(&selected))?;
        fs::write(path, dot).with_context(|| format!("writing {path}"))?;
        println!("Graph written to {path}");
    }

    if let Some(path) = &args.out {
        let json = serde_json::to_string_pretty(&output).context("serializing solution")?;
        fs::write(path, json).with_context(|| format!("writing {path}"))?;
        println!("Results written to {path}");
    }

    Ok(())
}

fn write_lp(graph: &Graph, method: SolveMethod, config: &RunConfig, path: &str) -> Result<()> {
    let lp = match method {
        SolveMethod::Formulation(kind) => kind
            .formulation()
            .build(graph, &config.formulation)?
            .model
            .to_lp_format(),
        SolveMethod::Cycles => Relaxation::build(graph, graph).model().to_lp_format(),
    };
    fs::write(path, lp).with_context(|| format!("writing {path}"))?;
    println!("Model written to {path}");
    Ok(())
}

fn run_formulation(
    args: &SolveArgs,
    kind: FormulationKind,
    graph: &Graph,
    oracle: &dyn MilpOracle,
    config: &RunConfig,
) -> Result<SolveOutput> {
    let formulation = kind.formulation();
    let solution = solve_formulation(formulation.as_ref(), graph, oracle, &config.formulation)
        .with_context(|| format!("solving {} with the {kind} formulation", args.instance))?;
    let check = check_solution(graph, &solution);

    println!("{}", solution.summary());
    report_check(&check);

    Ok(SolveOutput {
        instance: args.instance.clone(),
        method: kind.to_string(),
        backend: oracle.id().to_string(),
        status: solution.status.to_string(),
        spanning_tree: check.spanning_tree,
        objective: Some(solution.objective),
        branch_vertices: check.branch_vertices.clone(),
        tree_edges: solution.selected_edges(),
        solve_time_ms: solution.solve_time.as_millis() as u64,
        iterations: Vec::new(),
    })
}

fn run_cycles(
    args: &SolveArgs,
    graph: &Graph,
    oracle: &dyn MilpOracle,
    config: &RunConfig,
) -> Result<SolveOutput> {
    let report: CycleReport = solve_by_cycles(graph, oracle, &config.cycles)
        .with_context(|| format!("running the repair loop on {}", args.instance))?;

    println!("{}", report.summary());
    let check = report.solution.as_ref().map(|solution| {
        let check = check_solution(graph, solution);
        report_check(&check);
        check
    });
    if !report.is_tree() {
        warn!(status = %report.status, "no spanning tree certified");
    }

    Ok(SolveOutput {
        instance: args.instance.clone(),
        method: "cycles".to_string(),
        backend: oracle.id().to_string(),
        status: report.status.to_string(),
        spanning_tree: report.is_tree(),
        objective: report.objective(),
        branch_vertices: check.map(|c| c.branch_vertices).unwrap_or_default(),
        tree_edges: report
            .solution
            .as_ref()
            .map(MbvstSolution::selected_edges)
            .unwrap_or_default(),
        solve_time_ms: report.elapsed.as_millis() as u64,
        iterations: report.iterations.iter().map(IterationOutput::from).collect(),
    })
}

fn report_check(check: &TreeCheck) {
    if check.is_valid() {
        println!("Spanning tree check: ok");
    } else {
        println!("Spanning tree check: FAILED");
        if !check.spanning_tree {
            println!("  selection is not a spanning tree ({} edges)", check.selected_edges);
        }
        if !check.foreign_edges.is_empty() {
            println!("  {} selected edge(s) missing from the input", check.foreign_edges.len());
        }
        if !check.unflagged_branch_vertices.is_empty() {
            let ids: Vec<String> =
                check.unflagged_branch_vertices.iter().map(|v| v.to_string()).collect();
            println!("  unflagged branch vertices: {}", ids.join(", "));
        }
    }
}
