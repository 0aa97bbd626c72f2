use std::fs;

use anyhow::{Context, Result};
use mbvst_cli::cli::GraphCommands;
use mbvst_core::{graph_utils, io::read_instance, Graph};
use tracing::info;

fn load(instance: &str) -> Result<Graph> {
    read_instance(instance).with_context(|| format!("loading instance {instance}"))
}

pub fn handle(command: &GraphCommands) -> Result<()> {
    match command {
        GraphCommands::Stats { instance } => {
            info!("Displaying graph statistics for {}", instance);
            let graph = load(instance)?;
            let stats = graph_utils::graph_stats(&graph);
            println!("Graph statistics for {instance}:");
            println!("  Vertices      : {}", stats.vertex_count);
            println!("  Edges         : {}", stats.edge_count);
            println!("  Components    : {}", stats.connected_components);
            println!(
                "  Degree [min/avg/max]: {}/{:.2}/{}",
                stats.min_degree, stats.avg_degree, stats.max_degree
            );
            println!("  Density       : {:.4}", stats.density);
            println!("  Cyclomatic    : {}", stats.cyclomatic_number);
            Ok(())
        }
        GraphCommands::Components { instance } => {
            let graph = load(instance)?;
            for summary in graph_utils::component_summary(&graph) {
                let members: Vec<String> = summary.members.iter().map(|v| v.to_string()).collect();
                println!(
                    "Component {}: {} vertex(es) [{}]",
                    summary.component_id,
                    summary.vertex_count,
                    members.join(" ")
                );
            }
            Ok(())
        }
        GraphCommands::Export {
            instance,
            format,
            out,
        } => {
            let graph = load(instance)?;
            let dot = graph_utils::export_graph(&graph, format, None)?;
            if let Some(path) = out {
                fs::write(path, &dot).with_context(|| format!("writing {path}"))?;
                println!("Graph exported to {path}");
            } else {
                println!("{dot}");
            }
            Ok(())
        }
    }
}
