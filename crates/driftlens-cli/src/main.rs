use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use driftlens_core::{ChangeStatus, Config, EnvInput};
use driftlens_dbt::{env_input, Catalog, Manifest};
use driftlens_graph::{build_merged_graph, select_downstream, select_upstream, MergedGraph};

/// Driftlens - lineage diff for dbt projects
#[derive(Parser)]
#[command(name = "driftlens")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: driftlens.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Base environment manifest.json (overrides config)
    #[arg(long, global = true)]
    base_manifest: Option<PathBuf>,

    /// Current environment manifest.json (overrides config)
    #[arg(long, global = true)]
    current_manifest: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare base and current lineage and summarize changes
    Diff {
        /// Write the full merged graph as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the neighbor set of a node
    Lineage {
        /// Node unique_id (e.g. "model.demo.orders")
        node: String,

        /// Walk children instead of parents
        #[arg(long)]
        downstream: bool,

        /// Maximum hops from the seed (unbounded if omitted)
        #[arg(short, long)]
        degree: Option<usize>,
    },

    /// Show the downstream blast radius of every changed node
    Impact,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("DRIFTLENS_LOG"))
        .init();

    let cli = Cli::parse();

    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new("driftlens.toml").exists() {
        Config::from_file(Path::new("driftlens.toml"))?
    } else {
        Config::default()
    };

    let graph = load_graph(&cli, &config)?;

    match cli.command {
        Commands::Diff { output } => diff_command(&graph, output.as_deref()),
        Commands::Lineage { node, downstream, degree } => {
            lineage_command(&graph, &node, downstream, degree)
        }
        Commands::Impact => impact_command(&graph),
    }
}

fn load_graph(cli: &Cli, config: &Config) -> Result<MergedGraph> {
    let base = load_env(
        cli.base_manifest.as_deref(),
        config.base.as_ref().map(|e| (e.manifest.as_path(), e.catalog.as_deref())),
        config,
        "base",
    )?;
    let current = load_env(
        cli.current_manifest.as_deref(),
        config
            .current
            .as_ref()
            .map(|e| (e.manifest.as_path(), e.catalog.as_deref())),
        config,
        "current",
    )?;

    Ok(build_merged_graph(&base, &current))
}

fn load_env(
    flag: Option<&Path>,
    configured: Option<(&Path, Option<&Path>)>,
    config: &Config,
    side: &str,
) -> Result<EnvInput> {
    let (manifest_path, catalog_path) = match (flag, configured) {
        (Some(path), _) => (path.to_path_buf(), None),
        (None, Some((manifest, catalog))) => {
            (config.resolve(manifest), catalog.map(|c| config.resolve(c)))
        }
        (None, None) => bail!(
            "No {side} manifest configured; pass --{side}-manifest or set [{side}] in driftlens.toml"
        ),
    };

    let manifest = Manifest::from_file(&manifest_path)
        .with_context(|| format!("loading {side} manifest"))?;

    let catalog = match catalog_path {
        Some(path) if path.exists() => {
            Some(Catalog::from_file(&path).with_context(|| format!("loading {side} catalog"))?)
        }
        _ => None,
    };

    tracing::debug!(side, nodes = manifest.parent_map.len(), "loaded environment");
    Ok(env_input(&manifest, catalog.as_ref()))
}

fn diff_command(graph: &MergedGraph, output: Option<&Path>) -> Result<()> {
    println!(
        "{} {} nodes, {} edges",
        "Merged:".bold(),
        graph.node_count(),
        graph.edge_count()
    );

    let mut added = 0usize;
    let mut removed = 0usize;
    let mut modified = 0usize;

    for id in &graph.modified_set {
        let Some(node) = graph.node(id) else { continue };
        match node.change_status {
            Some(ChangeStatus::Added) => {
                added += 1;
                println!("  {} {}", "+".green().bold(), id.green());
            }
            Some(ChangeStatus::Removed) => {
                removed += 1;
                println!("  {} {}", "-".red().bold(), id.red());
            }
            Some(ChangeStatus::Modified) => {
                modified += 1;
                println!("  {} {}", "~".yellow().bold(), id.yellow());
            }
            None => {}
        }
    }

    if graph.modified_set.is_empty() {
        println!("{}", "No changes between base and current".green());
    } else {
        println!(
            "{} {} added, {} removed, {} modified",
            "Changes:".bold(),
            added,
            removed,
            modified
        );
    }

    if !graph.catalog_existence.base || !graph.catalog_existence.current {
        println!(
            "{}",
            "Note: catalog metadata missing on at least one side; profile diffs unavailable"
                .dimmed()
        );
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(graph)?;
        std::fs::write(path, json)
            .with_context(|| format!("writing merged graph to {}", path.display()))?;
        println!("Merged graph written to {}", path.display());
    }

    Ok(())
}

fn lineage_command(
    graph: &MergedGraph,
    node: &str,
    downstream: bool,
    degree: Option<usize>,
) -> Result<()> {
    if graph.node(node).is_none() {
        bail!("Node not found in merged graph: {node}");
    }

    let seeds = vec![node.to_string()];
    let selection = if downstream {
        select_downstream(graph, &seeds, degree)
    } else {
        select_upstream(graph, &seeds, degree)
    };

    let direction = if downstream { "downstream" } else { "upstream" };
    println!(
        "{} {} of {} ({} nodes):",
        direction.bold(),
        match degree {
            Some(d) => format!("within {} hops", d),
            None => "closure".to_string(),
        },
        node,
        selection.len()
    );

    for id in &selection {
        let marker = graph
            .node(id)
            .and_then(|n| n.change_status)
            .map(|status| format!(" [{}]", status).yellow().to_string())
            .unwrap_or_default();
        println!("  {}{}", id, marker);
    }

    Ok(())
}

fn impact_command(graph: &MergedGraph) -> Result<()> {
    if graph.modified_set.is_empty() {
        println!("{}", "No changed nodes; nothing is impacted".green());
        return Ok(());
    }

    let mut affected = select_downstream(graph, &graph.modified_set, None);
    for id in &graph.modified_set {
        affected.remove(id);
    }

    println!(
        "{} changed nodes, {} downstream nodes affected",
        graph.modified_set.len().to_string().bold(),
        affected.len().to_string().bold()
    );

    for id in &graph.modified_set {
        let status = graph
            .node(id)
            .and_then(|n| n.change_status)
            .map(|s| s.to_string())
            .unwrap_or_default();
        println!("  {} ({})", id.yellow(), status);
    }

    if !affected.is_empty() {
        println!("{}", "Downstream:".bold());
        for id in &affected {
            println!("  {}", id);
        }
    }

    Ok(())
}
