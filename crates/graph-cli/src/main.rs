//! taskgraph - task-graph definition tooling.
//!
//! - `taskgraph validate <graph>` - load and check a definition
//! - `taskgraph inspect <graph>` - print nodes, edges and parameters
//! - `taskgraph run <graph>` - simulate agents walking the graph with demo leaves

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ai_graph::{load_path, GraphEngine, GraphTemplate, LeafRegistry};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use graph_cli::{demo_registry, SimConfig, SimOverrides, Simulation};

#[derive(Parser)]
#[command(name = "taskgraph")]
#[command(about = "Validate, inspect and simulate task graphs", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a graph definition and report structural errors
    Validate {
        /// Graph definition (.json, .yaml or .yml)
        graph: PathBuf,
    },

    /// Print the nodes, edges and parameters of a graph definition
    Inspect {
        /// Graph definition (.json, .yaml or .yml)
        graph: PathBuf,
    },

    /// Simulate agents walking a graph with the built-in demo leaves
    Run {
        /// Graph definition (.json, .yaml or .yml)
        graph: PathBuf,

        /// Simulation config (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of ticks to simulate
        #[arg(long)]
        ticks: Option<u64>,

        /// Number of agents
        #[arg(long)]
        agents: Option<u64>,

        /// Time step in seconds
        #[arg(long)]
        dt: Option<f32>,

        /// Write the trace log as JSON
        #[arg(long)]
        trace_out: Option<PathBuf>,

        /// Log every running node through the execution bridge
        #[arg(long)]
        watch_bridge: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = fmt().with_env_filter(filter).with_target(false);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Validate { graph } => validate(&graph),
        Commands::Inspect { graph } => inspect(&graph),
        Commands::Run {
            graph,
            config,
            ticks,
            agents,
            dt,
            trace_out,
            watch_bridge,
        } => {
            let overrides = SimOverrides {
                agents,
                ticks,
                dt_seconds: dt,
                trace_out,
            };
            run(&graph, config.as_deref(), &overrides, watch_bridge)
        }
    }
}

fn load(graph: &Path) -> Result<GraphTemplate> {
    load_path(graph).with_context(|| format!("Invalid graph definition {}", graph.display()))
}

fn validate(graph: &Path) -> Result<()> {
    let template = load(graph)?;
    println!(
        "ok: graph `{}` ({} nodes, root {})",
        template.name(),
        template.len(),
        template.root()
    );

    let unreachable = template.unreachable_nodes();
    if !unreachable.is_empty() {
        println!("note: {} node(s) unreachable from root", unreachable.len());
    }
    Ok(())
}

fn inspect(graph: &Path) -> Result<()> {
    let template = load(graph)?;
    let demo = demo_registry()?;

    println!("Graph: {}", template.name());
    println!("Root:  {}", template.root());
    println!();

    for node in template.nodes() {
        let leaf_id = node.leaf_id().unwrap_or_default();
        let known = if demo.contains(leaf_id) { "" } else { " (not a demo leaf)" };
        println!("[{}] {}  {} `{}`{}", node.id, node.name, node.kind.as_str(), leaf_id, known);
        println!("      success -> {}", node.on_success);
        println!("      failure -> {}", node.on_failure);
        for (key, value) in &node.params {
            println!("      {key} = {value:?}");
        }
    }

    let unreachable = template.unreachable_nodes();
    if !unreachable.is_empty() {
        println!();
        let ids: Vec<String> = unreachable.iter().map(ToString::to_string).collect();
        println!("Unreachable from root: {}", ids.join(", "));
    }
    Ok(())
}

fn run(graph: &Path, config: Option<&Path>, overrides: &SimOverrides, watch_bridge: bool) -> Result<()> {
    let config = SimConfig::load_or_default(config)?.with_overrides(overrides);
    let template = Arc::new(load(graph)?);

    let registry: &'static LeafRegistry = demo_registry()?.install_global()?;
    let mut engine = GraphEngine::new(registry).with_config(config.engine);
    if watch_bridge {
        engine.bridge_mut().install_with(
            |node| info!(node, "Bridge: running node"),
            |bb| debug!(entries = bb.len(), "Bridge: blackboard"),
        );
    }

    info!(
        graph = template.name(),
        agents = config.agents,
        ticks = config.ticks,
        dt = config.dt_seconds,
        "Starting simulation"
    );

    let mut sim = Simulation::new(template, config.agents, &config.blackboard);
    let stats = sim.run(&engine, config.ticks, config.dt_seconds);

    for (agent, node, idle) in sim.final_nodes() {
        let state = if idle { "idle" } else { "active" };
        println!("{agent}: node {node} ({state})");
    }
    println!(
        "{} ticks, {} steps, {} transitions, {} terminations, {} configuration errors",
        stats.ticks, stats.steps, stats.transitions, stats.terminations, stats.config_errors
    );

    if let Some(path) = &config.trace_out {
        sim.write_trace(path)?;
    }
    Ok(())
}
