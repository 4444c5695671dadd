use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use family_tree_engine::{
    config::Config,
    reports::ReportGenerator,
    service::{FamilyTreeService, ServiceConfig},
    source::{Snapshot, SnapshotSource},
    types::{LeveledView, PersonId},
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "family-tree")]
#[command(about = "Assembles rooted, generation-leveled family tree views from a genealogy graph")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Graph snapshot to read persons and relations from (JSON or YAML)
    #[arg(short, long, env = "FAMILY_TREE_SNAPSHOT", global = true)]
    snapshot: Option<PathBuf>,

    /// Log level (overrides the configuration file)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Family tree around a root person
    Tree {
        #[command(flatten)]
        target: RootedArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Subgraph around a root person, including its edge lists
    Subgraph {
        #[command(flatten)]
        target: RootedArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Every person and relation in the store
    Graph {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Health check of the graph source
    HealthCheck,

    /// Report problems in the snapshot file
    ValidateSnapshot,

    /// Initialize configuration file
    Init {
        /// Configuration file path
        #[arg(short = 'f', long, default_value = "family-tree.yml")]
        config_file: PathBuf,
    },
}

#[derive(clap::Args)]
struct RootedArgs {
    /// Id of the person the view is centered on
    #[arg(short, long)]
    root: PersonId,

    /// Maximum hops from the root (unbounded when omitted)
    #[arg(short, long, allow_negative_numbers = true)]
    distance: Option<i64>,
}

#[derive(clap::Args)]
struct OutputArgs {
    /// Output format (json, text)
    #[arg(short, long, default_value = "json")]
    output: String,

    /// Output file path (defaults to stdout)
    #[arg(long)]
    output_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref()).await?;
    let log_level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(log_level, config.logging.thread_ids)?;

    info!("Starting family tree engine");

    match cli.command {
        Commands::Tree { target, output } => {
            let service = open_service(cli.snapshot.as_deref(), &config).await?;
            let distance = resolve_distance(target.distance, &config);
            let tree = service
                .get_family_tree(target.root, distance)
                .await
                .with_context(|| format!("Failed to assemble family tree for {}", target.root))?;
            output_view(&tree, &output).await?;
        }

        Commands::Subgraph { target, output } => {
            let service = open_service(cli.snapshot.as_deref(), &config).await?;
            let distance = resolve_distance(target.distance, &config);
            let subgraph = service
                .get_subgraph(target.root, distance)
                .await
                .with_context(|| format!("Failed to assemble subgraph for {}", target.root))?;
            output_view(&subgraph, &output).await?;
        }

        Commands::Graph { output } => {
            let service = open_service(cli.snapshot.as_deref(), &config).await?;
            let graph = service
                .get_complete_graph()
                .await
                .context("Failed to assemble complete graph")?;
            output_view(&graph, &output).await?;
        }

        Commands::HealthCheck => {
            health_check(cli.snapshot.as_deref(), &config).await?;
        }

        Commands::ValidateSnapshot => {
            validate_snapshot(cli.snapshot.as_deref()).await?;
        }

        Commands::Init { config_file } => {
            init_config(config_file).await?;
        }
    }

    Ok(())
}

/// Initialize tracing with the specified log level
fn init_tracing(log_level: &str, thread_ids: bool) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
        .context("Failed to create env filter")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(thread_ids)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(env_filter)
        .init();

    Ok(())
}

/// Defaults, then the configuration file, then `FAMILY_TREE_*` variables.
async fn load_config(config_path: Option<&PathBuf>) -> Result<Config> {
    let mut config = Config::default();

    if let Some(path) = config_path {
        if path.exists() {
            let from_file = Config::load_from_file(path).await?;
            config.merge_with(from_file);
        } else {
            eprintln!("Configuration file not found: {:?}. Using defaults.", path);
        }
    }

    config
        .apply_env(|key| std::env::var(key).ok())
        .context("Invalid configuration in environment")?;
    config.validate().context("Invalid configuration")?;

    Ok(config)
}

fn resolve_distance(requested: Option<i64>, config: &Config) -> i64 {
    requested
        .or(config.engine.default_max_distance)
        .unwrap_or(i64::MAX)
}

async fn load_snapshot(snapshot: Option<&Path>) -> Result<(PathBuf, Snapshot)> {
    let path = snapshot
        .context("No snapshot given. Pass --snapshot or set FAMILY_TREE_SNAPSHOT")?
        .to_path_buf();
    info!("Loading graph snapshot from: {:?}", path);

    let loaded = Snapshot::load(&path)
        .await
        .with_context(|| format!("Failed to load snapshot: {:?}", path))?;
    Ok((path, loaded))
}

async fn open_service(snapshot: Option<&Path>, config: &Config) -> Result<FamilyTreeService> {
    let (_, snapshot) = load_snapshot(snapshot).await?;
    let source = Arc::new(SnapshotSource::new(snapshot));
    Ok(FamilyTreeService::new(source, ServiceConfig::from(config)))
}

/// Perform health check of the graph source
async fn health_check(snapshot: Option<&Path>, config: &Config) -> Result<()> {
    info!("Performing health check");

    let service = match open_service(snapshot, config).await {
        Ok(service) => service,
        Err(e) => {
            error!("Failed to open graph source: {:#}", e);
            println!("System Status: Error - {:#}", e);
            std::process::exit(1);
        }
    };

    let status = service.health_check().await?;
    println!(
        "System Status: {}",
        if status.healthy { "Healthy" } else { "Unhealthy" }
    );
    for component in &status.components {
        println!(
            "  {}: {}",
            component.name,
            if component.healthy { "ok" } else { "failing" }
        );
    }

    if !status.healthy {
        error!("Health check failed");
        std::process::exit(1);
    }
    Ok(())
}

/// Print validation findings for the snapshot
async fn validate_snapshot(snapshot: Option<&Path>) -> Result<()> {
    let (path, snapshot) = load_snapshot(snapshot).await?;
    let issues = snapshot.validate();

    println!("Snapshot: {:?}", path);
    println!("  Persons: {}", snapshot.persons.len());
    println!("  Marriages: {}", snapshot.marriages.len());
    println!("  Parent edges: {}", snapshot.parents.len());
    println!("  Sibling edges: {}", snapshot.sibling_edges().len());

    if issues.is_empty() {
        info!("Snapshot validation completed");
        println!("\nNo problems found.");
        return Ok(());
    }

    println!("\n{} problem(s) found:", issues.len());
    for issue in &issues {
        println!("  [{:?}] {}", issue.kind, issue.message);
    }
    error!("Snapshot validation found {} problems", issues.len());
    std::process::exit(1);
}

/// Initialize configuration file
async fn init_config(config_file: PathBuf) -> Result<()> {
    info!("Initializing configuration file: {:?}", config_file);

    if config_file.exists() {
        warn!("Configuration file already exists: {:?}", config_file);
        print!("Overwrite existing file? (y/N): ");
        use std::io::{self, Write};
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().to_lowercase().starts_with('y') {
            info!("Configuration initialization cancelled");
            return Ok(());
        }
    }

    Config::default()
        .save_to_file(&config_file)
        .await
        .with_context(|| format!("Failed to write configuration file: {:?}", config_file))?;

    info!("Configuration file created successfully: {:?}", config_file);
    println!("Configuration file created: {:?}", config_file);
    println!("Edit this file to customize ordering, ages and logging.");

    Ok(())
}

/// Output a view in the requested format
async fn output_view<V: LeveledView + Serialize>(view: &V, output: &OutputArgs) -> Result<()> {
    let content = ReportGenerator::new().generate(view, &output.output)?;

    if let Some(file_path) = &output.output_file {
        tokio::fs::write(file_path, &content)
            .await
            .with_context(|| format!("Failed to write output to: {:?}", file_path))?;
        info!("View with {} persons written to: {:?}", view.len(), file_path);
    } else {
        println!("{}", content);
    }

    Ok(())
}
