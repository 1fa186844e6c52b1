//! groupctl - Service group lifecycle manager
//!
//! This is the main CLI entry point for groupctl.

use clap::{Parser, Subcommand};
use groupctl::engine::{ComposeEngine, EngineFlavor};
use groupctl::error::Result;
use groupctl::group::{GroupsConfig, GroupsParser, LoadedGroups};
use groupctl::lifecycle::{LifecycleExecutor, Operation};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// groupctl - bring container service groups up and down
#[derive(Parser)]
#[command(name = "groupctl")]
#[command(author = "Evoker Industries")]
#[command(version)]
#[command(about = "Bring named container service groups up and tear them down", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Groups file (defaults to groupctl.yaml, then the user config dir)
    #[arg(short, long, global = true, env = "GROUPCTL_FILE")]
    file: Option<PathBuf>,

    /// Compose engine: auto, docker, docker-compose or podman
    #[arg(long, global = true, env = "GROUPCTL_ENGINE", default_value = "auto")]
    engine: EngineFlavor,

    /// Print the engine commands instead of running them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and start the database group
    StartupDatabase,

    /// Tear down the database group
    ShutdownDatabase,

    /// Build and start the server group
    StartupServer,

    /// Tear down the server group
    ShutdownServer,

    /// Start a group
    Up {
        /// Group name
        group: String,
    },

    /// Tear down a group
    Down {
        /// Group name
        group: String,
    },

    /// List registered groups
    Groups,

    /// Validate and print the groups configuration
    Config,
}

impl Commands {
    /// Group and operation a lifecycle command acts on
    fn lifecycle(&self) -> Option<(&str, Operation)> {
        match self {
            Commands::StartupDatabase => Some(("database", Operation::Start)),
            Commands::ShutdownDatabase => Some(("database", Operation::Stop)),
            Commands::StartupServer => Some(("server", Operation::Start)),
            Commands::ShutdownServer => Some(("server", Operation::Stop)),
            Commands::Up { group } => Some((group, Operation::Start)),
            Commands::Down { group } => Some((group, Operation::Stop)),
            Commands::Groups | Commands::Config => None,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.debug);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// `--debug` wins, then `RUST_LOG`, then `LOG_LEVEL`
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| std::env::var("LOG_LEVEL").map(|level| EnvFilter::new(level.to_lowercase())))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<u8> {
    let working_dir = std::env::current_dir()?;
    let env: HashMap<String, String> = std::env::vars().collect();

    let loaded = GroupsParser::load(cli.file.as_deref(), &working_dir, &env)?;
    tracing::debug!("Using {}", loaded.source);
    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }

    let Some((group, operation)) = cli.command.lifecycle() else {
        match cli.command {
            Commands::Config => print!("{}", render_config(&loaded)?),
            _ => print_groups(&loaded, cli.json)?,
        }
        return Ok(0);
    };

    let executor = LifecycleExecutor::new(&loaded.registry, ComposeEngine::new(cli.engine));
    run_lifecycle(&executor, group, operation, cli.dry_run, cli.json).await
}

async fn run_lifecycle(
    executor: &LifecycleExecutor<'_, ComposeEngine>,
    group: &str,
    operation: Operation,
    dry_run: bool,
    json: bool,
) -> Result<u8> {
    if dry_run {
        for line in dry_run_commands(executor, group, operation)? {
            println!("{}", line);
        }
        return Ok(0);
    }

    let outcome = executor.execute(group, operation).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else if let Some(err) = outcome.error() {
        eprintln!("Error: {}", err);
    } else {
        match operation {
            Operation::Start => println!("Started group {}", group),
            Operation::Stop => println!("Stopped group {}", group),
        }
    }

    Ok(outcome.exit_code())
}

/// Engine command lines an operation would run
fn dry_run_commands(
    executor: &LifecycleExecutor<'_, ComposeEngine>,
    group: &str,
    operation: Operation,
) -> Result<Vec<String>> {
    Ok(executor
        .plan(group, operation)?
        .iter()
        .map(|step| executor.engine().command_line(step).join(" "))
        .collect())
}

fn print_groups(loaded: &LoadedGroups, json: bool) -> Result<()> {
    if json {
        let groups: Vec<_> = loaded.registry.iter().collect();
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    println!("{:<16} {:<16} {:<6} SERVICES", "NAME", "PROJECT", "BUILD");
    for group in loaded.registry.iter() {
        let services = if group.services.is_empty() {
            "(all)".to_string()
        } else {
            group.services.join(",")
        };
        println!(
            "{:<16} {:<16} {:<6} {}",
            group.name,
            group.project_name().unwrap_or("(default)"),
            if group.build_required { "yes" } else { "no" },
            services
        );
    }

    Ok(())
}

/// Effective configuration as YAML
///
/// Validation warnings go to the log only so the output stays loadable.
fn render_config(loaded: &LoadedGroups) -> Result<String> {
    let config = GroupsConfig {
        groups: loaded.registry.iter().cloned().collect(),
    };

    Ok(format!(
        "# source: {}\n{}",
        loaded.source,
        serde_yaml::to_string(&config)?
    ))
}
