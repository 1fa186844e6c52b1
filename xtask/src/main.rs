//! groupctl xtask - Development automation tasks
//!
//! ## Usage
//!
//! ```bash
//! # Build the groupctl binary
//! cargo xtask build
//!
//! # Run all tests
//! cargo xtask test
//!
//! # Run lints
//! cargo xtask lint
//!
//! # Print the engine commands of the built-in groups without running them
//! cargo xtask smoke
//!
//! # Run CI checks (fmt, lint, test, smoke)
//! cargo xtask ci
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use xshell::{cmd, Shell};

/// Lifecycle commands exercised by `smoke`
const SMOKE_COMMANDS: &[&str] = &[
    "startup-database",
    "shutdown-database",
    "startup-server",
    "shutdown-server",
];

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development automation for groupctl")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the groupctl binary
    Build {
        /// Build in release mode
        #[arg(long)]
        release: bool,
    },
    /// Run all tests
    Test {
        /// Run tests in release mode
        #[arg(long)]
        release: bool,
    },
    /// Run lints (clippy and rustfmt check)
    Lint,
    /// Format code
    Fmt {
        /// Check formatting without making changes
        #[arg(long)]
        check: bool,
    },
    /// Dry-run every lifecycle command against the built-in groups
    Smoke,
    /// Clean build artifacts
    Clean,
    /// Install groupctl locally
    Install,
    /// Run CI checks (fmt, lint, test, smoke)
    Ci,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;

    let project_root = project_root()?;
    sh.change_dir(&project_root);

    match cli.command {
        Commands::Build { release } => build(&sh, release)?,
        Commands::Test { release } => test(&sh, release)?,
        Commands::Lint => lint(&sh)?,
        Commands::Fmt { check } => fmt(&sh, check)?,
        Commands::Smoke => smoke(&sh)?,
        Commands::Clean => clean(&sh)?,
        Commands::Install => install(&sh)?,
        Commands::Ci => ci(&sh)?,
    }

    Ok(())
}

fn project_root() -> Result<PathBuf> {
    let output = std::process::Command::new("cargo")
        .args(["locate-project", "--workspace", "--message-format=plain"])
        .output()
        .context("Failed to run cargo locate-project")?;

    let path = String::from_utf8(output.stdout)?;
    let manifest = PathBuf::from(path.trim());

    manifest
        .parent()
        .map(|p| p.to_path_buf())
        .context("Failed to find project root")
}

fn build(sh: &Shell, release: bool) -> Result<()> {
    println!("Building groupctl...");

    if release {
        cmd!(sh, "cargo build --release --bin groupctl").run()?;
    } else {
        cmd!(sh, "cargo build --bin groupctl").run()?;
    }

    println!("Build complete");
    Ok(())
}

fn test(sh: &Shell, release: bool) -> Result<()> {
    println!("Running tests...");

    if release {
        cmd!(sh, "cargo test --release -p groupctl").run()?;
    } else {
        cmd!(sh, "cargo test -p groupctl").run()?;
    }

    Ok(())
}

fn lint(sh: &Shell) -> Result<()> {
    println!("Running clippy...");
    cmd!(sh, "cargo clippy --workspace --all-targets -- -D warnings").run()?;

    fmt(sh, true)
}

fn fmt(sh: &Shell, check: bool) -> Result<()> {
    if check {
        cmd!(sh, "cargo fmt --all -- --check").run()?;
    } else {
        cmd!(sh, "cargo fmt --all").run()?;
    }
    Ok(())
}

fn smoke(sh: &Shell) -> Result<()> {
    println!("Dry-running lifecycle commands...");

    // Run from an empty directory so no groups file is picked up
    let scratch = sh.create_temp_dir()?;
    let manifest = sh.current_dir().join("Cargo.toml");
    let _dir = sh.push_dir(scratch.path());

    for command in SMOKE_COMMANDS {
        cmd!(
            sh,
            "cargo run --quiet --manifest-path {manifest} --bin groupctl -- --engine docker --dry-run {command}"
        )
        .run()
        .with_context(|| format!("groupctl {} failed", command))?;
    }

    Ok(())
}

fn clean(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo clean").run()?;
    Ok(())
}

fn install(sh: &Shell) -> Result<()> {
    println!("Installing groupctl...");
    cmd!(sh, "cargo install --path . --bin groupctl --force").run()?;
    Ok(())
}

fn ci(sh: &Shell) -> Result<()> {
    fmt(sh, true)?;
    lint(sh)?;
    test(sh, false)?;
    smoke(sh)?;

    println!("CI checks passed");
    Ok(())
}
