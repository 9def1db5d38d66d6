mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::{style, Stylize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use season_rename::library_scanner::scan;
use season_rename::rename_engine::{ConfigBuilder, NumberingPolicy, RenameEngine};
use season_rename::summary::RunSummary;

/// Exit status when the run finished but some files could not be renamed.
const PARTIAL_FAILURE: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("season_rename=debug")
        } else {
            EnvFilter::new("season_rename=error")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::RenameFromRoot {
            root,
            policy,
            dry_run,
            json,
        } => rename_from_root(root, policy, dry_run, json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red(), e);
            ExitCode::FAILURE
        }
    }
}

fn rename_from_root(
    root: Option<PathBuf>,
    policy: NumberingPolicy,
    dry_run: bool,
    json: bool,
) -> Result<ExitCode> {
    let root = match root {
        Some(root) => root,
        None => cli::prompt_for_root()?,
    };

    let config = ConfigBuilder::new()
        .root(root)
        .policy(policy)
        .dry_run(dry_run)
        .build()?;

    let mut library = scan(&config.root)
        .with_context(|| format!("Failed to scan {}", config.root.display()))?;
    info!(
        seasons = library.seasons().len(),
        files = library.file_count(),
        "Scan complete"
    );

    let engine = RenameEngine::new(&config);
    let report = engine.rename_library(&mut library);

    let summary = RunSummary::new(config.root.clone(), config.dry_run, &library, &report);
    if json {
        summary.print_json()?;
    } else {
        summary.print()?;
    }

    if report.has_failures() {
        Ok(ExitCode::from(PARTIAL_FAILURE))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
