use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use season_rename::rename_engine::NumberingPolicy;

/// Rename files within season subdirectories with an SxxExx prefix
#[derive(Parser, Debug)]
#[command(name = "season-rename")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rename every video in the season folders under ROOT
    #[command(name = "rename-from-root", alias = "rename_from_root")]
    RenameFromRoot {
        /// Directory that holds the season folders; prompted for when omitted
        #[arg(long, env = "SEASON_RENAME_ROOT", value_name = "DIR")]
        root: Option<PathBuf>,

        /// How final episode numbers are chosen
        #[arg(long, value_enum, default_value_t)]
        policy: NumberingPolicy,

        /// Report what would be renamed without touching any file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Ask for the root directory on stdin.
pub fn prompt_for_root() -> Result<PathBuf> {
    print!("Enter the directory: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    read_root(&input)
}

fn read_root(input: &str) -> Result<PathBuf> {
    let input = input.trim();
    if input.is_empty() {
        bail!("No directory provided");
    }
    Ok(PathBuf::from(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rename_from_root() {
        let cli = Cli::try_parse_from([
            "season-rename",
            "rename-from-root",
            "--root",
            "/tv/Show",
            "--policy",
            "positional",
            "--dry-run",
        ])
        .unwrap();

        let Commands::RenameFromRoot { root, policy, dry_run, json } = cli.command;
        assert_eq!(root, Some(PathBuf::from("/tv/Show")));
        assert_eq!(policy, NumberingPolicy::Positional);
        assert!(dry_run);
        assert!(!json);
    }

    #[test]
    fn test_underscore_alias_and_defaults() {
        let args = ["season-rename", "-v", "rename_from_root", "--root", "x"];
        let cli = Cli::try_parse_from(args).unwrap();

        assert!(cli.verbose);
        let Commands::RenameFromRoot { policy, dry_run, .. } = cli.command;
        assert_eq!(policy, NumberingPolicy::Clamp);
        assert!(!dry_run);
    }

    #[test]
    fn test_read_root() {
        assert_eq!(read_root("  /tv/Show \n").unwrap(), PathBuf::from("/tv/Show"));
        assert!(read_root("\n").is_err());
    }
}
