//! End-of-run reporting.
//!
//! Per-file problems are gathered into a [`RunSummary`] and printed once
//! after the run, either as colored console lines or as JSON.

use std::io::{self, Write};
use std::path::PathBuf;

use crossterm::style::{style, Stylize};
use serde::Serialize;

use crate::library_scanner::Library;
use crate::rename_engine::{RenameFailure, RenameReport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedRename {
    pub file_name: String,
    pub new_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub root: PathBuf,
    pub dry_run: bool,
    pub success_count: usize,
    pub renamed: usize,
    pub unchanged: usize,
    pub renames: Vec<PlannedRename>,
    pub failures: Vec<RenameFailure>,
    /// Files that fell back to positional numbering.
    pub unparsed: Vec<String>,
}

impl RunSummary {
    pub fn new(root: PathBuf, dry_run: bool, library: &Library, report: &RenameReport) -> Self {
        Self {
            root,
            dry_run,
            success_count: report.success_count(),
            renamed: report.renamed_count(),
            unchanged: report.unchanged_count(),
            renames: report
                .renames()
                .into_iter()
                .map(|(file_name, new_name)| PlannedRename {
                    file_name: file_name.to_string(),
                    new_name: new_name.to_string(),
                })
                .collect(),
            failures: report.failures().into_iter().cloned().collect(),
            unparsed: library.unparsed().map(|file| file.original_name()).collect(),
        }
    }

    pub fn lines(&self) -> Vec<SummaryLine> {
        let mut lines = Vec::new();

        if !self.unparsed.is_empty() {
            lines.push(SummaryLine::warning(format!(
                "Cannot parse episode number from {} files, numbered by position: {}",
                self.unparsed.len(),
                self.unparsed.join(", ")
            )));
        }

        let verb = if self.dry_run { "Would rename" } else { "Renamed" };
        lines.push(SummaryLine::success(format!(
            "{} {} files ({} already named correctly)",
            verb, self.success_count, self.unchanged
        )));
        if self.dry_run {
            for rename in &self.renames {
                lines.push(SummaryLine::success(format!(
                    "  {} -> {}",
                    rename.file_name, rename.new_name
                )));
            }
        }

        if !self.failures.is_empty() {
            lines.push(SummaryLine::error(format!(
                "Failed to rename {} files:",
                self.failures.len()
            )));
            for failure in &self.failures {
                lines.push(SummaryLine::error(format!(
                    "  {} - {}",
                    failure.file_name, failure.error_message
                )));
            }
        }

        lines
    }

    pub fn print(&self) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        for line in self.lines() {
            let styled = match line.tone {
                Tone::Success => style(line.text).green(),
                Tone::Warning => style(line.text).yellow(),
                Tone::Error => style(line.text).red(),
            };
            writeln!(stdout, "{}", styled)?;
        }
        Ok(())
    }

    pub fn print_json(&self) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    pub tone: Tone,
    pub text: String,
}

impl SummaryLine {
    fn success(text: String) -> Self {
        Self {
            tone: Tone::Success,
            text,
        }
    }

    fn warning(text: String) -> Self {
        Self {
            tone: Tone::Warning,
            text,
        }
    }

    fn error(text: String) -> Self {
        Self {
            tone: Tone::Error,
            text,
        }
    }
}
