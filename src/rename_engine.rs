use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::RenameError;
use crate::library_scanner::Library;
use crate::video_file::VideoFile;

/// How a file's final episode number is chosen from its parsed number and
/// its 1-based position in the sorted season.
///
/// Every policy falls back to the position for unparsed (`0`) episodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NumberingPolicy {
    /// `min(parsed, position)`. A parsed number larger than the position is
    /// discarded, even when it was correct.
    #[default]
    Clamp,
    /// Always the position.
    Positional,
    /// Always the parsed number. Duplicate numbers collide on disk and are
    /// reported as failures.
    Parsed,
}

impl NumberingPolicy {
    pub fn episode_for(self, parsed: u32, position: u32) -> u32 {
        if parsed == 0 {
            return position;
        }
        match self {
            Self::Clamp => parsed.min(position),
            Self::Positional => position,
            Self::Parsed => parsed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenameConfig {
    pub root: PathBuf,
    pub policy: NumberingPolicy,
    pub dry_run: bool,
}

/// The single filesystem mutation the engine performs.
pub trait RenameBackend {
    fn rename(&self, from: &Path, to: &Path) -> Result<(), RenameError>;
}

/// Renames on disk, refusing to replace an existing, different target.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsBackend;

impl RenameBackend for FsBackend {
    fn rename(&self, from: &Path, to: &Path) -> Result<(), RenameError> {
        if to.exists() && !is_same_file(from, to) {
            return Err(RenameError::AlreadyExists(to.to_path_buf()));
        }
        fs::rename(from, to).map_err(|e| RenameError::from_io(from.to_path_buf(), e))
    }
}

/// Applies the checks of [`FsBackend`] against a simulated view of the
/// season, so earlier planned renames free and claim paths for later ones.
#[derive(Debug, Default)]
pub struct DryRunBackend {
    vacated: RefCell<HashSet<PathBuf>>,
    claimed: RefCell<HashSet<PathBuf>>,
}

impl DryRunBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn occupied(&self, path: &Path) -> bool {
        self.claimed.borrow().contains(path)
            || (path.exists() && !self.vacated.borrow().contains(path))
    }
}

impl RenameBackend for DryRunBackend {
    fn rename(&self, from: &Path, to: &Path) -> Result<(), RenameError> {
        if !self.occupied(from) {
            return Err(RenameError::SourceNotFound(from.to_path_buf()));
        }
        if self.occupied(to) && !is_same_file(from, to) {
            return Err(RenameError::AlreadyExists(to.to_path_buf()));
        }

        self.claimed.borrow_mut().remove(from);
        self.vacated.borrow_mut().insert(from.to_path_buf());
        self.vacated.borrow_mut().remove(to);
        self.claimed.borrow_mut().insert(to.to_path_buf());
        info!("Would rename {:?} -> {:?}", from, to);
        Ok(())
    }
}

/// Whether `a` and `b` differ only in letter case and resolve to one file,
/// as a case-only rename does on a case-insensitive filesystem.
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    if !a.to_string_lossy().eq_ignore_ascii_case(&b.to_string_lossy()) {
        return false;
    }
    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(a_meta), Ok(b_meta)) => same_inode(&a_meta, &b_meta),
        _ => false,
    }
}

#[cfg(unix)]
fn same_inode(a: &fs::Metadata, b: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_inode(_: &fs::Metadata, _: &fs::Metadata) -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenameFailure {
    pub file_name: String,
    pub error_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RenameOutcome {
    Renamed { file_name: String, new_name: String },
    /// Already carried its canonical name.
    Unchanged { file_name: String },
    Failed(RenameFailure),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenameReport {
    pub outcomes: Vec<RenameOutcome>,
}

impl RenameReport {
    /// Renamed plus unchanged files.
    pub fn success_count(&self) -> usize {
        self.renamed_count() + self.unchanged_count()
    }

    pub fn renamed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, RenameOutcome::Renamed { .. }))
            .count()
    }

    pub fn unchanged_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, RenameOutcome::Unchanged { .. }))
            .count()
    }

    /// `(file_name, new_name)` of every renamed file.
    pub fn renames(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                RenameOutcome::Renamed {
                    file_name,
                    new_name,
                } => Some((file_name.as_str(), new_name.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<&RenameFailure> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                RenameOutcome::Failed(failure) => Some(failure),
                _ => None,
            })
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| matches!(outcome, RenameOutcome::Failed(_)))
    }
}

pub struct RenameEngine {
    policy: NumberingPolicy,
    backend: Box<dyn RenameBackend>,
}

impl RenameEngine {
    pub fn new(config: &RenameConfig) -> Self {
        let backend: Box<dyn RenameBackend> = if config.dry_run {
            Box::new(DryRunBackend::new())
        } else {
            Box::new(FsBackend)
        };

        Self {
            policy: config.policy,
            backend,
        }
    }

    pub fn with_backend(policy: NumberingPolicy, backend: impl RenameBackend + 'static) -> Self {
        Self {
            policy,
            backend: Box::new(backend),
        }
    }

    /// Number and rename every season in order. A failed file is recorded
    /// and the run moves on to the next one.
    pub fn rename_library(&self, library: &mut Library) -> RenameReport {
        let mut report = RenameReport::default();

        for (folder, files) in library.seasons_mut() {
            debug!(season = %folder, files = files.len(), "Renaming season");
            self.rename_season(files, &mut report);
        }

        report
    }

    /// Assign `new_name` to each file of one sorted season and rename it.
    pub fn rename_season(&self, files: &mut [VideoFile], report: &mut RenameReport) {
        for (index, file) in files.iter_mut().enumerate() {
            let position = index as u32 + 1;
            let episode = self.policy.episode_for(file.episode, position);
            file.new_name = file.canonical_name(episode);

            report.outcomes.push(self.rename_file(file));
        }
    }

    pub fn rename_file(&self, file: &VideoFile) -> RenameOutcome {
        let original_name = file.original_name();

        if original_name == file.new_name {
            debug!("No changes needed for {}", original_name);
            return RenameOutcome::Unchanged {
                file_name: original_name,
            };
        }

        match self.backend.rename(&file.file_path, &file.target_path()) {
            Ok(()) => {
                debug!("Renamed {} -> {}", original_name, file.new_name);
                RenameOutcome::Renamed {
                    file_name: original_name,
                    new_name: file.new_name.clone(),
                }
            }
            Err(e) => {
                warn!("Failed to rename {} - {}", original_name, e);
                RenameOutcome::Failed(RenameFailure {
                    file_name: original_name,
                    error_message: e.to_string(),
                })
            }
        }
    }
}

/// Rename a scanned library on disk with the default numbering policy.
pub fn rename(library: &mut Library) -> RenameReport {
    RenameEngine::with_backend(NumberingPolicy::default(), FsBackend).rename_library(library)
}

pub struct ConfigBuilder {
    root: Option<PathBuf>,
    policy: NumberingPolicy,
    dry_run: bool,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            root: None,
            policy: NumberingPolicy::default(),
            dry_run: false,
        }
    }

    pub fn root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.root = Some(root.as_ref().to_path_buf());
        self
    }

    pub fn policy(mut self, policy: NumberingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn build(self) -> Result<RenameConfig> {
        let root = self
            .root
            .filter(|root| !root.as_os_str().is_empty())
            .ok_or_else(|| anyhow::anyhow!("Root directory is required"))?;

        Ok(RenameConfig {
            root,
            policy: self.policy,
            dry_run: self.dry_run,
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_keeps_small_parsed_numbers() {
        assert_eq!(NumberingPolicy::Clamp.episode_for(1, 1), 1);
        assert_eq!(NumberingPolicy::Clamp.episode_for(2, 5), 2);
    }

    #[test]
    fn test_clamp_discards_large_parsed_numbers() {
        // A real episode 45 sorted second becomes episode 2.
        assert_eq!(NumberingPolicy::Clamp.episode_for(45, 2), 2);
    }

    #[test]
    fn test_unparsed_uses_position_under_every_policy() {
        let policies = [
            NumberingPolicy::Clamp,
            NumberingPolicy::Positional,
            NumberingPolicy::Parsed,
        ];
        for policy in policies {
            assert_eq!(policy.episode_for(0, 3), 3);
        }
    }

    #[test]
    fn test_other_policies() {
        assert_eq!(NumberingPolicy::Positional.episode_for(1, 4), 4);
        assert_eq!(NumberingPolicy::Parsed.episode_for(45, 2), 45);
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .root("/test/path")
            .policy(NumberingPolicy::Positional)
            .dry_run(true)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/test/path"));
        assert_eq!(config.policy, NumberingPolicy::Positional);
        assert!(config.dry_run);
    }

    #[test]
    fn test_config_builder_requires_root() {
        assert!(ConfigBuilder::new().build().is_err());
        assert!(ConfigBuilder::new().root("").build().is_err());
    }

    #[test]
    fn test_report_folds() {
        let report = RenameReport {
            outcomes: vec![
                RenameOutcome::Renamed {
                    file_name: "a.mp4".to_string(),
                    new_name: "S01E01.mp4".to_string(),
                },
                RenameOutcome::Unchanged {
                    file_name: "S01E02.mp4".to_string(),
                },
                RenameOutcome::Failed(RenameFailure {
                    file_name: "c.mp4".to_string(),
                    error_message: "denied".to_string(),
                }),
            ],
        };

        assert_eq!(report.success_count(), 2);
        assert_eq!(report.renamed_count(), 1);
        assert_eq!(report.unchanged_count(), 1);
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.failures()[0].file_name, "c.mp4");
        assert!(report.has_failures());
        assert_eq!(report.renames(), [("a.mp4", "S01E01.mp4")]);
    }

    #[test]
    fn test_dry_run_frees_vacated_targets() {
        let dir = tempfile::tempdir().unwrap();
        let season = dir.path();
        fs::write(season.join("S01E02.mp4"), b"").unwrap();
        fs::write(season.join("S01E03.mp4"), b"").unwrap();
        let backend = DryRunBackend::new();

        backend
            .rename(&season.join("S01E02.mp4"), &season.join("S01E01.mp4"))
            .unwrap();
        backend
            .rename(&season.join("S01E03.mp4"), &season.join("S01E02.mp4"))
            .unwrap();

        let err = backend
            .rename(&season.join("S01E02.mp4"), &season.join("S01E01.mp4"))
            .unwrap_err();
        assert!(matches!(err, RenameError::AlreadyExists(_)));
        let err = backend
            .rename(&season.join("S01E03.mp4"), &season.join("S01E09.mp4"))
            .unwrap_err();
        assert!(matches!(err, RenameError::SourceNotFound(_)));
        assert!(season.join("S01E03.mp4").exists());
    }

    #[test]
    fn test_is_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let lower = dir.path().join("s01e01.mp4");
        let other = dir.path().join("other.mp4");
        fs::write(&lower, b"").unwrap();
        fs::write(&other, b"").unwrap();

        assert!(is_same_file(&lower, &lower));
        assert!(!is_same_file(&lower, &other));
        assert!(!is_same_file(&lower, &dir.path().join("missing.mp4")));
    }

    #[cfg(unix)]
    #[test]
    fn test_hard_link_with_other_name_is_not_the_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("ep1.mp4");
        let link = dir.path().join("S01E01.mp4");
        fs::write(&source, b"").unwrap();
        fs::hard_link(&source, &link).unwrap();

        assert!(!is_same_file(&source, &link));
        let err = FsBackend.rename(&source, &link).unwrap_err();
        assert!(matches!(err, RenameError::AlreadyExists(_)));
    }

    #[test]
    fn test_case_variant_of_another_file_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let lower = dir.path().join("s01e01.mp4");
        let upper = dir.path().join("S01E01.mp4");
        fs::write(&lower, b"lower").unwrap();

        if upper.exists() {
            // Case-insensitive filesystem: both names are one file.
            assert!(is_same_file(&lower, &upper));
            FsBackend.rename(&lower, &upper).unwrap();
            assert_eq!(fs::read(&upper).unwrap(), b"lower");
        } else {
            fs::write(&upper, b"upper").unwrap();
            assert!(!is_same_file(&lower, &upper));
            let err = FsBackend.rename(&lower, &upper).unwrap_err();
            assert!(matches!(err, RenameError::AlreadyExists(_)));
            assert_eq!(fs::read(&upper).unwrap(), b"upper");
        }
    }
}
