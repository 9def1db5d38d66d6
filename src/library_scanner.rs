use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::episode_parser::{parse_season, EpisodeParser};
use crate::error::ScanError;
use crate::video_file::{file_type_of, is_video_extension, VideoFile};

/// Season folder name mapped to its video files, sorted by parsed episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Library {
    seasons: BTreeMap<String, Vec<VideoFile>>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a season, sorting its files by `(episode, file_name)`. Unparsed
    /// episodes (`0`) land first.
    pub fn insert_season(&mut self, folder: impl Into<String>, mut files: Vec<VideoFile>) {
        files.sort_by(|a, b| {
            a.episode
                .cmp(&b.episode)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
        self.seasons.insert(folder.into(), files);
    }

    pub fn seasons(&self) -> &BTreeMap<String, Vec<VideoFile>> {
        &self.seasons
    }

    pub fn seasons_mut(&mut self) -> impl Iterator<Item = (&String, &mut Vec<VideoFile>)> {
        self.seasons.iter_mut()
    }

    pub fn season(&self, folder: &str) -> Option<&[VideoFile]> {
        self.seasons.get(folder).map(Vec::as_slice)
    }

    pub fn file_count(&self) -> usize {
        self.seasons.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.file_count() == 0
    }

    /// Files whose base name yielded no episode number.
    pub fn unparsed(&self) -> impl Iterator<Item = &VideoFile> {
        self.seasons
            .values()
            .flatten()
            .filter(|file| file.episode == 0)
    }
}

#[derive(Debug, Clone)]
pub struct LibraryScanner {
    parser: EpisodeParser,
}

impl LibraryScanner {
    pub fn new() -> Result<Self, ScanError> {
        Ok(Self {
            parser: EpisodeParser::new()?,
        })
    }

    /// Scan every immediate subdirectory of `root` as a season folder.
    ///
    /// Fails when `root` is missing or any subdirectory name does not end in
    /// a season number; no partial library is returned in either case.
    pub fn scan(&self, root: &Path) -> Result<Library, ScanError> {
        if !root.exists() {
            return Err(ScanError::RootNotFound(root.to_path_buf()));
        }

        let mut folders: Vec<(String, PathBuf)> = read_dir(root)?
            .into_iter()
            .filter(|path| path.is_dir())
            .map(|path| (lossy_file_name(&path), path))
            .collect();
        folders.sort();

        let mut library = Library::new();
        for (folder, path) in folders {
            let season = parse_season(&folder)?;
            let files = self.scan_season(&path, season)?;
            info!(season = %folder, files = files.len(), "Scanned season folder");
            library.insert_season(folder, files);
        }

        Ok(library)
    }

    /// Video files directly inside `directory`; nested folders are ignored.
    pub fn scan_season(&self, directory: &Path, season: u32) -> Result<Vec<VideoFile>, ScanError> {
        let files = read_dir(directory)?
            .into_iter()
            .filter(|path| path.is_file())
            .filter(|path| is_video_extension(&file_type_of(path)))
            .map(|path| {
                let stem = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
                    .unwrap_or_default();
                let parsed = self.parser.parse(&stem);
                debug!(file = %path.display(), episode = parsed.episode, "Parsed episode");
                VideoFile::new(path, season, parsed)
            })
            .collect();

        Ok(files)
    }
}

/// Scan `root` with a freshly built [`LibraryScanner`].
pub fn scan(root: impl AsRef<Path>) -> Result<Library, ScanError> {
    LibraryScanner::new()?.scan(root.as_ref())
}

fn read_dir(directory: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let entries = fs::read_dir(directory).map_err(|source| ScanError::Io {
        path: directory.to_path_buf(),
        source,
    })?;

    Ok(entries
        .filter_map(|entry| readable_path(directory, entry.map(|entry| entry.path())))
        .collect())
}

/// Unreadable directory entries are logged and skipped.
fn readable_path(directory: &Path, entry: io::Result<PathBuf>) -> Option<PathBuf> {
    match entry {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("Skipping unreadable entry in {:?}: {}", directory, e);
            None
        }
    }
}

fn lossy_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readable_path_skips_errors() {
        let dir = Path::new("/tv/Season 1");

        let path = readable_path(dir, Ok(dir.join("ep1.mp4")));
        assert_eq!(path, Some(dir.join("ep1.mp4")));

        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(readable_path(dir, Err(denied)), None);
    }
}
