use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::episode_parser::ParsedEpisode;

/// Container formats picked up by the scanner, compared against the
/// lower-cased extension.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".mkv", ".wmv", ".mpeg", ".mpegts", ".mov", ".avi", ".asf", ".flv", ".m4v", ".mpg",
];

pub fn is_video_extension(file_type: &str) -> bool {
    VIDEO_EXTENSIONS.contains(&file_type.to_lowercase().as_str())
}

/// Lower-cased extension of `path` with its leading dot, or an empty string.
pub fn file_type_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// One video file found inside a season folder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoFile {
    pub season: u32,
    /// Parsed episode number, `0` when parsing failed.
    pub episode: u32,
    pub episode_title: Option<String>,
    pub file_path: PathBuf,
    /// Base name without directory or extension.
    pub file_name: String,
    /// Lower-cased extension including the dot.
    pub file_type: String,
    pub directory: PathBuf,
    /// Empty until the rename engine has numbered the season.
    pub new_name: String,
}

impl VideoFile {
    pub fn new(file_path: PathBuf, season: u32, parsed: ParsedEpisode) -> Self {
        let file_name = file_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        let file_type = file_type_of(&file_path);
        let directory = file_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self {
            season,
            episode: parsed.episode,
            episode_title: parsed.title,
            file_path,
            file_name,
            file_type,
            directory,
            new_name: String::new(),
        }
    }

    /// File name currently on disk, extension included.
    pub fn original_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn target_path(&self) -> PathBuf {
        self.directory.join(&self.new_name)
    }

    pub fn canonical_name(&self, episode: u32) -> String {
        canonical_name(self.season, episode, self.episode_title.as_deref(), &self.file_type)
    }
}

/// `S<season>E<episode>[ title]<ext>`, both numbers padded to two digits.
///
/// The word "episode" is dropped from the title in any letter case.
pub fn canonical_name(season: u32, episode: u32, title: Option<&str>, file_type: &str) -> String {
    let title = title
        .map(|title| {
            title
                .split_whitespace()
                .filter(|word| !word.eq_ignore_ascii_case("episode"))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|title| !title.is_empty())
        .map(|title| format!(" {}", title))
        .unwrap_or_default();

    format!("S{:02}E{:02}{}{}", season, episode, title, file_type)
}
