use regex::Regex;
use tracing::warn;

use crate::error::ScanError;

/// Episode number and leftover title text parsed from a file's base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEpisode {
    /// `0` when no number could be found.
    pub episode: u32,
    pub title: Option<String>,
}

impl ParsedEpisode {
    pub fn unparsed() -> Self {
        Self {
            episode: 0,
            title: None,
        }
    }

    pub fn is_unparsed(&self) -> bool {
        self.episode == 0
    }
}

#[derive(Debug, Clone)]
pub struct EpisodeParser {
    standard_pattern: Regex,
    digit_pattern: Regex,
    marker_pattern: Regex,
}

impl EpisodeParser {
    pub fn new() -> Result<Self, regex::Error> {
        let standard_pattern =
            Regex::new(r"(?i)S(?P<season>[0-9]{2,3})E(?P<episode>[0-9]{2,3})")?;
        let digit_pattern = Regex::new(r"[0-9]{1,3}")?;
        let marker_pattern = Regex::new(r"(?i)\b(?:episode|ep)\b")?;

        Ok(Self {
            standard_pattern,
            digit_pattern,
            marker_pattern,
        })
    }

    /// Parse a base name (extension already stripped).
    ///
    /// An `SxxExx` token wins over a bare digit run, which wins over a
    /// delimiter-separated integer token. Names with no number at all are
    /// logged and come back as [`ParsedEpisode::unparsed`].
    pub fn parse(&self, base_name: &str) -> ParsedEpisode {
        if let Some(captures) = self.standard_pattern.captures(base_name) {
            let token = captures.get(0).map(|m| m.range());
            let episode = captures
                .name("episode")
                .and_then(|m| m.as_str().parse::<u32>().ok());

            if let (Some(range), Some(episode)) = (token, episode) {
                return ParsedEpisode {
                    episode,
                    title: self.clean_title(&remove_span(base_name, range)),
                };
            }
        }

        if let Some(m) = self.digit_pattern.find(base_name) {
            if let Ok(episode) = m.as_str().parse::<u32>() {
                return ParsedEpisode {
                    episode,
                    title: self.clean_title(&remove_span(base_name, m.range())),
                };
            }
        }

        if let Some(episode) = delimited_number(base_name) {
            return ParsedEpisode {
                episode,
                title: None,
            };
        }

        warn!(file = base_name, "Cannot parse episode number");
        ParsedEpisode::unparsed()
    }

    /// Strip episode markers, underscores and stray separators from the
    /// residual text of a base name.
    pub fn clean_title(&self, residual: &str) -> Option<String> {
        let spaced = residual.replace('_', " ");
        let without_markers = self.marker_pattern.replace_all(&spaced, " ");
        let collapsed = without_markers.split_whitespace().collect::<Vec<_>>().join(" ");
        let title = collapsed.trim_matches(&[' ', '-', '.', '_'] as &[char]).trim();

        if title.is_empty() {
            None
        } else {
            Some(title.to_string())
        }
    }
}

fn remove_span(text: &str, range: std::ops::Range<usize>) -> String {
    format!("{}{}", &text[..range.start], &text[range.end..])
}

/// Last-resort lookup: the first integer token when the name is split on
/// `_`, `-` or `.`, tried in that order.
fn delimited_number(base_name: &str) -> Option<u32> {
    ['_', '-', '.']
        .iter()
        .filter(|delimiter| base_name.contains(**delimiter))
        .find_map(|delimiter| {
            base_name
                .split(*delimiter)
                .find_map(|token| token.trim().parse::<u32>().ok())
        })
}

/// Season number from a season folder name such as `Season 03`.
pub fn parse_season(folder_name: &str) -> Result<u32, ScanError> {
    folder_name
        .split_whitespace()
        .last()
        .and_then(|token| token.parse::<u32>().ok())
        .ok_or_else(|| ScanError::InvalidSeasonFolder {
            folder: folder_name.to_string(),
        })
}
