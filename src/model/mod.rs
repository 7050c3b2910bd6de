//! Core data models supplied by the feed provider.
//!
//! Defines [`Episode`], the read-only metadata a player handle is built from.
//! Feed fetching and persistence live outside this crate; these values are
//! shared behind `Arc` and never mutated once constructed.

use std::path::{Path, PathBuf};

/// A podcast episode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Episode {
    /// Episode title
    pub title: String,
    /// Title of the feed this episode belongs to
    pub feed_title: String,
    /// Episode description (may contain markup from the feed)
    pub description: String,
    /// Web page link
    pub link: String,
    /// Publication date as given by the feed
    pub pubdate: String,
    /// Copyright notice
    pub copyright: String,
    /// Enclosure URL of the media file
    pub enclosure: String,
    /// Local copy of the media, if downloaded
    pub downloaded: Option<PathBuf>,
}

impl Episode {
    /// Create an episode with just a title and enclosure.
    pub fn new(title: impl Into<String>, enclosure: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            enclosure: enclosure.into(),
            ..Default::default()
        }
    }

    /// Build an episode for a bare file path or URL, titled after its file stem.
    pub fn from_locator(locator: &str) -> Self {
        let title = Path::new(locator.trim_end_matches('/'))
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        let mut episode = Self::new(title, locator);
        if !is_remote(locator) {
            episode.downloaded = Some(PathBuf::from(locator));
        }
        episode
    }

    /// The locator handed to the player: the downloaded file when present,
    /// otherwise the enclosure URL.
    pub fn media_locator(&self) -> String {
        match &self.downloaded {
            Some(path) => path.to_string_lossy().to_string(),
            None => self.enclosure.clone(),
        }
    }

    /// Get display title.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "Untitled Episode"
        } else {
            &self.title
        }
    }
}

fn is_remote(locator: &str) -> bool {
    locator.contains("://")
}
