//! Local music library
//!
//! Scans the root folder for audio files once at startup. Tracks are ordered
//! by relative path and chained into a cycle through `next`/`previous`.

use super::{CompletionSource, SearchProvider};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tuneport_common::Track;
use walkdir::WalkDir;

/// File extensions treated as audio
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "wav", "m4a", "aac", "opus"];

/// Maximum number of autocomplete suggestions
const MAX_SUGGESTIONS: usize = 10;

pub struct LocalLibrary {
    root: PathBuf,
    tracks: Vec<Track>,
}

impl LocalLibrary {
    pub const NAME: &'static str = "local";

    /// Library with no tracks
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tracks: Vec::new(),
        }
    }

    /// Walk `root` recursively and index every audio file
    pub fn scan(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::NotFound(format!(
                "Library root {} is not a directory",
                root.display()
            )));
        }

        let mut relative: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable library entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && is_audio_file(entry.path()))
            .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
            .collect();
        relative.sort();

        let ids: Vec<String> = relative.iter().map(|p| track_id(p)).collect();
        let count = ids.len();

        let tracks = relative
            .iter()
            .enumerate()
            .map(|(index, path)| {
                let (next, previous) = if count > 1 {
                    (
                        ids[(index + 1) % count].clone(),
                        ids[(index + count - 1) % count].clone(),
                    )
                } else {
                    (String::new(), String::new())
                };

                Track {
                    id: ids[index].clone(),
                    title: path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    thumbnail: String::new(),
                    provider: Self::NAME.to_string(),
                    stream_url: root.join(path).to_string_lossy().into_owned(),
                    next,
                    previous,
                    duration: 0,
                    last_played: None,
                }
            })
            .collect();

        info!(root = %root.display(), tracks = count, "Library scanned");
        Ok(Self {
            root: root.to_path_buf(),
            tracks,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Relative path with forward slashes on every platform
fn track_id(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl SearchProvider for LocalLibrary {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn search(&self, query: &str) -> Result<Vec<Track>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .tracks
            .iter()
            .filter(|t| t.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn resolve(&self, id: &str) -> Result<Track> {
        self.tracks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Track '{}' not in local library", id)))
    }
}

/// Title suggestions drawn from the local library
pub struct LibraryCompleter {
    library: Arc<LocalLibrary>,
}

impl LibraryCompleter {
    pub const NAME: &'static str = "local-titles";

    pub fn new(library: Arc<LocalLibrary>) -> Self {
        Self { library }
    }
}

#[async_trait]
impl CompletionSource for LibraryCompleter {
    fn name(&self) -> &str {
        Self::NAME
    }

    /// Titles starting with the query first, then titles containing it
    async fn complete(&self, query: &str) -> Result<Vec<String>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut prefixed = Vec::new();
        let mut containing = Vec::new();
        for track in self.library.tracks() {
            let title = track.title.to_lowercase();
            if title.starts_with(&needle) {
                prefixed.push(track.title.clone());
            } else if title.contains(&needle) {
                containing.push(track.title.clone());
            }
        }

        let mut suggestions: Vec<String> = Vec::with_capacity(MAX_SUGGESTIONS);
        for title in prefixed.into_iter().chain(containing) {
            if suggestions.len() == MAX_SUGGESTIONS {
                break;
            }
            if !suggestions.contains(&title) {
                suggestions.push(title);
            }
        }
        Ok(suggestions)
    }
}
