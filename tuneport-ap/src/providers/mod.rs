//! Search providers, completion sources and their registry
//!
//! Collaborators are registered by name at startup and looked up
//! case-insensitively. Multi-collaborator queries go through the concurrent
//! aggregator.

mod library;

pub use library::{LibraryCompleter, LocalLibrary};

use crate::aggregate::{run_concurrent, AggregateOutcome};
use crate::error::{Error, Result};
use crate::playback::PlayerHandle;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};
use tuneport_common::Track;

/// Source of playable tracks
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<Vec<Track>>;

    /// Look up one track by its provider-scoped id
    async fn resolve(&self, id: &str) -> Result<Track>;
}

/// Source of autocomplete suggestions
#[async_trait]
pub trait CompletionSource: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, query: &str) -> Result<Vec<String>>;
}

/// Name-keyed set of collaborators
#[derive(Default)]
pub struct Registry {
    providers: Vec<Arc<dyn SearchProvider>>,
    completers: Vec<Arc<dyn CompletionSource>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_provider(&mut self, provider: Arc<dyn SearchProvider>) -> Result<()> {
        if self.find_provider(provider.name()).is_some() {
            return Err(Error::Config(format!(
                "Search provider '{}' registered twice",
                provider.name()
            )));
        }
        info!(provider = provider.name(), "Registered search provider");
        self.providers.push(provider);
        Ok(())
    }

    pub fn register_completer(&mut self, completer: Arc<dyn CompletionSource>) -> Result<()> {
        if self.find_completer(completer.name()).is_some() {
            return Err(Error::Config(format!(
                "Completion source '{}' registered twice",
                completer.name()
            )));
        }
        info!(completer = completer.name(), "Registered completion source");
        self.completers.push(completer);
        Ok(())
    }

    fn find_provider(&self, name: &str) -> Option<&Arc<dyn SearchProvider>> {
        self.providers
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    fn find_completer(&self, name: &str) -> Option<&Arc<dyn CompletionSource>> {
        self.completers
            .iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }

    pub fn provider(&self, name: &str) -> Result<Arc<dyn SearchProvider>> {
        self.find_provider(name)
            .cloned()
            .ok_or_else(|| Error::UnknownCollaborator(name.to_string()))
    }

    pub fn completer(&self, name: &str) -> Result<Arc<dyn CompletionSource>> {
        self.find_completer(name)
            .cloned()
            .ok_or_else(|| Error::UnknownCollaborator(name.to_string()))
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Search every provider concurrently
    pub async fn search(&self, query: &str) -> AggregateOutcome<Track> {
        let query = query.to_string();
        run_concurrent(
            self.providers.clone(),
            move |provider: Arc<dyn SearchProvider>| {
                let query = query.clone();
                async move {
                    match provider.search(&query).await {
                        Ok(tracks) => {
                            debug!(
                                provider = provider.name(),
                                count = tracks.len(),
                                "Search answered"
                            );
                            Ok(tracks)
                        }
                        Err(e) => Err(format!("{}: {}", provider.name(), e)),
                    }
                }
            },
        )
        .await
    }

    /// Ask every completion source concurrently
    pub async fn autocomplete(&self, query: &str) -> AggregateOutcome<String> {
        let query = query.to_string();
        run_concurrent(
            self.completers.clone(),
            move |completer: Arc<dyn CompletionSource>| {
                let query = query.clone();
                async move {
                    match completer.complete(&query).await {
                        Ok(suggestions) => {
                            debug!(
                                completer = completer.name(),
                                count = suggestions.len(),
                                "Autocomplete answered"
                            );
                            Ok(suggestions)
                        }
                        Err(e) => Err(format!("{}: {}", completer.name(), e)),
                    }
                }
            },
        )
        .await
    }
}

/// Resolve `id` with the named provider and play the result
pub async fn play_from_provider(
    registry: &Registry,
    player: &PlayerHandle,
    provider: &str,
    id: &str,
) -> Result<()> {
    let provider = registry.provider(provider)?;
    let track = provider.resolve(id).await?;
    info!(provider = provider.name(), id, title = %track.title, "Playing resolved track");
    player.play(track).await
}
