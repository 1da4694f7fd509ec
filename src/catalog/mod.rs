//! Read-only access to the external music catalog.

mod browse;
mod catalog_models;
mod in_memory_catalog;
mod spotify_client;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub use browse::{browse, BROWSE_LIMIT, BROWSE_TERMS};
pub use catalog_models::*;
pub use in_memory_catalog::InMemoryCatalog;
pub use spotify_client::{SpotifyCatalogClient, SpotifyCredentials};

/// The catalog provider as seen by the companion. Entity lookups that are
/// only forwarded to clients return raw JSON. The playlist calls are typed,
/// since imports read them.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Returns an object keyed by result group (`tracks`, `artists`, ...),
    /// each holding a page with `items`.
    async fn search(&self, query: &str, kinds: &[SearchKind], limit: u32) -> Result<Value>;

    async fn get_track(&self, id: &str) -> Result<Value>;

    async fn get_artist(&self, id: &str) -> Result<Value>;

    async fn get_artist_top_tracks(&self, id: &str) -> Result<Value>;

    async fn get_artist_albums(&self, id: &str) -> Result<Value>;

    async fn get_album(&self, id: &str) -> Result<Value>;

    async fn get_playlist(&self, id: &str) -> Result<CatalogPlaylist>;

    /// Returns the complete track listing, in playlist order.
    async fn get_playlist_tracks(&self, id: &str) -> Result<Vec<PlaylistTrackItem>>;

    async fn get_recommendations(&self, seeds: &RecommendationSeeds) -> Result<Value>;
}
