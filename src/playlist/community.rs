use super::playlist_models::CommunityPlaylist;
use super::playlist_store::PlaylistStore;
use crate::error::{CompanionError, CompanionResult};
use crate::store::FullStore;
use std::sync::Arc;

pub const COMMUNITY_SEARCH_LIMIT: usize = 50;

/// Read-only view over the playlists profiles have left discoverable.
pub struct CommunityDirectory {
    store: Arc<dyn FullStore>,
}

impl CommunityDirectory {
    pub fn new(store: Arc<dyn FullStore>) -> Self {
        Self { store }
    }

    /// Matches `term` against playlist names. A blank term lists the most
    /// recently updated discoverable playlists.
    pub fn search_public_playlists(&self, term: &str) -> CompanionResult<Vec<CommunityPlaylist>> {
        Ok(self
            .store
            .search_discoverable_playlists(term.trim(), COMMUNITY_SEARCH_LIMIT)?)
    }

    pub fn get_public_playlist(&self, playlist_id: &str) -> CompanionResult<CommunityPlaylist> {
        self.store
            .get_community_playlist(playlist_id)?
            .ok_or_else(|| CompanionError::NotFound(format!("community playlist {}", playlist_id)))
    }
}
