use super::playlist_models::{CommunityPlaylist, NewPlaylist, Playlist, PlaylistUpdate, Song};
use anyhow::Result;

pub trait PlaylistStore: Send + Sync {
    /// Persists a playlist with its songs in one transaction.
    fn create_playlist(&self, playlist: &NewPlaylist) -> Result<Playlist>;

    /// Returns Ok(None) if the playlist does not exist.
    fn get_playlist(&self, playlist_id: &str) -> Result<Option<Playlist>>;

    /// Returns the profile's playlists, oldest first.
    fn list_playlists(&self, profile_id: &str) -> Result<Vec<Playlist>>;

    /// Applies the update in one transaction. A song list replaces the
    /// stored one entirely. Returns false if the playlist does not exist.
    fn update_playlist(&self, playlist_id: &str, update: &PlaylistUpdate) -> Result<bool>;

    /// Appends a song at the end of the playlist. Returns false, without
    /// changing anything, if a song with the same spotify id is present.
    fn append_song(&self, playlist_id: &str, song: &Song) -> Result<bool>;

    /// Removes the song whose local id, or failing that spotify id, equals
    /// `song_ref`. Returns whether a song was removed.
    fn remove_song(&self, playlist_id: &str, song_ref: &str) -> Result<bool>;

    /// Returns false if the playlist does not exist.
    fn delete_playlist(&self, playlist_id: &str) -> Result<bool>;

    /// Discoverable playlists whose name contains `term`, case-insensitive,
    /// most recently updated first.
    fn search_discoverable_playlists(&self, term: &str, limit: usize)
        -> Result<Vec<CommunityPlaylist>>;

    /// Looks up a single discoverable playlist with its owner name.
    fn get_community_playlist(&self, playlist_id: &str) -> Result<Option<CommunityPlaylist>>;
}
