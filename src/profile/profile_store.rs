use super::profile_models::{FavoriteAlbum, FavoriteArtist, Favorites, Profile, ProfileFields};
use anyhow::Result;

pub trait ProfileStore: Send + Sync {
    /// Creates a profile owned by the account and returns it.
    fn create_profile(&self, owner_account_id: usize, fields: &ProfileFields) -> Result<Profile>;

    /// Returns Ok(None) if the profile does not exist.
    fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>>;

    /// Returns all profiles of an account, oldest first.
    fn list_profiles(&self, owner_account_id: usize) -> Result<Vec<Profile>>;

    /// Overwrites every mutable field. Returns false if the profile does
    /// not exist.
    fn update_profile(&self, profile_id: &str, fields: &ProfileFields) -> Result<bool>;

    /// Deletes the profile together with its playlists and favorites.
    /// Returns false if the profile does not exist.
    fn delete_profile(&self, profile_id: &str) -> Result<bool>;
}

pub trait FavoritesStore: Send + Sync {
    /// Adds an artist to the profile's favorites. Returns false, and leaves
    /// the stored entry alone, if the artist id is already there.
    fn add_favorite_artist(&self, profile_id: &str, artist: &FavoriteArtist) -> Result<bool>;

    /// Same contract as [FavoritesStore::add_favorite_artist].
    fn add_favorite_album(&self, profile_id: &str, album: &FavoriteAlbum) -> Result<bool>;

    fn get_favorites(&self, profile_id: &str) -> Result<Favorites>;
}
