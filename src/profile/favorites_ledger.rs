use super::profile_models::{FavoriteAlbum, FavoriteArtist, Favorites};
use crate::error::{CompanionError, CompanionResult};
use crate::store::FullStore;
use std::sync::Arc;
use tracing::debug;

/// Per-profile favorite artists and albums. Append-only: an id that is
/// already present is left as it is.
pub struct FavoritesLedger {
    store: Arc<dyn FullStore>,
}

impl FavoritesLedger {
    pub fn new(store: Arc<dyn FullStore>) -> Self {
        Self { store }
    }

    fn ensure_profile(&self, profile_id: &str) -> CompanionResult<()> {
        match self.store.get_profile(profile_id)? {
            Some(_) => Ok(()),
            None => Err(CompanionError::NotFound(format!("profile {}", profile_id))),
        }
    }

    fn ensure_id(id: &str) -> CompanionResult<()> {
        if id.trim().is_empty() {
            return Err(CompanionError::InvalidInput(
                "A catalog id is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn add_favorite_artist(
        &self,
        profile_id: &str,
        artist: &FavoriteArtist,
    ) -> CompanionResult<()> {
        Self::ensure_id(&artist.id)?;
        self.ensure_profile(profile_id)?;
        if !self.store.add_favorite_artist(profile_id, artist)? {
            debug!("Artist {} already a favorite of {}", artist.id, profile_id);
        }
        Ok(())
    }

    pub fn add_favorite_album(&self, profile_id: &str, album: &FavoriteAlbum) -> CompanionResult<()> {
        Self::ensure_id(&album.id)?;
        self.ensure_profile(profile_id)?;
        if !self.store.add_favorite_album(profile_id, album)? {
            debug!("Album {} already a favorite of {}", album.id, profile_id);
        }
        Ok(())
    }

    pub fn list_favorites(&self, profile_id: &str) -> CompanionResult<Favorites> {
        self.ensure_profile(profile_id)?;
        Ok(self.store.get_favorites(profile_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountStore;
    use crate::catalog::CatalogImage;
    use crate::profile::{ProfileFields, ProfileStore, ProfileType};
    use crate::store::SqliteCompanionStore;
    use tempfile::TempDir;

    fn create_ledger() -> (FavoritesLedger, String, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteCompanionStore::new(temp_dir.path().join("test.db")).unwrap());
        let account_id = store.create_account("owner@example.com", "Owner").unwrap();
        let profile = store
            .create_profile(
                account_id,
                &ProfileFields {
                    name: "Mili".to_string(),
                    profile_type: ProfileType::Adult,
                    avatar: "<svg/>".to_string(),
                    language: "es".to_string(),
                    age_restriction: 18,
                },
            )
            .unwrap();
        (FavoritesLedger::new(store), profile.id, temp_dir)
    }

    fn artist(id: &str, name: &str) -> FavoriteArtist {
        FavoriteArtist {
            id: id.to_string(),
            name: name.to_string(),
            images: vec![CatalogImage {
                url: format!("https://img.example.com/{id}"),
                width: Some(64),
                height: Some(64),
            }],
        }
    }

    #[test]
    fn adding_the_same_artist_twice_keeps_one_entry() {
        let (ledger, profile_id, _dir) = create_ledger();

        ledger
            .add_favorite_artist(&profile_id, &artist("a1", "First"))
            .unwrap();
        ledger
            .add_favorite_artist(&profile_id, &artist("a1", "Renamed"))
            .unwrap();
        ledger
            .add_favorite_artist(&profile_id, &artist("a2", "Second"))
            .unwrap();

        let favorites = ledger.list_favorites(&profile_id).unwrap();
        let a1: Vec<_> = favorites.artists.iter().filter(|a| a.id == "a1").collect();
        assert_eq!(a1.len(), 1);
        assert_eq!(a1[0].name, "First");
        assert_eq!(a1[0].images.len(), 1);
        assert_eq!(favorites.artists.len(), 2);
    }

    #[test]
    fn albums_are_idempotent_too() {
        let (ledger, profile_id, _dir) = create_ledger();
        let album = FavoriteAlbum {
            id: "al1".to_string(),
            name: "Album".to_string(),
            images: vec![],
        };
        ledger.add_favorite_album(&profile_id, &album).unwrap();
        ledger.add_favorite_album(&profile_id, &album).unwrap();

        let favorites = ledger.list_favorites(&profile_id).unwrap();
        assert_eq!(favorites.albums, vec![album]);
        assert!(favorites.artists.is_empty());
    }

    #[test]
    fn unknown_profile_and_blank_ids_are_rejected() {
        let (ledger, profile_id, _dir) = create_ledger();
        assert!(matches!(
            ledger
                .add_favorite_artist("missing", &artist("a1", "x"))
                .unwrap_err(),
            CompanionError::NotFound(_)
        ));
        assert!(matches!(
            ledger
                .add_favorite_artist(&profile_id, &artist(" ", "x"))
                .unwrap_err(),
            CompanionError::InvalidInput(_)
        ));
    }
}
