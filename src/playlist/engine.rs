//! Per-profile playlist collections, fed from manual edits, the catalog and
//! the community directory.

use super::community::CommunityDirectory;
use super::playlist_models::{
    new_song_id, CommunityPlaylist, NewPlaylist, Playlist, PlaylistOrigin, PlaylistPatch,
    PlaylistUpdate, RemoveSongOutcome, Song, SongDraft,
};
use super::playlist_store::PlaylistStore;
use crate::catalog::{CatalogGateway, PlaylistTrackItem};
use crate::error::{CompanionError, CompanionResult};
use crate::metrics::{record_catalog_failure, record_playlist_mutation};
use crate::profile::{can_import_from_catalog, Profile, ProfileStore};
use crate::store::FullStore;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const MAX_PLAYLIST_SIZE: usize = 500;
pub const ANONYMOUS_OWNER: &str = "Anónimo";

pub struct PlaylistEngine {
    store: Arc<dyn FullStore>,
    catalog: Arc<dyn CatalogGateway>,
    community: CommunityDirectory,
}

fn required_name(name: &str) -> CompanionResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CompanionError::InvalidInput(
            "Playlist name is required".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn check_size(len: usize) -> CompanionResult<()> {
    if len > MAX_PLAYLIST_SIZE {
        return Err(CompanionError::InvalidInput(format!(
            "Playlists hold at most {} songs",
            MAX_PLAYLIST_SIZE
        )));
    }
    Ok(())
}

fn check_song(song: &Song) -> CompanionResult<()> {
    if song.title.trim().is_empty() && song.spotify_id.is_none() {
        return Err(CompanionError::InvalidInput(
            "A song needs a title or a spotify id".to_string(),
        ));
    }
    Ok(())
}

/// Drops songs whose spotify id already appeared earlier in the list.
fn dedupe_by_spotify_id(songs: Vec<Song>) -> Vec<Song> {
    let mut seen = HashSet::new();
    songs
        .into_iter()
        .filter(|song| match &song.spotify_id {
            Some(spotify_id) => seen.insert(spotify_id.clone()),
            None => true,
        })
        .collect()
}

/// Flattens a catalog track listing into song snapshots, in listing order.
/// Unresolvable entries are skipped.
fn songs_from_catalog(items: Vec<PlaylistTrackItem>) -> Vec<Song> {
    let songs = items
        .into_iter()
        .filter_map(|item| item.track)
        .map(|track| Song {
            id: new_song_id(),
            artist: track.artist_line(),
            cover: track.cover_url(),
            spotify_id: track.id,
            title: track.name,
        })
        .collect();
    dedupe_by_spotify_id(songs)
}

pub fn community_copy_name(source_name: &str, owner_name: &str) -> String {
    let owner = owner_name.trim();
    let owner = if owner.is_empty() { ANONYMOUS_OWNER } else { owner };
    format!("{} (de {})", source_name, owner)
}

impl PlaylistEngine {
    pub fn new(store: Arc<dyn FullStore>, catalog: Arc<dyn CatalogGateway>) -> Self {
        Self {
            community: CommunityDirectory::new(store.clone()),
            store,
            catalog,
        }
    }

    fn load(&self, playlist_id: &str) -> CompanionResult<Playlist> {
        self.store
            .get_playlist(playlist_id)?
            .ok_or_else(|| CompanionError::NotFound(format!("playlist {}", playlist_id)))
    }

    /// Loads a playlist the acting profile owns.
    fn load_owned(&self, acting: &Profile, playlist_id: &str) -> CompanionResult<Playlist> {
        let playlist = self.load(playlist_id)?;
        if playlist.profile_id != acting.id {
            warn!(
                "Profile {} tried to modify playlist {} owned by {}",
                acting.id, playlist_id, playlist.profile_id
            );
            return Err(CompanionError::Forbidden(
                "Only the owning profile can modify this playlist".to_string(),
            ));
        }
        Ok(playlist)
    }

    fn ensure_profile(&self, profile_id: &str) -> CompanionResult<()> {
        match self.store.get_profile(profile_id)? {
            Some(_) => Ok(()),
            None => Err(CompanionError::NotFound(format!("profile {}", profile_id))),
        }
    }

    pub fn list_playlists(&self, profile_id: &str) -> CompanionResult<Vec<Playlist>> {
        self.ensure_profile(profile_id)?;
        Ok(self.store.list_playlists(profile_id)?)
    }

    /// Creates a manual playlist. `songs` is usually empty; when given it is
    /// deduplicated like an edit would be.
    pub fn create_playlist(
        &self,
        owner: &Profile,
        name: &str,
        cover: Option<String>,
        songs: Vec<SongDraft>,
    ) -> CompanionResult<Playlist> {
        let name = required_name(name)?;
        let songs = dedupe_by_spotify_id(
            songs
                .into_iter()
                .map(|draft| SongDraft { id: None, ..draft }.into_song())
                .collect(),
        );
        songs.iter().try_for_each(check_song)?;
        check_size(songs.len())?;

        let playlist = self.store.create_playlist(&NewPlaylist {
            profile_id: owner.id.clone(),
            name,
            cover: cover.filter(|c| !c.trim().is_empty()),
            origin: PlaylistOrigin::Manual,
            source_id: None,
            songs,
        })?;
        record_playlist_mutation("create");
        info!("Profile {} created playlist {}", owner.id, playlist.id);
        Ok(playlist)
    }

    pub fn rename_playlist(
        &self,
        acting: &Profile,
        playlist_id: &str,
        new_name: &str,
    ) -> CompanionResult<Playlist> {
        self.update_playlist(
            acting,
            playlist_id,
            PlaylistPatch {
                name: Some(new_name.to_string()),
                ..Default::default()
            },
        )
    }

    /// Renames, replaces the song list, or toggles discoverability. A new
    /// song list keeps the first occurrence of each spotify id.
    pub fn update_playlist(
        &self,
        acting: &Profile,
        playlist_id: &str,
        patch: PlaylistPatch,
    ) -> CompanionResult<Playlist> {
        let current = self.load_owned(acting, playlist_id)?;

        let name = patch.name.as_deref().map(required_name).transpose()?;
        let songs = match patch.songs {
            Some(drafts) => {
                let mut known_ids: HashSet<String> =
                    current.songs.iter().map(|s| s.id.clone()).collect();
                let songs: Vec<Song> = drafts
                    .into_iter()
                    .map(|draft| {
                        // Reuse an id only if it is one of ours and not yet taken.
                        let id = draft.id.clone().filter(|id| known_ids.remove(id));
                        SongDraft { id, ..draft }.into_song()
                    })
                    .collect();
                songs.iter().try_for_each(check_song)?;
                let songs = dedupe_by_spotify_id(songs);
                check_size(songs.len())?;
                Some(songs)
            }
            None => None,
        };

        let update = PlaylistUpdate {
            name,
            songs,
            discoverable: patch.discoverable,
        };
        if update == PlaylistUpdate::default() {
            return Ok(current);
        }
        if !self.store.update_playlist(playlist_id, &update)? {
            return Err(CompanionError::NotFound(format!("playlist {}", playlist_id)));
        }
        record_playlist_mutation("update");
        self.load(playlist_id)
    }

    pub fn delete_playlist(&self, acting: &Profile, playlist_id: &str) -> CompanionResult<()> {
        self.load_owned(acting, playlist_id)?;
        if !self.store.delete_playlist(playlist_id)? {
            return Err(CompanionError::NotFound(format!("playlist {}", playlist_id)));
        }
        record_playlist_mutation("delete");
        info!("Profile {} deleted playlist {}", acting.id, playlist_id);
        Ok(())
    }

    /// Appends a song. A song whose spotify id is already in the playlist
    /// leaves the playlist as it is.
    pub fn add_song(
        &self,
        acting: &Profile,
        playlist_id: &str,
        draft: SongDraft,
    ) -> CompanionResult<Playlist> {
        let playlist = self.load_owned(acting, playlist_id)?;
        let song = SongDraft { id: None, ..draft }.into_song();
        check_song(&song)?;

        if let Some(spotify_id) = song.spotify_id.as_deref() {
            if playlist.contains_spotify_id(spotify_id) {
                debug!("Track {} already in playlist {}", spotify_id, playlist_id);
                return Ok(playlist);
            }
        }
        check_size(playlist.songs.len() + 1)?;

        if !self.store.append_song(playlist_id, &song)? {
            debug!("Concurrent insert of {:?} into {}", song.spotify_id, playlist_id);
        } else {
            record_playlist_mutation("add_song");
        }
        self.load(playlist_id)
    }

    /// Removes the song matching `song_ref`, by local id first and spotify
    /// id second. A miss is reported through `removed: false`.
    pub fn remove_song(
        &self,
        acting: &Profile,
        playlist_id: &str,
        song_ref: &str,
    ) -> CompanionResult<RemoveSongOutcome> {
        self.load_owned(acting, playlist_id)?;
        let removed = self.store.remove_song(playlist_id, song_ref)?;
        if removed {
            record_playlist_mutation("remove_song");
        } else {
            warn!(
                "No song '{}' to remove from playlist {}",
                song_ref, playlist_id
            );
        }
        Ok(RemoveSongOutcome {
            removed,
            playlist: self.load(playlist_id)?,
        })
    }

    /// Copies a catalog playlist into the acting profile's collection. The
    /// whole listing is fetched before anything is stored.
    pub async fn import_from_catalog(
        &self,
        acting: &Profile,
        catalog_playlist_id: &str,
    ) -> CompanionResult<Playlist> {
        if !can_import_from_catalog(acting) {
            return Err(CompanionError::Forbidden(
                "This profile cannot import playlists from the catalog".to_string(),
            ));
        }

        let source = self
            .catalog
            .get_playlist(catalog_playlist_id)
            .await
            .map_err(|err| {
                record_catalog_failure("get_playlist");
                err.context(format!("Could not fetch catalog playlist {}", catalog_playlist_id))
            })?;
        let items = self
            .catalog
            .get_playlist_tracks(catalog_playlist_id)
            .await
            .map_err(|err| {
                record_catalog_failure("get_playlist_tracks");
                err.context(format!(
                    "Could not fetch tracks of catalog playlist {}",
                    catalog_playlist_id
                ))
            })?;

        let mut songs = songs_from_catalog(items);
        if songs.len() > MAX_PLAYLIST_SIZE {
            warn!(
                "Catalog playlist {} has {} songs, keeping the first {}",
                catalog_playlist_id,
                songs.len(),
                MAX_PLAYLIST_SIZE
            );
            songs.truncate(MAX_PLAYLIST_SIZE);
        }

        let playlist = self.store.create_playlist(&NewPlaylist {
            profile_id: acting.id.clone(),
            cover: source.cover_url(),
            name: source.name,
            origin: PlaylistOrigin::CatalogImport,
            source_id: Some(catalog_playlist_id.to_string()),
            songs,
        })?;
        record_playlist_mutation("import_catalog");
        info!(
            "Profile {} imported catalog playlist {} as {} ({} songs)",
            acting.id,
            catalog_playlist_id,
            playlist.id,
            playlist.songs.len()
        );
        Ok(playlist)
    }

    /// Forks a community playlist. The song snapshots are copied as they are,
    /// with fresh local ids.
    pub fn import_from_community(
        &self,
        acting: &Profile,
        community_playlist_id: &str,
    ) -> CompanionResult<Playlist> {
        let source = self.community.get_public_playlist(community_playlist_id)?;
        let songs: Vec<Song> = source
            .playlist
            .songs
            .into_iter()
            .map(|song| Song {
                id: new_song_id(),
                ..song
            })
            .collect();
        check_size(songs.len())?;

        let playlist = self.store.create_playlist(&NewPlaylist {
            profile_id: acting.id.clone(),
            name: community_copy_name(&source.playlist.name, &source.owner_name),
            cover: source.playlist.cover,
            origin: PlaylistOrigin::CommunityImport,
            source_id: Some(community_playlist_id.to_string()),
            songs,
        })?;
        record_playlist_mutation("import_community");
        info!(
            "Profile {} imported community playlist {} as {}",
            acting.id, community_playlist_id, playlist.id
        );
        Ok(playlist)
    }

    pub fn search_community(&self, term: &str) -> CompanionResult<Vec<CommunityPlaylist>> {
        self.community.search_public_playlists(term)
    }
}
