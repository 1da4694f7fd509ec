use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a playlist came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaylistOrigin {
    Manual,
    CatalogImport,
    CommunityImport,
}

impl PlaylistOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaylistOrigin::Manual => "manual",
            PlaylistOrigin::CatalogImport => "catalogImport",
            PlaylistOrigin::CommunityImport => "communityImport",
        }
    }
}

impl FromStr for PlaylistOrigin {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "manual" => Ok(PlaylistOrigin::Manual),
            "catalogImport" => Ok(PlaylistOrigin::CatalogImport),
            "communityImport" => Ok(PlaylistOrigin::CommunityImport),
            _ => bail!("Unknown playlist origin {}", s),
        }
    }
}

impl fmt::Display for PlaylistOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A playlist line item. A snapshot of the track at the time it was added.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    #[serde(default)]
    pub spotify_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub cover: Option<String>,
}

/// A song as submitted by a client, before it gets its local id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDraft {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub spotify_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub cover: Option<String>,
}

impl SongDraft {
    /// Turns the draft into a song, keeping a client supplied id if present.
    pub fn into_song(self) -> Song {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(new_song_id);
        Song {
            id,
            spotify_id: self.spotify_id.filter(|s| !s.trim().is_empty()),
            title: self.title,
            artist: self.artist,
            cover: self.cover.filter(|c| !c.is_empty()),
        }
    }
}

pub fn new_song_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    pub profile_id: String,
    pub name: String,
    pub cover: Option<String>,
    pub origin: PlaylistOrigin,
    pub source_catalog_id: Option<String>,
    pub source_community_playlist_id: Option<String>,
    pub discoverable: bool,
    pub songs: Vec<Song>,
    pub created: i64,
    pub updated: i64,
}

impl Playlist {
    pub fn contains_spotify_id(&self, spotify_id: &str) -> bool {
        self.songs
            .iter()
            .any(|s| s.spotify_id.as_deref() == Some(spotify_id))
    }
}

/// Everything needed to persist a new playlist.
#[derive(Clone, Debug, PartialEq)]
pub struct NewPlaylist {
    pub profile_id: String,
    pub name: String,
    pub cover: Option<String>,
    pub origin: PlaylistOrigin,
    /// Catalog id or community playlist id, depending on `origin`.
    pub source_id: Option<String>,
    pub songs: Vec<Song>,
}

/// Changes to apply to a stored playlist. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaylistUpdate {
    pub name: Option<String>,
    pub songs: Option<Vec<Song>>,
    pub discoverable: Option<bool>,
}

/// Body of the playlist edit route.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistPatch {
    pub name: Option<String>,
    pub songs: Option<Vec<SongDraft>>,
    pub discoverable: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoveSongOutcome {
    pub removed: bool,
    pub playlist: Playlist,
}

/// A discoverable playlist together with its owner's display name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPlaylist {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub owner_name: String,
}
