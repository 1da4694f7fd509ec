//! Catalog entity shapes the companion relies on. Fields the companion does
//! not read are kept in `extra` so proxied responses stay intact.

use anyhow::bail;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogArtistRef {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogAlbumRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<CatalogImage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogTrack {
    /// Absent for local files added to a catalog playlist.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<CatalogArtistRef>,
    #[serde(default)]
    pub album: Option<CatalogAlbumRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogTrack {
    pub fn artist_line(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn cover_url(&self) -> Option<String> {
        self.album
            .as_ref()
            .and_then(|album| album.images.first())
            .map(|image| image.url.clone())
    }
}

/// One entry of a playlist's track listing. `track` is null for entries the
/// catalog can no longer resolve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaylistTrackItem {
    #[serde(default)]
    pub track: Option<CatalogTrack>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogPlaylistOwner {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogPlaylist {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<CatalogImage>,
    #[serde(default)]
    pub owner: Option<CatalogPlaylistOwner>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogPlaylist {
    pub fn cover_url(&self) -> Option<String> {
        self.images.first().map(|image| image.url.clone())
    }
}

/// A page of results, as the catalog returns listings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Track,
    Artist,
    Album,
    Playlist,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Track => "track",
            SearchKind::Artist => "artist",
            SearchKind::Album => "album",
            SearchKind::Playlist => "playlist",
        }
    }

    /// Key under which the catalog groups results of this kind.
    pub fn result_key(&self) -> &'static str {
        match self {
            SearchKind::Track => "tracks",
            SearchKind::Artist => "artists",
            SearchKind::Album => "albums",
            SearchKind::Playlist => "playlists",
        }
    }

    /// Parses a comma separated list such as `track,artist`.
    pub fn parse_list(s: &str) -> anyhow::Result<Vec<SearchKind>> {
        let kinds = s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(SearchKind::from_str)
            .collect::<anyhow::Result<Vec<_>>>()?;
        if kinds.is_empty() {
            bail!("At least one search type is required");
        }
        Ok(kinds)
    }
}

impl FromStr for SearchKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "track" => Ok(SearchKind::Track),
            "artist" => Ok(SearchKind::Artist),
            "album" => Ok(SearchKind::Album),
            "playlist" => Ok(SearchKind::Playlist),
            _ => bail!("Unknown search type {}", s),
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSeeds {
    #[serde(default)]
    pub seed_artists: Vec<String>,
    #[serde(default)]
    pub seed_tracks: Vec<String>,
    #[serde(default)]
    pub seed_genres: Vec<String>,
}

impl RecommendationSeeds {
    pub fn is_empty(&self) -> bool {
        self.seed_artists.is_empty() && self.seed_tracks.is_empty() && self.seed_genres.is_empty()
    }
}
