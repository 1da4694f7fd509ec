//! Catalog kept entirely in memory. Serves as the gateway when no catalog
//! credentials are configured, and as a controllable catalog in tests.

use super::{
    CatalogGateway, CatalogPlaylist, CatalogTrack, PlaylistTrackItem, RecommendationSeeds,
    SearchKind,
};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct Contents {
    tracks: Vec<CatalogTrack>,
    artists: Vec<Value>,
    albums: Vec<Value>,
    playlists: Vec<(CatalogPlaylist, Vec<PlaylistTrackItem>)>,
}

#[derive(Default)]
pub struct InMemoryCatalog {
    contents: Mutex<Contents>,
    failing: AtomicBool,
    call_counts: Mutex<HashMap<String, usize>>,
}

fn value_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(Value::as_str)
}

fn value_name_matches(value: &Value, needle: &str) -> bool {
    value
        .get("name")
        .and_then(Value::as_str)
        .map(|name| name.to_lowercase().contains(needle))
        .unwrap_or(false)
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail, as an unreachable provider would.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn add_track(&self, track: CatalogTrack) {
        self.contents.lock().unwrap().tracks.push(track);
    }

    pub fn add_artist(&self, artist: Value) {
        self.contents.lock().unwrap().artists.push(artist);
    }

    pub fn add_album(&self, album: Value) {
        self.contents.lock().unwrap().albums.push(album);
    }

    pub fn add_playlist(&self, playlist: CatalogPlaylist, items: Vec<PlaylistTrackItem>) {
        self.contents.lock().unwrap().playlists.push((playlist, items));
    }

    pub fn call_count(&self, method: &str) -> usize {
        *self.call_counts.lock().unwrap().get(method).unwrap_or(&0)
    }

    fn begin_call(&self, method: &str) -> Result<()> {
        *self
            .call_counts
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_insert(0) += 1;
        if self.failing.load(Ordering::SeqCst) {
            bail!("Catalog unavailable");
        }
        Ok(())
    }

    fn find_track(&self, id: &str) -> Option<CatalogTrack> {
        self.contents
            .lock()
            .unwrap()
            .tracks
            .iter()
            .find(|t| t.id.as_deref() == Some(id))
            .cloned()
    }
}

#[async_trait]
impl CatalogGateway for InMemoryCatalog {
    async fn search(&self, query: &str, kinds: &[SearchKind], limit: u32) -> Result<Value> {
        self.begin_call("search")?;
        let needle = query.to_lowercase();
        let contents = self.contents.lock().unwrap();
        let mut results = Map::new();
        for kind in kinds {
            let items: Vec<Value> = match kind {
                SearchKind::Track => contents
                    .tracks
                    .iter()
                    .filter(|t| t.name.to_lowercase().contains(&needle))
                    .map(serde_json::to_value)
                    .collect::<serde_json::Result<_>>()?,
                SearchKind::Artist => contents
                    .artists
                    .iter()
                    .filter(|a| value_name_matches(a, &needle))
                    .cloned()
                    .collect(),
                SearchKind::Album => contents
                    .albums
                    .iter()
                    .filter(|a| value_name_matches(a, &needle))
                    .cloned()
                    .collect(),
                SearchKind::Playlist => contents
                    .playlists
                    .iter()
                    .filter(|(p, _)| p.name.to_lowercase().contains(&needle))
                    .map(|(p, _)| serde_json::to_value(p))
                    .collect::<serde_json::Result<_>>()?,
            };
            let items: Vec<Value> = items.into_iter().take(limit as usize).collect();
            results.insert(kind.result_key().to_string(), json!({ "items": items }));
        }
        Ok(Value::Object(results))
    }

    async fn get_track(&self, id: &str) -> Result<Value> {
        self.begin_call("get_track")?;
        let track = self
            .find_track(id)
            .ok_or_else(|| anyhow!("Track not found: {}", id))?;
        Ok(serde_json::to_value(track)?)
    }

    async fn get_artist(&self, id: &str) -> Result<Value> {
        self.begin_call("get_artist")?;
        self.contents
            .lock()
            .unwrap()
            .artists
            .iter()
            .find(|a| value_id(a) == Some(id))
            .cloned()
            .ok_or_else(|| anyhow!("Artist not found: {}", id))
    }

    async fn get_artist_top_tracks(&self, id: &str) -> Result<Value> {
        self.begin_call("get_artist_top_tracks")?;
        let contents = self.contents.lock().unwrap();
        let tracks = contents
            .tracks
            .iter()
            .filter(|t| t.artists.iter().any(|a| a.id.as_deref() == Some(id)))
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<_>>>()?;
        Ok(json!({ "tracks": tracks }))
    }

    async fn get_artist_albums(&self, id: &str) -> Result<Value> {
        self.begin_call("get_artist_albums")?;
        let contents = self.contents.lock().unwrap();
        let albums: Vec<Value> = contents
            .albums
            .iter()
            .filter(|album| {
                album
                    .get("artists")
                    .and_then(Value::as_array)
                    .map(|artists| artists.iter().any(|a| value_id(a) == Some(id)))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        Ok(json!({ "items": albums, "next": null }))
    }

    async fn get_album(&self, id: &str) -> Result<Value> {
        self.begin_call("get_album")?;
        self.contents
            .lock()
            .unwrap()
            .albums
            .iter()
            .find(|a| value_id(a) == Some(id))
            .cloned()
            .ok_or_else(|| anyhow!("Album not found: {}", id))
    }

    async fn get_playlist(&self, id: &str) -> Result<CatalogPlaylist> {
        self.begin_call("get_playlist")?;
        self.contents
            .lock()
            .unwrap()
            .playlists
            .iter()
            .find(|(p, _)| p.id == id)
            .map(|(p, _)| p.clone())
            .ok_or_else(|| anyhow!("Playlist not found: {}", id))
    }

    async fn get_playlist_tracks(&self, id: &str) -> Result<Vec<PlaylistTrackItem>> {
        self.begin_call("get_playlist_tracks")?;
        self.contents
            .lock()
            .unwrap()
            .playlists
            .iter()
            .find(|(p, _)| p.id == id)
            .map(|(_, items)| items.clone())
            .ok_or_else(|| anyhow!("Playlist not found: {}", id))
    }

    async fn get_recommendations(&self, seeds: &RecommendationSeeds) -> Result<Value> {
        self.begin_call("get_recommendations")?;
        if seeds.is_empty() {
            bail!("At least one seed is required");
        }
        let contents = self.contents.lock().unwrap();
        let tracks = contents
            .tracks
            .iter()
            .filter(|t| {
                let by_seed_artist = t.artists.iter().any(|a| {
                    a.id
                        .as_ref()
                        .map(|id| seeds.seed_artists.contains(id))
                        .unwrap_or(false)
                });
                let is_seed_track = t
                    .id
                    .as_ref()
                    .map(|id| seeds.seed_tracks.contains(id))
                    .unwrap_or(false);
                by_seed_artist && !is_seed_track
            })
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<_>>>()?;
        Ok(json!({ "tracks": tracks }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogArtistRef;

    fn track(id: &str, name: &str, artist_id: &str) -> CatalogTrack {
        CatalogTrack {
            id: Some(id.to_string()),
            name: name.to_string(),
            artists: vec![CatalogArtistRef {
                id: Some(artist_id.to_string()),
                name: artist_id.to_uppercase(),
                extra: Map::new(),
            }],
            album: None,
            extra: Map::new(),
        }
    }

    #[tokio::test]
    async fn searches_by_name_and_limits_results() {
        let catalog = InMemoryCatalog::new();
        catalog.add_track(track("t1", "Summer Love", "a1"));
        catalog.add_track(track("t2", "Summer Nights", "a1"));
        catalog.add_artist(json!({"id": "a1", "name": "Summer Band"}));

        let results = catalog
            .search("summer", &[SearchKind::Track, SearchKind::Artist], 1)
            .await
            .unwrap();
        assert_eq!(results["tracks"]["items"].as_array().unwrap().len(), 1);
        assert_eq!(results["artists"]["items"][0]["id"], "a1");
        assert!(results.get("albums").is_none());
        assert_eq!(catalog.call_count("search"), 1);
    }

    #[tokio::test]
    async fn failing_mode_errors_every_call() {
        let catalog = InMemoryCatalog::new();
        catalog.add_track(track("t1", "Song", "a1"));
        catalog.set_failing(true);
        assert!(catalog.get_track("t1").await.is_err());
        catalog.set_failing(false);
        assert_eq!(catalog.get_track("t1").await.unwrap()["name"], "Song");
    }

    #[tokio::test]
    async fn recommends_other_tracks_by_seed_artists() {
        let catalog = InMemoryCatalog::new();
        catalog.add_track(track("t1", "One", "a1"));
        catalog.add_track(track("t2", "Two", "a1"));
        catalog.add_track(track("t3", "Three", "a2"));

        let seeds = RecommendationSeeds {
            seed_artists: vec!["a1".to_string()],
            seed_tracks: vec!["t1".to_string()],
            seed_genres: vec![],
        };
        let recommended = catalog.get_recommendations(&seeds).await.unwrap();
        let ids: Vec<_> = recommended["tracks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["t2"]);

        assert!(catalog
            .get_recommendations(&RecommendationSeeds::default())
            .await
            .is_err());
    }
}
