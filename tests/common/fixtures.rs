//! Test data for end-to-end tests

use super::constants::*;
use anyhow::Result;
use cadenza_server::account::{
    Account, AccountCredentialsStore, AccountStore, PasswordCredentials, ResetTokenSink,
};
use cadenza_server::catalog::{CatalogPlaylist, CatalogTrack, InMemoryCatalog, PlaylistTrackItem};
use cadenza_server::store::SqliteCompanionStore;
use serde_json::json;
use std::sync::Mutex;

/// Keeps every issued reset token, keyed by email, so tests can complete a
/// password reset.
#[derive(Default)]
pub struct RecordingResetTokenSink {
    tokens: Mutex<Vec<(String, String)>>,
}

impl RecordingResetTokenSink {
    /// The newest token issued for `email`
    pub fn last_token_for(&self, email: &str) -> Option<String> {
        self.tokens
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| e == email)
            .map(|(_, token)| token.clone())
    }
}

impl ResetTokenSink for RecordingResetTokenSink {
    fn deliver(&self, account: &Account, token: &str, _expires: i64) {
        self.tokens
            .lock()
            .unwrap()
            .push((account.email.clone(), token.to_string()));
    }
}

/// Creates an account that can log in with `password`
pub fn create_account_with_password(
    store: &SqliteCompanionStore,
    name: &str,
    email: &str,
    password: &str,
) -> Result<usize> {
    let account_id = store.create_account(email, name)?;
    store.set_password_credentials(&PasswordCredentials::hashed(account_id, password)?)?;
    Ok(account_id)
}

fn track(id: &str, name: &str, artist_id: &str, artist_name: &str) -> Result<CatalogTrack> {
    Ok(serde_json::from_value(json!({
        "id": id,
        "name": name,
        "duration_ms": 180000,
        "artists": [{ "id": artist_id, "name": artist_name }],
        "album": {
            "id": ALBUM_1_ID,
            "name": "Vengo",
            "images": [{ "url": ALBUM_1_COVER, "width": 640, "height": 640 }]
        }
    }))?)
}

/// Builds the in-memory catalog every test server starts with
pub fn create_test_catalog() -> Result<InMemoryCatalog> {
    let catalog = InMemoryCatalog::new();

    let t1 = track(TRACK_1_ID, "Somos Sur", ARTIST_1_ID, "Ana Tijoux")?;
    let t2 = track(TRACK_2_ID, "Fuego", ARTIST_2_ID, "Bomba Estereo")?;
    let t3 = track(TRACK_3_ID, "Vengo", ARTIST_1_ID, "Ana Tijoux")?;
    for t in [&t1, &t2, &t3] {
        catalog.add_track(t.clone());
    }

    catalog.add_artist(json!({ "id": ARTIST_1_ID, "name": "Ana Tijoux", "images": [] }));
    catalog.add_artist(json!({ "id": ARTIST_2_ID, "name": "Bomba Estereo", "images": [] }));
    catalog.add_album(json!({
        "id": ALBUM_1_ID,
        "name": "Vengo",
        "images": [{ "url": ALBUM_1_COVER }],
        "artists": [{ "id": ARTIST_1_ID, "name": "Ana Tijoux" }]
    }));

    let playlist: CatalogPlaylist = serde_json::from_value(json!({
        "id": CATALOG_PLAYLIST_ID,
        "name": CATALOG_PLAYLIST_NAME,
        "images": [{ "url": CATALOG_PLAYLIST_COVER }],
        "owner": { "id": "spotify", "display_name": "Spotify" }
    }))?;
    let items = vec![
        PlaylistTrackItem {
            track: Some(t1),
            extra: Default::default(),
        },
        PlaylistTrackItem {
            track: None,
            extra: Default::default(),
        },
        PlaylistTrackItem {
            track: Some(t2),
            extra: Default::default(),
        },
        PlaylistTrackItem {
            track: Some(t3),
            extra: Default::default(),
        },
    ];
    catalog.add_playlist(playlist, items);

    Ok(catalog)
}
