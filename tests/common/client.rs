//! HTTP client for end-to-end tests
//!
//! Wraps reqwest and provides one method per companion endpoint.
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::{RequestBuilder, Response};
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client logged in as the main test account
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> Self {
        Self::authenticated_as(base_url, TEST_EMAIL, TEST_PASS).await
    }

    /// Creates a client logged in as the second test account
    pub async fn authenticated_other(base_url: String) -> Self {
        Self::authenticated_as(base_url, OTHER_EMAIL, OTHER_PASS).await
    }

    async fn authenticated_as(base_url: String, email: &str, password: &str) -> Self {
        let client = Self::new(base_url);
        let response = client.login(email, password).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Test account authentication failed: {:?}",
            response.text().await
        );
        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn acting(builder: RequestBuilder, profile_id: &str) -> RequestBuilder {
        builder.header("x-profile-id", profile_id)
    }

    async fn send(builder: RequestBuilder) -> Response {
        builder.send().await.expect("Request failed")
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /api/auth/register
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Response {
        Self::send(self.client.post(self.url("/api/auth/register")).json(&json!({
            "name": name,
            "email": email,
            "password": password,
        })))
        .await
    }

    /// POST /api/auth/login
    pub async fn login(&self, email: &str, password: &str) -> Response {
        Self::send(
            self.client
                .post(self.url("/api/auth/login"))
                .json(&json!({ "email": email, "password": password })),
        )
        .await
    }

    /// POST /api/auth/logout
    pub async fn logout(&self) -> Response {
        Self::send(self.client.post(self.url("/api/auth/logout"))).await
    }

    /// GET /api/auth/me
    pub async fn me(&self) -> Response {
        Self::send(self.client.get(self.url("/api/auth/me"))).await
    }

    /// POST /api/auth/forgot-password
    pub async fn forgot_password(&self, email: &str) -> Response {
        Self::send(
            self.client
                .post(self.url("/api/auth/forgot-password"))
                .json(&json!({ "email": email })),
        )
        .await
    }

    /// POST /api/auth/reset-password
    pub async fn reset_password(&self, token: &str, password: &str) -> Response {
        Self::send(
            self.client
                .post(self.url("/api/auth/reset-password"))
                .json(&json!({ "token": token, "password": password })),
        )
        .await
    }

    // ========================================================================
    // Profile Endpoints
    // ========================================================================

    /// GET /api/profiles
    pub async fn list_profiles(&self) -> Response {
        Self::send(self.client.get(self.url("/api/profiles"))).await
    }

    /// POST /api/profiles
    pub async fn create_profile(&self, draft: Value) -> Response {
        Self::send(self.client.post(self.url("/api/profiles")).json(&draft)).await
    }

    /// Creates a profile and returns its id
    pub async fn create_profile_id(&self, name: &str, profile_type: &str) -> String {
        let response = self
            .create_profile(json!({ "name": name, "type": profile_type }))
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let profile: Value = response.json().await.expect("Invalid profile body");
        profile["id"]
            .as_str()
            .expect("Profile without id")
            .to_string()
    }

    /// GET /api/profiles/{id}
    pub async fn get_profile(&self, profile_id: &str) -> Response {
        Self::send(
            self.client
                .get(self.url(&format!("/api/profiles/{}", profile_id))),
        )
        .await
    }

    /// PUT /api/profiles/{id}
    pub async fn update_profile(&self, profile_id: &str, patch: Value) -> Response {
        Self::send(
            self.client
                .put(self.url(&format!("/api/profiles/{}", profile_id)))
                .json(&patch),
        )
        .await
    }

    /// DELETE /api/profiles/{id}
    pub async fn delete_profile(&self, profile_id: &str) -> Response {
        Self::send(
            self.client
                .delete(self.url(&format!("/api/profiles/{}", profile_id))),
        )
        .await
    }

    /// PUT /api/profiles/{id}/favorite-artist
    pub async fn add_favorite_artist(&self, profile_id: &str, artist: Value) -> Response {
        Self::send(
            self.client
                .put(self.url(&format!("/api/profiles/{}/favorite-artist", profile_id)))
                .json(&json!({ "artist": artist })),
        )
        .await
    }

    /// PUT /api/profiles/{id}/favorite-album
    pub async fn add_favorite_album(&self, profile_id: &str, album: Value) -> Response {
        Self::send(
            self.client
                .put(self.url(&format!("/api/profiles/{}/favorite-album", profile_id)))
                .json(&json!({ "album": album })),
        )
        .await
    }

    // ========================================================================
    // Playlist Endpoints
    // ========================================================================

    /// GET /api/playlists/{profile_id}
    pub async fn list_playlists(&self, profile_id: &str) -> Response {
        Self::send(
            self.client
                .get(self.url(&format!("/api/playlists/{}", profile_id))),
        )
        .await
    }

    /// GET /api/playlists/{profile_id}, parsed
    pub async fn playlists_of(&self, profile_id: &str) -> Vec<Value> {
        let response = self.list_playlists(profile_id).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("Invalid playlist list body")
    }

    /// POST /api/playlists/{profile_id}, acting as that same profile
    pub async fn create_playlist(&self, profile_id: &str, body: Value) -> Response {
        self.create_playlist_as(profile_id, profile_id, body).await
    }

    /// POST /api/playlists/{profile_id} with an explicit acting profile
    pub async fn create_playlist_as(&self, acting: &str, profile_id: &str, body: Value) -> Response {
        Self::send(Self::acting(
            self.client
                .post(self.url(&format!("/api/playlists/{}", profile_id)))
                .json(&body),
            acting,
        ))
        .await
    }

    /// Creates a manual playlist and returns its id
    pub async fn create_playlist_id(&self, profile_id: &str, name: &str) -> String {
        let response = self
            .create_playlist(profile_id, json!({ "name": name }))
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let playlist: Value = response.json().await.expect("Invalid playlist body");
        playlist["id"]
            .as_str()
            .expect("Playlist without id")
            .to_string()
    }

    /// PUT /api/playlists/edit/{id}
    pub async fn edit_playlist(&self, acting: &str, playlist_id: &str, patch: Value) -> Response {
        Self::send(Self::acting(
            self.client
                .put(self.url(&format!("/api/playlists/edit/{}", playlist_id)))
                .json(&patch),
            acting,
        ))
        .await
    }

    /// DELETE /api/playlists/delete/{id}
    pub async fn delete_playlist(&self, acting: &str, playlist_id: &str) -> Response {
        Self::send(Self::acting(
            self.client
                .delete(self.url(&format!("/api/playlists/delete/{}", playlist_id))),
            acting,
        ))
        .await
    }

    /// POST /api/playlists/{id}/songs
    pub async fn add_song(&self, acting: &str, playlist_id: &str, song: Value) -> Response {
        Self::send(Self::acting(
            self.client
                .post(self.url(&format!("/api/playlists/{}/songs", playlist_id)))
                .json(&song),
            acting,
        ))
        .await
    }

    /// DELETE /api/playlists/{playlist_id}/song/{song_id}
    pub async fn remove_song(&self, acting: &str, playlist_id: &str, song_id: &str) -> Response {
        Self::send(Self::acting(
            self.client.delete(self.url(&format!(
                "/api/playlists/{}/song/{}",
                playlist_id, song_id
            ))),
            acting,
        ))
        .await
    }

    /// GET /api/playlists?search=
    pub async fn search_community(&self, term: &str) -> Response {
        Self::send(
            self.client
                .get(self.url("/api/playlists"))
                .query(&[("search", term)]),
        )
        .await
    }

    // ========================================================================
    // Catalog Endpoints
    // ========================================================================

    /// GET /api/spotify/search
    pub async fn catalog_search(&self, q: &str, kinds: &str, limit: u32) -> Response {
        let limit = limit.to_string();
        Self::send(self.client.get(self.url("/api/spotify/search")).query(&[
            ("q", q),
            ("type", kinds),
            ("limit", limit.as_str()),
        ]))
        .await
    }

    /// GET /api/spotify/{path}
    pub async fn catalog_get(&self, path: &str) -> Response {
        Self::send(
            self.client
                .get(self.url(&format!("/api/spotify/{}", path))),
        )
        .await
    }
}
