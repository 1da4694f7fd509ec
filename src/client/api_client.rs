//! Typed HTTP client for the companion API.

use super::session_context::SessionContext;
use crate::account::Account;
use crate::error::{CompanionError, CompanionResult};
use crate::playlist::{CommunityPlaylist, Playlist, PlaylistPatch, RemoveSongOutcome, SongDraft};
use crate::profile::{
    FavoriteAlbum, FavoriteArtist, Profile, ProfileDetails, ProfileDraft, ProfilePatch,
};
use anyhow::anyhow;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const HEADER_PROFILE_ID: &str = "x-profile-id";

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// The outcome of a playlist mutation together with the profile's playlist
/// list as re-read from the server afterwards. `result` only holds an error
/// when the server reported the target as missing.
#[derive(Debug)]
pub struct Refreshed<T> {
    pub result: CompanionResult<T>,
    pub playlists: Vec<Playlist>,
}

pub struct CompanionClient {
    http: Client,
    base_url: String,
    session: Arc<SessionContext>,
}

fn transport_error(err: reqwest::Error) -> CompanionError {
    CompanionError::OperationFailed(anyhow!(err).context("Request to companion server failed"))
}

impl CompanionClient {
    pub fn new(base_url: &str, session: Arc<SessionContext>) -> CompanionResult<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(CompanionError::InvalidInput(
                "URL must start with http:// or https://".to_string(),
            ));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(transport_error)?;
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(profile) = self.session.active_profile() {
            builder = builder.header(HEADER_PROFILE_ID, profile.id);
        }
        builder
    }

    /// Sends the request and maps error statuses onto the error taxonomy. A
    /// 401 tears the local session down.
    async fn send(&self, builder: RequestBuilder) -> CompanionResult<Response> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status.to_string(),
        };
        debug!("Companion server answered {}: {}", status, message);
        Err(match status {
            StatusCode::UNAUTHORIZED => {
                if let Err(err) = self.session.teardown() {
                    warn!("Could not clear session after 401: {:#}", err);
                }
                CompanionError::Unauthorized
            }
            StatusCode::FORBIDDEN => CompanionError::Forbidden(message),
            StatusCode::NOT_FOUND => CompanionError::NotFound(message),
            StatusCode::BAD_REQUEST => CompanionError::InvalidInput(message),
            StatusCode::CONFLICT => CompanionError::Conflict(message),
            _ => CompanionError::OperationFailed(anyhow!("{}: {}", status, message)),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> CompanionResult<T> {
        let response = self.send(builder).await?;
        response.json::<T>().await.map_err(|err| {
            CompanionError::OperationFailed(anyhow!(err).context("Unexpected response body"))
        })
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> CompanionResult<T> {
        self.send_json(self.request(method, path).json(body)).await
    }

    fn active_profile_id(&self) -> CompanionResult<String> {
        self.session
            .active_profile()
            .map(|p| p.id)
            .ok_or_else(|| CompanionError::Forbidden("No active profile".to_string()))
    }

    // Identity

    pub async fn register(&self, name: &str, email: &str, password: &str) -> CompanionResult<Account> {
        self.call(
            Method::POST,
            "/api/auth/register",
            &json!({ "name": name, "email": email, "password": password }),
        )
        .await
    }

    /// Logs in and keeps the token in the session.
    pub async fn login(&self, email: &str, password: &str) -> CompanionResult<()> {
        let response: LoginResponse = self
            .call(
                Method::POST,
                "/api/auth/login",
                &json!({ "email": email, "password": password }),
            )
            .await?;
        self.session.set_token(response.token)?;
        Ok(())
    }

    /// Clears the local session even when the server call fails.
    pub async fn logout(&self) -> CompanionResult<()> {
        let result = self
            .send(self.request(Method::POST, "/api/auth/logout"))
            .await;
        self.session.teardown()?;
        result.map(|_| ())
    }

    pub async fn me(&self) -> CompanionResult<Account> {
        self.send_json(self.request(Method::GET, "/api/auth/me"))
            .await
    }

    // Profiles

    pub async fn list_profiles(&self) -> CompanionResult<Vec<Profile>> {
        self.send_json(self.request(Method::GET, "/api/profiles"))
            .await
    }

    pub async fn create_profile(&self, draft: &ProfileDraft) -> CompanionResult<Profile> {
        self.call(Method::POST, "/api/profiles", draft).await
    }

    pub async fn get_profile(&self, profile_id: &str) -> CompanionResult<ProfileDetails> {
        self.send_json(self.request(Method::GET, &format!("/api/profiles/{}", profile_id)))
            .await
    }

    pub async fn update_profile(
        &self,
        profile_id: &str,
        patch: &ProfilePatch,
    ) -> CompanionResult<Profile> {
        self.call(Method::PUT, &format!("/api/profiles/{}", profile_id), patch)
            .await
    }

    /// Deleting the active profile also clears it from the session.
    pub async fn delete_profile(&self, profile_id: &str) -> CompanionResult<()> {
        self.send(self.request(Method::DELETE, &format!("/api/profiles/{}", profile_id)))
            .await?;
        if self
            .session
            .active_profile()
            .is_some_and(|p| p.id == profile_id)
        {
            self.session.clear_active_profile()?;
        }
        Ok(())
    }

    pub async fn add_favorite_artist(
        &self,
        profile_id: &str,
        artist: &FavoriteArtist,
    ) -> CompanionResult<ProfileDetails> {
        self.call(
            Method::PUT,
            &format!("/api/profiles/{}/favorite-artist", profile_id),
            &json!({ "artist": artist }),
        )
        .await
    }

    pub async fn add_favorite_album(
        &self,
        profile_id: &str,
        album: &FavoriteAlbum,
    ) -> CompanionResult<ProfileDetails> {
        self.call(
            Method::PUT,
            &format!("/api/profiles/{}/favorite-album", profile_id),
            &json!({ "album": album }),
        )
        .await
    }

    // Playlists of the active profile

    pub async fn list_playlists(&self) -> CompanionResult<Vec<Playlist>> {
        let profile_id = self.active_profile_id()?;
        self.send_json(self.request(Method::GET, &format!("/api/playlists/{}", profile_id)))
            .await
    }

    /// Re-reads the playlist list after a mutation. A `NotFound` means the
    /// caller acted on a stale id, so it is handed back next to the fresh
    /// list instead of aborting the refresh.
    async fn refreshed<T>(&self, outcome: CompanionResult<T>) -> CompanionResult<Refreshed<T>> {
        let outcome = match outcome {
            Err(CompanionError::NotFound(message)) => {
                debug!("Stale playlist reference ({}), refreshing", message);
                Err(CompanionError::NotFound(message))
            }
            Err(err) => return Err(err),
            ok => ok,
        };
        let playlists = self.list_playlists().await?;
        Ok(Refreshed {
            result: outcome,
            playlists,
        })
    }

    async fn post_playlist(&self, body: Value) -> CompanionResult<Refreshed<Playlist>> {
        let profile_id = self.active_profile_id()?;
        let outcome = self
            .call(Method::POST, &format!("/api/playlists/{}", profile_id), &body)
            .await;
        self.refreshed(outcome).await
    }

    pub async fn create_playlist(&self, name: &str) -> CompanionResult<Refreshed<Playlist>> {
        self.post_playlist(json!({ "name": name })).await
    }

    pub async fn import_from_catalog(
        &self,
        catalog_playlist_id: &str,
    ) -> CompanionResult<Refreshed<Playlist>> {
        self.post_playlist(json!({ "fromSpotify": true, "spotifyId": catalog_playlist_id }))
            .await
    }

    pub async fn import_from_community(
        &self,
        community_playlist_id: &str,
    ) -> CompanionResult<Refreshed<Playlist>> {
        self.post_playlist(json!({
            "fromCommunity": true,
            "originalPlaylist": community_playlist_id,
        }))
        .await
    }

    pub async fn rename_playlist(
        &self,
        playlist_id: &str,
        new_name: &str,
    ) -> CompanionResult<Refreshed<Playlist>> {
        let patch = PlaylistPatch {
            name: Some(new_name.to_string()),
            ..Default::default()
        };
        self.update_playlist(playlist_id, &patch).await
    }

    pub async fn update_playlist(
        &self,
        playlist_id: &str,
        patch: &PlaylistPatch,
    ) -> CompanionResult<Refreshed<Playlist>> {
        let outcome = self
            .call(
                Method::PUT,
                &format!("/api/playlists/edit/{}", playlist_id),
                patch,
            )
            .await;
        self.refreshed(outcome).await
    }

    pub async fn delete_playlist(&self, playlist_id: &str) -> CompanionResult<Refreshed<()>> {
        let outcome = self
            .send(self.request(
                Method::DELETE,
                &format!("/api/playlists/delete/{}", playlist_id),
            ))
            .await
            .map(|_| ());
        self.refreshed(outcome).await
    }

    pub async fn add_song(
        &self,
        playlist_id: &str,
        song: &SongDraft,
    ) -> CompanionResult<Refreshed<Playlist>> {
        let outcome = self
            .call(
                Method::POST,
                &format!("/api/playlists/{}/songs", playlist_id),
                song,
            )
            .await;
        self.refreshed(outcome).await
    }

    pub async fn remove_song(
        &self,
        playlist_id: &str,
        song_id: &str,
    ) -> CompanionResult<Refreshed<RemoveSongOutcome>> {
        let outcome = self
            .send_json(self.request(
                Method::DELETE,
                &format!(
                    "/api/playlists/{}/song/{}",
                    playlist_id,
                    urlencoding::encode(song_id)
                ),
            ))
            .await;
        self.refreshed(outcome).await
    }

    pub async fn search_community(&self, term: &str) -> CompanionResult<Vec<CommunityPlaylist>> {
        self.send_json(
            self.request(Method::GET, "/api/playlists")
                .query(&[("search", term)]),
        )
        .await
    }

    // Catalog

    pub async fn search_catalog(
        &self,
        query: &str,
        kinds: &str,
        limit: u32,
    ) -> CompanionResult<Value> {
        let limit = limit.to_string();
        self.send_json(self.request(Method::GET, "/api/spotify/search").query(&[
            ("q", query),
            ("type", kinds),
            ("limit", limit.as_str()),
        ]))
        .await
    }

    pub async fn catalog_playlist_tracks(&self, catalog_playlist_id: &str) -> CompanionResult<Value> {
        self.send_json(self.request(
            Method::GET,
            &format!("/api/spotify/playlist/{}/tracks", catalog_playlist_id),
        ))
        .await
    }
}
