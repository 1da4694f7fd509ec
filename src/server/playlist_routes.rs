//! Playlist collections and the community directory.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{CompanionError, CompanionResult};
use crate::playlist::{PlaylistPatch, SongDraft};
use crate::profile::Profile;

use super::session::{ActingProfile, Session};
use super::state::{GuardedPlaylistEngine, GuardedProfileRegistry, ServerState};

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct CreatePlaylistBody {
    #[serde(default)]
    pub name: String,
    pub cover: Option<String>,
    #[serde(default)]
    pub songs: Vec<SongDraft>,
    #[serde(default)]
    pub from_spotify: bool,
    pub spotify_id: Option<String>,
    #[serde(default)]
    pub from_community: bool,
    /// Either the community playlist id or the community playlist itself.
    pub original_playlist: Option<Value>,
}

#[derive(Deserialize, Debug)]
struct CommunitySearchQuery {
    #[serde(default)]
    pub search: String,
}

fn original_playlist_id(original: &Value) -> Option<String> {
    match original {
        Value::String(id) => Some(id.clone()),
        Value::Object(fields) => fields
            .get("id")
            .or_else(|| fields.get("_id"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
    .filter(|id| !id.trim().is_empty())
}

/// The profile in the path, which must belong to the session's account.
fn path_profile(
    registry: &GuardedProfileRegistry,
    session: &Session,
    profile_id: &str,
) -> CompanionResult<Profile> {
    registry
        .owned_profile(session.account_id, profile_id)
        .map_err(|err| match err {
            CompanionError::NotFound(_) => CompanionError::Forbidden(
                "The profile does not belong to this account".to_string(),
            ),
            other => other,
        })
}

async fn list_playlists(
    session: Session,
    State(registry): State<GuardedProfileRegistry>,
    State(engine): State<GuardedPlaylistEngine>,
    Path(profile_id): Path<String>,
) -> CompanionResult<Response> {
    let profile = path_profile(&registry, &session, &profile_id)?;
    let playlists = engine.list_playlists(&profile.id)?;
    Ok(Json(playlists).into_response())
}

/// Creates or imports into the acting profile's collection. The path profile
/// must be the acting profile, so capability checks see who is acting.
async fn create_playlist(
    acting: ActingProfile,
    State(engine): State<GuardedPlaylistEngine>,
    Path(profile_id): Path<String>,
    Json(body): Json<CreatePlaylistBody>,
) -> CompanionResult<Response> {
    if acting.profile.id != profile_id {
        warn!(
            "Profile {} tried to create a playlist for profile {}",
            acting.profile.id, profile_id
        );
        return Err(CompanionError::Forbidden(
            "Playlists can only be created for the acting profile".to_string(),
        ));
    }
    let owner = acting.profile;

    let playlist = if body.from_spotify {
        let catalog_id = body
            .spotify_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                CompanionError::InvalidInput("A catalog playlist id is required".to_string())
            })?;
        debug!("Profile {} imports catalog playlist {}", owner.id, catalog_id);
        engine.import_from_catalog(&owner, &catalog_id).await?
    } else if body.from_community {
        let community_id = body
            .original_playlist
            .as_ref()
            .and_then(original_playlist_id)
            .ok_or_else(|| {
                CompanionError::InvalidInput("A community playlist is required".to_string())
            })?;
        debug!(
            "Profile {} imports community playlist {}",
            owner.id, community_id
        );
        engine.import_from_community(&owner, &community_id)?
    } else {
        engine.create_playlist(&owner, &body.name, body.cover, body.songs)?
    };

    Ok((StatusCode::CREATED, Json(playlist)).into_response())
}

async fn edit_playlist(
    acting: ActingProfile,
    State(engine): State<GuardedPlaylistEngine>,
    Path(id): Path<String>,
    Json(patch): Json<PlaylistPatch>,
) -> CompanionResult<Response> {
    let playlist = engine.update_playlist(&acting.profile, &id, patch)?;
    Ok(Json(playlist).into_response())
}

async fn delete_playlist(
    acting: ActingProfile,
    State(engine): State<GuardedPlaylistEngine>,
    Path(id): Path<String>,
) -> CompanionResult<Response> {
    engine.delete_playlist(&acting.profile, &id)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn add_song(
    acting: ActingProfile,
    State(engine): State<GuardedPlaylistEngine>,
    Path(id): Path<String>,
    Json(song): Json<SongDraft>,
) -> CompanionResult<Response> {
    let playlist = engine.add_song(&acting.profile, &id, song)?;
    Ok(Json(playlist).into_response())
}

async fn remove_song(
    acting: ActingProfile,
    State(engine): State<GuardedPlaylistEngine>,
    Path((playlist_id, song_id)): Path<(String, String)>,
) -> CompanionResult<Response> {
    let outcome = engine.remove_song(&acting.profile, &playlist_id, &song_id)?;
    Ok(Json(outcome).into_response())
}

async fn search_community(
    _session: Session,
    State(engine): State<GuardedPlaylistEngine>,
    Query(query): Query<CommunitySearchQuery>,
) -> CompanionResult<Response> {
    let playlists = engine.search_community(&query.search)?;
    Ok(Json(playlists).into_response())
}

/// - GET /api/playlists?search=
/// - GET, POST /api/playlists/{profile_id}
/// - PUT /api/playlists/edit/{id}
/// - DELETE /api/playlists/delete/{id}
/// - POST /api/playlists/{id}/songs
/// - DELETE /api/playlists/{playlist_id}/song/{song_id}
pub fn playlist_routes() -> Router<ServerState> {
    Router::new()
        .route("/api/playlists", get(search_community))
        .route(
            "/api/playlists/{id}",
            get(list_playlists).post(create_playlist),
        )
        .route("/api/playlists/edit/{id}", put(edit_playlist))
        .route("/api/playlists/delete/{id}", delete(delete_playlist))
        .route("/api/playlists/{id}/songs", post(add_song))
        .route("/api/playlists/{id}/song/{song_id}", delete(remove_song))
}
