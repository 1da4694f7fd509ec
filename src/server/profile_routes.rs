//! Profile management and favorites.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::error::CompanionResult;
use crate::profile::{FavoriteAlbum, FavoriteArtist, ProfileDraft, ProfilePatch};

use super::session::Session;
use super::state::{GuardedFavoritesLedger, GuardedProfileRegistry, ServerState};

#[derive(Deserialize, Debug)]
struct FavoriteArtistBody {
    pub artist: FavoriteArtist,
}

#[derive(Deserialize, Debug)]
struct FavoriteAlbumBody {
    pub album: FavoriteAlbum,
}

async fn list_profiles(
    session: Session,
    State(registry): State<GuardedProfileRegistry>,
) -> CompanionResult<Response> {
    let profiles = registry.list_profiles(session.account_id)?;
    Ok(Json(profiles).into_response())
}

async fn create_profile(
    session: Session,
    State(registry): State<GuardedProfileRegistry>,
    Json(draft): Json<ProfileDraft>,
) -> CompanionResult<Response> {
    let profile = registry.create_profile(session.account_id, draft)?;
    Ok((StatusCode::CREATED, Json(profile)).into_response())
}

async fn get_profile(
    session: Session,
    State(registry): State<GuardedProfileRegistry>,
    Path(id): Path<String>,
) -> CompanionResult<Response> {
    let details = registry.get_profile_details(session.account_id, &id)?;
    Ok(Json(details).into_response())
}

async fn update_profile(
    session: Session,
    State(registry): State<GuardedProfileRegistry>,
    Path(id): Path<String>,
    Json(patch): Json<ProfilePatch>,
) -> CompanionResult<Response> {
    let profile = registry.update_profile(session.account_id, &id, patch)?;
    Ok(Json(profile).into_response())
}

async fn delete_profile(
    session: Session,
    State(registry): State<GuardedProfileRegistry>,
    Path(id): Path<String>,
) -> CompanionResult<Response> {
    registry.delete_profile(session.account_id, &id)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn add_favorite_artist(
    session: Session,
    State(registry): State<GuardedProfileRegistry>,
    State(ledger): State<GuardedFavoritesLedger>,
    Path(id): Path<String>,
    Json(body): Json<FavoriteArtistBody>,
) -> CompanionResult<Response> {
    registry.owned_profile(session.account_id, &id)?;
    ledger.add_favorite_artist(&id, &body.artist)?;
    let details = registry.get_profile_details(session.account_id, &id)?;
    Ok(Json(details).into_response())
}

async fn add_favorite_album(
    session: Session,
    State(registry): State<GuardedProfileRegistry>,
    State(ledger): State<GuardedFavoritesLedger>,
    Path(id): Path<String>,
    Json(body): Json<FavoriteAlbumBody>,
) -> CompanionResult<Response> {
    registry.owned_profile(session.account_id, &id)?;
    ledger.add_favorite_album(&id, &body.album)?;
    let details = registry.get_profile_details(session.account_id, &id)?;
    Ok(Json(details).into_response())
}

/// - GET, POST /api/profiles
/// - GET, PUT, DELETE /api/profiles/{id}
/// - PUT /api/profiles/{id}/favorite-artist
/// - PUT /api/profiles/{id}/favorite-album
pub fn profile_routes() -> Router<ServerState> {
    Router::new()
        .route("/api/profiles", get(list_profiles).post(create_profile))
        .route(
            "/api/profiles/{id}",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
        .route("/api/profiles/{id}/favorite-artist", put(add_favorite_artist))
        .route("/api/profiles/{id}/favorite-album", put(add_favorite_album))
}
