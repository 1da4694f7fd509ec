//! Session-gated proxy to the external catalog.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::catalog::{browse, RecommendationSeeds, SearchKind};
use crate::metrics::record_catalog_failure;

use super::responses::{bad_gateway, error_response};
use super::session::Session;
use super::state::{GuardedCatalogGateway, ServerState};

pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
pub const MAX_SEARCH_LIMIT: u32 = 50;

#[derive(Deserialize, Debug)]
struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(rename = "type")]
    pub kinds: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Deserialize, Debug)]
struct BrowseQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct RecommendationsQuery {
    pub seed_artists: Option<String>,
    pub seed_tracks: Option<String>,
    pub seed_genres: Option<String>,
}

fn split_ids(list: Option<&str>) -> Vec<String> {
    list.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl RecommendationsQuery {
    fn seeds(&self) -> RecommendationSeeds {
        RecommendationSeeds {
            seed_artists: split_ids(self.seed_artists.as_deref()),
            seed_tracks: split_ids(self.seed_tracks.as_deref()),
            seed_genres: split_ids(self.seed_genres.as_deref()),
        }
    }
}

fn proxied(operation: &str, result: anyhow::Result<impl serde::Serialize>) -> Response {
    match result {
        Ok(value) => Json(value).into_response(),
        Err(err) => {
            record_catalog_failure(operation);
            bad_gateway(err)
        }
    }
}

async fn search(
    _session: Session,
    State(catalog): State<GuardedCatalogGateway>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let q = query.q.trim();
    if q.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "A search query is required");
    }
    let kinds = match SearchKind::parse_list(query.kinds.as_deref().unwrap_or("track")) {
        Ok(kinds) => kinds,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, err.to_string()),
    };
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);
    proxied("search", catalog.search(q, &kinds, limit).await)
}

async fn browse_catalog(
    _session: Session,
    State(catalog): State<GuardedCatalogGateway>,
    Query(query): Query<BrowseQuery>,
) -> Response {
    let kind = match query.kind.as_deref().unwrap_or("track").parse::<SearchKind>() {
        Ok(kind) => kind,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, err.to_string()),
    };
    Json(browse(catalog.as_ref(), kind).await).into_response()
}

async fn get_track(
    _session: Session,
    State(catalog): State<GuardedCatalogGateway>,
    Path(id): Path<String>,
) -> Response {
    proxied("track", catalog.get_track(&id).await)
}

async fn get_artist(
    _session: Session,
    State(catalog): State<GuardedCatalogGateway>,
    Path(id): Path<String>,
) -> Response {
    proxied("artist", catalog.get_artist(&id).await)
}

async fn get_artist_top_tracks(
    _session: Session,
    State(catalog): State<GuardedCatalogGateway>,
    Path(id): Path<String>,
) -> Response {
    proxied("artist_top_tracks", catalog.get_artist_top_tracks(&id).await)
}

async fn get_artist_albums(
    _session: Session,
    State(catalog): State<GuardedCatalogGateway>,
    Path(id): Path<String>,
) -> Response {
    proxied("artist_albums", catalog.get_artist_albums(&id).await)
}

async fn get_album(
    _session: Session,
    State(catalog): State<GuardedCatalogGateway>,
    Path(id): Path<String>,
) -> Response {
    proxied("album", catalog.get_album(&id).await)
}

async fn get_playlist(
    _session: Session,
    State(catalog): State<GuardedCatalogGateway>,
    Path(id): Path<String>,
) -> Response {
    proxied("playlist", catalog.get_playlist(&id).await)
}

async fn get_playlist_tracks(
    _session: Session,
    State(catalog): State<GuardedCatalogGateway>,
    Path(id): Path<String>,
) -> Response {
    let result = catalog
        .get_playlist_tracks(&id)
        .await
        .map(|items| json!({ "total": items.len(), "items": items }));
    proxied("playlist_tracks", result)
}

async fn get_recommendations(
    _session: Session,
    State(catalog): State<GuardedCatalogGateway>,
    Query(query): Query<RecommendationsQuery>,
) -> Response {
    let seeds = query.seeds();
    if seeds.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "At least one seed is required");
    }
    proxied("recommendations", catalog.get_recommendations(&seeds).await)
}

/// Mounted under /api/spotify.
pub fn catalog_routes() -> Router<ServerState> {
    Router::new()
        .route("/search", get(search))
        .route("/browse", get(browse_catalog))
        .route("/track/{id}", get(get_track))
        .route("/artist/{id}", get(get_artist))
        .route("/artist/{id}/top-tracks", get(get_artist_top_tracks))
        .route("/artist/{id}/albums", get(get_artist_albums))
        .route("/album/{id}", get(get_album))
        .route("/playlist/{id}", get(get_playlist))
        .route("/playlist/{id}/tracks", get(get_playlist_tracks))
        .route("/recommendations", get(get_recommendations))
}
