//! End-to-end tests for profile management
//!
//! Profiles are scoped to the account that created them; another account's
//! profile looks exactly like a missing one.

mod common;

use cadenza_server::playlist::PlaylistStore;
use common::{TestClient, TestServer};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_create_profile_fills_defaults() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.create_profile(json!({ "name": "Mili" })).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let profile: Value = response.json().await.unwrap();
    assert_eq!(profile["name"], "Mili");
    assert_eq!(profile["type"], "adult");
    assert_eq!(profile["language"], "es");
    assert_eq!(profile["ageRestriction"], 18);
    assert!(profile["avatar"].as_str().unwrap().starts_with("<svg"));
}

#[tokio::test]
async fn test_create_child_profile() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client
        .create_profile(json!({
            "name": "Peque",
            "type": "child",
            "language": "en",
            "ageRestriction": 7
        }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let profile: Value = response.json().await.unwrap();
    assert_eq!(profile["type"], "child");
    assert_eq!(profile["language"], "en");
    assert_eq!(profile["ageRestriction"], 7);
}

#[tokio::test]
async fn test_create_profile_requires_name() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.create_profile(json!({ "name": "   " })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_avatar_is_replaced() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client
        .create_profile(json!({ "name": "Mili", "avatar": "not markup" }))
        .await;
    let profile: Value = response.json().await.unwrap();

    assert!(profile["avatar"].as_str().unwrap().starts_with("<svg"));
}

#[tokio::test]
async fn test_list_profiles_only_shows_own() {
    let server = TestServer::spawn().await;
    let lucia = TestClient::authenticated(server.base_url.clone()).await;
    let ana = TestClient::authenticated_other(server.base_url.clone()).await;

    lucia.create_profile_id("Lucia", "adult").await;
    lucia.create_profile_id("Peque", "child").await;
    ana.create_profile_id("Ana", "adult").await;

    let profiles: Vec<Value> = lucia.list_profiles().await.json().await.unwrap();
    let mut names: Vec<&str> = profiles
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Lucia", "Peque"]);

    let profiles: Vec<Value> = ana.list_profiles().await.json().await.unwrap();
    assert_eq!(profiles.len(), 1);
}

#[tokio::test]
async fn test_get_profile_includes_favorites() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let profile_id = client.create_profile_id("Mili", "adult").await;

    let response = client.get_profile(&profile_id).await;
    assert_eq!(response.status(), StatusCode::OK);

    let details: Value = response.json().await.unwrap();
    assert_eq!(details["id"], profile_id.as_str());
    assert_eq!(details["favoriteArtists"], json!([]));
    assert_eq!(details["favoriteAlbums"], json!([]));
}

#[tokio::test]
async fn test_foreign_profile_is_not_found() {
    let server = TestServer::spawn().await;
    let lucia = TestClient::authenticated(server.base_url.clone()).await;
    let ana = TestClient::authenticated_other(server.base_url.clone()).await;
    let profile_id = lucia.create_profile_id("Lucia", "adult").await;

    assert_eq!(ana.get_profile(&profile_id).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        ana.update_profile(&profile_id, json!({ "name": "Hijacked" }))
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        ana.delete_profile(&profile_id).await.status(),
        StatusCode::NOT_FOUND
    );

    let details: Value = lucia.get_profile(&profile_id).await.json().await.unwrap();
    assert_eq!(details["name"], "Lucia");
}

#[tokio::test]
async fn test_update_profile_applies_partial_patch() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let profile_id = client.create_profile_id("Mili", "adult").await;

    let response = client
        .update_profile(&profile_id, json!({ "type": "child", "ageRestriction": 10 }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let profile: Value = response.json().await.unwrap();
    assert_eq!(profile["name"], "Mili");
    assert_eq!(profile["type"], "child");
    assert_eq!(profile["ageRestriction"], 10);

    let response = client
        .update_profile(&profile_id, json!({ "name": "" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_profile_removes_its_playlists() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let profile_id = client.create_profile_id("Mili", "adult").await;
    let playlist_id = client.create_playlist_id(&profile_id, "Road Trip").await;

    let response = client.delete_profile(&profile_id).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(
        client.get_profile(&profile_id).await.status(),
        StatusCode::NOT_FOUND
    );
    assert!(server.store.get_playlist(&playlist_id).unwrap().is_none());
}
