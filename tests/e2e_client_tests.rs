//! End-to-end tests for the typed companion client and its session context

mod common;

use cadenza_server::client::{AppView, CompanionClient, SessionContext};
use cadenza_server::error::CompanionError;
use cadenza_server::playlist::SongDraft;
use cadenza_server::profile::{ProfileDraft, ProfileType};
use common::{TestServer, CATALOG_PLAYLIST_ID, TEST_EMAIL, TEST_PASS, TRACK_1_ID};
use std::sync::Arc;
use tempfile::TempDir;

fn client_for(server: &TestServer, session: Arc<SessionContext>) -> CompanionClient {
    CompanionClient::new(&server.base_url, session).unwrap()
}

async fn logged_in_with_profile(
    server: &TestServer,
    name: &str,
    profile_type: ProfileType,
) -> CompanionClient {
    let client = client_for(server, Arc::new(SessionContext::in_memory()));
    client.login(TEST_EMAIL, TEST_PASS).await.unwrap();
    let profile = client
        .create_profile(&ProfileDraft {
            name: name.to_string(),
            profile_type: Some(profile_type),
            ..Default::default()
        })
        .await
        .unwrap();
    client
        .session()
        .set_active_profile(profile, AppView::Library)
        .unwrap();
    client
}

#[tokio::test]
async fn test_login_stores_token() {
    let server = TestServer::spawn().await;
    let client = client_for(&server, Arc::new(SessionContext::in_memory()));
    assert!(!client.session().is_authenticated());

    client.login(TEST_EMAIL, TEST_PASS).await.unwrap();

    assert!(client.session().is_authenticated());
    let account = client.me().await.unwrap();
    assert_eq!(account.email, TEST_EMAIL);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let server = TestServer::spawn().await;
    let client = client_for(&server, Arc::new(SessionContext::in_memory()));

    let err = client.login(TEST_EMAIL, "wrong_password").await.unwrap_err();

    assert!(matches!(err, CompanionError::Unauthorized));
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_playlist_mutations_return_refreshed_list() {
    let server = TestServer::spawn().await;
    let client = logged_in_with_profile(&server, "Mili", ProfileType::Adult).await;

    let created = client.create_playlist("Road Trip").await.unwrap();
    assert_eq!(created.playlists.len(), 1);
    let playlist_id = created.result.unwrap().id;

    let song = SongDraft {
        spotify_id: Some(TRACK_1_ID.to_string()),
        title: "Somos Sur".to_string(),
        ..Default::default()
    };
    client.add_song(&playlist_id, &song).await.unwrap();
    let added = client.add_song(&playlist_id, &song).await.unwrap();
    assert_eq!(added.result.unwrap().songs.len(), 1);
    assert_eq!(added.playlists[0].songs.len(), 1);

    let renamed = client
        .rename_playlist(&playlist_id, "Night Drive")
        .await
        .unwrap();
    assert_eq!(renamed.playlists[0].name, "Night Drive");

    let song_id = renamed.result.unwrap().songs[0].id.clone();
    let removed = client.remove_song(&playlist_id, &song_id).await.unwrap();
    assert!(removed.result.unwrap().removed);
    assert!(removed.playlists[0].songs.is_empty());

    let deleted = client.delete_playlist(&playlist_id).await.unwrap();
    assert!(deleted.result.is_ok());
    assert!(deleted.playlists.is_empty());
}

#[tokio::test]
async fn test_stale_playlist_id_returns_fresh_list() {
    let server = TestServer::spawn().await;
    let client = logged_in_with_profile(&server, "Mili", ProfileType::Adult).await;
    let gone = client
        .create_playlist("Road Trip")
        .await
        .unwrap()
        .result
        .unwrap()
        .id;
    client.create_playlist("Night Drive").await.unwrap();
    client.delete_playlist(&gone).await.unwrap();

    // A second delete targets an id the server no longer knows
    let deleted = client.delete_playlist(&gone).await.unwrap();
    assert!(matches!(deleted.result, Err(CompanionError::NotFound(_))));
    assert_eq!(deleted.playlists.len(), 1);
    assert_eq!(deleted.playlists[0].name, "Night Drive");

    let song = SongDraft {
        title: "Song A".to_string(),
        ..Default::default()
    };
    let added = client.add_song(&gone, &song).await.unwrap();
    assert!(matches!(added.result, Err(CompanionError::NotFound(_))));
    assert_eq!(added.playlists.len(), 1);

    let removed = client.remove_song(&gone, "any-song").await.unwrap();
    assert!(matches!(removed.result, Err(CompanionError::NotFound(_))));
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn test_imports_through_client() {
    let server = TestServer::spawn().await;
    let client = logged_in_with_profile(&server, "Mili", ProfileType::Adult).await;

    let imported = client.import_from_catalog(CATALOG_PLAYLIST_ID).await.unwrap();
    let imported = imported.result.unwrap();
    assert_eq!(imported.songs.len(), 3);

    let found = client.search_community("road").await.unwrap();
    assert_eq!(found.len(), 1);

    let forked = client
        .import_from_community(&imported.id)
        .await
        .unwrap();
    assert_eq!(forked.result.unwrap().name, "Road Classics (de Mili)");
    assert_eq!(forked.playlists.len(), 2);
}

#[tokio::test]
async fn test_child_import_is_forbidden_through_client() {
    let server = TestServer::spawn().await;
    let client = logged_in_with_profile(&server, "Peque", ProfileType::Child).await;

    let err = client
        .import_from_catalog(CATALOG_PLAYLIST_ID)
        .await
        .unwrap_err();

    assert!(matches!(err, CompanionError::Forbidden(_)));
    assert!(client.list_playlists().await.unwrap().is_empty());
    // A forbidden call keeps the session
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn test_playlists_need_an_active_profile() {
    let server = TestServer::spawn().await;
    let client = client_for(&server, Arc::new(SessionContext::in_memory()));
    client.login(TEST_EMAIL, TEST_PASS).await.unwrap();

    let err = client.list_playlists().await.unwrap_err();

    assert!(matches!(err, CompanionError::Forbidden(_)));
}

#[tokio::test]
async fn test_deleting_active_profile_clears_it() {
    let server = TestServer::spawn().await;
    let client = logged_in_with_profile(&server, "Mili", ProfileType::Adult).await;
    let profile_id = client.session().active_profile().unwrap().id;

    client.delete_profile(&profile_id).await.unwrap();

    assert!(client.session().active_profile().is_none());
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn test_revoked_session_is_torn_down_on_401() {
    let server = TestServer::spawn().await;
    let temp_dir = TempDir::new().unwrap();
    let session_path = temp_dir.path().join("session.json");
    let client = client_for(&server, Arc::new(SessionContext::load(&session_path)));
    client.login(TEST_EMAIL, TEST_PASS).await.unwrap();
    let profile = client
        .create_profile(&ProfileDraft {
            name: "Mili".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    client
        .session()
        .set_active_profile(profile, AppView::Home)
        .unwrap();

    // Another device logs the same token out
    let other = client_for(&server, Arc::new(SessionContext::in_memory()));
    other
        .session()
        .set_token(client.session().token().unwrap())
        .unwrap();
    other.logout().await.unwrap();

    let err = client.list_playlists().await.unwrap_err();
    assert!(matches!(err, CompanionError::Unauthorized));
    assert!(!client.session().is_authenticated());
    assert!(client.session().active_profile().is_none());

    // The teardown reached the session file too
    let reloaded = SessionContext::load(&session_path);
    assert!(!reloaded.is_authenticated());
}

#[tokio::test]
async fn test_session_survives_reload() {
    let server = TestServer::spawn().await;
    let temp_dir = TempDir::new().unwrap();
    let session_path = temp_dir.path().join("session.json");
    let client = client_for(&server, Arc::new(SessionContext::load(&session_path)));
    client.login(TEST_EMAIL, TEST_PASS).await.unwrap();

    let reloaded = client_for(&server, Arc::new(SessionContext::load(&session_path)));

    assert!(reloaded.me().await.is_ok());
}

#[tokio::test]
async fn test_catalog_through_client() {
    let server = TestServer::spawn().await;
    let client = logged_in_with_profile(&server, "Mili", ProfileType::Adult).await;

    let results = client.search_catalog("somos", "track", 5).await.unwrap();
    assert_eq!(results["tracks"]["items"][0]["id"], TRACK_1_ID);

    let tracks = client
        .catalog_playlist_tracks(CATALOG_PLAYLIST_ID)
        .await
        .unwrap();
    assert_eq!(tracks["total"], 4);

    server.catalog.set_failing(true);
    let err = client.search_catalog("somos", "track", 5).await.unwrap_err();
    assert!(matches!(err, CompanionError::OperationFailed(_)));
    assert!(client.session().is_authenticated());
}
