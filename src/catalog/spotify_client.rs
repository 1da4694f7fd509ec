//! HTTP client for the Spotify Web API, authenticated with the
//! client-credentials flow.

use super::{
    CatalogGateway, CatalogPlaylist, Paging, PlaylistTrackItem, RecommendationSeeds, SearchKind,
};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Tokens are refreshed this long before the catalog would expire them.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const PLAYLIST_PAGE_SIZE: u32 = 100;
/// Upper bound on pages followed for a single playlist listing.
const MAX_PLAYLIST_PAGES: usize = 50;
const RECOMMENDATIONS_LIMIT: u32 = 20;

#[derive(Clone, Debug)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct SpotifyCatalogClient {
    client: reqwest::Client,
    api_url: String,
    accounts_url: String,
    market: String,
    credentials: SpotifyCredentials,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyCatalogClient {
    /// Create a new catalog client.
    ///
    /// # Arguments
    /// * `api_url` - Base URL of the Web API (e.g., "https://api.spotify.com")
    /// * `accounts_url` - Base URL of the accounts service issuing tokens
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(
        api_url: &str,
        accounts_url: &str,
        market: &str,
        credentials: SpotifyCredentials,
        timeout_sec: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            accounts_url: accounts_url.trim_end_matches('/').to_string(),
            market: market.to_string(),
            credentials,
            token: Mutex::new(None),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() + TOKEN_EXPIRY_MARGIN < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        debug!("Requesting a new catalog access token");
        let response = self
            .client
            .post(format!("{}/api/token", self.accounts_url))
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("Failed to connect to the catalog accounts service")?;

        if !response.status().is_success() {
            bail!(
                "Catalog token request failed with status: {}",
                response.status()
            );
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token response")?;
        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(value)
    }

    async fn get_url<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to reach catalog for {}", url))?;

        if !response.status().is_success() {
            bail!("Catalog request {} failed: status {}", url, response.status());
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse catalog response for {}", url))
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/v1{}", self.api_url, path);
        self.get_url(&url, query).await
    }
}

fn encode(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[async_trait]
impl CatalogGateway for SpotifyCatalogClient {
    async fn search(&self, query: &str, kinds: &[SearchKind], limit: u32) -> Result<Value> {
        let types = kinds
            .iter()
            .map(SearchKind::as_str)
            .collect::<Vec<_>>()
            .join(",");
        self.get(
            "/search",
            &[
                ("q", query.to_string()),
                ("type", types),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn get_track(&self, id: &str) -> Result<Value> {
        self.get(&format!("/tracks/{}", encode(id)), &[]).await
    }

    async fn get_artist(&self, id: &str) -> Result<Value> {
        self.get(&format!("/artists/{}", encode(id)), &[]).await
    }

    async fn get_artist_top_tracks(&self, id: &str) -> Result<Value> {
        self.get(
            &format!("/artists/{}/top-tracks", encode(id)),
            &[("market", self.market.clone())],
        )
        .await
    }

    async fn get_artist_albums(&self, id: &str) -> Result<Value> {
        self.get(
            &format!("/artists/{}/albums", encode(id)),
            &[("include_groups", "album,single".to_string())],
        )
        .await
    }

    async fn get_album(&self, id: &str) -> Result<Value> {
        self.get(&format!("/albums/{}", encode(id)), &[]).await
    }

    async fn get_playlist(&self, id: &str) -> Result<CatalogPlaylist> {
        self.get(&format!("/playlists/{}", encode(id)), &[]).await
    }

    async fn get_playlist_tracks(&self, id: &str) -> Result<Vec<PlaylistTrackItem>> {
        let mut page: Paging<PlaylistTrackItem> = self
            .get(
                &format!("/playlists/{}/tracks", encode(id)),
                &[("limit", PLAYLIST_PAGE_SIZE.to_string())],
            )
            .await?;

        let mut items = std::mem::take(&mut page.items);
        let mut pages = 1;
        while let Some(next) = page.next.take() {
            if pages >= MAX_PLAYLIST_PAGES {
                debug!("Stopping playlist {} listing after {} pages", id, pages);
                break;
            }
            page = self.get_url(&next, &[]).await?;
            items.append(&mut page.items);
            pages += 1;
        }
        Ok(items)
    }

    async fn get_recommendations(&self, seeds: &RecommendationSeeds) -> Result<Value> {
        if seeds.is_empty() {
            bail!("At least one seed is required");
        }
        let mut query = vec![("limit", RECOMMENDATIONS_LIMIT.to_string())];
        for (key, values) in [
            ("seed_artists", &seeds.seed_artists),
            ("seed_tracks", &seeds.seed_tracks),
            ("seed_genres", &seeds.seed_genres),
        ] {
            if !values.is_empty() {
                query.push((key, values.join(",")));
            }
        }
        self.get("/recommendations", &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> SpotifyCredentials {
        SpotifyCredentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        }
    }

    #[test]
    fn trims_trailing_slashes() {
        let client = SpotifyCatalogClient::new(
            "https://api.example.com/",
            "https://accounts.example.com//",
            "ES",
            credentials(),
            10,
        )
        .unwrap();
        assert_eq!(client.api_url(), "https://api.example.com");
        assert_eq!(client.accounts_url, "https://accounts.example.com");
    }

    #[test]
    fn encodes_ids_in_paths() {
        assert_eq!(encode("abc"), "abc");
        assert_eq!(encode("a/b c"), "a%2Fb%20c");
    }

    #[tokio::test]
    async fn unreachable_accounts_service_is_an_error() {
        let client = SpotifyCatalogClient::new(
            "http://127.0.0.1:9",
            "http://127.0.0.1:9",
            "ES",
            credentials(),
            1,
        )
        .unwrap();
        assert!(client.get_track("t1").await.is_err());
    }

    #[tokio::test]
    async fn recommendations_need_a_seed() {
        let client =
            SpotifyCatalogClient::new("http://127.0.0.1:9", "http://127.0.0.1:9", "ES", credentials(), 1)
                .unwrap();
        let err = client
            .get_recommendations(&RecommendationSeeds::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("seed"));
    }
}
