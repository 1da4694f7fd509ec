use anyhow::Result;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::{debug, info};

use crate::account::{AccountManager, AuthTokenValue, ResetTokenSink};
use crate::catalog::CatalogGateway;
use crate::error::CompanionResult;
use crate::playlist::PlaylistEngine;
use crate::profile::{FavoritesLedger, ProfileRegistry};
use crate::store::FullStore;
use axum_extra::extract::cookie::{Cookie, SameSite};
use tower_http::services::ServeDir;

use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{
    catalog_routes::catalog_routes, log_requests, playlist_routes::playlist_routes,
    profile_routes::profile_routes, session::COOKIE_SESSION_TOKEN_KEY, slowdown_request,
    state::*, ServerConfig,
};
use crate::server::session::Session;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub session_token: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct RegisterBody {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
struct ForgotPasswordBody {
    pub email: String,
}

#[derive(Deserialize)]
struct ResetPasswordBody {
    pub token: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        session_token: session.map(|s| s.token),
    };
    Json(stats)
}

async fn register(
    State(account_manager): State<GuardedAccountManager>,
    Json(body): Json<RegisterBody>,
) -> CompanionResult<Response> {
    debug!("register() called for {}", body.email);
    let account = account_manager.register(&body.name, &body.email, &body.password)?;
    Ok((StatusCode::CREATED, Json(account)).into_response())
}

async fn login(
    State(account_manager): State<GuardedAccountManager>,
    Json(body): Json<LoginBody>,
) -> CompanionResult<Response> {
    debug!("login() called for {}", body.email);
    let auth_token = account_manager.login(&body.email, &body.password)?;

    let cookie = Cookie::build((COOKIE_SESSION_TOKEN_KEY, auth_token.value.0.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    let response_body = LoginSuccessResponse {
        token: auth_token.value.0,
    };
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(response_body),
    )
        .into_response())
}

async fn logout(
    State(account_manager): State<GuardedAccountManager>,
    session: Session,
) -> CompanionResult<Response> {
    account_manager.logout(&AuthTokenValue(session.token))?;
    let cookie = Cookie::build((COOKIE_SESSION_TOKEN_KEY, ""))
        .path("/")
        .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1))
        .same_site(SameSite::Lax)
        .build();
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie.to_string())]).into_response())
}

async fn me(
    State(account_manager): State<GuardedAccountManager>,
    session: Session,
) -> CompanionResult<Response> {
    let account = account_manager.current_user(&AuthTokenValue(session.token))?;
    Ok(Json(account).into_response())
}

async fn forgot_password(
    State(account_manager): State<GuardedAccountManager>,
    Json(body): Json<ForgotPasswordBody>,
) -> CompanionResult<Response> {
    account_manager.request_password_reset(&body.email)?;
    Ok(StatusCode::ACCEPTED.into_response())
}

async fn reset_password(
    State(account_manager): State<GuardedAccountManager>,
    Json(body): Json<ResetPasswordBody>,
) -> CompanionResult<Response> {
    account_manager.reset_password(&body.token, &body.password)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn FullStore>,
        catalog: Arc<dyn CatalogGateway>,
        reset_sink: Arc<dyn ResetTokenSink>,
        reset_token_ttl: Duration,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            account_manager: Arc::new(AccountManager::new(
                store.clone(),
                reset_sink,
                reset_token_ttl,
            )),
            profile_registry: Arc::new(ProfileRegistry::new(store.clone())),
            favorites_ledger: Arc::new(FavoritesLedger::new(store.clone())),
            playlist_engine: Arc::new(PlaylistEngine::new(store, catalog.clone())),
            catalog,
            hash: option_env!("GIT_HASH").unwrap_or("unknown").to_owned(),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    store: Arc<dyn FullStore>,
    catalog: Arc<dyn CatalogGateway>,
    reset_sink: Arc<dyn ResetTokenSink>,
    reset_token_ttl: Duration,
) -> Result<Router> {
    let state = ServerState::new(config.clone(), store, catalog, reset_sink, reset_token_ttl);

    let auth_routes: Router<ServerState> = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password));

    let api_routes: Router = Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/spotify", catalog_routes())
        .merge(profile_routes())
        .merge(playlist_routes())
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let mut app: Router = home_router.merge(api_routes);

    #[cfg(feature = "slowdown")]
    {
        app = app.layer(middleware::from_fn(slowdown_request));
    }
    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(
    config: ServerConfig,
    store: Arc<dyn FullStore>,
    catalog: Arc<dyn CatalogGateway>,
    reset_sink: Arc<dyn ResetTokenSink>,
    reset_token_ttl: Duration,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, store, catalog, reset_sink, reset_token_ttl)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    Ok(axum::serve(listener, app).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::LoggingResetTokenSink;
    use crate::catalog::InMemoryCatalog;
    use crate::server::RequestsLoggingLevel;
    use crate::store::SqliteCompanionStore;
    use axum::{body::Body, http::Request};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_app() -> (Router, TempDir) {
        let dir = TempDir::new().unwrap();
        let store: Arc<dyn FullStore> =
            Arc::new(SqliteCompanionStore::new(dir.path().join("companion.db")).unwrap());
        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            ..Default::default()
        };
        let app = make_app(
            config,
            store,
            Arc::new(InMemoryCatalog::new()),
            Arc::new(LoggingResetTokenSink),
            Duration::from_secs(3600),
        )
        .unwrap();
        (app, dir)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn responds_unauthorized_on_protected_routes() {
        let (app, _dir) = test_app();

        let protected_routes = vec![
            "/api/auth/me",
            "/api/profiles",
            "/api/profiles/abc",
            "/api/playlists",
            "/api/playlists/abc",
            "/api/spotify/search?q=love",
            "/api/spotify/browse",
            "/api/spotify/track/123",
            "/api/spotify/playlist/123/tracks",
        ];

        for route in protected_routes.into_iter() {
            let request = Request::builder().uri(route).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", route);
            let body = body_json(response).await;
            assert_eq!(body["message"], "Unauthorized");
        }
    }

    #[tokio::test]
    async fn home_reports_stats() {
        let (app, _dir) = test_app();
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["uptime"].as_str().unwrap().starts_with("0d"));
        assert!(body["session_token"].is_null());
    }

    #[tokio::test]
    async fn login_sets_cookie_and_token_opens_protected_routes() {
        let (app, _dir) = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                None,
                json!({"name": "Lucia", "email": "Lucia@Example.com", "password": "secret1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                None,
                json!({"email": "lucia@example.com", "password": "secret1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("session_token="));
        assert!(cookie.contains("HttpOnly"));
        let token = body_json(response).await["token"]
            .as_str()
            .unwrap()
            .to_string();

        let request = Request::builder()
            .uri("/api/auth/me")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["email"], "lucia@example.com");

        let request = Request::builder()
            .uri("/api/profiles")
            .header(header::COOKIE, format!("session_token={}", token))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let (app, _dir) = test_app();
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                None,
                json!({"name": "Lucia", "email": "lucia@example.com", "password": "secret1"}),
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                None,
                json!({"email": "lucia@example.com", "password": "nope-nope"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn forgot_password_is_accepted_for_unknown_emails() {
        let (app, _dir) = test_app();
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/auth/forgot-password",
                None,
                json!({"email": "nobody@example.com"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn formats_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(
            format_uptime(Duration::from_secs(86_400 + 3600 * 2 + 61)),
            "1d 02:01:01"
        );
    }
}
