use axum::extract::FromRef;

use crate::account::AccountManager;
use crate::catalog::CatalogGateway;
use crate::playlist::PlaylistEngine;
use crate::profile::{FavoritesLedger, ProfileRegistry};
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedAccountManager = Arc<AccountManager>;
pub type GuardedProfileRegistry = Arc<ProfileRegistry>;
pub type GuardedFavoritesLedger = Arc<FavoritesLedger>;
pub type GuardedPlaylistEngine = Arc<PlaylistEngine>;
pub type GuardedCatalogGateway = Arc<dyn CatalogGateway>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub account_manager: GuardedAccountManager,
    pub profile_registry: GuardedProfileRegistry,
    pub favorites_ledger: GuardedFavoritesLedger,
    pub playlist_engine: GuardedPlaylistEngine,
    pub catalog: GuardedCatalogGateway,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedAccountManager {
    fn from_ref(input: &ServerState) -> Self {
        input.account_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedProfileRegistry {
    fn from_ref(input: &ServerState) -> Self {
        input.profile_registry.clone()
    }
}

impl FromRef<ServerState> for GuardedFavoritesLedger {
    fn from_ref(input: &ServerState) -> Self {
        input.favorites_ledger.clone()
    }
}

impl FromRef<ServerState> for GuardedPlaylistEngine {
    fn from_ref(input: &ServerState) -> Self {
        input.playlist_engine.clone()
    }
}

impl FromRef<ServerState> for GuardedCatalogGateway {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
