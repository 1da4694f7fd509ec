//! Persistence for everything the companion owns, behind one SQLite file.

mod schema;
mod sqlite_companion_store;

use crate::account::{AccountCredentialsStore, AccountStore, AuthTokenStore, PasswordResetStore};
use crate::playlist::PlaylistStore;
use crate::profile::{FavoritesStore, ProfileStore};

pub use schema::VERSIONED_SCHEMAS;
pub use sqlite_companion_store::SqliteCompanionStore;

/// Every store the managers need, as a single trait object.
pub trait FullStore:
    AccountStore
    + AccountCredentialsStore
    + AuthTokenStore
    + PasswordResetStore
    + ProfileStore
    + FavoritesStore
    + PlaylistStore
{
}

impl<T> FullStore for T where
    T: AccountStore
        + AccountCredentialsStore
        + AuthTokenStore
        + PasswordResetStore
        + ProfileStore
        + FavoritesStore
        + PlaylistStore
{
}
