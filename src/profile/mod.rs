mod avatar;
mod capabilities;
mod favorites_ledger;
mod profile_models;
mod profile_registry;
mod profile_store;

pub use avatar::{generate_avatar, is_valid_avatar, resolve_avatar};
pub use capabilities::can_import_from_catalog;
pub use favorites_ledger::FavoritesLedger;
pub use profile_models::*;
pub use profile_registry::ProfileRegistry;
pub use profile_store::{FavoritesStore, ProfileStore};
