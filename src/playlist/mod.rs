mod community;
mod engine;
mod playlist_models;
mod playlist_store;

pub use community::{CommunityDirectory, COMMUNITY_SEARCH_LIMIT};
pub use engine::{community_copy_name, PlaylistEngine, ANONYMOUS_OWNER, MAX_PLAYLIST_SIZE};
pub use playlist_models::*;
pub use playlist_store::PlaylistStore;
