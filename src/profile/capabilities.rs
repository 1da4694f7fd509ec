use super::profile_models::{Profile, ProfileType};

/// Whether the profile may import playlists straight from the external
/// catalog. Every permission check on catalog import goes through here.
pub fn can_import_from_catalog(profile: &Profile) -> bool {
    match profile.profile_type {
        ProfileType::Adult => true,
        ProfileType::Child => false,
    }
}
