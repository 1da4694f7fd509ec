use super::avatar::{generate_avatar, is_valid_avatar, resolve_avatar};
use super::profile_models::{
    Profile, ProfileDetails, ProfileDraft, ProfileFields, ProfilePatch, DEFAULT_AGE_RESTRICTION,
    DEFAULT_LANGUAGE,
};
use crate::error::{CompanionError, CompanionResult};
use crate::store::FullStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Manages the profiles of each account.
pub struct ProfileRegistry {
    store: Arc<dyn FullStore>,
}

fn required_name(name: &str) -> CompanionResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CompanionError::InvalidInput(
            "Profile name is required".to_string(),
        ));
    }
    Ok(name.to_string())
}

impl ProfileRegistry {
    pub fn new(store: Arc<dyn FullStore>) -> Self {
        Self { store }
    }

    /// Lists the account's profiles. Profiles whose stored avatar is not
    /// usable markup get a regenerated one, persisted on the way out.
    pub fn list_profiles(&self, account_id: usize) -> CompanionResult<Vec<Profile>> {
        let mut profiles = self.store.list_profiles(account_id)?;
        for profile in profiles.iter_mut() {
            if is_valid_avatar(&profile.avatar) {
                continue;
            }
            profile.avatar = generate_avatar(&profile.name);
            debug!("Repairing avatar of profile {}", profile.id);
            if let Err(err) = self
                .store
                .update_profile(&profile.id, &ProfileFields::from(&*profile))
            {
                warn!("Could not persist repaired avatar of {}: {}", profile.id, err);
            }
        }
        Ok(profiles)
    }

    pub fn create_profile(&self, account_id: usize, draft: ProfileDraft) -> CompanionResult<Profile> {
        let name = required_name(&draft.name)?;
        let fields = ProfileFields {
            avatar: resolve_avatar(draft.avatar.as_deref(), &name),
            profile_type: draft.profile_type.unwrap_or_default(),
            language: draft
                .language
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            age_restriction: draft.age_restriction.unwrap_or(DEFAULT_AGE_RESTRICTION),
            name,
        };
        let profile = self.store.create_profile(account_id, &fields)?;
        info!(
            "Created {} profile {} for account {}",
            profile.profile_type, profile.id, account_id
        );
        Ok(profile)
    }

    /// Returns the profile if it belongs to the account. A profile of some
    /// other account is reported exactly like a missing one.
    pub fn owned_profile(&self, account_id: usize, profile_id: &str) -> CompanionResult<Profile> {
        match self.store.get_profile(profile_id)? {
            Some(profile) if profile.owner_account_id == account_id => Ok(profile),
            _ => Err(CompanionError::NotFound(format!("profile {}", profile_id))),
        }
    }

    pub fn get_profile_details(
        &self,
        account_id: usize,
        profile_id: &str,
    ) -> CompanionResult<ProfileDetails> {
        let profile = self.owned_profile(account_id, profile_id)?;
        let favorites = self.store.get_favorites(profile_id)?;
        Ok(ProfileDetails {
            profile,
            favorite_artists: favorites.artists,
            favorite_albums: favorites.albums,
        })
    }

    pub fn update_profile(
        &self,
        account_id: usize,
        profile_id: &str,
        patch: ProfilePatch,
    ) -> CompanionResult<Profile> {
        let mut profile = self.owned_profile(account_id, profile_id)?;

        if let Some(name) = patch.name {
            profile.name = required_name(&name)?;
        }
        if let Some(profile_type) = patch.profile_type {
            profile.profile_type = profile_type;
        }
        if let Some(language) = patch.language.filter(|l| !l.trim().is_empty()) {
            profile.language = language;
        }
        if let Some(age_restriction) = patch.age_restriction {
            profile.age_restriction = age_restriction;
        }
        if patch.avatar.is_some() || !is_valid_avatar(&profile.avatar) {
            profile.avatar = resolve_avatar(patch.avatar.as_deref(), &profile.name);
        }

        if !self
            .store
            .update_profile(profile_id, &ProfileFields::from(&profile))?
        {
            return Err(CompanionError::NotFound(format!("profile {}", profile_id)));
        }
        Ok(profile)
    }

    /// Deletes the profile. Its playlists and favorites go with it.
    pub fn delete_profile(&self, account_id: usize, profile_id: &str) -> CompanionResult<()> {
        self.owned_profile(account_id, profile_id)?;
        if !self.store.delete_profile(profile_id)? {
            return Err(CompanionError::NotFound(format!("profile {}", profile_id)));
        }
        info!("Deleted profile {} of account {}", profile_id, account_id);
        Ok(())
    }
}
