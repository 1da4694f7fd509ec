use crate::catalog::CatalogImage;
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_LANGUAGE: &str = "es";
pub const DEFAULT_AGE_RESTRICTION: u32 = 18;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileType {
    #[default]
    Adult,
    Child,
}

impl FromStr for ProfileType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "adult" => Ok(ProfileType::Adult),
            "child" => Ok(ProfileType::Child),
            _ => bail!("Unknown profile type {}", s),
        }
    }
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileType::Adult => write!(f, "adult"),
            ProfileType::Child => write!(f, "child"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub owner_account_id: usize,
    pub name: String,
    #[serde(rename = "type")]
    pub profile_type: ProfileType,
    pub avatar: String,
    pub language: String,
    pub age_restriction: u32,
    pub created: i64,
}

/// Resolved, validated profile attributes as they get persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileFields {
    pub name: String,
    pub profile_type: ProfileType,
    pub avatar: String,
    pub language: String,
    pub age_restriction: u32,
}

impl From<&Profile> for ProfileFields {
    fn from(profile: &Profile) -> Self {
        ProfileFields {
            name: profile.name.clone(),
            profile_type: profile.profile_type,
            avatar: profile.avatar.clone(),
            language: profile.language.clone(),
            age_restriction: profile.age_restriction,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDraft {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub profile_type: Option<ProfileType>,
    pub avatar: Option<String>,
    pub language: Option<String>,
    pub age_restriction: Option<u32>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub profile_type: Option<ProfileType>,
    pub avatar: Option<String>,
    pub language: Option<String>,
    pub age_restriction: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FavoriteArtist {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub images: Vec<CatalogImage>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FavoriteAlbum {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub images: Vec<CatalogImage>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Favorites {
    pub artists: Vec<FavoriteArtist>,
    pub albums: Vec<FavoriteAlbum>,
}

/// A profile together with its favorites, as served by the profile detail
/// route.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetails {
    #[serde(flatten)]
    pub profile: Profile,
    pub favorite_artists: Vec<FavoriteArtist>,
    pub favorite_albums: Vec<FavoriteAlbum>,
}
