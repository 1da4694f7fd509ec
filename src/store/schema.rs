use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};
use rusqlite::Connection;

const ACCOUNT_FK: ForeignKey = ForeignKey {
    foreign_table: "account",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};
const PROFILE_FK: ForeignKey = ForeignKey {
    foreign_table: "profile",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};
const PLAYLIST_FK: ForeignKey = ForeignKey {
    foreign_table: "playlist",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

/// V 0
pub const ACCOUNT_TABLE_V_0: Table = Table {
    name: "account",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("email", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_account_email", "email")],
};
pub const ACCOUNT_PASSWORD_CREDENTIALS_TABLE_V_0: Table = Table {
    name: "account_password_credentials",
    columns: &[
        sqlite_column!(
            "account_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&ACCOUNT_FK)
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_tried", &SqlType::Integer),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[],
};
pub const AUTH_TOKEN_TABLE_V_0: Table = Table {
    name: "auth_token",
    columns: &[
        sqlite_column!(
            "account_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ACCOUNT_FK)
        ),
        sqlite_column!("value", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[("idx_auth_token_value", "value")],
};
pub const PROFILE_TABLE_V_0: Table = Table {
    name: "profile",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Text,
            is_primary_key = true,
            non_null = true,
            is_unique = true
        ),
        sqlite_column!(
            "account_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ACCOUNT_FK)
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("type", &SqlType::Text, non_null = true),
        sqlite_column!("avatar", &SqlType::Text, non_null = true),
        sqlite_column!("language", &SqlType::Text, non_null = true),
        sqlite_column!("age_restriction", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_profile_account_id", "account_id")],
};
pub const FAVORITE_ARTIST_TABLE_V_0: Table = Table {
    name: "favorite_artist",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "profile_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&PROFILE_FK)
        ),
        sqlite_column!("artist_id", &SqlType::Text, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("images", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[&["profile_id", "artist_id"]],
    indices: &[],
};
pub const FAVORITE_ALBUM_TABLE_V_0: Table = Table {
    name: "favorite_album",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "profile_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&PROFILE_FK)
        ),
        sqlite_column!("album_id", &SqlType::Text, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("images", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[&["profile_id", "album_id"]],
    indices: &[],
};
pub const PLAYLIST_TABLE_V_0: Table = Table {
    name: "playlist",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Text,
            is_primary_key = true,
            non_null = true,
            is_unique = true
        ),
        sqlite_column!(
            "profile_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&PROFILE_FK)
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("cover", &SqlType::Text),
        sqlite_column!("origin", &SqlType::Text, non_null = true),
        sqlite_column!("source_catalog_id", &SqlType::Text),
        sqlite_column!("source_community_playlist_id", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_playlist_profile_id", "profile_id")],
};
pub const PLAYLIST_SONG_TABLE_V_0: Table = Table {
    name: "playlist_song",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Text,
            is_primary_key = true,
            non_null = true,
            is_unique = true
        ),
        sqlite_column!(
            "playlist_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&PLAYLIST_FK)
        ),
        sqlite_column!("spotify_id", &SqlType::Text),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("artist", &SqlType::Text, non_null = true),
        sqlite_column!("cover", &SqlType::Text),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
    ],
    unique_constraints: &[&["playlist_id", "spotify_id"]],
    indices: &[("idx_playlist_song_playlist_id", "playlist_id")],
};

/// V 1
pub const PLAYLIST_TABLE_V_1: Table = Table {
    name: "playlist",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Text,
            is_primary_key = true,
            non_null = true,
            is_unique = true
        ),
        sqlite_column!(
            "profile_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&PROFILE_FK)
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("cover", &SqlType::Text),
        sqlite_column!("origin", &SqlType::Text, non_null = true),
        sqlite_column!("source_catalog_id", &SqlType::Text),
        sqlite_column!("source_community_playlist_id", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "discoverable",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_playlist_profile_id", "profile_id")],
};
pub const PASSWORD_RESET_TABLE_V_1: Table = Table {
    name: "password_reset",
    columns: &[
        sqlite_column!(
            "token",
            &SqlType::Text,
            is_primary_key = true,
            non_null = true,
            is_unique = true
        ),
        sqlite_column!(
            "account_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ACCOUNT_FK)
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("expires", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "used",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    unique_constraints: &[],
    indices: &[],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        tables: &[
            ACCOUNT_TABLE_V_0,
            ACCOUNT_PASSWORD_CREDENTIALS_TABLE_V_0,
            AUTH_TOKEN_TABLE_V_0,
            PROFILE_TABLE_V_0,
            FAVORITE_ARTIST_TABLE_V_0,
            FAVORITE_ALBUM_TABLE_V_0,
            PLAYLIST_TABLE_V_0,
            PLAYLIST_SONG_TABLE_V_0,
        ],
        migration: None,
    },
    VersionedSchema {
        version: 1,
        tables: &[
            ACCOUNT_TABLE_V_0,
            ACCOUNT_PASSWORD_CREDENTIALS_TABLE_V_0,
            AUTH_TOKEN_TABLE_V_0,
            PROFILE_TABLE_V_0,
            FAVORITE_ARTIST_TABLE_V_0,
            FAVORITE_ALBUM_TABLE_V_0,
            PLAYLIST_TABLE_V_1,
            PLAYLIST_SONG_TABLE_V_0,
            PASSWORD_RESET_TABLE_V_1,
        ],
        migration: Some(|conn: &Connection| {
            conn.execute(
                "ALTER TABLE playlist ADD COLUMN discoverable INTEGER NOT NULL DEFAULT 1",
                [],
            )?;
            PASSWORD_RESET_TABLE_V_1.create(conn)?;
            Ok(())
        }),
    },
];

/// Tables of the newest schema, for queries.
pub const ACCOUNT_TABLE: &Table = &ACCOUNT_TABLE_V_0;
pub const CREDENTIALS_TABLE: &Table = &ACCOUNT_PASSWORD_CREDENTIALS_TABLE_V_0;
pub const AUTH_TOKEN_TABLE: &Table = &AUTH_TOKEN_TABLE_V_0;
pub const PROFILE_TABLE: &Table = &PROFILE_TABLE_V_0;
pub const FAVORITE_ARTIST_TABLE: &Table = &FAVORITE_ARTIST_TABLE_V_0;
pub const FAVORITE_ALBUM_TABLE: &Table = &FAVORITE_ALBUM_TABLE_V_0;
pub const PLAYLIST_TABLE: &Table = &PLAYLIST_TABLE_V_1;
pub const PLAYLIST_SONG_TABLE: &Table = &PLAYLIST_SONG_TABLE_V_0;
pub const PASSWORD_RESET_TABLE: &Table = &PASSWORD_RESET_TABLE_V_1;
