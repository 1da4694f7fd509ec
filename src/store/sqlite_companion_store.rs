use super::schema::{
    ACCOUNT_TABLE, AUTH_TOKEN_TABLE, CREDENTIALS_TABLE, FAVORITE_ALBUM_TABLE,
    FAVORITE_ARTIST_TABLE, PASSWORD_RESET_TABLE, PLAYLIST_SONG_TABLE, PLAYLIST_TABLE,
    PROFILE_TABLE, VERSIONED_SCHEMAS,
};
use crate::account::{
    Account, AccountCredentialsStore, AccountStore, AuthToken, AuthTokenStore, AuthTokenValue,
    CompanionHasher, PasswordCredentials, PasswordReset, PasswordResetStore,
};
use crate::catalog::CatalogImage;
use crate::playlist::{
    CommunityPlaylist, NewPlaylist, Playlist, PlaylistOrigin, PlaylistStore, PlaylistUpdate, Song,
};
use crate::profile::{
    FavoriteAlbum, FavoriteArtist, Favorites, FavoritesStore, Profile, ProfileFields,
    ProfileStore, ProfileType,
};
use crate::sqlite_persistence::open_and_migrate;
use anyhow::{Context, Result};
use rand::{rng, Rng};
use rand_distr::Alphanumeric;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tracing::debug;

const ID_LENGTH: usize = 16;
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// A random A-z0-9 string
fn random_string(len: usize) -> String {
    let bytes = rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .collect::<Vec<u8>>();
    String::from_utf8_lossy(&bytes).to_string()
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

fn system_time_from_column(value: i64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(value.max(0) as u64)
}

fn system_time_to_column(time: SystemTime) -> i64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn conversion_error(column: usize, err: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, err.into())
}

fn parse_images(column: usize, raw: &str) -> rusqlite::Result<Vec<CatalogImage>> {
    serde_json::from_str(raw).map_err(|err| conversion_error(column, err.into()))
}

const PROFILE_COLUMNS: &str = "id, account_id, name, type, avatar, language, age_restriction, created";

fn profile_from_row(row: &Row) -> rusqlite::Result<Profile> {
    let profile_type: String = row.get(3)?;
    Ok(Profile {
        id: row.get(0)?,
        owner_account_id: row.get(1)?,
        name: row.get(2)?,
        profile_type: ProfileType::from_str(&profile_type)
            .map_err(|err| conversion_error(3, err))?,
        avatar: row.get(4)?,
        language: row.get(5)?,
        age_restriction: row.get(6)?,
        created: row.get(7)?,
    })
}

const PLAYLIST_COLUMNS: &str = "p.id, p.profile_id, p.name, p.cover, p.origin, \
    p.source_catalog_id, p.source_community_playlist_id, p.discoverable, p.created, p.updated";

/// Maps a row selected with [PLAYLIST_COLUMNS]. Songs are loaded separately.
fn playlist_from_row(row: &Row) -> rusqlite::Result<Playlist> {
    let origin: String = row.get(4)?;
    Ok(Playlist {
        id: row.get(0)?,
        profile_id: row.get(1)?,
        name: row.get(2)?,
        cover: row.get(3)?,
        origin: PlaylistOrigin::from_str(&origin).map_err(|err| conversion_error(4, err))?,
        source_catalog_id: row.get(5)?,
        source_community_playlist_id: row.get(6)?,
        discoverable: row.get::<_, i64>(7)? != 0,
        songs: vec![],
        created: row.get(8)?,
        updated: row.get(9)?,
    })
}

fn load_songs(conn: &Connection, playlist_id: &str) -> Result<Vec<Song>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, spotify_id, title, artist, cover FROM {} WHERE playlist_id = ?1 ORDER BY position",
        PLAYLIST_SONG_TABLE.name
    ))?;
    let songs = stmt
        .query_map(params![playlist_id], |row| {
            Ok(Song {
                id: row.get(0)?,
                spotify_id: row.get(1)?,
                title: row.get(2)?,
                artist: row.get(3)?,
                cover: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(songs)
}

fn load_playlist(conn: &Connection, playlist_id: &str) -> Result<Option<Playlist>> {
    let playlist = conn
        .query_row(
            &format!(
                "SELECT {} FROM {} p WHERE p.id = ?1",
                PLAYLIST_COLUMNS, PLAYLIST_TABLE.name
            ),
            params![playlist_id],
            playlist_from_row,
        )
        .optional()?;
    match playlist {
        Some(mut playlist) => {
            playlist.songs = load_songs(conn, &playlist.id)?;
            Ok(Some(playlist))
        }
        None => Ok(None),
    }
}

fn insert_songs(tx: &Transaction, playlist_id: &str, songs: &[Song]) -> Result<()> {
    let mut stmt = tx.prepare(&format!(
        "INSERT INTO {} (id, playlist_id, spotify_id, title, artist, cover, position) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        PLAYLIST_SONG_TABLE.name
    ))?;
    for (position, song) in songs.iter().enumerate() {
        stmt.execute(params![
            song.id,
            playlist_id,
            song.spotify_id,
            song.title,
            song.artist,
            song.cover,
            position as i64
        ])
        .with_context(|| format!("Could not store song {} in playlist {}", song.id, playlist_id))?;
    }
    Ok(())
}

fn touch_playlist(conn: &Connection, playlist_id: &str) -> Result<()> {
    conn.execute(
        &format!("UPDATE {} SET updated = ?1 WHERE id = ?2", PLAYLIST_TABLE.name),
        params![now_secs(), playlist_id],
    )?;
    Ok(())
}

/// Picks an id not yet used in `table`.
fn unused_id(conn: &Connection, table: &str) -> Result<String> {
    loop {
        let id = random_string(ID_LENGTH);
        let taken = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE id = ?1", table),
            params![id],
            |row| row.get::<usize, i64>(0),
        )? > 0;
        if !taken {
            return Ok(id);
        }
    }
}

#[derive(Clone)]
pub struct SqliteCompanionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCompanionStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = if db_path.as_ref().exists() {
            let conn = Connection::open_with_flags(
                db_path.as_ref(),
                rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .with_context(|| format!("Failed to open {}", db_path.as_ref().display()))?;
            conn.execute("PRAGMA foreign_keys = ON;", [])?;
            open_and_migrate(&conn, VERSIONED_SCHEMAS)?;
            conn
        } else {
            let conn = Connection::open(db_path.as_ref())
                .with_context(|| format!("Failed to create {}", db_path.as_ref().display()))?;
            VERSIONED_SCHEMAS
                .last()
                .context("No schema defined")?
                .create(&conn)?;
            conn
        };

        Ok(SqliteCompanionStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl AccountStore for SqliteCompanionStore {
    fn create_account(&self, email: &str, name: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (email, name, created) VALUES (?1, ?2, ?3)",
                ACCOUNT_TABLE.name
            ),
            params![email, name, now_secs()],
        )
        .with_context(|| format!("Failed to create account {}", email))?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_account(&self, account_id: usize) -> Result<Option<Account>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!(
                    "SELECT id, email, name, created FROM {} WHERE id = ?1",
                    ACCOUNT_TABLE.name
                ),
                params![account_id],
                |row| {
                    Ok(Account {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        name: row.get(2)?,
                        created: row.get(3)?,
                    })
                },
            )
            .optional()?)
    }

    fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!(
                    "SELECT id, email, name, created FROM {} WHERE email = ?1",
                    ACCOUNT_TABLE.name
                ),
                params![email],
                |row| {
                    Ok(Account {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        name: row.get(2)?,
                        created: row.get(3)?,
                    })
                },
            )
            .optional()?)
    }

    fn delete_account(&self, account_id: usize) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", ACCOUNT_TABLE.name),
            params![account_id],
        )?;
        Ok(deleted > 0)
    }
}

impl AccountCredentialsStore for SqliteCompanionStore {
    fn get_password_credentials(&self, account_id: usize) -> Result<Option<PasswordCredentials>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!(
                    "SELECT salt, hash, hasher, created, last_tried, last_used FROM {} WHERE account_id = ?1",
                    CREDENTIALS_TABLE.name
                ),
                params![account_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, Option<i64>>(4)?,
                        row.get::<_, Option<i64>>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((salt, hash, hasher, created, last_tried, last_used)) = row else {
            return Ok(None);
        };
        Ok(Some(PasswordCredentials {
            account_id,
            salt,
            hash,
            hasher: CompanionHasher::from_str(&hasher)?,
            created: system_time_from_column(created),
            last_tried: last_tried.map(system_time_from_column),
            last_used: last_used.map(system_time_from_column),
        }))
    }

    fn set_password_credentials(&self, credentials: &PasswordCredentials) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (account_id, salt, hash, hasher, created) VALUES (?1, ?2, ?3, ?4, ?5) \
                 ON CONFLICT(account_id) DO UPDATE SET salt = excluded.salt, hash = excluded.hash, \
                 hasher = excluded.hasher, created = excluded.created, last_tried = NULL, last_used = NULL",
                CREDENTIALS_TABLE.name
            ),
            params![
                credentials.account_id,
                credentials.salt,
                credentials.hash,
                credentials.hasher.to_string(),
                system_time_to_column(credentials.created)
            ],
        )
        .with_context(|| {
            format!(
                "Failed to store credentials of account {}",
                credentials.account_id
            )
        })?;
        Ok(())
    }

    fn touch_password_credentials(&self, account_id: usize, succeeded: bool) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let now = now_secs();
        if succeeded {
            conn.execute(
                &format!(
                    "UPDATE {} SET last_tried = ?1, last_used = ?1 WHERE account_id = ?2",
                    CREDENTIALS_TABLE.name
                ),
                params![now, account_id],
            )?;
        } else {
            conn.execute(
                &format!(
                    "UPDATE {} SET last_tried = ?1 WHERE account_id = ?2",
                    CREDENTIALS_TABLE.name
                ),
                params![now, account_id],
            )?;
        }
        Ok(())
    }
}

fn auth_token_from_row(row: &Row) -> rusqlite::Result<AuthToken> {
    Ok(AuthToken {
        account_id: row.get(0)?,
        value: AuthTokenValue(row.get(1)?),
        created: system_time_from_column(row.get(2)?),
        last_used: row
            .get::<usize, Option<i64>>(3)?
            .map(system_time_from_column),
    })
}

impl AuthTokenStore for SqliteCompanionStore {
    fn get_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!(
                    "SELECT account_id, value, created, last_used FROM {} WHERE value = ?1",
                    AUTH_TOKEN_TABLE.name
                ),
                params![token.0],
                auth_token_from_row,
            )
            .optional()?)
    }

    fn add_auth_token(&self, token: &AuthToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (account_id, value, created, last_used) VALUES (?1, ?2, ?3, ?4)",
                AUTH_TOKEN_TABLE.name
            ),
            params![
                token.account_id,
                token.value.0,
                system_time_to_column(token.created),
                token.last_used.map(system_time_to_column)
            ],
        )?;
        Ok(())
    }

    fn delete_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let Some(existing) = self.get_auth_token(token)? else {
            return Ok(None);
        };
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE value = ?1", AUTH_TOKEN_TABLE.name),
            params![token.0],
        )?;
        Ok((deleted > 0).then_some(existing))
    }

    fn touch_auth_token(&self, token: &AuthTokenValue) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "UPDATE {} SET last_used = ?1 WHERE value = ?2",
                AUTH_TOKEN_TABLE.name
            ),
            params![now_secs(), token.0],
        )?;
        Ok(())
    }

    fn delete_account_auth_tokens(&self, account_id: usize) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.execute(
            &format!("DELETE FROM {} WHERE account_id = ?1", AUTH_TOKEN_TABLE.name),
            params![account_id],
        )?)
    }

    fn prune_unused_auth_tokens(&self, unused_for_days: u64) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let cutoff = now_secs() - (unused_for_days * SECONDS_PER_DAY) as i64;
        let deleted = conn.execute(
            &format!(
                "DELETE FROM {} WHERE COALESCE(last_used, created) < ?1",
                AUTH_TOKEN_TABLE.name
            ),
            params![cutoff],
        )?;
        debug!("Pruned {} auth tokens unused since {}", deleted, cutoff);
        Ok(deleted)
    }
}

impl PasswordResetStore for SqliteCompanionStore {
    fn add_password_reset(&self, reset: &PasswordReset) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (token, account_id, created, expires, used) VALUES (?1, ?2, ?3, ?4, ?5)",
                PASSWORD_RESET_TABLE.name
            ),
            params![
                reset.token,
                reset.account_id,
                reset.created,
                reset.expires,
                reset.used as i64
            ],
        )?;
        Ok(())
    }

    fn get_password_reset(&self, token: &str) -> Result<Option<PasswordReset>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!(
                    "SELECT token, account_id, created, expires, used FROM {} WHERE token = ?1",
                    PASSWORD_RESET_TABLE.name
                ),
                params![token],
                |row| {
                    Ok(PasswordReset {
                        token: row.get(0)?,
                        account_id: row.get(1)?,
                        created: row.get(2)?,
                        expires: row.get(3)?,
                        used: row.get::<_, i64>(4)? != 0,
                    })
                },
            )
            .optional()?)
    }

    fn mark_password_reset_used(&self, token: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            &format!(
                "UPDATE {} SET used = 1 WHERE token = ?1 AND used = 0",
                PASSWORD_RESET_TABLE.name
            ),
            params![token],
        )?;
        Ok(updated == 1)
    }

    fn prune_expired_password_resets(&self, now: i64) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.execute(
            &format!("DELETE FROM {} WHERE expires < ?1", PASSWORD_RESET_TABLE.name),
            params![now],
        )?)
    }
}

impl ProfileStore for SqliteCompanionStore {
    fn create_profile(&self, owner_account_id: usize, fields: &ProfileFields) -> Result<Profile> {
        let conn = self.conn.lock().unwrap();
        let profile_id = unused_id(&conn, PROFILE_TABLE.name)?;
        conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                PROFILE_TABLE.name, PROFILE_COLUMNS
            ),
            params![
                profile_id,
                owner_account_id,
                fields.name,
                fields.profile_type.to_string(),
                fields.avatar,
                fields.language,
                fields.age_restriction,
                now_secs()
            ],
        )
        .with_context(|| format!("Could not create profile for account {}", owner_account_id))?;

        conn.query_row(
            &format!(
                "SELECT {} FROM {} WHERE id = ?1",
                PROFILE_COLUMNS, PROFILE_TABLE.name
            ),
            params![profile_id],
            profile_from_row,
        )
        .context("Could not read back created profile")
    }

    fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE id = ?1",
                    PROFILE_COLUMNS, PROFILE_TABLE.name
                ),
                params![profile_id],
                profile_from_row,
            )
            .optional()?)
    }

    fn list_profiles(&self, owner_account_id: usize) -> Result<Vec<Profile>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE account_id = ?1 ORDER BY created, rowid",
            PROFILE_COLUMNS, PROFILE_TABLE.name
        ))?;
        let profiles = stmt
            .query_map(params![owner_account_id], profile_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }

    fn update_profile(&self, profile_id: &str, fields: &ProfileFields) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            &format!(
                "UPDATE {} SET name = ?1, type = ?2, avatar = ?3, language = ?4, age_restriction = ?5 \
                 WHERE id = ?6",
                PROFILE_TABLE.name
            ),
            params![
                fields.name,
                fields.profile_type.to_string(),
                fields.avatar,
                fields.language,
                fields.age_restriction,
                profile_id
            ],
        )?;
        Ok(updated > 0)
    }

    fn delete_profile(&self, profile_id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", PROFILE_TABLE.name),
            params![profile_id],
        )?;
        Ok(deleted > 0)
    }
}

impl FavoritesStore for SqliteCompanionStore {
    fn add_favorite_artist(&self, profile_id: &str, artist: &FavoriteArtist) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (profile_id, artist_id, name, images) VALUES (?1, ?2, ?3, ?4)",
                FAVORITE_ARTIST_TABLE.name
            ),
            params![
                profile_id,
                artist.id,
                artist.name,
                serde_json::to_string(&artist.images)?
            ],
        )?;
        Ok(inserted > 0)
    }

    fn add_favorite_album(&self, profile_id: &str, album: &FavoriteAlbum) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (profile_id, album_id, name, images) VALUES (?1, ?2, ?3, ?4)",
                FAVORITE_ALBUM_TABLE.name
            ),
            params![
                profile_id,
                album.id,
                album.name,
                serde_json::to_string(&album.images)?
            ],
        )?;
        Ok(inserted > 0)
    }

    fn get_favorites(&self, profile_id: &str) -> Result<Favorites> {
        let conn = self.conn.lock().unwrap();
        let artists = conn
            .prepare(&format!(
                "SELECT artist_id, name, images FROM {} WHERE profile_id = ?1 ORDER BY id",
                FAVORITE_ARTIST_TABLE.name
            ))?
            .query_map(params![profile_id], |row| {
                Ok(FavoriteArtist {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    images: parse_images(2, &row.get::<_, String>(2)?)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        let albums = conn
            .prepare(&format!(
                "SELECT album_id, name, images FROM {} WHERE profile_id = ?1 ORDER BY id",
                FAVORITE_ALBUM_TABLE.name
            ))?
            .query_map(params![profile_id], |row| {
                Ok(FavoriteAlbum {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    images: parse_images(2, &row.get::<_, String>(2)?)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Favorites { artists, albums })
    }
}

impl PlaylistStore for SqliteCompanionStore {
    fn create_playlist(&self, playlist: &NewPlaylist) -> Result<Playlist> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let playlist_id = unused_id(&tx, PLAYLIST_TABLE.name)?;
        let (source_catalog_id, source_community_playlist_id) = match playlist.origin {
            PlaylistOrigin::Manual => (None, None),
            PlaylistOrigin::CatalogImport => (playlist.source_id.as_deref(), None),
            PlaylistOrigin::CommunityImport => (None, playlist.source_id.as_deref()),
        };
        let now = now_secs();
        tx.execute(
            &format!(
                "INSERT INTO {} (id, profile_id, name, cover, origin, source_catalog_id, \
                 source_community_playlist_id, created, updated, discoverable) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, 1)",
                PLAYLIST_TABLE.name
            ),
            params![
                playlist_id,
                playlist.profile_id,
                playlist.name,
                playlist.cover,
                playlist.origin.as_str(),
                source_catalog_id,
                source_community_playlist_id,
                now
            ],
        )
        .context("Could not create playlist")?;
        insert_songs(&tx, &playlist_id, &playlist.songs)?;
        tx.commit()?;

        load_playlist(&conn, &playlist_id)?.context("Created playlist vanished")
    }

    fn get_playlist(&self, playlist_id: &str) -> Result<Option<Playlist>> {
        let conn = self.conn.lock().unwrap();
        load_playlist(&conn, playlist_id)
    }

    fn list_playlists(&self, profile_id: &str) -> Result<Vec<Playlist>> {
        let conn = self.conn.lock().unwrap();
        let mut playlists = conn
            .prepare(&format!(
                "SELECT {} FROM {} p WHERE p.profile_id = ?1 ORDER BY p.created, p.rowid",
                PLAYLIST_COLUMNS, PLAYLIST_TABLE.name
            ))?
            .query_map(params![profile_id], playlist_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        for playlist in playlists.iter_mut() {
            playlist.songs = load_songs(&conn, &playlist.id)?;
        }
        Ok(playlists)
    }

    fn update_playlist(&self, playlist_id: &str, update: &PlaylistUpdate) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let exists = tx
            .query_row(
                &format!("SELECT 1 FROM {} WHERE id = ?1", PLAYLIST_TABLE.name),
                params![playlist_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            return Ok(false);
        }

        if let Some(name) = &update.name {
            tx.execute(
                &format!("UPDATE {} SET name = ?1 WHERE id = ?2", PLAYLIST_TABLE.name),
                params![name, playlist_id],
            )?;
        }
        if let Some(discoverable) = update.discoverable {
            tx.execute(
                &format!(
                    "UPDATE {} SET discoverable = ?1 WHERE id = ?2",
                    PLAYLIST_TABLE.name
                ),
                params![discoverable as i64, playlist_id],
            )?;
        }
        if let Some(songs) = &update.songs {
            debug!("Replacing songs of playlist {}", playlist_id);
            tx.execute(
                &format!(
                    "DELETE FROM {} WHERE playlist_id = ?1",
                    PLAYLIST_SONG_TABLE.name
                ),
                params![playlist_id],
            )?;
            insert_songs(&tx, playlist_id, songs)?;
        }
        touch_playlist(&tx, playlist_id)?;
        tx.commit()?;
        Ok(true)
    }

    fn append_song(&self, playlist_id: &str, song: &Song) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        if let Some(spotify_id) = &song.spotify_id {
            let present = tx.query_row(
                &format!(
                    "SELECT COUNT(*) FROM {} WHERE playlist_id = ?1 AND spotify_id = ?2",
                    PLAYLIST_SONG_TABLE.name
                ),
                params![playlist_id, spotify_id],
                |row| row.get::<usize, i64>(0),
            )? > 0;
            if present {
                return Ok(false);
            }
        }

        let position: i64 = tx.query_row(
            &format!(
                "SELECT COALESCE(MAX(position) + 1, 0) FROM {} WHERE playlist_id = ?1",
                PLAYLIST_SONG_TABLE.name
            ),
            params![playlist_id],
            |row| row.get(0),
        )?;
        tx.execute(
            &format!(
                "INSERT INTO {} (id, playlist_id, spotify_id, title, artist, cover, position) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                PLAYLIST_SONG_TABLE.name
            ),
            params![
                song.id,
                playlist_id,
                song.spotify_id,
                song.title,
                song.artist,
                song.cover,
                position
            ],
        )
        .with_context(|| format!("Could not add song to playlist {}", playlist_id))?;
        touch_playlist(&tx, playlist_id)?;
        tx.commit()?;
        Ok(true)
    }

    fn remove_song(&self, playlist_id: &str, song_ref: &str) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let mut removed = tx.execute(
            &format!(
                "DELETE FROM {} WHERE playlist_id = ?1 AND id = ?2",
                PLAYLIST_SONG_TABLE.name
            ),
            params![playlist_id, song_ref],
        )?;
        if removed == 0 {
            removed = tx.execute(
                &format!(
                    "DELETE FROM {} WHERE playlist_id = ?1 AND spotify_id = ?2",
                    PLAYLIST_SONG_TABLE.name
                ),
                params![playlist_id, song_ref],
            )?;
        }
        if removed > 0 {
            touch_playlist(&tx, playlist_id)?;
        }
        tx.commit()?;
        Ok(removed > 0)
    }

    fn delete_playlist(&self, playlist_id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", PLAYLIST_TABLE.name),
            params![playlist_id],
        )?;
        Ok(deleted > 0)
    }

    fn search_discoverable_playlists(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<CommunityPlaylist>> {
        let conn = self.conn.lock().unwrap();
        let mut found = conn
            .prepare(&format!(
                "SELECT {}, pr.name FROM {} p JOIN {} pr ON pr.id = p.profile_id \
                 WHERE p.discoverable = 1 AND instr(lower(p.name), lower(?1)) > 0 \
                 ORDER BY p.updated DESC, p.rowid DESC LIMIT ?2",
                PLAYLIST_COLUMNS, PLAYLIST_TABLE.name, PROFILE_TABLE.name
            ))?
            .query_map(params![term, limit as i64], |row| {
                Ok(CommunityPlaylist {
                    playlist: playlist_from_row(row)?,
                    owner_name: row.get(10)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        for entry in found.iter_mut() {
            entry.playlist.songs = load_songs(&conn, &entry.playlist.id)?;
        }
        Ok(found)
    }

    fn get_community_playlist(&self, playlist_id: &str) -> Result<Option<CommunityPlaylist>> {
        let conn = self.conn.lock().unwrap();
        let found = conn
            .query_row(
                &format!(
                    "SELECT {}, pr.name FROM {} p JOIN {} pr ON pr.id = p.profile_id \
                     WHERE p.id = ?1 AND p.discoverable = 1",
                    PLAYLIST_COLUMNS, PLAYLIST_TABLE.name, PROFILE_TABLE.name
                ),
                params![playlist_id],
                |row| {
                    Ok(CommunityPlaylist {
                        playlist: playlist_from_row(row)?,
                        owner_name: row.get(10)?,
                    })
                },
            )
            .optional()?;
        match found {
            Some(mut entry) => {
                entry.playlist.songs = load_songs(&conn, &entry.playlist.id)?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }
}
