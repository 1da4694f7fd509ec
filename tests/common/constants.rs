//! Shared constants for end-to-end tests
//!
//! When test data changes (account credentials, catalog ids, etc.),
//! update only this file.

// ============================================================================
// Test Account Credentials
// ============================================================================

pub const TEST_NAME: &str = "Lucia";
pub const TEST_EMAIL: &str = "lucia@example.com";
pub const TEST_PASS: &str = "testpass123";

/// A second account, for cross-account checks
pub const OTHER_NAME: &str = "Ana";
pub const OTHER_EMAIL: &str = "ana@example.com";
pub const OTHER_PASS: &str = "otherpass123";

// ============================================================================
// Test Catalog IDs
// ============================================================================

/// Catalog playlist "Road Classics" with tracks t1, t2, t3 and one
/// unresolvable entry
pub const CATALOG_PLAYLIST_ID: &str = "pl123";
pub const CATALOG_PLAYLIST_NAME: &str = "Road Classics";
pub const CATALOG_PLAYLIST_COVER: &str = "https://img.example.com/pl123.jpg";

pub const TRACK_1_ID: &str = "t1";
pub const TRACK_2_ID: &str = "t2";
pub const TRACK_3_ID: &str = "t3";

/// Artist "Ana Tijoux", credited on t1 and t3
pub const ARTIST_1_ID: &str = "ar1";
/// Artist "Bomba Estereo", credited on t2
pub const ARTIST_2_ID: &str = "ar2";

/// Album "Vengo" by ARTIST_1
pub const ALBUM_1_ID: &str = "al1";
pub const ALBUM_1_COVER: &str = "https://img.example.com/al1.jpg";

// ============================================================================
// Timeouts
// ============================================================================

pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
