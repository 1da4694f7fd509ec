use super::{CatalogGateway, SearchKind};
use crate::metrics::record_catalog_failure;
use rand::seq::IndexedRandom;
use serde_json::{json, Value};
use tracing::warn;

pub const BROWSE_TERMS: &[&str] = &[
    "a", "e", "i", "o", "u", "love", "the", "la", "el", "mi", "yo", "you", "summer", "night",
    "sun",
];
pub const BROWSE_LIMIT: u32 = 10;

/// Fills a default view with results for a random term. Any catalog failure
/// yields an empty page instead of an error.
pub async fn browse(gateway: &dyn CatalogGateway, kind: SearchKind) -> Value {
    let term = BROWSE_TERMS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or("a");
    match gateway.search(term, &[kind], BROWSE_LIMIT).await {
        Ok(results) => results,
        Err(err) => {
            warn!("Browsing {} with term '{}' failed: {:#}", kind, term, err);
            record_catalog_failure("browse");
            json!({ kind.result_key(): { "items": [] } })
        }
    }
}
