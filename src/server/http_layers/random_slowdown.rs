//! Dev-only layer that delays every request by a random amount, to make
//! loading states visible while working on a client.

use axum::{extract::Request, middleware::Next, response::Response};
use rand::Rng;
use std::time::Duration;

const MAX_SLOWDOWN_MS: u64 = 1500;

pub async fn slowdown_request(request: Request, next: Next) -> Response {
    let delay_ms = rand::rng().random_range(0..MAX_SLOWDOWN_MS);
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    next.run(request).await
}
