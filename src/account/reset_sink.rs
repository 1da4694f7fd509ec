use super::account_models::Account;
use tracing::{debug, info};

/// Receives freshly issued password reset tokens, for delivery to the
/// account holder.
pub trait ResetTokenSink: Send + Sync {
    fn deliver(&self, account: &Account, token: &str, expires: i64);
}

/// Writes reset tokens to the log. Only the token itself is kept at debug
/// level.
pub struct LoggingResetTokenSink;

impl ResetTokenSink for LoggingResetTokenSink {
    fn deliver(&self, account: &Account, token: &str, expires: i64) {
        info!(
            "Password reset issued for account {} ({}), expires at {}",
            account.id, account.email, expires
        );
        debug!("Reset token for {}: {}", account.email, token);
    }
}
