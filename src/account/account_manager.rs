use super::{
    account_models::Account,
    account_store::{AccountCredentialsStore, AccountStore, AuthTokenStore, PasswordResetStore},
    auth::{AuthToken, AuthTokenValue, PasswordCredentials, PasswordReset},
    reset_sink::ResetTokenSink,
};
use crate::error::{CompanionError, CompanionResult};
use crate::metrics::record_login_attempt;
use crate::store::FullStore;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// In-process identity collaborator: accounts, credentials, session tokens
/// and password resets.
pub struct AccountManager {
    store: Arc<dyn FullStore>,
    reset_sink: Arc<dyn ResetTokenSink>,
    reset_token_ttl: Duration,
}

fn normalize_email(email: &str) -> CompanionResult<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(CompanionError::InvalidInput(
            "A valid email is required".to_string(),
        ));
    }
    Ok(email)
}

fn check_password(password: &str) -> CompanionResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CompanionError::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

impl AccountManager {
    pub fn new(
        store: Arc<dyn FullStore>,
        reset_sink: Arc<dyn ResetTokenSink>,
        reset_token_ttl: Duration,
    ) -> Self {
        Self {
            store,
            reset_sink,
            reset_token_ttl,
        }
    }

    pub fn register(&self, name: &str, email: &str, password: &str) -> CompanionResult<Account> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CompanionError::InvalidInput("Name is required".to_string()));
        }
        let email = normalize_email(email)?;
        check_password(password)?;

        if self.store.get_account_by_email(&email)?.is_some() {
            return Err(CompanionError::Conflict(format!(
                "An account with email {} already exists",
                email
            )));
        }

        let account_id = self.store.create_account(&email, name)?;
        let credentials = PasswordCredentials::hashed(account_id, password)
            .and_then(|credentials| self.store.set_password_credentials(&credentials));
        if let Err(err) = credentials {
            // Leave no account behind that nobody can log into.
            if let Err(cleanup_err) = self.store.delete_account(account_id) {
                warn!(
                    "Could not remove account {} after failed registration: {}",
                    account_id, cleanup_err
                );
            }
            return Err(err.into());
        }

        info!("Registered account {} ({})", account_id, email);
        self.store
            .get_account(account_id)?
            .ok_or_else(|| CompanionError::NotFound(format!("account {}", account_id)))
    }

    pub fn login(&self, email: &str, password: &str) -> CompanionResult<AuthToken> {
        let email = email.trim().to_lowercase();
        let Some(account) = self.store.get_account_by_email(&email)? else {
            debug!("Login attempt for unknown email {}", email);
            record_login_attempt("failure");
            return Err(CompanionError::Unauthorized);
        };
        let Some(credentials) = self.store.get_password_credentials(account.id)? else {
            record_login_attempt("failure");
            return Err(CompanionError::Unauthorized);
        };

        let verified = credentials.verify(password)?;
        self.store.touch_password_credentials(account.id, verified)?;
        if !verified {
            record_login_attempt("failure");
            return Err(CompanionError::Unauthorized);
        }

        let token = AuthToken {
            account_id: account.id,
            value: AuthTokenValue::generate(),
            created: SystemTime::now(),
            last_used: None,
        };
        self.store.add_auth_token(&token)?;
        record_login_attempt("success");
        Ok(token)
    }

    pub fn logout(&self, token: &AuthTokenValue) -> CompanionResult<()> {
        match self.store.delete_auth_token(token)? {
            Some(deleted) => {
                debug!("Account {} logged out", deleted.account_id);
                Ok(())
            }
            None => Err(CompanionError::Unauthorized),
        }
    }

    /// Resolves a token to its account, refreshing the token's last use.
    pub fn current_user(&self, token: &AuthTokenValue) -> CompanionResult<Account> {
        let auth_token = self
            .store
            .get_auth_token(token)?
            .ok_or(CompanionError::Unauthorized)?;
        self.store.touch_auth_token(token)?;
        self.store
            .get_account(auth_token.account_id)?
            .ok_or(CompanionError::Unauthorized)
    }

    /// Issues a reset token when the email belongs to an account. Unknown
    /// emails succeed the same way.
    pub fn request_password_reset(&self, email: &str) -> CompanionResult<()> {
        let email = email.trim().to_lowercase();
        let Some(account) = self.store.get_account_by_email(&email)? else {
            debug!("Password reset requested for unknown email {}", email);
            return Ok(());
        };

        let now = chrono::Utc::now().timestamp();
        let reset = PasswordReset {
            token: PasswordReset::generate_token(),
            account_id: account.id,
            created: now,
            expires: now + self.reset_token_ttl.as_secs() as i64,
            used: false,
        };
        self.store.add_password_reset(&reset)?;
        self.reset_sink
            .deliver(&account, &reset.token, reset.expires);
        Ok(())
    }

    pub fn reset_password(&self, token: &str, new_password: &str) -> CompanionResult<()> {
        let invalid = || CompanionError::InvalidInput("Invalid or expired reset token".to_string());

        let reset = self.store.get_password_reset(token)?.ok_or_else(invalid)?;
        if !reset.is_redeemable(chrono::Utc::now().timestamp()) {
            return Err(invalid());
        }
        check_password(new_password)?;
        if !self.store.mark_password_reset_used(token)? {
            return Err(invalid());
        }

        let credentials = PasswordCredentials::hashed(reset.account_id, new_password)?;
        self.store.set_password_credentials(&credentials)?;
        let revoked = self.store.delete_account_auth_tokens(reset.account_id)?;
        info!(
            "Password reset for account {}, revoked {} sessions",
            reset.account_id, revoked
        );
        Ok(())
    }

    /// Removes stale session tokens and expired reset tokens. Returns the
    /// number of session tokens removed.
    pub fn prune_tokens(&self, token_retention_days: u64) -> anyhow::Result<usize> {
        let pruned_tokens = self.store.prune_unused_auth_tokens(token_retention_days)?;
        let pruned_resets = self
            .store
            .prune_expired_password_resets(chrono::Utc::now().timestamp())?;
        if pruned_tokens > 0 || pruned_resets > 0 {
            info!(
                "Pruned {} unused auth tokens and {} expired reset tokens",
                pruned_tokens, pruned_resets
            );
        }
        Ok(pruned_tokens)
    }
}
