use super::account_models::Account;
use super::auth::{AuthToken, AuthTokenValue, PasswordCredentials, PasswordReset};
use anyhow::Result;

pub trait AccountStore: Send + Sync {
    /// Creates a new account and returns its id.
    /// Returns Err if the email is already taken or on database error.
    fn create_account(&self, email: &str, name: &str) -> Result<usize>;

    /// Returns Ok(None) if the account does not exist.
    fn get_account(&self, account_id: usize) -> Result<Option<Account>>;

    /// Looks an account up by its normalized email.
    /// Returns Ok(None) if no account uses that email.
    fn get_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Deletes an account and, through foreign keys, everything it owns.
    /// Returns whether an account was deleted.
    fn delete_account(&self, account_id: usize) -> Result<bool>;
}

pub trait AccountCredentialsStore: Send + Sync {
    /// Returns Ok(None) if the account has no password set.
    fn get_password_credentials(&self, account_id: usize) -> Result<Option<PasswordCredentials>>;

    /// Inserts or replaces the account's password credentials.
    fn set_password_credentials(&self, credentials: &PasswordCredentials) -> Result<()>;

    /// Records a login attempt against the credentials.
    fn touch_password_credentials(&self, account_id: usize, succeeded: bool) -> Result<()>;
}

pub trait AuthTokenStore: Send + Sync {
    /// Returns Ok(None) if the token does not exist.
    fn get_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    fn add_auth_token(&self, token: &AuthToken) -> Result<()>;

    /// Deletes an auth token given the token value.
    /// Returns the deleted token, or Ok(None) if it did not exist.
    fn delete_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Updates an auth token with the latest timestamp.
    fn touch_auth_token(&self, token: &AuthTokenValue) -> Result<()>;

    /// Deletes every token of the account. Returns how many were deleted.
    fn delete_account_auth_tokens(&self, account_id: usize) -> Result<usize>;

    /// Prunes tokens that haven't been used for the specified number of days.
    /// Tokens that were never used count from their creation time.
    /// Returns the number of tokens that were deleted.
    fn prune_unused_auth_tokens(&self, unused_for_days: u64) -> Result<usize>;
}

pub trait PasswordResetStore: Send + Sync {
    fn add_password_reset(&self, reset: &PasswordReset) -> Result<()>;

    /// Returns Ok(None) if the token was never issued or has been pruned.
    fn get_password_reset(&self, token: &str) -> Result<Option<PasswordReset>>;

    /// Marks the token as used. Returns false if it was already used or
    /// does not exist, so two concurrent redemptions cannot both succeed.
    fn mark_password_reset_used(&self, token: &str) -> Result<bool>;

    /// Deletes reset tokens that expired before `now` (epoch seconds).
    fn prune_expired_password_resets(&self, now: i64) -> Result<usize>;
}
