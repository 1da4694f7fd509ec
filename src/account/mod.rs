mod account_manager;
mod account_models;
mod account_store;
mod auth;
mod reset_sink;

pub use account_manager::{AccountManager, MIN_PASSWORD_LENGTH};
pub use account_models::Account;
pub use account_store::{
    AccountCredentialsStore, AccountStore, AuthTokenStore, PasswordResetStore,
};
pub use auth::{AuthToken, AuthTokenValue, CompanionHasher, PasswordCredentials, PasswordReset};
pub use reset_sink::{LoggingResetTokenSink, ResetTokenSink};
