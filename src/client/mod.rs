//! Client side of the companion API, with an explicit session object in
//! place of ambient global state.

mod api_client;
mod session_context;

pub use api_client::{CompanionClient, Refreshed};
pub use session_context::{AppView, SessionContext, SessionSnapshot};
