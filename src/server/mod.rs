mod catalog_routes;
pub mod config;
mod http_layers;
mod playlist_routes;
mod profile_routes;
pub mod responses;
pub mod server;
pub mod session;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
#[allow(unused_imports)] // Used by main.rs
pub use server::run_server;
