//! # plume-server
//!
//! HTTP surface for browser clients: `/api/health`, `/api/chat`,
//! `/api/limits` and `/api/spellcheck`.

pub mod config;
pub mod handlers;
pub mod health;
pub mod server;

pub use config::ServerConfig;
pub use server::{build_router, start, AppState, ServerHandle};
