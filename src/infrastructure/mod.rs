//! Infrastructure layer - Framework implementations
//!
//! This layer contains:
//! - Database connection and schema bootstrap (db)
//! - HTTP server setup (server)
//! - Configuration loading (config)
//! - Authentication (auth) and failed-login tracking (login_guard)
//! - Local file storage (storage)
//! - Repository implementations (repositories)
//! - Application state (state)

pub mod auth;
pub mod config;
pub mod db;
pub mod login_guard;
pub mod repositories;
pub mod seed;
pub mod server;
pub mod state;
pub mod storage;

pub use repositories::*;
pub use state::AppState;
