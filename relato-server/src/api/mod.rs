//! HTTP API handlers for relato-server

pub mod admin;
pub mod auth;
pub mod health;
pub mod reports;
pub mod session;
pub mod settings;
pub mod topics;
pub mod users;

pub use auth::{AdminUser, AuthUser};
pub use health::health_routes;
