//! # Relato Common Library
//!
//! Shared code for the Relato services and tools:
//! - Error type
//! - Bootstrap configuration loading
//! - Database schema, initialization and domain models
//! - Credential primitives (password hashing, bearer tokens)
//! - Time helpers

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
