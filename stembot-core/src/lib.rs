//! Core types and storage for stembot
//!
//! This crate provides the configuration, session storage, user store,
//! and export primitives used by all other stembot components.

pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod session;
pub mod users;
pub mod utils;

pub use error::{Error, Result};
