//! # YaMDb Common Library
//!
//! Domain code shared by the YaMDb service and its tooling:
//! - Database models and store queries
//! - Signup/token flow and access token signing
//! - Access policies and field validation
//! - Rating aggregation
//! - API request/response types
//! - Configuration loading and the user-facing message table

pub mod api;
pub mod auth_flow;
pub mod config;
pub mod db;
pub mod error;
pub mod mail;
pub mod messages;
pub mod permissions;
pub mod rating;
pub mod validation;

pub use error::{Error, Result};
pub use messages::{Locale, MessageKey, Messages};
