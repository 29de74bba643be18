//! Shared HTTP API functionality
//!
//! Contains only framework-independent pieces: token signing and the
//! request/response DTOs. The axum wiring lives in `yamdb-api`.

pub mod token;
pub mod types;

pub use token::{load_signing_secret, Claims, TokenError, TokenIssuer};
