//! HTTP API handlers for yamdb-api

pub mod auth;
pub mod catalog;
pub mod health;
pub mod reviews;
pub mod signup;
pub mod titles;
pub mod users;

pub use auth::{authenticate, Actor};
pub use catalog::catalog_routes;
pub use health::health_routes;
pub use reviews::review_routes;
pub use signup::signup_routes;
pub use titles::title_routes;
pub use users::user_routes;
