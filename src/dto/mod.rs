//! Wire types of the proxy routes.

pub mod auth;
pub mod health;
pub mod trophies;
pub mod validation;
pub mod xbox;
