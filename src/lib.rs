//! URL shortener service
//!
//! Saves long URLs under short aliases in an embedded redb database and
//! redirects alias lookups to the stored URL.

pub mod config;
pub mod database;
pub mod error;
pub mod handler;
pub mod logger;
pub mod middleware;
pub mod model;
pub mod random;
pub mod route;
pub mod server;
