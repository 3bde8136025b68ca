//! SQLite-backed storage implementation.

mod agents;
mod broadcasts;
mod claims;
mod dependencies;
mod health;
mod issues;
mod outcomes;
mod projects;
pub mod schema;
mod store;

pub use store::SqliteStore;
