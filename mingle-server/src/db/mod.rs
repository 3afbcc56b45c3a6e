mod connection;
pub mod repositories;
mod schema;

pub use connection::{Database, DbConnection, DbPool};
