pub mod client;
pub mod manager;
pub mod row;

pub use client::{Database, ExecResult, MySqlDatabase, SqlQuery};
pub use manager::{DatabaseError, DatabaseManager};
