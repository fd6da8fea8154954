pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod table;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use app::app;
