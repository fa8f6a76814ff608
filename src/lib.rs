pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod server;

pub use db::Database;
