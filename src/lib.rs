//! Local SQLite mirror of a Hevy workout account.

pub mod config;
pub mod db;
pub mod models;
pub mod sync;
