//! maildrip Storage - Database access layer
//!
//! This crate provides the PostgreSQL-backed persistence for maildrip:
//! connection pooling, models, and trait-based repositories.

pub mod db;
pub mod models;
pub mod repository;

pub use db::DatabasePool;
pub use models::*;
pub use repository::*;
