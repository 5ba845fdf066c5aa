/// Thread Service Library
///
/// Backend for a social posting app: users publish threads and posts, reply
/// to them, and browse a paginated feed of top-level content.
///
/// # Modules
///
/// - `models`: content, user and expanded view types
/// - `db`: the `ContentStore` trait with PostgreSQL and in-memory stores
/// - `services`: content writer, feed and detail readers, user directory
/// - `cache`: path revalidation after writes
/// - `jobs`: background link repair
/// - `handlers`, `middleware`: HTTP surface
/// - `metrics`: Prometheus collectors
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

/// Schema migrations for the `users`, `threads` and `posts` tables
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub const SERVICE_NAME: &str = "thread-service";
