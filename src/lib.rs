//! contacts-api: a JSON:API backend for an address book of contacts and their phone numbers.

pub mod cache;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod model;
pub mod pagination;
pub mod query;
pub mod resource;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use cache::{CacheStats, ResponseCache};
pub use config::{load_api_config, validate, ApiConfig, PaginatorKind, Settings, StoreKind};
pub use error::{AppError, ConfigError};
pub use routes::app;
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_schema, MemoryStore, PgStore, Store};
