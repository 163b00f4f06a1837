//! Configuration types: API policy shared by every resource, plus process settings.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How list endpoints window their results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginatorKind {
    /// Every matching record is returned; `page[..]` parameters are rejected.
    None,
    /// `page[offset]` / `page[limit]`.
    Offset,
    /// `page[number]` / `page[size]`.
    Paged,
}

impl FromStr for PaginatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(PaginatorKind::None),
            "offset" => Ok(PaginatorKind::Offset),
            "paged" => Ok(PaginatorKind::Paged),
            other => Err(format!("unknown paginator '{}' (expected none, offset or paged)", other)),
        }
    }
}

/// Policy applied identically to every resource. Built once at startup and shared read-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub default_paginator: PaginatorKind,
    pub default_page_size: u64,
    pub maximum_page_size: u64,
    pub default_caching: bool,
    /// Upper bound on cached documents across all resource types.
    pub cache_max_entries: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            default_paginator: PaginatorKind::Paged,
            default_page_size: 5,
            maximum_page_size: 100,
            default_caching: true,
            cache_max_entries: 1024,
        }
    }
}

/// Which storage backend the server runs against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            other => Err(format!("unknown store '{}' (expected postgres or memory)", other)),
        }
    }
}

/// Process settings read from the environment.
#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub store: StoreKind,
    pub max_body_bytes: usize,
    pub api: ApiConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: "postgres://localhost/contacts".into(),
            bind_addr: "0.0.0.0:3000".into(),
            max_connections: 5,
            store: StoreKind::Postgres,
            max_body_bytes: 64 * 1024,
            api: ApiConfig::default(),
        }
    }
}
