//! Build settings from environment variables and an optional JSON policy file.

use crate::config::types::{ApiConfig, PaginatorKind, Settings, StoreKind};
use crate::config::validate;
use crate::error::ConfigError;
use std::path::Path;
use std::str::FromStr;

impl Settings {
    /// Read settings from the process environment (call `dotenvy::dotenv()` first to honor `.env`).
    pub fn from_env() -> Result<Settings, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        if let Some(v) = lookup("DATABASE_URL") {
            settings.database_url = v;
        }
        if let Some(v) = lookup("BIND_ADDR") {
            settings.bind_addr = v;
        }
        if let Some(v) = parse_var::<u32, _>(&lookup, "DB_MAX_CONNECTIONS")? {
            settings.max_connections = v;
        }
        if let Some(v) = parse_var::<StoreKind, _>(&lookup, "CONTACTS_STORE")? {
            settings.store = v;
        }
        if let Some(v) = parse_var::<usize, _>(&lookup, "MAX_BODY_BYTES")? {
            settings.max_body_bytes = v;
        }
        apply_api_overrides(&mut settings.api, &lookup)?;
        validate(&settings.api)?;
        Ok(settings)
    }
}

/// Load API policy from a JSON file; missing keys take their defaults.
pub async fn load_api_config(path: &Path) -> Result<ApiConfig, ConfigError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| ConfigError::InvalidSetting {
        name: "API_CONFIG_PATH",
        reason: format!("{}: {}", path.display(), e),
    })?;
    let config: ApiConfig = serde_json::from_str(&raw).map_err(|e| ConfigError::InvalidSetting {
        name: "API_CONFIG_PATH",
        reason: e.to_string(),
    })?;
    validate(&config)?;
    Ok(config)
}

fn apply_api_overrides<F>(api: &mut ApiConfig, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = parse_var::<PaginatorKind, _>(lookup, "DEFAULT_PAGINATOR")? {
        api.default_paginator = v;
    }
    if let Some(v) = parse_var::<u64, _>(lookup, "DEFAULT_PAGE_SIZE")? {
        api.default_page_size = v;
    }
    if let Some(v) = parse_var::<u64, _>(lookup, "MAXIMUM_PAGE_SIZE")? {
        api.maximum_page_size = v;
    }
    if let Some(v) = parse_var::<bool, _>(lookup, "DEFAULT_CACHING")? {
        api.default_caching = v;
    }
    if let Some(v) = parse_var::<usize, _>(lookup, "CACHE_MAX_ENTRIES")? {
        api.cache_max_entries = v;
    }
    Ok(())
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidSetting {
                name,
                reason: format!("'{}': {}", raw, e),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_follow_paged_policy() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(settings.api.default_paginator, PaginatorKind::Paged);
        assert_eq!(settings.api.default_page_size, 5);
        assert_eq!(settings.api.maximum_page_size, 100);
        assert!(settings.api.default_caching);
        assert_eq!(settings.store, StoreKind::Postgres);
    }

    #[test]
    fn env_overrides_apply() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("CONTACTS_STORE", "memory"),
            ("DEFAULT_PAGINATOR", "offset"),
            ("DEFAULT_PAGE_SIZE", "10"),
            ("DEFAULT_CACHING", "false"),
        ]))
        .unwrap();
        assert_eq!(settings.store, StoreKind::Memory);
        assert_eq!(settings.api.default_paginator, PaginatorKind::Offset);
        assert_eq!(settings.api.default_page_size, 10);
        assert!(!settings.api.default_caching);
    }

    #[test]
    fn malformed_value_names_the_variable() {
        let err = Settings::from_lookup(lookup_from(&[("DEFAULT_PAGE_SIZE", "five")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { name: "DEFAULT_PAGE_SIZE", .. }));
    }

    #[test]
    fn default_above_maximum_is_rejected() {
        let err = Settings::from_lookup(lookup_from(&[("DEFAULT_PAGE_SIZE", "200")])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn json_policy_fills_missing_keys_with_defaults() {
        let config: ApiConfig = serde_json::from_str(r#"{ "default_paginator": "none" }"#).unwrap();
        assert_eq!(config.default_paginator, PaginatorKind::None);
        assert_eq!(config.maximum_page_size, 100);
    }
}
