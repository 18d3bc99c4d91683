use std::path::PathBuf;

use anyhow::Context;
use chrono::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub session_ttl: Duration,
    /// Log every query with its execution time at info level.
    pub query_debug: bool,
    pub log_file_path: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .context("DATABASE_URL must be set to a production Postgres instance")?;

        Ok(Self {
            database_url,
            bind_addr: lookup("PORTAL_BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            max_connections: parse_or(&lookup, "PORTAL_MAX_CONNECTIONS", 5),
            session_ttl: Duration::hours(parse_or(&lookup, "PORTAL_SESSION_TTL_HOURS", 12)),
            query_debug: bool_or(&lookup, "QUERY_DEBUG", false),
            log_file_path: lookup("LOG_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("logs/campus-portal.log")),
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(name)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn bool_or<F>(lookup: &F, name: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .and_then(|v| match v.trim() {
            "1" | "true" | "TRUE" | "yes" | "YES" | "on" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn database_url_is_required() {
        assert!(config_from(&[]).is_err());
        assert!(config_from(&[("DATABASE_URL", "  ")]).is_err());
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/portal")]).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.session_ttl, Duration::hours(12));
        assert!(!config.query_debug);
        assert_eq!(config.log_file_path, PathBuf::from("logs/campus-portal.log"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/portal"),
            ("PORTAL_BIND_ADDR", "0.0.0.0:9000"),
            ("PORTAL_MAX_CONNECTIONS", "12"),
            ("PORTAL_SESSION_TTL_HOURS", "2"),
            ("QUERY_DEBUG", "yes"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.session_ttl, Duration::hours(2));
        assert!(config.query_debug);
    }

    #[test]
    fn unparsable_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/portal"),
            ("PORTAL_MAX_CONNECTIONS", "many"),
            ("QUERY_DEBUG", "sometimes"),
        ])
        .unwrap();
        assert_eq!(config.max_connections, 5);
        assert!(!config.query_debug);
    }
}
