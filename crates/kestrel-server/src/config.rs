//! Server configuration
//!
//! All environment parsing happens here, once, at startup; the rest of the
//! system receives a resolved `Config`. `TIER` selects a backend profile
//! (embedded vs. networked), individual variables override it.

use kestrel_core::domain::EvaluationMode;
use kestrel_repository::RepositoryConfig;
use std::env;
use std::fmt;
use tracing::warn;

/// Product tier: selects the default backend profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// SQLite + in-process cache + channel bus
    Community,
    /// PostgreSQL + Redis (two-phase) + NATS
    Pro,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Community => f.write_str("community"),
            Tier::Pro => f.write_str("pro"),
        }
    }
}

/// Cache backend configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// "memory" or "redis"
    pub cache_type: String,
    pub local_max_size: usize,
    pub local_ttl_secs: u64,
    pub redis_addr: String,
    pub redis_password: String,
    pub redis_db: i64,
    /// Layer the local LRU in front of Redis
    pub enable_two_phase: bool,
}

/// Event bus backend configuration.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// "channel" or "nats"
    pub bus_type: String,
    pub channel_buffer_size: usize,
    pub nats_url: String,
}

/// Complete resolved server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub tier: Tier,
    pub mode: EvaluationMode,
    pub debug: bool,
    /// Bound on per-request rule evaluation parallelism
    pub max_rule_workers: usize,
    pub repository: RepositoryConfig,
    pub cache: CacheConfig,
    pub bus: BusConfig,
    /// Run the async bus worker even outside the pro tier
    pub async_worker: bool,
    /// Tenants the async worker subscribes for; empty means global
    pub tenants: Vec<String>,
}

impl Config {
    /// Community-tier defaults.
    pub fn community() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            tier: Tier::Community,
            mode: EvaluationMode::Detection,
            debug: false,
            max_rule_workers: 100,
            repository: RepositoryConfig::default(),
            cache: CacheConfig {
                cache_type: "memory".to_string(),
                local_max_size: 10_000,
                local_ttl_secs: 300,
                redis_addr: "localhost:6379".to_string(),
                redis_password: String::new(),
                redis_db: 0,
                enable_two_phase: false,
            },
            bus: BusConfig {
                bus_type: "channel".to_string(),
                channel_buffer_size: 1000,
                nats_url: "nats://localhost:4222".to_string(),
            },
            async_worker: false,
            tenants: Vec::new(),
        }
    }

    /// Pro-tier defaults: networked backends, two-phase cache, async worker.
    pub fn pro() -> Self {
        let mut config = Self::community();
        config.tier = Tier::Pro;
        config.repository.driver = "postgres".to_string();
        config.cache.cache_type = "redis".to_string();
        config.cache.enable_two_phase = true;
        config.cache.local_max_size = 1000;
        config.bus.bus_type = "nats".to_string();
        config.async_worker = true;
        config
    }

    /// Resolve configuration from the process environment.
    pub fn from_env() -> Self {
        Self::resolve(|key| env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary variable source (testable).
    pub fn resolve(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = match get("TIER").as_deref().map(str::trim) {
            None | Some("") | Some("community") => Self::community(),
            Some("pro") => Self::pro(),
            Some("enterprise") => {
                warn!("TIER=enterprise is not available in this build, falling back to community");
                Self::community()
            }
            Some(other) => {
                warn!(tier = other, "unsupported TIER value, falling back to community");
                Self::community()
            }
        };

        if let Some(mode) = get("MODE") {
            match mode.parse::<EvaluationMode>() {
                Ok(mode) => config.mode = mode,
                Err(error) => warn!(%error, "ignoring invalid MODE"),
            }
        }

        config.debug = get("DEBUG").as_deref() == Some("true");

        if let Some(port) = get("PORT").and_then(|p| p.parse().ok()) {
            config.port = port;
        }
        if let Some(host) = get("HOST") {
            config.host = host;
        }

        if let Some(driver) = get("DB_DRIVER") {
            config.repository.driver = driver;
        }
        if let Some(path) = get("SQLITE_PATH") {
            config.repository.sqlite_path = path;
        }
        if let Some(host) = get("POSTGRES_HOST") {
            config.repository.postgres_host = host;
        }
        if let Some(port) = get("POSTGRES_PORT").and_then(|p| p.parse().ok()) {
            config.repository.postgres_port = port;
        }
        if let Some(user) = get("POSTGRES_USER") {
            config.repository.postgres_user = user;
        }
        if let Some(password) = get("POSTGRES_PASSWORD") {
            config.repository.postgres_password = password;
        }
        if let Some(db) = get("POSTGRES_DB") {
            config.repository.postgres_db = db;
        }
        if let Some(sslmode) = get("POSTGRES_SSLMODE") {
            config.repository.postgres_sslmode = sslmode;
        }

        if let Some(cache_type) = get("CACHE_TYPE") {
            config.cache.cache_type = cache_type;
        }
        if let Some(addr) = get("REDIS_ADDR") {
            config.cache.redis_addr = addr;
        }
        if let Some(password) = get("REDIS_PASSWORD") {
            config.cache.redis_password = password;
        }
        if let Some(db) = get("REDIS_DB").and_then(|d| d.parse().ok()) {
            config.cache.redis_db = db;
        }

        if let Some(bus_type) = get("BUS_TYPE") {
            config.bus.bus_type = bus_type;
        }
        if let Some(url) = get("NATS_URL") {
            config.bus.nats_url = url;
        }

        if get("ASYNC_WORKER").as_deref() == Some("true") {
            config.async_worker = true;
        }
        if let Some(tenants) = get("TENANTS") {
            config.tenants = tenants
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::resolve(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_are_community_detection() {
        let config = resolve(&[]);

        assert_eq!(config.tier, Tier::Community);
        assert_eq!(config.mode, EvaluationMode::Detection);
        assert_eq!(config.repository.driver, "sqlite");
        assert_eq!(config.cache.cache_type, "memory");
        assert_eq!(config.bus.bus_type, "channel");
        assert_eq!(config.port, 8080);
        assert!(!config.async_worker);
    }

    #[test]
    fn test_pro_tier_profile() {
        let config = resolve(&[("TIER", "pro")]);

        assert_eq!(config.tier, Tier::Pro);
        assert_eq!(config.repository.driver, "postgres");
        assert_eq!(config.cache.cache_type, "redis");
        assert!(config.cache.enable_two_phase);
        assert_eq!(config.bus.bus_type, "nats");
        assert!(config.async_worker);
    }

    #[test]
    fn test_enterprise_falls_back_to_community() {
        let config = resolve(&[("TIER", "enterprise")]);
        assert_eq!(config.tier, Tier::Community);
    }

    #[test]
    fn test_mode_and_overrides() {
        let config = resolve(&[
            ("MODE", "compliance"),
            ("PORT", "9090"),
            ("HOST", "127.0.0.1"),
            ("DB_DRIVER", "postgres"),
            ("CACHE_TYPE", "redis"),
            ("BUS_TYPE", "nats"),
            ("DEBUG", "true"),
            ("TENANTS", "alpha, beta"),
        ]);

        assert_eq!(config.mode, EvaluationMode::Compliance);
        assert_eq!(config.port, 9090);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.repository.driver, "postgres");
        assert_eq!(config.cache.cache_type, "redis");
        assert_eq!(config.bus.bus_type, "nats");
        assert!(config.debug);
        assert_eq!(config.tenants, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = resolve(&[("MODE", "strict"), ("PORT", "not-a-port")]);

        assert_eq!(config.mode, EvaluationMode::Detection);
        assert_eq!(config.port, 8080);
    }
}
