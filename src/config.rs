//! Configuration Module
//!
//! Immutable, validated policy descriptors for cache instances. A config is
//! built once (through [`CacheConfigBuilder`] or [`CacheConfig::from_env`])
//! and stays attached to one store for its whole lifetime.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CacheError, Result};

// == Defaults ==
/// Default maximum number of entries
pub const DEFAULT_MAX_SIZE: usize = 10_000;

/// Default concurrency hint (shard count of the entry map)
pub const DEFAULT_CONCURRENCY_LEVEL: usize = 16;

/// Upper bound on the concurrency hint
pub const MAX_CONCURRENCY_LEVEL: usize = 1024;

/// Default interval of the active expiry sweep
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

// == Eviction Policy ==
/// Victim selection strategy used when a local store is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Least recently touched by `get` or `put`
    #[default]
    Lru,
    /// Smallest access count
    Lfu,
    /// Oldest creation time
    Fifo,
    /// Expired entries first, then the entry closest to expiry
    TtlOnly,
    /// Falls back to LRU
    None,
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvictionPolicy::Lru => "lru",
            EvictionPolicy::Lfu => "lfu",
            EvictionPolicy::Fifo => "fifo",
            EvictionPolicy::TtlOnly => "ttl_only",
            EvictionPolicy::None => "none",
        };
        f.write_str(name)
    }
}

impl FromStr for EvictionPolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "lru" => Ok(EvictionPolicy::Lru),
            "lfu" => Ok(EvictionPolicy::Lfu),
            "fifo" => Ok(EvictionPolicy::Fifo),
            "ttl_only" | "ttl" => Ok(EvictionPolicy::TtlOnly),
            "none" => Ok(EvictionPolicy::None),
            other => Err(CacheError::Config(format!(
                "unknown eviction policy '{other}'"
            ))),
        }
    }
}

// == Cache Config ==
/// Cache policy parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    name: String,
    max_size: usize,
    default_ttl: Option<Duration>,
    max_idle_time: Option<Duration>,
    eviction_policy: EvictionPolicy,
    record_stats: bool,
    concurrency_level: usize,
    sweep_interval: Duration,
}

impl CacheConfig {
    /// Starts a builder for a cache called `name`.
    pub fn builder(name: impl Into<String>) -> CacheConfigBuilder {
        CacheConfigBuilder::new(name)
    }

    /// Creates a Config by loading values from environment variables.
    ///
    /// Variables are prefixed with the upper-cased cache name, so a cache
    /// named `user-sessions` reads `USER_SESSIONS_MAX_SIZE`.
    ///
    /// # Environment Variables
    /// - `{NAME}_MAX_SIZE` - Maximum entries (default: 10000)
    /// - `{NAME}_DEFAULT_TTL_SECS` - Default TTL in seconds (default: none)
    /// - `{NAME}_MAX_IDLE_SECS` - Idle eviction threshold (default: none)
    /// - `{NAME}_EVICTION_POLICY` - lru | lfu | fifo | ttl_only | none (default: lru)
    /// - `{NAME}_RECORD_STATS` - true | false (default: true)
    /// - `{NAME}_CONCURRENCY_LEVEL` - Concurrency hint (default: 16)
    /// - `{NAME}_SWEEP_INTERVAL_SECS` - Expiry sweep interval (default: 60)
    pub fn from_env(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let prefix = env_prefix(&name);
        let mut builder = CacheConfigBuilder::new(name);

        if let Some(max_size) = env_value(&prefix, "MAX_SIZE") {
            builder = builder.max_size(max_size);
        }
        if let Some(secs) = env_value::<u64>(&prefix, "DEFAULT_TTL_SECS") {
            builder = builder.default_ttl(Duration::from_secs(secs));
        }
        if let Some(secs) = env_value::<u64>(&prefix, "MAX_IDLE_SECS") {
            builder = builder.max_idle_time(Duration::from_secs(secs));
        }
        if let Some(policy) = env_value(&prefix, "EVICTION_POLICY") {
            builder = builder.eviction_policy(policy);
        }
        if let Some(record) = env_value(&prefix, "RECORD_STATS") {
            builder = builder.record_stats(record);
        }
        if let Some(level) = env_value(&prefix, "CONCURRENCY_LEVEL") {
            builder = builder.concurrency_level(level);
        }
        if let Some(secs) = env_value::<u64>(&prefix, "SWEEP_INTERVAL_SECS") {
            builder = builder.sweep_interval(Duration::from_secs(secs));
        }

        builder.build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    pub fn max_idle_time(&self) -> Option<Duration> {
        self.max_idle_time
    }

    pub fn eviction_policy(&self) -> EvictionPolicy {
        self.eviction_policy
    }

    pub fn record_stats(&self) -> bool {
        self.record_stats
    }

    pub fn concurrency_level(&self) -> usize {
        self.concurrency_level
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Shard count for the entry map: the concurrency level rounded up to a
    /// power of two, never below 2.
    pub(crate) fn shard_amount(&self) -> usize {
        self.concurrency_level
            .checked_next_power_of_two()
            .unwrap_or(MAX_CONCURRENCY_LEVEL)
            .clamp(2, MAX_CONCURRENCY_LEVEL)
    }
}

// == Builder ==
/// Builder for [`CacheConfig`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct CacheConfigBuilder {
    name: String,
    max_size: usize,
    default_ttl: Option<Duration>,
    max_idle_time: Option<Duration>,
    eviction_policy: EvictionPolicy,
    record_stats: bool,
    concurrency_level: usize,
    sweep_interval: Duration,
}

impl CacheConfigBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_size: DEFAULT_MAX_SIZE,
            default_ttl: None,
            max_idle_time: None,
            eviction_policy: EvictionPolicy::default(),
            record_stats: true,
            concurrency_level: DEFAULT_CONCURRENCY_LEVEL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    pub fn max_idle_time(mut self, idle: Duration) -> Self {
        self.max_idle_time = Some(idle);
        self
    }

    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }

    pub fn record_stats(mut self, record: bool) -> Self {
        self.record_stats = record;
        self
    }

    pub fn concurrency_level(mut self, level: usize) -> Self {
        self.concurrency_level = level;
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Validates the parameters and returns the immutable config.
    pub fn build(self) -> Result<CacheConfig> {
        if self.name.trim().is_empty() {
            return Err(CacheError::Config("cache name cannot be empty".to_string()));
        }
        if self.max_size == 0 {
            return Err(CacheError::Config(format!(
                "cache '{}': max_size must be at least 1",
                self.name
            )));
        }
        if self.concurrency_level == 0 || self.concurrency_level > MAX_CONCURRENCY_LEVEL {
            return Err(CacheError::Config(format!(
                "cache '{}': concurrency_level must be between 1 and {}",
                self.name, MAX_CONCURRENCY_LEVEL
            )));
        }
        if self.sweep_interval.is_zero() {
            return Err(CacheError::Config(format!(
                "cache '{}': sweep_interval must be greater than zero",
                self.name
            )));
        }

        Ok(CacheConfig {
            name: self.name,
            max_size: self.max_size,
            default_ttl: self.default_ttl,
            max_idle_time: self.max_idle_time,
            eviction_policy: self.eviction_policy,
            record_stats: self.record_stats,
            concurrency_level: self.concurrency_level,
            sweep_interval: self.sweep_interval,
        })
    }
}

// == Env Helpers ==
fn env_prefix(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn env_value<T: FromStr>(prefix: &str, suffix: &str) -> Option<T> {
    let var = format!("{prefix}_{suffix}");
    let raw = env::var(&var).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparseable value '{}' for {}", raw, var);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CacheConfig::builder("users").build().unwrap();
        assert_eq!(config.name(), "users");
        assert_eq!(config.max_size(), DEFAULT_MAX_SIZE);
        assert_eq!(config.default_ttl(), None);
        assert_eq!(config.max_idle_time(), None);
        assert_eq!(config.eviction_policy(), EvictionPolicy::Lru);
        assert!(config.record_stats());
        assert_eq!(config.concurrency_level(), DEFAULT_CONCURRENCY_LEVEL);
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_builder_sets_every_field() {
        let config = CacheConfig::builder("sessions")
            .max_size(5)
            .default_ttl(Duration::from_secs(30))
            .max_idle_time(Duration::from_secs(10))
            .eviction_policy(EvictionPolicy::Lfu)
            .record_stats(false)
            .concurrency_level(3)
            .sweep_interval(Duration::from_millis(250))
            .build()
            .unwrap();

        assert_eq!(config.max_size(), 5);
        assert_eq!(config.default_ttl(), Some(Duration::from_secs(30)));
        assert_eq!(config.max_idle_time(), Some(Duration::from_secs(10)));
        assert_eq!(config.eviction_policy(), EvictionPolicy::Lfu);
        assert!(!config.record_stats());
        assert_eq!(config.concurrency_level(), 3);
        assert_eq!(config.shard_amount(), 4);
        assert_eq!(config.sweep_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_build_rejects_invalid_values() {
        assert!(matches!(
            CacheConfig::builder("").build(),
            Err(CacheError::Config(_))
        ));
        assert!(matches!(
            CacheConfig::builder("   ").build(),
            Err(CacheError::Config(_))
        ));
        assert!(matches!(
            CacheConfig::builder("c").max_size(0).build(),
            Err(CacheError::Config(_))
        ));
        assert!(matches!(
            CacheConfig::builder("c").concurrency_level(0).build(),
            Err(CacheError::Config(_))
        ));
        assert!(matches!(
            CacheConfig::builder("c").sweep_interval(Duration::ZERO).build(),
            Err(CacheError::Config(_))
        ));
    }

    #[test]
    fn test_shard_amount_is_power_of_two() {
        let one = CacheConfig::builder("c").concurrency_level(1).build().unwrap();
        assert_eq!(one.shard_amount(), 2);

        let odd = CacheConfig::builder("c").concurrency_level(17).build().unwrap();
        assert_eq!(odd.shard_amount(), 32);

        let max = CacheConfig::builder("c")
            .concurrency_level(MAX_CONCURRENCY_LEVEL)
            .build()
            .unwrap();
        assert_eq!(max.shard_amount(), MAX_CONCURRENCY_LEVEL);
    }

    #[test]
    fn test_build_rejects_oversized_concurrency_level() {
        for level in [MAX_CONCURRENCY_LEVEL + 1, 1 << 40, usize::MAX] {
            assert!(matches!(
                CacheConfig::builder("c").concurrency_level(level).build(),
                Err(CacheError::Config(_))
            ));
        }
    }

    #[test]
    fn test_eviction_policy_parse_and_display() {
        for policy in [
            EvictionPolicy::Lru,
            EvictionPolicy::Lfu,
            EvictionPolicy::Fifo,
            EvictionPolicy::TtlOnly,
            EvictionPolicy::None,
        ] {
            assert_eq!(policy.to_string().parse::<EvictionPolicy>().unwrap(), policy);
        }
        assert_eq!("TTL-ONLY".parse::<EvictionPolicy>().unwrap(), EvictionPolicy::TtlOnly);
        assert!("random".parse::<EvictionPolicy>().is_err());
    }

    #[test]
    fn test_eviction_policy_serde() {
        let json = serde_json::to_string(&EvictionPolicy::TtlOnly).unwrap();
        assert_eq!(json, "\"ttl_only\"");
        let parsed: EvictionPolicy = serde_json::from_str("\"fifo\"").unwrap();
        assert_eq!(parsed, EvictionPolicy::Fifo);
    }

    #[test]
    fn test_env_prefix() {
        assert_eq!(env_prefix("user-sessions"), "USER_SESSIONS");
        assert_eq!(env_prefix("api.v2"), "API_V2");
    }

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("ORDERS_MAX_SIZE", Some("250")),
                ("ORDERS_DEFAULT_TTL_SECS", Some("120")),
                ("ORDERS_EVICTION_POLICY", Some("fifo")),
                ("ORDERS_RECORD_STATS", Some("false")),
                ("ORDERS_CONCURRENCY_LEVEL", Some("8")),
                ("ORDERS_SWEEP_INTERVAL_SECS", Some("5")),
                ("ORDERS_MAX_IDLE_SECS", None),
            ],
            || {
                let config = CacheConfig::from_env("orders").unwrap();
                assert_eq!(config.max_size(), 250);
                assert_eq!(config.default_ttl(), Some(Duration::from_secs(120)));
                assert_eq!(config.max_idle_time(), None);
                assert_eq!(config.eviction_policy(), EvictionPolicy::Fifo);
                assert!(!config.record_stats());
                assert_eq!(config.concurrency_level(), 8);
                assert_eq!(config.sweep_interval(), Duration::from_secs(5));
            },
        );
    }

    #[test]
    fn test_config_from_env_defaults_on_garbage() {
        temp_env::with_vars(
            [
                ("INVENTORY_MAX_SIZE", Some("lots")),
                ("INVENTORY_EVICTION_POLICY", Some("mru")),
            ],
            || {
                let config = CacheConfig::from_env("inventory").unwrap();
                assert_eq!(config.max_size(), DEFAULT_MAX_SIZE);
                assert_eq!(config.eviction_policy(), EvictionPolicy::Lru);
            },
        );
    }

    #[test]
    fn test_config_from_env_still_validates() {
        temp_env::with_var("TINY_MAX_SIZE", Some("0"), || {
            assert!(matches!(
                CacheConfig::from_env("tiny"),
                Err(CacheError::Config(_))
            ));
        });
    }
}
