//! Service configuration read from the environment (and `.env` via dotenvy).

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use rust_decimal::Decimal;

use crate::profitability::CostPolicy;

const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8080);
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_REPORT_CACHE_TTL_SECS: u64 = 5 * 60;
const DEFAULT_REPORT_CACHE_CAPACITY: u64 = 64;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub report_cache_ttl: Duration,
    pub report_cache_capacity: u64,
    pub cost_policy: CostPolicy,
}

impl Config {
    /// Load from process environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;

        let defaults = CostPolicy::default();
        let cost_policy = CostPolicy {
            default_tee_time_cost_ratio: parse_ratio(
                &lookup,
                "DEFAULT_TEE_TIME_COST_RATIO",
                defaults.default_tee_time_cost_ratio,
            )?,
            default_add_on_cost_ratio: parse_ratio(
                &lookup,
                "DEFAULT_ADD_ON_COST_RATIO",
                defaults.default_add_on_cost_ratio,
            )?,
        };

        Ok(Self {
            database_url,
            bind_addr: parse_or(&lookup, "BIND_ADDR", SocketAddr::from(DEFAULT_BIND_ADDR))?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            report_cache_ttl: Duration::from_secs(parse_or(
                &lookup,
                "REPORT_CACHE_TTL_SECS",
                DEFAULT_REPORT_CACHE_TTL_SECS,
            )?),
            report_cache_capacity: parse_or(
                &lookup,
                "REPORT_CACHE_CAPACITY",
                DEFAULT_REPORT_CACHE_CAPACITY,
            )?,
            cost_policy,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

fn parse_ratio<F>(lookup: &F, key: &str, default: Decimal) -> anyhow::Result<Decimal>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let ratio: Decimal = raw
        .trim()
        .parse()
        .with_context(|| format!("invalid value for {key}: {raw:?}"))?;
    if ratio < Decimal::ZERO || ratio > Decimal::ONE {
        bail!("{key} must be between 0 and 1, got {ratio}");
    }
    Ok(ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/golf")])).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.report_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.report_cache_capacity, 64);
        assert_eq!(config.cost_policy, CostPolicy::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/golf"),
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("REPORT_CACHE_TTL_SECS", "60"),
            ("DEFAULT_ADD_ON_COST_RATIO", "0.65"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.report_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.cost_policy.default_add_on_cost_ratio, dec!(0.65));
        assert_eq!(config.cost_policy.default_tee_time_cost_ratio, dec!(0.80));
    }

    #[test]
    fn test_missing_database_url() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/golf"),
            ("DEFAULT_TEE_TIME_COST_RATIO", "1.5"),
        ]))
        .is_err());

        assert!(Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/golf"),
            ("DB_MAX_CONNECTIONS", "many"),
        ]))
        .is_err());
    }
}
