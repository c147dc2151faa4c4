use std::path::PathBuf;

use anyhow::{Context, Result};

use constellation_api::rate_limit::RateLimits;
use constellation_api::service::ServiceConfig;

/// Server settings, read from `CONSTELLATION_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub trust_proxy: bool,
    pub service: ServiceConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source. Unset variables take their defaults;
    /// set but unparseable ones are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServiceConfig::default();

        Ok(Self {
            host: lookup("CONSTELLATION_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "CONSTELLATION_PORT", 3000)?,
            db_path: lookup("CONSTELLATION_DB_PATH")
                .unwrap_or_else(|| "constellation.db".into())
                .into(),
            trust_proxy: parse_or(&lookup, "CONSTELLATION_TRUST_PROXY", true)?,
            service: ServiceConfig {
                limits: RateLimits {
                    max_posts: parse_or(
                        &lookup,
                        "CONSTELLATION_MAX_STARS_PER_HOUR",
                        defaults.limits.max_posts,
                    )?,
                    max_reactions: parse_or(
                        &lookup,
                        "CONSTELLATION_MAX_REACTIONS_PER_HOUR",
                        defaults.limits.max_reactions,
                    )?,
                },
                max_page_size: parse_or(&lookup, "CONSTELLATION_MAX_PAGE_SIZE", defaults.max_page_size)?,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.db_path, PathBuf::from("constellation.db"));
        assert!(cfg.trust_proxy);
        assert_eq!(cfg.service.limits, RateLimits { max_posts: 3, max_reactions: 20 });
        assert_eq!(cfg.service.max_page_size, 500);
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("CONSTELLATION_PORT", "8080"),
            ("CONSTELLATION_TRUST_PROXY", "false"),
            ("CONSTELLATION_MAX_STARS_PER_HOUR", "5"),
            ("CONSTELLATION_MAX_PAGE_SIZE", " 50 "),
        ])
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert!(!cfg.trust_proxy);
        assert_eq!(cfg.service.limits.max_posts, 5);
        assert_eq!(cfg.service.limits.max_reactions, 20);
        assert_eq!(cfg.service.max_page_size, 50);
    }

    #[test]
    fn bad_numbers_are_errors() {
        let err = config(&[("CONSTELLATION_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("CONSTELLATION_PORT"));
        assert!(config(&[("CONSTELLATION_TRUST_PROXY", "maybe")]).is_err());
    }
}
