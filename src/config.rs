use anyhow::Context;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|value| !value.trim().is_empty())
            .context("DATABASE_URL must be set to the campaign Postgres instance")?;

        let max_connections = match lookup("CAMPAIGN_HEALTH_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|value| *value > 0)
                .with_context(|| {
                    format!("CAMPAIGN_HEALTH_MAX_CONNECTIONS must be a positive integer, got {raw:?}")
                })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_pool_size() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/ch")]))
            .expect("config loads");
        assert_eq!(config.database_url, "postgres://localhost/ch");
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn reads_pool_size_override() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/ch"),
            ("CAMPAIGN_HEALTH_MAX_CONNECTIONS", "12"),
        ]))
        .expect("config loads");
        assert_eq!(config.max_connections, 12);
    }

    #[test]
    fn requires_database_url() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[("DATABASE_URL", "  ")])).is_err());
    }

    #[test]
    fn rejects_bad_pool_size() {
        let result = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/ch"),
            ("CAMPAIGN_HEALTH_MAX_CONNECTIONS", "zero"),
        ]));
        assert!(result.is_err());
    }
}
