use anyhow::{anyhow, Context, Result};
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8001";
pub const DEFAULT_TITLE: &str = "Stock Watch";

/// Runtime settings, read from the environment at startup.
///
/// Every key can also be baked in at build time (see build.rs); the process
/// environment wins over the baked value.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub title: Option<String>,
    pub wanted_refresh: Duration,
    pub all_refresh: Duration,
    pub images_refresh: Duration,
    pub fetch_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            title: None,
            wanted_refresh: Duration::from_millis(5_000),
            all_refresh: Duration::from_millis(30_000),
            images_refresh: Duration::from_millis(60_000),
            fetch_retries: 3,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| baked(key)))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let api_url = lookup("STOCK_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.api_url);

        let title = lookup("STOCK_APP_TITLE")
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty());

        let millis = |key: &str, fallback: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(raw) => {
                    let ms: u64 = raw.trim().parse().with_context(|| {
                        format!("{} must be a number of milliseconds, got {:?}", key, raw)
                    })?;
                    if ms == 0 {
                        return Err(anyhow!("{} must be greater than zero", key));
                    }
                    Ok(Duration::from_millis(ms))
                }
                None => Ok(fallback),
            }
        };

        let fetch_retries = match lookup("STOCK_FETCH_RETRIES") {
            Some(raw) => raw.trim().parse().with_context(|| {
                format!("STOCK_FETCH_RETRIES must be a whole number, got {:?}", raw)
            })?,
            None => defaults.fetch_retries,
        };

        Ok(Self {
            api_url,
            title,
            wanted_refresh: millis("STOCK_WANTED_REFRESH_MS", defaults.wanted_refresh)?,
            all_refresh: millis("STOCK_ALL_REFRESH_MS", defaults.all_refresh)?,
            images_refresh: millis("STOCK_IMAGES_REFRESH_MS", defaults.images_refresh)?,
            fetch_retries,
        })
    }

    pub fn window_title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }
}

fn baked(key: &str) -> Option<String> {
    let value = match key {
        "STOCK_API_URL" => option_env!("STOCK_API_URL"),
        "STOCK_APP_TITLE" => option_env!("STOCK_APP_TITLE"),
        "STOCK_WANTED_REFRESH_MS" => option_env!("STOCK_WANTED_REFRESH_MS"),
        "STOCK_ALL_REFRESH_MS" => option_env!("STOCK_ALL_REFRESH_MS"),
        "STOCK_IMAGES_REFRESH_MS" => option_env!("STOCK_IMAGES_REFRESH_MS"),
        "STOCK_FETCH_RETRIES" => option_env!("STOCK_FETCH_RETRIES"),
        _ => None,
    };
    value.map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.window_title(), "Stock Watch");
    }

    #[test]
    fn reads_url_title_and_intervals() {
        let config = config_from(&[
            ("STOCK_API_URL", "https://stock.example.com/api/"),
            ("STOCK_APP_TITLE", "Garden Stock"),
            ("STOCK_WANTED_REFRESH_MS", "30000"),
            ("STOCK_FETCH_RETRIES", "0"),
        ])
        .unwrap();

        assert_eq!(config.api_url, "https://stock.example.com/api");
        assert_eq!(config.window_title(), "Garden Stock");
        assert_eq!(config.wanted_refresh, Duration::from_secs(30));
        assert_eq!(config.all_refresh, Duration::from_secs(30));
        assert_eq!(config.fetch_retries, 0);
    }

    #[test]
    fn blank_title_is_ignored() {
        let config = config_from(&[("STOCK_APP_TITLE", "   ")]).unwrap();
        assert_eq!(config.title, None);
    }

    #[test]
    fn rejects_bad_intervals() {
        assert!(config_from(&[("STOCK_ALL_REFRESH_MS", "soon")]).is_err());
        assert!(config_from(&[("STOCK_IMAGES_REFRESH_MS", "0")]).is_err());
        assert!(config_from(&[("STOCK_FETCH_RETRIES", "-1")]).is_err());
    }
}
