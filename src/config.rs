use anyhow::{Context, Result, bail};
use std::net::SocketAddr;

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Startup configuration, read once from the process environment.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let Some(api_key) = non_empty("API_KEY").or_else(|| non_empty("GEMINI_API_KEY")) else {
            bail!("A variável de ambiente API_KEY não está definida.");
        };

        let model = non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_url = non_empty("GEMINI_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let bind_addr = non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid BIND_ADDR: {bind_addr}"))?;

        Ok(Config {
            api_key,
            model,
            api_url,
            bind_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[])).err().unwrap();
        assert!(err.to_string().contains("API_KEY"));

        let blank = Config::from_lookup(lookup_from(&[("API_KEY", "  ")]));
        assert!(blank.is_err());
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup_from(&[("API_KEY", "secret")])).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.bind_addr, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn overrides_and_fallback_key() {
        let config = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "fallback"),
            ("GEMINI_MODEL", "gemini-test"),
            ("GEMINI_API_URL", "http://127.0.0.1:9999/v1beta/"),
            ("BIND_ADDR", "127.0.0.1:8080"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "fallback");
        assert_eq!(config.model, "gemini-test");
        assert_eq!(config.api_url, "http://127.0.0.1:9999/v1beta");
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn invalid_bind_addr_is_rejected() {
        let result =
            Config::from_lookup(lookup_from(&[("API_KEY", "k"), ("BIND_ADDR", "nowhere")]));
        assert!(result.is_err());
    }
}
