//! Configuration loading from environment.

use std::env;
use std::path::PathBuf;

use axum::http::Method;

use apikit_hex::inbound::ApiConfig;
use apikit_store::DEFAULT_CREDENTIALS_FILE;

/// Application configuration.
#[derive(Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub credentials_file: PathBuf,
    pub api: ApiConfig,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, applying defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "8001".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("PORT must be a port number: {}", e))?;

        let credentials_file = lookup("CREDENTIALS_FILE")
            .unwrap_or_else(|| DEFAULT_CREDENTIALS_FILE.to_string())
            .into();

        let title = lookup("API_TITLE").unwrap_or_else(|| "FastAPI Decorator Builder".to_string());

        let methods_automatic = match lookup("METHODS_AUTOMATIC") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| anyhow::anyhow!("METHODS_AUTOMATIC must be true or false"))?,
            None => true,
        };

        let default_methods = match lookup("DEFAULT_METHODS") {
            Some(raw) => parse_methods(&raw)?,
            None => vec![Method::GET],
        };

        Ok(Self {
            host,
            port,
            credentials_file,
            api: ApiConfig {
                title,
                methods_automatic,
                default_methods,
            },
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_methods(raw: &str) -> anyhow::Result<Vec<Method>> {
    let methods = raw
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| {
            Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                .map_err(|_| anyhow::anyhow!("Invalid HTTP method: {}", m))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    if methods.is_empty() {
        anyhow::bail!("DEFAULT_METHODS cannot be empty");
    }
    Ok(methods)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.addr(), "0.0.0.0:8001");
        assert_eq!(config.credentials_file, PathBuf::from("user_credentials.json"));
        assert_eq!(config.api.title, "FastAPI Decorator Builder");
        assert!(config.api.methods_automatic);
        assert_eq!(config.api.default_methods, vec![Method::GET]);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("CREDENTIALS_FILE", "/tmp/creds.json"),
            ("API_TITLE", "Demo"),
            ("METHODS_AUTOMATIC", "off"),
            ("DEFAULT_METHODS", "get, post"),
        ])
        .unwrap();

        assert_eq!(config.addr(), "127.0.0.1:9000");
        assert_eq!(config.credentials_file, PathBuf::from("/tmp/creds.json"));
        assert_eq!(config.api.title, "Demo");
        assert!(!config.api.methods_automatic);
        assert_eq!(config.api.default_methods, vec![Method::GET, Method::POST]);
    }

    #[test]
    fn test_invalid_values() {
        assert!(load(&[("PORT", "eighty")]).is_err());
        assert!(load(&[("METHODS_AUTOMATIC", "maybe")]).is_err());
        assert!(load(&[("DEFAULT_METHODS", " , ")]).is_err());
        assert!(load(&[("DEFAULT_METHODS", "G E T")]).is_err());
    }
}
