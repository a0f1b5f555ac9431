//! Application configuration loaded from environment variables.

use checkout::{RestockPolicy, StockPolicy, TransitionPolicy};

/// Key used when `JWT_SECRET` is unset. Only fit for local development.
pub const DEV_JWT_SECRET: &str = "aurum-dev-secret";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory store when unset
/// - `JWT_SECRET`: identity token verification key
/// - `ADMIN_EMAILS`: comma-separated emails provisioned as administrators
/// - `STOCK_POLICY`: `conditional` or `unchecked` (default: `conditional`)
/// - `TRANSITION_POLICY`: `permissive` or `strict` (default: `permissive`)
/// - `RESTOCK_ON_CANCEL`: return stock when an order is cancelled (default: `false`)
/// - `SEED_CATALOGUE`: write the built-in catalogue into an empty store (default: `true`)
///
/// Unparseable values fall back to the default and leave a message in
/// [`warnings`](Config::warnings), logged once tracing is installed.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub admin_emails: Vec<String>,
    pub stock_policy: StockPolicy,
    pub transition_policy: TransitionPolicy,
    pub restock_policy: RestockPolicy,
    pub seed_catalogue: bool,
    pub warnings: Vec<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut warnings = Vec::new();

        let log_format = match get("LOG_FORMAT").as_deref() {
            None => defaults.log_format,
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(v) if v.eq_ignore_ascii_case("text") => LogFormat::Text,
            Some(other) => {
                warnings.push(format!("Unknown LOG_FORMAT {other:?}, using text"));
                defaults.log_format
            }
        };

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            warnings.push("JWT_SECRET not set, using the development secret".to_string());
            DEV_JWT_SECRET.to_string()
        });

        let port = parsed(&get, &mut warnings, "PORT", defaults.port);
        let stock_policy = parsed(&get, &mut warnings, "STOCK_POLICY", defaults.stock_policy);
        let transition_policy =
            parsed(&get, &mut warnings, "TRANSITION_POLICY", defaults.transition_policy);
        let restock_on_cancel = parsed(&get, &mut warnings, "RESTOCK_ON_CANCEL", false);
        let seed_catalogue = parsed(&get, &mut warnings, "SEED_CATALOGUE", defaults.seed_catalogue);

        Self {
            host: get("HOST").unwrap_or(defaults.host),
            port,
            log_level: get("RUST_LOG").unwrap_or(defaults.log_level),
            log_format,
            database_url: get("DATABASE_URL"),
            jwt_secret,
            admin_emails: get("ADMIN_EMAILS")
                .map(|v| {
                    v.split(',')
                        .map(|e| e.trim().to_lowercase())
                        .filter(|e| !e.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            stock_policy,
            transition_policy,
            restock_policy: RestockPolicy::from_flag(restock_on_cancel),
            seed_catalogue,
            warnings,
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parsed<T, L>(get: &L, warnings: &mut Vec<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    L: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => default,
        Some(raw) => raw.to_lowercase().parse().unwrap_or_else(|_| {
            warnings.push(format!("Invalid {key} value {raw:?}, using default"));
            default
        }),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            admin_emails: Vec::new(),
            stock_policy: StockPolicy::default(),
            transition_policy: TransitionPolicy::default(),
            restock_policy: RestockPolicy::default(),
            seed_catalogue: true,
            warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.stock_policy, StockPolicy::Conditional);
        assert_eq!(config.restock_policy, RestockPolicy::Never);
        assert!(config.seed_catalogue);
        assert!(config.uses_dev_secret());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Default::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_values_read_from_lookup() {
        let config = from_pairs(&[
            ("PORT", "8081"),
            ("LOG_FORMAT", "JSON"),
            ("ADMIN_EMAILS", " Owner@Aurum.in, ,ops@aurum.in"),
            ("STOCK_POLICY", "Unchecked"),
            ("TRANSITION_POLICY", "strict"),
            ("RESTOCK_ON_CANCEL", "true"),
            ("SEED_CATALOGUE", "false"),
            ("JWT_SECRET", "s3cret"),
        ]);

        assert_eq!(config.port, 8081);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.admin_emails, vec!["owner@aurum.in", "ops@aurum.in"]);
        assert_eq!(config.stock_policy, StockPolicy::Unchecked);
        assert_eq!(config.transition_policy, TransitionPolicy::Strict);
        assert_eq!(config.restock_policy, RestockPolicy::OnCancel);
        assert!(!config.seed_catalogue);
        assert!(!config.uses_dev_secret());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = from_pairs(&[
            ("PORT", "eighty"),
            ("LOG_FORMAT", "xml"),
            ("STOCK_POLICY", "yolo"),
            ("RESTOCK_ON_CANCEL", "maybe"),
        ]);

        assert_eq!(config.port, 3000);
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.stock_policy, StockPolicy::Conditional);
        assert_eq!(config.restock_policy, RestockPolicy::Never);
        assert_eq!(config.warnings.len(), 5);
    }
}
