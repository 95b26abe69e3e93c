//! Console configuration.
//!
//! Priority (highest to lowest):
//!   1. CLI / env — passed as `Some(value)` from clap
//!   2. TOML file (`--config`, or the platform config dir)
//!   3. Built-in defaults

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TENANT: &str = "default";
const DEFAULT_CURRENCY: &str = "AED";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ─── TOML config file ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    api_url: Option<String>,
    tenant: Option<String>,
    currency: Option<String>,
    timeout_secs: Option<u64>,
    log: Option<String>,
    log_format: Option<String>,
}

fn load_toml(path: &Path) -> Option<TomlConfig> {
    let contents = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            warn!(path = %path.display(), "ignoring malformed config file: {e}");
            None
        }
    }
}

// ─── ConsoleConfig ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Validation service base URL (CLAIMCTL_API_URL, default: http://127.0.0.1:8000).
    pub api_url: String,
    /// Default tenant for CLI subcommands (CLAIMCTL_TENANT, default: "default").
    pub tenant: String,
    /// Currency code shown next to amounts (CLAIMCTL_CURRENCY, default: "AED").
    pub currency: String,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// Log filter (trace, debug, info, warn, error).
    pub log: String,
    /// Log output format ("pretty" | "json").
    pub log_format: String,
}

impl ConsoleConfig {
    /// Build config from CLI/env args + optional TOML file.
    pub fn new(
        config_path: Option<PathBuf>,
        api_url: Option<String>,
        tenant: Option<String>,
        log: Option<String>,
        log_format: Option<String>,
    ) -> Self {
        let path = config_path.unwrap_or_else(default_config_path);
        let toml = load_toml(&path).unwrap_or_default();

        let api_url = api_url
            .or(toml.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let tenant = tenant
            .or(toml.tenant)
            .unwrap_or_else(|| DEFAULT_TENANT.to_string());

        let currency = std::env::var("CLAIMCTL_CURRENCY")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.currency)
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        let timeout_secs = toml.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let log_format = log_format
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());

        Self {
            api_url,
            tenant,
            currency,
            timeout_secs,
            log,
            log_format,
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

fn default_config_path() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join("Library/Application Support/claimctl/config.toml");
        }
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        // $XDG_CONFIG_HOME/claimctl or ~/.config/claimctl
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            if !xdg.is_empty() {
                return PathBuf::from(xdg).join("claimctl/config.toml");
            }
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".config/claimctl/config.toml");
        }
    }

    #[cfg(windows)]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("claimctl/config.toml");
        }
    }

    PathBuf::from("claimctl.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_no_file() {
        let cfg = ConsoleConfig::new(
            Some(PathBuf::from("/nonexistent/claimctl.toml")),
            None,
            None,
            None,
            None,
        );
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.tenant, "default");
        assert_eq!(cfg.currency, "AED");
        assert_eq!(cfg.log, "info");
    }

    #[test]
    fn test_cli_overrides_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "api_url = \"http://from-toml:9000\"").unwrap();
        writeln!(f, "tenant = \"toml-tenant\"").unwrap();

        let cfg = ConsoleConfig::new(
            Some(path.clone()),
            Some("http://from-cli:1234".into()),
            None,
            None,
            None,
        );
        assert_eq!(cfg.api_url, "http://from-cli:1234");
        assert_eq!(cfg.tenant, "toml-tenant");
    }

    #[test]
    fn test_malformed_toml_ignored() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_url = [not valid").unwrap();

        let cfg = ConsoleConfig::new(Some(path), None, None, None, None);
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
    }
}
