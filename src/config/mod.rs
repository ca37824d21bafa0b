use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Market data provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Fetch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// Number of symbols fetched at once. 1 keeps requests strictly sequential.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

/// Initial dashboard control values
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardConfig {
    #[serde(default = "default_days")]
    pub default_days: u32,

    #[serde(default = "default_companies")]
    pub default_companies: Vec<String>,

    #[serde(default = "default_ymin")]
    pub ymin: f64,

    #[serde(default = "default_ymax")]
    pub ymax: f64,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) kabuka-dashboard/0.1".to_string()
}
fn default_concurrency() -> usize {
    1
}
fn default_days() -> u32 {
    20
}
fn default_companies() -> Vec<String> {
    vec!["トヨタ".to_string()]
}
fn default_ymin() -> f64 {
    0.0
}
fn default_ymax() -> f64 {
    15000.0
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { concurrency: default_concurrency() }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_days: default_days(),
            default_companies: default_companies(),
            ymin: default_ymin(),
            ymax: default_ymax(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            fetch: FetchConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("KABUKA").separator("__"))
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize().unwrap_or_else(|e| {
            warn!("Invalid configuration ({}), using defaults", e);
            AppConfig::default()
        });
        Ok(app_cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_dashboard_controls() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.dashboard.default_days, 20);
        assert_eq!(cfg.dashboard.default_companies, vec!["トヨタ".to_string()]);
        assert_eq!(cfg.dashboard.ymin, 0.0);
        assert_eq!(cfg.dashboard.ymax, 15000.0);
        assert_eq!(cfg.fetch.concurrency, 1);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[fetch]\nconcurrency = 4\n[dashboard]\ndefault_days = 5\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.fetch.concurrency, 4);
        assert_eq!(cfg.dashboard.default_days, 5);
        assert_eq!(cfg.dashboard.ymax, 15000.0);
        assert_eq!(cfg.provider.base_url, "https://query1.finance.yahoo.com");
    }
}
