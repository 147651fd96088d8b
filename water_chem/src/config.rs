/// Configuration file and environment handling.
///
/// Every setting has a default, so running without a config file is
/// normal. Lookup order for the file: `--config PATH`, then
/// `WATER_CHEM_CONFIG`, then `water_chem.toml` in the working directory if
/// it exists. A `.env` file is loaded first so either variable can live
/// there.
///
/// ```toml
/// [daily]
/// zone = "Rossdale"
///
/// [monthly]
/// locator = "year-month"
/// url_template = "https://example.test/{year}/summary-{month}.pdf"
/// step = "calendar-month"
/// start_offset = 1
/// max_periods_back = 4
///
/// [http]
/// timeout_secs = 30
///
/// [logging]
/// level = "info"
/// file = "water_chem.log"
///
/// [overrides]
/// sodium = 9.5
/// ```

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::ingest::daily::DEFAULT_DAILY_URL_TEMPLATE;
use crate::logging::LogLevel;
use crate::model::{Field, WaterReport};
use crate::period::{LocatorFormat, PeriodStep, ReportLocator};
use crate::resolver::{
    DEFAULT_MAX_PERIODS_BACK, DEFAULT_START_OFFSET, LookbackWindow, MAX_PERIODS_BACK_LIMIT,
};

pub const CONFIG_ENV_VAR: &str = "WATER_CHEM_CONFIG";
pub const ZONE_ENV_VAR: &str = "WATER_CHEM_ZONE";
pub const DEFAULT_CONFIG_FILE: &str = "water_chem.toml";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} not found", .0.display())]
    Missing(PathBuf),
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown override field '{0}' (expected one of: {})", field_keys())]
    UnknownOverride(String),
    #[error("lookback window is empty: start_offset {start} is after max_periods_back {max}")]
    EmptyWindow { start: u32, max: u32 },
    #[error("max_periods_back {max} is over the limit of {limit}")]
    WindowTooLong { max: u32, limit: u32 },
}

fn field_keys() -> String {
    Field::ALL.iter().map(|f| f.key()).collect::<Vec<_>>().join(", ")
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DailyConfig {
    /// Daily page URL; `{zone}` is replaced with the zone code.
    pub url_template: String,
    /// Zone used when none is given on the command line.
    pub zone: Option<String>,
}

impl Default for DailyConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_DAILY_URL_TEMPLATE.to_string(),
            zone: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonthlyConfig {
    pub locator: LocatorFormat,
    /// Overrides the locator's default URL template.
    pub url_template: Option<String>,
    pub step: PeriodStep,
    pub start_offset: u32,
    pub max_periods_back: u32,
}

impl Default for MonthlyConfig {
    fn default() -> Self {
        Self {
            locator: LocatorFormat::default(),
            url_template: None,
            step: PeriodStep::default(),
            start_offset: DEFAULT_START_OFFSET,
            max_periods_back: DEFAULT_MAX_PERIODS_BACK,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("water_chem/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<PathBuf>,
    pub timestamps: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub daily: DailyConfig,
    pub monthly: MonthlyConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
    /// Field key → value replacing whatever was extracted.
    pub overrides: BTreeMap<String, Decimal>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Loads `.env`, then the config file, then environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::load_with_env(explicit, |key| std::env::var(key).ok())
    }

    /// `load` with the environment supplied by `env`, for tests.
    pub fn load_with_env(
        explicit: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match explicit
            .map(Path::to_path_buf)
            .or_else(|| env(CONFIG_ENV_VAR).map(PathBuf::from))
        {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => return Err(ConfigError::Missing(path)),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };

        if let Some(zone) = env(ZONE_ENV_VAR).filter(|z| !z.trim().is_empty()) {
            config.daily.zone = Some(zone);
        }
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(key) = self.overrides.keys().find(|k| Field::from_key(k).is_none()) {
            return Err(ConfigError::UnknownOverride(key.clone()));
        }
        if self.monthly.max_periods_back > MAX_PERIODS_BACK_LIMIT {
            return Err(ConfigError::WindowTooLong {
                max: self.monthly.max_periods_back,
                limit: MAX_PERIODS_BACK_LIMIT,
            });
        }
        if self.monthly.start_offset > self.monthly.max_periods_back {
            return Err(ConfigError::EmptyWindow {
                start: self.monthly.start_offset,
                max: self.monthly.max_periods_back,
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Derived settings
    // -----------------------------------------------------------------------

    pub fn lookback_window(&self) -> LookbackWindow {
        LookbackWindow {
            step: self.monthly.step,
            start_offset: self.monthly.start_offset,
            max_periods_back: self.monthly.max_periods_back,
        }
    }

    pub fn report_locator(&self) -> Box<dyn ReportLocator> {
        self.monthly.locator.build(self.monthly.url_template.as_deref())
    }

    pub fn http_client(&self) -> Result<reqwest::blocking::Client, reqwest::Error> {
        reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.http.timeout_secs))
            .user_agent(self.http.user_agent.clone())
            .build()
    }

    /// Replaces report fields with configured overrides and returns the
    /// fields that were overridden.
    pub fn apply_overrides(&self, report: &mut WaterReport) -> Vec<Field> {
        let mut applied = Vec::new();
        for (key, value) in &self.overrides {
            if let Some(field) = Field::from_key(key) {
                report.set(field, Some(*value));
                applied.push(field);
            }
        }
        applied
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
