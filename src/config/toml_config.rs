use crate::core::{ConfigProvider, SourceFiles, SpendingTiers};
use crate::domain::report::{OutputFormat, ReportKind};
use crate::utils::error::{InsightsError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_ARCHIVE_NAME: &str = "retail_reports.zip";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub report: ReportInfo,
    pub source: SourceConfig,
    pub load: LoadConfig,
    pub tiers: Option<TiersConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInfo {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub data_dir: String,
    #[serde(flatten)]
    pub files: SourceFiles,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<OutputFormat>,
    #[serde(default)]
    pub reports: Vec<ReportKind>,
    pub row_limit: Option<usize>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TiersConfig {
    pub medium_min: Option<Decimal>,
    pub medium_max: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    /// `json` or `compact`
    pub log_format: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(InsightsError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| InsightsError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| InsightsError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn data_dir(&self) -> &str {
        &self.source.data_dir
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_json(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
            .is_some_and(|format| format.eq_ignore_ascii_case("json"))
    }

    /// Every report when the selection is empty.
    pub fn effective_reports(&self) -> &[ReportKind] {
        if self.load.reports.is_empty() {
            ReportKind::ALL
        } else {
            &self.load.reports
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("report.name", &self.report.name)?;
        validation::validate_path("source.data_dir", &self.source.data_dir)?;
        validation::validate_file_extensions("source", &self.source.files.all(), &["csv", "tsv"])?;
        validation::validate_path("load.output_path", &self.load.output_path)?;

        if self.load.output_formats.is_empty() {
            return Err(InsightsError::MissingConfigError {
                field: "load.output_formats".to_string(),
            });
        }
        if let Some(limit) = self.load.row_limit {
            validation::validate_positive_number("load.row_limit", limit, 1)?;
        }
        if let Some(archive) = self.archive_name() {
            validation::validate_file_extensions("load.compression.filename", &[archive], &["zip"])?;
        }
        validation::validate_tier_bounds("tiers", &self.tiers())
    }
}

impl ConfigProvider for TomlConfig {
    fn source_files(&self) -> &SourceFiles {
        &self.source.files
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_formats(&self) -> &[OutputFormat] {
        &self.load.output_formats
    }

    fn reports(&self) -> &[ReportKind] {
        &self.load.reports
    }

    fn archive_name(&self) -> Option<&str> {
        match &self.load.compression {
            Some(compression) if !compression.enabled => None,
            Some(compression) => Some(compression.filename.as_deref().unwrap_or(DEFAULT_ARCHIVE_NAME)),
            None => Some(DEFAULT_ARCHIVE_NAME),
        }
    }

    fn tiers(&self) -> SpendingTiers {
        let defaults = SpendingTiers::default();
        match &self.tiers {
            Some(tiers) => SpendingTiers {
                medium_min: tiers.medium_min.unwrap_or(defaults.medium_min),
                medium_max: tiers.medium_max.unwrap_or(defaults.medium_max),
            },
            None => defaults,
        }
    }

    fn row_limit(&self) -> Option<usize> {
        self.load.row_limit
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
