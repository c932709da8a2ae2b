pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli_args::CliConfig;

#[cfg(feature = "cli")]
mod cli_args {
    use crate::core::{ConfigProvider, SourceFiles, SpendingTiers};
    use crate::domain::report::{OutputFormat, ReportKind};
    use crate::utils::error::{InsightsError, Result};
    use crate::utils::validation::{self, Validate};
    use clap::Parser;
    use rust_decimal::Decimal;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "retail-insights")]
    #[command(about = "Retail analytics reports over customer, product and invoice tables")]
    pub struct CliConfig {
        /// Directory holding the customer, product, invoice and invoice line files
        #[arg(long, default_value = "./data")]
        pub data_dir: String,

        #[arg(long, default_value = "./output")]
        pub output_path: String,

        #[arg(long, value_delimiter = ',', default_value = "csv")]
        pub formats: Vec<OutputFormat>,

        /// Reports to produce; all of them when omitted
        #[arg(long, value_delimiter = ',')]
        pub reports: Vec<ReportKind>,

        #[arg(long, default_value = "retail_reports.zip")]
        pub archive_name: String,

        /// Write each report as its own file instead of one ZIP archive
        #[arg(long)]
        pub no_archive: bool,

        /// Keep only the first N rows of every report
        #[arg(long)]
        pub limit: Option<usize>,

        #[arg(long, default_value = "100")]
        pub medium_min: Decimal,

        #[arg(long, default_value = "500")]
        pub medium_max: Decimal,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Log phase timings and memory usage")]
        pub monitor: bool,

        #[arg(long, help = "Emit logs as JSON lines")]
        pub log_json: bool,

        #[arg(skip)]
        pub source_files: SourceFiles,
    }

    impl ConfigProvider for CliConfig {
        fn source_files(&self) -> &SourceFiles {
            &self.source_files
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn output_formats(&self) -> &[OutputFormat] {
            &self.formats
        }

        fn reports(&self) -> &[ReportKind] {
            &self.reports
        }

        fn archive_name(&self) -> Option<&str> {
            if self.no_archive {
                None
            } else {
                Some(self.archive_name.as_str())
            }
        }

        fn tiers(&self) -> SpendingTiers {
            SpendingTiers {
                medium_min: self.medium_min,
                medium_max: self.medium_max,
            }
        }

        fn row_limit(&self) -> Option<usize> {
            self.limit
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validation::validate_path("data_dir", &self.data_dir)?;
            validation::validate_path("output_path", &self.output_path)?;
            validation::validate_file_extensions("source_files", &self.source_files.all(), &["csv", "tsv"])?;

            if self.formats.is_empty() {
                return Err(InsightsError::MissingConfigError {
                    field: "formats".to_string(),
                });
            }
            if !self.no_archive {
                validation::validate_file_extensions("archive_name", &[self.archive_name.as_str()], &["zip"])?;
            }
            if let Some(limit) = self.limit {
                validation::validate_positive_number("limit", limit, 1)?;
            }
            validation::validate_tier_bounds("medium_min/medium_max", &self.tiers())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_defaults() {
            let config = CliConfig::parse_from(["retail-insights"]);
            assert_eq!(config.data_dir, "./data");
            assert_eq!(config.formats, vec![OutputFormat::Csv]);
            assert!(config.reports.is_empty());
            assert_eq!(config.archive_name(), Some("retail_reports.zip"));
            assert_eq!(config.tiers(), SpendingTiers::default());
            assert_eq!(config.source_files, SourceFiles::default());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_parse_lists_and_overrides() {
            let config = CliConfig::parse_from([
                "retail-insights",
                "--formats",
                "csv,json",
                "--reports",
                "top_spenders,spending-tiers",
                "--no-archive",
                "--limit",
                "10",
                "--medium-min",
                "50.5",
            ]);
            assert_eq!(config.formats, vec![OutputFormat::Csv, OutputFormat::Json]);
            assert_eq!(
                config.reports,
                vec![ReportKind::TopSpenders, ReportKind::SpendingTiers]
            );
            assert_eq!(config.archive_name(), None);
            assert_eq!(config.row_limit(), Some(10));
            assert_eq!(config.tiers().medium_min.to_string(), "50.5");
        }

        #[test]
        fn test_unknown_report_rejected() {
            assert!(CliConfig::try_parse_from(["retail-insights", "--reports", "revenue"]).is_err());
        }

        #[test]
        fn test_validation_failures() {
            let mut config = CliConfig::parse_from(["retail-insights", "--limit", "0"]);
            assert!(config.validate().is_err());

            config.limit = None;
            config.medium_min = Decimal::from(900);
            assert!(config.validate().is_err());

            config.medium_min = Decimal::from(100);
            config.archive_name = "reports.tar".to_string();
            assert!(config.validate().is_err());

            config.no_archive = true;
            assert!(config.validate().is_ok());
        }
    }
}
