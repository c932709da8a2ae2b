use crate::domain::dataset::Dataset;
use crate::domain::report::{OutputFormat, ReportBundle, ReportKind, SpendingTiers};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// File names of the four source tables, relative to the source storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFiles {
    pub customers: String,
    pub products: String,
    pub invoices: String,
    pub invoice_lines: String,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            customers: "customers.csv".to_string(),
            products: "products.csv".to_string(),
            invoices: "invoices.csv".to_string(),
            invoice_lines: "invoice_details.csv".to_string(),
        }
    }
}

impl SourceFiles {
    pub fn all(&self) -> [&str; 4] {
        [
            self.customers.as_str(),
            self.products.as_str(),
            self.invoices.as_str(),
            self.invoice_lines.as_str(),
        ]
    }
}

pub trait ConfigProvider: Send + Sync {
    fn source_files(&self) -> &SourceFiles;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[OutputFormat];
    /// Selected reports; an empty selection means every report.
    fn reports(&self) -> &[ReportKind];
    /// `Some(name)` bundles every rendered file into one ZIP archive.
    fn archive_name(&self) -> Option<&str>;
    fn tiers(&self) -> SpendingTiers;
    fn row_limit(&self) -> Option<usize>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Dataset>;
    async fn transform(&self, dataset: Dataset) -> Result<ReportBundle>;
    async fn load(&self, bundle: ReportBundle) -> Result<String>;
}
