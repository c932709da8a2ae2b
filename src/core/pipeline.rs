use crate::core::loader::{load_dataset, SourceTable, SourceTables};
use crate::core::report::{build_reports, ReportOptions};
use crate::core::{ConfigProvider, Dataset, Pipeline, ReportBundle, Storage};
use crate::domain::report::ReportKind;
use crate::utils::error::Result;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Loads the four tables from `source`, runs the configured reports and
/// writes them to `sink`.
pub struct AnalyticsPipeline<S: Storage, C: ConfigProvider> {
    source: S,
    sink: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> AnalyticsPipeline<S, C> {
    pub fn new(source: S, sink: S, config: C) -> Self {
        Self {
            source,
            sink,
            config,
        }
    }

    async fn read_table(&self, name: &str) -> Result<SourceTable> {
        tracing::debug!("Reading source table: {}", name);
        let data = self.source.read_file(name).await?;
        Ok(SourceTable::new(name, data))
    }

    fn selected_reports(&self) -> &[ReportKind] {
        match self.config.reports() {
            [] => ReportKind::ALL,
            selected => selected,
        }
    }

    fn archive(bundle: &ReportBundle) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for report in &bundle.reports {
            zip.start_file(report.file_name(), SimpleFileOptions::default())?;
            zip.write_all(report.content.as_bytes())?;
        }
        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for AnalyticsPipeline<S, C> {
    async fn extract(&self) -> Result<Dataset> {
        let files = self.config.source_files();
        let tables = SourceTables {
            customers: self.read_table(&files.customers).await?,
            products: self.read_table(&files.products).await?,
            invoices: self.read_table(&files.invoices).await?,
            invoice_lines: self.read_table(&files.invoice_lines).await?,
        };
        load_dataset(&tables)
    }

    async fn transform(&self, dataset: Dataset) -> Result<ReportBundle> {
        let options = ReportOptions {
            kinds: self.selected_reports(),
            formats: self.config.output_formats(),
            tiers: self.config.tiers(),
            row_limit: self.config.row_limit(),
        };
        build_reports(&dataset, &options)
    }

    async fn load(&self, bundle: ReportBundle) -> Result<String> {
        let output_path = self.config.output_path().trim_end_matches('/');

        match self.config.archive_name() {
            Some(archive_name) => {
                tracing::debug!(
                    "Creating ZIP archive {} with {} files",
                    archive_name,
                    bundle.reports.len()
                );
                let zip_data = Self::archive(&bundle)?;
                tracing::debug!("Writing ZIP archive ({} bytes) to storage", zip_data.len());
                self.sink.write_file(archive_name, &zip_data).await?;
                Ok(format!("{}/{}", output_path, archive_name))
            }
            None => {
                for report in &bundle.reports {
                    self.sink
                        .write_file(&report.file_name(), report.content.as_bytes())
                        .await?;
                }
                tracing::debug!("Wrote {} report files", bundle.reports.len());
                Ok(output_path.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SourceFiles, SpendingTiers};
    use crate::domain::report::OutputFormat;
    use crate::utils::error::InsightsError;
    use std::collections::HashMap;
    use std::io::Read;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn put(&self, path: &str, content: &str) {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), content.as_bytes().to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }

        async fn file_names(&self) -> Vec<String> {
            let files = self.files.lock().await;
            let mut names: Vec<String> = files.keys().cloned().collect();
            names.sort();
            names
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                InsightsError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        source_files: SourceFiles,
        formats: Vec<OutputFormat>,
        reports: Vec<ReportKind>,
        archive_name: Option<String>,
        row_limit: Option<usize>,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                source_files: SourceFiles::default(),
                formats: vec![OutputFormat::Csv],
                reports: vec![],
                archive_name: Some("reports.zip".to_string()),
                row_limit: None,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn source_files(&self) -> &SourceFiles {
            &self.source_files
        }

        fn output_path(&self) -> &str {
            "test_output"
        }

        fn output_formats(&self) -> &[OutputFormat] {
            &self.formats
        }

        fn reports(&self) -> &[ReportKind] {
            &self.reports
        }

        fn archive_name(&self) -> Option<&str> {
            self.archive_name.as_deref()
        }

        fn tiers(&self) -> SpendingTiers {
            SpendingTiers::default()
        }

        fn row_limit(&self) -> Option<usize> {
            self.row_limit
        }
    }

    async fn seeded_source() -> MockStorage {
        let source = MockStorage::new();
        source
            .put("customers.csv", "CustomerID,Country\n1,US\n2,UK\n3,\n")
            .await;
        source
            .put(
                "products.csv",
                "StockCode,Description,UnitPrice\nA1,Widget,10.00\nB2,Gadget,250.00\n",
            )
            .await;
        source
            .put(
                "invoices.csv",
                "InvoiceNo,InvoiceDate,CustomerID\nINV1,2023-11-15 10:00:00,1\nINV2,2024-02-01 09:15:00,2\n",
            )
            .await;
        source
            .put(
                "invoice_details.csv",
                "InvoiceNo,StockCode,Quantity\nINV1,A1,3\nINV2,B2,3\nINV2,A1,1\n",
            )
            .await;
        source
    }

    #[tokio::test]
    async fn test_extract_loads_all_tables() {
        let pipeline = AnalyticsPipeline::new(seeded_source().await, MockStorage::new(), MockConfig::new());

        let dataset = pipeline.extract().await.unwrap();
        let summary = dataset.summary();
        assert_eq!(summary.customers, 3);
        assert_eq!(summary.products, 2);
        assert_eq!(summary.invoices, 2);
        assert_eq!(summary.invoice_lines, 3);
    }

    #[tokio::test]
    async fn test_extract_missing_table_fails() {
        let source = MockStorage::new();
        source.put("customers.csv", "CustomerID,Country\n1,US\n").await;
        let pipeline = AnalyticsPipeline::new(source, MockStorage::new(), MockConfig::new());

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, InsightsError::IoError(_)));
    }

    #[tokio::test]
    async fn test_transform_defaults_to_every_report() {
        let pipeline = AnalyticsPipeline::new(seeded_source().await, MockStorage::new(), MockConfig::new());
        let dataset = pipeline.extract().await.unwrap();

        let bundle = pipeline.transform(dataset).await.unwrap();
        assert_eq!(bundle.reports.len(), ReportKind::ALL.len());

        let top = &bundle.reports[0];
        assert_eq!(top.kind, ReportKind::TopSpenders);
        assert_eq!(top.content, "CustomerID,money_spent\n2,760.00\n1,30.00\n3,0\n");
    }

    #[tokio::test]
    async fn test_transform_respects_selection_and_limit() {
        let mut config = MockConfig::new();
        config.reports = vec![ReportKind::SpendingTiers, ReportKind::TopCountries];
        config.formats = vec![OutputFormat::Csv, OutputFormat::Tsv];
        config.row_limit = Some(1);
        let pipeline = AnalyticsPipeline::new(seeded_source().await, MockStorage::new(), config);
        let dataset = pipeline.extract().await.unwrap();

        let bundle = pipeline.transform(dataset).await.unwrap();
        let names: Vec<String> = bundle.reports.iter().map(|r| r.file_name()).collect();
        assert_eq!(
            names,
            vec![
                "spending_tiers.csv",
                "spending_tiers.tsv",
                "top_countries.csv",
                "top_countries.tsv"
            ]
        );
        assert_eq!(bundle.reports[0].content, "Country,TotalSpending,category\nUK,760.00,High\n");
    }

    #[tokio::test]
    async fn test_load_writes_zip_archive() {
        let sink = MockStorage::new();
        let pipeline = AnalyticsPipeline::new(seeded_source().await, sink.clone(), MockConfig::new());
        let dataset = pipeline.extract().await.unwrap();
        let bundle = pipeline.transform(dataset).await.unwrap();

        let output_path = pipeline.load(bundle).await.unwrap();
        assert_eq!(output_path, "test_output/reports.zip");

        let zip_data = sink.get_file("reports.zip").await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        assert_eq!(archive.len(), ReportKind::ALL.len());

        let mut content = String::new();
        archive
            .by_name("quarterly_trends.csv")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(
            content,
            "Description,Quarter,TotalQuantity\nGadget,2024-Q1,3\nWidget,2023-Q4,3\nWidget,2024-Q1,1\n,,0\n"
        );
    }

    #[tokio::test]
    async fn test_load_without_archive_writes_individual_files() {
        let sink = MockStorage::new();
        let mut config = MockConfig::new();
        config.archive_name = None;
        config.reports = vec![ReportKind::TopSpenders, ReportKind::TrendingProducts];
        config.formats = vec![OutputFormat::Json];
        let pipeline = AnalyticsPipeline::new(seeded_source().await, sink.clone(), config);
        let dataset = pipeline.extract().await.unwrap();
        let bundle = pipeline.transform(dataset).await.unwrap();

        let output_path = pipeline.load(bundle).await.unwrap();
        assert_eq!(output_path, "test_output");
        assert_eq!(
            sink.file_names().await,
            vec!["top_spenders.json", "trending_products.json"]
        );

        let json: serde_json::Value =
            serde_json::from_slice(&sink.get_file("trending_products.json").await.unwrap()).unwrap();
        assert_eq!(json[0]["Description"], "Widget");
        assert_eq!(json[0]["purchase_count"], 2);
    }
}
