use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
    monitor: RunMonitor,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(monitor_enabled),
        }
    }

    pub fn monitor(&self) -> &RunMonitor {
        &self.monitor
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting report run");

        tracing::info!("Loading source tables...");
        let dataset = self.pipeline.extract().await?;
        let summary = dataset.summary();
        tracing::info!(
            "Loaded {} customers, {} products, {} invoices, {} invoice lines",
            summary.customers,
            summary.products,
            summary.invoices,
            summary.invoice_lines
        );
        self.monitor.finish_phase("extract");

        tracing::info!("Running queries...");
        let bundle = self.pipeline.transform(dataset).await?;
        tracing::info!("Rendered {} report files", bundle.reports.len());
        self.monitor.finish_phase("transform");

        tracing::info!("Writing reports...");
        let output_path = self.pipeline.load(bundle).await?;
        self.monitor.finish_phase("load");

        tracing::info!("Reports saved to: {}", output_path);
        self.monitor.log_summary();
        Ok(output_path)
    }
}
