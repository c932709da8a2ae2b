use clap::Parser;
use retail_insights::config::toml_config::TomlConfig;
use retail_insights::core::ConfigProvider;
use retail_insights::utils::error::ErrorSeverity;
use retail_insights::utils::{logger, validation::Validate};
use retail_insights::{AnalyticsPipeline, LocalStorage, ReportEngine};

#[derive(Parser)]
#[command(name = "toml-report")]
#[command(about = "Retail analytics reports driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "report-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.log_json() {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based report tool");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config).await;
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let source = LocalStorage::new(config.data_dir().to_string());
    let sink = LocalStorage::new(config.output_path().to_string());
    let pipeline = AnalyticsPipeline::new(source, sink, config);

    let engine = ReportEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Report run completed successfully!");
            println!("✅ Report run completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Report run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn joined<T: ToString>(items: &[T]) -> String {
    items.iter().map(|item| item.to_string()).collect::<Vec<_>>().join(", ")
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    match &config.report.version {
        Some(version) => println!("  Report: {} v{}", config.report.name, version),
        None => println!("  Report: {}", config.report.name),
    }
    if let Some(description) = &config.report.description {
        println!("  Description: {}", description);
    }
    println!("  Source: {}", config.data_dir());
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", joined(config.output_formats()));
    println!("  Reports: {}", joined(config.effective_reports()));

    if let Some(limit) = config.row_limit() {
        println!("  Row Limit: {}", limit);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(config: &TomlConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    // 來源檔案分析
    println!("📂 Source Tables:");
    let data_dir = std::path::Path::new(config.data_dir());
    for file in config.source_files().all() {
        let path = data_dir.join(file);
        let status = match tokio::fs::metadata(&path).await {
            Ok(meta) => format!("✅ {} bytes", meta.len()),
            Err(_) => "❌ missing".to_string(),
        };
        println!("  {} ({})", path.display(), status);
    }

    println!();
    println!("📊 Reports:");
    for kind in config.effective_reports() {
        println!("  {}", kind);
    }

    let tiers = config.tiers();
    println!();
    println!("🏷️ Spending Tiers:");
    println!("  Low: < {}", tiers.medium_min);
    println!("  Medium: {} - {}", tiers.medium_min, tiers.medium_max);
    println!("  High: > {}", tiers.medium_max);

    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.output_path());
    println!("  Formats: {}", joined(config.output_formats()));
    match config.archive_name() {
        Some(archive) => println!("  Compression: {} (ZIP)", archive),
        None => println!("  Compression: disabled, one file per report"),
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
