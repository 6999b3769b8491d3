use clap::Parser;
use sales_etl::domain::ports::ConfigProvider;
use sales_etl::utils::{logger, validation::Validate};
use sales_etl::{CliConfig, EtlConfig, EtlEngine, LocalStorage, SalesPipeline};

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    logger::init_logger(cli.verbose, config.log_format(), config.logging.level.as_deref());

    tracing::info!("Starting {} CLI", config.pipeline.name);
    if cli.verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if cli.dry_run {
        display_config_summary(&config);
        return Ok(());
    }

    let monitor_enabled = config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let strict = config.strict_exit_code();
    let storage = LocalStorage::default();
    let pipeline = SalesPipeline::new(storage, config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    let report = engine.run();

    for path in &report.outputs.written {
        println!("📁 Output saved to: {}", path.display());
    }
    for failure in &report.outputs.failed {
        eprintln!("❌ {}: {}", failure.path.display(), failure.reason);
    }

    let exit_code = report.status.exit_code(strict);
    if exit_code > 0 {
        std::process::exit(exit_code);
    }

    Ok(())
}

fn display_config_summary(config: &EtlConfig) {
    println!("📋 Configuration Summary:");
    println!("  Pipeline: {}", config.pipeline.name);
    if let Some(description) = &config.pipeline.description {
        println!("  Description: {}", description);
    }
    println!("  Input: {}", config.input_path());
    println!("  Delimiter: {:?}", config.delimiter() as char);
    println!("  Output dir: {}", config.output_dir());
    println!(
        "  Cleaned: {} ({})",
        config.cleaned_output().filename,
        config.cleaned_output().format
    );
    match config.summary_output() {
        Some(summary) => println!("  Summary: {} ({})", summary.filename, summary.format),
        None => println!("  Summary: disabled"),
    }
    println!("  Delete input on success: {}", config.delete_input_on_success());
    println!("  Strict exit code: {}", config.strict_exit_code());
    println!();
    println!("🔍 Dry run complete, nothing was read or written.");
}
