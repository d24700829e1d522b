use anyhow::Context;
use clap::Parser;
use warehouse_etl::config::toml_config::TomlConfig;
use warehouse_etl::core::{ConfigProvider, RecordSource, SourceFormat};
use warehouse_etl::utils::{logger, validation::Validate};
use warehouse_etl::{
    EtlEngine, FileRecordSource, FleetReconstructor, LocalStorage, WarehousePipeline,
};

#[derive(Parser)]
#[command(name = "toml-etl")]
#[command(about = "Warehouse ETL driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "warehouse-etl.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Reconstruct the fleet and summarise it without writing any report
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    let verbose = args.verbose || config.verbose_logging();
    if args.json_logs {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("🚀 Starting TOML-based warehouse ETL");
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No report will be written");
        perform_dry_run(&config).await?;
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let source = FileRecordSource::from_config(LocalStorage::default(), &config);
    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = WarehousePipeline::new(storage, source, config);

    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ ETL process completed successfully!");
            println!("📁 Report saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Pipeline: {} v{}",
        config.pipeline.name, config.pipeline.version
    );
    if let Some(description) = &config.pipeline.description {
        println!("  Description: {}", description);
    }
    println!("  Source: {} ({})", config.source_path(), config.source_format());
    if config.source_format() == SourceFormat::Csv {
        println!(
            "  Tables: {}, {}",
            config.pallets_file(),
            config.boxes_file()
        );
    }
    println!("  Output: {}/{}", config.output_path(), config.archive_name());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    let source = FileRecordSource::from_config(LocalStorage::default(), config);
    let records = source
        .fetch_pallets()
        .await
        .with_context(|| format!("reading pallet records from {}", config.source_path()))?;

    let box_records: usize = records.iter().map(|p| p.boxes.len()).sum();
    let reconstruction = FleetReconstructor::new().reconstruct(&records);

    println!("🔍 Dry Run Analysis:");
    println!("  Pallet records: {}", records.len());
    println!("  Box records: {}", box_records);
    println!("  Committed pallets: {}", reconstruction.fleet.len());
    println!(
        "  Discarded: {} pallets, {} boxes",
        reconstruction.discards.pallets_discarded(),
        reconstruction.discards.boxes_discarded()
    );
    println!(
        "  Expiry groups: {}",
        reconstruction.fleet.group_by_expiry().len()
    );

    for discard in reconstruction.discards.iter() {
        println!("  ⚠️ {:?} at {:?}: {}", discard.record, discard.stage, discard.reason);
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}
