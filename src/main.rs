use clap::Parser;
use sched_examples::config::toml_config::SourceKind;
use sched_examples::core::pipeline::GeneratorPipeline;
use sched_examples::domain::source::{builtin_roster, parse_availability};
use sched_examples::utils::error::{ErrorSeverity, SchedError};
use sched_examples::utils::{logger, validation::Validate};
use sched_examples::{CliConfig, EtlEngine, GeneratorConfig, LocalStorage};

fn fail(e: &SchedError) -> ! {
    tracing::error!(
        "❌ Generation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);
    tracing::info!("🚀 Starting example data generator");
    tracing::debug!("CLI args: {:?}", args);

    let config = match args.resolve() {
        Ok(config) => config,
        Err(e) => fail(&e),
    };

    if let Err(e) = config.validate() {
        fail(&e);
    }

    display_config_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No files will be written");
        if let Err(e) = perform_dry_run(&config) {
            fail(&e);
        }
        return Ok(());
    }

    // 沒有輸出目錄就不執行
    let outdir = match config.outdir() {
        Ok(outdir) => outdir.to_string(),
        Err(e) => fail(&e),
    };

    let storage = LocalStorage::new(outdir.clone());
    let pipeline = GeneratorPipeline::new(storage, config);
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(manifest) => {
            tracing::info!("✅ Generation completed successfully!");
            println!("✅ Wrote {} partitions to {}", manifest.output.len(), outdir);
            for descriptor in &manifest.output {
                println!("  {:<9} {}", descriptor.resource_type, descriptor.url);
            }
        }
        Err(e) => fail(&e),
    }

    Ok(())
}

fn display_config_summary(config: &GeneratorConfig) {
    println!("📋 Configuration Summary:");
    println!("  Name: {}", config.generator.name);
    println!(
        "  Dates: {} .. {} ({})",
        config.generator.start_date, config.generator.end_date, config.generator.utc_offset
    );
    match config.source.kind {
        SourceKind::Builtin => println!("  Source: built-in roster"),
        SourceKind::Availability => println!(
            "  Source: {}",
            config.source.path.as_deref().unwrap_or("<missing>")
        ),
    }
    println!(
        "  Slots: {:?}, capacity {}, {} min visits",
        config.slots.granularity, config.slots.capacity, config.slots.visit_minutes
    );
    println!("  Ids: {:?} / bookings {:?}", config.ids.strategy, config.ids.booking_ids);
    println!("  Week partitions: {}", config.output.partition_by_week);
    println!(
        "  Output: {}",
        config.output.outdir.as_deref().unwrap_or("<not set>")
    );
    println!();
}

fn perform_dry_run(config: &GeneratorConfig) -> sched_examples::Result<()> {
    let mut sources = match config.source.kind {
        SourceKind::Builtin => builtin_roster(),
        SourceKind::Availability => {
            let path = sched_examples::utils::validation::validate_required_field(
                "source.path",
                &config.source.path,
            )?;
            let content =
                std::fs::read_to_string(path).map_err(|source| SchedError::InputReadError {
                    path: path.clone(),
                    source,
                })?;
            parse_availability(&content)?
        }
    };
    if let Some(limit) = config.source.limit {
        sources.truncate(limit);
    }

    println!("🔍 Dry Run Analysis:");
    println!("  Locations: {}", sources.len());
    println!("  Schedules: {}", sources.len());
    println!("  Slots: {}", config.expected_slot_count(&sources));
    println!("  Base URL: {}", config.generator.base_url);
    println!();
    println!("✅ Dry run analysis complete.");
    Ok(())
}
