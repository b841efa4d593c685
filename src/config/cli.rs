use crate::config::toml_config::{GeneratorConfig, Granularity, SourceKind};
use crate::core::ids::BookingIdPolicy;
use crate::utils::error::Result;
use chrono::NaiveDate;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "generate-examples")]
#[command(about = "Generate sample bulk-publish data (locations, schedules, slots)")]
pub struct CliConfig {
    /// Output directory for the NDJSON partitions and manifest
    #[arg(short, long)]
    pub outdir: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Availability JSON file to convert instead of the built-in roster
    #[arg(long)]
    pub input: Option<String>,

    /// First day to generate (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last day to generate, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    #[arg(long, value_enum)]
    pub granularity: Option<Granularity>,

    /// Write all slots to a single slots.ndjson
    #[arg(long)]
    pub no_week_partition: bool,

    /// Use random base64url booking references instead of sequential numbers
    #[arg(long)]
    pub random_booking_ids: bool,

    /// Show what would be generated without writing files
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// 載入配置並套用命令列覆蓋
    pub fn resolve(&self) -> Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::from_file(path)?,
            None => GeneratorConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut GeneratorConfig) {
        if let Some(outdir) = &self.outdir {
            config.output.outdir = Some(outdir.clone());
        }
        if let Some(input) = &self.input {
            config.source.kind = SourceKind::Availability;
            config.source.path = Some(input.clone());
        }
        if let Some(start) = self.start_date {
            config.generator.start_date = start;
        }
        if let Some(end) = self.end_date {
            config.generator.end_date = end;
        }
        if let Some(granularity) = self.granularity {
            config.slots.granularity = granularity;
        }
        if self.no_week_partition {
            config.output.partition_by_week = false;
        }
        if self.random_booking_ids {
            config.ids.booking_ids = BookingIdPolicy::Random;
        }
    }
}
