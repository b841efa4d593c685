use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::config::toml_config::{GeneratorConfig, SourceKind};
use crate::core::builders::{build_location, build_schedule};
use crate::core::calendar::{DateRange, ScheduleDays, SlotCalendar};
use crate::core::ids::IdAllocator;
use crate::core::manifest::{
    slot_file_name, ManifestBuilder, LOCATIONS_FILE, MANIFEST_FILE, SCHEDULES_FILE,
};
use crate::core::partition::partition_slots;
use crate::core::{GeneratedResources, Manifest, Pipeline, Storage};
use crate::domain::model::{Resource, Tagged};
use crate::domain::source::{builtin_roster, parse_availability, SourceLocation};
use crate::utils::error::{Result, SchedError};

/// Encode records as newline-delimited JSON, one tagged resource per line.
pub fn to_ndjson<T: Resource>(records: &[T]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    for record in records {
        serde_json::to_writer(&mut buf, &Tagged::new(record))?;
        buf.push(b'\n');
    }
    Ok(buf)
}

/// Builds locations, schedules and slots from a source list and writes them
/// as bulk-publish partitions.
pub struct GeneratorPipeline<S: Storage> {
    storage: S,
    config: GeneratorConfig,
    transaction_time: Option<DateTime<Utc>>,
}

impl<S: Storage> GeneratorPipeline<S> {
    pub fn new(storage: S, config: GeneratorConfig) -> Self {
        Self {
            storage,
            config,
            transaction_time: None,
        }
    }

    /// Pin the manifest's `transactionTime` instead of using the wall clock.
    pub fn with_transaction_time(mut self, time: DateTime<Utc>) -> Self {
        self.transaction_time = Some(time);
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    async fn write_partition<T: Resource>(&self, file_name: &str, records: &[T]) -> Result<()> {
        let data = to_ndjson(records)?;
        self.storage.write_file(file_name, &data).await?;
        tracing::info!("💾 Wrote {} records to {}", records.len(), file_name);
        Ok(())
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for GeneratorPipeline<S> {
    async fn extract(&self) -> Result<Vec<SourceLocation>> {
        let mut sources = match self.config.source.kind {
            SourceKind::Builtin => {
                tracing::info!("📋 Using built-in clinic roster");
                builtin_roster()
            }
            SourceKind::Availability => {
                let path = self.config.source.path.as_deref().ok_or_else(|| {
                    SchedError::MissingConfigError {
                        field: "source.path".to_string(),
                    }
                })?;
                tracing::info!("📂 Reading availability file: {}", path);
                let content = tokio::fs::read_to_string(path).await.map_err(|source| {
                    SchedError::InputReadError {
                        path: path.to_string(),
                        source,
                    }
                })?;
                parse_availability(&content)?
            }
        };

        if let Some(limit) = self.config.source.limit {
            if sources.len() > limit {
                tracing::debug!("Keeping first {} of {} locations", limit, sources.len());
                sources.truncate(limit);
            }
        }

        Ok(sources)
    }

    async fn transform(&self, sources: Vec<SourceLocation>) -> Result<GeneratedResources> {
        let offset = self.config.offset()?;
        let ids_settings = &self.config.ids;
        let mut ids = IdAllocator::new(ids_settings.booking_ids, ids_settings.booking_id_base);

        let mut locations = Vec::with_capacity(sources.len());
        let mut seen = HashSet::new();
        for (index, source) in sources.iter().enumerate() {
            let location = build_location(source, ids_settings.strategy, &mut ids)?;
            if !seen.insert(location.id.clone()) {
                return Err(SchedError::SourceRecordError {
                    index,
                    reason: format!(
                        "'{}' resolves to duplicate location id {}",
                        source.name, location.id
                    ),
                });
            }
            locations.push(location);
        }

        let schedules: Vec<_> = locations
            .iter()
            .map(|location| build_schedule(location, ids_settings, &mut ids))
            .collect();

        let calendar = SlotCalendar::new(&self.config.slots, ids_settings, offset);
        let generator = &self.config.generator;
        let entries: Vec<ScheduleDays> = schedules
            .iter()
            .zip(&sources)
            .map(|(schedule, source)| ScheduleDays {
                schedule,
                contact: &source.contact,
                days: calendar.plan_days(
                    source,
                    self.config.source.kind,
                    DateRange::new(generator.start_date, generator.end_date),
                ),
            })
            .collect();

        let slots = calendar.generate(&entries, &mut ids);
        tracing::debug!(
            "Generated {} slots for {} schedules ({:?} granularity)",
            slots.len(),
            schedules.len(),
            self.config.slots.granularity
        );

        let slot_partitions = partition_slots(slots, self.config.output.partition_by_week);

        Ok(GeneratedResources {
            locations,
            schedules,
            slot_partitions,
        })
    }

    async fn load(&self, resources: GeneratedResources) -> Result<Manifest> {
        self.write_partition(LOCATIONS_FILE, &resources.locations).await?;
        self.write_partition(SCHEDULES_FILE, &resources.schedules).await?;
        for partition in &resources.slot_partitions {
            self.write_partition(&slot_file_name(partition), &partition.slots)
                .await?;
        }

        // 所有分區寫完之後才產生 manifest
        let transaction_time = self.transaction_time.unwrap_or_else(Utc::now);
        let manifest = ManifestBuilder::new(self.config.generator.base_url.clone())
            .build(&resources.slot_partitions, transaction_time);

        let json = serde_json::to_string_pretty(&manifest)?;
        self.storage.write_file(MANIFEST_FILE, json.as_bytes()).await?;
        tracing::info!(
            "📑 Wrote manifest {} listing {} outputs",
            MANIFEST_FILE,
            manifest.output.len()
        );

        Ok(manifest)
    }
}
