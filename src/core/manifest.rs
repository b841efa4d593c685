use chrono::{DateTime, Utc};

use crate::domain::model::{Manifest, OutputDescriptor, ResourceType, SlotPartition};

pub const LOCATIONS_FILE: &str = "locations.ndjson";
pub const SCHEDULES_FILE: &str = "schedules.ndjson";
pub const MANIFEST_FILE: &str = "$bulk-publish";

pub fn slot_file_name(partition: &SlotPartition) -> String {
    match &partition.week {
        Some(week) => format!("slots-{}.ndjson", week),
        None => "slots.ndjson".to_string(),
    }
}

pub struct ManifestBuilder {
    base_url: String,
}

impl ManifestBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn url(&self, file_name: &str) -> String {
        format!("{}{}", self.base_url, file_name)
    }

    /// Build the manifest once every slot partition is known.
    pub fn build(
        &self,
        slot_partitions: &[SlotPartition],
        transaction_time: DateTime<Utc>,
    ) -> Manifest {
        let mut output = Vec::with_capacity(2 + slot_partitions.len());
        output.push(OutputDescriptor {
            resource_type: ResourceType::Location,
            url: self.url(LOCATIONS_FILE),
        });
        output.push(OutputDescriptor {
            resource_type: ResourceType::Schedule,
            url: self.url(SCHEDULES_FILE),
        });
        output.extend(slot_partitions.iter().map(|partition| OutputDescriptor {
            resource_type: ResourceType::Slot,
            url: self.url(&slot_file_name(partition)),
        }));

        Manifest {
            transaction_time,
            request: self.url(MANIFEST_FILE),
            output,
            error: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const BASE: &str = "https://example.org/bulk/";

    fn partition(week: Option<&str>) -> SlotPartition {
        SlotPartition {
            week: week.map(str::to_string),
            slots: vec![],
        }
    }

    #[test]
    fn test_manifest_lists_fixed_and_slot_partitions() {
        let time = Utc.with_ymd_and_hms(2021, 3, 1, 12, 0, 0).unwrap();
        let partitions = vec![partition(Some("2021-W09")), partition(Some("2021-W10"))];

        let manifest = ManifestBuilder::new(BASE).build(&partitions, time);

        assert_eq!(manifest.output.len(), 2 + partitions.len());
        assert_eq!(manifest.request, "https://example.org/bulk/$bulk-publish");
        assert_eq!(manifest.output[0].resource_type, ResourceType::Location);
        assert_eq!(manifest.output[0].url, "https://example.org/bulk/locations.ndjson");
        assert_eq!(manifest.output[1].resource_type, ResourceType::Schedule);
        assert_eq!(manifest.output[3].resource_type, ResourceType::Slot);
        assert_eq!(manifest.output[3].url, "https://example.org/bulk/slots-2021-W10.ndjson");
        assert!(manifest.error.is_empty());
    }

    #[test]
    fn test_manifest_json_shape() {
        let time = Utc.with_ymd_and_hms(2021, 3, 1, 12, 0, 0).unwrap();
        let manifest = ManifestBuilder::new(BASE).build(&[partition(None)], time);

        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["transactionTime"], "2021-03-01T12:00:00Z");
        assert_eq!(json["output"][2]["type"], "Slot");
        assert_eq!(json["output"][2]["url"], "https://example.org/bulk/slots.ndjson");
        assert_eq!(json["error"], serde_json::json!([]));
    }
}
