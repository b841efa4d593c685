use chrono::{DateTime, Datelike, FixedOffset};
use std::collections::BTreeMap;

use crate::domain::model::{Slot, SlotPartition};

/// ISO-8601 week key of a timestamp's local date, e.g. `2021-W09`.
///
/// The year is the ISO week-year, so 2021-01-01 belongs to `2020-W53`.
pub fn week_key(timestamp: &DateTime<FixedOffset>) -> String {
    let week = timestamp.iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}

/// Group slots by the ISO week of their start. Keys sort chronologically and
/// slots keep their input order within a week.
pub fn partition_by_week(slots: Vec<Slot>) -> Vec<SlotPartition> {
    let mut weeks: BTreeMap<String, Vec<Slot>> = BTreeMap::new();
    for slot in slots {
        weeks.entry(week_key(&slot.start)).or_default().push(slot);
    }

    weeks
        .into_iter()
        .map(|(week, slots)| SlotPartition {
            week: Some(week),
            slots,
        })
        .collect()
}

pub fn partition_slots(slots: Vec<Slot>, by_week: bool) -> Vec<SlotPartition> {
    if by_week {
        partition_by_week(slots)
    } else if slots.is_empty() {
        Vec::new()
    } else {
        vec![SlotPartition { week: None, slots }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Reference, ResourceType, SlotStatus};
    use std::collections::HashSet;

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    fn slot(id: &str, start: &str, end: &str) -> Slot {
        Slot {
            id: id.to_string(),
            schedule: Reference::to(ResourceType::Schedule, "s"),
            status: SlotStatus::Free,
            start: at(start),
            end: at(end),
            extension: vec![],
        }
    }

    #[test]
    fn test_week_key_uses_iso_week_year() {
        assert_eq!(week_key(&at("2021-03-01T09:00:00-05:00")), "2021-W09");
        assert_eq!(week_key(&at("2021-01-01T09:00:00-05:00")), "2020-W53");
        assert_eq!(week_key(&at("2024-12-30T09:00:00-05:00")), "2025-W01");
        assert_eq!(week_key(&at("2021-01-04T09:00:00-05:00")), "2021-W01");
    }

    #[test]
    fn test_week_key_uses_local_date() {
        // Sunday evening in New York is already Monday in UTC.
        assert_eq!(week_key(&at("2021-03-07T21:00:00-05:00")), "2021-W09");
    }

    #[test]
    fn test_partition_is_a_set_partition() {
        let slots = vec![
            slot("0", "2021-03-01T09:00:00-05:00", "2021-03-01T18:00:00-05:00"),
            slot("1", "2021-03-07T09:00:00-05:00", "2021-03-07T18:00:00-05:00"),
            slot("2", "2021-03-08T09:00:00-05:00", "2021-03-08T18:00:00-05:00"),
            slot("3", "2021-03-15T09:00:00-05:00", "2021-03-15T18:00:00-05:00"),
            slot("4", "2021-03-02T09:00:00-05:00", "2021-03-02T18:00:00-05:00"),
        ];

        let partitions = partition_by_week(slots);
        let keys: Vec<&str> = partitions.iter().filter_map(|p| p.week.as_deref()).collect();
        assert_eq!(keys, vec!["2021-W09", "2021-W10", "2021-W11"]);

        let mut seen = HashSet::new();
        for partition in &partitions {
            for slot in &partition.slots {
                assert!(seen.insert(slot.id.clone()), "slot {} in two partitions", slot.id);
            }
        }
        assert_eq!(seen.len(), 5);

        let first: Vec<&str> = partitions[0].slots.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(first, vec!["0", "1", "4"]);
    }

    #[test]
    fn test_slot_spanning_weeks_goes_by_start() {
        let slots = vec![slot(
            "late",
            "2021-03-07T23:00:00-05:00",
            "2021-03-08T01:00:00-05:00",
        )];
        let partitions = partition_by_week(slots);
        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[0].week.as_deref(), Some("2021-W09"));
    }

    #[test]
    fn test_partitioning_disabled() {
        let slots = vec![
            slot("0", "2021-03-01T09:00:00-05:00", "2021-03-01T18:00:00-05:00"),
            slot("1", "2021-03-15T09:00:00-05:00", "2021-03-15T18:00:00-05:00"),
        ];
        let partitions = partition_slots(slots, false);
        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[0].week, None);
        assert_eq!(partitions[0].slots.len(), 2);

        assert!(partition_slots(Vec::new(), false).is_empty());
        assert!(partition_slots(Vec::new(), true).is_empty());
    }
}
