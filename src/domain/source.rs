//! Input side of the generator: the locations a run starts from.
//!
//! Two shapes feed the same pipeline. The built-in roster is a fixed list of
//! sample clinics with no availability of their own, so their slots come from
//! the configured date range. An availability file lists real-looking sites
//! with per-day slot counts, which become free/busy slot pairs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::utils::error::{Result, SchedError};

/// One entry of an availability file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Program-specific PIN, published as an external identifier.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub location: SourceAddress,
    #[serde(default)]
    pub contact: SourceContact,
    #[serde(default)]
    pub availability: Vec<AvailabilityDay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAddress {
    pub street: String,
    #[serde(default)]
    pub street_line_2: Option<String>,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    #[serde(default)]
    pub county: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceContact {
    #[serde(default)]
    pub info_phone: Option<String>,
    #[serde(default)]
    pub info_url: Option<String>,
    #[serde(default)]
    pub booking_url: Option<String>,
    #[serde(default)]
    pub booking_phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityDay {
    pub date: NaiveDate,
    pub available_slots: u32,
    pub total_slots: u32,
}

impl AvailabilityDay {
    pub fn busy_slots(&self) -> u32 {
        self.total_slots - self.available_slots
    }
}

impl SourceLocation {
    pub fn validate(&self, index: usize) -> Result<()> {
        let fail = |reason: String| SchedError::SourceRecordError { index, reason };

        if self.name.trim().is_empty() {
            return Err(fail("location name is empty".to_string()));
        }
        if self.location.street.trim().is_empty() || self.location.city.trim().is_empty() {
            return Err(fail(format!("'{}' has an incomplete address", self.name)));
        }
        let mut dates = HashSet::with_capacity(self.availability.len());
        for day in &self.availability {
            if !dates.insert(day.date) {
                return Err(fail(format!(
                    "'{}' lists {} more than once",
                    self.name, day.date
                )));
            }
            if day.available_slots > day.total_slots {
                return Err(fail(format!(
                    "'{}' on {}: available_slots ({}) exceeds total_slots ({})",
                    self.name, day.date, day.available_slots, day.total_slots
                )));
            }
        }
        Ok(())
    }
}

/// Parse an availability file and check every record.
pub fn parse_availability(content: &str) -> Result<Vec<SourceLocation>> {
    let locations: Vec<SourceLocation> = serde_json::from_str(content)?;
    for (index, location) in locations.iter().enumerate() {
        location.validate(index)?;
    }
    Ok(locations)
}

const ROSTER: &[(&str, &str, &str, &str)] = &[
    ("Boston", "123 Summer St", "Boston", "02114"),
    ("Worcester", "123 West St", "Worcester", "01602"),
    ("Springfield", "123 Ash St", "Springfield", "01101"),
    ("Cambridge", "123 Arrow St", "Cambridge", "02139"),
    ("Lowell", "123 Peach St", "Lowell", "01851"),
    ("Brockton", "123 Oak St", "Brockton", "02301"),
    ("New Bedford", "123 Cyprus St", "New Bedford", "02740"),
    ("Lynn", "123 Cherry St", "Lynn", "01901"),
    ("Quincy", "123 Cranberry St", "Quincy", "02269"),
    ("Pittsfield", "123 Elm St", "Pittsfield", "01201"),
];

/// The ten sample clinics used when no availability file is given.
pub fn builtin_roster() -> Vec<SourceLocation> {
    ROSTER
        .iter()
        .map(|(label, street, city, zipcode)| SourceLocation {
            id: None,
            name: format!("SMART Vaccine Clinic {}", label),
            location: SourceAddress {
                street: street.to_string(),
                street_line_2: None,
                city: city.to_string(),
                state: "MA".to_string(),
                zipcode: zipcode.to_string(),
                county: None,
            },
            contact: SourceContact {
                info_phone: Some("000-000-0000".to_string()),
                ..SourceContact::default()
            },
            availability: Vec::new(),
        })
        .collect()
}
