use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const BOOKING_DEEP_LINK_URL: &str =
    "http://fhir-registry.smarthealthit.org/StructureDefinition/booking-deep-link";
pub const BOOKING_PHONE_URL: &str =
    "http://fhir-registry.smarthealthit.org/StructureDefinition/booking-phone";
pub const SLOT_CAPACITY_URL: &str =
    "http://fhir-registry.smarthealthit.org/StructureDefinition/slot-capacity";
pub const SERVICE_TYPE_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/service-type";
pub const SERVICE_TYPE_DETAILED_SYSTEM: &str =
    "http://fhir-registry.smarthealthit.org/CodeSystem/service-type";
pub const VTRCKS_SYSTEM: &str = "https://cdc.gov/vaccines/programs/vtrcks";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Location,
    Schedule,
    Slot,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Location => "Location",
            ResourceType::Schedule => "Schedule",
            ResourceType::Slot => "Slot",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that can be written as one NDJSON line.
pub trait Resource: Serialize {
    const RESOURCE_TYPE: ResourceType;

    fn id(&self) -> &str;

    fn reference(&self) -> Reference {
        Reference::to(Self::RESOURCE_TYPE, self.id())
    }
}

/// Adds the `resourceType` discriminator in front of a resource's own fields.
#[derive(Serialize)]
pub struct Tagged<'a, T: Resource> {
    #[serde(rename = "resourceType")]
    resource_type: ResourceType,
    #[serde(flatten)]
    resource: &'a T,
}

impl<'a, T: Resource> Tagged<'a, T> {
    pub fn new(resource: &'a T) -> Self {
        Self {
            resource_type: T::RESOURCE_TYPE,
            resource,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub reference: String,
}

impl Reference {
    pub fn to(resource_type: ResourceType, id: &str) -> Self {
        Self {
            reference: format!("{}/{}", resource_type, id),
        }
    }
}

/// Postal address. Field order is part of the hashed form, see `core::address_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub line: Vec<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactSystem {
    Phone,
    Url,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPoint {
    pub system: ContactSystem,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub system: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub telecom: Vec<ContactPoint>,
    pub address: Address,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
}

impl Resource for Location {
    const RESOURCE_TYPE: ResourceType = ResourceType::Location;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    pub system: String,
    pub code: String,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeableConcept {
    pub coding: Vec<Coding>,
}

impl CodeableConcept {
    /// The fixed immunization classification every generated schedule carries.
    pub fn immunization() -> Self {
        Self {
            coding: vec![
                Coding {
                    system: SERVICE_TYPE_SYSTEM.to_string(),
                    code: "57".to_string(),
                    display: "Immunization".to_string(),
                },
                Coding {
                    system: SERVICE_TYPE_DETAILED_SYSTEM.to_string(),
                    code: "covid19-immunization".to_string(),
                    display: "COVID-19 Immunization Appointment".to_string(),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    pub service_type: Vec<CodeableConcept>,
    /// Exactly one owning location.
    pub actor: [Reference; 1],
}

impl Schedule {
    pub fn location(&self) -> &Reference {
        &self.actor[0]
    }
}

impl Resource for Schedule {
    const RESOURCE_TYPE: ResourceType = ResourceType::Schedule;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Free,
    Busy,
}

/// Slot extensions understood by the bulk-publish format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawExtension", into = "RawExtension")]
pub enum Extension {
    BookingDeepLink(String),
    BookingPhone(String),
    SlotCapacity(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExtension {
    url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value_integer: Option<u32>,
}

impl From<Extension> for RawExtension {
    fn from(ext: Extension) -> Self {
        let mut raw = RawExtension {
            url: String::new(),
            value_url: None,
            value_string: None,
            value_integer: None,
        };
        match ext {
            Extension::BookingDeepLink(link) => {
                raw.url = BOOKING_DEEP_LINK_URL.to_string();
                raw.value_url = Some(link);
            }
            Extension::BookingPhone(phone) => {
                raw.url = BOOKING_PHONE_URL.to_string();
                raw.value_string = Some(phone);
            }
            Extension::SlotCapacity(capacity) => {
                raw.url = SLOT_CAPACITY_URL.to_string();
                raw.value_integer = Some(capacity);
            }
        }
        raw
    }
}

impl TryFrom<RawExtension> for Extension {
    type Error = String;

    fn try_from(raw: RawExtension) -> std::result::Result<Self, Self::Error> {
        match (raw.url.as_str(), raw.value_url, raw.value_string, raw.value_integer) {
            (BOOKING_DEEP_LINK_URL, Some(link), _, _) => Ok(Extension::BookingDeepLink(link)),
            (BOOKING_PHONE_URL, _, Some(phone), _) => Ok(Extension::BookingPhone(phone)),
            (SLOT_CAPACITY_URL, _, _, Some(capacity)) => Ok(Extension::SlotCapacity(capacity)),
            (url, ..) => Err(format!("unsupported or incomplete slot extension: {}", url)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: String,
    pub schedule: Reference,
    pub status: SlotStatus,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}

impl Slot {
    pub fn capacity(&self) -> Option<u32> {
        self.extension.iter().find_map(|ext| match ext {
            Extension::SlotCapacity(capacity) => Some(*capacity),
            _ => None,
        })
    }
}

impl Resource for Slot {
    const RESOURCE_TYPE: ResourceType = ResourceType::Slot;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Slots that share one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPartition {
    /// ISO week key (`YYYY-Www`); `None` when week partitioning is disabled.
    pub week: Option<String>,
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDescriptor {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub transaction_time: DateTime<Utc>,
    pub request: String,
    pub output: Vec<OutputDescriptor>,
    pub error: Vec<serde_json::Value>,
}

/// Everything one run produces, ready to be written.
#[derive(Debug, Clone)]
pub struct GeneratedResources {
    pub locations: Vec<Location>,
    pub schedules: Vec<Schedule>,
    pub slot_partitions: Vec<SlotPartition>,
}

impl GeneratedResources {
    pub fn slot_count(&self) -> usize {
        self.slot_partitions.iter().map(|p| p.slots.len()).sum()
    }
}
