use chrono::NaiveDate;

use crate::config::toml_config::{IdSettings, IdStrategy};
use crate::core::address_hash::address_id;
use crate::core::calendar::TimeWindow;
use crate::core::ids::IdAllocator;
use crate::domain::model::{
    Address, CodeableConcept, ContactPoint, ContactSystem, Extension, Identifier, Location,
    Resource, Schedule, Slot, SlotStatus, VTRCKS_SYSTEM,
};
use crate::domain::source::SourceLocation;
use crate::utils::error::Result;

pub fn build_address(source: &SourceLocation) -> Address {
    let loc = &source.location;
    Address {
        line: std::iter::once(loc.street.clone())
            .chain(loc.street_line_2.clone())
            .collect(),
        city: loc.city.clone(),
        state: loc.state.clone(),
        postal_code: loc.zipcode.clone(),
        district: loc.county.clone(),
    }
}

pub fn build_location(
    source: &SourceLocation,
    strategy: IdStrategy,
    ids: &mut IdAllocator,
) -> Result<Location> {
    let address = build_address(source);
    let id = match strategy {
        IdStrategy::Sequential => ids.resource_id(),
        IdStrategy::Derived => address_id(&address)?,
    };

    let telecom = [
        (ContactSystem::Phone, &source.contact.info_phone),
        (ContactSystem::Url, &source.contact.info_url),
    ]
    .into_iter()
    .filter_map(|(system, value)| {
        value.as_ref().map(|value| ContactPoint {
            system,
            value: value.clone(),
        })
    })
    .collect();

    let identifier = source
        .id
        .iter()
        .map(|pin| Identifier {
            system: VTRCKS_SYSTEM.to_string(),
            value: pin.clone(),
        })
        .collect();

    Ok(Location {
        id,
        name: source.name.clone(),
        telecom,
        address,
        identifier,
    })
}

pub fn build_schedule(
    location: &Location,
    settings: &IdSettings,
    ids: &mut IdAllocator,
) -> Schedule {
    let id = match settings.strategy {
        IdStrategy::Sequential => ids.resource_id(),
        IdStrategy::Derived => format!("{}-{}", settings.schedule_prefix, location.id),
    };

    Schedule {
        id,
        service_type: vec![CodeableConcept::immunization()],
        actor: [location.reference()],
    }
}

/// Where a slot sits within its schedule's day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPosition {
    pub date: NaiveDate,
    /// Appointment index within the day; `None` for a whole-day window.
    pub index: Option<usize>,
    /// Set when the window is split into a free/busy pair.
    pub split: Option<SlotStatus>,
}

pub fn slot_id(
    schedule: &Schedule,
    position: SlotPosition,
    strategy: IdStrategy,
    ids: &mut IdAllocator,
) -> String {
    match strategy {
        IdStrategy::Sequential => ids.resource_id(),
        IdStrategy::Derived => {
            let mut id = format!("{}-{}", schedule.id, position.date);
            if let Some(index) = position.index {
                id.push_str(&format!("-{}", index));
            }
            match position.split {
                Some(SlotStatus::Free) => id.push('f'),
                Some(SlotStatus::Busy) => id.push('b'),
                None => {}
            }
            id
        }
    }
}

pub fn build_slot(
    id: String,
    schedule: &Schedule,
    status: SlotStatus,
    window: TimeWindow,
    extension: Vec<Extension>,
) -> Slot {
    Slot {
        id,
        schedule: schedule.reference(),
        status,
        start: window.start,
        end: window.end,
        extension,
    }
}
