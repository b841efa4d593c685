//! Calendar slot generation.
//!
//! Every schedule gets a list of day plans (from the configured date range or
//! from the location's own availability). Days are then walked in date order
//! and each plan expands into one window per day (coarse) or a run of
//! back-to-back appointment windows (fine). A split plan turns each window
//! into a free slot and a busy slot over the same interval.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime};
use std::collections::BTreeMap;

use crate::config::toml_config::{Granularity, IdSettings, SlotSettings, SourceKind};
use crate::core::builders::{build_slot, slot_id, SlotPosition};
use crate::core::ids::IdAllocator;
use crate::domain::model::{Extension, Schedule, Slot, SlotStatus};
use crate::domain::source::{SourceContact, SourceLocation};

/// Inclusive walk over `[start, end]`, one day per step.
#[derive(Debug, Clone)]
pub struct DateRange {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            next: Some(start),
            end,
        }
    }
}

impl Iterator for DateRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next.filter(|date| *date <= self.end)?;
        self.next = current.succ_opt();
        Some(current)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayCapacity {
    Open(u32),
    Split { free: u32, busy: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub capacity: DayCapacity,
}

/// Window `i`'s portion of a day total spread over `parts` windows. Earlier
/// windows take the remainder, so the portions always sum back to `total`.
fn share(total: u32, parts: usize, i: usize) -> u32 {
    let parts = parts as u32;
    if parts == 0 {
        return 0;
    }
    total / parts + u32::from((i as u32) < total % parts)
}

/// One schedule together with the days it should be populated for.
#[derive(Debug, Clone)]
pub struct ScheduleDays<'a> {
    pub schedule: &'a Schedule,
    pub contact: &'a SourceContact,
    pub days: Vec<DayPlan>,
}

pub struct SlotCalendar<'a> {
    slots: &'a SlotSettings,
    ids: &'a IdSettings,
    offset: FixedOffset,
}

impl<'a> SlotCalendar<'a> {
    pub fn new(slots: &'a SlotSettings, ids: &'a IdSettings, offset: FixedOffset) -> Self {
        Self { slots, ids, offset }
    }

    fn local_midnight(&self, date: NaiveDate) -> DateTime<FixedOffset> {
        let utc = date.and_time(NaiveTime::MIN)
            - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        DateTime::from_naive_utc_and_offset(utc, self.offset)
    }

    pub fn windows(&self, date: NaiveDate) -> Vec<TimeWindow> {
        let open = self.local_midnight(date)
            + Duration::minutes(i64::from(self.slots.open_offset_minutes));

        match self.slots.granularity {
            Granularity::Coarse => vec![TimeWindow {
                start: open,
                end: self.local_midnight(date)
                    + Duration::minutes(i64::from(self.slots.close_offset_minutes)),
            }],
            Granularity::Fine => {
                let visit = Duration::minutes(i64::from(self.slots.visit_minutes));
                (0..self.slots.slots_per_day)
                    .map(|i| {
                        let start = open + visit * i as i32;
                        TimeWindow {
                            start,
                            end: start + visit,
                        }
                    })
                    .collect()
            }
        }
    }

    /// Days a location is open. Availability files list their own days and
    /// replace the range entirely; a location with none gets no slots.
    pub fn plan_days(
        &self,
        source: &SourceLocation,
        kind: SourceKind,
        range: DateRange,
    ) -> Vec<DayPlan> {
        if kind == SourceKind::Availability {
            return source
                .availability
                .iter()
                .map(|day| DayPlan {
                    date: day.date,
                    capacity: DayCapacity::Split {
                        free: day.available_slots,
                        busy: day.busy_slots(),
                    },
                })
                .collect();
        }

        let capacity = match self.slots.booked {
            Some(booked) => DayCapacity::Split {
                free: self.slots.capacity.saturating_sub(booked),
                busy: booked,
            },
            None => DayCapacity::Open(self.slots.capacity),
        };
        range.map(|date| DayPlan { date, capacity }).collect()
    }

    pub fn slots_for_day(
        &self,
        schedule: &Schedule,
        contact: &SourceContact,
        day: &DayPlan,
        ids: &mut IdAllocator,
    ) -> Vec<Slot> {
        let windows = self.windows(day.date);
        let indexed = self.slots.granularity == Granularity::Fine;
        let parts = windows.len();
        let mut slots = Vec::with_capacity(windows.len() * 2);

        for (i, window) in windows.into_iter().enumerate() {
            let index = indexed.then_some(i);
            match day.capacity {
                DayCapacity::Open(capacity) => {
                    let position = SlotPosition {
                        date: day.date,
                        index,
                        split: None,
                    };
                    let id = slot_id(schedule, position, self.ids.strategy, ids);
                    let capacity = (!indexed).then_some(capacity);
                    let extension = self.free_extensions(contact, capacity, ids);
                    slots.push(build_slot(id, schedule, SlotStatus::Free, window, extension));
                }
                DayCapacity::Split { free, busy } => {
                    let position = SlotPosition {
                        date: day.date,
                        index,
                        split: Some(SlotStatus::Free),
                    };
                    let id = slot_id(schedule, position, self.ids.strategy, ids);
                    let free = share(free, parts, i);
                    let extension = self.free_extensions(contact, Some(free), ids);
                    slots.push(build_slot(id, schedule, SlotStatus::Free, window, extension));

                    let position = SlotPosition {
                        split: Some(SlotStatus::Busy),
                        ..position
                    };
                    let id = slot_id(schedule, position, self.ids.strategy, ids);
                    let extension = vec![Extension::SlotCapacity(share(busy, parts, i))];
                    slots.push(build_slot(id, schedule, SlotStatus::Busy, window, extension));
                }
            }
        }

        slots
    }

    fn free_extensions(
        &self,
        contact: &SourceContact,
        capacity: Option<u32>,
        ids: &mut IdAllocator,
    ) -> Vec<Extension> {
        let mut extension = Vec::with_capacity(3);
        if self.slots.booking_link {
            let link = match &contact.booking_url {
                Some(url) => url.clone(),
                None => format!("{}{}", self.slots.booking_link_base, ids.booking_id()),
            };
            extension.push(Extension::BookingDeepLink(link));
        }
        if self.slots.booking_phone {
            if let Some(phone) = &contact.booking_phone {
                extension.push(Extension::BookingPhone(phone.clone()));
            }
        }
        if let Some(capacity) = capacity {
            extension.push(Extension::SlotCapacity(capacity));
        }
        extension
    }

    /// Expand every schedule's days, walking dates in order so a day's slots
    /// for all schedules are emitted together.
    pub fn generate(&self, entries: &[ScheduleDays<'_>], ids: &mut IdAllocator) -> Vec<Slot> {
        let mut by_date: BTreeMap<NaiveDate, Vec<(usize, &DayPlan)>> = BTreeMap::new();
        for (entry_index, entry) in entries.iter().enumerate() {
            for day in &entry.days {
                by_date.entry(day.date).or_default().push((entry_index, day));
            }
        }

        let mut slots = Vec::new();
        for (_, plans) in by_date {
            for (entry_index, day) in plans {
                let entry = &entries[entry_index];
                slots.extend(self.slots_for_day(entry.schedule, entry.contact, day, ids));
            }
        }
        slots
    }
}
