use crate::utils::error::{MarketError, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
    #[serde(default)]
    pub booked: bool,
}

/// A creator's bookable time slots, grouped by calendar day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvailabilitySchedule {
    #[serde(default)]
    pub time_zone: String,
    days: BTreeMap<NaiveDate, Vec<TimeSlot>>,
}

impl AvailabilitySchedule {
    pub fn new(time_zone: &str) -> Self {
        Self {
            time_zone: time_zone.to_string(),
            days: BTreeMap::new(),
        }
    }

    pub fn add_slot(&mut self, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Result<()> {
        if end <= start {
            return Err(MarketError::invalid_value(
                "slot",
                format!("{}-{}", start, end),
                "Slot must end after it starts",
            ));
        }
        let slots = self.days.entry(date).or_default();
        slots.push(TimeSlot {
            start,
            end,
            booked: false,
        });
        slots.sort_by_key(|slot| slot.start);
        Ok(())
    }

    pub fn slots_on(&self, date: NaiveDate) -> &[TimeSlot] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn open_slots_on(&self, date: NaiveDate) -> Vec<&TimeSlot> {
        self.slots_on(date).iter().filter(|slot| !slot.booked).collect()
    }

    /// Book the slot starting at `start` on `date`.
    pub fn book(&mut self, date: NaiveDate, start: NaiveTime, today: NaiveDate) -> Result<TimeSlot> {
        if !is_selectable(date, today) {
            return Err(MarketError::invalid_value(
                "date",
                date,
                "Cannot book a date in the past",
            ));
        }

        let slot = self
            .days
            .get_mut(&date)
            .and_then(|slots| slots.iter_mut().find(|slot| slot.start == start))
            .ok_or_else(|| MarketError::not_found("Time slot", format!("{} {}", date, start)))?;

        if slot.booked {
            return Err(MarketError::invalid_value(
                "slot",
                format!("{} {}", date, start),
                "This time slot is already booked",
            ));
        }

        slot.booked = true;
        tracing::info!("Booked slot {} {}-{}", date, slot.start, slot.end);
        Ok(slot.clone())
    }
}

/// The seven days (Sunday first) of the week `week_offset` weeks after the
/// week containing `today`. Earlier weeks are not reachable.
pub fn week_dates(today: NaiveDate, week_offset: u32) -> [NaiveDate; 7] {
    let days_since_sunday = i64::from(today.weekday().num_days_from_sunday());
    let start = today - Duration::days(days_since_sunday) + Duration::weeks(i64::from(week_offset));
    std::array::from_fn(|i| start + Duration::days(i as i64))
}

pub fn is_selectable(date: NaiveDate, today: NaiveDate) -> bool {
    date >= today
}

/// `14:00` -> `2:00 PM`.
pub fn format_time(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}
