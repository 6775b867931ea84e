use crate::api::dtos::requests::SlotEntry;
use crate::domain::models::slot::NewSlot;
use chrono::{Duration, NaiveDate, NaiveTime, Timelike};

const DEFAULT_DURATION_MIN: i64 = 60;

#[derive(Debug, PartialEq, Eq)]
pub enum SlotEntryError {
    MissingDate,
    MissingStart,
    InvalidTime,
    /// The explicit or defaulted end time would wrap past midnight, or the
    /// window is empty. Windows never span day boundaries.
    InvalidWindow,
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Normalizes one published slot entry into a canonical window.
///
/// Start time is truncated to HH:MM:00. A missing end time defaults to
/// start + 60 minutes. A missing or non-positive capacity defaults to 1.
pub fn normalize_entry(qari_id: i64, entry: &SlotEntry) -> Result<NewSlot, SlotEntryError> {
    let slot_date = entry.slot_date.ok_or(SlotEntryError::MissingDate)?;
    let start_raw = entry
        .start_time
        .as_deref()
        .ok_or(SlotEntryError::MissingStart)?;

    let start = parse_time(start_raw).ok_or(SlotEntryError::InvalidTime)?;
    let start = start.with_second(0).unwrap().with_nanosecond(0).unwrap();

    let end = match entry.end_time.as_deref() {
        Some(raw) => {
            let end = parse_time(raw).ok_or(SlotEntryError::InvalidTime)?;
            end.with_second(0).unwrap().with_nanosecond(0).unwrap()
        }
        None => {
            let (end, wrapped) =
                start.overflowing_add_signed(Duration::minutes(DEFAULT_DURATION_MIN));
            if wrapped != 0 {
                return Err(SlotEntryError::InvalidWindow);
            }
            end
        }
    };

    if end <= start {
        return Err(SlotEntryError::InvalidWindow);
    }

    let capacity = match entry.capacity {
        Some(c) if c > 0 => c,
        _ => 1,
    };

    Ok(NewSlot {
        qari_id,
        slot_date,
        start_time: start,
        end_time: end,
        capacity,
    })
}

/// First and last calendar day of the given month, or `None` for an
/// out-of-range month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next_first - Duration::days(1)))
}
