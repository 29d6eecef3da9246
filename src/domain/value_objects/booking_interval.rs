use chrono::{DateTime, Days, FixedOffset, LocalResult, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Half-open `[starts_at, ends_at)` interval. A checkout and a check-in that
/// share a boundary instant do not conflict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingInterval {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl BookingInterval {
    pub fn new(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Option<Self> {
        if starts_at < ends_at {
            Some(Self { starts_at, ends_at })
        } else {
            None
        }
    }

    pub fn overlaps(&self, other: &BookingInterval) -> bool {
        self.starts_at < other.ends_at && self.ends_at > other.starts_at
    }
}

/// Next local midnight after `at` in the reference timezone, expressed in UTC.
/// Used as the default payment deadline for same-day bookings.
pub fn end_of_local_day(at: DateTime<Utc>, tz: FixedOffset) -> DateTime<Utc> {
    let local_date = at.with_timezone(&tz).date_naive();
    let next_midnight = local_date
        .checked_add_days(Days::new(1))
        .unwrap_or(local_date)
        .and_time(NaiveTime::MIN);

    match tz.from_local_datetime(&next_midnight) {
        LocalResult::Single(deadline) => deadline.with_timezone(&Utc),
        // Fixed offsets have no gaps or folds; keep the input as a safe floor.
        _ => at,
    }
}
