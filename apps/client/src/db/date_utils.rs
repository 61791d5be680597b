//! Date utilities for study-day handling.

use chrono::{FixedOffset, Local, NaiveDate, Offset};

/// The machine's current UTC offset, used to decide which calendar day an answer falls on.
pub fn local_offset() -> FixedOffset {
    Local::now().offset().fix()
}

/// Today's date on the local calendar.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
