// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, Duration, NaiveDate};

use crate::errors::CoreError;
use crate::models::Frequency;
use crate::utils::clamp_to_month;

/// Validated repeat rule for a recurring obligation. Raw frequency/anchor-day
/// fields only become a `Cadence` after the range checks pass, so the
/// computation below never sees a malformed rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Anchored to a weekday, 0 = Sunday .. 6 = Saturday.
    Weekly { weekday: u32 },
    /// Anchored to a day of month in 1..=31; short months pull it back.
    Monthly { day: u32 },
    /// Anchored to the start date's month and day.
    Yearly,
}

impl Cadence {
    pub fn new(
        frequency: Frequency,
        day_of_month: Option<u32>,
        day_of_week: Option<u32>,
    ) -> Result<Self, CoreError> {
        match frequency {
            Frequency::Monthly => {
                let day = day_of_month.ok_or_else(|| {
                    CoreError::Validation("Monthly obligations require a day of month".into())
                })?;
                if !(1..=31).contains(&day) {
                    return Err(CoreError::Validation(format!(
                        "Day of month {} out of range 1..=31",
                        day
                    )));
                }
                Ok(Cadence::Monthly { day })
            }
            Frequency::Weekly => {
                let weekday = day_of_week.ok_or_else(|| {
                    CoreError::Validation("Weekly obligations require a day of week".into())
                })?;
                if weekday > 6 {
                    return Err(CoreError::Validation(format!(
                        "Day of week {} out of range 0..=6 (0 = Sunday)",
                        weekday
                    )));
                }
                Ok(Cadence::Weekly { weekday })
            }
            Frequency::Yearly => Ok(Cadence::Yearly),
        }
    }

    pub fn frequency(&self) -> Frequency {
        match self {
            Cadence::Weekly { .. } => Frequency::Weekly,
            Cadence::Monthly { .. } => Frequency::Monthly,
            Cadence::Yearly => Frequency::Yearly,
        }
    }

    pub fn day_of_month(&self) -> Option<u32> {
        match self {
            Cadence::Monthly { day } => Some(*day),
            _ => None,
        }
    }

    pub fn day_of_week(&self) -> Option<u32> {
        match self {
            Cadence::Weekly { weekday } => Some(*weekday),
            _ => None,
        }
    }
}

/// Next occurrence of a recurring obligation, date-only and pure.
///
/// A start strictly in the future is returned untouched. A start on or before
/// `today` recomputes forward from `today`: same-day matches roll a full cycle
/// (a Wednesday obligation checked on its own Wednesday answers next
/// Wednesday, an anniversary landing on today answers next year), and an
/// anchor day that overshoots a short month pulls back to that month's last
/// calendar day.
pub fn next_due(start: NaiveDate, cadence: &Cadence, today: NaiveDate) -> NaiveDate {
    if start > today {
        return start;
    }
    match *cadence {
        Cadence::Monthly { day } => {
            let mut year = today.year();
            let mut month = today.month();
            if today.day() >= day {
                month += 1;
                if month > 12 {
                    month = 1;
                    year += 1;
                }
            }
            clamp_to_month(year, month, day)
        }
        Cadence::Weekly { weekday } => {
            let mut ahead = weekday as i64 - today.weekday().num_days_from_sunday() as i64;
            if ahead <= 0 {
                ahead += 7;
            }
            today + Duration::days(ahead)
        }
        Cadence::Yearly => {
            let this_year = clamp_to_month(today.year(), start.month(), start.day());
            if this_year <= today {
                clamp_to_month(today.year() + 1, start.month(), start.day())
            } else {
                this_year
            }
        }
    }
}
