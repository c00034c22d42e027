//! Card billing cycles
//!
//! A billing cycle is the inclusive window of purchase dates that land on one
//! card invoice. It is derived from the card's closing day and a reference
//! date; nothing about it is stored.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ContasError, ContasResult};

use super::period::{clamped_date, shift_month, DateRange};

/// Inclusive invoice window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingCycle {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

fn check_day(field: &str, day: u32) -> ContasResult<()> {
    if (1..=31).contains(&day) {
        Ok(())
    } else {
        Err(ContasError::InvalidConfiguration(format!(
            "{} must be between 1 and 31, got {}",
            field, day
        )))
    }
}

impl BillingCycle {
    /// Resolve the cycle containing `reference` for a card closing on `closing_day`
    ///
    /// On or before the closing day the cycle ends this month; after it the
    /// cycle ends next month. Days past the end of a short month clamp to its
    /// last day, independently for the start and end months. With closing
    /// days 29-31 this means the last day of a short month can sit at the end
    /// of one cycle and the start of the next.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use mendoza_contas::models::BillingCycle;
    ///
    /// let reference = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap();
    /// let cycle = BillingCycle::resolve(10, reference).unwrap();
    /// assert_eq!(cycle.start, NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
    /// assert_eq!(cycle.end, NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
    /// ```
    pub fn resolve(closing_day: u32, reference: NaiveDate) -> ContasResult<Self> {
        check_day("Closing day", closing_day)?;

        let (year, month) = (reference.year(), reference.month());

        let cycle = if reference.day() <= closing_day {
            let (prev_year, prev_month) = shift_month(year, month, -1);
            Self {
                start: clamped_date(prev_year, prev_month, closing_day + 1),
                end: clamped_date(year, month, closing_day),
            }
        } else {
            let (next_year, next_month) = shift_month(year, month, 1);
            Self {
                start: clamped_date(year, month, closing_day + 1),
                end: clamped_date(next_year, next_month, closing_day),
            }
        };

        Ok(cycle)
    }

    /// Check if a purchase date belongs to this cycle
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// The cycle right after this one
    pub fn next(&self, closing_day: u32) -> ContasResult<Self> {
        let day_after = self.end.succ_opt().ok_or_else(|| {
            ContasError::InvalidConfiguration("Cycle end is at the calendar limit".into())
        })?;
        Self::resolve(closing_day, day_after)
    }

    /// The cycle right before this one
    pub fn previous(&self, closing_day: u32) -> ContasResult<Self> {
        let day_before = self.start.pred_opt().ok_or_else(|| {
            ContasError::InvalidConfiguration("Cycle start is at the calendar limit".into())
        })?;
        Self::resolve(closing_day, day_before)
    }

    /// Payment due date for the invoice closing at the end of this cycle
    ///
    /// A due day on or before the closing day falls in the month after the
    /// close; a later due day falls in the closing month itself.
    pub fn due_date(&self, closing_day: u32, due_day: u32) -> ContasResult<NaiveDate> {
        check_day("Closing day", closing_day)?;
        check_day("Due day", due_day)?;

        let (year, month) = (self.end.year(), self.end.month());
        let (due_year, due_month) = if due_day <= closing_day {
            shift_month(year, month, 1)
        } else {
            (year, month)
        };
        Ok(clamped_date(due_year, due_month, due_day))
    }

    pub fn as_range(&self) -> DateRange {
        DateRange::new(self.start, self.end)
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_reference_before_closing_day() {
        let cycle = BillingCycle::resolve(10, date(2024, 2, 5)).unwrap();
        assert_eq!(cycle.start, date(2024, 1, 11));
        assert_eq!(cycle.end, date(2024, 2, 10));
    }

    #[test]
    fn test_reference_on_closing_day_stays_in_cycle() {
        let cycle = BillingCycle::resolve(10, date(2024, 2, 10)).unwrap();
        assert_eq!(cycle.end, date(2024, 2, 10));
        assert!(cycle.contains(date(2024, 2, 10)));
    }

    #[test]
    fn test_reference_after_closing_day() {
        let cycle = BillingCycle::resolve(10, date(2024, 2, 11)).unwrap();
        assert_eq!(cycle.start, date(2024, 2, 11));
        assert_eq!(cycle.end, date(2024, 3, 10));
    }

    #[test]
    fn test_short_month_clamps_end() {
        let cycle = BillingCycle::resolve(31, date(2024, 2, 15)).unwrap();
        assert_eq!(cycle.start, date(2024, 1, 31));
        assert_eq!(cycle.end, date(2024, 2, 29));

        let cycle = BillingCycle::resolve(30, date(2023, 2, 28)).unwrap();
        assert_eq!(cycle.start, date(2023, 1, 31));
        assert_eq!(cycle.end, date(2023, 2, 28));
    }

    #[test]
    fn test_year_rollover() {
        let cycle = BillingCycle::resolve(5, date(2024, 1, 3)).unwrap();
        assert_eq!(cycle.start, date(2023, 12, 6));
        assert_eq!(cycle.end, date(2024, 1, 5));

        let cycle = BillingCycle::resolve(5, date(2024, 12, 20)).unwrap();
        assert_eq!(cycle.start, date(2024, 12, 6));
        assert_eq!(cycle.end, date(2025, 1, 5));
    }

    #[test]
    fn test_start_never_after_end() {
        let mut day = date(2023, 12, 1);
        while day < date(2025, 3, 1) {
            for closing in 1..=31 {
                let cycle = BillingCycle::resolve(closing, day).unwrap();
                assert!(cycle.start <= cycle.end, "{} {}", closing, day);
                assert!(cycle.contains(day), "{} {}", closing, day);
            }
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_invalid_closing_day() {
        assert!(matches!(
            BillingCycle::resolve(0, date(2024, 2, 5)),
            Err(ContasError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            BillingCycle::resolve(32, date(2024, 2, 5)),
            Err(ContasError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_next_and_previous() {
        let cycle = BillingCycle::resolve(10, date(2024, 2, 5)).unwrap();
        let next = cycle.next(10).unwrap();
        assert_eq!(next.start, date(2024, 2, 11));
        assert_eq!(next.end, date(2024, 3, 10));
        assert_eq!(next.previous(10).unwrap(), cycle);
    }

    #[test]
    fn test_due_date() {
        let cycle = BillingCycle::resolve(10, date(2024, 2, 5)).unwrap();
        // Due after closing: same month as the close
        assert_eq!(cycle.due_date(10, 17).unwrap(), date(2024, 2, 17));
        // Due before closing: following month
        assert_eq!(cycle.due_date(10, 5).unwrap(), date(2024, 3, 5));

        let cycle = BillingCycle::resolve(25, date(2024, 1, 20)).unwrap();
        assert_eq!(cycle.due_date(25, 31).unwrap(), date(2024, 1, 31));
        assert!(cycle.due_date(25, 0).is_err());
    }
}
