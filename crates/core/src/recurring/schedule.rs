//! Schedule arithmetic for recurring templates.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::types::{DayRule, Frequency};

/// When and how often a template fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    /// Firing cadence.
    pub frequency: Frequency,
    /// First eligible date.
    pub start_date: NaiveDate,
    /// Last eligible date, inclusive; open-ended when `None`.
    pub end_date: Option<NaiveDate>,
    /// Day anchor for month-based frequencies. Defaults to the start
    /// date's day of month, clamped to short months.
    pub day_rule: Option<DayRule>,
}

impl Schedule {
    /// Creates an open-ended schedule.
    #[must_use]
    pub fn new(frequency: Frequency, start_date: NaiveDate) -> Self {
        Self {
            frequency,
            start_date,
            end_date: None,
            day_rule: None,
        }
    }

    /// Sets the inclusive end date.
    #[must_use]
    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Sets the day-of-month anchor.
    #[must_use]
    pub fn on(mut self, rule: DayRule) -> Self {
        self.day_rule = Some(rule);
        self
    }

    /// The first date the schedule fires on.
    #[must_use]
    pub fn first_date(&self) -> NaiveDate {
        match self.frequency {
            Frequency::Daily | Frequency::Weekly => self.start_date,
            Frequency::Monthly | Frequency::Quarterly | Frequency::Yearly => {
                apply_day_rule(self.start_date, self.effective_rule())
            }
        }
    }

    /// The date after `current`, or `None` when past the end date.
    ///
    /// Month-based frequencies re-anchor to the day rule each step, so
    /// a month-end schedule lands on Feb 29 and comes back to Mar 31
    /// instead of drifting to the shortest month seen.
    #[must_use]
    pub fn next_after(&self, current: NaiveDate) -> Option<NaiveDate> {
        let next = match self.frequency {
            Frequency::Daily => current.checked_add_days(Days::new(1))?,
            Frequency::Weekly => current.checked_add_days(Days::new(7))?,
            Frequency::Monthly => self.add_months(current, 1)?,
            Frequency::Quarterly => self.add_months(current, 3)?,
            Frequency::Yearly => self.add_months(current, 12)?,
        };
        match self.end_date {
            Some(end) if next > end => None,
            _ => Some(next),
        }
    }

    fn add_months(&self, current: NaiveDate, months: u32) -> Option<NaiveDate> {
        let shifted = current.checked_add_months(Months::new(months))?;
        Some(apply_day_rule(shifted, self.effective_rule()))
    }

    fn effective_rule(&self) -> DayRule {
        self.day_rule.unwrap_or(DayRule::Day(self.start_date.day()))
    }
}

fn apply_day_rule(within_month: NaiveDate, rule: DayRule) -> NaiveDate {
    let last = last_day_of_month(within_month);
    let day = match rule {
        DayRule::Day(d) => d.clamp(1, last.day()),
        DayRule::LastDay => last.day(),
    };
    // Day is clamped to the month length, so this always resolves.
    NaiveDate::from_ymd_opt(within_month.year(), within_month.month(), day).unwrap_or(last)
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn daily_and_weekly_step() {
        let daily = Schedule::new(Frequency::Daily, date(2024, 1, 1));
        assert_eq!(daily.next_after(date(2024, 1, 1)), Some(date(2024, 1, 2)));

        let weekly = Schedule::new(Frequency::Weekly, date(2024, 1, 1));
        assert_eq!(weekly.next_after(date(2024, 1, 1)), Some(date(2024, 1, 8)));
    }

    #[test]
    fn monthly_clamps_short_months_without_drifting() {
        let schedule = Schedule::new(Frequency::Monthly, date(2024, 1, 31));
        let feb = schedule.next_after(date(2024, 1, 31)).unwrap();
        assert_eq!(feb, date(2024, 2, 29));
        // Re-anchors to the 31st, not the 29th.
        let mar = schedule.next_after(feb).unwrap();
        assert_eq!(mar, date(2024, 3, 31));
    }

    #[test]
    fn last_day_rule_tracks_month_ends() {
        let schedule =
            Schedule::new(Frequency::Monthly, date(2024, 1, 1)).on(DayRule::LastDay);
        assert_eq!(schedule.first_date(), date(2024, 1, 31));
        assert_eq!(
            schedule.next_after(date(2024, 1, 31)),
            Some(date(2024, 2, 29))
        );
        assert_eq!(
            schedule.next_after(date(2024, 4, 30)),
            Some(date(2024, 5, 31))
        );
    }

    #[rstest]
    #[case(Frequency::Quarterly, date(2024, 1, 15), date(2024, 4, 15))]
    #[case(Frequency::Yearly, date(2024, 6, 30), date(2025, 6, 30))]
    fn longer_cadences(
        #[case] frequency: Frequency,
        #[case] from: NaiveDate,
        #[case] expected: NaiveDate,
    ) {
        let schedule = Schedule::new(frequency, from);
        assert_eq!(schedule.next_after(from), Some(expected));
    }

    #[test]
    fn end_date_exhausts_schedule() {
        let schedule =
            Schedule::new(Frequency::Monthly, date(2024, 1, 15)).until(date(2024, 3, 31));
        assert_eq!(
            schedule.next_after(date(2024, 2, 15)),
            Some(date(2024, 3, 15))
        );
        assert_eq!(schedule.next_after(date(2024, 3, 15)), None);
    }
}
