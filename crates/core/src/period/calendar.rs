//! The fiscal calendar: period creation, lookup, and state
//! transitions.

use chrono::{Months, NaiveDate};
use ledgerkit_shared::PeriodId;

use super::error::PeriodError;
use super::types::{AccountingPeriod, PeriodState};

/// Per-tenant fiscal calendar.
///
/// Fiscal years are calendar years split into twelve monthly periods.
/// Periods are kept ordered by start date; creation never leaves gaps
/// or overlap because months partition the year.
#[derive(Debug, Default)]
pub struct FiscalCalendar {
    periods: Vec<AccountingPeriod>,
}

impl FiscalCalendar {
    /// Creates an empty calendar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the twelve monthly periods of a fiscal year, all in
    /// state `future`.
    pub fn create_fiscal_year(&mut self, year: i32) -> Result<Vec<PeriodId>, PeriodError> {
        if self.periods.iter().any(|p| p.fiscal_year == year) {
            return Err(PeriodError::FiscalYearExists(year));
        }

        let mut ids = Vec::with_capacity(12);
        for month in 1..=12u32 {
            let start = NaiveDate::from_ymd_opt(year, month, 1)
                .ok_or(PeriodError::FiscalYearExists(year))?;
            let end = start
                .checked_add_months(Months::new(1))
                .and_then(|next| next.pred_opt())
                .ok_or(PeriodError::FiscalYearExists(year))?;

            let period = AccountingPeriod {
                id: PeriodId::new(),
                fiscal_year: year,
                period_number: month,
                start_date: start,
                end_date: end,
                state: PeriodState::Future,
            };
            ids.push(period.id);
            self.periods.push(period);
        }
        self.periods.sort_by_key(|p| p.start_date);
        Ok(ids)
    }

    /// Opens every future period whose start date has arrived.
    /// Returns how many periods were opened.
    pub fn advance_to(&mut self, today: NaiveDate) -> usize {
        let mut opened = 0;
        for period in &mut self.periods {
            if period.state == PeriodState::Future && period.start_date <= today {
                period.state = PeriodState::Open;
                opened += 1;
            }
        }
        opened
    }

    /// All periods in calendar order.
    #[must_use]
    pub fn list(&self) -> &[AccountingPeriod] {
        &self.periods
    }

    /// Fetches a period by id.
    pub fn get(&self, id: PeriodId) -> Result<&AccountingPeriod, PeriodError> {
        self.periods
            .iter()
            .find(|p| p.id == id)
            .ok_or(PeriodError::PeriodNotFound)
    }

    /// Finds the period containing a date.
    pub fn find_by_date(&self, date: NaiveDate) -> Result<&AccountingPeriod, PeriodError> {
        self.periods
            .iter()
            .find(|p| p.contains(date))
            .ok_or(PeriodError::NoPeriodForDate(date))
    }

    /// The period immediately preceding the given one, if any.
    #[must_use]
    pub fn previous(&self, id: PeriodId) -> Option<&AccountingPeriod> {
        let index = self.periods.iter().position(|p| p.id == id)?;
        index.checked_sub(1).map(|i| &self.periods[i])
    }

    /// The period immediately following the given one, if any.
    #[must_use]
    pub fn next_after(&self, id: PeriodId) -> Option<&AccountingPeriod> {
        let index = self.periods.iter().position(|p| p.id == id)?;
        self.periods.get(index + 1)
    }

    /// Resolves the open period containing a posting date.
    ///
    /// Fails with [`PeriodError::PeriodNotOpen`] when the period exists
    /// but is not accepting postings.
    pub fn ensure_postable(&self, date: NaiveDate) -> Result<&AccountingPeriod, PeriodError> {
        let period = self.find_by_date(date)?;
        if !period.state.accepts_postings() {
            return Err(PeriodError::PeriodNotOpen {
                label: period.label(),
                state: period.state,
            });
        }
        Ok(period)
    }

    /// Moves an open period into `closing`.
    pub fn begin_close(&mut self, id: PeriodId) -> Result<(), PeriodError> {
        let period = self.get_mut(id)?;
        match period.state {
            PeriodState::Open => {
                period.state = PeriodState::Closing;
                Ok(())
            }
            PeriodState::Closed | PeriodState::Locked => {
                Err(PeriodError::PeriodAlreadyClosed(period.label()))
            }
            from => Err(PeriodError::InvalidTransition {
                label: period.label(),
                from,
                to: PeriodState::Closing,
            }),
        }
    }

    /// Completes a close: `closing` becomes `closed`.
    pub fn complete_close(&mut self, id: PeriodId) -> Result<(), PeriodError> {
        self.transition(id, PeriodState::Closing, PeriodState::Closed)
    }

    /// Aborts a failed close: `closing` returns to `open`.
    pub fn abort_close(&mut self, id: PeriodId) -> Result<(), PeriodError> {
        self.transition(id, PeriodState::Closing, PeriodState::Open)
    }

    /// Reopens a closed period.
    pub fn reopen(&mut self, id: PeriodId) -> Result<(), PeriodError> {
        let period = self.get_mut(id)?;
        match period.state {
            PeriodState::Closed => {
                period.state = PeriodState::Open;
                Ok(())
            }
            PeriodState::Locked => Err(PeriodError::PeriodLocked(period.label())),
            _ => Err(PeriodError::PeriodNotClosed(period.label())),
        }
    }

    /// Permanently seals a closed period.
    pub fn lock(&mut self, id: PeriodId) -> Result<(), PeriodError> {
        let period = self.get_mut(id)?;
        match period.state {
            PeriodState::Closed => {
                period.state = PeriodState::Locked;
                Ok(())
            }
            PeriodState::Locked => Err(PeriodError::PeriodLocked(period.label())),
            _ => Err(PeriodError::PeriodNotClosed(period.label())),
        }
    }

    fn transition(
        &mut self,
        id: PeriodId,
        expected: PeriodState,
        to: PeriodState,
    ) -> Result<(), PeriodError> {
        let period = self.get_mut(id)?;
        if period.state != expected {
            return Err(PeriodError::InvalidTransition {
                label: period.label(),
                from: period.state,
                to,
            });
        }
        period.state = to;
        Ok(())
    }

    fn get_mut(&mut self, id: PeriodId) -> Result<&mut AccountingPeriod, PeriodError> {
        self.periods
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(PeriodError::PeriodNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fiscal_year_partitions_without_gaps() {
        let mut calendar = FiscalCalendar::new();
        calendar.create_fiscal_year(2024).unwrap();

        let periods = calendar.list();
        assert_eq!(periods.len(), 12);
        assert_eq!(periods[0].start_date, date(2024, 1, 1));
        assert_eq!(periods[0].end_date, date(2024, 1, 31));
        assert_eq!(periods[1].start_date, date(2024, 2, 1));
        assert_eq!(periods[1].end_date, date(2024, 2, 29)); // leap year
        assert_eq!(periods[11].end_date, date(2024, 12, 31));

        for pair in periods.windows(2) {
            assert_eq!(pair[0].end_date.succ_opt().unwrap(), pair[1].start_date);
        }
    }

    #[test]
    fn duplicate_fiscal_year_rejected() {
        let mut calendar = FiscalCalendar::new();
        calendar.create_fiscal_year(2024).unwrap();
        assert!(matches!(
            calendar.create_fiscal_year(2024),
            Err(PeriodError::FiscalYearExists(2024))
        ));
    }

    #[test]
    fn advance_opens_started_periods_only() {
        let mut calendar = FiscalCalendar::new();
        calendar.create_fiscal_year(2024).unwrap();

        assert_eq!(calendar.advance_to(date(2024, 2, 15)), 2);
        let periods = calendar.list();
        assert_eq!(periods[0].state, PeriodState::Open);
        assert_eq!(periods[1].state, PeriodState::Open);
        assert_eq!(periods[2].state, PeriodState::Future);

        // Idempotent.
        assert_eq!(calendar.advance_to(date(2024, 2, 15)), 0);
    }

    #[test]
    fn posting_gate_rejects_future_and_closed() {
        let mut calendar = FiscalCalendar::new();
        calendar.create_fiscal_year(2024).unwrap();
        calendar.advance_to(date(2024, 1, 1));

        assert!(calendar.ensure_postable(date(2024, 1, 15)).is_ok());
        assert!(matches!(
            calendar.ensure_postable(date(2024, 3, 15)),
            Err(PeriodError::PeriodNotOpen { .. })
        ));
        assert!(matches!(
            calendar.ensure_postable(date(2023, 12, 31)),
            Err(PeriodError::NoPeriodForDate(_))
        ));
    }

    #[test]
    fn close_reopen_lock_lifecycle() {
        let mut calendar = FiscalCalendar::new();
        calendar.create_fiscal_year(2024).unwrap();
        calendar.advance_to(date(2024, 1, 1));
        let january = calendar.find_by_date(date(2024, 1, 15)).unwrap().id;

        calendar.begin_close(january).unwrap();
        assert!(matches!(
            calendar.ensure_postable(date(2024, 1, 15)),
            Err(PeriodError::PeriodNotOpen { .. })
        ));
        calendar.complete_close(january).unwrap();
        assert!(matches!(
            calendar.begin_close(january),
            Err(PeriodError::PeriodAlreadyClosed(_))
        ));

        calendar.reopen(january).unwrap();
        assert_eq!(calendar.get(january).unwrap().state, PeriodState::Open);

        calendar.begin_close(january).unwrap();
        calendar.complete_close(january).unwrap();
        calendar.lock(january).unwrap();
        assert!(matches!(
            calendar.reopen(january),
            Err(PeriodError::PeriodLocked(_))
        ));
    }

    #[test]
    fn abort_close_restores_open() {
        let mut calendar = FiscalCalendar::new();
        calendar.create_fiscal_year(2024).unwrap();
        calendar.advance_to(date(2024, 1, 1));
        let january = calendar.find_by_date(date(2024, 1, 15)).unwrap().id;

        calendar.begin_close(january).unwrap();
        calendar.abort_close(january).unwrap();
        assert!(calendar.ensure_postable(date(2024, 1, 15)).is_ok());
    }

    #[test]
    fn neighbors_follow_calendar_order() {
        let mut calendar = FiscalCalendar::new();
        calendar.create_fiscal_year(2024).unwrap();
        let january = calendar.find_by_date(date(2024, 1, 15)).unwrap().id;
        let february = calendar.find_by_date(date(2024, 2, 15)).unwrap().id;

        assert!(calendar.previous(january).is_none());
        assert_eq!(calendar.previous(february).unwrap().id, january);
        assert_eq!(calendar.next_after(january).unwrap().id, february);
    }
}
