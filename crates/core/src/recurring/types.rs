//! Recurring template types.

use std::collections::BTreeMap;

use ledgerkit_shared::{AccountId, RecurringTemplateId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::schedule::Schedule;
use crate::journal::EntryType;

/// How often a template fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every day.
    Daily,
    /// Every seven days.
    Weekly,
    /// Every month.
    Monthly,
    /// Every three months.
    Quarterly,
    /// Every twelve months.
    Yearly,
}

/// Day-of-period rule for month-based frequencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayRule {
    /// A fixed day of the month, clamped to the month's length.
    Day(u32),
    /// The last day of the month.
    LastDay,
}

/// Lifecycle state of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStatus {
    /// Eligible for scheduling.
    Active,
    /// Skipped by the scheduler until resumed.
    Paused,
    /// Schedule exhausted past its end date.
    Completed,
    /// Abandoned.
    Cancelled,
}

/// Whether line amounts are fixed in the template or supplied per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarianceModel {
    /// Template lines carry their amounts.
    Fixed,
    /// Amounts are supplied by the caller at each run; the scheduler
    /// never fires these automatically.
    Parameterized,
}

/// A journal line shape without a locked date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateLine {
    /// Account the instantiated line posts to.
    pub account_id: AccountId,
    /// Debit or credit.
    pub entry_type: EntryType,
    /// Fixed amount; `None` for parameterized templates.
    pub amount: Option<Decimal>,
    /// Line currency; entry currency when `None`.
    pub currency: Option<String>,
    /// Line memo carried onto each instance.
    pub description: Option<String>,
    /// Reporting tags carried onto each instance.
    pub dimensions: BTreeMap<String, String>,
}

impl TemplateLine {
    /// A fixed-amount debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self::fixed(account_id, EntryType::Debit, amount)
    }

    /// A fixed-amount credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self::fixed(account_id, EntryType::Credit, amount)
    }

    fn fixed(account_id: AccountId, entry_type: EntryType, amount: Decimal) -> Self {
        Self {
            account_id,
            entry_type,
            amount: Some(amount),
            currency: None,
            description: None,
            dimensions: BTreeMap::new(),
        }
    }

    /// An amount-less line for parameterized templates.
    #[must_use]
    pub fn parameterized(account_id: AccountId, entry_type: EntryType) -> Self {
        Self {
            account_id,
            entry_type,
            amount: None,
            currency: None,
            description: None,
            dimensions: BTreeMap::new(),
        }
    }
}

/// A recurring journal template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringTemplate {
    /// Opaque identifier.
    pub id: RecurringTemplateId,
    /// Display name.
    pub name: String,
    /// Description stamped onto each instantiated entry.
    pub description: String,
    /// Firing schedule.
    pub schedule: Schedule,
    /// Next date the scheduler will fire, while active.
    pub next_run_date: chrono::NaiveDate,
    /// Lifecycle state.
    pub status: TemplateStatus,
    /// Post instances immediately instead of leaving them as drafts.
    pub auto_post: bool,
    /// Fixed or parameterized amounts.
    pub variance: VarianceModel,
    /// Entry currency for instances; tenant base when `None`.
    pub currency: Option<String>,
    /// Line shapes.
    pub lines: Vec<TemplateLine>,
}

impl RecurringTemplate {
    /// Creates an active fixed-amount template starting at the
    /// schedule's start date.
    #[must_use]
    pub fn fixed(name: &str, description: &str, schedule: Schedule, lines: Vec<TemplateLine>) -> Self {
        let next_run_date = schedule.first_date();
        Self {
            id: RecurringTemplateId::new(),
            name: name.to_string(),
            description: description.to_string(),
            schedule,
            next_run_date,
            status: TemplateStatus::Active,
            auto_post: false,
            variance: VarianceModel::Fixed,
            currency: None,
            lines,
        }
    }

    /// Switches instances to post immediately.
    #[must_use]
    pub fn auto_posting(mut self) -> Self {
        self.auto_post = true;
        self
    }
}
