//! The producer engines: recurring and allocation runs.
//!
//! Both produce ordinary journal entries and hand them to the posting
//! path; nothing here touches balances directly. Runs are idempotent:
//! recurring runs are keyed by (template, scheduled date), allocation
//! runs always post a fresh entry from a posted source.

use std::collections::HashMap;

use chrono::NaiveDate;
use ledgerkit_shared::{AllocationRuleId, JournalEntryId, RecurringTemplateId, TenantId};
use rust_decimal::Decimal;
use tracing::info;

use super::error::LedgerError;
use super::posting::{post_in, submit_draft_in};
use super::tenant::TenantLedger;
use super::GeneralLedger;
use crate::allocation::{allocate, AllocationError, AllocationRule};
use crate::journal::{
    DraftEntry, EntryType, JournalEntry, JournalError, JournalSource, JournalState, LineInput,
};
use crate::recurring::{RecurringError, RecurringTemplate, TemplateStatus, VarianceModel};

impl GeneralLedger {
    // ---- Recurring ----

    /// Registers a recurring template.
    pub fn add_template(
        &self,
        tenant: TenantId,
        template: RecurringTemplate,
    ) -> Result<RecurringTemplateId, LedgerError> {
        self.with_tenant(tenant, |ledger| {
            if template.variance == VarianceModel::Fixed {
                for (index, line) in template.lines.iter().enumerate() {
                    if line.amount.is_none() {
                        return Err(RecurringError::MissingAmount(index + 1).into());
                    }
                }
            }
            let id = template.id;
            ledger.templates.insert(id, template);
            Ok(id)
        })
    }

    /// Pauses an active template.
    pub fn pause_template(
        &self,
        tenant: TenantId,
        template: RecurringTemplateId,
    ) -> Result<(), LedgerError> {
        self.set_template_status(tenant, template, TemplateStatus::Paused)
    }

    /// Resumes a paused template.
    pub fn resume_template(
        &self,
        tenant: TenantId,
        template: RecurringTemplateId,
    ) -> Result<(), LedgerError> {
        self.set_template_status(tenant, template, TemplateStatus::Active)
    }

    /// Cancels a template permanently.
    pub fn cancel_template(
        &self,
        tenant: TenantId,
        template: RecurringTemplateId,
    ) -> Result<(), LedgerError> {
        self.set_template_status(tenant, template, TemplateStatus::Cancelled)
    }

    fn set_template_status(
        &self,
        tenant: TenantId,
        template: RecurringTemplateId,
        status: TemplateStatus,
    ) -> Result<(), LedgerError> {
        self.with_tenant(tenant, |ledger| {
            let template = ledger
                .templates
                .get_mut(&template)
                .ok_or(RecurringError::TemplateNotFound(template))?;
            template.status = status;
            Ok(())
        })
    }

    /// Runs every fixed template that is due, catching up missed
    /// dates.
    ///
    /// Each (template, scheduled date) fires at most once, so a
    /// retried run after a failure never double-books. Parameterized
    /// templates are never fired from here.
    pub fn run_due(&self, tenant: TenantId) -> Result<Vec<JournalEntryId>, LedgerError> {
        let today = self.clock().today();
        let now = self.clock().now();
        self.with_tenant(tenant, |ledger| {
            let due: Vec<RecurringTemplateId> = ledger
                .templates
                .values()
                .filter(|t| {
                    t.status == TemplateStatus::Active
                        && t.variance == VarianceModel::Fixed
                        && t.next_run_date <= today
                })
                .map(|t| t.id)
                .collect();

            let mut produced = Vec::new();
            for template_id in due {
                loop {
                    let Some(template) = ledger.templates.get(&template_id) else {
                        break;
                    };
                    if template.status != TemplateStatus::Active || template.next_run_date > today {
                        break;
                    }
                    let scheduled = template.next_run_date;

                    if !ledger.recurring_runs.contains_key(&(template_id, scheduled)) {
                        let entry =
                            instantiate_fixed(ledger, now, template_id, scheduled)?;
                        produced.push(entry);
                    }

                    let Some(template) = ledger.templates.get_mut(&template_id) else {
                        break;
                    };
                    match template.schedule.next_after(scheduled) {
                        Some(next) => template.next_run_date = next,
                        None => {
                            template.status = TemplateStatus::Completed;
                            break;
                        }
                    }
                }
            }
            info!(tenant = %tenant, produced = produced.len(), "recurring run complete");
            Ok(produced)
        })
    }

    /// Runs a parameterized template for one scheduled date with
    /// caller-supplied amounts, one per template line.
    ///
    /// Re-running the same (template, date) returns the entry produced
    /// the first time.
    pub fn run_parameterized(
        &self,
        tenant: TenantId,
        template: RecurringTemplateId,
        scheduled: NaiveDate,
        amounts: &[Decimal],
    ) -> Result<JournalEntryId, LedgerError> {
        let now = self.clock().now();
        self.with_tenant(tenant, |ledger| {
            if let Some(&existing) = ledger.recurring_runs.get(&(template, scheduled)) {
                return Ok(existing);
            }

            let tpl = ledger
                .templates
                .get(&template)
                .ok_or(RecurringError::TemplateNotFound(template))?;
            if tpl.status != TemplateStatus::Active {
                return Err(RecurringError::TemplateNotActive(template).into());
            }
            if tpl.variance != VarianceModel::Parameterized {
                return Err(RecurringError::FixedTemplate(template).into());
            }
            if amounts.len() != tpl.lines.len() {
                return Err(RecurringError::AmountCountMismatch {
                    expected: tpl.lines.len(),
                    supplied: amounts.len(),
                }
                .into());
            }

            let lines = tpl
                .lines
                .iter()
                .zip(amounts)
                .map(|(line, &amount)| template_line_input(line, amount))
                .collect();
            let draft = build_template_draft(tpl, scheduled, lines);
            let auto_post = tpl.auto_post;

            let entry = submit_draft_in(ledger, now, draft)?;
            ledger.recurring_runs.insert((template, scheduled), entry.id);
            if auto_post {
                post_in(ledger, now, entry.id, false)?;
            }
            Ok(entry.id)
        })
    }

    // ---- Allocation ----

    /// Registers an allocation rule after structural validation.
    pub fn add_allocation_rule(
        &self,
        tenant: TenantId,
        rule: AllocationRule,
    ) -> Result<AllocationRuleId, LedgerError> {
        self.with_tenant(tenant, |ledger| {
            rule.validate()?;
            let id = rule.id;
            ledger.rules.insert(id, rule);
            Ok(id)
        })
    }

    /// Runs an allocation rule over a posted source entry.
    ///
    /// The source amount is the net base movement of the source
    /// entry's lines on the rule's source account (restricted by the
    /// rule's dimension filter). The produced entry moves that amount
    /// off the source account onto the targets and posts immediately.
    pub fn run_allocation(
        &self,
        tenant: TenantId,
        rule: AllocationRuleId,
        source_entry: JournalEntryId,
        posting_date: NaiveDate,
        vars: &HashMap<String, Decimal>,
    ) -> Result<JournalEntry, LedgerError> {
        let now = self.clock().now();
        self.with_tenant(tenant, |ledger| {
            let rule = ledger
                .rules
                .get(&rule)
                .ok_or(AllocationError::RuleNotFound(rule))?
                .clone();
            if !rule.is_effective(posting_date) {
                return Err(AllocationError::RuleNotEffective(rule.id).into());
            }

            let source = ledger.entry(source_entry)?;
            if source.state != JournalState::Posted {
                return Err(JournalError::InvalidState {
                    required: "posted",
                    actual: source.state,
                }
                .into());
            }

            let source_amount: Decimal = source
                .lines
                .iter()
                .filter(|line| {
                    line.account_id == rule.source_account
                        && rule
                            .source_dimensions
                            .iter()
                            .all(|(k, v)| line.dimensions.get(k) == Some(v))
                })
                .map(|line| line.base_amount)
                .sum();
            if source_amount.is_zero() {
                return Err(AllocationError::ZeroSource.into());
            }

            let amounts = allocate(&rule, source_amount.abs(), ledger.base_scale(), vars)?;

            // A positive source (net debit) is credited away and the
            // targets debited; a credit-side source mirrors.
            let source_is_debit = source_amount > Decimal::ZERO;
            let mut lines = Vec::with_capacity(amounts.len() + 1);
            for (target, amount) in rule.targets.iter().zip(&amounts) {
                if amount.is_zero() {
                    continue;
                }
                let mut line = if source_is_debit {
                    LineInput::debit(target.account_id, *amount)
                } else {
                    LineInput::credit(target.account_id, *amount)
                };
                line.dimensions = target.dimensions.clone();
                lines.push(line);
            }
            if source_is_debit {
                lines.push(LineInput::credit(rule.source_account, source_amount.abs()));
            } else {
                lines.push(LineInput::debit(rule.source_account, source_amount.abs()));
            }

            let draft = DraftEntry::manual(
                posting_date,
                &format!("Allocation run: {}", rule.name),
                lines,
            )
            .with_source(JournalSource::Allocation);

            let entry = submit_draft_in(ledger, now, draft)?;
            let posted = post_in(ledger, now, entry.id, false)?;
            info!(
                tenant = %tenant,
                rule = %rule.id,
                source = %source_entry,
                amount = %source_amount,
                "allocation posted"
            );
            Ok(posted)
        })
    }
}

fn instantiate_fixed(
    ledger: &mut TenantLedger,
    now: chrono::DateTime<chrono::Utc>,
    template_id: RecurringTemplateId,
    scheduled: NaiveDate,
) -> Result<JournalEntryId, LedgerError> {
    let template = ledger
        .templates
        .get(&template_id)
        .ok_or(RecurringError::TemplateNotFound(template_id))?;

    let mut lines = Vec::with_capacity(template.lines.len());
    for (index, line) in template.lines.iter().enumerate() {
        let amount = line.amount.ok_or(RecurringError::MissingAmount(index + 1))?;
        lines.push(template_line_input(line, amount));
    }
    let draft = build_template_draft(template, scheduled, lines);
    let auto_post = template.auto_post;

    let entry = submit_draft_in(ledger, now, draft)?;
    ledger
        .recurring_runs
        .insert((template_id, scheduled), entry.id);
    if auto_post {
        post_in(ledger, now, entry.id, false)?;
    }
    Ok(entry.id)
}

fn template_line_input(line: &crate::recurring::TemplateLine, amount: Decimal) -> LineInput {
    let mut input = match line.entry_type {
        EntryType::Debit => LineInput::debit(line.account_id, amount),
        EntryType::Credit => LineInput::credit(line.account_id, amount),
    };
    input.currency = line.currency.clone();
    input.description = line.description.clone();
    input.dimensions = line.dimensions.clone();
    input
}

fn build_template_draft(
    template: &RecurringTemplate,
    scheduled: NaiveDate,
    lines: Vec<LineInput>,
) -> DraftEntry {
    let mut draft = DraftEntry::manual(scheduled, &template.description, lines)
        .with_source(JournalSource::Recurring);
    draft.currency = template.currency.clone();
    draft
}
