//! Recurring-transaction rollover.
//!
//! A pass selects every active template of a workspace whose next due date
//! has arrived, appends one ledger transaction per template dated at that
//! due date, then either advances the template by one step of its frequency
//! or deactivates it when the schedule is over. Overdue templates catch up
//! one step per pass.

mod schedule;

pub(crate) use schedule::next_occurrence;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::models::{RecurringTransaction, Transaction};

/// Where templates are read from and advanced.
pub(crate) trait TemplateStore {
    /// Active templates of the workspace with `next_due_date <= today`.
    fn list_active_due_before(
        &self,
        workspace_id: i64,
        today: NaiveDate,
    ) -> Result<Vec<RecurringTransaction>>;

    fn advance(
        &self,
        template_id: i64,
        next_due_date: NaiveDate,
        last_processed_at: DateTime<Utc>,
    ) -> Result<()>;

    fn deactivate(&self, template_id: i64, last_processed_at: DateTime<Utc>) -> Result<()>;
}

/// Append-only view of the ledger.
pub(crate) trait LedgerStore {
    fn append(&self, txn: &Transaction) -> Result<Transaction>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Advanced(NaiveDate),
    Deactivated,
}

/// One template handled by a pass.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Processed {
    pub(crate) template_id: i64,
    pub(crate) name: String,
    /// Date of the ledger transaction that was created.
    pub(crate) occurrence: NaiveDate,
    pub(crate) transaction_id: Option<i64>,
    pub(crate) outcome: Outcome,
}

/// The template that stopped a pass.
#[derive(Debug)]
pub(crate) struct Failure {
    pub(crate) template_id: Option<i64>,
    pub(crate) name: String,
    pub(crate) error: anyhow::Error,
}

#[derive(Debug, Default)]
pub(crate) struct RolloverReport {
    pub(crate) processed: Vec<Processed>,
    pub(crate) failure: Option<Failure>,
}

impl RolloverReport {
    /// Templates processed: transactions created plus deactivations.
    pub(crate) fn count(&self) -> usize {
        self.processed.len()
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Run one rollover pass for `workspace_id`.
///
/// Due dates are compared with the calendar date of `now` in its own time
/// zone; `last_processed_at` is stamped in UTC.
///
/// Records are handled one by one with no grouping: the first failure ends
/// the pass and is reported in `RolloverReport::failure`, while everything
/// processed before it stays committed. Only a failure to list the due
/// templates is returned as `Err`.
pub(crate) fn process_due<S, Tz>(
    store: &S,
    workspace_id: i64,
    now: DateTime<Tz>,
) -> Result<RolloverReport>
where
    S: TemplateStore + LedgerStore + ?Sized,
    Tz: TimeZone,
{
    let today = now.date_naive();
    let now = now.with_timezone(&Utc);
    let due = store
        .list_active_due_before(workspace_id, today)
        .with_context(|| format!("Failed to list due templates for workspace {workspace_id}"))?;

    let mut report = RolloverReport::default();
    for template in due {
        match process_one(store, &template, now) {
            Ok(processed) => {
                tracing::info!(
                    workspace_id,
                    template_id = processed.template_id,
                    occurrence = %processed.occurrence,
                    outcome = ?processed.outcome,
                    "processed recurring template"
                );
                report.processed.push(processed);
            }
            Err(error) => {
                tracing::warn!(
                    workspace_id,
                    template_id = ?template.id,
                    processed = report.count(),
                    "rollover stopped: {error:#}"
                );
                report.failure = Some(Failure {
                    template_id: template.id,
                    name: template.name.clone(),
                    error,
                });
                break;
            }
        }
    }
    Ok(report)
}

fn process_one<S>(
    store: &S,
    template: &RecurringTransaction,
    now: DateTime<Utc>,
) -> Result<Processed>
where
    S: TemplateStore + LedgerStore + ?Sized,
{
    let template_id = template
        .id
        .with_context(|| format!("Recurring template '{}' has no id", template.name))?;
    let occurrence = template.next_due_date;

    let created = store.append(&template.materialize()).with_context(|| {
        format!("Failed to record {occurrence} occurrence of '{}'", template.name)
    })?;

    let next = next_occurrence(template.frequency, occurrence, template.start_date)
        .filter(|next| template.end_date.map_or(true, |end| *next <= end));

    let outcome = match next {
        Some(next) => {
            store
                .advance(template_id, next, now)
                .with_context(|| format!("Failed to advance '{}'", template.name))?;
            Outcome::Advanced(next)
        }
        None => {
            store
                .deactivate(template_id, now)
                .with_context(|| format!("Failed to deactivate '{}'", template.name))?;
            Outcome::Deactivated
        }
    };

    Ok(Processed {
        template_id,
        name: template.name.clone(),
        occurrence,
        transaction_id: created.id,
        outcome,
    })
}
