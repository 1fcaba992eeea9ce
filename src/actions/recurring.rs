use anyhow::Result;
use chrono::{DateTime, TimeZone};

use super::check_category;
use crate::auth::{authorize, Permission, Session};
use crate::db::Database;
use crate::error::AppError;
use crate::models::*;
use crate::recurring::{self, RolloverReport};

pub(crate) fn add_recurring(
    db: &Database,
    session: &Session,
    workspace_id: i64,
    mut template: RecurringTransaction,
) -> Result<RecurringTransaction> {
    authorize(db, session, workspace_id, Permission::Edit)?;
    template.workspace_id = workspace_id;
    template.next_due_date = template.start_date;
    template.last_processed_at = None;
    template.completed_at = None;
    template.is_active = true;
    template.validate()?;
    check_category(db, workspace_id, template.category_id, Some(template.kind))?;
    template.id = Some(db.insert_recurring(&template)?);
    tracing::info!(workspace_id, template_id = ?template.id, frequency = %template.frequency, "created recurring template");
    Ok(template)
}

pub(crate) fn list_recurring(
    db: &Database,
    session: &Session,
    workspace_id: i64,
) -> Result<Vec<RecurringTransaction>> {
    authorize(db, session, workspace_id, Permission::View)?;
    db.get_recurring_list(workspace_id)
}

fn load_template(db: &Database, workspace_id: i64, template_id: i64) -> Result<RecurringTransaction> {
    Ok(db
        .get_recurring(template_id)?
        .filter(|t| t.workspace_id == workspace_id)
        .ok_or(AppError::NotFound {
            kind: "recurring transaction",
            id: template_id,
        })?)
}

/// Pause or resume a template. A template whose schedule has run out cannot
/// be resumed.
pub(crate) fn set_recurring_active(
    db: &Database,
    session: &Session,
    workspace_id: i64,
    template_id: i64,
    active: bool,
) -> Result<RecurringTransaction> {
    authorize(db, session, workspace_id, Permission::Edit)?;
    let mut template = load_template(db, workspace_id, template_id)?;
    if active {
        if let Some(completed_at) = template.completed_at {
            return Err(AppError::validation(format!(
                "'{}' finished on {} and has no occurrences left",
                template.name,
                completed_at.date_naive()
            ))
            .into());
        }
        if let Some(end) = template.end_date.filter(|end| template.next_due_date > *end) {
            return Err(AppError::validation(format!(
                "'{}' is past its end date {end}",
                template.name
            ))
            .into());
        }
    }
    db.set_recurring_active(template_id, active)?;
    template.is_active = active;
    Ok(template)
}

pub(crate) fn delete_recurring(
    db: &Database,
    session: &Session,
    workspace_id: i64,
    template_id: i64,
) -> Result<()> {
    authorize(db, session, workspace_id, Permission::Edit)?;
    load_template(db, workspace_id, template_id)?;
    db.delete_recurring(template_id)
}

/// The manual "process due" action. Callers without edit rights are turned
/// away before any template is read.
pub(crate) fn process_due<Tz: TimeZone>(
    db: &Database,
    session: &Session,
    workspace_id: i64,
    now: DateTime<Tz>,
) -> Result<RolloverReport> {
    authorize(db, session, workspace_id, Permission::Edit)?;
    recurring::process_due(db, workspace_id, now)
}
