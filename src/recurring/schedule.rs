use chrono::{Datelike, Days, Months, NaiveDate};

use crate::models::Frequency;

/// The occurrence after `current`, or `None` for schedules that only fire
/// once. Month-based steps land on the day-of-month of `start`, clamped to
/// the length of the target month, so a schedule anchored on the 31st
/// returns to the 31st after a short month.
pub(crate) fn next_occurrence(
    frequency: Frequency,
    current: NaiveDate,
    start: NaiveDate,
) -> Option<NaiveDate> {
    match frequency {
        Frequency::Weekly => current.checked_add_days(Days::new(7)),
        Frequency::Biweekly => current.checked_add_days(Days::new(14)),
        Frequency::Monthly => add_months_anchored(current, 1, start.day()),
        Frequency::Quarterly => add_months_anchored(current, 3, start.day()),
        Frequency::Annual => add_months_anchored(current, 12, start.day()),
        Frequency::OneTime => None,
    }
}

fn add_months_anchored(current: NaiveDate, months: u32, anchor_day: u32) -> Option<NaiveDate> {
    let target_month = current
        .with_day(1)?
        .checked_add_months(Months::new(months))?;
    let day = anchor_day.min(days_in_month(target_month)?);
    target_month.with_day(day)
}

fn days_in_month(first_of_month: NaiveDate) -> Option<u32> {
    first_of_month
        .checked_add_months(Months::new(1))?
        .pred_opt()
        .map(|last| last.day())
}
