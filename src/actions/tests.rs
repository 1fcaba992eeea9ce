#![allow(clippy::unwrap_used)]

use super::*;
use crate::auth::{Session, SessionSigner};
use crate::db::TransactionQuery;
use crate::models::*;
use crate::recurring::Outcome;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn at(y: i32, m: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, day, 6, 0, 0).unwrap()
}

fn signer() -> SessionSigner {
    SessionSigner::new(b"actions-test-secret".to_vec(), Duration::days(1))
}

fn sign_in(db: &Database, email: &str) -> Session {
    login(db, &signer(), email, None, at(2024, 1, 1)).unwrap().0
}

/// Owner with a fresh workspace.
fn setup() -> (Database, Session, i64) {
    let mut db = Database::open_in_memory().unwrap();
    let owner = sign_in(&db, "owner@example.com");
    let ws = create_workspace(&mut db, &owner, "Household")
        .unwrap()
        .id
        .unwrap();
    (db, owner, ws)
}

fn join(db: &Database, owner: &Session, ws: i64, email: &str, role: Role) -> Session {
    let session = sign_in(db, email);
    add_member(db, owner, ws, email, role).unwrap();
    session
}

fn app_error(err: anyhow::Error) -> AppError {
    err.downcast::<AppError>().unwrap()
}

fn category(db: &Database, session: &Session, ws: i64, name: &str) -> i64 {
    let cats = list_categories(db, session, ws).unwrap();
    Category::find_by_name(&cats, name).unwrap().id.unwrap()
}

fn rent(ws: i64) -> RecurringTransaction {
    RecurringTransaction::new(
        ws,
        "Rent".into(),
        TxnKind::Expense,
        dec!(1200),
        Frequency::Monthly,
        d(2024, 1, 15),
    )
}

fn ledger(db: &Database, session: &Session, ws: i64) -> Vec<Transaction> {
    list_transactions(db, session, ws, &TransactionQuery::default()).unwrap()
}

// ── Sessions ──────────────────────────────────────────────────

#[test]
fn test_login_issues_verifiable_token() {
    let db = Database::open_in_memory().unwrap();
    let (session, token) = login(
        &db,
        &signer(),
        " Pat@Example.com ",
        Some("Pat"),
        at(2024, 1, 1),
    )
    .unwrap();
    assert_eq!(session.email, "pat@example.com");
    assert_eq!(session.name, "Pat");
    assert_eq!(signer().verify(&token, at(2024, 1, 1)).unwrap(), session);
    assert_eq!(whoami(&db, &session).unwrap().email, "pat@example.com");
}

#[test]
fn test_login_defaults_name_to_local_part() {
    let db = Database::open_in_memory().unwrap();
    let session = sign_in(&db, "robin@example.com");
    assert_eq!(session.name, "robin");
    let again = sign_in(&db, "robin@example.com");
    assert_eq!(again.user_id, session.user_id);
}

#[test]
fn test_login_rejects_bad_email() {
    let db = Database::open_in_memory().unwrap();
    for email in ["", "nobody", "@example.com", "x@"] {
        let err = app_error(login(&db, &signer(), email, None, at(2024, 1, 1)).unwrap_err());
        assert!(matches!(err, AppError::Validation(_)), "{email:?}");
    }
}

#[test]
fn test_whoami_unknown_user() {
    let db = Database::open_in_memory().unwrap();
    let ghost = Session {
        user_id: 42,
        email: "ghost@example.com".into(),
        name: "Ghost".into(),
    };
    assert!(matches!(
        app_error(whoami(&db, &ghost).unwrap_err()),
        AppError::InvalidSession(_)
    ));
}

// ── Workspaces ────────────────────────────────────────────────

#[test]
fn test_first_workspace_becomes_default() {
    let (mut db, owner, ws) = setup();
    assert_eq!(resolve_workspace(&db, &owner, None).unwrap(), ws);
    let second = create_workspace(&mut db, &owner, "Side business")
        .unwrap()
        .id
        .unwrap();
    assert_eq!(resolve_workspace(&db, &owner, None).unwrap(), ws);
    assert_eq!(resolve_workspace(&db, &owner, Some(second)).unwrap(), second);
    assert_eq!(list_workspaces(&db, &owner).unwrap().len(), 2);
}

#[test]
fn test_resolve_without_default() {
    let db = Database::open_in_memory().unwrap();
    let loner = sign_in(&db, "loner@example.com");
    assert!(matches!(
        app_error(resolve_workspace(&db, &loner, None).unwrap_err()),
        AppError::Validation(_)
    ));
}

#[test]
fn test_blank_workspace_name_rejected() {
    let (mut db, owner, _) = setup();
    assert!(create_workspace(&mut db, &owner, "   ").is_err());
}

#[test]
fn test_delete_workspace_requires_owner() {
    let (db, owner, ws) = setup();
    let editor = join(&db, &owner, ws, "ed@example.com", Role::Editor);
    assert!(matches!(
        app_error(delete_workspace(&db, &editor, ws).unwrap_err()),
        AppError::Forbidden { .. }
    ));
    delete_workspace(&db, &owner, ws).unwrap();
    assert!(list_workspaces(&db, &owner).unwrap().is_empty());
    assert!(resolve_workspace(&db, &owner, None).is_err());
}

// ── Members ───────────────────────────────────────────────────

#[test]
fn test_add_member_requires_existing_user() {
    let (db, owner, ws) = setup();
    let err = app_error(add_member(&db, &owner, ws, "new@example.com", Role::Viewer).unwrap_err());
    assert!(matches!(err, AppError::Validation(ref m) if m.contains("log in")));
}

#[test]
fn test_add_member_twice_rejected() {
    let (db, owner, ws) = setup();
    join(&db, &owner, ws, "viv@example.com", Role::Viewer);
    assert!(add_member(&db, &owner, ws, "viv@example.com", Role::Editor).is_err());
}

#[test]
fn test_editor_cannot_manage_members() {
    let (db, owner, ws) = setup();
    let editor = join(&db, &owner, ws, "ed@example.com", Role::Editor);
    sign_in(&db, "third@example.com");
    let err = app_error(add_member(&db, &editor, ws, "third@example.com", Role::Viewer).unwrap_err());
    assert!(matches!(err, AppError::Forbidden { role: Role::Editor, .. }));
}

#[test]
fn test_last_owner_cannot_step_down_or_leave() {
    let (db, owner, ws) = setup();
    let err = app_error(
        set_member_role(&db, &owner, ws, "owner@example.com", Role::Editor).unwrap_err(),
    );
    assert_eq!(err, AppError::LastOwner(ws));
    let err = app_error(remove_member(&db, &owner, ws, "owner@example.com").unwrap_err());
    assert_eq!(err, AppError::LastOwner(ws));

    // With a second owner the first may leave
    join(&db, &owner, ws, "co@example.com", Role::Owner);
    remove_member(&db, &owner, ws, "owner@example.com").unwrap();
    assert!(matches!(
        app_error(list_members(&db, &owner, ws).unwrap_err()),
        AppError::NotMember(_)
    ));
    assert!(resolve_workspace(&db, &owner, None).is_err());
}

#[test]
fn test_member_may_leave() {
    let (db, owner, ws) = setup();
    let viewer = join(&db, &owner, ws, "viv@example.com", Role::Viewer);
    remove_member(&db, &viewer, ws, "viv@example.com").unwrap();
    assert_eq!(list_members(&db, &owner, ws).unwrap().len(), 1);
}

#[test]
fn test_viewer_cannot_remove_others() {
    let (db, owner, ws) = setup();
    let viewer = join(&db, &owner, ws, "viv@example.com", Role::Viewer);
    join(&db, &owner, ws, "ed@example.com", Role::Editor);
    assert!(remove_member(&db, &viewer, ws, "ed@example.com").is_err());
    assert_eq!(list_members(&db, &owner, ws).unwrap().len(), 3);
}

#[test]
fn test_promote_member() {
    let (db, owner, ws) = setup();
    let viewer = join(&db, &owner, ws, "viv@example.com", Role::Viewer);
    set_member_role(&db, &owner, ws, "viv@example.com", Role::Editor).unwrap();
    add_category(&db, &viewer, ws, "Pets", TxnKind::Expense).unwrap();
}

// ── Ledger ────────────────────────────────────────────────────

#[test]
fn test_add_and_list_transactions() {
    let (db, owner, ws) = setup();
    let groceries = category(&db, &owner, ws, "Groceries");
    let mut txn = Transaction::new(ws, TxnKind::Expense, dec!(63.40), d(2024, 3, 2), " Market ".into());
    txn.category_id = Some(groceries);
    txn.currency = "usd".into();
    let stored = add_transaction(&db, &owner, ws, txn).unwrap();
    assert_eq!(stored.description, "Market");
    assert_eq!(stored.currency, "USD");

    let march = list_transactions(
        &db,
        &owner,
        ws,
        &TransactionQuery {
            month: Some("2024-03".into()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(march.len(), 1);
    assert_eq!(march[0].id, stored.id);
}

#[test]
fn test_transaction_category_kind_must_match() {
    let (db, owner, ws) = setup();
    let salary = category(&db, &owner, ws, "Salary");
    let mut txn = Transaction::new(ws, TxnKind::Expense, dec!(10), d(2024, 3, 2), "Oops".into());
    txn.category_id = Some(salary);
    assert!(matches!(
        app_error(add_transaction(&db, &owner, ws, txn).unwrap_err()),
        AppError::Validation(_)
    ));
}

#[test]
fn test_foreign_category_rejected() {
    let (mut db, owner, ws) = setup();
    let other = create_workspace(&mut db, &owner, "Other").unwrap().id.unwrap();
    let foreign = category(&db, &owner, other, "Groceries");
    let mut txn = Transaction::new(ws, TxnKind::Expense, dec!(10), d(2024, 3, 2), "X".into());
    txn.category_id = Some(foreign);
    assert!(matches!(
        app_error(add_transaction(&db, &owner, ws, txn).unwrap_err()),
        AppError::NotFound { kind: "category", .. }
    ));
}

#[test]
fn test_invalid_amount_rejected() {
    let (db, owner, ws) = setup();
    let txn = Transaction::new(ws, TxnKind::Expense, dec!(-5), d(2024, 3, 2), "Refund".into());
    assert!(add_transaction(&db, &owner, ws, txn).is_err());
    assert!(ledger(&db, &owner, ws).is_empty());
}

#[test]
fn test_bad_month_filter_rejected() {
    let (db, owner, ws) = setup();
    let query = TransactionQuery {
        month: Some("March".into()),
        ..Default::default()
    };
    assert!(list_transactions(&db, &owner, ws, &query).is_err());
}

#[test]
fn test_delete_transaction_scoped_to_workspace() {
    let (mut db, owner, ws) = setup();
    let other = create_workspace(&mut db, &owner, "Other").unwrap().id.unwrap();
    let txn = Transaction::new(ws, TxnKind::Income, dec!(50), d(2024, 3, 2), "Gift".into());
    let id = add_transaction(&db, &owner, ws, txn).unwrap().id.unwrap();

    assert!(matches!(
        app_error(delete_transaction(&db, &owner, other, id).unwrap_err()),
        AppError::NotFound { .. }
    ));
    assert_eq!(delete_transaction(&db, &owner, ws, id).unwrap().description, "Gift");
    assert!(ledger(&db, &owner, ws).is_empty());
}

#[test]
fn test_viewer_reads_but_cannot_write() {
    let (db, owner, ws) = setup();
    let viewer = join(&db, &owner, ws, "viv@example.com", Role::Viewer);
    let txn = Transaction::new(ws, TxnKind::Expense, dec!(5), d(2024, 3, 2), "Coffee".into());
    assert!(matches!(
        app_error(add_transaction(&db, &viewer, ws, txn).unwrap_err()),
        AppError::Forbidden { .. }
    ));
    assert!(ledger(&db, &viewer, ws).is_empty());
    assert!(!list_categories(&db, &viewer, ws).unwrap().is_empty());
}

#[test]
fn test_outsider_sees_nothing() {
    let (db, _, ws) = setup();
    let outsider = sign_in(&db, "out@example.com");
    let err = app_error(
        list_transactions(&db, &outsider, ws, &TransactionQuery::default()).unwrap_err(),
    );
    assert_eq!(err, AppError::NotMember(ws));
}

#[test]
fn test_duplicate_category_rejected() {
    let (db, owner, ws) = setup();
    assert!(add_category(&db, &owner, ws, "groceries", TxnKind::Expense).is_err());
    let pets = add_category(&db, &owner, ws, "Pets", TxnKind::Expense).unwrap();
    delete_category(&db, &owner, ws, pets.id.unwrap()).unwrap();
    assert!(add_category(&db, &owner, ws, "Pets", TxnKind::Expense).is_ok());
}

// ── Budgets and reports ───────────────────────────────────────

#[test]
fn test_budget_report() {
    let (db, owner, ws) = setup();
    let groceries = category(&db, &owner, ws, "Groceries");
    let budget = set_budget(&db, &owner, Budget::new(ws, groceries, "2024-03".into(), dec!(300))).unwrap();
    // Setting again updates in place
    let again = set_budget(&db, &owner, Budget::new(ws, groceries, "2024-03".into(), dec!(250))).unwrap();
    assert_eq!(budget.id, again.id);

    for (amount, date) in [(dec!(100), d(2024, 3, 1)), (dec!(200), d(2024, 3, 20)), (dec!(999), d(2024, 4, 1))] {
        let mut t = Transaction::new(ws, TxnKind::Expense, amount, date, "Food".into());
        t.category_id = Some(groceries);
        add_transaction(&db, &owner, ws, t).unwrap();
    }

    let lines = budget_report(&db, &owner, ws, "2024-03").unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].category_name, "Groceries");
    assert_eq!(lines[0].limit, dec!(250));
    assert_eq!(lines[0].spent, dec!(300));
    assert_eq!(lines[0].remaining, dec!(-50));
    assert!(lines[0].is_over());

    delete_budget(&db, &owner, ws, again.id.unwrap()).unwrap();
    assert!(budget_report(&db, &owner, ws, "2024-03").unwrap().is_empty());
}

#[test]
fn test_budget_needs_expense_category() {
    let (db, owner, ws) = setup();
    let salary = category(&db, &owner, ws, "Salary");
    assert!(set_budget(&db, &owner, Budget::new(ws, salary, "2024-03".into(), dec!(10))).is_err());
    let groceries = category(&db, &owner, ws, "Groceries");
    assert!(set_budget(&db, &owner, Budget::new(ws, groceries, "2024-3".into(), dec!(10))).is_err());
}

#[test]
fn test_monthly_summary_and_export() {
    let (db, owner, ws) = setup();
    let salary = category(&db, &owner, ws, "Salary");
    let mut pay = Transaction::new(ws, TxnKind::Income, dec!(4000), d(2024, 3, 1), "Pay".into());
    pay.category_id = Some(salary);
    add_transaction(&db, &owner, ws, pay).unwrap();
    let rent = Transaction::new(ws, TxnKind::Expense, dec!(1500), d(2024, 3, 3), "Rent".into());
    add_transaction(&db, &owner, ws, rent).unwrap();
    let old = Transaction::new(ws, TxnKind::Expense, dec!(70), d(2024, 2, 3), "Old".into());
    add_transaction(&db, &owner, ws, old).unwrap();

    let summary = monthly_summary(&db, &owner, ws, "2024-03").unwrap();
    assert_eq!(summary.income, dec!(4000));
    assert_eq!(summary.expenses, dec!(1500));
    assert_eq!(summary.net, dec!(2500));
    assert_eq!(
        summary.spending_by_category,
        vec![("Uncategorized".to_string(), dec!(1500))]
    );

    let dir = tempfile::tempdir().unwrap();
    let march = dir.path().join("march.csv");
    assert_eq!(export_transactions(&db, &owner, ws, Some("2024-03"), &march).unwrap(), 2);
    let all = dir.path().join("all.csv");
    assert_eq!(export_transactions(&db, &owner, ws, None, &all).unwrap(), 3);
}

// ── Recurring ─────────────────────────────────────────────────

#[test]
fn test_process_monthly_template() {
    let (db, owner, ws) = setup();
    let template = add_recurring(&db, &owner, ws, rent(ws)).unwrap();
    let id = template.id.unwrap();

    let report = process_due(&db, &owner, ws, at(2024, 2, 1)).unwrap();
    assert_eq!(report.count(), 1);
    assert!(report.is_complete());
    assert_eq!(report.processed[0].outcome, Outcome::Advanced(d(2024, 2, 15)));

    let txns = ledger(&db, &owner, ws);
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0].date, d(2024, 1, 15));
    assert_eq!(txns[0].amount, dec!(1200));
    assert_eq!(txns[0].recurring_id, Some(id));
    assert_eq!(Some(txns[0].id.unwrap()), report.processed[0].transaction_id);

    let stored = list_recurring(&db, &owner, ws).unwrap();
    assert_eq!(stored[0].next_due_date, d(2024, 2, 15));
    assert_eq!(stored[0].last_processed_at, Some(at(2024, 2, 1)));

    // Same day again: nothing to do
    let again = process_due(&db, &owner, ws, at(2024, 2, 1)).unwrap();
    assert_eq!(again.count(), 0);
    assert_eq!(ledger(&db, &owner, ws).len(), 1);
}

#[test]
fn test_process_one_time_template() {
    let (db, owner, ws) = setup();
    let mut deposit = rent(ws);
    deposit.name = "Deposit".into();
    deposit.frequency = Frequency::OneTime;
    deposit.start_date = d(2024, 1, 10);
    let id = add_recurring(&db, &owner, ws, deposit).unwrap().id.unwrap();

    let report = process_due(&db, &owner, ws, at(2024, 1, 10)).unwrap();
    assert_eq!(report.processed[0].outcome, Outcome::Deactivated);
    assert_eq!(process_due(&db, &owner, ws, at(2024, 6, 1)).unwrap().count(), 0);
    assert_eq!(ledger(&db, &owner, ws).len(), 1);

    // An exhausted schedule cannot be resumed
    assert!(matches!(
        app_error(set_recurring_active(&db, &owner, ws, id, true).unwrap_err()),
        AppError::Validation(_)
    ));
}

#[test]
fn test_finished_template_stays_finished_after_ledger_delete() {
    let (db, owner, ws) = setup();
    let mut deposit = rent(ws);
    deposit.name = "Deposit".into();
    deposit.frequency = Frequency::OneTime;
    let id = add_recurring(&db, &owner, ws, deposit).unwrap().id.unwrap();
    process_due(&db, &owner, ws, at(2024, 1, 20)).unwrap();

    let only = ledger(&db, &owner, ws)[0].id.unwrap();
    delete_transaction(&db, &owner, ws, only).unwrap();

    assert!(matches!(
        app_error(set_recurring_active(&db, &owner, ws, id, true).unwrap_err()),
        AppError::Validation(_)
    ));
    assert_eq!(process_due(&db, &owner, ws, at(2024, 6, 1)).unwrap().count(), 0);
    assert!(ledger(&db, &owner, ws).is_empty());
    let stored = &list_recurring(&db, &owner, ws).unwrap()[0];
    assert!(stored.is_finished());
    assert_eq!(stored.status(d(2024, 6, 1)), "finished");
}

#[test]
fn test_end_dated_template_cannot_resume_after_ledger_delete() {
    let (db, owner, ws) = setup();
    let mut lease = rent(ws);
    lease.end_date = Some(d(2024, 1, 31));
    let id = add_recurring(&db, &owner, ws, lease).unwrap().id.unwrap();

    let report = process_due(&db, &owner, ws, at(2024, 2, 1)).unwrap();
    assert_eq!(report.processed[0].outcome, Outcome::Deactivated);
    let only = ledger(&db, &owner, ws)[0].id.unwrap();
    delete_transaction(&db, &owner, ws, only).unwrap();

    assert!(set_recurring_active(&db, &owner, ws, id, true).is_err());
    assert_eq!(process_due(&db, &owner, ws, at(2024, 2, 1)).unwrap().count(), 0);
    assert!(ledger(&db, &owner, ws).is_empty());
}

#[test]
fn test_paused_template_is_not_finished() {
    let (db, owner, ws) = setup();
    let mut lease = rent(ws);
    lease.end_date = Some(d(2024, 1, 15));
    let id = add_recurring(&db, &owner, ws, lease).unwrap().id.unwrap();

    // Next due equals the end date: the final occurrence is still owed
    let paused = set_recurring_active(&db, &owner, ws, id, false).unwrap();
    assert!(!paused.is_finished());
    assert_eq!(paused.status(d(2024, 1, 20)), "paused");

    set_recurring_active(&db, &owner, ws, id, true).unwrap();
    let report = process_due(&db, &owner, ws, at(2024, 1, 20)).unwrap();
    assert_eq!(report.processed[0].outcome, Outcome::Deactivated);
    assert_eq!(ledger(&db, &owner, ws).len(), 1);
}

#[test]
fn test_process_end_date_final_occurrence() {
    let (db, owner, ws) = setup();
    let mut lease = rent(ws);
    lease.end_date = Some(d(2024, 2, 20));
    add_recurring(&db, &owner, ws, lease).unwrap();

    let first = process_due(&db, &owner, ws, at(2024, 3, 1)).unwrap();
    assert_eq!(first.processed[0].outcome, Outcome::Advanced(d(2024, 2, 15)));
    let second = process_due(&db, &owner, ws, at(2024, 3, 1)).unwrap();
    assert_eq!(second.processed[0].outcome, Outcome::Deactivated);
    assert_eq!(process_due(&db, &owner, ws, at(2024, 3, 1)).unwrap().count(), 0);

    let dates: Vec<NaiveDate> = ledger(&db, &owner, ws).iter().map(|t| t.date).collect();
    assert_eq!(dates, vec![d(2024, 2, 15), d(2024, 1, 15)]);
}

#[test]
fn test_viewer_cannot_process() {
    let (db, owner, ws) = setup();
    add_recurring(&db, &owner, ws, rent(ws)).unwrap();
    let viewer = join(&db, &owner, ws, "viv@example.com", Role::Viewer);

    let err = app_error(process_due(&db, &viewer, ws, at(2024, 2, 1)).unwrap_err());
    assert!(matches!(err, AppError::Forbidden { role: Role::Viewer, .. }));
    assert!(ledger(&db, &owner, ws).is_empty());
    assert_eq!(
        list_recurring(&db, &owner, ws).unwrap()[0].next_due_date,
        d(2024, 1, 15)
    );
}

#[test]
fn test_pause_and_resume() {
    let (db, owner, ws) = setup();
    let id = add_recurring(&db, &owner, ws, rent(ws)).unwrap().id.unwrap();

    set_recurring_active(&db, &owner, ws, id, false).unwrap();
    assert_eq!(process_due(&db, &owner, ws, at(2024, 2, 1)).unwrap().count(), 0);

    let resumed = set_recurring_active(&db, &owner, ws, id, true).unwrap();
    assert!(resumed.is_active);
    assert_eq!(process_due(&db, &owner, ws, at(2024, 2, 1)).unwrap().count(), 1);
}

#[test]
fn test_add_recurring_resets_schedule_state() {
    let (db, owner, ws) = setup();
    let mut t = rent(ws);
    t.next_due_date = d(2030, 1, 1);
    t.is_active = false;
    t.last_processed_at = Some(at(2024, 1, 1));
    t.completed_at = Some(at(2024, 1, 1));
    let stored = add_recurring(&db, &owner, ws, t).unwrap();
    assert_eq!(stored.next_due_date, d(2024, 1, 15));
    assert!(stored.is_active);
    assert_eq!(stored.last_processed_at, None);
    assert!(!stored.is_finished());
}

#[test]
fn test_add_recurring_validates() {
    let (db, owner, ws) = setup();
    let mut backwards = rent(ws);
    backwards.end_date = Some(d(2023, 12, 31));
    assert!(add_recurring(&db, &owner, ws, backwards).is_err());

    let mut free = rent(ws);
    free.amount = Decimal::ZERO;
    assert!(add_recurring(&db, &owner, ws, free).is_err());
    assert!(list_recurring(&db, &owner, ws).unwrap().is_empty());
}

#[test]
fn test_delete_recurring_keeps_history() {
    let (db, owner, ws) = setup();
    let id = add_recurring(&db, &owner, ws, rent(ws)).unwrap().id.unwrap();
    process_due(&db, &owner, ws, at(2024, 1, 20)).unwrap();
    delete_recurring(&db, &owner, ws, id).unwrap();

    assert!(list_recurring(&db, &owner, ws).unwrap().is_empty());
    let txns = ledger(&db, &owner, ws);
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0].recurring_id, None);
}

// ── Debts ─────────────────────────────────────────────────────

#[test]
fn test_pay_debt_logs_expense() {
    let (mut db, owner, ws) = setup();
    let debt = add_debt(
        &db,
        &owner,
        ws,
        Debt::new(ws, "Card".into(), "Bank".into(), dec!(300)),
    )
    .unwrap();
    let id = debt.id.unwrap();

    let (debt, payment) = pay_debt(&mut db, &owner, ws, id, dec!(120), d(2024, 3, 5)).unwrap();
    assert_eq!(debt.balance, dec!(180));
    assert_eq!(payment.amount, dec!(120));
    assert_eq!(
        payment.category_id,
        Some(category(&db, &owner, ws, "Debt Payments"))
    );

    // Overpayment is clamped to the balance
    let (debt, payment) = pay_debt(&mut db, &owner, ws, id, dec!(500), d(2024, 4, 5)).unwrap();
    assert!(debt.is_paid_off());
    assert_eq!(payment.amount, dec!(180));

    assert!(pay_debt(&mut db, &owner, ws, id, dec!(1), d(2024, 5, 5)).is_err());
    assert_eq!(list_debts(&db, &owner, ws).unwrap()[0].balance, Decimal::ZERO);
    assert_eq!(ledger(&db, &owner, ws).len(), 2);
}

#[test]
fn test_pay_debt_uses_preferred_currency() {
    let (mut db, owner, ws) = setup();
    update_preferences(&db, &owner, Some("gbp"), None).unwrap();
    let id = add_debt(&db, &owner, ws, Debt::new(ws, "Loan".into(), String::new(), dec!(50)))
        .unwrap()
        .id
        .unwrap();
    let (_, payment) = pay_debt(&mut db, &owner, ws, id, dec!(10), d(2024, 3, 5)).unwrap();
    assert_eq!(payment.currency, "GBP");
}

#[test]
fn test_debt_in_other_workspace_not_found() {
    let (mut db, owner, ws) = setup();
    let other = create_workspace(&mut db, &owner, "Other").unwrap().id.unwrap();
    let id = add_debt(&db, &owner, ws, Debt::new(ws, "Loan".into(), String::new(), dec!(50)))
        .unwrap()
        .id
        .unwrap();
    assert!(matches!(
        app_error(pay_debt(&mut db, &owner, other, id, dec!(10), d(2024, 3, 5)).unwrap_err()),
        AppError::NotFound { kind: "debt", .. }
    ));
    delete_debt(&db, &owner, ws, id).unwrap();
    assert!(list_debts(&db, &owner, ws).unwrap().is_empty());
}

// ── Preferences ───────────────────────────────────────────────

#[test]
fn test_update_preferences() {
    let (db, owner, ws) = setup();
    let prefs = update_preferences(&db, &owner, Some("eur"), Some(ws)).unwrap();
    assert_eq!(prefs.currency, "EUR");
    assert_eq!(get_preferences(&db, &owner).unwrap(), prefs);

    assert!(update_preferences(&db, &owner, Some("euro"), None).is_err());
    assert!(update_preferences(&db, &owner, None, Some(999)).is_err());
    assert_eq!(get_preferences(&db, &owner).unwrap().currency, "EUR");
}
