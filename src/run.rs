mod cli;

pub(crate) use cli::Cli;

use anyhow::Result;
use chrono::{Duration, Local, Utc};
use std::path::PathBuf;

use crate::actions;
use crate::auth::{Session, SessionSigner};
use crate::config::Config;
use crate::db::{Database, TransactionQuery};
use crate::error::AppError;
use crate::models::*;
use crate::recurring::Outcome;
use cli::{
    BudgetCommand, CategoryCommand, Command, DebtCommand, PrefsCommand, RecurringCommand,
    TxnCommand, WorkspaceCommand,
};

/// Everything one invocation needs: the open database, the token signer and
/// the global flags.
struct Context {
    db: Database,
    signer: SessionSigner,
    token: Option<String>,
    workspace: Option<i64>,
}

impl Context {
    fn session(&self) -> Result<Session> {
        let token = self.token.as_deref().ok_or_else(|| {
            AppError::InvalidSession(
                "not logged in; run `budgetspace login --email <you@example.com>`".to_string(),
            )
        })?;
        Ok(self.signer.verify(token, Utc::now())?)
    }

    fn workspace_id(&self, session: &Session) -> Result<i64> {
        actions::resolve_workspace(&self.db, session, self.workspace)
    }
}

pub(crate) fn as_cli(cli: Cli, config: &Config) -> Result<()> {
    let db = Database::open(&config.db_path)?;
    let signer = SessionSigner::new(
        config.session_secret()?,
        Duration::days(config.session_ttl_days),
    );
    let mut ctx = Context {
        db,
        signer,
        token: cli.session,
        workspace: cli.workspace,
    };

    match cli.command {
        Command::Login { email, name } => cli_login(&ctx, &email, name.as_deref()),
        Command::Whoami => cli_whoami(&ctx),
        Command::Workspace(cmd) => cli_workspace(&mut ctx, cmd),
        Command::Category(cmd) => cli_category(&ctx, cmd),
        Command::Txn(cmd) => cli_txn(&ctx, cmd),
        Command::Budget(cmd) => cli_budget(&ctx, cmd),
        Command::Recurring(cmd) => cli_recurring(&ctx, cmd),
        Command::Debt(cmd) => cli_debt(&mut ctx, cmd),
        Command::Summary { month } => cli_summary(&ctx, month),
        Command::Export { path, month, all } => cli_export(&ctx, path, month, all),
        Command::Prefs(cmd) => cli_prefs(&ctx, cmd),
    }
}

// Every calendar decision uses the local clock.
fn current_month() -> String {
    Local::now().format("%Y-%m").to_string()
}

fn today() -> chrono::NaiveDate {
    Local::now().date_naive()
}

fn id_or_dash(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".into())
}

// ── Sessions ──────────────────────────────────────────────────

fn cli_login(ctx: &Context, email: &str, name: Option<&str>) -> Result<()> {
    let (session, token) = actions::login(&ctx.db, &ctx.signer, email, name, Utc::now())?;
    eprintln!("Logged in as {} <{}>", session.name, session.email);
    eprintln!("Export the token below as BUDGETSPACE_SESSION or pass it with --session:");
    println!("{token}");
    Ok(())
}

fn cli_whoami(ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    let user = actions::whoami(&ctx.db, &session)?;
    let prefs = actions::get_preferences(&ctx.db, &session)?;
    println!("{} <{}>", user.name, user.email);
    println!("  User ID:           {}", session.user_id);
    println!("  Currency:          {}", prefs.currency);
    println!(
        "  Default workspace: {}",
        id_or_dash(prefs.default_workspace_id)
    );
    Ok(())
}

// ── Workspaces ────────────────────────────────────────────────

fn cli_workspace(ctx: &mut Context, cmd: WorkspaceCommand) -> Result<()> {
    let session = ctx.session()?;
    match cmd {
        WorkspaceCommand::Create { name } => {
            let ws = actions::create_workspace(&mut ctx.db, &session, &name)?;
            println!("Created workspace {} ({})", ws.name, id_or_dash(ws.id));
        }
        WorkspaceCommand::List => {
            let workspaces = actions::list_workspaces(&ctx.db, &session)?;
            if workspaces.is_empty() {
                println!("No workspaces. Create one with `budgetspace workspace create <name>`");
                return Ok(());
            }
            let default = actions::get_preferences(&ctx.db, &session)?.default_workspace_id;
            println!("{:<4} {:<28} Role", "ID", "Name");
            println!("{}", "─".repeat(45));
            for (ws, role) in &workspaces {
                let marker = if ws.id == default { " *" } else { "" };
                println!("{:<4} {:<28} {role}{marker}", id_or_dash(ws.id), ws.name);
            }
        }
        WorkspaceCommand::Members => {
            let ws = ctx.workspace_id(&session)?;
            let members = actions::list_members(&ctx.db, &session, ws)?;
            println!("{:<30} {:<20} Role", "Email", "Name");
            println!("{}", "─".repeat(60));
            for m in &members {
                println!("{:<30} {:<20} {}", m.email, m.name, m.role);
            }
        }
        WorkspaceCommand::AddMember { email, role } => {
            let ws = ctx.workspace_id(&session)?;
            let member = actions::add_member(&ctx.db, &session, ws, &email, role)?;
            println!("Added {} as {}", member.email, member.role);
        }
        WorkspaceCommand::SetRole { email, role } => {
            let ws = ctx.workspace_id(&session)?;
            actions::set_member_role(&ctx.db, &session, ws, &email, role)?;
            println!("{email} is now {role}");
        }
        WorkspaceCommand::RemoveMember { email } => {
            let ws = ctx.workspace_id(&session)?;
            actions::remove_member(&ctx.db, &session, ws, &email)?;
            println!("Removed {email}");
        }
        WorkspaceCommand::Delete { yes } => {
            let ws = ctx.workspace_id(&session)?;
            if !yes {
                anyhow::bail!("Deleting workspace {ws} removes all of its data; pass --yes to confirm");
            }
            actions::delete_workspace(&ctx.db, &session, ws)?;
            println!("Deleted workspace {ws}");
        }
    }
    Ok(())
}

// ── Categories ────────────────────────────────────────────────

fn cli_category(ctx: &Context, cmd: CategoryCommand) -> Result<()> {
    let session = ctx.session()?;
    let ws = ctx.workspace_id(&session)?;
    match cmd {
        CategoryCommand::Add { name, kind } => {
            let cat = actions::add_category(&ctx.db, &session, ws, &name, kind)?;
            println!("Added category {} ({})", cat.name, id_or_dash(cat.id));
        }
        CategoryCommand::List => {
            let categories = actions::list_categories(&ctx.db, &session, ws)?;
            println!("{:<4} {:<24} Kind", "ID", "Name");
            println!("{}", "─".repeat(38));
            for cat in &categories {
                println!("{:<4} {:<24} {}", id_or_dash(cat.id), cat.name, cat.kind);
            }
        }
        CategoryCommand::Delete { id } => {
            actions::delete_category(&ctx.db, &session, ws, id)?;
            println!("Deleted category {id}");
        }
    }
    Ok(())
}

// ── Transactions ──────────────────────────────────────────────

fn cli_txn(ctx: &Context, cmd: TxnCommand) -> Result<()> {
    let session = ctx.session()?;
    let ws = ctx.workspace_id(&session)?;
    match cmd {
        TxnCommand::Add {
            amount,
            description,
            kind,
            date,
            category,
            currency,
            notes,
        } => {
            let mut txn = Transaction::new(ws, kind, amount, date.unwrap_or_else(today), description);
            txn.category_id = category;
            txn.notes = notes;
            txn.currency = match currency {
                Some(code) => code,
                None => actions::get_preferences(&ctx.db, &session)?.currency,
            };
            let txn = actions::add_transaction(&ctx.db, &session, ws, txn)?;
            println!(
                "Recorded {} {:.2} {} on {} ({})",
                txn.kind,
                txn.amount,
                txn.currency,
                txn.date,
                id_or_dash(txn.id)
            );
        }
        TxnCommand::List {
            month,
            category,
            kind,
            limit,
        } => {
            let query = TransactionQuery {
                month,
                category_id: category,
                kind,
                limit: Some(limit),
            };
            let txns = actions::list_transactions(&ctx.db, &session, ws, &query)?;
            if txns.is_empty() {
                println!("No transactions");
                return Ok(());
            }
            let categories = actions::list_categories(&ctx.db, &session, ws)?;
            println!(
                "{:<5} {:<10} {:>12} {:<4} {:<18} Description",
                "ID", "Date", "Amount", "Cur", "Category"
            );
            println!("{}", "─".repeat(75));
            for t in &txns {
                let cat = t
                    .category_id
                    .and_then(|id| Category::find_by_id(&categories, id))
                    .map(|c| c.name.as_str())
                    .unwrap_or("-");
                println!(
                    "{:<5} {:<10} {:>12.2} {:<4} {:<18} {}",
                    id_or_dash(t.id),
                    t.date,
                    t.signed_amount(),
                    t.currency,
                    cat,
                    t.description
                );
            }
        }
        TxnCommand::Delete { id } => {
            let txn = actions::delete_transaction(&ctx.db, &session, ws, id)?;
            println!("Deleted transaction {id} ({})", txn.description);
        }
    }
    Ok(())
}

// ── Budgets ───────────────────────────────────────────────────

fn cli_budget(ctx: &Context, cmd: BudgetCommand) -> Result<()> {
    let session = ctx.session()?;
    let ws = ctx.workspace_id(&session)?;
    match cmd {
        BudgetCommand::Set {
            category,
            limit,
            month,
        } => {
            let month = month.unwrap_or_else(current_month);
            let budget = Budget::new(ws, category, month, limit);
            let budget = actions::set_budget(&ctx.db, &session, budget)?;
            println!(
                "Budget for category {} in {}: ${:.2}",
                budget.category_id, budget.month, budget.limit_amount
            );
        }
        BudgetCommand::List { month } => {
            let month = month.unwrap_or_else(current_month);
            let lines = actions::budget_report(&ctx.db, &session, ws, &month)?;
            if lines.is_empty() {
                println!("No budgets for {month}");
                return Ok(());
            }
            println!("Budgets — {month}");
            println!(
                "{:<4} {:<22} {:>10} {:>10} {:>10} {:>6}",
                "ID", "Category", "Limit", "Spent", "Left", "Used"
            );
            println!("{}", "─".repeat(67));
            for line in &lines {
                let flag = if line.is_over() { "  over" } else { "" };
                let used = line
                    .ratio
                    .and_then(|r| r.checked_mul(rust_decimal::Decimal::ONE_HUNDRED))
                    .map(|pct| format!("{pct:.0}%"))
                    .unwrap_or_else(|| "n/a".to_string());
                println!(
                    "{:<4} {:<22} {:>10.2} {:>10.2} {:>10.2} {used:>6}{flag}",
                    id_or_dash(line.budget_id),
                    line.category_name,
                    line.limit,
                    line.spent,
                    line.remaining,
                );
            }
        }
        BudgetCommand::Delete { id } => {
            actions::delete_budget(&ctx.db, &session, ws, id)?;
            println!("Deleted budget {id}");
        }
    }
    Ok(())
}

// ── Recurring ─────────────────────────────────────────────────

fn cli_recurring(ctx: &Context, cmd: RecurringCommand) -> Result<()> {
    let session = ctx.session()?;
    let ws = ctx.workspace_id(&session)?;
    match cmd {
        RecurringCommand::Add {
            name,
            amount,
            frequency,
            start,
            end,
            kind,
            category,
            currency,
            notes,
        } => {
            let mut template = RecurringTransaction::new(ws, name, kind, amount, frequency, start);
            template.end_date = end;
            template.category_id = category;
            template.notes = notes;
            template.currency = match currency {
                Some(code) => code,
                None => actions::get_preferences(&ctx.db, &session)?.currency,
            };
            let template = actions::add_recurring(&ctx.db, &session, ws, template)?;
            println!(
                "Created '{}' ({}), {} starting {}",
                template.name,
                id_or_dash(template.id),
                template.frequency,
                template.next_due_date
            );
        }
        RecurringCommand::List => {
            let templates = actions::list_recurring(&ctx.db, &session, ws)?;
            if templates.is_empty() {
                println!("No recurring transactions");
                return Ok(());
            }
            println!(
                "{:<4} {:<22} {:>10} {:<10} {:<10} {:<10} Status",
                "ID", "Name", "Amount", "Frequency", "Next due", "Ends"
            );
            println!("{}", "─".repeat(80));
            let today = today();
            for t in &templates {
                let status = t.status(today);
                let ends = t.end_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
                let amount = t.signed_amount();
                println!(
                    "{:<4} {:<22} {:>10.2} {:<10} {:<10} {:<10} {status}",
                    id_or_dash(t.id),
                    t.name,
                    amount,
                    t.frequency,
                    t.next_due_date,
                    ends
                );
            }
        }
        RecurringCommand::Pause { id } => {
            let t = actions::set_recurring_active(&ctx.db, &session, ws, id, false)?;
            println!("Paused '{}'", t.name);
        }
        RecurringCommand::Resume { id } => {
            let t = actions::set_recurring_active(&ctx.db, &session, ws, id, true)?;
            println!("Resumed '{}', next due {}", t.name, t.next_due_date);
        }
        RecurringCommand::Delete { id } => {
            actions::delete_recurring(&ctx.db, &session, ws, id)?;
            println!("Deleted recurring transaction {id}");
        }
        RecurringCommand::Process => {
            let report = actions::process_due(&ctx.db, &session, ws, Local::now())?;
            for p in &report.processed {
                match p.outcome {
                    Outcome::Advanced(next) => {
                        println!("  {:<24} {}  next {next}", p.name, p.occurrence)
                    }
                    Outcome::Deactivated => {
                        println!("  {:<24} {}  finished", p.name, p.occurrence)
                    }
                }
            }
            println!("Processed {} recurring transaction(s)", report.count());
            if let Some(failure) = report.failure {
                return Err(failure.error.context(format!(
                    "Stopped at '{}'; {} processed before it were kept",
                    failure.name,
                    report.processed.len()
                )));
            }
        }
    }
    Ok(())
}

// ── Debts ─────────────────────────────────────────────────────

fn cli_debt(ctx: &mut Context, cmd: DebtCommand) -> Result<()> {
    let session = ctx.session()?;
    let ws = ctx.workspace_id(&session)?;
    match cmd {
        DebtCommand::Add {
            name,
            principal,
            lender,
            rate,
            min_payment,
            due_day,
            notes,
        } => {
            let mut debt = Debt::new(ws, name, lender, principal);
            debt.interest_rate = rate;
            debt.minimum_payment = min_payment;
            debt.due_day = due_day;
            debt.notes = notes;
            let debt = actions::add_debt(&ctx.db, &session, ws, debt)?;
            println!("Added debt '{}' ({})", debt.name, id_or_dash(debt.id));
        }
        DebtCommand::List => {
            let debts = actions::list_debts(&ctx.db, &session, ws)?;
            if debts.is_empty() {
                println!("No debts");
                return Ok(());
            }
            println!(
                "{:<4} {:<20} {:>12} {:>7} {:>10} Payoff",
                "ID", "Name", "Balance", "Rate", "Min"
            );
            println!("{}", "─".repeat(65));
            for d in &debts {
                let payoff = match d.months_to_payoff() {
                    Some(0) => "paid off".to_string(),
                    Some(months) => format!("{months} mo"),
                    None => "never at minimum".to_string(),
                };
                println!(
                    "{:<4} {:<20} {:>12.2} {:>6.2}% {:>10.2} {payoff}",
                    id_or_dash(d.id),
                    d.name,
                    d.balance,
                    d.interest_rate,
                    d.minimum_payment
                );
            }
        }
        DebtCommand::Pay { id, amount, date } => {
            let (debt, payment) = actions::pay_debt(
                &mut ctx.db,
                &session,
                ws,
                id,
                amount,
                date.unwrap_or_else(today),
            )?;
            println!(
                "Paid ${:.2} on '{}'; balance now ${:.2}",
                payment.amount, debt.name, debt.balance
            );
        }
        DebtCommand::Delete { id } => {
            actions::delete_debt(&ctx.db, &session, ws, id)?;
            println!("Deleted debt {id}");
        }
    }
    Ok(())
}

// ── Reports ───────────────────────────────────────────────────

fn cli_summary(ctx: &Context, month: Option<String>) -> Result<()> {
    let session = ctx.session()?;
    let ws = ctx.workspace_id(&session)?;
    let month = month.unwrap_or_else(current_month);
    let summary = actions::monthly_summary(&ctx.db, &session, ws, &month)?;

    println!("budgetspace — {month}");
    println!("{}", "─".repeat(40));
    println!("  Income:     ${:.2}", summary.income);
    println!("  Expenses:   ${:.2}", summary.expenses);
    println!("  Net:        ${:.2}", summary.net);

    if !summary.spending_by_category.is_empty() {
        println!();
        println!("Spending by Category:");
        for (name, amount) in &summary.spending_by_category {
            println!("  {name:<24} ${amount:.2}");
        }
    }
    Ok(())
}

fn cli_export(ctx: &Context, path: Option<PathBuf>, month: Option<String>, all: bool) -> Result<()> {
    let session = ctx.session()?;
    let ws = ctx.workspace_id(&session)?;
    let month = if all {
        None
    } else {
        Some(month.unwrap_or_else(current_month))
    };

    let output_path = match path {
        Some(p) => p,
        None => {
            let home = directories::UserDirs::new()
                .map(|dirs| dirs.home_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."));
            let suffix = month.as_deref().unwrap_or("all");
            home.join(format!("budgetspace-export-{suffix}.csv"))
        }
    };

    let count = actions::export_transactions(&ctx.db, &session, ws, month.as_deref(), &output_path)?;
    if count == 0 {
        println!("No transactions to export");
    } else {
        println!("Exported {count} transactions to {}", output_path.display());
    }
    Ok(())
}

// ── Preferences ───────────────────────────────────────────────

fn cli_prefs(ctx: &Context, cmd: PrefsCommand) -> Result<()> {
    let session = ctx.session()?;
    let prefs = match cmd {
        PrefsCommand::Show => actions::get_preferences(&ctx.db, &session)?,
        PrefsCommand::Set {
            currency,
            default_workspace,
        } => actions::update_preferences(&ctx.db, &session, currency.as_deref(), default_workspace)?,
    };
    println!("  Currency:          {}", prefs.currency);
    println!(
        "  Default workspace: {}",
        id_or_dash(prefs.default_workspace_id)
    );
    Ok(())
}
