use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;

use crate::models::{Frequency, Role, TxnKind};

#[derive(Parser, Debug)]
#[command(
    name = "budgetspace",
    version,
    about = "budgetspace - shared, multi-workspace budgeting"
)]
pub(crate) struct Cli {
    /// Session token printed by `budgetspace login`
    #[arg(long, env = "BUDGETSPACE_SESSION", global = true, hide_env_values = true)]
    pub(crate) session: Option<String>,

    /// Workspace to act on (default: your default workspace)
    #[arg(long, short = 'w', global = true)]
    pub(crate) workspace: Option<i64>,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Sign in (or register) and print a session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Show the signed-in user
    Whoami,
    /// Manage workspaces and their members
    #[command(subcommand)]
    Workspace(WorkspaceCommand),
    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Record and list ledger transactions
    #[command(subcommand, alias = "t")]
    Txn(TxnCommand),
    /// Plan monthly spending limits
    #[command(subcommand)]
    Budget(BudgetCommand),
    /// Manage recurring income and expenses
    #[command(subcommand, alias = "r")]
    Recurring(RecurringCommand),
    /// Track debts and payments
    #[command(subcommand)]
    Debt(DebtCommand),
    /// Print a monthly income/expense summary
    #[command(alias = "s")]
    Summary {
        /// Month as YYYY-MM (default: current)
        month: Option<String>,
    },
    /// Export transactions to CSV
    Export {
        /// Output file (default: ~/budgetspace-export-<month>.csv)
        path: Option<PathBuf>,
        /// Month as YYYY-MM (default: current)
        #[arg(long)]
        month: Option<String>,
        /// Export every month
        #[arg(long, conflicts_with = "month")]
        all: bool,
    },
    /// Show or change your preferences
    #[command(subcommand)]
    Prefs(PrefsCommand),
}

#[derive(Subcommand, Debug)]
pub(crate) enum WorkspaceCommand {
    /// Create a workspace you own
    Create { name: String },
    /// List your workspaces
    List,
    /// List members of the workspace
    Members,
    /// Invite an existing user
    AddMember {
        email: String,
        #[arg(long, default_value = "editor", value_parser = parse_role)]
        role: Role,
    },
    /// Change a member's role
    SetRole {
        email: String,
        #[arg(value_parser = parse_role)]
        role: Role,
    },
    /// Remove a member (or yourself)
    RemoveMember { email: String },
    /// Delete the workspace and everything in it
    Delete {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum CategoryCommand {
    Add {
        name: String,
        #[arg(long, default_value = "expense", value_parser = parse_kind)]
        kind: TxnKind,
    },
    List,
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub(crate) enum TxnCommand {
    /// Record a transaction
    Add {
        #[arg(value_parser = parse_amount)]
        amount: Decimal,
        description: String,
        #[arg(long, default_value = "expense", value_parser = parse_kind)]
        kind: TxnKind,
        /// YYYY-MM-DD (default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long)]
        category: Option<i64>,
        /// Currency code (default: your preferred currency)
        #[arg(long)]
        currency: Option<String>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// List transactions, newest first
    List {
        #[arg(long)]
        month: Option<String>,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long, value_parser = parse_kind)]
        kind: Option<TxnKind>,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub(crate) enum BudgetCommand {
    /// Set the limit for a category in a month
    Set {
        category: i64,
        #[arg(value_parser = parse_amount)]
        limit: Decimal,
        /// Month as YYYY-MM (default: current)
        #[arg(long)]
        month: Option<String>,
    },
    /// Show budgets against actual spending
    List {
        #[arg(long)]
        month: Option<String>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub(crate) enum RecurringCommand {
    /// Create a recurring template
    Add {
        name: String,
        #[arg(value_parser = parse_amount)]
        amount: Decimal,
        #[arg(long, value_parser = parse_frequency)]
        frequency: Frequency,
        /// First occurrence, YYYY-MM-DD
        #[arg(long, value_parser = parse_date)]
        start: NaiveDate,
        /// Last possible occurrence, YYYY-MM-DD
        #[arg(long, value_parser = parse_date)]
        end: Option<NaiveDate>,
        #[arg(long, default_value = "expense", value_parser = parse_kind)]
        kind: TxnKind,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    List,
    Pause { id: i64 },
    Resume { id: i64 },
    Delete { id: i64 },
    /// Record every due occurrence (one step per template)
    Process,
}

#[derive(Subcommand, Debug)]
pub(crate) enum DebtCommand {
    Add {
        name: String,
        #[arg(value_parser = parse_amount)]
        principal: Decimal,
        #[arg(long, default_value = "")]
        lender: String,
        /// Annual interest rate in percent
        #[arg(long, default_value = "0", value_parser = parse_amount)]
        rate: Decimal,
        #[arg(long, default_value = "0", value_parser = parse_amount)]
        min_payment: Decimal,
        #[arg(long)]
        due_day: Option<u32>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    List,
    /// Record a payment
    Pay {
        id: i64,
        #[arg(value_parser = parse_amount)]
        amount: Decimal,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub(crate) enum PrefsCommand {
    Show,
    Set {
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        default_workspace: Option<i64>,
    },
}

// ── Value parsers ─────────────────────────────────────────────

fn parse_amount(s: &str) -> Result<Decimal, String> {
    let cleaned = s.trim().replace(['$', ','], "");
    Decimal::from_str(&cleaned).map_err(|_| format!("'{s}' is not a number"))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("'{s}' is not a YYYY-MM-DD date"))
}

fn parse_kind(s: &str) -> Result<TxnKind, String> {
    TxnKind::parse(s).ok_or_else(|| format!("'{s}' is not income or expense"))
}

fn parse_role(s: &str) -> Result<Role, String> {
    Role::parse(s).ok_or_else(|| {
        let names: Vec<&str> = Role::all().iter().map(|r| r.as_str()).collect();
        format!("'{s}' is not one of: {}", names.join(", "))
    })
}

fn parse_frequency(s: &str) -> Result<Frequency, String> {
    Frequency::parse(s).ok_or_else(|| {
        let names: Vec<&str> = Frequency::all().iter().map(|f| f.as_str()).collect();
        format!("'{s}' is not one of: {}", names.join(", "))
    })
}
