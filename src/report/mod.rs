use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::models::{Budget, Category, Transaction};

/// Budget-vs-actual for one category in one month.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BudgetLine {
    pub(crate) budget_id: Option<i64>,
    pub(crate) category_id: i64,
    pub(crate) category_name: String,
    pub(crate) limit: Decimal,
    pub(crate) spent: Decimal,
    /// Negative when over budget.
    pub(crate) remaining: Decimal,
    /// spent / limit; zero when the limit is zero, `None` when the quotient
    /// does not fit in a `Decimal`.
    pub(crate) ratio: Option<Decimal>,
}

impl BudgetLine {
    pub(crate) fn is_over(&self) -> bool {
        self.remaining < Decimal::ZERO
    }
}

/// Income, expenses and spending by category over a set of transactions.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Summary {
    pub(crate) income: Decimal,
    pub(crate) expenses: Decimal,
    pub(crate) net: Decimal,
    /// Largest first.
    pub(crate) spending_by_category: Vec<(String, Decimal)>,
}

/// Expense totals per category id. Uncategorized spending is keyed by `None`.
fn spending_by_category_id(transactions: &[Transaction]) -> HashMap<Option<i64>, Decimal> {
    transactions
        .iter()
        .filter(|t| t.is_expense())
        .fold(HashMap::new(), |mut acc, t| {
            let total = acc.entry(t.category_id).or_insert(Decimal::ZERO);
            *total = total.saturating_add(t.amount);
            acc
        })
}

/// Match each budget against the expenses in `transactions`. The caller
/// passes the transactions of the budgets' month.
pub(crate) fn budget_vs_actual(
    budgets: &[Budget],
    categories: &[Category],
    transactions: &[Transaction],
) -> Vec<BudgetLine> {
    let spent_by_category = spending_by_category_id(transactions);

    let mut lines: Vec<BudgetLine> = budgets
        .iter()
        .map(|budget| {
            let spent = spent_by_category
                .get(&Some(budget.category_id))
                .copied()
                .unwrap_or(Decimal::ZERO);
            let ratio = if budget.limit_amount > Decimal::ZERO {
                spent.checked_div(budget.limit_amount).map(|r| r.round_dp(4))
            } else {
                Some(Decimal::ZERO)
            };
            BudgetLine {
                budget_id: budget.id,
                category_id: budget.category_id,
                category_name: Category::find_by_id(categories, budget.category_id)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                limit: budget.limit_amount,
                spent,
                remaining: budget.limit_amount.saturating_sub(spent),
                ratio,
            }
        })
        .collect();

    lines.sort_by(|a, b| a.category_name.cmp(&b.category_name));
    lines
}

/// Totals saturate at `Decimal::MAX` instead of overflowing.
pub(crate) fn summarize(transactions: &[Transaction], categories: &[Category]) -> Summary {
    let sum_of = |keep: fn(&Transaction) -> bool| {
        transactions
            .iter()
            .filter(|&t| keep(t))
            .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t.amount))
    };
    let income = sum_of(Transaction::is_income);
    let expenses = sum_of(Transaction::is_expense);

    let mut by_name: HashMap<String, Decimal> = HashMap::new();
    for (category_id, amount) in spending_by_category_id(transactions) {
        let name = category_id
            .and_then(|id| Category::find_by_id(categories, id))
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "Uncategorized".to_string());
        let total = by_name.entry(name).or_insert(Decimal::ZERO);
        *total = total.saturating_add(amount);
    }
    let mut spending_by_category: Vec<(String, Decimal)> = by_name.into_iter().collect();
    spending_by_category.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Summary {
        income,
        expenses,
        net: income.saturating_sub(expenses),
        spending_by_category,
    }
}
