use super::TxnKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: Option<i64>,
    pub workspace_id: i64,
    pub name: String,
    pub kind: TxnKind,
}

impl Category {
    pub fn new(workspace_id: i64, name: String, kind: TxnKind) -> Self {
        Self {
            id: None,
            workspace_id,
            name,
            kind,
        }
    }

    /// Find a category by name (case-insensitive) in a slice.
    pub fn find_by_name<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
        let lower = name.to_lowercase();
        categories.iter().find(|c| c.name.to_lowercase() == lower)
    }

    /// Find a category by ID in a slice.
    pub fn find_by_id(categories: &[Category], id: i64) -> Option<&Category> {
        categories.iter().find(|c| c.id == Some(id))
    }

    /// Categories every new workspace starts with.
    pub fn defaults() -> &'static [(&'static str, TxnKind)] {
        &[
            ("Salary", TxnKind::Income),
            ("Freelance", TxnKind::Income),
            ("Interest", TxnKind::Income),
            ("Other Income", TxnKind::Income),
            ("Housing", TxnKind::Expense),
            ("Utilities", TxnKind::Expense),
            ("Groceries", TxnKind::Expense),
            ("Restaurants", TxnKind::Expense),
            ("Transportation", TxnKind::Expense),
            ("Insurance", TxnKind::Expense),
            ("Health & Fitness", TxnKind::Expense),
            ("Subscriptions", TxnKind::Expense),
            ("Shopping", TxnKind::Expense),
            ("Entertainment", TxnKind::Expense),
            ("Debt Payments", TxnKind::Expense),
            ("Savings", TxnKind::Expense),
        ]
    }
}
