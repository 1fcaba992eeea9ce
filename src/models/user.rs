#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Option<i64>,
    pub email: String,
    pub name: String,
    pub created_at: String,
}

impl User {
    pub fn new(email: &str, name: String) -> Self {
        Self {
            id: None,
            email: email.trim().to_lowercase(),
            name,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Per-user settings. Users without a stored row get `Preferences::new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub user_id: i64,
    pub currency: String,
    pub default_workspace_id: Option<i64>,
}

impl Preferences {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            currency: "USD".to_string(),
            default_workspace_id: None,
        }
    }
}
