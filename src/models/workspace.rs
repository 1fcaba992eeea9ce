#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    Viewer,
    Editor,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "owner" => Some(Self::Owner),
            "editor" => Some(Self::Editor),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }

    pub fn all() -> &'static [Role] {
        &[Self::Owner, Self::Editor, Self::Viewer]
    }

    pub fn can_edit(&self) -> bool {
        matches!(self, Self::Owner | Self::Editor)
    }

    pub fn can_manage(&self) -> bool {
        matches!(self, Self::Owner)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Workspace {
    pub id: Option<i64>,
    pub name: String,
    pub created_by: i64,
    pub created_at: String,
}

impl Workspace {
    pub fn new(name: String, created_by: i64) -> Self {
        Self {
            id: None,
            name,
            created_by,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A user's membership in a workspace, joined with the user's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub workspace_id: i64,
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}
