use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::auth::{authorize, Permission, Session, SessionSigner};
use crate::db::Database;
use crate::error::AppError;
use crate::models::*;

// ── Sessions ──────────────────────────────────────────────────

/// Register or refresh the user and issue a signed session token.
pub(crate) fn login(
    db: &Database,
    signer: &SessionSigner,
    email: &str,
    name: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(Session, String)> {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(AppError::validation(format!("'{email}' is not an email address")).into());
    };
    if local.is_empty() || domain.is_empty() {
        return Err(AppError::validation(format!("'{email}' is not an email address")).into());
    }
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(local)
        .to_string();

    let user = db.upsert_user(&User::new(email, name))?;
    let session = Session {
        user_id: user.id.ok_or_else(|| anyhow::anyhow!("Stored user has no id"))?,
        email: user.email,
        name: user.name,
    };
    let token = signer.sign(&session, now)?;
    tracing::info!(user_id = session.user_id, "issued session");
    Ok((session, token))
}

/// The stored user behind a session.
pub(crate) fn whoami(db: &Database, session: &Session) -> Result<User> {
    db.get_user_by_id(session.user_id)?.ok_or_else(|| {
        AppError::InvalidSession(format!("user {} no longer exists", session.email)).into()
    })
}

// ── Workspaces ────────────────────────────────────────────────

/// Create a workspace owned by the caller. It becomes the caller's default
/// workspace if they have none yet.
pub(crate) fn create_workspace(db: &mut Database, session: &Session, name: &str) -> Result<Workspace> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("workspace name is required").into());
    }
    let mut workspace = Workspace::new(name.to_string(), session.user_id);
    let id = db.create_workspace(&workspace)?;
    workspace.id = Some(id);

    let mut prefs = db.get_preferences(session.user_id)?;
    if prefs.default_workspace_id.is_none() {
        prefs.default_workspace_id = Some(id);
        db.save_preferences(&prefs)?;
    }
    tracing::info!(workspace_id = id, user_id = session.user_id, "created workspace");
    Ok(workspace)
}

pub(crate) fn list_workspaces(db: &Database, session: &Session) -> Result<Vec<(Workspace, Role)>> {
    db.get_workspaces_for_user(session.user_id)
}

pub(crate) fn delete_workspace(db: &Database, session: &Session, workspace_id: i64) -> Result<()> {
    authorize(db, session, workspace_id, Permission::Manage)?;
    db.delete_workspace(workspace_id)?;
    tracing::info!(workspace_id, user_id = session.user_id, "deleted workspace");
    Ok(())
}

/// The workspace to act on: the explicit one, else the caller's default.
pub(crate) fn resolve_workspace(
    db: &Database,
    session: &Session,
    explicit: Option<i64>,
) -> Result<i64> {
    if let Some(id) = explicit {
        return Ok(id);
    }
    db.get_preferences(session.user_id)?
        .default_workspace_id
        .ok_or_else(|| {
            AppError::validation("no workspace selected; pass --workspace or set a default").into()
        })
}

// ── Members ───────────────────────────────────────────────────

pub(crate) fn list_members(db: &Database, session: &Session, workspace_id: i64) -> Result<Vec<Member>> {
    authorize(db, session, workspace_id, Permission::View)?;
    db.get_members(workspace_id)
}

fn find_user(db: &Database, email: &str) -> Result<User> {
    db.get_user_by_email(email)?.ok_or_else(|| {
        AppError::validation(format!(
            "no user with email '{email}'; they need to log in once first"
        ))
        .into()
    })
}

fn user_id(user: &User) -> Result<i64> {
    user.id
        .ok_or_else(|| anyhow::anyhow!("Stored user {} has no id", user.email))
}

pub(crate) fn add_member(
    db: &Database,
    session: &Session,
    workspace_id: i64,
    email: &str,
    role: Role,
) -> Result<Member> {
    authorize(db, session, workspace_id, Permission::Manage)?;
    let user = find_user(db, email)?;
    let uid = user_id(&user)?;
    if db.get_member_role(workspace_id, uid)?.is_some() {
        return Err(AppError::validation(format!(
            "{} is already a member; use set-role to change their role",
            user.email
        ))
        .into());
    }
    db.upsert_member(workspace_id, uid, role)?;
    tracing::info!(workspace_id, user_id = uid, %role, "added member");
    Ok(Member {
        workspace_id,
        user_id: uid,
        email: user.email,
        name: user.name,
        role,
    })
}

pub(crate) fn set_member_role(
    db: &Database,
    session: &Session,
    workspace_id: i64,
    email: &str,
    role: Role,
) -> Result<()> {
    authorize(db, session, workspace_id, Permission::Manage)?;
    let uid = user_id(&find_user(db, email)?)?;
    let current = db
        .get_member_role(workspace_id, uid)?
        .ok_or(AppError::NotMember(workspace_id))?;
    if current == Role::Owner && role != Role::Owner && db.count_owners(workspace_id)? <= 1 {
        return Err(AppError::LastOwner(workspace_id).into());
    }
    db.upsert_member(workspace_id, uid, role)?;
    tracing::info!(workspace_id, user_id = uid, from = %current, to = %role, "changed member role");
    Ok(())
}

/// Remove a member. Owners may remove anyone; any member may remove
/// themselves. The last owner can do neither.
pub(crate) fn remove_member(
    db: &Database,
    session: &Session,
    workspace_id: i64,
    email: &str,
) -> Result<()> {
    let uid = user_id(&find_user(db, email)?)?;
    let needed = if uid == session.user_id {
        Permission::View
    } else {
        Permission::Manage
    };
    authorize(db, session, workspace_id, needed)?;

    let role = db
        .get_member_role(workspace_id, uid)?
        .ok_or(AppError::NotMember(workspace_id))?;
    if role == Role::Owner && db.count_owners(workspace_id)? <= 1 {
        return Err(AppError::LastOwner(workspace_id).into());
    }
    db.remove_member(workspace_id, uid)?;

    let mut prefs = db.get_preferences(uid)?;
    if prefs.default_workspace_id == Some(workspace_id) {
        prefs.default_workspace_id = None;
        db.save_preferences(&prefs)?;
    }
    tracing::info!(workspace_id, user_id = uid, "removed member");
    Ok(())
}

// ── Preferences ───────────────────────────────────────────────

pub(crate) fn get_preferences(db: &Database, session: &Session) -> Result<Preferences> {
    db.get_preferences(session.user_id)
}

pub(crate) fn update_preferences(
    db: &Database,
    session: &Session,
    currency: Option<&str>,
    default_workspace_id: Option<i64>,
) -> Result<Preferences> {
    let mut prefs = db.get_preferences(session.user_id)?;
    if let Some(code) = currency {
        prefs.currency = normalize_currency(code)?;
    }
    if let Some(workspace_id) = default_workspace_id {
        authorize(db, session, workspace_id, Permission::View)?;
        prefs.default_workspace_id = Some(workspace_id);
    }
    db.save_preferences(&prefs)?;
    Ok(prefs)
}
