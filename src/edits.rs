// 📝 Edit Log - one proposed transition per (identity, editgroup)
//
// Staging writes an edit row and, for brand-new entities, allocates a wip
// identity. Nothing here touches live catalog state; that only happens when
// the owning editgroup is accepted.

use crate::db::{now_str, parse_ts};
use crate::editgroups;
use crate::entities::EntityType;
use crate::error::{CatalogError, FieldError, Result};
use crate::ident::{EditId, EditgroupId, EntityId, RevisionId};
use crate::identities;
use crate::revisions;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

/// What an edit does to its identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "target", rename_all = "lowercase")]
pub enum EditAction {
    /// Point the identity at a new revision
    Update(RevisionId),
    /// Merge the identity into another one
    Redirect(EntityId),
    Delete,
}

impl EditAction {
    pub fn is_redirect(&self) -> bool {
        matches!(self, EditAction::Redirect(_))
    }
}

/// Identity an edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityRef {
    /// Allocate a new identity of this type
    New(EntityType),
    Existing(EntityId),
}

/// Stored edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    pub id: EditId,
    pub editgroup_id: EditgroupId,
    pub ident: EntityId,
    pub entity_type: EntityType,
    /// Revision the submitter based this edit on
    pub previous_revision: Option<RevisionId>,
    /// Redirect the identity had when the edit was staged
    pub previous_redirect: Option<EntityId>,
    pub action: EditAction,
    pub created_at: DateTime<Utc>,
}

const EDIT_COLUMNS: &str =
    "id, editgroup_id, ident_id, entity_type, prev_rev, prev_redirect, new_rev, redirect_id, is_delete, created_at";

fn edit_from_row(row: &Row<'_>) -> rusqlite::Result<Edit> {
    let new_rev: Option<RevisionId> = row.get(6)?;
    let redirect: Option<EntityId> = row.get(7)?;
    let is_delete: bool = row.get(8)?;
    let created_at: String = row.get(9)?;

    let action = match (new_rev, redirect, is_delete) {
        (Some(rev), None, false) => EditAction::Update(rev),
        (None, Some(target), false) => EditAction::Redirect(target),
        (None, None, true) => EditAction::Delete,
        _ => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                "edit row has no single action".into(),
            ))
        }
    };

    Ok(Edit {
        id: row.get(0)?,
        editgroup_id: row.get(1)?,
        ident: row.get(2)?,
        entity_type: row.get(3)?,
        previous_revision: row.get(4)?,
        previous_redirect: row.get(5)?,
        action,
        created_at: parse_ts(&created_at, 9)?,
    })
}

fn bad_request(field: &str, message: impl Into<String>) -> CatalogError {
    CatalogError::validation(vec![FieldError::new("edit", field, message)])
}

/// Stage one edit inside an open editgroup.
///
/// Fails with `EditConflict` when the editgroup already holds an edit for the
/// same identity. Edits in other editgroups are not consulted.
pub fn stage_edit(
    conn: &Connection,
    editgroup_id: &EditgroupId,
    target: IdentityRef,
    previous_revision: Option<RevisionId>,
    action: EditAction,
) -> Result<Edit> {
    editgroups::require_open(conn, editgroup_id)?;

    // Resolve the identity (and the redirect it has right now)
    let (ident, entity_type, previous_redirect) = match target {
        IdentityRef::New(entity_type) => {
            if !matches!(action, EditAction::Update(_)) {
                return Err(bad_request(
                    "action",
                    "a new identity can only receive a revision",
                ));
            }
            if previous_revision.is_some() {
                return Err(bad_request(
                    "previous_revision",
                    "a new identity has no previous revision",
                ));
            }
            (None, entity_type, None)
        }
        IdentityRef::Existing(id) => {
            let identity = identities::get(conn, &id)?;
            if identity.is_deleted {
                return Err(CatalogError::Gone(format!("identity {}", id)));
            }
            if !identity.is_live {
                return Err(CatalogError::NotFound(format!(
                    "identity {} (not yet accepted)",
                    id
                )));
            }
            if find_pending(conn, editgroup_id, &id)?.is_some() {
                return Err(CatalogError::EditConflict {
                    editgroup: editgroup_id.to_string(),
                    ident: id.to_string(),
                });
            }
            if identity.revision.is_some() && previous_revision.is_none() {
                return Err(bad_request(
                    "previous_revision",
                    format!("identity {} has a current revision; name it as the base", id),
                ));
            }
            let previous_redirect = if previous_revision.is_none() {
                identity.redirect
            } else {
                None
            };
            (Some(id), identity.entity_type, previous_redirect)
        }
    };

    match action {
        EditAction::Update(rev) => match revisions::entity_type_of(conn, &rev)? {
            None => return Err(CatalogError::NotFound(format!("revision {}", rev))),
            Some(rev_type) if rev_type != entity_type => {
                return Err(bad_request(
                    "new_revision",
                    format!("revision {} is a {}, identity is a {}", rev, rev_type, entity_type),
                ))
            }
            Some(_) => {}
        },
        EditAction::Redirect(redirect_target) => {
            let source = ident.ok_or_else(|| bad_request("action", "cannot redirect a new identity"))?;
            let target_type = match created_in_group(conn, editgroup_id, &redirect_target)? {
                Some(created_type) => created_type,
                None => identities::check_redirect_target(conn, &source, &redirect_target)?.entity_type,
            };
            if target_type != entity_type {
                return Err(bad_request(
                    "redirect",
                    format!("cannot redirect a {} to a {}", entity_type, target_type),
                ));
            }
        }
        EditAction::Delete => {}
    }

    if let Some(prev) = previous_revision {
        if revisions::entity_type_of(conn, &prev)?.is_none() {
            return Err(CatalogError::NotFound(format!("revision {}", prev)));
        }
    }

    let ident = match ident {
        Some(id) => id,
        None => identities::allocate(conn, entity_type)?,
    };

    let (new_rev, redirect_id, is_delete) = match action {
        EditAction::Update(rev) => (Some(rev), None, false),
        EditAction::Redirect(t) => (None, Some(t), false),
        EditAction::Delete => (None, None, true),
    };

    let id = EditId::generate();
    let created_at = now_str();
    conn.execute(
        "INSERT INTO edit (id, editgroup_id, ident_id, entity_type, prev_rev, prev_redirect,
                           new_rev, redirect_id, is_delete, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            id,
            editgroup_id,
            ident,
            entity_type,
            previous_revision,
            previous_redirect,
            new_rev,
            redirect_id,
            is_delete,
            created_at,
        ],
    )?;

    tracing::debug!(
        edit = %id,
        editgroup = %editgroup_id,
        ident = %ident,
        entity_type = %entity_type,
        "staged edit"
    );

    get(conn, &id)
}

pub fn get(conn: &Connection, id: &EditId) -> Result<Edit> {
    conn.query_row(
        &format!("SELECT {} FROM edit WHERE id = ?1", EDIT_COLUMNS),
        params![id],
        edit_from_row,
    )
    .optional()?
    .ok_or_else(|| CatalogError::NotFound(format!("edit {}", id)))
}

/// Type of `ident` when it is a wip identity this editgroup is creating
fn created_in_group(conn: &Connection, editgroup_id: &EditgroupId, ident: &EntityId) -> Result<Option<EntityType>> {
    match identities::fetch(conn, ident)? {
        Some(identity) if !identity.is_live => Ok(find_pending(conn, editgroup_id, ident)?
            .filter(|edit| matches!(edit.action, EditAction::Update(_)))
            .map(|edit| edit.entity_type)),
        _ => Ok(None),
    }
}

/// Pending edit for `ident` in this editgroup, if any
pub fn find_pending(conn: &Connection, editgroup_id: &EditgroupId, ident: &EntityId) -> Result<Option<Edit>> {
    let edit = conn
        .query_row(
            &format!(
                "SELECT {} FROM edit WHERE editgroup_id = ?1 AND ident_id = ?2",
                EDIT_COLUMNS
            ),
            params![editgroup_id, ident],
            edit_from_row,
        )
        .optional()?;
    Ok(edit)
}

/// Edits of one editgroup, in staging order
pub fn list_edits(conn: &Connection, editgroup_id: &EditgroupId) -> Result<Vec<Edit>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM edit WHERE editgroup_id = ?1 ORDER BY rowid",
        EDIT_COLUMNS
    ))?;
    let edits = stmt
        .query_map(params![editgroup_id], edit_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(edits)
}

/// Drop a pending edit from an open editgroup.
///
/// An identity allocated for it stays behind as wip; nothing points at it.
pub fn remove_edit(conn: &Connection, id: &EditId) -> Result<Edit> {
    let edit = get(conn, id)?;
    editgroups::require_open(conn, &edit.editgroup_id)?;
    conn.execute("DELETE FROM edit WHERE id = ?1", params![id])?;
    tracing::debug!(edit = %id, editgroup = %edit.editgroup_id, "removed edit");
    Ok(edit)
}

/// Accepted edits on one identity, newest first
pub fn accepted_for_ident(conn: &Connection, ident: &EntityId) -> Result<Vec<Edit>> {
    let mut stmt = conn.prepare(
        "SELECT e.id, e.editgroup_id, e.ident_id, e.entity_type, e.prev_rev, e.prev_redirect,
                e.new_rev, e.redirect_id, e.is_delete, e.created_at
         FROM edit e
         JOIN changelog c ON c.editgroup_id = e.editgroup_id
         WHERE e.ident_id = ?1
         ORDER BY c.seq DESC",
    )?;
    let edits = stmt
        .query_map(params![ident], edit_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(edits)
}
