// 🗂️ Editgroup Manager - Open -> Accepted | Abandoned
//
// Acceptance is the only place catalog state changes. It runs in a single
// IMMEDIATE transaction: every edit is applied through the identity CAS, the
// editgroup is closed and one changelog entry appended. Any failure drops the
// transaction, so either all edits land or none do.

use crate::changelog::{self, ChangelogEntry};
use crate::db::{now_str, parse_json, parse_ts};
use crate::editors;
use crate::edits::{self, Edit, EditAction};
use crate::entities::Extra;
use crate::error::{CatalogError, Result};
use crate::ident::{EditgroupId, EditorId, EntityId};
use crate::identities;
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditgroupStatus {
    Open,
    Accepted,
    Abandoned,
}

impl EditgroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditgroupStatus::Open => "open",
            EditgroupStatus::Accepted => "accepted",
            EditgroupStatus::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for EditgroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for EditgroupStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for EditgroupStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "open" => Ok(EditgroupStatus::Open),
            "accepted" => Ok(EditgroupStatus::Accepted),
            "abandoned" => Ok(EditgroupStatus::Abandoned),
            other => Err(FromSqlError::Other(
                format!("unknown editgroup status: {}", other).into(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Editgroup {
    pub id: EditgroupId,
    pub editor_id: EditorId,
    pub status: EditgroupStatus,
    pub description: Option<String>,
    pub extra: Extra,
    pub created_at: DateTime<Utc>,
    /// When the group was accepted or abandoned
    pub closed_at: Option<DateTime<Utc>>,
    /// Staged edits in order; empty when only the header was loaded
    pub edits: Vec<Edit>,
    pub changelog: Option<ChangelogEntry>,
}

fn editgroup_from_row(row: &Row<'_>) -> rusqlite::Result<Editgroup> {
    let extra: Option<String> = row.get(4)?;
    let created_at: String = row.get(5)?;
    let closed_at: Option<String> = row.get(6)?;
    Ok(Editgroup {
        id: row.get(0)?,
        editor_id: row.get(1)?,
        status: row.get(2)?,
        description: row.get(3)?,
        extra: match extra {
            Some(raw) => parse_json(&raw, 4)?,
            None => Extra::new(),
        },
        created_at: parse_ts(&created_at, 5)?,
        closed_at: closed_at.map(|raw| parse_ts(&raw, 6)).transpose()?,
        edits: Vec::new(),
        changelog: None,
    })
}

pub fn create(
    conn: &Connection,
    editor_id: &EditorId,
    description: Option<&str>,
    extra: Extra,
) -> Result<EditgroupId> {
    // Unknown submitters are rejected before anything is written
    editors::get(conn, editor_id)?;

    let id = EditgroupId::generate();
    let extra = if extra.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&extra)?)
    };
    conn.execute(
        "INSERT INTO editgroup (id, editor_id, status, description, extra, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![id, editor_id, EditgroupStatus::Open, description, extra, now_str()],
    )?;

    tracing::info!(editgroup = %id, editor = %editor_id, "created editgroup");
    Ok(id)
}

/// Editgroup header without its edits
pub fn get_row(conn: &Connection, id: &EditgroupId) -> Result<Editgroup> {
    conn.query_row(
        "SELECT id, editor_id, status, description, extra, created_at, closed_at
         FROM editgroup WHERE id = ?1",
        params![id],
        editgroup_from_row,
    )
    .optional()?
    .ok_or_else(|| CatalogError::NotFound(format!("editgroup {}", id)))
}

/// Editgroup with its edits and, once accepted, its changelog entry
pub fn get(conn: &Connection, id: &EditgroupId) -> Result<Editgroup> {
    let mut editgroup = get_row(conn, id)?;
    editgroup.edits = edits::list_edits(conn, id)?;
    editgroup.changelog = changelog::for_editgroup(conn, id)?;
    Ok(editgroup)
}

/// Editgroup header, `NotOpen` unless it is still open
pub fn require_open(conn: &Connection, id: &EditgroupId) -> Result<Editgroup> {
    let editgroup = get_row(conn, id)?;
    if editgroup.status != EditgroupStatus::Open {
        return Err(CatalogError::NotOpen {
            editgroup: id.to_string(),
            status: editgroup.status.to_string(),
        });
    }
    Ok(editgroup)
}

fn close(conn: &Connection, id: &EditgroupId, status: EditgroupStatus) -> Result<()> {
    conn.execute(
        "UPDATE editgroup SET status = ?2, closed_at = ?3 WHERE id = ?1",
        params![id, status, now_str()],
    )?;
    editors::clear_active(conn, id)
}

/// Apply one redirect edit, re-checking the target against current state
fn apply_redirect(conn: &Connection, edit: &Edit, target: &EntityId) -> Result<()> {
    identities::check_redirect_target(conn, &edit.ident, target)?;
    if identities::inbound_redirects(conn, &edit.ident)? > 0 {
        return Err(CatalogError::RedirectChain(format!(
            "{} is itself a redirect target",
            edit.ident
        )));
    }
    identities::apply(
        conn,
        &edit.ident,
        &edit.action,
        edit.previous_revision,
        edit.previous_redirect,
    )
}

fn accept_in(conn: &Connection, id: &EditgroupId) -> Result<ChangelogEntry> {
    require_open(conn, id)?;
    let staged = edits::list_edits(conn, id)?;

    // Revisions and deletes first, so redirects can target identities
    // created by this same group
    let (redirects, others): (Vec<&Edit>, Vec<&Edit>) =
        staged.iter().partition(|e| e.action.is_redirect());

    for edit in others {
        identities::apply(
            conn,
            &edit.ident,
            &edit.action,
            edit.previous_revision,
            edit.previous_redirect,
        )?;
    }
    for edit in redirects {
        if let EditAction::Redirect(target) = &edit.action {
            apply_redirect(conn, edit, target)?;
        }
    }

    close(conn, id, EditgroupStatus::Accepted)?;
    let entry = changelog::append(conn, id)?;

    tracing::info!(
        editgroup = %id,
        seq = entry.seq,
        edits = staged.len(),
        "accepted editgroup"
    );
    Ok(entry)
}

/// Accept an open editgroup, all-or-nothing
pub fn accept(conn: &mut Connection, id: &EditgroupId) -> Result<ChangelogEntry> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    match accept_in(&tx, id) {
        Ok(entry) => {
            tx.commit()?;
            Ok(entry)
        }
        Err(e) => {
            tracing::warn!(editgroup = %id, error = %e, "editgroup rejected");
            // Dropping the transaction rolls back every applied edit
            drop(tx);
            Err(e)
        }
    }
}

/// Close an open editgroup without touching the catalog
pub fn abandon(conn: &Connection, id: &EditgroupId) -> Result<()> {
    require_open(conn, id)?;
    close(conn, id, EditgroupStatus::Abandoned)?;
    tracing::info!(editgroup = %id, "abandoned editgroup");
    Ok(())
}

/// Editgroups of one editor, newest first
pub fn list_for_editor(conn: &Connection, editor_id: &EditorId) -> Result<Vec<Editgroup>> {
    let mut stmt = conn.prepare(
        "SELECT id, editor_id, status, description, extra, created_at, closed_at
         FROM editgroup WHERE editor_id = ?1
         ORDER BY created_at DESC, rowid DESC",
    )?;
    let rows = stmt
        .query_map(params![editor_id], editgroup_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}
