// 👤 Editors - accounts that own editgroups

use crate::db::{now_str, parse_ts};
use crate::editgroups::{self, EditgroupStatus};
use crate::entities::Extra;
use crate::error::{CatalogError, FieldError, Result};
use crate::ident::{EditgroupId, EditorId};
use crate::validation::check_username;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Editor {
    pub id: EditorId,
    pub username: String,
    pub is_admin: bool,
    pub is_bot: bool,
    /// Open editgroup that convenience writes go into
    pub active_editgroup: Option<EditgroupId>,
    pub created_at: DateTime<Utc>,
}

const EDITOR_COLUMNS: &str = "id, username, is_admin, is_bot, active_editgroup_id, created_at";

fn editor_from_row(row: &Row<'_>) -> rusqlite::Result<Editor> {
    let created_at: String = row.get(5)?;
    Ok(Editor {
        id: row.get(0)?,
        username: row.get(1)?,
        is_admin: row.get(2)?,
        is_bot: row.get(3)?,
        active_editgroup: row.get(4)?,
        created_at: parse_ts(&created_at, 5)?,
    })
}

pub fn create_editor(conn: &Connection, username: &str, is_admin: bool, is_bot: bool) -> Result<Editor> {
    if let Some(error) = check_username(username) {
        return Err(CatalogError::validation(vec![error]));
    }
    if fetch_by_username(conn, username)?.is_some() {
        return Err(CatalogError::validation(vec![FieldError::new(
            "editor",
            "username",
            format!("'{}' is already taken", username),
        )]));
    }

    let id = EditorId::generate();
    conn.execute(
        "INSERT INTO editor (id, username, is_admin, is_bot, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, username, is_admin, is_bot, now_str()],
    )?;
    tracing::info!(editor = %id, username, "created editor");
    get(conn, &id)
}

pub fn get(conn: &Connection, id: &EditorId) -> Result<Editor> {
    conn.query_row(
        &format!("SELECT {} FROM editor WHERE id = ?1", EDITOR_COLUMNS),
        params![id],
        editor_from_row,
    )
    .optional()?
    .ok_or_else(|| CatalogError::NotFound(format!("editor {}", id)))
}

fn fetch_by_username(conn: &Connection, username: &str) -> Result<Option<Editor>> {
    let editor = conn
        .query_row(
            &format!("SELECT {} FROM editor WHERE username = ?1", EDITOR_COLUMNS),
            params![username],
            editor_from_row,
        )
        .optional()?;
    Ok(editor)
}

pub fn get_by_username(conn: &Connection, username: &str) -> Result<Editor> {
    fetch_by_username(conn, username)?
        .ok_or_else(|| CatalogError::NotFound(format!("editor '{}'", username)))
}

/// Existing editor by username, or a new admin account
pub fn ensure(conn: &Connection, username: &str) -> Result<Editor> {
    match fetch_by_username(conn, username)? {
        Some(editor) => Ok(editor),
        None => create_editor(conn, username, true, false),
    }
}

/// The editor's active editgroup, opening a new one when there is none
pub fn active_editgroup(conn: &Connection, editor_id: &EditorId) -> Result<EditgroupId> {
    let editor = get(conn, editor_id)?;

    if let Some(current) = editor.active_editgroup {
        if editgroups::get_row(conn, &current)?.status == EditgroupStatus::Open {
            return Ok(current);
        }
    }

    let editgroup = editgroups::create(conn, editor_id, None, Extra::new())?;
    conn.execute(
        "UPDATE editor SET active_editgroup_id = ?2 WHERE id = ?1",
        params![editor_id, editgroup],
    )?;
    Ok(editgroup)
}

/// Forget a closed editgroup wherever it is someone's active one
pub(crate) fn clear_active(conn: &Connection, editgroup_id: &EditgroupId) -> Result<()> {
    conn.execute(
        "UPDATE editor SET active_editgroup_id = NULL WHERE active_editgroup_id = ?1",
        params![editgroup_id],
    )?;
    Ok(())
}
