// Storage setup
//
// One SQLite database holds the whole catalog. Schema creation is idempotent
// (`CREATE ... IF NOT EXISTS`), so `setup_database` runs on every open.

use crate::config::{CatalogConfig, DatabaseLocation};
use crate::error::Result;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Connection;

/// Open a connection configured for the catalog (WAL, foreign keys, busy timeout)
pub fn open_connection(config: &CatalogConfig) -> Result<Connection> {
    let conn = match &config.database {
        DatabaseLocation::InMemory => Connection::open_in_memory()?,
        DatabaseLocation::File(path) => Connection::open(path)?,
    };

    conn.busy_timeout(config.busy_timeout())?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // In-memory databases report "memory" and stay that way
    if matches!(config.database, DatabaseLocation::File(_)) {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(journal_mode = %mode, "opened catalog database");
    }

    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- ====================================================================
        -- Editors and editgroups
        -- ====================================================================
        CREATE TABLE IF NOT EXISTS editor (
            id TEXT PRIMARY KEY,
            username TEXT UNIQUE NOT NULL,
            is_admin INTEGER NOT NULL DEFAULT 0,
            is_bot INTEGER NOT NULL DEFAULT 0,
            active_editgroup_id TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS editgroup (
            id TEXT PRIMARY KEY,
            editor_id TEXT NOT NULL REFERENCES editor(id),
            status TEXT NOT NULL CHECK (status IN ('open', 'accepted', 'abandoned')),
            description TEXT,
            extra TEXT,
            created_at TEXT NOT NULL,
            closed_at TEXT
        );

        -- ====================================================================
        -- Revisions (append-only) and their relation/lookup indexes
        -- ====================================================================
        CREATE TABLE IF NOT EXISTS revision (
            id TEXT PRIMARY KEY,
            entity_type TEXT NOT NULL,
            body TEXT NOT NULL,
            content_sha256 TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS rev_relation (
            rev_id TEXT NOT NULL REFERENCES revision(id),
            kind TEXT NOT NULL,
            target_id TEXT NOT NULL,
            position INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS rev_extid (
            rev_id TEXT NOT NULL REFERENCES revision(id),
            kind TEXT NOT NULL,
            value TEXT NOT NULL
        );

        -- ====================================================================
        -- Identities (one shared id space for every entity type)
        -- ====================================================================
        CREATE TABLE IF NOT EXISTS ident (
            id TEXT PRIMARY KEY,
            entity_type TEXT NOT NULL,
            rev_id TEXT REFERENCES revision(id),
            redirect_id TEXT REFERENCES ident(id),
            is_live INTEGER NOT NULL DEFAULT 0,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            CHECK (rev_id IS NULL OR redirect_id IS NULL)
        );

        -- ====================================================================
        -- Edits: at most one per (editgroup, identity)
        -- ====================================================================
        CREATE TABLE IF NOT EXISTS edit (
            id TEXT PRIMARY KEY,
            editgroup_id TEXT NOT NULL REFERENCES editgroup(id),
            ident_id TEXT NOT NULL REFERENCES ident(id),
            entity_type TEXT NOT NULL,
            prev_rev TEXT REFERENCES revision(id),
            prev_redirect TEXT REFERENCES ident(id),
            new_rev TEXT REFERENCES revision(id),
            redirect_id TEXT REFERENCES ident(id),
            is_delete INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            UNIQUE (editgroup_id, ident_id)
        );

        -- ====================================================================
        -- Changelog: gapless sequence of accepted editgroups
        -- ====================================================================
        CREATE TABLE IF NOT EXISTS changelog (
            seq INTEGER PRIMARY KEY,
            editgroup_id TEXT UNIQUE NOT NULL REFERENCES editgroup(id),
            accepted_at TEXT NOT NULL
        );

        -- ====================================================================
        -- Indexes
        -- ====================================================================
        CREATE INDEX IF NOT EXISTS idx_editgroup_editor ON editgroup(editor_id);
        CREATE INDEX IF NOT EXISTS idx_rev_relation_rev ON rev_relation(rev_id);
        CREATE INDEX IF NOT EXISTS idx_rev_relation_target ON rev_relation(kind, target_id);
        CREATE INDEX IF NOT EXISTS idx_rev_extid_lookup ON rev_extid(kind, value);
        CREATE INDEX IF NOT EXISTS idx_ident_rev ON ident(rev_id);
        CREATE INDEX IF NOT EXISTS idx_ident_redirect ON ident(redirect_id);
        CREATE INDEX IF NOT EXISTS idx_ident_type_live ON ident(entity_type, is_live);
        CREATE INDEX IF NOT EXISTS idx_edit_ident ON edit(ident_id);
        ",
    )?;

    Ok(())
}

/// Current time in the storage format
pub fn now_str() -> String {
    Utc::now().to_rfc3339()
}

/// Parse a stored RFC 3339 timestamp (column `idx` of the current row)
pub fn parse_ts(raw: &str, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse a stored JSON column (column `idx` of the current row)
pub fn parse_json<T: serde::de::DeserializeOwned>(raw: &str, idx: usize) -> rusqlite::Result<T> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Number of rows in a table
pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();

        for table in ["editor", "editgroup", "revision", "ident", "edit", "changelog"] {
            assert_eq!(count_rows(&conn, table).unwrap(), 0, "{} should start empty", table);
        }
    }

    #[test]
    fn test_ident_rejects_revision_and_redirect_together() {
        let conn = open_connection(&CatalogConfig::default()).unwrap();
        let now = now_str();
        conn.execute(
            "INSERT INTO revision (id, entity_type, body, content_sha256, created_at)
             VALUES ('r1', 'work', '{}', 'x', ?1)",
            [&now],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO ident (id, entity_type, created_at) VALUES ('a', 'work', ?1)",
            [&now],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO ident (id, entity_type, rev_id, redirect_id, created_at)
             VALUES ('b', 'work', 'r1', 'a', ?1)",
            [&now],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_timestamp_round_trip() {
        let raw = now_str();
        let parsed = parse_ts(&raw, 0).unwrap();
        assert_eq!(parsed.to_rfc3339(), raw);
        assert!(parse_ts("yesterday", 0).is_err());
    }
}
