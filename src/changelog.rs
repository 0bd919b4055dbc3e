// 📜 Changelog - gapless, ordered record of accepted editgroups
//
// `append` is only called from inside the accepting transaction, which holds
// the write lock, so MAX(seq) + 1 cannot race with another acceptance.

use crate::db::{now_str, parse_ts};
use crate::error::{CatalogError, Result};
use crate::ident::EditgroupId;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub seq: i64,
    pub editgroup_id: EditgroupId,
    pub accepted_at: DateTime<Utc>,
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<ChangelogEntry> {
    let accepted_at: String = row.get(2)?;
    Ok(ChangelogEntry {
        seq: row.get(0)?,
        editgroup_id: row.get(1)?,
        accepted_at: parse_ts(&accepted_at, 2)?,
    })
}

/// Append the next entry for an accepted editgroup
pub fn append(conn: &Connection, editgroup_id: &EditgroupId) -> Result<ChangelogEntry> {
    let seq: i64 = conn.query_row("SELECT COALESCE(MAX(seq), 0) + 1 FROM changelog", [], |row| {
        row.get(0)
    })?;
    conn.execute(
        "INSERT INTO changelog (seq, editgroup_id, accepted_at) VALUES (?1, ?2, ?3)",
        params![seq, editgroup_id, now_str()],
    )?;
    get(conn, seq)
}

/// Entries with `seq >= from_seq`, ascending, at most `limit` of them
pub fn read(conn: &Connection, from_seq: i64, limit: usize) -> Result<Vec<ChangelogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT seq, editgroup_id, accepted_at FROM changelog
         WHERE seq >= ?1 ORDER BY seq LIMIT ?2",
    )?;
    let entries = stmt
        .query_map(params![from_seq, i64::try_from(limit).unwrap_or(i64::MAX)], entry_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

pub fn get(conn: &Connection, seq: i64) -> Result<ChangelogEntry> {
    conn.query_row(
        "SELECT seq, editgroup_id, accepted_at FROM changelog WHERE seq = ?1",
        params![seq],
        entry_from_row,
    )
    .optional()?
    .ok_or_else(|| CatalogError::NotFound(format!("changelog entry {}", seq)))
}

pub fn latest(conn: &Connection) -> Result<Option<ChangelogEntry>> {
    let entry = conn
        .query_row(
            "SELECT seq, editgroup_id, accepted_at FROM changelog ORDER BY seq DESC LIMIT 1",
            [],
            entry_from_row,
        )
        .optional()?;
    Ok(entry)
}

/// Entry recording the acceptance of this editgroup, if it was accepted
pub fn for_editgroup(conn: &Connection, editgroup_id: &EditgroupId) -> Result<Option<ChangelogEntry>> {
    let entry = conn
        .query_row(
            "SELECT seq, editgroup_id, accepted_at FROM changelog WHERE editgroup_id = ?1",
            params![editgroup_id],
            entry_from_row,
        )
        .optional()?;
    Ok(entry)
}

// ============================================================================
// LAZY PAGING
// ============================================================================

/// Iterator over the changelog that fetches one page at a time.
///
/// `fetch(from_seq, limit)` is called whenever the buffer runs dry. Entries
/// appended after iteration started are picked up by later pages. Use
/// `next_seq` to resume from a saved position.
pub struct ChangelogIter<F>
where
    F: FnMut(i64, usize) -> Result<Vec<ChangelogEntry>>,
{
    fetch: F,
    next_seq: i64,
    page_size: usize,
    buffer: VecDeque<ChangelogEntry>,
    done: bool,
}

impl<F> ChangelogIter<F>
where
    F: FnMut(i64, usize) -> Result<Vec<ChangelogEntry>>,
{
    pub fn new(fetch: F, from_seq: i64, page_size: usize) -> Self {
        ChangelogIter {
            fetch,
            next_seq: from_seq.max(1),
            page_size: page_size.max(1),
            buffer: VecDeque::new(),
            done: false,
        }
    }

    /// Sequence number the next yielded entry will have (at least)
    pub fn next_seq(&self) -> i64 {
        self.buffer.front().map(|e| e.seq).unwrap_or(self.next_seq)
    }
}

impl<F> Iterator for ChangelogIter<F>
where
    F: FnMut(i64, usize) -> Result<Vec<ChangelogEntry>>,
{
    type Item = Result<ChangelogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.done {
            match (self.fetch)(self.next_seq, self.page_size) {
                Ok(page) => {
                    if page.len() < self.page_size {
                        self.done = true;
                    }
                    if let Some(last) = page.last() {
                        self.next_seq = last.seq + 1;
                    }
                    self.buffer.extend(page);
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}
