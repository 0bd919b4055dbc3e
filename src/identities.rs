// 🪪 Identity Store - permanent ids and their mutable pointers
//
// An identity never goes away. What changes is where it points: at a
// revision, at another identity (redirect), or nowhere (deleted). Only
// editgroup acceptance moves the pointer, through `apply`, which is a
// compare-and-swap against the base the edit was staged on.

use crate::db::{now_str, parse_ts};
use crate::edits::EditAction;
use crate::entities::{EntityType, RelationKind};
use crate::error::{CatalogError, Result};
use crate::ident::{EntityId, RevisionId};
use crate::validation::ExternalId;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

/// Reader-facing lifecycle state of an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityState {
    /// Allocated by a pending edit, not yet accepted
    Wip,
    Active,
    Redirect,
    Deleted,
}

/// Stored identity row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: EntityId,
    pub entity_type: EntityType,
    pub revision: Option<RevisionId>,
    pub redirect: Option<EntityId>,
    pub is_live: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    pub fn state(&self) -> EntityState {
        if !self.is_live {
            EntityState::Wip
        } else if self.is_deleted {
            EntityState::Deleted
        } else if self.redirect.is_some() {
            EntityState::Redirect
        } else {
            EntityState::Active
        }
    }

    /// Live, not deleted, and pointing at a revision
    pub fn is_active(&self) -> bool {
        self.state() == EntityState::Active
    }
}

/// Outcome of resolving an id for readers
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The id itself points at a revision (or is still wip)
    Current(Identity),
    /// The id redirects; `target` is the identity it points at (one hop)
    RedirectsTo { from: Identity, target: Identity },
}

impl Resolution {
    /// Identity whose revision readers should see
    pub fn effective(&self) -> &Identity {
        match self {
            Resolution::Current(identity) => identity,
            Resolution::RedirectsTo { target, .. } => target,
        }
    }
}

const IDENT_COLUMNS: &str = "id, entity_type, rev_id, redirect_id, is_live, is_deleted, created_at";

fn identity_from_row(row: &Row<'_>) -> rusqlite::Result<Identity> {
    let created_at: String = row.get(6)?;
    Ok(Identity {
        id: row.get(0)?,
        entity_type: row.get(1)?,
        revision: row.get(2)?,
        redirect: row.get(3)?,
        is_live: row.get(4)?,
        is_deleted: row.get(5)?,
        created_at: parse_ts(&created_at, 6)?,
    })
}

/// Generate and insert a fresh identity (not live)
pub fn allocate(conn: &Connection, entity_type: EntityType) -> Result<EntityId> {
    let id = EntityId::generate();
    conn.execute(
        "INSERT INTO ident (id, entity_type, is_live, is_deleted, created_at)
         VALUES (?1, ?2, 0, 0, ?3)",
        params![id, entity_type, now_str()],
    )?;
    tracing::debug!(ident = %id, entity_type = %entity_type, "allocated identity");
    Ok(id)
}

pub fn fetch(conn: &Connection, id: &EntityId) -> Result<Option<Identity>> {
    let identity = conn
        .query_row(
            &format!("SELECT {} FROM ident WHERE id = ?1", IDENT_COLUMNS),
            params![id],
            identity_from_row,
        )
        .optional()?;
    Ok(identity)
}

/// Identity row, `NotFound` if the id was never allocated
pub fn get(conn: &Connection, id: &EntityId) -> Result<Identity> {
    fetch(conn, id)?.ok_or_else(|| CatalogError::NotFound(format!("identity {}", id)))
}

/// Resolve an id, following at most one redirect hop
pub fn resolve(conn: &Connection, id: &EntityId) -> Result<Resolution> {
    let identity = get(conn, id)?;
    if identity.is_deleted {
        return Err(CatalogError::Gone(format!("identity {}", id)));
    }

    match identity.redirect {
        None => Ok(Resolution::Current(identity)),
        Some(target_id) => {
            let target = get(conn, &target_id)?;
            if target.is_deleted {
                return Err(CatalogError::Gone(format!(
                    "identity {} redirects to deleted {}",
                    id, target_id
                )));
            }
            if target.redirect.is_some() {
                return Err(CatalogError::RedirectChain(format!(
                    "{} -> {} -> {}",
                    id,
                    target_id,
                    target.redirect.map(|r| r.to_string()).unwrap_or_default()
                )));
            }
            Ok(Resolution::RedirectsTo {
                from: identity,
                target,
            })
        }
    }
}

/// Check that `target` may receive a redirect right now
pub fn check_redirect_target(conn: &Connection, source: &EntityId, target: &EntityId) -> Result<Identity> {
    if source == target {
        return Err(CatalogError::RedirectChain(format!(
            "{} cannot redirect to itself",
            source
        )));
    }
    let target_row = get(conn, target)?;
    if target_row.is_deleted {
        return Err(CatalogError::Gone(format!("redirect target {}", target)));
    }
    if !target_row.is_live {
        return Err(CatalogError::RedirectChain(format!(
            "redirect target {} is not live",
            target
        )));
    }
    if let Some(next) = target_row.redirect {
        return Err(CatalogError::RedirectChain(format!(
            "redirect target {} itself redirects to {}",
            target, next
        )));
    }
    Ok(target_row)
}

/// Number of live identities currently redirecting to `id`
pub fn inbound_redirects(conn: &Connection, id: &EntityId) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM ident WHERE redirect_id = ?1 AND is_live = 1 AND is_deleted = 0",
        params![id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Compare-and-swap the identity pointer.
///
/// Succeeds only when the identity is not deleted and still points at
/// `expected_rev` / `expected_redirect`. Any mismatch is a `Conflict`.
/// Must run inside the accepting transaction.
pub fn apply(
    conn: &Connection,
    id: &EntityId,
    action: &EditAction,
    expected_rev: Option<RevisionId>,
    expected_redirect: Option<EntityId>,
) -> Result<()> {
    let changed = match action {
        EditAction::Update(rev) => conn.execute(
            "UPDATE ident SET rev_id = ?2, redirect_id = NULL, is_live = 1
             WHERE id = ?1 AND is_deleted = 0 AND rev_id IS ?3 AND redirect_id IS ?4",
            params![id, rev, expected_rev, expected_redirect],
        )?,
        EditAction::Redirect(target) => conn.execute(
            "UPDATE ident SET rev_id = NULL, redirect_id = ?2, is_live = 1
             WHERE id = ?1 AND is_deleted = 0 AND rev_id IS ?3 AND redirect_id IS ?4",
            params![id, target, expected_rev, expected_redirect],
        )?,
        EditAction::Delete => conn.execute(
            "UPDATE ident SET rev_id = NULL, redirect_id = NULL, is_live = 1, is_deleted = 1
             WHERE id = ?1 AND is_deleted = 0 AND rev_id IS ?2 AND redirect_id IS ?3",
            params![id, expected_rev, expected_redirect],
        )?,
    };

    if changed == 1 {
        return Ok(());
    }

    // Work out why the swap failed
    let current = get(conn, id)?;
    let reason = if current.is_deleted {
        "identity was deleted".to_string()
    } else if current.redirect != expected_redirect {
        format!(
            "stale base: expected redirect {:?}, found {:?}",
            expected_redirect.map(|r| r.to_string()),
            current.redirect.map(|r| r.to_string())
        )
    } else {
        format!(
            "stale base: expected revision {:?}, found {:?}",
            expected_rev.map(|r| r.to_string()),
            current.revision.map(|r| r.to_string())
        )
    };
    Err(CatalogError::Conflict {
        ident: id.to_string(),
        reason,
    })
}

// ============================================================================
// LOOKUPS OVER CURRENT STATE
// ============================================================================

/// Active identity whose current revision carries this external id
pub fn find_by_external_id(conn: &Connection, extid: &ExternalId) -> Result<Option<Identity>> {
    let identity = conn
        .query_row(
            "SELECT i.id, i.entity_type, i.rev_id, i.redirect_id, i.is_live, i.is_deleted, i.created_at
             FROM ident i
             JOIN rev_extid x ON x.rev_id = i.rev_id
             WHERE x.kind = ?1 AND x.value = ?2 AND i.is_live = 1 AND i.is_deleted = 0
             ORDER BY i.created_at
             LIMIT 1",
            params![extid.kind(), extid.value()],
            identity_from_row,
        )
        .optional()?;
    Ok(identity)
}

/// Active identities whose current revision links to `target` with `kind`
pub fn referrers(conn: &Connection, kind: RelationKind, target: &EntityId) -> Result<Vec<Identity>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT i.id, i.entity_type, i.rev_id, i.redirect_id, i.is_live, i.is_deleted, i.created_at
         FROM ident i
         JOIN rev_relation r ON r.rev_id = i.rev_id
         WHERE r.kind = ?1 AND r.target_id = ?2 AND i.is_live = 1 AND i.is_deleted = 0
         ORDER BY i.created_at, i.id",
    )?;
    let rows = stmt
        .query_map(params![kind.as_str(), target], identity_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// One random active identity of the given type
pub fn random_active(conn: &Connection, entity_type: EntityType) -> Result<Option<Identity>> {
    let identity = conn
        .query_row(
            &format!(
                "SELECT {} FROM ident
                 WHERE entity_type = ?1 AND is_live = 1 AND is_deleted = 0 AND rev_id IS NOT NULL
                 ORDER BY RANDOM() LIMIT 1",
                IDENT_COLUMNS
            ),
            params![entity_type],
            identity_from_row,
        )
        .optional()?;
    Ok(identity)
}

/// Count identities of a type, optionally only live ones
pub fn count(conn: &Connection, entity_type: EntityType, live_only: bool) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM ident WHERE entity_type = ?1 AND (?2 = 0 OR is_live = 1)",
        params![entity_type, live_only],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use crate::db::open_connection;
    use crate::entities::{EntityBody, Work};
    use crate::revisions;

    fn setup() -> Connection {
        open_connection(&CatalogConfig::default()).unwrap()
    }

    fn work_rev(conn: &Connection, title: &str) -> RevisionId {
        revisions::create(conn, &EntityBody::from(Work::titled(title))).unwrap()
    }

    #[test]
    fn test_allocate_is_wip_until_applied() {
        let conn = setup();
        let id = allocate(&conn, EntityType::Work).unwrap();

        let identity = get(&conn, &id).unwrap();
        assert_eq!(identity.state(), EntityState::Wip);
        assert!(identity.revision.is_none());
        assert_eq!(count(&conn, EntityType::Work, true).unwrap(), 0);
        assert_eq!(count(&conn, EntityType::Work, false).unwrap(), 1);

        let rev = work_rev(&conn, "first");
        apply(&conn, &id, &EditAction::Update(rev), None, None).unwrap();

        let identity = get(&conn, &id).unwrap();
        assert_eq!(identity.state(), EntityState::Active);
        assert_eq!(identity.revision, Some(rev));
    }

    #[test]
    fn test_unknown_id_not_found() {
        let conn = setup();
        let result = resolve(&conn, &EntityId::generate());
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_apply_with_stale_base_conflicts() {
        let conn = setup();
        let id = allocate(&conn, EntityType::Work).unwrap();
        let rev1 = work_rev(&conn, "v1");
        let rev2 = work_rev(&conn, "v2");
        let rev3 = work_rev(&conn, "v3");

        apply(&conn, &id, &EditAction::Update(rev1), None, None).unwrap();
        apply(&conn, &id, &EditAction::Update(rev2), Some(rev1), None).unwrap();

        // Still expecting rev1: stale
        let result = apply(&conn, &id, &EditAction::Update(rev3), Some(rev1), None);
        assert!(matches!(result, Err(CatalogError::Conflict { .. })));
        assert_eq!(get(&conn, &id).unwrap().revision, Some(rev2));
    }

    #[test]
    fn test_deleted_identity_is_gone_and_frozen() {
        let conn = setup();
        let id = allocate(&conn, EntityType::Work).unwrap();
        let rev = work_rev(&conn, "doomed");
        apply(&conn, &id, &EditAction::Update(rev), None, None).unwrap();
        apply(&conn, &id, &EditAction::Delete, Some(rev), None).unwrap();

        assert!(matches!(resolve(&conn, &id), Err(CatalogError::Gone(_))));
        assert_eq!(get(&conn, &id).unwrap().state(), EntityState::Deleted);

        let again = apply(&conn, &id, &EditAction::Update(rev), None, None);
        match again {
            Err(CatalogError::Conflict { reason, .. }) => assert!(reason.contains("deleted")),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_follows_one_redirect_hop() {
        let conn = setup();
        let a = allocate(&conn, EntityType::Work).unwrap();
        let b = allocate(&conn, EntityType::Work).unwrap();
        let rev_a = work_rev(&conn, "a");
        let rev_b = work_rev(&conn, "b");
        apply(&conn, &a, &EditAction::Update(rev_a), None, None).unwrap();
        apply(&conn, &b, &EditAction::Update(rev_b), None, None).unwrap();

        check_redirect_target(&conn, &a, &b).unwrap();
        apply(&conn, &a, &EditAction::Redirect(b), Some(rev_a), None).unwrap();

        match resolve(&conn, &a).unwrap() {
            Resolution::RedirectsTo { from, target } => {
                assert_eq!(from.state(), EntityState::Redirect);
                assert_eq!(target.id, b);
                assert_eq!(target.revision, Some(rev_b));
            }
            other => panic!("expected redirect, got {:?}", other),
        }
        assert_eq!(inbound_redirects(&conn, &b).unwrap(), 1);

        // b is fine as a target, a is not (it redirects)
        let c = allocate(&conn, EntityType::Work).unwrap();
        assert!(matches!(
            check_redirect_target(&conn, &c, &a),
            Err(CatalogError::RedirectChain(_))
        ));
        // c is not live yet
        assert!(matches!(
            check_redirect_target(&conn, &b, &c),
            Err(CatalogError::RedirectChain(_))
        ));
        assert!(matches!(
            check_redirect_target(&conn, &b, &b),
            Err(CatalogError::RedirectChain(_))
        ));
    }
}
