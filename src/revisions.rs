// 📦 Revision Store - immutable entity bodies
//
// A revision is written once and never touched again; corrections are new
// revisions. Each insert also records the body's outgoing identity links and
// external ids so current state can be queried by relation or lookup key.

use crate::db::{now_str, parse_json, parse_ts};
use crate::entities::{EntityBody, EntityType};
use crate::error::{CatalogError, FieldError, Result};
use crate::ident::RevisionId;
use crate::identities;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Stored revision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Revision {
    pub id: RevisionId,
    pub entity_type: EntityType,
    pub body: EntityBody,
    /// SHA-256 of the canonical (sorted-key) JSON body
    pub content_sha256: String,
    pub created_at: DateTime<Utc>,
}

/// Canonical JSON text and its SHA-256 fingerprint
pub fn fingerprint(body: &EntityBody) -> Result<(String, String)> {
    // serde_json::Value keeps object keys sorted, so this text is stable
    let canonical = serde_json::to_value(body)?.to_string();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok((canonical, format!("{:x}", hasher.finalize())))
}

/// Field errors for links that point at unknown or wrongly typed identities
fn check_links(conn: &Connection, body: &EntityBody) -> Result<Vec<FieldError>> {
    let entity = body.entity_type().as_str();
    let mut errors = Vec::new();

    for relation in body.relations() {
        let field = relation.kind.field();
        let expected = relation.kind.target_type();
        match identities::fetch(conn, &relation.target)? {
            None => errors.push(FieldError::new(
                entity,
                field,
                format!("unknown {} identity {}", expected, relation.target),
            )),
            Some(target) if target.entity_type != expected => errors.push(FieldError::new(
                entity,
                field,
                format!(
                    "{} is a {}, expected a {}",
                    relation.target, target.entity_type, expected
                ),
            )),
            Some(target) if target.is_deleted => errors.push(FieldError::new(
                entity,
                field,
                format!("{} {} is deleted", expected, relation.target),
            )),
            Some(_) => {}
        }
    }

    Ok(errors)
}

/// Validate and insert a new immutable revision
pub fn create(conn: &Connection, body: &EntityBody) -> Result<RevisionId> {
    let entity_type = body.entity_type();

    let mut errors = match body.validate() {
        Ok(()) => Vec::new(),
        Err(CatalogError::Validation(e)) => e.0,
        Err(other) => return Err(other),
    };
    errors.extend(check_links(conn, body)?);
    if !errors.is_empty() {
        tracing::debug!(entity_type = %entity_type, errors = errors.len(), "revision rejected");
        return Err(CatalogError::validation(errors));
    }

    let id = RevisionId::generate();
    let (canonical, sha256) = fingerprint(body)?;

    conn.execute(
        "INSERT INTO revision (id, entity_type, body, content_sha256, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, entity_type, canonical, sha256, now_str()],
    )?;

    for relation in body.relations() {
        conn.execute(
            "INSERT INTO rev_relation (rev_id, kind, target_id, position) VALUES (?1, ?2, ?3, ?4)",
            params![id, relation.kind.as_str(), relation.target, relation.position as i64],
        )?;
    }

    for extid in body.external_ids() {
        conn.execute(
            "INSERT INTO rev_extid (rev_id, kind, value) VALUES (?1, ?2, ?3)",
            params![id, extid.kind(), extid.value()],
        )?;
    }

    tracing::debug!(revision = %id, entity_type = %entity_type, "created revision");
    Ok(id)
}

pub fn fetch(conn: &Connection, id: &RevisionId) -> Result<Option<Revision>> {
    let revision = conn
        .query_row(
            "SELECT id, entity_type, body, content_sha256, created_at FROM revision WHERE id = ?1",
            params![id],
            |row| {
                let body: String = row.get(2)?;
                let created_at: String = row.get(4)?;
                Ok(Revision {
                    id: row.get(0)?,
                    entity_type: row.get(1)?,
                    body: parse_json(&body, 2)?,
                    content_sha256: row.get(3)?,
                    created_at: parse_ts(&created_at, 4)?,
                })
            },
        )
        .optional()?;
    Ok(revision)
}

/// Revision by id, `NotFound` if absent
pub fn get(conn: &Connection, id: &RevisionId) -> Result<Revision> {
    fetch(conn, id)?.ok_or_else(|| CatalogError::NotFound(format!("revision {}", id)))
}

/// Entity type of a stored revision, without decoding the body
pub fn entity_type_of(conn: &Connection, id: &RevisionId) -> Result<Option<EntityType>> {
    let entity_type = conn
        .query_row(
            "SELECT entity_type FROM revision WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(entity_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use crate::db::{count_rows, open_connection};
    use crate::edits::EditAction;
    use crate::entities::{Container, File, Release, ReleaseContrib, ReleaseRef, Work};
    use crate::ident::EntityId;

    fn setup() -> Connection {
        open_connection(&CatalogConfig::default()).unwrap()
    }

    fn live(conn: &Connection, body: EntityBody) -> EntityId {
        let id = identities::allocate(conn, body.entity_type()).unwrap();
        let rev = create(conn, &body).unwrap();
        identities::apply(conn, &id, &EditAction::Update(rev), None, None).unwrap();
        id
    }

    #[test]
    fn test_round_trip_with_nested_lists() {
        let conn = setup();
        let work = live(&conn, Work::titled("dummy work").into());
        let container = live(&conn, Container::new("schmournal").into());
        let cited = live(&conn, Release::new("cited").into());

        let mut release = Release::new("dummy work");
        release.release_type = Some("book".to_string());
        release.work_id = Some(work);
        release.container_id = Some(container);
        release.doi = Some("10.1234/5678".to_string());
        release.contribs.push(ReleaseContrib {
            index: Some(1),
            raw_name: Some("anon y. mouse".to_string()),
            role: Some("author".to_string()),
            ..ReleaseContrib::default()
        });
        release.refs.push(ReleaseRef::stub("some book", Some(1998)));
        release.refs.push(ReleaseRef {
            index: Some(2),
            target_release_id: Some(cited),
            extra: [("raw".to_string(), serde_json::json!({"doi": "10.1/x"}))].into(),
            ..ReleaseRef::default()
        });
        release
            .extra
            .insert("f".to_string(), serde_json::json!(7));
        let body = EntityBody::from(release);

        let rev = create(&conn, &body).unwrap();
        let stored = get(&conn, &rev).unwrap();

        assert_eq!(stored.body, body);
        assert_eq!(stored.entity_type, EntityType::Release);
        assert_eq!(stored.content_sha256.len(), 64);
    }

    #[test]
    fn test_identical_bodies_share_fingerprint() {
        let body = EntityBody::from(Container::new("Papers Monthly"));
        let (text1, hash1) = fingerprint(&body).unwrap();
        let (text2, hash2) = fingerprint(&body.clone()).unwrap();
        assert_eq!(text1, text2);
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_invalid_body_writes_nothing() {
        let conn = setup();
        let result = create(&conn, &EntityBody::from(File::default()));

        assert!(matches!(result, Err(CatalogError::Validation(_))));
        assert_eq!(count_rows(&conn, "revision").unwrap(), 0);
    }

    #[test]
    fn test_links_must_exist_with_right_type() {
        let conn = setup();
        let container = live(&conn, Container::new("a container").into());

        let mut release = Release::new("");
        release.work_id = Some(EntityId::generate());
        release.container_id = Some(container);
        release.refs.push(ReleaseRef {
            target_release_id: Some(container),
            ..ReleaseRef::default()
        });

        let err = create(&conn, &release.into()).unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "work_id", "refs.target_release_id"]);
    }

    #[test]
    fn test_wip_identities_may_be_linked() {
        let conn = setup();
        let work = identities::allocate(&conn, EntityType::Work).unwrap();

        let mut release = Release::new("pending work link");
        release.work_id = Some(work);
        assert!(create(&conn, &release.into()).is_ok());
    }

    #[test]
    fn test_unknown_revision_not_found() {
        let conn = setup();
        let result = get(&conn, &RevisionId::generate());
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
        assert!(entity_type_of(&conn, &RevisionId::generate()).unwrap().is_none());
    }
}
