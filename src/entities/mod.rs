// Entity Models
//
// The catalog knows exactly five kinds of entity. Each kind has a body struct
// implementing `EntityKind`; `EntityBody` is the tagged union the storage
// layer works with, dispatching on its explicit `EntityType` tag.
//
// Cross-entity links inside a body are always identity ids (never embedded
// copies), so citation cycles and redirects are plain data.

pub mod container;
pub mod creator;
pub mod file;
pub mod release;
pub mod work;

pub use container::Container;
pub use creator::Creator;
pub use file::{File, FileUrl};
pub use release::{Release, ReleaseAbstract, ReleaseContrib, ReleaseRef};
pub use work::Work;

use crate::error::{CatalogError, FieldError, Result};
use crate::ident::EntityId;
use crate::validation::ExternalId;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Open-ended metadata that has no modeled field
pub type Extra = HashMap<String, serde_json::Value>;

// ============================================================================
// ENTITY TYPE TAG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Work,
    Release,
    Container,
    Creator,
    File,
}

impl EntityType {
    pub const ALL: [EntityType; 5] = [
        EntityType::Work,
        EntityType::Release,
        EntityType::Container,
        EntityType::Creator,
        EntityType::File,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Work => "work",
            EntityType::Release => "release",
            EntityType::Container => "container",
            EntityType::Creator => "creator",
            EntityType::File => "file",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        EntityType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CatalogError::validation(vec![FieldError::new(
                    "entity",
                    "entity_type",
                    format!("unknown entity type: '{}'", s),
                )])
            })
    }
}

impl ToSql for EntityType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for EntityType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: CatalogError| FromSqlError::Other(Box::new(e)))
    }
}

// ============================================================================
// RELATIONS
// ============================================================================

/// Kind of outgoing link from a revision to another identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// release -> work
    Work,
    /// release -> container
    Container,
    /// release -> creator (contrib list)
    Contrib,
    /// release -> release (resolved citation)
    RefTarget,
    /// file -> release
    Release,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Work => "work",
            RelationKind::Container => "container",
            RelationKind::Contrib => "contrib",
            RelationKind::RefTarget => "ref_target",
            RelationKind::Release => "release",
        }
    }

    /// Entity type the link must point at
    pub fn target_type(&self) -> EntityType {
        match self {
            RelationKind::Work => EntityType::Work,
            RelationKind::Container => EntityType::Container,
            RelationKind::Contrib => EntityType::Creator,
            RelationKind::RefTarget | RelationKind::Release => EntityType::Release,
        }
    }

    /// Body field reported when the link is bad
    pub fn field(&self) -> &'static str {
        match self {
            RelationKind::Work => "work_id",
            RelationKind::Container => "container_id",
            RelationKind::Contrib => "contribs.creator_id",
            RelationKind::RefTarget => "refs.target_release_id",
            RelationKind::Release => "release_ids",
        }
    }
}

/// One outgoing link of a revision, with its position in an ordered list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub kind: RelationKind,
    pub target: EntityId,
    pub position: usize,
}

impl Relation {
    pub fn new(kind: RelationKind, target: EntityId, position: usize) -> Self {
        Relation {
            kind,
            target,
            position,
        }
    }
}

// ============================================================================
// CAPABILITY SET
// ============================================================================

/// Shared behaviour of every entity body
pub trait EntityKind {
    fn entity_type(&self) -> EntityType;

    /// Field-level problems with this body; empty when valid
    fn validate(&self) -> Vec<FieldError>;

    /// Outgoing identity links, in body order
    fn relations(&self) -> Vec<Relation>;

    /// External identifiers this body can be looked up by
    fn external_ids(&self) -> Vec<ExternalId>;
}

/// Entity body tagged with its type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity_type", content = "body", rename_all = "lowercase")]
pub enum EntityBody {
    Work(Work),
    Release(Release),
    Container(Container),
    Creator(Creator),
    File(File),
}

impl EntityBody {
    fn inner(&self) -> &dyn EntityKind {
        match self {
            EntityBody::Work(w) => w,
            EntityBody::Release(r) => r,
            EntityBody::Container(c) => c,
            EntityBody::Creator(c) => c,
            EntityBody::File(f) => f,
        }
    }

    pub fn entity_type(&self) -> EntityType {
        self.inner().entity_type()
    }

    /// Validate the body, returning a `Validation` error listing all problems
    pub fn validate(&self) -> Result<()> {
        let errors = self.inner().validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::validation(errors))
        }
    }

    pub fn relations(&self) -> Vec<Relation> {
        self.inner().relations()
    }

    pub fn external_ids(&self) -> Vec<ExternalId> {
        self.inner().external_ids()
    }

    pub fn extra(&self) -> &Extra {
        match self {
            EntityBody::Work(w) => &w.extra,
            EntityBody::Release(r) => &r.extra,
            EntityBody::Container(c) => &c.extra,
            EntityBody::Creator(c) => &c.extra,
            EntityBody::File(f) => &f.extra,
        }
    }

    pub fn as_release(&self) -> Option<&Release> {
        match self {
            EntityBody::Release(r) => Some(r),
            _ => None,
        }
    }
}

impl From<Work> for EntityBody {
    fn from(w: Work) -> Self {
        EntityBody::Work(w)
    }
}

impl From<Release> for EntityBody {
    fn from(r: Release) -> Self {
        EntityBody::Release(r)
    }
}

impl From<Container> for EntityBody {
    fn from(c: Container) -> Self {
        EntityBody::Container(c)
    }
}

impl From<Creator> for EntityBody {
    fn from(c: Creator) -> Self {
        EntityBody::Creator(c)
    }
}

impl From<File> for EntityBody {
    fn from(f: File) -> Self {
        EntityBody::File(f)
    }
}

/// Optional identifier field -> external id, when set
pub(crate) fn push_extid(out: &mut Vec<ExternalId>, value: &Option<String>, make: fn(String) -> ExternalId) {
    if let Some(v) = value {
        out.push(make(v.clone()));
    }
}

/// Syntax errors for every external id of a body
pub(crate) fn extid_errors(entity: &str, ids: &[ExternalId]) -> Vec<FieldError> {
    ids.iter().filter_map(|id| id.check(entity)).collect()
}
