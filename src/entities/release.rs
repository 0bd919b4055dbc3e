// 📄 Release Entity - one published version of a work
//
// A release links to its work, its container, its contributors (creators)
// and its references (citations). All links are identity ids. References may
// also be unresolved stubs that carry only raw citation text.

use super::{extid_errors, push_extid, EntityKind, EntityType, Extra, Relation, RelationKind};
use crate::error::FieldError;
use crate::ident::EntityId;
use crate::validation::{check_contrib_role, check_release_type, ExternalId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Release type that marks a title-less placeholder
pub const STUB_RELEASE_TYPE: &str = "stub";

// ============================================================================
// NESTED LISTS
// ============================================================================

/// Contributor of a release, optionally linked to a creator identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseContrib {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub extra: Extra,
}

/// Citation from a release. Either a stub (raw fields only) or resolved to
/// a target release identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_release_id: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,

    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub extra: Extra,
}

impl ReleaseRef {
    /// Unresolved citation recorded by raw text
    pub fn stub(title: &str, year: Option<i64>) -> Self {
        ReleaseRef {
            title: Some(title.to_string()),
            year,
            ..ReleaseRef::default()
        }
    }

    pub fn is_stub(&self) -> bool {
        self.target_release_id.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseAbstract {
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

// ============================================================================
// RELEASE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i64>,

    /// Weak reference, resolved at read time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_id: Option<EntityId>,

    /// Weak reference, resolved at read time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmcid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikidata_qid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contribs: Vec<ReleaseContrib>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refs: Vec<ReleaseRef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abstracts: Vec<ReleaseAbstract>,

    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub extra: Extra,
}

impl Release {
    pub fn new(title: &str) -> Self {
        Release {
            title: title.to_string(),
            ..Release::default()
        }
    }

    /// Title-less placeholder release
    pub fn stub() -> Self {
        Release {
            release_type: Some(STUB_RELEASE_TYPE.to_string()),
            ..Release::default()
        }
    }

    pub fn is_stub(&self) -> bool {
        self.release_type.as_deref() == Some(STUB_RELEASE_TYPE)
    }

    /// Creator ids of linked contributors, in contrib order
    pub fn creator_ids(&self) -> Vec<EntityId> {
        self.contribs.iter().filter_map(|c| c.creator_id).collect()
    }
}

impl EntityKind for Release {
    fn entity_type(&self) -> EntityType {
        EntityType::Release
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() && !self.is_stub() {
            errors.push(FieldError::new(
                "release",
                "title",
                "Required unless release_type is 'stub'",
            ));
        }

        if let Some(release_type) = &self.release_type {
            errors.extend(check_release_type("release", release_type));
        }

        if let (Some(date), Some(year)) = (self.release_date, self.release_year) {
            use chrono::Datelike;
            if i64::from(date.year()) != year {
                errors.push(FieldError::new(
                    "release",
                    "release_year",
                    format!("{} does not match release_date {}", year, date),
                ));
            }
        }

        for (i, contrib) in self.contribs.iter().enumerate() {
            if let Some(role) = &contrib.role {
                errors.extend(check_contrib_role(
                    "release",
                    &format!("contribs[{}].role", i),
                    role,
                ));
            }
            if contrib.creator_id.is_none() && contrib.raw_name.is_none() {
                errors.push(FieldError::new(
                    "release",
                    &format!("contribs[{}]", i),
                    "Needs creator_id or raw_name",
                ));
            }
        }

        for (i, reference) in self.refs.iter().enumerate() {
            if reference.is_stub()
                && reference.title.is_none()
                && reference.key.is_none()
                && reference.extra.is_empty()
            {
                errors.push(FieldError::new(
                    "release",
                    &format!("refs[{}]", i),
                    "Stub reference needs a title, key or extra",
                ));
            }
        }

        errors.extend(extid_errors("release", &self.external_ids()));
        errors
    }

    fn relations(&self) -> Vec<Relation> {
        let mut relations = Vec::new();
        if let Some(work) = self.work_id {
            relations.push(Relation::new(RelationKind::Work, work, 0));
        }
        if let Some(container) = self.container_id {
            relations.push(Relation::new(RelationKind::Container, container, 0));
        }
        for (i, contrib) in self.contribs.iter().enumerate() {
            if let Some(creator) = contrib.creator_id {
                relations.push(Relation::new(RelationKind::Contrib, creator, i));
            }
        }
        for (i, reference) in self.refs.iter().enumerate() {
            if let Some(target) = reference.target_release_id {
                relations.push(Relation::new(RelationKind::RefTarget, target, i));
            }
        }
        relations
    }

    fn external_ids(&self) -> Vec<ExternalId> {
        let mut ids = Vec::new();
        push_extid(&mut ids, &self.doi, ExternalId::Doi);
        push_extid(&mut ids, &self.pmid, ExternalId::Pmid);
        push_extid(&mut ids, &self.pmcid, ExternalId::Pmcid);
        push_extid(&mut ids, &self.wikidata_qid, ExternalId::WikidataQid);
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_requires_title_unless_stub() {
        let errors = Release::new("").validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "title");

        assert!(Release::stub().validate().is_empty());
        assert!(Release::new("Bogus title").validate().is_empty());
    }

    #[test]
    fn test_release_reports_every_bad_field() {
        let mut release = Release::new("");
        release.release_type = Some("journal-article".to_string());
        release.doi = Some("not-a-doi".to_string());
        release.contribs.push(ReleaseContrib {
            role: Some("chair".to_string()),
            raw_name: Some("anon y. mouse".to_string()),
            ..ReleaseContrib::default()
        });

        let fields: Vec<String> = release.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"title".to_string()));
        assert!(fields.contains(&"release_type".to_string()));
        assert!(fields.contains(&"doi".to_string()));
        assert!(fields.contains(&"contribs[0].role".to_string()));
    }

    #[test]
    fn test_year_must_match_date() {
        let mut release = Release::new("dated");
        release.release_date = NaiveDate::from_ymd_opt(2018, 1, 21);
        release.release_year = Some(2018);
        assert!(release.validate().is_empty());

        release.release_year = Some(2017);
        assert_eq!(release.validate()[0].field, "release_year");
    }

    #[test]
    fn test_relations_follow_body_order() {
        let work = EntityId::generate();
        let container = EntityId::generate();
        let creator = EntityId::generate();
        let cited = EntityId::generate();

        let mut release = Release::new("derivative work");
        release.work_id = Some(work);
        release.container_id = Some(container);
        release.contribs.push(ReleaseContrib {
            raw_name: Some("someone unlinked".to_string()),
            ..ReleaseContrib::default()
        });
        release.contribs.push(ReleaseContrib {
            creator_id: Some(creator),
            ..ReleaseContrib::default()
        });
        release.refs.push(ReleaseRef::stub("some other journal article", Some(1999)));
        release.refs.push(ReleaseRef {
            target_release_id: Some(cited),
            ..ReleaseRef::default()
        });

        let relations = release.relations();
        assert_eq!(relations.len(), 4);
        assert_eq!(relations[0], Relation::new(RelationKind::Work, work, 0));
        assert_eq!(relations[1], Relation::new(RelationKind::Container, container, 0));
        assert_eq!(relations[2], Relation::new(RelationKind::Contrib, creator, 1));
        assert_eq!(relations[3], Relation::new(RelationKind::RefTarget, cited, 1));
        assert_eq!(release.creator_ids(), vec![creator]);
    }

    #[test]
    fn test_stub_reference_needs_some_text() {
        let mut release = Release::new("citing");
        release.refs.push(ReleaseRef::default());
        let errors = release.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "refs[0]");
    }
}
