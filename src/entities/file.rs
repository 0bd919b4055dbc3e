// 💾 File Entity - one concrete digital artifact, identified by content hash

use super::{extid_errors, push_extid, EntityKind, EntityType, Extra, Relation, RelationKind};
use crate::error::FieldError;
use crate::ident::EntityId;
use crate::validation::ExternalId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUrl {
    pub url: String,
    pub rel: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct File {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<FileUrl>,

    /// Releases this file is a copy of
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub release_ids: Vec<EntityId>,

    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub extra: Extra,
}

impl File {
    pub fn with_sha1(sha1: &str) -> Self {
        File {
            sha1: Some(sha1.to_string()),
            ..File::default()
        }
    }
}

impl EntityKind for File {
    fn entity_type(&self) -> EntityType {
        EntityType::File
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.md5.is_none() && self.sha1.is_none() && self.sha256.is_none() {
            errors.push(FieldError::new(
                "file",
                "sha1",
                "At least one content hash (md5, sha1, sha256) is required",
            ));
        }
        for (i, url) in self.urls.iter().enumerate() {
            if url.url.trim().is_empty() {
                errors.push(FieldError::new("file", &format!("urls[{}].url", i), "Required field is empty"));
            }
        }
        let mut seen = Vec::new();
        for release in &self.release_ids {
            if seen.contains(release) {
                errors.push(FieldError::new(
                    "file",
                    "release_ids",
                    format!("duplicate release id {}", release),
                ));
            }
            seen.push(*release);
        }
        errors.extend(extid_errors("file", &self.external_ids()));
        errors
    }

    fn relations(&self) -> Vec<Relation> {
        self.release_ids
            .iter()
            .enumerate()
            .map(|(i, release)| Relation::new(RelationKind::Release, *release, i))
            .collect()
    }

    fn external_ids(&self) -> Vec<ExternalId> {
        let mut ids = Vec::new();
        push_extid(&mut ids, &self.md5, ExternalId::Md5);
        push_extid(&mut ids, &self.sha1, ExternalId::Sha1);
        push_extid(&mut ids, &self.sha256, ExternalId::Sha256);
        ids
    }
}
