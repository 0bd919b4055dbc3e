// 👤 Creator Entity - a person or group credited on releases

use super::{extid_errors, push_extid, EntityKind, EntityType, Extra, Relation};
use crate::error::FieldError;
use crate::validation::{check_required, ExternalId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    pub display_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikidata_qid: Option<String>,

    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub extra: Extra,
}

impl Creator {
    pub fn new(display_name: &str) -> Self {
        Creator {
            display_name: display_name.to_string(),
            ..Creator::default()
        }
    }
}

impl EntityKind for Creator {
    fn entity_type(&self) -> EntityType {
        EntityType::Creator
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        errors.extend(check_required("creator", "display_name", &self.display_name));
        errors.extend(extid_errors("creator", &self.external_ids()));
        errors
    }

    fn relations(&self) -> Vec<Relation> {
        Vec::new()
    }

    fn external_ids(&self) -> Vec<ExternalId> {
        let mut ids = Vec::new();
        push_extid(&mut ids, &self.orcid, ExternalId::Orcid);
        push_extid(&mut ids, &self.wikidata_qid, ExternalId::WikidataQid);
        ids
    }
}
