// 📚 Container Entity - journal, book series, conference proceedings, ...

use super::{extid_errors, push_extid, EntityKind, EntityType, Extra, Relation};
use crate::error::FieldError;
use crate::validation::{check_required, ExternalId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    /// Linking ISSN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issnl: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikidata_qid: Option<String>,

    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub extra: Extra,
}

impl Container {
    pub fn new(name: &str) -> Self {
        Container {
            name: name.to_string(),
            ..Container::default()
        }
    }
}

impl EntityKind for Container {
    fn entity_type(&self) -> EntityType {
        EntityType::Container
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        errors.extend(check_required("container", "name", &self.name));
        errors.extend(extid_errors("container", &self.external_ids()));
        errors
    }

    fn relations(&self) -> Vec<Relation> {
        Vec::new()
    }

    fn external_ids(&self) -> Vec<ExternalId> {
        let mut ids = Vec::new();
        push_extid(&mut ids, &self.issnl, ExternalId::Issnl);
        push_extid(&mut ids, &self.wikidata_qid, ExternalId::WikidataQid);
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_with_all_fields() {
        let container = Container {
            name: "some container name".to_string(),
            container_type: Some("journal".to_string()),
            publisher: Some("some container publisher".to_string()),
            issnl: Some("1234-567X".to_string()),
            wikidata_qid: Some("Q954248".to_string()),
            extra: Extra::from([("a".to_string(), serde_json::json!(1))]),
        };
        assert!(container.validate().is_empty());
        assert_eq!(container.external_ids().len(), 2);
    }

    #[test]
    fn test_container_requires_name() {
        let mut container = Container::new("");
        container.issnl = Some("2222-333".to_string());
        let errors = container.validate();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "name");
        assert_eq!(errors[1].field, "issnl");
    }
}
