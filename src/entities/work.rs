// Work Entity - the abstract creative work that releases are versions of

use super::{EntityKind, EntityType, Extra, Relation};
use crate::error::FieldError;
use crate::validation::ExternalId;
use serde::{Deserialize, Serialize};

/// Work body. Carries almost nothing itself; releases point at it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Work {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_type: Option<String>,

    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub extra: Extra,
}

impl Work {
    pub fn new() -> Self {
        Work::default()
    }

    pub fn titled(title: &str) -> Self {
        Work {
            title: Some(title.to_string()),
            ..Work::default()
        }
    }
}

impl EntityKind for Work {
    fn entity_type(&self) -> EntityType {
        EntityType::Work
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                errors.push(FieldError::new("work", "title", "Must be omitted or non-empty"));
            }
        }
        errors
    }

    fn relations(&self) -> Vec<Relation> {
        Vec::new()
    }

    fn external_ids(&self) -> Vec<ExternalId> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_work_is_valid() {
        assert!(Work::new().validate().is_empty());
        assert!(Work::titled("dummy work").validate().is_empty());
    }

    #[test]
    fn test_blank_title_rejected() {
        let errors = Work::titled("  ").validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "title");
    }
}
