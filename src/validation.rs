// Shape checks for external identifiers and controlled vocabularies
//
// Entity bodies call these from `EntityKind::validate`; every failure becomes
// one `FieldError` so a caller sees all offending fields at once.

use crate::error::FieldError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// ============================================================================
// EXTERNAL IDENTIFIERS
// ============================================================================

static DOI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^10\.\d{3,6}/.+$").expect("constant regex pattern is valid"));
static ISSN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{3}[0-9X]$").expect("constant regex pattern is valid"));
static ORCID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{4}-\d{4}-\d{3}[\dX]$").expect("constant regex pattern is valid")
});
static WIKIDATA_QID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Q\d+$").expect("constant regex pattern is valid"));
static PMID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("constant regex pattern is valid"));
static PMCID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^PMC\d+$").expect("constant regex pattern is valid"));
static MD5: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-f0-9]{32}$").expect("constant regex pattern is valid"));
static SHA1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-f0-9]{40}$").expect("constant regex pattern is valid"));
static SHA256: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-f0-9]{64}$").expect("constant regex pattern is valid"));

/// External identifier usable for lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ExternalId {
    Doi(String),
    Issnl(String),
    Orcid(String),
    WikidataQid(String),
    Pmid(String),
    Pmcid(String),
    Md5(String),
    Sha1(String),
    Sha256(String),
}

impl ExternalId {
    /// Storage key (one column value per kind)
    pub fn kind(&self) -> &'static str {
        match self {
            ExternalId::Doi(_) => "doi",
            ExternalId::Issnl(_) => "issnl",
            ExternalId::Orcid(_) => "orcid",
            ExternalId::WikidataQid(_) => "wikidata_qid",
            ExternalId::Pmid(_) => "pmid",
            ExternalId::Pmcid(_) => "pmcid",
            ExternalId::Md5(_) => "md5",
            ExternalId::Sha1(_) => "sha1",
            ExternalId::Sha256(_) => "sha256",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            ExternalId::Doi(v)
            | ExternalId::Issnl(v)
            | ExternalId::Orcid(v)
            | ExternalId::WikidataQid(v)
            | ExternalId::Pmid(v)
            | ExternalId::Pmcid(v)
            | ExternalId::Md5(v)
            | ExternalId::Sha1(v)
            | ExternalId::Sha256(v) => v,
        }
    }

    /// Build from a storage key such as `"doi"`; `None` for unknown kinds
    pub fn from_kind(kind: &str, value: &str) -> Option<Self> {
        let value = value.to_string();
        let id = match kind {
            "doi" => ExternalId::Doi(value),
            "issnl" => ExternalId::Issnl(value),
            "orcid" => ExternalId::Orcid(value),
            "wikidata_qid" => ExternalId::WikidataQid(value),
            "pmid" => ExternalId::Pmid(value),
            "pmcid" => ExternalId::Pmcid(value),
            "md5" => ExternalId::Md5(value),
            "sha1" => ExternalId::Sha1(value),
            "sha256" => ExternalId::Sha256(value),
            _ => return None,
        };
        Some(id)
    }

    /// Human-readable expectation used in error messages
    fn expected(&self) -> &'static str {
        match self {
            ExternalId::Doi(_) => "a DOI, eg, '10.1234/aksjdfh'",
            ExternalId::Issnl(_) => "an ISSN, eg, '1234-5678'",
            ExternalId::Orcid(_) => "an ORCID, eg, '0123-4567-3456-6789'",
            ExternalId::WikidataQid(_) => "a Wikidata QID, eg, 'Q1234'",
            ExternalId::Pmid(_) => "a PubMed ID, eg, '1234'",
            ExternalId::Pmcid(_) => "a PubMed Central ID, eg, 'PMC12345'",
            ExternalId::Md5(_) => "lower-case hex MD5 (32 chars)",
            ExternalId::Sha1(_) => "lower-case hex SHA-1 (40 chars)",
            ExternalId::Sha256(_) => "lower-case hex SHA-256 (64 chars)",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            ExternalId::Doi(_) => &DOI,
            ExternalId::Issnl(_) => &ISSN,
            ExternalId::Orcid(_) => &ORCID,
            ExternalId::WikidataQid(_) => &WIKIDATA_QID,
            ExternalId::Pmid(_) => &PMID,
            ExternalId::Pmcid(_) => &PMCID,
            ExternalId::Md5(_) => &MD5,
            ExternalId::Sha1(_) => &SHA1,
            ExternalId::Sha256(_) => &SHA256,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.pattern().is_match(self.value())
    }

    /// Check syntax, reporting against `entity.<kind>`
    pub fn check(&self, entity: &str) -> Option<FieldError> {
        if self.is_well_formed() {
            None
        } else {
            Some(FieldError::new(
                entity,
                self.kind(),
                format!("not valid: '{}' (expected {})", self.value(), self.expected()),
            ))
        }
    }
}

// ============================================================================
// CONTROLLED VOCABULARIES
// ============================================================================

/// Citation Style Language types, plus catalog-specific extensions
pub const RELEASE_TYPES: &[&str] = &[
    "article",
    "article-magazine",
    "article-newspaper",
    "article-journal",
    "bill",
    "book",
    "broadcast",
    "chapter",
    "dataset",
    "entry",
    "entry-dictionary",
    "entry-encyclopedia",
    "figure",
    "graphic",
    "interview",
    "legislation",
    "legal_case",
    "manuscript",
    "map",
    "motion_picture",
    "musical_score",
    "pamphlet",
    "paper-conference",
    "patent",
    "post",
    "post-weblog",
    "personal_communication",
    "report",
    "review",
    "review-book",
    "song",
    "speech",
    "thesis",
    "treaty",
    "webpage",
    "peer_review",
    "software",
    "standard",
    "stub",
];

/// CSL contributor roles
pub const CONTRIB_ROLES: &[&str] = &[
    "author",
    "collection-editor",
    "composer",
    "container-author",
    "director",
    "editor",
    "editorial-director",
    "editortranslator",
    "illustrator",
    "interviewer",
    "original-author",
    "recipient",
    "reviewed-author",
    "translator",
];

pub fn check_release_type(entity: &str, raw: &str) -> Option<FieldError> {
    if RELEASE_TYPES.contains(&raw) {
        None
    } else {
        Some(FieldError::new(
            entity,
            "release_type",
            format!(
                "not a valid release_type: '{}' (expected a CSL type, eg, 'article-journal', 'book')",
                raw
            ),
        ))
    }
}

pub fn check_contrib_role(entity: &str, field: &str, raw: &str) -> Option<FieldError> {
    if CONTRIB_ROLES.contains(&raw) {
        None
    } else {
        Some(FieldError::new(
            entity,
            field,
            format!(
                "not a valid contrib role: '{}' (expected a CSL role, eg, 'author', 'editor')",
                raw
            ),
        ))
    }
}

/// Required free-text field: present and not blank
pub fn check_required(entity: &str, field: &str, value: &str) -> Option<FieldError> {
    if value.trim().is_empty() {
        Some(FieldError::new(entity, field, "Required field is empty"))
    } else {
        None
    }
}

/// Editor usernames: 2-24 chars, alphanumeric plus `_` and `-`, starting with a letter
pub fn check_username(raw: &str) -> Option<FieldError> {
    static USERNAME: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_-]{1,23}$").expect("constant regex pattern is valid")
    });
    if USERNAME.is_match(raw) {
        None
    } else {
        Some(FieldError::new(
            "editor",
            "username",
            format!("not a valid username: '{}'", raw),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_orcid() {
        assert!(ExternalId::Orcid("0123-4567-3456-6789".into()).is_well_formed());
        assert!(ExternalId::Orcid("0123-4567-3456-678X".into()).is_well_formed());
        assert!(!ExternalId::Orcid("01234567-3456-6780".into()).is_well_formed());
        assert!(!ExternalId::Orcid("0x23-4567-3456-6780".into()).is_well_formed());
    }

    #[test]
    fn test_check_hashes() {
        assert!(ExternalId::Md5("1b39813549077b2347c0f370c3864b40".into()).is_well_formed());
        assert!(!ExternalId::Md5("1B39813549077B2347C0F370c3864b40".into()).is_well_formed());
        assert!(!ExternalId::Md5("1b39813549077b2347c0f370c3864b4".into()).is_well_formed());

        assert!(
            ExternalId::Sha1("e9dd75237c94b209dc3ccd52722de6931a310ba3".into()).is_well_formed()
        );
        assert!(
            !ExternalId::Sha1("g9dd75237c94b209dc3ccd52722de6931a310ba3".into()).is_well_formed()
        );

        assert!(ExternalId::Sha256(
            "cb1c378f464d5935ddaa8de28446d82638396c61f042295d7fb85e3cccc9e452".into()
        )
        .is_well_formed());
        assert!(!ExternalId::Sha256(
            "cb1c378f464d5935ddaa8de28446d82638396c61f042295d7fb85e3cccc9e4522".into()
        )
        .is_well_formed());
    }

    #[test]
    fn test_check_doi_issn_and_friends() {
        assert!(ExternalId::Doi("10.1234/5678".into()).is_well_formed());
        assert!(!ExternalId::Doi("doi:10.1234/5678".into()).is_well_formed());
        assert!(ExternalId::Issnl("1234-567X".into()).is_well_formed());
        assert!(!ExternalId::Issnl("1234567X".into()).is_well_formed());
        assert!(ExternalId::WikidataQid("Q954248".into()).is_well_formed());
        assert!(!ExternalId::WikidataQid("954248".into()).is_well_formed());
        assert!(ExternalId::Pmcid("PMC12345".into()).is_well_formed());
        assert!(ExternalId::Pmid("1234".into()).is_well_formed());
        assert!(!ExternalId::Pmid("PMID1234".into()).is_well_formed());
    }

    #[test]
    fn test_from_kind_matches_storage_key() {
        let id = ExternalId::from_kind("wikidata_qid", "Q42").unwrap();
        assert_eq!(id, ExternalId::WikidataQid("Q42".into()));
        assert_eq!(id.kind(), "wikidata_qid");
        assert!(ExternalId::from_kind("isbn13", "978-3-16-148410-0").is_none());
    }

    #[test]
    fn test_check_reports_field_name() {
        let err = ExternalId::Doi("bogus".into()).check("release").unwrap();
        assert_eq!(err.field, "doi");
        assert_eq!(err.entity, "release");
        assert!(err.message.contains("bogus"));
    }

    #[test]
    fn test_check_release_type() {
        assert!(check_release_type("release", "book").is_none());
        assert!(check_release_type("release", "article-journal").is_none());
        assert!(check_release_type("release", "standard").is_none());
        assert!(check_release_type("release", "stub").is_none());
        assert!(check_release_type("release", "journal-article").is_some());
        assert!(check_release_type("release", "BOOK").is_some());
        assert!(check_release_type("release", "book ").is_some());
    }

    #[test]
    fn test_check_contrib_role() {
        assert!(check_contrib_role("release", "contribs.role", "author").is_none());
        assert!(check_contrib_role("release", "contribs.role", "editor").is_none());
        assert!(check_contrib_role("release", "contribs.role", "chair").is_some());
        assert!(check_contrib_role("release", "contribs.role", "EDITOR").is_some());
    }

    #[test]
    fn test_check_username() {
        assert!(check_username("admin").is_none());
        assert!(check_username("bot-crossref_2").is_none());
        assert!(check_username("a").is_some());
        assert!(check_username("9lives").is_some());
        assert!(check_username("has space").is_some());
    }
}
