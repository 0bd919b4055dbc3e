// Expand and hide flags for release reads
//
// Both are parsed from a comma-separated list such as "work,container,files".
// Unrecognized tokens are skipped.

use crate::entities::EntityBody;
use crate::error::CatalogError;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandFlags {
    pub work: bool,
    pub container: bool,
    pub creators: bool,
    pub files: bool,
}

impl ExpandFlags {
    pub fn none() -> Self {
        ExpandFlags::default()
    }

    pub fn all() -> Self {
        ExpandFlags {
            work: true,
            container: true,
            creators: true,
            files: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ExpandFlags::none()
    }

    pub fn from_str_list(list: &[&str]) -> Self {
        if list.contains(&"all") {
            return ExpandFlags::all();
        }
        ExpandFlags {
            work: list.contains(&"work"),
            container: list.contains(&"container"),
            creators: list.contains(&"creators"),
            files: list.contains(&"files"),
        }
    }
}

impl FromStr for ExpandFlags {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ExpandFlags::from_str_list(&tokens("expand", s)))
    }
}

/// Release fields left out of a read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HideFlags {
    pub abstracts: bool,
    pub refs: bool,
    pub contribs: bool,
}

impl HideFlags {
    pub fn none() -> Self {
        HideFlags::default()
    }

    pub fn from_str_list(list: &[&str]) -> Self {
        HideFlags {
            abstracts: list.contains(&"abstracts"),
            refs: list.contains(&"refs"),
            contribs: list.contains(&"contribs"),
        }
    }

    /// Clear the hidden fields of a release body; other bodies are untouched
    pub fn apply(&self, body: &mut EntityBody) {
        if let EntityBody::Release(release) = body {
            if self.abstracts {
                release.abstracts.clear();
            }
            if self.refs {
                release.refs.clear();
            }
            if self.contribs {
                release.contribs.clear();
            }
        }
    }
}

impl FromStr for HideFlags {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(HideFlags::from_str_list(&tokens("hide", s)))
    }
}

fn tokens<'a>(param: &str, s: &'a str) -> Vec<&'a str> {
    let list: Vec<&str> = s.split(',').map(str::trim).filter(|t| !t.is_empty()).collect();
    tracing::trace!(param, ?list, "parsed flag list");
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Release, ReleaseAbstract, ReleaseContrib, ReleaseRef, Work};

    #[test]
    fn test_parse_list() {
        let flags: ExpandFlags = "work, files".parse().unwrap();
        assert!(flags.work);
        assert!(flags.files);
        assert!(!flags.container);
        assert!(!flags.creators);

        assert!("".parse::<ExpandFlags>().unwrap().is_empty());
        assert_eq!("all".parse::<ExpandFlags>().unwrap(), ExpandFlags::all());
    }

    #[test]
    fn test_unknown_flags_ignored() {
        let flags: ExpandFlags = "work,filesets,abstracts".parse().unwrap();
        assert_eq!(
            flags,
            ExpandFlags {
                work: true,
                ..ExpandFlags::none()
            }
        );
        assert!("something,,files".parse::<ExpandFlags>().unwrap().files);
        assert!(!"file".parse::<ExpandFlags>().unwrap().files);
    }

    #[test]
    fn test_hide_flags_parse() {
        assert_eq!("".parse::<HideFlags>().unwrap(), HideFlags::none());
        assert!(!"abstract".parse::<HideFlags>().unwrap().abstracts);

        let hide: HideFlags = "abstracts,other_thing,,refs".parse().unwrap();
        assert!(hide.abstracts);
        assert!(hide.refs);
        assert!(!hide.contribs);
    }

    #[test]
    fn test_hide_flags_clear_release_fields() {
        let mut release = Release::new("Hidden Parts");
        release.contribs.push(ReleaseContrib {
            raw_name: Some("Someone".to_string()),
            ..ReleaseContrib::default()
        });
        release.refs.push(ReleaseRef::stub("Cited", None));
        release.abstracts.push(ReleaseAbstract {
            content: "Short summary".to_string(),
            mimetype: None,
            lang: None,
        });
        let mut body = EntityBody::from(release);

        "refs,contribs".parse::<HideFlags>().unwrap().apply(&mut body);

        let release = body.as_release().unwrap();
        assert!(release.refs.is_empty());
        assert!(release.contribs.is_empty());
        assert_eq!(release.abstracts.len(), 1);
        assert_eq!(release.title, "Hidden Parts");

        let mut work = EntityBody::from(Work::titled("untouched"));
        let before = work.clone();
        HideFlags::from_str_list(&["abstracts", "refs", "contribs"]).apply(&mut work);
        assert_eq!(work, before);
    }
}
