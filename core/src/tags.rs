//! Lexical classification of Make tags.
//!
//! Application tags look like `webmaker.org:foo`, user tags like
//! `someone@example.com:foo`, and raw tags carry no colon at all (`foo`,
//! `#fooBar`).

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Two strings joined with ':' where the first contains no '@'.
    static ref APP_TAG: Regex = Regex::new(r"^[^@]+:[^:]+").unwrap();
    // Two strings joined with ':' where the first is an email address.
    static ref USER_TAG: Regex = Regex::new(r"^[^@]+@[^@]+:[^:]+").unwrap();
    static ref RAW_TAG: Regex = Regex::new(r"^[^:]+$").unwrap();
}

/// The three tag shapes understood by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    App,
    User,
    Raw,
}

impl TagKind {
    fn pattern(self) -> &'static Regex {
        match self {
            TagKind::App => &*APP_TAG,
            TagKind::User => &*USER_TAG,
            TagKind::Raw => &*RAW_TAG,
        }
    }

    pub fn matches(self, tag: &str) -> bool {
        self.pattern().is_match(tag)
    }
}

/// Tags of `kind`, in their original order.
pub fn filter_tags(tags: &[String], kind: TagKind) -> Vec<String> {
    tags.iter().filter(|t| kind.matches(t)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tag: &str) -> Vec<TagKind> {
        [TagKind::App, TagKind::User, TagKind::Raw]
            .into_iter()
            .filter(|k| k.matches(tag))
            .collect()
    }

    #[test]
    fn app_tag() {
        assert_eq!(kinds("webmaker.org:foo"), vec![TagKind::App]);
    }

    #[test]
    fn user_tag() {
        assert_eq!(kinds("a@b.com:foo"), vec![TagKind::User]);
    }

    #[test]
    fn raw_tags() {
        assert_eq!(kinds("foo"), vec![TagKind::Raw]);
        assert_eq!(kinds("#foo"), vec![TagKind::Raw]);
    }

    #[test]
    fn trailing_colon_is_unclassified() {
        assert!(kinds("webmaker.org:").is_empty());
    }

    #[test]
    fn filter_keeps_order() {
        let tags: Vec<String> = ["x", "webmaker.org:a", "y", "a@b.com:z"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(filter_tags(&tags, TagKind::Raw), vec!["x", "y"]);
        assert_eq!(filter_tags(&tags, TagKind::App), vec!["webmaker.org:a"]);
        assert_eq!(filter_tags(&tags, TagKind::User), vec!["a@b.com:z"]);
    }
}
