use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Longest title a group may carry.
pub const GROUP_TITLE_MAX_LEN: usize = 200;

/// Group entity - a named category posts can be tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A group that has not been stored yet.
#[derive(Debug, Clone, Deserialize)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

impl NewGroup {
    /// Build a group, checking the title length and slug alphabet.
    pub fn new(title: &str, slug: &str, description: &str) -> Result<Self, DomainError> {
        let group = Self {
            title: title.trim().to_string(),
            slug: slug.trim().to_string(),
            description: description.to_string(),
        };
        group.validate()?;
        Ok(group)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.is_empty() {
            return Err(DomainError::Validation("group title is empty".to_string()));
        }
        if self.title.chars().count() > GROUP_TITLE_MAX_LEN {
            return Err(DomainError::Validation(format!(
                "group title is longer than {GROUP_TITLE_MAX_LEN} characters"
            )));
        }
        if !is_valid_slug(&self.slug) {
            return Err(DomainError::Validation(format!(
                "'{}' is not a valid slug",
                self.slug
            )));
        }
        Ok(())
    }

    pub fn into_group(self, id: i64) -> Group {
        Group {
            id,
            title: self.title,
            slug: self.slug,
            description: self.description,
        }
    }
}

/// Slugs are non-empty runs of ASCII letters, digits, hyphens and underscores.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_group_trims_fields() {
        let group = NewGroup::new("  Cats ", " cats ", "About cats").unwrap();
        assert_eq!(group.title, "Cats");
        assert_eq!(group.slug, "cats");
    }

    #[test]
    fn test_new_group_rejects_bad_slug() {
        assert!(NewGroup::new("Cats", "cats and dogs", "").is_err());
        assert!(NewGroup::new("Cats", "", "").is_err());
        assert!(NewGroup::new("Cats", "cats/dogs", "").is_err());
        assert!(NewGroup::new("Cats", "cats_and-dogs-2", "").is_ok());
    }

    #[test]
    fn test_new_group_title_limits() {
        assert!(NewGroup::new("   ", "cats", "").is_err());
        let long = "x".repeat(GROUP_TITLE_MAX_LEN + 1);
        assert!(NewGroup::new(&long, "cats", "").is_err());
        let max = "x".repeat(GROUP_TITLE_MAX_LEN);
        assert!(NewGroup::new(&max, "cats", "").is_ok());
    }
}
