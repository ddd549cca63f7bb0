//! Form validation - turns raw submitted fields into cleaned values.
//!
//! Forms are plain deserializable structs; validating one never touches
//! storage; lookups it depends on (like the list of groups) are passed in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Group, Post};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice.";

/// Field-keyed validation messages. The `__all__` key carries errors that
/// do not belong to a single field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub const NON_FIELD: &'static str = "__all__";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// `Ok(value)` when no error was recorded.
    pub fn finish<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Trim a required text field.
pub fn clean_text(raw: &str) -> Result<String, &'static str> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(REQUIRED);
    }
    Ok(text.to_string())
}

/// Raw post form as submitted: the text and the selected group id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: Option<String>,
}

/// Validated post fields, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<i64>,
}

impl PostForm {
    /// Form pre-filled from an existing post.
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()),
        }
    }

    pub fn clean_text(&self) -> Result<String, &'static str> {
        clean_text(&self.text)
    }

    /// An empty selection means no group; anything else must name one of `groups`.
    pub fn clean_group(&self, groups: &[Group]) -> Result<Option<i64>, &'static str> {
        let raw = match self.group.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(raw) => raw,
        };
        let id: i64 = raw.parse().map_err(|_| INVALID_CHOICE)?;
        if groups.iter().any(|g| g.id == id) {
            Ok(Some(id))
        } else {
            Err(INVALID_CHOICE)
        }
    }

    pub fn validate(&self, groups: &[Group]) -> Result<CleanedPost, FormErrors> {
        let mut errors = FormErrors::new();
        let text = self
            .clean_text()
            .map_err(|e| errors.add("text", e))
            .unwrap_or_default();
        let group_id = self
            .clean_group(groups)
            .map_err(|e| errors.add("group", e))
            .unwrap_or_default();
        errors.finish(CleanedPost { text, group_id })
    }
}

/// Raw comment form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::new();
        let text = clean_text(&self.text)
            .map_err(|e| errors.add("text", e))
            .unwrap_or_default();
        errors.finish(text)
    }
}

pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

/// Registration form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password1: String,
    #[serde(default, skip_serializing)]
    pub password2: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedSignup {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<CleanedSignup, FormErrors> {
        let mut errors = FormErrors::new();

        let username = self.username.trim();
        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else if username.chars().count() > USERNAME_MAX_LEN
            || !username
                .chars()
                .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.add("email", REQUIRED);
        } else if !email.contains('@') {
            errors.add("email", "Enter a valid email address.");
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        } else if self.password1.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password1",
                format!("This password is too short. It must contain at least {PASSWORD_MIN_LEN} characters."),
            );
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        errors.finish(CleanedSignup {
            username: username.to_string(),
            email: email.to_string(),
            password: self.password1.clone(),
        })
    }
}

/// Login form. `next` is the page to return to after a successful login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if self.username.trim().is_empty() {
            errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.finish(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<Group> {
        vec![Group {
            id: 3,
            title: "Cats".to_string(),
            slug: "cats".to_string(),
            description: String::new(),
        }]
    }

    fn post_form(text: &str, group: Option<&str>) -> PostForm {
        PostForm {
            text: text.to_string(),
            group: group.map(str::to_string),
        }
    }

    #[test]
    fn test_clean_text_trims() {
        assert_eq!(clean_text("  hello \n"), Ok("hello".to_string()));
        assert_eq!(clean_text(" \t\n "), Err(REQUIRED));
        assert_eq!(clean_text(""), Err(REQUIRED));
    }

    #[test]
    fn test_post_form_valid_with_group() {
        let cleaned = post_form(" hi ", Some("3")).validate(&groups()).unwrap();
        assert_eq!(
            cleaned,
            CleanedPost {
                text: "hi".to_string(),
                group_id: Some(3)
            }
        );
    }

    #[test]
    fn test_post_form_group_is_optional() {
        let cleaned = post_form("hi", None).validate(&groups()).unwrap();
        assert_eq!(cleaned.group_id, None);

        let cleaned = post_form("hi", Some("")).validate(&groups()).unwrap();
        assert_eq!(cleaned.group_id, None);
    }

    #[test]
    fn test_post_form_rejects_empty_text() {
        let errors = post_form("   ", Some("3")).validate(&groups()).unwrap_err();
        assert_eq!(errors.field("text"), [REQUIRED.to_string()]);
        assert!(errors.field("group").is_empty());
    }

    #[test]
    fn test_post_form_rejects_unknown_group() {
        let errors = post_form("hi", Some("99")).validate(&groups()).unwrap_err();
        assert_eq!(errors.field("group"), [INVALID_CHOICE.to_string()]);

        let errors = post_form("hi", Some("cats")).validate(&groups()).unwrap_err();
        assert_eq!(errors.field("group"), [INVALID_CHOICE.to_string()]);
    }

    #[test]
    fn test_comment_form() {
        let form = CommentForm {
            text: " nice ".to_string(),
        };
        assert_eq!(form.validate().unwrap(), "nice");

        let form = CommentForm {
            text: "  ".to_string(),
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_signup_form() {
        let mut form = SignupForm {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password1: "correct horse".to_string(),
            password2: "correct horse".to_string(),
        };
        assert_eq!(form.validate().unwrap().username, "alice");

        form.password2 = "battery staple".to_string();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.field("password2").len(), 1);

        form.username = "alice smith".to_string();
        form.password1 = "short".to_string();
        form.password2 = "short".to_string();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.field("username").len(), 1);
        assert_eq!(errors.field("password1").len(), 1);
    }
}
