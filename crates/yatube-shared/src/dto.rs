//! Query-string parameters.

use serde::{Deserialize, Serialize};

/// `?page=` on every feed. Kept as the raw string so that a malformed value
/// selects a page instead of failing the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// Pick `page` out of decoded query pairs; when it repeats, the last one
    /// is used.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            page: pairs
                .into_iter()
                .filter(|(key, _)| key == "page")
                .map(|(_, value)| value)
                .last(),
        }
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.page.as_deref()
    }
}

/// `?next=` carried through the login page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}
