//! Page slicing for post feeds.
//!
//! Requested page numbers come straight from the query string and are never
//! rejected: anything that is not an integer selects the first page, and any
//! integer outside `1..=num_pages` selects the last one.

/// Posts per page when nothing else is configured.
pub const DEFAULT_PER_PAGE: u64 = 10;

/// Splits a collection of `count` items into pages of `per_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: u64,
}

/// The resolved position of one page inside the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub offset: u64,
    pub limit: u64,
}

impl Paginator {
    pub fn new(per_page: u64) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// An empty collection still has one (empty) page.
    pub fn num_pages(&self, count: u64) -> u64 {
        count.div_ceil(self.per_page).max(1)
    }

    /// Resolve the raw `page` parameter against a collection of `count` items.
    pub fn window(&self, count: u64, requested: Option<&str>) -> PageWindow {
        let num_pages = self.num_pages(count);
        let number = match requested.map(parse_page) {
            None | Some(RequestedPage::Invalid) => 1,
            Some(RequestedPage::Number(n)) if (1..=num_pages).contains(&n) => n,
            Some(RequestedPage::Number(_) | RequestedPage::OutOfRange) => num_pages,
        };
        let offset = (number - 1) * self.per_page;

        PageWindow {
            number,
            num_pages,
            count,
            offset,
            limit: self.per_page.min(count.saturating_sub(offset)),
        }
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE)
    }
}

enum RequestedPage {
    Number(u64),
    /// An integer too large or too negative to hold.
    OutOfRange,
    Invalid,
}

fn parse_page(raw: &str) -> RequestedPage {
    let raw = raw.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return RequestedPage::Invalid;
    }
    match digits.parse::<u64>() {
        Ok(0) => RequestedPage::OutOfRange,
        Ok(_) if negative => RequestedPage::OutOfRange,
        Ok(n) => RequestedPage::Number(n),
        Err(_) => RequestedPage::OutOfRange,
    }
}
