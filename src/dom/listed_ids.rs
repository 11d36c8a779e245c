use indexmap::IndexSet;
use regex::Regex;
use std::sync::LazyLock;

/// `[id] <tag>` at the start of a listing line
static ELEMENT_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[(\d+)\]\s*<[^>]*>").expect("valid regex"));

/// The ids present in one rendered listing, in listing order.
///
/// Built from the exact text shown to the model so that validation can never
/// see a different snapshot than the prediction was made on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListedIds {
    ids: IndexSet<String>,
}

impl ListedIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the bracketed id prefixes of a rendered listing. Header lines are ignored.
    pub fn from_listing(listing: &str) -> Self {
        let ids = listing
            .lines()
            .filter_map(|line| ELEMENT_LINE.captures(line.trim()))
            .map(|caps| caps[1].to_string())
            .collect();
        Self { ids }
    }

    /// Exact string match against the listed ids
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Listed ids in order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}
