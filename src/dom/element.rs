use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Cap on visible text per listed element
pub const MAX_TEXT_CHARS: usize = 60;

/// Cap on each attribute value
pub const MAX_ATTRIBUTE_CHARS: usize = 40;

/// Reserved id meaning "the target is not in this list"
pub const SENTINEL_ID: u32 = 0;

/// `type` values too common to be worth tokens
const DEFAULT_TYPES: [&str; 3] = ["text", "button", "reset"];

/// Attributes kept with a value, with their shortened display key
const VALUE_ATTRIBUTES: [(&str, &str); 7] = [
    ("role", "role"),
    ("name", "name"),
    ("value", "value"),
    ("aria-label", "aria"),
    ("placeholder", "ph"),
    ("title", "title"),
    ("alt", "alt"),
];

/// Boolean state attributes listed bare
const STATE_ATTRIBUTES: [&str; 5] = ["checked", "disabled", "selected", "required", "readonly"];

/// Tags listed even with no text and no attributes
const ALWAYS_ACTIONABLE_TAGS: [&str; 4] = ["input", "button", "select", "textarea"];

static TAG_LIKE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Strip tag-like fragments, collapse whitespace and truncate to `max_chars` characters.
pub fn clean_text(text: &str, max_chars: usize) -> String {
    if text.is_empty() {
        return String::new();
    }
    let stripped = TAG_LIKE.replace_all(text, "");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(max_chars).collect()
}

/// A compact attribute: `key='value'`, or a bare flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub key: String,
    pub value: Option<String>,
}

impl Attribute {
    pub fn pair(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: Some(value.into()) }
    }

    pub fn flag(key: impl Into<String>) -> Self {
        Self { key: key.into(), value: None }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}='{}'", self.key, value),
            None => f.write_str(&self.key),
        }
    }
}

/// Build the allow-listed attribute list from an attribute lookup.
pub fn compact_attributes<'a>(lookup: impl Fn(&str) -> Option<&'a str>) -> Vec<Attribute> {
    let mut out = Vec::new();

    if let Some(raw) = lookup("type") {
        let kind = raw.trim().to_lowercase();
        if !DEFAULT_TYPES.contains(&kind.as_str()) {
            out.push(Attribute::pair("type", kind));
        }
    }

    for (key, display) in VALUE_ATTRIBUTES {
        if let Some(raw) = lookup(key).filter(|v| !v.is_empty()) {
            let value = clean_text(raw, MAX_ATTRIBUTE_CHARS);
            if !value.is_empty() {
                out.push(Attribute::pair(display, value));
            }
        }
    }

    for key in STATE_ATTRIBUTES {
        if lookup(key).is_some() {
            out.push(Attribute::flag(key));
        }
    }

    out
}

/// An interactive element from one stamped snapshot.
///
/// Ids are only meaningful within the capture they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampedElement {
    /// Stamped id, or [`SENTINEL_ID`]
    pub id: u32,

    /// Lower-case tag name
    pub tag: String,

    /// Cleaned visible text
    pub text: String,

    /// Allow-listed attributes in display order
    pub attributes: Vec<Attribute>,

    /// Whether the stamping pass saw it in the viewport
    pub visible: bool,
}

impl StampedElement {
    pub fn new(id: u32, tag: impl Into<String>) -> Self {
        Self {
            id,
            tag: tag.into(),
            text: String::new(),
            attributes: Vec::new(),
            visible: false,
        }
    }

    /// The "not in this list" entry that always heads a listing
    pub fn sentinel() -> Self {
        Self::new(SENTINEL_ID, "option")
            .with_text("Target element is not in this list")
            .with_visibility(true)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn is_sentinel(&self) -> bool {
        self.id == SENTINEL_ID
    }

    /// `(k='v', flag)` or an empty string
    pub fn attribute_string(&self) -> String {
        if self.attributes.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self.attributes.iter().map(ToString::to_string).collect();
        format!("({})", parts.join(", "))
    }

    /// Whether the element is worth listing: it says something, or it is a form control.
    pub fn is_listable(&self) -> bool {
        !self.text.is_empty() || !self.attributes.is_empty() || ALWAYS_ACTIONABLE_TAGS.contains(&self.tag.as_str())
    }

    /// `[id] <tag> text (attrs)` with whitespace collapsed
    pub fn to_line(&self) -> String {
        let raw = format!("[{}] <{}> {} {}", self.id, self.tag, self.text, self.attribute_string());
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
