use crate::browser::{ID_ATTRIBUTE, VISIBLE_ATTRIBUTE};
use crate::dom::element::{MAX_TEXT_CHARS, StampedElement, clean_text, compact_attributes};
use scraper::{ElementRef, Html, Node};
use std::fmt;

/// Default cap on listing lines, sentinel included
pub const DEFAULT_MAX_ELEMENTS: usize = 200;

/// Non-visual subtrees dropped before anything else
const PRUNED_TAGS: [&str; 9] = ["script", "style", "meta", "link", "noscript", "svg", "path", "footer", "head"];

const HEADER_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

const INTERACTIVE_TAGS: [&str; 9] = ["a", "button", "input", "select", "textarea", "option", "label", "li", "summary"];

const INTERACTIVE_ROLES: [&str; 11] = [
    "button", "tab", "link", "checkbox", "menuitem", "radio", "combobox", "listbox", "option", "switch", "searchbox",
];

/// One line of a distilled listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomLine {
    /// Heading kept for page context; not actionable
    Header { tag: String, text: String },
    /// Actionable element, including the sentinel
    Element(StampedElement),
}

impl fmt::Display for DomLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomLine::Header { tag, text } => write!(f, "[-] <{}> {}", tag, text),
            DomLine::Element(element) => f.write_str(&element.to_line()),
        }
    }
}

/// Compact, model-facing listing of one stamped page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistilledDom {
    pub lines: Vec<DomLine>,
}

impl DistilledDom {
    /// Render the listing exactly as the model sees it
    pub fn render(&self) -> String {
        self.lines.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Actionable elements, sentinel first
    pub fn elements(&self) -> impl Iterator<Item = &StampedElement> {
        self.lines.iter().filter_map(|line| match line {
            DomLine::Element(element) => Some(element),
            DomLine::Header { .. } => None,
        })
    }
}

impl fmt::Display for DistilledDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Converts stamped HTML into a [`DistilledDom`]
#[derive(Debug, Clone, Copy)]
pub struct DomDistiller {
    pub max_elements: usize,
}

impl Default for DomDistiller {
    fn default() -> Self {
        Self { max_elements: DEFAULT_MAX_ELEMENTS }
    }
}

impl DomDistiller {
    pub fn new(max_elements: usize) -> Self {
        Self { max_elements }
    }

    /// Distill stamped HTML. Deterministic: identical input gives identical output.
    pub fn distill(&self, raw_html: &str) -> DistilledDom {
        let document = Html::parse_document(raw_html);
        let mut lines = vec![DomLine::Element(StampedElement::sentinel())];

        let root = document.root_element();
        if !is_pruned(root) {
            Self::visit(root, &mut lines);
            Self::walk(root, &mut lines);
        }

        lines.truncate(self.max_elements.max(1));
        DistilledDom { lines }
    }

    /// Pre-order traversal of everything below `element`, skipping pruned subtrees.
    /// Uses an explicit stack so nesting depth never touches the call stack.
    fn walk(element: ElementRef<'_>, lines: &mut Vec<DomLine>) {
        let mut pending = unpruned_children(element);
        while let Some(next) = pending.pop() {
            Self::visit(next, lines);
            pending.extend(unpruned_children(next));
        }
    }

    fn visit(element: ElementRef<'_>, lines: &mut Vec<DomLine>) {
        let tag = element.value().name();

        if HEADER_TAGS.contains(&tag) {
            let text = clean_text(&visible_text(element), MAX_TEXT_CHARS);
            if !text.is_empty() {
                lines.push(DomLine::Header { tag: tag.to_string(), text });
            }
            return;
        }

        if let Some(stamped) = Self::stamped_element(element) {
            lines.push(DomLine::Element(stamped));
        }
    }

    /// The listing entry for an element, if it is stamped, visible, interactive and says something
    fn stamped_element(element: ElementRef<'_>) -> Option<StampedElement> {
        let node = element.value();
        let id: u32 = node.attr(ID_ATTRIBUTE).filter(|id| !id.is_empty())?.trim().parse().ok()?;
        if id == 0 {
            return None;
        }

        if node.attr(VISIBLE_ATTRIBUTE) != Some("true") {
            return None;
        }

        let tag = node.name();
        let interactive_role = node.attr("role").is_some_and(|role| INTERACTIVE_ROLES.contains(&role));
        if !INTERACTIVE_TAGS.contains(&tag) && !interactive_role {
            return None;
        }

        let candidate = StampedElement::new(id, tag)
            .with_text(clean_text(&visible_text(element), MAX_TEXT_CHARS))
            .with_attributes(compact_attributes(|key| node.attr(key)))
            .with_visibility(true);

        candidate.is_listable().then_some(candidate)
    }
}

/// Distill with an explicit line cap
pub fn distill(raw_html: &str, max_elements: usize) -> DistilledDom {
    DomDistiller::new(max_elements).distill(raw_html)
}

fn is_pruned(element: ElementRef<'_>) -> bool {
    PRUNED_TAGS.contains(&element.value().name())
}

/// Element children that survive pruning, reversed for popping off a stack
fn unpruned_children(element: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut children: Vec<_> = element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| !is_pruned(*child))
        .collect();
    children.reverse();
    children
}

/// Descendant text, each fragment trimmed, joined by single spaces
fn visible_text(element: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    let mut pending: Vec<_> = element.children().collect();
    pending.reverse();

    while let Some(node) = pending.pop() {
        match node.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed);
                }
            }
            Node::Element(_) => {
                if ElementRef::wrap(node).is_some_and(|child| !is_pruned(child)) {
                    let mut children: Vec<_> = node.children().collect();
                    children.reverse();
                    pending.extend(children);
                }
            }
            _ => {}
        }
    }

    parts.join(" ")
}
