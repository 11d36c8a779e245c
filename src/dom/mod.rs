//! Page distillation
//!
//! This module turns a stamped HTML snapshot into the compact listing the model
//! reads. It includes:
//! - StampedElement: one listed element with cleaned text and compact attributes
//! - DomDistiller / DistilledDom: the deterministic listing with the id-0 sentinel
//! - ListedIds: the ids present in a rendered listing, used for validation
//! - format_prompt: the fixed instruction template

pub mod element;
pub mod listed_ids;
pub mod prompt;
pub mod tree;

pub use element::{Attribute, SENTINEL_ID, StampedElement, clean_text};
pub use listed_ids::ListedIds;
pub use prompt::format_prompt;
pub use tree::{DEFAULT_MAX_ELEMENTS, DistilledDom, DomDistiller, DomLine, distill};
