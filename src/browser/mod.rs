//! Browser session management and the driver surface the agent loop consumes.

pub mod config;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions, SettleDelays};
pub use session::BrowserSession;

use crate::error::Result;
use crate::tools::{ActionOutcome, ElementAction};
use image::DynamicImage;

/// Attribute namespace shared with the stamping script.
pub const STAMP_NAMESPACE: &str = "m2w";

/// Attribute carrying the per-pass element id.
pub const ID_ATTRIBUTE: &str = "data-m2w-id";

/// Attribute carrying the `"true"`/`"false"` viewport flag.
pub const VISIBLE_ATTRIBUTE: &str = "data-m2w-visible";

/// Script that stamps ids and visibility onto the live document.
pub const STAMP_SCRIPT: &str = include_str!("stamp_page.js");

/// CSS selector locating a stamped element. The only lookup strategy in contract.
pub fn stamped_selector(element_id: &str) -> String {
    format!("[{}='{}']", ID_ATTRIBUTE, element_id)
}

/// Everything captured from the page for one agent step.
#[derive(Debug, Clone)]
pub struct PageCapture {
    /// Raw screenshot, decoded to RGB
    pub screenshot: DynamicImage,

    /// Stamped `document.documentElement.outerHTML`
    pub html: String,

    /// Highest id assigned by the stamping pass
    pub max_id: u32,
}

/// Where to scroll the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Roughly 80% of a viewport down
    Down,
    /// Roughly 80% of a viewport up
    Up,
    Top,
    Bottom,
}

impl ScrollDirection {
    /// JavaScript performing this scroll
    pub fn script(self) -> &'static str {
        match self {
            ScrollDirection::Down => "window.scrollBy(0, window.innerHeight * 0.8);",
            ScrollDirection::Up => "window.scrollBy(0, -(window.innerHeight * 0.8));",
            ScrollDirection::Top => "window.scrollTo(0, 0);",
            ScrollDirection::Bottom => "window.scrollTo(0, document.body.scrollHeight);",
        }
    }
}

/// The browser operations the control loop needs.
///
/// Implementations own exactly one browser session; the loop holds it by
/// `&mut` so no two loops can drive the same page.
pub trait PageDriver {
    /// Load `url` and wait for the document body.
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Stamp the page, then grab the stamped HTML and a screenshot.
    fn capture(&mut self) -> Result<PageCapture>;

    /// Scroll the viewport.
    fn scroll(&mut self, direction: ScrollDirection) -> Result<()>;

    /// Perform a validated interaction. Never returns an error; failures come
    /// back as reason codes.
    fn execute(&mut self, action: &ElementAction) -> ActionOutcome;

    /// URL currently loaded in the page.
    fn current_url(&self) -> Result<String>;
}
