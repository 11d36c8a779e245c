use crate::{browser::config::{ConnectionOptions, LaunchOptions, SettleDelays},
            browser::{PageCapture, PageDriver, STAMP_SCRIPT, ScrollDirection},
            error::{AgentError, Result},
            tools::{self, ActionFailure, ActionOutcome, ElementAction, ToolContext, ToolInput},
            vision};
use headless_chrome::{Browser, Tab, protocol::cdp::Page::CaptureScreenshotFormatOption};
use std::{ffi::OsStr, sync::Arc, time::Duration};

const SCROLL_INTO_VIEW_JS: &str = "function() { this.scrollIntoView({block: 'center'}); return true; }";

/// Browser session that owns one Chrome/Chromium tab for the lifetime of a task
pub struct BrowserSession {
    /// The underlying headless_chrome Browser instance
    browser: Browser,

    /// The tab every capture and action goes through
    tab: Arc<Tab>,

    /// Highest id assigned by the last stamping pass
    max_id: u32,

    delays: SettleDelays,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Ignore default arguments to prevent detection by anti-bot services
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));
        launch_opts.args.push(OsStr::new("--disable-dev-shm-usage"));

        // A single task can run for many minutes of model inference
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));

        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }

        if let Some(dir) = options.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }

        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| AgentError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| AgentError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        log::info!("Browser launched ({})", if options.headless { "headless" } else { "headed" });

        Ok(Self { browser, tab, max_id: 0, delays: options.delays })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect_with_timeout(options.ws_url, Duration::from_millis(options.timeout))
            .map_err(|e| AgentError::ConnectionFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| AgentError::TabOperationFailed(format!("Failed to create tab: {}", e)))?;

        Ok(Self { browser, tab, max_id: 0, delays: options.delays })
    }

    /// The tab driven by this session
    pub fn tab(&self) -> Arc<Tab> {
        self.tab.clone()
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Highest id assigned by the most recent stamping pass
    pub fn max_id(&self) -> u32 {
        self.max_id
    }

    /// Run the stamping script and record the highest id it assigned
    pub fn stamp(&mut self) -> Result<u32> {
        let result = self
            .tab
            .evaluate(STAMP_SCRIPT, false)
            .map_err(|e| AgentError::StampFailed(e.to_string()))?;

        let max_id = result
            .value
            .as_ref()
            .and_then(|v| v.as_u64())
            .ok_or_else(|| AgentError::StampFailed(format!("Stamping returned {:?}", result.value)))?;

        self.max_id = u32::try_from(max_id)
            .map_err(|_| AgentError::StampFailed(format!("Max id {} out of range", max_id)))?;
        log::debug!("Stamped page. Max ID: {}", self.max_id);

        Ok(self.max_id)
    }

    /// Outer HTML of the document element, including stamped attributes
    pub fn outer_html(&self) -> Result<String> {
        let result = self
            .tab
            .evaluate("document.documentElement.outerHTML", false)
            .map_err(|e| AgentError::EvaluationFailed(e.to_string()))?;

        result
            .value
            .and_then(|v| v.as_str().map(String::from))
            .ok_or_else(|| AgentError::EvaluationFailed("outerHTML returned no string".to_string()))
    }

    /// PNG screenshot of the viewport
    pub fn screenshot_png(&self) -> Result<Vec<u8>> {
        self.tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| AgentError::ScreenshotFailed(e.to_string()))
    }

    fn settle(duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }

    fn perform(&self, action: &ElementAction) -> ActionOutcome {
        let context = ToolContext::new(&self.tab, self.max_id);
        let element = context.find(&action.element_id)?;

        element
            .call_js_fn(SCROLL_INTO_VIEW_JS, vec![], false)
            .map_err(|e| ActionFailure::Driver(format!("scroll into view: {}", e)))?;
        Self::settle(self.delays.after_scroll_into_view);

        let tool = tools::tool_for(&action.kind)
            .ok_or_else(|| ActionFailure::UnsupportedAction(action.kind.to_string()))?;

        log::info!("Executing {} on element {}", tool.name(), action.element_id);
        let input = ToolInput { element_id: &action.element_id, value: action.value() };
        tool.execute_on(&element, input, &context)
    }

    /// Close the browser tab; the browser process exits when the session is dropped
    pub fn close(&self) -> Result<()> {
        self.tab
            .close(false)
            .map_err(|e| AgentError::TabOperationFailed(format!("Failed to close tab: {}", e)))?;
        Ok(())
    }
}

impl PageDriver for BrowserSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        log::info!("Navigating to {}...", url);
        self.tab
            .navigate_to(url)
            .map_err(|e| AgentError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;

        if let Err(e) = self.tab.wait_for_element("body") {
            log::warn!("Timeout waiting for page body, proceeding anyway: {}", e);
        }
        Self::settle(self.delays.after_navigation);

        Ok(())
    }

    fn capture(&mut self) -> Result<PageCapture> {
        let max_id = self.stamp()?;
        let html = self.outer_html()?;
        let png = self.screenshot_png()?;
        let screenshot = vision::decode_screenshot(&png)?;

        Ok(PageCapture { screenshot, html, max_id })
    }

    fn scroll(&mut self, direction: ScrollDirection) -> Result<()> {
        self.tab
            .evaluate(direction.script(), false)
            .map_err(|e| AgentError::EvaluationFailed(format!("Scroll failed: {}", e)))?;
        log::info!("Scrolled {:?}", direction);
        Self::settle(self.delays.after_scroll);
        Ok(())
    }

    fn execute(&mut self, action: &ElementAction) -> ActionOutcome {
        if let Err(failure) = tools::validate(action, self.max_id) {
            log::warn!("Rejected {} on {}: {}", action.kind, action.element_id, failure);
            return Err(failure);
        }

        let outcome = self.perform(action);
        match &outcome {
            Ok(()) => Self::settle(self.delays.after_action),
            Err(failure) => log::warn!("{}", failure_message(action, failure)),
        }
        outcome
    }

    fn current_url(&self) -> Result<String> {
        Ok(self.tab.get_url())
    }
}

fn failure_message(action: &ElementAction, failure: &ActionFailure) -> String {
    match failure {
        ActionFailure::ElementNotFound(id) => {
            format!("Element {} not found. Model hallucination?", crate::browser::stamped_selector(id))
        }
        other => format!("Action {} on {} failed: {}", action.kind, action.element_id, other),
    }
}
