use std::path::PathBuf;
use std::time::Duration;

/// Options for launching a new Chrome/Chromium instance
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a visible window
    pub headless: bool,

    /// Browser window width in pixels
    pub window_width: u32,

    /// Browser window height in pixels
    pub window_height: u32,

    /// Custom Chrome binary path
    pub chrome_path: Option<PathBuf>,

    /// Persistent profile directory
    pub user_data_dir: Option<PathBuf>,

    /// Enable the Chrome sandbox
    pub sandbox: bool,

    /// Settle delays applied by the session after mutations
    pub delays: SettleDelays,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: false,
            window_width: 1920,
            window_height: 1080,
            chrome_path: None,
            user_data_dir: None,
            sandbox: false,
            delays: SettleDelays::default(),
        }
    }
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    pub fn user_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_data_dir = Some(dir.into());
        self
    }

    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn delays(mut self, delays: SettleDelays) -> Self {
        self.delays = delays;
        self
    }
}

/// Options for attaching to an already running browser
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// DevTools WebSocket URL
    pub ws_url: String,

    /// Connection timeout in milliseconds
    pub timeout: u64,

    /// Settle delays applied by the session after mutations
    pub delays: SettleDelays,
}

impl ConnectionOptions {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            timeout: 30_000,
            delays: SettleDelays::default(),
        }
    }

    pub fn timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = timeout_ms;
        self
    }

    pub fn delays(mut self, delays: SettleDelays) -> Self {
        self.delays = delays;
        self
    }
}

/// Fixed waits that let JS-driven page updates land before the next capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleDelays {
    pub after_navigation: Duration,
    pub after_scroll_into_view: Duration,
    pub after_action: Duration,
    pub after_scroll: Duration,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            after_navigation: Duration::from_secs(2),
            after_scroll_into_view: Duration::from_millis(500),
            after_action: Duration::from_secs(1),
            after_scroll: Duration::from_millis(500),
        }
    }
}

impl SettleDelays {
    /// No waiting at all; useful for tests and pre-rendered pages.
    pub fn none() -> Self {
        Self {
            after_navigation: Duration::ZERO,
            after_scroll_into_view: Duration::ZERO,
            after_action: Duration::ZERO,
            after_scroll: Duration::ZERO,
        }
    }
}
