//! Rendered page strategy backed by a shared headless Chrome session.
//!
//! One [`BrowserSession`] owns at most one browser process and one browser
//! context. Pages are created from that context per request and closed by the
//! caller. The session moves through [`SessionStatus`] states: it launches
//! lazily on first use, notices when the CDP connection drops, and relaunches
//! on the next request after a disconnect or an explicit close.

mod config;
#[cfg(feature = "browser")]
mod stealth;

pub use config::BrowserEngineConfig;

use std::sync::Arc;

use async_trait::async_trait;

use super::page::{PageAccess, PageHandle};
use crate::error::Result;

/// Lifecycle state of a [`BrowserSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No browser has been launched yet.
    Unstarted,
    /// A browser is running and connected.
    Live,
    /// The browser went away; the next page request relaunches it.
    Disconnected,
    /// Explicitly closed; the next page request relaunches it.
    Closed,
}

/// [`PageAccess`] that renders pages in a shared browser session.
#[derive(Clone)]
pub struct BrowserPageAccess {
    session: Arc<BrowserSession>,
}

impl BrowserPageAccess {
    pub fn new(config: BrowserEngineConfig) -> Self {
        Self::with_session(Arc::new(BrowserSession::new(config)))
    }

    pub fn with_session(session: Arc<BrowserSession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<BrowserSession> {
        &self.session
    }
}

#[async_trait]
impl PageAccess for BrowserPageAccess {
    async fn get_page(&self) -> Result<Box<dyn PageHandle>> {
        self.session.open_page().await
    }

    async fn close(&self) -> Result<()> {
        self.session.close().await
    }
}

#[cfg(feature = "browser")]
pub use engine::BrowserSession;

#[cfg(feature = "browser")]
mod engine {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
    use chromiumoxide::cdp::browser_protocol::fetch::{
        ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
    };
    use chromiumoxide::cdp::browser_protocol::network::{
        ErrorReason, ResourceType, SetUserAgentOverrideParams,
    };
    use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
    use chromiumoxide::cdp::browser_protocol::target::{
        CreateBrowserContextParams, CreateTargetParams,
    };
    use chromiumoxide::handler::viewport::Viewport;
    use chromiumoxide::handler::HandlerConfig;
    use chromiumoxide::{Browser, BrowserConfig, Handler, Page};
    use futures::StreamExt;
    use tokio::sync::Mutex;
    use tokio::task::JoinHandle;
    use tracing::{debug, info, warn};

    use super::stealth::STEALTH_SCRIPTS;
    use super::{BrowserEngineConfig, SessionStatus};
    use crate::error::{Result, ScrapeError};
    use crate::scrapers::http_client::BROWSER_USER_AGENT;
    use crate::scrapers::page::PageHandle;

    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &[&str] = &[
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/opt/google/chrome/google-chrome",
    ];

    /// Upper bound on waiting for a selector that may never appear.
    const SELECTOR_WAIT: Duration = Duration::from_secs(10);

    fn browser_err(context: &str, e: impl std::fmt::Display) -> ScrapeError {
        ScrapeError::Browser(format!("{}: {}", context, e))
    }

    /// Whether a request of this resource type is aborted before it is sent.
    pub(super) fn is_blocked_resource(kind: &ResourceType) -> bool {
        matches!(
            kind,
            ResourceType::Image | ResourceType::Stylesheet | ResourceType::Font | ResourceType::Media
        )
    }

    struct LiveBrowser {
        browser: Browser,
        context_id: BrowserContextId,
        connected: Arc<AtomicBool>,
        handler: JoinHandle<()>,
        remote: bool,
    }

    enum SessionState {
        Unstarted,
        Live(LiveBrowser),
        Disconnected,
        Closed,
    }

    /// Owner of the shared browser process and context.
    pub struct BrowserSession {
        config: BrowserEngineConfig,
        state: Mutex<SessionState>,
    }

    impl BrowserSession {
        pub fn new(config: BrowserEngineConfig) -> Self {
            Self {
                config,
                state: Mutex::new(SessionState::Unstarted),
            }
        }

        /// Current lifecycle state.
        pub async fn status(&self) -> SessionStatus {
            match &*self.state.lock().await {
                SessionState::Unstarted => SessionStatus::Unstarted,
                SessionState::Live(live) if live.connected.load(Ordering::SeqCst) => {
                    SessionStatus::Live
                }
                SessionState::Live(_) | SessionState::Disconnected => SessionStatus::Disconnected,
                SessionState::Closed => SessionStatus::Closed,
            }
        }

        /// Create a page in the shared context, launching the browser first
        /// if none is live.
        ///
        /// The state lock is held across launch so concurrent callers never
        /// start two processes.
        pub(super) async fn open_page(&self) -> Result<Box<dyn PageHandle>> {
            let mut state = self.state.lock().await;

            let needs_launch = match &*state {
                SessionState::Live(live) => !live.connected.load(Ordering::SeqCst),
                _ => true,
            };
            if needs_launch {
                if matches!(&*state, SessionState::Live(_)) {
                    if let SessionState::Live(stale) =
                        std::mem::replace(&mut *state, SessionState::Disconnected)
                    {
                        warn!("Browser disconnected, relaunching");
                        stale.handler.abort();
                    }
                }
                *state = SessionState::Live(self.launch().await?);
            }

            let SessionState::Live(live) = &*state else {
                return Err(ScrapeError::Browser("Browser not running".to_string()));
            };

            let params = CreateTargetParams::builder()
                .url("about:blank")
                .browser_context_id(live.context_id.clone())
                .build()
                .map_err(|e| browser_err("Invalid page parameters", e))?;
            let page = live
                .browser
                .new_page(params)
                .await
                .map_err(|e| browser_err("Failed to create page", e))?;
            drop(state);

            let timeout = Duration::from_secs(self.config.timeout);
            BrowserPage::prepare(page, self.config.stealth, timeout).await
        }

        /// Terminate the browser and forget the context.
        ///
        /// Remote browsers are disconnected from rather than killed.
        pub async fn close(&self) -> Result<()> {
            let mut state = self.state.lock().await;
            if let SessionState::Live(mut live) = std::mem::replace(&mut *state, SessionState::Closed) {
                info!("Closing browser");
                if !live.remote && live.connected.load(Ordering::SeqCst) {
                    if let Err(e) = live.browser.close().await {
                        debug!("Browser close failed: {}", e);
                    }
                    let _ = live.browser.wait().await;
                }
                live.handler.abort();
            }
            Ok(())
        }

        async fn launch(&self) -> Result<LiveBrowser> {
            let remote = self.config.remote_url.is_some();
            let (mut browser, handler) = match self.config.remote_url.as_deref() {
                Some(url) => self.connect_remote(url).await?,
                None => self.launch_local().await?,
            };

            let connected = Arc::new(AtomicBool::new(true));
            let handler = spawn_handler(handler, connected.clone());

            let context_id = browser
                .create_browser_context(CreateBrowserContextParams::default())
                .await
                .map_err(|e| browser_err("Failed to create browser context", e))?;

            Ok(LiveBrowser {
                browser,
                context_id,
                connected,
                handler,
                remote,
            })
        }

        async fn launch_local(&self) -> Result<(Browser, Handler)> {
            info!("Launching browser (headless={})", self.config.headless);

            let chrome_path = match &self.config.chrome_path {
                Some(path) => path.clone(),
                None => find_chrome()?,
            };

            let mut builder = BrowserConfig::builder()
                .chrome_executable(chrome_path)
                .request_timeout(Duration::from_secs(self.config.timeout))
                .viewport(Viewport {
                    width: self.config.viewport_width,
                    height: self.config.viewport_height,
                    ..Default::default()
                });

            // with_head means NOT headless
            if !self.config.headless {
                builder = builder.with_head();
            }

            builder = builder
                .arg("--disable-blink-features=AutomationControlled")
                .arg("--disable-infobars")
                .arg("--disable-dev-shm-usage")
                .arg("--no-first-run")
                .arg("--no-default-browser-check")
                .arg("--no-sandbox")
                .arg("--disable-setuid-sandbox")
                .arg("--disable-gpu")
                .arg(format!(
                    "--window-size={},{}",
                    self.config.viewport_width, self.config.viewport_height
                ));

            for arg in &self.config.chrome_args {
                builder = builder.arg(arg);
            }

            let config = builder
                .build()
                .map_err(|e| browser_err("Failed to build browser config", e))?;

            Browser::launch(config)
                .await
                .map_err(|e| browser_err("Failed to launch browser", e))
        }

        async fn connect_remote(&self, url: &str) -> Result<(Browser, Handler)> {
            info!(
                "Connecting to remote browser at {} (timeout: {}s)",
                url, self.config.timeout
            );

            let ws_url = if url.contains("/devtools/browser/") {
                url.to_string()
            } else {
                discover_ws_url(url).await?
            };
            debug!("Connecting to WebSocket: {}", ws_url);

            let handler_config = HandlerConfig {
                request_timeout: Duration::from_secs(self.config.timeout),
                ..Default::default()
            };

            Browser::connect_with_config(ws_url, handler_config)
                .await
                .map_err(|e| browser_err("Failed to connect to remote browser", e))
        }
    }

    /// Drive the CDP handler until the connection ends, then mark the
    /// session disconnected.
    fn spawn_handler(mut handler: Handler, connected: Arc<AtomicBool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
            connected.store(false, Ordering::SeqCst);
            debug!("Browser connection closed");
        })
    }

    /// Resolve the browser WebSocket URL from the DevTools `/json/version` endpoint.
    async fn discover_ws_url(url: &str) -> Result<String> {
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .map_err(|e| browser_err("Failed to connect to remote browser", e))?
            .json()
            .await
            .map_err(|e| browser_err("Failed to parse browser version info", e))?;

        resp.get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| ScrapeError::Browser("No webSocketDebuggerUrl in response".to_string()))
    }

    fn find_chrome() -> Result<PathBuf> {
        for path in CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                debug!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        debug!("Found Chrome in PATH: {}", path);
                        return Ok(PathBuf::from(path));
                    }
                }
            }
        }

        Err(ScrapeError::Browser(
            "Chrome/Chromium not found. Install it or set browser.chrome_path".to_string(),
        ))
    }

    /// A tab in the shared context with heavy resources blocked.
    struct BrowserPage {
        page: Page,
        interceptor: JoinHandle<()>,
        timeout: Duration,
    }

    impl BrowserPage {
        async fn prepare(page: Page, stealth: bool, timeout: Duration) -> Result<Box<dyn PageHandle>> {
            match Self::configure(&page, stealth).await {
                Ok(interceptor) => Ok(Box::new(Self {
                    page,
                    interceptor,
                    timeout,
                })),
                Err(e) => {
                    let _ = page.close().await;
                    Err(e)
                }
            }
        }

        async fn configure(page: &Page, stealth: bool) -> Result<JoinHandle<()>> {
            page.execute(SetUserAgentOverrideParams::new(BROWSER_USER_AGENT.to_string()))
                .await
                .map_err(|e| browser_err("Failed to set user agent", e))?;

            if stealth {
                for script in STEALTH_SCRIPTS {
                    page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(
                        script.to_string(),
                    ))
                    .await
                    .map_err(|e| browser_err("Failed to install stealth script", e))?;
                }
            }

            let mut paused = page
                .event_listener::<EventRequestPaused>()
                .await
                .map_err(|e| browser_err("Failed to listen for requests", e))?;
            page.execute(EnableParams::default())
                .await
                .map_err(|e| browser_err("Failed to enable request interception", e))?;

            let page = page.clone();
            Ok(tokio::spawn(async move {
                while let Some(event) = paused.next().await {
                    let outcome = if is_blocked_resource(&event.resource_type) {
                        page.execute(FailRequestParams::new(
                            event.request_id.clone(),
                            ErrorReason::BlockedByClient,
                        ))
                        .await
                        .map(|_| ())
                    } else {
                        page.execute(ContinueRequestParams::new(event.request_id.clone()))
                            .await
                            .map(|_| ())
                    };
                    if let Err(e) = outcome {
                        debug!("Request interception failed: {}", e);
                    }
                }
            }))
        }
    }

    #[async_trait]
    impl PageHandle for BrowserPage {
        async fn goto(&mut self, url: &str) -> Result<()> {
            debug!("Navigating to {}", url);
            match tokio::time::timeout(self.timeout, self.page.goto(url)).await {
                Ok(Ok(_)) => Ok(()),
                Ok(Err(e)) => Err(browser_err(&format!("Navigation to {} failed", url), e)),
                Err(_) => Err(ScrapeError::Timeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                }),
            }
        }

        async fn wait_for_selector(&mut self, selector: &str) -> Result<bool> {
            let poll = async {
                loop {
                    if self.page.find_element(selector).await.is_ok() {
                        return;
                    }
                    tokio::time::sleep(Duration::from_millis(250)).await;
                }
            };
            match tokio::time::timeout(self.timeout.min(SELECTOR_WAIT), poll).await {
                Ok(()) => Ok(true),
                Err(_) => {
                    warn!("Timeout waiting for selector {}", selector);
                    Ok(false)
                }
            }
        }

        async fn content(&mut self) -> Result<String> {
            self.page
                .content()
                .await
                .map_err(|e| browser_err("Failed to read page content", e))
        }

        async fn close(self: Box<Self>) -> Result<()> {
            self.interceptor.abort();
            self.page
                .close()
                .await
                .map_err(|e| browser_err("Failed to close page", e))
        }
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct BrowserSession {
    closed: std::sync::atomic::AtomicBool,
}

#[cfg(not(feature = "browser"))]
impl BrowserSession {
    pub fn new(_config: BrowserEngineConfig) -> Self {
        Self {
            closed: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub async fn status(&self) -> SessionStatus {
        if self.closed.load(std::sync::atomic::Ordering::SeqCst) {
            SessionStatus::Closed
        } else {
            SessionStatus::Unstarted
        }
    }

    async fn open_page(&self) -> Result<Box<dyn PageHandle>> {
        Err(crate::error::ScrapeError::Browser(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
                .to_string(),
        ))
    }

    pub async fn close(&self) -> Result<()> {
        self.closed.store(true, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_session_is_unstarted_and_close_is_idempotent() {
        let access = BrowserPageAccess::new(BrowserEngineConfig::default());
        assert_eq!(access.session().status().await, SessionStatus::Unstarted);

        access.close().await.unwrap();
        access.close().await.unwrap();
        assert_eq!(access.session().status().await, SessionStatus::Closed);
    }

    #[cfg(feature = "browser")]
    #[test]
    fn test_heavy_resources_are_blocked() {
        use chromiumoxide::cdp::browser_protocol::network::ResourceType;

        assert!(engine::is_blocked_resource(&ResourceType::Image));
        assert!(engine::is_blocked_resource(&ResourceType::Stylesheet));
        assert!(engine::is_blocked_resource(&ResourceType::Font));
        assert!(engine::is_blocked_resource(&ResourceType::Media));
        assert!(!engine::is_blocked_resource(&ResourceType::Document));
        assert!(!engine::is_blocked_resource(&ResourceType::Script));
        assert!(!engine::is_blocked_resource(&ResourceType::Xhr));
    }

    #[cfg(not(feature = "browser"))]
    #[tokio::test]
    async fn test_get_page_without_browser_support_fails() {
        let access = BrowserPageAccess::new(BrowserEngineConfig::default());
        assert!(access.get_page().await.is_err());
    }
}
