use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::browser::default_executable;
use headless_chrome::{Browser, LaunchOptions, Tab};
use log::{info, warn};
use scraper::{ElementRef, Html, Selector};

use crate::error::{CrawlError, SessionError};
use crate::retry::Retry;

// --- Session contract ---

/// A browser-like session with one primary context and at most one
/// secondary context. Queries run against whichever context has focus:
/// the secondary while it is open, the primary otherwise.
pub trait RenderingSession {
    /// Navigates the primary context.
    fn open(&mut self, url: &str) -> Result<(), SessionError>;

    /// Opens `url` in a new context without touching the primary one.
    fn open_secondary(&mut self, url: &str) -> Result<(), SessionError>;

    /// Closes the secondary context, if any, and gives focus back to the
    /// primary context.
    fn close_secondary(&mut self) -> Result<(), SessionError>;

    fn has_secondary(&self) -> bool;

    /// Blocks until `selector` matches in the focused context or `timeout`
    /// elapses.
    fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), SessionError>;

    /// Captures the focused context's rendered DOM.
    fn snapshot(&self) -> Result<PageSnapshot, SessionError>;

    fn query(&self, selector: &str) -> Result<Vec<String>, SessionError> {
        self.snapshot()?.texts(selector)
    }
}

// --- Snapshots ---

/// An immutable capture of a rendered page.
pub struct PageSnapshot {
    url: String,
    document: Html,
}

impl PageSnapshot {
    pub fn parse(url: &str, html: &str) -> Self {
        Self {
            url: url.to_string(),
            document: Html::parse_document(html),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn elements(&self, selector: &str) -> Result<Vec<ElementRef<'_>>, SessionError> {
        let selector = parse_selector(selector)?;
        Ok(self.document.select(&selector).collect())
    }

    /// Rendered text of every match, in document order.
    pub fn texts(&self, selector: &str) -> Result<Vec<String>, SessionError> {
        Ok(self
            .elements(selector)?
            .into_iter()
            .map(rendered_text)
            .collect())
    }

    pub fn first_text(&self, selector: &str) -> Result<Option<String>, SessionError> {
        Ok(self.elements(selector)?.into_iter().next().map(rendered_text))
    }
}

pub fn parse_selector(selector: &str) -> Result<Selector, SessionError> {
    Selector::parse(selector).map_err(|e| SessionError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Descendant text with whitespace runs collapsed, the way a browser
/// reports an element's visible text.
pub fn rendered_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

// --- Headless Chrome ---

pub struct ChromeSession {
    browser: Browser,
    primary: Arc<Tab>,
    secondary: Option<Arc<Tab>>,
}

impl ChromeSession {
    pub fn launch(headless: bool) -> Result<Self, SessionError> {
        let launch_options = LaunchOptions {
            headless,
            sandbox: false, // passes --no-sandbox
            path: default_executable().ok(),
            args: vec![
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-dev-shm-usage"),
            ],
            idle_browser_timeout: Duration::from_secs(120),
            ..Default::default()
        };

        let browser =
            Browser::new(launch_options).map_err(|e| SessionError::Launch(e.to_string()))?;
        let primary = browser
            .new_tab()
            .map_err(|e| SessionError::Launch(format!("failed to create primary tab: {}", e)))?;

        Ok(Self {
            browser,
            primary,
            secondary: None,
        })
    }

    /// Launches Chrome, retrying transient startup failures.
    pub fn launch_with_retry(headless: bool, attempts: u32) -> Result<Self, CrawlError> {
        let retry = Retry::new(attempts, "Browser setup");
        let session = retry.run(|_| Self::launch(headless)).map_err(|source| {
            CrawlError::SessionUnavailable {
                attempts: retry.attempts(),
                source,
            }
        })?;
        info!("Browser session ready");
        Ok(session)
    }

    fn focused(&self) -> &Arc<Tab> {
        self.secondary.as_ref().unwrap_or(&self.primary)
    }

    fn navigate(tab: &Tab, url: &str) -> Result<(), SessionError> {
        tab.navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map(|_| ())
            .map_err(|e| SessionError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}

impl RenderingSession for ChromeSession {
    fn open(&mut self, url: &str) -> Result<(), SessionError> {
        Self::navigate(&self.primary, url)
    }

    fn open_secondary(&mut self, url: &str) -> Result<(), SessionError> {
        if self.secondary.is_some() {
            return Err(SessionError::SecondaryAlreadyOpen);
        }
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| SessionError::Driver(format!("failed to open tab: {}", e)))?;
        // Tracked before navigating so a failed load can still be closed.
        self.secondary = Some(Arc::clone(&tab));
        Self::navigate(&tab, url)
    }

    fn close_secondary(&mut self) -> Result<(), SessionError> {
        let Some(tab) = self.secondary.take() else {
            return Ok(());
        };
        let closed = tab
            .close(false)
            .map(|_| ())
            .map_err(|e| SessionError::Driver(format!("failed to close tab: {}", e)));
        if let Err(e) = self.primary.activate() {
            warn!("Could not refocus primary tab: {}", e);
        }
        closed
    }

    fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), SessionError> {
        self.focused()
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map(|_| ())
            .map_err(|_| SessionError::Timeout {
                selector: selector.to_string(),
                waited: timeout,
            })
    }

    fn snapshot(&self) -> Result<PageSnapshot, SessionError> {
        let tab = self.focused();
        let html = tab
            .get_content()
            .map_err(|e| SessionError::Driver(format!("failed to read page: {}", e)))?;
        Ok(PageSnapshot::parse(&tab.get_url(), &html))
    }
}

// --- Scripted session for tests ---

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::{PageSnapshot, RenderingSession};
    use crate::error::SessionError;

    struct Context {
        url: String,
        stalled: bool,
    }

    /// Serves canned HTML per URL. A URL can be told to stall (never
    /// satisfy a wait) for its first N loads; unknown URLs fail to
    /// navigate.
    #[derive(Default)]
    pub struct ScriptedSession {
        pages: HashMap<String, String>,
        stalls: HashMap<String, u32>,
        primary: Option<Context>,
        secondary: Option<Context>,
        pub loads: Vec<String>,
        pub secondary_opens: usize,
        pub secondary_closes: usize,
    }

    impl ScriptedSession {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        pub fn stall(mut self, url: &str, times: u32) -> Self {
            self.stalls.insert(url.to_string(), times);
            self
        }

        fn load(&mut self, url: &str) -> Result<Context, SessionError> {
            self.loads.push(url.to_string());
            if !self.pages.contains_key(url) {
                return Err(SessionError::Navigation {
                    url: url.to_string(),
                    reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
                });
            }
            let stalled = match self.stalls.get_mut(url) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            };
            Ok(Context {
                url: url.to_string(),
                stalled,
            })
        }

        fn focused(&self) -> Option<&Context> {
            self.secondary.as_ref().or(self.primary.as_ref())
        }
    }

    impl RenderingSession for ScriptedSession {
        fn open(&mut self, url: &str) -> Result<(), SessionError> {
            let context = self.load(url)?;
            self.primary = Some(context);
            Ok(())
        }

        fn open_secondary(&mut self, url: &str) -> Result<(), SessionError> {
            if self.secondary.is_some() {
                return Err(SessionError::SecondaryAlreadyOpen);
            }
            self.secondary_opens += 1;
            self.secondary = Some(Context {
                url: url.to_string(),
                stalled: true,
            });
            let context = self.load(url)?;
            self.secondary = Some(context);
            Ok(())
        }

        fn close_secondary(&mut self) -> Result<(), SessionError> {
            if self.secondary.take().is_some() {
                self.secondary_closes += 1;
            }
            Ok(())
        }

        fn has_secondary(&self) -> bool {
            self.secondary.is_some()
        }

        fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), SessionError> {
            let timed_out = || SessionError::Timeout {
                selector: selector.to_string(),
                waited: timeout,
            };
            match self.focused() {
                Some(context) if !context.stalled => {
                    if !self.snapshot()?.elements(selector)?.is_empty() {
                        Ok(())
                    } else {
                        Err(timed_out())
                    }
                }
                _ => Err(timed_out()),
            }
        }

        fn snapshot(&self) -> Result<PageSnapshot, SessionError> {
            let context = self
                .focused()
                .ok_or_else(|| SessionError::Driver("no page loaded".to_string()))?;
            let html = self.pages.get(&context.url).map(String::as_str).unwrap_or("");
            Ok(PageSnapshot::parse(&context.url, html))
        }
    }
}
