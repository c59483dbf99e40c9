use std::{
    collections::HashMap,
    ops::Deref,
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::{
    sync::Mutex,
    time::{self, Instant},
};

use crate::{
    configuration::{BrowserSettings, Credentials},
    domain::Source,
    error::SessionError,
};

/// WebDriver key code for Enter, sent through `fill` to submit a form.
pub const ENTER_KEY: &str = "\u{e007}";

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Starts a browser. The only place a real browser process is created.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>, SessionError>;
}

/// A running browser that hands out pages.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn is_connected(&self) -> bool;
    async fn new_page(&self) -> Result<Arc<dyn BrowserPage>, SessionError>;
    async fn shutdown(&self) -> Result<(), SessionError>;
}

/// The capabilities adapters get on a single page.
#[async_trait]
pub trait BrowserPage: Send + Sync + 'static {
    async fn goto(&self, url: &str) -> Result<(), SessionError>;
    async fn fill(&self, selector: &str, value: &str) -> Result<(), SessionError>;
    async fn click(&self, selector: &str) -> Result<(), SessionError>;
    /// Runs a script that only reads the DOM and returns its JSON result.
    async fn evaluate(&self, script: &str, args: Vec<Value>) -> Result<Value, SessionError>;
    async fn close(&self) -> Result<(), SessionError>;

    async fn pause(&self, delay: Duration) {
        time::sleep(delay).await;
    }

    /// Waits until the document finished loading, bounded by `timeout`.
    async fn wait_until_ready(&self, timeout: Duration) -> Result<(), SessionError> {
        let deadline = Instant::now() + timeout;
        loop {
            let state = self
                .evaluate("return document.readyState;", Vec::new())
                .await?;
            if state == "complete" {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SessionError::Driver(format!(
                    "page not ready after {} seconds",
                    timeout.as_secs()
                )));
            }
            time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn exists(&self, selector: &str) -> Result<bool, SessionError> {
        let found = self
            .evaluate(
                "return document.querySelector(arguments[0]) !== null;",
                vec![json!(selector)],
            )
            .await?;
        Ok(found.as_bool().unwrap_or(false))
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        let href = self.evaluate("return window.location.href;", Vec::new()).await?;
        Ok(href.as_str().unwrap_or_default().to_string())
    }
}

/// Owns a page and makes sure it gets closed, even when the owning future is
/// dropped on timeout.
pub struct PageGuard {
    page: Arc<dyn BrowserPage>,
    closed: bool,
}

impl PageGuard {
    pub fn new(page: Arc<dyn BrowserPage>) -> Self {
        PageGuard {
            page,
            closed: false,
        }
    }

    pub async fn close(mut self) -> Result<(), SessionError> {
        self.closed = true;
        self.page.close().await
    }
}

impl Deref for PageGuard {
    type Target = dyn BrowserPage;

    fn deref(&self) -> &Self::Target {
        self.page.as_ref()
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let page = self.page.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = page.close().await {
                        log::warn!("Failed to close abandoned page: {}", e);
                    }
                });
            }
            Err(_) => log::warn!("Page dropped outside the runtime, leaving it open"),
        }
    }
}

/// How to log in to one platform.
#[derive(Debug, Clone)]
pub struct LoginFlow {
    pub url: &'static str,
    /// Extra wait for forms rendered after load.
    pub form_settle: Duration,
    /// Tried in order, the first one present on the page is used.
    pub email_selectors: &'static [&'static str],
    pub password_selector: &'static str,
    /// When absent or missing from the page, Enter is pressed in the password field.
    pub submit_selector: Option<&'static str>,
}

struct SessionState {
    session: Option<Arc<dyn BrowserSession>>,
    generation: u64,
}

/// Hands out one shared browser per process and logs in to each platform once.
pub struct SessionManager {
    launcher: Arc<dyn BrowserLauncher>,
    navigation_timeout: Duration,
    login_timeout: Duration,
    state: Mutex<SessionState>,
    // Generation of the browser each platform last logged in to.
    logins: StdMutex<HashMap<Source, Arc<Mutex<u64>>>>,
}

impl SessionManager {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, settings: &BrowserSettings) -> Self {
        SessionManager {
            launcher,
            navigation_timeout: Duration::from_secs(settings.navigation_timeout_secs),
            login_timeout: Duration::from_secs(settings.login_timeout_secs),
            state: Mutex::new(SessionState {
                session: None,
                generation: 0,
            }),
            logins: StdMutex::new(HashMap::new()),
        }
    }

    /// A connected browser already logged in to `platform`.
    pub async fn acquire(
        &self,
        platform: Source,
        flow: &LoginFlow,
        credentials: &Credentials,
    ) -> Result<Arc<dyn BrowserSession>, SessionError> {
        let (session, generation) = self.browser().await?;

        let login_lock = self.login_lock(platform);
        let mut logged_in_generation = login_lock.lock().await;
        if *logged_in_generation != generation {
            log::info!("[{}] Logging in", platform);
            self.login(&session, flow, credentials).await?;
            *logged_in_generation = generation;
            log::info!("[{}] Logged in", platform);
        }

        Ok(session)
    }

    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        if let Some(session) = state.session.take() {
            log::info!("Shutting down browser session");
            if let Err(e) = session.shutdown().await {
                log::error!("Failed to shut down browser: {}", e);
            }
        }
    }

    async fn browser(&self) -> Result<(Arc<dyn BrowserSession>, u64), SessionError> {
        let mut state = self.state.lock().await;

        if let Some(session) = &state.session {
            if session.is_connected().await {
                return Ok((session.clone(), state.generation));
            }
            log::warn!("Browser session disconnected, relaunching");
        }

        let session = self.launcher.launch().await?;
        state.generation += 1;
        state.session = Some(session.clone());
        log::info!("Launched browser session #{}", state.generation);

        Ok((session, state.generation))
    }

    fn login_lock(&self, platform: Source) -> Arc<Mutex<u64>> {
        let mut logins = match self.logins.lock() {
            Ok(logins) => logins,
            Err(poisoned) => poisoned.into_inner(),
        };
        logins.entry(platform).or_default().clone()
    }

    async fn login(
        &self,
        session: &Arc<dyn BrowserSession>,
        flow: &LoginFlow,
        credentials: &Credentials,
    ) -> Result<(), SessionError> {
        let page = PageGuard::new(session.new_page().await?);

        page.goto(flow.url).await?;
        page.wait_until_ready(self.navigation_timeout).await?;
        if !flow.form_settle.is_zero() {
            page.pause(flow.form_settle).await;
        }
        // Login pages often redirect to themselves with a `next` parameter.
        let form_url = page.current_url().await?;

        let email_selector = first_present(&page, flow.email_selectors).await?;
        page.fill(email_selector, &credentials.email).await?;
        page.fill(flow.password_selector, &credentials.password).await?;

        match flow.submit_selector {
            Some(submit) if page.exists(submit).await? => page.click(submit).await?,
            _ => page.fill(flow.password_selector, ENTER_KEY).await?,
        }

        let login_urls = [flow.url, form_url.as_str()];
        wait_for_navigation_away(&page, &login_urls, self.login_timeout).await?;
        page.close().await
    }
}

async fn first_present<'a>(
    page: &PageGuard,
    selectors: &[&'a str],
) -> Result<&'a str, SessionError> {
    for &selector in selectors {
        if page.exists(selector).await? {
            return Ok(selector);
        }
    }
    Err(SessionError::SelectorNotFound(selectors.join(", ")))
}

async fn wait_for_navigation_away(
    page: &PageGuard,
    login_urls: &[&str],
    timeout: Duration,
) -> Result<(), SessionError> {
    let deadline = Instant::now() + timeout;
    let is_login_url = |url: &str| {
        let url = url.trim_end_matches('/');
        login_urls.iter().any(|l| l.trim_end_matches('/') == url)
    };

    loop {
        let current = page.current_url().await?;
        if !current.is_empty() && !is_login_url(&current) {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(SessionError::LoginTimeout(timeout.as_secs()));
        }
        time::sleep(POLL_INTERVAL).await;
    }
}
