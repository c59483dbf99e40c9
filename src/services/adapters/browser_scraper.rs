use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use crate::{
    configuration::{BrowserSettings, Credentials},
    domain::{RawRecord, ScrapedImage, Source},
    error::{SessionError, SourceError},
    services::{LoginFlow, PageGuard, SessionManager},
};

use super::SourceAdapter;

/// Collects every rendered `<img>` wider than `arguments[0]` pixels with an
/// absolute http(s) source.
const EXTRACT_IMAGES_SCRIPT: &str = r#"
const minWidth = arguments[0];
const results = [];
document.querySelectorAll("img").forEach((img) => {
  const src = img.currentSrc || img.src || (img.dataset && img.dataset.src) || "";
  if (/^https?:\/\//.test(src) && img.width > minWidth) {
    const anchor = img.closest("a");
    results.push({ url: src, title: img.alt || "", sourceUrl: anchor ? anchor.href : "" });
  }
});
return results;
"#;

const SCROLL_SCRIPT: &str = "window.scrollBy(0, window.innerHeight); return null;";

/// Everything that differs between login-gated platforms.
#[derive(Debug, Clone)]
pub struct PlatformProfile {
    pub source: Source,
    pub login: LoginFlow,
    pub search_url: &'static str,
    pub search_param: &'static str,
    /// Origin page used when an image is not wrapped in a link.
    pub fallback_page: &'static str,
    /// Image URLs must contain one of these, when non-empty.
    pub require_any: &'static [&'static str],
    /// Image URLs containing any of these are skipped.
    pub reject_any: &'static [&'static str],
}

impl PlatformProfile {
    pub fn pinterest() -> Self {
        PlatformProfile {
            source: Source::Pinterest,
            login: LoginFlow {
                url: "https://www.pinterest.com/login/",
                form_settle: Duration::ZERO,
                email_selectors: &[r#"input[name="id"]"#],
                password_selector: r#"input[name="password"]"#,
                submit_selector: Some(r#"button[type="submit"]"#),
            },
            search_url: "https://www.pinterest.com/search/pins/",
            search_param: "q",
            fallback_page: "https://www.pinterest.com",
            require_any: &["pinimg"],
            reject_any: &[],
        }
    }

    pub fn savee() -> Self {
        PlatformProfile {
            source: Source::Savee,
            login: LoginFlow {
                url: "https://savee.it/login/",
                form_settle: Duration::from_secs(2),
                email_selectors: &[r#"input[name="email"]"#, r#"input[type="email"]"#],
                password_selector: r#"input[name="password"]"#,
                submit_selector: Some(r#"button[type="submit"]"#),
            },
            search_url: "https://savee.it/search/",
            search_param: "q",
            fallback_page: "https://savee.it",
            require_any: &[],
            reject_any: &["avatar", "logo"],
        }
    }

    pub fn shotdeck() -> Self {
        PlatformProfile {
            source: Source::Shotdeck,
            login: LoginFlow {
                url: "https://shotdeck.com/welcome/login",
                form_settle: Duration::from_secs(3),
                email_selectors: &[
                    r#"input[type="email"]"#,
                    r#"input[name*="email"]"#,
                    r#"input[placeholder*="mail" i]"#,
                    r#"input[type="text"]"#,
                ],
                password_selector: r#"input[type="password"]"#,
                submit_selector: Some(r#"button[type="submit"], input[type="submit"]"#),
            },
            search_url: "https://shotdeck.com/browse",
            search_param: "search",
            fallback_page: "https://shotdeck.com",
            require_any: &[],
            reject_any: &["avatar", "logo"],
        }
    }

    pub fn for_source(source: Source) -> Option<Self> {
        match source {
            Source::Pinterest => Some(PlatformProfile::pinterest()),
            Source::Savee => Some(PlatformProfile::savee()),
            Source::Shotdeck => Some(PlatformProfile::shotdeck()),
            Source::Arena => None,
        }
    }

    pub fn search_page(&self, query: &str) -> Result<Url, url::ParseError> {
        Url::parse_with_params(self.search_url, &[(self.search_param, query)])
    }

    fn accepts(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        let required = self.require_any.is_empty()
            || self.require_any.iter().any(|frag| url.contains(frag));
        required && !self.reject_any.iter().any(|frag| url.contains(frag))
    }
}

/// Scrapes a login-gated platform's search page through the shared browser.
pub struct BrowserScraper {
    profile: PlatformProfile,
    credentials: Option<Credentials>,
    sessions: Arc<SessionManager>,
    navigation_timeout: Duration,
    settle_delay: Duration,
    scroll_cycles: u8,
    scroll_delay: Duration,
    min_image_width: u32,
}

impl BrowserScraper {
    pub fn new(
        profile: PlatformProfile,
        credentials: Option<Credentials>,
        sessions: Arc<SessionManager>,
        settings: &BrowserSettings,
    ) -> Self {
        BrowserScraper {
            profile,
            credentials: credentials.filter(Credentials::is_complete),
            sessions,
            navigation_timeout: Duration::from_secs(settings.navigation_timeout_secs),
            settle_delay: Duration::from_millis(settings.settle_delay_ms),
            scroll_cycles: settings.scroll_cycles,
            scroll_delay: Duration::from_millis(settings.scroll_delay_ms),
            min_image_width: settings.min_image_width,
        }
    }

    async fn scrape(
        &self,
        credentials: &Credentials,
        query: &str,
    ) -> Result<Vec<ScrapedImage>, SessionError> {
        let search_page = self
            .profile
            .search_page(query)
            .map_err(|e| SessionError::Driver(e.to_string()))?;

        let session = self
            .sessions
            .acquire(self.profile.source, &self.profile.login, credentials)
            .await?;
        let page = PageGuard::new(session.new_page().await?);

        page.goto(search_page.as_str()).await?;
        if let Err(e) = page.wait_until_ready(self.navigation_timeout).await {
            log::warn!("[{}] Search page still loading: {}", self.profile.source, e);
        }
        page.pause(self.settle_delay).await;

        for _ in 0..self.scroll_cycles {
            page.evaluate(SCROLL_SCRIPT, Vec::new()).await?;
            page.pause(self.scroll_delay).await;
        }

        let extracted = page
            .evaluate(EXTRACT_IMAGES_SCRIPT, vec![json!(self.min_image_width)])
            .await?;
        page.close().await?;

        let images: Vec<ScrapedImage> = serde_json::from_value(extracted)
            .map_err(|e| SessionError::Driver(format!("unexpected extraction result: {}", e)))?;

        Ok(images)
    }
}

#[async_trait]
impl SourceAdapter for BrowserScraper {
    fn source(&self) -> Source {
        self.profile.source
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawRecord>, SourceError> {
        let source = self.profile.source;
        let Some(credentials) = &self.credentials else {
            return Err(SourceError::NotConfigured(source));
        };

        log::info!("[{}] Starting authenticated scrape for: {}", source, query);

        let images = self
            .scrape(credentials, query)
            .await
            .map_err(|e| SourceError::session(source, e))?;

        log::info!("[{}] Got {} images", source, images.len());

        Ok(images
            .into_iter()
            .filter(|img| self.profile.accepts(&img.url))
            .map(|img| ScrapedImage {
                source_url: match img.source_url.is_empty() {
                    true => self.profile.fallback_page.to_string(),
                    false => img.source_url,
                },
                ..img
            })
            .take(limit)
            .map(RawRecord::Scraped)
            .collect())
    }
}
