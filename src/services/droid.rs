use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thirtyfour::{
    By, ChromiumLikeCapabilities, DesiredCapabilities, WebDriver, WindowHandle,
};
use tokio::sync::{Mutex, MutexGuard};

use crate::{
    configuration::BrowserSettings,
    error::SessionError,
    services::{BrowserLauncher, BrowserPage, BrowserSession},
};

const CHROME_ARGS: [&str; 5] = [
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--window-size=1280,720",
];

/// Launches Chrome through a WebDriver server (chromedriver or selenium).
pub struct Droid {
    webdriver_url: String,
    headless: bool,
    user_agent: Option<String>,
}

impl Droid {
    pub fn new(settings: &BrowserSettings) -> Self {
        Droid {
            webdriver_url: settings.webdriver_url.clone(),
            headless: settings.headless,
            user_agent: settings.user_agent.clone(),
        }
    }
}

#[async_trait]
impl BrowserLauncher for Droid {
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>, SessionError> {
        let launch_error = |e: thirtyfour::error::WebDriverError| SessionError::Launch(e.to_string());

        let mut caps = DesiredCapabilities::chrome();
        if self.headless {
            caps.set_headless().map_err(launch_error)?;
        }
        for arg in CHROME_ARGS {
            caps.add_arg(arg).map_err(launch_error)?;
        }
        let user_agent = match &self.user_agent {
            Some(ua) => ua.clone(),
            None => fake_user_agent::get_chrome_rua().to_string(),
        };
        caps.add_arg(&format!("--user-agent={}", user_agent))
            .map_err(launch_error)?;

        let driver = WebDriver::new(&self.webdriver_url, caps)
            .await
            .map_err(launch_error)?;
        let home = driver.window().await?;
        log::info!("Connected to webdriver at {}", self.webdriver_url);

        Ok(Arc::new(DroidSession {
            driver: Arc::new(Mutex::new(driver)),
            home,
        }))
    }
}

/// One WebDriver session. Pages are browser tabs; the driver only has one
/// focused tab, so every page operation holds the lock and focuses its tab first.
pub struct DroidSession {
    driver: Arc<Mutex<WebDriver>>,
    home: WindowHandle,
}

#[async_trait]
impl BrowserSession for DroidSession {
    async fn is_connected(&self) -> bool {
        let driver = self.driver.lock().await;
        driver.windows().await.is_ok()
    }

    async fn new_page(&self) -> Result<Arc<dyn BrowserPage>, SessionError> {
        let driver = self.driver.lock().await;
        driver.switch_to_window(self.home.clone()).await?;
        let handle = driver.new_tab().await?;

        Ok(Arc::new(DroidPage {
            driver: self.driver.clone(),
            home: self.home.clone(),
            handle,
        }))
    }

    async fn shutdown(&self) -> Result<(), SessionError> {
        let driver = self.driver.lock().await;
        driver.clone().quit().await?;
        Ok(())
    }
}

pub struct DroidPage {
    driver: Arc<Mutex<WebDriver>>,
    home: WindowHandle,
    handle: WindowHandle,
}

impl DroidPage {
    async fn focused(&self) -> Result<MutexGuard<'_, WebDriver>, SessionError> {
        let driver = self.driver.lock().await;
        driver.switch_to_window(self.handle.clone()).await?;
        Ok(driver)
    }
}

#[async_trait]
impl BrowserPage for DroidPage {
    async fn goto(&self, url: &str) -> Result<(), SessionError> {
        let driver = self.focused().await?;
        driver.goto(url).await?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), SessionError> {
        let driver = self.focused().await?;
        let element = driver
            .find(By::Css(selector))
            .await
            .map_err(|_| SessionError::SelectorNotFound(selector.to_string()))?;
        element.send_keys(value).await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), SessionError> {
        let driver = self.focused().await?;
        let element = driver
            .find(By::Css(selector))
            .await
            .map_err(|_| SessionError::SelectorNotFound(selector.to_string()))?;
        element.click().await?;
        Ok(())
    }

    async fn evaluate(&self, script: &str, args: Vec<Value>) -> Result<Value, SessionError> {
        let driver = self.focused().await?;
        let ret = driver.execute(script, args).await?;
        Ok(ret.json().clone())
    }

    async fn close(&self) -> Result<(), SessionError> {
        let driver = self.focused().await?;
        driver.close_window().await?;
        driver.switch_to_window(self.home.clone()).await?;
        Ok(())
    }
}
