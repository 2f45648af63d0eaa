//! Live browser sessions over W3C WebDriver

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use thirtyfour::components::SelectElement;
use thirtyfour::error::WebDriverErrorInner;
use thirtyfour::prelude::*;
use thirtyfour::{Capabilities, ChromiumLikeCapabilities};
use tracing::{debug, info};

use crate::config::{BrowserKind, SuiteConfig};
use crate::driver::process::{DriverConfig, DriverProcess};
use crate::driver::{Browser, Launcher, Strategy};
use crate::error::{E2eError, E2eResult};

const CHROME_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--window-size=1920,1080",
    "--disable-blink-features=AutomationControlled",
];

impl From<WebDriverError> for E2eError {
    fn from(err: WebDriverError) -> Self {
        match err.as_inner() {
            WebDriverErrorInner::InvalidElementState(_) => E2eError::InvalidElementState(err.to_string()),
            _ => E2eError::WebDriver(err.to_string()),
        }
    }
}

/// Build session capabilities from the suite configuration
pub fn capabilities(config: &SuiteConfig) -> E2eResult<Capabilities> {
    match config.browser {
        BrowserKind::Chrome => {
            let mut caps = DesiredCapabilities::chrome();
            if config.headless {
                caps.set_headless()?;
            }
            for arg in CHROME_ARGS {
                caps.add_arg(arg)?;
            }
            caps.add_exclude_switch("enable-automation")?;
            caps.add_experimental_option("useAutomationExtension", false)?;
            Ok(caps.into())
        }
        BrowserKind::Firefox => {
            let mut caps = DesiredCapabilities::firefox();
            if config.headless {
                caps.set_headless()?;
            }
            Ok(caps.into())
        }
    }
}

fn to_by(strategy: &Strategy) -> By {
    match strategy {
        Strategy::Id(id) => By::Id(id.clone()),
        Strategy::Name(name) => By::Name(name.clone()),
        Strategy::Css(css) => By::Css(css.clone()),
        Strategy::TestId(_) => By::Css(strategy.to_css().unwrap_or_default()),
        Strategy::Text { .. }
        | Strategy::ExactText { .. }
        | Strategy::DialogText { .. }
        | Strategy::XPath(_) => By::XPath(strategy.to_xpath().unwrap_or_default()),
    }
}

/// One WebDriver session
pub struct WebDriverBrowser {
    driver: WebDriver,
}

impl WebDriverBrowser {
    /// Open a session against a running driver
    pub async fn connect(server_url: &str, config: &SuiteConfig) -> E2eResult<Self> {
        debug!("Opening {} session at {}", config.browser.as_str(), server_url);
        let driver = WebDriver::new(server_url, capabilities(config)?).await?;
        driver.set_implicit_wait_timeout(config.timeouts.implicit).await?;
        driver.set_page_load_timeout(config.timeouts.page_load).await?;
        Ok(Self { driver })
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    type Element = WebElement;

    async fn navigate(&self, url: &str) -> E2eResult<()> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> E2eResult<String> {
        Ok(self.driver.current_url().await?.to_string())
    }

    async fn page_source(&self) -> E2eResult<String> {
        Ok(self.driver.source().await?)
    }

    async fn find(&self, strategy: &Strategy) -> E2eResult<Option<WebElement>> {
        Ok(self.find_all(strategy).await?.into_iter().next())
    }

    async fn find_all(&self, strategy: &Strategy) -> E2eResult<Vec<WebElement>> {
        Ok(self.driver.find_all(to_by(strategy)).await?)
    }

    async fn click(&self, element: &WebElement) -> E2eResult<()> {
        element.click().await?;
        Ok(())
    }

    async fn clear(&self, element: &WebElement) -> E2eResult<()> {
        element.clear().await?;
        Ok(())
    }

    async fn send_keys(&self, element: &WebElement, text: &str) -> E2eResult<()> {
        element.send_keys(text).await?;
        Ok(())
    }

    async fn attribute(&self, element: &WebElement, name: &str) -> E2eResult<Option<String>> {
        Ok(element.attr(name).await?)
    }

    async fn is_displayed(&self, element: &WebElement) -> E2eResult<bool> {
        Ok(element.is_displayed().await?)
    }

    async fn select_by_index(&self, element: &WebElement, index: usize) -> E2eResult<()> {
        let select = SelectElement::new(element).await?;
        let index = u32::try_from(index)
            .map_err(|_| E2eError::WebDriver(format!("option index {} out of range", index)))?;
        select.select_by_index(index).await?;
        Ok(())
    }

    async fn execute_script(
        &self,
        script: &str,
        element: &WebElement,
        args: Vec<Value>,
    ) -> E2eResult<Value> {
        let mut all_args = Vec::with_capacity(args.len() + 1);
        all_args.push(element.to_json()?);
        all_args.extend(args);
        let ret = self.driver.execute(script, all_args).await?;
        Ok(ret.json().clone())
    }

    async fn enter_frame(&self, frame: &WebElement) -> E2eResult<()> {
        frame.clone().enter_frame().await?;
        Ok(())
    }

    async fn enter_default_frame(&self) -> E2eResult<()> {
        self.driver.enter_default_frame().await?;
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> E2eResult<()> {
        self.driver.screenshot(path).await?;
        Ok(())
    }

    async fn quit(&self) -> E2eResult<()> {
        self.driver.clone().quit().await?;
        Ok(())
    }
}

/// Launches WebDriver sessions, spawning a local driver binary when needed
pub struct WebDriverLauncher {
    config: SuiteConfig,
    server_url: String,
    process: Option<DriverProcess>,
}

impl WebDriverLauncher {
    pub async fn start(config: SuiteConfig) -> E2eResult<Self> {
        let (server_url, process) = match &config.webdriver_url {
            Some(url) => {
                info!("Using WebDriver at {}", url);
                (url.clone(), None)
            }
            None => {
                let process = DriverProcess::spawn(DriverConfig::for_suite(&config)).await?;
                (process.url().to_string(), Some(process))
            }
        };

        Ok(Self {
            config,
            server_url,
            process,
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Stop the spawned driver, if any
    pub fn stop(&mut self) -> E2eResult<()> {
        if let Some(mut process) = self.process.take() {
            process.stop()?;
        }
        Ok(())
    }
}

#[async_trait]
impl Launcher for WebDriverLauncher {
    type Browser = WebDriverBrowser;

    async fn launch(&self) -> E2eResult<WebDriverBrowser> {
        WebDriverBrowser::connect(&self.server_url, &self.config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thirtyfour::error::WebDriverErrorInfo;

    #[test]
    fn invalid_element_state_maps_by_variant() {
        let info = WebDriverErrorInfo::new("Element must be user-editable in order to clear it.".into());
        let err: E2eError = WebDriverError::InvalidElementState(info).into();
        assert!(err.is_invalid_element_state());

        let info = WebDriverErrorInfo::new("invalid state mentioned in a lookup failure".into());
        let err: E2eError = WebDriverError::NoSuchElement(info).into();
        assert!(matches!(err, E2eError::WebDriver(_)));
    }

    #[test]
    fn headless_chrome_capabilities_build() {
        let config = SuiteConfig {
            headless: true,
            ..SuiteConfig::default()
        };
        let caps = capabilities(&config).unwrap();
        let json = serde_json::to_string(&caps).unwrap();
        assert!(json.contains("--headless"));
        assert!(json.contains("--window-size=1920,1080"));
    }
}
