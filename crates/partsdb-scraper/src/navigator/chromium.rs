//! Headless Chromium navigator driven over CDP with `chromiumoxide`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::layout::Point;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::{Navigator, PageHandle, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use crate::error::ScraperError;
use crate::identity::{Identity, IdentityRotator};

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";
const CONTENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

fn browser_err(e: impl std::fmt::Display) -> ScraperError {
    ScraperError::Browser(e.to_string())
}

pub struct ChromiumNavigator {
    browser: Browser,
    handler: JoinHandle<()>,
    rotator: Arc<dyn IdentityRotator>,
    nav_timeout: Duration,
}

impl ChromiumNavigator {
    /// Launches a headless Chromium instance.
    ///
    /// `chromium_path` overrides executable discovery.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] if the config is rejected or the
    /// process fails to start.
    pub async fn launch(
        chromium_path: Option<&Path>,
        rotator: Arc<dyn IdentityRotator>,
        nav_timeout: Duration,
    ) -> Result<Self, ScraperError> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-webgl")
            .arg("--disable-features=site-per-process")
            .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
            .viewport(Viewport {
                width: VIEWPORT_WIDTH,
                height: VIEWPORT_HEIGHT,
                ..Viewport::default()
            });
        if let Some(path) = chromium_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| ScraperError::Browser(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScraperError::Browser(format!("failed to launch Chromium: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "chromium handler event error");
                }
            }
        });

        tracing::info!("chromium launched");
        Ok(Self {
            browser,
            handler,
            rotator,
            nav_timeout,
        })
    }

    /// Closes the browser and stops the CDP handler task.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!(error = %e, "failed to close chromium cleanly");
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!(error = %e, "chromium process wait failed");
        }
        self.handler.abort();
    }

    async fn apply_identity(page: &Page, identity: &Identity) -> Result<(), ScraperError> {
        page.execute(SetUserAgentOverrideParams::new(identity.user_agent.clone()))
            .await
            .map_err(browser_err)?;

        let headers: serde_json::Map<String, serde_json::Value> = identity
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        page.execute(SetExtraHttpHeadersParams::new(Headers::new(
            serde_json::Value::Object(headers),
        )))
        .await
        .map_err(browser_err)?;
        Ok(())
    }

    /// Pointer move + click, then scroll to the bottom. Failures here never
    /// fail the navigation.
    async fn interact(&self, page: &Page, url: &str) {
        let (x, y) = self
            .rotator
            .pointer_target(VIEWPORT_WIDTH, VIEWPORT_HEIGHT);
        let point = Point::new(x, y);
        if let Err(e) = page.move_mouse(point).await {
            tracing::debug!(url, error = %e, "synthetic pointer move failed");
        } else if let Err(e) = page.click(point).await {
            tracing::debug!(url, error = %e, "synthetic click failed");
        }
        if let Err(e) = page.evaluate(SCROLL_TO_BOTTOM).await {
            tracing::debug!(url, error = %e, "scroll to bottom failed");
        }
    }
}

#[async_trait]
impl Navigator for ChromiumNavigator {
    async fn open(
        &self,
        url: &str,
        identity: &Identity,
    ) -> Result<Box<dyn PageHandle>, ScraperError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(browser_err)?;

        let page = ChromiumPage {
            page,
            url: url.to_owned(),
        };

        if let Err(e) = self.load(&page, url, identity).await {
            Box::new(page).close().await;
            return Err(e);
        }
        Ok(Box::new(page))
    }
}

impl ChromiumNavigator {
    /// Navigates and waits for the page's `load` event, not for network idle.
    /// Late XHR content is covered by the settle delay and by
    /// [`PageHandle::wait_for_content`] polling for the card selector.
    async fn load(
        &self,
        page: &ChromiumPage,
        url: &str,
        identity: &Identity,
    ) -> Result<(), ScraperError> {
        Self::apply_identity(&page.page, identity).await?;

        let navigation = async {
            page.page.goto(url).await?;
            page.page.wait_for_navigation().await?;
            Ok::<(), chromiumoxide::error::CdpError>(())
        };
        match tokio::time::timeout(self.nav_timeout, navigation).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(ScraperError::Navigation {
                    url: url.to_owned(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(ScraperError::NavigationTimeout {
                    url: url.to_owned(),
                    timeout_secs: self.nav_timeout.as_secs(),
                })
            }
        }

        self.interact(&page.page, url).await;
        tokio::time::sleep(self.rotator.settle_delay()).await;
        tracing::debug!(url, "page ready");
        Ok(())
    }
}

struct ChromiumPage {
    page: Page,
    url: String,
}

#[async_trait]
impl PageHandle for ChromiumPage {
    fn url(&self) -> &str {
        &self.url
    }

    async fn wait_for_content(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), ScraperError> {
        let poll = async {
            loop {
                if self.page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(CONTENT_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| ScraperError::ContentNotFound {
                url: self.url.clone(),
                selector: selector.to_owned(),
            })
    }

    async fn html(&self) -> Result<String, ScraperError> {
        self.page.content().await.map_err(browser_err)
    }

    async fn close(self: Box<Self>) {
        let ChromiumPage { page, url } = *self;
        if let Err(e) = page.close().await {
            tracing::debug!(url, error = %e, "failed to close tab");
        }
    }
}
