//! In-memory navigator serving canned markup by URL.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{Navigator, PageHandle};
use crate::error::ScraperError;
use crate::identity::Identity;
use crate::page::HtmlPage;

/// What the fixture navigator does for a given URL.
#[derive(Debug, Clone)]
pub enum FixturePage {
    Html(String),
    /// Every open attempt times out.
    Timeout,
    /// Every open attempt fails with a navigation error.
    Fail(String),
}

/// Unknown URLs fail as navigation errors.
#[derive(Debug, Default)]
pub struct FixtureNavigator {
    pages: HashMap<String, FixturePage>,
    opened: Mutex<Vec<(String, Identity)>>,
}

impl FixtureNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(mut self, url: impl Into<String>, page: FixturePage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    #[must_use]
    pub fn with_html(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.with_page(url, FixturePage::Html(html.into()))
    }

    /// URLs opened so far, in order, including failed attempts.
    #[must_use]
    pub fn opened_urls(&self) -> Vec<String> {
        self.opened
            .lock()
            .map(|opened| opened.iter().map(|(url, _)| url.clone()).collect())
            .unwrap_or_default()
    }

    /// Identities used so far, in the same order as [`Self::opened_urls`].
    #[must_use]
    pub fn identities(&self) -> Vec<Identity> {
        self.opened
            .lock()
            .map(|opened| opened.iter().map(|(_, id)| id.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Navigator for FixtureNavigator {
    async fn open(
        &self,
        url: &str,
        identity: &Identity,
    ) -> Result<Box<dyn PageHandle>, ScraperError> {
        if let Ok(mut opened) = self.opened.lock() {
            opened.push((url.to_owned(), identity.clone()));
        }

        match self.pages.get(url) {
            Some(FixturePage::Html(html)) => Ok(Box::new(FixtureHandle {
                url: url.to_owned(),
                html: html.clone(),
            })),
            Some(FixturePage::Timeout) => Err(ScraperError::NavigationTimeout {
                url: url.to_owned(),
                timeout_secs: 0,
            }),
            Some(FixturePage::Fail(reason)) => Err(ScraperError::Navigation {
                url: url.to_owned(),
                reason: reason.clone(),
            }),
            None => Err(ScraperError::Navigation {
                url: url.to_owned(),
                reason: "no fixture registered".to_owned(),
            }),
        }
    }
}

struct FixtureHandle {
    url: String,
    html: String,
}

#[async_trait]
impl PageHandle for FixtureHandle {
    fn url(&self) -> &str {
        &self.url
    }

    async fn wait_for_content(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<(), ScraperError> {
        let found = HtmlPage::parse(&self.html).contains(selector)?;
        if found {
            Ok(())
        } else {
            Err(ScraperError::ContentNotFound {
                url: self.url.clone(),
                selector: selector.to_owned(),
            })
        }
    }

    async fn html(&self) -> Result<String, ScraperError> {
        Ok(self.html.clone())
    }

    async fn close(self: Box<Self>) {}
}
