//! Browser abstraction: open a URL under an identity and read back the
//! rendered markup.

pub mod chromium;
pub mod fixture;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScraperError;
use crate::identity::Identity;

/// Viewport every navigation is rendered in.
pub const VIEWPORT_WIDTH: u32 = 1920;
pub const VIEWPORT_HEIGHT: u32 = 1080;

#[async_trait]
pub trait Navigator: Send + Sync {
    /// Navigates to `url` and returns once the page has loaded and settled.
    ///
    /// # Errors
    ///
    /// [`ScraperError::NavigationTimeout`] when the load exceeds the navigation
    /// timeout, [`ScraperError::Navigation`] or [`ScraperError::Browser`] for
    /// other failures.
    async fn open(&self, url: &str, identity: &Identity)
        -> Result<Box<dyn PageHandle>, ScraperError>;
}

/// One loaded page. Closing it discards its session state.
#[async_trait]
pub trait PageHandle: Send + Sync {
    fn url(&self) -> &str;

    /// Waits until `selector` matches at least one element.
    ///
    /// # Errors
    ///
    /// [`ScraperError::ContentNotFound`] when nothing matches within `timeout`.
    async fn wait_for_content(&self, selector: &str, timeout: Duration)
        -> Result<(), ScraperError>;

    /// Serialized markup of the current document.
    async fn html(&self) -> Result<String, ScraperError>;

    async fn close(self: Box<Self>);
}
