//! Producing a fresh [`PartStore`] by running the scrape pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use partsdb_core::{PartStore, ScraperSettings};
use partsdb_scraper::{
    run_pipeline, ChromiumNavigator, IdentityRotator, Navigator, RandomIdentityRotator, RunReport,
};
use tokio_util::sync::CancellationToken;

use crate::StoreError;

#[async_trait]
pub trait Refresher: Send + Sync {
    /// # Errors
    ///
    /// [`StoreError::UpstreamUnavailable`] when the run yields no records.
    async fn refresh(&self) -> Result<PartStore, StoreError>;
}

/// A run that produced no records is a failure, whatever the per-URL
/// outcomes were.
///
/// # Errors
///
/// [`StoreError::UpstreamUnavailable`] when the report's store is empty.
pub fn report_into_store(report: RunReport) -> Result<PartStore, StoreError> {
    if report.store.is_empty() {
        let reasons: Vec<String> = report
            .outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| format!("{}: {}", o.url, e.kind())))
            .collect();
        let detail = if report.cancelled {
            "run cancelled before any parts were collected".to_owned()
        } else if reasons.is_empty() {
            "no source pages produced parts".to_owned()
        } else {
            format!("no parts collected ({})", reasons.join(", "))
        };
        return Err(StoreError::UpstreamUnavailable(detail));
    }
    Ok(report.into_store())
}

/// Launches a fresh headless Chromium per refresh and closes it afterwards.
pub struct BrowserRefresher {
    settings: ScraperSettings,
    chromium_path: Option<PathBuf>,
    cancel: CancellationToken,
}

impl BrowserRefresher {
    /// `cancel` is the process-level shutdown token; each refresh runs under a
    /// child of it.
    #[must_use]
    pub fn new(
        settings: ScraperSettings,
        chromium_path: Option<PathBuf>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            settings,
            chromium_path,
            cancel,
        }
    }
}

#[async_trait]
impl Refresher for BrowserRefresher {
    async fn refresh(&self) -> Result<PartStore, StoreError> {
        let rotator: Arc<dyn IdentityRotator> =
            Arc::new(RandomIdentityRotator::from_settings(&self.settings));
        let navigator = ChromiumNavigator::launch(
            self.chromium_path.as_deref(),
            Arc::clone(&rotator),
            self.settings.nav_timeout(),
        )
        .await
        .map_err(|e| StoreError::UpstreamUnavailable(e.to_string()))?;

        let report = run_pipeline(
            &navigator,
            rotator.as_ref(),
            &self.settings,
            &self.cancel.child_token(),
        )
        .await;
        navigator.shutdown().await;

        report_into_store(report)
    }
}

/// Runs the pipeline against an existing navigator.
pub struct NavigatorRefresher {
    navigator: Arc<dyn Navigator>,
    rotator: Arc<dyn IdentityRotator>,
    settings: ScraperSettings,
}

impl NavigatorRefresher {
    #[must_use]
    pub fn new(
        navigator: Arc<dyn Navigator>,
        rotator: Arc<dyn IdentityRotator>,
        settings: ScraperSettings,
    ) -> Self {
        Self {
            navigator,
            rotator,
            settings,
        }
    }
}

#[async_trait]
impl Refresher for NavigatorRefresher {
    async fn refresh(&self) -> Result<PartStore, StoreError> {
        let report = run_pipeline(
            self.navigator.as_ref(),
            self.rotator.as_ref(),
            &self.settings,
            &CancellationToken::new(),
        )
        .await;
        report_into_store(report)
    }
}
