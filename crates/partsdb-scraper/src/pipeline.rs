//! End-to-end scrape run: phone page, then each category page in order.
//!
//! Per-URL failures are recorded in the [`RunReport`] and never abort the
//! run. Cancellation and the run deadline stop the run between awaits; records
//! merged before that point are kept.

use std::future::Future;

use chrono::{DateTime, Utc};
use partsdb_core::{Appliance, PartStore, ScraperSettings};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::aggregate::{merge, MergeOutcome};
use crate::classify::appliance_from_url;
use crate::error::ScraperError;
use crate::extract::{extract, PART_CARD};
use crate::identity::IdentityRotator;
use crate::navigator::{Navigator, PageHandle};
use crate::page::HtmlPage;
use crate::phone::resolve_phone;
use crate::retry::retry_with_backoff;

/// Referer presented when landing on the site root.
const SEARCH_REFERER: &str = "https://www.google.com/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlSummary {
    /// Cards found on the page, before validation and deduplication.
    pub candidates: usize,
    pub merge: MergeOutcome,
    pub appliance: Appliance,
}

#[derive(Debug)]
pub struct UrlOutcome {
    pub url: String,
    pub result: Result<UrlSummary, ScraperError>,
}

#[derive(Debug)]
pub struct RunReport {
    pub store: PartStore,
    pub outcomes: Vec<UrlOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// The run stopped early on cancellation or the run deadline.
    pub cancelled: bool,
}

impl RunReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    #[must_use]
    pub fn into_store(self) -> PartStore {
        self.store
    }
}

/// Runs one full scrape.
///
/// The support phone is resolved first and always set, falling back to
/// `settings.default_phone`. Source URLs are processed strictly in order, one
/// fresh identity per navigation, with the rotator's interaction delay between
/// consecutive URLs.
pub async fn run_pipeline(
    navigator: &dyn Navigator,
    rotator: &dyn IdentityRotator,
    settings: &ScraperSettings,
    cancel: &CancellationToken,
) -> RunReport {
    let started_at = Utc::now();
    let deadline = Instant::now() + settings.run_timeout();
    let mut store = PartStore::new();
    let mut outcomes = Vec::with_capacity(settings.source_urls.len());
    let mut cancelled = false;

    tracing::info!(
        urls = settings.source_urls.len(),
        run_timeout_secs = settings.run_timeout_secs,
        "scrape run started"
    );

    let phone = match guarded(deadline, cancel, fetch_phone(navigator, rotator, settings)).await {
        Ok(phone) => phone,
        Err(ScraperError::Cancelled) => {
            cancelled = true;
            settings.default_phone.clone()
        }
        Err(e) => {
            tracing::warn!(error = %e, "phone page failed, using default support phone");
            settings.default_phone.clone()
        }
    };
    store.set_support_phone(phone);

    let last = settings.source_urls.len().saturating_sub(1);
    for (index, url) in settings.source_urls.iter().enumerate() {
        if cancelled {
            break;
        }

        let result = guarded(
            deadline,
            cancel,
            scrape_url(navigator, rotator, settings, url, &mut store),
        )
        .await;

        match &result {
            Ok(summary) => tracing::info!(
                url = %url,
                appliance = %summary.appliance,
                candidates = summary.candidates,
                inserted = summary.merge.inserted,
                duplicates = summary.merge.duplicates,
                malformed = summary.merge.malformed,
                "source page scraped"
            ),
            Err(ScraperError::Cancelled) => cancelled = true,
            Err(e) => tracing::warn!(
                url = %url,
                kind = e.kind(),
                error = %e,
                "source page failed, continuing with next URL"
            ),
        }
        outcomes.push(UrlOutcome {
            url: url.clone(),
            result,
        });

        if index < last && !cancelled {
            let pause = rotator.interaction_delay();
            let slept = guarded(deadline, cancel, async {
                tokio::time::sleep(pause).await;
                Ok(())
            })
            .await;
            cancelled = slept.is_err();
        }
    }

    let report = RunReport {
        store,
        outcomes,
        started_at,
        finished_at: Utc::now(),
        cancelled,
    };

    tracing::info!(
        parts = report.store.len(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        cancelled = report.cancelled,
        elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
        "scrape run finished"
    );
    report
}

/// Races `fut` against cancellation and the run deadline. Both surface as
/// [`ScraperError::Cancelled`].
async fn guarded<T, F>(
    deadline: Instant,
    cancel: &CancellationToken,
    fut: F,
) -> Result<T, ScraperError>
where
    F: Future<Output = Result<T, ScraperError>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            tracing::warn!("scrape run cancelled");
            Err(ScraperError::Cancelled)
        }
        res = tokio::time::timeout_at(deadline, fut) => res.unwrap_or_else(|_| {
            tracing::warn!("scrape run deadline reached");
            Err(ScraperError::Cancelled)
        }),
    }
}

async fn open_with_retry(
    navigator: &dyn Navigator,
    rotator: &dyn IdentityRotator,
    settings: &ScraperSettings,
    url: &str,
    referer: &str,
) -> Result<Box<dyn PageHandle>, ScraperError> {
    retry_with_backoff(settings.nav_max_retries, settings.retry_backoff_base_ms, || {
        let identity = rotator.next_identity(referer);
        async move { navigator.open(url, &identity).await }
    })
    .await
}

async fn fetch_phone(
    navigator: &dyn Navigator,
    rotator: &dyn IdentityRotator,
    settings: &ScraperSettings,
) -> Result<String, ScraperError> {
    let page = open_with_retry(
        navigator,
        rotator,
        settings,
        &settings.site_origin,
        SEARCH_REFERER,
    )
    .await?;
    let html = page.html().await;
    page.close().await;
    let html = html?;
    Ok(resolve_phone(
        &HtmlPage::parse(&html),
        &settings.default_phone,
    ))
}

async fn scrape_url(
    navigator: &dyn Navigator,
    rotator: &dyn IdentityRotator,
    settings: &ScraperSettings,
    url: &str,
    store: &mut PartStore,
) -> Result<UrlSummary, ScraperError> {
    let referer = format!("{}/", settings.site_origin);
    let page = open_with_retry(navigator, rotator, settings, url, &referer).await?;

    let html = read_cards(page.as_ref(), settings).await;
    page.close().await;
    let html = html?;

    let candidates = {
        let parsed = HtmlPage::parse(&html);
        extract(&parsed, &settings.site_origin)
    };
    tracing::debug!(url, bytes = html.len(), cards = candidates.len(), "page extracted");
    if candidates.is_empty() {
        return Err(ScraperError::ExtractionEmpty {
            url: url.to_owned(),
        });
    }

    let count = candidates.len();
    let merge = merge(store, candidates, url);
    Ok(UrlSummary {
        candidates: count,
        merge,
        appliance: appliance_from_url(url),
    })
}

async fn read_cards(
    page: &dyn PageHandle,
    settings: &ScraperSettings,
) -> Result<String, ScraperError> {
    page.wait_for_content(PART_CARD, settings.content_timeout())
        .await?;
    page.html().await
}
