//! Command handlers for the CLI.
//!
//! `scrape` drives Chromium directly so the per-URL report can be printed;
//! `show` and `phone` only read the snapshot file.

use std::sync::Arc;

use partsdb_core::{AppConfig, Appliance, PartStore, PartType, DEFAULT_SUPPORT_PHONE};
use partsdb_scraper::{
    run_pipeline, ChromiumNavigator, IdentityRotator, RandomIdentityRotator, RunReport,
};
use partsdb_store::{
    report_into_store, JsonFileSnapshotStore, LoadedSnapshot, SnapshotStore, StoreError,
};
use tokio_util::sync::CancellationToken;

/// Scrape every configured source URL and replace the snapshot.
///
/// Ctrl-c cancels the run; whatever was collected up to then is still saved.
///
/// # Errors
///
/// Returns an error if Chromium cannot be launched, the run produced no
/// parts, or the snapshot cannot be written.
pub(crate) async fn run_scrape(config: &AppConfig) -> anyhow::Result<()> {
    let rotator: Arc<dyn IdentityRotator> =
        Arc::new(RandomIdentityRotator::from_settings(&config.scraper));
    let navigator = ChromiumNavigator::launch(
        config.chromium_path.as_deref(),
        Arc::clone(&rotator),
        config.scraper.nav_timeout(),
    )
    .await
    .map_err(|e| anyhow::anyhow!("failed to launch chromium: {e}"))?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("ctrl-c received, cancelling scrape");
                cancel.cancel();
            }
        }
    });

    let report = run_pipeline(&navigator, rotator.as_ref(), &config.scraper, &cancel).await;
    on_ctrl_c.abort();
    navigator.shutdown().await;

    for line in report_lines(&report) {
        println!("{line}");
    }

    let store = report_into_store(report)?;
    let snapshots = JsonFileSnapshotStore::new(config.snapshot_path.clone());
    snapshots.save(&store).await?;
    println!(
        "saved {} parts to {}",
        store.len(),
        snapshots.path().display()
    );
    Ok(())
}

/// # Errors
///
/// Returns an error if the snapshot is missing or unreadable.
pub(crate) async fn run_show(
    config: &AppConfig,
    part_type: Option<PartType>,
    appliance: Option<Appliance>,
) -> anyhow::Result<()> {
    let loaded = load_snapshot(config).await?;
    for line in show_lines(&loaded, part_type, appliance) {
        println!("{line}");
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the snapshot is missing or unreadable.
pub(crate) async fn run_phone(config: &AppConfig) -> anyhow::Result<()> {
    let loaded = load_snapshot(config).await?;
    println!("{}", phone_of(&loaded.store));
    Ok(())
}

async fn load_snapshot(config: &AppConfig) -> anyhow::Result<LoadedSnapshot> {
    let snapshots = JsonFileSnapshotStore::new(config.snapshot_path.clone());
    match snapshots.load().await {
        Ok(loaded) => Ok(loaded),
        Err(StoreError::NotFound { path }) => Err(anyhow::anyhow!(
            "no snapshot at {}; run `partsdb-cli scrape` first",
            path.display()
        )),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn phone_of(store: &PartStore) -> &str {
    store.support_phone().unwrap_or(DEFAULT_SUPPORT_PHONE)
}

pub(crate) fn report_lines(report: &RunReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(summary) => format!(
                "ok    {} ({}): {} cards, {} new, {} duplicate, {} malformed",
                outcome.url,
                summary.appliance,
                summary.candidates,
                summary.merge.inserted,
                summary.merge.duplicates,
                summary.merge.malformed
            ),
            Err(e) => format!("fail  {}: {e}", outcome.url),
        })
        .collect();

    let elapsed = (report.finished_at - report.started_at).num_seconds();
    lines.push(format!(
        "{} succeeded, {} failed, {} parts in {elapsed}s{}",
        report.succeeded(),
        report.failed(),
        report.store.len(),
        if report.cancelled { " (cancelled)" } else { "" }
    ));
    lines
}

pub(crate) fn show_lines(
    loaded: &LoadedSnapshot,
    part_type: Option<PartType>,
    appliance: Option<Appliance>,
) -> Vec<String> {
    let store = &loaded.store;
    let mut lines = vec![
        format!("snapshot saved at {}", loaded.saved_at.to_rfc3339()),
        format!("{} parts, support phone {}", store.len(), phone_of(store)),
    ];

    if part_type.is_none() && appliance.is_none() {
        return lines;
    }

    let matching = store.filter(part_type, appliance);
    lines.push(format!("{} matching parts", matching.len()));
    lines.extend(
        matching
            .into_iter()
            .map(|r| format!("{}  {}  {}", r.part_number, r.price, r.name)),
    );
    lines
}
