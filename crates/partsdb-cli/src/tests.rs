use chrono::{DateTime, TimeDelta, Utc};
use clap::Parser;
use partsdb_core::{Appliance, PartRecord, PartStore, PartType};
use partsdb_scraper::{MergeOutcome, RunReport, ScraperError, UrlOutcome, UrlSummary};
use partsdb_store::LoadedSnapshot;

use super::*;

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-10-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn record(part_number: &str, name: &str, part_type: PartType, appliance: Appliance) -> PartRecord {
    PartRecord {
        part_number: part_number.to_owned(),
        name: name.to_owned(),
        manufacturer_part_number: "N/A".to_owned(),
        price: "$24.50".to_owned(),
        image: "https://via.placeholder.com/80".to_owned(),
        star_rating: "0%".to_owned(),
        number_of_reviews: 0,
        description: "No description available".to_owned(),
        part_type,
        appliance,
        part_url: format!("https://www.partselect.com/{part_number}.htm"),
    }
}

fn snapshot() -> LoadedSnapshot {
    let mut store = PartStore::new();
    store.insert_first_seen(record(
        "PS3406971",
        "Dishwasher Drain Pump",
        PartType::DrainPump,
        Appliance::Dishwasher,
    ));
    store.insert_first_seen(record(
        "PS11752778",
        "Refrigerator Water Filter",
        PartType::Filter,
        Appliance::Refrigerator,
    ));
    store.set_support_phone("1-877-555-0142");
    LoadedSnapshot {
        store,
        saved_at: t0(),
    }
}

// -----------------------------------------------------------------------
// argument parsing
// -----------------------------------------------------------------------

#[test]
fn parses_scrape_command() {
    let cli = Cli::try_parse_from(["partsdb-cli", "scrape"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Scrape));
}

#[test]
fn parses_show_filters() {
    let cli = Cli::try_parse_from([
        "partsdb-cli",
        "show",
        "--part-type",
        "drain pump",
        "--appliance",
        "Dishwasher",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Show {
            part_type: Some(PartType::DrainPump),
            appliance: Some(Appliance::Dishwasher),
        }
    ));
}

#[test]
fn show_rejects_unknown_appliance() {
    let result = Cli::try_parse_from(["partsdb-cli", "show", "--appliance", "toaster"]);
    assert!(result.is_err(), "expected parse error, got: {result:?}");
}

#[test]
fn missing_command_is_an_error() {
    assert!(Cli::try_parse_from(["partsdb-cli"]).is_err());
}

// -----------------------------------------------------------------------
// output
// -----------------------------------------------------------------------

#[test]
fn show_without_filters_prints_summary_only() {
    let lines = commands::show_lines(&snapshot(), None, None);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1], "2 parts, support phone 1-877-555-0142");
}

#[test]
fn show_with_filter_lists_matching_parts() {
    let lines = commands::show_lines(&snapshot(), None, Some(Appliance::Dishwasher));
    assert_eq!(lines[2], "1 matching parts");
    assert_eq!(lines[3], "PS3406971  $24.50  Dishwasher Drain Pump");
    assert_eq!(lines.len(), 4);
}

#[test]
fn phone_falls_back_to_default() {
    assert_eq!(commands::phone_of(&PartStore::new()), "1-888-738-4871");
    assert_eq!(commands::phone_of(&snapshot().store), "1-877-555-0142");
}

#[test]
fn report_lines_cover_each_url_and_totals() {
    let report = RunReport {
        store: snapshot().store,
        outcomes: vec![
            UrlOutcome {
                url: "https://www.partselect.com/Dishwasher-Parts.htm".to_owned(),
                result: Ok(UrlSummary {
                    candidates: 3,
                    merge: MergeOutcome {
                        inserted: 2,
                        duplicates: 1,
                        malformed: 0,
                    },
                    appliance: Appliance::Dishwasher,
                }),
            },
            UrlOutcome {
                url: "https://www.partselect.com/Freezer-Parts.htm".to_owned(),
                result: Err(ScraperError::Cancelled),
            },
        ],
        started_at: t0(),
        finished_at: t0() + TimeDelta::seconds(42),
        cancelled: true,
    };

    let lines = commands::report_lines(&report);
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("ok    https://www.partselect.com/Dishwasher-Parts.htm (dishwasher)"));
    assert!(lines[1].starts_with("fail  https://www.partselect.com/Freezer-Parts.htm"));
    assert_eq!(lines[2], "1 succeeded, 1 failed, 2 parts in 42s (cancelled)");
}
