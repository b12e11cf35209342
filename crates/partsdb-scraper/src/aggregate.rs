//! Folding extracted candidates into the keyed store.

use partsdb_core::{InsertOutcome, PartRecord, PartStore, PRICE_NOT_LISTED};

use crate::classify::classify;
use crate::extract::RawCandidate;

/// Counts for one merge call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub inserted: usize,
    pub duplicates: usize,
    pub malformed: usize,
}

/// Classifies each candidate and inserts it first-seen-wins. Candidates
/// without a name or part number are counted and dropped.
pub fn merge(store: &mut PartStore, candidates: Vec<RawCandidate>, source_url: &str) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    for candidate in candidates {
        let (part_type, appliance) = classify(&candidate.name, source_url);
        let price = if candidate.price.is_empty() {
            PRICE_NOT_LISTED.to_owned()
        } else {
            candidate.price
        };
        let record = PartRecord {
            part_number: candidate.part_number,
            name: candidate.name,
            manufacturer_part_number: candidate.manufacturer_part_number,
            price,
            image: candidate.image,
            star_rating: candidate.star_rating,
            number_of_reviews: candidate.number_of_reviews,
            description: candidate.description,
            part_type,
            appliance,
            part_url: candidate.part_url,
        };

        match store.insert_first_seen(record) {
            InsertOutcome::Inserted => outcome.inserted += 1,
            InsertOutcome::Duplicate => outcome.duplicates += 1,
            InsertOutcome::Malformed => {
                tracing::debug!(source_url, "dropping candidate without name or part number");
                outcome.malformed += 1;
            }
        }
    }

    outcome
}
