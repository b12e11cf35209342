//! Keyword tagging of part type and appliance family.

use partsdb_core::{Appliance, PartType};

/// First vocabulary keyword contained in the lowercased name.
#[must_use]
pub fn part_type_from_name(name: &str) -> PartType {
    let lower = name.to_lowercase();
    PartType::KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map_or(PartType::Unknown, |(_, part_type)| *part_type)
}

/// First appliance marker contained in the source page URL (case-sensitive).
#[must_use]
pub fn appliance_from_url(url: &str) -> Appliance {
    Appliance::URL_MARKERS
        .iter()
        .find(|(marker, _)| url.contains(marker))
        .map_or(Appliance::Unknown, |(_, appliance)| *appliance)
}

#[must_use]
pub fn classify(name: &str, source_url: &str) -> (PartType, Appliance) {
    (part_type_from_name(name), appliance_from_url(source_url))
}
