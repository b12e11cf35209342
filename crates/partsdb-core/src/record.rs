//! Catalog record model shared by the scraper, the snapshot store and the
//! HTTP service.
//!
//! ## Wire shape
//!
//! A [`PartStore`] serializes to a single flat JSON object keyed by part
//! number. The resolved support phone number travels in the same object under
//! the reserved [`SUPPORT_PHONE_KEY`]; existing consumers read it from there,
//! so the key is kept even though it is store metadata rather than a record.
//!
//! ```json
//! {
//!   "PS11752778": { "partNumber": "PS11752778", "name": "Refrigerator Door Shelf Bin", ... },
//!   "Support Phone Number": "1-888-738-4871"
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::CoreError;

/// Reserved key holding the support phone number in the serialized store.
pub const SUPPORT_PHONE_KEY: &str = "Support Phone Number";

/// Phone number used when neither the contact element nor the page text
/// yields one.
pub const DEFAULT_SUPPORT_PHONE: &str = "1-888-738-4871";

pub const NOT_AVAILABLE: &str = "N/A";
pub const PRICE_NOT_LISTED: &str = "Price not listed";
pub const NO_DESCRIPTION: &str = "No description available";
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/80";
pub const ZERO_RATING: &str = "0%";

/// Coarse part category derived from the record name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PartType {
    #[serde(rename = "drain pump")]
    DrainPump,
    #[serde(rename = "ice maker")]
    IceMaker,
    #[serde(rename = "filter")]
    Filter,
    #[serde(rename = "gasket")]
    Gasket,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl PartType {
    /// Keyword vocabulary in match order. The first keyword contained in a
    /// lowercased name wins.
    pub const KEYWORDS: [(&'static str, PartType); 4] = [
        ("drain pump", PartType::DrainPump),
        ("ice maker", PartType::IceMaker),
        ("filter", PartType::Filter),
        ("gasket", PartType::Gasket),
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PartType::DrainPump => "drain pump",
            PartType::IceMaker => "ice maker",
            PartType::Filter => "filter",
            PartType::Gasket => "gasket",
            PartType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if lower == "unknown" {
            return Ok(PartType::Unknown);
        }
        PartType::KEYWORDS
            .iter()
            .find(|(keyword, _)| *keyword == lower)
            .map(|(_, part_type)| *part_type)
            .ok_or_else(|| CoreError::UnknownPartType(s.to_owned()))
    }
}

/// Appliance family inferred from the source page URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appliance {
    Refrigerator,
    Freezer,
    Dishwasher,
    #[default]
    Unknown,
}

impl Appliance {
    /// URL fragments in match order. Matching is case-sensitive against the
    /// category page path (`/Refrigerator-Parts.htm`).
    pub const URL_MARKERS: [(&'static str, Appliance); 3] = [
        ("Refrigerator", Appliance::Refrigerator),
        ("Freezer", Appliance::Freezer),
        ("Dishwasher", Appliance::Dishwasher),
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Appliance::Refrigerator => "refrigerator",
            Appliance::Freezer => "freezer",
            Appliance::Dishwasher => "dishwasher",
            Appliance::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Appliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Appliance {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "refrigerator" => Ok(Appliance::Refrigerator),
            "freezer" => Ok(Appliance::Freezer),
            "dishwasher" => Ok(Appliance::Dishwasher),
            "unknown" => Ok(Appliance::Unknown),
            _ => Err(CoreError::UnknownAppliance(s.to_owned())),
        }
    }
}

/// One extracted catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartRecord {
    /// Store key, e.g. `"PS11752778"`.
    pub part_number: String,
    pub name: String,
    pub manufacturer_part_number: String,
    /// Price token such as `"$36.08"`, or [`PRICE_NOT_LISTED`].
    pub price: String,
    /// Absolute image URL or [`PLACEHOLDER_IMAGE`].
    pub image: String,
    /// Fill ratio of the 5-star display, `"0%"`..=`"100%"`.
    pub star_rating: String,
    pub number_of_reviews: u32,
    pub description: String,
    pub part_type: PartType,
    pub appliance: Appliance,
    pub part_url: String,
}

impl PartRecord {
    /// A record is storable only with a non-blank key and name.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.part_number.trim().is_empty() && !self.name.trim().is_empty()
    }

    /// Applies the store conventions: uppercase trimmed key, and a zero
    /// rating whenever there are no reviews.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.part_number = self.part_number.trim().to_uppercase();
        if self.number_of_reviews == 0 {
            ZERO_RATING.clone_into(&mut self.star_rating);
        }
        self
    }
}

/// Result of offering a record to [`PartStore::insert_first_seen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The key was already present; the existing record is kept.
    Duplicate,
    /// Empty name or part number; the record was discarded.
    Malformed,
}

/// Keyed collection of part records plus the support phone metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartStore {
    parts: BTreeMap<String, PartRecord>,
    support_phone: Option<String>,
}

impl PartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `record` unless its key is already taken (first-seen-wins) or
    /// it is malformed.
    pub fn insert_first_seen(&mut self, record: PartRecord) -> InsertOutcome {
        if !record.is_well_formed() {
            return InsertOutcome::Malformed;
        }
        let record = record.normalized();
        if self.parts.contains_key(&record.part_number) {
            return InsertOutcome::Duplicate;
        }
        self.parts.insert(record.part_number.clone(), record);
        InsertOutcome::Inserted
    }

    #[must_use]
    pub fn get(&self, part_number: &str) -> Option<&PartRecord> {
        self.parts.get(part_number.trim().to_uppercase().as_str())
    }

    /// Records matching both tags. `None` or [`PartType::Unknown`] /
    /// [`Appliance::Unknown`] match every record.
    #[must_use]
    pub fn filter(
        &self,
        part_type: Option<PartType>,
        appliance: Option<Appliance>,
    ) -> Vec<&PartRecord> {
        let part_type = part_type.filter(|t| *t != PartType::Unknown);
        let appliance = appliance.filter(|a| *a != Appliance::Unknown);
        self.parts
            .values()
            .filter(|r| part_type.is_none_or(|t| r.part_type == t))
            .filter(|r| appliance.is_none_or(|a| r.appliance == a))
            .collect()
    }

    pub fn records(&self) -> impl Iterator<Item = &PartRecord> {
        self.parts.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    #[must_use]
    pub fn support_phone(&self) -> Option<&str> {
        self.support_phone.as_deref()
    }

    pub fn set_support_phone(&mut self, phone: impl Into<String>) {
        self.support_phone = Some(phone.into());
    }
}

impl Serialize for PartStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.parts.len() + usize::from(self.support_phone.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (key, record) in &self.parts {
            map.serialize_entry(key, record)?;
        }
        if let Some(phone) = &self.support_phone {
            map.serialize_entry(SUPPORT_PHONE_KEY, phone)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PartStore {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut store = PartStore::new();

        for (key, value) in raw {
            if key == SUPPORT_PHONE_KEY {
                let phone = value
                    .as_str()
                    .ok_or_else(|| D::Error::custom("support phone must be a string"))?;
                store.set_support_phone(phone);
                continue;
            }

            let record: PartRecord = serde_json::from_value(value)
                .map_err(|e| D::Error::custom(format!("record {key}: {e}")))?;
            let record = record.normalized();
            if record.part_number != key {
                return Err(D::Error::custom(format!(
                    "record key {key} does not match partNumber {}",
                    record.part_number
                )));
            }
            if !record.is_well_formed() {
                return Err(D::Error::custom(format!("record {key} has an empty name")));
            }
            store.parts.insert(key, record);
        }

        Ok(store)
    }
}

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;
