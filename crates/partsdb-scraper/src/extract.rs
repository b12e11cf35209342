//! Part card extraction from a category page.

use std::sync::LazyLock;

use partsdb_core::{NOT_AVAILABLE, NO_DESCRIPTION, PLACEHOLDER_IMAGE, ZERO_RATING};
use scraper::Selector;

use crate::page::{collapse_whitespace, FieldRule, FieldSpec, Fragment, HtmlPage};
use crate::url::absolutize;

/// Card container; also the readiness selector for category pages.
pub const PART_CARD: &str = ".nf__part";

const MANUFACTURER_MARKER: &str = "Manufacturer Part Number";

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

static CARD: LazyLock<Selector> = LazyLock::new(|| selector(PART_CARD));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector(r#"a[href*="/PS"]"#));
static NAME: LazyLock<Selector> = LazyLock::new(|| selector(".nf__part__detail__title span"));
static PART_NUMBER_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| selector(".nf__part__detail__part-number"));
static PART_NUMBER: LazyLock<Selector> =
    LazyLock::new(|| selector(".nf__part__detail__part-number strong"));
static STRONG: LazyLock<Selector> = LazyLock::new(|| selector("strong"));
static PRICE: LazyLock<Selector> = LazyLock::new(|| selector(".price:not(.original-price)"));
static IMAGE: LazyLock<Selector> = LazyLock::new(|| selector(".nf__part__left-col__img img"));
static RATING: LazyLock<Selector> = LazyLock::new(|| selector(".rating__stars__upper"));
static REVIEWS: LazyLock<Selector> = LazyLock::new(|| selector(r#"span[class*="rating__count"]"#));
static DETAIL: LazyLock<Selector> = LazyLock::new(|| selector(".nf__part__detail"));
static TITLE_BLOCK: LazyLock<Selector> = LazyLock::new(|| selector(".nf__part__detail__title"));
static SYMPTOMS_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| selector(".nf__part__detail__symptoms"));
static INSTRUCTION_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| selector(".nf__part__detail__instruction"));
static RATING_BLOCK: LazyLock<Selector> = LazyLock::new(|| selector(".nf__part__detail__rating"));

/// Unvalidated field values read from one card. Classification and
/// validation happen at merge time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    pub part_url: String,
    pub name: String,
    pub part_number: String,
    pub manufacturer_part_number: String,
    /// Cleaned price token; empty when the card lists none.
    pub price: String,
    pub image: String,
    pub star_rating: String,
    pub number_of_reviews: u32,
    pub description: String,
}

/// Reads every part card on `page`. No cards yields an empty vector.
#[must_use]
pub fn extract(page: &HtmlPage, origin: &str) -> Vec<RawCandidate> {
    page.find_all(&CARD)
        .iter()
        .map(|card| extract_card(card, origin))
        .collect()
}

fn extract_card(card: &Fragment<'_>, origin: &str) -> RawCandidate {
    let link = card.find_field(&FieldSpec::new(vec![FieldRule::attr(&LINK, "href")], ""));
    let name = card.find_field(&FieldSpec::new(vec![FieldRule::text(&NAME)], ""));
    let part_number = card.find_field(&FieldSpec::new(vec![FieldRule::text(&PART_NUMBER)], ""));

    let part_number_blocks = card.all(&PART_NUMBER_BLOCK);
    let manufacturer_block = part_number_blocks
        .iter()
        .find(|block| block.text().contains(MANUFACTURER_MARKER));
    let manufacturer_part_number = manufacturer_block
        .and_then(|block| block.first(&STRONG))
        .map(|strong| strong.text())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_owned());

    let price = clean_price(&card.find_field(&FieldSpec::new(vec![FieldRule::text(&PRICE)], "")));

    let image = card.find_field(&FieldSpec::new(
        vec![
            FieldRule::attr(&IMAGE, "src").rejecting("base64"),
            FieldRule::attr(&IMAGE, "data-src"),
        ],
        PLACEHOLDER_IMAGE,
    ));

    let number_of_reviews = card
        .first(&REVIEWS)
        .map_or(0, |span| leading_count(&span.text()));
    let star_rating = if number_of_reviews == 0 {
        ZERO_RATING.to_owned()
    } else {
        card.first(&RATING)
            .and_then(|el| el.attr("style"))
            .and_then(style_width)
            .unwrap_or_else(|| ZERO_RATING.to_owned())
    };

    let excluded: Vec<String> = [
        card.first(&TITLE_BLOCK),
        part_number_blocks.first().copied(),
        manufacturer_block.copied(),
        card.first(&SYMPTOMS_BLOCK),
        card.first(&INSTRUCTION_BLOCK),
        card.first(&RATING_BLOCK),
    ]
    .into_iter()
    .flatten()
    .map(|block| block.block_text())
    .collect();
    let description = card
        .first(&DETAIL)
        .map_or_else(|| NO_DESCRIPTION.to_owned(), |detail| describe(&detail, &excluded));

    RawCandidate {
        part_url: absolutize(&link, origin),
        name,
        part_number,
        manufacturer_part_number,
        price,
        image: absolutize(&image, origin),
        star_rating,
        number_of_reviews,
        description,
    }
}

/// Detail text minus the labelled sub-blocks, removed line by line at their
/// first occurrence.
fn describe(detail: &Fragment<'_>, excluded: &[String]) -> String {
    let mut text = detail.block_text();
    for line in excluded.iter().flat_map(|block| block.lines()) {
        if line.is_empty() {
            continue;
        }
        text = text.replacen(line, "", 1).trim().to_owned();
    }
    let description = collapse_whitespace(&text);
    if description.is_empty() {
        NO_DESCRIPTION.to_owned()
    } else {
        description
    }
}

/// Keeps only digits, `.` and `$`: `"$ 36.08"` becomes `"$36.08"`.
fn clean_price(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '$')
        .collect()
}

/// Leading integer of a review label such as `"12 Reviews"`, else 0.
fn leading_count(label: &str) -> u32 {
    let digits: String = label
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

/// The `width` declaration of an inline style, e.g. `"90%"`.
fn style_width(style: &str) -> Option<String> {
    style.split(';').find_map(|decl| {
        let (prop, value) = decl.split_once(':')?;
        let value = value.trim();
        (prop.trim().eq_ignore_ascii_case("width") && !value.is_empty()).then(|| value.to_owned())
    })
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
