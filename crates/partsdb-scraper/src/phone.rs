//! Support phone number resolution from the site landing page.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;

use crate::page::HtmlPage;

static CONTACT_PHONE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.header__contact__phone.js-desktopPhone").unwrap());
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"1-\d{3}-\d{3}-\d{4}").unwrap());

/// Header contact element, then the first phone-shaped token in the page
/// text, then `default`.
#[must_use]
pub fn resolve_phone(page: &HtmlPage, default: &str) -> String {
    if let Some(phone) = page.select_text(&CONTACT_PHONE).filter(|p| !p.is_empty()) {
        tracing::info!(phone, stage = "contact_element", "support phone resolved");
        return phone;
    }

    let text = page.full_text();
    if let Some(found) = PHONE_PATTERN.find(&text) {
        let phone = found.as_str().to_owned();
        tracing::info!(phone, stage = "text_pattern", "support phone resolved");
        return phone;
    }

    tracing::warn!(phone = default, "support phone not found on page, using default");
    default.to_owned()
}
