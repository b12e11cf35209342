//! Parsed page model and selector-driven field lookup.
//!
//! [`HtmlPage`] wraps a `scraper::Html` document, which is not `Send`. Parse,
//! query and drop it inside a synchronous scope; never hold one across an
//! `.await`.

use scraper::{ElementRef, Html, Selector};

use crate::error::ScraperError;

pub struct HtmlPage {
    document: Html,
}

impl HtmlPage {
    #[must_use]
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// Every element matching `selector`, in document order.
    #[must_use]
    pub fn find_all(&self, selector: &Selector) -> Vec<Fragment<'_>> {
        self.document.select(selector).map(Fragment::new).collect()
    }

    /// Whether `selector` (CSS source) matches anything.
    ///
    /// # Errors
    ///
    /// [`ScraperError::InvalidSelector`] if `selector` does not parse.
    pub fn contains(&self, selector: &str) -> Result<bool, ScraperError> {
        let parsed = Selector::parse(selector).map_err(|e| ScraperError::InvalidSelector {
            selector: selector.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(self.document.select(&parsed).next().is_some())
    }

    /// Trimmed text of the first element matching `selector`, if any.
    #[must_use]
    pub fn select_text(&self, selector: &Selector) -> Option<String> {
        self.document
            .select(selector)
            .next()
            .map(|el| Fragment::new(el).raw_text().trim().to_owned())
    }

    /// Concatenated text content of the body (whole document if bodiless).
    #[must_use]
    pub fn full_text(&self) -> String {
        static BODY: std::sync::LazyLock<Selector> =
            std::sync::LazyLock::new(|| Selector::parse("body").unwrap());
        self.document
            .select(&BODY)
            .next()
            .unwrap_or_else(|| self.document.root_element())
            .text()
            .collect()
    }
}

/// Where a field value is read from.
#[derive(Debug, Clone, Copy)]
pub enum FieldSource {
    Text,
    Attr(&'static str),
}

/// One step of a fallback chain. Only the first element matching `selector`
/// is consulted.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule<'s> {
    pub selector: &'s Selector,
    pub source: FieldSource,
    /// Values containing this marker are treated as missing.
    pub reject_containing: Option<&'static str>,
}

impl<'s> FieldRule<'s> {
    #[must_use]
    pub fn text(selector: &'s Selector) -> Self {
        Self {
            selector,
            source: FieldSource::Text,
            reject_containing: None,
        }
    }

    #[must_use]
    pub fn attr(selector: &'s Selector, name: &'static str) -> Self {
        Self {
            selector,
            source: FieldSource::Attr(name),
            reject_containing: None,
        }
    }

    #[must_use]
    pub fn rejecting(mut self, marker: &'static str) -> Self {
        self.reject_containing = Some(marker);
        self
    }
}

/// Ordered fallback chain with a field-specific default.
#[derive(Debug, Clone)]
pub struct FieldSpec<'s> {
    pub rules: Vec<FieldRule<'s>>,
    pub default: &'static str,
}

impl<'s> FieldSpec<'s> {
    #[must_use]
    pub fn new(rules: Vec<FieldRule<'s>>, default: &'static str) -> Self {
        Self { rules, default }
    }
}

/// A subtree of the page, typically one part card.
#[derive(Debug, Clone, Copy)]
pub struct Fragment<'a> {
    element: ElementRef<'a>,
}

impl<'a> Fragment<'a> {
    fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    fn raw_text(&self) -> String {
        self.element.text().collect()
    }

    /// Text content with all whitespace runs collapsed to single spaces.
    #[must_use]
    pub fn text(&self) -> String {
        collapse_whitespace(&self.raw_text())
    }

    /// Rendered-text approximation: each non-blank text node trimmed, one
    /// per line.
    #[must_use]
    pub fn block_text(&self) -> String {
        self.element
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[must_use]
    pub fn first(&self, selector: &Selector) -> Option<Fragment<'a>> {
        self.element.select(selector).next().map(Fragment::new)
    }

    #[must_use]
    pub fn all(&self, selector: &Selector) -> Vec<Fragment<'a>> {
        self.element.select(selector).map(Fragment::new).collect()
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Walks the chain and returns the first usable value, else the default.
    #[must_use]
    pub fn find_field(&self, spec: &FieldSpec<'_>) -> String {
        spec.rules
            .iter()
            .find_map(|rule| {
                let target = self.first(rule.selector)?;
                let value = match rule.source {
                    FieldSource::Text => target.raw_text().trim().to_owned(),
                    FieldSource::Attr(name) => target.attr(name)?.trim().to_owned(),
                };
                let rejected = rule
                    .reject_containing
                    .is_some_and(|marker| value.contains(marker));
                (!value.is_empty() && !rejected).then_some(value)
            })
            .unwrap_or_else(|| spec.default.to_owned())
    }
}

#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
