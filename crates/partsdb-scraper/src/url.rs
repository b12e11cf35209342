//! URL helpers for turning scraped links into absolute URLs.

use url::Url;

/// Resolves `href` against the site `origin`.
///
/// Anything already starting with `http` is returned untouched, matching how
/// the storefront mixes absolute CDN links with root-relative part links. An
/// empty `href` yields the bare origin.
#[must_use]
pub fn absolutize(href: &str, origin: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return origin.trim_end_matches('/').to_owned();
    }
    if href.starts_with("http") {
        return href.to_owned();
    }
    Url::parse(origin)
        .and_then(|base| base.join(href))
        .map_or_else(
            |e| {
                tracing::debug!(href, origin, error = %e, "could not join URL; concatenating");
                format!("{}{href}", origin.trim_end_matches('/'))
            },
            |u| u.to_string(),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://www.partselect.com";

    #[test]
    fn absolutize_keeps_absolute_urls() {
        assert_eq!(
            absolutize("https://cdn.example.com/a.jpg", ORIGIN),
            "https://cdn.example.com/a.jpg"
        );
    }

    #[test]
    fn absolutize_joins_root_relative_path() {
        assert_eq!(
            absolutize("/PS11752778-Whirlpool-WPW10321304.htm", ORIGIN),
            "https://www.partselect.com/PS11752778-Whirlpool-WPW10321304.htm"
        );
    }

    #[test]
    fn absolutize_handles_protocol_relative_path() {
        assert_eq!(
            absolutize("//images.example.com/p.jpg", ORIGIN),
            "https://images.example.com/p.jpg"
        );
    }

    #[test]
    fn absolutize_falls_back_to_concatenation_for_bad_origin() {
        assert_eq!(absolutize("/PS1.htm", "not a url/"), "not a url/PS1.htm");
    }

    #[test]
    fn absolutize_empty_href_is_bare_origin() {
        assert_eq!(absolutize("", ORIGIN), ORIGIN);
        assert_eq!(absolutize("  ", "https://www.partselect.com/"), ORIGIN);
    }
}
