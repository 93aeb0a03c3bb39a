//! Resolution of extracted link and poster values into absolute URLs.
//!
//! Sites frequently emit root-relative (`/movie/1`), document-relative
//! (`poster.jpg`), or protocol-relative (`//cdn.example.org/p.jpg`) values.
//! Everything is resolved against the source's base URL using standard
//! relative-reference rules. Values that are already absolute are returned
//! exactly as written (trimmed), never re-serialised.

use url::Url;

/// Resolve `raw` against `base`.
///
/// Returns `None` when `raw` is empty or cannot be resolved into a valid
/// URL.
///
/// # Examples
///
/// ```
/// use scour_search::url_resolve::resolve_url;
/// use url::Url;
///
/// let base = Url::parse("https://example.org/").unwrap();
/// assert_eq!(
///     resolve_url(&base, "/movie/dune").as_deref(),
///     Some("https://example.org/movie/dune")
/// );
/// assert_eq!(
///     resolve_url(&base, "https://cdn.test/p.jpg").as_deref(),
///     Some("https://cdn.test/p.jpg")
/// );
/// ```
pub fn resolve_url(base: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if Url::parse(raw).is_ok() {
        return Some(raw.to_owned());
    }
    base.join(raw).ok().map(Into::into)
}
