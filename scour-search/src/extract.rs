//! Structured extraction of result records from fetched content.
//!
//! Markup bodies are parsed once and walked container by container; each
//! container is mapped independently, so one malformed item never aborts
//! the rest. Pre-structured API items are mapped by field-name convention.
//!
//! Extraction never fails as a whole. Gaps (no containers matched, an item
//! missing a field) are logged and skipped.

use crate::error::BuildError;
use crate::fetch::FetchOutcome;
use crate::types::{ResultRecord, SourceDefinition};
use crate::url_resolve::resolve_url;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Field names accepted for each value of a pre-structured API item,
/// in lookup order.
const TITLE_FIELDS: &[&str] = &["title"];
const LINK_FIELDS: &[&str] = &["link", "url"];
const POSTER_FIELDS: &[&str] = &["poster", "image", "thumbnail"];

/// A fetched body prepared for extraction.
///
/// Holding a parsed [`Html`] document pins this value to one thread, so
/// extraction is expected to run on a blocking worker.
pub enum ExtractBody {
    Markup(Html),
    Structured(Vec<serde_json::Value>),
}

impl From<FetchOutcome> for ExtractBody {
    fn from(outcome: FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::RawMarkup(text) => Self::Markup(Html::parse_document(&text)),
            FetchOutcome::StructuredItems(items) => Self::Structured(items),
        }
    }
}

/// Compiled extraction rules for a single source.
#[derive(Debug, Clone)]
pub struct ResultExtractor {
    source: String,
    base_url: Url,
    container: Selector,
    title: Selector,
    link: Selector,
    poster: Selector,
    poster_attribute: String,
    container_raw: String,
}

impl ResultExtractor {
    /// Compile the selector set and base URL of `source`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidSelector`] for a selector that does not
    /// parse and [`BuildError::InvalidUrl`] for an unparsable base URL.
    pub fn for_source(source: &SourceDefinition) -> Result<Self, BuildError> {
        let selectors = &source.selectors;
        let base_url = Url::parse(&source.base_url).map_err(|e| BuildError::InvalidUrl {
            url: source.base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            source: source.name.clone(),
            base_url,
            container: compile("container", &selectors.container)?,
            title: compile("title", &selectors.title)?,
            link: compile("link", &selectors.link)?,
            poster: compile("poster", &selectors.poster)?,
            poster_attribute: selectors.poster_attribute.clone(),
            container_raw: selectors.container.clone(),
        })
    }

    /// Lazily extract records from `body`, in document order.
    pub fn extract<'a>(&'a self, body: &'a ExtractBody) -> Records<'a> {
        let candidates = match body {
            ExtractBody::Markup(document) => Candidates::Markup(document.select(&self.container)),
            ExtractBody::Structured(items) => Candidates::Structured(items.iter()),
        };
        Records {
            extractor: self,
            candidates,
            seen: 0,
            emitted: 0,
            finished: false,
        }
    }

    fn record_from_element(&self, element: ElementRef<'_>) -> Result<ResultRecord, &'static str> {
        let title_el = element.select(&self.title).next().ok_or("missing title node")?;
        let link_el = element.select(&self.link).next().ok_or("missing link node")?;
        let poster_el = element.select(&self.poster).next().ok_or("missing poster node")?;

        let title = title_el.text().collect::<String>().trim().to_string();
        let href = link_el.value().attr("href").ok_or("link node has no href")?;
        let poster = poster_el
            .value()
            .attr(&self.poster_attribute)
            .ok_or("poster node lacks the poster attribute")?;

        self.finish_record(title, href, poster)
    }

    fn record_from_item(&self, item: &serde_json::Value) -> Result<ResultRecord, &'static str> {
        let title = string_field(item, TITLE_FIELDS).ok_or("item has no title")?;
        let link = string_field(item, LINK_FIELDS).ok_or("item has no link")?;
        let poster = string_field(item, POSTER_FIELDS).ok_or("item has no poster")?;
        self.finish_record(title.trim().to_string(), link, poster)
    }

    fn finish_record(
        &self,
        title: String,
        link: &str,
        poster: &str,
    ) -> Result<ResultRecord, &'static str> {
        let link = resolve_url(&self.base_url, link).ok_or("link is not resolvable")?;
        let poster = resolve_url(&self.base_url, poster).ok_or("poster is not resolvable")?;
        Ok(ResultRecord {
            source: self.source.clone(),
            title,
            link,
            poster,
        })
    }
}

enum Candidates<'a> {
    Markup(scraper::html::Select<'a, 'a>),
    Structured(std::slice::Iter<'a, serde_json::Value>),
}

/// Lazy, finite, non-restartable sequence of extracted records.
pub struct Records<'a> {
    extractor: &'a ResultExtractor,
    candidates: Candidates<'a>,
    seen: usize,
    emitted: usize,
    finished: bool,
}

impl Records<'_> {
    /// Number of candidate items (containers or API items) visited so far.
    pub fn seen(&self) -> usize {
        self.seen
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        let source = &self.extractor.source;
        if self.seen == 0 {
            if let Candidates::Markup(_) = self.candidates {
                tracing::info!(
                    %source,
                    selector = %self.extractor.container_raw,
                    "no containers matched"
                );
            }
        }
        tracing::debug!(
            %source,
            seen = self.seen,
            emitted = self.emitted,
            "extraction finished"
        );
    }
}

impl Iterator for Records<'_> {
    type Item = ResultRecord;

    fn next(&mut self) -> Option<ResultRecord> {
        if self.finished {
            return None;
        }
        loop {
            let extractor = self.extractor;
            let record = match &mut self.candidates {
                Candidates::Markup(select) => select.next().map(|el| extractor.record_from_element(el)),
                Candidates::Structured(items) => items.next().map(|item| extractor.record_from_item(item)),
            };
            let Some(record) = record else {
                self.finish();
                return None;
            };
            self.seen += 1;
            match record {
                Ok(record) => {
                    self.emitted += 1;
                    return Some(record);
                }
                Err(reason) => {
                    tracing::debug!(
                        source = %extractor.source,
                        item = self.seen,
                        reason,
                        "skipping result item"
                    );
                }
            }
        }
    }
}

fn compile(field: &'static str, selector: &str) -> Result<Selector, BuildError> {
    Selector::parse(selector).map_err(|_| BuildError::InvalidSelector {
        field,
        selector: selector.to_owned(),
    })
}

fn string_field<'v>(item: &'v serde_json::Value, names: &[&str]) -> Option<&'v str> {
    names
        .iter()
        .find_map(|name| item.get(*name).and_then(serde_json::Value::as_str))
}
