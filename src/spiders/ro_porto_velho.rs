//! Porto Velho (RO) official gazette spider.
//!
//! The portal has no search API. Instead, a DataTables endpoint returns one
//! month of publications at a time:
//!
//! ```text
//! https://www.portovelho.ro.gov.br/dom/datatablearquivosmes/{year}/{month}
//! ```
//!
//! The response is JSON whose `aaData` rows each start with an HTML
//! fragment like:
//!
//! ```html
//! <p><strong>Suplemento nº 1 ao DOM nº 6.123 de 4 de março de 2022</strong>
//!    <a href="/uploads/dom/6123-sup.pdf">Download</a></p>
//! ```
//!
//! The link gives the file URL, the bold title tells regular and
//! supplementary editions apart, and the Portuguese date inside the title is
//! the publication date. Gazettes here are issued jointly by the executive
//! and legislative powers.

use crate::error::SpiderError;
use crate::fetch::Fetch;
use crate::models::{DateRange, Gazette, Power};
use crate::utils::{months_between, parse_portuguese_date, truncate_for_log};
use chrono::{Datelike, NaiveDate};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

pub const NAME: &str = "ro_porto_velho";
pub const TERRITORY_ID: &str = "1100205";
pub const BASE_URL: &str = "https://www.portovelho.ro.gov.br/dom/datatablearquivosmes/";

const EXTRA_EDITION_PREFIX: &str = "Suplemento";

static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("p a").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("p strong").unwrap());

/// First month the portal has publications for.
pub fn available_from() -> NaiveDate {
    NaiveDate::from_ymd_opt(2007, 1, 1).unwrap()
}

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(rename = "aaData")]
    aa_data: Vec<serde_json::Value>,
}

/// Listing URLs for every month touched by `range`, most recent first.
pub fn monthly_urls(range: &DateRange) -> Vec<String> {
    let start = range.start.max(available_from());
    months_between(start, range.end)
        .into_iter()
        .rev()
        .map(|month| format!("{}{}/{}", BASE_URL, month.year(), month.month()))
        .collect()
}

/// Parse one monthly listing.
///
/// # Arguments
///
/// * `body` - The DataTables JSON returned for one month
/// * `page_url` - URL the body came from; resolves relative download links
///
/// # Returns
///
/// One [`Gazette`] per row that describes a publication. Rows missing a
/// link, title or date are logged and skipped.
///
/// # Errors
///
/// Returns an error if `body` is not a listing (no `aaData`) or `page_url`
/// is not a valid URL.
pub fn parse_listing(body: &str, page_url: &str) -> Result<Vec<Gazette>, SpiderError> {
    let listing: Listing = serde_json::from_str(body)?;
    let base = Url::parse(page_url)?;

    let gazettes = listing
        .aa_data
        .iter()
        .filter_map(|row| {
            let result = row
                .as_array()
                .and_then(|cells| cells.first())
                .and_then(|cell| cell.as_str())
                .ok_or(SpiderError::MissingField("aaData[][0]"))
                .and_then(|fragment| parse_fragment(fragment, &base));
            match result {
                Ok(gazette) => Some(gazette),
                Err(e) => {
                    warn!(url = %page_url, error = %e, "Skipping Porto Velho row");
                    None
                }
            }
        })
        .collect();
    Ok(gazettes)
}

/// Map a single listing fragment to a [`Gazette`].
pub fn parse_fragment(fragment: &str, base: &Url) -> Result<Gazette, SpiderError> {
    let html = Html::parse_fragment(fragment);

    let href = html
        .select(&LINK)
        .find_map(|a| a.value().attr("href"))
        .ok_or(SpiderError::MissingField("p a[href]"))?;
    let file_url = base.join(href.trim())?;

    let texts: Vec<&str> = html.select(&TITLE).flat_map(|strong| strong.text()).collect();
    let title = texts.first().ok_or(SpiderError::MissingField("p strong"))?;
    let is_extra_edition = title.trim_start().starts_with(EXTRA_EDITION_PREFIX);

    let date = texts
        .iter()
        .find_map(|text| parse_portuguese_date(text))
        .ok_or_else(|| SpiderError::InvalidDate(texts.concat()))?;

    Ok(Gazette {
        date,
        edition_number: None,
        file_urls: vec![file_url.to_string()],
        is_extra_edition,
        power: Power::ExecutiveLegislative,
        territory_id: TERRITORY_ID.to_string(),
    })
}

async fn fetch_month<F: Fetch>(fetcher: &F, url: &str) -> Result<Vec<Gazette>, SpiderError> {
    let body = fetcher.fetch_text(url).await?;
    parse_listing(&body, url).inspect_err(|e| {
        warn!(%url, error = %e, preview = %truncate_for_log(&body, 300), "Unexpected listing response")
    })
}

/// Crawl every monthly listing touched by `range`, newest month first.
///
/// Listings are month-granular, so gazettes dated outside `range` are
/// dropped.
///
/// # Arguments
///
/// * `fetcher` - Where listing bodies come from
/// * `range` - Inclusive publication window
///
/// # Returns
///
/// The gazettes of every month that could be fetched and parsed.
///
/// # Errors
///
/// A month that fails is logged and skipped. Only when every month fails is
/// the last failure returned, so an outage is never reported as an empty
/// window.
#[instrument(level = "info", skip_all, fields(start = %range.start, end = %range.end))]
pub async fn crawl<F: Fetch>(fetcher: &F, range: &DateRange) -> Result<Vec<Gazette>, SpiderError> {
    let urls = monthly_urls(range);
    let months = urls.len();
    info!(months, "Crawling Porto Velho monthly listings");

    let per_month: Vec<Result<Vec<Gazette>, SpiderError>> = stream::iter(urls)
        .then(move |url| async move {
            let result = fetch_month(fetcher, &url).await;
            match &result {
                Ok(gazettes) => debug!(%url, count = gazettes.len(), "Parsed monthly listing"),
                Err(e) => error!(%url, error = %e, "Monthly listing failed; skipping"),
            }
            result
        })
        .collect()
        .await;

    let mut gazettes = Vec::new();
    let mut failed_months = 0usize;
    let mut last_error = None;
    for result in per_month {
        match result {
            Ok(month) => gazettes.extend(month.into_iter().filter(|g| range.contains(g.date))),
            Err(e) => {
                failed_months += 1;
                last_error = Some(e);
            }
        }
    }

    if failed_months == months {
        if let Some(e) = last_error {
            error!(months, "Every monthly listing failed");
            return Err(e);
        }
    }

    info!(count = gazettes.len(), failed_months, "Parsed Porto Velho gazettes");
    Ok(gazettes)
}
