//! Belém (PA) official gazette spider.
//!
//! The city publishes its gazette through a Solr-backed search API at
//! `sistemas.belem.pa.gov.br`. Crawling takes two requests:
//!
//! 1. A date-filtered search that only reports how many documents match
//!    (`response.numFound`).
//! 2. The same search asking for exactly that many rows, which lists every
//!    document in `response.docs`.
//!
//! Each document's `id` doubles as the edition number and as the path of
//! the download endpoint (`{BASE_URL}/{id}`).

use crate::error::SpiderError;
use crate::fetch::Fetch;
use crate::models::{DateRange, Gazette, Power};
use crate::utils::truncate_for_log;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fmt;
use tracing::{info, instrument, warn};

pub const NAME: &str = "pa_belem";
pub const TERRITORY_ID: &str = "1501402";
pub const BASE_URL: &str = "https://sistemas.belem.pa.gov.br/diario-consulta-api/diarios";

const QUERY_DATE_FORMAT: &str = "%Y-%m-%dT00:00:00.000Z";
const PUBLICATION_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// First day the portal has publications for.
pub fn available_from() -> NaiveDate {
    NaiveDate::from_ymd_opt(2005, 2, 1).unwrap()
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchResult,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(rename = "numFound")]
    num_found: u64,
    #[serde(default)]
    docs: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Doc {
    id: DocId,
    data_publicacao: String,
}

/// The API has served ids both as numbers and as strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DocId {
    Number(u64),
    Text(String),
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocId::Number(n) => write!(f, "{}", n),
            DocId::Text(s) => f.write_str(s.trim()),
        }
    }
}

/// Search URL for `range`. Without `rows` the API returns its default page
/// size, which is enough to read `numFound`.
pub fn search_url(range: &DateRange, rows: Option<u64>) -> String {
    let mut params = vec![
        ("dataRecebidoInicio", range.start.format(QUERY_DATE_FORMAT).to_string()),
        ("dataRecebidoFim", range.end.format(QUERY_DATE_FORMAT).to_string()),
        ("start", "0".to_string()),
    ];
    if let Some(rows) = rows {
        params.push(("rows", rows.to_string()));
    }

    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", BASE_URL, query)
}

/// Read the number of matching documents from a search response.
pub fn parse_number_of_items(body: &str) -> Result<u64, SpiderError> {
    let search: SearchResponse = serde_json::from_str(body)?;
    Ok(search.response.num_found)
}

/// Map every document of a search response to a [`Gazette`].
///
/// # Arguments
///
/// * `body` - A search response carrying `response.docs`
///
/// # Returns
///
/// One [`Gazette`] per document, with the document id as edition number and
/// download path. Documents with an unparseable date or a blank id are
/// logged and skipped.
///
/// # Errors
///
/// Returns [`SpiderError::Json`] if `body` is not a search response at all.
pub fn parse_gazettes(body: &str) -> Result<Vec<Gazette>, SpiderError> {
    let search: SearchResponse = serde_json::from_str(body)?;

    let gazettes = search
        .response
        .docs
        .into_iter()
        .filter_map(|doc| match parse_doc(doc) {
            Ok(gazette) => Some(gazette),
            Err(e) => {
                warn!(error = %e, "Skipping Belém document");
                None
            }
        })
        .collect();
    Ok(gazettes)
}

fn parse_doc(value: serde_json::Value) -> Result<Gazette, SpiderError> {
    let doc: Doc = serde_json::from_value(value)?;
    let date = NaiveDateTime::parse_from_str(&doc.data_publicacao, PUBLICATION_DATE_FORMAT)
        .map_err(|_| SpiderError::InvalidDate(doc.data_publicacao.clone()))?
        .date();
    let edition_number = doc.id.to_string();
    if edition_number.is_empty() {
        return Err(SpiderError::MissingField("id"));
    }

    Ok(Gazette {
        date,
        file_urls: vec![format!("{}/{}", BASE_URL, edition_number)],
        edition_number: Some(edition_number),
        is_extra_edition: false,
        power: Power::Executive,
        territory_id: TERRITORY_ID.to_string(),
    })
}

/// Crawl every gazette received within `range`.
///
/// # Arguments
///
/// * `fetcher` - Where response bodies come from
/// * `range` - Inclusive window matched against the date received
///
/// # Returns
///
/// Every gazette the search matched. A count of zero returns early without
/// the listing request.
///
/// # Errors
///
/// Returns an error if either request fails or if the count response is not
/// a search response.
#[instrument(level = "info", skip_all, fields(start = %range.start, end = %range.end))]
pub async fn crawl<F: Fetch>(fetcher: &F, range: &DateRange) -> Result<Vec<Gazette>, SpiderError> {
    let count_url = search_url(range, None);
    let body = fetcher.fetch_text(&count_url).await?;
    let number_of_documents = parse_number_of_items(&body).inspect_err(|e| {
        warn!(url = %count_url, error = %e, preview = %truncate_for_log(&body, 300), "Unexpected count response")
    })?;
    info!(number_of_documents, "Belém search matched documents");

    if number_of_documents == 0 {
        return Ok(Vec::new());
    }

    let list_url = search_url(range, Some(number_of_documents));
    let body = fetcher.fetch_text(&list_url).await?;
    let gazettes = parse_gazettes(&body).inspect_err(|e| {
        warn!(url = %list_url, error = %e, preview = %truncate_for_log(&body, 300), "Unexpected listing response")
    })?;

    info!(count = gazettes.len(), "Parsed Belém gazettes");
    Ok(gazettes)
}
