//! Data models for gazette publications and crawl windows.
//!
//! - [`Gazette`]: one publication record, as handed to the download pipeline
//! - [`Power`]: the branch of government that issued a publication
//! - [`DateRange`]: inclusive window of dates a spider should cover

use crate::error::SpiderError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The branch of government responsible for a publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Power {
    Executive,
    ExecutiveLegislative,
}

/// A single official gazette publication.
///
/// Records are produced at parse time and never mutated afterwards. The
/// serialized shape is what the external download/persistence pipeline
/// consumes:
///
/// ```json
/// {
///   "date": "2023-01-02",
///   "edition_number": "4123",
///   "file_urls": ["https://sistemas.belem.pa.gov.br/diario-consulta-api/diarios/4123"],
///   "is_extra_edition": false,
///   "power": "executive",
///   "territory_id": "1501402"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Gazette {
    /// Publication date.
    pub date: NaiveDate,
    /// Edition identifier, when the portal exposes one.
    #[serde(default)]
    pub edition_number: Option<String>,
    /// Absolute URLs the gazette file can be downloaded from.
    pub file_urls: Vec<String>,
    /// Set for supplementary editions published outside the regular schedule.
    pub is_extra_edition: bool,
    /// Issuing power.
    pub power: Power,
    /// IBGE code of the publishing municipality.
    pub territory_id: String,
}

/// Inclusive range of dates to crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, SpiderError> {
        if start > end {
            return Err(SpiderError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build the window for a spider, falling back to the date its portal
    /// starts publishing and to `today`.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        available_from: NaiveDate,
        today: NaiveDate,
    ) -> Result<Self, SpiderError> {
        Self::new(start.unwrap_or(available_from), end.unwrap_or(today))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
