//! Site-specific gazette spiders.
//!
//! Each spider knows one municipal portal and nothing else. They follow the
//! same two-step shape:
//!
//! 1. **Requests**: build the initial URL(s) for a [`DateRange`]
//! 2. **Parsing**: map response bodies to [`Gazette`] records
//!
//! # Supported Portals
//!
//! | Spider | Module | Source | Power |
//! |--------|--------|--------|-------|
//! | `pa_belem` | [`pa_belem`] | JSON search API, count then list | executive |
//! | `ro_porto_velho` | [`ro_porto_velho`] | Monthly JSON listing with HTML fragments | executive + legislative |
//!
//! Spiders fetch through [`Fetch`], so they run unchanged against the real
//! HTTP client or against fixture bodies in tests.

pub mod pa_belem;
pub mod ro_porto_velho;

use crate::error::SpiderError;
use crate::fetch::Fetch;
use crate::models::{DateRange, Gazette};
use chrono::NaiveDate;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SpiderName {
    #[value(name = "pa_belem")]
    PaBelem,
    #[value(name = "ro_porto_velho")]
    RoPortoVelho,
}

impl SpiderName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpiderName::PaBelem => pa_belem::NAME,
            SpiderName::RoPortoVelho => ro_porto_velho::NAME,
        }
    }

    pub fn available_from(&self) -> NaiveDate {
        match self {
            SpiderName::PaBelem => pa_belem::available_from(),
            SpiderName::RoPortoVelho => ro_porto_velho::available_from(),
        }
    }
}

/// Run `spider` over `[start, end]`.
///
/// # Arguments
///
/// * `spider` - Which portal to crawl
/// * `fetcher` - Where response bodies come from
/// * `start` - First date, or the portal's first publication date
/// * `end` - Last date, or `today`
/// * `today` - The run date
///
/// # Returns
///
/// The gazettes published in the resolved window.
///
/// # Errors
///
/// Returns [`SpiderError::InvalidRange`] if `start` is after `end`, before
/// any request is made. Otherwise returns whatever error ends the spider.
pub async fn crawl<F: Fetch>(
    spider: SpiderName,
    fetcher: &F,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<Vec<Gazette>, SpiderError> {
    let range = DateRange::resolve(start, end, spider.available_from(), today)?;
    match spider {
        SpiderName::PaBelem => pa_belem::crawl(fetcher, &range).await,
        SpiderName::RoPortoVelho => ro_porto_velho::crawl(fetcher, &range).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::StubFetcher;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_names_match_module_constants() {
        assert_eq!(SpiderName::PaBelem.as_str(), "pa_belem");
        assert_eq!(SpiderName::RoPortoVelho.as_str(), "ro_porto_velho");
    }

    #[tokio::test]
    async fn test_crawl_rejects_inverted_range() {
        let fetcher = StubFetcher::default();
        let err = crawl(
            SpiderName::PaBelem,
            &fetcher,
            Some(ymd(2024, 3, 1)),
            Some(ymd(2024, 1, 1)),
            ymd(2024, 6, 1),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SpiderError::InvalidRange { .. }));
        assert!(fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn test_crawl_defaults_end_to_today() {
        let fetcher = StubFetcher::default();
        let err = crawl(
            SpiderName::RoPortoVelho,
            &fetcher,
            Some(ymd(2024, 5, 10)),
            None,
            ymd(2024, 6, 2),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SpiderError::Status { .. }));
        assert_eq!(
            fetcher.requested(),
            vec![
                format!("{}2024/6", ro_porto_velho::BASE_URL),
                format!("{}2024/5", ro_porto_velho::BASE_URL),
            ]
        );
    }

    #[tokio::test]
    async fn test_crawl_porto_velho_outage_is_an_error() {
        let fetcher = StubFetcher::default();
        let result = crawl(
            SpiderName::RoPortoVelho,
            &fetcher,
            Some(ymd(2023, 1, 1)),
            None,
            ymd(2024, 6, 2),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(fetcher.requested().len(), 18);
    }

    #[tokio::test]
    async fn test_crawl_belem_defaults_start_to_available_from() {
        let fetcher = StubFetcher::default();
        let _ = crawl(SpiderName::PaBelem, &fetcher, None, None, ymd(2024, 6, 2)).await;

        let requested = fetcher.requested();
        assert_eq!(requested.len(), 1);
        assert!(requested[0].contains("dataRecebidoInicio=2005-02-01T00%3A00%3A00.000Z"));
        assert!(requested[0].contains("dataRecebidoFim=2024-06-02T00%3A00%3A00.000Z"));
    }
}
