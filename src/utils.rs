//! Utility functions for Portuguese date handling, month iteration, logging,
//! and file system checks.
//!
//! - Natural-language Portuguese dates ("4 de março de 2022")
//! - Inclusive month ranges for portals that list publications per month
//! - String truncation for logging response previews
//! - File system validation for output directories

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

static PORTUGUESE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{1,2})[º°]? de (\w+) de (\d{4})").expect("valid date regex")
});

/// Month number for a Portuguese month name.
///
/// Case and accent insensitive; accepts full names and three-letter
/// abbreviations ("março", "Marco", "mar").
pub fn month_from_portuguese(name: &str) -> Option<u32> {
    let normalized: String = name
        .trim()
        .trim_end_matches('.')
        .to_lowercase()
        .chars()
        .map(|c| if c == 'ç' { 'c' } else { c })
        .collect();

    let month = match normalized.as_str() {
        "janeiro" | "jan" => 1,
        "fevereiro" | "fev" => 2,
        "marco" | "mar" => 3,
        "abril" | "abr" => 4,
        "maio" | "mai" => 5,
        "junho" | "jun" => 6,
        "julho" | "jul" => 7,
        "agosto" | "ago" => 8,
        "setembro" | "set" => 9,
        "outubro" | "out" => 10,
        "novembro" | "nov" => 11,
        "dezembro" | "dez" => 12,
        _ => return None,
    };
    Some(month)
}

/// Find and parse the first `D de <mês> de YYYY` date inside `text`.
///
/// # Examples
///
/// ```ignore
/// let date = parse_portuguese_date("Edição 1.234 de 4 de março de 2022").unwrap();
/// assert_eq!(date, NaiveDate::from_ymd_opt(2022, 3, 4).unwrap());
/// ```
pub fn parse_portuguese_date(text: &str) -> Option<NaiveDate> {
    PORTUGUESE_DATE.captures_iter(text).find_map(|caps| {
        let day: u32 = caps[1].parse().ok()?;
        let month = month_from_portuguese(&caps[2])?;
        let year: i32 = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

/// First day of every month from `start`'s month through `end`'s month,
/// oldest first. Empty when `start` is after `end`.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut months = Vec::new();
    let Some(mut cursor) = start.with_day(1) else {
        return months;
    };

    while cursor <= end {
        months.push(cursor);
        cursor = match cursor.checked_add_months(chrono::Months::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    months
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (on a character
/// boundary) with an ellipsis and byte count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// writing and immediately deleting a marker file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;

    let marker = format!("{}/..__write_check__", path.trim_end_matches('/'));
    fs::write(&marker, b"").await?;
    let _ = fs::remove_file(&marker).await;
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_names() {
        assert_eq!(month_from_portuguese("janeiro"), Some(1));
        assert_eq!(month_from_portuguese("Março"), Some(3));
        assert_eq!(month_from_portuguese("marco"), Some(3));
        assert_eq!(month_from_portuguese("DEZEMBRO"), Some(12));
        assert_eq!(month_from_portuguese("set."), Some(9));
        assert_eq!(month_from_portuguese("march"), None);
    }

    #[test]
    fn test_parse_portuguese_date() {
        assert_eq!(
            parse_portuguese_date("Diário Oficial nº 6.123 de 4 de março de 2022"),
            Some(ymd(2022, 3, 4))
        );
        assert_eq!(
            parse_portuguese_date("Suplemento de 31 de Dezembro de 2019"),
            Some(ymd(2019, 12, 31))
        );
        assert_eq!(
            parse_portuguese_date("1º de janeiro de 2020"),
            Some(ymd(2020, 1, 1))
        );
    }

    #[test]
    fn test_parse_portuguese_date_skips_impossible_matches() {
        assert_eq!(
            parse_portuguese_date("31 de fevereiro de 2020, republicado em 2 de março de 2020"),
            Some(ymd(2020, 3, 2))
        );
    }

    #[test]
    fn test_parse_portuguese_date_without_date() {
        assert_eq!(parse_portuguese_date("Edição Extra"), None);
        assert_eq!(parse_portuguese_date("4 de brumário de 2022"), None);
    }

    #[test]
    fn test_months_between() {
        let months = months_between(ymd(2023, 11, 15), ymd(2024, 2, 3));
        assert_eq!(
            months,
            vec![ymd(2023, 11, 1), ymd(2023, 12, 1), ymd(2024, 1, 1), ymd(2024, 2, 1)]
        );
    }

    #[test]
    fn test_months_between_single_and_empty() {
        assert_eq!(months_between(ymd(2024, 5, 9), ymd(2024, 5, 20)), vec![ymd(2024, 5, 1)]);
        assert!(months_between(ymd(2024, 6, 1), ymd(2024, 5, 31)).is_empty());
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte_boundary() {
        // "ç" is two bytes; cutting at 1 must back off to 0.
        assert_eq!(truncate_for_log("çç", 1), "…(+4 bytes)");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        ensure_writable_dir(nested.to_str().unwrap()).await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(std::fs::read_dir(&nested).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_rejects_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("taken");
        std::fs::write(&file, "x").unwrap();
        assert!(ensure_writable_dir(file.to_str().unwrap()).await.is_err());
    }
}
