//! Command-line interface definitions.
//!
//! All arguments can be provided via command-line flags; the output
//! directory and config path also fall back to environment variables.

use crate::spiders::SpiderName;
use chrono::NaiveDate;
use clap::Parser;

/// Command-line arguments for the gazette crawlers.
///
/// # Examples
///
/// ```sh
/// # Every spider, full history, JSON lines on stdout
/// diario_crawlers
///
/// # One spider, one month, written to ./data/ro_porto_velho/<today>.json
/// diario_crawlers -s ro_porto_velho --start-date 2022-03-01 --end-date 2022-03-31 -o ./data
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Spider to run (repeatable); all spiders when omitted
    #[arg(short, long = "spider", value_enum)]
    pub spiders: Vec<SpiderName>,

    /// First publication date to crawl (YYYY-MM-DD); defaults to the portal's first publication
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last publication date to crawl (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Directory for JSON output; records go to stdout as JSON lines when omitted
    #[arg(short, long, env = "GAZETTE_OUTPUT_DIR")]
    pub output_dir: Option<String>,

    /// Optional path to a YAML config file
    #[arg(short, long, env = "GAZETTE_CONFIG")]
    pub config: Option<String>,
}

impl Cli {
    /// The spiders to run, in the order given; every spider when none was named.
    pub fn selected_spiders(&self) -> Vec<SpiderName> {
        if self.spiders.is_empty() {
            vec![SpiderName::PaBelem, SpiderName::RoPortoVelho]
        } else {
            self.spiders.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["diario_crawlers"]).unwrap();
        assert_eq!(
            cli.selected_spiders(),
            vec![SpiderName::PaBelem, SpiderName::RoPortoVelho]
        );
        assert_eq!(cli.start_date, None);
        assert_eq!(cli.end_date, None);
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "diario_crawlers",
            "--spider",
            "ro_porto_velho",
            "--start-date",
            "2022-03-01",
            "--end-date",
            "2022-03-31",
            "--output-dir",
            "./data",
        ])
        .unwrap();

        assert_eq!(cli.selected_spiders(), vec![SpiderName::RoPortoVelho]);
        assert_eq!(cli.start_date, NaiveDate::from_ymd_opt(2022, 3, 1));
        assert_eq!(cli.end_date, NaiveDate::from_ymd_opt(2022, 3, 31));
        assert_eq!(cli.output_dir.as_deref(), Some("./data"));
    }

    #[test]
    fn test_cli_short_flags_repeat() {
        let cli = Cli::try_parse_from([
            "diario_crawlers",
            "-s",
            "ro_porto_velho",
            "-s",
            "pa_belem",
            "-o",
            "/tmp/out",
        ])
        .unwrap();

        assert_eq!(
            cli.selected_spiders(),
            vec![SpiderName::RoPortoVelho, SpiderName::PaBelem]
        );
        assert_eq!(cli.output_dir.as_deref(), Some("/tmp/out"));
    }

    #[test]
    fn test_cli_rejects_bad_input() {
        assert!(Cli::try_parse_from(["diario_crawlers", "--spider", "sp_sao_paulo"]).is_err());
        assert!(Cli::try_parse_from(["diario_crawlers", "--start-date", "01/03/2022"]).is_err());
    }
}
