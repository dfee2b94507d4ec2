//! JSON output for the downstream download/persistence pipeline.
//!
//! # Output Structure
//!
//! With an output directory, each spider run produces one JSON array per
//! run date:
//! ```text
//! output_dir/
//! ├── pa_belem/
//! │   └── 2025-05-06.json
//! └── ro_porto_velho/
//!     └── 2025-05-06.json
//! ```
//!
//! Without one, records are streamed to stdout as JSON lines.

use crate::models::Gazette;
use chrono::NaiveDate;
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Render gazettes as JSON lines, one record per line.
pub fn to_json_lines(gazettes: &[Gazette]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for gazette in gazettes {
        out.push_str(&serde_json::to_string(gazette)?);
        out.push('\n');
    }
    Ok(out)
}

/// Write gazettes to stdout as JSON lines.
pub fn print_json_lines(gazettes: &[Gazette]) -> Result<(), Box<dyn Error>> {
    let lines = to_json_lines(gazettes)?;
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(lines.as_bytes())?;
    handle.flush()?;
    Ok(())
}

/// Write a spider's gazettes to `{output_dir}/{spider}/{run_date}.json`.
///
/// Returns the path written.
#[instrument(level = "info", skip(gazettes), fields(count = gazettes.len()))]
pub async fn write_gazettes(
    spider: &str,
    gazettes: &[Gazette],
    output_dir: &str,
    run_date: NaiveDate,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(gazettes)?;

    let spider_dir = Path::new(output_dir).join(spider);
    if let Err(e) = fs::create_dir_all(&spider_dir).await {
        error!(dir = %spider_dir.display(), error = %e, "Failed to create spider output dir");
        return Err(e.into());
    }

    let path = spider_dir.join(format!("{}.json", run_date));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote gazette JSON");

    Ok(path)
}
