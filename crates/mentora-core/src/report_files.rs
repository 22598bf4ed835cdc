//! Path conventions under the Mentora data directory.
//!
//! Pure string/path functions. The record store is the only index over the
//! output directory; files are never overwritten once written.

use std::path::{Path, PathBuf};

use jiff::Timestamp;
use jiff::tz::TimeZone;
use uuid::Uuid;

use crate::models::report::ReportFormat;

pub const RECORDS_DIR: &str = "records";
pub const OUTPUTS_DIR: &str = "outputs";

/// Persisted record for one report.
pub fn record_path(data_dir: &Path, id: Uuid) -> PathBuf {
    data_dir.join(RECORDS_DIR).join(format!("{id}.json"))
}

/// Output artifact path. The generation timestamp keys the name so a
/// hypothetical second generation could never collide with the first.
pub fn output_path(data_dir: &Path, id: Uuid, generated_at: Timestamp, format: ReportFormat) -> PathBuf {
    let stamp = generated_at
        .to_zoned(TimeZone::UTC)
        .strftime("%Y%m%d_%H%M%S")
        .to_string();
    data_dir
        .join(OUTPUTS_DIR)
        .join(format!("report_{id}_{stamp}.{}", format.extension()))
}
