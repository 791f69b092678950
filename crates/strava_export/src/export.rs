//! Filtering, derived fields and the CSV writer.

use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use strava_client::Activity;

use crate::{ExportError, ExportResult};

pub const DEFAULT_MARKER: &str = "maheu";
pub const DEFAULT_OUTPUT: &str = "output.csv";

/// Case-insensitive substring match of `marker` against the whole name.
pub fn name_matches(name: &str, marker: &str) -> bool {
    name.to_lowercase().contains(&marker.to_lowercase())
}

/// Keep matching activities in their original order.
pub fn filter_by_marker<'a>(activities: &'a [Activity], marker: &str) -> Vec<&'a Activity> {
    activities
        .iter()
        .filter(|a| name_matches(&a.name, marker))
        .collect()
}

/// One line of the export file.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportRow {
    pub name: String,
    pub distance_km: f64,
    pub pace: String,
    pub date: NaiveDate,
}

impl ExportRow {
    pub fn from_activity(activity: &Activity) -> ExportResult<Self> {
        let missing = |field| ExportError::MissingField {
            activity: activity.name.clone(),
            field,
        };
        let distance = activity.distance.ok_or_else(|| missing("distance"))?;
        let moving_time = activity.moving_time.ok_or_else(|| missing("moving_time"))?;
        let start = activity
            .start_date_local
            .as_deref()
            .ok_or_else(|| missing("start_date_local"))?;

        Ok(Self {
            name: activity.name.clone(),
            distance_km: distance_km(distance),
            pace: pace_per_km(moving_time, distance)?,
            date: calendar_date(start)?,
        })
    }

    fn record(&self) -> [String; 4] {
        [
            self.name.clone(),
            format_km(self.distance_km),
            self.pace.clone(),
            self.date.format("%Y-%m-%d").to_string(),
        ]
    }
}

/// Meters to kilometers, rounded to hundredths (half away from zero).
pub fn distance_km(meters: f64) -> f64 {
    (meters / 1000.0 * 100.0).round() / 100.0
}

/// Render like a shortest round-trip float, keeping `.0` on whole values.
pub fn format_km(km: f64) -> String {
    if km.fract() == 0.0 {
        format!("{km:.1}")
    } else {
        km.to_string()
    }
}

/// Time per kilometer as `MM:SS`, from the unrounded distance.
///
/// Fractional seconds are truncated. Minutes keep counting past 59, so an
/// hour and a quarter per km is `75:00`, never the hour-wrapped `15:00`.
pub fn pace_per_km(moving_time: u64, meters: f64) -> ExportResult<String> {
    if meters.is_nan() || meters <= 0.0 {
        return Err(ExportError::InvalidActivity(format!(
            "cannot compute pace over a distance of {meters} m"
        )));
    }
    let secs = (moving_time as f64 / (meters / 1000.0)).trunc() as u64;
    Ok(format!("{:02}:{:02}", secs / 60, secs % 60))
}

/// Calendar date from a `start_date_local` timestamp, ignoring time and zone.
pub fn calendar_date(start_date_local: &str) -> ExportResult<NaiveDate> {
    let day = start_date_local.split('T').next().unwrap_or_default();
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| {
        ExportError::InvalidActivity(format!("bad start_date_local {start_date_local:?}: {e}"))
    })
}

/// Serialize rows as headerless CSV.
pub fn write_rows<W: Write>(writer: W, rows: &[ExportRow]) -> ExportResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);
    for row in rows {
        wtr.write_record(row.record())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Replace `path` with the rendered rows.
///
/// Rows go to a sibling temporary file first, which is renamed over the
/// destination only once everything has been written. A symlink at `path` is
/// written through, and an existing destination keeps its permissions.
pub fn write_csv(path: &Path, rows: &[ExportRow]) -> ExportResult<()> {
    let target = match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => std::fs::canonicalize(path)?,
        _ => path.to_path_buf(),
    };
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let existing = std::fs::metadata(&target).ok().map(|m| m.permissions());

    let mut tmp = temp_file_builder().tempfile_in(dir)?;
    write_rows(tmp.as_file_mut(), rows)?;
    if let Some(perms) = existing {
        tmp.as_file().set_permissions(perms)?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(&target).map_err(|e| e.error)?;
    tracing::debug!(path = %target.display(), rows = rows.len(), "export file written");
    Ok(())
}

/// Temp files default to 0600; ask for 0666 so a fresh export gets the
/// umask-filtered mode a plain create would.
fn temp_file_builder() -> tempfile::Builder<'static, 'static> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".strava-export");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder
}
