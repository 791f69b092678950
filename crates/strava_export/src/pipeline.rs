//! One export run: authenticate, fetch, filter, write.

use std::path::PathBuf;

use strava_client::{MAX_PAGE_SIZE, StravaClient};

use crate::ExportResult;
use crate::export::{DEFAULT_MARKER, DEFAULT_OUTPUT, ExportRow, filter_by_marker, write_csv};

#[derive(Clone, Debug)]
pub struct ExportOptions {
    pub output: PathBuf,
    pub marker: String,
    pub per_page: u32,
    /// Follow pages instead of refusing a result that needs them.
    pub all_pages: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            marker: DEFAULT_MARKER.into(),
            per_page: MAX_PAGE_SIZE,
            all_pages: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSummary {
    pub fetched: usize,
    pub matched: usize,
    pub output: PathBuf,
}

/// Run the whole export against `client`.
///
/// Nothing is written unless every step before the writer succeeds, and
/// every matched activity converts cleanly.
pub async fn run(client: &dyn StravaClient, opts: &ExportOptions) -> ExportResult<ExportSummary> {
    println!("Requesting a new access token from Strava");
    let token = client.refresh_access_token().await?;

    println!("Gathering the activities from Strava");
    let activities = if opts.all_pages {
        client.list_all_activities(&token, opts.per_page).await?
    } else {
        client.list_activities(&token, opts.per_page).await?
    };
    tracing::info!(fetched = activities.len(), "activities received");

    let matched = filter_by_marker(&activities, &opts.marker);
    println!(
        "Found {} activities containing the \"{}\" keyword",
        matched.len(),
        opts.marker
    );

    let rows = matched
        .into_iter()
        .map(ExportRow::from_activity)
        .collect::<ExportResult<Vec<_>>>()?;
    write_csv(&opts.output, &rows)?;
    tracing::info!(rows = rows.len(), path = %opts.output.display(), "export complete");

    Ok(ExportSummary {
        fetched: activities.len(),
        matched: rows.len(),
        output: opts.output.clone(),
    })
}
