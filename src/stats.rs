//! Read-side aggregation over the current record set. Pure functions,
//! no persistence.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::storage::models::{UploadRecord, UploadView};

/// How far back an upload counts as "new".
const NEW_UPLOAD_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewStats {
    pub total: usize,
    /// Most recent upload (or, for the archive view, archive) timestamp.
    pub last_activity: Option<DateTime<Utc>>,
    /// Uploads whose uploaded_at falls within the trailing 7 days of now.
    pub new_uploads: usize,
}

impl ViewStats {
    /// Human-readable recency, `"None"` when the view is empty.
    pub fn last_activity_label(&self) -> String {
        match self.last_activity {
            Some(ts) => ts.format("%Y-%m-%d").to_string(),
            None => "None".to_string(),
        }
    }
}

/// Compute stats for one view over the full record set.
pub fn view_stats(records: &[UploadRecord], view: &UploadView, now: DateTime<Utc>) -> ViewStats {
    let week_ago = now - Duration::days(NEW_UPLOAD_WINDOW_DAYS);

    let mut total = 0;
    let mut last_activity: Option<DateTime<Utc>> = None;
    let mut new_uploads = 0;

    for record in records.iter().filter(|r| view.matches(r)) {
        total += 1;

        let activity = match view {
            UploadView::Archive => record.archived_at,
            UploadView::Category(_) => Some(record.uploaded_at),
        };
        if let Some(ts) = activity {
            if last_activity.map_or(true, |current| ts > current) {
                last_activity = Some(ts);
            }
        }

        if record.uploaded_at > week_ago {
            new_uploads += 1;
        }
    }

    ViewStats {
        total,
        last_activity,
        new_uploads,
    }
}
