use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed classification of an upload, governing which file types are
/// accepted and the storage key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabCategory {
    Catalog,
    Royalties,
    Agreements,
}

impl TabCategory {
    pub const ALL: [TabCategory; 3] = [
        TabCategory::Catalog,
        TabCategory::Royalties,
        TabCategory::Agreements,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TabCategory::Catalog => "catalog",
            TabCategory::Royalties => "royalties",
            TabCategory::Agreements => "agreements",
        }
    }
}

impl fmt::Display for TabCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TabCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "catalog" => Ok(TabCategory::Catalog),
            "royalties" => Ok(TabCategory::Royalties),
            "agreements" => Ok(TabCategory::Agreements),
            other => Err(format!("unknown category '{other}'")),
        }
    }
}

/// Upload state machine. Transitions only move forward:
/// Uploading -> Processing -> {Complete, Error}. Complete and Error are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Uploading,
    Processing,
    Complete,
    Error,
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Complete | UploadStatus::Error)
    }

    /// Whether a transition from `self` to `next` is legal.
    pub fn allows(&self, next: UploadStatus) -> bool {
        match self {
            UploadStatus::Uploading => {
                matches!(next, UploadStatus::Processing | UploadStatus::Error)
            }
            UploadStatus::Processing => {
                matches!(next, UploadStatus::Complete | UploadStatus::Error)
            }
            UploadStatus::Complete | UploadStatus::Error => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Uploading => "uploading",
            UploadStatus::Processing => "processing",
            UploadStatus::Complete => "complete",
            UploadStatus::Error => "error",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploading" => Ok(UploadStatus::Uploading),
            "processing" => Ok(UploadStatus::Processing),
            "complete" => Ok(UploadStatus::Complete),
            "error" => Ok(UploadStatus::Error),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// Transfer metadata carried on every record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub original_name: String,
    /// Percent transferred, 0-100. Non-decreasing within one attempt;
    /// reaches 100 only once the record is Complete.
    pub progress: u8,
    pub upload_timestamp: DateTime<Utc>,
}

/// An upload record stored in redb.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: String,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    pub tab_category: TabCategory,
    pub status: UploadStatus,
    #[serde(default)]
    pub storage_path: Option<String>,
    pub metadata: UploadMetadata,
    #[serde(default)]
    pub error_message: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
}

/// Source metadata for a record about to be created. The store assigns
/// the id and timestamps.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    pub tab_category: TabCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    UploadedAt,
    FileName,
    FileSize,
    ProcessedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Listing filter. `archived: None` includes everything; the default
/// hides archived records, matching the dashboard's default view.
#[derive(Debug, Clone)]
pub struct ListFilter {
    pub category: Option<TabCategory>,
    pub status: Option<UploadStatus>,
    pub archived: Option<bool>,
    pub search: Option<String>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub limit: Option<usize>,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            category: None,
            status: None,
            archived: Some(false),
            search: None,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            limit: None,
        }
    }
}

/// A dashboard view: one of the category tabs, or the archive tab
/// showing archived records across all categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadView {
    Category(TabCategory),
    Archive,
}

impl UploadView {
    /// The listing filter equivalent to this view.
    pub fn filter(&self) -> ListFilter {
        match self {
            UploadView::Category(category) => ListFilter {
                category: Some(*category),
                archived: Some(false),
                ..ListFilter::default()
            },
            UploadView::Archive => ListFilter {
                archived: Some(true),
                ..ListFilter::default()
            },
        }
    }

    /// Whether a record belongs to this view.
    pub fn matches(&self, record: &UploadRecord) -> bool {
        match self {
            UploadView::Category(category) => !record.archived && record.tab_category == *category,
            UploadView::Archive => record.archived,
        }
    }
}

impl fmt::Display for UploadView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadView::Category(category) => category.fmt(f),
            UploadView::Archive => f.write_str("archive"),
        }
    }
}

impl FromStr for UploadView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "archive" {
            Ok(UploadView::Archive)
        } else {
            s.parse::<TabCategory>().map(UploadView::Category)
        }
    }
}
