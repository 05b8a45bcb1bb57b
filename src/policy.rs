//! Per-category file acceptance rules.
//!
//! Catalog tabs take spreadsheets, royalties additionally take PDFs, and
//! agreements take document formats. Anything else is rejected before a
//! record is ever created.

use crate::storage::models::TabCategory;

/// Whether a file is accepted for a category, by extension or MIME type.
/// Deterministic and side-effect free.
pub fn accepts(category: TabCategory, file_name: &str, mime_type: &str) -> bool {
    let name = file_name.to_lowercase();
    let mime = mime_type.to_lowercase();

    let spreadsheet = mime.contains("csv")
        || mime.contains("excel")
        || mime.contains("spreadsheet")
        || name.ends_with(".csv")
        || name.ends_with(".xlsx")
        || name.ends_with(".xls");

    match category {
        TabCategory::Catalog => spreadsheet,
        TabCategory::Royalties => spreadsheet || mime.contains("pdf") || name.ends_with(".pdf"),
        TabCategory::Agreements => {
            mime.contains("pdf")
                || mime.contains("document")
                || mime.contains("text")
                || name.ends_with(".pdf")
                || name.ends_with(".doc")
                || name.ends_with(".docx")
                || name.ends_with(".txt")
        }
    }
}
