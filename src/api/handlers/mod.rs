mod admin;
mod lifecycle;
mod uploads;

pub use admin::{admin_purge, health};
pub use lifecycle::{
    archive_upload, bulk_archive_uploads, bulk_delete_uploads, unarchive_upload, view_stats,
};
pub use uploads::{create_uploads, delete_upload, download_upload, get_upload, list_uploads};
