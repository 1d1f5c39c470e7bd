pub mod archiver;
pub mod canonical;
pub mod context;
pub mod crypto;
pub mod db;
pub mod diagnostics;
pub mod error;
pub mod frame;
pub mod importer;
pub mod interaction;
pub mod models;
pub mod proto;
pub mod query;
pub mod seed;
mod migrations;

pub use archiver::{export_backup, export_backup_to_file, BackupOptions, BackupReport, ExportReport, ImportReport};
pub use db::{open_in_memory, open_store, MessageStore};
pub use error::{CoreError, StreamError};
pub use importer::{import_backup, import_backup_file, plan_import, ImportPlan};
pub use interaction::InteractionResult;
