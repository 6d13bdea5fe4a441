//! Tjänster för Locadan
//!
//! Innehåller affärslogik ovanpå postlagret och databasen.

pub mod backup;
pub mod consistency;
pub mod currency;
pub mod dashboard;
pub mod documents;
pub mod report;
pub mod restore;

pub use backup::{BackupInfo, BackupResult, BackupService};
pub use consistency::{find_duplicates, find_orphan_references, DuplicateGroup, OrphanReference};
pub use currency::CurrencyService;
pub use dashboard::DashboardStats;
pub use documents::{DocumentService, ImportResult};
pub use report::{ReportKind, ReportResult, ReportService};
pub use restore::{RestorePreview, RestoreResult, RestoreService};
