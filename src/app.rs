//! Applikationskontext för Locadan
//!
//! Skapas en gång vid start och skickas vidare som referens. Äger databasen,
//! postlagret och valutainställningen.

use std::path::PathBuf;

use tracing::info;

use crate::db::{Database, DocumentRepository};
use crate::models::{AppSettings, DisplayCurrency};
use crate::services::{
    BackupService, CurrencyService, DashboardStats, DocumentService, ImportResult, ReportService,
    RestoreService,
};
use crate::store::RecordStore;
use crate::utils::AppResult;

pub struct Locadan {
    settings: AppSettings,
    db: Database,
    records: RecordStore,
    currency: CurrencyService,
    /// Ändringar utanför postlagret (valuta, dokument)
    changes: u64,
}

impl Locadan {
    /// Öppna databasen enligt inställningarna och läs in allt
    pub fn open(settings: AppSettings) -> AppResult<Self> {
        let path = settings.database_path();
        info!("Öppnar databas: {}", path.display());

        let db = Database::open(&path)?;
        db.migrate()?;
        Self::with_database(db, settings)
    }

    pub fn open_in_memory() -> AppResult<Self> {
        Self::with_database(Database::open_in_memory()?, AppSettings::default())
    }

    fn with_database(db: Database, settings: AppSettings) -> AppResult<Self> {
        let records = RecordStore::load(db.clone())?;
        let currency = CurrencyService::load(db.clone())?;

        Ok(Self {
            settings,
            db,
            records,
            currency,
            changes: 0,
        })
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut RecordStore {
        &mut self.records
    }

    pub fn documents(&self) -> DocumentRepository {
        self.db.documents()
    }

    pub fn document_files(&self) -> DocumentService<'_> {
        DocumentService::new(&self.db)
    }

    /// Räknas upp efter varje sparad ändring; vyer ritas om när den ändras
    pub fn revision(&self) -> u64 {
        self.records.revision() + self.changes
    }

    pub fn currency(&self) -> DisplayCurrency {
        self.currency.active()
    }

    pub fn toggle_currency(&mut self) -> AppResult<DisplayCurrency> {
        let currency = self.currency.toggle()?;
        self.changes += 1;
        Ok(currency)
    }

    /// Formatera ett lagrat eurobelopp i aktiv valuta
    pub fn format_amount(&self, amount_eur: f64) -> String {
        self.currency.format(amount_eur)
    }

    /// Importera filer från disk till dokumentlagret
    pub fn import_documents(&mut self, paths: &[PathBuf]) -> anyhow::Result<ImportResult> {
        let result = self.document_files().import_files(paths)?;
        self.changes += 1;
        Ok(result)
    }

    pub fn delete_document(&mut self, id: i64) -> AppResult<bool> {
        let deleted = self.db.documents().delete(id)?;
        if deleted {
            self.changes += 1;
        }
        Ok(deleted)
    }

    pub fn backup(&self) -> BackupService<'_> {
        BackupService::new(&self.records)
    }

    pub fn restore(&mut self) -> RestoreService<'_> {
        RestoreService::new(&mut self.records)
    }

    pub fn reports(&self) -> ReportService<'_> {
        ReportService::new(&self.records, self.currency.active())
    }

    pub fn dashboard(&self) -> DashboardStats {
        DashboardStats::compute(&self.records)
    }
}
