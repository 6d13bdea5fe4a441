//! Visningsvaluta: aktiv valuta och dess beständiga inställning

use tracing::{info, warn};

use crate::db::schema::DISPLAY_CURRENCY_KEY;
use crate::db::Database;
use crate::models::{format_amount, DisplayCurrency};
use crate::utils::AppResult;

pub struct CurrencyService {
    db: Database,
    active: DisplayCurrency,
}

impl CurrencyService {
    /// Läs aktiv valuta; saknat eller okänt värde ger euro
    pub fn load(db: Database) -> AppResult<Self> {
        let active = match db.kv().get(DISPLAY_CURRENCY_KEY)? {
            None => DisplayCurrency::default(),
            Some(stored) => DisplayCurrency::from_stored(&stored).unwrap_or_else(|| {
                warn!("Okänd visningsvaluta {:?}, använder euro", stored);
                DisplayCurrency::default()
            }),
        };

        Ok(Self { db, active })
    }

    pub fn active(&self) -> DisplayCurrency {
        self.active
    }

    /// Byt valuta och spara valet. Lagrade belopp påverkas inte.
    pub fn toggle(&mut self) -> AppResult<DisplayCurrency> {
        self.set(self.active.toggled())
    }

    pub fn set(&mut self, currency: DisplayCurrency) -> AppResult<DisplayCurrency> {
        self.db.kv().set(DISPLAY_CURRENCY_KEY, currency.code())?;
        self.active = currency;
        info!("Visningsvaluta: {}", currency.code());
        Ok(currency)
    }

    /// Formatera ett eurobelopp i aktiv valuta
    pub fn format(&self, amount_eur: f64) -> String {
        format_amount(amount_eur, self.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_euro() {
        let db = Database::open_in_memory().unwrap();
        let service = CurrencyService::load(db).unwrap();
        assert_eq!(service.active(), DisplayCurrency::Euro);
        assert_eq!(service.format(1000.0), "€1000.00");
    }

    #[test]
    fn test_toggle_persists() {
        let db = Database::open_in_memory().unwrap();
        let mut service = CurrencyService::load(db.clone()).unwrap();

        assert_eq!(service.toggle().unwrap(), DisplayCurrency::Cfp);
        assert_eq!(service.format(1000.0), "120000 XPF");

        let reloaded = CurrencyService::load(db.clone()).unwrap();
        assert_eq!(reloaded.active(), DisplayCurrency::Cfp);

        service.toggle().unwrap();
        assert_eq!(CurrencyService::load(db).unwrap().active(), DisplayCurrency::Euro);
    }

    #[test]
    fn test_legacy_and_unknown_values() {
        let db = Database::open_in_memory().unwrap();

        db.kv().set(DISPLAY_CURRENCY_KEY, "€").unwrap();
        assert_eq!(CurrencyService::load(db.clone()).unwrap().active(), DisplayCurrency::Euro);

        db.kv().set(DISPLAY_CURRENCY_KEY, "dollar").unwrap();
        assert_eq!(CurrencyService::load(db).unwrap().active(), DisplayCurrency::Euro);
    }
}
