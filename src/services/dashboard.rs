//! Nyckeltal för översikten

use serde::Serialize;

use crate::models::{format_amount, Collection, DisplayCurrency};
use crate::store::RecordStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub owners: usize,
    pub properties: usize,
    pub tenants: usize,
    pub payments: usize,
    pub expenses: usize,
    /// Summa betalningar i euro
    pub total_payments: f64,
    /// Summa utgifter i euro
    pub total_expenses: f64,
    /// Summa hyror i euro
    pub total_rents: f64,
    /// Betalningar i procent av hyror, 0..=100
    pub collection_rate: u32,
    /// Hyresgäster i procent av fastigheter, 0..=100
    pub occupancy_rate: u32,
}

impl DashboardStats {
    pub fn compute(store: &RecordStore) -> Self {
        let total_payments = sum(store.payments().map(|p| p.amount));
        let total_expenses = sum(store.expenses().map(|e| e.amount));
        let total_rents = sum(store.rents().map(|r| r.amount));

        let properties = store.len(Collection::Properties);
        let tenants = store.len(Collection::Tenants);

        Self {
            owners: store.len(Collection::Owners),
            properties,
            tenants,
            payments: store.len(Collection::Payments),
            expenses: store.len(Collection::Expenses),
            total_payments,
            total_expenses,
            total_rents,
            collection_rate: percent(total_payments, total_rents),
            occupancy_rate: percent(tenants as f64, properties as f64),
        }
    }

    /// Textrader för terminalen, belopp i vald valuta
    pub fn lines(&self, currency: DisplayCurrency) -> Vec<String> {
        vec![
            format!("Propriétaires : {}", self.owners),
            format!("Biens : {}", self.properties),
            format!("Locataires : {}", self.tenants),
            format!(
                "Encaissements : {} ({})",
                self.payments,
                format_amount(self.total_payments, currency)
            ),
            format!(
                "Dépenses : {} ({})",
                self.expenses,
                format_amount(self.total_expenses, currency)
            ),
            format!("Taux d'encaissement : {}%", self.collection_rate),
            format!("Taux de remplissage : {}%", self.occupancy_rate),
        ]
    }
}

fn sum(values: impl Iterator<Item = f64>) -> f64 {
    values.filter(|v| v.is_finite()).sum()
}

/// `min(100, round(part / whole * 100))`, 0 om helheten saknas
fn percent(part: f64, whole: f64) -> u32 {
    if whole <= 0.0 {
        return 0;
    }
    let ratio = (part / whole * 100.0).round();
    ratio.clamp(0.0, 100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{Payment, Property, Record, Rent, Tenant};

    fn setup_store() -> RecordStore {
        RecordStore::load(Database::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.0, 0.0), 0);
        assert_eq!(percent(5.0, 0.0), 0);
        assert_eq!(percent(1.0, 3.0), 33);
        assert_eq!(percent(2.0, 3.0), 67);
        assert_eq!(percent(300.0, 100.0), 100);
    }

    #[test]
    fn test_empty_store() {
        let stats = DashboardStats::compute(&setup_store());
        assert_eq!(stats.collection_rate, 0);
        assert_eq!(stats.occupancy_rate, 0);
        assert_eq!(stats.total_payments, 0.0);
    }

    #[test]
    fn test_rates() {
        let mut store = setup_store();
        for amount in [800.0, 400.0] {
            store
                .upsert(
                    Collection::Rents,
                    None,
                    Record::Rent(Rent {
                        amount,
                        ..Default::default()
                    }),
                )
                .unwrap();
        }
        store
            .upsert(
                Collection::Payments,
                None,
                Record::Payment(Payment {
                    amount: 900.0,
                    ..Default::default()
                }),
            )
            .unwrap();
        for label in ["A", "B", "C"] {
            store
                .upsert(
                    Collection::Properties,
                    None,
                    Record::Property(Property {
                        label: label.into(),
                        ..Default::default()
                    }),
                )
                .unwrap();
        }
        for name in ["X", "Y"] {
            store
                .upsert(
                    Collection::Tenants,
                    None,
                    Record::Tenant(Tenant {
                        name: name.into(),
                        ..Default::default()
                    }),
                )
                .unwrap();
        }

        let stats = DashboardStats::compute(&store);
        assert_eq!(stats.total_rents, 1200.0);
        assert_eq!(stats.collection_rate, 75);
        assert_eq!(stats.occupancy_rate, 67);
        assert_eq!(stats.properties, 3);

        let lines = stats.lines(DisplayCurrency::Euro);
        assert!(lines.iter().any(|l| l == "Encaissements : 1 (€900.00)"));
    }
}
