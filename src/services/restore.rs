//! Restore-service för att återställa postlagret från en JSON-ögonblicksbild
//!
//! Varje igenkänd samling i ögonblicksbilden ersätter hela motsvarande
//! samling. Allt avkodas och valideras innan något ersätts.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::models::Collection;
use crate::store::codec::{self, DecodedRecord};
use crate::store::RecordStore;
use crate::utils::file_ops::read_text_file;
use crate::utils::{AppError, AppResult};

/// Resultat av en restore-operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreResult {
    /// Ersatta samlingar och antal poster i varje
    pub restored: Vec<(Collection, usize)>,
    /// Nycklar som inte motsvarar någon samling
    pub unknown_keys: Vec<String>,
}

impl RestoreResult {
    pub fn record_count(&self) -> usize {
        self.restored.iter().map(|(_, n)| n).sum()
    }
}

/// Förhandsgranskning av restore
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestorePreview {
    /// Samlingar som skulle ersättas, med antal poster
    pub replaced: Vec<(Collection, usize)>,
    /// Samlingar som lämnas orörda
    pub untouched: Vec<Collection>,
    pub unknown_keys: Vec<String>,
}

/// Avkodad och validerad ögonblicksbild
struct ParsedSnapshot {
    collections: BTreeMap<Collection, Vec<DecodedRecord>>,
    unknown_keys: Vec<String>,
}

/// Restore-service
pub struct RestoreService<'a> {
    store: &'a mut RecordStore,
}

impl<'a> RestoreService<'a> {
    pub fn new(store: &'a mut RecordStore) -> Self {
        Self { store }
    }

    /// Förhandsgranska utan att ändra något
    pub fn preview(json: &str) -> AppResult<RestorePreview> {
        let parsed = parse_snapshot(json)?;

        let replaced = parsed
            .collections
            .iter()
            .map(|(c, records)| (*c, records.len()))
            .collect();
        let untouched = Collection::ALL
            .iter()
            .copied()
            .filter(|c| !parsed.collections.contains_key(c))
            .collect();

        Ok(RestorePreview {
            replaced,
            untouched,
            unknown_keys: parsed.unknown_keys,
        })
    }

    /// Återställ från en JSON-sträng
    pub fn restore_json(&mut self, json: &str) -> AppResult<RestoreResult> {
        let parsed = parse_snapshot(json)?;

        let restored: Vec<(Collection, usize)> = parsed
            .collections
            .iter()
            .map(|(c, records)| (*c, records.len()))
            .collect();

        self.store
            .replace_collections(parsed.collections.into_iter().collect())?;

        info!(
            "Återställde {} samlingar ({} poster)",
            restored.len(),
            restored.iter().map(|(_, n)| n).sum::<usize>()
        );

        Ok(RestoreResult {
            restored,
            unknown_keys: parsed.unknown_keys,
        })
    }

    /// Återställ från en backup-fil
    pub fn restore_file(&mut self, path: &Path) -> Result<RestoreResult> {
        let json = read_text_file(path)?;
        let result = self
            .restore_json(&json)
            .with_context(|| format!("Impossible de restaurer depuis {}", path.display()))?;
        Ok(result)
    }
}

fn parse_snapshot(json: &str) -> AppResult<ParsedSnapshot> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| AppError::malformed(format!("JSON invalide : {}", e)))?;

    let Value::Object(map) = value else {
        return Err(AppError::malformed("la sauvegarde doit être un objet JSON"));
    };

    let mut collections = BTreeMap::new();
    let mut unknown_keys = Vec::new();

    for (collection, value) in resolve_keys(map, &mut unknown_keys) {
        let decoded = codec::decode_collection(collection, value).map_err(|e| match e {
            AppError::Validation(msg) => AppError::malformed(msg),
            other => other,
        })?;
        collections.insert(collection, decoded);
    }

    if !unknown_keys.is_empty() {
        warn!("Okända nycklar i ögonblicksbilden: {}", unknown_keys.join(", "));
    }

    Ok(ParsedSnapshot {
        collections,
        unknown_keys,
    })
}

/// Koppla nycklar till samlingar. Falska värden räknas som frånvarande.
/// Finns både engelsk och fransk nyckel vinner den engelska.
fn resolve_keys(
    map: Map<String, Value>,
    unknown_keys: &mut Vec<String>,
) -> BTreeMap<Collection, Value> {
    let mut resolved: BTreeMap<Collection, Value> = BTreeMap::new();

    for (key, value) in map {
        let Some(collection) = Collection::from_key(&key) else {
            unknown_keys.push(key);
            continue;
        };

        if is_falsy(&value) {
            continue;
        }

        let is_primary = key.trim().eq_ignore_ascii_case(collection.key());
        if resolved.contains_key(&collection) && !is_primary {
            warn!("Ignorerar {} eftersom {} redan finns", key, collection.key());
            continue;
        }
        resolved.insert(collection, value);
    }

    resolved
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{Expense, Payment, Record, Tenant};
    use crate::services::BackupService;
    use serde_json::json;

    fn setup_store() -> RecordStore {
        let mut store = RecordStore::load(Database::open_in_memory().unwrap()).unwrap();
        store
            .upsert(
                Collection::Tenants,
                None,
                Record::Tenant(Tenant {
                    name: "Dupont".into(),
                    ..Default::default()
                }),
            )
            .unwrap();
        store
            .upsert(
                Collection::Expenses,
                None,
                Record::Expense(Expense {
                    description: "Plombier".into(),
                    amount: 120.0,
                    ..Default::default()
                }),
            )
            .unwrap();
        store
            .upsert(
                Collection::Payments,
                None,
                Record::Payment(Payment {
                    tenant: "Dupont".into(),
                    amount: 750.0,
                    ..Default::default()
                }),
            )
            .unwrap();
        store
    }

    fn all_lists(store: &RecordStore) -> Vec<Vec<crate::models::StoredRecord>> {
        Collection::ALL
            .iter()
            .map(|&c| store.list(c).to_vec())
            .collect()
    }

    #[test]
    fn test_roundtrip_restores_identical_state() {
        let mut store = setup_store();
        let before = all_lists(&store);
        let json = BackupService::new(&store).to_json().unwrap();

        store.delete(Collection::Tenants, 0).unwrap();
        store.delete(Collection::Expenses, 0).unwrap();

        let result = RestoreService::new(&mut store).restore_json(&json).unwrap();
        assert_eq!(result.restored.len(), Collection::ALL.len());
        assert_eq!(result.record_count(), 3);
        assert_eq!(all_lists(&store), before);
    }

    #[test]
    fn test_restore_twice_is_idempotent() {
        let mut store = setup_store();
        let json = BackupService::new(&store).to_json().unwrap();

        RestoreService::new(&mut store).restore_json(&json).unwrap();
        let once = all_lists(&store);
        RestoreService::new(&mut store).restore_json(&json).unwrap();
        assert_eq!(all_lists(&store), once);
    }

    #[test]
    fn test_missing_key_leaves_collection_untouched() {
        let mut store = setup_store();
        let expenses = store.list(Collection::Expenses).to_vec();

        RestoreService::new(&mut store)
            .restore_json(r#"{"tenants": [{"name": "Martin"}], "expenses": null}"#)
            .unwrap();

        assert_eq!(store.list(Collection::Expenses), expenses.as_slice());
        assert_eq!(store.len(Collection::Tenants), 1);
        assert_eq!(store.get(Collection::Tenants, 0).unwrap().record.summary(), "Martin");
    }

    #[test]
    fn test_invalid_record_changes_nothing() {
        let mut store = setup_store();
        let before = all_lists(&store);

        let err = RestoreService::new(&mut store)
            .restore_json(r#"{"tenants": [], "payments": [{"amount": "beaucoup"}]}"#)
            .unwrap_err();

        assert!(matches!(err, AppError::MalformedInput(_)));
        assert!(err.to_string().contains("payments"));
        assert_eq!(all_lists(&store), before);
    }

    #[test]
    fn test_non_object_is_rejected() {
        let mut store = setup_store();
        let before = all_lists(&store);

        for input in ["[]", "42", "\"texte\"", "pas du json"] {
            let err = RestoreService::new(&mut store).restore_json(input).unwrap_err();
            assert!(matches!(err, AppError::MalformedInput(_)), "{}", input);
        }
        assert_eq!(all_lists(&store), before);
    }

    #[test]
    fn test_collection_not_array_is_rejected() {
        let mut store = setup_store();
        let err = RestoreService::new(&mut store)
            .restore_json(r#"{"tenants": {"nom": "A"}}"#)
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedInput(_)));
        assert_eq!(store.len(Collection::Tenants), 1);
    }

    #[test]
    fn test_legacy_french_snapshot() {
        let mut store = setup_store();
        let legacy = json!({
            "locataires": [{ "nom": "Martin", "prenom": "Léa", "tel": "0600", "notes": "" }],
            "encaissements": [
                { "date": "2024-02-01", "locataire": "Martin", "bien": "T2", "methode": "Chèque", "montant": "650" }
            ],
            "depenses": [],
            "theme": "sombre"
        });

        let result = RestoreService::new(&mut store)
            .restore_json(&legacy.to_string())
            .unwrap();

        assert_eq!(result.unknown_keys, vec!["theme".to_string()]);
        assert!(store.is_empty(Collection::Expenses));
        assert_eq!(store.tenants().next().unwrap().surname, "Léa");

        let payment = store.payments().next().unwrap();
        assert_eq!(payment.amount, 650.0);
        assert_eq!(payment.tenant, "Martin");
    }

    #[test]
    fn test_falsy_values_count_as_absent() {
        let mut store = setup_store();
        RestoreService::new(&mut store)
            .restore_json(r#"{"tenants": false, "expenses": 0, "payments": ""}"#)
            .unwrap();
        assert_eq!(store.len(Collection::Tenants), 1);
        assert_eq!(store.len(Collection::Expenses), 1);
        assert_eq!(store.len(Collection::Payments), 1);
    }

    #[test]
    fn test_preview_does_not_mutate() {
        let store = setup_store();
        let before = all_lists(&store);

        let preview =
            RestoreService::preview(r#"{"owners": [{"nom": "A"}, {"nom": "B"}], "x": 1}"#).unwrap();

        assert_eq!(preview.replaced, vec![(Collection::Owners, 2)]);
        assert_eq!(preview.untouched.len(), Collection::ALL.len() - 1);
        assert_eq!(preview.unknown_keys, vec!["x".to_string()]);
        assert_eq!(all_lists(&store), before);
    }

    #[test]
    fn test_restore_keeps_ids_of_untouched_collections_unique() {
        let mut store = setup_store();
        let tenant_id = store.get(Collection::Tenants, 0).unwrap().id;

        let json = json!({ "owners": [{ "id": tenant_id.0, "name": "Durand" }] }).to_string();
        RestoreService::new(&mut store).restore_json(&json).unwrap();

        let owner_id = store.get(Collection::Owners, 0).unwrap().id;
        assert_ne!(owner_id, tenant_id);
        assert_eq!(store.get_by_id(tenant_id).unwrap().record.collection(), Collection::Tenants);
    }

    #[test]
    fn test_oversized_id_is_reassigned() {
        let mut store = setup_store();
        let existing: Vec<_> = Collection::ALL
            .iter()
            .flat_map(|&c| store.list(c).iter().map(|r| r.id))
            .collect();

        RestoreService::new(&mut store)
            .restore_json(r#"{"tenants": [{"id": 18446744073709551615, "nom": "A"}]}"#)
            .unwrap();

        assert_eq!(store.len(Collection::Tenants), 1);
        let restored = store.get(Collection::Tenants, 0).unwrap().id;
        assert_ne!(restored.0, u64::MAX);

        let added = store
            .upsert(
                Collection::Tenants,
                None,
                Record::Tenant(Tenant {
                    name: "B".into(),
                    ..Default::default()
                }),
            )
            .unwrap();
        assert_ne!(added, restored);
        assert!(!existing.contains(&added));
    }

    #[test]
    fn test_restore_file() {
        let mut store = setup_store();
        let dir = tempfile::tempdir().unwrap();
        let backup = BackupService::new(&store).create_backup(dir.path()).unwrap();

        store.delete(Collection::Tenants, 0).unwrap();
        let result = RestoreService::new(&mut store).restore_file(&backup.path).unwrap();

        assert_eq!(result.record_count(), 3);
        assert_eq!(store.len(Collection::Tenants), 1);
    }
}
