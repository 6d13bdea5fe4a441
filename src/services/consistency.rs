//! Konsistenskontroller för mjuka referenser
//!
//! Referenser lagras som visningsnamn och följer inte med vid namnbyte eller
//! borttagning. Här hittas de som hänger löst; inget rättas automatiskt.

use std::collections::{HashMap, HashSet};

use crate::models::{Collection, RecordId};
use crate::store::RecordStore;

/// Vilket slags mål en referens pekar på
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Tenant,
    Property,
}

impl ReferenceKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tenant => "locataire",
            Self::Property => "bien",
        }
    }
}

/// En referens till en hyresgäst eller fastighet som inte finns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanReference {
    pub collection: Collection,
    pub index: usize,
    pub id: RecordId,
    pub kind: ReferenceKind,
    pub value: String,
}

/// Poster med identiskt innehåll i samma samling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub collection: Collection,
    /// Positioner i lagringsordning, minst två
    pub indices: Vec<usize>,
}

/// Alla referenser vars namn inte motsvarar någon hyresgäst eller fastighet.
/// Tomma referensfält räknas inte.
pub fn find_orphan_references(store: &RecordStore) -> Vec<OrphanReference> {
    let tenants: HashSet<&str> = store.tenants().map(|t| t.name.trim()).collect();
    let properties: HashSet<&str> = store.properties().map(|p| p.label.trim()).collect();

    let mut orphans = Vec::new();

    for &collection in Collection::ALL {
        for (index, stored) in store.list(collection).iter().enumerate() {
            let refs = [
                (ReferenceKind::Tenant, stored.record.tenant_ref(), &tenants),
                (ReferenceKind::Property, stored.record.property_ref(), &properties),
            ];

            for (kind, value, known) in refs {
                let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
                    continue;
                };
                if !known.contains(value) {
                    orphans.push(OrphanReference {
                        collection,
                        index,
                        id: stored.id,
                        kind,
                        value: value.to_string(),
                    });
                }
            }
        }
    }

    if !orphans.is_empty() {
        tracing::debug!("Hittade {} lösa referenser", orphans.len());
    }

    orphans
}

/// Grupper av poster med samma innehåll (id och position bortsett)
pub fn find_duplicates(store: &RecordStore) -> Vec<DuplicateGroup> {
    let mut groups = Vec::new();

    for &collection in Collection::ALL {
        let mut seen: HashMap<String, Vec<usize>> = HashMap::new();
        let mut order = Vec::new();

        for (index, stored) in store.list(collection).iter().enumerate() {
            // JSON-formen är kanonisk för jämförelsen
            let Ok(value) = stored.record.to_value() else {
                continue;
            };
            let key = value.to_string();
            let indices = seen.entry(key.clone()).or_default();
            if indices.is_empty() {
                order.push(key);
            }
            indices.push(index);
        }

        for key in order {
            if let Some(indices) = seen.remove(&key) {
                if indices.len() > 1 {
                    groups.push(DuplicateGroup { collection, indices });
                }
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{Payment, Property, Record, Rent, Revision, Tenant};

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
                Collection::Properties,
                None,
                Record::Property(Property {
                    label: "T2 Centre".into(),
                    ..Default::default()
                }),
            )
            .unwrap();
        store
    }

    #[test]
    fn test_no_orphans_when_references_resolve() {
        let mut store = setup_store();
        store
            .upsert(
                Collection::Rents,
                None,
                Record::Rent(Rent {
                    tenant: "Dupont".into(),
                    property: "T2 Centre".into(),
                    amount: 700.0,
                    date: None,
                }),
            )
            .unwrap();

        assert!(find_orphan_references(&store).is_empty());
    }

    #[test]
    fn test_rename_leaves_orphan() {
        let mut store = setup_store();
        store
            .upsert(
                Collection::Payments,
                None,
                Record::Payment(Payment {
                    tenant: "Dupont".into(),
                    property: "T2 Centre".into(),
                    amount: 700.0,
                    ..Default::default()
                }),
            )
            .unwrap();

        // Byt namn på hyresgästen; betalningen pekar fortfarande på det gamla
        store
            .upsert(
                Collection::Tenants,
                Some(0),
                Record::Tenant(Tenant {
                    name: "Dupont-Martin".into(),
                    ..Default::default()
                }),
            )
            .unwrap();

        let orphans = find_orphan_references(&store);
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].collection, Collection::Payments);
        assert_eq!(orphans[0].kind, ReferenceKind::Tenant);
        assert_eq!(orphans[0].value, "Dupont");

        // Betalningen är oförändrad
        assert_eq!(store.payments().next().unwrap().tenant, "Dupont");
    }

    #[test]
    fn test_deleted_property_and_empty_refs() {
        let mut store = setup_store();
        store
            .upsert(
                Collection::Revisions,
                None,
                Record::Revision(Revision {
                    property: "T2 Centre".into(),
                    old_amount: 700.0,
                    new_amount: 720.0,
                    date: None,
                }),
            )
            .unwrap();
        store
            .upsert(Collection::Rents, None, Record::Rent(Rent::default()))
            .unwrap();
        store.delete(Collection::Properties, 0).unwrap();

        let orphans = find_orphan_references(&store);
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].kind, ReferenceKind::Property);
        assert_eq!(orphans[0].collection, Collection::Revisions);
    }

    #[test]
    fn test_find_duplicates() {
        let mut store = setup_store();
        store
            .upsert(
                Collection::Tenants,
                None,
                Record::Tenant(Tenant {
                    name: "Martin".into(),
                    ..Default::default()
                }),
            )
            .unwrap();
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

        let groups = find_duplicates(&store);
        assert_eq!(
            groups,
            vec![DuplicateGroup {
                collection: Collection::Tenants,
                indices: vec![0, 2],
            }]
        );
    }
}
