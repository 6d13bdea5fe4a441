//! Postlagret: de åtta samlingarna i minnet, speglade till nyckel-värde-lagret
//!
//! Varje muterande anrop sparar alla samlingar innan det returnerar. Poster
//! adresseras antingen positionellt (som i webbversionen, index flyttas vid
//! borttagning) eller via sitt stabila `RecordId`.

pub mod codec;

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use crate::db::Database;
use crate::models::{
    Collection, Expense, Payment, Property, Receipt, Record, RecordId, Rent, Revision,
    StoredRecord, Tenant,
};
use crate::utils::date::sort_key;
use crate::utils::{AppError, AppResult};

use codec::DecodedRecord;

/// Valbara värden för referensfält i formulär
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceOptions {
    /// Hyresgästernas namn (fältet `tenant`)
    pub tenants: Vec<String>,
    /// Fastigheternas etiketter (fältet `property`)
    pub properties: Vec<String>,
}

pub struct RecordStore {
    db: Database,
    collections: BTreeMap<Collection, Vec<StoredRecord>>,
    next_id: u64,
    revision: u64,
}

impl RecordStore {
    /// Läs in alla samlingar. Saknad eller trasig post ger en tom samling.
    pub fn load(db: Database) -> AppResult<Self> {
        let mut store = Self {
            db,
            collections: BTreeMap::new(),
            next_id: 1,
            revision: 0,
        };

        let kv = store.db.kv();
        let mut taken = HashSet::new();

        for &collection in Collection::ALL {
            let decoded = match kv.get(collection.key())? {
                None => Vec::new(),
                Some(raw) => match codec::decode_collection_str(collection, &raw) {
                    Ok(decoded) => decoded,
                    Err(e) => {
                        warn!("Ogiltig sparad samling {}, läser in som tom: {}", collection, e);
                        // Behåll originalet innan det skrivs över vid nästa sparning
                        kv.set(&format!("{}.corrupt", collection.key()), &raw)?;
                        Vec::new()
                    }
                },
            };

            let records = store.assign_ids(decoded, &mut taken);
            debug!("Läste in {} poster i {}", records.len(), collection);
            store.collections.insert(collection, records);
        }

        info!(
            "Postlager inläst: {} poster i {} samlingar",
            store.total_len(),
            Collection::ALL.len()
        );
        Ok(store)
    }

    /// Databashandtaget lagret speglas till
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Räknas upp efter varje lyckad sparning
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Poster i lagringsordning
    pub fn list(&self, collection: Collection) -> &[StoredRecord] {
        self.collections
            .get(&collection)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Poster i visningsordning: betalningar nyast först, övriga i lagringsordning
    pub fn list_for_display(&self, collection: Collection) -> Vec<&StoredRecord> {
        let mut items: Vec<&StoredRecord> = self.list(collection).iter().collect();

        if collection == Collection::Payments {
            // Stabil sortering, saknat datum hamnar sist
            items.sort_by(|a, b| sort_key(b.record.date()).cmp(&sort_key(a.record.date())));
        }

        items
    }

    pub fn get(&self, collection: Collection, index: usize) -> Option<&StoredRecord> {
        self.list(collection).get(index)
    }

    pub fn get_by_id(&self, id: RecordId) -> Option<&StoredRecord> {
        self.position_of(id)
            .and_then(|(collection, index)| self.get(collection, index))
    }

    /// Aktuell position för ett id
    pub fn position_of(&self, id: RecordId) -> Option<(Collection, usize)> {
        self.collections.iter().find_map(|(collection, records)| {
            records
                .iter()
                .position(|r| r.id == id)
                .map(|index| (*collection, index))
        })
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.list(collection).len()
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.list(collection).is_empty()
    }

    pub fn total_len(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    /// Antal poster per samling
    pub fn counts(&self) -> Vec<(Collection, usize)> {
        Collection::ALL
            .iter()
            .map(|&c| (c, self.len(c)))
            .collect()
    }

    /// Lägg till (`index = None`) eller ersätt posten på `index`
    pub fn upsert(
        &mut self,
        collection: Collection,
        index: Option<usize>,
        record: Record,
    ) -> AppResult<RecordId> {
        check_collection(collection, &record)?;
        record.validate()?;

        let id = match index {
            None => {
                let id = self.fresh_id();
                self.records_mut(collection).push(StoredRecord { id, record });
                debug!("Lade till {} i {}", id, collection);
                id
            }
            Some(index) => {
                let slot = self
                    .records_mut(collection)
                    .get_mut(index)
                    .ok_or_else(|| out_of_bounds(collection, index))?;
                slot.record = record;
                debug!("Ersatte {} i {}", slot.id, collection);
                slot.id
            }
        };

        self.persist_all()?;
        Ok(id)
    }

    /// Ersätt posten med givet id, oavsett position
    pub fn update_by_id(&mut self, id: RecordId, record: Record) -> AppResult<()> {
        let (collection, index) = self
            .position_of(id)
            .ok_or_else(|| AppError::not_found(format!("enregistrement {}", id)))?;
        self.upsert(collection, Some(index), record)?;
        Ok(())
    }

    /// Ta bort posten på `index`; efterföljande poster flyttas ett steg
    pub fn delete(&mut self, collection: Collection, index: usize) -> AppResult<StoredRecord> {
        let records = self.records_mut(collection);
        if index >= records.len() {
            return Err(out_of_bounds(collection, index));
        }

        let removed = records.remove(index);
        debug!("Tog bort {} ur {}", removed.id, collection);

        self.persist_all()?;
        Ok(removed)
    }

    pub fn delete_by_id(&mut self, id: RecordId) -> AppResult<StoredRecord> {
        let (collection, index) = self
            .position_of(id)
            .ok_or_else(|| AppError::not_found(format!("enregistrement {}", id)))?;
        self.delete(collection, index)
    }

    /// Skriv alla samlingar till nyckel-värde-lagret i en transaktion
    pub fn persist_all(&mut self) -> AppResult<()> {
        let mut entries = Vec::with_capacity(Collection::ALL.len());
        for &collection in Collection::ALL {
            let raw = codec::encode_collection_string(self.list(collection))?;
            entries.push((collection.key(), raw));
        }

        if let Err(e) = self.db.kv().set_many(&entries) {
            tracing::error!("Kunde inte spara postlagret: {}", e);
            return Err(e);
        }

        self.revision += 1;
        Ok(())
    }

    /// Ersätt hela samlingar (används av återställning). Samlingar som inte
    /// finns i `replacements` lämnas orörda. Sparar efteråt.
    pub fn replace_collections(
        &mut self,
        replacements: Vec<(Collection, Vec<DecodedRecord>)>,
    ) -> AppResult<()> {
        let replaced: HashSet<Collection> = replacements.iter().map(|(c, _)| *c).collect();

        // Id:n i samlingar som behålls får inte återanvändas
        let mut taken: HashSet<RecordId> = self
            .collections
            .iter()
            .filter(|(c, _)| !replaced.contains(c))
            .flat_map(|(_, records)| records.iter().map(|r| r.id))
            .collect();

        for (collection, decoded) in replacements {
            let records = self.assign_ids(decoded, &mut taken);
            info!("Ersätter {} med {} poster", collection, records.len());
            self.collections.insert(collection, records);
        }

        self.persist_all()
    }

    /// Valbara hyresgäster och fastigheter, tomma namn utelämnas
    pub fn reference_options(&self) -> ReferenceOptions {
        ReferenceOptions {
            tenants: self
                .tenants()
                .map(|t| t.name.clone())
                .filter(|n| !n.trim().is_empty())
                .collect(),
            properties: self
                .properties()
                .map(|p| p.label.clone())
                .filter(|l| !l.trim().is_empty())
                .collect(),
        }
    }

    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.list(Collection::Properties).iter().filter_map(|r| match &r.record {
            Record::Property(p) => Some(p),
            _ => None,
        })
    }

    pub fn tenants(&self) -> impl Iterator<Item = &Tenant> {
        self.list(Collection::Tenants).iter().filter_map(|r| match &r.record {
            Record::Tenant(t) => Some(t),
            _ => None,
        })
    }

    pub fn rents(&self) -> impl Iterator<Item = &Rent> {
        self.list(Collection::Rents).iter().filter_map(|r| match &r.record {
            Record::Rent(rent) => Some(rent),
            _ => None,
        })
    }

    pub fn payments(&self) -> impl Iterator<Item = &Payment> {
        self.list(Collection::Payments).iter().filter_map(|r| match &r.record {
            Record::Payment(p) => Some(p),
            _ => None,
        })
    }

    pub fn receipts(&self) -> impl Iterator<Item = &Receipt> {
        self.list(Collection::Receipts).iter().filter_map(|r| match &r.record {
            Record::Receipt(receipt) => Some(receipt),
            _ => None,
        })
    }

    pub fn revisions(&self) -> impl Iterator<Item = &Revision> {
        self.list(Collection::Revisions).iter().filter_map(|r| match &r.record {
            Record::Revision(revision) => Some(revision),
            _ => None,
        })
    }

    pub fn expenses(&self) -> impl Iterator<Item = &Expense> {
        self.list(Collection::Expenses).iter().filter_map(|r| match &r.record {
            Record::Expense(e) => Some(e),
            _ => None,
        })
    }

    fn records_mut(&mut self, collection: Collection) -> &mut Vec<StoredRecord> {
        self.collections.entry(collection).or_default()
    }

    fn fresh_id(&mut self) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// Behåll giltiga unika id:n, ge övriga nya
    fn assign_ids(
        &mut self,
        decoded: Vec<DecodedRecord>,
        taken: &mut HashSet<RecordId>,
    ) -> Vec<StoredRecord> {
        if let Some(max) = decoded.iter().filter_map(|(id, _)| *id).map(|id| id.0).max() {
            self.next_id = self.next_id.max(max.saturating_add(1));
        }

        decoded
            .into_iter()
            .map(|(id, record)| {
                let id = match id {
                    Some(id) if taken.insert(id) => id,
                    _ => {
                        let id = self.fresh_id();
                        taken.insert(id);
                        id
                    }
                };
                StoredRecord { id, record }
            })
            .collect()
    }
}

fn check_collection(expected: Collection, record: &Record) -> AppResult<()> {
    let actual = record.collection();
    if actual != expected {
        return Err(AppError::CollectionMismatch { expected, actual });
    }
    Ok(())
}

fn out_of_bounds(collection: Collection, index: usize) -> AppError {
    AppError::not_found(format!("{} position {}", collection, index))
}
