//! JSON-kodning av samlingar för nyckel-värde-lagret och säkerhetskopior
//!
//! En samling lagras som en array av objekt. Varje objekt har postens fält
//! plus `id`. Äldre data utan `id` accepteras; id tilldelas då vid inläsning.

use serde_json::{Map, Value};

use crate::models::{Collection, Record, RecordId, StoredRecord};
use crate::utils::{AppError, AppResult};

/// Avkodad post innan id har tilldelats
pub type DecodedRecord = (Option<RecordId>, Record);

pub fn encode_collection(records: &[StoredRecord]) -> AppResult<Value> {
    let mut items = Vec::with_capacity(records.len());

    for stored in records {
        let mut value = stored.record.to_value()?;
        if let Value::Object(map) = &mut value {
            map.insert("id".to_string(), Value::from(stored.id.0));
        }
        items.push(value);
    }

    Ok(Value::Array(items))
}

pub fn encode_collection_string(records: &[StoredRecord]) -> AppResult<String> {
    Ok(serde_json::to_string(&encode_collection(records)?)?)
}

/// Avkoda en hel samling; ett enda ogiltigt objekt underkänner samlingen
pub fn decode_collection(collection: Collection, value: Value) -> AppResult<Vec<DecodedRecord>> {
    let Value::Array(items) = value else {
        return Err(AppError::validation(format!(
            "{} : tableau attendu",
            collection
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            decode_item(collection, item).map_err(|e| {
                let msg = match e {
                    AppError::Validation(msg) => msg,
                    other => other.to_string(),
                };
                let prefix = format!("{} : ", collection);
                let msg = msg.strip_prefix(&prefix).unwrap_or(&msg);
                AppError::validation(format!("{}[{}] : {}", collection, index, msg))
            })
        })
        .collect()
}

pub fn decode_collection_str(collection: Collection, raw: &str) -> AppResult<Vec<DecodedRecord>> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| AppError::validation(format!("{} : JSON invalide : {}", collection, e)))?;
    decode_collection(collection, value)
}

fn decode_item(collection: Collection, item: Value) -> AppResult<DecodedRecord> {
    let Value::Object(mut map) = item else {
        return Err(AppError::validation("objet attendu"));
    };

    let id = take_id(&mut map);
    let record = Record::from_value(collection, Value::Object(map))?;
    Ok((id, record))
}

/// Största id som accepteras från lagrad data eller säkerhetskopior
pub const MAX_RECORD_ID: u64 = i64::MAX as u64;

/// Plocka ut `id`; allt utanför 1..=MAX_RECORD_ID ignoreras
fn take_id(map: &mut Map<String, Value>) -> Option<RecordId> {
    map.remove("id")
        .and_then(|v| v.as_u64())
        .filter(|id| (1..=MAX_RECORD_ID).contains(id))
        .map(RecordId)
}
