use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::Collection;
use crate::utils::lenient;
use crate::utils::{AppError, AppResult};

/// Stabil identitet för en post, oberoende av position i samlingen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bostadstyp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum PropertyType {
    #[default]
    Apartment,
    House,
    Studio,
    Unit,
}

impl PropertyType {
    pub fn all() -> &'static [PropertyType] {
        &[Self::Apartment, Self::House, Self::Studio, Self::Unit]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Apartment => "Appartement",
            Self::House => "Maison",
            Self::Studio => "Studio",
            Self::Unit => "Local",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "apartment" | "appartement" => Some(Self::Apartment),
            "house" | "maison" => Some(Self::House),
            "studio" => Some(Self::Studio),
            "unit" | "local" => Some(Self::Unit),
            _ => None,
        }
    }
}

impl TryFrom<String> for PropertyType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::from_label(&s).ok_or_else(|| unknown_label("type de bien", &s, Self::all().iter().map(Self::label)))
    }
}

/// Betalningssätt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum PaymentMethod {
    #[default]
    Transfer,
    Check,
    Cash,
}

impl PaymentMethod {
    pub fn all() -> &'static [PaymentMethod] {
        &[Self::Transfer, Self::Check, Self::Cash]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Transfer => "Virement",
            Self::Check => "Chèque",
            Self::Cash => "Espèces",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "transfer" | "virement" => Some(Self::Transfer),
            "check" | "chèque" | "cheque" => Some(Self::Check),
            "cash" | "espèces" | "especes" => Some(Self::Cash),
            _ => None,
        }
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::from_label(&s).ok_or_else(|| unknown_label("mode de paiement", &s, Self::all().iter().map(Self::label)))
    }
}

/// Utgiftskategori
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum ExpenseCategory {
    #[default]
    Repairs,
    Insurance,
    Charges,
    Taxes,
    Other,
}

impl ExpenseCategory {
    pub fn all() -> &'static [ExpenseCategory] {
        &[Self::Repairs, Self::Insurance, Self::Charges, Self::Taxes, Self::Other]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Repairs => "Réparations",
            Self::Insurance => "Assurances",
            Self::Charges => "Charges",
            Self::Taxes => "Taxes",
            Self::Other => "Autres",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "repairs" | "réparations" | "reparations" => Some(Self::Repairs),
            "insurance" | "assurances" => Some(Self::Insurance),
            "charges" => Some(Self::Charges),
            "taxes" => Some(Self::Taxes),
            "other" | "autres" => Some(Self::Other),
            _ => None,
        }
    }
}

impl TryFrom<String> for ExpenseCategory {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::from_label(&s).ok_or_else(|| unknown_label("catégorie de dépense", &s, Self::all().iter().map(Self::label)))
    }
}

/// Felmeddelande för okänd etikett, med de giltiga värdena
fn unknown_label<'a>(kind: &str, value: &str, labels: impl Iterator<Item = &'a str>) -> String {
    let labels: Vec<&str> = labels.collect();
    format!("{} inconnu {:?}, choisir parmi : {}", kind, value, labels.join(", "))
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Owner {
    #[serde(default, alias = "nom", deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, alias = "prenom", deserialize_with = "lenient::text")]
    pub surname: String,
    #[serde(default, alias = "tel", deserialize_with = "lenient::text")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Property {
    /// Visningsnamn, används som referens av andra samlingar
    #[serde(default, alias = "bien", deserialize_with = "lenient::text")]
    pub label: String,
    #[serde(default, alias = "adresse", deserialize_with = "lenient::text")]
    pub address: String,
    #[serde(default, rename = "type")]
    pub property_type: PropertyType,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub surface: Option<f64>,
    #[serde(default, alias = "chambres", deserialize_with = "lenient::optional_count")]
    pub rooms: Option<u32>,
    #[serde(default, alias = "infos", deserialize_with = "lenient::text")]
    pub notes: String,
    #[serde(default, alias = "loyer", deserialize_with = "lenient::amount")]
    pub rent: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tenant {
    /// Visningsnamn, används som referens av andra samlingar
    #[serde(default, alias = "nom", deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, alias = "prenom", deserialize_with = "lenient::text")]
    pub surname: String,
    #[serde(default, alias = "tel", deserialize_with = "lenient::text")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rent {
    #[serde(default, alias = "locataire", deserialize_with = "lenient::text")]
    pub tenant: String,
    #[serde(default, alias = "bien", deserialize_with = "lenient::text")]
    pub property: String,
    #[serde(default, alias = "montant", deserialize_with = "lenient::amount")]
    pub amount: f64,
    #[serde(default, deserialize_with = "lenient::optional_date")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default, deserialize_with = "lenient::optional_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, alias = "locataire", deserialize_with = "lenient::text")]
    pub tenant: String,
    #[serde(default, alias = "bien", deserialize_with = "lenient::text")]
    pub property: String,
    #[serde(default, alias = "methode")]
    pub method: PaymentMethod,
    #[serde(default, alias = "montant", deserialize_with = "lenient::amount")]
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Receipt {
    #[serde(default, alias = "locataire", deserialize_with = "lenient::text")]
    pub tenant: String,
    #[serde(default, alias = "montant", deserialize_with = "lenient::amount")]
    pub amount: f64,
    #[serde(default, deserialize_with = "lenient::optional_date")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Revision {
    #[serde(default, alias = "bien", deserialize_with = "lenient::text")]
    pub property: String,
    #[serde(default, alias = "ancien", deserialize_with = "lenient::amount")]
    pub old_amount: f64,
    #[serde(default, alias = "nouveau", deserialize_with = "lenient::amount")]
    pub new_amount: f64,
    #[serde(default, deserialize_with = "lenient::optional_date")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default, deserialize_with = "lenient::optional_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, alias = "categorie")]
    pub category: ExpenseCategory,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(default, alias = "montant", deserialize_with = "lenient::amount")]
    pub amount: f64,
}

/// En post i någon av de åtta samlingarna
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Owner(Owner),
    Property(Property),
    Tenant(Tenant),
    Rent(Rent),
    Payment(Payment),
    Receipt(Receipt),
    Revision(Revision),
    Expense(Expense),
}

impl Record {
    pub fn collection(&self) -> Collection {
        match self {
            Self::Owner(_) => Collection::Owners,
            Self::Property(_) => Collection::Properties,
            Self::Tenant(_) => Collection::Tenants,
            Self::Rent(_) => Collection::Rents,
            Self::Payment(_) => Collection::Payments,
            Self::Receipt(_) => Collection::Receipts,
            Self::Revision(_) => Collection::Revisions,
            Self::Expense(_) => Collection::Expenses,
        }
    }

    /// Avkoda en post ur JSON enligt samlingens schema
    pub fn from_value(collection: Collection, value: Value) -> AppResult<Self> {
        if !value.is_object() {
            return Err(AppError::validation(format!(
                "{} : objet attendu, reçu {}",
                collection, value
            )));
        }

        let record = match collection {
            Collection::Owners => Self::Owner(decode(collection, value)?),
            Collection::Properties => Self::Property(decode(collection, value)?),
            Collection::Tenants => Self::Tenant(decode(collection, value)?),
            Collection::Rents => Self::Rent(decode(collection, value)?),
            Collection::Payments => Self::Payment(decode(collection, value)?),
            Collection::Receipts => Self::Receipt(decode(collection, value)?),
            Collection::Revisions => Self::Revision(decode(collection, value)?),
            Collection::Expenses => Self::Expense(decode(collection, value)?),
        };
        record.validate()?;
        Ok(record)
    }

    pub fn to_value(&self) -> AppResult<Value> {
        let value = match self {
            Self::Owner(r) => serde_json::to_value(r)?,
            Self::Property(r) => serde_json::to_value(r)?,
            Self::Tenant(r) => serde_json::to_value(r)?,
            Self::Rent(r) => serde_json::to_value(r)?,
            Self::Payment(r) => serde_json::to_value(r)?,
            Self::Receipt(r) => serde_json::to_value(r)?,
            Self::Revision(r) => serde_json::to_value(r)?,
            Self::Expense(r) => serde_json::to_value(r)?,
        };
        Ok(value)
    }

    /// Belopp måste vara ändliga tal
    pub fn validate(&self) -> AppResult<()> {
        let amounts: Vec<f64> = match self {
            Self::Owner(_) | Self::Tenant(_) => Vec::new(),
            Self::Property(p) => vec![p.rent, p.surface.unwrap_or(0.0)],
            Self::Rent(r) => vec![r.amount],
            Self::Payment(p) => vec![p.amount],
            Self::Receipt(r) => vec![r.amount],
            Self::Revision(r) => vec![r.old_amount, r.new_amount],
            Self::Expense(e) => vec![e.amount],
        };

        if amounts.iter().any(|a| !a.is_finite()) {
            return Err(AppError::validation(format!(
                "{} : le montant doit être un nombre fini",
                self.collection()
            )));
        }
        Ok(())
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Rent(r) => r.date,
            Self::Payment(p) => p.date,
            Self::Receipt(r) => r.date,
            Self::Revision(r) => r.date,
            Self::Expense(e) => e.date,
            Self::Owner(_) | Self::Property(_) | Self::Tenant(_) => None,
        }
    }

    /// Huvudbeloppet (hyra, betalning, utgift, nytt belopp vid revision)
    pub fn amount(&self) -> Option<f64> {
        match self {
            Self::Property(p) => Some(p.rent),
            Self::Rent(r) => Some(r.amount),
            Self::Payment(p) => Some(p.amount),
            Self::Receipt(r) => Some(r.amount),
            Self::Revision(r) => Some(r.new_amount),
            Self::Expense(e) => Some(e.amount),
            Self::Owner(_) | Self::Tenant(_) => None,
        }
    }

    /// Hyresgästreferens (namn) om posten har en
    pub fn tenant_ref(&self) -> Option<&str> {
        match self {
            Self::Rent(r) => Some(&r.tenant),
            Self::Payment(p) => Some(&p.tenant),
            Self::Receipt(r) => Some(&r.tenant),
            _ => None,
        }
    }

    /// Fastighetsreferens (etikett) om posten har en
    pub fn property_ref(&self) -> Option<&str> {
        match self {
            Self::Rent(r) => Some(&r.property),
            Self::Payment(p) => Some(&p.property),
            Self::Revision(r) => Some(&r.property),
            _ => None,
        }
    }

    /// Kort beskrivning för listor och loggar
    pub fn summary(&self) -> String {
        match self {
            Self::Owner(o) => join_nonempty(&[&o.name, &o.surname, &o.phone, &o.email]),
            Self::Property(p) => join_nonempty(&[&p.label, &p.address, p.property_type.label()]),
            Self::Tenant(t) => join_nonempty(&[&t.name, &t.surname, &t.phone]),
            Self::Rent(r) => join_nonempty(&[&r.tenant, &r.property]),
            Self::Payment(p) => join_nonempty(&[&p.tenant, &p.property, p.method.label()]),
            Self::Receipt(r) => r.tenant.clone(),
            Self::Revision(r) => r.property.clone(),
            Self::Expense(e) => join_nonempty(&[e.category.label(), &e.description]),
        }
    }
}

fn decode<T: DeserializeOwned>(collection: Collection, value: Value) -> AppResult<T> {
    serde_json::from_value(value)
        .map_err(|e| AppError::validation(format!("{} : {}", collection, e)))
}

fn join_nonempty(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" · ")
}

/// Post med stabil identitet, så som den ligger i lagret
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: RecordId,
    pub record: Record,
}

impl From<Owner> for Record {
    fn from(r: Owner) -> Self {
        Self::Owner(r)
    }
}

impl From<Property> for Record {
    fn from(r: Property) -> Self {
        Self::Property(r)
    }
}

impl From<Tenant> for Record {
    fn from(r: Tenant) -> Self {
        Self::Tenant(r)
    }
}

impl From<Rent> for Record {
    fn from(r: Rent) -> Self {
        Self::Rent(r)
    }
}

impl From<Payment> for Record {
    fn from(r: Payment) -> Self {
        Self::Payment(r)
    }
}

impl From<Receipt> for Record {
    fn from(r: Receipt) -> Self {
        Self::Receipt(r)
    }
}

impl From<Revision> for Record {
    fn from(r: Revision) -> Self {
        Self::Revision(r)
    }
}

impl From<Expense> for Record {
    fn from(r: Expense) -> Self {
        Self::Expense(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_legacy_payment() {
        let value = json!({
            "date": "2024-03-01",
            "locataire": "Dupont",
            "bien": "T2 Centre",
            "methode": "Chèque",
            "montant": "750"
        });

        let record = Record::from_value(Collection::Payments, value).unwrap();
        let Record::Payment(p) = record else {
            panic!("fel variant");
        };
        assert_eq!(p.tenant, "Dupont");
        assert_eq!(p.property, "T2 Centre");
        assert_eq!(p.method, PaymentMethod::Check);
        assert_eq!(p.amount, 750.0);
        assert_eq!(p.date, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_decode_property_type_aliases() {
        let value = json!({ "bien": "Villa", "type": "Maison", "chambres": "4", "loyer": 1200 });
        let record = Record::from_value(Collection::Properties, value).unwrap();
        let Record::Property(p) = record else {
            panic!("fel variant");
        };
        assert_eq!(p.property_type, PropertyType::House);
        assert_eq!(p.rooms, Some(4));
        assert_eq!(p.rent, 1200.0);
    }

    #[test]
    fn test_unknown_enum_label_is_rejected() {
        let value = json!({ "categorie": "Vacances", "montant": 10 });
        let err = Record::from_value(Collection::Expenses, value).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let msg = err.to_string();
        assert!(msg.contains("Vacances"));
        for category in ExpenseCategory::all() {
            assert!(msg.contains(category.label()), "{}", msg);
        }
    }

    #[test]
    fn test_every_label_is_accepted() {
        for t in PropertyType::all() {
            assert_eq!(PropertyType::try_from(t.label().to_string()), Ok(*t));
        }
        for m in PaymentMethod::all() {
            assert_eq!(PaymentMethod::try_from(m.label().to_string()), Ok(*m));
        }
        for c in ExpenseCategory::all() {
            assert_eq!(ExpenseCategory::try_from(c.label().to_string()), Ok(*c));
        }
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(Record::from_value(Collection::Tenants, json!("Dupont")).is_err());
        assert!(Record::from_value(Collection::Tenants, json!([1, 2])).is_err());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let value = json!({ "nom": "Martin", "couleur": "bleu" });
        let record = Record::from_value(Collection::Tenants, value).unwrap();
        assert_eq!(record.summary(), "Martin");
    }

    #[test]
    fn test_value_roundtrip_keeps_record() {
        let record = Record::Revision(Revision {
            property: "T2 Centre".into(),
            old_amount: 700.0,
            new_amount: 720.5,
            date: NaiveDate::from_ymd_opt(2024, 1, 1),
        });
        let value = record.to_value().unwrap();
        assert_eq!(value["old_amount"], json!(700.0));
        assert_eq!(Record::from_value(Collection::Revisions, value).unwrap(), record);
    }

    #[test]
    fn test_non_finite_amount_fails_validation() {
        let record = Record::Expense(Expense {
            amount: f64::NAN,
            ..Default::default()
        });
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_references() {
        let record = Record::Rent(Rent {
            tenant: "Dupont".into(),
            property: "T2".into(),
            ..Default::default()
        });
        assert_eq!(record.tenant_ref(), Some("Dupont"));
        assert_eq!(record.property_ref(), Some("T2"));
        assert_eq!(Record::Owner(Owner::default()).tenant_ref(), None);
    }
}
