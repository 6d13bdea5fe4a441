use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::AppError;

/// De åtta positionella samlingarna i postlagret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Owners,
    Properties,
    Tenants,
    Rents,
    Payments,
    Receipts,
    Revisions,
    Expenses,
}

impl Collection {
    pub const ALL: &'static [Collection] = &[
        Self::Owners,
        Self::Properties,
        Self::Tenants,
        Self::Rents,
        Self::Payments,
        Self::Receipts,
        Self::Revisions,
        Self::Expenses,
    ];

    /// Nyckel i nyckel-värde-lagret och i säkerhetskopior
    pub fn key(&self) -> &'static str {
        match self {
            Self::Owners => "owners",
            Self::Properties => "properties",
            Self::Tenants => "tenants",
            Self::Rents => "rents",
            Self::Payments => "payments",
            Self::Receipts => "receipts",
            Self::Revisions => "revisions",
            Self::Expenses => "expenses",
        }
    }

    /// Nyckel som webbversionen använde
    pub fn legacy_key(&self) -> &'static str {
        match self {
            Self::Owners => "proprietaires",
            Self::Properties => "biens",
            Self::Tenants => "locataires",
            Self::Rents => "loyers",
            Self::Payments => "encaissements",
            Self::Receipts => "quittances",
            Self::Revisions => "revisions",
            Self::Expenses => "depenses",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.key() == key || c.legacy_key() == key)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Owners => "Propriétaires",
            Self::Properties => "Biens",
            Self::Tenants => "Locataires",
            Self::Rents => "Loyers",
            Self::Payments => "Encaissements",
            Self::Receipts => "Quittances",
            Self::Revisions => "Révisions",
            Self::Expenses => "Dépenses",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Collection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| AppError::UnknownCollection(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip() {
        for collection in Collection::ALL {
            assert_eq!(Collection::from_key(collection.key()), Some(*collection));
            assert_eq!(Collection::from_key(collection.legacy_key()), Some(*collection));
        }
    }

    #[test]
    fn test_unknown_collection() {
        assert!(matches!(
            "documents".parse::<Collection>(),
            Err(AppError::UnknownCollection(_))
        ));
        assert_eq!(" Locataires ".parse::<Collection>().unwrap(), Collection::Tenants);
    }
}
