use serde::{Deserialize, Serialize};
use std::fmt;

/// Fast växelkurs euro → CFP-franc
pub const EUR_TO_XPF: f64 = 119.33;

/// CFP-belopp avrundas uppåt till närmaste tusental
const XPF_ROUNDING_STEP: f64 = 1000.0;

/// Valuta som belopp visas i. Lagrade belopp är alltid i euro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayCurrency {
    #[default]
    Euro,
    Cfp,
}

impl DisplayCurrency {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Euro => "EUR",
            Self::Cfp => "XPF",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Euro => "€",
            Self::Cfp => "XPF",
        }
    }

    /// Tolka lagrat värde; "€" är webbversionens format
    pub fn from_stored(s: &str) -> Option<Self> {
        match s.trim() {
            "EUR" | "€" | "eur" => Some(Self::Euro),
            "XPF" | "xpf" | "CFP" => Some(Self::Cfp),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Euro => Self::Cfp,
            Self::Cfp => Self::Euro,
        }
    }

    /// Formatera ett eurobelopp i denna valuta
    pub fn format(&self, amount_eur: f64) -> String {
        format_amount(amount_eur, *self)
    }
}

impl fmt::Display for DisplayCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Ren omräkning av ett lagrat eurobelopp till visningssträng
pub fn format_amount(amount_eur: f64, currency: DisplayCurrency) -> String {
    let amount = if amount_eur.is_finite() { amount_eur } else { 0.0 };

    match currency {
        DisplayCurrency::Euro => format!("€{:.2}", amount),
        DisplayCurrency::Cfp => {
            let xpf = (amount * EUR_TO_XPF / XPF_ROUNDING_STEP).ceil() * XPF_ROUNDING_STEP;
            format!("{} XPF", xpf as i64)
        }
    }
}
