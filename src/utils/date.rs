use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

/// Parse ett datum från en sträng (flexibelt format)
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // Försök olika format
    let formats = [
        "%Y-%m-%d",    // 2024-01-15
        "%Y/%m/%d",    // 2024/01/15
        "%d/%m/%Y",    // 15/01/2024 (fransk visning)
        "%d-%m-%Y",    // 15-01-2024
        "%Y%m%d",      // 20240115
    ];

    for format in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    // Fullständiga tidsstämplar från webbversionen, t.ex. 2024-01-15T00:00:00.000Z
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }

    None
}

/// Formatera ett datum för lagring
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Formatera ett datum för visning (fr-FR)
pub fn format_date_fr(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Som `format_date_fr` men tom sträng för saknat datum
pub fn format_optional_fr(date: Option<NaiveDate>) -> String {
    date.map(format_date_fr).unwrap_or_default()
}

/// Dagens datum i visningsformat
pub fn today_fr() -> String {
    format_date_fr(Local::now().date_naive())
}

/// Sorteringsnyckel där saknat datum räknas som epoch
pub fn sort_key(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN))
}
