//! Utilidades de validación
//!
//! Normalización de campos de texto, búsqueda por subcadena y
//! conversión de rangos de fechas de calendario.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::utils::errors::{AppError, AppResult};

/// Normaliza una matrícula: sin espacios laterales y en mayúsculas
pub fn normalize_registration(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Normaliza un email para comparaciones de unicidad
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Búsqueda por subcadena sin distinguir mayúsculas
pub fn matches_search<'a, I>(needle: &str, fields: I) -> bool
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Rango temporal inclusivo por día de calendario (UTC)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Construye el rango; `end` cubre el día completo
    pub fn from_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> AppResult<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(AppError::BadRequest(
                    "start_date must not be after end_date".to_string(),
                ));
            }
        }

        Ok(Self {
            start: start.map(|d| d.and_time(NaiveTime::MIN).and_utc()),
            end: end.map(|d| {
                (d + Duration::days(1)).and_time(NaiveTime::MIN).and_utc()
                    - Duration::nanoseconds(1)
            }),
        })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| at >= s) && self.end.map_or(true, |e| at <= e)
    }
}
