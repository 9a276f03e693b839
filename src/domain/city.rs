//! City reference record

use super::dataset::{DatasetKind, Record};
use serde::{Deserialize, Serialize};

/// A city as read from the origin store
///
/// The parent country is referenced only by ISO code. The destination
/// resolves it to a country row at insert time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// Display name
    pub name: String,

    /// ISO code of the parent country
    pub country_iso_code: String,

    /// Latitude, zero when absent in the origin
    pub latitude: f64,

    /// Longitude, zero when absent in the origin
    pub longitude: f64,
}

impl City {
    pub fn new(
        name: impl Into<String>,
        country_iso_code: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            name: name.into(),
            country_iso_code: country_iso_code.into(),
            latitude,
            longitude,
        }
    }
}

impl Record for City {
    const KIND: DatasetKind = DatasetKind::City;

    fn key(&self) -> String {
        format!("{} ({})", self.name, self.country_iso_code)
    }
}
