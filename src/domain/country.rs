//! Country reference record

use super::dataset::{DatasetKind, Record};
use serde::{Deserialize, Serialize};

/// A country as read from the origin store
///
/// The ISO code is the natural key; cities refer to their country by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    /// Row id in the origin store, informational only
    #[serde(default)]
    pub origin_id: Option<i64>,

    /// Display name
    pub name: String,

    /// ISO 3166-1 alpha-2 code
    pub iso_code: String,

    /// Flag glyph
    pub flag: String,

    /// Latitude, zero when absent in the origin
    pub latitude: f64,

    /// Longitude, zero when absent in the origin
    pub longitude: f64,
}

impl Country {
    /// Creates a country without an origin id
    pub fn new(
        name: impl Into<String>,
        iso_code: impl Into<String>,
        flag: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            origin_id: None,
            name: name.into(),
            iso_code: iso_code.into(),
            flag: flag.into(),
            latitude,
            longitude,
        }
    }

    /// Sets the origin id
    pub fn with_origin_id(mut self, id: i64) -> Self {
        self.origin_id = Some(id);
        self
    }
}

impl Record for Country {
    const KIND: DatasetKind = DatasetKind::Country;

    fn key(&self) -> String {
        format!("{} ({})", self.name, self.iso_code)
    }
}
