//! Row mappings for the SQLite origin tables

use crate::domain::{City, Country, Record};
use rusqlite::Row;

/// A record that can be decoded from one row of its origin query
pub trait SqliteRecord: Record + Sized {
    /// Query enumerating every origin row of this dataset
    const SELECT_SQL: &'static str;

    /// Decodes one row in the column order of `SELECT_SQL`
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error>;
}

/// NULL coordinates read as zero
fn coordinate(row: &Row<'_>, idx: usize) -> Result<f64, rusqlite::Error> {
    Ok(row.get::<_, Option<f64>>(idx)?.unwrap_or(0.0))
}

impl SqliteRecord for Country {
    const SELECT_SQL: &'static str =
        "SELECT id, name, iso2, emoji, latitude, longitude FROM countries";

    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let country = Country::new(
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            coordinate(row, 4)?,
            coordinate(row, 5)?,
        );

        Ok(match row.get::<_, Option<i64>>(0)? {
            Some(id) => country.with_origin_id(id),
            None => country,
        })
    }
}

impl SqliteRecord for City {
    const SELECT_SQL: &'static str =
        "SELECT name, country_code, latitude, longitude FROM cities";

    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(City::new(
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            coordinate(row, 2)?,
            coordinate(row, 3)?,
        ))
    }
}
