//! Insert mappings for the PostgreSQL destination tables
//!
//! Parameters are cast explicitly so the statements work against any
//! compatible column types.

use crate::domain::{City, Country, OrphanPolicy, Record};
use tokio_postgres::types::ToSql;

/// A record that can be written with one parameterized insert
pub trait PostgresRecord: Record {
    /// Insert statement for this dataset under the given orphan policy
    fn insert_sql(policy: OrphanPolicy) -> &'static str;

    /// Statement parameters in placeholder order
    fn params(&self) -> Vec<&(dyn ToSql + Sync)>;

    /// Natural key of the parent row this record must resolve, if any
    fn parent_key(&self) -> Option<&str> {
        None
    }
}

const INSERT_COUNTRY: &str = "INSERT INTO countries (name, iso_code, flag, lat, lng) \
     VALUES ($1::text, $2::text, $3::text, $4::float8, $5::float8)";

// The parent lookup yields NULL when no country matches.
const INSERT_CITY_NULL_PARENT: &str = "INSERT INTO cities (name, country_iso_code, lat, lng, country_id) \
     VALUES ($1::text, $2::text, $3::float8, $4::float8, \
     (SELECT id FROM countries WHERE iso_code = $2::text ORDER BY id LIMIT 1))";

// Inserts nothing when no country matches.
const INSERT_CITY_REQUIRE_PARENT: &str = "INSERT INTO cities (name, country_iso_code, lat, lng, country_id) \
     SELECT $1::text, $2::text, $3::float8, $4::float8, c.id \
     FROM countries c WHERE c.iso_code = $2::text ORDER BY c.id LIMIT 1";

impl PostgresRecord for Country {
    fn insert_sql(_policy: OrphanPolicy) -> &'static str {
        INSERT_COUNTRY
    }

    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![
            &self.name,
            &self.iso_code,
            &self.flag,
            &self.latitude,
            &self.longitude,
        ]
    }
}

impl PostgresRecord for City {
    fn insert_sql(policy: OrphanPolicy) -> &'static str {
        match policy {
            OrphanPolicy::InsertNull => INSERT_CITY_NULL_PARENT,
            OrphanPolicy::Reject => INSERT_CITY_REQUIRE_PARENT,
        }
    }

    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![
            &self.name,
            &self.country_iso_code,
            &self.latitude,
            &self.longitude,
        ]
    }

    fn parent_key(&self) -> Option<&str> {
        Some(&self.country_iso_code)
    }
}
