//! Dataset kinds and the record contract shared by countries and cities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which reference dataset a migration run moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    /// Countries, migrated sequentially in one transaction
    Country,
    /// Cities, migrated through the worker pool
    City,
}

impl DatasetKind {
    /// Selector string accepted on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Country => "country",
            DatasetKind::City => "city",
        }
    }

    /// Plural noun used in human-readable output
    pub fn plural(&self) -> &'static str {
        match self {
            DatasetKind::Country => "countries",
            DatasetKind::City => "cities",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "country" => Ok(DatasetKind::Country),
            "city" => Ok(DatasetKind::City),
            other => Err(format!("Invalid dataset '{other}'. Use 'country' or 'city'")),
        }
    }
}

/// What to do with a city whose country code has no matching destination country
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Insert the city with a NULL country reference
    #[default]
    InsertNull,
    /// Fail the row as a row-level error
    Reject,
}

impl fmt::Display for OrphanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrphanPolicy::InsertNull => f.write_str("insert_null"),
            OrphanPolicy::Reject => f.write_str("reject"),
        }
    }
}

impl FromStr for OrphanPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "insert_null" => Ok(OrphanPolicy::InsertNull),
            "reject" => Ok(OrphanPolicy::Reject),
            other => Err(format!(
                "Invalid orphan policy '{other}'. Use 'insert_null' or 'reject'"
            )),
        }
    }
}

/// A row that travels from the origin store to the destination unchanged
///
/// Records are immutable once read and are moved, never shared, between
/// the producer and the worker that inserts them.
pub trait Record: fmt::Debug + Send + Sync + 'static {
    /// Dataset this record belongs to
    const KIND: DatasetKind;

    /// Human-readable identity used in log lines and failure reports
    fn key(&self) -> String;
}
