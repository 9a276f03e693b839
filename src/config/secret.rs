//! Secure credential handling using the secrecy crate
//!
//! The destination connection string carries a password, so it is held in a
//! `Secret` that zeroes its memory on drop and redacts itself in Debug output.
//!
//! # Example
//!
//! ```rust
//! use geomigrate::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let url = secret_string("postgresql://user:pw@localhost/geo".to_string());
//! assert!(url.expose_secret().starts_with("postgresql://"));
//! assert!(!format!("{url:?}").contains("pw"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, ExposeSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;
use zeroize::Zeroize;

/// Newtype wrapper for String that implements the required traits for Secret
#[derive(Clone, Debug, Default, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    /// Parse the secret value into another type
    pub fn parse<F: std::str::FromStr>(&self) -> Result<F, F::Err> {
        self.0.parse()
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Type alias for a secret string
pub type SecretString = Secret<SecretValue>;

/// Helper function to create a SecretString from a String
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

/// Renders a connection URL with its credentials removed
///
/// The user name becomes `***`, the password is dropped and a `password`
/// query parameter is masked. The scheme, host, port, database and other
/// parameters are kept, so `postgres://user:pw@db:5432/geo` becomes
/// `postgres://***@db:5432/geo`. A string that does not parse as a URL is
/// not echoed at all.
pub fn redact_connection_string(url: &SecretString) -> String {
    let raw: &str = url.expose_secret().as_ref();
    let Ok(mut parsed) = Url::parse(raw) else {
        return "<unparseable connection string>".to_string();
    };

    if !parsed.username().is_empty() || parsed.password().is_some() {
        // Only fails for URLs that cannot carry credentials in the first place.
        let _ = parsed.set_password(None);
        let _ = parsed.set_username("***");
    }

    if parsed.query_pairs().any(|(key, _)| key == "password") {
        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(key, value)| {
                let value = if key == "password" {
                    "***".to_string()
                } else {
                    value.into_owned()
                };
                (key.into_owned(), value)
            })
            .collect();
        parsed.query_pairs_mut().clear().extend_pairs(pairs);
    }

    parsed.to_string()
}
