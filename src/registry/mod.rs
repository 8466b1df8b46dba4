//! Typed clients for the Flemish basisregisters endpoints.

pub mod adresmatch;
pub mod gebouwen;
pub mod wkt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Accepts a JSON string, number or bool as text; anything else is absent.
pub(crate) fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_text))
}

/// Decodes an optional field, treating a value of the wrong shape as absent.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

pub(crate) fn value_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First candidate that is present and not blank.
pub(crate) fn first_text<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a String>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(String::as_str)
        .find(|s| !s.is_empty())
}

/// Object identifier block shared by all registry resources.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Identificator {
    #[serde(deserialize_with = "loose_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub naamruimte: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub namespace: Option<String>,
    #[serde(rename = "objectId", alias = "objectid", deserialize_with = "loose_string")]
    pub object_id: Option<String>,
    #[serde(rename = "lokaleId", deserialize_with = "loose_string")]
    pub lokale_id: Option<String>,
    #[serde(rename = "versieId", deserialize_with = "loose_string")]
    pub versie_id: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub versie: Option<String>,
}

impl Identificator {
    pub fn object_id(&self) -> Option<&str> {
        first_text([self.object_id.as_ref(), self.lokale_id.as_ref()])
    }
}
