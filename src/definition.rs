//! JSON model definitions.
//!
//! A definition is the plain linear-scale description of a model with string
//! states and symbols:
//!
//! ```json
//! {
//!   "states": ["Fair", "Loaded"],
//!   "start": {"Fair": 0.9, "Loaded": 0.1},
//!   "trans": {"Fair": {"Fair": 1.0, "Loaded": 0.0},
//!             "Loaded": {"Fair": 0.0, "Loaded": 1.0}},
//!   "emission": {"Fair": {"H": 0.5, "T": 0.5},
//!                "Loaded": {"H": 1.0, "T": 0.0}}
//! }
//! ```
//!
//! Tables must have exactly this nesting. A number where a row is expected,
//! a row where a number is expected, or a key repeated within one object is
//! rejected while deserializing.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::Path;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::error::Category;

use crate::error::{HmmError, Result};
use crate::model::Model;

/// One-level table: state -> probability.
pub type ProbTable = BTreeMap<String, f64>;

/// Two-level table: state -> (state or symbol -> probability).
pub type NestedTable = BTreeMap<String, BTreeMap<String, f64>>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDefinition {
    /// Declared states, in tie-break order.
    pub states: Vec<String>,
    #[serde(deserialize_with = "unique_table")]
    pub start: ProbTable,
    #[serde(deserialize_with = "unique_nested")]
    pub trans: NestedTable,
    #[serde(default, deserialize_with = "unique_nested")]
    pub emission: NestedTable,
}

/// JSON object read into a map, failing on the first repeated key instead of
/// keeping the last value.
struct UniqueKeys<V>(BTreeMap<String, V>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for UniqueKeys<V> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeysVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for KeysVisitor<V> {
            type Value = UniqueKeys<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map with unique keys")
            }

            fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut map = BTreeMap::new();
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    if map.contains_key(&key) {
                        return Err(de::Error::custom(format!("duplicate key {key:?}")));
                    }
                    map.insert(key, value);
                }
                Ok(UniqueKeys(map))
            }
        }

        deserializer.deserialize_map(KeysVisitor(PhantomData))
    }
}

fn unique_table<'de, D>(deserializer: D) -> std::result::Result<ProbTable, D::Error>
where
    D: Deserializer<'de>,
{
    UniqueKeys::<f64>::deserialize(deserializer).map(|table| table.0)
}

fn unique_nested<'de, D>(deserializer: D) -> std::result::Result<NestedTable, D::Error>
where
    D: Deserializer<'de>,
{
    let outer = UniqueKeys::<UniqueKeys<f64>>::deserialize(deserializer)?;
    Ok(outer.0.into_iter().map(|(key, row)| (key, row.0)).collect())
}

impl ModelDefinition {
    /// Parse a definition from JSON text.
    ///
    /// Syntax errors surface as [`HmmError::Json`]; well-formed JSON whose
    /// shape does not match the table layout is [`HmmError::InvalidModel`].
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| match err.classify() {
            Category::Data => HmmError::InvalidModel(err.to_string()),
            _ => HmmError::Json(err),
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate and convert into a log-space [`Model`].
    pub fn into_model(self) -> Result<Model<String, String>> {
        Model::new(self.start, self.states, self.trans, self.emission)
    }

    /// Linear-scale definition of an existing model.
    pub fn from_model(model: &Model<String, String>) -> Self {
        let d = model.describe();
        let nest = |rows: Vec<(String, Vec<(String, f64)>)>| -> NestedTable {
            rows.into_iter()
                .map(|(k, row)| (k, row.into_iter().collect()))
                .collect()
        };
        Self {
            states: d.states,
            start: d.start.into_iter().collect(),
            trans: nest(d.trans),
            emission: nest(d.emission),
        }
    }
}

impl Model<String, String> {
    /// Inverse of [`ModelDefinition::into_model`].
    pub fn definition(&self) -> ModelDefinition {
        ModelDefinition::from_model(self)
    }
}
