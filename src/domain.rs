use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum CatalogKind {
    DataElements,
    CategoryOptionCombos,
    OrganisationUnits,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 3] = [
        CatalogKind::DataElements,
        CatalogKind::CategoryOptionCombos,
        CatalogKind::OrganisationUnits,
    ];

    pub fn endpoint(&self) -> &'static str {
        match self {
            CatalogKind::DataElements => "dataElements",
            CatalogKind::CategoryOptionCombos => "categoryOptionCombos",
            CatalogKind::OrganisationUnits => "organisationUnits",
        }
    }

    /// The response wraps the entries in an array keyed by the resource name.
    pub fn response_key(&self) -> &'static str {
        self.endpoint()
    }

    pub fn label(&self) -> &'static str {
        match self {
            CatalogKind::DataElements => "data elements",
            CatalogKind::CategoryOptionCombos => "category option combos",
            CatalogKind::OrganisationUnits => "organisation units",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One raw record of a data value set, identifiers unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValue {
    #[serde(default)]
    pub data_element: Option<String>,
    #[serde(default)]
    pub category_option_combo: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub period: String,
    #[serde(default)]
    pub org_unit: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub value: String,
}

/// Accepts whatever scalar the server sent: `null` becomes empty, numbers and
/// booleans keep their JSON text.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    })
}

/// When a lookup on a catalog cache triggers a full catalog fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefetchPolicy {
    /// An empty table counts as unpopulated, so an empty server catalog is
    /// fetched again on every lookup.
    #[default]
    WhileEmpty,
    /// Fetch at most until the first success, even when the catalog is empty.
    Once,
}
