//! Domain types: suggestions, property values and resolved concept records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hint attached to the synthetic suggestion offered when a search has no hits.
pub const CREATE_EMPTY_HINT: &str = "Create empty note";

/// Front matter key holding the concept name.
pub const DISPLAY_NAME_KEY: &str = "display_name";
/// Front matter key holding the concept description.
pub const DESCRIPTION_KEY: &str = "description";
/// Front matter key holding the short Wikidata entity id (`Q21198`).
pub const WIKIDATA_ENTITY_ID_KEY: &str = "wikidata_entity_id";

/// Database identity of a suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Short concept id (`C41008148`)
    pub source_id: String,
}

/// One autocomplete result offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Concept name
    pub display_name: String,
    /// Short context shown beneath the name
    pub hint: String,
    /// Absent for unmatched terms; resolution then falls back to the encyclopedia probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
}

impl Suggestion {
    /// A suggestion backed by a database concept
    pub fn with_identity(
        display_name: impl Into<String>,
        hint: impl Into<String>,
        source_id: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            hint: hint.into(),
            identity: Some(Identity {
                source_id: source_id.into(),
            }),
        }
    }

    /// The synthetic "create empty note" suggestion for an unmatched query
    pub fn create_empty(query: impl Into<String>) -> Self {
        Self {
            display_name: query.into(),
            hint: CREATE_EMPTY_HINT.to_string(),
            identity: None,
        }
    }

    /// Source id, if the suggestion has a database identity
    pub fn source_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.source_id.as_str())
    }
}

/// A front matter value: a scalar or a list of scalars, never a nested object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Single value
    Scalar(String),
    /// List of values
    List(Vec<String>),
}

impl PropertyValue {
    /// Scalar text, if this is a scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::List(_) => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Scalar(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Scalar(s)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(v: Vec<String>) -> Self {
        Self::List(v)
    }
}

impl From<PropertyValue> for serde_yaml::Value {
    fn from(value: PropertyValue) -> Self {
        match value {
            PropertyValue::Scalar(s) => serde_yaml::Value::String(s),
            PropertyValue::List(items) => serde_yaml::Value::Sequence(
                items.into_iter().map(serde_yaml::Value::String).collect(),
            ),
        }
    }
}

/// Flat property map written into front matter.
pub type PropertySet = BTreeMap<String, PropertyValue>;

/// A resolved concept, ready to be merged into a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptRecord {
    /// Concept name
    pub display_name: String,
    /// Concept description; empty is a valid value
    pub description: String,
    /// Identifier namespace (`openalex`, `wikidata`, `wikipedia`, `mag`, ...) to value
    pub identifiers: BTreeMap<String, PropertyValue>,
    /// Short Wikidata entity id, empty when unknown
    pub wikidata_entity_id: String,
}

impl ConceptRecord {
    /// Build a record from an already-flattened property set.
    ///
    /// `display_name` and `description` are lifted out; every other key is an
    /// identifier. The Wikidata entity id is derived from the `wikidata` value.
    pub fn from_properties(mut properties: PropertySet) -> Option<Self> {
        let display_name = match properties.remove(DISPLAY_NAME_KEY)? {
            PropertyValue::Scalar(s) => s,
            PropertyValue::List(_) => return None,
        };
        let description = match properties.remove(DESCRIPTION_KEY) {
            Some(PropertyValue::Scalar(s)) => s,
            _ => String::new(),
        };
        properties.remove(WIKIDATA_ENTITY_ID_KEY);

        let wikidata_entity_id = properties
            .get("wikidata")
            .and_then(PropertyValue::as_str)
            .map(|url| short_id(url).to_string())
            .unwrap_or_default();

        Some(Self {
            display_name,
            description,
            identifiers: properties,
            wikidata_entity_id,
        })
    }

    /// Flatten into the property set written to front matter
    pub fn to_property_set(&self) -> PropertySet {
        let mut props = self.identifiers.clone();
        props.insert(
            DISPLAY_NAME_KEY.to_string(),
            PropertyValue::Scalar(self.display_name.clone()),
        );
        props.insert(
            DESCRIPTION_KEY.to_string(),
            PropertyValue::Scalar(self.description.clone()),
        );
        props.insert(
            WIKIDATA_ENTITY_ID_KEY.to_string(),
            PropertyValue::Scalar(self.wikidata_entity_id.clone()),
        );
        props
    }
}

/// Short id from a URL-like identifier: everything after the last `/`.
///
/// `https://openalex.org/C12345` yields `C12345`; a string without `/` is
/// returned unchanged.
pub fn short_id(identifier: &str) -> &str {
    match identifier.rfind('/') {
        Some(pos) => &identifier[pos + 1..],
        None => identifier,
    }
}
