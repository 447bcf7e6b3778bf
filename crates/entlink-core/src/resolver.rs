//! Entity resolution: from a chosen suggestion to a full concept record.

use crate::encyclopedia::EncyclopediaProbe;
use crate::error::{LinkerError, Result};
use crate::openalex::OpenAlexClient;
use crate::types::{ConceptRecord, PropertySet, PropertyValue, Suggestion};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// Top-level concept fields kept from the raw record.
pub const RETAINED_FIELDS: [&str; 4] = ["wikidata", "display_name", "description", "ids"];

/// Field whose entries are promoted to top-level properties.
const IDS_FIELD: &str = "ids";

/// Flatten a raw concept record into a property set.
///
/// Only [`RETAINED_FIELDS`] survive. Base fields are copied first, then every
/// entry of `ids` is layered on top, so an identifier always wins over a
/// top-level field of the same name. Nulls and nested objects are skipped.
pub fn flatten_concept(raw: &Map<String, Value>) -> PropertySet {
    let mut properties = PropertySet::new();

    for field in RETAINED_FIELDS.iter().filter(|f| **f != IDS_FIELD) {
        if let Some(value) = raw.get(*field).and_then(to_property_value) {
            properties.insert(field.to_string(), value);
        }
    }

    if let Some(Value::Object(ids)) = raw.get(IDS_FIELD) {
        for (namespace, value) in ids {
            match to_property_value(value) {
                Some(value) => {
                    properties.insert(namespace.clone(), value);
                }
                None => debug!("Skipping identifier {:?}: not a scalar or list", namespace),
            }
        }
    }

    properties
}

fn to_property_value(value: &Value) -> Option<PropertyValue> {
    match value {
        Value::Array(items) => Some(PropertyValue::List(
            items.iter().filter_map(scalar_text).collect(),
        )),
        other => scalar_text(other).map(PropertyValue::Scalar),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Resolves suggestions into concept records. Nothing is cached.
#[derive(Clone)]
pub struct EntityResolver {
    openalex: OpenAlexClient,
    encyclopedia: EncyclopediaProbe,
}

impl EntityResolver {
    /// Create a resolver
    pub fn new(openalex: OpenAlexClient, encyclopedia: EncyclopediaProbe) -> Self {
        Self {
            openalex,
            encyclopedia,
        }
    }

    /// Resolve `suggestion`.
    ///
    /// With an identity the concept record is fetched and flattened; without
    /// one a minimal record is synthesized from the encyclopedia probe. Any
    /// failure aborts the whole resolution.
    pub async fn resolve(&self, suggestion: &Suggestion) -> Result<ConceptRecord> {
        match suggestion.source_id() {
            Some(source_id) => self.resolve_concept(source_id).await,
            None => {
                info!(
                    "{:?} has no concept id, probing the encyclopedia",
                    suggestion.display_name
                );
                self.encyclopedia
                    .fallback_record(&suggestion.display_name)
                    .await
            }
        }
    }

    async fn resolve_concept(&self, source_id: &str) -> Result<ConceptRecord> {
        let raw = self.openalex.concept(source_id).await?;
        let properties = flatten_concept(&raw);

        let record = ConceptRecord::from_properties(properties).ok_or_else(|| {
            LinkerError::Parse(format!("concept {}: missing display_name", source_id))
        })?;

        info!(
            "Resolved {} to {:?} (wikidata {:?})",
            source_id, record.display_name, record.wikidata_entity_id
        );
        Ok(record)
    }
}
