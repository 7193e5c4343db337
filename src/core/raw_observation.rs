use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::FieldValue;

/// Uninterpreted field/value extraction from a data source.
///
/// Observations are assembled with the `with_*` builders and are read-only
/// afterwards; normalization stages produce new observations instead of
/// editing existing ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    source_id: String,
    group: Option<String>,
    fields: IndexMap<String, FieldValue>,
    raw_timestamp: Option<String>,
    provenance: IndexMap<String, String>,
}

impl RawObservation {
    #[must_use]
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            group: None,
            fields: IndexMap::new(),
            raw_timestamp: None,
            provenance: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn without_field(mut self, name: &str) -> Self {
        self.fields.shift_remove(name);
        self
    }

    #[must_use]
    pub fn with_raw_timestamp(mut self, raw_timestamp: impl Into<String>) -> Self {
        self.raw_timestamp = Some(raw_timestamp.into());
        self
    }

    #[must_use]
    pub fn with_provenance(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.provenance.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    #[must_use]
    pub fn fields(&self) -> &IndexMap<String, FieldValue> {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn raw_timestamp(&self) -> Option<&str> {
        self.raw_timestamp.as_deref()
    }

    #[must_use]
    pub fn provenance(&self) -> &IndexMap<String, String> {
        &self.provenance
    }

    /// Series key used to bucket observations: `source_id` or `source_id/group`.
    #[must_use]
    pub fn series_key(&self) -> String {
        match &self.group {
            Some(group) => format!("{}/{group}", self.source_id),
            None => self.source_id.clone(),
        }
    }
}
