use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ParityError, ParityResult};

/// Immutable key/value parameters shared by every stage of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    params: IndexMap<String, String>,
}

impl ExecutionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn require(&self, key: &str) -> ParityResult<&str> {
        self.get(key).ok_or_else(|| {
            ParityError::InvalidData(format!("missing execution context parameter `{key}`"))
        })
    }

    /// Typed lookup. Absent keys yield `Ok(None)`; unparsable values are errors.
    pub fn parse<T>(&self, key: &str) -> ParityResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|err| {
                    ParityError::InvalidData(format!(
                        "execution context parameter `{key}`=`{raw}` is invalid: {err}"
                    ))
                })
            })
            .transpose()
    }

    #[must_use]
    pub fn params(&self) -> &IndexMap<String, String> {
        &self.params
    }
}
