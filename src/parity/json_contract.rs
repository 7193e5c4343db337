use serde::{Deserialize, Serialize};

use crate::error::{ParityError, ParityResult};

use super::ParityVerdict;

pub const PARITY_VERDICT_JSON_SCHEMA_V1: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParityVerdictJsonContractV1 {
    pub schema_version: u32,
    pub verdict: ParityVerdict,
}

impl ParityVerdict {
    pub fn to_json_pretty(&self) -> ParityResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ParityError::Serialization(format!("failed to serialize parity verdict: {e}"))
        })
    }

    pub fn to_json_contract_v1_pretty(&self) -> ParityResult<String> {
        let payload = ParityVerdictJsonContractV1 {
            schema_version: PARITY_VERDICT_JSON_SCHEMA_V1,
            verdict: self.clone(),
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            ParityError::Serialization(format!(
                "failed to serialize parity verdict contract v1: {e}"
            ))
        })
    }

    /// Accepts either a bare verdict or a versioned contract payload.
    pub fn from_json_compat_str(input: &str) -> ParityResult<Self> {
        if let Ok(verdict) = serde_json::from_str::<ParityVerdict>(input) {
            return Ok(verdict);
        }
        let payload: ParityVerdictJsonContractV1 = serde_json::from_str(input).map_err(|e| {
            ParityError::Serialization(format!("failed to parse parity verdict json payload: {e}"))
        })?;
        if payload.schema_version != PARITY_VERDICT_JSON_SCHEMA_V1 {
            return Err(ParityError::Serialization(format!(
                "unsupported parity verdict schema version: {}",
                payload.schema_version
            )));
        }
        Ok(payload.verdict)
    }
}
