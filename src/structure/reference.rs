//! Reference values: structural fingerprints of hierarchy nodes.
//!
//! The canonical byte stream fed to SHA-256 is:
//!
//! ```text
//! scalar : DOMAIN || 0x01 || kind_tag
//! object : DOMAIN || 0x02 || u64le(n) || { u64le(len(name)) || name || ref(child) }*  (sorted by name)
//! array  : DOMAIN || 0x03 || u64le(n) || { ref(child) }*                             (element order)
//! ```
//!
//! Every child contributes its own reference value, so the same rules apply
//! recursively at any depth.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ParityError, ParityResult};

use super::ScalarKind;

const DOMAIN_TAG: &[u8] = b"series-parity/reference-value/v1";
const TAG_SCALAR: u8 = 0x01;
const TAG_OBJECT: u8 = 0x02;
const TAG_ARRAY: u8 = 0x03;

/// Opaque, equality-comparable structural fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceValue([u8; 32]);

impl ReferenceValue {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(input: &str) -> ParityResult<Self> {
        let mut bytes = [0_u8; 32];
        hex::decode_to_slice(input, &mut bytes).map_err(|err| {
            ParityError::InvalidData(format!("invalid reference value `{input}`: {err}"))
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ReferenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ReferenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReferenceValue({})", &self.to_hex()[..16])
    }
}

impl TryFrom<String> for ReferenceValue {
    type Error = ParityError;

    fn try_from(value: String) -> ParityResult<Self> {
        Self::from_hex(&value)
    }
}

impl From<ReferenceValue> for String {
    fn from(value: ReferenceValue) -> Self {
        value.to_hex()
    }
}

fn finish(hasher: Sha256) -> ReferenceValue {
    ReferenceValue(hasher.finalize().into())
}

fn tagged(tag: u8) -> Sha256 {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_TAG);
    hasher.update([tag]);
    hasher
}

pub(crate) fn scalar_reference(kind: ScalarKind) -> ReferenceValue {
    let mut hasher = tagged(TAG_SCALAR);
    hasher.update([kind.tag()]);
    finish(hasher)
}

/// Child names must be unique; entries are sorted so key order never matters.
pub(crate) fn object_reference<'a>(
    children: impl IntoIterator<Item = (&'a str, ReferenceValue)>,
) -> ReferenceValue {
    let mut entries: Vec<(&str, ReferenceValue)> = children.into_iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut hasher = tagged(TAG_OBJECT);
    hasher.update((entries.len() as u64).to_le_bytes());
    for (name, reference) in entries {
        hasher.update((name.len() as u64).to_le_bytes());
        hasher.update(name.as_bytes());
        hasher.update(reference.as_bytes());
    }
    finish(hasher)
}

pub(crate) fn array_reference(children: impl IntoIterator<Item = ReferenceValue>) -> ReferenceValue {
    let children: Vec<ReferenceValue> = children.into_iter().collect();
    let mut hasher = tagged(TAG_ARRAY);
    hasher.update((children.len() as u64).to_le_bytes());
    for reference in &children {
        hasher.update(reference.as_bytes());
    }
    finish(hasher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_containers_and_scalars_are_pairwise_distinct() {
        let mut seen = vec![
            object_reference(std::iter::empty()),
            array_reference(std::iter::empty()),
        ];
        for kind in ScalarKind::ALL {
            seen.push(scalar_reference(kind));
        }
        for (i, a) in seen.iter().enumerate() {
            for b in &seen[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn name_length_prefix_prevents_concatenation_collisions() {
        let number = scalar_reference(ScalarKind::Number);
        let a = object_reference([("ab", number), ("c", number)]);
        let b = object_reference([("a", number), ("bc", number)]);
        assert_ne!(a, b);
    }

    #[test]
    fn hex_round_trip_preserves_value() {
        let value = scalar_reference(ScalarKind::Text);
        let parsed = ReferenceValue::from_hex(&value.to_hex()).expect("valid hex");
        assert_eq!(parsed, value);
        assert!(ReferenceValue::from_hex("zz").is_err());
    }
}
