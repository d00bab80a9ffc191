//! Serde adapter for maps keyed by [`Coords`].
//!
//! JSON object keys must be strings, so coordinate-keyed maps are written as a
//! sequence of `[coords, value]` pairs instead. Use with
//! `#[serde(with = "hexfield::coord_map")]`.

use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::coords::Coords;

/// Serialize a coordinate-keyed map as a list of pairs.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize<S, V>(map: &BTreeMap<Coords, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    serializer.collect_seq(map.iter())
}

/// Deserialize a list of pairs into a coordinate-keyed map.
///
/// # Errors
///
/// Propagates deserializer errors.
pub fn deserialize<'de, D, V>(deserializer: D) -> Result<BTreeMap<Coords, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    let pairs = Vec::<(Coords, V)>::deserialize(deserializer)?;
    Ok(pairs.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "crate::coord_map")]
        map: BTreeMap<Coords, u32>,
    }

    #[test]
    fn test_pairs_roundtrip_through_json() {
        let mut map = BTreeMap::new();
        map.insert(Coords::new(3, 4), 7);
        map.insert(Coords::new(0, 1), 2);
        let holder = Holder { map };

        let json = serde_json::to_string(&holder).unwrap();
        assert!(json.starts_with(r#"{"map":[["#));
        let back: Holder = serde_json::from_str(&json).unwrap();
        assert_eq!(back, holder);
    }
}
