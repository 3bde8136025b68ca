//! The JSON metadata bag shared by every entity that carries one.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An opaque JSON object, stored as TEXT in the backing store.
///
/// No schema is imposed beyond "valid JSON object" -- callers read and write
/// whatever keys suit their embedding application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(pub Map<String, Value>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses a metadata column value, defaulting to an empty object on
    /// malformed input rather than failing the whole row read.
    pub fn from_json_str(s: &str) -> Self {
        if s.is_empty() {
            return Self::default();
        }
        serde_json::from_str(s).unwrap_or_default()
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_roundtrip() {
        let m = Metadata::new();
        assert_eq!(m.to_json_string(), "{}");
        assert_eq!(Metadata::from_json_str("{}"), m);
    }

    #[test]
    fn malformed_defaults_empty() {
        let m = Metadata::from_json_str("not json");
        assert!(m.is_empty());
    }

    #[test]
    fn preserves_arbitrary_keys() {
        let m = Metadata::from_json_str(r#"{"source":"ethos","count":3}"#);
        assert_eq!(m.0.get("source").unwrap(), "ethos");
    }
}
