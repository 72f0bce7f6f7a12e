//! Typed document metadata
//!
//! Metadata is a map from namespaced keys to a small tagged union of values.
//! Keys take the form `namespace.name`, where the namespace is one of:
//!
//! | namespace | holds                                               |
//! |-----------|-----------------------------------------------------|
//! | `doc`     | authoring facts, e.g. `doc.language`, `doc.tags`    |
//! | `chain`   | canvas/chain facts, e.g. `chain.position`           |
//! | `ext`     | values owned by integrations, e.g. `ext.sync.etag`  |

use crate::error::EventError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Ordered metadata map; ordering keeps replay output bit-identical
pub type Metadata = BTreeMap<MetadataKey, MetadataValue>;

/// Key namespaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetadataNamespace {
    /// Authoring facts
    Doc,
    /// Canvas/chain placement
    Chain,
    /// Integrations
    Ext,
}

impl MetadataNamespace {
    /// Prefix used in keys
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Doc => "doc",
            Self::Chain => "chain",
            Self::Ext => "ext",
        }
    }

    fn parse(prefix: &str) -> Option<Self> {
        match prefix {
            "doc" => Some(Self::Doc),
            "chain" => Some(Self::Chain),
            "ext" => Some(Self::Ext),
            _ => None,
        }
    }
}

/// Validated `namespace.name` key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MetadataKey {
    namespace: MetadataNamespace,
    name: String,
}

impl MetadataKey {
    /// Build a key from its parts
    ///
    /// # Errors
    /// Returns [`EventError::InvalidMetadataKey`] if `name` is empty or contains
    /// characters outside `[A-Za-z0-9_.-]`
    pub fn new(namespace: MetadataNamespace, name: &str) -> Result<Self, EventError> {
        validate_name(name).map_err(|reason| EventError::InvalidMetadataKey {
            key: format!("{}.{name}", namespace.as_str()),
            reason,
        })?;
        Ok(Self {
            namespace,
            name: name.to_string(),
        })
    }

    /// Namespace
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> MetadataNamespace {
        self.namespace
    }

    /// Name inside the namespace
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("name is empty");
    }
    if name
        .chars()
        .any(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err("name may only contain ASCII letters, digits, '_', '-' and '.'");
    }
    Ok(())
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace.as_str(), self.name)
    }
}

impl FromStr for MetadataKey {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, name) = s.split_once('.').ok_or_else(|| EventError::InvalidMetadataKey {
            key: s.to_string(),
            reason: "expected 'namespace.name'",
        })?;
        let namespace =
            MetadataNamespace::parse(prefix).ok_or_else(|| EventError::InvalidMetadataKey {
                key: s.to_string(),
                reason: "namespace must be one of doc, chain, ext",
            })?;
        Self::new(namespace, name)
    }
}

impl TryFrom<String> for MetadataKey {
    type Error = EventError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MetadataKey> for String {
    fn from(key: MetadataKey) -> Self {
        key.to_string()
    }
}

/// Metadata value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum MetadataValue {
    /// Free text
    Text(String),
    /// Whole number
    Integer(i64),
    /// Boolean flag
    Flag(bool),
    /// List of strings (tags, labels)
    List(Vec<String>),
}
