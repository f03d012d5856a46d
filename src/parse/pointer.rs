//! Same-document schema references.

use std::{borrow::Cow, fmt};

use serde::{Deserialize, Serialize};

/// A same-document reference to a schema, stored as the raw `$ref` string
/// (e.g. `#/components/schemas/Pet`).
///
/// The raw string is kept verbatim so that re-serializing a document
/// reproduces its references byte for byte, and so that lookups match the
/// exact-string keys used by [`crate::graph::SchemaGraph`]. External
/// references (`other.yaml#/...`, URLs) parse fine; they just never resolve.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct SchemaPointer(String);

impl SchemaPointer {
    /// Builds the canonical pointer for a named schema in `namespace`.
    pub fn schema(namespace: SchemaNamespace, name: &str) -> Self {
        Self(format!("{}{}", namespace.prefix(), escape(name)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extracts the final path segment, unescaped.
    pub fn name(&self) -> Cow<'_, str> {
        match self.0.rsplit_once('/') {
            Some((_, segment)) => unescape(segment),
            None => unescape(&self.0),
        }
    }

    /// Returns the schema name if this pointer addresses a named schema
    /// directly under `namespace`.
    pub fn schema_name(&self, namespace: SchemaNamespace) -> Option<Cow<'_, str>> {
        let rest = self.0.strip_prefix(namespace.prefix())?;
        if rest.is_empty() || rest.contains('/') {
            return None;
        }
        Some(unescape(rest))
    }
}

impl From<String> for SchemaPointer {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for SchemaPointer {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

impl fmt::Display for SchemaPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The document section that holds named schemas.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SchemaNamespace {
    /// `#/components/schemas/` (OpenAPI 3.x).
    Components,
    /// `#/definitions/` (OpenAPI 2.x).
    Definitions,
}

impl SchemaNamespace {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Components => "#/components/schemas/",
            Self::Definitions => "#/definitions/",
        }
    }
}

/// Escapes a schema name for use as a pointer segment.
fn escape(name: &str) -> Cow<'_, str> {
    if name.contains(['~', '/']) {
        Cow::Owned(name.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Unescapes a pointer segment. `~1` before `~0`, so `~01` comes out as the
/// literal `~1`.
fn unescape(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') {
        Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(segment)
    }
}
