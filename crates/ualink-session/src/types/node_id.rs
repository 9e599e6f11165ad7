// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Node identifiers and loosely typed node references.
//!
//! Callers name nodes in several ways: a typed [`NodeId`], the OPC UA string
//! form (`"ns=2;s=Temperature"`, `"i=85"`), or a well-known alias such as
//! `"ObjectsFolder"`. [`NodeRef`] keeps whatever the caller passed until the
//! service layer normalizes it, so a malformed string surfaces as a
//! configuration error from the operation rather than a panic in a `From`
//! conversion.
//!
//! # Examples
//!
//! ```
//! use ualink_session::types::{NodeId, NodeRef};
//!
//! let parsed: NodeId = "ns=2;s=Temperature".parse().unwrap();
//! assert_eq!(parsed, NodeId::string(2, "Temperature"));
//!
//! let alias = NodeRef::from("ObjectsFolder").resolve().unwrap();
//! assert_eq!(alias, NodeId::OBJECTS_FOLDER);
//! ```

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConfigurationError, UaError, UaResult};

// =============================================================================
// NodeId
// =============================================================================

/// OPC UA Node Identifier.
///
/// A NodeId consists of a namespace index and an identifier which can be
/// numeric, string, GUID, or opaque (byte string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    /// Namespace index (0 = OPC UA standard namespace).
    pub namespace_index: u16,

    /// The node identifier.
    pub identifier: NodeIdentifier,
}

macro_rules! well_known_nodes {
    ($($(#[$meta:meta])* $name:ident = $value:literal, $alias:literal;)*) => {
        impl NodeId {
            $(
                $(#[$meta])*
                pub const $name: NodeId = NodeId {
                    namespace_index: 0,
                    identifier: NodeIdentifier::Numeric($value),
                };
            )*

            /// Looks up a well-known alias such as `"ObjectsFolder"`.
            pub fn from_alias(alias: &str) -> Option<NodeId> {
                match alias {
                    $($alias => Some(Self::$name),)*
                    _ => None,
                }
            }
        }
    };
}

well_known_nodes! {
    /// References reference type (i=31).
    REFERENCES = 31, "References";
    /// HierarchicalReferences reference type (i=33).
    HIERARCHICAL_REFERENCES = 33, "HierarchicalReferences";
    /// Organizes reference type (i=35).
    ORGANIZES = 35, "Organizes";
    /// HasTypeDefinition reference type (i=40).
    HAS_TYPE_DEFINITION = 40, "HasTypeDefinition";
    /// HasSubtype reference type (i=45).
    HAS_SUBTYPE = 45, "HasSubtype";
    /// HasProperty reference type (i=46).
    HAS_PROPERTY = 46, "HasProperty";
    /// HasComponent reference type (i=47).
    HAS_COMPONENT = 47, "HasComponent";
    /// Root folder node (i=84).
    ROOT_FOLDER = 84, "RootFolder";
    /// Objects folder node (i=85).
    OBJECTS_FOLDER = 85, "ObjectsFolder";
    /// Types folder node (i=86).
    TYPES_FOLDER = 86, "TypesFolder";
    /// Views folder node (i=87).
    VIEWS_FOLDER = 87, "ViewsFolder";
    /// Default binary encoding of the Argument structure (i=298).
    ARGUMENT_ENCODING_DEFAULT_BINARY = 298, "Argument_Encoding_DefaultBinary";
    /// Server node (i=2253).
    SERVER = 2253, "Server";
    /// Server namespace array (i=2255).
    SERVER_NAMESPACE_ARRAY = 2255, "Server_NamespaceArray";
    /// Server status (i=2256).
    SERVER_SERVER_STATUS = 2256, "Server_ServerStatus";
    /// Server status state (i=2259).
    SERVER_SERVER_STATUS_STATE = 2259, "Server_ServerStatus_State";
    /// Server GetMonitoredItems method (i=11492).
    SERVER_GET_MONITORED_ITEMS = 11492, "Server_GetMonitoredItems";
}

impl NodeId {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Creates a numeric node ID.
    #[inline]
    pub fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// Creates a string node ID.
    #[inline]
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::String(value.into()),
        }
    }

    /// Creates a GUID node ID.
    #[inline]
    pub fn guid(namespace_index: u16, value: Uuid) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Guid(value),
        }
    }

    /// Creates an opaque (byte string) node ID.
    #[inline]
    pub fn opaque(namespace_index: u16, value: Vec<u8>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Opaque(value),
        }
    }

    /// Returns the null node ID (ns=0, i=0).
    #[inline]
    pub const fn null() -> Self {
        Self {
            namespace_index: 0,
            identifier: NodeIdentifier::Numeric(0),
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns `true` if this is a null node ID (ns=0, i=0).
    #[inline]
    pub fn is_null(&self) -> bool {
        self.namespace_index == 0 && matches!(self.identifier, NodeIdentifier::Numeric(0))
    }

    /// Returns the numeric value if this is a numeric identifier.
    #[inline]
    pub fn as_numeric(&self) -> Option<u32> {
        match &self.identifier {
            NodeIdentifier::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string value if this is a string identifier.
    #[inline]
    pub fn as_string(&self) -> Option<&str> {
        match &self.identifier {
            NodeIdentifier::String(v) => Some(v),
            _ => None,
        }
    }

    /// Converts to the OPC UA string format: `ns=<namespace>;{i|s|g|b}=<identifier>`.
    pub fn to_opc_string(&self) -> String {
        if self.namespace_index == 0 {
            self.identifier.to_string()
        } else {
            format!("ns={};{}", self.namespace_index, self.identifier)
        }
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_opc_string())
    }
}

impl FromStr for NodeId {
    type Err = UaError;

    /// Parses a NodeId from OPC UA string format.
    ///
    /// Supported formats:
    /// - `ns=2;i=1001` (numeric)
    /// - `ns=2;s=MyNode` (string)
    /// - `ns=2;g=550e8400-e29b-41d4-a716-446655440000` (GUID)
    /// - `ns=2;b=SGVsbG8=` (opaque, base64 encoded)
    /// - `i=1001`, `s=MyNode` (namespace 0)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = |reason: String| {
            UaError::configuration(ConfigurationError::invalid_node_id(s, reason))
        };

        let (namespace_index, identifier_part) = match s.strip_prefix("ns=") {
            Some(rest) => {
                let (ns_str, id) = rest
                    .split_once(';')
                    .ok_or_else(|| invalid("Missing identifier after namespace".into()))?;
                let ns: u16 = ns_str
                    .parse()
                    .map_err(|_| invalid("Invalid namespace index".into()))?;
                (ns, id)
            }
            None => (0, s),
        };

        let identifier = if let Some(id) = identifier_part.strip_prefix("i=") {
            let value: u32 = id
                .parse()
                .map_err(|_| invalid("Invalid numeric identifier".into()))?;
            NodeIdentifier::Numeric(value)
        } else if let Some(id) = identifier_part.strip_prefix("s=") {
            NodeIdentifier::String(id.to_string())
        } else if let Some(id) = identifier_part.strip_prefix("g=") {
            let uuid = Uuid::parse_str(id).map_err(|e| invalid(format!("Invalid GUID: {}", e)))?;
            NodeIdentifier::Guid(uuid)
        } else if let Some(id) = identifier_part.strip_prefix("b=") {
            let bytes = BASE64
                .decode(id)
                .map_err(|e| invalid(format!("Invalid base64: {}", e)))?;
            NodeIdentifier::Opaque(bytes)
        } else {
            return Err(invalid(
                "Unknown identifier type. Expected i=, s=, g=, b= or a well-known alias".into(),
            ));
        };

        Ok(Self {
            namespace_index,
            identifier,
        })
    }
}

// =============================================================================
// NodeIdentifier
// =============================================================================

/// OPC UA node identifier types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum NodeIdentifier {
    /// Numeric identifier.
    Numeric(u32),
    /// String identifier.
    String(String),
    /// GUID identifier.
    Guid(Uuid),
    /// Opaque identifier (application-specific byte array).
    Opaque(Vec<u8>),
}

impl fmt::Display for NodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "i={}", v),
            Self::String(v) => write!(f, "s={}", v),
            Self::Guid(v) => write!(f, "g={}", v),
            Self::Opaque(v) => write!(f, "b={}", BASE64.encode(v)),
        }
    }
}

// =============================================================================
// NodeRef
// =============================================================================

/// A node reference as the caller supplied it.
///
/// Text is resolved lazily by [`NodeRef::resolve`]: aliases first, then the
/// OPC UA string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeRef {
    /// An already typed identifier.
    Id(NodeId),
    /// Text still to be parsed.
    Text(String),
}

impl NodeRef {
    /// Resolves this reference to a canonical [`NodeId`].
    pub fn resolve(&self) -> UaResult<NodeId> {
        match self {
            Self::Id(id) => Ok(id.clone()),
            Self::Text(text) => {
                let text = text.trim();
                match NodeId::from_alias(text) {
                    Some(id) => Ok(id),
                    None => text.parse(),
                }
            }
        }
    }

    /// Resolves and consumes this reference.
    pub fn into_node_id(self) -> UaResult<NodeId> {
        match self {
            Self::Id(id) => Ok(id),
            text => text.resolve(),
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<NodeId> for NodeRef {
    fn from(id: NodeId) -> Self {
        Self::Id(id)
    }
}

impl From<&NodeId> for NodeRef {
    fn from(id: &NodeId) -> Self {
        Self::Id(id.clone())
    }
}

impl From<&str> for NodeRef {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for NodeRef {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&String> for NodeRef {
    fn from(text: &String) -> Self {
        Self::Text(text.clone())
    }
}

/// Resolves every reference, failing on the first invalid one.
pub fn resolve_all<I>(refs: I) -> UaResult<Vec<NodeId>>
where
    I: IntoIterator,
    I::Item: Into<NodeRef>,
{
    refs.into_iter().map(|r| r.into().into_node_id()).collect()
}

// =============================================================================
// Tests
// =============================================================================
