// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Protocol data types shared by requests, responses and the public API.
//!
//! - **NodeId / NodeRef**: node identifiers and loosely typed references
//! - **Variant / DataValue**: values with status and timestamps
//! - **ExtensionObject**: server-defined structures awaiting resolution
//! - Enumerations (attribute ids, browse direction, node class, ...)

mod node_id;
mod variant;

pub use node_id::{resolve_all, NodeId, NodeIdentifier, NodeRef};
pub use variant::{DataValue, ExtensionBody, ExtensionObject, Structure, Variant};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::status::StatusCode;

// =============================================================================
// QualifiedName / LocalizedText
// =============================================================================

/// A name qualified by a namespace index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct QualifiedName {
    /// Namespace index.
    pub namespace_index: u16,
    /// Name.
    pub name: String,
}

impl QualifiedName {
    /// Creates a qualified name.
    pub fn new(namespace_index: u16, name: impl Into<String>) -> Self {
        Self {
            namespace_index,
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_index == 0 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}:{}", self.namespace_index, self.name)
        }
    }
}

/// Human readable text with an optional locale.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalizedText {
    /// Locale, e.g. `en-US`.
    pub locale: Option<String>,
    /// Text.
    pub text: String,
}

impl LocalizedText {
    /// Creates a localized text without locale.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            locale: None,
            text: text.into(),
        }
    }
}

impl fmt::Display for LocalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

// =============================================================================
// DiagnosticInfo
// =============================================================================

/// Diagnostics a server may attach to a service or operation result.
///
/// String fields are indices into the response's string table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiagnosticInfo {
    /// Symbolic id index.
    pub symbolic_id: Option<i32>,
    /// Namespace URI index.
    pub namespace_uri: Option<i32>,
    /// Locale index.
    pub locale: Option<i32>,
    /// Localized text index.
    pub localized_text: Option<i32>,
    /// Vendor specific diagnostic text.
    pub additional_info: Option<String>,
    /// Status code from an underlying system.
    pub inner_status_code: Option<StatusCode>,
    /// Nested diagnostics.
    pub inner_diagnostic_info: Option<Box<DiagnosticInfo>>,
}

impl DiagnosticInfo {
    /// Resolves the localized text against a response string table.
    pub fn text<'a>(&self, string_table: &'a [String]) -> Option<&'a str> {
        let index = usize::try_from(self.localized_text?).ok()?;
        string_table.get(index).map(String::as_str)
    }
}

// =============================================================================
// Enumerations
// =============================================================================

/// OPC UA attribute IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttributeId {
    /// Node ID attribute.
    NodeId,
    /// Node class attribute.
    NodeClass,
    /// Browse name attribute.
    BrowseName,
    /// Display name attribute.
    DisplayName,
    /// Description attribute.
    Description,
    /// Value attribute.
    #[default]
    Value,
    /// Data type attribute.
    DataType,
    /// Value rank attribute.
    ValueRank,
    /// Array dimensions attribute.
    ArrayDimensions,
    /// Access level attribute.
    AccessLevel,
    /// User access level attribute.
    UserAccessLevel,
    /// Minimum sampling interval attribute.
    MinimumSamplingInterval,
    /// Historizing attribute.
    Historizing,
    /// Executable attribute.
    Executable,
    /// Event notifier attribute.
    EventNotifier,
}

impl AttributeId {
    /// Returns the OPC UA numeric value.
    pub const fn value(&self) -> u32 {
        match self {
            Self::NodeId => 1,
            Self::NodeClass => 2,
            Self::BrowseName => 3,
            Self::DisplayName => 4,
            Self::Description => 5,
            Self::EventNotifier => 12,
            Self::Value => 13,
            Self::DataType => 14,
            Self::ValueRank => 15,
            Self::ArrayDimensions => 16,
            Self::AccessLevel => 17,
            Self::UserAccessLevel => 18,
            Self::MinimumSamplingInterval => 19,
            Self::Historizing => 20,
            Self::Executable => 21,
        }
    }
}

/// OPC UA browse direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BrowseDirection {
    /// Browse forward references.
    #[default]
    Forward,
    /// Browse inverse references.
    Inverse,
    /// Browse both forward and inverse references.
    Both,
}

/// OPC UA node class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeClass {
    /// Unspecified.
    #[default]
    Unspecified,
    /// Object node.
    Object,
    /// Variable node.
    Variable,
    /// Method node.
    Method,
    /// Object type node.
    ObjectType,
    /// Variable type node.
    VariableType,
    /// Reference type node.
    ReferenceType,
    /// Data type node.
    DataType,
    /// View node.
    View,
}

/// Which timestamps the server should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimestampsToReturn {
    /// Source timestamp only.
    Source,
    /// Server timestamp only.
    Server,
    /// Both timestamps.
    #[default]
    Both,
    /// No timestamps.
    Neither,
}

/// OPC UA monitoring mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringMode {
    /// Monitoring disabled.
    Disabled,
    /// Sampling enabled, reporting disabled.
    Sampling,
    /// Sampling and reporting enabled.
    #[default]
    Reporting,
}

/// Server state as reported by `Server_ServerStatus_State`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerState {
    /// Running normally.
    Running,
    /// Failed.
    Failed,
    /// No configuration.
    NoConfiguration,
    /// Suspended.
    Suspended,
    /// Shutting down.
    Shutdown,
    /// Under test.
    Test,
    /// Communication fault.
    CommunicationFault,
    /// Unknown.
    Unknown,
}

impl ServerState {
    /// Creates from the OPC UA enumeration value.
    pub fn from_value(value: i64) -> Self {
        match value {
            0 => Self::Running,
            1 => Self::Failed,
            2 => Self::NoConfiguration,
            3 => Self::Suspended,
            4 => Self::Shutdown,
            5 => Self::Test,
            6 => Self::CommunicationFault,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "Running",
            Self::Failed => "Failed",
            Self::NoConfiguration => "NoConfiguration",
            Self::Suspended => "Suspended",
            Self::Shutdown => "Shutdown",
            Self::Test => "Test",
            Self::CommunicationFault => "CommunicationFault",
            Self::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name_display() {
        assert_eq!(QualifiedName::new(0, "Server").to_string(), "Server");
        assert_eq!(QualifiedName::new(2, "Motor").to_string(), "2:Motor");
    }

    #[test]
    fn test_diagnostic_text_lookup() {
        let table = vec!["first".to_string(), "second".to_string()];
        let diag = DiagnosticInfo {
            localized_text: Some(1),
            ..Default::default()
        };
        assert_eq!(diag.text(&table), Some("second"));
        assert_eq!(DiagnosticInfo::default().text(&table), None);
    }

    #[test]
    fn test_server_state_from_value() {
        assert_eq!(ServerState::from_value(0), ServerState::Running);
        assert_eq!(ServerState::from_value(99), ServerState::Unknown);
    }
}
