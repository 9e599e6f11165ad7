// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Values carried by requests and responses.
//!
//! [`Variant`] is the tagged value union, [`DataValue`] adds status and
//! timestamps, and [`ExtensionObject`] carries server-defined structures.
//! An extension object arrives with an [`ExtensionBody::Binary`] body; the
//! datatype resolver replaces it with [`ExtensionBody::Decoded`] before the
//! value reaches the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{LocalizedText, NodeId, QualifiedName};
use crate::status::StatusCode;

// =============================================================================
// Variant
// =============================================================================

/// An OPC UA variant value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Variant {
    /// No value.
    #[default]
    Empty,
    /// Boolean.
    Boolean(bool),
    /// Signed byte.
    SByte(i8),
    /// Unsigned byte.
    Byte(u8),
    /// 16-bit signed integer.
    Int16(i16),
    /// 16-bit unsigned integer.
    UInt16(u16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 32-bit unsigned integer.
    UInt32(u32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit unsigned integer.
    UInt64(u64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// UTC timestamp.
    DateTime(DateTime<Utc>),
    /// GUID.
    Guid(Uuid),
    /// Byte string.
    ByteString(Vec<u8>),
    /// Node identifier.
    NodeId(Box<NodeId>),
    /// Status code.
    StatusCode(StatusCode),
    /// Qualified name.
    QualifiedName(Box<QualifiedName>),
    /// Localized text.
    LocalizedText(Box<LocalizedText>),
    /// Server-defined structure.
    ExtensionObject(Box<ExtensionObject>),
    /// One-dimensional array.
    Array(Vec<Variant>),
}

impl Variant {
    /// Returns `true` if this is the empty variant.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the type name of this variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Boolean(_) => "Boolean",
            Self::SByte(_) => "SByte",
            Self::Byte(_) => "Byte",
            Self::Int16(_) => "Int16",
            Self::UInt16(_) => "UInt16",
            Self::Int32(_) => "Int32",
            Self::UInt32(_) => "UInt32",
            Self::Int64(_) => "Int64",
            Self::UInt64(_) => "UInt64",
            Self::Float(_) => "Float",
            Self::Double(_) => "Double",
            Self::String(_) => "String",
            Self::DateTime(_) => "DateTime",
            Self::Guid(_) => "Guid",
            Self::ByteString(_) => "ByteString",
            Self::NodeId(_) => "NodeId",
            Self::StatusCode(_) => "StatusCode",
            Self::QualifiedName(_) => "QualifiedName",
            Self::LocalizedText(_) => "LocalizedText",
            Self::ExtensionObject(_) => "ExtensionObject",
            Self::Array(_) => "Array",
        }
    }

    /// Returns the value as i64 when it is an integer type.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::SByte(v) => Some(*v as i64),
            Self::Byte(v) => Some(*v as i64),
            Self::Int16(v) => Some(*v as i64),
            Self::UInt16(v) => Some(*v as i64),
            Self::Int32(v) => Some(*v as i64),
            Self::UInt32(v) => Some(*v as i64),
            Self::Int64(v) => Some(*v),
            Self::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Returns the value as u32 when it fits.
    pub fn as_u32(&self) -> Option<u32> {
        self.as_i64().and_then(|v| u32::try_from(v).ok())
    }

    /// Returns the string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the array elements.
    pub fn as_array(&self) -> Option<&[Variant]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns `true` if this value, or any array element, is an extension
    /// object whose body has not been decoded yet.
    pub fn has_opaque(&self) -> bool {
        match self {
            Self::ExtensionObject(obj) => obj.is_opaque(),
            Self::Array(items) => items.iter().any(Variant::has_opaque),
            _ => false,
        }
    }

    /// Calls `f` for every undecoded extension object, depth first.
    pub fn for_each_opaque_mut<E>(
        &mut self,
        f: &mut impl FnMut(&mut ExtensionObject) -> Result<(), E>,
    ) -> Result<(), E> {
        match self {
            Self::ExtensionObject(obj) if obj.is_opaque() => f(&mut **obj),
            Self::Array(items) => {
                for item in items {
                    item.for_each_opaque_mut(f)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

macro_rules! variant_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Variant {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

variant_from! {
    bool => Boolean,
    i8 => SByte,
    u8 => Byte,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
    String => String,
    DateTime<Utc> => DateTime,
    Uuid => Guid,
    StatusCode => StatusCode,
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<NodeId> for Variant {
    fn from(value: NodeId) -> Self {
        Self::NodeId(Box::new(value))
    }
}

impl From<ExtensionObject> for Variant {
    fn from(value: ExtensionObject) -> Self {
        Self::ExtensionObject(Box::new(value))
    }
}

impl<T: Into<Variant>> From<Vec<T>> for Variant {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// DataValue
// =============================================================================

/// A value with its status and timestamps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataValue {
    /// The value, if any.
    pub value: Option<Variant>,
    /// Quality of the value; `None` means Good.
    pub status: Option<StatusCode>,
    /// Source timestamp.
    pub source_timestamp: Option<DateTime<Utc>>,
    /// Source timestamp sub-millisecond part.
    pub source_picoseconds: Option<u16>,
    /// Server timestamp.
    pub server_timestamp: Option<DateTime<Utc>>,
    /// Server timestamp sub-millisecond part.
    pub server_picoseconds: Option<u16>,
}

impl DataValue {
    /// Creates a good data value without timestamps.
    pub fn new(value: impl Into<Variant>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    /// Creates a data value with a status and no value.
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Sets the source timestamp.
    pub fn with_source_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.source_timestamp = Some(timestamp);
        self
    }

    /// Returns the effective status (Good when omitted).
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::Good)
    }

    /// Returns `true` if the status is good.
    pub fn is_good(&self) -> bool {
        self.status().is_good()
    }
}

// =============================================================================
// ExtensionObject
// =============================================================================

/// A server-defined structure value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionObject {
    /// The encoding id (for binary bodies, the DefaultBinary node).
    pub type_id: NodeId,
    /// The body.
    pub body: ExtensionBody,
}

impl ExtensionObject {
    /// Creates an extension object with an undecoded binary body.
    pub fn binary(type_id: NodeId, body: Vec<u8>) -> Self {
        Self {
            type_id,
            body: ExtensionBody::Binary(body),
        }
    }

    /// Creates an already decoded extension object.
    pub fn decoded(type_id: NodeId, structure: Structure) -> Self {
        Self {
            type_id,
            body: ExtensionBody::Decoded(structure),
        }
    }

    /// Returns `true` if the body has not been decoded.
    pub fn is_opaque(&self) -> bool {
        matches!(self.body, ExtensionBody::Binary(_))
    }

    /// Returns the decoded structure.
    pub fn structure(&self) -> Option<&Structure> {
        match &self.body {
            ExtensionBody::Decoded(s) => Some(s),
            _ => None,
        }
    }
}

/// Body of an extension object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExtensionBody {
    /// No body.
    None,
    /// Binary encoded body awaiting resolution.
    Binary(Vec<u8>),
    /// Decoded structure.
    Decoded(Structure),
}

/// A decoded structure: type name plus ordered named fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Structure {
    /// Structure type name.
    pub type_name: String,
    /// Fields in declaration order.
    pub fields: Vec<(String, Variant)>,
}

impl Structure {
    /// Creates an empty structure.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Variant>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&Variant> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque() -> Variant {
        ExtensionObject::binary(NodeId::numeric(2, 5001), vec![1, 2, 3]).into()
    }

    #[test]
    fn test_has_opaque_nested() {
        assert!(!Variant::from(3.5f64).has_opaque());
        assert!(opaque().has_opaque());
        assert!(Variant::Array(vec![Variant::Int32(1), opaque()]).has_opaque());

        let decoded: Variant =
            ExtensionObject::decoded(NodeId::numeric(2, 5001), Structure::new("Point")).into();
        assert!(!decoded.has_opaque());
    }

    #[test]
    fn test_for_each_opaque_visits_all() {
        let mut value = Variant::Array(vec![opaque(), Variant::Empty, opaque()]);
        let mut seen = 0;
        value
            .for_each_opaque_mut(&mut |obj: &mut ExtensionObject| {
                seen += 1;
                obj.body = ExtensionBody::Decoded(Structure::new("X"));
                Ok::<(), ()>(())
            })
            .unwrap();
        assert_eq!(seen, 2);
        assert!(!value.has_opaque());
    }

    #[test]
    fn test_data_value_status_defaults_good() {
        let dv = DataValue::new(42i32);
        assert!(dv.is_good());
        assert_eq!(dv.value.as_ref().and_then(Variant::as_i64), Some(42));
        assert!(!DataValue::with_status(StatusCode::BadNodeIdUnknown).is_good());
    }

    #[test]
    fn test_structure_field_lookup() {
        let s = Structure::new("Argument")
            .with_field("Name", "speed")
            .with_field("ValueRank", -1i32);
        assert_eq!(s.field("Name").and_then(Variant::as_str), Some("speed"));
        assert!(s.field("Missing").is_none());
    }
}
