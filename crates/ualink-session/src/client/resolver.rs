// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Extension object resolution.
//!
//! Values of server-defined structure types arrive as extension objects with
//! a binary body. Before a service result is delivered, the session hands
//! every value that still carries such an opaque body to its
//! [`DatatypeResolver`].
//!
//! # Architecture
//!
//! ```text
//! ClientSession ──► DatatypeResolver
//!                     ├── NoopResolver        (leaves bodies opaque)
//!                     └── DictionaryResolver  (encoding id ─► StructureCodec)
//!                                                  └── FieldLayoutCodec
//! ```
//!
//! [`FieldLayoutCodec`] decodes a structure laid out as a flat sequence of
//! built-in fields, which covers the standard `Argument` structure and most
//! simple vendor types.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::ClientSession;
use crate::error::{ResolverError, UaError, UaResult};
use crate::messages::Argument;
use crate::status::StatusCode;
use crate::types::{
    ExtensionBody, ExtensionObject, LocalizedText, NodeId, QualifiedName, Structure, Variant,
};

// =============================================================================
// DatatypeResolver
// =============================================================================

/// Resolves opaque extension object bodies in place.
#[async_trait]
pub trait DatatypeResolver: Send + Sync {
    /// Decodes every opaque extension object found in `values`.
    ///
    /// Bodies of unknown types stay opaque. Must be a no-op when no value
    /// is opaque.
    async fn resolve_opaque_values(
        &self,
        session: &ClientSession,
        values: &mut [Variant],
    ) -> UaResult<()>;
}

/// A resolver that leaves every body opaque.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResolver;

#[async_trait]
impl DatatypeResolver for NoopResolver {
    async fn resolve_opaque_values(
        &self,
        _session: &ClientSession,
        _values: &mut [Variant],
    ) -> UaResult<()> {
        Ok(())
    }
}

// =============================================================================
// StructureCodec
// =============================================================================

/// Decodes the binary body of one structure type.
pub trait StructureCodec: Send + Sync {
    /// Returns the structure type name.
    fn type_name(&self) -> &str;

    /// Decodes a body.
    fn decode(&self, reader: &mut BinaryReader<'_>) -> UaResult<Structure>;
}

/// Resolver backed by a registry of codecs keyed by binary encoding id.
pub struct DictionaryResolver {
    codecs: DashMap<NodeId, Arc<dyn StructureCodec>>,
}

impl DictionaryResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self {
            codecs: DashMap::new(),
        }
    }

    /// Creates a resolver that knows the standard `Argument` structure.
    pub fn with_builtin_codecs() -> Self {
        let resolver = Self::new();
        resolver.register(NodeId::ARGUMENT_ENCODING_DEFAULT_BINARY, argument_codec());
        resolver
    }

    /// Registers a codec for a binary encoding id, replacing any previous one.
    pub fn register(&self, encoding_id: NodeId, codec: impl StructureCodec + 'static) {
        tracing::debug!(
            encoding_id = %encoding_id,
            type_name = codec.type_name(),
            "Registered structure codec"
        );
        self.codecs.insert(encoding_id, Arc::new(codec));
    }

    /// Returns `true` if a codec is registered for `encoding_id`.
    pub fn contains(&self, encoding_id: &NodeId) -> bool {
        self.codecs.contains_key(encoding_id)
    }

    /// Returns the number of registered codecs.
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Returns `true` if no codec is registered.
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Decodes one extension object in place if its type is known.
    pub fn resolve_object(&self, object: &mut ExtensionObject) -> UaResult<()> {
        let codec = match self.codecs.get(&object.type_id) {
            Some(codec) => codec.value().clone(),
            None => {
                tracing::trace!(type_id = %object.type_id, "No codec for extension object");
                return Ok(());
            }
        };

        if let ExtensionBody::Binary(bytes) = &object.body {
            let mut reader = BinaryReader::new(&object.type_id, bytes);
            let structure = codec.decode(&mut reader)?;
            object.body = ExtensionBody::Decoded(structure);
        }
        Ok(())
    }
}

impl Default for DictionaryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DictionaryResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DictionaryResolver")
            .field("codecs", &self.codecs.len())
            .finish()
    }
}

#[async_trait]
impl DatatypeResolver for DictionaryResolver {
    async fn resolve_opaque_values(
        &self,
        _session: &ClientSession,
        values: &mut [Variant],
    ) -> UaResult<()> {
        for value in values.iter_mut() {
            value.for_each_opaque_mut(&mut |object: &mut ExtensionObject| {
                self.resolve_object(object)
            })?;
        }
        Ok(())
    }
}

// =============================================================================
// FieldLayoutCodec
// =============================================================================

/// Built-in field types a [`FieldLayoutCodec`] can decode.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Boolean,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    String,
    DateTime,
    Guid,
    ByteString,
    NodeId,
    StatusCode,
    QualifiedName,
    LocalizedText,
    /// A length-prefixed array of the inner type.
    Array(Box<FieldType>),
}

/// Codec for a structure made of consecutive built-in fields.
#[derive(Debug, Clone)]
pub struct FieldLayoutCodec {
    type_name: String,
    fields: Vec<(String, FieldType)>,
}

impl FieldLayoutCodec {
    /// Starts a layout for the named structure.
    pub fn builder(type_name: impl Into<String>) -> FieldLayoutCodecBuilder {
        FieldLayoutCodecBuilder {
            codec: FieldLayoutCodec {
                type_name: type_name.into(),
                fields: Vec::new(),
            },
        }
    }

    /// Returns the field layout.
    pub fn fields(&self) -> &[(String, FieldType)] {
        &self.fields
    }
}

impl StructureCodec for FieldLayoutCodec {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn decode(&self, reader: &mut BinaryReader<'_>) -> UaResult<Structure> {
        let mut structure = Structure::new(self.type_name.clone());
        for (name, field_type) in &self.fields {
            let value = reader.read_field(field_type)?;
            structure.fields.push((name.clone(), value));
        }
        Ok(structure)
    }
}

/// Builder for [`FieldLayoutCodec`].
#[derive(Debug)]
pub struct FieldLayoutCodecBuilder {
    codec: FieldLayoutCodec,
}

impl FieldLayoutCodecBuilder {
    /// Appends a field.
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.codec.fields.push((name.into(), field_type));
        self
    }

    /// Builds the codec.
    pub fn build(self) -> FieldLayoutCodec {
        self.codec
    }
}

/// Returns the codec for the standard `Argument` structure.
pub fn argument_codec() -> FieldLayoutCodec {
    FieldLayoutCodec::builder("Argument")
        .field("Name", FieldType::String)
        .field("DataType", FieldType::NodeId)
        .field("ValueRank", FieldType::Int32)
        .field("ArrayDimensions", FieldType::Array(Box::new(FieldType::UInt32)))
        .field("Description", FieldType::LocalizedText)
        .build()
}

/// Converts an `Argument` extension object, decoding it first if its body is
/// still binary.
pub fn decode_argument(object: &ExtensionObject) -> UaResult<Argument> {
    let decoded;
    let structure = match &object.body {
        ExtensionBody::Decoded(structure) => structure,
        ExtensionBody::Binary(bytes) => {
            let mut reader = BinaryReader::new(&object.type_id, bytes);
            decoded = argument_codec().decode(&mut reader)?;
            &decoded
        }
        ExtensionBody::None => {
            return Err(ResolverError::decode_failed(&object.type_id, "Argument has no body").into())
        }
    };

    let name = match structure.field("Name") {
        Some(Variant::String(name)) => name.clone(),
        _ => String::new(),
    };
    let data_type = match structure.field("DataType") {
        Some(Variant::NodeId(node)) => (**node).clone(),
        _ => NodeId::null(),
    };
    let value_rank = match structure.field("ValueRank") {
        Some(Variant::Int32(rank)) => *rank,
        _ => -1,
    };
    let array_dimensions = structure
        .field("ArrayDimensions")
        .and_then(Variant::as_array)
        .map(|items| items.iter().filter_map(Variant::as_u32).collect())
        .unwrap_or_default();
    let description = match structure.field("Description") {
        Some(Variant::LocalizedText(text)) => (**text).clone(),
        _ => LocalizedText::default(),
    };

    Ok(Argument {
        name,
        data_type,
        value_rank,
        array_dimensions,
        description,
    })
}

// =============================================================================
// BinaryReader
// =============================================================================

/// Seconds between 1601-01-01 and 1970-01-01.
const EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// Little-endian reader over a structure body.
pub struct BinaryReader<'a> {
    type_id: &'a NodeId,
    bytes: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Creates a reader over the body of a structure with the given
    /// encoding id. The id only appears in errors.
    pub fn new(type_id: &'a NodeId, bytes: &'a [u8]) -> Self {
        Self {
            type_id,
            bytes,
            position: 0,
        }
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    fn take<const N: usize>(&mut self) -> UaResult<[u8; N]> {
        let slice = self.take_slice(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn take_slice(&mut self, len: usize) -> UaResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(ResolverError::Truncated {
                type_id: self.type_id.to_string(),
                needed: len,
                remaining: self.remaining(),
            }
            .into());
        }
        let slice = &self.bytes[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    fn decode_error(&self, message: impl Into<String>) -> UaError {
        ResolverError::decode_failed(self.type_id, message).into()
    }

    /// Reads a Boolean.
    pub fn read_bool(&mut self) -> UaResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads a Byte.
    pub fn read_u8(&mut self) -> UaResult<u8> {
        Ok(self.take::<1>()?[0])
    }

    /// Reads an SByte.
    pub fn read_i8(&mut self) -> UaResult<i8> {
        Ok(i8::from_le_bytes(self.take()?))
    }

    /// Reads an Int16.
    pub fn read_i16(&mut self) -> UaResult<i16> {
        Ok(i16::from_le_bytes(self.take()?))
    }

    /// Reads a UInt16.
    pub fn read_u16(&mut self) -> UaResult<u16> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    /// Reads an Int32.
    pub fn read_i32(&mut self) -> UaResult<i32> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    /// Reads a UInt32.
    pub fn read_u32(&mut self) -> UaResult<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    /// Reads an Int64.
    pub fn read_i64(&mut self) -> UaResult<i64> {
        Ok(i64::from_le_bytes(self.take()?))
    }

    /// Reads a UInt64.
    pub fn read_u64(&mut self) -> UaResult<u64> {
        Ok(u64::from_le_bytes(self.take()?))
    }

    /// Reads a Float.
    pub fn read_f32(&mut self) -> UaResult<f32> {
        Ok(f32::from_le_bytes(self.take()?))
    }

    /// Reads a Double.
    pub fn read_f64(&mut self) -> UaResult<f64> {
        Ok(f64::from_le_bytes(self.take()?))
    }

    /// Reads a length-prefixed byte string. A negative length is null.
    pub fn read_byte_string(&mut self) -> UaResult<Option<Vec<u8>>> {
        let len = self.read_i32()?;
        if len < 0 {
            return Ok(None);
        }
        Ok(Some(self.take_slice(len as usize)?.to_vec()))
    }

    /// Reads a length-prefixed UTF-8 string. A negative length is null.
    pub fn read_string(&mut self) -> UaResult<Option<String>> {
        match self.read_byte_string()? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| self.decode_error(format!("Invalid UTF-8 string: {}", e))),
            None => Ok(None),
        }
    }

    /// Reads a timestamp in 100 ns ticks since 1601-01-01.
    pub fn read_date_time(&mut self) -> UaResult<DateTime<Utc>> {
        let ticks = self.read_i64()?;
        let secs = ticks.div_euclid(10_000_000) - EPOCH_OFFSET_SECS;
        let nanos = (ticks.rem_euclid(10_000_000) * 100) as u32;
        Utc.timestamp_opt(secs, nanos)
            .single()
            .ok_or_else(|| self.decode_error(format!("DateTime out of range: {}", ticks)))
    }

    /// Reads a GUID in its mixed-endian layout.
    pub fn read_guid(&mut self) -> UaResult<Uuid> {
        let d1 = self.read_u32()?;
        let d2 = self.read_u16()?;
        let d3 = self.read_u16()?;
        let d4 = self.take::<8>()?;
        Ok(Uuid::from_fields(d1, d2, d3, &d4))
    }

    /// Reads a NodeId in any of its compact encodings.
    pub fn read_node_id(&mut self) -> UaResult<NodeId> {
        let encoding = self.read_u8()?;
        match encoding & 0x3F {
            0x00 => Ok(NodeId::numeric(0, u32::from(self.read_u8()?))),
            0x01 => {
                let ns = u16::from(self.read_u8()?);
                Ok(NodeId::numeric(ns, u32::from(self.read_u16()?)))
            }
            0x02 => {
                let ns = self.read_u16()?;
                Ok(NodeId::numeric(ns, self.read_u32()?))
            }
            0x03 => {
                let ns = self.read_u16()?;
                Ok(NodeId::string(ns, self.read_string()?.unwrap_or_default()))
            }
            0x04 => {
                let ns = self.read_u16()?;
                Ok(NodeId::guid(ns, self.read_guid()?))
            }
            0x05 => {
                let ns = self.read_u16()?;
                Ok(NodeId::opaque(ns, self.read_byte_string()?.unwrap_or_default()))
            }
            other => Err(self.decode_error(format!("Unknown NodeId encoding 0x{:02X}", other))),
        }
    }

    /// Reads a QualifiedName.
    pub fn read_qualified_name(&mut self) -> UaResult<QualifiedName> {
        let ns = self.read_u16()?;
        Ok(QualifiedName::new(ns, self.read_string()?.unwrap_or_default()))
    }

    /// Reads a LocalizedText.
    pub fn read_localized_text(&mut self) -> UaResult<LocalizedText> {
        let mask = self.read_u8()?;
        let locale = if mask & 0x01 != 0 {
            self.read_string()?
        } else {
            None
        };
        let text = if mask & 0x02 != 0 {
            self.read_string()?.unwrap_or_default()
        } else {
            String::new()
        };
        Ok(LocalizedText { locale, text })
    }

    /// Reads one field of the given type as a variant.
    pub fn read_field(&mut self, field_type: &FieldType) -> UaResult<Variant> {
        Ok(match field_type {
            FieldType::Boolean => Variant::Boolean(self.read_bool()?),
            FieldType::SByte => Variant::SByte(self.read_i8()?),
            FieldType::Byte => Variant::Byte(self.read_u8()?),
            FieldType::Int16 => Variant::Int16(self.read_i16()?),
            FieldType::UInt16 => Variant::UInt16(self.read_u16()?),
            FieldType::Int32 => Variant::Int32(self.read_i32()?),
            FieldType::UInt32 => Variant::UInt32(self.read_u32()?),
            FieldType::Int64 => Variant::Int64(self.read_i64()?),
            FieldType::UInt64 => Variant::UInt64(self.read_u64()?),
            FieldType::Float => Variant::Float(self.read_f32()?),
            FieldType::Double => Variant::Double(self.read_f64()?),
            FieldType::String => match self.read_string()? {
                Some(s) => Variant::String(s),
                None => Variant::Empty,
            },
            FieldType::DateTime => Variant::DateTime(self.read_date_time()?),
            FieldType::Guid => Variant::Guid(self.read_guid()?),
            FieldType::ByteString => match self.read_byte_string()? {
                Some(b) => Variant::ByteString(b),
                None => Variant::Empty,
            },
            FieldType::NodeId => Variant::NodeId(Box::new(self.read_node_id()?)),
            FieldType::StatusCode => Variant::StatusCode(StatusCode::from(self.read_u32()?)),
            FieldType::QualifiedName => Variant::QualifiedName(Box::new(self.read_qualified_name()?)),
            FieldType::LocalizedText => Variant::LocalizedText(Box::new(self.read_localized_text()?)),
            FieldType::Array(inner) => {
                let len = self.read_i32()?;
                let len = usize::try_from(len).unwrap_or(0);
                if len > self.remaining() {
                    return Err(self.decode_error(format!("Array length {} exceeds body", len)));
                }
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.read_field(inner)?);
                }
                Variant::Array(items)
            }
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn push_string(buf: &mut Vec<u8>, s: &str) {
        buf.extend_from_slice(&(s.len() as i32).to_le_bytes());
        buf.extend_from_slice(s.as_bytes());
    }

    /// Encodes an `Argument` body the way a server would.
    pub(crate) fn encode_argument(name: &str, data_type: u32, dims: &[u32], text: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        push_string(&mut buf, name);
        buf.push(0x02);
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&data_type.to_le_bytes());
        let rank: i32 = if dims.is_empty() { -1 } else { dims.len() as i32 };
        buf.extend_from_slice(&rank.to_le_bytes());
        buf.extend_from_slice(&(dims.len() as i32).to_le_bytes());
        for d in dims {
            buf.extend_from_slice(&d.to_le_bytes());
        }
        buf.push(0x02);
        push_string(&mut buf, text);
        buf
    }

    #[test]
    fn test_decode_argument_from_binary() {
        let body = encode_argument("SetPoint", 11, &[], "Target value");
        let object = ExtensionObject::binary(NodeId::ARGUMENT_ENCODING_DEFAULT_BINARY, body);

        let argument = decode_argument(&object).unwrap();
        assert_eq!(argument.name, "SetPoint");
        assert_eq!(argument.data_type, NodeId::numeric(0, 11));
        assert_eq!(argument.value_rank, -1);
        assert!(argument.array_dimensions.is_empty());
        assert_eq!(argument.description.text, "Target value");
    }

    #[test]
    fn test_dictionary_resolves_nested_arrays() {
        let resolver = DictionaryResolver::with_builtin_codecs();
        let body = encode_argument("Samples", 6, &[4], "");
        let mut value = Variant::Array(vec![
            Variant::ExtensionObject(Box::new(ExtensionObject::binary(
                NodeId::ARGUMENT_ENCODING_DEFAULT_BINARY,
                body,
            ))),
            Variant::ExtensionObject(Box::new(ExtensionObject::binary(
                NodeId::numeric(2, 5001),
                vec![1, 2, 3],
            ))),
        ]);

        value
            .for_each_opaque_mut(&mut |obj: &mut ExtensionObject| resolver.resolve_object(obj))
            .unwrap();

        let items = value.as_array().unwrap();
        match &items[0] {
            Variant::ExtensionObject(obj) => {
                let structure = obj.structure().unwrap();
                assert_eq!(structure.type_name, "Argument");
                assert_eq!(
                    structure.field("ArrayDimensions"),
                    Some(&Variant::Array(vec![Variant::UInt32(4)]))
                );
            }
            other => panic!("unexpected {:?}", other),
        }
        // Unknown type stays opaque.
        assert!(items[1].has_opaque());
    }

    #[test]
    fn test_truncated_body_fails() {
        let resolver = DictionaryResolver::with_builtin_codecs();
        let mut object =
            ExtensionObject::binary(NodeId::ARGUMENT_ENCODING_DEFAULT_BINARY, vec![10, 0, 0, 0, b'a']);
        let err = resolver.resolve_object(&mut object).unwrap_err();
        assert!(matches!(err, UaError::Resolver(ResolverError::Truncated { .. })));
        assert!(object.is_opaque());
    }

    #[test]
    fn test_custom_layout() {
        let codec = FieldLayoutCodec::builder("Point")
            .field("X", FieldType::Double)
            .field("Y", FieldType::Double)
            .field("Valid", FieldType::Boolean)
            .build();

        let mut body = Vec::new();
        body.extend_from_slice(&1.5f64.to_le_bytes());
        body.extend_from_slice(&(-2.0f64).to_le_bytes());
        body.push(1);

        let id = NodeId::numeric(2, 7);
        let mut reader = BinaryReader::new(&id, &body);
        let point = codec.decode(&mut reader).unwrap();
        assert_eq!(point.field("X"), Some(&Variant::Double(1.5)));
        assert_eq!(point.field("Valid"), Some(&Variant::Boolean(true)));
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_read_date_time() {
        let id = NodeId::null();
        let ticks: i64 = (EPOCH_OFFSET_SECS + 1) * 10_000_000;
        let bytes = ticks.to_le_bytes();
        let mut reader = BinaryReader::new(&id, &bytes);
        assert_eq!(reader.read_date_time().unwrap().timestamp(), 1);
    }
}
