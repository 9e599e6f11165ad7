// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Scalar-or-array inputs and outputs.
//!
//! Every service accepts either one item or a sequence of items and answers
//! in the same shape. Requests are always built in array form; the
//! [`Shape`] recorded at normalization time turns the result array back
//! into what the caller passed.
//!
//! A result the server left out is filled with its [`Padding`] value, which
//! always carries `BadNoData` and never reads as success.

use serde::{Deserialize, Serialize};

use crate::error::{UaError, UaResult};
use crate::messages::{
    BrowsePathResult, BrowseResult, CallMethodResult, HistoryReadResult,
    MonitoredItemCreateResult, MonitoredItemModifyResult, TransferResult,
};
use crate::status::StatusCode;
use crate::types::{DataValue, NodeId};

// =============================================================================
// Padding
// =============================================================================

/// Stand-in for a result the server omitted.
pub trait Padding {
    /// Returns the stand-in value.
    fn padding() -> Self;
}

impl Padding for StatusCode {
    fn padding() -> Self {
        StatusCode::BadNoData
    }
}

impl Padding for DataValue {
    fn padding() -> Self {
        DataValue::with_status(StatusCode::BadNoData)
    }
}

impl Padding for NodeId {
    fn padding() -> Self {
        NodeId::null()
    }
}

macro_rules! status_padding {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Padding for $ty {
                fn padding() -> Self {
                    Self {
                        status_code: StatusCode::BadNoData,
                        ..Default::default()
                    }
                }
            }
        )*
    };
}

status_padding!(
    BrowseResult,
    BrowsePathResult,
    CallMethodResult,
    HistoryReadResult,
    MonitoredItemCreateResult,
    MonitoredItemModifyResult,
    TransferResult,
);

// =============================================================================
// OneOrMany
// =============================================================================

/// One item, or an ordered sequence of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single item.
    One(T),
    /// A sequence of items, possibly empty.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Returns the shape of this value.
    pub fn shape(&self) -> Shape {
        match self {
            Self::One(_) => Shape::Scalar,
            Self::Many(items) => Shape::Array(items.len()),
        }
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.shape().len()
    }

    /// Returns `true` if this is an empty sequence.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` for a single item.
    pub fn is_one(&self) -> bool {
        matches!(self, Self::One(_))
    }

    /// Splits into the shape and the items in array form.
    pub fn into_parts(self) -> (Shape, Vec<T>) {
        match self {
            Self::One(item) => (Shape::Scalar, vec![item]),
            Self::Many(items) => (Shape::Array(items.len()), items),
        }
    }

    /// Returns the single item, or `None` for a sequence.
    pub fn into_one(self) -> Option<T> {
        match self {
            Self::One(item) => Some(item),
            Self::Many(_) => None,
        }
    }

    /// Returns the items in array form.
    pub fn into_vec(self) -> Vec<T> {
        self.into_parts().1
    }

    /// Returns an iterator over the items.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            Self::One(item) => std::slice::from_ref(item).iter(),
            Self::Many(items) => items.iter(),
        }
    }

    /// Returns the items as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match self {
            Self::One(item) => std::slice::from_mut(item),
            Self::Many(items) => items.as_mut_slice(),
        }
    }

    /// Maps every item, keeping the shape.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> OneOrMany<U> {
        match self {
            Self::One(item) => OneOrMany::One(f(item)),
            Self::Many(items) => OneOrMany::Many(items.into_iter().map(f).collect()),
        }
    }

    /// Maps every item with a fallible function, keeping the shape.
    pub fn try_map<U, E>(self, mut f: impl FnMut(T) -> Result<U, E>) -> Result<OneOrMany<U>, E> {
        Ok(match self {
            Self::One(item) => OneOrMany::One(f(item)?),
            Self::Many(items) => {
                OneOrMany::Many(items.into_iter().map(f).collect::<Result<_, _>>()?)
            }
        })
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(item: T) -> Self {
        Self::One(item)
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(items: Vec<T>) -> Self {
        Self::Many(items)
    }
}

impl<T> IntoIterator for OneOrMany<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

// =============================================================================
// Shape
// =============================================================================

/// The shape of a caller's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// A single item.
    Scalar,
    /// An array of the given length.
    Array(usize),
}

impl Shape {
    /// Returns the number of items the request carried.
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Array(n) => *n,
        }
    }

    /// Returns `true` for an empty array.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reshapes a server result array to this shape.
    ///
    /// Omitted or short result arrays are padded with [`Padding::padding`];
    /// a result array longer than the request is an internal error.
    pub fn reshape<R: Padding>(
        self,
        operation: &'static str,
        results: Option<Vec<R>>,
    ) -> UaResult<OneOrMany<R>> {
        self.reshape_with(operation, results, R::padding)
    }

    /// Like [`reshape`](Shape::reshape), padding with `fill`.
    pub fn reshape_with<R>(
        self,
        operation: &'static str,
        results: Option<Vec<R>>,
        fill: impl FnMut() -> R,
    ) -> UaResult<OneOrMany<R>> {
        let mut results = results.unwrap_or_default();
        let expected = self.len();

        if results.len() > expected {
            return Err(UaError::length_mismatch(operation, expected, results.len()));
        }
        if results.len() < expected {
            tracing::debug!(
                operation,
                expected,
                actual = results.len(),
                "Server omitted results, padding"
            );
            results.resize_with(expected, fill);
        }

        Ok(self.restore(results))
    }

    /// Restores an array of exactly `self.len()` items to this shape.
    pub fn restore<R>(self, mut items: Vec<R>) -> OneOrMany<R> {
        match self {
            Self::Scalar => match items.pop() {
                Some(item) if items.is_empty() => OneOrMany::One(item),
                Some(item) => {
                    items.push(item);
                    OneOrMany::Many(items)
                }
                None => OneOrMany::Many(items),
            },
            Self::Array(_) => OneOrMany::Many(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InternalError;

    #[test]
    fn test_scalar_stays_scalar() {
        let input: OneOrMany<&str> = "ns=2;s=Temperature".into();
        let (shape, items) = input.into_parts();
        assert_eq!(shape, Shape::Scalar);
        assert_eq!(items.len(), 1);

        let out = shape.reshape("Read", Some(vec![StatusCode::Good])).unwrap();
        assert_eq!(out, OneOrMany::One(StatusCode::Good));
    }

    #[test]
    fn test_single_element_array_stays_array() {
        let input: OneOrMany<u8> = vec![1].into();
        let shape = input.shape();
        let out = shape.reshape_with("Read", Some(vec![5u32]), || 0).unwrap();
        assert_eq!(out, OneOrMany::Many(vec![5]));
    }

    #[test]
    fn test_missing_results_are_padded() {
        let out = Shape::Array(2).reshape::<StatusCode>("Write", None).unwrap();
        assert_eq!(
            out,
            OneOrMany::Many(vec![StatusCode::BadNoData, StatusCode::BadNoData])
        );
        assert!(out.iter().all(StatusCode::is_bad));

        let out = Shape::Array(3)
            .reshape("Write", Some(vec![StatusCode::Good]))
            .unwrap();
        assert_eq!(
            out.into_vec(),
            vec![StatusCode::Good, StatusCode::BadNoData, StatusCode::BadNoData]
        );

        let out = Shape::Scalar.reshape::<DataValue>("Read", Some(vec![])).unwrap();
        let value = out.into_one().unwrap();
        assert_eq!(value.status(), StatusCode::BadNoData);
        assert!(value.value.is_none());

        let out = Shape::Array(2).reshape_with("Read", Some(vec![1u32]), || 0).unwrap();
        assert_eq!(out, OneOrMany::Many(vec![1, 0]));
    }

    #[test]
    fn test_padded_results_carry_bad_status() {
        let browse = Shape::Scalar.reshape::<BrowseResult>("Browse", None).unwrap();
        assert_eq!(browse.into_one().unwrap().status_code, StatusCode::BadNoData);

        let calls = Shape::Array(1).reshape::<CallMethodResult>("Call", None).unwrap();
        assert!(calls.iter().all(|r| r.status_code.is_bad()));

        let alias = Shape::Scalar.reshape::<NodeId>("RegisterNodes", None).unwrap();
        assert!(alias.into_one().unwrap().is_null());
    }

    #[test]
    fn test_extra_results_rejected() {
        let err = Shape::Array(1)
            .reshape("Browse", Some(vec![StatusCode::Good, StatusCode::Good]))
            .unwrap_err();
        assert!(matches!(
            err,
            UaError::Internal(InternalError::LengthMismatch {
                expected: 1,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_array() {
        let out = Shape::Array(0).reshape::<StatusCode>("Read", None).unwrap();
        assert!(out.is_empty());
        assert!(!out.is_one());
    }

    #[test]
    fn test_try_map_keeps_shape() {
        let input: OneOrMany<&str> = vec!["1", "2"].into();
        let parsed: OneOrMany<u32> = input.try_map(str::parse).unwrap();
        assert_eq!(parsed.into_vec(), vec![1, 2]);

        let bad: OneOrMany<&str> = "x".into();
        assert!(bad.try_map(str::parse::<u32>).is_err());
    }
}
