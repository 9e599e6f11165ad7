// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Method service set: Call.

use serde::{Deserialize, Serialize};

use super::{RequestHeader, ResponseHeader};
use crate::status::StatusCode;
use crate::types::{DiagnosticInfo, LocalizedText, NodeId, Variant};

/// One method invocation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CallMethodRequest {
    /// Object or object type owning the method.
    pub object_id: NodeId,
    /// Method to call.
    pub method_id: NodeId,
    /// Input arguments in declaration order.
    pub input_arguments: Vec<Variant>,
}

/// Result of one method invocation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CallMethodResult {
    /// Operation status.
    pub status_code: StatusCode,
    /// Status per input argument.
    pub input_argument_results: Option<Vec<StatusCode>>,
    /// Diagnostics per input argument.
    pub input_argument_diagnostic_infos: Option<Vec<DiagnosticInfo>>,
    /// Output arguments in declaration order.
    pub output_arguments: Option<Vec<Variant>>,
}

/// Call request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CallRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Methods to call.
    pub methods_to_call: Vec<CallMethodRequest>,
}

/// Call response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CallResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// One result per call.
    pub results: Option<Vec<CallMethodResult>>,
    /// Per-operation diagnostics.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

/// Declaration of one method argument, as stored in the method's
/// `InputArguments` and `OutputArguments` properties.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Argument {
    /// Argument name.
    pub name: String,
    /// Data type node.
    pub data_type: NodeId,
    /// Value rank (-1 scalar, 1 one-dimensional array, ...).
    pub value_rank: i32,
    /// Array dimensions.
    pub array_dimensions: Vec<u32>,
    /// Description.
    pub description: LocalizedText,
}

/// Input and output argument declarations of a method.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArgumentDefinition {
    /// Input arguments.
    pub input_arguments: Vec<Argument>,
    /// Output arguments.
    pub output_arguments: Vec<Argument>,
}
