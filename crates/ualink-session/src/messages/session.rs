// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session service set: ActivateSession, CloseSession.
//!
//! CreateSession belongs to the owning client's connection handshake and is
//! not carried here.

use serde::{Deserialize, Serialize};

use super::{RequestHeader, ResponseHeader};
use crate::status::StatusCode;
use crate::types::DiagnosticInfo;

/// A signature over the server certificate and nonce.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SignatureData {
    /// Signature algorithm URI.
    pub algorithm: Option<String>,
    /// Signature bytes.
    pub signature: Option<Vec<u8>>,
}

/// User identity token presented on activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UserIdentityToken {
    /// Anonymous access.
    Anonymous {
        /// Server policy id.
        policy_id: String,
    },
    /// User name and password.
    UserName {
        /// Server policy id.
        policy_id: String,
        /// User name.
        user_name: String,
        /// Password, encrypted if `encryption_algorithm` is set.
        password: Vec<u8>,
        /// Encryption algorithm URI.
        encryption_algorithm: Option<String>,
    },
    /// X.509 certificate.
    X509 {
        /// Server policy id.
        policy_id: String,
        /// DER encoded certificate.
        certificate_data: Vec<u8>,
    },
    /// Token issued by an external authority.
    Issued {
        /// Server policy id.
        policy_id: String,
        /// Token bytes.
        token_data: Vec<u8>,
    },
}

impl Default for UserIdentityToken {
    fn default() -> Self {
        Self::Anonymous {
            policy_id: "anonymous".to_string(),
        }
    }
}

/// ActivateSession request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivateSessionRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Client signature.
    pub client_signature: SignatureData,
    /// Preferred locales.
    pub locale_ids: Vec<String>,
    /// User identity.
    pub user_identity_token: UserIdentityToken,
    /// Signature proving possession of the user token.
    pub user_token_signature: SignatureData,
}

/// ActivateSession response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivateSessionResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// New server nonce.
    pub server_nonce: Option<Vec<u8>>,
    /// Status per client software certificate.
    pub results: Option<Vec<StatusCode>>,
    /// Per-operation diagnostics.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

/// CloseSession request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CloseSessionRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Delete the session's subscriptions.
    pub delete_subscriptions: bool,
}

/// CloseSession response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CloseSessionResponse {
    /// Response header.
    pub header: ResponseHeader,
}
