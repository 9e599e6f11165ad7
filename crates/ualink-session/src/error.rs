// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the session layer.
//!
//! Every failure a caller can observe is a [`UaError`]. The variants follow
//! the order in which a transaction can fail:
//!
//! ```text
//! UaError
//! ├── Session       - Session closed, repair refused or exhausted
//! ├── Service       - Server answered with a bad service result
//! ├── Channel       - Secure channel could not deliver the request
//! ├── Internal      - Response missing, mistyped or misshaped
//! ├── Configuration - Invalid settings or node references
//! └── Resolver      - Extension object decoding failed
//! ```
//!
//! The dispatcher only needs two questions answered about an error:
//! [`UaError::is_session_invalid`] (route into repair) and
//! [`UaError::status_code`] (what to report in `session_closed`).
//!
//! # Examples
//!
//! ```
//! use ualink_session::error::{UaError, ServiceError};
//! use ualink_session::StatusCode;
//!
//! let error = UaError::service(ServiceError::fault("Write", StatusCode::BadSessionIdInvalid));
//! assert!(error.is_session_invalid());
//! assert_eq!(error.status_code(), StatusCode::BadSessionIdInvalid);
//! ```

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;
use tracing::Level;

use crate::status::StatusCode;
use crate::types::DiagnosticInfo;

// =============================================================================
// UaError
// =============================================================================

/// The main error type for session operations.
#[derive(Debug, Error)]
pub enum UaError {
    /// Session lifecycle and repair errors.
    #[error("{0}")]
    Session(#[from] SessionError),

    /// Bad service results reported by the server.
    #[error("{0}")]
    Service(#[from] ServiceError),

    /// Secure channel delivery errors.
    #[error("{0}")]
    Channel(#[from] ChannelError),

    /// Protocol-shape violations.
    #[error("{0}")]
    Internal(#[from] InternalError),

    /// Configuration errors.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// Extension object resolution errors.
    #[error("{0}")]
    Resolver(#[from] ResolverError),
}

impl UaError {
    // =========================================================================
    // Factory Methods
    // =========================================================================

    /// Creates a session error.
    #[inline]
    pub fn session(error: SessionError) -> Self {
        Self::Session(error)
    }

    /// Creates a service error.
    #[inline]
    pub fn service(error: ServiceError) -> Self {
        Self::Service(error)
    }

    /// Creates a channel error.
    #[inline]
    pub fn channel(error: ChannelError) -> Self {
        Self::Channel(error)
    }

    /// Creates an internal error.
    #[inline]
    pub fn internal(error: InternalError) -> Self {
        Self::Internal(error)
    }

    /// Creates a configuration error.
    #[inline]
    pub fn configuration(error: ConfigurationError) -> Self {
        Self::Configuration(error)
    }

    /// Creates a resolver error.
    #[inline]
    pub fn resolver(error: ResolverError) -> Self {
        Self::Resolver(error)
    }

    /// The session has been closed.
    pub fn session_closed() -> Self {
        Self::Session(SessionError::Closed)
    }

    /// A repair is already running for this session.
    pub fn cannot_recreate_session() -> Self {
        Self::Session(SessionError::CannotRecreateSession)
    }

    /// The response did not have the expected type.
    pub fn unexpected_response(expected: &'static str, actual: &'static str) -> Self {
        Self::Internal(InternalError::UnexpectedResponse { expected, actual })
    }

    /// The response array length differs from the request array length.
    pub fn length_mismatch(operation: &'static str, expected: usize, actual: usize) -> Self {
        Self::Internal(InternalError::LengthMismatch {
            operation,
            expected,
            actual,
        })
    }

    // =========================================================================
    // Classification
    // =========================================================================

    /// Returns `true` if the server reported that the session no longer
    /// exists, whichever layer carried the status.
    pub fn is_session_invalid(&self) -> bool {
        match self {
            Self::Service(ServiceError::Fault { status, .. }) => status.is_session_invalid(),
            Self::Channel(ChannelError::Status { status, .. }) => status.is_session_invalid(),
            _ => false,
        }
    }

    /// Returns the status code that best describes this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Session(e) => e.status_code(),
            Self::Service(e) => e.status(),
            Self::Channel(e) => e.status_code(),
            Self::Internal(_) => StatusCode::BadInternalError,
            Self::Configuration(e) => e.status_code(),
            Self::Resolver(_) => StatusCode::BadDecodingError,
        }
    }

    /// Returns `true` if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Session(e) => e.is_retryable(),
            Self::Service(e) => e.is_retryable(),
            Self::Channel(e) => e.is_retryable(),
            Self::Internal(_) | Self::Configuration(_) | Self::Resolver(_) => false,
        }
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Session(e) => e.severity(),
            Self::Service(e) => e.severity(),
            Self::Channel(e) => e.severity(),
            Self::Internal(_) => ErrorSeverity::Critical,
            Self::Configuration(_) => ErrorSeverity::Error,
            Self::Resolver(_) => ErrorSeverity::Error,
        }
    }

    /// Returns the error category name.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Session(_) => "session",
            Self::Service(_) => "service",
            Self::Channel(_) => "channel",
            Self::Internal(_) => "internal",
            Self::Configuration(_) => "configuration",
            Self::Resolver(_) => "resolver",
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Session(e) => e.error_code(),
            Self::Service(e) => e.error_code(),
            Self::Channel(e) => e.error_code(),
            Self::Internal(e) => e.error_code(),
            Self::Configuration(e) => e.error_code(),
            Self::Resolver(e) => e.error_code(),
        }
    }

    /// Returns a message suitable for operators.
    pub fn user_message(&self) -> String {
        match self {
            Self::Session(SessionError::Closed) => {
                "The session has been closed; open a new session".to_string()
            }
            Self::Session(SessionError::CannotRecreateSession) => {
                "The session is already being repaired; try again shortly".to_string()
            }
            Self::Service(ServiceError::Fault {
                operation, status, ..
            }) => format!("The server rejected {}: {}", operation, status),
            Self::Channel(ChannelError::NotOpen) => {
                "The secure channel is not open".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Returns the tracing level matching the severity.
    pub fn tracing_level(&self) -> Level {
        self.severity().to_tracing_level()
    }

    /// Logs this error at its severity's level.
    pub fn log(&self, context: &str) {
        let code = self.error_code();
        match self.severity() {
            ErrorSeverity::Info => {
                tracing::info!(error_code = %code, context = context, "{}", self)
            }
            ErrorSeverity::Warning => {
                tracing::warn!(error_code = %code, context = context, "{}", self)
            }
            ErrorSeverity::Error | ErrorSeverity::Critical => {
                tracing::error!(error_code = %code, context = context, "{}", self)
            }
        }
    }
}

// =============================================================================
// SessionError
// =============================================================================

/// Session lifecycle and repair errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session is closed and accepts no further transactions.
    #[error("Session has been closed and cannot perform transactions")]
    Closed,

    /// A repair is already in progress for this session.
    #[error("Cannot recreate session: a repair is already in progress")]
    CannotRecreateSession,

    /// The owning client failed to re-activate the session.
    #[error("Failed to activate session: {message}")]
    ActivationFailed {
        /// Error message.
        message: String,
    },

    /// The request kept hitting an invalid session while the owner was
    /// restoring the connection.
    #[error("Session was not restored after {attempts} attempts")]
    RestoreAttemptsExhausted {
        /// Attempts made.
        attempts: u32,
    },

    /// The owner did not report a restored session in time.
    #[error("Timed out after {duration:?} waiting for the session to be restored")]
    RestoreWaitTimedOut {
        /// How long the request waited.
        duration: Duration,
    },

    /// The owning client is gone and can no longer restore the session.
    #[error("Owning client is gone and can no longer restore the session")]
    OwnerGone,

    /// A queued transaction was abandoned because the repair it waited on
    /// failed.
    #[error("Queued transaction abandoned after failed session repair: {reason}")]
    QueueAborted {
        /// Why the queue was failed.
        reason: String,
    },
}

impl SessionError {
    /// Creates an activation failed error.
    pub fn activation_failed(message: impl Into<String>) -> Self {
        Self::ActivationFailed {
            message: message.into(),
        }
    }

    /// Creates a queue aborted error.
    pub fn queue_aborted(reason: impl Into<String>) -> Self {
        Self::QueueAborted {
            reason: reason.into(),
        }
    }

    /// Returns the closest status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Closed => StatusCode::BadSessionClosed,
            Self::CannotRecreateSession => StatusCode::BadInvalidState,
            Self::ActivationFailed { .. } => StatusCode::BadSessionNotActivated,
            Self::RestoreAttemptsExhausted { .. } => StatusCode::BadSessionIdInvalid,
            Self::RestoreWaitTimedOut { .. } => StatusCode::BadTimeout,
            Self::OwnerGone => StatusCode::BadShutdown,
            Self::QueueAborted { .. } => StatusCode::BadSessionIdInvalid,
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CannotRecreateSession
                | Self::RestoreWaitTimedOut { .. }
                | Self::QueueAborted { .. }
        )
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Closed => ErrorSeverity::Warning,
            Self::CannotRecreateSession => ErrorSeverity::Warning,
            Self::ActivationFailed { .. } => ErrorSeverity::Error,
            Self::RestoreAttemptsExhausted { .. } => ErrorSeverity::Error,
            Self::RestoreWaitTimedOut { .. } => ErrorSeverity::Warning,
            Self::OwnerGone => ErrorSeverity::Critical,
            Self::QueueAborted { .. } => ErrorSeverity::Warning,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Closed => ErrorCode::new(1, 1),
            Self::CannotRecreateSession => ErrorCode::new(1, 2),
            Self::ActivationFailed { .. } => ErrorCode::new(1, 3),
            Self::RestoreAttemptsExhausted { .. } => ErrorCode::new(1, 4),
            Self::RestoreWaitTimedOut { .. } => ErrorCode::new(1, 5),
            Self::OwnerGone => ErrorCode::new(1, 6),
            Self::QueueAborted { .. } => ErrorCode::new(1, 7),
        }
    }
}

// =============================================================================
// ServiceError
// =============================================================================

/// A transaction reached the server but the service result was not Good.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The response header (or a ServiceFault) carried a bad service result.
    #[error("{operation} failed with {status}")]
    Fault {
        /// The service that failed.
        operation: &'static str,
        /// The service result.
        status: StatusCode,
        /// Diagnostics attached by the server.
        diagnostics: Option<Box<DiagnosticInfo>>,
        /// The response string table, used to resolve diagnostics.
        string_table: Vec<String>,
    },
}

impl ServiceError {
    /// Creates a fault without diagnostics.
    pub fn fault(operation: &'static str, status: StatusCode) -> Self {
        Self::Fault {
            operation,
            status,
            diagnostics: None,
            string_table: Vec::new(),
        }
    }

    /// Creates a fault with the diagnostics the server attached.
    pub fn fault_with_diagnostics(
        operation: &'static str,
        status: StatusCode,
        diagnostics: Option<DiagnosticInfo>,
        string_table: Vec<String>,
    ) -> Self {
        Self::Fault {
            operation,
            status,
            diagnostics: diagnostics.map(Box::new),
            string_table,
        }
    }

    /// Returns the service result.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Fault { status, .. } => *status,
        }
    }

    /// Returns the attached diagnostics.
    pub fn diagnostics(&self) -> Option<&DiagnosticInfo> {
        match self {
            Self::Fault { diagnostics, .. } => diagnostics.as_deref(),
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        let status = self.status();
        status.is_session_invalid()
            || status.is_communication_failure()
            || status == StatusCode::BadTooManyOperations
            || status == StatusCode::BadResourceUnavailable
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        if self.status().is_session_invalid() {
            ErrorSeverity::Warning
        } else {
            ErrorSeverity::Error
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::new(2, 1)
    }
}

// =============================================================================
// ChannelError
// =============================================================================

/// The secure channel could not complete a round trip.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel is not open.
    #[error("Secure channel is not open")]
    NotOpen,

    /// The channel closed while the request was outstanding.
    #[error("Secure channel closed: {reason}")]
    Closed {
        /// Close reason.
        reason: String,
    },

    /// The channel layer rejected the message with a status code.
    #[error("Secure channel reported {status}: {message}")]
    Status {
        /// Reported status.
        status: StatusCode,
        /// Detail message.
        message: String,
    },

    /// The channel layer timed out.
    #[error("Request timed out after {duration:?}")]
    TimedOut {
        /// Elapsed time.
        duration: Duration,
    },

    /// Underlying I/O failure.
    #[error("I/O error: {message}")]
    Io {
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<io::Error>,
    },
}

impl ChannelError {
    /// Creates a closed error.
    pub fn closed(reason: impl Into<String>) -> Self {
        Self::Closed {
            reason: reason.into(),
        }
    }

    /// Creates a status error.
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Returns the closest status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotOpen => StatusCode::BadServerNotConnected,
            Self::Closed { .. } => StatusCode::BadConnectionClosed,
            Self::Status { status, .. } => *status,
            Self::TimedOut { .. } => StatusCode::BadTimeout,
            Self::Io { .. } => StatusCode::BadCommunicationError,
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => {
                status.is_session_invalid() || status.is_communication_failure()
            }
            _ => true,
        }
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotOpen | Self::TimedOut { .. } => ErrorSeverity::Warning,
            Self::Status { status, .. } if status.is_session_invalid() => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotOpen => ErrorCode::new(3, 1),
            Self::Closed { .. } => ErrorCode::new(3, 2),
            Self::Status { .. } => ErrorCode::new(3, 3),
            Self::TimedOut { .. } => ErrorCode::new(3, 4),
            Self::Io { .. } => ErrorCode::new(3, 5),
        }
    }
}

impl From<io::Error> for ChannelError {
    fn from(error: io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
            source: Some(error),
        }
    }
}

// =============================================================================
// InternalError
// =============================================================================

/// The response violated the request/response shape contract.
#[derive(Debug, Error)]
pub enum InternalError {
    /// The response type does not answer the request type.
    #[error("Invalid response: expected {expected}, got {actual}")]
    UnexpectedResponse {
        /// Expected response type.
        expected: &'static str,
        /// Received response type.
        actual: &'static str,
    },

    /// Result array length differs from the request array length.
    #[error("{operation}: expected {expected} results, got {actual}")]
    LengthMismatch {
        /// The service.
        operation: &'static str,
        /// Items in the request.
        expected: usize,
        /// Results in the response.
        actual: usize,
    },

    /// The completion of a queued transaction was dropped before firing.
    #[error("Transaction completion dropped before a response was delivered")]
    CompletionDropped,

    /// A value required to interpret the response is missing.
    #[error("{operation}: {message}")]
    MalformedResponse {
        /// The service.
        operation: &'static str,
        /// What is missing.
        message: String,
    },
}

impl InternalError {
    /// Creates a malformed response error.
    pub fn malformed(operation: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            operation,
            message: message.into(),
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnexpectedResponse { .. } => ErrorCode::new(4, 1),
            Self::LengthMismatch { .. } => ErrorCode::new(4, 2),
            Self::CompletionDropped => ErrorCode::new(4, 3),
            Self::MalformedResponse { .. } => ErrorCode::new(4, 4),
        }
    }
}

// =============================================================================
// ConfigurationError
// =============================================================================

/// Invalid configuration or caller input.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A node reference could not be resolved.
    #[error("Invalid node ID '{input}': {reason}")]
    InvalidNodeId {
        /// The input string.
        input: String,
        /// Why it is invalid.
        reason: String,
    },

    /// A required field is missing.
    #[error("Missing required field: {field}")]
    MissingField {
        /// Field name.
        field: String,
    },

    /// A field holds an invalid value.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Why it is invalid.
        reason: String,
    },

    /// The configuration file could not be read.
    #[error("Failed to read configuration file '{path}': {message}")]
    FileRead {
        /// File path.
        path: String,
        /// Error message.
        message: String,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse {format} configuration: {message}")]
    Parse {
        /// File format.
        format: &'static str,
        /// Error message.
        message: String,
    },

    /// The file extension does not map to a supported format.
    #[error("Unsupported configuration format: '{extension}'")]
    UnsupportedFormat {
        /// The extension.
        extension: String,
    },
}

impl ConfigurationError {
    /// Creates an invalid node ID error.
    pub fn invalid_node_id(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNodeId {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the closest status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidNodeId { .. } => StatusCode::BadNodeIdInvalid,
            _ => StatusCode::BadInvalidArgument,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidNodeId { .. } => ErrorCode::new(5, 1),
            Self::MissingField { .. } => ErrorCode::new(5, 2),
            Self::InvalidValue { .. } => ErrorCode::new(5, 3),
            Self::FileRead { .. } => ErrorCode::new(5, 4),
            Self::Parse { .. } => ErrorCode::new(5, 5),
            Self::UnsupportedFormat { .. } => ErrorCode::new(5, 6),
        }
    }
}

// =============================================================================
// ResolverError
// =============================================================================

/// Extension object decoding errors.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The structure body could not be decoded.
    #[error("Failed to decode structure {type_id}: {message}")]
    DecodeFailed {
        /// Encoding id of the structure.
        type_id: String,
        /// Error message.
        message: String,
    },

    /// The body ended before every field was read.
    #[error("Structure {type_id} truncated: needed {needed} bytes, {remaining} left")]
    Truncated {
        /// Encoding id of the structure.
        type_id: String,
        /// Bytes needed by the next field.
        needed: usize,
        /// Bytes remaining.
        remaining: usize,
    },
}

impl ResolverError {
    /// Creates a decode failed error.
    pub fn decode_failed(type_id: impl fmt::Display, message: impl Into<String>) -> Self {
        Self::DecodeFailed {
            type_id: type_id.to_string(),
            message: message.into(),
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::DecodeFailed { .. } => ErrorCode::new(6, 1),
            Self::Truncated { .. } => ErrorCode::new(6, 2),
        }
    }
}

// =============================================================================
// ErrorSeverity
// =============================================================================

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational - no action required.
    Info,
    /// Warning - action may be required.
    Warning,
    /// Error - action required, but recoverable.
    Error,
    /// Critical - immediate action required.
    Critical,
}

impl ErrorSeverity {
    /// Converts to tracing level.
    pub fn to_tracing_level(self) -> Level {
        match self {
            Self::Info => Level::INFO,
            Self::Warning => Level::WARN,
            Self::Error | Self::Critical => Level::ERROR,
        }
    }

    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// ErrorCode
// =============================================================================

/// Numeric error code for operator-facing logs.
///
/// Categories:
/// - 1: Session
/// - 2: Service
/// - 3: Channel
/// - 4: Internal
/// - 5: Configuration
/// - 6: Resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    /// Category.
    pub category: u8,
    /// Specific error within category.
    pub code: u8,
}

impl ErrorCode {
    /// Creates a new error code.
    pub const fn new(category: u8, code: u8) -> Self {
        Self { category, code }
    }

    /// Returns the full error code as a u16.
    pub fn as_u16(&self) -> u16 {
        ((self.category as u16) << 8) | (self.code as u16)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UA-{:02X}{:02X}", self.category, self.code)
    }
}

/// A Result type with UaError.
pub type UaResult<T> = Result<T, UaError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_invalid_detection() {
        let fault = UaError::service(ServiceError::fault("Read", StatusCode::BadSessionClosed));
        assert!(fault.is_session_invalid());

        let channel = UaError::channel(ChannelError::status(
            StatusCode::BadSessionNotActivated,
            "rejected",
        ));
        assert!(channel.is_session_invalid());

        let other = UaError::service(ServiceError::fault("Read", StatusCode::BadNodeIdUnknown));
        assert!(!other.is_session_invalid());
        assert!(!UaError::session_closed().is_session_invalid());
    }

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            UaError::session_closed().status_code(),
            StatusCode::BadSessionClosed
        );
        assert_eq!(
            UaError::length_mismatch("Read", 2, 1).status_code(),
            StatusCode::BadInternalError
        );
        assert_eq!(
            UaError::channel(ChannelError::NotOpen).status_code(),
            StatusCode::BadServerNotConnected
        );
    }

    #[test]
    fn test_shape_errors_not_retryable() {
        assert!(!UaError::unexpected_response("ReadResponse", "WriteResponse").is_retryable());
        assert!(!UaError::length_mismatch("Write", 3, 2).is_retryable());
        assert!(UaError::cannot_recreate_session().is_retryable());
    }

    #[test]
    fn test_error_code_display() {
        let code = ErrorCode::new(1, 5);
        assert_eq!(code.to_string(), "UA-0105");
        assert_eq!(code.as_u16(), 0x0105);
        assert_eq!(UaError::session_closed().error_code().to_string(), "UA-0101");
    }

    #[test]
    fn test_category_and_severity() {
        assert_eq!(UaError::session_closed().category(), "session");
        assert_eq!(
            UaError::length_mismatch("Browse", 1, 0).severity(),
            ErrorSeverity::Critical
        );
        assert!(UaError::session_closed().user_message().contains("closed"));
    }
}
