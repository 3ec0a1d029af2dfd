//! Error types for the attribute engine
//!
//! Error codes:
//! - ATTR_DUPLICATE_FIELD (REJECT)
//! - ATTR_DUPLICATE_CLASS (REJECT)
//! - ATTR_ARITY (REJECT)
//! - ATTR_PROTECTED_ACCESS (REJECT)
//! - ATTR_PRIVATE_ACCESS (REJECT)
//! - ATTR_ARGUMENT (REJECT)
//! - ATTR_UNKNOWN_CLASS / ATTR_UNKNOWN_FIELD / ATTR_UNKNOWN_METHOD (REJECT)
//! - ATTR_SCHEMA_FINALIZED (REJECT)
//! - ATTR_ACCESSOR_CREATION (FATAL)
//! - ATTR_INTERNAL (FATAL)
//!
//! Every error is a programmer-error signal and is returned to the caller
//! immediately. Invalid field values are never reported here; see
//! [`crate::schema::Validator`].

use std::fmt;

use thiserror::Error;

/// Severity levels for attribute errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The offending call is rejected, the registry stays usable
    Reject,
    /// The registry is in a state it cannot recover from
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Reject => write!(f, "REJECT"),
            ErrorSeverity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Stable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrErrorCode {
    AttrDuplicateField,
    AttrDuplicateClass,
    AttrArity,
    AttrProtectedAccess,
    AttrPrivateAccess,
    AttrArgument,
    AttrUnknownClass,
    AttrUnknownField,
    AttrUnknownMethod,
    AttrSchemaFinalized,
    AttrAccessorCreation,
    AttrInternal,
}

impl AttrErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            AttrErrorCode::AttrDuplicateField => "ATTR_DUPLICATE_FIELD",
            AttrErrorCode::AttrDuplicateClass => "ATTR_DUPLICATE_CLASS",
            AttrErrorCode::AttrArity => "ATTR_ARITY",
            AttrErrorCode::AttrProtectedAccess => "ATTR_PROTECTED_ACCESS",
            AttrErrorCode::AttrPrivateAccess => "ATTR_PRIVATE_ACCESS",
            AttrErrorCode::AttrArgument => "ATTR_ARGUMENT",
            AttrErrorCode::AttrUnknownClass => "ATTR_UNKNOWN_CLASS",
            AttrErrorCode::AttrUnknownField => "ATTR_UNKNOWN_FIELD",
            AttrErrorCode::AttrUnknownMethod => "ATTR_UNKNOWN_METHOD",
            AttrErrorCode::AttrSchemaFinalized => "ATTR_SCHEMA_FINALIZED",
            AttrErrorCode::AttrAccessorCreation => "ATTR_ACCESSOR_CREATION",
            AttrErrorCode::AttrInternal => "ATTR_INTERNAL",
        }
    }

    /// Returns the severity level for this code
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AttrErrorCode::AttrAccessorCreation | AttrErrorCode::AttrInternal => ErrorSeverity::Fatal,
            _ => ErrorSeverity::Reject,
        }
    }
}

impl fmt::Display for AttrErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised by class definition, construction and field access
#[derive(Debug, Clone, Error)]
pub enum AttrError {
    // ==================
    // Definition Errors
    // ==================

    /// Field name already declared in this class or its lineage
    #[error("Field '{field}' is already declared for class {class}")]
    DuplicateField { class: String, field: String },

    /// Class name already registered
    #[error("Class '{0}' is already defined")]
    DuplicateClass(String),

    /// Schema can no longer change (instantiated or subclassed)
    #[error("Class {class} is finalized; its schema can no longer change")]
    SchemaFinalized { class: String },

    /// Malformed validator or modifier arguments
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Synthesizing an operation failed; indicates a registry bug
    #[error("Cannot create {method} on {class}: {reason}")]
    AccessorCreation {
        class: String,
        method: String,
        reason: String,
    },

    // ==================
    // Access Errors
    // ==================

    /// Operation called with the wrong number of value arguments
    #[error("{method} expects {expected} argument(s), got {got}")]
    Arity {
        method: String,
        expected: usize,
        got: usize,
    },

    /// Protected field reached from outside the declaring lineage
    #[error("{field} is a protected field of {declaring_class} and cannot be used from {caller_class}")]
    ProtectedAccessViolation {
        field: String,
        declaring_class: String,
        caller_class: String,
    },

    /// Private field reached from anywhere but the declaring class
    #[error("{field} is a private field of {declaring_class} (owned by {owner_method}) and cannot be used from {caller_class}")]
    PrivateAccessViolation {
        field: String,
        declaring_class: String,
        caller_class: String,
        owner_method: String,
    },

    // ==================
    // Lookup Errors
    // ==================

    #[error("Unknown class: {0}")]
    UnknownClass(String),

    #[error("Class {class} has no field '{field}'")]
    UnknownField { class: String, field: String },

    #[error("Class {class} has no method '{method}'")]
    UnknownMethod { class: String, method: String },

    /// Registry lock poisoned
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AttrError {
    /// Returns the error code
    pub fn code(&self) -> AttrErrorCode {
        match self {
            AttrError::DuplicateField { .. } => AttrErrorCode::AttrDuplicateField,
            AttrError::DuplicateClass(_) => AttrErrorCode::AttrDuplicateClass,
            AttrError::SchemaFinalized { .. } => AttrErrorCode::AttrSchemaFinalized,
            AttrError::Argument(_) => AttrErrorCode::AttrArgument,
            AttrError::AccessorCreation { .. } => AttrErrorCode::AttrAccessorCreation,
            AttrError::Arity { .. } => AttrErrorCode::AttrArity,
            AttrError::ProtectedAccessViolation { .. } => AttrErrorCode::AttrProtectedAccess,
            AttrError::PrivateAccessViolation { .. } => AttrErrorCode::AttrPrivateAccess,
            AttrError::UnknownClass(_) => AttrErrorCode::AttrUnknownClass,
            AttrError::UnknownField { .. } => AttrErrorCode::AttrUnknownField,
            AttrError::UnknownMethod { .. } => AttrErrorCode::AttrUnknownMethod,
            AttrError::Internal(_) => AttrErrorCode::AttrInternal,
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> ErrorSeverity {
        self.code().severity()
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == ErrorSeverity::Fatal
    }

    /// Returns whether this is a visibility violation
    pub fn is_access_violation(&self) -> bool {
        matches!(
            self,
            AttrError::ProtectedAccessViolation { .. } | AttrError::PrivateAccessViolation { .. }
        )
    }

    pub(crate) fn lock_poisoned() -> Self {
        AttrError::Internal("Lock poisoned".into())
    }
}

/// Result type for attribute operations
pub type AttrResult<T> = Result<T, AttrError>;
