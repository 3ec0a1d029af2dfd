//! Observable events of the attribute engine
//!
//! Events are explicit and typed. Definition-phase events fire once per
//! class or field; access and validation events fire per call.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Definition phase
    /// Class registered
    ClassDefined,
    /// Role registered
    RoleDefined,
    /// Role flattened into a class
    RoleComposed,
    /// Field declared and slot allocated
    FieldDeclared,
    /// Accessor, mutator or predicate installed on a class
    OperationInstalled,
    /// Class schema closed to further declarations
    SchemaFinalized,

    // Runtime
    /// Instance constructed with defaults applied
    InstanceConstructed,
    /// Visibility gate refused a call
    AccessDenied,
    /// Validation produced at least one failure message
    ValidationFailed,
    /// Operation synthesis failed
    AccessorCreationFailed,
}

impl Event {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ClassDefined => "CLASS_DEFINED",
            Event::RoleDefined => "ROLE_DEFINED",
            Event::RoleComposed => "ROLE_COMPOSED",
            Event::FieldDeclared => "FIELD_DECLARED",
            Event::OperationInstalled => "OPERATION_INSTALLED",
            Event::SchemaFinalized => "SCHEMA_FINALIZED",
            Event::InstanceConstructed => "INSTANCE_CONSTRUCTED",
            Event::AccessDenied => "ACCESS_DENIED",
            Event::ValidationFailed => "VALIDATION_FAILED",
            Event::AccessorCreationFailed => "ACCESSOR_CREATION_FAILED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::AccessorCreationFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
