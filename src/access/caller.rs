//! Caller identity
//!
//! Every gated call carries an explicit `Caller` naming the class whose
//! code is making the call. This replaces call-stack introspection: the
//! calling code states where it lives, and the gate compares that against
//! the field's declaring class.

use crate::schema::ClassId;

/// Capability context threaded through every accessor/mutator call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    /// Code lexically inside the given class
    Class(ClassId),
    /// The attribute engine itself (construction, defaults); never gated
    Internal,
    /// Code outside any class
    External,
}

impl Caller {
    /// Caller context for code inside `class`
    pub fn within(class: ClassId) -> Self {
        Caller::Class(class)
    }

    /// Enclosing class, if any
    pub fn class(&self) -> Option<ClassId> {
        match self {
            Caller::Class(id) => Some(*id),
            _ => None,
        }
    }

    /// Internal callers pass every gate
    pub fn is_internal(&self) -> bool {
        matches!(self, Caller::Internal)
    }
}

impl Default for Caller {
    fn default() -> Self {
        Caller::External
    }
}
