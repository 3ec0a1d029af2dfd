//! Class schemas: slot allocation, defaults, validation
//!
//! # Design Principles
//!
//! - Slots are unique across a class and all of its ancestors
//! - A schema is append-only until the class is instantiated or
//!   subclassed, and read-only afterwards
//! - Declarations are all-or-nothing
//! - Validation reports, it never rejects

mod errors;
mod registry;
pub mod rules;
mod types;
mod validator;

pub use errors::{AttrError, AttrErrorCode, AttrResult, ErrorSeverity};
pub use registry::ClassRegistry;
pub use rules::ValidationRule;
pub use types::{
    AccessKind, Attribute, ClassId, ClassKind, ClassSchema, DefaultValue, FieldDef, FieldOwner, SlotIndex,
    Visibility,
};
pub use validator::Validator;
