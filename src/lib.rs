//! attrdef - declared fields with visibility, defaults and validation
//!
//! Classes declare named fields on a `ClassRegistry`. Each declaration
//! allocates a storage slot, installs `get_<field>` / `set_<field>`
//! operations guarded by the field's visibility, and optionally registers
//! a default, a presence predicate and a validation rule.
//!
//! ```ignore
//! use attrdef::{rules, Attribute, Caller, ClassRegistry};
//!
//! let registry = ClassRegistry::new();
//! let person = registry.define_class("Person", None)?;
//! registry.declare(person, Attribute::new("age").like(rules::integer()?))?;
//!
//! let mut ann = registry.construct_with(person, [("age", "2008-123-1")])?;
//! assert_eq!(registry.validate(&ann), ["age = 2008-123-1 is not an Integer"]);
//! ```

pub mod access;
pub mod config;
pub mod object;
pub mod observability;
pub mod schema;

pub use access::Caller;
pub use config::RegistryConfig;
pub use object::{Object, Value};
pub use schema::{rules, AttrError, AttrResult, Attribute, ClassId, ClassRegistry, Visibility};
