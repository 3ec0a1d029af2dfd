//! Schema type definitions
//!
//! A `ClassSchema` is the per-class metadata bundle: slot assignments in
//! declaration order, defaults, validation rules and the owner map for
//! private fields. Fields are declared through the `Attribute` builder.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::errors::{AttrError, AttrResult};
use super::rules::ValidationRule;
use crate::object::Value;

/// Identity of a registered class or role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub u32);

/// Storage position of a field within an instance
pub type SlotIndex = usize;

/// Visibility of one access path (read or write) of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }

    /// Public paths are installed without a gate
    pub fn is_gated(&self) -> bool {
        !matches!(self, Visibility::Public)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which generated operation a check or owner lookup concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    Accessor,
    Mutator,
}

/// Class or role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    /// Capability bundle composed into classes; never instantiated
    Role,
}

/// Default applied at construction
#[derive(Clone)]
pub enum DefaultValue {
    Literal(Value),
    /// Zero-argument producer, invoked once per construction
    Producer(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    pub fn resolve(&self) -> Value {
        match self {
            DefaultValue::Literal(v) => v.clone(),
            DefaultValue::Producer(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            DefaultValue::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// A declared field as recorded in its class schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub slot: SlotIndex,
    pub reader: Visibility,
    pub writer: Visibility,
    /// Name of the generated predicate, if any
    pub predicate: Option<String>,
}

/// Classes owning the private operations of one slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldOwner {
    pub accessor: Option<ClassId>,
    pub mutator: Option<ClassId>,
}

/// Per-class schema
///
/// Holds only the fields declared on (or composed into) this class.
/// Inherited fields stay in the ancestor's schema; `slot_base` is the
/// ancestor's slot count at subclassing time, so own slots never collide
/// with inherited ones.
#[derive(Debug, Clone, Default)]
pub struct ClassSchema {
    fields: Vec<FieldDef>,
    by_name: HashMap<String, usize>,
    slot_base: SlotIndex,
    defaults: HashMap<String, DefaultValue>,
    validators: HashMap<String, ValidationRule>,
    field_owner: HashMap<SlotIndex, FieldOwner>,
}

impl ClassSchema {
    /// Creates an empty schema whose first slot is `slot_base`
    pub fn new(slot_base: SlotIndex) -> Self {
        Self {
            slot_base,
            ..Self::default()
        }
    }

    /// Allocates the next slot for `attr`
    ///
    /// Duplicate checks across the lineage are the registry's job; this
    /// only rejects names already present in this schema.
    pub(crate) fn declare(&mut self, attr: &Attribute, owner: ClassId) -> AttrResult<SlotIndex> {
        if self.by_name.contains_key(&attr.name) {
            return Err(AttrError::Argument(format!(
                "field '{}' already present in schema",
                attr.name
            )));
        }

        let rule = attr.rule()?;
        let slot = self.slot_count();
        self.by_name.insert(attr.name.clone(), self.fields.len());
        self.fields.push(FieldDef {
            name: attr.name.clone(),
            slot,
            reader: attr.reader,
            writer: attr.writer,
            predicate: attr.predicate.clone(),
        });

        if let Some(default) = &attr.default {
            self.defaults.insert(attr.name.clone(), default.clone());
        }
        if let Some(rule) = rule {
            self.validators.insert(attr.name.clone(), rule);
        }

        let owner_entry = FieldOwner {
            accessor: (attr.reader == Visibility::Private).then_some(owner),
            mutator: (attr.writer == Visibility::Private).then_some(owner),
        };
        if owner_entry != FieldOwner::default() {
            self.field_owner.insert(slot, owner_entry);
        }

        Ok(slot)
    }

    /// Own fields in declaration order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn slot_base(&self) -> SlotIndex {
        self.slot_base
    }

    /// Total slots of the lineage up to and including this class
    pub fn slot_count(&self) -> SlotIndex {
        self.slot_base + self.fields.len()
    }

    pub fn default_for(&self, name: &str) -> Option<&DefaultValue> {
        self.defaults.get(name)
    }

    pub fn rule_for(&self, name: &str) -> Option<&ValidationRule> {
        self.validators.get(name)
    }

    /// Class owning the private `kind` operation of `slot`
    pub fn owner(&self, slot: SlotIndex, kind: AccessKind) -> Option<ClassId> {
        let entry = self.field_owner.get(&slot)?;
        match kind {
            AccessKind::Accessor => entry.accessor,
            AccessKind::Mutator => entry.mutator,
        }
    }

    /// Rebuilds the declaration of an own field (used for role composition)
    pub(crate) fn attribute_for(&self, name: &str) -> Option<Attribute> {
        let field = self.field(name)?;
        Some(Attribute {
            name: field.name.clone(),
            reader: field.reader,
            writer: field.writer,
            default: self.defaults.get(name).cloned(),
            isa: None,
            like: self.validators.get(name).cloned(),
            predicate: field.predicate.clone(),
        })
    }
}

/// Field declaration builder
///
/// ```ignore
/// let attr = Attribute::new("email")
///     .protected()
///     .like(rules::email()?)
///     .predicate("has_email");
/// registry.declare(person, attr)?;
/// ```
///
/// Both paths default to public.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub(crate) name: String,
    pub(crate) reader: Visibility,
    pub(crate) writer: Visibility,
    pub(crate) default: Option<DefaultValue>,
    pub(crate) isa: Option<String>,
    pub(crate) like: Option<ValidationRule>,
    pub(crate) predicate: Option<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reader: Visibility::Public,
            writer: Visibility::Public,
            default: None,
            isa: None,
            like: None,
            predicate: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn public(self) -> Self {
        self.access(Visibility::Public)
    }

    pub fn protected(self) -> Self {
        self.access(Visibility::Protected)
    }

    pub fn private(self) -> Self {
        self.access(Visibility::Private)
    }

    /// Public reader, private writer
    pub fn readonly(mut self) -> Self {
        self.reader = Visibility::Public;
        self.writer = Visibility::Private;
        self
    }

    /// Same visibility on both paths
    pub fn access(mut self, visibility: Visibility) -> Self {
        self.reader = visibility;
        self.writer = visibility;
        self
    }

    pub fn reader(mut self, visibility: Visibility) -> Self {
        self.reader = visibility;
        self
    }

    pub fn writer(mut self, visibility: Visibility) -> Self {
        self.writer = visibility;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    pub fn default_with<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Producer(Arc::new(producer)));
        self
    }

    /// Value must be an instance of `type_name`
    pub fn isa(mut self, type_name: impl Into<String>) -> Self {
        self.isa = Some(type_name.into());
        self
    }

    /// Value's textual form must match `rule`
    pub fn like(mut self, rule: ValidationRule) -> Self {
        self.like = Some(rule);
        self
    }

    pub fn predicate(mut self, name: impl Into<String>) -> Self {
        self.predicate = Some(name.into());
        self
    }

    /// Applies a textual visibility token
    ///
    /// Accepted: `public`, `protected`, `private`, `readonly`, and the
    /// fine-grained `<level>_accessor` / `<level>_mutator` forms.
    pub fn modifier(self, token: &str) -> AttrResult<Self> {
        let level = |s: &str| match s {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        };

        if token == "readonly" {
            return Ok(self.readonly());
        }
        if let Some(v) = level(token) {
            return Ok(self.access(v));
        }
        if let Some(v) = token.strip_suffix("_accessor").and_then(level) {
            return Ok(self.reader(v));
        }
        if let Some(v) = token.strip_suffix("_mutator").and_then(level) {
            return Ok(self.writer(v));
        }

        Err(AttrError::Argument(format!(
            "unknown modifier '{}' for field '{}'",
            token, self.name
        )))
    }

    /// The single rule this declaration carries
    pub(crate) fn rule(&self) -> AttrResult<Option<ValidationRule>> {
        match (&self.isa, &self.like) {
            (Some(_), Some(_)) => Err(AttrError::Argument(format!(
                "field '{}' declares both isa and like",
                self.name
            ))),
            (Some(t), None) => Ok(Some(ValidationRule::isa(t.clone()))),
            (None, Some(r)) => Ok(Some(r.clone())),
            (None, None) => Ok(None),
        }
    }

    /// Field and predicate names must be plain identifiers
    pub(crate) fn check_names(&self) -> AttrResult<()> {
        check_identifier(&self.name, "field")?;
        if let Some(p) = &self.predicate {
            check_identifier(p, "predicate")?;
        }
        Ok(())
    }
}

fn check_identifier(name: &str, what: &str) -> AttrResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AttrError::Argument(format!("invalid {} name '{}'", what, name)))
    }
}
