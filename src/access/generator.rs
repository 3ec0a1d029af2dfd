//! Accessor/mutator generation
//!
//! Declaring a field installs a fixed set of operations on its class:
//!
//! - an inner, ungated reader and writer bound to the slot, reachable only
//!   through the engine's privileged paths (construction, constructor
//!   arguments);
//! - the exposed `get_<field>` / `set_<field>` operations, which are the
//!   inner ones for public paths and gate-wrapped ones otherwise;
//! - optionally a predicate reporting whether the field is set.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::object::{Object, Value};
use crate::schema::{AccessKind, AttrError, AttrResult, ClassId, ClassRegistry, SlotIndex, Visibility};

use super::caller::Caller;
use super::gate::{self, FieldGuard};

/// Everything an operation sees when invoked
pub struct Invocation<'a> {
    pub registry: &'a ClassRegistry,
    pub caller: Caller,
    pub object: &'a mut Object,
    pub args: &'a [Value],
}

impl Invocation<'_> {
    fn expect_args(&self, method: &str, expected: usize) -> AttrResult<()> {
        if self.args.len() != expected {
            return Err(AttrError::Arity {
                method: method.to_string(),
                expected,
                got: self.args.len(),
            });
        }
        Ok(())
    }
}

/// A synthesized method installed on a class
pub trait Operation: Send + Sync + fmt::Debug {
    /// Name the operation is installed under
    fn name(&self) -> &str;

    fn invoke(&self, call: &mut Invocation<'_>) -> AttrResult<Value>;
}

pub fn accessor_name(field: &str) -> String {
    format!("get_{}", field)
}

pub fn mutator_name(field: &str) -> String {
    format!("set_{}", field)
}

/// Reads one slot
#[derive(Debug)]
pub struct SlotReader {
    name: String,
    slot: SlotIndex,
}

impl Operation for SlotReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, call: &mut Invocation<'_>) -> AttrResult<Value> {
        call.expect_args(&self.name, 0)?;
        call.object.slot(self.slot).cloned()
    }
}

/// Writes one slot; returns the stored value
#[derive(Debug)]
pub struct SlotWriter {
    name: String,
    slot: SlotIndex,
}

impl Operation for SlotWriter {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, call: &mut Invocation<'_>) -> AttrResult<Value> {
        call.expect_args(&self.name, 1)?;
        let value = call.args[0].clone();
        call.object.store(self.slot, value.clone())?;
        Ok(value)
    }
}

/// Runs the visibility gate, then the inner operation
#[derive(Debug)]
pub struct Gated {
    inner: Arc<dyn Operation>,
    guard: FieldGuard,
}

impl Operation for Gated {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn invoke(&self, call: &mut Invocation<'_>) -> AttrResult<Value> {
        gate::check(call.registry, &call.caller, &self.guard)?;
        self.inner.invoke(call)
    }
}

/// `true` once the field holds a defined value
///
/// Goes through the exposed accessor, so it is gated like the reader.
#[derive(Debug)]
pub struct Predicate {
    name: String,
    accessor: Arc<dyn Operation>,
}

impl Operation for Predicate {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, call: &mut Invocation<'_>) -> AttrResult<Value> {
        call.expect_args(&self.name, 0)?;
        let value = self.accessor.invoke(call)?;
        Ok(Value::Bool(value.is_defined()))
    }
}

/// Operations installed on one class
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    exposed: HashMap<String, Arc<dyn Operation>>,
    inner: HashMap<String, Arc<dyn Operation>>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exposed operation by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Operation>> {
        self.exposed.get(name).cloned()
    }

    /// Ungated operation by name
    pub(crate) fn get_inner(&self, name: &str) -> Option<Arc<dyn Operation>> {
        self.inner.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.exposed.contains_key(name)
    }

    /// Exposed operation names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.exposed.keys().cloned().collect();
        names.sort();
        names
    }

    fn install(&mut self, class_name: &str, op: Arc<dyn Operation>) -> AttrResult<()> {
        if self.exposed.contains_key(op.name()) {
            return Err(creation_error(class_name, op.name(), "method already installed"));
        }
        self.exposed.insert(op.name().to_string(), op);
        Ok(())
    }

    fn install_inner(&mut self, class_name: &str, op: Arc<dyn Operation>) -> AttrResult<()> {
        if self.inner.contains_key(op.name()) {
            return Err(creation_error(class_name, op.name(), "inner method already installed"));
        }
        self.inner.insert(op.name().to_string(), op);
        Ok(())
    }
}

fn creation_error(class_name: &str, method: &str, reason: &str) -> AttrError {
    AttrError::AccessorCreation {
        class: class_name.to_string(),
        method: method.to_string(),
        reason: reason.to_string(),
    }
}

/// Slot and ownership facts the generator binds operations to
#[derive(Debug, Clone)]
pub struct FieldBinding<'a> {
    pub class: ClassId,
    pub class_name: &'a str,
    pub field: &'a str,
    pub slot: SlotIndex,
}

impl FieldBinding<'_> {
    fn wrap(&self, inner: Arc<dyn Operation>, level: Visibility, kind: AccessKind) -> Arc<dyn Operation> {
        if !level.is_gated() {
            return inner;
        }
        Arc::new(Gated {
            inner,
            guard: FieldGuard {
                field: self.field.to_string(),
                declaring: self.class,
                level,
                kind,
                slot: self.slot,
            },
        })
    }
}

/// Installs `get_<field>` and its inner reader
pub fn make_accessor(table: &mut MethodTable, binding: &FieldBinding<'_>, level: Visibility) -> AttrResult<()> {
    let inner: Arc<dyn Operation> = Arc::new(SlotReader {
        name: accessor_name(binding.field),
        slot: binding.slot,
    });
    table.install_inner(binding.class_name, Arc::clone(&inner))?;
    table.install(binding.class_name, binding.wrap(inner, level, AccessKind::Accessor))
}

/// Installs `set_<field>` and its inner writer
pub fn make_mutator(table: &mut MethodTable, binding: &FieldBinding<'_>, level: Visibility) -> AttrResult<()> {
    let inner: Arc<dyn Operation> = Arc::new(SlotWriter {
        name: mutator_name(binding.field),
        slot: binding.slot,
    });
    table.install_inner(binding.class_name, Arc::clone(&inner))?;
    table.install(binding.class_name, binding.wrap(inner, level, AccessKind::Mutator))
}

/// Installs predicate `name` over the field's exposed accessor
pub fn make_predicate(table: &mut MethodTable, binding: &FieldBinding<'_>, name: &str) -> AttrResult<()> {
    let accessor = table.get(&accessor_name(binding.field)).ok_or_else(|| {
        creation_error(binding.class_name, name, "field has no accessor to test")
    })?;
    table.install(
        binding.class_name,
        Arc::new(Predicate {
            name: name.to_string(),
            accessor,
        }),
    )
}
