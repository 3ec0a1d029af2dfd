//! Object store
//!
//! An instance is an ordered sequence of slot values indexed by the slot
//! numbers of its class lineage. Slots are only written through generated
//! mutators or the construction path; nothing here checks visibility.

use super::value::Value;
use crate::schema::{AttrError, AttrResult, ClassId, SlotIndex};

/// An instance of a registered class
///
/// Not internally synchronized. Sharing one instance across threads
/// requires external locking by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    class: ClassId,
    class_name: String,
    slots: Vec<Value>,
}

impl Object {
    /// Allocates an instance with every slot unset
    pub(crate) fn new(class: ClassId, class_name: impl Into<String>, slot_count: usize) -> Self {
        Self {
            class,
            class_name: class_name.into(),
            slots: vec![Value::Undef; slot_count],
        }
    }

    /// Runtime class of this instance
    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Total slot count, inherited slots included
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn slots(&self) -> &[Value] {
        &self.slots
    }

    pub(crate) fn slot(&self, slot: SlotIndex) -> AttrResult<&Value> {
        self.slots.get(slot).ok_or_else(|| self.out_of_range(slot))
    }

    pub(crate) fn store(&mut self, slot: SlotIndex, value: Value) -> AttrResult<()> {
        let err = self.out_of_range(slot);
        let cell = self.slots.get_mut(slot).ok_or(err)?;
        *cell = value;
        Ok(())
    }

    fn out_of_range(&self, slot: SlotIndex) -> AttrError {
        AttrError::Internal(format!(
            "slot {} out of range for {} instance with {} slots",
            slot,
            self.class_name,
            self.slots.len()
        ))
    }
}
