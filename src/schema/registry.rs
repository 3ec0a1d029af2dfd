//! Class registry
//!
//! The process-wide home of every class schema, passed around explicitly
//! rather than held in ambient global state. Lifecycle of a class:
//!
//! 1. defined (`define_class` / `define_role`)
//! 2. fields declared and roles composed; each declaration allocates a slot
//!    and installs the field's operations
//! 3. finalized on first construction or first subclass; from then on the
//!    schema is read-only
//!
//! All schema writes go through one `RwLock`. Operations are cloned out of
//! the table before they run, so no lock is held while a gate or a default
//! producer re-enters the registry.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::errors::{AttrError, AttrResult};
use super::rules::ValidationRule;
use super::types::{AccessKind, Attribute, ClassId, ClassKind, ClassSchema, DefaultValue, FieldDef, SlotIndex};
use super::validator::Validator;
use crate::access::generator::{make_accessor, make_mutator, make_predicate, FieldBinding};
use crate::access::{accessor_name, mutator_name, Caller, Invocation, MethodTable, Operation};
use crate::config::RegistryConfig;
use crate::object::{Object, Value};
use crate::observability::{log_event, Event, MetricsRegistry, Severity};

/// Everything registered for one class or role
#[derive(Debug)]
struct ClassDef {
    id: ClassId,
    name: String,
    kind: ClassKind,
    parent: Option<ClassId>,
    roles: Vec<ClassId>,
    schema: ClassSchema,
    methods: MethodTable,
    finalized: bool,
}

#[derive(Debug, Default)]
struct ClassTable {
    classes: Vec<ClassDef>,
    by_name: HashMap<String, ClassId>,
}

impl ClassTable {
    fn get(&self, id: ClassId) -> AttrResult<&ClassDef> {
        self.classes
            .get(id.0 as usize)
            .ok_or_else(|| AttrError::UnknownClass(format!("#{}", id.0)))
    }

    fn get_mut(&mut self, id: ClassId) -> AttrResult<&mut ClassDef> {
        self.classes
            .get_mut(id.0 as usize)
            .ok_or_else(|| AttrError::UnknownClass(format!("#{}", id.0)))
    }

    /// `id` followed by its ancestors, nearest first
    fn ancestry(&self, id: ClassId) -> AttrResult<Vec<ClassId>> {
        let mut chain = vec![id];
        let mut current = self.get(id)?.parent;
        while let Some(parent) = current {
            chain.push(parent);
            current = self.get(parent)?.parent;
        }
        Ok(chain)
    }

    /// Root ancestor first, `id` last
    fn lineage(&self, id: ClassId) -> AttrResult<Vec<&ClassDef>> {
        let mut chain = self.ancestry(id)?;
        chain.reverse();
        chain.into_iter().map(|c| self.get(c)).collect()
    }

    /// Nearest class in the lineage declaring `field`
    fn find_field(&self, id: ClassId, field: &str) -> AttrResult<Option<(&ClassDef, &FieldDef)>> {
        for class in self.ancestry(id)? {
            let def = self.get(class)?;
            if let Some(f) = def.schema.field(field) {
                return Ok(Some((def, f)));
            }
        }
        Ok(None)
    }

    /// Roles composed anywhere in the lineage, transitively
    fn composes(&self, id: ClassId, role: ClassId) -> AttrResult<bool> {
        let mut pending = self.ancestry(id)?;
        let mut seen = Vec::new();
        while let Some(current) = pending.pop() {
            if seen.contains(&current) {
                continue;
            }
            seen.push(current);
            let def = self.get(current)?;
            if def.roles.contains(&role) {
                return Ok(true);
            }
            pending.extend(def.roles.iter().copied());
        }
        Ok(false)
    }
}

/// Registry of class schemas and their synthesized operations
#[derive(Debug)]
pub struct ClassRegistry {
    config: RegistryConfig,
    table: RwLock<ClassTable>,
    metrics: MetricsRegistry,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassRegistry {
    /// Create an empty registry with the default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            table: RwLock::new(ClassTable::default()),
            metrics: MetricsRegistry::new(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    fn read(&self) -> AttrResult<RwLockReadGuard<'_, ClassTable>> {
        self.table.read().map_err(|_| AttrError::lock_poisoned())
    }

    fn write(&self) -> AttrResult<RwLockWriteGuard<'_, ClassTable>> {
        self.table.write().map_err(|_| AttrError::lock_poisoned())
    }

    pub(crate) fn log(&self, severity: Severity, event: Event, fields: &[(&str, &str)]) {
        if event.is_fatal() || self.config.logs(severity) {
            log_event(severity, event, fields);
        }
    }

    // ==================
    // Class definition
    // ==================

    /// Registers a class, optionally inheriting from `parent`
    ///
    /// Subclassing finalizes the parent's schema.
    pub fn define_class(&self, name: &str, parent: Option<ClassId>) -> AttrResult<ClassId> {
        self.define(name, parent, ClassKind::Class)
    }

    /// Registers a role: a bundle of fields composed into classes
    pub fn define_role(&self, name: &str) -> AttrResult<ClassId> {
        self.define(name, None, ClassKind::Role)
    }

    fn define(&self, name: &str, parent: Option<ClassId>, kind: ClassKind) -> AttrResult<ClassId> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(AttrError::Argument(format!("invalid class name '{}'", name)));
        }

        let mut table = self.write()?;
        if table.by_name.contains_key(name) {
            return Err(AttrError::DuplicateClass(name.to_string()));
        }

        let (slot_base, parent_name) = match parent {
            Some(p) => {
                let parent_def = table.get_mut(p)?;
                if parent_def.kind == ClassKind::Role {
                    return Err(AttrError::Argument(format!(
                        "{} is a role and cannot be subclassed",
                        parent_def.name
                    )));
                }
                parent_def.finalized = true;
                (parent_def.schema.slot_count(), parent_def.name.clone())
            }
            None => (0, String::new()),
        };

        let id = ClassId(table.classes.len() as u32);
        table.classes.push(ClassDef {
            id,
            name: name.to_string(),
            kind,
            parent,
            roles: Vec::new(),
            schema: ClassSchema::new(slot_base),
            methods: MethodTable::new(),
            finalized: false,
        });
        table.by_name.insert(name.to_string(), id);
        drop(table);

        self.metrics.increment_classes();
        let event = match kind {
            ClassKind::Class => Event::ClassDefined,
            ClassKind::Role => Event::RoleDefined,
        };
        self.log(Severity::Info, event, &[("class", name), ("parent", &parent_name)]);
        Ok(id)
    }

    /// Declares a field on `class` and installs its operations
    ///
    /// Fails with `DuplicateField` if the name is already declared on the
    /// class or any ancestor. The declaration is all-or-nothing: on error
    /// the schema and method table are left untouched.
    pub fn declare(&self, class: ClassId, attr: Attribute) -> AttrResult<SlotIndex> {
        attr.check_names()?;

        let result = {
            let mut table = self.write()?;
            Self::declare_locked(&mut table, class, &attr)
        };

        match &result {
            Ok(slot) => {
                self.metrics.increment_fields();
                let class_name = self.class_name(class)?;
                self.log(
                    Severity::Info,
                    Event::FieldDeclared,
                    &[
                        ("class", &class_name),
                        ("field", attr.name()),
                        ("slot", &slot.to_string()),
                        ("reader", attr.reader.as_str()),
                        ("writer", attr.writer.as_str()),
                    ],
                );
                let mut installed = vec![accessor_name(attr.name()), mutator_name(attr.name())];
                installed.extend(attr.predicate.iter().cloned());
                for method in &installed {
                    self.log(
                        Severity::Trace,
                        Event::OperationInstalled,
                        &[("class", &class_name), ("method", method)],
                    );
                }
            }
            Err(e @ AttrError::AccessorCreation { .. }) => {
                self.log(Severity::Fatal, Event::AccessorCreationFailed, &[("error", &e.to_string())]);
            }
            Err(_) => {}
        }
        result
    }

    fn declare_locked(table: &mut ClassTable, class: ClassId, attr: &Attribute) -> AttrResult<SlotIndex> {
        let def = table.get(class)?;
        if def.finalized {
            return Err(AttrError::SchemaFinalized {
                class: def.name.clone(),
            });
        }
        if table.find_field(class, &attr.name)?.is_some() {
            return Err(AttrError::DuplicateField {
                class: def.name.clone(),
                field: attr.name.clone(),
            });
        }

        let mut names = vec![accessor_name(&attr.name), mutator_name(&attr.name)];
        if let Some(predicate) = &attr.predicate {
            if names.contains(predicate) {
                return Err(AttrError::Argument(format!(
                    "predicate '{}' collides with an operation of field '{}'",
                    predicate, attr.name
                )));
            }
            names.push(predicate.clone());
        }
        // Operation names are unique across the lineage
        for ancestor in table.lineage(class)? {
            if let Some(taken) = names.iter().find(|m| ancestor.methods.contains(m.as_str())) {
                return Err(AttrError::Argument(format!(
                    "method '{}' is already defined on {}",
                    taken, ancestor.name
                )));
            }
        }

        let def = table.get_mut(class)?;
        let mut schema = def.schema.clone();
        let mut methods = def.methods.clone();

        let slot = schema.declare(attr, class)?;
        let binding = FieldBinding {
            class,
            class_name: &def.name,
            field: &attr.name,
            slot,
        };
        make_accessor(&mut methods, &binding, attr.reader)?;
        make_mutator(&mut methods, &binding, attr.writer)?;
        if let Some(predicate) = &attr.predicate {
            make_predicate(&mut methods, &binding, predicate)?;
        }

        def.schema = schema;
        def.methods = methods;
        Ok(slot)
    }

    /// Flattens the fields of `role` into `class`
    ///
    /// Composed fields get fresh slots in `class`, and `class` becomes
    /// their declaring class. All-or-nothing like `declare`.
    pub fn compose(&self, class: ClassId, role: ClassId) -> AttrResult<()> {
        let mut table = self.write()?;

        let role_def = table.get(role)?;
        if role_def.kind != ClassKind::Role {
            return Err(AttrError::Argument(format!("{} is not a role", role_def.name)));
        }
        let role_name = role_def.name.clone();
        let attrs: Vec<Attribute> = role_def
            .schema
            .fields()
            .iter()
            .filter_map(|f| role_def.schema.attribute_for(&f.name))
            .collect();

        if class == role || table.composes(role, class)? {
            return Err(AttrError::Argument(format!("{} cannot compose itself", role_name)));
        }

        let target = table.get(class)?;
        if target.finalized {
            return Err(AttrError::SchemaFinalized {
                class: target.name.clone(),
            });
        }
        if table.composes(class, role)? {
            return Err(AttrError::Argument(format!(
                "{} already composes {}",
                target.name, role_name
            )));
        }
        let class_name = target.name.clone();
        let backup = (target.schema.clone(), target.methods.clone());

        for attr in &attrs {
            if let Err(e) = Self::declare_locked(&mut table, class, attr) {
                let target = table.get_mut(class)?;
                target.schema = backup.0;
                target.methods = backup.1;
                return Err(e);
            }
        }

        table.get_mut(class)?.roles.push(role);
        table.get_mut(role)?.finalized = true;
        drop(table);

        for _ in &attrs {
            self.metrics.increment_fields();
        }
        self.log(
            Severity::Info,
            Event::RoleComposed,
            &[("class", &class_name), ("role", &role_name)],
        );
        Ok(())
    }

    // ==================
    // Lookup
    // ==================

    pub fn class_id(&self, name: &str) -> AttrResult<ClassId> {
        self.read()?
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| AttrError::UnknownClass(name.to_string()))
    }

    pub fn class_name(&self, id: ClassId) -> AttrResult<String> {
        Ok(self.read()?.get(id)?.name.clone())
    }

    pub fn parent_of(&self, id: ClassId) -> AttrResult<Option<ClassId>> {
        Ok(self.read()?.get(id)?.parent)
    }

    pub fn is_role(&self, id: ClassId) -> AttrResult<bool> {
        Ok(self.read()?.get(id)?.kind == ClassKind::Role)
    }

    pub fn is_finalized(&self, id: ClassId) -> AttrResult<bool> {
        Ok(self.read()?.get(id)?.finalized)
    }

    /// Name used for `caller` in violation messages
    pub fn caller_name(&self, caller: &Caller) -> AttrResult<String> {
        match caller {
            Caller::Class(id) => self.class_name(*id),
            Caller::Internal => Ok("<internal>".to_string()),
            Caller::External => Ok("<external>".to_string()),
        }
    }

    /// Strict descendant check through the parent chain
    pub fn is_subclass_of(&self, class: ClassId, ancestor: ClassId) -> AttrResult<bool> {
        let table = self.read()?;
        Ok(table.ancestry(class)?.into_iter().skip(1).any(|c| c == ancestor))
    }

    /// True if `role` is composed into `class` or one of its ancestors
    pub fn does(&self, class: ClassId, role: ClassId) -> AttrResult<bool> {
        self.read()?.composes(class, role)
    }

    /// Runtime type/ancestry query: same class, descendant, or composer
    pub fn is_a(&self, class: ClassId, other: ClassId) -> AttrResult<bool> {
        Ok(class == other || self.is_subclass_of(class, other)? || self.does(class, other)?)
    }

    /// Total slot count of instances of `class`
    pub fn slot_count(&self, class: ClassId) -> AttrResult<usize> {
        Ok(self.read()?.get(class)?.schema.slot_count())
    }

    /// All fields visible on `class`, root ancestor's first
    pub fn fields(&self, class: ClassId) -> AttrResult<Vec<FieldDef>> {
        let table = self.read()?;
        Ok(table
            .lineage(class)?
            .into_iter()
            .flat_map(|d| d.schema.fields().iter().cloned())
            .collect())
    }

    /// Field by name, inherited fields included
    pub fn field(&self, class: ClassId, name: &str) -> AttrResult<FieldDef> {
        let table = self.read()?;
        match table.find_field(class, name)? {
            Some((_, field)) => Ok(field.clone()),
            None => Err(AttrError::UnknownField {
                class: table.get(class)?.name.clone(),
                field: name.to_string(),
            }),
        }
    }

    /// Class that declared `name` as seen from `class`
    pub fn declaring_class(&self, class: ClassId, name: &str) -> AttrResult<ClassId> {
        let table = self.read()?;
        match table.find_field(class, name)? {
            Some((def, _)) => Ok(def.id),
            None => Err(AttrError::UnknownField {
                class: table.get(class)?.name.clone(),
                field: name.to_string(),
            }),
        }
    }

    /// Names of all exposed operations callable on `class`, sorted
    pub fn methods(&self, class: ClassId) -> AttrResult<Vec<String>> {
        let table = self.read()?;
        let mut names: Vec<String> = table
            .lineage(class)?
            .into_iter()
            .flat_map(|d| d.methods.names())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Class owning the private `kind` operation of `slot` on `declaring`
    pub fn field_owner(&self, declaring: ClassId, slot: SlotIndex, kind: AccessKind) -> AttrResult<Option<ClassId>> {
        Ok(self.read()?.get(declaring)?.schema.owner(slot, kind))
    }

    /// Rules registered anywhere in the lineage, root ancestor's first
    pub(crate) fn rules_for(&self, class: ClassId) -> AttrResult<Vec<(String, SlotIndex, ValidationRule)>> {
        let table = self.read()?;
        let mut rules = Vec::new();
        for def in table.lineage(class)? {
            for field in def.schema.fields() {
                if let Some(rule) = def.schema.rule_for(&field.name) {
                    rules.push((field.name.clone(), field.slot, rule.clone()));
                }
            }
        }
        Ok(rules)
    }

    /// Whether `value` is an instance of the named type
    ///
    /// Built-in names: `Any`, `Str`, `Int`, `Float`, `Num`, `Bool`.
    /// Any other name must be a registered class or role.
    pub fn type_matches(&self, value: &Value, type_name: &str) -> bool {
        match (type_name, value) {
            ("Any", _) => true,
            ("Str", Value::Str(_)) => true,
            ("Int", Value::Int(_)) => true,
            ("Float", Value::Float(_)) => true,
            ("Num", Value::Int(_) | Value::Float(_)) => true,
            ("Bool", Value::Bool(_)) => true,
            (_, Value::Object(obj)) => match self.class_id(type_name) {
                Ok(expected) => self.is_a(obj.class(), expected).unwrap_or(false),
                Err(_) => false,
            },
            _ => false,
        }
    }

    // ==================
    // Construction
    // ==================

    /// Creates an instance and applies every default in the lineage
    ///
    /// Defaults are resolved (producers invoked) and stored through the
    /// inner mutators: no gate, no validation.
    pub fn construct(&self, class: ClassId) -> AttrResult<Object> {
        if self.is_role(class)? {
            return Err(AttrError::Argument(format!(
                "{} is a role and cannot be instantiated",
                self.class_name(class)?
            )));
        }
        self.finalize_lineage(class)?;

        let (mut object, plan) = {
            let table = self.read()?;
            let def = table.get(class)?;
            let object = Object::new(class, def.name.clone(), def.schema.slot_count());

            let mut plan: Vec<(Arc<dyn Operation>, DefaultValue)> = Vec::new();
            for d in table.lineage(class)? {
                for field in d.schema.fields() {
                    let Some(default) = d.schema.default_for(&field.name) else {
                        continue;
                    };
                    let setter = d.methods.get_inner(&mutator_name(&field.name)).ok_or_else(|| {
                        AttrError::AccessorCreation {
                            class: d.name.clone(),
                            method: mutator_name(&field.name),
                            reason: "no inner mutator installed".into(),
                        }
                    })?;
                    plan.push((setter, default.clone()));
                }
            }
            (object, plan)
        };

        for (setter, default) in plan {
            let value = default.resolve();
            self.invoke(&setter, Caller::Internal, &mut object, &[value])?;
        }

        self.metrics.increment_instances();
        self.log(
            Severity::Trace,
            Event::InstanceConstructed,
            &[("class", object.class_name())],
        );
        Ok(object)
    }

    /// `construct`, then stores each `(field, value)` argument
    ///
    /// Arguments go through the inner mutators, so read-only and private
    /// fields (inherited ones included) can be initialized here.
    pub fn construct_with<I, K, V>(&self, class: ClassId, args: I) -> AttrResult<Object>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut object = self.construct(class)?;
        for (field, value) in args {
            let setter = self.inner_mutator(class, field.as_ref())?;
            self.invoke(&setter, Caller::Internal, &mut object, &[value.into()])?;
        }
        Ok(object)
    }

    fn inner_mutator(&self, class: ClassId, field: &str) -> AttrResult<Arc<dyn Operation>> {
        let table = self.read()?;
        let found = table
            .find_field(class, field)?
            .and_then(|(def, _)| def.methods.get_inner(&mutator_name(field)));
        match found {
            Some(op) => Ok(op),
            None => Err(AttrError::UnknownField {
                class: table.get(class)?.name.clone(),
                field: field.to_string(),
            }),
        }
    }

    fn finalize_lineage(&self, class: ClassId) -> AttrResult<()> {
        let pending: Vec<ClassId> = {
            let table = self.read()?;
            table
                .ancestry(class)?
                .into_iter()
                .filter(|c| table.get(*c).map(|d| !d.finalized).unwrap_or(false))
                .collect()
        };
        if pending.is_empty() {
            return Ok(());
        }

        let mut names = Vec::new();
        {
            let mut table = self.write()?;
            for id in pending {
                let def = table.get_mut(id)?;
                if !def.finalized {
                    def.finalized = true;
                    names.push(def.name.clone());
                }
            }
        }
        for name in names {
            self.log(Severity::Trace, Event::SchemaFinalized, &[("class", &name)]);
        }
        Ok(())
    }

    // ==================
    // Runtime access
    // ==================

    fn invoke(
        &self,
        op: &Arc<dyn Operation>,
        caller: Caller,
        object: &mut Object,
        args: &[Value],
    ) -> AttrResult<Value> {
        let mut call = Invocation {
            registry: self,
            caller,
            object,
            args,
        };
        op.invoke(&mut call)
    }

    /// Nearest exposed operation named `method` in the object's lineage
    fn resolve_method(&self, class: ClassId, method: &str) -> AttrResult<Arc<dyn Operation>> {
        let table = self.read()?;
        for id in table.ancestry(class)? {
            if let Some(op) = table.get(id)?.methods.get(method) {
                return Ok(op);
            }
        }
        Err(AttrError::UnknownMethod {
            class: table.get(class)?.name.clone(),
            method: method.to_string(),
        })
    }

    /// Invokes `method` on `object` on behalf of `caller`
    pub fn call(&self, caller: Caller, object: &mut Object, method: &str, args: &[Value]) -> AttrResult<Value> {
        let op = self.resolve_method(object.class(), method)?;
        self.invoke(&op, caller, object, args)
    }

    /// `get_<field>`
    pub fn get(&self, caller: Caller, object: &mut Object, field: &str) -> AttrResult<Value> {
        self.call(caller, object, &accessor_name(field), &[])
    }

    /// `set_<field>`
    pub fn set(&self, caller: Caller, object: &mut Object, field: &str, value: impl Into<Value>) -> AttrResult<Value> {
        self.call(caller, object, &mutator_name(field), &[value.into()])
    }

    /// Presence check through the field's predicate, or its accessor when
    /// it has none; gated like the reader either way
    pub fn has(&self, caller: Caller, object: &mut Object, field: &str) -> AttrResult<bool> {
        let def = self.field(object.class(), field)?;
        match def.predicate {
            Some(predicate) => Ok(self.call(caller, object, &predicate, &[])?.as_bool().unwrap_or(false)),
            None => Ok(self.get(caller, object, field)?.is_defined()),
        }
    }

    /// Field name to current value for every field of the object's class
    ///
    /// Unset fields appear as `Value::Undef`. Callable only from the
    /// object's own class or internally.
    pub fn attributes(&self, caller: Caller, object: &Object) -> AttrResult<BTreeMap<String, Value>> {
        let class = object.class();
        self.metrics.increment_gate_checks();

        if !(caller.is_internal() || caller.class() == Some(class)) {
            let class_name = self.class_name(class)?;
            let err = AttrError::PrivateAccessViolation {
                field: "attributes".into(),
                declaring_class: class_name.clone(),
                caller_class: self.caller_name(&caller)?,
                owner_method: format!("{}::attributes", class_name),
            };
            self.record_denial(&err);
            return Err(err);
        }

        let table = self.read()?;
        let mut map = BTreeMap::new();
        for def in table.lineage(class)? {
            for field in def.schema.fields() {
                map.insert(field.name.clone(), object.slot(field.slot)?.clone());
            }
        }
        Ok(map)
    }

    /// `attributes` rendered as a JSON object
    pub fn attributes_json(&self, caller: Caller, object: &Object) -> AttrResult<serde_json::Value> {
        let map: serde_json::Map<String, serde_json::Value> = self
            .attributes(caller, object)?
            .into_iter()
            .map(|(k, v)| (k, v.to_json()))
            .collect();
        Ok(serde_json::Value::Object(map))
    }

    /// Failure messages for `object`; empty means valid
    pub fn validate(&self, object: &Object) -> Vec<String> {
        Validator::new(self).validate(object)
    }

    pub(crate) fn record_denial(&self, err: &AttrError) {
        self.metrics.increment_gate_denials();
        if !self.config.log_access_denials {
            return;
        }
        if let AttrError::ProtectedAccessViolation {
            field,
            declaring_class,
            caller_class,
        }
        | AttrError::PrivateAccessViolation {
            field,
            declaring_class,
            caller_class,
            ..
        } = err
        {
            self.log(
                Severity::Warn,
                Event::AccessDenied,
                &[
                    ("field", field),
                    ("declaring_class", declaring_class),
                    ("caller_class", caller_class),
                    ("code", err.code().code()),
                ],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::rules;

    fn registry() -> ClassRegistry {
        ClassRegistry::with_config(RegistryConfig::quiet())
    }

    #[test]
    fn test_define_and_lookup() {
        let registry = registry();
        let person = registry.define_class("Person", None).unwrap();
        assert_eq!(registry.class_id("Person").unwrap(), person);
        assert_eq!(registry.class_name(person).unwrap(), "Person");
        assert!(registry.class_id("Nobody").is_err());
    }

    #[test]
    fn test_duplicate_class() {
        let registry = registry();
        registry.define_class("Person", None).unwrap();
        let err = registry.define_class("Person", None).unwrap_err();
        assert_eq!(err.code().code(), "ATTR_DUPLICATE_CLASS");
    }

    #[test]
    fn test_slots_unique_across_lineage() {
        let registry = registry();
        let base = registry.define_class("Base", None).unwrap();
        let a = registry.declare(base, Attribute::new("a")).unwrap();
        let b = registry.declare(base, Attribute::new("b")).unwrap();
        let child = registry.define_class("Child", Some(base)).unwrap();
        let c = registry.declare(child, Attribute::new("c")).unwrap();
        let sibling = registry.define_class("Sibling", Some(base)).unwrap();
        let d = registry.declare(sibling, Attribute::new("d")).unwrap();

        let mut child_slots = vec![a, b, c];
        child_slots.sort();
        child_slots.dedup();
        assert_eq!(child_slots.len(), 3);
        assert!(d != a && d != b);
        assert_eq!(registry.slot_count(child).unwrap(), 3);
        assert_eq!(registry.field(child, "a").unwrap().slot, a);
    }

    #[test]
    fn test_duplicate_field_in_class_and_lineage() {
        let registry = registry();
        let base = registry.define_class("Base", None).unwrap();
        registry.declare(base, Attribute::new("name")).unwrap();
        let err = registry.declare(base, Attribute::new("name")).unwrap_err();
        assert!(matches!(err, AttrError::DuplicateField { .. }));

        let child = registry.define_class("Child", Some(base)).unwrap();
        let err = registry.declare(child, Attribute::new("name")).unwrap_err();
        assert!(matches!(err, AttrError::DuplicateField { .. }));
    }

    #[test]
    fn test_parent_finalized_by_subclassing() {
        let registry = registry();
        let base = registry.define_class("Base", None).unwrap();
        registry.define_class("Child", Some(base)).unwrap();
        assert!(registry.is_finalized(base).unwrap());
        let err = registry.declare(base, Attribute::new("late")).unwrap_err();
        assert_eq!(err.code().code(), "ATTR_SCHEMA_FINALIZED");
    }

    #[test]
    fn test_failed_declaration_leaves_schema_untouched() {
        let registry = registry();
        let class = registry.define_class("Thing", None).unwrap();
        registry
            .declare(class, Attribute::new("a").predicate("get_b"))
            .unwrap();

        // get_b is taken by the predicate above
        let err = registry.declare(class, Attribute::new("b")).unwrap_err();
        assert_eq!(err.code().code(), "ATTR_ARGUMENT");
        assert!(!err.is_fatal());
        assert!(registry.field(class, "b").is_err());
        assert_eq!(registry.slot_count(class).unwrap(), 1);
    }

    #[test]
    fn test_predicate_cannot_shadow_inherited_mutator() {
        let registry = registry();
        let base = registry.define_class("Base", None).unwrap();
        registry.declare(base, Attribute::new("a")).unwrap();
        let child = registry.define_class("Child", Some(base)).unwrap();

        let err = registry
            .declare(child, Attribute::new("b").predicate("set_a"))
            .unwrap_err();
        assert!(matches!(err, AttrError::Argument(_)));
        assert!(registry.field(child, "b").is_err());

        let mut obj = registry.construct(child).unwrap();
        assert_eq!(
            registry.set(Caller::External, &mut obj, "a", "x").unwrap(),
            Value::from("x")
        );
    }

    #[test]
    fn test_field_cannot_shadow_inherited_predicate() {
        let registry = registry();
        let base = registry.define_class("Base", None).unwrap();
        registry.declare(base, Attribute::new("a").predicate("get_b")).unwrap();
        let child = registry.define_class("Child", Some(base)).unwrap();

        let err = registry.declare(child, Attribute::new("b")).unwrap_err();
        assert!(matches!(err, AttrError::Argument(_)));
    }

    #[test]
    fn test_predicate_cannot_reuse_own_accessor_name() {
        let registry = registry();
        let class = registry.define_class("Thing", None).unwrap();
        let err = registry
            .declare(class, Attribute::new("a").predicate("get_a"))
            .unwrap_err();
        assert!(matches!(err, AttrError::Argument(_)));
        assert_eq!(registry.slot_count(class).unwrap(), 0);
    }

    #[test]
    fn test_caller_names() {
        let registry = registry();
        let class = registry.define_class("Thing", None).unwrap();
        assert_eq!(registry.caller_name(&Caller::within(class)).unwrap(), "Thing");
        assert_eq!(registry.caller_name(&Caller::External).unwrap(), "<external>");
        assert_eq!(registry.caller_name(&Caller::Internal).unwrap(), "<internal>");
    }

    #[test]
    fn test_role_composition() {
        let registry = registry();
        let role = registry.define_role("Timestamped").unwrap();
        registry
            .declare(role, Attribute::new("created").default_value("now").like(rules::length(1, 10).unwrap()))
            .unwrap();
        let doc = registry.define_class("Document", None).unwrap();
        registry.declare(doc, Attribute::new("title")).unwrap();
        registry.compose(doc, role).unwrap();

        assert!(registry.does(doc, role).unwrap());
        assert!(registry.is_a(doc, role).unwrap());
        assert_eq!(registry.declaring_class(doc, "created").unwrap(), doc);

        let mut obj = registry.construct(doc).unwrap();
        assert_eq!(
            registry.get(Caller::External, &mut obj, "created").unwrap(),
            Value::from("now")
        );
        assert!(registry.construct(role).is_err());
    }

    #[test]
    fn test_compose_conflict_is_atomic() {
        let registry = registry();
        let role = registry.define_role("Named").unwrap();
        registry.declare(role, Attribute::new("nickname")).unwrap();
        registry.declare(role, Attribute::new("name")).unwrap();
        let person = registry.define_class("Person", None).unwrap();
        registry.declare(person, Attribute::new("name")).unwrap();

        assert!(registry.compose(person, role).is_err());
        assert!(registry.field(person, "nickname").is_err());
        assert!(!registry.does(person, role).unwrap());
    }

    #[test]
    fn test_cannot_subclass_role_or_compose_class() {
        let registry = registry();
        let role = registry.define_role("R").unwrap();
        let class = registry.define_class("C", None).unwrap();
        assert!(registry.define_class("D", Some(role)).is_err());
        assert!(registry.compose(role, class).is_err());
    }

    #[test]
    fn test_methods_lists_inherited() {
        let registry = registry();
        let base = registry.define_class("Base", None).unwrap();
        registry.declare(base, Attribute::new("a").predicate("has_a")).unwrap();
        let child = registry.define_class("Child", Some(base)).unwrap();
        registry.declare(child, Attribute::new("b")).unwrap();

        let methods = registry.methods(child).unwrap();
        assert_eq!(methods, vec!["get_a", "get_b", "has_a", "set_a", "set_b"]);
    }

    #[test]
    fn test_unknown_method() {
        let registry = registry();
        let class = registry.define_class("C", None).unwrap();
        let mut obj = registry.construct(class).unwrap();
        let err = registry.get(Caller::External, &mut obj, "missing").unwrap_err();
        assert_eq!(err.code().code(), "ATTR_UNKNOWN_METHOD");
    }

    #[test]
    fn test_type_matches() {
        let registry = registry();
        let animal = registry.define_class("Animal", None).unwrap();
        let dog = registry.define_class("Dog", Some(animal)).unwrap();
        let rex = Value::from(registry.construct(dog).unwrap());

        assert!(registry.type_matches(&rex, "Dog"));
        assert!(registry.type_matches(&rex, "Animal"));
        assert!(!registry.type_matches(&Value::from(registry.construct(animal).unwrap()), "Dog"));
        assert!(!registry.type_matches(&rex, "Unicorn"));
        assert!(registry.type_matches(&Value::from(3), "Num"));
        assert!(registry.type_matches(&Value::from(3.5), "Num"));
        assert!(!registry.type_matches(&Value::from("3"), "Int"));
        assert!(registry.type_matches(&Value::from("x"), "Any"));
    }
}
