//! Visibility gate
//!
//! Evaluated on every call to a protected or private operation. Results
//! are never cached: the same operation is reached from different callers.
//!
//! - Protected: declaring class, any descendant of it, or internal.
//! - Private: declaring class exactly, or internal. Subclasses are denied.

use crate::schema::{AccessKind, AttrError, AttrResult, ClassId, ClassRegistry, SlotIndex, Visibility};

use super::caller::Caller;
use super::generator::{accessor_name, mutator_name};

/// What a gated operation protects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldGuard {
    pub field: String,
    pub declaring: ClassId,
    pub level: Visibility,
    pub kind: AccessKind,
    pub slot: SlotIndex,
}

/// Permits or denies `caller` reaching the guarded operation
pub fn check(registry: &ClassRegistry, caller: &Caller, guard: &FieldGuard) -> AttrResult<()> {
    registry.metrics().increment_gate_checks();

    if permits(registry, caller, guard)? {
        return Ok(());
    }

    let err = violation(registry, caller, guard)?;
    registry.record_denial(&err);
    Err(err)
}

fn permits(registry: &ClassRegistry, caller: &Caller, guard: &FieldGuard) -> AttrResult<bool> {
    let class = match caller {
        Caller::Internal => return Ok(true),
        Caller::External => return Ok(guard.level == Visibility::Public),
        Caller::Class(id) => *id,
    };

    match guard.level {
        Visibility::Public => Ok(true),
        Visibility::Protected => {
            Ok(class == guard.declaring || registry.is_subclass_of(class, guard.declaring)?)
        }
        Visibility::Private => Ok(class == guard.declaring),
    }
}

fn violation(registry: &ClassRegistry, caller: &Caller, guard: &FieldGuard) -> AttrResult<AttrError> {
    let declaring_class = registry.class_name(guard.declaring)?;
    let caller_class = registry.caller_name(caller)?;

    match guard.level {
        Visibility::Private => {
            let owner = registry
                .field_owner(guard.declaring, guard.slot, guard.kind)?
                .unwrap_or(guard.declaring);
            let method = match guard.kind {
                AccessKind::Accessor => accessor_name(&guard.field),
                AccessKind::Mutator => mutator_name(&guard.field),
            };
            Ok(AttrError::PrivateAccessViolation {
                field: guard.field.clone(),
                declaring_class,
                caller_class,
                owner_method: format!("{}::{}", registry.class_name(owner)?, method),
            })
        }
        _ => Ok(AttrError::ProtectedAccessViolation {
            field: guard.field.clone(),
            declaring_class,
            caller_class,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::schema::Attribute;

    fn lineage() -> (ClassRegistry, ClassId, ClassId, ClassId) {
        let registry = ClassRegistry::with_config(RegistryConfig::quiet());
        let base = registry.define_class("Base", None).unwrap();
        let child = registry.define_class("Child", Some(base)).unwrap();
        let other = registry.define_class("Other", None).unwrap();
        (registry, base, child, other)
    }

    fn guard(registry: &ClassRegistry, declaring: ClassId, level: Visibility) -> FieldGuard {
        let slot = registry
            .declare(declaring, Attribute::new("f").access(level))
            .unwrap();
        FieldGuard {
            field: "f".into(),
            declaring,
            level,
            kind: AccessKind::Mutator,
            slot,
        }
    }

    #[test]
    fn test_protected_rules() {
        let registry = ClassRegistry::with_config(RegistryConfig::quiet());
        let base = registry.define_class("Base", None).unwrap();
        let g = guard(&registry, base, Visibility::Protected);
        let child = registry.define_class("Child", Some(base)).unwrap();
        let other = registry.define_class("Other", None).unwrap();

        assert!(check(&registry, &Caller::within(base), &g).is_ok());
        assert!(check(&registry, &Caller::within(child), &g).is_ok());
        assert!(check(&registry, &Caller::Internal, &g).is_ok());

        let err = check(&registry, &Caller::within(other), &g).unwrap_err();
        match err {
            AttrError::ProtectedAccessViolation {
                field,
                declaring_class,
                caller_class,
            } => {
                assert_eq!(field, "f");
                assert_eq!(declaring_class, "Base");
                assert_eq!(caller_class, "Other");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(check(&registry, &Caller::External, &g).is_err());
    }

    #[test]
    fn test_protected_is_not_upward() {
        let (registry, base, child, _) = lineage();
        let g = FieldGuard {
            field: "f".into(),
            declaring: child,
            level: Visibility::Protected,
            kind: AccessKind::Accessor,
            slot: 0,
        };
        assert!(check(&registry, &Caller::within(base), &g).is_err());
    }

    #[test]
    fn test_private_denies_subclass_and_names_owner() {
        let registry = ClassRegistry::with_config(RegistryConfig::quiet());
        let base = registry.define_class("Base", None).unwrap();
        let g = guard(&registry, base, Visibility::Private);
        let child = registry.define_class("Child", Some(base)).unwrap();

        assert!(check(&registry, &Caller::within(base), &g).is_ok());
        assert!(check(&registry, &Caller::Internal, &g).is_ok());

        let err = check(&registry, &Caller::within(child), &g).unwrap_err();
        match err {
            AttrError::PrivateAccessViolation {
                owner_method,
                caller_class,
                ..
            } => {
                assert_eq!(owner_method, "Base::set_f");
                assert_eq!(caller_class, "Child");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_denials_are_counted_every_time() {
        let registry = ClassRegistry::with_config(RegistryConfig::quiet());
        let base = registry.define_class("Base", None).unwrap();
        let g = guard(&registry, base, Visibility::Private);

        for _ in 0..3 {
            assert!(check(&registry, &Caller::External, &g).is_err());
        }
        let snapshot = registry.metrics().snapshot();
        assert_eq!(snapshot.gate_checks, 3);
        assert_eq!(snapshot.gate_denials, 3);
    }
}
