//! Visibility Gate Invariant Tests
//!
//! Tests for access enforcement:
//! - Public paths are reachable from anywhere
//! - Protected paths: declaring class and its descendants only
//! - Private paths: declaring class only, errors name the owning method
//! - Read-only fields: public reader, private writer
//! - Every gated call is checked, denials are never cached

use attrdef::{AttrError, Attribute, Caller, ClassId, ClassRegistry, RegistryConfig, Value, Visibility};

// =============================================================================
// Helper Functions
// =============================================================================

struct Fixture {
    registry: ClassRegistry,
    base: ClassId,
    child: ClassId,
    grandchild: ClassId,
    sibling: ClassId,
    stranger: ClassId,
}

/// Base(open, guarded: protected, secret: private, id: readonly)
/// Base <- Child <- Grandchild, Base <- Sibling, Stranger
fn setup() -> Fixture {
    let registry = ClassRegistry::with_config(RegistryConfig::quiet());
    let base = registry.define_class("Base", None).unwrap();
    registry.declare(base, Attribute::new("open")).unwrap();
    registry.declare(base, Attribute::new("guarded").protected()).unwrap();
    registry.declare(base, Attribute::new("secret").private()).unwrap();
    registry.declare(base, Attribute::new("id").readonly()).unwrap();

    let child = registry.define_class("Child", Some(base)).unwrap();
    let grandchild = registry.define_class("Grandchild", Some(child)).unwrap();
    let sibling = registry.define_class("Sibling", Some(base)).unwrap();
    let stranger = registry.define_class("Stranger", None).unwrap();

    Fixture {
        registry,
        base,
        child,
        grandchild,
        sibling,
        stranger,
    }
}

// =============================================================================
// Public Tests
// =============================================================================

/// Public fields need no caller context.
#[test]
fn test_public_from_anywhere() {
    let f = setup();
    let mut obj = f.registry.construct(f.base).unwrap();

    f.registry.set(Caller::External, &mut obj, "open", 1).unwrap();
    assert_eq!(f.registry.get(Caller::within(f.stranger), &mut obj, "open").unwrap(), Value::Int(1));
}

// =============================================================================
// Protected Tests
// =============================================================================

/// Descendants at any depth may use a protected field.
#[test]
fn test_protected_from_descendants() {
    let f = setup();
    let mut obj = f.registry.construct(f.grandchild).unwrap();

    f.registry.set(Caller::within(f.base), &mut obj, "guarded", "a").unwrap();
    f.registry.set(Caller::within(f.child), &mut obj, "guarded", "b").unwrap();
    assert_eq!(
        f.registry.get(Caller::within(f.grandchild), &mut obj, "guarded").unwrap(),
        Value::from("b")
    );
}

/// Unrelated classes cannot use a protected field.
#[test]
fn test_protected_from_unrelated_fails() {
    let f = setup();
    let mut obj = f.registry.construct(f.child).unwrap();

    let err = f
        .registry
        .set(Caller::within(f.stranger), &mut obj, "guarded", 1)
        .unwrap_err();
    match err {
        AttrError::ProtectedAccessViolation {
            field,
            declaring_class,
            caller_class,
        } => {
            assert_eq!(field, "guarded");
            assert_eq!(declaring_class, "Base");
            assert_eq!(caller_class, "Stranger");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    let err = f.registry.get(Caller::External, &mut obj, "guarded").unwrap_err();
    assert!(matches!(
        err,
        AttrError::ProtectedAccessViolation { ref caller_class, .. } if caller_class == "<external>"
    ));
}

/// A protected field declared on a subclass is not reachable from its parent
/// or its siblings.
#[test]
fn test_protected_not_upward_or_sideways() {
    let registry = ClassRegistry::with_config(RegistryConfig::quiet());
    let base = registry.define_class("Base", None).unwrap();
    let child = registry.define_class("Child", Some(base)).unwrap();
    registry.declare(child, Attribute::new("note").protected()).unwrap();
    let sibling = registry.define_class("Sibling", Some(base)).unwrap();

    let mut obj = registry.construct(child).unwrap();
    assert!(registry.get(Caller::within(base), &mut obj, "note").is_err());
    assert!(registry.get(Caller::within(sibling), &mut obj, "note").is_err());
    assert!(registry.get(Caller::within(child), &mut obj, "note").is_ok());
}

// =============================================================================
// Private Tests
// =============================================================================

/// The declaring class may use its private field.
#[test]
fn test_private_from_declaring_class() {
    let f = setup();
    let mut obj = f.registry.construct(f.child).unwrap();

    f.registry.set(Caller::within(f.base), &mut obj, "secret", "s").unwrap();
    assert_eq!(
        f.registry.get(Caller::within(f.base), &mut obj, "secret").unwrap(),
        Value::from("s")
    );
}

/// Subclasses cannot use a private field; the error names the owner.
#[test]
fn test_private_from_subclass_fails() {
    let f = setup();
    let mut obj = f.registry.construct(f.child).unwrap();

    let err = f
        .registry
        .set(Caller::within(f.child), &mut obj, "secret", 1)
        .unwrap_err();
    match &err {
        AttrError::PrivateAccessViolation {
            field,
            declaring_class,
            caller_class,
            owner_method,
        } => {
            assert_eq!(field, "secret");
            assert_eq!(declaring_class, "Base");
            assert_eq!(caller_class, "Child");
            assert_eq!(owner_method, "Base::set_secret");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().contains("Base::set_secret"));
    assert!(err.is_access_violation());
}

/// Private readers name the accessor as owner.
#[test]
fn test_private_reader_owner_method() {
    let f = setup();
    let mut obj = f.registry.construct(f.base).unwrap();

    let err = f
        .registry
        .get(Caller::within(f.sibling), &mut obj, "secret")
        .unwrap_err();
    assert!(matches!(
        err,
        AttrError::PrivateAccessViolation { ref owner_method, .. } if owner_method == "Base::get_secret"
    ));
}

// =============================================================================
// Read-only Tests
// =============================================================================

/// Read-only: anyone reads, only the declaring class writes.
#[test]
fn test_readonly_field() {
    let f = setup();
    let mut obj = f.registry.construct_with(f.child, [("id", 42)]).unwrap();

    assert_eq!(f.registry.get(Caller::External, &mut obj, "id").unwrap(), Value::Int(42));
    assert!(f.registry.set(Caller::External, &mut obj, "id", 1).is_err());
    assert!(f.registry.set(Caller::within(f.child), &mut obj, "id", 1).is_err());
    f.registry.set(Caller::within(f.base), &mut obj, "id", 1).unwrap();
    assert_eq!(f.registry.get(Caller::External, &mut obj, "id").unwrap(), Value::Int(1));
}

/// Fine-grained modifiers set each path independently.
#[test]
fn test_split_visibility() {
    let registry = ClassRegistry::with_config(RegistryConfig::quiet());
    let class = registry.define_class("Gauge", None).unwrap();
    registry
        .declare(
            class,
            Attribute::new("level")
                .reader(Visibility::Protected)
                .writer(Visibility::Public),
        )
        .unwrap();

    let mut obj = registry.construct(class).unwrap();
    registry.set(Caller::External, &mut obj, "level", 3).unwrap();
    assert!(registry.get(Caller::External, &mut obj, "level").is_err());
    assert_eq!(registry.get(Caller::within(class), &mut obj, "level").unwrap(), Value::Int(3));
}

// =============================================================================
// Role Tests
// =============================================================================

/// Composed private fields belong to the composing class.
#[test]
fn test_role_fields_owned_by_consumer() {
    let registry = ClassRegistry::with_config(RegistryConfig::quiet());
    let role = registry.define_role("Locked").unwrap();
    registry.declare(role, Attribute::new("key").private()).unwrap();
    let door = registry.define_class("Door", None).unwrap();
    registry.compose(door, role).unwrap();

    let mut obj = registry.construct(door).unwrap();
    registry.set(Caller::within(door), &mut obj, "key", "k").unwrap();

    let err = registry.get(Caller::within(role), &mut obj, "key").unwrap_err();
    assert!(matches!(
        err,
        AttrError::PrivateAccessViolation { ref owner_method, .. } if owner_method == "Door::get_key"
    ));
}

// =============================================================================
// Gate Accounting Tests
// =============================================================================

/// Each gated call is checked; public calls are not.
#[test]
fn test_gate_checks_every_call() {
    let f = setup();
    let mut obj = f.registry.construct(f.base).unwrap();
    let before = f.registry.metrics().snapshot();

    for _ in 0..5 {
        let _ = f.registry.get(Caller::within(f.stranger), &mut obj, "secret");
    }
    f.registry.get(Caller::External, &mut obj, "open").unwrap();

    let after = f.registry.metrics().snapshot();
    assert_eq!(after.gate_checks - before.gate_checks, 5);
    assert_eq!(after.gate_denials - before.gate_denials, 5);
}

/// A denied call leaves the slot untouched.
#[test]
fn test_denied_write_has_no_effect() {
    let f = setup();
    let mut obj = f.registry.construct(f.base).unwrap();
    f.registry.set(Caller::within(f.base), &mut obj, "secret", "before").unwrap();

    assert!(f.registry.set(Caller::External, &mut obj, "secret", "after").is_err());
    assert_eq!(
        f.registry.get(Caller::Internal, &mut obj, "secret").unwrap(),
        Value::from("before")
    );
}
