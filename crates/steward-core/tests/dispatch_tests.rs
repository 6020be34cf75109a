//! End-to-end dispatch through `ManagedFacade`

use std::sync::Arc;

use parking_lot::RwLock;
use steward_core::*;

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Default)]
struct Counter {
    count: i32,
    secret: String,
    fixed: i64,
    foo: String,
    bar: i32,
    ratio: f64,
    last_overload: String,
}

impl Managed for Counter {
    fn declare(class: &mut ClassBuilder<Self>) {
        class
            .constructor::<()>(ManagedMarker::described("Zeroed counter"))
            .field(
                "count",
                ManagedMarker::described("Current count").writable(true),
                |c| &c.count,
                |c| &mut c.count,
            )
            .field(
                "secret",
                ManagedMarker::new().readable(false).writable(true),
                |c| &c.secret,
                |c| &mut c.secret,
            )
            .field("fixed", ManagedMarker::new(), |c| &c.fixed, |c| &mut c.fixed)
            .method("getFoo", ManagedMarker::described("Foo value"), |c: &mut Self| {
                c.foo.clone()
            })
            .method("setFoo", ManagedMarker::new(), |c: &mut Self, foo: String| c.foo = foo)
            .method("getBar", ManagedMarker::described("Bar value"), |c: &mut Self| c.bar)
            .method("setRatio", ManagedMarker::new(), |c: &mut Self, num: f64, den: f64| {
                c.ratio = num / den;
                c.ratio
            })
            .method("mark", ManagedMarker::new(), |c: &mut Self, _v: Option<i32>| {
                c.last_overload = "Option<int>".to_string()
            })
            .method("mark", ManagedMarker::new(), |c: &mut Self, _v: i32| {
                c.last_overload = "int".to_string()
            })
            .method("increment", ManagedMarker::described("Add one"), |c: &mut Self| {
                c.count += 1;
                c.count
            });
    }
}

fn counter() -> (Arc<RwLock<Counter>>, ManagedFacade<Counter>) {
    let counter = Arc::new(RwLock::new(Counter {
        bar: 9,
        fixed: 42,
        ..Default::default()
    }));
    let facade = ManagedFacade::new(&counter, "Request counter").unwrap();
    (counter, facade)
}

struct Nothing;

impl Managed for Nothing {
    fn declare(_class: &mut ClassBuilder<Self>) {}
}

// ============================================================================
// Descriptor Tests
// ============================================================================

#[test]
fn test_zero_marked_members() {
    let instance = Arc::new(RwLock::new(Nothing));
    let facade = ManagedFacade::new(&instance, "Empty").unwrap();

    let descriptor = facade.describe();
    assert!(descriptor.attributes.is_empty());
    assert!(descriptor.operations.is_empty());
    assert!(descriptor.constructors.is_empty());
    assert_eq!(descriptor.description, "Empty");
}

#[test]
fn test_descriptor_contents() {
    let (_counter, facade) = counter();
    let descriptor = facade.describe();

    let names: Vec<_> = descriptor.attributes.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["foo", "bar", "count", "secret", "fixed"]);

    let ops: Vec<_> = descriptor.operations.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(ops, vec!["setRatio", "mark", "mark", "increment"]);

    assert_eq!(descriptor.constructors.len(), 1);
    assert_eq!(descriptor.constructors[0].description, "Zeroed counter");
}

#[test]
fn test_accessor_pair_flags() {
    let (_counter, facade) = counter();
    let descriptor = facade.describe();

    let foo = descriptor.attribute("foo").unwrap();
    assert!(foo.readable && foo.writable);
    assert_eq!(foo.declared_type, ManagedType::Text);
    assert_eq!(foo.description, "Foo value");

    let bar = descriptor.attribute("bar").unwrap();
    assert!(bar.readable);
    assert!(!bar.writable);
}

// ============================================================================
// Attribute Tests
// ============================================================================

#[test]
fn test_unknown_attribute() {
    let (_counter, facade) = counter();
    assert_eq!(
        facade.get_attribute("nope").unwrap_err(),
        DispatchError::AttributeNotFound("nope".to_string())
    );
    assert_eq!(
        facade.set_attribute("nope", ManagedValue::Int(1)).unwrap_err(),
        DispatchError::AttributeNotFound("nope".to_string())
    );
}

#[test]
fn test_permission_flags() {
    let (counter, facade) = counter();
    assert_eq!(
        facade.get_attribute("secret").unwrap_err(),
        DispatchError::AttributeNotReadable("secret".to_string())
    );
    facade.set_attribute("secret", "hunter2".into()).unwrap();
    assert_eq!(counter.read().secret, "hunter2");

    assert_eq!(facade.get_attribute("fixed").unwrap(), ManagedValue::Long(42));
    assert_eq!(
        facade.set_attribute("fixed", ManagedValue::Long(1)).unwrap_err(),
        DispatchError::AttributeNotWritable("fixed".to_string())
    );
    assert_eq!(
        facade.set_attribute("bar", ManagedValue::Int(1)).unwrap_err(),
        DispatchError::AttributeNotWritable("bar".to_string())
    );
}

#[test]
fn test_field_set_then_get() {
    let (counter, facade) = counter();
    facade.set_attribute("count", ManagedValue::Int(5)).unwrap();
    assert_eq!(facade.get_attribute("count").unwrap(), ManagedValue::Int(5));
    assert_eq!(counter.read().count, 5);
}

#[test]
fn test_accessor_set_then_get() {
    let (counter, facade) = counter();
    facade.set_attribute("foo", "alpha".into()).unwrap();
    assert_eq!(facade.get_attribute("foo").unwrap(), ManagedValue::Text("alpha".to_string()));
    assert_eq!(counter.read().foo, "alpha");
}

#[test]
fn test_get_attributes_omits_failures() {
    let (counter, facade) = counter();
    counter.write().count = 3;

    let values = facade.get_attributes(&["count", "missing", "secret"]);
    assert_eq!(values, vec![Attribute::new("count", 3)]);
}

#[test]
fn test_set_attributes_returns_snapshot() {
    let (_counter, facade) = counter();

    let written = facade.set_attributes(vec![
        Attribute::new("count", 8),
        Attribute::new("fixed", ManagedValue::Long(1)),
        Attribute::new("secret", "x"),
        Attribute::new("foo", "beta"),
    ]);

    // "fixed" is read-only and "secret" can't be read back
    assert_eq!(
        written,
        vec![Attribute::new("count", 8), Attribute::new("foo", "beta")]
    );
}

// ============================================================================
// Invocation Tests
// ============================================================================

#[test]
fn test_invoke_by_signature() {
    let (counter, facade) = counter();
    let result = facade
        .invoke(
            "setRatio",
            vec![ManagedValue::Double(3.0), ManagedValue::Double(4.0)],
            &["double", "double"],
        )
        .unwrap();
    assert_eq!(result, ManagedValue::Double(0.75));
    assert_eq!(counter.read().ratio, 0.75);
}

#[test]
fn test_invoke_wrong_signature() {
    let (_counter, facade) = counter();
    let err = facade
        .invoke(
            "setRatio",
            vec![ManagedValue::Int(3), ManagedValue::Int(4)],
            &["int", "int"],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Invocation {
            ref member,
            fault: InvocationFault::NoMatchingSignature { .. },
        } if member == "setRatio"
    ));
}

#[test]
fn test_primitive_keyword_selects_primitive_overload() {
    let (counter, facade) = counter();

    // The Option<int> overload is declared first; an int signature must skip it
    facade.invoke("mark", vec![ManagedValue::Int(1)], &["int"]).unwrap();
    assert_eq!(counter.read().last_overload, "int");

    facade
        .invoke("mark", vec![ManagedValue::Null], &["Option<int>"])
        .unwrap();
    assert_eq!(counter.read().last_overload, "Option<int>");

    facade.invoke("mark", vec![ManagedValue::Int(2)], &["int"]).unwrap();
    assert_eq!(counter.read().last_overload, "int");
}

#[test]
fn test_invoke_errors() {
    let (_counter, facade) = counter();

    assert_eq!(
        facade.invoke("vanish", vec![], &[]).unwrap_err(),
        DispatchError::OperationNotFound("vanish".to_string())
    );
    assert_eq!(
        facade
            .invoke("mark", vec![ManagedValue::Int(1)], &["Integer"])
            .unwrap_err(),
        DispatchError::TypeResolution {
            type_name: "Integer".to_string()
        }
    );
    assert_eq!(
        facade.invoke("mark", vec![], &["int"]).unwrap_err().fault(),
        Some(&InvocationFault::Arity { expected: 1, got: 0 })
    );
    assert!(matches!(
        facade
            .invoke("mark", vec![ManagedValue::Long(1)], &["int"])
            .unwrap_err()
            .fault(),
        Some(InvocationFault::TypeMismatch { .. })
    ));
}

#[test]
fn test_accessors_are_not_operations() {
    let (_counter, facade) = counter();
    assert_eq!(
        facade.invoke("getFoo", vec![], &[]).unwrap_err(),
        DispatchError::OperationNotFound("getFoo".to_string())
    );
    assert_eq!(
        facade.invoke("increment", vec![], &[]).unwrap(),
        ManagedValue::Int(1)
    );
}
