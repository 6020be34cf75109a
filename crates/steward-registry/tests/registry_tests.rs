//! Publishing, withdrawing, and routing through `ManagementRegistry`

use std::sync::Arc;

use parking_lot::RwLock;
use steward_core::{
    Attribute, ClassBuilder, DispatchError, DynamicManaged, Managed, ManagedFacade, ManagedMarker,
    ManagedValue,
};
use steward_registry::*;

struct Pool {
    size: i32,
    restarts: i32,
}

impl Managed for Pool {
    fn declare(class: &mut ClassBuilder<Self>) {
        class
            .field("size", ManagedMarker::new().writable(true), |p| &p.size, |p| &mut p.size)
            .method("restart", ManagedMarker::described("Restart workers"), |p: &mut Self| {
                p.restarts += 1;
                p.restarts
            });
    }
}

fn pool() -> Arc<RwLock<Pool>> {
    Arc::new(RwLock::new(Pool {
        size: 4,
        restarts: 0,
    }))
}

fn registry() -> Arc<ManagementRegistry> {
    ManagementRegistry::start(RegistryConfig::default()).unwrap()
}

fn registered(registry: &ManagementRegistry) -> ManagedValue {
    let self_name = registry.self_name().cloned().unwrap();
    registry.get_attribute(&self_name, REGISTERED_OBJECTS).unwrap()
}

fn text_list(names: &[&str]) -> ManagedValue {
    ManagedValue::List(names.iter().map(|n| ManagedValue::from(*n)).collect())
}

// ============================================================================
// Naming
// ============================================================================

#[test]
fn test_compute_name() {
    let name = compute_name::<Pool>().unwrap();
    assert_eq!(name.to_string(), "registry_tests:type=Pool");
    assert_eq!(name.domain(), "registry_tests");
    assert_eq!(name.key("type"), Some("Pool"));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_self_registration() {
    let registry = registry();
    let self_name = registry.self_name().cloned().unwrap();
    assert_eq!(self_name.to_string(), "steward:type=ManagementRegistry");
    assert!(registry.is_published(&self_name));
    assert_eq!(registered(&registry), text_list(&["steward:type=ManagementRegistry"]));

    let descriptor = registry.describe(&self_name).unwrap();
    assert_eq!(descriptor.description, "Objects registered with the management registry");
    let attribute = descriptor.attribute(REGISTERED_OBJECTS).unwrap();
    assert!(attribute.readable && !attribute.writable);

    assert_eq!(
        registry
            .set_attribute(&self_name, REGISTERED_OBJECTS, ManagedValue::List(vec![]))
            .unwrap_err(),
        RegistryError::Dispatch(DispatchError::AttributeNotWritable(
            REGISTERED_OBJECTS.to_string()
        ))
    );
}

#[test]
fn test_registry_without_self() {
    let config = RegistryConfig {
        publish_self: false,
        ..Default::default()
    };
    let registry = ManagementRegistry::start(config).unwrap();
    assert!(registry.self_name().is_none());
    assert!(registry.published_names().is_empty());
}

#[test]
fn test_publish_and_withdraw_managed() {
    let registry = registry();
    let pool = pool();

    let name = registry.publish_managed(&pool, "Worker pool").unwrap();
    assert_eq!(
        registered(&registry),
        text_list(&["steward:type=ManagementRegistry", "registry_tests:type=Pool"])
    );

    registry.withdraw_managed::<Pool>().unwrap();
    assert!(!registry.is_published(&name));
    assert_eq!(
        registry.withdraw(&name).unwrap_err(),
        RegistryError::WithdrawNotFound(name)
    );
}

#[test]
fn test_duplicate_publish() {
    let registry = registry();
    let pool = pool();

    let name = registry.publish_managed(&pool, "Worker pool").unwrap();
    assert_eq!(
        registry.publish_managed(&pool, "Again").unwrap_err(),
        RegistryError::PublishConflict(name.clone())
    );

    // Publishing a handle directly under a taken name conflicts as well
    let facade = ManagedFacade::new(&pool, "Same name").unwrap();
    let same = ObjectName::parse("registry_tests:type=Pool").unwrap();
    assert_eq!(
        registry.publish(Arc::new(facade), same).unwrap_err(),
        RegistryError::PublishConflict(name)
    );
}

#[test]
fn test_canonical_names_listed() {
    let registry = registry();
    let pool = pool();
    let facade = ManagedFacade::new(&pool, "Tagged").unwrap();
    let name = ObjectName::parse("ops:type=Pool,instance=a").unwrap();
    registry.publish(Arc::new(facade), name.clone()).unwrap();

    assert_eq!(
        registered(&registry),
        text_list(&["steward:type=ManagementRegistry", "ops:instance=a,type=Pool"])
    );
    assert!(registry.is_published(&"ops:instance=a,type=Pool".parse().unwrap()));
}

#[test]
fn test_drain() {
    let registry = registry();
    let pool = pool();
    let name = registry.publish_managed(&pool, "Worker pool").unwrap();

    let drained = registry.drain();
    assert_eq!(drained.len(), 2);
    assert_eq!(drained[1], name);
    assert!(registry.published_names().is_empty());

    // The self name is still reported, but its entry is gone
    let self_name = registry.self_name().cloned().unwrap();
    assert_eq!(drained[0], self_name);
    assert!(!registry.is_published(&self_name));
    assert_eq!(
        registry.get_attribute(&self_name, REGISTERED_OBJECTS).unwrap_err(),
        RegistryError::InstanceNotFound(self_name)
    );
}

#[test]
fn test_concurrent_publish_conflicts() {
    let registry = registry();
    let pool = pool();

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| scope.spawn(|| registry.publish_managed(&pool, "Worker pool")))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let name = compute_name::<Pool>().unwrap();
    let published = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(RegistryError::PublishConflict(n)) if *n == name))
        .count();
    assert_eq!(published, 1);
    assert_eq!(conflicts, 15);

    let names = registry.published_names();
    assert_eq!(names.iter().filter(|n| **n == name).count(), 1);
    assert_eq!(names.len(), 2);
}

// ============================================================================
// Routing
// ============================================================================

#[test]
fn test_routed_requests() {
    let registry = registry();
    let pool = pool();
    let name = registry.publish_managed(&pool, "Worker pool").unwrap();

    assert_eq!(registry.get_attribute(&name, "size").unwrap(), ManagedValue::Int(4));
    registry.set_attribute(&name, "size", ManagedValue::Int(8)).unwrap();
    assert_eq!(pool.read().size, 8);

    assert_eq!(
        registry.invoke(&name, "restart", vec![], &[]).unwrap(),
        ManagedValue::Int(1)
    );
    assert_eq!(
        registry.get_attributes(&name, &["size", "missing"]).unwrap(),
        vec![Attribute::new("size", 8)]
    );
    assert_eq!(
        registry
            .set_attributes(&name, vec![Attribute::new("size", 2)])
            .unwrap(),
        vec![Attribute::new("size", 2)]
    );
    assert_eq!(registry.describe(&name).unwrap().operations.len(), 1);
}

#[test]
fn test_routing_to_unknown_name() {
    let registry = registry();
    let name = ObjectName::of_type("nowhere", "Ghost").unwrap();
    assert_eq!(
        registry.get_attribute(&name, "size").unwrap_err(),
        RegistryError::InstanceNotFound(name)
    );
}

struct Echo {
    descriptor: steward_core::ManagementDescriptor,
}

impl DynamicManaged for Echo {
    fn get_attribute(&self, name: &str) -> steward_core::DispatchResult<ManagedValue> {
        Ok(ManagedValue::from(name))
    }

    fn set_attribute(&self, name: &str, _value: ManagedValue) -> steward_core::DispatchResult<()> {
        Err(DispatchError::AttributeNotWritable(name.to_string()))
    }

    fn invoke(
        &self,
        _name: &str,
        params: Vec<ManagedValue>,
        _signature: &[&str],
    ) -> steward_core::DispatchResult<ManagedValue> {
        Ok(ManagedValue::List(params))
    }

    fn describe(&self) -> &steward_core::ManagementDescriptor {
        &self.descriptor
    }
}

#[test]
fn test_native_publish() {
    let registry = registry();
    let name = ObjectName::of_type("native", "Echo").unwrap();
    let echo = Echo {
        descriptor: steward_core::ManagementDescriptor::new("native.Echo", "Echoes requests"),
    };
    registry.publish(Arc::new(echo), name.clone()).unwrap();

    assert_eq!(
        registry.get_attribute(&name, "anything").unwrap(),
        ManagedValue::Text("anything".to_string())
    );
    assert_eq!(
        registry
            .invoke(&name, "echo", vec![ManagedValue::Int(1)], &["int"])
            .unwrap(),
        ManagedValue::List(vec![ManagedValue::Int(1)])
    );
    assert_eq!(registry.describe(&name).unwrap().type_name, "native.Echo");
}
