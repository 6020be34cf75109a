//! Management Registry
//!
//! Publishes [`DynamicManaged`] objects under [`ObjectName`]s and routes
//! requests to them by name. All bookkeeping sits behind one mutex; routed
//! requests clone the handle out and dispatch after the lock is released, so
//! a published object may call back into the registry.
//!
//! At start the registry publishes itself under
//! `<domain>:type=ManagementRegistry`, exposing the read-only attribute
//! `registeredObjects` with the canonical names of everything published.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use steward_core::{
    AccessKind, AttributeDescriptor, AttributeList, DispatchError, DispatchResult, DynamicManaged,
    InvocationFault, Managed, ManagedFacade, ManagedType, ManagedValue, ManagementDescriptor,
};

use crate::config::RegistryConfig;
use crate::error::{NameError, RegistryError};
use crate::name::ObjectName;

/// `type` key of the registry's own entry
pub const REGISTRY_TYPE: &str = "ManagementRegistry";

/// Attribute listing the published names
pub const REGISTERED_OBJECTS: &str = "registeredObjects";

type Entry = (ObjectName, Arc<dyn DynamicManaged>);

// ============================================================================
// Naming
// ============================================================================

/// `<module path>:type=<simple name>` for a managed type.
///
/// The module path keeps its segments, joined with `.` instead of `::`.
pub fn compute_name<T: Managed>() -> Result<ObjectName, NameError> {
    name_for_type(T::type_name())
}

/// Derive an object name from a fully qualified type name.
///
/// Accepts Rust paths (`app::pool::WorkerPool`) and dotted names
/// (`app.pool.WorkerPool`). Generic arguments are ignored.
pub fn name_for_type(type_name: &str) -> Result<ObjectName, NameError> {
    let base = type_name.split('<').next().unwrap_or(type_name).trim();
    let (module, simple) = base
        .rsplit_once("::")
        .or_else(|| base.rsplit_once('.'))
        .ok_or_else(|| NameError::NoModulePath(type_name.to_string()))?;

    ObjectName::of_type(module.replace("::", "."), simple)
}

// ============================================================================
// Registry
// ============================================================================

/// Process-wide table of published management objects.
pub struct ManagementRegistry {
    config: RegistryConfig,
    self_name: Option<ObjectName>,
    entries: Mutex<Vec<Entry>>,
}

impl ManagementRegistry {
    /// Start a registry, publishing itself when the config asks for it.
    pub fn start(config: RegistryConfig) -> Result<Arc<Self>, RegistryError> {
        let self_name = if config.publish_self {
            Some(ObjectName::of_type(config.domain.as_str(), REGISTRY_TYPE)?)
        } else {
            None
        };

        let registry = Arc::new_cyclic(move |weak: &Weak<ManagementRegistry>| {
            let mut entries: Vec<Entry> = Vec::new();
            if let Some(name) = &self_name {
                let handle: Arc<dyn DynamicManaged> =
                    Arc::new(RegistryHandle::new(weak.clone(), &config.description));
                entries.push((name.clone(), handle));
            }
            ManagementRegistry {
                config,
                self_name,
                entries: Mutex::new(entries),
            }
        });

        match &registry.self_name {
            Some(name) => log::info!("Management registry started as {}", name),
            None => log::info!("Management registry started"),
        }
        Ok(registry)
    }

    /// Registry settings
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Name of the registry's own entry, if it published itself.
    ///
    /// The name outlives the entry: after [`drain`](Self::drain) or a
    /// [`withdraw`](Self::withdraw) of this name, requests routed to it fail
    /// with `InstanceNotFound`. Check [`is_published`](Self::is_published) first.
    pub fn self_name(&self) -> Option<&ObjectName> {
        self.self_name.as_ref()
    }

    /// Publish a natively implemented object under `name`.
    pub fn publish(
        &self,
        handle: Arc<dyn DynamicManaged>,
        name: ObjectName,
    ) -> Result<(), RegistryError> {
        let mut entries = self.entries.lock();
        if entries.iter().any(|(existing, _)| *existing == name) {
            return Err(RegistryError::PublishConflict(name));
        }

        log::info!("Publishing {} ({})", name, handle.describe().type_name);
        entries.push((name, handle));
        Ok(())
    }

    /// Build a facade over `instance` and publish it under [`compute_name`].
    pub fn publish_managed<T: Managed>(
        &self,
        instance: &Arc<RwLock<T>>,
        description: impl Into<String>,
    ) -> Result<ObjectName, RegistryError> {
        let name = compute_name::<T>()?;
        let facade = ManagedFacade::new(instance, description)?;
        self.publish(Arc::new(facade), name.clone())?;
        Ok(name)
    }

    /// Withdraw the object published under `name`, returning its handle.
    pub fn withdraw(&self, name: &ObjectName) -> Result<Arc<dyn DynamicManaged>, RegistryError> {
        let mut entries = self.entries.lock();
        let index = entries
            .iter()
            .position(|(existing, _)| existing == name)
            .ok_or_else(|| RegistryError::WithdrawNotFound(name.clone()))?;

        let (name, handle) = entries.remove(index);
        log::info!("Withdrew {}", name);
        Ok(handle)
    }

    /// Withdraw the object published for `T` by [`publish_managed`](Self::publish_managed).
    pub fn withdraw_managed<T: Managed>(&self) -> Result<Arc<dyn DynamicManaged>, RegistryError> {
        self.withdraw(&compute_name::<T>()?)
    }

    /// Names of all published objects, in publish order
    pub fn published_names(&self) -> Vec<ObjectName> {
        self.entries.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    /// Whether something is published under `name`
    pub fn is_published(&self, name: &ObjectName) -> bool {
        self.entries.lock().iter().any(|(existing, _)| existing == name)
    }

    /// Handle published under `name`
    pub fn lookup(&self, name: &ObjectName) -> Option<Arc<dyn DynamicManaged>> {
        self.entries
            .lock()
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, handle)| Arc::clone(handle))
    }

    /// Withdraw everything, returning the names in publish order.
    pub fn drain(&self) -> Vec<ObjectName> {
        let drained: Vec<ObjectName> = self
            .entries
            .lock()
            .drain(..)
            .map(|(name, _)| name)
            .collect();
        log::info!("Drained {} published objects", drained.len());
        drained
    }

    // ------------------------------------------------------------------------
    // Routing
    // ------------------------------------------------------------------------

    fn handle(&self, name: &ObjectName) -> Result<Arc<dyn DynamicManaged>, RegistryError> {
        self.lookup(name)
            .ok_or_else(|| RegistryError::InstanceNotFound(name.clone()))
    }

    /// Read an attribute of a published object
    pub fn get_attribute(
        &self,
        name: &ObjectName,
        attribute: &str,
    ) -> Result<ManagedValue, RegistryError> {
        Ok(self.handle(name)?.get_attribute(attribute)?)
    }

    /// Write an attribute of a published object
    pub fn set_attribute(
        &self,
        name: &ObjectName,
        attribute: &str,
        value: ManagedValue,
    ) -> Result<(), RegistryError> {
        Ok(self.handle(name)?.set_attribute(attribute, value)?)
    }

    /// Read several attributes of a published object
    pub fn get_attributes(
        &self,
        name: &ObjectName,
        attributes: &[&str],
    ) -> Result<AttributeList, RegistryError> {
        Ok(self.handle(name)?.get_attributes(attributes))
    }

    /// Write several attributes of a published object
    pub fn set_attributes(
        &self,
        name: &ObjectName,
        attributes: AttributeList,
    ) -> Result<AttributeList, RegistryError> {
        Ok(self.handle(name)?.set_attributes(attributes))
    }

    /// Invoke an operation on a published object
    pub fn invoke(
        &self,
        name: &ObjectName,
        operation: &str,
        params: Vec<ManagedValue>,
        signature: &[&str],
    ) -> Result<ManagedValue, RegistryError> {
        Ok(self.handle(name)?.invoke(operation, params, signature)?)
    }

    /// Descriptor of a published object
    pub fn describe(&self, name: &ObjectName) -> Result<ManagementDescriptor, RegistryError> {
        Ok(self.handle(name)?.describe().clone())
    }
}

// ============================================================================
// Self Handle
// ============================================================================

/// The registry's own entry, answering requests natively
struct RegistryHandle {
    registry: Weak<ManagementRegistry>,
    descriptor: ManagementDescriptor,
}

impl RegistryHandle {
    fn new(registry: Weak<ManagementRegistry>, description: &str) -> Self {
        let mut descriptor =
            ManagementDescriptor::new(std::any::type_name::<ManagementRegistry>(), description);
        descriptor.attributes.push(AttributeDescriptor {
            name: REGISTERED_OBJECTS.to_string(),
            declared_type: ManagedType::List(Box::new(ManagedType::Text)),
            description: "Canonical names of published objects".to_string(),
            readable: true,
            writable: false,
            access: AccessKind::Accessor,
        });
        RegistryHandle {
            registry,
            descriptor,
        }
    }
}

impl DynamicManaged for RegistryHandle {
    fn get_attribute(&self, name: &str) -> DispatchResult<ManagedValue> {
        if name != REGISTERED_OBJECTS {
            return Err(DispatchError::AttributeNotFound(name.to_string()));
        }

        let registry = self
            .registry
            .upgrade()
            .ok_or_else(|| DispatchError::invocation(name, InvocationFault::InstanceDropped))?;
        let names = registry
            .published_names()
            .iter()
            .map(|n| ManagedValue::Text(n.canonical().to_string()))
            .collect();
        Ok(ManagedValue::List(names))
    }

    fn set_attribute(&self, name: &str, _value: ManagedValue) -> DispatchResult<()> {
        if name == REGISTERED_OBJECTS {
            Err(DispatchError::AttributeNotWritable(name.to_string()))
        } else {
            Err(DispatchError::AttributeNotFound(name.to_string()))
        }
    }

    fn invoke(
        &self,
        name: &str,
        _params: Vec<ManagedValue>,
        _signature: &[&str],
    ) -> DispatchResult<ManagedValue> {
        Err(DispatchError::OperationNotFound(name.to_string()))
    }

    fn describe(&self) -> &ManagementDescriptor {
        &self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_for_rust_path() {
        let name = name_for_type("app::pool::WorkerPool").unwrap();
        assert_eq!(name.to_string(), "app.pool:type=WorkerPool");
    }

    #[test]
    fn test_name_for_generic_and_dotted_types() {
        let name = name_for_type("app::cache::Cache<alloc::string::String>").unwrap();
        assert_eq!(name.to_string(), "app.cache:type=Cache");

        let name = name_for_type("net.Router").unwrap();
        assert_eq!(name.to_string(), "net:type=Router");
    }

    #[test]
    fn test_name_without_module_path() {
        assert_eq!(
            name_for_type("Orphan").unwrap_err(),
            NameError::NoModulePath("Orphan".to_string())
        );
    }

    #[test]
    fn test_self_handle_outlived_by_registry() {
        let registry = ManagementRegistry::start(RegistryConfig::default()).unwrap();
        let name = registry.self_name().cloned().unwrap();
        let handle = registry.lookup(&name).unwrap();
        drop(registry);

        assert_eq!(
            handle.get_attribute(REGISTERED_OBJECTS).unwrap_err().fault(),
            Some(&InvocationFault::InstanceDropped)
        );
    }
}
